use thiserror::Error;

/// Failures the forwarder does not handle itself.
///
/// Upstream non-2xx responses are not errors; they are relayed as-is.
#[derive(Debug, Error)]
pub enum ForwardError {
    /// The target path cannot be joined onto the upstream base URL.
    #[error("invalid upstream target {target:?}: {reason}")]
    InvalidTarget { target: String, reason: String },

    /// Network or transport failure, including a failed inbound body stream.
    #[error("upstream request failed: {0}")]
    Upstream(#[from] reqwest::Error),

    /// The upstream declared JSON but sent something else.
    #[error("upstream returned malformed JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

impl ForwardError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, ForwardError::Upstream(e) if e.is_timeout())
    }

    pub fn is_connect(&self) -> bool {
        matches!(self, ForwardError::Upstream(e) if e.is_connect())
    }
}
