//! Correlation IDs tying an inbound request to its upstream call in the logs.

use axum::extract::Request;
use axum::http::HeaderValue;
use uuid::Uuid;

/// Header carrying the correlation ID, inbound, outbound and on responses.
pub const CORRELATION_HEADER: &str = "x-dossier-request-id";

const MAX_LEN: usize = 128;

/// Correlation ID stored in request extensions by the server middleware.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorrelationId(String);

impl CorrelationId {
    /// Generate a new correlation ID (UUID v4).
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// The ID already attached to `request`: the extension set by the
    /// middleware, else a well-formed client-supplied header, else a new one.
    pub fn of(request: &Request) -> Self {
        if let Some(id) = request.extensions().get::<CorrelationId>() {
            return id.clone();
        }
        request
            .headers()
            .get(CORRELATION_HEADER)
            .and_then(|v| v.to_str().ok())
            .filter(|v| is_well_formed(v))
            .map(|v| Self(v.to_string()))
            .unwrap_or_else(Self::generate)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn header_value(&self) -> HeaderValue {
        HeaderValue::from_str(&self.0).unwrap_or_else(|_| HeaderValue::from_static("unknown"))
    }
}

impl std::fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

fn is_well_formed(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= MAX_LEN
        && id
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    #[test]
    fn test_client_supplied_id_reused() {
        let request = axum::http::Request::builder()
            .header(CORRELATION_HEADER, "abc-123")
            .body(Body::empty())
            .unwrap();
        assert_eq!(CorrelationId::of(&request).as_str(), "abc-123");
    }

    #[test]
    fn test_malformed_client_id_replaced() {
        let request = axum::http::Request::builder()
            .header(CORRELATION_HEADER, "has spaces")
            .body(Body::empty())
            .unwrap();
        let id = CorrelationId::of(&request);
        assert_ne!(id.as_str(), "has spaces");
        assert!(Uuid::parse_str(id.as_str()).is_ok());
    }

    #[test]
    fn test_extension_wins() {
        let mut request = axum::http::Request::builder()
            .header(CORRELATION_HEADER, "from-header")
            .body(Body::empty())
            .unwrap();
        request
            .extensions_mut()
            .insert(CorrelationId("from-extension".to_string()));
        assert_eq!(CorrelationId::of(&request).as_str(), "from-extension");
    }
}
