//! Request body resolution and content-type inference.

use std::fmt;

use axum::body::{Body, HttpBody};
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, HeaderValue, Method};
use bytes::Bytes;

/// Body of an outbound request.
pub enum ForwardBody {
    /// No body at all.
    Empty,
    /// Fully buffered bytes, optionally tagged with their own media type.
    Buffered {
        bytes: Bytes,
        content_type: Option<HeaderValue>,
    },
    /// A body read from the inbound connection while it is being sent.
    Streamed(Body),
    /// Form fields; the transport writes the boundary-bearing content type.
    Multipart(reqwest::multipart::Form),
}

impl ForwardBody {
    /// Buffered JSON, serialized from `value`.
    pub fn json<T: serde::Serialize + ?Sized>(value: &T) -> Result<Self, serde_json::Error> {
        Ok(Self::Buffered {
            bytes: Bytes::from(serde_json::to_vec(value)?),
            content_type: None,
        })
    }

    pub fn is_empty(&self) -> bool {
        match self {
            ForwardBody::Empty => true,
            ForwardBody::Buffered { bytes, .. } => bytes.is_empty(),
            ForwardBody::Streamed(_) | ForwardBody::Multipart(_) => false,
        }
    }

    pub fn is_multipart(&self) -> bool {
        matches!(self, ForwardBody::Multipart(_))
    }

    pub fn is_streamed(&self) -> bool {
        matches!(self, ForwardBody::Streamed(_))
    }
}

impl fmt::Debug for ForwardBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ForwardBody::Empty => f.write_str("Empty"),
            ForwardBody::Buffered {
                bytes,
                content_type,
            } => f
                .debug_struct("Buffered")
                .field("len", &bytes.len())
                .field("content_type", content_type)
                .finish(),
            ForwardBody::Streamed(_) => f.write_str("Streamed"),
            ForwardBody::Multipart(form) => f
                .debug_tuple("Multipart")
                .field(&form.boundary())
                .finish(),
        }
    }
}

/// How the outbound `content-type` header is decided.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ContentTypeDirective {
    /// Infer from the body and the inbound request.
    #[default]
    Infer,
    /// Never set it here; the transport decides (e.g. multipart boundaries).
    Suppress,
    /// Force this value.
    Literal(HeaderValue),
}

/// Whether a request with this method may carry a body.
pub fn method_allows_body(method: &Method) -> bool {
    *method != Method::GET && *method != Method::HEAD
}

/// Pick the outbound body.
///
/// GET and HEAD never carry one. Otherwise an explicit body wins, including an
/// explicit `Empty`; failing that the inbound stream is used, unless it is
/// known to be empty.
pub fn resolve_body(method: &Method, inbound: Body, explicit: Option<ForwardBody>) -> ForwardBody {
    if !method_allows_body(method) {
        return ForwardBody::Empty;
    }
    match explicit {
        Some(body) => body,
        None if inbound.size_hint().exact() == Some(0) => ForwardBody::Empty,
        None => ForwardBody::Streamed(inbound),
    }
}

/// Decide the `content-type` to add to `headers`, if any.
///
/// Nothing is added when the header is already present, the body is empty, or
/// the directive is [`ContentTypeDirective::Suppress`]. Multipart bodies are
/// left to the transport unless a literal is forced.
pub fn resolve_content_type(
    headers: &HeaderMap,
    body: &ForwardBody,
    directive: &ContentTypeDirective,
    inbound_content_type: Option<&HeaderValue>,
) -> Option<HeaderValue> {
    if headers.contains_key(CONTENT_TYPE) || body.is_empty() {
        return None;
    }
    match directive {
        ContentTypeDirective::Suppress => None,
        ContentTypeDirective::Literal(value) => Some(value.clone()),
        ContentTypeDirective::Infer => match body {
            ForwardBody::Multipart(_) => None,
            ForwardBody::Buffered {
                content_type: Some(own),
                ..
            } => Some(own.clone()),
            _ => Some(
                inbound_content_type
                    .cloned()
                    .unwrap_or_else(|| HeaderValue::from_static("application/json")),
            ),
        },
    }
}
