//! Forwarding one inbound API request to the upstream backend.
//!
//! A call is split into a pure planning step ([`RequestForwarder::plan`]),
//! which decides URL, headers and body, and a single network call whose
//! response is relayed back. Nothing is retained between calls.

mod body;
mod error;
mod headers;
mod relay;

use std::time::Instant;

use axum::extract::Request;
use axum::http::header::{CACHE_CONTROL, CONTENT_TYPE};
use axum::http::{HeaderMap, HeaderName, HeaderValue, Method};
use tracing::Instrument;

use crate::correlation::{CorrelationId, CORRELATION_HEADER};

pub use body::{method_allows_body, ContentTypeDirective, ForwardBody};
pub use error::ForwardError;
pub use headers::{token_from_cookie, TOKEN_COOKIE};
pub use relay::RelayedResponse;

/// Settings the forwarder is constructed with.
#[derive(Debug, Clone)]
pub struct ForwarderConfig {
    pub upstream_base_url: String,
}

impl ForwarderConfig {
    pub fn new(upstream_base_url: impl Into<String>) -> Self {
        Self {
            upstream_base_url: upstream_base_url.into(),
        }
    }
}

/// Per-call adjustments supplied by a call site.
#[derive(Debug, Default)]
pub struct ForwardOptions {
    /// `None` means "use the inbound body"; `Some(ForwardBody::Empty)`
    /// explicitly sends none.
    pub body: Option<ForwardBody>,
    /// Added to the outbound request before authorization and cookie
    /// reconciliation; these win over anything derived from the inbound request.
    pub headers: HeaderMap,
    pub content_type: ContentTypeDirective,
}

impl ForwardOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn body(mut self, body: ForwardBody) -> Self {
        self.body = Some(body);
        self
    }

    /// Explicitly send no body, whatever the inbound request carried.
    pub fn no_body(self) -> Self {
        self.body(ForwardBody::Empty)
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn content_type(mut self, directive: ContentTypeDirective) -> Self {
        self.content_type = directive;
        self
    }
}

/// Fully resolved outbound request, before it is sent.
#[derive(Debug)]
pub struct OutboundRequest {
    pub method: Method,
    pub url: reqwest::Url,
    pub headers: HeaderMap,
    pub body: ForwardBody,
}

impl OutboundRequest {
    /// True when the body is piped from the inbound connection while the
    /// outbound request is being written, rather than buffered first.
    pub fn is_streaming(&self) -> bool {
        self.body.is_streamed()
    }
}

/// Forwards inbound requests to `upstream_base_url + target_path`.
///
/// Cheap to clone; holds no per-request state.
#[derive(Clone)]
pub struct RequestForwarder {
    client: reqwest::Client,
    config: ForwarderConfig,
}

impl RequestForwarder {
    pub fn new(client: reqwest::Client, config: ForwarderConfig) -> Self {
        Self { client, config }
    }

    /// Forward `inbound` to `target_path` and relay the upstream response.
    ///
    /// Exactly one upstream call is made. Transport failures and malformed
    /// JSON are returned to the caller; upstream error statuses are not
    /// failures and come back as a normal [`RelayedResponse`].
    pub async fn forward(
        &self,
        inbound: Request,
        target_path: &str,
        options: ForwardOptions,
    ) -> Result<RelayedResponse, ForwardError> {
        let correlation_id = CorrelationId::of(&inbound);
        let outbound = self.plan_correlated(inbound, target_path, options, &correlation_id)?;
        let method = outbound.method.clone();

        let span = dossier_tracing::upstream_forward_span!(
            &correlation_id,
            &outbound.method,
            &outbound.url
        );
        span.record("streaming", outbound.is_streaming());

        async {
            let start = Instant::now();
            let result = self.execute(outbound).await;
            let latency = start.elapsed().as_millis() as u64;
            tracing::Span::current().record("latency_ms", latency);

            let upstream = match result {
                Ok(resp) => resp,
                Err(e) => {
                    tracing::warn!(error = %e, latency_ms = latency, "Upstream call failed");
                    return Err(e);
                }
            };

            let status = upstream.status();
            tracing::Span::current().record("status", status.as_u16());
            tracing::info!(
                status = status.as_u16(),
                latency_ms = latency,
                "Forward complete"
            );

            relay::relay(&method, upstream).await
        }
        .instrument(span)
        .await
    }

    /// Resolve URL, headers and body for `inbound` without sending anything.
    pub fn plan(
        &self,
        inbound: Request,
        target_path: &str,
        options: ForwardOptions,
    ) -> Result<OutboundRequest, ForwardError> {
        let correlation_id = CorrelationId::of(&inbound);
        self.plan_correlated(inbound, target_path, options, &correlation_id)
    }

    fn plan_correlated(
        &self,
        inbound: Request,
        target_path: &str,
        options: ForwardOptions,
        correlation_id: &CorrelationId,
    ) -> Result<OutboundRequest, ForwardError> {
        let url = self.upstream_url(target_path)?;
        let (parts, inbound_body) = inbound.into_parts();

        let mut headers = headers::reconcile(&parts.headers, &options.headers);
        let body = body::resolve_body(&parts.method, inbound_body, options.body);

        if let Some(content_type) = body::resolve_content_type(
            &headers,
            &body,
            &options.content_type,
            parts.headers.get(CONTENT_TYPE),
        ) {
            headers.insert(CONTENT_TYPE, content_type);
        }

        if !headers.contains_key(CACHE_CONTROL) {
            headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-store"));
        }
        if !headers.contains_key(CORRELATION_HEADER) {
            headers.insert(CORRELATION_HEADER, correlation_id.header_value());
        }

        Ok(OutboundRequest {
            method: parts.method,
            url,
            headers,
            body,
        })
    }

    /// Join `target_path` onto the configured base URL.
    pub fn upstream_url(&self, target_path: &str) -> Result<reqwest::Url, ForwardError> {
        let base = self.config.upstream_base_url.trim_end_matches('/');
        let joined = if target_path.starts_with('/') {
            format!("{base}{target_path}")
        } else {
            format!("{base}/{target_path}")
        };
        reqwest::Url::parse(&joined).map_err(|e| ForwardError::InvalidTarget {
            target: target_path.to_string(),
            reason: e.to_string(),
        })
    }

    async fn execute(&self, outbound: OutboundRequest) -> Result<reqwest::Response, ForwardError> {
        let builder = self
            .client
            .request(outbound.method, outbound.url)
            .headers(outbound.headers);

        let builder = match outbound.body {
            ForwardBody::Empty => builder,
            ForwardBody::Buffered { bytes, .. } => builder.body(bytes),
            ForwardBody::Streamed(body) => {
                builder.body(reqwest::Body::wrap_stream(body.into_data_stream()))
            }
            ForwardBody::Multipart(form) => builder.multipart(form),
        };

        Ok(builder.send().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::header::{AUTHORIZATION, COOKIE};

    fn forwarder(base: &str) -> RequestForwarder {
        RequestForwarder::new(reqwest::Client::new(), ForwarderConfig::new(base))
    }

    fn request(method: Method) -> axum::http::request::Builder {
        axum::http::Request::builder().method(method).uri("/local/x")
    }

    #[test]
    fn test_url_join() {
        let f = forwarder("http://backend:8080/api/");
        assert_eq!(
            f.upstream_url("/dossiers/7?expand=machines").unwrap().as_str(),
            "http://backend:8080/api/dossiers/7?expand=machines"
        );
        assert_eq!(
            f.upstream_url("dossiers").unwrap().as_str(),
            "http://backend:8080/api/dossiers"
        );
    }

    #[test]
    fn test_invalid_base_is_invalid_target() {
        let f = forwarder("not a url");
        let err = f.upstream_url("/x").unwrap_err();
        assert!(matches!(err, ForwardError::InvalidTarget { .. }));
    }

    #[test]
    fn test_plan_put_with_cookie_token() {
        let f = forwarder("http://backend");
        let inbound = request(Method::PUT)
            .header(COOKIE, "token=T1")
            .body(Body::from(r#"{"name":"A"}"#))
            .unwrap();

        let outbound = f.plan(inbound, "/upstream/x", ForwardOptions::new()).unwrap();
        assert_eq!(outbound.method, Method::PUT);
        assert_eq!(outbound.url.as_str(), "http://backend/upstream/x");
        assert_eq!(outbound.headers[AUTHORIZATION], "Bearer T1");
        assert_eq!(outbound.headers[CONTENT_TYPE], "application/json");
        assert_eq!(outbound.headers[CACHE_CONTROL], "no-store");
        assert!(outbound.is_streaming());
    }

    #[test]
    fn test_plan_get_drops_body_and_content_type() {
        let f = forwarder("http://backend");
        let inbound = request(Method::GET)
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from("{}"))
            .unwrap();

        let outbound = f
            .plan(inbound, "/dossiers", ForwardOptions::new().body(ForwardBody::json(&1).unwrap()))
            .unwrap();
        assert!(matches!(outbound.body, ForwardBody::Empty));
        assert!(outbound.headers.get(CONTENT_TYPE).is_none());
        assert!(!outbound.is_streaming());
    }

    #[test]
    fn test_plan_suppress_directive() {
        let f = forwarder("http://backend");
        let inbound = request(Method::POST)
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from("{}"))
            .unwrap();

        let outbound = f
            .plan(
                inbound,
                "/x",
                ForwardOptions::new().content_type(ContentTypeDirective::Suppress),
            )
            .unwrap();
        assert!(outbound.headers.get(CONTENT_TYPE).is_none());
    }

    #[test]
    fn test_plan_multipart_without_content_type() {
        let f = forwarder("http://backend");
        let inbound = request(Method::POST)
            .header(CONTENT_TYPE, "multipart/form-data; boundary=browser")
            .body(Body::empty())
            .unwrap();
        let form = reqwest::multipart::Form::new().text("name", "A");

        let outbound = f
            .plan(inbound, "/x", ForwardOptions::new().body(ForwardBody::Multipart(form)))
            .unwrap();
        assert!(outbound.body.is_multipart());
        assert!(outbound.headers.get(CONTENT_TYPE).is_none());
    }

    #[test]
    fn test_plan_keeps_explicit_cache_control() {
        let f = forwarder("http://backend");
        let inbound = request(Method::GET).body(Body::empty()).unwrap();
        let options = ForwardOptions::new().header(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
        let outbound = f.plan(inbound, "/x", options).unwrap();
        assert_eq!(outbound.headers[CACHE_CONTROL], "no-cache");
    }

    #[test]
    fn test_plan_sets_correlation_header_once() {
        let f = forwarder("http://backend");
        let inbound = request(Method::GET)
            .header(CORRELATION_HEADER, "from-client")
            .body(Body::empty())
            .unwrap();
        let outbound = f.plan(inbound, "/x", ForwardOptions::new()).unwrap();
        assert_eq!(outbound.headers[CORRELATION_HEADER], "from-client");

        let inbound = request(Method::GET)
            .header(CORRELATION_HEADER, "from-client")
            .body(Body::empty())
            .unwrap();
        let options = ForwardOptions::new().header(
            HeaderName::from_static(CORRELATION_HEADER),
            HeaderValue::from_static("from-call-site"),
        );
        let outbound = f.plan(inbound, "/x", options).unwrap();
        assert_eq!(outbound.headers[CORRELATION_HEADER], "from-call-site");
        assert_eq!(outbound.headers.get_all(CORRELATION_HEADER).iter().count(), 1);
    }
}
