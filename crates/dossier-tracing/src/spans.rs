//! Span builder helpers for gateway instrumentation.

/// Create a span for one inbound API request.
///
/// Usage: `let span = gateway_request_span!(correlation_id, method, path);`
///
/// `status` is recorded once the relayed response (or mapped error) is known.
#[macro_export]
macro_rules! gateway_request_span {
    ($correlation_id:expr, $method:expr, $path:expr) => {
        tracing::info_span!(
            "gateway_request",
            correlation_id = %$correlation_id,
            method = %$method,
            path = %$path,
            status = tracing::field::Empty,
        )
    };
}

/// Create a span for the single outbound call to the upstream backend.
#[macro_export]
macro_rules! upstream_forward_span {
    ($correlation_id:expr, $method:expr, $url:expr) => {
        tracing::info_span!(
            "upstream_forward",
            correlation_id = %$correlation_id,
            method = %$method,
            url = %$url,
            streaming = tracing::field::Empty,
            status = tracing::field::Empty,
            latency_ms = tracing::field::Empty,
        )
    };
}
