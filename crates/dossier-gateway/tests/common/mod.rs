//! Shared test fixtures: a local mock of the backend REST service.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use serde_json::{json, Value};

use dossier_gateway::config::{GatewayConfig, ServerConfig, UpstreamConfig};
use dossier_gateway::forwarder::{ForwarderConfig, RequestForwarder};
use dossier_gateway::server::AppState;

pub const PDF_BYTES: &[u8] = b"%PDF-1.7\n%\xe2\xe3\xcf\xd3\nbinary";

/// A running mock backend.
///
/// Any path not listed below echoes the request it received as JSON. A
/// `mock_status` query parameter sets the echo's status code.
pub struct MockUpstream {
    pub base_url: String,
    hits: Arc<AtomicUsize>,
}

impl MockUpstream {
    pub async fn spawn() -> Self {
        let hits = Arc::new(AtomicUsize::new(0));
        let app = Router::new()
            .route("/json-created", get(json_created).post(json_created))
            .route("/text-missing", get(text_missing))
            .route("/bad-json", get(bad_json))
            .route("/documents/{id}/content", get(document_content))
            .fallback(echo)
            .with_state(hits.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{addr}"),
            hits,
        }
    }

    /// Number of requests that reached the echo handler.
    pub fn echo_hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    pub fn forwarder(&self) -> RequestForwarder {
        RequestForwarder::new(
            reqwest::Client::new(),
            ForwarderConfig::new(self.base_url.clone()),
        )
    }

    pub fn app_state(&self) -> AppState {
        app_state_for(&self.base_url)
    }
}

pub fn app_state_for(base_url: &str) -> AppState {
    let config = GatewayConfig {
        server: ServerConfig::default(),
        upstream: UpstreamConfig {
            base_url: base_url.to_string(),
            timeout_secs: 5,
            connect_timeout_secs: 2,
        },
        tracing: dossier_tracing::TracingConfig::default(),
    };
    AppState::new(config).unwrap()
}

/// Base URL of a port nothing is listening on.
pub async fn unreachable_base_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

async fn echo(
    State(hits): State<Arc<AtomicUsize>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    hits.fetch_add(1, Ordering::SeqCst);

    let status = uri
        .query()
        .unwrap_or_default()
        .split('&')
        .find_map(|pair| pair.strip_prefix("mock_status="))
        .and_then(|code| code.parse::<u16>().ok())
        .and_then(|code| StatusCode::from_u16(code).ok())
        .unwrap_or(StatusCode::OK);

    let mut header_map = BTreeMap::new();
    for name in headers.keys() {
        let values: Vec<&str> = headers
            .get_all(name)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .collect();
        header_map.insert(name.as_str().to_string(), values.join(", "));
    }

    let payload = json!({
        "method": method.as_str(),
        "path": uri.path(),
        "query": uri.query(),
        "headers": header_map,
        "content_type_count": headers.get_all(CONTENT_TYPE).iter().count(),
        "body": String::from_utf8_lossy(&body),
    });
    (status, axum::Json(payload)).into_response()
}

async fn json_created() -> Response {
    (StatusCode::CREATED, axum::Json(json!({"a": 1}))).into_response()
}

async fn text_missing() -> Response {
    (
        StatusCode::NOT_FOUND,
        [(CONTENT_TYPE, "text/plain")],
        "no such dossier",
    )
        .into_response()
}

async fn bad_json() -> Response {
    (
        StatusCode::OK,
        [(CONTENT_TYPE, "application/json")],
        "{not json",
    )
        .into_response()
}

async fn document_content() -> Response {
    (
        StatusCode::OK,
        [
            (CONTENT_TYPE, "application/pdf"),
            (CONTENT_DISPOSITION, "attachment; filename=\"report.pdf\""),
        ],
        PDF_BYTES,
    )
        .into_response()
}

/// Collect a response body as JSON.
pub async fn json_body(response: Response) -> Value {
    let bytes = body_bytes(response).await;
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn body_bytes(response: Response) -> Bytes {
    use http_body_util::BodyExt;
    response.into_body().collect().await.unwrap().to_bytes()
}

/// A hand-written multipart body with the given boundary.
pub fn multipart_body(boundary: &str, parts: &[(&str, Option<(&str, &str)>, &str)]) -> String {
    let mut body = String::new();
    for (name, file, data) in parts {
        body.push_str(&format!("--{boundary}\r\n"));
        match file {
            Some((file_name, content_type)) => {
                body.push_str(&format!(
                    "Content-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\n"
                ));
                body.push_str(&format!("Content-Type: {content_type}\r\n\r\n"));
            }
            None => {
                body.push_str(&format!(
                    "Content-Disposition: form-data; name=\"{name}\"\r\n\r\n"
                ));
            }
        }
        body.push_str(data);
        body.push_str("\r\n");
    }
    body.push_str(&format!("--{boundary}--\r\n"));
    body
}
