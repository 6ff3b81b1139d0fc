//! In-process stand-in for the forensics service that records every request.

#![allow(dead_code)]

use axum::{
    Router,
    body::{Body, Bytes},
    extract::{FromRequest, Multipart, State},
    http::{HeaderMap, Method, StatusCode, Uri, header},
    response::{IntoResponse, Response},
};
use image_forensics::{ClientConfig, ForensicsClient};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl RecordedRequest {
    pub fn is_multipart(&self) -> bool {
        self.content_type
            .as_deref()
            .is_some_and(|ct| ct.starts_with("multipart/form-data"))
    }

    /// Number of multipart parts named `name`, plain or RFC 5987 encoded.
    pub fn field_count(&self, name: &str) -> usize {
        let body = String::from_utf8_lossy(&self.body);
        let plain = format!("name=\"{name}\"");
        let encoded = format!(
            "name*=utf-8''{}",
            name.replace('[', "%5B").replace(']', "%5D")
        );
        body.matches(&plain).count() + body.matches(&encoded).count()
    }

    pub fn body_contains(&self, needle: &str) -> bool {
        String::from_utf8_lossy(&self.body).contains(needle)
    }

    /// The `boundary=` parameter of a multipart content type.
    pub fn boundary(&self) -> Option<String> {
        let ct = self.content_type.as_deref()?;
        ct.split(';')
            .map(str::trim)
            .find_map(|param| param.strip_prefix("boundary="))
            .map(|b| b.trim_matches('"').to_string())
    }

    /// Run the recorded body through axum's multipart parser and return the
    /// part names in order.
    pub async fn parse_multipart(&self) -> Result<Vec<String>, String> {
        let mut builder = axum::http::Request::builder().method(Method::POST);
        if let Some(ct) = &self.content_type {
            builder = builder.header(header::CONTENT_TYPE, ct);
        }
        let request = builder.body(Body::from(self.body.clone())).unwrap();
        let mut multipart = Multipart::from_request(request, &())
            .await
            .map_err(|e| e.body_text())?;

        let mut names = Vec::new();
        while let Some(field) = multipart.next_field().await.map_err(|e| e.body_text())? {
            names.push(field.name().unwrap_or_default().to_string());
        }
        Ok(names)
    }
}

#[derive(Clone, Default)]
struct MockState {
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    responses: Arc<HashMap<String, (StatusCode, String)>>,
    delay: Duration,
}

pub struct MockServer {
    pub base_url: String,
    state: MockState,
}

impl MockServer {
    /// Serve canned `(path, status, body)` responses; unknown paths get a 404 envelope.
    pub async fn start(responses: Vec<(&str, StatusCode, &str)>) -> Self {
        Self::start_with_delay(responses, Duration::ZERO).await
    }

    /// Like [`start`](Self::start), but every response is held back for `delay`.
    pub async fn start_with_delay(
        responses: Vec<(&str, StatusCode, &str)>,
        delay: Duration,
    ) -> Self {
        let responses = responses
            .into_iter()
            .map(|(path, status, body)| (path.to_string(), (status, body.to_string())))
            .collect();
        let state = MockState {
            requests: Arc::default(),
            responses: Arc::new(responses),
            delay,
        };

        let app = Router::new().fallback(record).with_state(state.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{addr}"),
            state,
        }
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().unwrap().clone()
    }

    pub fn client(&self) -> ForensicsClient {
        client_for(&self.base_url)
    }
}

/// A client that ignores any proxy settings in the environment.
pub fn client_for(base_url: &str) -> ForensicsClient {
    let http = reqwest::Client::builder().no_proxy().build().unwrap();
    ForensicsClient::with_http_client(ClientConfig::new(base_url), http)
}

/// A base URL nothing is listening on.
pub async fn unreachable_base_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

async fn record(
    State(state): State<MockState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let path = uri.path().to_string();
    state.requests.lock().unwrap().push(RecordedRequest {
        method,
        path: path.clone(),
        content_type: headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(String::from),
        body: body.to_vec(),
    });

    if !state.delay.is_zero() {
        tokio::time::sleep(state.delay).await;
    }

    let (status, body) = state.responses.get(&path).cloned().unwrap_or((
        StatusCode::NOT_FOUND,
        r#"{"status":"error","message":"Not found"}"#.to_string(),
    ));
    (status, [(header::CONTENT_TYPE, "application/json")], body).into_response()
}
