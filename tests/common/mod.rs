#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use scalelog::{
    app::build_app,
    fakes::{MemoryStore, RecordingMailer},
    AppState,
};
use tower::ServiceExt;

pub const BOUNDARY: &str = "scalelog-test-boundary";

pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
    pub mailer: Arc<RecordingMailer>,
}

/// Full router over in-memory fakes. The OCR engine reads uploaded bytes as text.
pub fn test_app() -> TestApp {
    let (state, store, mailer) = AppState::fake();
    let router = build_app(state).expect("router builds");
    TestApp {
        router,
        store,
        mailer,
    }
}

impl TestApp {
    pub async fn send(&self, req: Request<Body>) -> (StatusCode, serde_json::Value) {
        let res = self.router.clone().oneshot(req).await.expect("router responds");
        let status = res.status();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .expect("read body");
        let json = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| serde_json::Value::String(String::from_utf8_lossy(&bytes).into()))
        };
        (status, json)
    }

    pub async fn request_link(&self, email: &str) -> StatusCode {
        let req = Request::builder()
            .method(Method::POST)
            .uri("/auth/request-magic-link")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::json!({ "email": email }).to_string()))
            .unwrap();
        self.send(req).await.0
    }

    pub async fn verify(&self, token: &str) -> (StatusCode, serde_json::Value) {
        let req = Request::builder()
            .uri(format!("/auth/verify?token={token}"))
            .body(Body::empty())
            .unwrap();
        self.send(req).await
    }

    /// Run the whole magic-link flow and return an access token.
    pub async fn login(&self, email: &str) -> String {
        assert_eq!(self.request_link(email).await, StatusCode::NO_CONTENT);
        let token = self
            .mailer
            .last()
            .await
            .and_then(|m| m.token())
            .expect("magic link mailed");
        let (status, body) = self.verify(&token).await;
        assert_eq!(status, StatusCode::OK, "verify failed: {body}");
        body["access_token"].as_str().expect("access token").to_string()
    }
}

pub fn get_authed(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap()
}

pub fn delete_authed(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method(Method::DELETE)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap()
}

pub enum Part<'a> {
    Text(&'a str, &'a str),
    File(&'a str, &'a str, &'a [u8]),
}

pub fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
                );
                body.extend_from_slice(value.as_bytes());
            }
            Part::File(name, content_type, data) => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"scale.jpg\"\r\n\
                         Content-Type: {content_type}\r\n\r\n"
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(data);
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub fn post_weight(token: Option<&str>, parts: &[Part<'_>]) -> Request<Body> {
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri("/weight")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        );
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(multipart_body(parts))).unwrap()
}
