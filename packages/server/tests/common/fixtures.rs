//! Test fixtures: template payloads, multipart bodies, request helpers.

use axum::{
    body::{to_bytes, Body},
    http::{header::CONTENT_TYPE, Request, StatusCode},
    response::Response,
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

const BOUNDARY: &str = "listing-test-boundary";

/// The single-logo, two-photo template used across the integration tests
pub fn t1_template() -> Value {
    json!({
        "template_name": "t1",
        "realtor": {"name": "r_name", "address": "r_addr", "email": "r_email", "photo": "r_photo"},
        "logos": ["l1"],
        "property_images": ["p1", "p2"],
        "text_fields": ["f_title", "f_price"]
    })
}

/// A template with the given slot counts and no realtor photo
pub fn template_with(name: &str, logos: usize, photos: usize, fields: &[&str]) -> Value {
    json!({
        "template_name": name,
        "realtor": {"name": "r_name", "address": "r_addr", "email": "r_email"},
        "logos": (1..=logos).map(|i| format!("logo_{}", i)).collect::<Vec<_>>(),
        "property_images": (1..=photos).map(|i| format!("photo_{}", i)).collect::<Vec<_>>(),
        "text_fields": fields,
    })
}

/// Builder for `multipart/form-data` request bodies
#[derive(Default)]
pub struct MultipartBody {
    body: Vec<u8>,
}

impl MultipartBody {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                BOUNDARY, name, value
            )
            .as_bytes(),
        );
        self
    }

    pub fn file(mut self, name: &str, filename: &str, content_type: &str, bytes: &[u8]) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                BOUNDARY, name, filename, content_type
            )
            .as_bytes(),
        );
        self.body.extend_from_slice(bytes);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    /// Realtor contact fields every submission needs
    pub fn realtor(self) -> Self {
        self.text("name", "Jane Doe")
            .text("email", "jane@example.com")
            .text("address", "1 Main St")
    }

    pub fn into_request(mut self, uri: &str) -> Request<Body> {
        self.body
            .extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(
                CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(self.body))
            .unwrap()
    }
}

pub fn json_request(method: &str, uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn get_request(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

/// Send one request through the router and decode the JSON response
pub async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response: Response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

/// Upload templates and assert they were stored
pub async fn upload_templates(app: Router, payload: Value) {
    let (status, body) = send(app, json_request("POST", "/upload-template/", &payload)).await;
    assert_eq!(status, StatusCode::CREATED, "upload failed: {}", body);
}
