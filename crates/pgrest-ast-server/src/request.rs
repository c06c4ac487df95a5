//! Adapter from axum requests to the translator's request contract

use std::future::Future;

use axum::body::{Body, to_bytes};
use axum::extract::Request;
use axum::http::HeaderMap;
use pgrest_ast::{BodyError, IncomingRequest, Method};

/// An axum request with its body still unread
pub struct AxumRequest {
    method: Method,
    url: String,
    headers: HeaderMap,
    body: Option<Body>,
    max_body_bytes: usize,
}

impl AxumRequest {
    pub fn new(req: Request, max_body_bytes: usize) -> Self {
        let (parts, body) = req.into_parts();
        Self {
            method: Method::parse(parts.method.as_str()),
            url: parts.uri.to_string(),
            headers: parts.headers,
            body: Some(body),
            max_body_bytes,
        }
    }
}

impl IncomingRequest for AxumRequest {
    fn method(&self) -> Method {
        self.method.clone()
    }

    fn url(&self) -> &str {
        &self.url
    }

    /// Repeated headers are joined with `", "`; non-UTF-8 values are skipped.
    fn header(&self, name: &str) -> Option<String> {
        let values: Vec<&str> = self
            .headers
            .get_all(name)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .collect();
        if values.is_empty() {
            None
        } else {
            Some(values.join(", "))
        }
    }

    fn read_body(&mut self) -> impl Future<Output = Result<Vec<u8>, BodyError>> + Send {
        let body = self.body.take();
        let limit = self.max_body_bytes;
        async move {
            let Some(body) = body else {
                return Ok(Vec::new());
            };
            let bytes = to_bytes(body, limit)
                .await
                .map_err(|e| BodyError::Read(e.to_string()))?;
            Ok(bytes.to_vec())
        }
    }
}
