//! Request body classification

use thiserror::Error;

use crate::request::{IncomingRequest, Method};

const SNIPPET_CHARS: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BodyError {
    #[error("Invalid JSON body: {snippet}")]
    InvalidJson { snippet: String },

    #[error("Failed to read request body: {0}")]
    Read(String),
}

/// What the body carried
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Body {
    #[default]
    Empty,
    /// A JSON object or array; whether these are row values or RPC
    /// arguments is decided later
    Values(serde_json::Value),
    /// Non-JSON text, passed to RPC functions as-is
    Raw(String),
}

/// Read and classify the body. GET and HEAD never touch it.
pub async fn parse_body<R: IncomingRequest>(
    req: &mut R,
    method: &Method,
) -> Result<Body, BodyError> {
    if method.is_read() {
        return Ok(Body::Empty);
    }
    let bytes = req.read_body().await?;
    let content_type = req.header("content-type").unwrap_or_default();
    classify_body(&bytes, &content_type)
}

pub fn classify_body(bytes: &[u8], content_type: &str) -> Result<Body, BodyError> {
    let text = String::from_utf8_lossy(bytes);
    if text.is_empty() {
        return Ok(Body::Empty);
    }

    if content_type.contains("application/json") {
        return serde_json::from_str(&text)
            .map(Body::Values)
            .map_err(|_| BodyError::InvalidJson {
                snippet: text.chars().take(SNIPPET_CHARS).collect(),
            });
    }

    Ok(Body::Raw(text.into_owned()))
}
