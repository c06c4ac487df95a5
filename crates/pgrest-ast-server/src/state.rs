//! Shared server state and response bodies

use pgrest_ast::Translator;
use serde::{Deserialize, Serialize};

pub const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;

/// Shared server state
#[derive(Debug, Clone)]
pub struct AppState {
    pub translator: Translator,
    /// Bodies larger than this fail to read
    pub max_body_bytes: usize,
}

impl AppState {
    pub fn new(translator: Translator, max_body_bytes: usize) -> Self {
        Self {
            translator,
            max_body_bytes,
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(Translator::default(), DEFAULT_MAX_BODY_BYTES)
    }
}

/// Error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
