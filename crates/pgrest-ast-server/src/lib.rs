//! pgrest-ast-server - HTTP front end for the translator
//!
//! Every request that reaches the router, whatever its path or method, is
//! translated and answered with the AST as JSON. Nothing is executed.
//!
//! # Example
//!
//! ```ignore
//! use pgrest_ast_server::{AppState, build_router};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let state = Arc::new(AppState::default());
//!     let router = build_router(state);
//!     let listener = tokio::net::TcpListener::bind("127.0.0.1:3000").await.unwrap();
//!     axum::serve(listener, router).await.unwrap();
//! }
//! ```

pub mod error;
pub mod http;
pub mod request;
pub mod state;

pub use error::AppError;
pub use request::AxumRequest;
pub use state::{AppState, DEFAULT_MAX_BODY_BYTES, ErrorResponse};

use std::sync::Arc;

use axum::Router;
use tower_http::cors::CorsLayer;

/// Build the axum router. All paths fall through to the translate handler.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .fallback(http::translate)
        .layer(CorsLayer::permissive())
        .with_state(state)
}
