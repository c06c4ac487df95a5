//! HTTP handler

use std::sync::Arc;
use std::time::Instant;

use axum::Json;
use axum::extract::{Request, State};
use log::{debug, info, warn};
use pgrest_ast::ast::Ast;

use crate::error::AppError;
use crate::request::AxumRequest;
use crate::state::AppState;

/// Translate any request into its AST
pub async fn translate(
    State(state): State<Arc<AppState>>,
    req: Request,
) -> Result<Json<Ast>, AppError> {
    let start = Instant::now();
    let method = req.method().clone();
    let uri = req.uri().clone();
    info!("{} {}", method, uri.path());
    debug!("Full URI: {}", uri);

    let req = AxumRequest::new(req, state.max_body_bytes);
    match state.translator.translate(req).await {
        Ok(ast) => {
            info!(
                "Translated {} {} to {} in {:.2?}",
                method,
                uri.path(),
                ast.kind.as_str(),
                start.elapsed()
            );
            Ok(Json(ast))
        }
        Err(e) => {
            warn!("Translation failed in {:.2?}: {}", start.elapsed(), e);
            Err(e.into())
        }
    }
}
