//! pgrest-ast - PostgREST requests to query ASTs
//!
//! Translates an HTTP request in the PostgREST URL/header convention into a
//! dialect-independent query AST. Nothing is executed and no schema is
//! consulted; the AST is meant for a separate SQL generator.
//!
//! ## Quick Start
//!
//! ```ignore
//! use pgrest_ast::{Request, Translator};
//!
//! let translator = Translator::default();
//! let ast = translator
//!     .translate(
//!         Request::get("/rest/v1/products?select=id,categories!inner(name)&price=gt.100&limit=10")
//!             .header("Accept-Profile", "public"),
//!     )
//!     .await?;
//!
//! let json = serde_json::to_value(&ast)?;
//! ```
//!
//! ## Pipeline
//!
//! - Phase 1 (`parse`): route, headers, `select` and body, each independent
//! - Phase 2 (`resolve`): statement type, filters, transforms, `$meta`, RPC
//!   arguments and upsert options
//! - Assembly: embedded filters and transforms are spliced into the select
//!   tree at the embed they address, to any depth
//!
//! Any phase can be replaced through [`Phases`] and
//! [`Translator::with_phases`].

pub mod ast;
pub mod operators;
pub mod parse;
pub mod phases;
pub mod render;
pub mod request;
pub mod resolve;
mod translate;
pub mod values;

use thiserror::Error;

// ============ Primary Public API ============

pub use ast::{Ast, AstType, SelectEntry, Target, Where};
pub use phases::{DefaultPhases, Phases};
pub use render::{SelectDisplay, render_select};
pub use request::{IncomingRequest, Method, QueryParams, Request};
pub use translate::{DEFAULT_BASE_PATH, Translator, TranslatorConfig};

pub use parse::{BodyError, SelectError};
pub use resolve::{FilterError, TransformError};

// ============ Errors ============

/// Why a request could not be translated. No partial AST is produced.
#[derive(Error, Debug)]
pub enum TranslateError {
    #[error("Invalid request URL {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("Select parse error: {0}")]
    Select(#[from] SelectError),
    #[error("Filter error: {0}")]
    Filter(#[from] FilterError),
    #[error("Body error: {0}")]
    Body(#[from] BodyError),
    #[error("Transform error: {0}")]
    Transform(#[from] TransformError),
}
