//! Phase-1 parsers
//!
//! Each parser reads one independent slice of the request (path, headers,
//! body, `select`) and produces an immutable intermediate result. None of
//! them depends on another's output.

pub mod body;
pub mod headers;
pub mod route;
pub mod select;

pub use body::{Body, BodyError, classify_body, parse_body};
pub use headers::{Headers, PreferToken, Resolution, parse_headers};
pub use route::{Route, parse_route};
pub use select::{EmbeddedAliases, MAX_EMBED_DEPTH, SelectError, SelectResult, parse_select};
