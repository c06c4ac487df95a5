//! Request abstraction and query-string access
//!
//! The translator only needs four things from a request: its method, its
//! URL, header lookup and the body. [`IncomingRequest`] captures that so any
//! HTTP stack can be adapted; [`Request`] is the in-memory implementation
//! used by tests and embedders.

use std::fmt;
use std::future::Future;

use indexmap::IndexMap;
use url::Url;

use crate::parse::body::BodyError;

const URL_BASE: &str = "http://localhost";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Method {
    Get,
    Head,
    Post,
    Put,
    Patch,
    Delete,
    Options,
    Other(String),
}

impl Method {
    /// Case-insensitive; unknown verbs are kept upper-cased
    pub fn parse(raw: &str) -> Self {
        match raw.to_ascii_uppercase().as_str() {
            "GET" => Method::Get,
            "HEAD" => Method::Head,
            "POST" => Method::Post,
            "PUT" => Method::Put,
            "PATCH" => Method::Patch,
            "DELETE" => Method::Delete,
            "OPTIONS" => Method::Options,
            other => Method::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Method::Get => "GET",
            Method::Head => "HEAD",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
            Method::Options => "OPTIONS",
            Method::Other(name) => name,
        }
    }

    /// GET and HEAD: read-only, no body
    pub fn is_read(&self) -> bool {
        matches!(self, Method::Get | Method::Head)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the translator reads from an HTTP request.
///
/// Header names passed to [`IncomingRequest::header`] are lower-case;
/// implementations must match case-insensitively and join repeated headers
/// with `", "`.
pub trait IncomingRequest {
    fn method(&self) -> Method;

    /// Absolute URL or origin-form (`/path?query`)
    fn url(&self) -> &str;

    fn header(&self, name: &str) -> Option<String>;

    /// Whole request body. Called at most once, never for GET/HEAD.
    fn read_body(&mut self) -> impl Future<Output = Result<Vec<u8>, BodyError>> + Send;
}

/// In-memory request
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    url: String,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
}

impl Request {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::Get, url)
    }

    pub fn head(url: impl Into<String>) -> Self {
        Self::new(Method::Head, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::Post, url)
    }

    pub fn patch(url: impl Into<String>) -> Self {
        Self::new(Method::Patch, url)
    }

    pub fn delete(url: impl Into<String>) -> Self {
        Self::new(Method::Delete, url)
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// JSON body plus `Content-Type: application/json`
    pub fn json(self, value: &serde_json::Value) -> Self {
        self.header("Content-Type", "application/json")
            .body(value.to_string())
    }
}

impl IncomingRequest for Request {
    fn method(&self) -> Method {
        self.method.clone()
    }

    fn url(&self) -> &str {
        &self.url
    }

    fn header(&self, name: &str) -> Option<String> {
        let values: Vec<&str> = self
            .headers
            .iter()
            .filter(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
            .collect();
        if values.is_empty() {
            None
        } else {
            Some(values.join(", "))
        }
    }

    fn read_body(&mut self) -> impl Future<Output = Result<Vec<u8>, BodyError>> + Send {
        let body = std::mem::take(&mut self.body);
        async move { Ok(body) }
    }
}

/// Parse an absolute or origin-form request URL
pub fn parse_url(raw: &str) -> Result<Url, url::ParseError> {
    match Url::parse(raw) {
        Ok(url) => Ok(url),
        Err(url::ParseError::RelativeUrlWithoutBase) => Url::parse(URL_BASE)?.join(raw),
        Err(e) => Err(e),
    }
}

// ============ Query parameters ============

/// Query string as `name -> [values]`, keys in first-seen order and
/// repeated values in arrival order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams(IndexMap<String, Vec<String>>);

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_url(url: &Url) -> Self {
        let mut params = Self::new();
        for (key, value) in url.query_pairs() {
            params.push(key.into_owned(), value.into_owned());
        }
        params
    }

    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.entry(key.into()).or_default().push(value.into());
    }

    pub fn get(&self, key: &str) -> Option<&[String]> {
        self.0.get(key).map(Vec::as_slice)
    }

    /// First value of a repeated key
    pub fn first(&self, key: &str) -> Option<&str> {
        self.0
            .get(key)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, String)> for QueryParams {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        let mut params = Self::new();
        for (key, value) in iter {
            params.push(key, value);
        }
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_parse_is_case_insensitive() {
        assert_eq!(Method::parse("get"), Method::Get);
        assert_eq!(Method::parse("Patch"), Method::Patch);
        assert_eq!(Method::parse("purge"), Method::Other("PURGE".into()));
        assert!(Method::Head.is_read());
        assert!(!Method::Post.is_read());
    }

    #[test]
    fn headers_match_case_insensitively_and_join() {
        let req = Request::get("/")
            .header("Prefer", "count=exact")
            .header("prefer", "tx=rollback");
        assert_eq!(
            IncomingRequest::header(&req, "prefer").as_deref(),
            Some("count=exact, tx=rollback")
        );
        assert_eq!(IncomingRequest::header(&req, "accept"), None);
    }

    #[test]
    fn origin_form_urls_resolve_against_localhost() {
        let url = parse_url("/rest/v1/items?a=1").unwrap();
        assert_eq!(url.path(), "/rest/v1/items");
        let url = parse_url("https://example.com/x").unwrap();
        assert_eq!(url.host_str(), Some("example.com"));
    }

    #[test]
    fn query_params_keep_duplicates_in_order() {
        let url = parse_url("/t?price=gte.100&a=x%20y&price=lte.500&b=c+d").unwrap();
        let params = QueryParams::from_url(&url);
        assert_eq!(
            params.get("price").unwrap(),
            &["gte.100".to_string(), "lte.500".to_string()]
        );
        assert_eq!(params.first("a"), Some("x y"));
        assert_eq!(params.first("b"), Some("c d"));
        let keys: Vec<&str> = params.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, ["price", "a", "b"]);
    }
}
