//! Schema routing, `Prefer` tokens and `Accept`

use log::warn;

use crate::ast::{CountStrategy, Handling, MissingPolicy, ReturnPreference, TxMode};
use crate::request::{IncomingRequest, Method};

const DEFAULT_ACCEPT: &str = "application/json";

/// `Prefer: resolution=...`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    MergeDuplicates,
    IgnoreDuplicates,
}

impl Resolution {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "merge-duplicates" => Some(Resolution::MergeDuplicates),
            "ignore-duplicates" => Some(Resolution::IgnoreDuplicates),
            _ => None,
        }
    }
}

/// One `key=value` directive of the `Prefer` header.
///
/// Keys or values outside the known vocabulary are kept as
/// [`PreferToken::Other`] rather than dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreferToken {
    Count(CountStrategy),
    Resolution(Resolution),
    Return(ReturnPreference),
    Tx(TxMode),
    Missing(MissingPolicy),
    Handling(Handling),
    MaxAffected(i64),
    Timezone(String),
    Params(String),
    Other { key: String, value: String },
}

impl PreferToken {
    pub fn parse(key: &str, value: &str) -> Self {
        let typed = match key {
            "count" => CountStrategy::from_name(value).map(PreferToken::Count),
            "resolution" => Resolution::from_name(value).map(PreferToken::Resolution),
            "return" => ReturnPreference::from_name(value).map(PreferToken::Return),
            "tx" => TxMode::from_name(value).map(PreferToken::Tx),
            "missing" => MissingPolicy::from_name(value).map(PreferToken::Missing),
            "handling" => Handling::from_name(value).map(PreferToken::Handling),
            "max-affected" => match value.parse::<i64>() {
                Ok(n) => Some(PreferToken::MaxAffected(n)),
                Err(_) => {
                    warn!("Ignoring non-numeric max-affected preference: {value:?}");
                    None
                }
            },
            "timezone" => Some(PreferToken::Timezone(value.to_string())),
            "params" => Some(PreferToken::Params(value.to_string())),
            _ => None,
        };
        typed.unwrap_or_else(|| PreferToken::Other {
            key: key.to_string(),
            value: value.to_string(),
        })
    }

    /// Left-hand side of the directive
    pub fn key(&self) -> &str {
        match self {
            PreferToken::Count(_) => "count",
            PreferToken::Resolution(_) => "resolution",
            PreferToken::Return(_) => "return",
            PreferToken::Tx(_) => "tx",
            PreferToken::Missing(_) => "missing",
            PreferToken::Handling(_) => "handling",
            PreferToken::MaxAffected(_) => "max-affected",
            PreferToken::Timezone(_) => "timezone",
            PreferToken::Params(_) => "params",
            PreferToken::Other { key, .. } => key,
        }
    }
}

/// Split a `Prefer` header into tokens, in header order.
///
/// Tokens without `=` carry no directive and are skipped.
pub fn tokenize_prefer(raw: &str) -> Vec<PreferToken> {
    raw.split(',')
        .map(str::trim)
        .filter_map(|token| token.split_once('='))
        .map(|(key, value)| PreferToken::parse(key.trim(), value.trim()))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Headers {
    pub schema: Option<String>,
    pub prefer: Vec<PreferToken>,
    pub accept: String,
}

impl Headers {
    pub fn has_prefer(&self, key: &str) -> bool {
        self.prefer.iter().any(|t| t.key() == key)
    }
}

pub fn parse_headers<R: IncomingRequest>(req: &R, method: &Method) -> Headers {
    let profile = if method.is_read() {
        "accept-profile"
    } else {
        "content-profile"
    };

    Headers {
        schema: req.header(profile),
        prefer: req
            .header("prefer")
            .map(|raw| tokenize_prefer(&raw))
            .unwrap_or_default(),
        accept: req
            .header("accept")
            .unwrap_or_else(|| DEFAULT_ACCEPT.to_string()),
    }
}
