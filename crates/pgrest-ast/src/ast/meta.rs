//! Response-shaping metadata (`$meta`)

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Cardinality {
    One,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CountStrategy {
    Exact,
    Planned,
    Estimated,
}

impl CountStrategy {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "exact" => Some(CountStrategy::Exact),
            "planned" => Some(CountStrategy::Planned),
            "estimated" => Some(CountStrategy::Estimated),
            _ => None,
        }
    }
}

/// What to do with columns missing from a payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingPolicy {
    Null,
    Default,
}

impl MissingPolicy {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "null" => Some(MissingPolicy::Null),
            "default" => Some(MissingPolicy::Default),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Handling {
    Strict,
    Lenient,
}

impl Handling {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "strict" => Some(Handling::Strict),
            "lenient" => Some(Handling::Lenient),
            _ => None,
        }
    }
}

/// `Prefer: return=...`; parsed but not part of `$meta`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReturnPreference {
    Minimal,
    HeadersOnly,
    Representation,
}

impl ReturnPreference {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "minimal" => Some(ReturnPreference::Minimal),
            "headers-only" => Some(ReturnPreference::HeadersOnly),
            "representation" => Some(ReturnPreference::Representation),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TxMode {
    Commit,
    Rollback,
}

impl TxMode {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "commit" => Some(TxMode::Commit),
            "rollback" => Some(TxMode::Rollback),
            _ => None,
        }
    }
}

/// Flags of an `application/vnd.pgrst.plan+...` Accept header
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ExplainOptions {
    pub analyze: bool,
    pub verbose: bool,
    pub settings: bool,
    pub buffers: bool,
    pub wal: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Meta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cardinality: Option<Cardinality>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<CountStrategy>,
    #[serde(skip_serializing_if = "is_false")]
    pub head: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_affected: Option<i64>,
    #[serde(skip_serializing_if = "is_false")]
    pub rollback: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub missing: Option<MissingPolicy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub handling: Option<Handling>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub columns: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explain: Option<ExplainOptions>,
}

fn is_false(flag: &bool) -> bool {
    !*flag
}

impl Meta {
    /// True when nothing would be serialized
    pub fn is_empty(&self) -> bool {
        *self == Meta::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn default_meta_is_empty() {
        assert!(Meta::default().is_empty());
        assert_eq!(serde_json::to_value(Meta::default()).unwrap(), json!({}));
    }

    #[test]
    fn meta_uses_camel_case_keys() {
        let meta = Meta {
            head: true,
            max_affected: Some(5),
            count: Some(CountStrategy::Planned),
            explain: Some(ExplainOptions {
                analyze: true,
                ..Default::default()
            }),
            ..Default::default()
        };
        assert!(!meta.is_empty());
        assert_eq!(
            serde_json::to_value(&meta).unwrap(),
            json!({
                "count": "planned",
                "head": true,
                "maxAffected": 5,
                "explain": {
                    "analyze": true,
                    "verbose": false,
                    "settings": false,
                    "buffers": false,
                    "wal": false,
                },
            })
        );
    }
}
