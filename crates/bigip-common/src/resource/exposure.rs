//! Exposure records: which protocol(s) a WAF-protected rule is reachable under

use serde::{Deserialize, Serialize};

/// Protocol exposure of an additional device resource
///
/// Unknown values are kept verbatim so they can be reported; they never match
/// a policy.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(from = "String", into = "String")]
pub enum Exposure {
    /// Reachable over plain HTTP only
    Http,
    /// Reachable over HTTPS only
    Https,
    /// Reachable over both
    HttpAndHttps,
    /// Anything else
    Unsupported(String),
}

impl From<String> for Exposure {
    fn from(value: String) -> Self {
        match value.as_str() {
            "http" => Self::Http,
            "https" => Self::Https,
            "http-and-https" | "https-and-http" => Self::HttpAndHttps,
            _ => Self::Unsupported(value),
        }
    }
}

impl From<Exposure> for String {
    fn from(value: Exposure) -> Self {
        value.to_string()
    }
}

impl std::fmt::Display for Exposure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Http => write!(f, "http"),
            Self::Https => write!(f, "https"),
            Self::HttpAndHttps => write!(f, "http-and-https"),
            Self::Unsupported(other) => write!(f, "{other}"),
        }
    }
}

/// One `(rule, exposure)` tuple from the exposure feed
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ExposureRecord {
    /// Name of the L7 rule that should enforce WAF
    pub rule: String,
    /// Protocol exposure deciding which policy the rule lives in
    pub exposure: Exposure,
    /// WAF policy to enable on the rule (`/Common/linux-high`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub waf_policy: Option<String>,
}

impl ExposureRecord {
    /// Create a record without a WAF policy reference
    pub fn new(rule: impl Into<String>, exposure: Exposure) -> Self {
        Self {
            rule: rule.into(),
            exposure,
            waf_policy: None,
        }
    }

    /// Attach a WAF policy reference
    pub fn with_waf_policy(mut self, policy: impl Into<String>) -> Self {
        self.waf_policy = Some(policy.into());
        self
    }
}
