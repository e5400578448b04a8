//! L7 routing policies, pools and monitors resolved for a frontend

use serde::{Deserialize, Serialize};

/// Named L7 policy attached to one or more frontends
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PolicySpec {
    /// Policy name (e.g. `openshift_secure_routes`)
    pub name: String,
    /// Partition the policy belongs to
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub partition: String,
    /// Rule evaluation strategy
    #[serde(default = "default_strategy")]
    pub strategy: String,
    /// Ordered rules
    #[serde(default)]
    pub rules: Vec<RuleSpec>,
}

fn default_strategy() -> String {
    "first-match".to_string()
}

/// One L7 rule: conditions plus actions
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RuleSpec {
    /// Rule name, unique within the policy
    pub name: String,
    /// Host + path this rule was generated for
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_uri: Option<String>,
    /// Conditions that must all match
    #[serde(default)]
    pub conditions: Vec<ConditionSpec>,
    /// Actions applied on match
    #[serde(default)]
    pub actions: Vec<ActionSpec>,
}

/// Which part of the request a condition inspects
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MatchTarget {
    /// HTTP Host header
    Host,
    /// URI path
    Path,
}

/// How condition values are compared
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum MatchOperand {
    /// Exact match
    #[default]
    Equals,
    /// Prefix match
    StartsWith,
}

/// A single request match condition
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConditionSpec {
    /// What is inspected
    pub target: MatchTarget,
    /// Comparison operator
    #[serde(default)]
    pub operand: MatchOperand,
    /// Values to compare against (any may match)
    pub values: Vec<String>,
}

/// Actions a frontend's L7 rule can carry before WAF injection
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ActionSpec {
    /// Forward the request to a pool
    Forward {
        /// Pool name
        pool: String,
    },
    /// Reset the connection
    Reset,
    /// Redirect the client
    #[serde(rename_all = "camelCase")]
    HttpRedirect {
        /// Redirect target
        location: String,
    },
}

/// Load-balancing pool backing a frontend
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PoolSpec {
    /// Pool name
    pub name: String,
    /// Kubernetes Service the pool was built from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_name: Option<String>,
    /// Port the members listen on
    pub service_port: u16,
    /// Load-balancing mode
    #[serde(default = "default_balance")]
    pub balance: String,
    /// Pool members
    #[serde(default)]
    pub members: Vec<PoolMember>,
    /// Names of monitors attached to the pool
    #[serde(default)]
    pub monitors: Vec<String>,
}

fn default_balance() -> String {
    "round-robin".to_string()
}

/// A single backend endpoint
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PoolMember {
    /// Endpoint IP address
    pub address: String,
    /// Endpoint port
    pub port: u16,
}

/// Health monitor kinds
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MonitorKind {
    /// HTTP monitor
    #[default]
    Http,
    /// HTTPS monitor
    Https,
    /// TCP connect monitor
    Tcp,
}

/// Health monitor definition
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MonitorSpec {
    /// Monitor name
    pub name: String,
    /// Monitor type
    #[serde(default)]
    pub kind: MonitorKind,
    /// Probe interval in seconds
    #[serde(default = "default_interval")]
    pub interval: u32,
    /// Probe timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout: u32,
    /// Request sent by HTTP(S) monitors
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub send: Option<String>,
    /// Expected response substring
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recv: Option<String>,
}

fn default_interval() -> u32 {
    5
}

fn default_timeout() -> u32 {
    16
}
