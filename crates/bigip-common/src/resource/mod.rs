//! Normalized resource records consumed by declaration synthesis
//!
//! The resource store is built by the controller from watched Kubernetes
//! objects (Ingress, Route, VirtualServer, ...). Each entry is one logical
//! frontend that has already been resolved to pools, monitors, policies and
//! profile references. Synthesis only reads these records.
//!
//! A [`ResourceSnapshot`] bundles the store with the side inputs a pass needs
//! (custom profiles, iRules, data groups and exposure records) and is the
//! document the CLI loads from disk.

mod exposure;
mod policy;
mod profile;

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

pub use exposure::{Exposure, ExposureRecord};
pub use policy::{
    ActionSpec, ConditionSpec, MatchOperand, MatchTarget, MonitorKind, MonitorSpec, PolicySpec,
    PoolMember, PoolSpec, RuleSpec,
};
pub use profile::{CustomProfile, ProfileContext, ProfileRef, RouteProfile, RouteProfileKey};

use crate::{Error, Result};

/// Kind of Kubernetes object a frontend was derived from
///
/// Unknown kinds are kept verbatim so a pass can report and skip them instead
/// of rejecting the whole snapshot.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq, Hash)]
#[serde(from = "String", into = "String")]
pub enum ResourceKind {
    /// OpenShift Route
    Route,
    /// Kubernetes Ingress
    Ingress,
    /// VirtualServer custom resource
    VirtualServer,
    /// TransportServer custom resource
    TransportServer,
    /// IngressLink custom resource
    IngressLink,
    /// ConfigMap-defined virtual server
    ConfigMap,
    /// Anything else
    Unsupported(String),
}

impl From<String> for ResourceKind {
    fn from(value: String) -> Self {
        match value.as_str() {
            "route" => Self::Route,
            "ingress" => Self::Ingress,
            "virtualServer" => Self::VirtualServer,
            "transportServer" => Self::TransportServer,
            "ingressLink" => Self::IngressLink,
            "configMap" => Self::ConfigMap,
            _ => Self::Unsupported(value),
        }
    }
}

impl From<ResourceKind> for String {
    fn from(value: ResourceKind) -> Self {
        value.to_string()
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Route => "route",
            Self::Ingress => "ingress",
            Self::VirtualServer => "virtualServer",
            Self::TransportServer => "transportServer",
            Self::IngressLink => "ingressLink",
            Self::ConfigMap => "configMap",
            Self::Unsupported(other) => other,
        };
        f.write_str(name)
    }
}

/// Transport protocol of a virtual listener
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ListenerProtocol {
    /// HTTP listener (upgraded to HTTPS when TLS is attached)
    #[default]
    Http,
    /// Plain TCP
    Tcp,
    /// Plain UDP
    Udp,
}

/// Controller-side metadata about a frontend
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MetaData {
    /// Kind of the originating object
    pub resource_type: ResourceKind,
    /// Whether the frontend is currently active
    #[serde(default = "default_true")]
    pub active: bool,
    /// Route TLS associations (context + resolved device reference)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub route_profiles: Vec<RouteProfile>,
    /// `namespace/name` of the Kubernetes objects contributing to this frontend
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub base_resources: Vec<String>,
}

/// Virtual listener specification
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Virtual {
    /// Listener name on the device
    pub name: String,
    /// Target partition
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub partition: String,
    /// Whether the listener is enabled
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Listener protocol
    #[serde(default)]
    pub protocol: ListenerProtocol,
    /// Destination address
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub virtual_address: Option<String>,
    /// Destination port
    pub port: u16,
    /// Default pool
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pool_name: Option<String>,
    /// Source address translation (`auto`, `none` or a SNAT pool path)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snat: Option<String>,
    /// Ingress-style profile references
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub profiles: Vec<ProfileRef>,
    /// iRules attached to the listener (local names or `/Partition/name`)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub irules: Vec<String>,
    /// L7 policies attached to the listener
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub policies: Vec<String>,
}

/// Everything the controller resolved for one frontend
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResourceConfig {
    /// Controller metadata
    pub meta_data: MetaData,
    /// Listener spec
    #[serde(rename = "virtual")]
    pub virtual_server: Virtual,
    /// Pools referenced by the listener and its policies
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pools: Vec<PoolSpec>,
    /// Monitors referenced by the pools
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub monitors: Vec<MonitorSpec>,
    /// L7 policies referenced by the listener
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub policies: Vec<PolicySpec>,
}

impl ResourceConfig {
    /// Kind of the originating object
    pub fn kind(&self) -> &ResourceKind {
        &self.meta_data.resource_type
    }
}

/// Frontend records keyed by frontend name
///
/// Ordered so every pass visits frontends in the same order.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(transparent)]
pub struct ResourceStore {
    frontends: BTreeMap<String, ResourceConfig>,
}

impl ResourceStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a frontend
    pub fn insert(&mut self, name: impl Into<String>, config: ResourceConfig) {
        self.frontends.insert(name.into(), config);
    }

    /// Look up a frontend by name
    pub fn get(&self, name: &str) -> Option<&ResourceConfig> {
        self.frontends.get(name)
    }

    /// Iterate frontends in name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ResourceConfig)> {
        self.frontends.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of frontends
    pub fn len(&self) -> usize {
        self.frontends.len()
    }

    /// Whether the store has no frontends
    pub fn is_empty(&self) -> bool {
        self.frontends.is_empty()
    }
}

/// A traffic script to register on the device
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct IRuleSpec {
    /// iRule name
    pub name: String,
    /// TCL source
    pub code: String,
}

/// A key/value table consumed by iRules
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DataGroupSpec {
    /// Data group name
    pub name: String,
    /// Partition the data group belongs to
    pub partition: String,
    /// Key type (`string`, `integer`, `ip`)
    #[serde(default = "default_key_type")]
    pub key_type: String,
    /// Records
    #[serde(default)]
    pub records: Vec<DataGroupRecord>,
}

/// One data group entry
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DataGroupRecord {
    /// Lookup key
    pub name: String,
    /// Value
    pub data: String,
}

/// Consistent snapshot of everything one synthesis pass reads
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResourceSnapshot {
    /// Frontend records
    #[serde(default)]
    pub resources: ResourceStore,
    /// User-supplied TLS material
    #[serde(default)]
    pub custom_profiles: Vec<CustomProfile>,
    /// iRules to register
    #[serde(default)]
    pub irules: Vec<IRuleSpec>,
    /// Data groups to register
    #[serde(default)]
    pub data_groups: Vec<DataGroupSpec>,
    /// WAF exposure feed
    #[serde(default)]
    pub exposures: Vec<ExposureRecord>,
}

impl ResourceSnapshot {
    /// Parse a snapshot from YAML or JSON text
    pub fn from_yaml(input: &str) -> Result<Self> {
        let value = crate::yaml::parse_yaml(input)?;
        if value.is_null() {
            return Ok(Self::default());
        }
        serde_json::from_value(value)
            .map_err(|e| Error::serialization_for_kind("snapshot", e.to_string()))
    }

    /// Read and parse a snapshot file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::io(path.display().to_string(), e))?;
        Self::from_yaml(&content)
    }
}

fn default_true() -> bool {
    true
}

fn default_key_type() -> String {
    "string".to_string()
}
