//! Synthesis configuration
//!
//! Settings shared by every pass: which partition the declaration targets,
//! how the controller identifies itself to the device, and which AS3 schema
//! version it emits. Loaded from YAML and overridable from the command line.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Default AS3 schema version emitted in declarations
pub const DEFAULT_SCHEMA_VERSION: &str = "3.52.0";

/// Default client tag reported in the `controls` object
pub const DEFAULT_USER_AGENT: &str = "bigip-ctlr";

/// Default ConfigMap data key holding an override declaration
pub const DEFAULT_OVERRIDE_KEY: &str = "template";

/// Which family of resources the controller watches
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ControllerMode {
    /// Ingress and ConfigMap resources
    #[default]
    Kubernetes,
    /// OpenShift Routes
    OpenShift,
    /// VirtualServer/TransportServer/IngressLink custom resources
    CustomResource,
}

impl std::fmt::Display for ControllerMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Kubernetes => write!(f, "kubernetes"),
            Self::OpenShift => write!(f, "openshift"),
            Self::CustomResource => write!(f, "customresource"),
        }
    }
}

impl std::str::FromStr for ControllerMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "kubernetes" => Ok(Self::Kubernetes),
            "openshift" => Ok(Self::OpenShift),
            "customresource" => Ok(Self::CustomResource),
            other => Err(Error::config_field(
                "mode",
                format!("unknown controller mode '{other}'"),
            )),
        }
    }
}

/// Configuration for one controller instance's synthesis passes
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct SynthesisConfig {
    /// Partition (AS3 tenant) the declaration targets; empty means unset
    pub partition: String,
    /// Client tag written to the `controls` object
    pub user_agent: String,
    /// AS3 schema version
    pub schema_version: String,
    /// Controller mode
    pub mode: ControllerMode,
    /// ConfigMap data key that holds the override declaration
    pub override_key: String,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            partition: String::new(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            schema_version: DEFAULT_SCHEMA_VERSION.to_string(),
            mode: ControllerMode::default(),
            override_key: DEFAULT_OVERRIDE_KEY.to_string(),
        }
    }
}

impl SynthesisConfig {
    /// Create a config targeting the given partition with defaults elsewhere
    pub fn for_partition(partition: impl Into<String>) -> Self {
        Self {
            partition: partition.into(),
            ..Self::default()
        }
    }

    /// Parse configuration from YAML text
    pub fn from_yaml(input: &str) -> Result<Self> {
        let value = crate::yaml::parse_yaml(input)?;
        if value.is_null() {
            return Ok(Self::default());
        }
        serde_json::from_value(value)
            .map_err(|e| Error::serialization_for_kind("config", e.to_string()))
    }

    /// Read and parse a configuration file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::io(path.display().to_string(), e))?;
        Self::from_yaml(&content)
    }

    /// Reject settings the device would refuse
    pub fn validate(&self) -> Result<()> {
        if self.user_agent.trim().is_empty() {
            return Err(Error::config_field("userAgent", "must not be empty"));
        }
        if self.schema_version.trim().is_empty() {
            return Err(Error::config_field("schemaVersion", "must not be empty"));
        }
        if self.partition == crate::COMMON_PARTITION {
            return Err(Error::config_field(
                "partition",
                "the Common partition cannot be used as an AS3 tenant",
            ));
        }
        if self.override_key.trim().is_empty() {
            return Err(Error::config_field("overrideKey", "must not be empty"));
        }
        Ok(())
    }
}
