//! TLS profile references attached to frontends

use serde::{Deserialize, Serialize};

use crate::COMMON_PARTITION;

/// Which side of the load balancer a TLS profile applies to
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ProfileContext {
    /// Client-side termination (clientssl): traffic arriving from outside
    Clientside,
    /// Server-side re-encryption (serverssl): traffic leaving toward pods
    Serverside,
    /// Any other profile context (http, tcp, ...) that carries no TLS meaning
    #[serde(other)]
    All,
}

impl std::fmt::Display for ProfileContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Clientside => write!(f, "clientside"),
            Self::Serverside => write!(f, "serverside"),
            Self::All => write!(f, "all"),
        }
    }
}

/// Profile reference carried on an Ingress-style virtual
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProfileRef {
    /// Profile name on the device
    pub name: String,
    /// Device partition holding the profile
    pub partition: String,
    /// Which side the profile applies to
    pub context: ProfileContext,
    /// Namespace of the Kubernetes object the profile came from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

impl ProfileRef {
    /// Create a profile reference
    pub fn new(
        partition: impl Into<String>,
        name: impl Into<String>,
        context: ProfileContext,
    ) -> Self {
        Self {
            name: name.into(),
            partition: partition.into(),
            context,
            namespace: None,
        }
    }

    /// Device path of the profile (`/Common/clientssl`)
    pub fn full_path(&self) -> String {
        format!("/{}/{}", self.partition, self.name)
    }

    /// Whether the profile lives in the device-global `Common` partition
    pub fn is_common(&self) -> bool {
        self.partition == COMMON_PARTITION
    }
}

/// Identity of a Route TLS annotation entry
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "camelCase")]
pub struct RouteProfileKey {
    /// Route name
    pub name: String,
    /// Route namespace
    pub namespace: String,
    /// Which side the referenced profile applies to
    pub context: ProfileContext,
}

/// One Route TLS association: key plus the already-resolved device reference
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RouteProfile {
    /// Entry identity
    #[serde(flatten)]
    pub key: RouteProfileKey,
    /// Opaque device path, e.g. `/Common/reencrypt-serverssl`
    pub reference: String,
}

/// User-supplied TLS material for one frontend (from a Secret or Route spec)
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CustomProfile {
    /// Profile name
    pub name: String,
    /// Frontend the profile is attached to
    pub frontend: String,
    /// Target partition
    pub partition: String,
    /// Which side the profile applies to
    pub context: ProfileContext,
    /// PEM certificate (or CA certificate for server-side profiles)
    pub cert: String,
    /// PEM private key, client-side only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    /// SNI server name this certificate answers for
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_name: Option<String>,
    /// Serve this certificate when no SNI name matches
    #[serde(default)]
    pub sni_default: bool,
}
