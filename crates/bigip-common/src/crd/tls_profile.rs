//! TLSProfile CRD
//!
//! A TLSProfile names the client-side and server-side SSL profiles a
//! VirtualServer or Ingress should use. When `reference` is `bigip` the
//! entries are device paths of profiles that already exist on the BIG-IP;
//! those resolve directly into Ingress-style [`ProfileRef`]s.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::resource::{ProfileContext, ProfileRef};
use crate::COMMON_PARTITION;

/// Reference kind for profiles that already live on the device
const REFERENCE_BIGIP: &str = "bigip";

/// TLSProfile selects SSL profiles for hosts served by a virtual server.
///
/// Example:
/// ```yaml
/// apiVersion: cis.f5.com/v1
/// kind: TLSProfile
/// metadata:
///   name: reencrypt-tls
///   namespace: shop
/// spec:
///   hosts:
///     - shop.example.com
///   tls:
///     termination: reencrypt
///     clientSSL: /Common/clientssl
///     serverSSL: /Common/serverssl
///     reference: bigip
/// ```
#[derive(CustomResource, Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "cis.f5.com",
    version = "v1",
    kind = "TLSProfile",
    namespaced,
    shortname = "tls",
    printcolumn = r#"{"name":"Termination","type":"string","jsonPath":".spec.tls.termination"}"#,
    printcolumn = r#"{"name":"Age","type":"date","jsonPath":".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct TlsProfileSpec {
    /// Hosts served with these profiles
    #[serde(default)]
    pub hosts: Vec<String>,
    /// TLS settings
    pub tls: TlsSpec,
}

/// Where TLS is terminated
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TlsTermination {
    /// Terminate at the device, plain traffic to pods
    #[default]
    Edge,
    /// Terminate and re-encrypt toward pods
    Reencrypt,
    /// Pass TLS through untouched
    Passthrough,
}

/// TLS block of a TLSProfile
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
pub struct TlsSpec {
    /// Termination mode
    #[serde(default)]
    pub termination: TlsTermination,
    /// Single client-side profile
    #[serde(rename = "clientSSL", default, skip_serializing_if = "Option::is_none")]
    pub client_ssl: Option<String>,
    /// Single server-side profile
    #[serde(rename = "serverSSL", default, skip_serializing_if = "Option::is_none")]
    pub server_ssl: Option<String>,
    /// Additional client-side profiles (SNI)
    #[serde(rename = "clientSSLs", default, skip_serializing_if = "Vec::is_empty")]
    pub client_ssls: Vec<String>,
    /// Additional server-side profiles
    #[serde(rename = "serverSSLs", default, skip_serializing_if = "Vec::is_empty")]
    pub server_ssls: Vec<String>,
    /// `bigip` for device profiles, `secret` for Kubernetes Secrets
    #[serde(default)]
    pub reference: String,
}

impl TlsProfileSpec {
    /// Resolve device-referenced profiles into Ingress-style profile refs.
    ///
    /// Client-side entries come first, in declaration order, followed by
    /// server-side entries. Secret-referenced profiles yield nothing here;
    /// they become custom profiles instead.
    pub fn profile_refs(&self) -> Vec<ProfileRef> {
        if self.tls.reference != REFERENCE_BIGIP {
            return Vec::new();
        }

        let client = self
            .tls
            .client_ssl
            .iter()
            .chain(self.tls.client_ssls.iter())
            .map(|path| (path, ProfileContext::Clientside));
        let server = self
            .tls
            .server_ssl
            .iter()
            .chain(self.tls.server_ssls.iter())
            .map(|path| (path, ProfileContext::Serverside));

        client
            .chain(server)
            .filter_map(|(path, context)| match parse_profile_path(path) {
                Some((partition, name)) => Some(ProfileRef::new(partition, name, context)),
                None => {
                    warn!(path = %path, "ignoring malformed TLS profile path");
                    None
                }
            })
            .collect()
    }
}

/// Split a device path into `(partition, name)`.
///
/// `/Common/clientssl` → `("Common", "clientssl")`; a bare `clientssl` is
/// taken to live in `Common`. Anything with more or fewer segments is rejected.
pub fn parse_profile_path(path: &str) -> Option<(String, String)> {
    let trimmed = path.trim();
    if trimmed.is_empty() {
        return None;
    }
    match trimmed.strip_prefix('/') {
        Some(rest) => {
            let (partition, name) = rest.split_once('/')?;
            if partition.is_empty() || name.is_empty() || name.contains('/') {
                return None;
            }
            Some((partition.to_string(), name.to_string()))
        }
        None if !trimmed.contains('/') => {
            Some((COMMON_PARTITION.to_string(), trimmed.to_string()))
        }
        None => None,
    }
}
