//! Supporting AS3 objects: pools, monitors, TLS, iRules and data groups

use std::collections::BTreeMap;

use serde::Serialize;

use bigip_common::resource::{
    DataGroupSpec, IRuleSpec, MonitorKind, MonitorSpec, PoolMember, PoolSpec,
};

use super::policy::UseRef;
use super::as3_name;

/// AS3 Pool
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Pool {
    class: &'static str,
    /// Load-balancing mode
    pub load_balancing_mode: String,
    /// Members grouped by service port
    pub members: Vec<Member>,
    /// Attached monitors
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub monitors: Vec<UseRef>,
}

/// Pool members sharing one service port
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    /// Port the addresses listen on
    pub service_port: u16,
    /// Member addresses
    pub server_addresses: Vec<String>,
    /// Allow nodes to be shared with other tenants
    pub share_nodes: bool,
}

impl Pool {
    /// Create an empty pool
    pub fn new(load_balancing_mode: impl Into<String>) -> Self {
        Self {
            class: "Pool",
            load_balancing_mode: load_balancing_mode.into(),
            members: Vec::new(),
            monitors: Vec::new(),
        }
    }

    /// Add a member, grouping addresses that share a port
    pub fn add_member(&mut self, member: &PoolMember) {
        match self
            .members
            .iter_mut()
            .find(|m| m.service_port == member.port)
        {
            Some(group) => {
                if !group.server_addresses.contains(&member.address) {
                    group.server_addresses.push(member.address.clone());
                }
            }
            None => self.members.push(Member {
                service_port: member.port,
                server_addresses: vec![member.address.clone()],
                share_nodes: true,
            }),
        }
    }
}

impl From<&PoolSpec> for Pool {
    fn from(spec: &PoolSpec) -> Self {
        let mut pool = Pool::new(spec.balance.clone());
        for member in &spec.members {
            pool.add_member(member);
        }
        pool.monitors = spec
            .monitors
            .iter()
            .map(|m| UseRef::new(as3_name(m)))
            .collect();
        pool
    }
}

/// AS3 Monitor
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Monitor {
    class: &'static str,
    /// `http`, `https` or `tcp`
    pub monitor_type: String,
    /// Probe interval in seconds
    pub interval: u32,
    /// Probe timeout in seconds
    pub timeout: u32,
    /// Request string
    #[serde(skip_serializing_if = "Option::is_none")]
    pub send: Option<String>,
    /// Expected response substring
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receive: Option<String>,
}

impl From<&MonitorSpec> for Monitor {
    fn from(spec: &MonitorSpec) -> Self {
        let monitor_type = match spec.kind {
            MonitorKind::Http => "http",
            MonitorKind::Https => "https",
            MonitorKind::Tcp => "tcp",
        };
        Self {
            class: "Monitor",
            monitor_type: monitor_type.to_string(),
            interval: spec.interval,
            timeout: spec.timeout,
            send: spec.send.clone(),
            receive: spec.recv.clone(),
        }
    }
}

/// AS3 Certificate (cert + key material)
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Certificate {
    class: &'static str,
    /// PEM certificate
    pub certificate: String,
    /// PEM private key
    pub private_key: String,
}

impl Certificate {
    /// Create a certificate object
    pub fn new(certificate: impl Into<String>, private_key: impl Into<String>) -> Self {
        Self {
            class: "Certificate",
            certificate: certificate.into(),
            private_key: private_key.into(),
        }
    }
}

/// AS3 CA_Bundle (trusted CAs for re-encryption)
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct CaBundle {
    class: &'static str,
    /// PEM bundle
    pub bundle: String,
}

impl CaBundle {
    /// Create a CA bundle object
    pub fn new(bundle: impl Into<String>) -> Self {
        Self {
            class: "CA_Bundle",
            bundle: bundle.into(),
        }
    }
}

/// One certificate served by a TLS_Server
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TlsCertificate {
    /// Name of the Certificate object
    pub certificate: String,
    /// Serve this certificate when no SNI name matches
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub sni_default: bool,
}

/// AS3 TLS_Server (client-facing TLS)
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct TlsServer {
    class: &'static str,
    /// Served certificates, SNI order
    pub certificates: Vec<TlsCertificate>,
}

impl TlsServer {
    /// Create a TLS_Server without certificates
    pub fn new() -> Self {
        Self {
            class: "TLS_Server",
            certificates: Vec::new(),
        }
    }
}

impl Default for TlsServer {
    fn default() -> Self {
        Self::new()
    }
}

/// AS3 TLS_Client (backend-facing TLS)
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TlsClient {
    class: &'static str,
    /// CA bundle used to validate backends
    #[serde(rename = "trustCA")]
    pub trust_ca: UseRef,
    /// Whether backend certificates are validated
    pub validate_certificate: bool,
}

impl TlsClient {
    /// Create a TLS_Client trusting the named CA bundle
    pub fn new(trust_ca: impl Into<String>) -> Self {
        Self {
            class: "TLS_Client",
            trust_ca: UseRef::new(trust_ca),
            validate_certificate: true,
        }
    }
}

/// AS3 iRule
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct IRule {
    class: &'static str,
    /// TCL source
    #[serde(rename = "iRule")]
    pub code: String,
}

impl From<&IRuleSpec> for IRule {
    fn from(spec: &IRuleSpec) -> Self {
        Self {
            class: "iRule",
            code: spec.code.clone(),
        }
    }
}

/// One data group record
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct DataGroupEntry {
    /// Lookup key
    pub key: String,
    /// Value
    pub value: String,
}

/// AS3 Data_Group
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DataGroup {
    class: &'static str,
    /// Key type
    pub key_data_type: String,
    /// Records sorted by key
    pub records: Vec<DataGroupEntry>,
}

impl From<&DataGroupSpec> for DataGroup {
    fn from(spec: &DataGroupSpec) -> Self {
        // Later duplicates win; sorting keeps the output stable across passes.
        let records: BTreeMap<&str, &str> = spec
            .records
            .iter()
            .map(|r| (r.name.as_str(), r.data.as_str()))
            .collect();
        Self {
            class: "Data_Group",
            key_data_type: spec.key_type.clone(),
            records: records
                .into_iter()
                .map(|(key, value)| DataGroupEntry {
                    key: key.to_string(),
                    value: value.to_string(),
                })
                .collect(),
        }
    }
}
