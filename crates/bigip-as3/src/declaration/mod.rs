//! AS3 declaration tree
//!
//! ```text
//! Declaration (class AS3)
//! └── ADC
//!     ├── controls
//!     └── <partition> (Tenant)
//!         └── Shared (Application)
//!             └── name -> Service | Pool | Monitor | Endpoint_Policy | TLS_* | ...
//! ```
//!
//! Objects inside the shared application are kept in a `BTreeMap` so that two
//! passes over the same snapshot serialize byte-for-byte identically.

mod objects;
mod policy;
mod service;

use std::collections::BTreeMap;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use bigip_common::SHARED_APPLICATION;

pub use objects::{
    CaBundle, Certificate, DataGroup, DataGroupEntry, IRule, Member, Monitor, Pool,
    TlsCertificate, TlsClient, TlsServer,
};
pub use policy::{
    Action, ActionKind, ActionSelect, CompareString, Condition, EndpointPolicy, PolicyName, Rule,
    UseRef,
};
pub use service::{ClientTlsRef, IRuleRef, ServerTlsRef, Service, ServiceClass};

/// Turn an arbitrary resource name into a valid AS3 object name.
///
/// AS3 names may not contain `.`, `-` or `/`; all three become `_`.
pub fn as3_name(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '.' | '-' | '/' => '_',
            other => other,
        })
        .collect()
}

/// Reference to an object that already exists on the device
#[derive(Clone, Debug, Serialize, PartialEq, Eq, PartialOrd, Ord)]
pub struct ResourcePointer {
    /// Device path, `/Partition/name`
    pub bigip: String,
}

impl ResourcePointer {
    /// Point at a device path
    pub fn new(path: impl Into<String>) -> Self {
        Self { bigip: path.into() }
    }
}

/// Any object that can live in the shared application
#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(untagged)]
pub enum As3Object {
    /// Virtual server
    Service(Service),
    /// Endpoint_Policy
    EndpointPolicy(EndpointPolicy),
    /// Pool
    Pool(Pool),
    /// Monitor
    Monitor(Monitor),
    /// TLS_Server
    TlsServer(TlsServer),
    /// TLS_Client
    TlsClient(TlsClient),
    /// Certificate
    Certificate(Certificate),
    /// CA_Bundle
    CaBundle(CaBundle),
    /// iRule
    IRule(IRule),
    /// Data_Group
    DataGroup(DataGroup),
}

impl As3Object {
    /// AS3 class family, used when reporting name clashes
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Service(_) => "Service",
            Self::EndpointPolicy(_) => "Endpoint_Policy",
            Self::Pool(_) => "Pool",
            Self::Monitor(_) => "Monitor",
            Self::TlsServer(_) => "TLS_Server",
            Self::TlsClient(_) => "TLS_Client",
            Self::Certificate(_) => "Certificate",
            Self::CaBundle(_) => "CA_Bundle",
            Self::IRule(_) => "iRule",
            Self::DataGroup(_) => "Data_Group",
        }
    }
}

/// A tenant's shared AS3 application: the mutable namespace every stage writes to
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Application {
    objects: BTreeMap<String, As3Object>,
}

impl Application {
    /// Create an empty application
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an object, returning the previous one
    pub fn insert(&mut self, name: impl Into<String>, object: As3Object) -> Option<As3Object> {
        self.objects.insert(name.into(), object)
    }

    /// Insert an object unless its name is held by an object of another kind.
    ///
    /// Objects of the same kind are replaced. On a clash nothing changes and
    /// the kind of the object holding the name is returned.
    pub fn insert_if_compatible(
        &mut self,
        name: impl Into<String>,
        object: As3Object,
    ) -> Result<(), &'static str> {
        let name = name.into();
        match self.objects.get(&name) {
            Some(existing) if existing.kind() != object.kind() => Err(existing.kind()),
            _ => {
                self.objects.insert(name, object);
                Ok(())
            }
        }
    }

    /// Look up any object
    pub fn get(&self, name: &str) -> Option<&As3Object> {
        self.objects.get(name)
    }

    /// Look up any object mutably
    pub fn get_mut(&mut self, name: &str) -> Option<&mut As3Object> {
        self.objects.get_mut(name)
    }

    /// Whether an object with this name exists
    pub fn contains(&self, name: &str) -> bool {
        self.objects.contains_key(name)
    }

    /// Look up a Service by object name
    pub fn service(&self, name: &str) -> Option<&Service> {
        match self.objects.get(name) {
            Some(As3Object::Service(svc)) => Some(svc),
            _ => None,
        }
    }

    /// Look up a Service mutably by object name
    pub fn service_mut(&mut self, name: &str) -> Option<&mut Service> {
        match self.objects.get_mut(name) {
            Some(As3Object::Service(svc)) => Some(svc),
            _ => None,
        }
    }

    /// Look up an endpoint policy by object name
    pub fn policy_by_name(&self, name: &str) -> Option<&EndpointPolicy> {
        match self.objects.get(name) {
            Some(As3Object::EndpointPolicy(policy)) => Some(policy),
            _ => None,
        }
    }

    /// Look up an endpoint policy mutably by object name
    pub fn policy_by_name_mut(&mut self, name: &str) -> Option<&mut EndpointPolicy> {
        match self.objects.get_mut(name) {
            Some(As3Object::EndpointPolicy(policy)) => Some(policy),
            _ => None,
        }
    }

    /// Look up one of the conventional route policies
    pub fn endpoint_policy(&self, name: PolicyName) -> Option<&EndpointPolicy> {
        self.policy_by_name(name.as_str())
    }

    /// Look up one of the conventional route policies mutably
    pub fn endpoint_policy_mut(&mut self, name: PolicyName) -> Option<&mut EndpointPolicy> {
        self.policy_by_name_mut(name.as_str())
    }

    /// Look up a TLS_Server mutably
    pub fn tls_server_mut(&mut self, name: &str) -> Option<&mut TlsServer> {
        match self.objects.get_mut(name) {
            Some(As3Object::TlsServer(server)) => Some(server),
            _ => None,
        }
    }

    /// Iterate objects in name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &As3Object)> {
        self.objects.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of objects
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Whether no object has been declared
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

impl Serialize for Application {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.objects.len() + 2))?;
        map.serialize_entry("class", "Application")?;
        map.serialize_entry("template", "shared")?;
        for (name, object) in &self.objects {
            map.serialize_entry(name, object)?;
        }
        map.end()
    }
}

/// AS3 Tenant holding the shared application
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Tenant {
    /// The shared application
    pub shared: Application,
}

impl Serialize for Tenant {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry("class", "Tenant")?;
        map.serialize_entry(SHARED_APPLICATION, &self.shared)?;
        map.end()
    }
}

/// Telemetry header identifying the integration to the device vendor
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Controls {
    class: &'static str,
    /// Client tag
    pub user_agent: String,
}

impl Controls {
    /// Create the controls object for a client tag
    pub fn new(user_agent: impl Into<String>) -> Self {
        Self {
            class: "Controls",
            user_agent: user_agent.into(),
        }
    }
}

/// The ADC document: metadata, controls and one tenant
#[derive(Clone, Debug, PartialEq)]
pub struct Adc {
    /// AS3 schema version
    pub schema_version: String,
    /// Declaration id
    pub id: String,
    /// Short label
    pub label: String,
    /// Free-form remark
    pub remark: String,
    /// Controls header (set during assembly)
    pub controls: Option<Controls>,
    partition: String,
    tenant: Tenant,
}

impl Adc {
    /// Create an ADC with an empty tenant for `partition`
    pub fn new(partition: impl Into<String>, schema_version: impl Into<String>) -> Self {
        let partition = partition.into();
        Self {
            schema_version: schema_version.into(),
            id: format!("urn:bigip-ctlr:{}", partition.trim()),
            label: "bigip-ctlr declaration".to_string(),
            remark: "Auto-generated by bigip-ctlr".to_string(),
            controls: None,
            partition,
            tenant: Tenant::default(),
        }
    }

    /// Target partition name (may be empty)
    pub fn partition(&self) -> &str {
        &self.partition
    }

    /// The tenant's shared application
    pub fn shared_app(&self) -> &Application {
        &self.tenant.shared
    }

    /// The tenant's shared application, mutably
    pub fn shared_app_mut(&mut self) -> &mut Application {
        &mut self.tenant.shared
    }

    /// Whether the declaration has no usable partition.
    ///
    /// True when the partition name is blank or when nothing was declared in
    /// its shared application.
    pub fn is_partition_empty(&self) -> bool {
        self.partition.trim().is_empty() || self.tenant.shared.is_empty()
    }
}

impl Serialize for Adc {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("class", "ADC")?;
        map.serialize_entry("schemaVersion", &self.schema_version)?;
        map.serialize_entry("id", &self.id)?;
        map.serialize_entry("label", &self.label)?;
        map.serialize_entry("remark", &self.remark)?;
        if let Some(controls) = &self.controls {
            map.serialize_entry("controls", controls)?;
        }
        // A blank partition cannot be addressed on the device; omit the tenant.
        if !self.partition.trim().is_empty() {
            map.serialize_entry(self.partition.trim(), &self.tenant)?;
        }
        map.end()
    }
}

/// Top-level AS3 request body
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct Declaration {
    class: &'static str,
    /// Deployment action
    pub action: String,
    /// Persist the configuration on the device
    pub persist: bool,
    /// The ADC document
    pub declaration: Adc,
}

impl Declaration {
    /// Wrap an ADC in a `deploy` request
    pub fn new(adc: Adc) -> Self {
        Self {
            class: "AS3",
            action: "deploy".to_string(),
            persist: true,
            declaration: adc,
        }
    }
}
