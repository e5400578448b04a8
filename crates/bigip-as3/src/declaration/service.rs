//! AS3 Service objects (virtual servers)

use serde::Serialize;

use super::ResourcePointer;

/// AS3 class of a Service, which also encodes its protocol
#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
pub enum ServiceClass {
    /// Plain HTTP virtual
    #[serde(rename = "Service_HTTP")]
    Http,
    /// HTTPS virtual (TLS terminated on the device)
    #[serde(rename = "Service_HTTPS")]
    Https,
    /// L4 TCP virtual
    #[serde(rename = "Service_TCP")]
    Tcp,
    /// L4 UDP virtual
    #[serde(rename = "Service_UDP")]
    Udp,
}

/// Client-facing TLS of a Service (`serverTLS` in AS3 terms)
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum ServerTlsRef {
    /// A TLS_Server object declared in this application
    Local(String),
    /// Profiles that already exist on the device, in SNI order
    Device(Vec<ResourcePointer>),
}

/// Backend-facing TLS of a Service (`clientTLS` in AS3 terms)
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum ClientTlsRef {
    /// A TLS_Client object declared in this application
    Local(String),
    /// A profile that already exists on the device
    Device(ResourcePointer),
}

/// iRule reference on a Service
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum IRuleRef {
    /// An iRule declared in this application
    Local(String),
    /// An iRule that already exists on the device
    Device(ResourcePointer),
}

impl IRuleRef {
    /// Build a reference from a frontend's iRule entry
    ///
    /// Entries starting with `/` are device paths; anything else names an
    /// iRule declared by this controller.
    pub fn from_entry(entry: &str) -> Self {
        if entry.starts_with('/') {
            Self::Device(ResourcePointer::new(entry))
        } else {
            Self::Local(super::as3_name(entry))
        }
    }
}

/// AS3 representation of one virtual listener
#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    /// Service class (protocol)
    pub class: ServiceClass,
    /// Destination addresses
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub virtual_addresses: Vec<String>,
    /// Destination port
    pub virtual_port: u16,
    /// Default pool
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pool: Option<String>,
    /// Source address translation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snat: Option<String>,
    /// Attached iRules
    #[serde(rename = "iRules", skip_serializing_if = "Vec::is_empty")]
    pub irules: Vec<IRuleRef>,
    /// Attached endpoint policies
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub policy_endpoint: Vec<String>,
    /// Client-facing TLS (terminates traffic from web clients)
    #[serde(rename = "serverTLS", skip_serializing_if = "Option::is_none")]
    pub server_tls: Option<ServerTlsRef>,
    /// Backend-facing TLS (re-encrypts traffic toward pods)
    #[serde(rename = "clientTLS", skip_serializing_if = "Option::is_none")]
    pub client_tls: Option<ClientTlsRef>,
    /// Whether AS3 should create the port-80 redirect virtual
    #[serde(rename = "redirect80", skip_serializing_if = "Option::is_none")]
    pub redirect80: Option<bool>,
}

impl Service {
    /// Create a Service listening on `port`
    pub fn new(class: ServiceClass, port: u16) -> Self {
        Self {
            class,
            virtual_addresses: Vec::new(),
            virtual_port: port,
            pool: None,
            snat: None,
            irules: Vec::new(),
            policy_endpoint: Vec::new(),
            server_tls: None,
            client_tls: None,
            redirect80: None,
        }
    }

    /// Whether the Service terminates TLS
    pub fn is_https(&self) -> bool {
        self.class == ServiceClass::Https
    }

    /// Switch the Service to HTTPS.
    ///
    /// One-way: an HTTPS Service is never downgraded. AS3's automatic port-80
    /// redirect virtual is disabled because redirects are handled by policy.
    pub fn upgrade_to_https(&mut self) {
        if self.is_https() {
            return;
        }
        self.class = ServiceClass::Https;
        self.redirect80 = Some(false);
    }
}
