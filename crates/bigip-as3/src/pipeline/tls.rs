//! TLS attachment
//!
//! Ingress and Route frontends describe their TLS associations differently.
//! Each shape has a small adapter that turns it into a list of [`TlsEntry`]
//! values; [`apply_tls`] is the only code that touches the Service.

use tracing::{debug, trace};

use bigip_common::resource::{ProfileContext, ResourceConfig, ResourceKind};

use super::{DeclarationBuilder, Diagnostic, SynthesisContext, SynthesisStage};
use crate::declaration::{as3_name, ClientTlsRef, ResourcePointer, ServerTlsRef, Service};

/// A TLS association in canonical form
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TlsEntry {
    /// Client-side termination profile (becomes part of `serverTLS`)
    Client(ResourcePointer),
    /// Server-side re-encryption profile (becomes `clientTLS`)
    Server(ResourcePointer),
}

impl TlsEntry {
    fn classify(context: ProfileContext, pointer: ResourcePointer) -> Option<Self> {
        match context {
            ProfileContext::Clientside => Some(Self::Client(pointer)),
            ProfileContext::Serverside => Some(Self::Server(pointer)),
            ProfileContext::All => None,
        }
    }
}

/// Entries from an Ingress-style profile list.
///
/// Only profiles in the `Common` partition are eligible.
pub fn ingress_entries(config: &ResourceConfig) -> Vec<TlsEntry> {
    config
        .virtual_server
        .profiles
        .iter()
        .filter(|profile| {
            if !profile.is_common() {
                trace!(profile = %profile.full_path(), "ignoring profile outside Common");
            }
            profile.is_common()
        })
        .filter_map(|profile| {
            TlsEntry::classify(profile.context, ResourcePointer::new(profile.full_path()))
        })
        .collect()
}

/// Entries from a Route-style `context -> reference` map.
///
/// References are used verbatim as device paths.
pub fn route_entries(config: &ResourceConfig) -> Vec<TlsEntry> {
    config
        .meta_data
        .route_profiles
        .iter()
        .filter_map(|entry| {
            TlsEntry::classify(entry.key.context, ResourcePointer::new(entry.reference.clone()))
        })
        .collect()
}

/// Write canonical TLS entries onto a Service.
///
/// Client entries replace `serverTLS` with the full ordered list. The last
/// server entry becomes `clientTLS`. Any entry upgrades the Service to HTTPS;
/// an empty list leaves the Service untouched.
pub fn apply_tls(svc: &mut Service, entries: &[TlsEntry]) {
    if entries.is_empty() {
        return;
    }

    let mut server_tls = Vec::new();
    let mut client_tls = None;
    for entry in entries {
        match entry {
            TlsEntry::Client(pointer) => server_tls.push(pointer.clone()),
            TlsEntry::Server(pointer) => client_tls = Some(pointer.clone()),
        }
    }

    if !server_tls.is_empty() {
        svc.server_tls = Some(ServerTlsRef::Device(server_tls));
    }
    if let Some(pointer) = client_tls {
        svc.client_tls = Some(ClientTlsRef::Device(pointer));
    }
    svc.upgrade_to_https();
}

/// Attaches device TLS profiles to Services and upgrades them to HTTPS
pub struct TlsProfileStage;

impl SynthesisStage for TlsProfileStage {
    fn name(&self) -> &str {
        "tls-profiles"
    }

    fn run(&self, ctx: &SynthesisContext<'_>, builder: &mut DeclarationBuilder) {
        for (frontend, config) in ctx.snapshot.resources.iter() {
            let service_name = as3_name(frontend);
            if builder.app().service(&service_name).is_none() {
                continue;
            }

            let entries = match config.kind() {
                ResourceKind::Route => route_entries(config),
                ResourceKind::Ingress => ingress_entries(config),
                kind => {
                    builder.diagnose(Diagnostic::UnsupportedResourceKind {
                        frontend: frontend.to_string(),
                        kind: kind.clone(),
                    });
                    continue;
                }
            };

            if let Some(svc) = builder.app_mut().service_mut(&service_name) {
                apply_tls(svc, &entries);
                debug!(service = %service_name, entries = entries.len(), "attached TLS profiles");
            }
        }
    }
}
