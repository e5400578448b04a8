//! bigip-ctlr - AS3 declaration synthesis for Kubernetes and OpenShift
//!
//! The controller watches Ingress, Route and custom resources, resolves them
//! into a [`ResourceSnapshot`], and renders that snapshot into one AS3
//! declaration for a BIG-IP partition.
//!
//! # Modules
//!
//! - [`common`] - resource records, CRDs, configuration, errors, logging
//! - [`as3`] - declaration tree, synthesis pipeline, assembly

#![deny(missing_docs)]

use std::path::Path;

use k8s_openapi::api::core::v1::ConfigMap;
use tracing::info;

pub use bigip_as3 as as3;
pub use bigip_common as common;

pub use bigip_as3::{As3Config, Diagnostic, Pipeline};
pub use bigip_common::resource::ResourceSnapshot;
pub use bigip_common::{ControllerMode, Error, Result, SynthesisConfig};

/// Read an override ConfigMap manifest from disk
pub fn read_override_configmap(path: &Path) -> Result<ConfigMap> {
    let content =
        std::fs::read_to_string(path).map_err(|e| Error::io(path.display().to_string(), e))?;
    serde_yaml::from_str(&content)
        .map_err(|e| Error::serialization_for_kind("configmap", e.to_string()))
}

/// Validate `config`, run a full pass over `snapshot` and assemble the result.
///
/// The override payload, if any, is read from `override_cm` under
/// `config.override_key`.
pub fn render_snapshot(
    config: &SynthesisConfig,
    snapshot: &ResourceSnapshot,
    override_cm: Option<&ConfigMap>,
) -> Result<As3Config> {
    config.validate()?;

    let override_data = override_cm
        .map(|cm| as3::assembly::override_from_configmap(cm, &config.override_key))
        .unwrap_or_default();

    let assembled = as3::prepare_declaration(config, snapshot, override_data);
    info!(
        partition = %config.partition,
        mode = %config.mode,
        objects = assembled.adc().shared_app().len(),
        diagnostics = assembled.diagnostics.len(),
        "rendered declaration"
    );
    Ok(assembled)
}
