//! Declaration assembly
//!
//! Wraps the synthesized tree into the request body sent to the device,
//! stamps the `controls` header, and decides whether the user's override
//! payload may be merged on top.

use k8s_openapi::api::core::v1::ConfigMap;
use kube::ResourceExt;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info};

use bigip_common::resource::ResourceSnapshot;
use bigip_common::SynthesisConfig;

use crate::declaration::{Adc, Controls, Declaration};
use crate::pipeline::{Diagnostic, Pipeline, SynthesisOutput};

/// Errors raised while rendering an assembled declaration
#[derive(Debug, Error)]
pub enum AssemblyError {
    /// The override payload is not JSON
    #[error("override payload is not valid JSON: {0}")]
    InvalidOverride(#[source] serde_json::Error),

    /// The override payload is JSON but not an object
    #[error("override payload must be a JSON object, got {found}")]
    OverrideNotObject {
        /// JSON type that was found
        found: &'static str,
    },

    /// The declaration could not be serialized
    #[error("failed to serialize declaration: {0}")]
    Render(#[source] serde_json::Error),
}

impl From<AssemblyError> for bigip_common::Error {
    fn from(err: AssemblyError) -> Self {
        let kind = match &err {
            AssemblyError::Render(_) => "declaration",
            _ => "override",
        };
        bigip_common::Error::serialization_for_kind(kind, err.to_string())
    }
}

/// A finished declaration together with the override that may be applied to it
#[derive(Debug)]
pub struct As3Config {
    /// Request body
    pub declaration: Declaration,
    /// Raw override payload; empty when none applies
    pub override_data: String,
    /// Diagnostics raised by the pass and by assembly
    pub diagnostics: Vec<Diagnostic>,
}

/// Finish a pass: add the controls header and apply override suppression.
///
/// An empty partition cannot host the override's objects, so the payload is
/// dropped in that case.
pub fn assemble(
    config: &SynthesisConfig,
    output: SynthesisOutput,
    override_data: impl Into<String>,
) -> As3Config {
    let SynthesisOutput {
        mut adc,
        mut diagnostics,
    } = output;
    let mut override_data = override_data.into();

    adc.controls = Some(Controls::new(config.user_agent.clone()));

    if adc.is_partition_empty() {
        if !override_data.trim().is_empty() {
            let diagnostic = Diagnostic::OverrideSuppressed {
                partition: adc.partition().to_string(),
            };
            info!(%diagnostic, "declaration diagnostic");
            diagnostics.push(diagnostic);
        }
        override_data.clear();
    }

    As3Config {
        declaration: Declaration::new(adc),
        override_data,
        diagnostics,
    }
}

/// Run the standard pipeline over `snapshot` and assemble the result
pub fn prepare_declaration(
    config: &SynthesisConfig,
    snapshot: &ResourceSnapshot,
    override_data: impl Into<String>,
) -> As3Config {
    let output = Pipeline::standard().synthesize(snapshot, config);
    debug!(
        partition = %config.partition,
        objects = output.adc.shared_app().len(),
        diagnostics = output.diagnostics.len(),
        "synthesized declaration"
    );
    assemble(config, output, override_data)
}

/// Read the override payload from a ConfigMap data key
pub fn override_from_configmap(cm: &ConfigMap, key: &str) -> String {
    match cm.data.as_ref().and_then(|data| data.get(key)) {
        Some(payload) => {
            debug!(configmap = %cm.name_any(), key, bytes = payload.len(), "loaded override");
            payload.clone()
        }
        None => {
            debug!(configmap = %cm.name_any(), key, "override key not present");
            String::new()
        }
    }
}

/// Deep-merge `patch` into `base`: objects merge key by key, anything else replaces
pub fn merge_json(base: &mut Value, patch: &Value) {
    match (base, patch) {
        (Value::Object(base), Value::Object(patch)) => {
            for (key, value) in patch {
                match base.get_mut(key) {
                    Some(existing) => merge_json(existing, value),
                    None => {
                        base.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (base, patch) => *base = patch.clone(),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

impl As3Config {
    /// The ADC document
    pub fn adc(&self) -> &Adc {
        &self.declaration.declaration
    }

    /// Serialize the declaration with the override merged in
    pub fn to_json(&self) -> Result<Value, AssemblyError> {
        let mut value = serde_json::to_value(&self.declaration).map_err(AssemblyError::Render)?;
        if self.override_data.trim().is_empty() {
            return Ok(value);
        }

        let patch: Value =
            serde_json::from_str(&self.override_data).map_err(AssemblyError::InvalidOverride)?;
        if !patch.is_object() {
            return Err(AssemblyError::OverrideNotObject {
                found: json_type(&patch),
            });
        }
        merge_json(&mut value, &patch);
        Ok(value)
    }

    /// Render the final request body as pretty JSON
    pub fn render(&self) -> Result<String, AssemblyError> {
        serde_json::to_string_pretty(&self.to_json()?).map_err(AssemblyError::Render)
    }
}
