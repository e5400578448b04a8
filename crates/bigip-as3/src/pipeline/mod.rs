//! Declaration synthesis pipeline
//!
//! A pass builds one AS3 tree from one [`ResourceSnapshot`]. Each stage reads
//! the snapshot and writes into the shared application held by a
//! [`DeclarationBuilder`]; later stages depend on objects written by earlier
//! ones, so the order in [`Pipeline::standard`] is part of the contract:
//!
//! 1. [`ResourceStage`] - Services, pools, monitors, endpoint policies
//! 2. [`CustomProfileStage`] - user-supplied certificates and TLS objects
//! 3. [`TlsProfileStage`] - device TLS profile pointers, HTTPS upgrade
//! 4. [`IRuleStage`] and [`DataGroupStage`] - traffic scripts and lookup tables
//! 5. [`WafStage`] - explicit WAF decisions on the route policies
//!
//! Stages never fail. Anything a stage cannot handle is skipped and reported
//! as a [`Diagnostic`], both through `tracing` and on the pass output.

mod custom_profiles;
mod irules;
mod resources;
mod tls;
mod waf;

use tracing::{debug, info, warn};

use bigip_common::resource::{ResourceKind, ResourceSnapshot};
use bigip_common::SynthesisConfig;

use crate::declaration::{Adc, Application, As3Object, PolicyName};

pub use custom_profiles::CustomProfileStage;
pub use irules::{DataGroupStage, IRuleStage};
pub use resources::ResourceStage;
pub use tls::{apply_tls, ingress_entries, route_entries, TlsEntry, TlsProfileStage};
pub use waf::{inject_waf, WafStage, WAF_DISABLE_RULE};

/// A recoverable anomaly found during a pass
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Diagnostic {
    /// TLS attachment does not know how to read this resource kind
    UnsupportedResourceKind {
        /// Frontend name
        frontend: String,
        /// Its kind
        kind: ResourceKind,
    },
    /// An exposure record carries a value other than http/https/both
    UnsupportedExposure {
        /// Rule named by the record
        rule: String,
        /// The unrecognized exposure
        exposure: String,
    },
    /// An exposure record names a rule the policy does not have
    MissingRule {
        /// Policy searched
        policy: PolicyName,
        /// Rule name
        rule: String,
    },
    /// A rule already carries a WAF decision; a second one was not added
    DuplicateWafDecision {
        /// Policy holding the rule
        policy: PolicyName,
        /// Rule name
        rule: String,
    },
    /// A custom profile lacks material required for its context
    IncompleteProfile {
        /// Profile name
        profile: String,
        /// What is missing
        reason: String,
    },
    /// A stage object was not declared because its name holds another kind
    NameConflict {
        /// AS3 object name
        name: String,
        /// Kind already holding the name
        existing: &'static str,
        /// Kind that was not declared
        rejected: &'static str,
    },
    /// The override payload was dropped because the partition is empty
    OverrideSuppressed {
        /// Partition name as configured
        partition: String,
    },
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnsupportedResourceKind { frontend, kind } => {
                write!(f, "unsupported resource type {kind} for frontend {frontend}")
            }
            Self::UnsupportedExposure { rule, exposure } => {
                write!(f, "unsupported exposure '{exposure}' for rule {rule}")
            }
            Self::MissingRule { policy, rule } => {
                write!(f, "rule {rule} not found in policy {policy}")
            }
            Self::DuplicateWafDecision { policy, rule } => {
                write!(f, "rule {rule} in policy {policy} already has a WAF decision")
            }
            Self::IncompleteProfile { profile, reason } => {
                write!(f, "custom profile {profile} skipped: {reason}")
            }
            Self::NameConflict {
                name,
                existing,
                rejected,
            } => {
                write!(f, "{rejected} {name} not declared: name is held by a {existing}")
            }
            Self::OverrideSuppressed { partition } => {
                write!(f, "override dropped: partition '{partition}' is empty")
            }
        }
    }
}

/// Read-only inputs of one pass
pub struct SynthesisContext<'a> {
    /// Resource snapshot (stable for the whole pass)
    pub snapshot: &'a ResourceSnapshot,
    /// Controller configuration
    pub config: &'a SynthesisConfig,
}

/// The mutable tree one pass builds, plus the diagnostics it raised
#[derive(Debug)]
pub struct DeclarationBuilder {
    adc: Adc,
    diagnostics: Vec<Diagnostic>,
}

impl DeclarationBuilder {
    /// Start a fresh tree for the configured partition
    pub fn new(config: &SynthesisConfig) -> Self {
        let mut adc = Adc::new(config.partition.clone(), config.schema_version.clone());
        adc.remark = format!("Auto-generated by bigip-ctlr ({} mode)", config.mode);
        Self {
            adc,
            diagnostics: Vec::new(),
        }
    }

    /// The tree built so far
    pub fn adc(&self) -> &Adc {
        &self.adc
    }

    /// The shared application
    pub fn app(&self) -> &Application {
        self.adc.shared_app()
    }

    /// The shared application, mutably
    pub fn app_mut(&mut self) -> &mut Application {
        self.adc.shared_app_mut()
    }

    /// Declare a stage object without displacing an object of another kind.
    ///
    /// Returns false, after raising [`Diagnostic::NameConflict`], when the
    /// name is held by an object of another kind.
    pub fn declare(&mut self, name: &str, object: As3Object) -> bool {
        let rejected = object.kind();
        match self.app_mut().insert_if_compatible(name, object) {
            Ok(()) => true,
            Err(existing) => {
                self.diagnose(Diagnostic::NameConflict {
                    name: name.to_string(),
                    existing,
                    rejected,
                });
                false
            }
        }
    }

    /// Record a diagnostic and log it
    pub fn diagnose(&mut self, diagnostic: Diagnostic) {
        match &diagnostic {
            Diagnostic::OverrideSuppressed { .. } => info!(%diagnostic, "declaration diagnostic"),
            _ => warn!(%diagnostic, "declaration diagnostic"),
        }
        self.diagnostics.push(diagnostic);
    }

    /// Diagnostics raised so far
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Finish the pass
    pub fn finish(self) -> SynthesisOutput {
        SynthesisOutput {
            adc: self.adc,
            diagnostics: self.diagnostics,
        }
    }
}

/// Result of running the pipeline
#[derive(Debug)]
pub struct SynthesisOutput {
    /// The built tree
    pub adc: Adc,
    /// Everything that was skipped along the way
    pub diagnostics: Vec<Diagnostic>,
}

/// One step of the pipeline.
///
/// Stages must be deterministic and must not perform I/O.
pub trait SynthesisStage: Send + Sync {
    /// Human-readable name used in logs
    fn name(&self) -> &str;

    /// Read from `ctx`, write into `builder`
    fn run(&self, ctx: &SynthesisContext<'_>, builder: &mut DeclarationBuilder);
}

/// An ordered list of stages
pub struct Pipeline {
    stages: Vec<Box<dyn SynthesisStage>>,
}

impl Pipeline {
    /// Create a pipeline with no stages
    pub fn empty() -> Self {
        Self { stages: Vec::new() }
    }

    /// The full pipeline in dependency order
    pub fn standard() -> Self {
        Self::empty()
            .with_stage(ResourceStage)
            .with_stage(CustomProfileStage)
            .with_stage(TlsProfileStage)
            .with_stage(IRuleStage)
            .with_stage(DataGroupStage)
            .with_stage(WafStage)
    }

    /// Append a stage
    pub fn with_stage(mut self, stage: impl SynthesisStage + 'static) -> Self {
        self.stages.push(Box::new(stage));
        self
    }

    /// Names of the stages, in run order
    pub fn stage_names(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Run every stage over `builder`
    pub fn run(&self, ctx: &SynthesisContext<'_>, builder: &mut DeclarationBuilder) {
        for stage in &self.stages {
            let before = builder.app().len();
            stage.run(ctx, builder);
            debug!(
                stage = stage.name(),
                objects = builder.app().len(),
                added = builder.app().len().saturating_sub(before),
                "synthesis stage complete"
            );
        }
    }

    /// Run a complete pass over `snapshot`
    pub fn synthesize(
        &self,
        snapshot: &ResourceSnapshot,
        config: &SynthesisConfig,
    ) -> SynthesisOutput {
        let ctx = SynthesisContext { snapshot, config };
        let mut builder = DeclarationBuilder::new(config);
        self.run(&ctx, &mut builder);
        builder.finish()
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::standard()
    }
}
