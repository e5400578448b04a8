//! iRules and the data groups they consult

use tracing::{debug, trace};

use super::{DeclarationBuilder, SynthesisContext, SynthesisStage};
use crate::declaration::{as3_name, As3Object, DataGroup, IRule};

/// Declares iRules from the snapshot
pub struct IRuleStage;

impl SynthesisStage for IRuleStage {
    fn name(&self) -> &str {
        "irules"
    }

    fn run(&self, ctx: &SynthesisContext<'_>, builder: &mut DeclarationBuilder) {
        for spec in &ctx.snapshot.irules {
            builder.declare(&as3_name(&spec.name), As3Object::IRule(IRule::from(spec)));
        }
        if !ctx.snapshot.irules.is_empty() {
            debug!(count = ctx.snapshot.irules.len(), "declared iRules");
        }
    }
}

/// Declares data groups belonging to the target partition
pub struct DataGroupStage;

impl SynthesisStage for DataGroupStage {
    fn name(&self) -> &str {
        "data-groups"
    }

    fn run(&self, ctx: &SynthesisContext<'_>, builder: &mut DeclarationBuilder) {
        for spec in &ctx.snapshot.data_groups {
            if spec.partition != ctx.config.partition {
                trace!(data_group = %spec.name, partition = %spec.partition, "data group belongs to another partition");
                continue;
            }
            builder.declare(
                &as3_name(&spec.name),
                As3Object::DataGroup(DataGroup::from(spec)),
            );
        }
    }
}
