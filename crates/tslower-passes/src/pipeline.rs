//! The fixed-order lowering pipeline.
//!
//! Every rewrite is a [`Pass`] over the shared arena. The pipeline applies
//! the declared list strictly in order; passes mutate the tree in place and
//! later passes rely on invariants established by earlier ones (constructor
//! merging runs before modifier stripping, loop labeling before the goto
//! encoding). A pass that fails a local precondition either records a
//! diagnostic and leaves the offending node alone, or aborts the whole run
//! with a [`TransformError`]; passes are never reordered or skipped around a
//! failure.

use tslower_ast::{Annotations, NodeArena, NodeId};
use tslower_common::{Diagnostics, TransformError};

use crate::classes::{
    LiftNestedClasses, RemoveAttributes, RemoveConstraints, RemoveEnumBaseType, RemoveModifiers,
    StructToClass,
};
use crate::ctors::{EnsureAtLeastOneCtor, MakeSuperCtorFirst, MergeCtors};
use crate::goto_removal::GotoRemoval;
use crate::members::{FixEvents, IndexersToMethods, PropertiesToMethods};
use crate::names::{FixBadNames, RenameLibraryMembers};
use crate::overloads::MergeOverloads;
use crate::refs::WrapRefArgs;
use crate::statements::{MakeWhileLoop, RemoveEmptySwitch};
use crate::types::{PrimitivesToTargetTypes, RemoveGenericArgsInIsExpr, RemoveNullable};

/// Everything a pass can see and touch during one run.
pub struct PassContext<'a> {
    pub arena: &'a mut NodeArena,
    pub annot: &'a Annotations,
    pub unit: NodeId,
    pub diags: &'a mut Diagnostics,
}

pub trait Pass {
    fn name(&self) -> &'static str;

    fn run(&mut self, cx: &mut PassContext<'_>) -> Result<(), TransformError>;
}

/// The ordered pass list plus the driver that threads the shared state
/// through it.
pub struct Pipeline {
    passes: Vec<Box<dyn Pass>>,
}

impl Pipeline {
    /// The full lowering pipeline in its declared order.
    pub fn lowering() -> Pipeline {
        Pipeline {
            passes: vec![
                Box::new(FixBadNames),
                Box::new(LiftNestedClasses),
                Box::new(RemoveConstraints),
                Box::new(StructToClass),
                Box::new(MergeCtors),
                Box::new(EnsureAtLeastOneCtor),
                Box::new(MakeSuperCtorFirst),
                Box::new(MergeOverloads),
                Box::new(PropertiesToMethods),
                Box::new(FixEvents),
                Box::new(IndexersToMethods),
                Box::new(WrapRefArgs),
                Box::new(PrimitivesToTargetTypes),
                Box::new(RenameLibraryMembers),
                Box::new(RemoveNullable),
                Box::new(RemoveEnumBaseType),
                Box::new(RemoveGenericArgsInIsExpr),
                Box::new(RemoveAttributes),
                Box::new(RemoveModifiers),
                Box::new(RemoveEmptySwitch),
                Box::new(MakeWhileLoop),
                Box::new(GotoRemoval::new()),
            ],
        }
    }

    pub fn run(
        &mut self,
        arena: &mut NodeArena,
        annot: &Annotations,
        unit: NodeId,
        diags: &mut Diagnostics,
    ) -> Result<(), TransformError> {
        for pass in &mut self.passes {
            tracing::debug!("[pipeline] running {}", pass.name());
            let mut cx = PassContext {
                arena,
                annot,
                unit,
                diags,
            };
            pass.run(&mut cx)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pipeline_runs_on_empty_unit() {
        let mut arena = NodeArena::new();
        let unit = arena.add_unit(vec![]);
        let annot = Annotations::new();
        let mut diags = Diagnostics::new();

        let mut pipeline = Pipeline::lowering();
        pipeline
            .run(&mut arena, &annot, unit, &mut diags)
            .expect("empty unit lowers cleanly");
        assert!(diags.is_empty());
    }
}
