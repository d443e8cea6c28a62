//! Identifier renaming passes.

use tslower_ast::{NodeKind, Prim, Ty};
use tslower_common::TransformError;

use crate::pipeline::{Pass, PassContext};

/// Compiler-generated names can carry `<` and `>` (iterator state machines,
/// anonymous types); the target only accepts plain identifiers.
pub struct FixBadNames;

fn scrub(name: &mut String) {
    if name.contains(['<', '>']) {
        *name = name.replace(['<', '>'], "_");
    }
}

impl Pass for FixBadNames {
    fn name(&self) -> &'static str {
        "FixBadNames"
    }

    fn run(&mut self, cx: &mut PassContext<'_>) -> Result<(), TransformError> {
        let mut nodes = cx.arena.descendants(cx.unit);
        nodes.push(cx.unit);
        for n in nodes {
            match cx.arena.kind_mut(n) {
                NodeKind::Ident(name)
                | NodeKind::TypeDecl { name, .. }
                | NodeKind::Method { name, .. }
                | NodeKind::Constructor { name, .. }
                | NodeKind::Field { name, .. }
                | NodeKind::Property { name, .. }
                | NodeKind::Event { name, .. }
                | NodeKind::Param { name, .. }
                | NodeKind::VarDecl { name, .. }
                | NodeKind::Member { name, .. } => scrub(name),
                _ => {}
            }
        }
        Ok(())
    }
}

/// Library member names the target spells differently.
pub struct RenameLibraryMembers;

impl Pass for RenameLibraryMembers {
    fn name(&self) -> &'static str {
        "RenameLibraryMembers"
    }

    fn run(&mut self, cx: &mut PassContext<'_>) -> Result<(), TransformError> {
        let members: Vec<_> = cx
            .arena
            .descendants(cx.unit)
            .into_iter()
            .filter(|&n| matches!(cx.arena.kind(n), NodeKind::Member { name, .. } if name == "Length"))
            .collect();
        for m in members {
            let target = match cx.arena.kind(m) {
                NodeKind::Member { target, .. } => *target,
                _ => continue,
            };
            let renames = matches!(
                cx.annot.resolved_ty(target),
                Some(Ty::Array(_) | Ty::Prim(Prim::String))
            );
            if renames {
                if let NodeKind::Member { name, .. } = cx.arena.kind_mut(m) {
                    *name = "length".to_string();
                }
            }
        }
        Ok(())
    }
}
