//! Type-level rewrites that run late in the pipeline, once every
//! declaration shape is final.

use tslower_ast::{NodeKind, Prim, Ty};
use tslower_common::TransformError;

use crate::pipeline::{Pass, PassContext};

fn rewrite_all_tys(cx: &mut PassContext<'_>, f: &mut impl FnMut(&mut Ty)) {
    let mut nodes = cx.arena.descendants(cx.unit);
    nodes.push(cx.unit);
    for n in nodes {
        cx.arena.kind_mut(n).for_each_ty_mut(f);
    }
}

/// Source primitives map onto the target's three: every numeric type and
/// `char` become `Number`, `bool` becomes `Boolean`, `object` becomes `Any`.
pub struct PrimitivesToTargetTypes;

impl Pass for PrimitivesToTargetTypes {
    fn name(&self) -> &'static str {
        "PrimitivesToTargetTypes"
    }

    fn run(&mut self, cx: &mut PassContext<'_>) -> Result<(), TransformError> {
        rewrite_all_tys(cx, &mut map_ty);
        Ok(())
    }
}

fn map_ty(ty: &mut Ty) {
    match ty {
        Ty::Prim(p) => {
            if p.is_numeric() {
                *p = Prim::Number;
            } else if *p == Prim::Bool {
                *p = Prim::Boolean;
            } else if *p == Prim::Object {
                *p = Prim::Any;
            }
        }
        Ty::Named { args, .. } => {
            for a in args {
                map_ty(a);
            }
        }
        Ty::Array(elem) => map_ty(elem),
        Ty::Fn { params, ret } => {
            for p in params {
                map_ty(p);
            }
            map_ty(ret);
        }
        Ty::Nullable(inner) => map_ty(inner),
        Ty::Infer => {}
    }
}

/// The target has no nullable wrapper; the underlying type stands alone.
pub struct RemoveNullable;

impl Pass for RemoveNullable {
    fn name(&self) -> &'static str {
        "RemoveNullable"
    }

    fn run(&mut self, cx: &mut PassContext<'_>) -> Result<(), TransformError> {
        rewrite_all_tys(cx, &mut strip_nullable);
        Ok(())
    }
}

fn strip_nullable(ty: &mut Ty) {
    while let Ty::Nullable(inner) = ty {
        *ty = std::mem::replace(inner, Ty::Infer);
    }
    match ty {
        Ty::Named { args, .. } => {
            for a in args {
                strip_nullable(a);
            }
        }
        Ty::Array(elem) => strip_nullable(elem),
        Ty::Fn { params, ret } => {
            for p in params {
                strip_nullable(p);
            }
            strip_nullable(ret);
        }
        _ => {}
    }
}

/// Computes a generic-argument-stripped type for each instance-of check but
/// never attaches it. TODO: either store the stripped type on the node or
/// retire this pass; it currently changes nothing.
pub struct RemoveGenericArgsInIsExpr;

impl Pass for RemoveGenericArgsInIsExpr {
    fn name(&self) -> &'static str {
        "RemoveGenericArgsInIsExpr"
    }

    fn run(&mut self, cx: &mut PassContext<'_>) -> Result<(), TransformError> {
        for n in cx.arena.descendants(cx.unit) {
            if let NodeKind::Is { ty, .. } = cx.arena.kind(n) {
                let stripped = strip_generic_args(ty);
                tracing::debug!("[RemoveGenericArgsInIsExpr] computed {stripped:?}, unused");
            }
        }
        Ok(())
    }
}

fn strip_generic_args(ty: &Ty) -> Ty {
    match ty {
        Ty::Named { name, .. } => Ty::named(name.clone()),
        other => other.clone(),
    }
}
