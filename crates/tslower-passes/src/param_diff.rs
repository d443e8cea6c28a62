//! Parameter-list diffing for the overload mergers.
//!
//! Given every overload's parameter list, devise the one unified list the
//! dispatcher will carry, plus one runtime guard expression per overload.
//! The guard tests `arguments.length` and the runtime constructor of each
//! checkable parameter; positions typed as interfaces or delegates have no
//! runtime constructor and are skipped. A position with no constructor at
//! all makes the whole group unmergeable.

use tslower_ast::{merge_types, Annotations, BinaryOp, NodeArena, NodeId, NodeKind, Prim, Ty};

/// The unified parameter nodes (detached, ready to attach to a dispatcher)
/// and one guard expression per overload, in overload order.
pub struct ParamDiff {
    pub unified: Vec<NodeId>,
    pub guards: Vec<NodeId>,
}

/// Diff the given parameter lists. `None` when some overload cannot be
/// guarded at runtime; nothing reachable from the tree is modified either
/// way.
pub fn get_diffs(
    arena: &mut NodeArena,
    annot: &Annotations,
    lists: &[Vec<NodeId>],
) -> Option<ParamDiff> {
    if !lists.iter().all(|l| list_guardable(arena, annot, l)) {
        return None;
    }

    let max_args = lists.iter().map(Vec::len).max().unwrap_or(0);
    let min_args = lists.iter().map(Vec::len).min().unwrap_or(0);

    let mut unified: Vec<Option<NodeId>> = vec![None; max_args];
    for list in lists {
        for (i, &p) in list.iter().enumerate() {
            match unified[i] {
                None => {
                    let clone = arena.deep_clone(p);
                    if let NodeKind::Param {
                        optional, default, ..
                    } = arena.kind_mut(clone)
                    {
                        if i >= min_args && default.is_none() {
                            *optional = true;
                        }
                    }
                    unified[i] = Some(clone);
                }
                Some(ex) => {
                    let (p_name, p_ty) = match arena.kind(p) {
                        NodeKind::Param { name, ty, .. } => (name.clone(), ty.clone()),
                        _ => continue,
                    };
                    if let NodeKind::Param { name, ty, .. } = arena.kind_mut(ex) {
                        if *name != p_name {
                            let or_name = format!("Or{}", capitalize(&p_name));
                            let prefix = format!("{p_name}Or");
                            if !name.starts_with(&prefix) && !name.contains(&or_name) {
                                name.push_str(&or_name);
                            }
                        }
                        *ty = merge_types(ty, &p_ty);
                    }
                }
            }
        }
    }
    let unified: Vec<NodeId> = unified.into_iter().flatten().collect();

    let mut guards = Vec::with_capacity(lists.len());
    for list in lists {
        guards.push(make_condition(arena, annot, list, &unified));
    }

    Some(ParamDiff { unified, guards })
}

fn list_guardable(arena: &NodeArena, annot: &Annotations, list: &[NodeId]) -> bool {
    list.iter().all(|&p| match arena.kind(p) {
        NodeKind::Param { ty, .. } => {
            annot.is_interface(ty)
                || annot.is_delegate(ty)
                || js_constructor_ty(annot, ty).is_some()
        }
        _ => false,
    })
}

/// Build one overload's guard: an `arguments.length` check conjoined with a
/// runtime instance-of test per checkable position. The identifiers name the
/// unified parameters, the types come from the overload's own signature.
fn make_condition(
    arena: &mut NodeArena,
    annot: &Annotations,
    list: &[NodeId],
    unified: &[NodeId],
) -> NodeId {
    let args_ident = arena.add_ident("arguments");
    let args_len = arena.add_member(args_ident, "length");
    let count = arena.add_int(list.len() as i64);
    let mut cond = arena.add_binary(BinaryOp::Eq, args_len, count);

    for (i, &p) in list.iter().enumerate() {
        let ty = match arena.kind(p) {
            NodeKind::Param { ty, .. } => ty.clone(),
            _ => continue,
        };
        if annot.is_interface(&ty) || annot.is_delegate(&ty) {
            continue;
        }
        let Some(ctor) = js_constructor_ty(annot, &ty) else {
            continue;
        };
        let unified_name = match arena.kind(unified[i]) {
            NodeKind::Param { name, .. } => name.clone(),
            _ => continue,
        };
        let ident = arena.add_ident(unified_name);
        let check = arena.add_is(ident, ctor);
        cond = arena.add_binary(BinaryOp::And, cond, check);
    }
    cond
}

/// The runtime constructor a value of `ty` can be tested against. Enums are
/// plain numbers at runtime, arrays all share one constructor, named types
/// check against their bare (argument-stripped) name.
pub fn js_constructor_ty(annot: &Annotations, ty: &Ty) -> Option<Ty> {
    if annot.is_enum(ty) {
        return Some(Ty::named("Number"));
    }
    match ty {
        Ty::Array(_) => Some(Ty::named("Array")),
        Ty::Nullable(inner) => js_constructor_ty(annot, inner),
        Ty::Named { name, .. } => Some(Ty::named(name.clone())),
        Ty::Fn { .. } | Ty::Infer => None,
        Ty::Prim(p) => match p {
            Prim::Object | Prim::Any => Some(Ty::named("Object")),
            Prim::String => Some(Ty::named("String")),
            Prim::Bool | Prim::Boolean => Some(Ty::named("Boolean")),
            Prim::Char
            | Prim::Byte
            | Prim::Short
            | Prim::Int
            | Prim::Long
            | Prim::Float
            | Prim::Double
            | Prim::Number => Some(Ty::named("Number")),
            Prim::Void => None,
        },
    }
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        None => String::new(),
        Some(first) if first.is_uppercase() => name.to_string(),
        Some(first) => first.to_uppercase().chain(chars).collect(),
    }
}
