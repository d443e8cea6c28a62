//! Method overload unification.
//!
//! Groups of same-named methods collapse into one dispatching method whose
//! parameter list covers every overload. The originals become private
//! implementations named `<name>_<i>`, signature-only prototypes keep the
//! old shapes visible to callers, and the dispatcher picks an
//! implementation by `arguments.length` plus runtime constructor checks on
//! the unified parameters. Interface overloads have no bodies, so their
//! dispatcher is signature-only and the originals simply disappear.

use indexmap::IndexMap;
use tslower_ast::{Modifiers, NodeId, NodeKind, Prim, Ty, TypeDeclKind};
use tslower_common::diagnostics::diagnostic_codes;
use tslower_common::{Diagnostic, TransformError};

use crate::ctors::clone_params_without_defaults;
use crate::param_diff::get_diffs;
use crate::pipeline::{Pass, PassContext};
use crate::util::collect;

pub struct MergeOverloads;

impl Pass for MergeOverloads {
    fn name(&self) -> &'static str {
        "MergeOverloads"
    }

    fn run(&mut self, cx: &mut PassContext<'_>) -> Result<(), TransformError> {
        let types = collect(cx.arena, cx.unit, |k| matches!(k, NodeKind::TypeDecl { .. }));
        for td in types {
            merge_type(cx, td);
        }
        Ok(())
    }
}

fn merge_type(cx: &mut PassContext<'_>, td: NodeId) {
    let (type_name, is_interface) = match cx.arena.kind(td) {
        NodeKind::TypeDecl { name, kind, .. } => {
            (name.clone(), *kind == TypeDeclKind::Interface)
        }
        _ => return,
    };

    // Static and instance methods dispatch separately even when they share
    // a name. Insertion order keeps the output stable.
    let mut groups: IndexMap<(String, bool), Vec<NodeId>> = IndexMap::new();
    for m in cx.arena.children(td) {
        if let NodeKind::Method {
            name, modifiers, ..
        } = cx.arena.kind(m)
        {
            groups
                .entry((name.clone(), modifiers.contains(Modifiers::STATIC)))
                .or_default()
                .push(m);
        }
    }

    for ((name, is_static), ms) in groups {
        if ms.len() < 2 {
            continue;
        }
        merge_group(cx, td, &type_name, is_interface, &name, is_static, &ms);
    }
}

fn merge_group(
    cx: &mut PassContext<'_>,
    _td: NodeId,
    type_name: &str,
    is_interface: bool,
    name: &str,
    is_static: bool,
    ms: &[NodeId],
) {
    let lists: Vec<Vec<NodeId>> = ms
        .iter()
        .map(|&m| match cx.arena.kind(m) {
            NodeKind::Method { params, .. } => params.clone(),
            _ => Vec::new(),
        })
        .collect();
    let Some(diff) = get_diffs(cx.arena, cx.annot, &lists) else {
        cx.diags.push(Diagnostic::message(
            diagnostic_codes::UNMERGEABLE_OVERLOAD_GROUP,
            format!(
                "overloads of `{type_name}.{name}` have a parameter with no runtime constructor; leaving them unmerged"
            ),
        ));
        return;
    };

    for (i, &m) in ms.iter().enumerate() {
        if let NodeKind::Method { name: n, .. } = cx.arena.kind_mut(m) {
            *n = format!("{name}_{i}");
        }
    }

    let (return_ty, modifiers) = match cx.arena.kind(ms[0]) {
        NodeKind::Method {
            return_ty,
            modifiers,
            ..
        } => (return_ty.clone(), *modifiers),
        _ => return,
    };
    let returns_void = return_ty == Ty::Prim(Prim::Void);
    let unified_names: Vec<String> = diff
        .unified
        .iter()
        .map(|&p| match cx.arena.kind(p) {
            NodeKind::Param { name, .. } => name.clone(),
            _ => String::new(),
        })
        .collect();

    let body = if is_interface {
        None
    } else {
        let mut stmts: Vec<NodeId> = Vec::new();
        for (i, (&m, &guard)) in ms.iter().zip(diff.guards.iter()).enumerate() {
            let arity = lists[i].len();
            let impl_name = match cx.arena.kind(m) {
                NodeKind::Method { name, .. } => name.clone(),
                _ => continue,
            };
            let target = if is_static {
                cx.arena.add_ident(type_name.to_string())
            } else {
                cx.arena.add_this()
            };
            let callee = cx.arena.add_member(target, impl_name);
            let args: Vec<NodeId> = unified_names[..arity]
                .iter()
                .map(|n| cx.arena.add_ident(n.clone()))
                .collect();
            let call = cx.arena.add_call(callee, args);

            let last = i + 1 == ms.len();
            let mut arm_stmts: Vec<NodeId> = Vec::new();
            if returns_void {
                arm_stmts.push(cx.arena.add_expr_stmt(call));
                if !last {
                    arm_stmts.push(cx.arena.add_return(None));
                }
            } else {
                arm_stmts.push(cx.arena.add_return(Some(call)));
            }
            if last {
                stmts.extend(arm_stmts);
            } else {
                let block = cx.arena.add_block(arm_stmts);
                stmts.push(cx.arena.add_if(guard, block, None));
            }
        }
        Some(cx.arena.add_block(stmts))
    };

    let dispatcher = cx
        .arena
        .add_method(name.to_string(), return_ty.clone(), diff.unified, body);
    if let NodeKind::Method { modifiers: m, .. } = cx.arena.kind_mut(dispatcher) {
        *m = modifiers;
    }
    cx.arena.insert_before(ms[0], dispatcher);

    for (i, &m) in ms.iter().enumerate() {
        if is_interface {
            cx.arena.detach(m);
            continue;
        }
        let proto_params = clone_params_without_defaults(cx.arena, &lists[i]);
        let proto = cx
            .arena
            .add_method(name.to_string(), return_ty.clone(), proto_params, None);
        if let NodeKind::Method { modifiers: pm, .. } = cx.arena.kind_mut(proto) {
            *pm = modifiers;
        }
        cx.arena.insert_before(dispatcher, proto);

        let dropped: Vec<NodeId> = lists[i]
            .iter()
            .filter_map(|&p| match cx.arena.kind_mut(p) {
                NodeKind::Param { default, .. } => default.take(),
                _ => None,
            })
            .collect();
        for d in dropped {
            cx.arena.set_parent(d, None);
        }
        if let NodeKind::Method { modifiers: m, .. } = cx.arena.kind_mut(m) {
            m.insert(Modifiers::PRIVATE);
        }
    }
}
