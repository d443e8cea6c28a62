//! Constructor unification.
//!
//! The target allows one constructor per class. A class with several gets a
//! single dispatching constructor: the originals become private `void`
//! implementation methods named `constructor_<i>`, signature-only prototypes
//! advertise the old shapes, and the dispatcher selects an implementation by
//! `arguments.length` and runtime constructor checks. Base-constructor calls
//! cannot live inside the implementation methods (the target requires the
//! super call in the constructor itself), so every arm materializes its
//! overload's base call first, with dispatcher parameters substituted for
//! the overload's formals. A `this(...)` delegation is resolved through the
//! annotation side-table and collapses to the target's own base call plus a
//! call to the target's implementation method.

use rustc_hash::FxHashMap;
use tslower_ast::{
    CtorTarget, Modifiers, NodeArena, NodeId, NodeKind, Prim, Ty, TypeDeclKind,
};
use tslower_common::diagnostics::diagnostic_codes;
use tslower_common::{Diagnostic, TransformError};

use crate::param_diff::get_diffs;
use crate::pipeline::{Pass, PassContext};
use crate::util::{collect, substitute};

pub struct MergeCtors;

impl Pass for MergeCtors {
    fn name(&self) -> &'static str {
        "MergeCtors"
    }

    fn run(&mut self, cx: &mut PassContext<'_>) -> Result<(), TransformError> {
        let types = collect(cx.arena, cx.unit, |k| matches!(k, NodeKind::TypeDecl { .. }));
        for td in types {
            merge_type(cx, td)?;
        }
        Ok(())
    }
}

fn merge_type(cx: &mut PassContext<'_>, td: NodeId) -> Result<(), TransformError> {
    let type_name = match cx.arena.kind(td) {
        NodeKind::TypeDecl { name, .. } => name.clone(),
        _ => return Ok(()),
    };
    let ctors: Vec<NodeId> = cx
        .arena
        .children(td)
        .into_iter()
        .filter(|&c| {
            matches!(
                cx.arena.kind(c),
                NodeKind::Constructor { modifiers, .. } if !modifiers.contains(Modifiers::STATIC)
            )
        })
        .collect();
    if ctors.is_empty() {
        return Ok(());
    }

    let lists: Vec<Vec<NodeId>> = ctors
        .iter()
        .map(|&c| match cx.arena.kind(c) {
            NodeKind::Constructor { params, .. } => params.clone(),
            _ => Vec::new(),
        })
        .collect();

    // Decide mergeability before touching anything.
    let diff = if ctors.len() > 1 {
        match get_diffs(cx.arena, cx.annot, &lists) {
            Some(d) => Some(d),
            None => {
                cx.diags.push(Diagnostic::message(
                    diagnostic_codes::UNMERGEABLE_OVERLOAD_GROUP,
                    format!(
                        "constructors of `{type_name}` have a parameter with no runtime constructor; leaving them unmerged"
                    ),
                ));
                return Ok(());
            }
        }
    } else {
        None
    };

    if ctors.len() > 1 {
        for (i, &c) in ctors.iter().enumerate() {
            if let NodeKind::Constructor { name, .. } = cx.arena.kind_mut(c) {
                *name = format!("constructor_{i}");
            }
        }
    }

    // Every implementation gets an explicit base initializer.
    for &c in &ctors {
        let missing = matches!(
            cx.arena.kind(c),
            NodeKind::Constructor {
                initializer: None,
                ..
            }
        );
        if missing {
            let init = cx.arena.add_ctor_initializer(CtorTarget::Base, vec![]);
            if let NodeKind::Constructor { initializer, .. } = cx.arena.kind_mut(c) {
                *initializer = Some(init);
            }
            cx.arena.set_parent(init, Some(c));
        }
    }

    for &c in &ctors {
        inline_delegation(cx, &type_name, &ctors, c)?;
    }

    if let Some(diff) = diff {
        build_dispatcher(cx.arena, td, &ctors, diff);
    } else {
        // Single constructor: its base call just moves into the body.
        let c = ctors[0];
        let (init, body) = match cx.arena.kind(c) {
            NodeKind::Constructor {
                initializer: Some(init),
                body: Some(body),
                ..
            } => (*init, *body),
            _ => return Ok(()),
        };
        let args = match cx.arena.kind(init) {
            NodeKind::CtorInitializer { args, .. } => args.clone(),
            _ => Vec::new(),
        };
        let base = cx.arena.add_base();
        let call_args: Vec<NodeId> = args.iter().map(|&a| cx.arena.deep_clone(a)).collect();
        let call = cx.arena.add_call(base, call_args);
        let stmt = cx.arena.add_expr_stmt(call);
        prepend_stmt(cx.arena, body, stmt);
        if let NodeKind::Constructor { initializer, .. } = cx.arena.kind_mut(c) {
            *initializer = None;
        }
        cx.arena.set_parent(init, None);
    }
    Ok(())
}

/// Rewrite a `this(...)` initializer on `c` into a call to the delegation
/// target's implementation method plus the target's own base initializer
/// with formals substituted by the delegation's actual arguments.
fn inline_delegation(
    cx: &mut PassContext<'_>,
    type_name: &str,
    ctors: &[NodeId],
    c: NodeId,
) -> Result<(), TransformError> {
    let init = match cx.arena.kind(c) {
        NodeKind::Constructor {
            initializer: Some(init),
            ..
        } => *init,
        _ => return Ok(()),
    };
    let actual_args = match cx.arena.kind(init) {
        NodeKind::CtorInitializer {
            target: CtorTarget::This,
            args,
        } => args.clone(),
        _ => return Ok(()),
    };

    let target = cx.annot.ctor_target(init).filter(|t| ctors.contains(t));
    let Some(target) = target else {
        return Err(TransformError::MissingDelegateTarget {
            type_name: type_name.to_string(),
        });
    };
    let (target_name, target_params, target_init) = match cx.arena.kind(target) {
        NodeKind::Constructor {
            name,
            params,
            initializer,
            ..
        } => (name.clone(), params.clone(), *initializer),
        _ => {
            return Err(TransformError::MissingDelegateTarget {
                type_name: type_name.to_string(),
            });
        }
    };

    // The target's initializer must itself be a base call; chains of
    // this-delegation cannot be flattened in one step.
    let base_args = match target_init.map(|ti| cx.arena.kind(ti)) {
        Some(NodeKind::CtorInitializer {
            target: CtorTarget::Base,
            args,
        }) => args.clone(),
        _ => {
            return Err(TransformError::UnsupportedDelegation {
                type_name: type_name.to_string(),
            });
        }
    };

    // this.constructor_<i>(actuals) runs the target's body first.
    if let NodeKind::Constructor { body: Some(body), .. } = cx.arena.kind(c) {
        let body = *body;
        let this_ref = cx.arena.add_this();
        let callee = cx.arena.add_member(this_ref, target_name);
        let call_args: Vec<NodeId> = actual_args
            .iter()
            .map(|&a| cx.arena.deep_clone(a))
            .collect();
        let call = cx.arena.add_call(callee, call_args);
        let stmt = cx.arena.add_expr_stmt(call);
        prepend_stmt(cx.arena, body, stmt);
    }

    let mut subs: FxHashMap<String, NodeId> = FxHashMap::default();
    for (&p, &a) in target_params.iter().zip(actual_args.iter()) {
        if let NodeKind::Param { name, .. } = cx.arena.kind(p) {
            subs.insert(name.clone(), a);
        }
    }
    let new_args: Vec<NodeId> = base_args
        .iter()
        .map(|&a| {
            let clone = cx.arena.deep_clone(a);
            substitute(cx.arena, clone, &subs)
        })
        .collect();
    let new_init = cx.arena.add_ctor_initializer(CtorTarget::Base, new_args);
    if let NodeKind::Constructor { initializer, .. } = cx.arena.kind_mut(c) {
        *initializer = Some(new_init);
    }
    cx.arena.set_parent(new_init, Some(c));
    cx.arena.set_parent(init, None);
    Ok(())
}

fn build_dispatcher(
    arena: &mut NodeArena,
    td: NodeId,
    ctors: &[NodeId],
    diff: crate::param_diff::ParamDiff,
) {
    let unified_names: Vec<String> = diff
        .unified
        .iter()
        .map(|&p| match arena.kind(p) {
            NodeKind::Param { name, .. } => name.clone(),
            _ => String::new(),
        })
        .collect();

    let mut dispatcher_stmts: Vec<NodeId> = Vec::new();
    for (i, (&c, &guard)) in ctors.iter().zip(diff.guards.iter()).enumerate() {
        let (c_name, c_params, c_init) = match arena.kind(c) {
            NodeKind::Constructor {
                name,
                params,
                initializer,
                ..
            } => (name.clone(), params.clone(), *initializer),
            _ => continue,
        };

        // Dispatcher formals stand in for the overload's own.
        let mut subs: FxHashMap<String, NodeId> = FxHashMap::default();
        for (j, &p) in c_params.iter().enumerate() {
            let formal = match arena.kind(p) {
                NodeKind::Param { name, .. } => name.clone(),
                _ => continue,
            };
            let template = arena.add_ident(unified_names[j].clone());
            subs.insert(formal, template);
        }

        let base_args = match c_init.map(|ci| arena.kind(ci)) {
            Some(NodeKind::CtorInitializer { args, .. }) => args.clone(),
            _ => Vec::new(),
        };
        let base = arena.add_base();
        let call_args: Vec<NodeId> = base_args
            .iter()
            .map(|&a| {
                let clone = arena.deep_clone(a);
                substitute(arena, clone, &subs)
            })
            .collect();
        let base_call = arena.add_call(base, call_args);
        let base_stmt = arena.add_expr_stmt(base_call);

        let this_ref = arena.add_this();
        let callee = arena.add_member(this_ref, c_name);
        let impl_args: Vec<NodeId> = unified_names[..c_params.len()]
            .iter()
            .map(|n| arena.add_ident(n.clone()))
            .collect();
        let impl_call = arena.add_call(callee, impl_args);
        let impl_stmt = arena.add_expr_stmt(impl_call);

        if i + 1 < ctors.len() {
            let ret = arena.add_return(None);
            let block = arena.add_block(vec![base_stmt, impl_stmt, ret]);
            let arm = arena.add_if(guard, block, None);
            dispatcher_stmts.push(arm);
        } else {
            // The last overload is the unguarded fallback.
            dispatcher_stmts.push(base_stmt);
            dispatcher_stmts.push(impl_stmt);
        }
    }

    let body = arena.add_block(dispatcher_stmts);
    let dispatcher = arena.add_constructor(diff.unified, None, Some(body));
    arena.insert_before(ctors[0], dispatcher);

    for &c in ctors {
        let (c_name, c_params, c_body) = match arena.kind(c) {
            NodeKind::Constructor {
                name, params, body, ..
            } => (name.clone(), params.clone(), *body),
            _ => continue,
        };
        if let NodeKind::Constructor { body, .. } = arena.kind_mut(c) {
            *body = None;
        }
        if let Some(b) = c_body {
            arena.set_parent(b, None);
        }

        let impl_params = clone_params_without_defaults(arena, &c_params);
        let m = arena.add_method(c_name, Ty::Prim(Prim::Void), impl_params, c_body);
        if let NodeKind::Method { modifiers, .. } = arena.kind_mut(m) {
            modifiers.insert(Modifiers::PRIVATE);
        }
        arena.replace(c, m);

        let proto_params = clone_params_without_defaults(arena, &c_params);
        let proto = arena.add_constructor(proto_params, None, None);
        arena.insert_before(dispatcher, proto);
    }
}

pub(crate) fn clone_params_without_defaults(
    arena: &mut NodeArena,
    params: &[NodeId],
) -> Vec<NodeId> {
    params
        .iter()
        .map(|&p| {
            let clone = arena.deep_clone(p);
            let dropped = match arena.kind_mut(clone) {
                NodeKind::Param { default, .. } => default.take(),
                _ => None,
            };
            if let Some(d) = dropped {
                arena.set_parent(d, None);
            }
            clone
        })
        .collect()
}

pub(crate) fn prepend_stmt(arena: &mut NodeArena, block: NodeId, stmt: NodeId) {
    let first = arena.primary_list(block).and_then(|l| l.first().copied());
    match first {
        Some(first) => arena.insert_before(first, stmt),
        None => arena.push_child(block, stmt),
    }
}

/// Classes without any constructor get a default one that just calls the
/// base constructor.
pub struct EnsureAtLeastOneCtor;

impl Pass for EnsureAtLeastOneCtor {
    fn name(&self) -> &'static str {
        "EnsureAtLeastOneCtor"
    }

    fn run(&mut self, cx: &mut PassContext<'_>) -> Result<(), TransformError> {
        let types = collect(cx.arena, cx.unit, |k| {
            matches!(
                k,
                NodeKind::TypeDecl {
                    kind: TypeDeclKind::Class,
                    ..
                }
            )
        });
        for td in types {
            let has_ctor = cx
                .arena
                .children(td)
                .iter()
                .any(|&m| matches!(cx.arena.kind(m), NodeKind::Constructor { .. }));
            if has_ctor {
                continue;
            }
            let base = cx.arena.add_base();
            let call = cx.arena.add_call(base, vec![]);
            let stmt = cx.arena.add_expr_stmt(call);
            let body = cx.arena.add_block(vec![stmt]);
            let ctor = cx.arena.add_constructor(vec![], None, Some(body));
            cx.arena.push_child(td, ctor);
        }
        Ok(())
    }
}

/// Field initializers run before the constructor body in the target, so the
/// base call has to come first or the initializers would see a half-built
/// instance.
pub struct MakeSuperCtorFirst;

impl Pass for MakeSuperCtorFirst {
    fn name(&self) -> &'static str {
        "MakeSuperCtorFirst"
    }

    fn run(&mut self, cx: &mut PassContext<'_>) -> Result<(), TransformError> {
        let ctors = collect(cx.arena, cx.unit, |k| {
            matches!(k, NodeKind::Constructor { body: Some(_), .. })
        });
        for c in ctors {
            let Some(td) = cx
                .arena
                .ancestor_matching(c, |k| matches!(k, NodeKind::TypeDecl { .. }))
            else {
                continue;
            };
            let has_inits = cx.arena.children(td).iter().any(|&m| {
                matches!(
                    cx.arena.kind(m),
                    NodeKind::Field {
                        initializer: Some(_),
                        ..
                    }
                )
            });
            if !has_inits {
                continue;
            }
            let body = match cx.arena.kind(c) {
                NodeKind::Constructor { body: Some(b), .. } => *b,
                _ => continue,
            };
            // Only the body's direct statements; base calls nested in
            // dispatch arms stay where the merger put them.
            let supers: Vec<NodeId> = cx
                .arena
                .primary_list(body)
                .map(|l| l.clone())
                .unwrap_or_default()
                .into_iter()
                .filter(|&s| {
                    matches!(cx.arena.kind(s), NodeKind::ExprStmt { .. })
                        && contains_base_call(cx.arena, s)
                })
                .collect();
            if supers.is_empty() {
                continue;
            }
            for &s in &supers {
                cx.arena.detach(s);
            }
            prepend_stmt(cx.arena, body, supers[0]);
        }
        Ok(())
    }
}

fn contains_base_call(arena: &NodeArena, stmt: NodeId) -> bool {
    arena.descendants(stmt).into_iter().any(|d| {
        matches!(
            arena.kind(d),
            NodeKind::Call { callee, .. } if matches!(arena.kind(*callee), NodeKind::Base)
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tslower_ast::Annotations;
    use tslower_common::Diagnostics;

    fn run_merge(
        arena: &mut NodeArena,
        annot: &Annotations,
        unit: NodeId,
    ) -> Result<Diagnostics, TransformError> {
        let mut diags = Diagnostics::new();
        MergeCtors.run(&mut PassContext {
            arena,
            annot,
            unit,
            diags: &mut diags,
        })?;
        Ok(diags)
    }

    #[test]
    fn two_ctors_become_one_dispatcher() {
        let mut arena = NodeArena::new();
        let c0_body = arena.add_block(vec![]);
        let c0 = arena.add_constructor(vec![], None, Some(c0_body));
        let x = arena.add_param("x", Ty::Prim(Prim::Int));
        let c1_body = arena.add_block(vec![]);
        let c1 = arena.add_constructor(vec![x], None, Some(c1_body));
        let cls = arena.add_type_decl("C", TypeDeclKind::Class, vec![c0, c1]);
        let unit = arena.add_unit(vec![cls]);
        let annot = Annotations::new();

        let diags = run_merge(&mut arena, &annot, unit).unwrap();
        assert!(diags.is_empty());

        let members = arena.primary_list(cls).unwrap().clone();
        assert_eq!(members.len(), 5);

        // Two signature-only prototypes first.
        for &proto in &members[0..2] {
            assert!(matches!(
                arena.kind(proto),
                NodeKind::Constructor { body: None, .. }
            ));
        }

        // Then the dispatcher: one guarded arm, then the fallback splice.
        let dispatcher = members[2];
        let NodeKind::Constructor {
            params,
            body: Some(body),
            ..
        } = arena.kind(dispatcher)
        else {
            panic!("expected dispatching constructor");
        };
        assert_eq!(params.len(), 1);
        assert!(matches!(
            arena.kind(params[0]),
            NodeKind::Param { optional: true, .. }
        ));
        let stmts = arena.primary_list(*body).unwrap().clone();
        assert_eq!(stmts.len(), 3);
        assert!(matches!(arena.kind(stmts[0]), NodeKind::If { .. }));
        assert!(matches!(arena.kind(stmts[1]), NodeKind::ExprStmt { .. }));
        assert!(matches!(arena.kind(stmts[2]), NodeKind::ExprStmt { .. }));

        // Implementations renamed and privatized.
        for (i, &m) in members[3..5].iter().enumerate() {
            match arena.kind(m) {
                NodeKind::Method {
                    name, modifiers, ..
                } => {
                    assert_eq!(name, &format!("constructor_{i}"));
                    assert!(modifiers.contains(Modifiers::PRIVATE));
                }
                other => panic!("unexpected kind {other:?}"),
            }
        }
    }

    #[test]
    fn single_ctor_base_call_moves_into_body() {
        let mut arena = NodeArena::new();
        let five = arena.add_int(5);
        let init = arena.add_ctor_initializer(CtorTarget::Base, vec![five]);
        let callee = arena.add_ident("setup");
        let call = arena.add_call(callee, vec![]);
        let existing = arena.add_expr_stmt(call);
        let body = arena.add_block(vec![existing]);
        let c = arena.add_constructor(vec![], Some(init), Some(body));
        let cls = arena.add_type_decl("C", TypeDeclKind::Class, vec![c]);
        let unit = arena.add_unit(vec![cls]);
        let annot = Annotations::new();

        run_merge(&mut arena, &annot, unit).unwrap();

        assert!(matches!(
            arena.kind(c),
            NodeKind::Constructor {
                initializer: None,
                ..
            }
        ));
        let stmts = arena.primary_list(body).unwrap().clone();
        assert_eq!(stmts.len(), 2);
        assert!(contains_base_call(&arena, stmts[0]));
    }

    #[test]
    fn this_delegation_is_inlined() {
        let mut arena = NodeArena::new();
        // C(x) : base(x) {}   and   C() : this(42) {}
        let x = arena.add_param("x", Ty::Prim(Prim::Int));
        let x_ref = arena.add_ident("x");
        let base_init = arena.add_ctor_initializer(CtorTarget::Base, vec![x_ref]);
        let c0_body = arena.add_block(vec![]);
        let c0 = arena.add_constructor(vec![x], Some(base_init), Some(c0_body));

        let forty_two = arena.add_int(42);
        let this_init = arena.add_ctor_initializer(CtorTarget::This, vec![forty_two]);
        let c1_body = arena.add_block(vec![]);
        let c1 = arena.add_constructor(vec![], Some(this_init), Some(c1_body));

        let cls = arena.add_type_decl("C", TypeDeclKind::Class, vec![c0, c1]);
        let unit = arena.add_unit(vec![cls]);
        let mut annot = Annotations::new();
        annot.set_ctor_target(this_init, c0);

        let diags = run_merge(&mut arena, &annot, unit).unwrap();
        assert!(diags.is_empty());

        // The delegating overload's body now starts with
        // this.constructor_0(42), and its arm's base call received the
        // substituted argument. The bodies were moved into methods; find
        // the one for overload 1.
        let members = arena.primary_list(cls).unwrap().clone();
        let impl1 = members
            .iter()
            .copied()
            .find(|&m| {
                matches!(arena.kind(m), NodeKind::Method { name, .. } if name == "constructor_1")
            })
            .expect("implementation method for overload 1");
        let NodeKind::Method { body: Some(b), .. } = arena.kind(impl1) else {
            panic!("expected body");
        };
        let stmts = arena.primary_list(*b).unwrap().clone();
        assert_eq!(stmts.len(), 1);
        let NodeKind::ExprStmt { expr } = arena.kind(stmts[0]) else {
            panic!("expected call statement");
        };
        let NodeKind::Call { callee, args } = arena.kind(*expr) else {
            panic!("expected call");
        };
        assert!(
            matches!(arena.kind(*callee), NodeKind::Member { name, .. } if name == "constructor_0")
        );
        assert_eq!(*arena.kind(args[0]), NodeKind::Int(42));
    }

    #[test]
    fn delegation_without_target_is_fatal() {
        let mut arena = NodeArena::new();
        let this_init = arena.add_ctor_initializer(CtorTarget::This, vec![]);
        let body = arena.add_block(vec![]);
        let c = arena.add_constructor(vec![], Some(this_init), Some(body));
        let x = arena.add_param("x", Ty::Prim(Prim::Int));
        let other_body = arena.add_block(vec![]);
        let other = arena.add_constructor(vec![x], None, Some(other_body));
        let cls = arena.add_type_decl("Broken", TypeDeclKind::Class, vec![c, other]);
        let unit = arena.add_unit(vec![cls]);
        let annot = Annotations::new();

        let err = run_merge(&mut arena, &annot, unit).unwrap_err();
        assert_eq!(
            err,
            TransformError::MissingDelegateTarget {
                type_name: "Broken".into()
            }
        );
    }

    #[test]
    fn classes_without_ctors_get_a_default_one() {
        let mut arena = NodeArena::new();
        let cls = arena.add_type_decl("Empty", TypeDeclKind::Class, vec![]);
        let iface = arena.add_type_decl("IThing", TypeDeclKind::Interface, vec![]);
        let unit = arena.add_unit(vec![cls, iface]);
        let annot = Annotations::new();
        let mut diags = Diagnostics::new();

        EnsureAtLeastOneCtor
            .run(&mut PassContext {
                arena: &mut arena,
                annot: &annot,
                unit,
                diags: &mut diags,
            })
            .unwrap();

        let members = arena.primary_list(cls).unwrap().clone();
        assert_eq!(members.len(), 1);
        assert!(matches!(
            arena.kind(members[0]),
            NodeKind::Constructor { body: Some(_), .. }
        ));
        assert!(arena.primary_list(iface).unwrap().is_empty());
    }

    #[test]
    fn super_call_moves_before_other_statements() {
        let mut arena = NodeArena::new();
        let one = arena.add_int(1);
        let f = arena.add_field("count", Ty::Prim(Prim::Int), Some(one));

        let setup = {
            let callee = arena.add_ident("setup");
            let call = arena.add_call(callee, vec![]);
            arena.add_expr_stmt(call)
        };
        let sup = {
            let base = arena.add_base();
            let call = arena.add_call(base, vec![]);
            arena.add_expr_stmt(call)
        };
        let body = arena.add_block(vec![setup, sup]);
        let c = arena.add_constructor(vec![], None, Some(body));
        let cls = arena.add_type_decl("C", TypeDeclKind::Class, vec![f, c]);
        let unit = arena.add_unit(vec![cls]);
        let annot = Annotations::new();
        let mut diags = Diagnostics::new();

        MakeSuperCtorFirst
            .run(&mut PassContext {
                arena: &mut arena,
                annot: &annot,
                unit,
                diags: &mut diags,
            })
            .unwrap();

        let stmts = arena.primary_list(body).unwrap().clone();
        assert_eq!(stmts, vec![sup, setup]);
    }
}
