//! Member-shape lowering: properties, events, and indexers all become
//! things the target actually has.

use tslower_ast::{
    AssignOp, Modifiers, NodeId, NodeKind, Prim, Ty, TypeDeclKind,
};
use tslower_common::TransformError;

use crate::pipeline::{Pass, PassContext};
use crate::util::collect;

/// Auto-properties become plain fields. Properties with accessor bodies
/// become `get_<Name>` and `set_<Name>` methods.
pub struct PropertiesToMethods;

impl Pass for PropertiesToMethods {
    fn name(&self) -> &'static str {
        "PropertiesToMethods"
    }

    fn run(&mut self, cx: &mut PassContext<'_>) -> Result<(), TransformError> {
        let props = collect(cx.arena, cx.unit, |k| matches!(k, NodeKind::Property { .. }));
        for p in props {
            let NodeKind::Property {
                name,
                modifiers,
                ty,
                has_getter,
                getter,
                has_setter,
                setter,
                ..
            } = cx.arena.kind(p)
            else {
                continue;
            };
            let (name, modifiers, ty) = (name.clone(), *modifiers, ty.clone());
            let (has_getter, has_setter) = (*has_getter, *has_setter);
            let (getter, setter) = (*getter, *setter);

            if has_getter && has_setter && getter.is_none() && setter.is_none() {
                let field = cx.arena.add_field(name, ty, None);
                if let NodeKind::Field { modifiers: m, .. } = cx.arena.kind_mut(field) {
                    *m = modifiers;
                }
                cx.arena.replace(p, field);
                continue;
            }

            // Accessor bodies move; the property node is discarded.
            if let NodeKind::Property {
                getter, setter, ..
            } = cx.arena.kind_mut(p)
            {
                *getter = None;
                *setter = None;
            }
            if has_getter {
                if let Some(b) = getter {
                    cx.arena.set_parent(b, None);
                }
                let m = cx
                    .arena
                    .add_method(format!("get_{name}"), ty.clone(), vec![], getter);
                if let NodeKind::Method { modifiers: mm, .. } = cx.arena.kind_mut(m) {
                    *mm = modifiers;
                }
                cx.arena.insert_before(p, m);
            }
            if has_setter {
                if let Some(b) = setter {
                    cx.arena.set_parent(b, None);
                }
                let value = cx.arena.add_param("value", ty.clone());
                let m = cx.arena.add_method(
                    format!("set_{name}"),
                    Ty::Prim(Prim::Void),
                    vec![value],
                    setter,
                );
                if let NodeKind::Method { modifiers: mm, .. } = cx.arena.kind_mut(m) {
                    *mm = modifiers;
                }
                cx.arena.insert_before(p, m);
            }
            cx.arena.detach(p);
        }
        Ok(())
    }
}

/// Events become `NEvent<T>` fields; `+=`/`-=` on them become `.add()` and
/// `.remove()` calls, and reading an event into a variable goes through
/// `.ToMulticastFunction()`.
pub struct FixEvents;

impl Pass for FixEvents {
    fn name(&self) -> &'static str {
        "FixEvents"
    }

    fn run(&mut self, cx: &mut PassContext<'_>) -> Result<(), TransformError> {
        let events = collect(cx.arena, cx.unit, |k| matches!(k, NodeKind::Event { .. }));
        for e in events {
            let NodeKind::Event {
                name, modifiers, ty, ..
            } = cx.arena.kind(e)
            else {
                continue;
            };
            let (name, modifiers, ty) = (name.clone(), *modifiers, ty.clone());
            let wrapped = Ty::Named {
                name: "NEvent".to_string(),
                args: vec![ty],
            };
            let in_interface = cx
                .arena
                .ancestor_matching(e, |k| matches!(k, NodeKind::TypeDecl { .. }))
                .is_some_and(|td| {
                    matches!(
                        cx.arena.kind(td),
                        NodeKind::TypeDecl {
                            kind: TypeDeclKind::Interface,
                            ..
                        }
                    )
                });
            let init = if in_interface {
                None
            } else {
                Some(cx.arena.add_new(wrapped.clone(), vec![]))
            };
            let field = cx.arena.add_field(name, wrapped, init);
            if let NodeKind::Field { modifiers: m, .. } = cx.arena.kind_mut(field) {
                *m = modifiers;
            }
            cx.arena.replace(e, field);
        }

        let assigns = collect(cx.arena, cx.unit, |k| {
            matches!(
                k,
                NodeKind::Assign {
                    op: AssignOp::Add | AssignOp::Sub,
                    ..
                }
            )
        });
        for a in assigns {
            let NodeKind::Assign { op, target, value } = *cx.arena.kind(a) else {
                continue;
            };
            if !cx.annot.is_event_ref(target) {
                continue;
            }
            let method = if op == AssignOp::Add { "add" } else { "remove" };
            let placeholder = cx.arena.alloc(NodeKind::Empty);
            cx.arena.replace(a, placeholder);
            let callee = cx.arena.add_member(target, method);
            let call = cx.arena.add_call(callee, vec![value]);
            cx.arena.replace(placeholder, call);
        }

        let decls = collect(cx.arena, cx.unit, |k| {
            matches!(
                k,
                NodeKind::VarDecl {
                    initializer: Some(_),
                    ..
                }
            )
        });
        for d in decls {
            let NodeKind::VarDecl {
                initializer: Some(init),
                ..
            } = *cx.arena.kind(d)
            else {
                continue;
            };
            if !cx.annot.is_event_ref(init) {
                continue;
            }
            if let NodeKind::VarDecl { initializer, .. } = cx.arena.kind_mut(d) {
                *initializer = None;
            }
            let callee = cx.arena.add_member(init, "ToMulticastFunction");
            let call = cx.arena.add_call(callee, vec![]);
            if let NodeKind::VarDecl { initializer, .. } = cx.arena.kind_mut(d) {
                *initializer = Some(call);
            }
            cx.arena.set_parent(call, Some(d));
        }
        Ok(())
    }
}

/// Indexers become `get_Item`/`set_Item` method pairs.
pub struct IndexersToMethods;

impl Pass for IndexersToMethods {
    fn name(&self) -> &'static str {
        "IndexersToMethods"
    }

    fn run(&mut self, cx: &mut PassContext<'_>) -> Result<(), TransformError> {
        let indexers = collect(cx.arena, cx.unit, |k| matches!(k, NodeKind::Indexer { .. }));
        for ix in indexers {
            let NodeKind::Indexer {
                modifiers,
                ty,
                params,
                getter,
                setter,
            } = cx.arena.kind(ix)
            else {
                continue;
            };
            let (modifiers, ty) = (*modifiers, ty.clone());
            let params = params.clone();
            let (getter, setter) = (*getter, *setter);

            if let NodeKind::Indexer {
                getter, setter, ..
            } = cx.arena.kind_mut(ix)
            {
                *getter = None;
                *setter = None;
            }
            if let Some(b) = getter {
                cx.arena.set_parent(b, None);
                let ps: Vec<NodeId> =
                    params.iter().map(|&p| cx.arena.deep_clone(p)).collect();
                let m = cx.arena.add_method("get_Item", ty.clone(), ps, Some(b));
                if let NodeKind::Method { modifiers: mm, .. } = cx.arena.kind_mut(m) {
                    *mm = modifiers;
                }
                cx.arena.insert_before(ix, m);
            }
            if let Some(b) = setter {
                cx.arena.set_parent(b, None);
                let mut ps: Vec<NodeId> =
                    params.iter().map(|&p| cx.arena.deep_clone(p)).collect();
                ps.push(cx.arena.add_param("value", ty.clone()));
                let m = cx
                    .arena
                    .add_method("set_Item", Ty::Prim(Prim::Void), ps, Some(b));
                if let NodeKind::Method { modifiers: mm, .. } = cx.arena.kind_mut(m) {
                    *mm = modifiers;
                }
                cx.arena.insert_before(ix, m);
            }
            cx.arena.detach(ix);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tslower_ast::{Annotations, NodeArena};
    use tslower_common::Diagnostics;

    fn run_pass(
        pass: &mut dyn Pass,
        arena: &mut NodeArena,
        annot: &Annotations,
        unit: NodeId,
    ) -> Diagnostics {
        let mut diags = Diagnostics::new();
        pass.run(&mut PassContext {
            arena,
            annot,
            unit,
            diags: &mut diags,
        })
        .unwrap();
        diags
    }

    fn add_property(
        arena: &mut NodeArena,
        name: &str,
        ty: Ty,
        getter: Option<NodeId>,
        setter: Option<NodeId>,
    ) -> NodeId {
        let node = NodeKind::Property {
            name: name.to_string(),
            modifiers: Modifiers::empty(),
            attrs: vec![],
            ty,
            has_getter: true,
            getter,
            has_setter: true,
            setter,
        };
        let id = arena.alloc(node);
        for c in [getter, setter].into_iter().flatten() {
            arena.set_parent(c, Some(id));
        }
        id
    }

    #[test]
    fn auto_property_becomes_a_field() {
        let mut arena = NodeArena::new();
        let p = add_property(&mut arena, "Count", Ty::Prim(Prim::Int), None, None);
        let cls = arena.add_type_decl("C", TypeDeclKind::Class, vec![p]);
        let unit = arena.add_unit(vec![cls]);
        let annot = Annotations::new();

        run_pass(&mut PropertiesToMethods, &mut arena, &annot, unit);

        let members = arena.primary_list(cls).unwrap().clone();
        assert_eq!(members.len(), 1);
        assert!(matches!(
            arena.kind(members[0]),
            NodeKind::Field { name, .. } if name == "Count"
        ));
    }

    #[test]
    fn accessor_bodies_become_methods() {
        let mut arena = NodeArena::new();
        let zero = arena.add_int(0);
        let ret = arena.add_return(Some(zero));
        let get_body = arena.add_block(vec![ret]);
        let set_body = arena.add_block(vec![]);
        let p = add_property(
            &mut arena,
            "Count",
            Ty::Prim(Prim::Int),
            Some(get_body),
            Some(set_body),
        );
        let cls = arena.add_type_decl("C", TypeDeclKind::Class, vec![p]);
        let unit = arena.add_unit(vec![cls]);
        let annot = Annotations::new();

        run_pass(&mut PropertiesToMethods, &mut arena, &annot, unit);

        let members = arena.primary_list(cls).unwrap().clone();
        assert_eq!(members.len(), 2);
        assert!(matches!(
            arena.kind(members[0]),
            NodeKind::Method { name, body: Some(b), .. }
                if name == "get_Count" && *b == get_body
        ));
        let NodeKind::Method {
            name,
            params,
            return_ty,
            ..
        } = arena.kind(members[1])
        else {
            panic!("expected setter method");
        };
        assert_eq!(name, "set_Count");
        assert_eq!(params.len(), 1);
        assert_eq!(*return_ty, Ty::Prim(Prim::Void));
    }

    #[test]
    fn events_become_nevent_fields() {
        let mut arena = NodeArena::new();
        let handler_ty = Ty::named("Handler");
        let e = arena.alloc(NodeKind::Event {
            name: "Changed".to_string(),
            modifiers: Modifiers::empty(),
            ty: handler_ty.clone(),
        });
        let cls = arena.add_type_decl("C", TypeDeclKind::Class, vec![e]);
        let unit = arena.add_unit(vec![cls]);
        let annot = Annotations::new();

        run_pass(&mut FixEvents, &mut arena, &annot, unit);

        let members = arena.primary_list(cls).unwrap().clone();
        let NodeKind::Field {
            name,
            ty,
            initializer: Some(init),
            ..
        } = arena.kind(members[0])
        else {
            panic!("expected field with initializer");
        };
        assert_eq!(name, "Changed");
        assert_eq!(
            *ty,
            Ty::Named {
                name: "NEvent".into(),
                args: vec![handler_ty]
            }
        );
        assert!(matches!(arena.kind(*init), NodeKind::New { .. }));
    }

    #[test]
    fn event_subscription_becomes_an_add_call() {
        let mut arena = NodeArena::new();
        let this_ref = arena.add_this();
        let ev = arena.add_member(this_ref, "Changed");
        let handler = arena.add_ident("onChanged");
        let assign = arena.alloc(NodeKind::Assign {
            op: AssignOp::Add,
            target: ev,
            value: handler,
        });
        arena.set_parent(ev, Some(assign));
        arena.set_parent(handler, Some(assign));
        let stmt = arena.add_expr_stmt(assign);
        let body = arena.add_block(vec![stmt]);
        let m = arena.add_method("Hook", Ty::Prim(Prim::Void), vec![], Some(body));
        let cls = arena.add_type_decl("C", TypeDeclKind::Class, vec![m]);
        let unit = arena.add_unit(vec![cls]);
        let mut annot = Annotations::new();
        annot.mark_event_ref(ev);

        run_pass(&mut FixEvents, &mut arena, &annot, unit);

        let NodeKind::ExprStmt { expr } = arena.kind(stmt) else {
            panic!("expected statement");
        };
        let NodeKind::Call { callee, args } = arena.kind(*expr) else {
            panic!("expected add call");
        };
        assert!(matches!(
            arena.kind(*callee),
            NodeKind::Member { target, name } if *target == ev && name == "add"
        ));
        assert_eq!(args, &vec![handler]);
    }

    #[test]
    fn reading_an_event_goes_through_to_multicast_function() {
        let mut arena = NodeArena::new();
        let this_ref = arena.add_this();
        let ev = arena.add_member(this_ref, "Changed");
        let decl = arena.add_var_decl("f", Ty::Infer, Some(ev));
        let body = arena.add_block(vec![decl]);
        let m = arena.add_method("Snapshot", Ty::Prim(Prim::Void), vec![], Some(body));
        let cls = arena.add_type_decl("C", TypeDeclKind::Class, vec![m]);
        let unit = arena.add_unit(vec![cls]);
        let mut annot = Annotations::new();
        annot.mark_event_ref(ev);

        run_pass(&mut FixEvents, &mut arena, &annot, unit);

        let NodeKind::VarDecl {
            initializer: Some(init),
            ..
        } = arena.kind(decl)
        else {
            panic!("expected initializer");
        };
        let NodeKind::Call { callee, args } = arena.kind(*init) else {
            panic!("expected wrapper call");
        };
        assert!(args.is_empty());
        assert!(matches!(
            arena.kind(*callee),
            NodeKind::Member { target, name }
                if *target == ev && name == "ToMulticastFunction"
        ));
    }

    #[test]
    fn indexer_becomes_item_methods() {
        let mut arena = NodeArena::new();
        let key = arena.add_param("key", Ty::Prim(Prim::Int));
        let get_body = arena.add_block(vec![]);
        let set_body = arena.add_block(vec![]);
        let ix = arena.alloc(NodeKind::Indexer {
            modifiers: Modifiers::empty(),
            ty: Ty::Prim(Prim::String),
            params: vec![key],
            getter: Some(get_body),
            setter: Some(set_body),
        });
        for c in [key, get_body, set_body] {
            arena.set_parent(c, Some(ix));
        }
        let cls = arena.add_type_decl("C", TypeDeclKind::Class, vec![ix]);
        let unit = arena.add_unit(vec![cls]);
        let annot = Annotations::new();

        run_pass(&mut IndexersToMethods, &mut arena, &annot, unit);

        let members = arena.primary_list(cls).unwrap().clone();
        assert_eq!(members.len(), 2);
        let NodeKind::Method { name, params, .. } = arena.kind(members[0]) else {
            panic!("expected getter method");
        };
        assert_eq!(name, "get_Item");
        assert_eq!(params.len(), 1);
        let NodeKind::Method {
            name,
            params,
            return_ty,
            ..
        } = arena.kind(members[1])
        else {
            panic!("expected setter method");
        };
        assert_eq!(name, "set_Item");
        assert_eq!(params.len(), 2);
        assert_eq!(*return_ty, Ty::Prim(Prim::Void));
    }
}
