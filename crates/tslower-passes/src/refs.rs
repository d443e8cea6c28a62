//! By-reference parameter lowering.
//!
//! The target passes everything by value, so a `ref`/`out` parameter
//! becomes a one-element array cell: the declaration's type turns into an
//! array, every use inside the body becomes `name[0]`, and each call site
//! wraps the call in an immediately invoked lambda that boxes the argument,
//! runs the call, writes the cell back to the original place, and returns
//! the call's value.

use rustc_hash::FxHashMap;
use tslower_ast::{NodeId, NodeKind, ParamMode, Ty};
use tslower_common::TransformError;

use crate::pipeline::{Pass, PassContext};
use crate::util::{collect, substitute};

pub struct WrapRefArgs;

impl Pass for WrapRefArgs {
    fn name(&self) -> &'static str {
        "WrapRefArgs"
    }

    fn run(&mut self, cx: &mut PassContext<'_>) -> Result<(), TransformError> {
        let callables = collect(cx.arena, cx.unit, |k| {
            matches!(
                k,
                NodeKind::Method { .. } | NodeKind::Constructor { .. } | NodeKind::Lambda { .. }
            )
        });
        for c in callables {
            rewrite_declaration(cx, c);
        }

        // Deepest call sites first so nested ref calls nest their wrappers
        // correctly.
        let calls: Vec<NodeId> = collect(cx.arena, cx.unit, |k| {
            matches!(k, NodeKind::Call { .. })
        })
        .into_iter()
        .rev()
        .collect();
        for call in calls {
            if is_attached(cx, call) {
                wrap_call_site(cx, call);
            }
        }
        Ok(())
    }
}

fn rewrite_declaration(cx: &mut PassContext<'_>, decl: NodeId) {
    let (params, body) = match cx.arena.kind(decl) {
        NodeKind::Method { params, body, .. } => (params.clone(), *body),
        NodeKind::Constructor { params, body, .. } => (params.clone(), *body),
        NodeKind::Lambda { params, body } => (params.clone(), Some(*body)),
        _ => return,
    };
    let mut cell_names: Vec<String> = Vec::new();
    for p in params {
        if let NodeKind::Param {
            name, ty, mode, ..
        } = cx.arena.kind_mut(p)
        {
            if *mode == ParamMode::Value {
                continue;
            }
            *mode = ParamMode::Value;
            let elem = std::mem::replace(ty, Ty::Infer);
            *ty = Ty::Array(Box::new(elem));
            cell_names.push(name.clone());
        }
    }
    let Some(body) = body else { return };
    if cell_names.is_empty() {
        return;
    }
    let mut subs: FxHashMap<String, NodeId> = FxHashMap::default();
    for name in cell_names {
        let ident = cx.arena.add_ident(name.clone());
        let zero = cx.arena.add_int(0);
        let template = cx.arena.add_index(ident, vec![zero]);
        subs.insert(name, template);
    }
    substitute(cx.arena, body, &subs);
}

fn is_attached(cx: &PassContext<'_>, mut id: NodeId) -> bool {
    loop {
        if id == cx.unit {
            return true;
        }
        match cx.arena.parent(id) {
            Some(p) => id = p,
            None => return false,
        }
    }
}

fn wrap_call_site(cx: &mut PassContext<'_>, call: NodeId) {
    let args = match cx.arena.kind(call) {
        NodeKind::Call { args, .. } => args.clone(),
        _ => return,
    };
    let ref_args: Vec<(usize, NodeId, NodeId)> = args
        .iter()
        .enumerate()
        .filter_map(|(i, &a)| match cx.arena.kind(a) {
            NodeKind::RefArg { expr } => Some((i, a, *expr)),
            _ => None,
        })
        .collect();
    if ref_args.is_empty() {
        return;
    }

    let mut stmts: Vec<NodeId> = Vec::new();
    let mut writebacks: Vec<NodeId> = Vec::new();
    for &(i, ref_arg, expr) in &ref_args {
        let cell = format!("_p{i}");

        // Writeback target is the original place expression.
        let place = cx.arena.deep_clone(expr);

        cx.arena.set_parent(expr, None);
        let boxed = cx.arena.add_array_init(vec![expr]);
        let decl = cx.arena.add_var_decl(cell.clone(), Ty::Infer, Some(boxed));
        stmts.push(decl);

        let cell_ref = cx.arena.add_ident(cell.clone());
        cx.arena.replace(ref_arg, cell_ref);

        let cell_ref = cx.arena.add_ident(cell);
        let zero = cx.arena.add_int(0);
        let unboxed = cx.arena.add_index(cell_ref, vec![zero]);
        let assign = cx.arena.add_assign(place, unboxed);
        writebacks.push(cx.arena.add_expr_stmt(assign));
    }

    let placeholder = cx.arena.alloc(NodeKind::Empty);
    cx.arena.replace(call, placeholder);
    let result = cx.arena.add_var_decl("_r", Ty::Infer, Some(call));
    stmts.push(result);
    stmts.append(&mut writebacks);
    let result_ref = cx.arena.add_ident("_r");
    stmts.push(cx.arena.add_return(Some(result_ref)));

    let block = cx.arena.add_block(stmts);
    let lambda = cx.arena.add_lambda(vec![], block);
    let iife = cx.arena.add_call(lambda, vec![]);
    cx.arena.replace(placeholder, iife);
}

#[cfg(test)]
mod tests {
    use super::*;
    use tslower_ast::{Annotations, NodeArena, Prim};
    use tslower_common::Diagnostics;

    fn run(arena: &mut NodeArena, unit: NodeId) {
        let annot = Annotations::new();
        let mut diags = Diagnostics::new();
        WrapRefArgs
            .run(&mut PassContext {
                arena,
                annot: &annot,
                unit,
                diags: &mut diags,
            })
            .unwrap();
    }

    #[test]
    fn ref_param_becomes_an_array_cell() {
        let mut arena = NodeArena::new();
        let p = arena.add_param("n", Ty::Prim(Prim::Int));
        if let NodeKind::Param { mode, .. } = arena.kind_mut(p) {
            *mode = ParamMode::Ref;
        }
        // n = n + 1;
        let lhs = arena.add_ident("n");
        let rhs = {
            let n = arena.add_ident("n");
            let one = arena.add_int(1);
            arena.add_binary(tslower_ast::BinaryOp::Add, n, one)
        };
        let assign = arena.add_assign(lhs, rhs);
        let stmt = arena.add_expr_stmt(assign);
        let body = arena.add_block(vec![stmt]);
        let m = arena.add_method("Bump", Ty::Prim(Prim::Void), vec![p], Some(body));
        let cls = arena.add_type_decl("C", tslower_ast::TypeDeclKind::Class, vec![m]);
        let unit = arena.add_unit(vec![cls]);

        run(&mut arena, unit);

        let NodeKind::Param { ty, mode, .. } = arena.kind(p) else {
            panic!("expected param");
        };
        assert_eq!(*mode, ParamMode::Value);
        assert_eq!(*ty, Ty::Array(Box::new(Ty::Prim(Prim::Int))));

        // Both uses of `n` in the body are now `n[0]`.
        let NodeKind::Assign { target, .. } = arena.kind(assign) else {
            panic!("expected assignment");
        };
        let NodeKind::Index { target: t, args } = arena.kind(*target) else {
            panic!("expected indexed use, got {:?}", arena.kind(*target));
        };
        assert_eq!(*arena.kind(*t), NodeKind::Ident("n".into()));
        assert_eq!(*arena.kind(args[0]), NodeKind::Int(0));
    }

    #[test]
    fn ref_call_site_becomes_an_iife() {
        let mut arena = NodeArena::new();
        // Bump(ref x)
        let x = arena.add_ident("x");
        let ref_arg = arena.alloc(NodeKind::RefArg { expr: x });
        arena.set_parent(x, Some(ref_arg));
        let callee = arena.add_ident("Bump");
        let call = arena.add_call(callee, vec![ref_arg]);
        let stmt = arena.add_expr_stmt(call);
        let body = arena.add_block(vec![stmt]);
        let m = arena.add_method("Demo", Ty::Prim(Prim::Void), vec![], Some(body));
        let cls = arena.add_type_decl("C", tslower_ast::TypeDeclKind::Class, vec![m]);
        let unit = arena.add_unit(vec![cls]);

        run(&mut arena, unit);

        // stmt's expression is now a call of a zero-parameter lambda.
        let NodeKind::ExprStmt { expr } = arena.kind(stmt) else {
            panic!("expected statement");
        };
        let NodeKind::Call { callee, args } = arena.kind(*expr) else {
            panic!("expected invocation");
        };
        assert!(args.is_empty());
        let NodeKind::Lambda { params, body } = arena.kind(*callee) else {
            panic!("expected lambda, got {:?}", arena.kind(*callee));
        };
        assert!(params.is_empty());

        let stmts = arena.primary_list(*body).unwrap().clone();
        // var _p0 = [x]; var _r = Bump(_p0); x = _p0[0]; return _r;
        assert_eq!(stmts.len(), 4);
        assert!(matches!(
            arena.kind(stmts[0]),
            NodeKind::VarDecl { name, .. } if name == "_p0"
        ));
        let NodeKind::VarDecl {
            name,
            initializer: Some(inner),
            ..
        } = arena.kind(stmts[1])
        else {
            panic!("expected result binding");
        };
        assert_eq!(name, "_r");
        assert_eq!(*inner, call);
        let NodeKind::Call { args, .. } = arena.kind(call) else {
            panic!("expected original call");
        };
        assert_eq!(*arena.kind(args[0]), NodeKind::Ident("_p0".into()));
        assert!(matches!(arena.kind(stmts[2]), NodeKind::ExprStmt { .. }));
        assert!(matches!(arena.kind(stmts[3]), NodeKind::Return { value: Some(_) }));
    }
}
