//! Declaration-shape passes: nested-class lifting and the mechanical
//! strippers that remove source-language decoration the target has no
//! equivalent for.

use tslower_ast::{Modifiers, NodeId, NodeKind, Ty, TypeDeclKind};
use tslower_common::diagnostics::diagnostic_codes;
use tslower_common::{Diagnostic, TransformError};

use crate::pipeline::{Pass, PassContext};

/// Nested type declarations become siblings of their enclosing type, renamed
/// `Outer_Inner`; dotted references to them flatten the same way. Members of
/// the enclosing type lose `private` so the lifted class can still reach
/// them.
pub struct LiftNestedClasses;

impl Pass for LiftNestedClasses {
    fn name(&self) -> &'static str {
        "LiftNestedClasses"
    }

    fn run(&mut self, cx: &mut PassContext<'_>) -> Result<(), TransformError> {
        // Deeply nested types surface one level per round.
        loop {
            let mut lifted_any = false;
            let types: Vec<NodeId> = cx
                .arena
                .descendants(cx.unit)
                .into_iter()
                .filter(|&n| matches!(cx.arena.kind(n), NodeKind::TypeDecl { .. }))
                .collect();
            for outer in types {
                if !cx.arena.is_attached_under(outer, cx.unit) {
                    continue;
                }
                let (outer_name, outer_params) = match cx.arena.kind(outer) {
                    NodeKind::TypeDecl {
                        name, type_params, ..
                    } => (name.clone(), type_params.clone()),
                    _ => continue,
                };
                let nested: Vec<NodeId> = cx
                    .arena
                    .children(outer)
                    .into_iter()
                    .filter(|&c| matches!(cx.arena.kind(c), NodeKind::TypeDecl { .. }))
                    .collect();
                if nested.is_empty() {
                    continue;
                }
                lifted_any = true;

                for n in nested {
                    cx.arena.detach(n);
                    if let NodeKind::TypeDecl {
                        name, type_params, ..
                    } = cx.arena.kind_mut(n)
                    {
                        if !outer_params.is_empty() && !type_params.is_empty() {
                            cx.diags.push(Diagnostic::warning(
                                diagnostic_codes::GENERIC_NESTED_CLASS,
                                format!(
                                    "nested class `{name}` and its enclosing class `{outer_name}` are both generic; this is not supported"
                                ),
                            ));
                            type_params.extend(outer_params.iter().cloned());
                        }
                        *name = format!("{outer_name}_{name}");
                    }
                    cx.arena.insert_after(outer, n);
                }

                let members = cx.arena.children(outer);
                for m in members {
                    strip_private(cx.arena.kind_mut(m));
                }
            }
            if !lifted_any {
                break;
            }
        }

        // Flatten dotted references everywhere.
        let mut nodes = cx.arena.descendants(cx.unit);
        nodes.push(cx.unit);
        for n in nodes {
            cx.arena.kind_mut(n).for_each_ty_mut(&mut flatten_dotted);
        }
        Ok(())
    }
}

fn strip_private(kind: &mut NodeKind) {
    match kind {
        NodeKind::TypeDecl { modifiers, .. }
        | NodeKind::Method { modifiers, .. }
        | NodeKind::Constructor { modifiers, .. }
        | NodeKind::Field { modifiers, .. }
        | NodeKind::Property { modifiers, .. }
        | NodeKind::Indexer { modifiers, .. }
        | NodeKind::Event { modifiers, .. } => modifiers.remove(Modifiers::PRIVATE),
        _ => {}
    }
}

fn flatten_dotted(ty: &mut Ty) {
    match ty {
        Ty::Named { name, args } => {
            if name.contains('.') {
                *name = name.replace('.', "_");
            }
            for a in args {
                flatten_dotted(a);
            }
        }
        Ty::Array(inner) | Ty::Nullable(inner) => flatten_dotted(inner),
        Ty::Fn { params, ret } => {
            for p in params {
                flatten_dotted(p);
            }
            flatten_dotted(ret);
        }
        Ty::Prim(_) | Ty::Infer => {}
    }
}

/// Generic constraint clauses have no target equivalent.
pub struct RemoveConstraints;

impl Pass for RemoveConstraints {
    fn name(&self) -> &'static str {
        "RemoveConstraints"
    }

    fn run(&mut self, cx: &mut PassContext<'_>) -> Result<(), TransformError> {
        for n in cx.arena.descendants(cx.unit) {
            match cx.arena.kind_mut(n) {
                NodeKind::TypeDecl { constraints, .. }
                | NodeKind::Method { constraints, .. } => constraints.clear(),
                _ => {}
            }
        }
        Ok(())
    }
}

/// The target has no value types; structs travel as classes.
pub struct StructToClass;

impl Pass for StructToClass {
    fn name(&self) -> &'static str {
        "StructToClass"
    }

    fn run(&mut self, cx: &mut PassContext<'_>) -> Result<(), TransformError> {
        for n in cx.arena.descendants(cx.unit) {
            if let NodeKind::TypeDecl { kind, .. } = cx.arena.kind_mut(n) {
                if *kind == TypeDeclKind::Struct {
                    *kind = TypeDeclKind::Class;
                }
            }
        }
        Ok(())
    }
}

/// Enum base types only pick the storage width; the target does not care.
pub struct RemoveEnumBaseType;

impl Pass for RemoveEnumBaseType {
    fn name(&self) -> &'static str {
        "RemoveEnumBaseType"
    }

    fn run(&mut self, cx: &mut PassContext<'_>) -> Result<(), TransformError> {
        for n in cx.arena.descendants(cx.unit) {
            if let NodeKind::TypeDecl {
                kind: TypeDeclKind::Enum,
                base_types,
                ..
            } = cx.arena.kind_mut(n)
            {
                base_types.clear();
            }
        }
        Ok(())
    }
}

/// Attribute sections are metadata-only by the time the tree gets here.
pub struct RemoveAttributes;

impl Pass for RemoveAttributes {
    fn name(&self) -> &'static str {
        "RemoveAttributes"
    }

    fn run(&mut self, cx: &mut PassContext<'_>) -> Result<(), TransformError> {
        for n in cx.arena.descendants(cx.unit) {
            match cx.arena.kind_mut(n) {
                NodeKind::TypeDecl { attrs, .. }
                | NodeKind::Method { attrs, .. }
                | NodeKind::Constructor { attrs, .. }
                | NodeKind::Field { attrs, .. }
                | NodeKind::Property { attrs, .. } => attrs.clear(),
                _ => {}
            }
        }
        Ok(())
    }
}

/// Strip access, virtual and the other source-only modifiers. `const` data
/// still needs a home, so it folds into `static`. Implementation
/// constructors keep the name `constructor` the merger gave them.
pub struct RemoveModifiers;

fn strip_modifiers(m: &mut Modifiers) {
    let had_const = m.contains(Modifiers::CONST);
    *m = *m & (Modifiers::STATIC | Modifiers::ASYNC);
    if had_const {
        m.insert(Modifiers::STATIC);
    }
}

impl Pass for RemoveModifiers {
    fn name(&self) -> &'static str {
        "RemoveModifiers"
    }

    fn run(&mut self, cx: &mut PassContext<'_>) -> Result<(), TransformError> {
        for n in cx.arena.descendants(cx.unit) {
            match cx.arena.kind_mut(n) {
                NodeKind::TypeDecl { modifiers, .. }
                | NodeKind::Method { modifiers, .. }
                | NodeKind::Field { modifiers, .. }
                | NodeKind::Property { modifiers, .. }
                | NodeKind::Event { modifiers, .. } => strip_modifiers(modifiers),
                NodeKind::Constructor {
                    modifiers, name, ..
                } => {
                    strip_modifiers(modifiers);
                    *name = "constructor".to_string();
                }
                _ => {}
            }
        }
        Ok(())
    }
}
