//! Annotation side-table.
//!
//! Resolved semantic metadata attached by the external resolver before the
//! pipeline runs. Keyed by node handle (or nominal type name), never stored
//! as ad hoc state on the nodes: passes look metadata up here and the tree
//! stays purely syntactic.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::arena::NodeId;
use crate::ty::Ty;

/// The resolved nominal shape of a named type.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TypeShape {
    Class,
    Struct,
    Interface,
    Enum,
    Delegate,
}

#[derive(Debug, Default)]
pub struct Annotations {
    /// Nominal shape by type name.
    type_shapes: FxHashMap<String, TypeShape>,
    /// Delegating-constructor initializer -> target constructor declaration.
    ctor_targets: FxHashMap<NodeId, NodeId>,
    /// Expression nodes the resolver bound to an event definition.
    event_refs: FxHashSet<NodeId>,
    /// Resolved static type of an expression node.
    resolved_tys: FxHashMap<NodeId, Ty>,
}

impl Annotations {
    pub fn new() -> Annotations {
        Annotations::default()
    }

    pub fn set_type_shape(&mut self, name: impl Into<String>, shape: TypeShape) {
        self.type_shapes.insert(name.into(), shape);
    }

    pub fn type_shape(&self, name: &str) -> Option<TypeShape> {
        self.type_shapes.get(name).copied()
    }

    /// Whether a type resolves to an interface (no runtime constructor to
    /// check against).
    pub fn is_interface(&self, ty: &Ty) -> bool {
        ty.name()
            .is_some_and(|n| self.type_shape(n) == Some(TypeShape::Interface))
    }

    /// Whether a type resolves to a delegate, or is a structural function
    /// type; neither has a runtime constructor.
    pub fn is_delegate(&self, ty: &Ty) -> bool {
        matches!(ty, Ty::Fn { .. })
            || ty
                .name()
                .is_some_and(|n| self.type_shape(n) == Some(TypeShape::Delegate))
    }

    pub fn is_enum(&self, ty: &Ty) -> bool {
        ty.name()
            .is_some_and(|n| self.type_shape(n) == Some(TypeShape::Enum))
    }

    pub fn set_ctor_target(&mut self, initializer: NodeId, target: NodeId) {
        self.ctor_targets.insert(initializer, target);
    }

    pub fn ctor_target(&self, initializer: NodeId) -> Option<NodeId> {
        self.ctor_targets.get(&initializer).copied()
    }

    pub fn mark_event_ref(&mut self, expr: NodeId) {
        self.event_refs.insert(expr);
    }

    pub fn is_event_ref(&self, expr: NodeId) -> bool {
        self.event_refs.contains(&expr)
    }

    pub fn set_resolved_ty(&mut self, expr: NodeId, ty: Ty) {
        self.resolved_tys.insert(expr, ty);
    }

    pub fn resolved_ty(&self, expr: NodeId) -> Option<&Ty> {
        self.resolved_tys.get(&expr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ty::Prim;

    #[test]
    fn shape_queries() {
        let mut annot = Annotations::new();
        annot.set_type_shape("IComparable", TypeShape::Interface);
        annot.set_type_shape("Direction", TypeShape::Enum);
        annot.set_type_shape("Handler", TypeShape::Delegate);

        assert!(annot.is_interface(&Ty::named("IComparable")));
        assert!(annot.is_enum(&Ty::named("Direction")));
        assert!(annot.is_delegate(&Ty::named("Handler")));
        assert!(annot.is_delegate(&Ty::Fn {
            params: vec![Ty::Prim(Prim::Int)],
            ret: Box::new(Ty::Prim(Prim::Void)),
        }));
        assert!(!annot.is_interface(&Ty::named("Vector")));
    }
}
