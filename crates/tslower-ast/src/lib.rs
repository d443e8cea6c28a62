//! Arena-backed syntax tree for the tslower lowering engine.
//!
//! The tree is the shared mutable state every pass rewrites in place. Nodes
//! live in a [`NodeArena`] and are addressed by stable [`NodeId`] handles;
//! each node stores its parent handle, so detach/reattach/clone are
//! handle-table operations rather than deep pointer surgery.
//!
//! Node kinds form a closed tagged sum ([`NodeKind`]) over statements,
//! expressions, and declarations; traversal is exhaustive pattern matching,
//! not virtual dispatch. Semantic metadata produced by the external resolver
//! (nominal type shapes, delegating-constructor targets, event references)
//! lives in an explicit side-table ([`Annotations`]) keyed by handle, never
//! on the node itself.

pub mod annot;
pub mod arena;
pub mod factory;
pub mod node;
pub mod ty;

pub use annot::{Annotations, TypeShape};
pub use arena::{Node, NodeArena, NodeId};
pub use node::{AssignOp, BinaryOp, CtorTarget, Modifiers, NodeKind, ParamMode, TypeDeclKind, UnaryOp};
pub use ty::{merge_types, types_equal, Prim, Ty};
