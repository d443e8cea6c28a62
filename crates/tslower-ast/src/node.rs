//! The closed set of node kinds and their child-slot traversal.
//!
//! Every variant owns its children as `NodeId` handles into the arena. The
//! two `for_each_child*` walkers enumerate those handles in source order and
//! are the single place that knows the slot layout of each variant; the
//! arena's structural operations (replace, clone, descendants) are built on
//! them.

use crate::ty::Ty;

use crate::arena::NodeId;

bitflags::bitflags! {
    #[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
    pub struct Modifiers: u32 {
        const PUBLIC    = 1 << 0;
        const PRIVATE   = 1 << 1;
        const PROTECTED = 1 << 2;
        const INTERNAL  = 1 << 3;
        const STATIC    = 1 << 4;
        const ABSTRACT  = 1 << 5;
        const VIRTUAL   = 1 << 6;
        const OVERRIDE  = 1 << 7;
        const SEALED    = 1 << 8;
        const READONLY  = 1 << 9;
        const CONST     = 1 << 10;
        const ASYNC     = 1 << 11;
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TypeDeclKind {
    Class,
    Struct,
    Interface,
    Enum,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ParamMode {
    Value,
    Ref,
    Out,
}

/// Which constructor a `: base(...)` / `: this(...)` initializer names.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CtorTarget {
    Base,
    This,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Neg,
    BitNot,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AssignOp {
    Assign,
    Add,
    Sub,
}

#[derive(Clone, Debug, PartialEq)]
pub enum NodeKind {
    // =========================================================================
    // Declarations
    // =========================================================================
    /// Root of a resolved tree: the flat list of top-level declarations.
    Unit { items: Vec<NodeId> },

    TypeDecl {
        name: String,
        kind: TypeDeclKind,
        modifiers: Modifiers,
        attrs: Vec<String>,
        type_params: Vec<String>,
        constraints: Vec<(String, Ty)>,
        base_types: Vec<Ty>,
        members: Vec<NodeId>,
    },

    Method {
        name: String,
        modifiers: Modifiers,
        attrs: Vec<String>,
        return_ty: Ty,
        type_params: Vec<String>,
        constraints: Vec<(String, Ty)>,
        params: Vec<NodeId>,
        /// `None` for signature-only declarations (interfaces, overload
        /// prototypes).
        body: Option<NodeId>,
    },

    Constructor {
        /// "constructor" until overload merging renames implementations.
        name: String,
        modifiers: Modifiers,
        attrs: Vec<String>,
        params: Vec<NodeId>,
        initializer: Option<NodeId>,
        body: Option<NodeId>,
    },

    /// `: base(...)` or `: this(...)` on a constructor.
    CtorInitializer { target: CtorTarget, args: Vec<NodeId> },

    Field {
        name: String,
        modifiers: Modifiers,
        attrs: Vec<String>,
        ty: Ty,
        initializer: Option<NodeId>,
    },

    Property {
        name: String,
        modifiers: Modifiers,
        attrs: Vec<String>,
        ty: Ty,
        /// Accessor presence is independent of accessor bodies: an
        /// auto-property has accessors with no bodies.
        has_getter: bool,
        getter: Option<NodeId>,
        has_setter: bool,
        setter: Option<NodeId>,
    },

    Indexer {
        modifiers: Modifiers,
        ty: Ty,
        params: Vec<NodeId>,
        getter: Option<NodeId>,
        setter: Option<NodeId>,
    },

    Event {
        name: String,
        modifiers: Modifiers,
        ty: Ty,
    },

    Param {
        name: String,
        ty: Ty,
        mode: ParamMode,
        default: Option<NodeId>,
        optional: bool,
    },

    // =========================================================================
    // Statements
    // =========================================================================
    Block { stmts: Vec<NodeId> },

    If {
        cond: NodeId,
        then_branch: NodeId,
        else_branch: Option<NodeId>,
    },

    While { cond: NodeId, body: NodeId },

    DoWhile { body: NodeId, cond: NodeId },

    For {
        init: Vec<NodeId>,
        cond: Option<NodeId>,
        update: Vec<NodeId>,
        body: NodeId,
    },

    Switch { scrutinee: NodeId, sections: Vec<NodeId> },

    /// One `case .../default:` section; `None` in `labels` is `default`.
    SwitchSection {
        labels: Vec<Option<NodeId>>,
        stmts: Vec<NodeId>,
    },

    Label { name: String },

    Goto { label: String },

    /// `target` is the synthetic statement-label annotation attached by the
    /// loop-labeling step; plain breaks carry `None`.
    Break { target: Option<String> },

    Continue { target: Option<String> },

    Return { value: Option<NodeId> },

    Throw { value: Option<NodeId> },

    Try {
        body: NodeId,
        catches: Vec<NodeId>,
        finally: Option<NodeId>,
    },

    CatchClause {
        param: Option<String>,
        ty: Option<Ty>,
        body: NodeId,
    },

    VarDecl {
        name: String,
        ty: Ty,
        initializer: Option<NodeId>,
    },

    ExprStmt { expr: NodeId },

    Empty,

    // =========================================================================
    // Expressions
    // =========================================================================
    Ident(String),
    Int(i64),
    Str(String),
    Bool(bool),
    Char(char),
    Null,
    This,
    Base,

    Binary { op: BinaryOp, lhs: NodeId, rhs: NodeId },
    Unary { op: UnaryOp, operand: NodeId },
    Assign { op: AssignOp, target: NodeId, value: NodeId },
    Call { callee: NodeId, args: Vec<NodeId> },
    New { ty: Ty, args: Vec<NodeId> },
    Member { target: NodeId, name: String },
    Index { target: NodeId, args: Vec<NodeId> },
    /// Runtime instance-of check against a type's constructor.
    Is { expr: NodeId, ty: Ty },
    Cond {
        cond: NodeId,
        when_true: NodeId,
        when_false: NodeId,
    },
    Lambda { params: Vec<NodeId>, body: NodeId },
    ArrayInit { elems: Vec<NodeId> },
    /// A `ref`/`out` argument at a call site, before by-reference lowering.
    RefArg { expr: NodeId },
}

macro_rules! visit_children {
    ($kind:expr, $f:expr, $deref:tt) => {
        match $kind {
            NodeKind::Unit { items } => {
                for c in items {
                    $f(visit_children!(@id c, $deref));
                }
            }
            NodeKind::TypeDecl { members, .. } => {
                for c in members {
                    $f(visit_children!(@id c, $deref));
                }
            }
            NodeKind::Method { params, body, .. } => {
                for c in params {
                    $f(visit_children!(@id c, $deref));
                }
                for c in body {
                    $f(visit_children!(@id c, $deref));
                }
            }
            NodeKind::Constructor {
                params,
                initializer,
                body,
                ..
            } => {
                for c in params {
                    $f(visit_children!(@id c, $deref));
                }
                for c in initializer {
                    $f(visit_children!(@id c, $deref));
                }
                for c in body {
                    $f(visit_children!(@id c, $deref));
                }
            }
            NodeKind::CtorInitializer { args, .. } => {
                for c in args {
                    $f(visit_children!(@id c, $deref));
                }
            }
            NodeKind::Field { initializer, .. } => {
                for c in initializer {
                    $f(visit_children!(@id c, $deref));
                }
            }
            NodeKind::Property { getter, setter, .. } => {
                for c in getter {
                    $f(visit_children!(@id c, $deref));
                }
                for c in setter {
                    $f(visit_children!(@id c, $deref));
                }
            }
            NodeKind::Indexer {
                params,
                getter,
                setter,
                ..
            } => {
                for c in params {
                    $f(visit_children!(@id c, $deref));
                }
                for c in getter {
                    $f(visit_children!(@id c, $deref));
                }
                for c in setter {
                    $f(visit_children!(@id c, $deref));
                }
            }
            NodeKind::Event { .. } => {}
            NodeKind::Param { default, .. } => {
                for c in default {
                    $f(visit_children!(@id c, $deref));
                }
            }
            NodeKind::Block { stmts } => {
                for c in stmts {
                    $f(visit_children!(@id c, $deref));
                }
            }
            NodeKind::If {
                cond,
                then_branch,
                else_branch,
            } => {
                $f(visit_children!(@id cond, $deref));
                $f(visit_children!(@id then_branch, $deref));
                for c in else_branch {
                    $f(visit_children!(@id c, $deref));
                }
            }
            NodeKind::While { cond, body } => {
                $f(visit_children!(@id cond, $deref));
                $f(visit_children!(@id body, $deref));
            }
            NodeKind::DoWhile { body, cond } => {
                $f(visit_children!(@id body, $deref));
                $f(visit_children!(@id cond, $deref));
            }
            NodeKind::For {
                init,
                cond,
                update,
                body,
            } => {
                for c in init {
                    $f(visit_children!(@id c, $deref));
                }
                for c in cond {
                    $f(visit_children!(@id c, $deref));
                }
                for c in update {
                    $f(visit_children!(@id c, $deref));
                }
                $f(visit_children!(@id body, $deref));
            }
            NodeKind::Switch { scrutinee, sections } => {
                $f(visit_children!(@id scrutinee, $deref));
                for c in sections {
                    $f(visit_children!(@id c, $deref));
                }
            }
            NodeKind::SwitchSection { labels, stmts } => {
                for l in labels {
                    for c in l {
                        $f(visit_children!(@id c, $deref));
                    }
                }
                for c in stmts {
                    $f(visit_children!(@id c, $deref));
                }
            }
            NodeKind::Label { .. }
            | NodeKind::Goto { .. }
            | NodeKind::Break { .. }
            | NodeKind::Continue { .. }
            | NodeKind::Empty => {}
            NodeKind::Return { value } | NodeKind::Throw { value } => {
                for c in value {
                    $f(visit_children!(@id c, $deref));
                }
            }
            NodeKind::Try {
                body,
                catches,
                finally,
            } => {
                $f(visit_children!(@id body, $deref));
                for c in catches {
                    $f(visit_children!(@id c, $deref));
                }
                for c in finally {
                    $f(visit_children!(@id c, $deref));
                }
            }
            NodeKind::CatchClause { body, .. } => {
                $f(visit_children!(@id body, $deref));
            }
            NodeKind::VarDecl { initializer, .. } => {
                for c in initializer {
                    $f(visit_children!(@id c, $deref));
                }
            }
            NodeKind::ExprStmt { expr } => {
                $f(visit_children!(@id expr, $deref));
            }
            NodeKind::Ident(_)
            | NodeKind::Int(_)
            | NodeKind::Str(_)
            | NodeKind::Bool(_)
            | NodeKind::Char(_)
            | NodeKind::Null
            | NodeKind::This
            | NodeKind::Base => {}
            NodeKind::Binary { lhs, rhs, .. } => {
                $f(visit_children!(@id lhs, $deref));
                $f(visit_children!(@id rhs, $deref));
            }
            NodeKind::Unary { operand, .. } => {
                $f(visit_children!(@id operand, $deref));
            }
            NodeKind::Assign { target, value, .. } => {
                $f(visit_children!(@id target, $deref));
                $f(visit_children!(@id value, $deref));
            }
            NodeKind::Call { callee, args } => {
                $f(visit_children!(@id callee, $deref));
                for c in args {
                    $f(visit_children!(@id c, $deref));
                }
            }
            NodeKind::New { args, .. } => {
                for c in args {
                    $f(visit_children!(@id c, $deref));
                }
            }
            NodeKind::Member { target, .. } => {
                $f(visit_children!(@id target, $deref));
            }
            NodeKind::Index { target, args } => {
                $f(visit_children!(@id target, $deref));
                for c in args {
                    $f(visit_children!(@id c, $deref));
                }
            }
            NodeKind::Is { expr, .. } => {
                $f(visit_children!(@id expr, $deref));
            }
            NodeKind::Cond {
                cond,
                when_true,
                when_false,
            } => {
                $f(visit_children!(@id cond, $deref));
                $f(visit_children!(@id when_true, $deref));
                $f(visit_children!(@id when_false, $deref));
            }
            NodeKind::Lambda { params, body } => {
                for c in params {
                    $f(visit_children!(@id c, $deref));
                }
                $f(visit_children!(@id body, $deref));
            }
            NodeKind::ArrayInit { elems } => {
                for c in elems {
                    $f(visit_children!(@id c, $deref));
                }
            }
            NodeKind::RefArg { expr } => {
                $f(visit_children!(@id expr, $deref));
            }
        }
    };
    (@id $c:ident, value) => {
        *$c
    };
    (@id $c:ident, mut) => {
        $c
    };
}

impl NodeKind {
    /// Visit every child handle in source order.
    pub fn for_each_child(&self, f: &mut impl FnMut(NodeId)) {
        visit_children!(self, f, value);
    }

    /// Visit every child handle slot mutably, in the same order as
    /// [`Self::for_each_child`].
    pub fn for_each_child_mut(&mut self, f: &mut impl FnMut(&mut NodeId)) {
        visit_children!(self, f, mut);
    }

    /// Visit every inline type mutably (declaration types, cast targets,
    /// instance-of targets). Used by the type-rewriting passes.
    pub fn for_each_ty_mut(&mut self, f: &mut impl FnMut(&mut Ty)) {
        match self {
            NodeKind::TypeDecl {
                constraints,
                base_types,
                ..
            } => {
                for (_, t) in constraints {
                    f(t);
                }
                for t in base_types {
                    f(t);
                }
            }
            NodeKind::Method {
                return_ty,
                constraints,
                ..
            } => {
                f(return_ty);
                for (_, t) in constraints {
                    f(t);
                }
            }
            NodeKind::Field { ty, .. }
            | NodeKind::Event { ty, .. }
            | NodeKind::Param { ty, .. }
            | NodeKind::Indexer { ty, .. }
            | NodeKind::Property { ty, .. }
            | NodeKind::VarDecl { ty, .. }
            | NodeKind::New { ty, .. }
            | NodeKind::Is { ty, .. } => f(ty),
            NodeKind::CatchClause { ty, .. } => {
                for t in ty {
                    f(t);
                }
            }
            _ => {}
        }
    }

    pub const fn is_statement_list_owner(&self) -> bool {
        matches!(self, NodeKind::Block { .. } | NodeKind::SwitchSection { .. })
    }
}
