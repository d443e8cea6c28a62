//! NodeArena creation methods (add_* methods).
//!
//! Construction helpers that allocate a node and wire the parent pointers of
//! the children handed in. Passes use these when synthesizing replacement
//! structure; tests use them to build input trees.

use crate::arena::{NodeArena, NodeId};
use crate::node::{AssignOp, BinaryOp, CtorTarget, Modifiers, NodeKind, ParamMode, TypeDeclKind};
use crate::ty::Ty;

impl NodeArena {
    fn add_with_children(&mut self, kind: NodeKind) -> NodeId {
        let children: Vec<NodeId> = {
            let mut out = Vec::new();
            kind.for_each_child(&mut |c| out.push(c));
            out
        };
        let id = self.alloc(kind);
        for c in children {
            self.set_parent(c, Some(id));
        }
        id
    }

    // ========================================================================
    // Expressions
    // ========================================================================

    pub fn add_ident(&mut self, name: impl Into<String>) -> NodeId {
        self.alloc(NodeKind::Ident(name.into()))
    }

    pub fn add_int(&mut self, value: i64) -> NodeId {
        self.alloc(NodeKind::Int(value))
    }

    pub fn add_str(&mut self, value: impl Into<String>) -> NodeId {
        self.alloc(NodeKind::Str(value.into()))
    }

    pub fn add_bool(&mut self, value: bool) -> NodeId {
        self.alloc(NodeKind::Bool(value))
    }

    pub fn add_this(&mut self) -> NodeId {
        self.alloc(NodeKind::This)
    }

    pub fn add_base(&mut self) -> NodeId {
        self.alloc(NodeKind::Base)
    }

    pub fn add_binary(&mut self, op: BinaryOp, lhs: NodeId, rhs: NodeId) -> NodeId {
        self.add_with_children(NodeKind::Binary { op, lhs, rhs })
    }

    pub fn add_assign(&mut self, target: NodeId, value: NodeId) -> NodeId {
        self.add_with_children(NodeKind::Assign {
            op: AssignOp::Assign,
            target,
            value,
        })
    }

    pub fn add_call(&mut self, callee: NodeId, args: Vec<NodeId>) -> NodeId {
        self.add_with_children(NodeKind::Call { callee, args })
    }

    pub fn add_member(&mut self, target: NodeId, name: impl Into<String>) -> NodeId {
        self.add_with_children(NodeKind::Member {
            target,
            name: name.into(),
        })
    }

    pub fn add_index(&mut self, target: NodeId, args: Vec<NodeId>) -> NodeId {
        self.add_with_children(NodeKind::Index { target, args })
    }

    pub fn add_is(&mut self, expr: NodeId, ty: Ty) -> NodeId {
        self.add_with_children(NodeKind::Is { expr, ty })
    }

    pub fn add_new(&mut self, ty: Ty, args: Vec<NodeId>) -> NodeId {
        self.add_with_children(NodeKind::New { ty, args })
    }

    pub fn add_array_init(&mut self, elems: Vec<NodeId>) -> NodeId {
        self.add_with_children(NodeKind::ArrayInit { elems })
    }

    pub fn add_lambda(&mut self, params: Vec<NodeId>, body: NodeId) -> NodeId {
        self.add_with_children(NodeKind::Lambda { params, body })
    }

    // ========================================================================
    // Statements
    // ========================================================================

    pub fn add_block(&mut self, stmts: Vec<NodeId>) -> NodeId {
        self.add_with_children(NodeKind::Block { stmts })
    }

    pub fn add_if(&mut self, cond: NodeId, then_branch: NodeId, else_branch: Option<NodeId>) -> NodeId {
        self.add_with_children(NodeKind::If {
            cond,
            then_branch,
            else_branch,
        })
    }

    pub fn add_while(&mut self, cond: NodeId, body: NodeId) -> NodeId {
        self.add_with_children(NodeKind::While { cond, body })
    }

    pub fn add_do_while(&mut self, body: NodeId, cond: NodeId) -> NodeId {
        self.add_with_children(NodeKind::DoWhile { body, cond })
    }

    pub fn add_switch(&mut self, scrutinee: NodeId, sections: Vec<NodeId>) -> NodeId {
        self.add_with_children(NodeKind::Switch {
            scrutinee,
            sections,
        })
    }

    pub fn add_switch_section(
        &mut self,
        labels: Vec<Option<NodeId>>,
        stmts: Vec<NodeId>,
    ) -> NodeId {
        self.add_with_children(NodeKind::SwitchSection { labels, stmts })
    }

    pub fn add_label(&mut self, name: impl Into<String>) -> NodeId {
        self.alloc(NodeKind::Label { name: name.into() })
    }

    pub fn add_goto(&mut self, label: impl Into<String>) -> NodeId {
        self.alloc(NodeKind::Goto {
            label: label.into(),
        })
    }

    pub fn add_break(&mut self, target: Option<String>) -> NodeId {
        self.alloc(NodeKind::Break { target })
    }

    pub fn add_continue(&mut self, target: Option<String>) -> NodeId {
        self.alloc(NodeKind::Continue { target })
    }

    pub fn add_return(&mut self, value: Option<NodeId>) -> NodeId {
        self.add_with_children(NodeKind::Return { value })
    }

    pub fn add_throw(&mut self, value: Option<NodeId>) -> NodeId {
        self.add_with_children(NodeKind::Throw { value })
    }

    pub fn add_try(&mut self, body: NodeId, catches: Vec<NodeId>, finally: Option<NodeId>) -> NodeId {
        self.add_with_children(NodeKind::Try {
            body,
            catches,
            finally,
        })
    }

    pub fn add_catch_clause(&mut self, param: Option<String>, ty: Option<Ty>, body: NodeId) -> NodeId {
        self.add_with_children(NodeKind::CatchClause { param, ty, body })
    }

    pub fn add_var_decl(&mut self, name: impl Into<String>, ty: Ty, initializer: Option<NodeId>) -> NodeId {
        self.add_with_children(NodeKind::VarDecl {
            name: name.into(),
            ty,
            initializer,
        })
    }

    pub fn add_expr_stmt(&mut self, expr: NodeId) -> NodeId {
        self.add_with_children(NodeKind::ExprStmt { expr })
    }

    // ========================================================================
    // Declarations
    // ========================================================================

    pub fn add_unit(&mut self, items: Vec<NodeId>) -> NodeId {
        self.add_with_children(NodeKind::Unit { items })
    }

    pub fn add_type_decl(
        &mut self,
        name: impl Into<String>,
        kind: TypeDeclKind,
        members: Vec<NodeId>,
    ) -> NodeId {
        self.add_with_children(NodeKind::TypeDecl {
            name: name.into(),
            kind,
            modifiers: Modifiers::empty(),
            attrs: Vec::new(),
            type_params: Vec::new(),
            constraints: Vec::new(),
            base_types: Vec::new(),
            members,
        })
    }

    pub fn add_param(&mut self, name: impl Into<String>, ty: Ty) -> NodeId {
        self.alloc(NodeKind::Param {
            name: name.into(),
            ty,
            mode: ParamMode::Value,
            default: None,
            optional: false,
        })
    }

    pub fn add_method(
        &mut self,
        name: impl Into<String>,
        return_ty: Ty,
        params: Vec<NodeId>,
        body: Option<NodeId>,
    ) -> NodeId {
        self.add_with_children(NodeKind::Method {
            name: name.into(),
            modifiers: Modifiers::empty(),
            attrs: Vec::new(),
            return_ty,
            type_params: Vec::new(),
            constraints: Vec::new(),
            params,
            body,
        })
    }

    pub fn add_constructor(
        &mut self,
        params: Vec<NodeId>,
        initializer: Option<NodeId>,
        body: Option<NodeId>,
    ) -> NodeId {
        self.add_with_children(NodeKind::Constructor {
            name: "constructor".into(),
            modifiers: Modifiers::empty(),
            attrs: Vec::new(),
            params,
            initializer,
            body,
        })
    }

    pub fn add_ctor_initializer(&mut self, target: CtorTarget, args: Vec<NodeId>) -> NodeId {
        self.add_with_children(NodeKind::CtorInitializer { target, args })
    }

    pub fn add_field(&mut self, name: impl Into<String>, ty: Ty, initializer: Option<NodeId>) -> NodeId {
        self.add_with_children(NodeKind::Field {
            name: name.into(),
            modifiers: Modifiers::empty(),
            attrs: Vec::new(),
            ty,
            initializer,
        })
    }
}
