//! Node arena and structural tree operations.
//!
//! All nodes of a tree live in one flat `Vec`; handles are indices. A node
//! belongs to at most one parent at a time; the arena keeps the parent
//! pointers consistent through every detach/insert/replace. Nothing is ever
//! freed — detached subtrees (discarded repair-ladder clones included) simply
//! stay unreachable, which keeps every handle stable for the side-table.

use crate::node::NodeKind;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl NodeId {
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug)]
pub struct Node {
    pub kind: NodeKind,
    pub parent: Option<NodeId>,
}

#[derive(Debug, Default)]
pub struct NodeArena {
    nodes: Vec<Node>,
}

impl NodeArena {
    pub fn new() -> NodeArena {
        NodeArena::default()
    }

    pub fn with_capacity(capacity: usize) -> NodeArena {
        NodeArena {
            nodes: Vec::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Allocate a detached node. Callers attach it through the structural
    /// operations below (or the `add_*` factory methods, which wire parents).
    pub fn alloc(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node { kind, parent: None });
        id
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.index()].kind
    }

    /// Direct mutable access to a node's payload. Callers that rewrite child
    /// handles through this must fix parent pointers themselves; passes use
    /// the structural operations instead.
    pub fn kind_mut(&mut self, id: NodeId) -> &mut NodeKind {
        &mut self.nodes[id.index()].kind
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.index()].parent
    }

    /// Low-level parent-pointer write. Callers that install a handle into a
    /// slot through [`Self::kind_mut`] must record the new parent here; the
    /// structural operations below do it themselves.
    pub fn set_parent(&mut self, child: NodeId, parent: Option<NodeId>) {
        self.nodes[child.index()].parent = parent;
    }

    // ========================================================================
    // Traversal
    // ========================================================================

    /// Child handles in source order.
    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.kind(id).for_each_child(&mut |c| out.push(c));
        out
    }

    /// All descendants of `id` in preorder, excluding `id` itself.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = self.children(id);
        stack.reverse();
        while let Some(n) = stack.pop() {
            out.push(n);
            let mut c = self.children(n);
            c.reverse();
            stack.extend(c);
        }
        out
    }

    /// Nearest ancestor (excluding `id`) matching the predicate.
    pub fn ancestor_matching(
        &self,
        id: NodeId,
        pred: impl Fn(&NodeKind) -> bool,
    ) -> Option<NodeId> {
        let mut cur = self.parent(id);
        while let Some(p) = cur {
            if pred(self.kind(p)) {
                return Some(p);
            }
            cur = self.parent(p);
        }
        None
    }

    /// Whether `id` is still reachable from `root` through parent links.
    pub fn is_attached_under(&self, id: NodeId, root: NodeId) -> bool {
        let mut cur = Some(id);
        while let Some(n) = cur {
            if n == root {
                return true;
            }
            cur = self.parent(n);
        }
        false
    }

    // ========================================================================
    // Statement-list addressing
    // ========================================================================

    /// The primary ordered child list of a node, if it has one: block and
    /// switch-section statements, type members, unit items.
    pub fn primary_list(&self, id: NodeId) -> Option<&Vec<NodeId>> {
        match self.kind(id) {
            NodeKind::Block { stmts } | NodeKind::SwitchSection { stmts, .. } => Some(stmts),
            NodeKind::TypeDecl { members, .. } => Some(members),
            NodeKind::Unit { items } => Some(items),
            _ => None,
        }
    }

    fn primary_list_mut(&mut self, id: NodeId) -> Option<&mut Vec<NodeId>> {
        match self.kind_mut(id) {
            NodeKind::Block { stmts } | NodeKind::SwitchSection { stmts, .. } => Some(stmts),
            NodeKind::TypeDecl { members, .. } => Some(members),
            NodeKind::Unit { items } => Some(items),
            _ => None,
        }
    }

    /// Locate `id` within its parent's primary list. `None` when the node
    /// sits in a single slot (e.g. a loop body) or is detached.
    pub fn list_position(&self, id: NodeId) -> Option<(NodeId, usize)> {
        let parent = self.parent(id)?;
        let list = self.primary_list(parent)?;
        list.iter().position(|&x| x == id).map(|i| (parent, i))
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let (parent, i) = self.list_position(id)?;
        self.primary_list(parent)?.get(i + 1).copied()
    }

    pub fn prev_sibling(&self, id: NodeId) -> Option<NodeId> {
        let (parent, i) = self.list_position(id)?;
        if i == 0 {
            return None;
        }
        self.primary_list(parent)?.get(i - 1).copied()
    }

    // ========================================================================
    // Structural mutation
    // ========================================================================

    /// Detach a node from its parent. List positions are removed; single-slot
    /// positions are replaced by an `Empty` statement so the slot stays valid.
    pub fn detach(&mut self, id: NodeId) {
        if let Some((parent, i)) = self.list_position(id) {
            if let Some(list) = self.primary_list_mut(parent) {
                list.remove(i);
            }
            self.set_parent(id, None);
        } else if self.parent(id).is_some() {
            let empty = self.alloc(NodeKind::Empty);
            self.replace(id, empty);
        }
    }

    /// Insert `node` immediately before `anchor` in the anchor's list.
    /// Panics in debug builds if the anchor is not in a list.
    pub fn insert_before(&mut self, anchor: NodeId, node: NodeId) {
        if let Some((parent, i)) = self.list_position(anchor) {
            if let Some(list) = self.primary_list_mut(parent) {
                list.insert(i, node);
            }
            self.set_parent(node, Some(parent));
        } else {
            debug_assert!(false, "insert_before: anchor is not in a statement list");
        }
    }

    /// Insert `node` immediately after `anchor` in the anchor's list.
    pub fn insert_after(&mut self, anchor: NodeId, node: NodeId) {
        if let Some((parent, i)) = self.list_position(anchor) {
            if let Some(list) = self.primary_list_mut(parent) {
                list.insert(i + 1, node);
            }
            self.set_parent(node, Some(parent));
        } else {
            debug_assert!(false, "insert_after: anchor is not in a statement list");
        }
    }

    /// Append `node` to the primary list of `parent`.
    pub fn push_child(&mut self, parent: NodeId, node: NodeId) {
        if let Some(list) = self.primary_list_mut(parent) {
            list.push(node);
        } else {
            debug_assert!(false, "push_child: parent has no primary list");
            return;
        }
        self.set_parent(node, Some(parent));
    }

    /// Replace `old` with `new` wherever `old` sits in its parent — list
    /// position or single slot. `old` is left detached.
    pub fn replace(&mut self, old: NodeId, new: NodeId) {
        let Some(parent) = self.parent(old) else {
            return;
        };
        self.kind_mut(parent).for_each_child_mut(&mut |slot| {
            if *slot == old {
                *slot = new;
            }
        });
        self.set_parent(new, Some(parent));
        self.set_parent(old, None);
    }

    /// Take ownership of a node's primary list. The node is left with an
    /// empty list and the removed children are detached.
    pub fn take_primary_list(&mut self, id: NodeId) -> Vec<NodeId> {
        let taken = match self.primary_list_mut(id) {
            Some(list) => std::mem::take(list),
            None => {
                debug_assert!(false, "take_primary_list: node has no primary list");
                Vec::new()
            }
        };
        for &c in &taken {
            self.set_parent(c, None);
        }
        taken
    }

    /// Replace a node's primary list wholesale, fixing parent pointers.
    pub fn set_primary_list(&mut self, id: NodeId, items: Vec<NodeId>) {
        for &c in &items {
            self.set_parent(c, Some(id));
        }
        match self.primary_list_mut(id) {
            Some(list) => *list = items,
            None => debug_assert!(false, "set_primary_list: node has no primary list"),
        }
    }

    /// Remove the section at `index` from a switch, leaving it detached.
    pub fn remove_switch_section(&mut self, switch: NodeId, index: usize) {
        let removed = match self.kind_mut(switch) {
            NodeKind::Switch { sections, .. } if index < sections.len() => {
                Some(sections.remove(index))
            }
            _ => None,
        };
        if let Some(sec) = removed {
            self.set_parent(sec, None);
        }
    }

    /// Deep-clone a subtree; the clone is detached.
    pub fn deep_clone(&mut self, id: NodeId) -> NodeId {
        let mut kind = self.kind(id).clone();
        let old_children = self.children(id);
        let new_children: Vec<NodeId> = old_children
            .iter()
            .map(|&c| self.deep_clone(c))
            .collect();
        let mut i = 0;
        kind.for_each_child_mut(&mut |slot| {
            *slot = new_children[i];
            i += 1;
        });
        let new_id = self.alloc(kind);
        for &c in &new_children {
            self.set_parent(c, Some(new_id));
        }
        new_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ty::Ty;

    #[test]
    fn detach_and_siblings() {
        let mut a = NodeArena::new();
        let s1 = a.alloc(NodeKind::Label { name: "L".into() });
        let s2 = a.alloc(NodeKind::Goto { label: "L".into() });
        let s3 = a.alloc(NodeKind::Empty);
        let b = a.add_block(vec![s1, s2, s3]);

        assert_eq!(a.next_sibling(s1), Some(s2));
        assert_eq!(a.prev_sibling(s3), Some(s2));

        a.detach(s2);
        assert_eq!(a.parent(s2), None);
        assert_eq!(a.next_sibling(s1), Some(s3));
        assert_eq!(a.children(b), vec![s1, s3]);
    }

    #[test]
    fn replace_in_slot() {
        let mut a = NodeArena::new();
        let cond = a.add_bool(true);
        let then_branch = a.alloc(NodeKind::Empty);
        let if_stmt = a.add_if(cond, then_branch, None);

        let repl = a.add_goto("X");
        a.replace(then_branch, repl);
        match a.kind(if_stmt) {
            NodeKind::If { then_branch, .. } => assert_eq!(*then_branch, repl),
            other => panic!("unexpected kind {other:?}"),
        }
        assert_eq!(a.parent(repl), Some(if_stmt));
        assert_eq!(a.parent(then_branch), None);
    }

    #[test]
    fn deep_clone_is_detached_and_fresh() {
        let mut a = NodeArena::new();
        let init = a.add_int(7);
        let decl = a.add_var_decl("x", Ty::Infer, Some(init));
        let b = a.add_block(vec![decl]);

        let clone = a.deep_clone(b);
        assert_ne!(clone, b);
        assert_eq!(a.parent(clone), None);
        let cloned_children = a.children(clone);
        assert_eq!(cloned_children.len(), 1);
        assert_ne!(cloned_children[0], decl);
        match a.kind(cloned_children[0]) {
            NodeKind::VarDecl { name, .. } => assert_eq!(name, "x"),
            other => panic!("unexpected kind {other:?}"),
        }
    }

    #[test]
    fn ancestor_matching_walks_up() {
        let mut a = NodeArena::new();
        let brk = a.alloc(NodeKind::Break { target: None });
        let body = a.add_block(vec![brk]);
        let cond = a.add_bool(true);
        let w = a.add_while(cond, body);
        let outer = a.add_block(vec![w]);

        let found = a.ancestor_matching(brk, |k| matches!(k, NodeKind::While { .. }));
        assert_eq!(found, Some(w));
        assert!(a.is_attached_under(brk, outer));
    }
}
