//! Small tree-surgery helpers shared by the passes.

use rustc_hash::FxHashMap;
use tslower_ast::{NodeArena, NodeId, NodeKind};

/// Insert `stmt` immediately before `anchor`, wrapping the anchor in a block
/// first when it occupies a single-statement slot (a bare loop body, an `if`
/// branch).
pub fn insert_stmt_before(arena: &mut NodeArena, anchor: NodeId, stmt: NodeId) {
    if arena.list_position(anchor).is_some() {
        arena.insert_before(anchor, stmt);
        return;
    }
    let placeholder = arena.alloc(NodeKind::Empty);
    arena.replace(anchor, placeholder);
    let block = arena.add_block(vec![stmt, anchor]);
    arena.replace(placeholder, block);
}

/// Statements that unconditionally transfer control: throw, goto, return,
/// and breaks that carry a loop-label annotation.
pub fn statement_is_branch(kind: &NodeKind) -> bool {
    match kind {
        NodeKind::Throw { .. } | NodeKind::Goto { .. } | NodeKind::Return { .. } => true,
        NodeKind::Break { target } => target.is_some(),
        _ => false,
    }
}

/// Replace every identifier named in `subs` throughout the subtree at `root`
/// with a fresh clone of the mapped expression. Returns the (possibly new)
/// root handle; the root itself is substituted when it is a bare identifier.
pub fn substitute(
    arena: &mut NodeArena,
    root: NodeId,
    subs: &FxHashMap<String, NodeId>,
) -> NodeId {
    if subs.is_empty() {
        return root;
    }
    if let NodeKind::Ident(name) = arena.kind(root) {
        if let Some(&repl) = subs.get(name.as_str()) {
            let clone = arena.deep_clone(repl);
            if arena.parent(root).is_some() {
                arena.replace(root, clone);
            }
            return clone;
        }
    }
    // Snapshot first: clones spliced in below must not be revisited.
    let targets: Vec<NodeId> = arena
        .descendants(root)
        .into_iter()
        .filter(|&d| match arena.kind(d) {
            NodeKind::Ident(name) => subs.contains_key(name.as_str()),
            _ => false,
        })
        .collect();
    for t in targets {
        let repl = match arena.kind(t) {
            NodeKind::Ident(name) => subs[name.as_str()],
            _ => continue,
        };
        let clone = arena.deep_clone(repl);
        arena.replace(t, clone);
    }
    root
}

/// All nodes of a given shape under `root`, in preorder.
pub fn collect(
    arena: &NodeArena,
    root: NodeId,
    pred: impl Fn(&NodeKind) -> bool,
) -> Vec<NodeId> {
    arena
        .descendants(root)
        .into_iter()
        .filter(|&d| pred(arena.kind(d)))
        .collect()
}
