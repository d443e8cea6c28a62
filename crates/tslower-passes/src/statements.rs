//! Small statement-level cleanups.

use tslower_ast::{NodeId, NodeKind};
use tslower_common::TransformError;

use crate::pipeline::{Pass, PassContext};
use crate::util::collect;

/// A switch with no sections over a bare identifier does nothing; drop it.
pub struct RemoveEmptySwitch;

impl Pass for RemoveEmptySwitch {
    fn name(&self) -> &'static str {
        "RemoveEmptySwitch"
    }

    fn run(&mut self, cx: &mut PassContext<'_>) -> Result<(), TransformError> {
        let switches = collect(cx.arena, cx.unit, |k| {
            matches!(k, NodeKind::Switch { sections, .. } if sections.is_empty())
        });
        for sw in switches {
            let scrutinee = match cx.arena.kind(sw) {
                NodeKind::Switch { scrutinee, .. } => *scrutinee,
                _ => continue,
            };
            if matches!(cx.arena.kind(scrutinee), NodeKind::Ident(_)) {
                cx.arena.detach(sw);
            }
        }
        Ok(())
    }
}

/// Recovers a `while` loop from the `label: if (cond) { ...; goto label; }`
/// shape, so the goto eliminator never sees it. Only fires when the goto at
/// the loop tail is the callable's single goto; anything richer is left for
/// the general dispatch encoding.
pub struct MakeWhileLoop;

impl Pass for MakeWhileLoop {
    fn name(&self) -> &'static str {
        "MakeWhileLoop"
    }

    fn run(&mut self, cx: &mut PassContext<'_>) -> Result<(), TransformError> {
        let bodies: Vec<NodeId> = collect(cx.arena, cx.unit, |k| {
            matches!(
                k,
                NodeKind::Method { body: Some(_), .. }
                    | NodeKind::Constructor { body: Some(_), .. }
            )
        })
        .into_iter()
        .filter_map(|d| match cx.arena.kind(d) {
            NodeKind::Method { body, .. } | NodeKind::Constructor { body, .. } => *body,
            _ => None,
        })
        .collect();
        for body in bodies {
            rewrite_body(cx, body);
        }
        Ok(())
    }
}

fn rewrite_body(cx: &mut PassContext<'_>, body: NodeId) {
    let gotos = collect(cx.arena, body, |k| matches!(k, NodeKind::Goto { .. }));
    let &[g] = gotos.as_slice() else { return };
    let NodeKind::Goto { label } = cx.arena.kind(g) else {
        return;
    };
    let label_name = label.clone();

    let labels = collect(cx.arena, body, |k| {
        matches!(k, NodeKind::Label { name } if *name == label_name)
    });
    let &[label] = labels.as_slice() else { return };

    let Some(cand) = cx.arena.next_sibling(label) else {
        return;
    };
    let NodeKind::If {
        cond,
        then_branch,
        else_branch: None,
    } = *cx.arena.kind(cand)
    else {
        return;
    };
    let NodeKind::Block { stmts } = cx.arena.kind(then_branch) else {
        return;
    };
    if stmts.last() != Some(&g) {
        return;
    }

    cx.arena.detach(g);
    let placeholder = cx.arena.alloc(NodeKind::Empty);
    cx.arena.replace(cand, placeholder);
    let lowered = cx.arena.add_while(cond, then_branch);
    cx.arena.replace(placeholder, lowered);
    cx.arena.detach(label);
}
