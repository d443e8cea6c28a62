//! Goto elimination.
//!
//! The target language has no unrestricted jumps, so every callable that
//! still contains a `goto` after the earlier passes is re-encoded as a
//! labeled dispatch loop:
//!
//! ```text
//! a: stmts1; goto b;
//! b: stmts2;
//! ```
//!
//! becomes
//!
//! ```text
//! var a = 1; var b = 2;
//! var _goto = 0;
//! _GOTO_LOOP:
//! while (true) {
//!     switch (_goto) {
//!         default: ...;
//!         case 1: stmts1; _goto = b; continue _GOTO_LOOP;
//!         case 2: stmts2; break _GOTO_LOOP;
//!     }
//! }
//! ```
//!
//! The encoding needs every goto-targeted label to share one parent
//! statement list. Bodies that violate that are first pushed through a
//! short ladder of structural repairs, each attempt on a fresh clone of the
//! callable; the combinations are finicky and their order is part of the
//! observable behavior, so they are fixed. A body no attempt can normalize
//! is reported and left alone.

use rustc_hash::FxHashSet;
use tslower_ast::{NodeArena, NodeId, NodeKind, Prim, Ty};
use tslower_common::diagnostics::diagnostic_codes;
use tslower_common::limits::GOTO_REPAIR_ATTEMPTS;
use tslower_common::{Diagnostic, Diagnostics, TransformError};

use crate::pipeline::{Pass, PassContext};
use crate::util::{collect, insert_stmt_before, statement_is_branch};

/// The per-callable dispatch variable.
pub const DISPATCH_VAR: &str = "_goto";
/// The synthetic label on the dispatch loop.
pub const GOTO_LOOP_LABEL: &str = "_GOTO_LOOP";

#[derive(Copy, Clone, Debug)]
enum RepairStep {
    LiftLabeledSwitchSections,
    InlineShortJumps,
    AddImplicitGotos,
}

/// The repair combinations, tried in order on fresh clones. Downstream
/// output for ambiguous shapes depends on which attempt succeeds first.
const REPAIR_LADDER: [&[RepairStep]; GOTO_REPAIR_ATTEMPTS] = [
    &[],
    &[RepairStep::LiftLabeledSwitchSections],
    &[
        RepairStep::LiftLabeledSwitchSections,
        RepairStep::InlineShortJumps,
    ],
    &[RepairStep::AddImplicitGotos, RepairStep::InlineShortJumps],
];

pub struct GotoRemoval {
    next_id: u32,
}

impl GotoRemoval {
    pub fn new() -> GotoRemoval {
        GotoRemoval { next_id: 1 }
    }

    fn fresh(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

impl Pass for GotoRemoval {
    fn name(&self) -> &'static str {
        "GotoRemoval"
    }

    fn run(&mut self, cx: &mut PassContext<'_>) -> Result<(), TransformError> {
        move_labels_out_of_try(cx.arena, cx.unit);

        let callables: Vec<NodeId> = collect(cx.arena, cx.unit, |k| {
            matches!(
                k,
                NodeKind::Method { body: Some(_), .. }
                    | NodeKind::Constructor { body: Some(_), .. }
            )
        });
        for decl in callables {
            self.lower_callable(cx.arena, cx.diags, decl);
        }
        Ok(())
    }
}

impl GotoRemoval {
    fn lower_callable(&mut self, arena: &mut NodeArena, diags: &mut Diagnostics, decl: NodeId) {
        if gotos_in(arena, decl).is_empty() {
            return;
        }

        let mut target = decl;
        if has_bad_labels(arena, decl) {
            let mut repaired = None;
            for (attempt, steps) in REPAIR_LADDER.iter().enumerate() {
                let clone = arena.deep_clone(decl);
                self.label_loops(arena, clone);
                flatten_switch_section_blocks(arena, clone);
                for step in *steps {
                    match step {
                        RepairStep::LiftLabeledSwitchSections => {
                            self.lift_labeled_switch_sections(arena, clone);
                        }
                        RepairStep::InlineShortJumps => inline_short_jumps(arena, clone),
                        RepairStep::AddImplicitGotos => add_implicit_gotos(arena, clone),
                    }
                }
                remove_redundant_gotos(arena, clone);
                remove_unreachable_statements(arena, clone);
                remove_redundant_gotos(arena, clone);
                remove_labels_without_gotos(arena, clone);

                if !has_bad_labels(arena, clone) {
                    repaired = Some(clone);
                    break;
                }
                tracing::trace!(
                    "[goto] repair attempt {} left bad labels in `{}`",
                    attempt + 1,
                    callable_name(arena, decl)
                );
            }
            match repaired {
                Some(r) => {
                    arena.replace(decl, r);
                    target = r;
                }
                None => {
                    diags.push(Diagnostic::message(
                        diagnostic_codes::UNRESOLVED_GOTO_LABELS,
                        format!(
                            "goto labels in `{}` share no common parent after {GOTO_REPAIR_ATTEMPTS} repair attempts; leaving it untransformed",
                            callable_name(arena, decl)
                        ),
                    ));
                    return;
                }
            }
        }

        create_goto_loop(arena, target);
        rewrite_gotos(arena, target);
    }

    /// Annotate plain breaks with the label of their enclosing loop,
    /// synthesizing the label when the loop has none. Breaks whose nearest
    /// breakable construct is a switch are left alone.
    fn label_loops(&mut self, arena: &mut NodeArena, decl: NodeId) {
        let breaks = collect(arena, decl, |k| {
            matches!(k, NodeKind::Break { target: None })
        });
        for brk in breaks {
            let Some(outer) = arena.ancestor_matching(brk, |k| {
                matches!(
                    k,
                    NodeKind::While { .. }
                        | NodeKind::DoWhile { .. }
                        | NodeKind::For { .. }
                        | NodeKind::Switch { .. }
                )
            }) else {
                continue;
            };
            if matches!(arena.kind(outer), NodeKind::Switch { .. }) {
                continue;
            }
            let name = match arena.prev_sibling(outer).map(|p| arena.kind(p)) {
                Some(NodeKind::Label { name }) => name.clone(),
                _ => {
                    let name = format!("_loop{}", self.fresh());
                    let label = arena.add_label(name.clone());
                    insert_stmt_before(arena, outer, label);
                    name
                }
            };
            *arena.kind_mut(brk) = NodeKind::Break { target: Some(name) };
        }
    }

    /// Move every switch section that starts with a goto-targeted label out
    /// of its switch: the section body is copied to after the switch and the
    /// section is reduced to a single goto into the copy. A label after the
    /// switch (synthesized if absent) gives lifted breaks somewhere to jump.
    fn lift_labeled_switch_sections(&mut self, arena: &mut NodeArena, decl: NodeId) {
        let switches = collect(arena, decl, |k| matches!(k, NodeKind::Switch { .. }));
        // Innermost switches first; lifting clones nested material.
        for &sw in switches.iter().rev() {
            if !arena.is_attached_under(sw, decl) {
                continue;
            }
            let sections = match arena.kind(sw) {
                NodeKind::Switch { sections, .. } => sections.clone(),
                _ => continue,
            };
            let labeled: Vec<NodeId> = sections
                .iter()
                .copied()
                .filter(|&sec| {
                    arena
                        .primary_list(sec)
                        .and_then(|stmts| stmts.first())
                        .is_some_and(|&first| matches!(arena.kind(first), NodeKind::Label { .. }))
                })
                .collect();
            if labeled.is_empty() {
                continue;
            }

            // The switch needs siblings to lift into.
            if arena.list_position(sw).is_none() {
                let placeholder = arena.alloc(NodeKind::Empty);
                arena.replace(sw, placeholder);
                let block = arena.add_block(vec![sw]);
                arena.replace(placeholder, block);
            }

            let (end_name, end_label) = match arena.next_sibling(sw) {
                Some(n) => match arena.kind(n) {
                    NodeKind::Label { name } => (name.clone(), n),
                    _ => self.add_switch_end_label(arena, sw),
                },
                None => self.add_switch_end_label(arena, sw),
            };

            for sec in labeled {
                let stmts = match arena.primary_list(sec) {
                    Some(stmts) => stmts.clone(),
                    None => continue,
                };
                let first_label = match arena.kind(stmts[0]) {
                    NodeKind::Label { name } => name.clone(),
                    _ => continue,
                };

                let mut anchor = sw;
                for &s in &stmts {
                    let lifted = if matches!(arena.kind(s), NodeKind::Break { .. }) {
                        arena.add_goto(end_name.clone())
                    } else {
                        arena.deep_clone(s)
                    };
                    arena.insert_after(anchor, lifted);
                    anchor = lifted;
                }

                arena.take_primary_list(sec);
                let jump = arena.add_goto(first_label);
                arena.set_primary_list(sec, vec![jump]);
            }

            // Falling out of the switch must still reach the next statement.
            if arena.next_sibling(sw) != Some(end_label) {
                let jump = arena.add_goto(end_name);
                arena.insert_after(sw, jump);
            }
        }
    }

    fn add_switch_end_label(&mut self, arena: &mut NodeArena, sw: NodeId) -> (String, NodeId) {
        let name = format!("_SwitchEnd{}", self.fresh());
        let label = arena.add_label(name.clone());
        arena.insert_after(sw, label);
        (name, label)
    }
}

fn callable_name(arena: &NodeArena, decl: NodeId) -> String {
    match arena.kind(decl) {
        NodeKind::Method { name, .. } | NodeKind::Constructor { name, .. } => name.clone(),
        _ => String::new(),
    }
}

fn gotos_in(arena: &NodeArena, decl: NodeId) -> Vec<NodeId> {
    collect(arena, decl, |k| matches!(k, NodeKind::Goto { .. }))
}

fn goto_label_names(arena: &NodeArena, decl: NodeId) -> FxHashSet<String> {
    gotos_in(arena, decl)
        .into_iter()
        .filter_map(|g| match arena.kind(g) {
            NodeKind::Goto { label } => Some(label.clone()),
            _ => None,
        })
        .collect()
}

/// Whether the goto-targeted labels fail to share one parent statement list.
/// A callable with gotos but no matching labels counts as bad; the encoding
/// has nowhere to dispatch to.
fn has_bad_labels(arena: &NodeArena, decl: NodeId) -> bool {
    let names = goto_label_names(arena, decl);
    if names.is_empty() {
        return false;
    }
    let labels: Vec<NodeId> = collect(arena, decl, |k| {
        matches!(k, NodeKind::Label { name } if names.contains(name))
    });
    let Some(&first) = labels.first() else {
        return true;
    };
    let parent = arena.parent(first);
    labels.iter().any(|&l| arena.parent(l) != parent)
}

/// Labels inside `try` statements cannot join the dispatch partition; hoist
/// each one to just before its enclosing `try`.
fn move_labels_out_of_try(arena: &mut NodeArena, unit: NodeId) {
    let labels = collect(arena, unit, |k| matches!(k, NodeKind::Label { .. }));
    for label in labels {
        let Some(t) = arena.ancestor_matching(label, |k| matches!(k, NodeKind::Try { .. })) else {
            continue;
        };
        arena.detach(label);
        insert_stmt_before(arena, t, label);
    }
}

/// A switch section whose sole statement is a block is flattened so that its
/// statements become direct section children and labels inside it become
/// liftable.
fn flatten_switch_section_blocks(arena: &mut NodeArena, decl: NodeId) {
    let sections = collect(arena, decl, |k| matches!(k, NodeKind::SwitchSection { .. }));
    for sec in sections {
        let only_child = match arena.primary_list(sec) {
            Some(stmts) if stmts.len() == 1 => stmts[0],
            _ => continue,
        };
        if !matches!(arena.kind(only_child), NodeKind::Block { .. }) {
            continue;
        }
        let inner = arena.take_primary_list(only_child);
        arena.take_primary_list(sec);
        arena.set_primary_list(sec, inner);
    }
}

/// Drop gotos that jump to the label immediately following them, and switch
/// fallback sections whose single statement jumps to the label right after
/// the switch.
fn remove_redundant_gotos(arena: &mut NodeArena, decl: NodeId) {
    for g in gotos_in(arena, decl) {
        if !arena.is_attached_under(g, decl) {
            continue;
        }
        let label = match arena.kind(g) {
            NodeKind::Goto { label } => label.clone(),
            _ => continue,
        };
        if let Some(next) = arena.next_sibling(g) {
            if matches!(arena.kind(next), NodeKind::Label { name } if *name == label) {
                arena.detach(g);
            }
        }
    }

    let switches = collect(arena, decl, |k| matches!(k, NodeKind::Switch { .. }));
    for sw in switches {
        if !arena.is_attached_under(sw, decl) {
            continue;
        }
        let (last_index, last) = match arena.kind(sw) {
            NodeKind::Switch { sections, .. } if !sections.is_empty() => {
                (sections.len() - 1, sections[sections.len() - 1])
            }
            _ => continue,
        };
        let only = match arena.primary_list(last) {
            Some(stmts) if stmts.len() == 1 => stmts[0],
            _ => continue,
        };
        let jump = match arena.kind(only) {
            NodeKind::Goto { label } => label.clone(),
            _ => continue,
        };
        let Some(next) = arena.next_sibling(sw) else {
            continue;
        };
        if matches!(arena.kind(next), NodeKind::Label { name } if *name == jump) {
            arena.remove_switch_section(sw, last_index);
        }
    }
}

/// Statements directly after an unconditional jump can never run; remove
/// them up to the next label.
fn remove_unreachable_statements(arena: &mut NodeArena, decl: NodeId) {
    let jumps = collect(arena, decl, |k| {
        matches!(k, NodeKind::Goto { .. } | NodeKind::Return { .. })
    });
    for j in jumps {
        if !arena.is_attached_under(j, decl) {
            continue;
        }
        while let Some(next) = arena.next_sibling(j) {
            if matches!(arena.kind(next), NodeKind::Label { .. }) {
                break;
            }
            arena.detach(next);
        }
    }
}

/// Remove labels nothing jumps to, by goto or by annotated break.
fn remove_labels_without_gotos(arena: &mut NodeArena, decl: NodeId) {
    let goto_names = goto_label_names(arena, decl);
    let break_names: FxHashSet<String> = collect(arena, decl, |k| {
        matches!(k, NodeKind::Break { target: Some(_) })
    })
    .into_iter()
    .filter_map(|b| match arena.kind(b) {
        NodeKind::Break { target } => target.clone(),
        _ => None,
    })
    .collect();

    let labels = collect(arena, decl, |k| matches!(k, NodeKind::Label { .. }));
    for l in labels {
        let name = match arena.kind(l) {
            NodeKind::Label { name } => name.clone(),
            _ => continue,
        };
        if !goto_names.contains(&name) && !break_names.contains(&name) {
            arena.detach(l);
        }
    }
}

/// Where a run of safe statements after a label falls off the end of its
/// list and the next statement outward is another label, make the
/// fallthrough explicit with a goto so the partition can sever the lists.
fn add_implicit_gotos(arena: &mut NodeArena, decl: NodeId) {
    let labels = collect(arena, decl, |k| matches!(k, NodeKind::Label { .. }));
    for label in labels {
        let mut last_safe = label;
        let mut cur = arena.next_sibling(label);
        let mut aborted = false;
        while let Some(s) = cur {
            let k = arena.kind(s);
            if statement_is_branch(k) || matches!(k, NodeKind::Label { .. } | NodeKind::Switch { .. })
            {
                aborted = true;
                break;
            }
            last_safe = s;
            cur = arena.next_sibling(s);
        }
        if aborted || last_safe == label {
            continue;
        }
        let Some(next) = next_statement_outward(arena, decl, last_safe) else {
            continue;
        };
        let target = match arena.kind(next) {
            NodeKind::Label { name } => name.clone(),
            _ => continue,
        };
        let jump = arena.add_goto(target);
        arena.insert_after(last_safe, jump);
    }
}

/// The statement control falls through to after `id` finishes: its next
/// sibling, or the nearest ancestor's next sibling.
fn next_statement_outward(arena: &NodeArena, decl: NodeId, id: NodeId) -> Option<NodeId> {
    let mut cur = id;
    loop {
        if let Some(next) = arena.next_sibling(cur) {
            return Some(next);
        }
        cur = arena.parent(cur)?;
        if cur == decl {
            return None;
        }
    }
}

/// A label whose following run is short and ends in an unconditional branch
/// is a "short jump target": every goto to it is replaced by a clone of the
/// run, then the label and the run itself are deleted.
fn inline_short_jumps(arena: &mut NodeArena, decl: NodeId) {
    let labels = collect(arena, decl, |k| matches!(k, NodeKind::Label { .. }));
    for label in labels {
        if !arena.is_attached_under(label, decl) {
            continue;
        }
        let name = match arena.kind(label) {
            NodeKind::Label { name } => name.clone(),
            _ => continue,
        };

        let mut run = Vec::new();
        let mut cur = arena.next_sibling(label);
        let mut ends_in_branch = false;
        while let Some(s) = cur {
            let k = arena.kind(s);
            if statement_is_branch(k) {
                run.push(s);
                ends_in_branch = true;
                break;
            }
            if matches!(k, NodeKind::Label { .. } | NodeKind::Switch { .. }) {
                break;
            }
            run.push(s);
            cur = arena.next_sibling(s);
        }
        if !ends_in_branch || run.is_empty() {
            continue;
        }

        let gotos: Vec<NodeId> = gotos_in(arena, decl)
            .into_iter()
            .filter(|&g| matches!(arena.kind(g), NodeKind::Goto { label } if *label == name))
            .filter(|&g| !run.iter().any(|&r| arena.is_attached_under(g, r)))
            .collect();
        if gotos.is_empty() {
            continue;
        }

        for g in gotos {
            if !arena.is_attached_under(g, decl) {
                continue;
            }
            for &r in &run {
                let clone = arena.deep_clone(r);
                insert_stmt_before(arena, g, clone);
            }
            arena.detach(g);
        }
        for &r in &run {
            arena.detach(r);
        }
        arena.detach(label);
    }
}

/// Partition the labels' parent list into label-led groups and re-encode it
/// as the dispatch loop. Group 0 holds the leading statements and becomes
/// the `default` section; labeled group `i` gets ordinal `i` and a numeric
/// variable named after its label.
fn create_goto_loop(arena: &mut NodeArena, decl: NodeId) {
    let names = goto_label_names(arena, decl);
    if names.is_empty() {
        return;
    }
    let first_label = arena
        .descendants(decl)
        .into_iter()
        .find(|&d| matches!(arena.kind(d), NodeKind::Label { name } if names.contains(name)));
    let Some(first_label) = first_label else {
        return;
    };
    let Some((parent, _)) = arena.list_position(first_label) else {
        return;
    };

    struct Group {
        label: Option<String>,
        stmts: Vec<NodeId>,
    }
    let mut groups = vec![Group {
        label: None,
        stmts: Vec::new(),
    }];
    for n in arena.take_primary_list(parent) {
        match arena.kind(n) {
            NodeKind::Label { name } if names.contains(name) => groups.push(Group {
                label: Some(name.clone()),
                stmts: Vec::new(),
            }),
            _ => {
                let last = groups.len() - 1;
                groups[last].stmts.push(n);
            }
        }
    }

    let mut new_stmts = Vec::new();
    for (i, group) in groups.iter().enumerate() {
        if let Some(name) = &group.label {
            let ordinal = arena.add_int(i as i64);
            let decl_stmt = arena.add_var_decl(name.clone(), Ty::Prim(Prim::Number), Some(ordinal));
            new_stmts.push(decl_stmt);
        }
    }
    let zero = arena.add_int(0);
    new_stmts.push(arena.add_var_decl(DISPATCH_VAR, Ty::Prim(Prim::Number), Some(zero)));
    new_stmts.push(arena.add_label(GOTO_LOOP_LABEL));

    let next_labels: Vec<Option<String>> = groups
        .iter()
        .skip(1)
        .map(|g| g.label.clone())
        .chain([None])
        .collect();

    let mut sections = Vec::new();
    for (i, group) in groups.iter().enumerate() {
        let mut stmts = group.stmts.clone();
        let needs_backfill = stmts
            .last()
            .is_none_or(|&s| !statement_is_branch(arena.kind(s)));
        if needs_backfill {
            let filler = match &next_labels[i] {
                Some(next) => arena.add_goto(next.clone()),
                None => arena.add_break(Some(GOTO_LOOP_LABEL.to_string())),
            };
            stmts.push(filler);
        }
        let case = match group.label {
            Some(_) => Some(arena.add_int(i as i64)),
            None => None,
        };
        sections.push(arena.add_switch_section(vec![case], stmts));
    }

    let scrutinee = arena.add_ident(DISPATCH_VAR);
    let dispatch = arena.add_switch(scrutinee, sections);
    let loop_body = arena.add_block(vec![dispatch]);
    let always = arena.add_bool(true);
    let dispatch_loop = arena.add_while(always, loop_body);
    new_stmts.push(dispatch_loop);

    arena.set_primary_list(parent, new_stmts);
}

/// Each surviving goto becomes `_goto = <label-var>; continue _GOTO_LOOP;`.
fn rewrite_gotos(arena: &mut NodeArena, decl: NodeId) {
    for g in gotos_in(arena, decl) {
        let label = match arena.kind(g) {
            NodeKind::Goto { label } => label.clone(),
            _ => continue,
        };
        let var = arena.add_ident(DISPATCH_VAR);
        let value = arena.add_ident(label);
        let assign = arena.add_assign(var, value);
        let set_stmt = arena.add_expr_stmt(assign);
        let cont = arena.add_continue(Some(GOTO_LOOP_LABEL.to_string()));
        if arena.list_position(g).is_some() {
            arena.insert_before(g, set_stmt);
            arena.replace(g, cont);
        } else {
            let block = arena.add_block(vec![set_stmt, cont]);
            arena.replace(g, block);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn emit(arena: &mut NodeArena, n: i64) -> NodeId {
        let callee = arena.add_ident("emit");
        let arg = arena.add_int(n);
        let call = arena.add_call(callee, vec![arg]);
        arena.add_expr_stmt(call)
    }

    fn method_with_body(arena: &mut NodeArena, stmts: Vec<NodeId>) -> NodeId {
        let body = arena.add_block(stmts);
        arena.add_method("run", Ty::Prim(Prim::Void), vec![], Some(body))
    }

    fn body_of(arena: &NodeArena, method: NodeId) -> NodeId {
        match arena.kind(method) {
            NodeKind::Method { body: Some(b), .. } => *b,
            other => panic!("unexpected kind {other:?}"),
        }
    }

    #[test]
    fn forward_goto_becomes_dispatch_loop() {
        let mut arena = NodeArena::new();
        let s1 = emit(&mut arena, 1);
        let g = arena.add_goto("skip");
        let l = arena.add_label("skip");
        let s2 = emit(&mut arena, 2);
        let m = method_with_body(&mut arena, vec![s1, g, l, s2]);

        create_goto_loop(&mut arena, m);
        rewrite_gotos(&mut arena, m);

        let body = body_of(&arena, m);
        let stmts = arena.primary_list(body).unwrap().clone();
        assert_eq!(stmts.len(), 4);
        assert!(
            matches!(arena.kind(stmts[0]), NodeKind::VarDecl { name, .. } if name == "skip")
        );
        assert!(
            matches!(arena.kind(stmts[1]), NodeKind::VarDecl { name, .. } if name == DISPATCH_VAR)
        );
        assert!(
            matches!(arena.kind(stmts[2]), NodeKind::Label { name } if name == GOTO_LOOP_LABEL)
        );
        let NodeKind::While { body: loop_body, .. } = arena.kind(stmts[3]) else {
            panic!("expected dispatch loop");
        };
        let dispatch = arena.primary_list(*loop_body).unwrap()[0];
        let NodeKind::Switch { sections, .. } = arena.kind(dispatch) else {
            panic!("expected dispatch switch");
        };
        assert_eq!(sections.len(), 2);

        // Group 0 is the default section and ends in the rewritten goto.
        let default_sec = sections[0];
        let NodeKind::SwitchSection { labels, stmts } = arena.kind(default_sec) else {
            panic!("expected section");
        };
        assert_eq!(labels, &vec![None]);
        assert!(matches!(
            arena.kind(*stmts.last().unwrap()),
            NodeKind::Continue { target: Some(t) } if t == GOTO_LOOP_LABEL
        ));

        // Group 1 carries ordinal 1 and falls out of the loop.
        let labeled_sec = sections[1];
        let NodeKind::SwitchSection { labels, stmts } = arena.kind(labeled_sec) else {
            panic!("expected section");
        };
        assert!(
            matches!(arena.kind(labels[0].unwrap()), NodeKind::Int(1))
        );
        assert!(matches!(
            arena.kind(*stmts.last().unwrap()),
            NodeKind::Break { target: Some(t) } if t == GOTO_LOOP_LABEL
        ));
    }

    #[test]
    fn labels_move_out_of_try() {
        let mut arena = NodeArena::new();
        let l = arena.add_label("retry");
        let s = emit(&mut arena, 1);
        let try_body = arena.add_block(vec![l, s]);
        let catch_body = arena.add_block(vec![]);
        let catch = arena.add_catch_clause(None, None, catch_body);
        let t = arena.add_try(try_body, vec![catch], None);
        let g = arena.add_goto("retry");
        let m = method_with_body(&mut arena, vec![t, g]);

        move_labels_out_of_try(&mut arena, m);

        let body = body_of(&arena, m);
        let stmts = arena.primary_list(body).unwrap().clone();
        assert_eq!(stmts, vec![l, t, g]);
        assert!(!has_bad_labels(&arena, m));
    }

    #[test]
    fn plain_breaks_get_loop_labels() {
        let mut arena = NodeArena::new();
        let brk = arena.add_break(None);
        let loop_body = arena.add_block(vec![brk]);
        let cond = arena.add_bool(true);
        let w = arena.add_while(cond, loop_body);
        let m = method_with_body(&mut arena, vec![w]);

        let mut pass = GotoRemoval::new();
        pass.label_loops(&mut arena, m);

        let body = body_of(&arena, m);
        let stmts = arena.primary_list(body).unwrap().clone();
        assert_eq!(stmts.len(), 2);
        let NodeKind::Label { name } = arena.kind(stmts[0]) else {
            panic!("expected synthesized loop label");
        };
        assert_eq!(
            *arena.kind(brk),
            NodeKind::Break {
                target: Some(name.clone())
            }
        );
    }

    #[test]
    fn break_inside_switch_is_not_annotated() {
        let mut arena = NodeArena::new();
        let brk = arena.add_break(None);
        let case0 = arena.add_int(0);
        let sec = arena.add_switch_section(vec![Some(case0)], vec![brk]);
        let scrut = arena.add_ident("x");
        let sw = arena.add_switch(scrut, vec![sec]);
        let m = method_with_body(&mut arena, vec![sw]);

        let mut pass = GotoRemoval::new();
        pass.label_loops(&mut arena, m);

        assert_eq!(*arena.kind(brk), NodeKind::Break { target: None });
    }

    #[test]
    fn redundant_goto_to_next_label_is_dropped() {
        let mut arena = NodeArena::new();
        let g = arena.add_goto("next");
        let l = arena.add_label("next");
        let s = emit(&mut arena, 1);
        let m = method_with_body(&mut arena, vec![g, l, s]);

        remove_redundant_gotos(&mut arena, m);

        let body = body_of(&arena, m);
        assert_eq!(arena.primary_list(body).unwrap().clone(), vec![l, s]);
    }

    #[test]
    fn statements_after_a_jump_are_unreachable() {
        let mut arena = NodeArena::new();
        let g = arena.add_goto("out");
        let dead1 = emit(&mut arena, 1);
        let dead2 = emit(&mut arena, 2);
        let l = arena.add_label("out");
        let live = emit(&mut arena, 3);
        let m = method_with_body(&mut arena, vec![g, dead1, dead2, l, live]);

        remove_unreachable_statements(&mut arena, m);

        let body = body_of(&arena, m);
        assert_eq!(arena.primary_list(body).unwrap().clone(), vec![g, l, live]);
    }

    #[test]
    fn short_jump_targets_are_inlined() {
        let mut arena = NodeArena::new();
        // out: emit(9); return;   with a goto jumping to it from inside an if.
        let g = arena.add_goto("out");
        let then_block = arena.add_block(vec![g]);
        let cond = arena.add_bool(true);
        let ifs = arena.add_if(cond, then_block, None);
        let l = arena.add_label("out");
        let tail = emit(&mut arena, 9);
        let ret = arena.add_return(None);
        let m = method_with_body(&mut arena, vec![ifs, l, tail, ret]);

        inline_short_jumps(&mut arena, m);

        assert!(gotos_in(&arena, m).is_empty());
        let body = body_of(&arena, m);
        // Label and its run are gone from the tail.
        assert_eq!(arena.primary_list(body).unwrap().clone(), vec![ifs]);
        // The run was cloned into the goto's place.
        let then_stmts = arena.primary_list(then_block).unwrap().clone();
        assert_eq!(then_stmts.len(), 2);
        assert!(matches!(arena.kind(then_stmts[0]), NodeKind::ExprStmt { .. }));
        assert!(matches!(arena.kind(then_stmts[1]), NodeKind::Return { value: None }));
    }

    #[test]
    fn implicit_fallthrough_goto_is_added() {
        let mut arena = NodeArena::new();
        // a: emit(1); (end of then-block) followed by label b after the if.
        let la = arena.add_label("a");
        let s = emit(&mut arena, 1);
        let then_block = arena.add_block(vec![la, s]);
        let cond = arena.add_bool(true);
        let ifs = arena.add_if(cond, then_block, None);
        let lb = arena.add_label("b");
        let s2 = emit(&mut arena, 2);
        let ga = arena.add_goto("a");
        let gb = arena.add_goto("b");
        let m = method_with_body(&mut arena, vec![ifs, lb, s2, ga, gb]);

        add_implicit_gotos(&mut arena, m);

        let then_stmts = arena.primary_list(then_block).unwrap().clone();
        assert_eq!(then_stmts.len(), 3);
        assert!(
            matches!(arena.kind(then_stmts[2]), NodeKind::Goto { label } if label == "b")
        );
    }
}
