//! Loops, matches and the placement of control flow statements.

use inox_module::ModuleKind;
use inox_syntax::ast::Name;
use inox_syntax::{Node, NodeKind, TraversalAction, Visit};

use super::{Checker, LocalVarInfo};
use crate::messages::*;

/// Nodes that do not interrupt the search for an enclosing loop.
fn is_transparent(node: &Node) -> bool {
    matches!(
        node.kind,
        NodeKind::Block { .. }
            | NodeKind::If { .. }
            | NodeKind::SwitchCase { .. }
            | NodeKind::MatchCase { .. }
            | NodeKind::DefaultCase { .. }
            | NodeKind::Switch { .. }
            | NodeKind::Match { .. }
    )
}

/// The closest ancestor that is not transparent.
fn closest_non_transparent<'a>(visit: &Visit<'a, '_>, accept_switch: bool) -> Option<&'a Node> {
    visit.ancestors.iter().rev().copied().find(|a| {
        let switch_like = matches!(a.kind, NodeKind::Switch { .. } | NodeKind::Match { .. });
        (accept_switch && switch_like) || !is_transparent(a)
    })
}

impl<'a> Checker<'a> {
    // ═══════════════════════════════════════════════════════════════════════
    // Loop and case variables
    // ═══════════════════════════════════════════════════════════════════════

    pub(super) fn check_for(&mut self, visit: &Visit<'a, '_>, key: Option<&'a Name>, value: Option<&'a Name>) -> TraversalAction {
        self.store_scope_locals(visit);
        if let Some(key) = key {
            self.declare_loop_var(visit, key, true);
        }
        if let Some(value) = value {
            self.declare_loop_var(visit, value, false);
        }
        TraversalAction::Continue
    }

    pub(super) fn check_walk(&mut self, visit: &Visit<'a, '_>, meta: Option<&'a Name>, entry: Option<&'a Name>) -> TraversalAction {
        self.store_scope_locals(visit);
        for name in meta.into_iter().chain(entry) {
            self.declare_loop_var(visit, name, true);
        }
        TraversalAction::Continue
    }

    /// Shell variables can be shadowed by loop variables, other locals cannot.
    fn declare_loop_var(&mut self, visit: &Visit<'a, '_>, name: &'a Name, may_shadow_shell_var: bool) {
        let scope = self.scope_node(visit).id;
        let module = self.module_node(visit).id;

        let shadows_local = self.local(scope, &name.text).is_some()
            && !(may_shadow_shell_var && self.shell_locals.contains(&name.text));
        if shadows_local {
            self.add_error(name.span, &fmt_cannot_shadow_local_variable(&name.text));
        } else if self.global(module, &name.text).is_some() {
            self.add_error(name.span, &fmt_cannot_shadow_global_variable(&name.text));
        } else {
            self.locals_mut(scope).insert(name.text.clone(), LocalVarInfo::default());
        }
    }

    pub(super) fn check_match_case(&mut self, visit: &Visit<'a, '_>, group_var: Option<&'a Name>) -> TraversalAction {
        let Some(group_var) = group_var else {
            return TraversalAction::Continue;
        };
        let scope = self.scope_node(visit).id;
        let module = self.module_node(visit).id;

        if self.global(module, &group_var.text).is_some() {
            self.add_error(group_var.span, &fmt_cannot_shadow_global_variable(&group_var.text));
            return TraversalAction::Continue;
        }
        match self.local(scope, &group_var.text) {
            Some(info) if !info.is_group_var => {
                self.add_error(group_var.span, &fmt_cannot_shadow_local_variable(&group_var.text));
            }
            _ => {
                self.locals_mut(scope)
                    .insert(group_var.text.clone(), LocalVarInfo { is_group_var: true });
            }
        }
        TraversalAction::Continue
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Jumps
    // ═══════════════════════════════════════════════════════════════════════

    pub(super) fn check_break_or_continue(&mut self, visit: &Visit<'a, '_>) -> TraversalAction {
        let is_break = matches!(visit.node.kind, NodeKind::Break);
        let target = closest_non_transparent(visit, is_break);

        let ok = match target.map(|t| &t.kind) {
            Some(NodeKind::For { .. } | NodeKind::Walk { .. }) => true,
            Some(NodeKind::Switch { .. } | NodeKind::Match { .. }) => is_break,
            _ => false,
        };
        if !ok {
            let text = if is_break {
                BREAK_STMTS_ONLY_ALLOWED_LOCATION
            } else {
                CONTINUE_STMTS_ONLY_ALLOWED_IN_BODY_FOR_OR_WALK_STMT
            };
            self.add_error(visit.node.span, text);
        }
        TraversalAction::Continue
    }

    pub(super) fn check_yield(&mut self, visit: &Visit<'a, '_>) -> TraversalAction {
        let target = closest_non_transparent(visit, false);
        if !matches!(target.map(|t| &t.kind), Some(NodeKind::ForExpr { .. } | NodeKind::WalkExpr { .. })) {
            self.add_error(visit.node.span, YIELD_STMTS_ONLY_ALLOWED_IN_BODY_FOR_WALK_EXPR);
        }
        TraversalAction::Continue
    }

    pub(super) fn check_prune(&mut self, visit: &Visit<'a, '_>) -> TraversalAction {
        let target = closest_non_transparent(visit, false);
        if !matches!(target.map(|t| &t.kind), Some(NodeKind::Walk { .. } | NodeKind::WalkExpr { .. })) {
            self.add_error(visit.node.span, PRUNE_STMTS_ARE_ONLY_ALLOWED_IN_WALK_STMTS_AND_EXPRS);
        }
        TraversalAction::Continue
    }

    /// Return statements are allowed in functions and in module bodies, not
    /// in expression bodies.
    pub(super) fn check_return(&mut self, visit: &Visit<'a, '_>) -> TraversalAction {
        for ancestor in visit.ancestors.iter().rev() {
            match &ancestor.kind {
                NodeKind::FnExpr { .. } | NodeKind::Chunk { .. } | NodeKind::EmbeddedModule { .. } => {
                    return TraversalAction::Continue;
                }
                NodeKind::ForExpr { .. } | NodeKind::WalkExpr { .. } => break,
                kind if kind.is_scope_container() => break,
                _ => {}
            }
        }
        self.add_error(visit.node.span, MISPLACED_RETURN_STATEMENT);
        TraversalAction::Continue
    }

    pub(super) fn check_coyield(&mut self, visit: &Visit<'a, '_>) -> TraversalAction {
        let scope = self.scope_node(visit);
        let ok = match &scope.kind {
            NodeKind::EmbeddedModule { .. } => true,
            _ => scope.id == self.root.id && self.module_kind.is_embedded(),
        };
        if !ok {
            self.add_error(visit.node.span, MISPLACE_COYIELD_STATEMENT_ONLY_ALLOWED_IN_EMBEDDED_MODULES);
        }
        TraversalAction::Continue
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Tests
    // ═══════════════════════════════════════════════════════════════════════

    pub(super) fn check_test_suite(&mut self, visit: &Visit<'a, '_>, is_statement: bool) -> TraversalAction {
        let in_test_case = visit
            .ancestors
            .iter()
            .any(|a| matches!(a.kind, NodeKind::TestCase { .. }));
        if is_statement && in_test_case {
            self.add_error(visit.node.span, TEST_SUITE_STMTS_NOT_ALLOWED_INSIDE_TEST_CASE_STMTS);
        }
        TraversalAction::Continue
    }

    pub(super) fn check_test_case(&mut self, visit: &Visit<'a, '_>, is_statement: bool) -> TraversalAction {
        if !is_statement {
            return TraversalAction::Continue;
        }
        let module = self.module_node(visit);
        let in_suite = match self.parent_of_module(visit, module) {
            Some(parent) => matches!(parent.kind, NodeKind::TestSuite { .. }),
            None => {
                module.id == self.root.id
                    && (self.module_kind.is_test_module() || self.module_kind == ModuleKind::Spec)
            }
        };

        if !in_suite {
            self.add_error(visit.node.span, TEST_CASE_STMTS_NOT_ALLOWED_OUTSIDE_OF_TEST_SUITES);
        } else if module
            .statements()
            .iter()
            .any(|stmt| matches!(stmt.kind, NodeKind::TestSuite { is_statement: true, .. }))
        {
            self.add_error(visit.node.span, TEST_CASES_NOT_ALLOWED_IF_SUBSUITES_ARE_PRESENT);
        }
        TraversalAction::Continue
    }

    /// The node holding the module node `module`, `None` for the root.
    pub(super) fn parent_of_module(&self, visit: &Visit<'a, '_>, module: &'a Node) -> Option<&'a Node> {
        let index = visit.ancestors.iter().position(|a| a.id == module.id)?;
        index.checked_sub(1).map(|i| visit.ancestors[i])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use inox_common::Span;

    #[test]
    fn test_transparent_nodes() {
        let block = Node::new(NodeKind::Block { statements: vec![] }, Span::dummy());
        let break_stmt = Node::new(NodeKind::Break, Span::dummy());
        assert!(is_transparent(&block));
        assert!(!is_transparent(&break_stmt));
    }
}
