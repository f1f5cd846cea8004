//! Pattern definitions, pattern references and struct types.

use inox_common::FxHashSet;
use inox_syntax::ast::Name;
use inox_syntax::{Node, NodeKind, TraversalAction, Visit};

use super::Checker;
use crate::messages::*;

/// Keys of an object or record literal, `None` for any other value.
fn static_members(value: &Node) -> Option<FxHashSet<String>> {
    match &value.kind {
        NodeKind::Object { properties, .. } | NodeKind::Record { properties } => Some(
            properties
                .iter()
                .filter_map(|prop| match &prop.kind {
                    NodeKind::ObjectProperty { key: Some(key), .. } => Some(key.name.clone()),
                    _ => None,
                })
                .collect(),
        ),
        _ => None,
    }
}

impl<'a> Checker<'a> {
    fn is_top_level(visit: &Visit<'a, '_>) -> bool {
        visit.parent.is_some_and(|p| p.kind.is_module_root())
    }

    /// Definitions are not allowed after the first function declaration or reference.
    fn is_after_first_forbidden_position(&self, visit: &Visit<'a, '_>) -> bool {
        let module = self.module_node(visit).id;
        self.first_forbidden_position(module)
            .is_some_and(|pos| visit.node.span.start >= pos)
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Definitions
    // ═══════════════════════════════════════════════════════════════════════

    pub(super) fn check_pattern_def(&mut self, visit: &Visit<'a, '_>, name: &'a Name, lazy: bool) -> TraversalAction {
        if !Self::is_top_level(visit) {
            self.add_error(visit.node.span, MISPLACED_PATTERN_DEF_NOT_TOP_LEVEL_STMT);
            return TraversalAction::Continue;
        }
        if self.is_after_first_forbidden_position(visit) {
            self.add_error(visit.node.span, MISPLACED_PATTERN_DEF_AFTER_FN_DECL_OR_REF_TO_FN);
        }

        let module = self.module_node(visit).id;
        if self.patterns.get(&module).is_some_and(|p| p.contains(&name.text)) {
            self.add_error(name.span, &fmt_pattern_already_declared(&name.text));
        } else if lazy {
            // lazy patterns can refer to themselves
            self.define_pattern(visit, name);
        }
        TraversalAction::Continue
    }

    pub(super) fn define_pattern(&mut self, visit: &Visit<'a, '_>, name: &Name) {
        let module = self.module_node(visit).id;
        self.patterns.entry(module).or_default().insert(name.text.clone());
    }

    pub(super) fn check_pattern_ns_def(&mut self, visit: &Visit<'a, '_>, name: &'a Name, value: &'a Node) -> TraversalAction {
        if !Self::is_top_level(visit) {
            self.add_error(visit.node.span, MISPLACED_PATTERN_NS_DEF_NOT_TOP_LEVEL_STMT);
            return TraversalAction::Continue;
        }
        if self.is_after_first_forbidden_position(visit) {
            self.add_error(visit.node.span, MISPLACED_PATTERN_NS_DEF_AFTER_FN_DECL_OR_REF_TO_FN);
        }

        let module = self.module_node(visit).id;
        let namespaces = self.pattern_namespaces.entry(module).or_default();
        if namespaces.contains_key(&name.text) {
            self.add_error(name.span, &fmt_pattern_namespace_already_declared(&name.text));
        } else {
            namespaces.insert(name.text.clone(), static_members(value));
        }
        TraversalAction::Continue
    }

    pub(super) fn check_extend(&mut self, visit: &Visit<'a, '_>) -> TraversalAction {
        if !matches!(visit.parent.map(|p| &p.kind), Some(NodeKind::Chunk { .. })) {
            self.add_error(visit.node.span, MISPLACED_EXTEND_STATEMENT_TOP_LEVEL_STMT);
        }
        TraversalAction::Continue
    }

    // ═══════════════════════════════════════════════════════════════════════
    // References
    // ═══════════════════════════════════════════════════════════════════════

    fn is_struct_name(&self, visit: &Visit<'a, '_>, name: &str) -> bool {
        let module = self.module_node(visit).id;
        self.struct_defs.get(&module).is_some_and(|defs| defs.contains_key(name))
    }

    pub(super) fn check_pattern_ident(&mut self, visit: &Visit<'a, '_>, name: &str, unprefixed: bool) -> TraversalAction {
        let node = visit.node;

        if unprefixed && self.is_struct_name(visit, name) {
            let parent = visit.parent.map(|p| &p.kind);
            match parent {
                Some(NodeKind::PointerType { .. } | NodeKind::StructField { .. }) => {}
                Some(NodeKind::New { ty, .. }) if ty.id == node.id => {}
                Some(NodeKind::Param { .. }) => self.add_error(node.span, STRUCT_TYPES_NOT_ALLOWED_AS_PARAMETER_TYPES),
                Some(NodeKind::FnExpr { return_type: Some(ty), .. }) if ty.id == node.id => {
                    self.add_error(node.span, STRUCT_TYPES_NOT_ALLOWED_AS_RETURN_TYPES)
                }
                _ => self.add_error(node.span, MISPLACED_STRUCT_TYPE_NAME),
            }
            return TraversalAction::Continue;
        }

        // undefined struct types are reported by the new expression
        if matches!(visit.parent.map(|p| &p.kind), Some(NodeKind::New { ty, .. }) if ty.id == node.id) {
            return TraversalAction::Continue;
        }

        let module = self.module_node(visit).id;
        if !self.patterns.get(&module).is_some_and(|p| p.contains(name)) {
            self.add_error(node.span, &fmt_pattern_is_not_declared(name));
        }
        TraversalAction::Continue
    }

    pub(super) fn check_pattern_ns_ident(&mut self, visit: &Visit<'a, '_>, name: &str) -> TraversalAction {
        let module = self.module_node(visit).id;
        let declared = self
            .pattern_namespaces
            .get(&module)
            .is_some_and(|namespaces| namespaces.contains_key(name));
        if !declared {
            self.add_error(visit.node.span, &fmt_pattern_namespace_is_not_declared(name));
        }
        TraversalAction::Continue
    }

    pub(super) fn check_pattern_ns_member(&mut self, visit: &Visit<'a, '_>, namespace: &Name, member: &Name) -> TraversalAction {
        let module = self.module_node(visit).id;
        let members = self
            .pattern_namespaces
            .get(&module)
            .and_then(|namespaces| namespaces.get(&namespace.text));

        match members {
            None => self.add_error(namespace.span, &fmt_pattern_namespace_is_not_declared(&namespace.text)),
            Some(Some(members)) if !members.contains(&member.text) => {
                let text = fmt_pattern_namespace_does_not_have_member(&namespace.text, &member.text);
                self.add_error(member.span, &text);
            }
            Some(_) => {}
        }
        TraversalAction::Continue
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Types
    // ═══════════════════════════════════════════════════════════════════════

    pub(super) fn check_readonly(&mut self, visit: &Visit<'a, '_>) -> TraversalAction {
        if !matches!(visit.parent.map(|p| &p.kind), Some(NodeKind::Param { .. })) {
            self.add_error(visit.node.span, MISPLACED_READONLY_PATTERN_EXPRESSION);
        }
        TraversalAction::Continue
    }

    pub(super) fn check_pointer_type(&mut self, visit: &Visit<'a, '_>, value: &'a Node) -> TraversalAction {
        let node = visit.node;
        let names_struct = matches!(
            &value.kind,
            NodeKind::PatternIdent { name, .. } if self.is_struct_name(visit, name)
        );
        if !names_struct {
            self.add_error(value.span, A_STRUCT_TYPE_IS_EXPECTED_AFTER_THE_STAR);
        }

        let well_placed = match visit.parent.map(|p| &p.kind) {
            Some(
                NodeKind::Param { .. }
                | NodeKind::StructField { .. }
                | NodeKind::LocalVarDecl { .. }
                | NodeKind::GlobalVarDecl { .. },
            ) => true,
            Some(NodeKind::FnExpr { return_type, .. }) => return_type.as_ref().is_some_and(|ty| ty.id == node.id),
            _ => false,
        };
        if !well_placed {
            self.add_error(node.span, MISPLACED_POINTER_TYPE);
        }
        TraversalAction::Continue
    }

    pub(super) fn check_new(&mut self, visit: &Visit<'a, '_>, ty: &'a Node) -> TraversalAction {
        match &ty.kind {
            NodeKind::PatternIdent { name, unprefixed: true } => {
                if !self.is_struct_name(visit, name) {
                    self.add_error(ty.span, &fmt_struct_type_is_not_defined(name));
                }
            }
            _ => self.add_error(ty.span, A_STRUCT_TYPE_NAME_IS_EXPECTED),
        }
        TraversalAction::Continue
    }

    pub(super) fn check_runtime_type_check(&mut self, visit: &Visit<'a, '_>) -> TraversalAction {
        let node = visit.node;
        let is_argument = matches!(
            visit.parent.map(|p| &p.kind),
            Some(NodeKind::Call { args, .. }) if args.iter().any(|arg| arg.id == node.id)
        );
        if !is_argument {
            self.add_error(node.span, MISPLACED_RUNTIME_TYPECHECK_EXPRESSION);
        }
        TraversalAction::Continue
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use inox_syntax::parse;

    #[test]
    fn test_static_members() {
        let (chunk, errors) = parse("pnamespace ns. = {a: %int, b: %str}");
        assert!(errors.is_empty());
        let NodeKind::PatternNsDef { value, .. } = &chunk.statements()[0].kind else {
            panic!("expected a pattern namespace definition");
        };
        let members = static_members(value).unwrap();
        assert!(members.contains("a") && members.contains("b"));
        assert_eq!(members.len(), 2);
    }
}
