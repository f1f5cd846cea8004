//! Variable references, `self` and `sendval`.

use inox_syntax::{Node, NodeKind, TraversalAction, Visit};

use super::Checker;
use crate::globals::GlobalVarInfo;
use crate::messages::*;

/// Where a `self` expression gets its value from.
#[derive(Debug, Clone, Copy)]
enum SelfContext<'a> {
    /// A method, a reception handler or a metaproperty initialization block
    /// of an object literal.
    Object(&'a Node),
    ExtensionMethod,
    /// A property of an extension object, outside any function.
    ExtensionObject,
    StructMethod,
}

fn self_context<'a>(ancestors: &[&'a Node]) -> Option<SelfContext<'a>> {
    for i in (0..ancestors.len()).rev() {
        match &ancestors[i].kind {
            NodeKind::FnExpr { .. } => return method_context(ancestors, i),
            NodeKind::ReceptionHandler { .. } => {
                let object = ancestors[i.checked_sub(1)?];
                return matches!(object.kind, NodeKind::Object { .. }).then_some(SelfContext::Object(object));
            }
            NodeKind::Extend { extension, .. } => {
                let in_extension = ancestors.get(i + 1).is_some_and(|n| n.id == extension.id);
                return in_extension.then_some(SelfContext::ExtensionObject);
            }
            NodeKind::InitializationBlock { .. } => {
                let meta = ancestors[i.checked_sub(1)?];
                let object = ancestors[i.checked_sub(2)?];
                let in_object = matches!(meta.kind, NodeKind::MetaProperty { .. })
                    && matches!(object.kind, NodeKind::Object { .. });
                return in_object.then_some(SelfContext::Object(object));
            }
            kind if kind.is_scope_container() => return None,
            _ => {}
        }
    }
    None
}

/// Context of the function expression at `fn_index` in `ancestors`.
fn method_context<'a>(ancestors: &[&'a Node], fn_index: usize) -> Option<SelfContext<'a>> {
    let holder = fn_index.checked_sub(1)?;
    match &ancestors[holder].kind {
        NodeKind::FnDecl { .. } => {
            let def = ancestors[holder.checked_sub(1)?];
            matches!(def.kind, NodeKind::StructDef { .. }).then_some(SelfContext::StructMethod)
        }
        NodeKind::ReceptionHandler { .. } => {
            let object = ancestors[holder.checked_sub(1)?];
            matches!(object.kind, NodeKind::Object { .. }).then_some(SelfContext::Object(object))
        }
        NodeKind::ObjectProperty { .. } => {
            let object_index = holder.checked_sub(1)?;
            let object = ancestors[object_index];
            if !matches!(object.kind, NodeKind::Object { .. }) {
                return None;
            }
            let extended = object_index
                .checked_sub(1)
                .map(|i| ancestors[i])
                .is_some_and(|a| matches!(&a.kind, NodeKind::Extend { extension, .. } if extension.id == object.id));
            if extended {
                Some(SelfContext::ExtensionMethod)
            } else {
                Some(SelfContext::Object(object))
            }
        }
        _ => None,
    }
}

impl<'a> Checker<'a> {
    // ═══════════════════════════════════════════════════════════════════════
    // Variables
    // ═══════════════════════════════════════════════════════════════════════

    /// Rejects variables in pattern definitions, extensions and struct fields.
    fn check_variable_context(&mut self, visit: &Visit<'a, '_>) -> bool {
        for ancestor in visit.ancestors.iter().rev() {
            match &ancestor.kind {
                NodeKind::FnExpr { .. } | NodeKind::Chunk { .. } | NodeKind::EmbeddedModule { .. } => return true,
                NodeKind::Extend { .. } | NodeKind::PatternDef { .. } | NodeKind::PatternNsDef { .. } => {
                    self.add_error(visit.node.span, VARS_NOT_ALLOWED_IN_PATTERN_AND_EXTENSION_OBJECT_PROPERTIES);
                    return false;
                }
                NodeKind::StructDef { .. } => {
                    self.add_error(visit.node.span, VARS_CANNOT_BE_USED_IN_STRUCT_FIELD_DEFS);
                    return false;
                }
                _ => {}
            }
        }
        true
    }

    fn check_name_length(&mut self, visit: &Visit<'a, '_>, name: &str) -> bool {
        if name.len() > MAX_NAME_BYTE_LEN {
            self.add_error(visit.node.span, &fmt_name_is_too_long(name));
            return false;
        }
        true
    }

    /// The node is the left side of an assignment, checked with the assignment.
    fn is_assigned(visit: &Visit<'a, '_>) -> bool {
        matches!(
            visit.parent.map(|p| &p.kind),
            Some(NodeKind::Assignment { left, .. }) if left.id == visit.node.id
        )
    }

    /// `$name`: a local of the closest scope.
    pub(super) fn check_variable(&mut self, visit: &Visit<'a, '_>, name: &str) -> TraversalAction {
        if name.is_empty() || Self::is_assigned(visit) {
            return TraversalAction::Continue;
        }
        if !self.check_name_length(visit, name) || !self.check_variable_context(visit) {
            return TraversalAction::Continue;
        }
        let scope = self.scope_node(visit).id;
        if self.local(scope, name).is_none() {
            self.add_error(visit.node.span, &fmt_var_is_not_declared(name));
        }
        TraversalAction::Continue
    }

    /// `$$name`: a global of the closest module.
    pub(super) fn check_global_variable(&mut self, visit: &Visit<'a, '_>, name: &str) -> TraversalAction {
        if !self.check_name_length(visit, name) {
            return TraversalAction::Continue;
        }
        if Self::is_assigned(visit) || !self.check_variable_context(visit) {
            return TraversalAction::Continue;
        }

        let module = self.module_node(visit).id;
        match self.global(module, name) {
            Some(info) => self.record_global_use(visit, name, info),
            None => self.add_error(visit.node.span, &fmt_var_is_not_declared(name)),
        }
        TraversalAction::Continue
    }

    /// A bare name: a local of the closest scope or a global of the closest module.
    pub(super) fn check_ident(&mut self, visit: &Visit<'a, '_>, name: &str) -> TraversalAction {
        if Self::is_assigned(visit) || !self.check_name_length(visit, name) || !self.check_variable_context(visit) {
            return TraversalAction::Continue;
        }

        if !self.var_exists(visit, name) {
            let text = if name == "const" {
                VAR_CONST_NOT_DECLARED_IF_YOU_MEANT_TO_DECLARE_CONSTANTS.to_string()
            } else {
                fmt_var_is_not_declared(name)
            };
            self.add_error(visit.node.span, &text);
            return TraversalAction::Continue;
        }

        let scope = self.scope_node(visit).id;
        if self.local(scope, name).is_none() {
            if let Some(info) = self.global(self.module_node(visit).id, name) {
                self.record_global_use(visit, name, info);
            }
        }
        TraversalAction::Continue
    }

    /// Updates the hoisting boundary and the capture sets after a global is read.
    fn record_global_use(&mut self, visit: &Visit<'a, '_>, name: &str, info: GlobalVarInfo) {
        let module = self.module_node(visit);

        if let Some(decl_module) = self.fn_decl(module.id, name).map(|decl| decl.module) {
            if self.first_forbidden_position(decl_module).is_none() {
                let stmt = self.top_level_statement(visit, module);
                self.data.first_forbidden_positions.insert(decl_module, stmt.span.start);
            }
        }

        let mut mapping_recorded = false;
        for ancestor in visit.ancestors.iter().rev() {
            match &ancestor.kind {
                NodeKind::Chunk { .. } | NodeKind::EmbeddedModule { .. } => break,
                NodeKind::FnExpr { .. } => {
                    self.data.add_fn_captured_global(ancestor.id, name, info.fn_expr);
                    if let Some(captured_fn) = info.fn_expr {
                        self.capture_edges.push((ancestor.id, captured_fn));
                    }
                }
                NodeKind::Mapping { .. } if !mapping_recorded => {
                    self.data.add_mapping_referenced_global(ancestor.id, name);
                    mapping_recorded = true;
                }
                _ => {}
            }
        }
    }

    /// The statement of `module` that contains the visited node.
    fn top_level_statement(&self, visit: &Visit<'a, '_>, module: &'a Node) -> &'a Node {
        visit
            .ancestors
            .iter()
            .position(|a| a.id == module.id)
            .and_then(|index| visit.ancestors.get(index + 1))
            .copied()
            .unwrap_or(visit.node)
    }

    // ═══════════════════════════════════════════════════════════════════════
    // self and sendval
    // ═══════════════════════════════════════════════════════════════════════

    pub(super) fn check_self(&mut self, visit: &Visit<'a, '_>) -> TraversalAction {
        let node = visit.node;
        match self_context(visit.ancestors) {
            None => self.add_error(node.span, SELF_ACCESSIBILITY_EXPLANATION),
            Some(SelfContext::Object(object)) => {
                let Some(NodeKind::Member { left, property }) = visit.parent.map(|p| &p.kind) else {
                    return TraversalAction::Continue;
                };
                let known = self
                    .properties
                    .get(&object.id)
                    .map_or(true, |props| props.contains(&property.text));
                if left.id == node.id && !known {
                    self.add_error(property.span, &fmt_object_does_not_have_prop(&property.text));
                }
            }
            Some(_) => {}
        }
        TraversalAction::Continue
    }

    pub(super) fn check_sendval(&mut self, visit: &Visit<'a, '_>) -> TraversalAction {
        match self_context(visit.ancestors) {
            Some(SelfContext::Object(_) | SelfContext::ExtensionMethod) => {}
            _ => self.add_error(visit.node.span, MISPLACED_SENDVAL_EXPR),
        }
        TraversalAction::Continue
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use inox_syntax::{find_nodes, parse};

    fn context_of_self(source: &str) -> Option<&'static str> {
        let (chunk, errors) = parse(source);
        assert!(errors.is_empty(), "{:?}", errors);
        let mut result = None;
        inox_syntax::walk(
            &chunk,
            &mut inox_syntax::FnVisitor(|visit: &Visit<'_, '_>| {
                if matches!(visit.node.kind, NodeKind::SelfExpr) {
                    result = Some(match self_context(visit.ancestors) {
                        None => "none",
                        Some(SelfContext::Object(_)) => "object",
                        Some(SelfContext::ExtensionMethod) => "extension-method",
                        Some(SelfContext::ExtensionObject) => "extension-object",
                        Some(SelfContext::StructMethod) => "struct-method",
                    });
                }
                TraversalAction::Continue
            }),
        );
        assert!(!find_nodes(&chunk, |n| matches!(n.kind, NodeKind::SelfExpr)).is_empty());
        result
    }

    #[test]
    fn test_self_contexts() {
        assert_eq!(context_of_self("$o = {a: 1, f: fn() { return self.a }}"), Some("object"));
        assert_eq!(context_of_self("extend %p {f: fn() { return self }}"), Some("extension-method"));
        assert_eq!(context_of_self("struct S {\n  fn m() { return self }\n}"), Some("struct-method"));
        assert_eq!(context_of_self("fn f() { return self }"), Some("none"));
        assert_eq!(context_of_self("$o = {a: 1, _init_ {\n  $x = self.a\n}}"), Some("object"));
    }
}
