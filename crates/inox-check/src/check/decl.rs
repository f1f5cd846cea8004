//! Declarations, assignments and hoisting.

use inox_common::{FxHashSet, PositionStack};
use inox_syntax::ast::{AssignOp, Name};
use inox_syntax::{walk, FnVisitor, Node, NodeKind, ParsedChunk, TraversalAction, Visit};

use super::{is_metadata_key, Checker, FnDeclInfo, LocalVarInfo};
use crate::error::StaticCheckError;
use crate::globals::{GlobalVarInfo, USABLE_GLOBALS_IN_CONST_DECLS};
use crate::messages::*;

impl<'a> Checker<'a> {
    // ═══════════════════════════════════════════════════════════════════════
    // Before the walk
    // ═══════════════════════════════════════════════════════════════════════

    /// Registers the struct types of `module` and of the chunks it includes.
    pub(super) fn define_structs(&mut self, module: &'a Node) {
        let prefix = self.location_prefix.clone();
        self.define_structs_of(module.id, module.statements(), self.chunk, prefix);
    }

    fn define_structs_of(
        &mut self,
        module: inox_syntax::NodeId,
        statements: &'a [Node],
        chunk: &'a ParsedChunk,
        prefix: PositionStack,
    ) {
        for stmt in statements {
            match &stmt.kind {
                NodeKind::StructDef { name, .. } => {
                    let defs = self.struct_defs.entry(module).or_default();
                    if defs.contains_key(&name.text) {
                        let mut location = prefix.clone();
                        location.push(chunk.position(name.span));
                        let text = fmt_invalid_struct_def_already_declared(&name.text);
                        self.data.errors.push(StaticCheckError::new(&text, location));
                    } else {
                        let ordinal = defs.len();
                        defs.insert(name.text.clone(), ordinal);
                    }
                }
                NodeKind::InclusionImport { .. } => {
                    let Some(included) = self.module.and_then(|m| m.inclusion_statements.get(&stmt.id)) else {
                        continue;
                    };
                    let mut location = prefix.clone();
                    location.push(chunk.position(stmt.span));
                    self.define_structs_of(module, included.chunk.node.statements(), &included.chunk, location);
                }
                _ => {}
            }
        }
    }

    /// Validates includable chunks and hoists functions that capture nothing.
    pub(super) fn precheck_top_level_statements(&mut self, module: &'a Node) {
        let includable = matches!(module.kind, NodeKind::Chunk { includable: true, .. });

        for stmt in module.statements() {
            match &stmt.kind {
                NodeKind::FnDecl { name, function } => self.precheck_fn_decl(module, stmt, name, function),
                NodeKind::GlobalConstDecls { .. }
                | NodeKind::PatternDef { .. }
                | NodeKind::PatternNsDef { .. }
                | NodeKind::Extend { .. }
                | NodeKind::StructDef { .. }
                | NodeKind::InclusionImport { .. } => {}
                // reported when the import is checked
                NodeKind::Import { .. } => {}
                _ if stmt.kind.is_simple_value_literal() => {}
                _ if includable => self.add_error(stmt.span, AN_INCLUDABLE_FILE_CAN_ONLY_CONTAIN_DEFINITIONS),
                _ => {}
            }
        }
    }

    fn precheck_fn_decl(&mut self, module: &'a Node, stmt: &'a Node, name: &'a Name, function: &'a Node) {
        let NodeKind::FnExpr { captures, .. } = &function.kind else {
            return;
        };
        // functions with captures are declared when they are reached
        if !captures.is_empty() {
            return;
        }
        if self.fn_decl(module.id, &name.text).is_some() || self.global(module.id, &name.text).is_some() {
            self.add_error(stmt.span, &fmt_invalid_fn_decl_already_declared(&name.text));
            return;
        }

        self.globals_mut(module.id)
            .insert(name.text.clone(), GlobalVarInfo::function(function.id));
        self.data
            .functions_to_declare_early
            .entry(module.id)
            .or_default()
            .push(stmt.id);
        self.fn_decls.entry(module.id).or_default().insert(
            name.text.clone(),
            FnDeclInfo {
                decl: stmt.id,
                module: module.id,
                captured_locals: Vec::new(),
            },
        );
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Functions
    // ═══════════════════════════════════════════════════════════════════════

    pub(super) fn check_fn_decl(&mut self, visit: &Visit<'a, '_>, name: &'a Name, function: &'a Node) -> TraversalAction {
        let node = visit.node;
        let Some(parent) = visit.parent else {
            return TraversalAction::Continue;
        };

        match &parent.kind {
            NodeKind::Chunk { .. } | NodeKind::EmbeddedModule { .. } => {}
            NodeKind::StructDef { .. } => return TraversalAction::Continue,
            _ => {
                self.add_error(node.span, INVALID_FN_DECL_SHOULD_BE_TOP_LEVEL_STMT);
                return TraversalAction::Continue;
            }
        }

        let module = parent.id;
        let NodeKind::FnExpr { captures, .. } = &function.kind else {
            return TraversalAction::Continue;
        };

        if captures.is_empty() {
            match self.fn_decl(module, &name.text).map(|info| info.decl) {
                Some(decl) if decl == node.id => {
                    self.data
                        .first_forbidden_positions
                        .entry(module)
                        .or_insert(node.span.start);
                }
                Some(_) => {}
                // Name clash, reported by the precheck.
                None if self.global(module, &name.text).is_some() => {}
                None => self.add_error(node.span, FN_NOT_PRECHECKED),
            }
            return TraversalAction::Continue;
        }

        if self.fn_decl(module, &name.text).is_some() || self.global(module, &name.text).is_some() {
            self.add_error(node.span, &fmt_invalid_fn_decl_already_declared(&name.text));
            return TraversalAction::Continue;
        }

        let mut captured_locals = Vec::new();
        for capture in captures {
            if self.local(module, &capture.text).is_some() {
                captured_locals.push(capture.text.clone());
            } else if self.global(module, &capture.text).is_none() {
                self.add_error(
                    capture.span,
                    &fmt_invalid_or_misplaced_fn_decl_should_be_after_captured_var_declaration(&capture.text),
                );
            }
        }

        let info = FnDeclInfo {
            decl: node.id,
            module,
            captured_locals,
        };
        tracing::trace!(function = %name.text, captured = ?info.captured_locals, "function with captured locals");
        self.fn_decls.entry(module).or_default().insert(name.text.clone(), info);
        self.globals_mut(module)
            .insert(name.text.clone(), GlobalVarInfo::function(function.id));
        TraversalAction::Continue
    }

    pub(super) fn check_fn_expr(&mut self, visit: &Visit<'a, '_>, captures: &'a [Name], params: &'a [Node]) -> TraversalAction {
        let node = visit.node;
        let module = self.module_node(visit).id;
        let is_declared_fn = matches!(visit.parent.map(|p| &p.kind), Some(NodeKind::FnDecl { .. }));

        let mut fn_locals = super::Locals::default();

        for capture in captures {
            let name = &capture.text;
            if fn_locals.contains_key(name) {
                self.add_error(capture.span, &fmt_var_is_already_captured(name));
                continue;
            }
            if !is_declared_fn {
                if !self.var_exists(visit, name) {
                    self.add_error(capture.span, &fmt_var_is_not_declared(name));
                    continue;
                }
                if self.local(self.scope_node(visit).id, name).is_none() {
                    self.add_error(capture.span, &fmt_cannot_pass_global_to_function(name));
                    continue;
                }
            }
            fn_locals.insert(name.clone(), LocalVarInfo::default());
        }

        for param in params {
            let NodeKind::Param { name, .. } = &param.kind else {
                continue;
            };
            if self.global(module, &name.text).is_some() {
                self.add_error(param.span, &fmt_parameter_cannot_shadow_global_variable(&name.text));
                self.locals.insert(node.id, fn_locals);
                return TraversalAction::Continue;
            }
            if fn_locals.contains_key(&name.text) {
                self.add_error(name.span, &fmt_parameter_already_declared(&name.text));
                continue;
            }
            fn_locals.insert(name.text.clone(), LocalVarInfo::default());
        }

        self.locals.insert(node.id, fn_locals);
        TraversalAction::Continue
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Variables
    // ═══════════════════════════════════════════════════════════════════════

    pub(super) fn check_global_const_decls(&mut self, visit: &Visit<'a, '_>, decls: &'a [Node]) -> TraversalAction {
        let module = self.module_node(visit).id;

        for decl in decls {
            let NodeKind::GlobalConstDecl { name, value } = &decl.kind else {
                continue;
            };
            if name.text.len() > MAX_NAME_BYTE_LEN {
                self.add_error(name.span, &fmt_name_is_too_long(&name.text));
            }
            if self.global(module, &name.text).is_some() {
                self.add_error(decl.span, &fmt_invalid_const_decl_global_already_declared(&name.text));
            } else {
                self.globals_mut(module)
                    .insert(name.text.clone(), GlobalVarInfo::start_constant());
            }
            self.check_const_decl_value(value);
        }
        TraversalAction::Continue
    }

    /// Constant values are restricted to literals and a few builtin calls.
    fn check_const_decl_value(&mut self, value: &'a Node) {
        let includable = self.in_included_chunk || self.chunk.is_includable();
        let mut errors = Vec::new();

        walk(
            value,
            &mut FnVisitor(|visit: &Visit<'a, '_>| {
                let node = visit.node;
                match &node.kind {
                    NodeKind::Call { callee, .. } => {
                        if includable {
                            errors.push((node.span, CALL_EXPRS_NOT_ALLOWED_INSIDE_GLOBAL_CONST_DECLS_OF_INCLUDABLE_FILES.to_string()));
                            return TraversalAction::Prune;
                        }
                        match &callee.kind {
                            NodeKind::Ident(name) if USABLE_GLOBALS_IN_CONST_DECLS.contains(&name.as_str()) => {}
                            NodeKind::Ident(_) => errors.push((
                                callee.span,
                                fmt_a_limited_number_of_builtins_are_allowed_in_global_const_decls(
                                    USABLE_GLOBALS_IN_CONST_DECLS,
                                ),
                            )),
                            _ => errors.push((callee.span, CALLED_NOT_ALLOWED_INSIDE_GLOBAL_CONST_DECLS.to_string())),
                        }
                        TraversalAction::Continue
                    }
                    NodeKind::Ident(_)
                    | NodeKind::List { .. }
                    | NodeKind::Object { .. }
                    | NodeKind::ObjectProperty { .. }
                    | NodeKind::Record { .. }
                    | NodeKind::Dictionary { .. }
                    | NodeKind::DictEntry { .. }
                    | NodeKind::PatternIdent { .. }
                    | NodeKind::PatternNsMember { .. } => TraversalAction::Continue,
                    kind if kind.is_simple_value_literal() => TraversalAction::Continue,
                    kind => {
                        errors.push((node.span, fmt_following_node_type_not_allowed_in_global_const_decls(kind.name())));
                        TraversalAction::Prune
                    }
                }
            }),
        );

        for (span, text) in errors {
            self.add_error(span, &text);
        }
    }

    pub(super) fn check_local_var_decls(&mut self, visit: &Visit<'a, '_>, decls: &'a [Node]) -> TraversalAction {
        let module = self.module_node(visit).id;
        let scope = self.scope_node(visit).id;

        for decl in decls {
            let NodeKind::LocalVarDecl { name, .. } = &decl.kind else {
                continue;
            };
            if name.text.len() > MAX_NAME_BYTE_LEN {
                self.add_error(name.span, &fmt_name_is_too_long(&name.text));
                continue;
            }
            if self.local(scope, &name.text).is_some() {
                self.add_error(name.span, &fmt_invalid_local_var_decl_already_declared(&name.text));
                continue;
            }
            if self.global(module, &name.text).is_some() {
                self.add_error(name.span, &fmt_cannot_shadow_global_variable(&name.text));
                continue;
            }
            self.locals_mut(scope).insert(name.text.clone(), LocalVarInfo::default());
        }
        TraversalAction::Continue
    }

    pub(super) fn check_global_var_decls(&mut self, visit: &Visit<'a, '_>, decls: &'a [Node]) -> TraversalAction {
        let node = visit.node;
        if !visit.parent.is_some_and(|p| p.kind.is_module_root()) {
            self.add_error(node.span, MISPLACED_GLOBAL_VAR_DECLS_TOP_LEVEL_STMT);
            return TraversalAction::Continue;
        }
        let module = self.module_node(visit).id;
        if self.first_forbidden_position(module).is_some_and(|pos| node.span.start >= pos) {
            self.add_error(node.span, MISPLACED_GLOBAL_VAR_DECLS_AFTER_FN_DECL_OR_REF_TO_FN);
            return TraversalAction::Continue;
        }

        for decl in decls {
            let NodeKind::GlobalVarDecl { name, .. } = &decl.kind else {
                continue;
            };
            if name.text.len() > MAX_NAME_BYTE_LEN {
                self.add_error(name.span, &fmt_name_is_too_long(&name.text));
                continue;
            }
            if self.global(module, &name.text).is_some() {
                self.add_error(name.span, &fmt_invalid_global_var_decl_already_declared(&name.text));
                continue;
            }
            self.globals_mut(module)
                .insert(name.text.clone(), GlobalVarInfo::default());
        }
        TraversalAction::Continue
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Assignments
    // ═══════════════════════════════════════════════════════════════════════

    pub(super) fn check_assignment(&mut self, visit: &Visit<'a, '_>, left: &'a Node, op: AssignOp) -> TraversalAction {
        let module = self.module_node(visit).id;
        let scope = self.scope_node(visit).id;

        match &left.kind {
            NodeKind::Variable(name) if name.is_empty() => {
                self.add_error(left.span, INVALID_ASSIGNMENT_ANONYMOUS_VAR_CANNOT_BE_ASSIGNED);
            }
            NodeKind::GlobalVariable(name) => {
                if self.fn_decl(module, name).is_some() {
                    self.add_error(left.span, &fmt_invalid_assignment_name_is_func_name(name));
                    return TraversalAction::Continue;
                }
                match self.global(module, name) {
                    Some(info) if info.is_const => {
                        self.add_error(left.span, GLOBAL_VARS_AND_CONSTS_CANNOT_BE_REASSIGNED);
                    }
                    Some(_) => {}
                    None if op != AssignOp::Assign => {
                        self.add_error(left.span, &fmt_invalid_variable_assignment_var_does_not_exist(name));
                    }
                    None => {
                        self.globals_mut(module).insert(name.clone(), GlobalVarInfo::default());
                    }
                }
            }
            NodeKind::Variable(name) | NodeKind::Ident(name) => {
                if self.global(module, name).is_some() {
                    let text = if self.fn_decl(module, name).is_some() {
                        fmt_invalid_assignment_name_is_func_name(name)
                    } else {
                        GLOBAL_VARS_AND_CONSTS_CANNOT_BE_REASSIGNED.to_string()
                    };
                    self.add_error(left.span, &text);
                    return TraversalAction::Continue;
                }
                if self.local(scope, name).is_none() {
                    if op != AssignOp::Assign {
                        self.add_error(left.span, &fmt_invalid_variable_assignment_var_does_not_exist(name));
                    } else if name.len() > MAX_NAME_BYTE_LEN {
                        self.add_error(left.span, &fmt_name_is_too_long(name));
                    } else {
                        self.locals_mut(scope).insert(name.clone(), LocalVarInfo::default());
                    }
                }
            }
            NodeKind::Member { property, .. } => {
                if is_metadata_key(&property.text) {
                    self.add_error(
                        property.span,
                        &fmt_invalid_member_assignment_cannot_modify_meta_property(&property.text),
                    );
                }
            }
            _ => {}
        }
        TraversalAction::Continue
    }

    pub(super) fn check_multi_assignment(&mut self, visit: &Visit<'a, '_>, vars: &'a [Name]) -> TraversalAction {
        let node = visit.node;
        let module = self.module_node(visit).id;
        let scope = self.scope_node(visit).id;

        for var in vars {
            if self.global(module, &var.text).is_some() {
                let text = if self.fn_decl(module, &var.text).is_some() {
                    fmt_invalid_assignment_name_is_func_name(&var.text)
                } else {
                    GLOBAL_VARS_AND_CONSTS_CANNOT_BE_REASSIGNED.to_string()
                };
                self.add_error(node.span, &text);
                continue;
            }
            self.locals_mut(scope).insert(var.text.clone(), LocalVarInfo::default());
        }
        TraversalAction::Continue
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Structs
    // ═══════════════════════════════════════════════════════════════════════

    pub(super) fn check_struct_def(&mut self, visit: &Visit<'a, '_>, body: &'a [Node]) -> TraversalAction {
        if !visit.parent.is_some_and(|p| p.kind.is_module_root()) {
            self.add_error(visit.node.span, MISPLACED_STRUCT_DEF_TOP_LEVEL_STMT);
            return TraversalAction::Prune;
        }

        let mut member_names = FxHashSet::default();
        for member in body {
            let name = match &member.kind {
                NodeKind::StructField { name, .. } | NodeKind::FnDecl { name, .. } => name,
                _ => continue,
            };
            if !member_names.insert(name.text.as_str()) {
                self.add_error(name.span, &fmt_a_field_or_method_is_already_defined(&name.text));
            }
        }
        TraversalAction::Continue
    }

    pub(super) fn check_struct_init(&mut self, fields: &'a [Node]) -> TraversalAction {
        let mut names = FxHashSet::default();
        for field in fields {
            let NodeKind::StructFieldInit { name, .. } = &field.kind else {
                continue;
            };
            if !names.insert(name.text.as_str()) {
                self.add_error(field.span, &fmt_duplicate_field_name(&name.text));
            }
        }
        TraversalAction::Continue
    }
}
