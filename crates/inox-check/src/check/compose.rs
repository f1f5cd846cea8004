//! Manifests, nested checkers and embedded modules.
//!
//! Inclusion and module-import statements are checked by a nested
//! [`Checker`] whose output is merged back into the closest module node.
//! Embedded modules are checked in place, with tables derived from the
//! enclosing module.

use inox_common::{FxHashMap, FxHashSet, Span};
use inox_module::{Module, ModuleKind, IMPORT_CONFIG_VALIDATION_PROPNAME};
use inox_syntax::ast::Name;
use inox_syntax::{find_nodes, walk, Node, NodeId, NodeKind, ParsedChunk, TraversalAction, Visit};

use super::{check_simple_literal, CheckInput, Checker, FnDeclInfo, Globals, Locals, Namespaces};
use crate::data::Data;
use crate::error::CheckError;
use crate::globals::{GlobalVarInfo, CURRENT_TEST, MOD_ARGS_VARNAME, TEST_ITEM_NON_INHERITED_GLOBALS};
use crate::manifest::check_manifest_object;
use crate::messages::*;

const SPAWN_GLOBALS_SECTION: &str = "globals";

/// What an included chunk adds to the module including it.
struct IncludedDefinitions {
    globals: Globals,
    /// Locals declared at the top level of the included chunk.
    locals: Locals,
    patterns: FxHashSet<String>,
    namespaces: Namespaces,
    fn_decls: FxHashMap<String, FnDeclInfo>,
    checked_inclusions: FxHashSet<NodeId>,
}

impl<'a> Checker<'a> {
    /// A checker for `root` that starts from the given tables and shares the
    /// bases of imported modules.
    fn nested(
        &self,
        root: &'a Node,
        chunk: &'a ParsedChunk,
        module: Option<&'a Module>,
        globals: Globals,
        patterns: FxHashSet<String>,
        namespaces: Namespaces,
    ) -> Checker<'a> {
        let mut input = CheckInput::new(root, chunk);
        input.module = module;

        let mut checker = Checker::new(&input);
        checker.globals.insert(root.id, globals.clone());
        checker.patterns.insert(root.id, patterns.clone());
        checker.pattern_namespaces.insert(root.id, namespaces.clone());
        checker.input_globals = globals;
        checker.input_patterns = patterns;
        checker.input_pattern_namespaces = namespaces;
        checker.base_globals = self.base_globals.clone();
        checker.base_patterns = self.base_patterns.clone();
        checker.base_pattern_namespaces = self.base_pattern_namespaces.clone();
        checker
    }

    /// Keeps the data of a nested check, a fatal error stops the parent.
    fn absorb_nested(&mut self, result: Result<Data, CheckError>) -> Option<()> {
        match result {
            Ok(data) => {
                self.data.absorb(data);
                Some(())
            }
            Err(err) => {
                self.fatal = Some(err);
                None
            }
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Manifests
    // ═══════════════════════════════════════════════════════════════════════

    pub(super) fn check_manifest(&mut self, visit: &Visit<'a, '_>, object: &'a Node) -> TraversalAction {
        let (kind, embedded) = match visit.parent {
            Some(parent) if matches!(parent.kind, NodeKind::EmbeddedModule { .. }) => {
                let kind = match self.parent_of_module(visit, parent).map(|p| &p.kind) {
                    Some(NodeKind::Spawn { .. }) => ModuleKind::UserLThread,
                    Some(NodeKind::TestSuite { .. }) => ModuleKind::TestSuite,
                    Some(NodeKind::TestCase { .. }) => ModuleKind::TestCase,
                    _ => ModuleKind::Unspecified,
                };
                (kind, true)
            }
            _ => (self.module_kind, false),
        };

        let mut errors = Vec::new();
        check_manifest_object(object, kind, embedded, &mut |span, text| errors.push((span, text.to_string())));
        for node in find_nodes(object, |_| true) {
            check_simple_literal(node, self.chunk, &mut |span, text| errors.push((span, text.to_string())));
        }
        for (span, text) in errors {
            self.add_error(span, &text);
        }
        TraversalAction::Prune
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Inclusions
    // ═══════════════════════════════════════════════════════════════════════

    pub(super) fn check_inclusion_import(&mut self, visit: &Visit<'a, '_>) -> TraversalAction {
        let node = visit.node;
        if !matches!(visit.parent.map(|p| &p.kind), Some(NodeKind::Chunk { .. })) {
            self.add_error(node.span, MISPLACED_INCLUSION_IMPORT_STATEMENT_TOP_LEVEL_STMT);
            return TraversalAction::Prune;
        }
        let Some(module) = self.module else {
            self.fatal = Some(CheckError::MissingModule("inclusion import"));
            return TraversalAction::Stop;
        };
        // files that failed to load are reported by the module
        let Some(included) = module.inclusion_statements.get(&node.id) else {
            return TraversalAction::Prune;
        };
        let chunk: &'a ParsedChunk = &included.chunk;
        let root = &chunk.node;
        if !self.checked_inclusions.insert(root.id) {
            return TraversalAction::Prune;
        }

        let parent_module = self.module_node(visit).id;
        let mut child = self.nested(
            root,
            chunk,
            Some(module),
            self.input_globals.clone(),
            self.input_patterns.clone(),
            self.input_pattern_namespaces.clone(),
        );
        child.location_prefix = self.location(node.span);
        child.in_included_chunk = true;
        child.checked_inclusions = self.checked_inclusions.clone();
        let struct_defs = self.struct_defs.get(&parent_module).cloned().unwrap_or_default();
        child.struct_defs.insert(root.id, struct_defs);
        child.precheck_top_level_statements(root);

        let (data, definitions) = match child.finish_included() {
            Ok(output) => output,
            Err(err) => {
                self.fatal = Some(err);
                return TraversalAction::Stop;
            }
        };
        self.data.absorb(data);
        self.merge_definitions(node.span, parent_module, definitions);
        TraversalAction::Prune
    }

    /// Walks an included chunk and returns what it defines on top of its input.
    fn finish_included(mut self) -> Result<(Data, IncludedDefinitions), CheckError> {
        let root = self.root;
        let stopped = walk(root, &mut self);
        if let Some(err) = self.fatal.take() {
            return Err(err);
        }
        if stopped {
            return Err(CheckError::Stopped(self.chunk.name().to_string()));
        }

        let globals = self.globals.remove(&root.id).unwrap_or_default();
        let patterns = self.patterns.remove(&root.id).unwrap_or_default();
        let namespaces = self.pattern_namespaces.remove(&root.id).unwrap_or_default();
        let definitions = IncludedDefinitions {
            globals: globals
                .into_iter()
                .filter(|(name, _)| !self.input_globals.contains_key(name))
                .collect(),
            locals: self.locals.remove(&root.id).unwrap_or_default(),
            patterns: patterns
                .into_iter()
                .filter(|name| !self.input_patterns.contains(name))
                .collect(),
            namespaces: namespaces
                .into_iter()
                .filter(|(name, _)| !self.input_pattern_namespaces.contains_key(name))
                .collect(),
            fn_decls: self.fn_decls.remove(&root.id).unwrap_or_default(),
            checked_inclusions: std::mem::take(&mut self.checked_inclusions),
        };

        self.data.close_captures(&self.capture_edges);
        Ok((self.data, definitions))
    }

    /// Adds the definitions of an included chunk to `module`, reporting
    /// collisions at the inclusion statement.
    fn merge_definitions(&mut self, span: Span, module: NodeId, definitions: IncludedDefinitions) {
        self.checked_inclusions.extend(definitions.checked_inclusions);

        for (name, info) in definitions.globals {
            if self.global(module, &name).is_some() {
                self.add_error(span, &fmt_cannot_shadow_global_variable(&name));
            } else {
                self.globals_mut(module).insert(name, info);
            }
        }
        for (name, info) in definitions.locals {
            if self.local(module, &name).is_some() {
                self.add_error(span, &fmt_cannot_shadow_local_variable(&name));
            } else {
                self.locals_mut(module).insert(name, info);
            }
        }
        for name in definitions.patterns {
            let patterns = self.patterns.entry(module).or_default();
            if patterns.contains(&name) {
                self.add_error(span, &fmt_pattern_already_declared(&name));
            } else {
                patterns.insert(name);
            }
        }
        for (name, members) in definitions.namespaces {
            let namespaces = self.pattern_namespaces.entry(module).or_default();
            if namespaces.contains_key(&name) {
                self.add_error(span, &fmt_pattern_namespace_already_declared(&name));
            } else {
                namespaces.insert(name, members);
            }
        }
        for (name, mut decl) in definitions.fn_decls {
            // references from the including module move its hoisting boundary
            decl.module = module;
            self.fn_decls.entry(module).or_default().entry(name).or_insert(decl);
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Module imports
    // ═══════════════════════════════════════════════════════════════════════

    pub(super) fn check_module_import(&mut self, visit: &Visit<'a, '_>, identifier: &'a Name, config: &'a Node) -> TraversalAction {
        let node = visit.node;
        if self.in_included_chunk || self.chunk.is_includable() {
            self.add_error(node.span, MODULE_IMPORTS_NOT_ALLOWED_IN_INCLUDABLE_FILES);
            return TraversalAction::Prune;
        }
        if !matches!(visit.parent.map(|p| &p.kind), Some(NodeKind::Chunk { .. })) {
            self.add_error(node.span, MISPLACED_MOD_IMPORT_STATEMENT_TOP_LEVEL_STMT);
            return TraversalAction::Prune;
        }

        let module_node = self.module_node(visit).id;
        if self.global(module_node, &identifier.text).is_some() {
            self.add_error(identifier.span, &fmt_invalid_import_stmt_already_declared_global(&identifier.text));
        } else {
            self.globals_mut(module_node)
                .insert(identifier.text.clone(), GlobalVarInfo::constant());
        }

        if let NodeKind::Import { source, .. } = &node.kind {
            let has_validation = inox_module::manifest_section_of_object(config, IMPORT_CONFIG_VALIDATION_PROPNAME).is_some();
            if matches!(source.kind, NodeKind::Url(_)) && !has_validation {
                self.add_warning(node.span, MODULE_IMPORTED_FROM_URL_WITHOUT_VALIDATION);
            }
        }

        let Some(module) = self.module else {
            self.fatal = Some(CheckError::MissingModule("module import"));
            return TraversalAction::Stop;
        };
        // modules that failed to load are reported by the importing module
        let Some(imported) = module.imported_modules_by_statement.get(&node.id) else {
            return TraversalAction::Continue;
        };
        let imported: &'a Module = imported;

        let mut globals = self.base_globals.clone();
        globals.insert(MOD_ARGS_VARNAME.to_string(), GlobalVarInfo::constant());
        let mut child = self.nested(
            &imported.main_chunk.node,
            &imported.main_chunk,
            Some(imported),
            globals,
            self.base_patterns.clone(),
            self.base_pattern_namespaces.clone(),
        );
        child.location_prefix = self.location(node.span);
        tracing::debug!(module = imported.name(), "checking imported module");

        if self.absorb_nested(child.run()).is_none() {
            return TraversalAction::Stop;
        }
        TraversalAction::Continue
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Embedded modules
    // ═══════════════════════════════════════════════════════════════════════

    pub(super) fn check_embedded_module(&mut self, visit: &Visit<'a, '_>) -> TraversalAction {
        let node = visit.node;
        let parent_module = self.module_node(visit).id;

        match visit.parent.map(|p| &p.kind) {
            Some(NodeKind::TestSuite { .. } | NodeKind::TestCase { .. }) => {
                let mut globals = self.globals.get(&parent_module).cloned().unwrap_or_default();
                for name in TEST_ITEM_NON_INHERITED_GLOBALS {
                    globals.remove(*name);
                }
                if matches!(visit.parent.map(|p| &p.kind), Some(NodeKind::TestCase { .. })) {
                    globals.insert(CURRENT_TEST.to_string(), GlobalVarInfo::constant());
                }
                self.globals.insert(node.id, globals);
                self.inherit_patterns(parent_module, node);
            }
            // set up by the spawn expression
            Some(NodeKind::Spawn { .. }) => {}
            _ => {
                self.globals.entry(node.id).or_default();
                self.inherit_patterns(parent_module, node);
            }
        }

        self.define_structs(node);
        self.precheck_top_level_statements(node);
        TraversalAction::Continue
    }

    fn inherit_patterns(&mut self, parent_module: NodeId, module: &'a Node) {
        let patterns = self.patterns.get(&parent_module).cloned().unwrap_or_default();
        let namespaces = self.pattern_namespaces.get(&parent_module).cloned().unwrap_or_default();
        self.patterns.insert(module.id, patterns);
        self.pattern_namespaces.insert(module.id, namespaces);
    }

    /// Globals of a lthread: the start constants of the spawner and the
    /// globals listed in the meta object.
    pub(super) fn check_spawn(&mut self, visit: &Visit<'a, '_>, meta: Option<&'a Node>, module: &'a Node) -> TraversalAction {
        let parent_module = self.module_node(visit).id;
        let mut globals: Globals = self
            .globals
            .get(&parent_module)
            .map(|globals| {
                globals
                    .iter()
                    .filter(|(_, info)| info.is_start_constant)
                    .map(|(name, info)| (name.clone(), *info))
                    .collect()
            })
            .unwrap_or_default();

        if let Some(meta) = meta {
            match &meta.kind {
                NodeKind::Object { properties, .. } => {
                    for prop in properties {
                        match &prop.kind {
                            NodeKind::ObjectProperty { key: Some(key), value } => {
                                if key.name == SPAWN_GLOBALS_SECTION {
                                    self.add_spawn_globals(visit, meta, value, &mut globals);
                                }
                            }
                            _ => self.add_error(prop.span, INVALID_SPAWN_ONLY_OBJECT_LITERALS_WITH_NO_SPREAD_ELEMENTS_SUPPORTED),
                        }
                    }
                }
                _ => self.add_error(meta.span, INVALID_SPAWN_ONLY_OBJECT_LITERALS_WITH_NO_SPREAD_ELEMENTS_SUPPORTED),
            }
        }

        // `go do f()`: the callee comes from the spawner
        if let NodeKind::EmbeddedModule {
            statements,
            single_call_expr: true,
            ..
        } = &module.kind
        {
            if let Some(NodeKind::Call { callee, .. }) = statements.first().map(|s| &s.kind) {
                if let NodeKind::Ident(name) = &callee.kind {
                    globals.insert(name.clone(), GlobalVarInfo::constant());
                }
            }
        }

        self.globals.insert(module.id, globals);
        self.inherit_patterns(parent_module, module);
        TraversalAction::Continue
    }

    fn add_spawn_globals(&mut self, visit: &Visit<'a, '_>, meta: &'a Node, value: &'a Node, globals: &mut Globals) {
        match &value.kind {
            NodeKind::KeyList { keys } => {
                for key in keys {
                    if !self.var_exists(visit, &key.text) {
                        self.add_error(meta.span, &fmt_cannot_pass_global_that_is_not_declared_to_lthread(&key.text));
                    }
                    globals.insert(key.text.clone(), GlobalVarInfo::default());
                }
            }
            NodeKind::Object { properties, .. } => {
                for prop in properties {
                    match &prop.kind {
                        NodeKind::ObjectProperty { key: Some(key), .. } => {
                            globals.insert(key.name.clone(), GlobalVarInfo::default());
                        }
                        _ => self.add_error(prop.span, INVALID_SPAWN_ONLY_OBJECT_LITERALS_WITH_NO_SPREAD_ELEMENTS_SUPPORTED),
                    }
                }
            }
            _ => self.add_error(value.span, INVALID_SPAWN_GLOBALS_SHOULD_BE),
        }
    }
}
