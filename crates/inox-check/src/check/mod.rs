//! The checker state machine.
//!
//! A [`Checker`] walks one chunk (or embedded module) with the generic tree
//! walker. Symbol tables are keyed by module node (chunk or embedded module)
//! for globals, functions, structs and patterns, and by scope container for
//! locals. Inclusion and module-import statements are checked by nested
//! checkers whose results are merged back into the parent.

mod compose;
mod decl;
mod flow;
mod literals;
mod names;
mod patterns;

pub(crate) use literals::check_simple_literal;

use inox_common::{FxHashMap, FxHashSet, PositionStack, Span};
use inox_module::{Module, ModuleKind, INOX_SPEC_FILE_SUFFIX};
use inox_syntax::{walk, Node, NodeId, NodeKind, ParsedChunk, TraversalAction, Visit, Visitor};

use crate::data::Data;
use crate::error::{CheckError, StaticCheckError, StaticCheckWarning};
use crate::globals::{default_globals, default_pattern_namespaces, default_patterns, GlobalVarInfo};

// ═══════════════════════════════════════════════════════════════════════════
// Input
// ═══════════════════════════════════════════════════════════════════════════

/// Everything a check starts from.
#[derive(Debug, Clone)]
pub struct CheckInput<'a> {
    /// Usually the chunk node, can be an embedded module.
    pub node: &'a Node,
    pub chunk: &'a ParsedChunk,
    /// Required to check inclusion and module import statements.
    pub module: Option<&'a Module>,
    pub globals: FxHashMap<String, GlobalVarInfo>,
    pub additional_global_consts: Vec<String>,
    /// Variables of an interactive shell, visible as locals of the root.
    pub shell_local_vars: Vec<String>,
    pub patterns: FxHashSet<String>,
    pub pattern_namespaces: FxHashMap<String, Vec<String>>,

    pub base_globals_for_imported_module: FxHashMap<String, GlobalVarInfo>,
    pub base_patterns_for_imported_module: FxHashSet<String>,
    pub base_pattern_namespaces_for_imported_module: FxHashMap<String, Vec<String>>,
}

impl<'a> CheckInput<'a> {
    pub fn new(node: &'a Node, chunk: &'a ParsedChunk) -> Self {
        Self {
            node,
            chunk,
            module: None,
            globals: FxHashMap::default(),
            additional_global_consts: Vec::new(),
            shell_local_vars: Vec::new(),
            patterns: FxHashSet::default(),
            pattern_namespaces: FxHashMap::default(),
            base_globals_for_imported_module: FxHashMap::default(),
            base_patterns_for_imported_module: FxHashSet::default(),
            base_pattern_namespaces_for_imported_module: FxHashMap::default(),
        }
    }

    pub fn for_chunk(chunk: &'a ParsedChunk) -> Self {
        Self::new(&chunk.node, chunk)
    }

    pub fn for_module(module: &'a Module) -> Self {
        let mut input = Self::new(&module.main_chunk.node, &module.main_chunk);
        input.module = Some(module);
        input
    }

    /// Uses the builtin globals, patterns and namespaces, for the checked
    /// module and for the modules it imports.
    pub fn with_defaults(mut self) -> Self {
        self.globals = default_globals();
        self.patterns = default_patterns();
        self.pattern_namespaces = default_pattern_namespaces();
        self.base_globals_for_imported_module = default_globals();
        self.base_patterns_for_imported_module = default_patterns();
        self.base_pattern_namespaces_for_imported_module = default_pattern_namespaces();
        self
    }

    pub fn with_globals(mut self, globals: FxHashMap<String, GlobalVarInfo>) -> Self {
        self.globals = globals;
        self
    }

    pub fn with_additional_global_consts<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.additional_global_consts.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn with_shell_local_vars<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.shell_local_vars.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn with_patterns(mut self, patterns: FxHashSet<String>) -> Self {
        self.patterns = patterns;
        self
    }

    pub fn with_pattern_namespaces(mut self, namespaces: FxHashMap<String, Vec<String>>) -> Self {
        self.pattern_namespaces = namespaces;
        self
    }

    pub fn with_imported_module_base(
        mut self,
        globals: FxHashMap<String, GlobalVarInfo>,
        patterns: FxHashSet<String>,
        pattern_namespaces: FxHashMap<String, Vec<String>>,
    ) -> Self {
        self.base_globals_for_imported_module = globals;
        self.base_patterns_for_imported_module = patterns;
        self.base_pattern_namespaces_for_imported_module = pattern_namespaces;
        self
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Symbol tables
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct LocalVarInfo {
    /// Declared by a match case, can be redeclared by another case.
    pub is_group_var: bool,
}

#[derive(Debug, Clone)]
pub(crate) struct FnDeclInfo {
    pub decl: NodeId,
    pub module: NodeId,
    pub captured_locals: Vec<String>,
}

/// Members of a pattern namespace, `None` when they are not statically known.
pub(crate) type NamespaceMembers = Option<FxHashSet<String>>;

pub(crate) type Globals = FxHashMap<String, GlobalVarInfo>;
pub(crate) type Locals = FxHashMap<String, LocalVarInfo>;
pub(crate) type Namespaces = FxHashMap<String, NamespaceMembers>;

fn namespaces_from_input(namespaces: &FxHashMap<String, Vec<String>>) -> Namespaces {
    namespaces
        .iter()
        .map(|(name, members)| (name.clone(), Some(members.iter().cloned().collect())))
        .collect()
}

// ═══════════════════════════════════════════════════════════════════════════
// Checker
// ═══════════════════════════════════════════════════════════════════════════

pub(crate) struct Checker<'a> {
    root: &'a Node,
    chunk: &'a ParsedChunk,
    module: Option<&'a Module>,
    /// Kind the manifest of the root is checked against.
    module_kind: ModuleKind,
    location_prefix: PositionStack,
    in_included_chunk: bool,

    /// Tables the checker started from, not merged back into a parent.
    input_globals: Globals,
    input_patterns: FxHashSet<String>,
    input_pattern_namespaces: Namespaces,

    base_globals: Globals,
    base_patterns: FxHashSet<String>,
    base_pattern_namespaces: Namespaces,

    shell_locals: FxHashSet<String>,
    globals: FxHashMap<NodeId, Globals>,
    locals: FxHashMap<NodeId, Locals>,
    fn_decls: FxHashMap<NodeId, FxHashMap<String, FnDeclInfo>>,
    struct_defs: FxHashMap<NodeId, FxHashMap<String, usize>>,
    patterns: FxHashMap<NodeId, FxHashSet<String>>,
    pattern_namespaces: FxHashMap<NodeId, Namespaces>,
    /// Known property names of object literals.
    properties: FxHashMap<NodeId, FxHashSet<String>>,
    /// Locals saved before entering loops, switches and matches.
    stored_locals: FxHashMap<NodeId, Locals>,
    /// `(function, referenced global function)` pairs.
    capture_edges: Vec<(NodeId, NodeId)>,
    /// Roots of the included chunks already checked.
    checked_inclusions: FxHashSet<NodeId>,

    data: Data,
    fatal: Option<CheckError>,
}

impl<'a> Checker<'a> {
    pub(crate) fn new(input: &CheckInput<'a>) -> Self {
        let root = input.node;

        let mut globals = input.globals.clone();
        for name in &input.additional_global_consts {
            globals.insert(name.clone(), GlobalVarInfo::constant());
        }
        let shell_locals: FxHashSet<String> = input.shell_local_vars.iter().cloned().collect();
        let root_locals: Locals = shell_locals
            .iter()
            .map(|name| (name.clone(), LocalVarInfo::default()))
            .collect();
        let namespaces = namespaces_from_input(&input.pattern_namespaces);

        let module_kind = match input.module {
            Some(module) if module.name().ends_with(INOX_SPEC_FILE_SUFFIX) => ModuleKind::Spec,
            Some(module) => module.kind,
            None => ModuleKind::Unspecified,
        };

        let mut checker = Self {
            root,
            chunk: input.chunk,
            module: input.module,
            module_kind,
            location_prefix: PositionStack::new(),
            in_included_chunk: false,
            input_globals: globals.clone(),
            input_patterns: input.patterns.clone(),
            input_pattern_namespaces: namespaces.clone(),
            base_globals: input.base_globals_for_imported_module.clone(),
            base_patterns: input.base_patterns_for_imported_module.clone(),
            base_pattern_namespaces: namespaces_from_input(&input.base_pattern_namespaces_for_imported_module),
            shell_locals,
            globals: FxHashMap::default(),
            locals: FxHashMap::default(),
            fn_decls: FxHashMap::default(),
            struct_defs: FxHashMap::default(),
            patterns: FxHashMap::default(),
            pattern_namespaces: FxHashMap::default(),
            properties: FxHashMap::default(),
            stored_locals: FxHashMap::default(),
            capture_edges: Vec::new(),
            checked_inclusions: FxHashSet::default(),
            data: Data::default(),
            fatal: None,
        };
        checker.globals.insert(root.id, globals);
        checker.locals.insert(root.id, root_locals);
        checker.patterns.insert(root.id, input.patterns.clone());
        checker.pattern_namespaces.insert(root.id, namespaces);
        checker
    }

    /// Runs the check and returns its output.
    pub(crate) fn run(mut self) -> Result<Data, CheckError> {
        let root = self.root;
        if root.kind.is_module_root() {
            self.define_structs(root);
            self.precheck_top_level_statements(root);
        }
        self.finish()
    }

    /// Walks the root, the tables of the root must already be set up.
    fn finish(mut self) -> Result<Data, CheckError> {
        let root = self.root;
        let stopped = walk(root, &mut self);
        if let Some(err) = self.fatal.take() {
            return Err(err);
        }
        if stopped {
            return Err(CheckError::Stopped(self.chunk.name().to_string()));
        }
        self.data.close_captures(&self.capture_edges);

        tracing::debug!(
            chunk = self.chunk.name(),
            errors = self.data.errors.len(),
            warnings = self.data.warnings.len(),
            "static check done"
        );
        Ok(self.data)
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Diagnostics
    // ═══════════════════════════════════════════════════════════════════════

    fn location(&self, span: Span) -> PositionStack {
        let mut location = self.location_prefix.clone();
        location.push(self.chunk.position(span));
        location
    }

    fn add_error(&mut self, span: Span, text: &str) {
        let error = StaticCheckError::new(text, self.location(span));
        tracing::trace!(error = %error, "static check error");
        self.data.errors.push(error);
    }

    fn add_warning(&mut self, span: Span, text: &str) {
        let warning = StaticCheckWarning::new(text, self.location(span));
        self.data.warnings.push(warning);
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Scopes
    // ═══════════════════════════════════════════════════════════════════════

    /// The closest enclosing chunk or embedded module, or the root.
    fn module_node(&self, visit: &Visit<'a, '_>) -> &'a Node {
        visit
            .ancestors
            .iter()
            .rev()
            .find(|a| a.kind.is_module_root())
            .copied()
            .unwrap_or(self.root)
    }

    /// The closest enclosing scope container, or the root.
    fn scope_node(&self, visit: &Visit<'a, '_>) -> &'a Node {
        visit
            .ancestors
            .iter()
            .rev()
            .find(|a| a.kind.is_scope_container())
            .copied()
            .unwrap_or(self.root)
    }

    fn global(&self, module: NodeId, name: &str) -> Option<GlobalVarInfo> {
        self.globals.get(&module).and_then(|globals| globals.get(name)).copied()
    }

    fn globals_mut(&mut self, module: NodeId) -> &mut Globals {
        self.globals.entry(module).or_default()
    }

    fn local(&self, scope: NodeId, name: &str) -> Option<LocalVarInfo> {
        self.locals.get(&scope).and_then(|locals| locals.get(name)).copied()
    }

    fn locals_mut(&mut self, scope: NodeId) -> &mut Locals {
        self.locals.entry(scope).or_default()
    }

    fn fn_decl(&self, module: NodeId, name: &str) -> Option<&FnDeclInfo> {
        self.fn_decls.get(&module).and_then(|decls| decls.get(name))
    }

    /// Local of the closest scope, then global of the closest module.
    fn var_exists(&self, visit: &Visit<'a, '_>, name: &str) -> bool {
        let scope = self.scope_node(visit);
        self.local(scope.id, name).is_some() || self.global(self.module_node(visit).id, name).is_some()
    }

    fn store_scope_locals(&mut self, visit: &Visit<'a, '_>) {
        let scope = self.scope_node(visit).id;
        let snapshot = self.locals.get(&scope).cloned().unwrap_or_default();
        self.stored_locals.insert(visit.node.id, snapshot);
    }

    fn restore_scope_locals(&mut self, visit: &Visit<'a, '_>) {
        let scope = self.scope_node(visit).id;
        if let Some(snapshot) = self.stored_locals.remove(&visit.node.id) {
            self.locals.insert(scope, snapshot);
        }
    }

    fn first_forbidden_position(&self, module: NodeId) -> Option<u32> {
        self.data.first_forbidden_positions.get(&module).copied()
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Dispatch
    // ═══════════════════════════════════════════════════════════════════════

    fn check_node(&mut self, visit: &Visit<'a, '_>) -> TraversalAction {
        let node = visit.node;
        match &node.kind {
            NodeKind::Manifest { object } => self.check_manifest(visit, object),
            NodeKind::InclusionImport { .. } => self.check_inclusion_import(visit),
            NodeKind::Import { identifier, config, .. } => self.check_module_import(visit, identifier, config),
            NodeKind::EmbeddedModule { .. } => self.check_embedded_module(visit),
            NodeKind::Spawn { meta, module } => self.check_spawn(visit, meta.as_deref(), module),
            NodeKind::TestSuite { is_statement, .. } => self.check_test_suite(visit, *is_statement),
            NodeKind::TestCase { is_statement, .. } => self.check_test_case(visit, *is_statement),

            NodeKind::GlobalConstDecls { decls } => self.check_global_const_decls(visit, decls),
            NodeKind::LocalVarDecls { decls } => self.check_local_var_decls(visit, decls),
            NodeKind::GlobalVarDecls { decls } => self.check_global_var_decls(visit, decls),
            NodeKind::Assignment { left, op, .. } => self.check_assignment(visit, left, *op),
            NodeKind::MultiAssignment { vars, .. } => self.check_multi_assignment(visit, vars),
            NodeKind::FnDecl { name, function } => self.check_fn_decl(visit, name, function),
            NodeKind::FnExpr { captures, params, .. } => self.check_fn_expr(visit, captures, params),
            NodeKind::StructDef { body, .. } => self.check_struct_def(visit, body),
            NodeKind::PatternDef { name, lazy, .. } => self.check_pattern_def(visit, name, *lazy),
            NodeKind::PatternNsDef { name, value } => self.check_pattern_ns_def(visit, name, value),
            NodeKind::Extend { .. } => self.check_extend(visit),

            NodeKind::For { key, value, .. } | NodeKind::ForExpr { key, value, .. } => {
                self.check_for(visit, key.as_ref(), value.as_ref())
            }
            NodeKind::Walk { meta, entry, .. } | NodeKind::WalkExpr { meta, entry, .. } => {
                self.check_walk(visit, meta.as_ref(), entry.as_ref())
            }
            NodeKind::Switch { .. } | NodeKind::Match { .. } => {
                self.store_scope_locals(visit);
                TraversalAction::Continue
            }
            NodeKind::MatchCase { group_var, .. } => self.check_match_case(visit, group_var.as_ref()),
            NodeKind::Break | NodeKind::Continue => self.check_break_or_continue(visit),
            NodeKind::Yield(_) => self.check_yield(visit),
            NodeKind::Prune => self.check_prune(visit),
            NodeKind::Return(_) => self.check_return(visit),
            NodeKind::Coyield(_) => self.check_coyield(visit),

            NodeKind::Variable(name) => self.check_variable(visit, name),
            NodeKind::GlobalVariable(name) => self.check_global_variable(visit, name),
            NodeKind::Ident(name) => self.check_ident(visit, name),
            NodeKind::SelfExpr => self.check_self(visit),
            NodeKind::SendValue { .. } => self.check_sendval(visit),

            NodeKind::Object {
                properties,
                meta_properties,
            } => self.check_object_literal(node, properties, meta_properties),
            NodeKind::Record { properties } => self.check_record_literal(properties),
            NodeKind::StructInit { fields } => self.check_struct_init(fields),
            NodeKind::StaticMappingEntry { key, .. } => self.check_mapping_entry_key(key),
            NodeKind::DynamicMappingEntry {
                key,
                key_var,
                group_var,
                ..
            } => self.check_dynamic_mapping_entry(visit, key, key_var, group_var.as_ref()),
            NodeKind::Compute { .. } => self.check_compute(visit),
            NodeKind::ReceptionHandler { .. } => self.check_reception_handler(visit),
            NodeKind::RuntimeTypeCheck { .. } => self.check_runtime_type_check(visit),

            NodeKind::PatternIdent { name, unprefixed } => self.check_pattern_ident(visit, name, *unprefixed),
            NodeKind::PatternNsIdent(name) => self.check_pattern_ns_ident(visit, name),
            NodeKind::PatternNsMember { namespace, member } => self.check_pattern_ns_member(visit, namespace, member),
            NodeKind::Readonly { .. } => self.check_readonly(visit),
            NodeKind::PointerType { value } => self.check_pointer_type(visit, value),
            NodeKind::New { ty, .. } => self.check_new(visit, ty),

            NodeKind::Int(_)
            | NodeKind::Float(_)
            | NodeKind::Str(_)
            | NodeKind::Bool(_)
            | NodeKind::Nil
            | NodeKind::Quantity { .. }
            | NodeKind::Rate { .. }
            | NodeKind::IntRange { .. }
            | NodeKind::FloatRange { .. }
            | NodeKind::AbsPath(_)
            | NodeKind::RelPath(_)
            | NodeKind::Url(_)
            | NodeKind::Host(_)
            | NodeKind::List { .. }
            | NodeKind::Dictionary { .. }
            | NodeKind::DictEntry { .. }
            | NodeKind::KeyList { .. }
            | NodeKind::ObjectPattern { .. }
            | NodeKind::ObjectPatternProperty { .. }
            | NodeKind::ObjectProperty { .. }
            | NodeKind::PropertySpread { .. }
            | NodeKind::StructFieldInit { .. }
            | NodeKind::Mapping { .. } => {
                self.check_literal(node);
                TraversalAction::Continue
            }

            // checked through their parent or children
            NodeKind::Chunk { .. }
            | NodeKind::GlobalConstDecl { .. }
            | NodeKind::LocalVarDecl { .. }
            | NodeKind::GlobalVarDecl { .. }
            | NodeKind::StructField { .. }
            | NodeKind::MetaProperty { .. }
            | NodeKind::InitializationBlock { .. }
            | NodeKind::Block { .. }
            | NodeKind::If { .. }
            | NodeKind::SwitchCase { .. }
            | NodeKind::DefaultCase { .. }
            | NodeKind::Unary { .. }
            | NodeKind::Binary { .. }
            | NodeKind::Call { .. }
            | NodeKind::Member { .. }
            | NodeKind::Index { .. }
            | NodeKind::Param { .. }
            | NodeKind::Invalid => TraversalAction::Continue,
        }
    }

    /// Literal checks that only depend on the node itself.
    fn check_literal(&mut self, node: &Node) {
        let mut errors = Vec::new();
        check_simple_literal(node, self.chunk, &mut |span, text| errors.push((span, text.to_string())));
        for (span, text) in errors {
            self.add_error(span, &text);
        }
    }
}

impl<'a> Visitor<'a> for Checker<'a> {
    fn enter(&mut self, visit: &Visit<'a, '_>) -> TraversalAction {
        if self.fatal.is_some() {
            return TraversalAction::Stop;
        }
        let action = self.check_node(visit);
        if self.fatal.is_some() {
            TraversalAction::Stop
        } else {
            action
        }
    }

    fn leave(&mut self, visit: &Visit<'a, '_>) -> TraversalAction {
        match &visit.node.kind {
            NodeKind::For { .. }
            | NodeKind::ForExpr { .. }
            | NodeKind::Walk { .. }
            | NodeKind::WalkExpr { .. }
            | NodeKind::Switch { .. }
            | NodeKind::Match { .. } => self.restore_scope_locals(visit),
            NodeKind::PatternDef { name, lazy: false, .. } => self.define_pattern(visit, name),
            _ => {}
        }
        if self.fatal.is_some() {
            TraversalAction::Stop
        } else {
            TraversalAction::Continue
        }
    }
}

/// Metaproperty names look like `_name_`.
pub(crate) fn is_metadata_key(name: &str) -> bool {
    name.len() > 2 && name.starts_with('_') && name.ends_with('_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_metadata_key() {
        assert!(is_metadata_key("_constraints_"));
        assert!(!is_metadata_key("__"));
        assert!(!is_metadata_key("_a"));
        assert!(!is_metadata_key("name"));
    }

    #[test]
    fn test_namespaces_from_input() {
        let namespaces = namespaces_from_input(&default_pattern_namespaces());
        let inox = namespaces["inox"].as_ref().unwrap();
        assert!(inox.contains("module-kind"));
    }
}
