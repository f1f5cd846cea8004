//! The loaded representation of a module and its entry points.

use std::fmt;
use std::io;
use std::path::Path;
use std::sync::Arc;

use indexmap::IndexMap;
use inox_common::{FxHashMap, PositionStack, SourcePosition, Span};
use inox_syntax::{parse_chunk_source, ChunkSource, Node, NodeId, NodeKind, ParseError, ParsedChunk, ParserOptions};

use crate::config::ModuleParsingConfig;
use crate::error::{CombinedErrors, Error, ModuleError, ModuleResult};
use crate::fetch::resolve_imported_modules;
use crate::include::resolve_inclusions;
use crate::resource::ResourceName;

/// Name of the manifest section holding the module kind.
pub const MANIFEST_KIND_SECTION_NAME: &str = "kind";

/// The kind of a module. The last three are embedded kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ModuleKind {
    #[default]
    Unspecified,
    /// A `.spec.ix` file.
    Spec,
    Application,
    UserLThread,
    TestSuite,
    TestCase,
}

impl ModuleKind {
    pub const ALL: [ModuleKind; 6] = [
        ModuleKind::Unspecified,
        ModuleKind::Spec,
        ModuleKind::Application,
        ModuleKind::UserLThread,
        ModuleKind::TestSuite,
        ModuleKind::TestCase,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ModuleKind::Unspecified => "unspecified",
            ModuleKind::Spec => "spec",
            ModuleKind::Application => "application",
            ModuleKind::UserLThread => "userlthread",
            ModuleKind::TestSuite => "testsuite",
            ModuleKind::TestCase => "testcase",
        }
    }

    pub fn parse(name: &str) -> ModuleResult<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name() == name)
            .ok_or_else(|| ModuleError::InvalidModuleKind(name.to_string()))
    }

    pub fn is_embedded(self) -> bool {
        matches!(self, ModuleKind::UserLThread | ModuleKind::TestSuite | ModuleKind::TestCase)
    }

    pub fn is_test_module(self) -> bool {
        matches!(self, ModuleKind::TestSuite | ModuleKind::TestCase)
    }
}

impl fmt::Display for ModuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A chunk included in a module or in another included chunk.
#[derive(Debug)]
pub struct IncludedChunk {
    pub chunk: Arc<ParsedChunk>,
    pub forest: Vec<Arc<IncludedChunk>>,
    /// Parse errors of this chunk and of the chunks it includes.
    pub original_errors: Vec<ParseError>,
    pub errors: Vec<Error>,
}

impl IncludedChunk {
    pub fn name(&self) -> &str {
        self.chunk.name()
    }

    pub fn node(&self) -> &Node {
        &self.chunk.node
    }
}

/// A fully loaded module. Immutable once returned by a parse function.
#[derive(Debug)]
pub struct Module {
    pub kind: ModuleKind,
    /// Absent for in-memory modules.
    source_name: Option<ResourceName>,
    pub main_chunk: Arc<ParsedChunk>,

    pub included_chunk_forest: Vec<Arc<IncludedChunk>>,
    pub flattened_included_chunks: Vec<Arc<IncludedChunk>>,
    /// Keyed by inclusion statement.
    pub inclusion_statements: FxHashMap<NodeId, Arc<IncludedChunk>>,
    /// Keyed by absolute path.
    pub included_chunks: IndexMap<String, Arc<IncludedChunk>>,

    /// Keyed by canonical resource name.
    pub imported_modules: IndexMap<String, Arc<Module>>,
    pub imported_modules_by_statement: FxHashMap<NodeId, Arc<Module>>,

    pub errors: Vec<Error>,
    /// Parse errors among `errors`, including those of included chunks and imported modules.
    pub file_level_parsing_errors: Vec<ParseError>,
}

impl Module {
    fn from_chunk(chunk: Arc<ParsedChunk>, source_name: Option<ResourceName>) -> Self {
        let mut module = Module {
            kind: ModuleKind::Unspecified,
            source_name,
            main_chunk: chunk.clone(),
            included_chunk_forest: Vec::new(),
            flattened_included_chunks: Vec::new(),
            inclusion_statements: FxHashMap::default(),
            included_chunks: IndexMap::new(),
            imported_modules: IndexMap::new(),
            imported_modules_by_statement: FxHashMap::default(),
            errors: Vec::new(),
            file_level_parsing_errors: Vec::new(),
        };

        for error in &chunk.errors {
            module.file_level_parsing_errors.push(error.clone());
            module.errors.push(Error::new(
                ModuleError::Parse(error.message.clone()),
                PositionStack::single(chunk.position(error.span)),
            ));
        }
        module
    }

    /// Name of the main chunk: an absolute path, a URL or an in-memory name.
    pub fn name(&self) -> &str {
        self.main_chunk.name()
    }

    /// The absolute resource name, `None` for in-memory modules.
    pub fn source_name(&self) -> Option<&ResourceName> {
        self.source_name.as_ref()
    }

    pub fn has_url_source(&self) -> bool {
        self.source_name.as_ref().is_some_and(ResourceName::is_url)
    }

    pub fn node(&self) -> &Node {
        &self.main_chunk.node
    }

    pub fn manifest(&self) -> Option<&Node> {
        self.main_chunk.node.manifest()
    }

    /// Top-level module import statements.
    pub fn import_statements(&self) -> Vec<&Node> {
        self.node()
            .statements()
            .iter()
            .filter(|stmt| matches!(stmt.kind, NodeKind::Import { .. }))
            .collect()
    }

    /// Top-level inclusion import statements.
    pub fn inclusion_statements(&self) -> Vec<&Node> {
        self.node()
            .statements()
            .iter()
            .filter(|stmt| matches!(stmt.kind, NodeKind::InclusionImport { .. }))
            .collect()
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// All soft errors as one error, `None` when there are none.
    pub fn combined_error(&self) -> Option<CombinedErrors> {
        CombinedErrors::from_errors(&self.errors)
    }

    /// Position of `span` in the main chunk.
    pub fn position(&self, span: Span) -> SourcePosition {
        self.main_chunk.position(span)
    }

    /// Parameter names declared in the `parameters` section of the manifest.
    pub fn parameter_names(&self) -> Vec<String> {
        let Some(params) = self.manifest().and_then(|m| manifest_section(m, "parameters")) else {
            return Vec::new();
        };
        let NodeKind::Object { properties, .. } = &params.kind else {
            return Vec::new();
        };

        let mut names = Vec::new();
        for property in properties {
            let NodeKind::ObjectProperty { key, value } = &property.kind else {
                continue;
            };
            match key {
                Some(key) => names.push(key.name.clone()),
                None => {
                    if let Some(name) = manifest_section_of_object(value, "name") {
                        if let NodeKind::Ident(name) = &name.kind {
                            names.push(name.clone());
                        }
                    }
                }
            }
        }
        names
    }
}

/// Value of the property `name` of an object literal.
pub fn manifest_section_of_object<'a>(object: &'a Node, name: &str) -> Option<&'a Node> {
    let NodeKind::Object { properties, .. } = &object.kind else {
        return None;
    };
    properties.iter().find_map(|property| match &property.kind {
        NodeKind::ObjectProperty { key: Some(key), value } if key.name == name => Some(value.as_ref()),
        _ => None,
    })
}

/// Value of the section `name` of a manifest node.
pub fn manifest_section<'a>(manifest: &'a Node, name: &str) -> Option<&'a Node> {
    match &manifest.kind {
        NodeKind::Manifest { object } => manifest_section_of_object(object, name),
        _ => None,
    }
}

/// Kind name written in a `kind` section, without validation.
pub fn unchecked_module_kind_name(node: &Node) -> Option<&str> {
    match &node.kind {
        NodeKind::Str(s) | NodeKind::Ident(s) => Some(s),
        _ => None,
    }
}

fn has_object_manifest(chunk: &ParsedChunk) -> bool {
    matches!(
        chunk.node.manifest().map(|m| &m.kind),
        Some(NodeKind::Manifest { object }) if matches!(object.kind, NodeKind::Object { .. })
    )
}

/// Parses the module at `path` and everything it includes and imports.
///
/// Soft errors are collected in [`Module::errors`]; an `Err` means no module could be built.
#[tracing::instrument(skip_all, fields(path = %path.as_ref().display()))]
pub fn parse_local_module(path: impl AsRef<Path>, config: &ModuleParsingConfig) -> ModuleResult<Module> {
    let path = path.as_ref();
    let ctx = &config.context;
    ctx.check_cancelled()?;

    let abs_path = ctx
        .fs()
        .absolute(path)
        .map_err(|e| ModuleError::io(path.display().to_string(), e))?;
    ctx.check_fs_read(&abs_path)?;

    let name = abs_path.to_string_lossy().into_owned();
    match ctx.fs().entry_kind(&abs_path) {
        Ok(inox_common::EntryKind::Dir) => return Err(ModuleError::IsAFolder(name)),
        Ok(inox_common::EntryKind::File) => {}
        Err(e) => return Err(ModuleError::io(name, e)),
    }
    let bytes = ctx.fs().read(&abs_path).map_err(|e| ModuleError::io(name.clone(), e))?;
    let code = String::from_utf8(bytes)
        .map_err(|e| ModuleError::io(name.clone(), io::Error::new(io::ErrorKind::InvalidData, e)))?;

    let source = ChunkSource::from_path(name.clone(), code);
    parse_module_from_source(source, ResourceName::Path(name), config)
}

/// Parses a module from already loaded source text named by an absolute path or a URL.
#[tracing::instrument(skip_all, fields(resource = %resource))]
pub fn parse_module_from_source(
    source: ChunkSource,
    resource: ResourceName,
    config: &ModuleParsingConfig,
) -> ModuleResult<Module> {
    config.context.check_cancelled()?;

    if resource.is_path() && resource.is_relative() {
        return Err(ModuleError::InvalidResourceName(resource.as_str().to_string()));
    }

    let (config, graph) = config.with_shared_graph();
    graph.add_node(&source.name);

    let chunk = parse_chunk_source(source, &config.parser_options())?;
    let mut module = Module::from_chunk(chunk.clone(), Some(resource.clone()));

    if resource.is_spec_file() {
        module.kind = ModuleKind::Spec;
    }

    if !has_object_manifest(&chunk) {
        let location = PositionStack::single(chunk.position(Span::new(0, 1)));
        module.errors.push(
            Error::new(ModuleError::MissingManifest(chunk.name().to_string()), location)
                .with_info(resource.as_str()),
        );
    } else if let Some(kind_node) = chunk.node.manifest().and_then(|m| manifest_section(m, MANIFEST_KIND_SECTION_NAME)) {
        // Invalid kinds are reported by the static checker.
        if let Some(kind) = unchecked_module_kind_name(kind_node).and_then(|name| ModuleKind::parse(name).ok()) {
            module.kind = kind;
        }
    }

    resolve_inclusions(&mut module, &config)?;
    resolve_imported_modules(&mut module, &config)?;

    if module.has_errors() {
        tracing::debug!(errors = module.errors.len(), "module parsed with errors");
    }
    Ok(module)
}

/// Parses a module that only exists in memory. Inclusions and imports are not resolved.
pub fn parse_in_memory_module(code: &str, name: &str, config: &ModuleParsingConfig) -> ModuleResult<Module> {
    config.context.check_cancelled()?;

    let source = ChunkSource {
        name: name.to_string(),
        resource_dir: String::new(),
        is_url: false,
        code: code.to_string(),
    };
    let options = ParserOptions {
        timeout: config.single_file_parsing_timeout,
        cache: None,
    };
    let chunk = parse_chunk_source(source, &options)?;
    let mut module = Module::from_chunk(chunk.clone(), None);

    if chunk.node.manifest().is_none() {
        module.errors.push(
            Error::new(ModuleError::MissingManifest(name.to_string()), PositionStack::new()).with_info(name),
        );
    }

    let has_inclusions = !inox_syntax::find_nodes(&chunk.node, |n| matches!(n.kind, NodeKind::InclusionImport { .. })).is_empty();
    if has_inclusions {
        module.errors.push(
            Error::new(ModuleError::InclusionInMemoryModule(name.to_string()), PositionStack::new()).with_info(name),
        );
    }

    Ok(module)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Context;
    use inox_common::MemoryFs;

    fn config_with(fs: MemoryFs) -> ModuleParsingConfig {
        ModuleParsingConfig::new(Context::new(Arc::new(fs)))
    }

    #[test]
    fn test_module_kind_names() {
        for kind in ModuleKind::ALL {
            assert_eq!(ModuleKind::parse(kind.name()).unwrap(), kind);
        }
        assert!(ModuleKind::parse("app").is_err());
        assert!(ModuleKind::TestCase.is_embedded());
        assert!(!ModuleKind::Application.is_embedded());
    }

    #[test]
    fn test_base_case() {
        let fs = MemoryFs::new().with_file("/mod.ix", "manifest {}\nvar x = 1");
        let module = parse_local_module("/mod.ix", &config_with(fs)).unwrap();
        assert!(module.errors.is_empty());
        assert_eq!(module.name(), "/mod.ix");
        assert!(module.manifest().is_some());
        assert_eq!(module.kind, ModuleKind::Unspecified);
    }

    #[test]
    fn test_missing_manifest() {
        let fs = MemoryFs::new().with_file("/mod.ix", "var x = 1");
        let module = parse_local_module("/mod.ix", &config_with(fs)).unwrap();
        assert_eq!(module.errors.len(), 1);
        assert!(matches!(module.errors[0].error, ModuleError::MissingManifest(_)));
        assert_eq!(module.errors[0].location.to_string(), "/mod.ix:1:1: ");
    }

    #[test]
    fn test_parse_error_is_soft() {
        let fs = MemoryFs::new().with_file("/mod.ix", "manifest {}\nvar = 1");
        let module = parse_local_module("/mod.ix", &config_with(fs)).unwrap();
        assert_eq!(module.errors.len(), 1);
        assert_eq!(module.file_level_parsing_errors.len(), 1);
        assert!(module.combined_error().is_some());
    }

    #[test]
    fn test_application_and_spec_kinds() {
        let fs = MemoryFs::new()
            .with_file("/app.ix", "manifest {kind: \"application\"}")
            .with_file("/mod.spec.ix", "manifest {}");
        let config = config_with(fs);
        assert_eq!(parse_local_module("/app.ix", &config).unwrap().kind, ModuleKind::Application);
        assert_eq!(parse_local_module("/mod.spec.ix", &config).unwrap().kind, ModuleKind::Spec);
    }

    #[test]
    fn test_parameter_names() {
        let fs = MemoryFs::new().with_file(
            "/mod.ix",
            "manifest {\n  parameters: {\n    {name: first}\n    verbose: {}\n  }\n}",
        );
        let module = parse_local_module("/mod.ix", &config_with(fs)).unwrap();
        assert_eq!(module.parameter_names(), vec!["first".to_string(), "verbose".to_string()]);
    }

    #[test]
    fn test_relative_resource_name_is_rejected() {
        let source = ChunkSource::from_path("./mod.ix", "manifest {}");
        let err = parse_module_from_source(source, ResourceName::parse("./mod.ix"), &ModuleParsingConfig::default())
            .unwrap_err();
        assert!(matches!(err, ModuleError::InvalidResourceName(_)));
    }

    #[test]
    fn test_in_memory_module() {
        let config = ModuleParsingConfig::default();
        let module = parse_in_memory_module("manifest {}\nimport ./a.ix", "repl", &config).unwrap();
        assert_eq!(module.errors.len(), 1);
        assert!(matches!(module.errors[0].error, ModuleError::InclusionInMemoryModule(_)));
        assert!(module.source_name().is_none());
    }

    #[test]
    fn test_directory_is_not_a_module() {
        let fs = MemoryFs::new().with_file("/dir/a.ix", "manifest {}");
        let err = parse_local_module("/dir", &config_with(fs)).unwrap_err();
        assert!(matches!(err, ModuleError::IsAFolder(_)));
    }
}
