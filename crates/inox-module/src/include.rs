//! Inclusion resolution: builds the forest of chunks included by a module.
//!
//! Every chunk of one module shares a single table of included paths, so a
//! file included twice anywhere in the forest is reported as a duplicate.
//! Paths currently being resolved count as included, which also stops
//! inclusion cycles.

use std::path::Path;
use std::sync::Arc;

use indexmap::IndexMap;
use inox_common::{EntryKind, FxHashMap, FxHashSet, PositionStack};
use inox_syntax::{find_nodes, parse_chunk_source, ChunkSource, Node, NodeId, NodeKind, ParsedChunk};

use crate::config::ModuleParsingConfig;
use crate::error::{Error, ModuleError, ModuleResult};
use crate::module::{IncludedChunk, Module};
use crate::resource::clean_path;

/// Outcome of resolving one inclusion statement.
enum Inclusion {
    Included { chunk: IncludedChunk, abs_path: String },
    /// The file is already in the forest, or being resolved.
    AlreadyIncluded { abs_path: String },
    /// The file has a manifest; only its errors are kept.
    NotIncludable { chunk: IncludedChunk },
}

struct InclusionResolver<'a> {
    config: &'a ModuleParsingConfig,
    in_progress: FxHashSet<String>,
    included: IndexMap<String, Arc<IncludedChunk>>,
    flattened: Vec<Arc<IncludedChunk>>,
    by_statement: FxHashMap<NodeId, Arc<IncludedChunk>>,
    /// Errors attributed to the module itself, at its top-level inclusion statements.
    module_errors: Vec<Error>,
}

/// Path of the file included by `stmt`, resolved against `resource_dir`.
///
/// `None` when the source is not a path literal.
fn inclusion_path(stmt: &Node, resource_dir: &str) -> Option<(String, String)> {
    let NodeKind::InclusionImport { source } = &stmt.kind else {
        return None;
    };
    match &source.kind {
        NodeKind::AbsPath(path) => Some((path.clone(), path.clone())),
        NodeKind::RelPath(path) => {
            let dir = if resource_dir.is_empty() { "/" } else { resource_dir };
            Some((path.clone(), clean_path(&format!("{}/{}", dir, path))))
        }
        _ => None,
    }
}

fn inclusion_statements(node: &Node) -> Vec<&Node> {
    find_nodes(node, |n| matches!(n.kind, NodeKind::InclusionImport { .. }))
}

/// Resolves every inclusion of `module`, recursively.
#[tracing::instrument(skip_all, fields(module = %module.name()))]
pub(crate) fn resolve_inclusions(module: &mut Module, config: &ModuleParsingConfig) -> ModuleResult<()> {
    let main = module.main_chunk.clone();
    let mut resolver = InclusionResolver {
        config,
        in_progress: FxHashSet::default(),
        included: IndexMap::new(),
        flattened: Vec::new(),
        by_statement: FxHashMap::default(),
        module_errors: Vec::new(),
    };
    let mut forest = Vec::new();

    for stmt in inclusion_statements(&main.node) {
        let location = PositionStack::single(main.position(stmt.span));

        if main.source.is_url {
            module.errors.push(Error::new(
                ModuleError::InvalidImport("inclusion imports are not supported in modules fetched from a URL".into()),
                location,
            ));
            continue;
        }

        let Some((raw_path, path)) = inclusion_path(stmt, &main.source.resource_dir) else {
            continue;
        };
        if raw_path.contains("..") {
            return Err(ModuleError::IncludedPathContainsDotDot);
        }

        match resolver.resolve(&path, &location, &location)? {
            Inclusion::AlreadyIncluded { abs_path } => {
                module
                    .errors
                    .push(Error::new(ModuleError::FileAlreadyIncluded(abs_path), location));
            }
            Inclusion::NotIncludable { chunk } => {
                module.file_level_parsing_errors.extend(chunk.original_errors);
                module.errors.extend(chunk.errors);
            }
            Inclusion::Included { chunk, abs_path } => {
                module.file_level_parsing_errors.extend(chunk.original_errors.iter().cloned());
                module.errors.extend(chunk.errors.iter().cloned());
                let chunk = Arc::new(chunk);
                resolver.register(stmt.id, abs_path, &chunk);
                forest.push(chunk);
            }
        }
    }

    module.errors.append(&mut resolver.module_errors);
    module.included_chunk_forest = forest;
    module.flattened_included_chunks = resolver.flattened;
    module.included_chunks = resolver.included;
    module.inclusion_statements = resolver.by_statement;

    tracing::debug!(included = module.included_chunks.len(), "inclusions resolved");
    Ok(())
}

impl<'a> InclusionResolver<'a> {
    fn register(&mut self, stmt: NodeId, abs_path: String, chunk: &Arc<IncludedChunk>) {
        self.by_statement.insert(stmt, chunk.clone());
        self.included.insert(abs_path, chunk.clone());
        self.flattened.push(chunk.clone());
    }

    /// Loads the chunk at `path` and everything it includes.
    ///
    /// `import_location` leads from the module to the statement including
    /// `path`; `top_level_location` is the module statement that started the chain.
    fn resolve(
        &mut self,
        path: &str,
        import_location: &PositionStack,
        top_level_location: &PositionStack,
    ) -> ModuleResult<Inclusion> {
        let config = self.config;
        let ctx = &config.context;
        ctx.check_cancelled()?;

        let abs = ctx
            .fs()
            .absolute(Path::new(path))
            .map_err(|e| ModuleError::io(path, e))?;
        let abs_path = abs.to_string_lossy().into_owned();

        if self.included.contains_key(&abs_path) || self.in_progress.contains(&abs_path) {
            return Ok(Inclusion::AlreadyIncluded { abs_path });
        }

        ctx.check_fs_read(&abs)?;

        let recover = config.recover_from_non_existing_files;
        let mut existence_error = None;
        let mut code = String::new();
        match ctx.fs().entry_kind(&abs) {
            Ok(EntryKind::File) => {
                let bytes = ctx.fs().read(&abs).map_err(|e| ModuleError::io(path, e))?;
                code = String::from_utf8(bytes).map_err(|e| {
                    ModuleError::io(path, std::io::Error::new(std::io::ErrorKind::InvalidData, e))
                })?;
            }
            Ok(EntryKind::Dir) if recover => {
                existence_error = Some(ModuleError::FileToIncludeIsAFolder(path.to_string()));
            }
            Ok(EntryKind::Dir) => return Err(ModuleError::FileToIncludeIsAFolder(path.to_string())),
            Err(e) if recover && e.kind() == std::io::ErrorKind::NotFound => {
                existence_error = Some(ModuleError::FileToIncludeDoesNotExist(path.to_string()));
            }
            Err(e) => return Err(ModuleError::io(path, e)),
        }

        let source = ChunkSource::from_path(abs_path.clone(), code);
        let parsed = parse_chunk_source(source, &config.parser_options())?;

        let mut chunk = IncludedChunk {
            chunk: parsed.clone(),
            forest: Vec::new(),
            original_errors: Vec::new(),
            errors: Vec::new(),
        };

        if parsed.node.manifest().is_some() {
            chunk.errors.push(
                Error::new(ModuleError::NotAnIncludableFile(path.to_string()), import_location.clone())
                    .with_info(path),
            );
            return Ok(Inclusion::NotIncludable { chunk });
        }

        if let Some(error) = existence_error {
            chunk
                .errors
                .push(Error::new(error, import_location.clone()).with_info(path));
            return Ok(Inclusion::Included { chunk, abs_path });
        }

        chunk.original_errors.extend(parsed.errors.iter().cloned());
        chunk.errors.extend(parse_errors_of(&parsed, import_location));

        if !parsed.is_includable() {
            chunk.errors.push(
                Error::new(ModuleError::MissingIncludableMarker(path.to_string()), import_location.clone())
                    .with_info(path),
            );
        }

        self.in_progress.insert(abs_path.clone());
        let result = self.resolve_nested(&parsed, &mut chunk, import_location, top_level_location);
        self.in_progress.remove(&abs_path);
        result?;

        Ok(Inclusion::Included { chunk, abs_path })
    }

    fn resolve_nested(
        &mut self,
        parsed: &Arc<ParsedChunk>,
        chunk: &mut IncludedChunk,
        import_location: &PositionStack,
        top_level_location: &PositionStack,
    ) -> ModuleResult<()> {
        for stmt in inclusion_statements(&parsed.node) {
            let Some((raw_path, path)) = inclusion_path(stmt, &parsed.source.resource_dir) else {
                continue;
            };
            if raw_path.contains("..") {
                return Err(ModuleError::IncludedPathContainsDotDot);
            }

            let mut location = import_location.clone();
            location.push(parsed.position(stmt.span));

            match self.resolve(&path, &location, top_level_location)? {
                Inclusion::AlreadyIncluded { abs_path } => {
                    let error = Error::new(ModuleError::FileAlreadyIncluded(abs_path.clone()), top_level_location.clone());
                    self.module_errors.push(error.clone());

                    let in_own_forest = chunk.forest.iter().any(|c| c.name() == abs_path);
                    if in_own_forest {
                        chunk.errors.push(Error { location, ..error });
                    }
                }
                Inclusion::NotIncludable { chunk: child } => {
                    chunk.original_errors.extend(child.original_errors);
                    chunk.errors.extend(child.errors);
                }
                Inclusion::Included { chunk: child, abs_path } => {
                    chunk.original_errors.extend(child.original_errors.iter().cloned());
                    chunk.errors.extend(child.errors.iter().cloned());
                    let child = Arc::new(child);
                    self.register(stmt.id, abs_path, &child);
                    chunk.forest.push(child);
                }
            }
        }
        Ok(())
    }
}

/// Parse errors of `chunk`, located under the inclusion site.
fn parse_errors_of(chunk: &ParsedChunk, import_location: &PositionStack) -> Vec<Error> {
    chunk
        .errors
        .iter()
        .map(|error| {
            let mut location = import_location.clone();
            location.push(chunk.position(error.span));
            Error::new(ModuleError::Parse(error.message.clone()), location)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inclusion_path() {
        let (chunk, _) = inox_syntax::parse("import ./lib/a.ix\nimport /b.ix\nimport \"c.ix\"");
        let stmts = chunk.statements();
        assert_eq!(
            inclusion_path(&stmts[0], "/dir/"),
            Some(("./lib/a.ix".to_string(), "/dir/lib/a.ix".to_string()))
        );
        assert_eq!(
            inclusion_path(&stmts[1], "/dir/"),
            Some(("/b.ix".to_string(), "/b.ix".to_string()))
        );
        assert_eq!(inclusion_path(&stmts[2], "/dir/"), None);
    }
}
