//! Module import resolution: every import target of a module is fetched and
//! parsed on its own thread.
//!
//! Targets are registered in the shared [`ModuleGraph`](crate::ModuleGraph)
//! before anything is fetched, so cyclic or too deep imports fail without I/O.
//! The first failing task cancels a context shared by its siblings; tasks
//! check it before fetching and before parsing.

use std::fmt;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use indexmap::IndexMap;
use inox_common::{EntryKind, PositionStack};
use inox_syntax::{find_nodes, ChunkSource, Node, NodeId, NodeKind};
use parking_lot::Mutex;

use crate::config::{ModuleParsingConfig, HTTP_DIAL_TIMEOUT};
use crate::error::{Error, ModuleError, ModuleResult};
use crate::module::{manifest_section_of_object, parse_module_from_source, Module};
use crate::permission::Permission;
use crate::resource::{clean_path, ResourceName};

/// MIME type of Inox source code.
pub const INOX_MIMETYPE: &str = "application/inox";

/// Name of the import configuration property holding the content hash.
pub const IMPORT_CONFIG_VALIDATION_PROPNAME: &str = "validation";

/// Largest module accepted from an HTTP response.
pub const DEFAULT_MAX_READ_FILE_SIZE: u64 = 100_000_000;

/// Options of one HTTP GET.
#[derive(Debug, Clone, Copy)]
pub struct HttpGetOptions {
    pub timeout: Duration,
    /// Skip TLS certificate and hostname verification.
    pub insecure: bool,
}

/// Downloads module sources.
pub trait HttpClient: Send + Sync + fmt::Debug {
    fn get(&self, url: &str, options: HttpGetOptions) -> ModuleResult<Vec<u8>>;
}

/// [`HttpClient`] backed by the blocking `reqwest` client.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReqwestClient;

impl HttpClient for ReqwestClient {
    fn get(&self, url: &str, options: HttpGetOptions) -> ModuleResult<Vec<u8>> {
        let retrieval = |detail: String| ModuleError::Retrieval(format!("failed to get {}: {}", url, detail));

        let client = reqwest::blocking::Client::builder()
            .connect_timeout(HTTP_DIAL_TIMEOUT.min(options.timeout))
            .timeout(options.timeout)
            .danger_accept_invalid_certs(options.insecure)
            .danger_accept_invalid_hostnames(options.insecure)
            .build()
            .map_err(|e| retrieval(format!("http client init failed: {}", e)))?;

        let response = client
            .get(url)
            .header(reqwest::header::ACCEPT, INOX_MIMETYPE)
            .send()
            .map_err(|e| {
                if e.is_timeout() {
                    retrieval(format!("request timed out: {}", e))
                } else {
                    retrieval(e.to_string())
                }
            })?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            let body = response.text().unwrap_or_default();
            return Err(retrieval(format!("status {}: {}", status.as_u16(), body)));
        }

        let mut body = Vec::new();
        response
            .take(DEFAULT_MAX_READ_FILE_SIZE)
            .read_to_end(&mut body)
            .map_err(|e| retrieval(format!("failed to read body: {}", e)))?;
        Ok(body)
    }
}

/// One distinct import target of a module.
struct ImportTarget {
    statements: Vec<NodeId>,
    /// Location of the first statement importing the target.
    location: PositionStack,
    validation: String,
}

/// Resolves the source of an import statement against the importing module
/// and checks the permission needed to fetch it.
pub fn source_from_import_source(
    source: ResourceName,
    module: &Module,
    config: &ModuleParsingConfig,
) -> ModuleResult<ResourceName> {
    let ctx = &config.context;
    match &source {
        ResourceName::Path(path) if module.has_url_source() => {
            if source.is_absolute() {
                return Err(ModuleError::AbsolutePathInUrlModule);
            }
            let parent = module.source_name().and_then(ResourceName::dir).ok_or_else(|| {
                ModuleError::InvalidImport(format!(
                    "impossible to resolve relative import path, parent module URL is {:?}",
                    module.name()
                ))
            })?;
            let url = parent.join_relative(path);
            ctx.check_permission(&Permission::http_read(url.as_str()))?;
            Ok(url)
        }
        ResourceName::Path(path) => {
            let resolved = if source.is_relative() {
                let dir = module.source_name().and_then(ResourceName::dir).ok_or_else(|| {
                    ModuleError::InvalidImport(
                        "impossible to resolve relative import path as the module has no source".into(),
                    )
                })?;
                dir.join_relative(path)
            } else {
                ResourceName::Path(clean_path(path))
            };
            ctx.check_fs_read(Path::new(resolved.as_str()))?;
            Ok(resolved)
        }
        ResourceName::Url(url) => {
            ctx.check_permission(&Permission::http_read(url.as_str()))?;
            Ok(source.clone())
        }
    }
}

/// Collects the distinct import targets of `module` and registers them in the graph.
fn collect_targets(
    module: &Module,
    config: &ModuleParsingConfig,
) -> ModuleResult<IndexMap<ResourceName, ImportTarget>> {
    let (_, graph) = config.with_shared_graph();
    let statements: Vec<&Node> = find_nodes(module.node(), |n| matches!(n.kind, NodeKind::Import { .. }));
    let mut targets: IndexMap<ResourceName, ImportTarget> = IndexMap::new();

    for stmt in statements {
        let NodeKind::Import {
            source,
            config: import_config,
            ..
        } = &stmt.kind
        else {
            continue;
        };

        let Some(source) = ResourceName::from_literal(source) else {
            if config.recover_from_non_existing_files || config.ignore_badly_configured_imports {
                continue;
            }
            return Err(ModuleError::InvalidImport(
                "source should be a path or URL literal".into(),
            ));
        };

        let resolved = source_from_import_source(source, module, config)?;
        graph.add_import(module.name(), resolved.as_str())?;

        if !matches!(import_config.kind, NodeKind::Object { .. }) {
            if config.ignore_badly_configured_imports {
                continue;
            }
            return Err(ModuleError::InvalidImport("configuration should be an object".into()));
        }

        let validation = match manifest_section_of_object(import_config, IMPORT_CONFIG_VALIDATION_PROPNAME) {
            None => String::new(),
            Some(node) => match &node.kind {
                NodeKind::Str(s) => s.clone(),
                _ if config.ignore_badly_configured_imports => String::new(),
                _ => {
                    return Err(ModuleError::InvalidImport(
                        "<configuration>.validation should be a string".into(),
                    ))
                }
            },
        };

        let location = PositionStack::single(module.position(stmt.span));
        targets
            .entry(resolved)
            .and_modify(|target| target.statements.push(stmt.id))
            .or_insert_with(|| ImportTarget {
                statements: vec![stmt.id],
                location,
                validation,
            });
    }

    Ok(targets)
}

/// Fetches and parses every module imported by `module` and attaches them to it.
///
/// Child errors are folded into `module.errors`, located under the import statement.
#[tracing::instrument(skip_all, fields(module = %module.name()))]
pub(crate) fn resolve_imported_modules(module: &mut Module, config: &ModuleParsingConfig) -> ModuleResult<()> {
    let targets = collect_targets(module, config)?;
    if targets.is_empty() {
        return Ok(());
    }

    let (mut sub_config, _) = config.with_shared_graph();
    sub_config.context = config.context.child();
    let siblings = sub_config.context.cancel_token().clone();

    let results: Mutex<Vec<(usize, ModuleResult<Module>)>> = Mutex::new(Vec::with_capacity(targets.len()));

    std::thread::scope(|scope| {
        for (index, (source, target)) in targets.iter().enumerate() {
            let sub_config = &sub_config;
            let siblings = &siblings;
            let results = &results;
            scope.spawn(move || {
                tracing::debug!(source = %source, "fetching imported module");
                let result = fetch_parse_imported_module(source, &target.validation, sub_config);
                if let Err(error) = &result {
                    if !is_soft_import_failure(error, sub_config) {
                        siblings.cancel();
                    }
                }
                results.lock().push((index, result));
            });
        }
    });

    let mut results = results.into_inner();
    results.sort_by_key(|(index, _)| *index);

    let mut fatal = Vec::new();
    for (index, result) in results {
        let Some((source, target)) = targets.get_index(index) else {
            continue;
        };
        match result {
            Ok(child) => {
                for error in &child.errors {
                    module.errors.push(error.relocated_under(&target.location));
                }
                module
                    .file_level_parsing_errors
                    .extend(child.file_level_parsing_errors.iter().cloned());

                let child = Arc::new(child);
                for stmt in &target.statements {
                    module.imported_modules_by_statement.insert(*stmt, child.clone());
                }
                module.imported_modules.insert(source.as_str().to_string(), child);
            }
            Err(error) if is_soft_import_failure(&error, config) => {
                module.errors.push(
                    Error::new(
                        ModuleError::ImportedModuleDoesNotExist(source.as_str().to_string()),
                        target.location.clone(),
                    )
                    .with_info(source.as_str()),
                );
            }
            Err(error) => fatal.push(error),
        }
    }

    // Tasks stopped by a failing sibling only add noise.
    if fatal.iter().any(|e| !matches!(e, ModuleError::Cancelled)) {
        fatal.retain(|e| !matches!(e, ModuleError::Cancelled));
    }

    match fatal.len() {
        0 => Ok(()),
        1 => Err(fatal.remove(0)),
        _ => Err(ModuleError::Multiple(fatal)),
    }
}

/// A missing local module, tolerated when recovering from missing files.
fn is_soft_import_failure(error: &ModuleError, config: &ModuleParsingConfig) -> bool {
    config.recover_from_non_existing_files && error.is_not_found()
}

/// Fetches the source of an imported module, then parses it with all its dependencies.
fn fetch_parse_imported_module(
    source: &ResourceName,
    validation: &str,
    config: &ModuleParsingConfig,
) -> ModuleResult<Module> {
    let ctx = &config.context;
    ctx.check_cancelled()?;

    if source.is_path() && source.is_relative() {
        return Err(ModuleError::InvalidImport(format!(
            "invalid source: {:?}, path should have been made absolute by the caller",
            source.as_str()
        )));
    }
    if !source.has_inox_extension() {
        return Err(ModuleError::InvalidImport(
            "path of imported module must end with '.ix'".into(),
        ));
    }

    let name = source.as_str();
    let (resource_dir, content) = match source {
        ResourceName::Path(path) => {
            let path = Path::new(path);
            let content = config.module_cache.fetch(name, validation, || {
                ctx.check_cancelled()?;
                match ctx.fs().entry_kind(path) {
                    Ok(EntryKind::Dir) => return Err(ModuleError::IsAFolder(name.to_string())),
                    Ok(EntryKind::File) => {}
                    Err(e) => return Err(ModuleError::io(name, e)),
                }
                ctx.fs().read(path).map_err(|e| ModuleError::io(name, e))
            })?;
            let dir = source.dir().map(|d| d.as_str().to_string()).unwrap_or_else(|| "/".into());
            (dir, content)
        }
        ResourceName::Url(_) => {
            let url_path = source.url_path().unwrap_or_default();
            if url_path.is_empty() || !url_path.starts_with('/') || url_path.ends_with('/') {
                return Err(ModuleError::InvalidModuleSourceUrl(name.to_string()));
            }
            let options = HttpGetOptions {
                timeout: config.effective_fetch_timeout(),
                insecure: config.insecure_module_imports,
            };
            let content = config.module_cache.fetch(name, validation, || {
                ctx.check_cancelled()?;
                config.http.get(name, options)
            })?;
            let dir = source.dir().map(|d| d.as_str().to_string()).unwrap_or_default();
            (dir, content)
        }
    };

    ctx.check_cancelled()?;
    let chunk_source = ChunkSource {
        name: name.to_string(),
        resource_dir,
        is_url: source.is_url(),
        code: content.to_string(),
    };
    parse_module_from_source(chunk_source, source.clone(), config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Context;
    use crate::module::parse_in_memory_module;
    use inox_common::MemoryFs;

    #[test]
    fn test_relative_source_in_local_module() {
        let fs = Arc::new(MemoryFs::new().with_file("/dir/mod.ix", "manifest {}"));
        let config = ModuleParsingConfig::new(Context::new(fs));
        let module = crate::module::parse_local_module("/dir/mod.ix", &config).unwrap();

        let resolved = source_from_import_source(ResourceName::parse("./lib/a.ix"), &module, &config).unwrap();
        assert_eq!(resolved, ResourceName::Path("/dir/lib/a.ix".into()));
    }

    #[test]
    fn test_relative_source_without_module_source() {
        let config = ModuleParsingConfig::default();
        let module = parse_in_memory_module("manifest {}", "repl", &config).unwrap();
        let err = source_from_import_source(ResourceName::parse("./a.ix"), &module, &config).unwrap_err();
        assert!(matches!(err, ModuleError::InvalidImport(_)));
    }
}
