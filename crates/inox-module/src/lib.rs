//! Module resolution for Inox.
//!
//! Loading a module parses its main chunk, then builds two dependency sets:
//!
//! - **Inclusions**: `import ./file.ix` statements textually include
//!   `includable-file` chunks, recursively, into an inclusion forest.
//! - **Module imports**: `import name <source> {config}` statements load other
//!   modules from the filesystem or over HTTPS, concurrently, each parsed with
//!   the same pipeline.
//!
//! Imports are registered in a shared [`ModuleGraph`] that rejects cycles and
//! chains deeper than the configured maximum before anything is fetched.
//! Fetched contents are kept in a [`ModuleCache`] keyed by their SHA-256.
//!
//! # Example
//!
//! ```ignore
//! use inox_module::{parse_local_module, ModuleParsingConfig};
//!
//! let module = parse_local_module("main.ix", &ModuleParsingConfig::default())?;
//! if let Some(errors) = module.combined_error() {
//!     eprintln!("{}", errors);
//! }
//! ```

mod cache;
mod config;
mod context;
mod error;
mod fetch;
mod graph;
mod include;
mod module;
mod permission;
mod resource;

pub use cache::{sha256_hex, ModuleCache};
pub use config::{ModuleParsingConfig, DEFAULT_FETCH_TIMEOUT, HTTP_DIAL_TIMEOUT, MOD_IMPORT_FETCH_TIMEOUT};
pub use context::{CancelToken, Context};
pub use error::{CombinedErrors, Error, ModuleError, ModuleResult, DEFAULT_MAX_MOD_GRAPH_PATH_LEN};
pub use fetch::{
    source_from_import_source, HttpClient, HttpGetOptions, ReqwestClient, IMPORT_CONFIG_VALIDATION_PROPNAME, INOX_MIMETYPE,
};
pub use graph::{CycleDetected, GraphNodeId, ModuleGraph};
pub use module::{
    manifest_section, manifest_section_of_object, parse_in_memory_module, parse_local_module,
    parse_module_from_source, unchecked_module_kind_name, IncludedChunk, Module, ModuleKind,
    MANIFEST_KIND_SECTION_NAME,
};
pub use permission::{AllowAll, Permission, PermissionChecker, PermissionSet};
pub use resource::{clean_path, ResourceName, INOX_FILE_EXTENSION, INOX_SPEC_FILE_SUFFIX};
