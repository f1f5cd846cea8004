//! Module parsing configuration.

use std::sync::Arc;
use std::time::Duration;

use inox_syntax::{ChunkCache, ParserOptions};

use crate::cache::ModuleCache;
use crate::context::Context;
use crate::error::DEFAULT_MAX_MOD_GRAPH_PATH_LEN;
use crate::fetch::{HttpClient, ReqwestClient};
use crate::graph::ModuleGraph;

/// Fetch timeout used when none is configured.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Timeout of each fetch issued for a module import.
pub const MOD_IMPORT_FETCH_TIMEOUT: Duration = Duration::from_secs(5);

/// Connection and TLS handshake timeout of HTTP fetches.
pub const HTTP_DIAL_TIMEOUT: Duration = Duration::from_secs(5);

/// Configuration shared by a module and every module it imports.
#[derive(Debug, Clone)]
pub struct ModuleParsingConfig {
    pub context: Context,
    pub single_file_parsing_timeout: Option<Duration>,
    pub chunk_cache: Option<Arc<ChunkCache>>,
    pub module_cache: Arc<ModuleCache>,
    /// Shared import graph. Created on first use when absent.
    pub module_graph: Option<Arc<ModuleGraph>>,
    /// Missing included files and imported modules become soft errors.
    pub recover_from_non_existing_files: bool,
    pub ignore_badly_configured_imports: bool,
    /// Skip TLS certificate verification for URL imports.
    pub insecure_module_imports: bool,
    pub fetch_timeout: Duration,
    pub max_import_depth: usize,
    pub http: Arc<dyn HttpClient>,
}

impl Default for ModuleParsingConfig {
    fn default() -> Self {
        Self::new(Context::default())
    }
}

impl ModuleParsingConfig {
    pub fn new(context: Context) -> Self {
        Self {
            context,
            single_file_parsing_timeout: None,
            chunk_cache: None,
            module_cache: Arc::new(ModuleCache::new()),
            module_graph: None,
            recover_from_non_existing_files: false,
            ignore_badly_configured_imports: false,
            insecure_module_imports: false,
            fetch_timeout: MOD_IMPORT_FETCH_TIMEOUT,
            max_import_depth: DEFAULT_MAX_MOD_GRAPH_PATH_LEN,
            http: Arc::new(ReqwestClient),
        }
    }

    pub fn with_parsing_timeout(mut self, timeout: Duration) -> Self {
        self.single_file_parsing_timeout = Some(timeout);
        self
    }

    pub fn with_chunk_cache(mut self, cache: Arc<ChunkCache>) -> Self {
        self.chunk_cache = Some(cache);
        self
    }

    pub fn with_module_cache(mut self, cache: Arc<ModuleCache>) -> Self {
        self.module_cache = cache;
        self
    }

    pub fn with_module_graph(mut self, graph: Arc<ModuleGraph>) -> Self {
        self.module_graph = Some(graph);
        self
    }

    pub fn recover_from_non_existing_files(mut self, recover: bool) -> Self {
        self.recover_from_non_existing_files = recover;
        self
    }

    pub fn ignore_badly_configured_imports(mut self, ignore: bool) -> Self {
        self.ignore_badly_configured_imports = ignore;
        self
    }

    pub fn insecure_module_imports(mut self, insecure: bool) -> Self {
        self.insecure_module_imports = insecure;
        self
    }

    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    pub fn with_max_import_depth(mut self, depth: usize) -> Self {
        self.max_import_depth = depth;
        self
    }

    pub fn with_http_client(mut self, http: impl HttpClient + 'static) -> Self {
        self.http = Arc::new(http);
        self
    }

    pub fn parser_options(&self) -> ParserOptions {
        ParserOptions {
            timeout: self.single_file_parsing_timeout,
            cache: self.chunk_cache.clone(),
        }
    }

    /// The configured fetch timeout, or the default one when it is zero.
    pub fn effective_fetch_timeout(&self) -> Duration {
        if self.fetch_timeout.is_zero() {
            DEFAULT_FETCH_TIMEOUT
        } else {
            self.fetch_timeout
        }
    }

    /// A copy that shares one import graph with every module it reaches.
    pub(crate) fn with_shared_graph(&self) -> (Self, Arc<ModuleGraph>) {
        let graph = self
            .module_graph
            .clone()
            .unwrap_or_else(|| Arc::new(ModuleGraph::new(self.max_import_depth)));
        let mut config = self.clone();
        config.module_graph = Some(graph.clone());
        (config, graph)
    }
}
