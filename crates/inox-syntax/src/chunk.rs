//! Parsed source chunks and the parsed-chunk cache.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use inox_common::{SourceFile, SourcePosition, Span};
use parking_lot::Mutex;

use crate::ast::Node;
use crate::parser::{ParseError, ParseFailure, Parser};

/// Text of one resource, ready to be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkSource {
    /// Canonical resource name: an absolute path or a URL.
    pub name: String,
    /// Directory of the resource, used to resolve relative paths.
    pub resource_dir: String,
    pub is_url: bool,
    pub code: String,
}

impl ChunkSource {
    /// A source named by an absolute path; the resource directory is derived from it.
    pub fn from_path(name: impl Into<String>, code: impl Into<String>) -> Self {
        let name = name.into();
        let resource_dir = match name.rfind('/') {
            Some(i) => name[..=i].to_string(),
            None => "/".to_string(),
        };
        Self {
            name,
            resource_dir,
            is_url: false,
            code: code.into(),
        }
    }
}

/// A parsed chunk: the tree and the errors recovered while building it.
#[derive(Debug)]
pub struct ParsedChunk {
    pub source: ChunkSource,
    pub node: Node,
    pub errors: Vec<ParseError>,
    file: SourceFile,
}

impl ParsedChunk {
    pub fn name(&self) -> &str {
        &self.source.name
    }

    pub fn file(&self) -> &SourceFile {
        &self.file
    }

    /// Position of `span` inside this chunk.
    pub fn position(&self, span: Span) -> SourcePosition {
        self.file.position(span)
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// The chunk starts with `includable-file`.
    pub fn is_includable(&self) -> bool {
        matches!(
            self.node.kind,
            crate::ast::NodeKind::Chunk {
                includable: true,
                ..
            }
        )
    }
}

/// Options of [`parse_chunk_source`].
#[derive(Debug, Clone, Default)]
pub struct ParserOptions {
    pub timeout: Option<Duration>,
    pub cache: Option<Arc<ChunkCache>>,
}

/// Parsed chunks keyed by resource name.
///
/// An entry is reused only while the code it was parsed from is unchanged.
#[derive(Debug, Default)]
pub struct ChunkCache {
    entries: Mutex<HashMap<String, Arc<ParsedChunk>>>,
}

impl ChunkCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, source: &ChunkSource) -> Option<Arc<ParsedChunk>> {
        let entries = self.entries.lock();
        entries
            .get(&source.name)
            .filter(|chunk| chunk.source.code == source.code)
            .cloned()
    }

    pub fn put(&self, chunk: Arc<ParsedChunk>) {
        self.entries.lock().insert(chunk.source.name.clone(), chunk);
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Parses `source`. Recoverable errors are attached to the returned chunk;
/// an `Err` means no tree could be produced.
pub fn parse_chunk_source(source: ChunkSource, options: &ParserOptions) -> Result<Arc<ParsedChunk>, ParseFailure> {
    if let Some(cached) = options.cache.as_ref().and_then(|cache| cache.get(&source)) {
        return Ok(cached);
    }

    let mut parser = Parser::new(&source.code);
    if let Some(timeout) = options.timeout {
        parser = parser.with_deadline(Instant::now() + timeout);
    }
    let Some((node, errors)) = parser.parse_chunk() else {
        return Err(ParseFailure::Timeout {
            name: source.name.clone(),
            timeout: options.timeout.unwrap_or_default(),
        });
    };

    let file = SourceFile::new(source.name.as_str(), source.code.as_str());
    let chunk = Arc::new(ParsedChunk {
        source,
        node,
        errors,
        file,
    });
    if let Some(cache) = &options.cache {
        cache.put(chunk.clone());
    }
    Ok(chunk)
}

/// Parses an in-memory snippet, mostly for tests.
pub fn parse_chunk(name: &str, code: &str) -> Result<Arc<ParsedChunk>, ParseFailure> {
    parse_chunk_source(ChunkSource::from_path(name, code), &ParserOptions::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_of_error() {
        let chunk = parse_chunk("/main.ix", "manifest {}\nvar = 1").unwrap();
        assert_eq!(chunk.errors.len(), 1);
        let position = chunk.position(chunk.errors[0].span);
        assert_eq!(position.to_string(), "/main.ix:2:5");
    }

    #[test]
    fn test_cache_returns_same_chunk_for_same_code() {
        let cache = Arc::new(ChunkCache::new());
        let options = ParserOptions {
            timeout: None,
            cache: Some(cache.clone()),
        };

        let first = parse_chunk_source(ChunkSource::from_path("/a.ix", "manifest {}"), &options).unwrap();
        let second = parse_chunk_source(ChunkSource::from_path("/a.ix", "manifest {}"), &options).unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        let changed = parse_chunk_source(ChunkSource::from_path("/a.ix", "manifest {}\n"), &options).unwrap();
        assert!(!Arc::ptr_eq(&first, &changed));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_resource_dir() {
        let source = ChunkSource::from_path("/dir/sub/mod.ix", "");
        assert_eq!(source.resource_dir, "/dir/sub/");
    }

    #[test]
    fn test_zero_timeout_fails() {
        let options = ParserOptions {
            timeout: Some(Duration::ZERO),
            cache: None,
        };
        let result = parse_chunk_source(ChunkSource::from_path("/a.ix", "var x = 1"), &options);
        assert!(matches!(result, Err(ParseFailure::Timeout { .. })));
    }
}
