//! Error types for module resolution.
//!
//! [`ModuleError`] is the kind of a failure. Fatal failures are returned as
//! `Err(ModuleError)`; soft ones are wrapped into a located [`Error`] and
//! accumulated on the module being built.

use std::fmt;
use std::io;
use std::sync::Arc;

use inox_common::{PositionStack, Report};
use inox_syntax::ParseFailure;
use thiserror::Error;

/// Maximum length of an import chain, in edges.
pub const DEFAULT_MAX_MOD_GRAPH_PATH_LEN: usize = 5;

/// A module resolution failure.
#[derive(Debug, Clone, Error)]
pub enum ModuleError {
    #[error("file to include does not exist: {0}")]
    FileToIncludeDoesNotExist(String),

    #[error("file to include is a folder: {0}")]
    FileToIncludeIsAFolder(String),

    #[error("included file path should not contain '..'")]
    IncludedPathContainsDotDot,

    #[error("included files should not contain a manifest: {0}")]
    NotAnIncludableFile(String),

    #[error("included files should start with the includable-file keyword: {0}")]
    MissingIncludableMarker(String),

    #[error("file already included: {0}")]
    FileAlreadyIncluded(String),

    #[error("missing manifest in module {0}: the file should start with 'manifest {{}}'")]
    MissingManifest(String),

    #[error("invalid module kind: {0:?}")]
    InvalidModuleKind(String),

    #[error("inclusion import statements found in in-memory module {0}")]
    InclusionInMemoryModule(String),

    #[error("import cycle detected: {0}")]
    ImportCycleDetected(String),

    #[error("the module import depth has exceeded the maximum ({max}): path is {path}")]
    MaxModuleImportDepthExceeded { max: usize, path: String },

    #[error("invalid module source URL: {0}")]
    InvalidModuleSourceUrl(String),

    #[error("absolute module source path used in module imported from URL")]
    AbsolutePathInUrlModule,

    #[error("invalid resource name: {0:?}, path should have been made absolute by the caller")]
    InvalidResourceName(String),

    #[error("invalid module import: {0}")]
    InvalidImport(String),

    #[error("imported module does not exist: {0}")]
    ImportedModuleDoesNotExist(String),

    #[error("{0} is a folder")]
    IsAFolder(String),

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: Arc<io::Error>,
    },

    #[error("{0}")]
    Retrieval(String),

    #[error("failed to get {0}: validation failed")]
    ValidationFailed(String),

    /// A recoverable parse error, located by the wrapping [`Error`].
    #[error("{0}")]
    Parse(String),

    #[error(transparent)]
    ParseFailure(#[from] ParseFailure),

    #[error("module resolution was cancelled")]
    Cancelled,

    /// Several concurrent imports failed.
    #[error("{}", join_lines(.0))]
    Multiple(Vec<ModuleError>),
}

fn join_lines(errors: &[ModuleError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

impl ModuleError {
    pub fn io(path: impl Into<String>, source: io::Error) -> Self {
        ModuleError::Io {
            path: path.into(),
            source: Arc::new(source),
        }
    }

    /// The failure is a missing file or folder.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ModuleError::Io { source, .. } if source.kind() == io::ErrorKind::NotFound)
    }

    /// The failure or one of the failures it groups is an import cycle.
    pub fn is_import_cycle(&self) -> bool {
        match self {
            ModuleError::ImportCycleDetected(_) => true,
            ModuleError::Multiple(errors) => errors.iter().any(ModuleError::is_import_cycle),
            _ => false,
        }
    }

    pub fn is_max_depth_exceeded(&self) -> bool {
        match self {
            ModuleError::MaxModuleImportDepthExceeded { .. } => true,
            ModuleError::Multiple(errors) => errors.iter().any(ModuleError::is_max_depth_exceeded),
            _ => false,
        }
    }
}

/// Result type for module resolution.
pub type ModuleResult<T> = Result<T, ModuleError>;

/// A soft error together with where it happened.
#[derive(Debug, Clone)]
pub struct Error {
    pub error: ModuleError,
    /// Import sites first, the innermost location last. Empty when unknown.
    pub location: PositionStack,
    pub additional_info: Option<String>,
}

impl Error {
    pub fn new(error: ModuleError, location: PositionStack) -> Self {
        Self {
            error,
            location,
            additional_info: None,
        }
    }

    pub fn with_info(mut self, info: impl Into<String>) -> Self {
        self.additional_info = Some(info.into());
        self
    }

    /// Places `outer` before the current location.
    pub fn relocated_under(&self, outer: &PositionStack) -> Self {
        Self {
            error: self.error.clone(),
            location: self.location.prefixed_with(outer),
            additional_info: self.additional_info.clone(),
        }
    }

    pub fn is_parse_error(&self) -> bool {
        matches!(self.error, ModuleError::Parse(_))
    }

    pub fn to_report(&self) -> Report {
        Report::error(self.error.to_string(), self.location.clone())
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.location, self.error)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

/// Soft errors of a module shown as one multi-line error.
#[derive(Debug, Clone)]
pub struct CombinedErrors {
    pub errors: Vec<Error>,
}

impl CombinedErrors {
    /// `None` when there is nothing to combine.
    pub fn from_errors(errors: &[Error]) -> Option<Self> {
        if errors.is_empty() {
            None
        } else {
            Some(Self {
                errors: errors.to_vec(),
            })
        }
    }
}

impl fmt::Display for CombinedErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, error) in self.errors.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", error)?;
        }
        Ok(())
    }
}

impl std::error::Error for CombinedErrors {}

#[cfg(test)]
mod tests {
    use super::*;
    use inox_common::SourceFile;
    use inox_common::Span;

    #[test]
    fn test_located_display() {
        let file = SourceFile::new("/main.ix", "manifest {}\nimport ./a.ix");
        let location = PositionStack::single(file.position(Span::new(12, 25)));
        let error = Error::new(ModuleError::FileToIncludeDoesNotExist("/a.ix".into()), location);
        assert_eq!(
            error.to_string(),
            "/main.ix:2:1: file to include does not exist: /a.ix"
        );
    }

    #[test]
    fn test_combined_errors() {
        assert!(CombinedErrors::from_errors(&[]).is_none());
        let errors = vec![
            Error::new(ModuleError::Parse("a".into()), PositionStack::new()),
            Error::new(ModuleError::Parse("b".into()), PositionStack::new()),
        ];
        let combined = CombinedErrors::from_errors(&errors).unwrap();
        assert_eq!(combined.to_string(), "a\nb");
    }

    #[test]
    fn test_multiple_detects_cycle() {
        let error = ModuleError::Multiple(vec![
            ModuleError::Cancelled,
            ModuleError::ImportCycleDetected("/a.ix -> /a.ix".into()),
        ]);
        assert!(error.is_import_cycle());
        assert!(!error.is_max_depth_exceeded());
    }
}
