//! Shared infrastructure for the Inox front-end.
//!
//! - [`span`]: byte ranges into source text
//! - [`source`]: line tables, source positions and position stacks
//! - [`vfs`]: the filesystem seam used by module resolution
//! - [`diagnostics`]: terminal rendering of located messages

pub mod diagnostics;
pub mod source;
pub mod span;
pub mod vfs;

pub use diagnostics::{DiagnosticEmitter, Report, Severity};
pub use source::{LineCol, PositionStack, SourceFile, SourcePosition};
pub use span::Span;
pub use vfs::{EntryKind, FileSystem, MemoryFs, RealFs};

pub use rustc_hash::{FxHashMap, FxHashSet};
