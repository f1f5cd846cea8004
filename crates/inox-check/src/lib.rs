//! Static checker for Inox modules.
//!
//! The checker walks a parsed chunk once and reports:
//!
//! - references to undeclared variables, patterns and namespaces;
//! - misplaced statements (`break` outside a loop, `self` outside a method,
//!   pattern definitions after the first function reference, ...);
//! - invalid literals, duplicate keys and invalid manifests.
//!
//! Included chunks and imported modules are checked by nested checkers, with
//! their errors located by a position stack starting at the including
//! statement. The output [`Data`] also carries the globals captured by each
//! function and the functions that must be declared before the module runs.
//!
//! # Example
//!
//! ```ignore
//! use inox_check::{check, CheckInput};
//!
//! let chunk = inox_syntax::parse_chunk("/main.ix", "manifest {}\n$$x = 1")?;
//! let data = check(&CheckInput::for_chunk(&chunk).with_defaults())?;
//! assert!(!data.has_errors());
//! ```

mod check;
mod data;
mod error;
mod globals;
mod manifest;
pub mod messages;

pub use check::CheckInput;
pub use data::{Data, FunctionStaticData, MappingStaticData};
pub use error::{CheckError, CombinedStaticCheckErrors, StaticCheckError, StaticCheckWarning};
pub use globals::{
    default_globals, default_pattern_namespaces, default_patterns, GlobalVarInfo, CURRENT_TEST, MOD_ARGS_VARNAME,
    USABLE_GLOBALS_IN_CONST_DECLS,
};
pub use manifest::{allowed_sections, check_manifest_object, PERMISSION_KINDS};

use check::Checker;

/// Checks the node of `input` and everything it includes or imports.
///
/// Static errors are collected in the returned [`Data`]. An `Err` means the
/// check could not complete.
#[tracing::instrument(skip_all, fields(chunk = input.chunk.name()))]
pub fn check(input: &CheckInput<'_>) -> Result<Data, CheckError> {
    Checker::new(input).run()
}
