//! Checker diagnostics.
//!
//! Rule violations are accumulated as [`StaticCheckError`]s and
//! [`StaticCheckWarning`]s in the checker output. [`CheckError`] is reserved
//! for conditions that make the whole check meaningless.

use std::fmt;

use inox_common::{PositionStack, Report};
use thiserror::Error;

const MESSAGE_PREFIX: &str = "check: ";

/// A rule violation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticCheckError {
    /// `check: <text>`
    pub message: String,
    /// `check: <position stack><text>`
    pub located_message: String,
    pub location: PositionStack,
}

impl StaticCheckError {
    pub fn new(text: &str, location: PositionStack) -> Self {
        Self {
            message: format!("{}{}", MESSAGE_PREFIX, text),
            located_message: format!("{}{}{}", MESSAGE_PREFIX, location, text),
            location,
        }
    }

    /// The message without the `check: ` prefix.
    pub fn text(&self) -> &str {
        self.message.strip_prefix(MESSAGE_PREFIX).unwrap_or(&self.message)
    }

    pub fn to_report(&self) -> Report {
        Report::error(self.text(), self.location.clone())
    }
}

impl fmt::Display for StaticCheckError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.located_message)
    }
}

impl std::error::Error for StaticCheckError {}

/// A non-fatal remark, same shape as [`StaticCheckError`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticCheckWarning {
    pub message: String,
    pub located_message: String,
    pub location: PositionStack,
}

impl StaticCheckWarning {
    pub fn new(text: &str, location: PositionStack) -> Self {
        Self {
            message: format!("{}{}", MESSAGE_PREFIX, text),
            located_message: format!("{}{}{}", MESSAGE_PREFIX, location, text),
            location,
        }
    }

    pub fn text(&self) -> &str {
        self.message.strip_prefix(MESSAGE_PREFIX).unwrap_or(&self.message)
    }

    pub fn to_report(&self) -> Report {
        Report::warning(self.text(), self.location.clone())
    }
}

impl fmt::Display for StaticCheckWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.located_message)
    }
}

/// Every error of a check, displayed one per line.
#[derive(Debug, Clone)]
pub struct CombinedStaticCheckErrors {
    pub errors: Vec<StaticCheckError>,
}

impl CombinedStaticCheckErrors {
    /// `None` when there is nothing to combine.
    pub fn from_errors(errors: &[StaticCheckError]) -> Option<Self> {
        if errors.is_empty() {
            None
        } else {
            Some(Self {
                errors: errors.to_vec(),
            })
        }
    }
}

impl fmt::Display for CombinedStaticCheckErrors {
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

impl std::error::Error for CombinedStaticCheckErrors {}

/// Aborts a check.
#[derive(Debug, Clone, Error)]
pub enum CheckError {
    #[error("{0} statement found in a chunk that does not belong to a module")]
    MissingModule(&'static str),

    #[error("static check stopped: {0}")]
    Stopped(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use inox_common::{LineCol, SourcePosition, Span};

    fn location() -> PositionStack {
        PositionStack::single(SourcePosition::new(
            "/main.ix",
            LineCol { line: 2, column: 5 },
            LineCol { line: 2, column: 9 },
            Span::new(10, 14),
        ))
    }

    #[test]
    fn test_error_messages() {
        let error = StaticCheckError::new("misplaced return statement", location());
        assert_eq!(error.message, "check: misplaced return statement");
        assert_eq!(error.text(), "misplaced return statement");
        assert_eq!(error.located_message, "check: /main.ix:2:5: misplaced return statement");
    }

    #[test]
    fn test_combined_errors() {
        assert!(CombinedStaticCheckErrors::from_errors(&[]).is_none());

        let errors = vec![
            StaticCheckError::new("a", location()),
            StaticCheckError::new("b", location()),
        ];
        let combined = CombinedStaticCheckErrors::from_errors(&errors).unwrap();
        assert_eq!(combined.to_string(), "check: /main.ix:2:5: a\ncheck: /main.ix:2:5: b");
    }
}
