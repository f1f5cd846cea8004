//! Terminal rendering of located errors and warnings.

use std::io;

use codespan_reporting::diagnostic::{Diagnostic, Label, Severity as CsSeverity};
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term;
use rustc_hash::FxHashMap;
use termcolor::{ColorChoice, StandardStream, WriteColor};

use crate::source::PositionStack;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

/// A message attached to a position stack.
#[derive(Debug, Clone)]
pub struct Report {
    pub severity: Severity,
    pub message: String,
    pub location: PositionStack,
}

impl Report {
    pub fn error(message: impl Into<String>, location: PositionStack) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
            location,
        }
    }

    pub fn warning(message: impl Into<String>, location: PositionStack) -> Self {
        Self {
            severity: Severity::Warning,
            message: message.into(),
            location,
        }
    }
}

/// Renders [`Report`]s with source snippets when the source text is known.
pub struct DiagnosticEmitter {
    files: SimpleFiles<String, String>,
    ids: FxHashMap<String, usize>,
}

impl Default for DiagnosticEmitter {
    fn default() -> Self {
        Self::new()
    }
}

impl DiagnosticEmitter {
    pub fn new() -> Self {
        Self {
            files: SimpleFiles::new(),
            ids: FxHashMap::default(),
        }
    }

    /// Registers the text of a resource so its positions can be rendered.
    pub fn add_source(&mut self, name: impl Into<String>, source: impl Into<String>) {
        let name = name.into();
        if self.ids.contains_key(&name) {
            return;
        }
        let id = self.files.add(name.clone(), source.into());
        self.ids.insert(name, id);
    }

    pub fn has_source(&self, name: &str) -> bool {
        self.ids.contains_key(name)
    }

    /// Emits to stderr, with colors when `color` is set and the terminal supports them.
    pub fn emit_stderr(&self, report: &Report, color: bool) -> io::Result<()> {
        let choice = if color { ColorChoice::Auto } else { ColorChoice::Never };
        let stream = StandardStream::stderr(choice);
        let mut lock = stream.lock();
        self.emit(&mut lock, report)
    }

    pub fn emit(&self, writer: &mut dyn WriteColor, report: &Report) -> io::Result<()> {
        let innermost = report.location.innermost();
        let file_id = innermost.and_then(|p| self.ids.get(p.source_name.as_ref()).copied());

        let (Some(position), Some(file_id)) = (innermost, file_id) else {
            let prefix = report.location.to_string();
            return writeln!(writer, "{}{}", prefix, report.message);
        };

        let severity = match report.severity {
            Severity::Error => CsSeverity::Error,
            Severity::Warning => CsSeverity::Warning,
        };

        let range = position.span.start as usize..position.span.end as usize;
        let notes = report.location.entries()[..report.location.len() - 1]
            .iter()
            .map(|outer| format!("via {}", outer))
            .collect();

        let diagnostic = Diagnostic::new(severity)
            .with_message(&report.message)
            .with_labels(vec![Label::primary(file_id, range)])
            .with_notes(notes);

        term::emit(writer, &term::Config::default(), &self.files, &diagnostic)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::SourceFile;
    use crate::span::Span;
    use termcolor::NoColor;

    #[test]
    fn test_default_emitter_has_no_sources() {
        let mut emitter = DiagnosticEmitter::default();
        assert!(!emitter.has_source("/main.ix"));
        emitter.add_source("/main.ix", "manifest {}");
        emitter.add_source("/main.ix", "ignored");
        assert!(emitter.has_source("/main.ix"));
    }

    #[test]
    fn test_emit_without_source_falls_back_to_plain_text() {
        let file = SourceFile::new("/main.ix", "1..0");
        let report = Report::error("bad range", PositionStack::single(file.position(Span::new(0, 4))));

        let emitter = DiagnosticEmitter::new();
        let mut out = NoColor::new(Vec::new());
        emitter.emit(&mut out, &report).unwrap();

        let text = String::from_utf8(out.into_inner()).unwrap();
        assert_eq!(text, "/main.ix:1:1: bad range\n");
    }

    #[test]
    fn test_emit_with_source_renders_snippet() {
        let file = SourceFile::new("/main.ix", "manifest {}\n1..0\n");
        let report = Report::error("bad range", PositionStack::single(file.position(Span::new(12, 16))));

        let mut emitter = DiagnosticEmitter::new();
        emitter.add_source("/main.ix", file.source());
        let mut out = NoColor::new(Vec::new());
        emitter.emit(&mut out, &report).unwrap();

        let text = String::from_utf8(out.into_inner()).unwrap();
        assert!(text.contains("bad range"));
        assert!(text.contains("/main.ix:2:1"));
    }
}
