//! Diagnostic utilities shared across the workspace.
//!
//! Semantic passes report user-facing problems here instead of unwinding,
//! so a single traversal can surface many independent errors. The outer
//! driver inspects [`Diagnostics::count`] afterwards to decide whether later
//! phases should run.

pub mod echo;
pub mod line;

use std::fmt;
use std::io::{self, Write};

pub use echo::Echo;
pub use line::{Line, LineCounter};

/// Categories of user-facing front-end errors.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    UndeclaredIdentifier,
    UndeclaredType,
    LexicalError,
    /// Call site disagrees with the callee's registered signature.
    CallMismatch,
    Redeclaration,
    Custom(String),
}

impl DiagnosticKind {
    pub fn as_str(&self) -> &str {
        match self {
            DiagnosticKind::UndeclaredIdentifier => "UndeclaredIdentifier",
            DiagnosticKind::UndeclaredType => "UndeclaredType",
            DiagnosticKind::LexicalError => "LexicalError",
            DiagnosticKind::CallMismatch => "CallMismatch",
            DiagnosticKind::Redeclaration => "Redeclaration",
            DiagnosticKind::Custom(name) => name,
        }
    }
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single recorded diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Position in recording order, starting at zero.
    pub index: usize,
    pub kind: DiagnosticKind,
    pub line: Line,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]: {} (line: {})", self.kind, self.message, self.line)
    }
}

/// Append-only collector of diagnostics for one compilation pass.
#[derive(Debug, Default)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
    echo: Echo,
}

impl Diagnostics {
    /// Collector that echoes every diagnostic to standard error.
    pub fn new() -> Self {
        Self::default()
    }

    /// Collector that keeps diagnostics in memory only.
    pub fn silent() -> Self {
        Self::with_echo(Echo::Silent)
    }

    pub fn with_echo(echo: Echo) -> Self {
        Self {
            entries: Vec::new(),
            echo,
        }
    }

    /// Record a diagnostic and render it immediately.
    pub fn record(
        &mut self,
        kind: DiagnosticKind,
        line: u32,
        message: impl Into<String>,
    ) -> &Diagnostic {
        let diagnostic = Diagnostic {
            index: self.entries.len(),
            kind,
            line: Line(line),
            message: message.into(),
        };

        let rendered = diagnostic.to_string();
        tracing::warn!(index = diagnostic.index, "{}", rendered);
        if let Err(err) = self.echo.emit(&rendered) {
            tracing::error!("failed to echo diagnostic: {}", err);
        }

        self.entries.push(diagnostic);
        &self.entries[self.entries.len() - 1]
    }

    /// Render every collected diagnostic again, in recording order, to the
    /// collector's own sink.
    pub fn replay(&mut self) -> io::Result<()> {
        for diagnostic in &self.entries {
            self.echo.emit(&diagnostic.to_string())?;
        }
        Ok(())
    }

    /// Render every collected diagnostic, in recording order, to `writer`.
    pub fn replay_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        for diagnostic in &self.entries {
            writeln!(writer, "{}", diagnostic)?;
        }
        Ok(())
    }

    /// Rendered lines in recording order.
    pub fn rendered(&self) -> Vec<String> {
        self.entries.iter().map(ToString::to_string).collect()
    }

    pub fn count(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }

    pub fn has_kind(&self, kind: &DiagnosticKind) -> bool {
        self.entries.iter().any(|diagnostic| &diagnostic.kind == kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl SharedBuffer {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    #[test]
    fn record_renders_kind_message_and_line() {
        let buffer = SharedBuffer::default();
        let mut diagnostics = Diagnostics::with_echo(Echo::Writer(Box::new(buffer.clone())));

        let recorded = diagnostics.record(
            DiagnosticKind::UndeclaredIdentifier,
            7,
            "identifier `x` not declared",
        );
        assert_eq!(recorded.index, 0);

        assert_eq!(
            buffer.contents(),
            "[UndeclaredIdentifier]: identifier `x` not declared (line: 7)\n"
        );
    }

    #[test]
    fn count_and_replay_preserve_recording_order() {
        let mut diagnostics = Diagnostics::silent();
        diagnostics.record(DiagnosticKind::LexicalError, 1, "bad token `@`");
        diagnostics.record(DiagnosticKind::CallMismatch, 4, "function g not declared");
        diagnostics.record(DiagnosticKind::Custom("KeyError".into()), 9, "missing key");

        assert_eq!(diagnostics.count(), 3);

        let mut out = Vec::new();
        diagnostics.replay_to(&mut out).unwrap();
        let replayed = String::from_utf8(out).unwrap();
        assert_eq!(
            replayed,
            "[LexicalError]: bad token `@` (line: 1)\n\
             [CallMismatch]: function g not declared (line: 4)\n\
             [KeyError]: missing key (line: 9)\n"
        );
        assert_eq!(diagnostics.rendered().len(), 3);
        let indices: Vec<_> = diagnostics.iter().map(|d| d.index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[test]
    fn replay_writes_to_own_sink_again() {
        let buffer = SharedBuffer::default();
        let mut diagnostics = Diagnostics::with_echo(Echo::Writer(Box::new(buffer.clone())));
        diagnostics.record(DiagnosticKind::LexicalError, 2, "unterminated string");
        diagnostics.replay().unwrap();

        let contents = buffer.contents();
        assert_eq!(contents.lines().count(), 2);
        assert!(contents.lines().all(|line| line.starts_with("[LexicalError]")));
    }

    #[test]
    fn has_kind_matches_recorded_categories() {
        let mut diagnostics = Diagnostics::silent();
        assert!(diagnostics.is_empty());
        diagnostics.record(DiagnosticKind::Redeclaration, 3, "x redeclared");
        assert!(diagnostics.has_kind(&DiagnosticKind::Redeclaration));
        assert!(!diagnostics.has_kind(&DiagnosticKind::UndeclaredType));
    }
}
