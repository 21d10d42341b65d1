//! Structured parse errors.

use ls_diagnostic::{Diagnostic, ErrorCode};
use ls_ir::{LineMap, Loc, Span};
use std::fmt;

/// A syntax error with its 1-based position and the offending source line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseError {
    pub message: String,
    pub line: u32,
    pub column: u32,
    pub snippet: String,
}

impl ParseError {
    /// Build an error from a span, resolving position and snippet.
    pub(crate) fn new(
        message: impl Into<String>,
        span: Span,
        source: &str,
        line_map: &LineMap,
    ) -> Self {
        let loc = line_map.loc(span.start);
        let snippet = line_map
            .line_range(loc.line)
            .and_then(|range| source.get(range))
            .unwrap_or_default()
            .to_string();
        ParseError {
            message: message.into(),
            line: loc.line,
            column: loc.column,
            snippet,
        }
    }

    pub fn loc(&self) -> Loc {
        Loc::new(self.line, self.column)
    }

    /// Convert into a pipeline diagnostic.
    pub fn into_diagnostic(self) -> Diagnostic {
        let loc = self.loc();
        Diagnostic::error(ErrorCode::ParseError, self.message).with_loc(loc)
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}: {}", self.line, self.column, self.message)?;
        if !self.snippet.is_empty() {
            write!(f, "\n  {}", self.snippet)?;
        }
        Ok(())
    }
}

impl std::error::Error for ParseError {}
