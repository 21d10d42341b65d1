//! Ordered diagnostic collection.

use crate::{Diagnostic, Severity};

/// Diagnostics accumulated across pipeline stages.
///
/// Stages push in discovery order; [`Diagnostics::sort_by_location`] gives
/// the final source-ordered list the pipeline returns. The sort is stable,
/// so diagnostics without a location keep their stage order at the end.
#[derive(Clone, Debug, Default)]
pub struct Diagnostics {
    list: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.list.push(diagnostic);
    }

    pub fn extend(&mut self, diagnostics: impl IntoIterator<Item = Diagnostic>) {
        self.list.extend(diagnostics);
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.list.iter()
    }

    /// Whether any error-severity diagnostic has been recorded.
    pub fn has_errors(&self) -> bool {
        self.list.iter().any(Diagnostic::is_error)
    }

    /// Count of error-severity diagnostics.
    pub fn error_count(&self) -> usize {
        self.list.iter().filter(|d| d.is_error()).count()
    }

    /// Whether any always-fatal diagnostic has been recorded.
    pub fn has_fatal(&self) -> bool {
        self.list
            .iter()
            .any(|d| d.is_error() && d.code.is_always_fatal())
    }

    /// Elevate warnings to errors (strict mode at a stage boundary).
    pub fn escalate_warnings(&mut self) {
        for diagnostic in &mut self.list {
            if diagnostic.severity == Severity::Warning {
                diagnostic.severity = Severity::Error;
            }
        }
    }

    /// Stable sort by source location; unlocated diagnostics sink to the end.
    pub fn sort_by_location(&mut self) {
        self.list
            .sort_by_key(|d| d.loc.map_or((u32::MAX, u32::MAX), |loc| (loc.line, loc.column)));
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.list
    }
}

impl IntoIterator for Diagnostics {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.list.into_iter()
    }
}

impl From<Vec<Diagnostic>> for Diagnostics {
    fn from(list: Vec<Diagnostic>) -> Self {
        Diagnostics { list }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorCode;
    use ls_ir::Loc;
    use pretty_assertions::assert_eq;

    fn at(line: u32, column: u32) -> Diagnostic {
        Diagnostic::error(ErrorCode::ParseError, format!("at {line}:{column}"))
            .with_loc(Loc::new(line, column))
    }

    #[test]
    fn sort_orders_by_line_then_column() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.push(at(3, 1));
        diagnostics.push(at(1, 9));
        diagnostics.push(at(1, 2));
        diagnostics.sort_by_location();

        let messages: Vec<_> = diagnostics.iter().map(|d| d.message.clone()).collect();
        assert_eq!(messages, vec!["at 1:2", "at 1:9", "at 3:1"]);
    }

    #[test]
    fn unlocated_diagnostics_sink_to_end() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.push(Diagnostic::error(ErrorCode::MemoryLimit, "limit"));
        diagnostics.push(at(2, 2));
        diagnostics.sort_by_location();

        let last = diagnostics.iter().last().map(|d| d.message.clone());
        assert_eq!(last, Some("limit".to_string()));
    }

    #[test]
    fn escalate_turns_warnings_into_errors() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.push(Diagnostic::warning(ErrorCode::AstValidation, "w"));
        assert!(!diagnostics.has_errors());
        diagnostics.escalate_warnings();
        assert!(diagnostics.has_errors());
        assert_eq!(diagnostics.error_count(), 1);
    }

    #[test]
    fn fatal_requires_error_severity() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.push(Diagnostic::warning(ErrorCode::IrValidation, "w"));
        assert!(!diagnostics.has_fatal());
        diagnostics.push(Diagnostic::error(ErrorCode::IrValidation, "e"));
        assert!(diagnostics.has_fatal());
    }
}
