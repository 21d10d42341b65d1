//! The diagnostic record.

use crate::ErrorCode;
use ls_ir::{Loc, NodeId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity level for diagnostics.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Info => write!(f, "info"),
        }
    }
}

/// A structured compiler message.
///
/// `loc` is the 1-based source position when one is known; `node_id` names
/// the offending IR node for post-lowering diagnostics.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
#[must_use = "diagnostics should be reported or returned, not silently dropped"]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: ErrorCode,
    pub message: String,
    pub loc: Option<Loc>,
    #[serde(rename = "nodeId", skip_serializing_if = "Option::is_none", default)]
    pub node_id: Option<NodeId>,
}

impl Diagnostic {
    /// Create an error-severity diagnostic.
    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        Diagnostic {
            severity: Severity::Error,
            code,
            message: message.into(),
            loc: None,
            node_id: None,
        }
    }

    /// Create a warning-severity diagnostic.
    pub fn warning(code: ErrorCode, message: impl Into<String>) -> Self {
        Diagnostic {
            severity: Severity::Warning,
            code,
            message: message.into(),
            loc: None,
            node_id: None,
        }
    }

    /// Create an info-severity diagnostic.
    pub fn info(code: ErrorCode, message: impl Into<String>) -> Self {
        Diagnostic {
            severity: Severity::Info,
            code,
            message: message.into(),
            loc: None,
            node_id: None,
        }
    }

    /// Attach a source location.
    pub fn with_loc(mut self, loc: Loc) -> Self {
        self.loc = Some(loc);
        self
    }

    /// Attach the offending IR node.
    pub fn with_node(mut self, id: NodeId) -> Self {
        self.node_id = Some(id);
        self
    }

    /// Downgrade an error to a warning (non-strict AST validation).
    pub fn downgraded(mut self) -> Self {
        if self.severity == Severity::Error {
            self.severity = Severity::Warning;
        }
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.severity, self.code)?;
        if let Some(loc) = self.loc {
            write!(f, " {loc}")?;
        }
        write!(f, " {}", self.message)?;
        if let Some(id) = self.node_id {
            write!(f, " ({id})")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn display_includes_code_and_loc() {
        let diagnostic = Diagnostic::error(ErrorCode::ParseError, "unexpected token `}`")
            .with_loc(Loc::new(3, 7));
        assert_eq!(
            diagnostic.to_string(),
            "error[ParseError] 3:7 unexpected token `}`"
        );
    }

    #[test]
    fn display_includes_node_id() {
        let diagnostic = Diagnostic::error(ErrorCode::IrValidation, "dangling reference")
            .with_node(NodeId::new(9));
        assert_eq!(
            diagnostic.to_string(),
            "error[IrValidation] dangling reference (node_9)"
        );
    }

    #[test]
    fn downgrade_only_touches_errors() {
        let warned = Diagnostic::error(ErrorCode::AstValidation, "x").downgraded();
        assert_eq!(warned.severity, Severity::Warning);
        let info = Diagnostic::info(ErrorCode::AstValidation, "x").downgraded();
        assert_eq!(info.severity, Severity::Info);
    }
}
