//! Stable diagnostic codes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Diagnostic code taxonomy.
///
/// One variant per failure class; the string form is part of the public
/// contract and never changes meaning across versions.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Serialize, Deserialize)]
pub enum ErrorCode {
    /// Input is not syntactically valid.
    ParseError,
    /// Parseable but semantically ill-formed (e.g. `await` outside `async`).
    AstValidation,
    /// Surface construct outside the supported subset.
    UnsupportedConstruct,
    /// Post-lowering structural invariant violated (a lowering bug).
    IrValidation,
    /// Emitter met a node kind it cannot print.
    EmitError,
    /// Resource bound exceeded.
    MemoryLimit,
    /// Selected backend cannot consume the IR.
    UnsupportedByBackend,
}

impl ErrorCode {
    pub const fn as_str(self) -> &'static str {
        match self {
            ErrorCode::ParseError => "ParseError",
            ErrorCode::AstValidation => "AstValidation",
            ErrorCode::UnsupportedConstruct => "UnsupportedConstruct",
            ErrorCode::IrValidation => "IrValidation",
            ErrorCode::EmitError => "EmitError",
            ErrorCode::MemoryLimit => "MemoryLimit",
            ErrorCode::UnsupportedByBackend => "UnsupportedByBackend",
        }
    }

    /// Codes that abort the pipeline regardless of strict mode.
    ///
    /// An IR validation failure means the emitter cannot trust the graph.
    pub const fn is_always_fatal(self) -> bool {
        matches!(self, ErrorCode::IrValidation)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_strings_are_stable() {
        assert_eq!(ErrorCode::ParseError.to_string(), "ParseError");
        assert_eq!(
            ErrorCode::UnsupportedConstruct.to_string(),
            "UnsupportedConstruct"
        );
        assert_eq!(ErrorCode::MemoryLimit.to_string(), "MemoryLimit");
    }

    #[test]
    fn only_ir_validation_is_always_fatal() {
        assert!(ErrorCode::IrValidation.is_always_fatal());
        assert!(!ErrorCode::ParseError.is_always_fatal());
        assert!(!ErrorCode::EmitError.is_always_fatal());
    }
}
