//! Recursive descent parser for the LuaScript surface language.
//!
//! Produces the ESTree-shaped [`ls_ir::ast`] tree. Two entry points:
//!
//! - [`parse`] is strict: the first syntax error aborts and is returned.
//! - [`parse_with_recovery`] is tolerant: on error the parser synchronizes at
//!   the next statement boundary and keeps going, so downstream stages see a
//!   best-effort tree and every error is reported at once.
//!
//! Semicolons are inserted automatically at line breaks, closing braces,
//! and end of input; `return`/`break`/`continue`/`throw` are restricted
//! productions that stop at a newline.

mod cursor;
mod error;
mod grammar;
mod recovery;
pub mod validate;

#[cfg(test)]
mod tests;

pub use error::ParseError;

use grammar::Parser;
use ls_ir::ast::{Dialect, Program};
use ls_ir::LineMap;
use tracing::debug;

/// Result of a tolerant parse: a best-effort program plus every error found.
#[derive(Debug)]
pub struct ParseOutput {
    pub program: Program,
    pub errors: Vec<ParseError>,
}

impl ParseOutput {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// Parse a source string, stopping at the first syntax error.
pub fn parse(source: &str, dialect: Dialect) -> Result<Program, ParseError> {
    let line_map = LineMap::new(source);
    let lexed = ls_lexer::lex(source);
    if let Some(error) = lexed.errors.first() {
        return Err(ParseError::new(
            error.message.clone(),
            error.span,
            source,
            &line_map,
        ));
    }
    let mut parser = Parser::new(&lexed.tokens, source, &line_map, dialect);
    parser.parse_program_strict()
}

/// Parse a source string, recovering past isolated errors.
pub fn parse_with_recovery(source: &str, dialect: Dialect) -> ParseOutput {
    let line_map = LineMap::new(source);
    let lexed = ls_lexer::lex(source);
    let mut errors: Vec<ParseError> = lexed
        .errors
        .iter()
        .map(|e| ParseError::new(e.message.clone(), e.span, source, &line_map))
        .collect();

    let mut parser = Parser::new(&lexed.tokens, source, &line_map, dialect);
    let program = parser.parse_program_recovering(&mut errors);
    debug!(
        statements = program.body.len(),
        errors = errors.len(),
        "parse finished"
    );
    ParseOutput { program, errors }
}
