//! Lua emission for the LuaScript compiler.
//!
//! A context-aware printer over the validated IR: it tracks statement vs.
//! expression position, owns the Lua precedence table (parentheses appear
//! only where required), mangles names that would collide with Lua
//! keywords, and prepends the fixed runtime preamble every program depends
//! on.
//!
//! Unsupported nodes emit as comments plus `nil` placeholders so partial
//! output is still syntactically valid Lua; node kinds that validated IR
//! can never contain produce `EmitError` diagnostics the same way.

mod lua;
mod output;
mod preamble;
mod precedence;
mod scope;

#[cfg(test)]
mod tests;

pub use output::{Emitter, StringEmitter};
pub use preamble::PREAMBLE;

use ls_diagnostic::Diagnostic;
use ls_ir::CompilationUnit;

/// Emission options.
#[derive(Clone, Debug, Default)]
pub struct EmitOptions {
    /// Annotate statements with their source line/column.
    pub debug_info: bool,
}

/// Emitted text plus any emitter diagnostics.
#[derive(Debug)]
pub struct EmitOutput {
    pub lua: String,
    pub diagnostics: Vec<Diagnostic>,
}

/// Emit a compilation unit as Lua source.
pub fn emit(unit: &CompilationUnit, options: &EmitOptions) -> EmitOutput {
    lua::LuaEmitter::run(unit, options)
}
