//! AST → IR lowering for the LuaScript compiler.
//!
//! Lowering is total: every supported surface construct maps to a specific
//! IR subgraph, and anything else becomes an `Unsupported` node plus a
//! diagnostic, so one run surfaces every problem at once.
//!
//! The interesting rewrites live in the `lower` submodules:
//! destructuring into simple declarations over fresh temporaries, optional
//! chains into guarded temporaries evaluated once, template literals into
//! string concatenation, generators into coroutine factories, `async` into
//! a cooperative runner, classes into metatable-linked tables, and the
//! operator mapping onto the Lua operator set.
//!
//! [`validate`] re-walks the finished graph and enforces the structural
//! invariants the emitter relies on.

mod lower;
pub mod validate;

#[cfg(test)]
mod tests;

use ls_diagnostic::Diagnostic;
use ls_ir::ast::Program;
use ls_ir::{CompilationUnit, LineMap};

/// Resource bounds and failure policy for one lowering run.
#[derive(Clone, Debug)]
pub struct LowerOptions {
    /// Treat unsupported constructs as fatal.
    pub strict: bool,
    /// Maximum IR node count before aborting with `MemoryLimit`.
    pub max_nodes: usize,
    /// Maximum AST recursion depth.
    pub max_depth: usize,
}

impl Default for LowerOptions {
    fn default() -> Self {
        LowerOptions {
            strict: false,
            max_nodes: 100_000,
            max_depth: 256,
        }
    }
}

/// The lowered graph plus everything the lowerer had to report.
#[derive(Debug)]
pub struct LowerResult {
    pub unit: CompilationUnit,
    pub diagnostics: Vec<Diagnostic>,
}

/// Lower a parsed program into a compilation unit.
pub fn lower(program: &Program, line_map: &LineMap, options: &LowerOptions) -> LowerResult {
    lower::Lowerer::run(program, line_map, options)
}
