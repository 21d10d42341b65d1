//! The LuaScript compiler pipeline.
//!
//! One public operation: [`transpile`], which threads a source string
//! through parse → AST validation → lowering → IR validation → emission,
//! collecting diagnostics from every stage into a single source-ordered
//! list. A process-wide cache memoizes final Lua output by source and
//! options fingerprints.
//!
//! ```text
//! source text ─▶ parse ─▶ ast-validate ─▶ lower ─▶ ir-validate ─▶ emit
//!                  │           │            │           │           │
//!                  └───────────┴── diagnostics ─────────┴───────────┘
//! ```

mod cache;
pub mod tracing_setup;

use ls_diagnostic::{Diagnostic, Diagnostics, ErrorCode};
use ls_emit::EmitOptions;
use ls_ir::ast::Dialect;
use ls_ir::{CompilationUnit, LineMap, NodeId, NodeMap};
use ls_lower::LowerOptions;
use serde::Serialize;
use std::time::Instant;
use tracing::debug;

/// Compilation target. Only Lua emission is linked into the core; the
/// other backends consume the same compilation unit as external
/// collaborators and report [`ErrorCode::UnsupportedByBackend`] here.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
pub enum Target {
    #[default]
    Lua,
    Wasm,
    Mlir,
    Llvm,
}

impl Target {
    pub const fn as_str(self) -> &'static str {
        match self {
            Target::Lua => "lua",
            Target::Wasm => "wasm",
            Target::Mlir => "mlir",
            Target::Llvm => "llvm",
        }
    }
}

impl std::str::FromStr for Target {
    type Err = String;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        match text {
            "lua" => Ok(Target::Lua),
            "wasm" => Ok(Target::Wasm),
            "mlir" => Ok(Target::Mlir),
            "llvm" => Ok(Target::Llvm),
            other => Err(format!("unknown target `{other}`")),
        }
    }
}

/// Pipeline options.
#[derive(Clone, Debug)]
pub struct Options {
    /// Treat error-severity diagnostics as fatal at stage boundaries.
    pub strict: bool,
    /// Annotate emitted statements with source line/column comments.
    pub emit_debug_info: bool,
    /// Memoize final output by (source, options) fingerprint.
    pub cache: bool,
    /// Backend selection.
    pub target: Target,
    /// Maximum IR node count per compilation.
    pub max_nodes: usize,
    /// Maximum lowering recursion depth.
    pub max_depth: usize,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            strict: false,
            emit_debug_info: false,
            cache: true,
            target: Target::Lua,
            max_nodes: 100_000,
            max_depth: 256,
        }
    }
}

/// Per-call measurements.
#[derive(Clone, Debug, Default)]
pub struct Stats {
    pub node_count: usize,
    pub cache_hit: bool,
    pub duration_ms: u64,
}

/// Everything a `transpile` call produces.
#[derive(Debug)]
pub struct TranspileResult {
    /// Emitted Lua text; empty when the pipeline aborted.
    pub output: String,
    /// The IR graph, as far as it was built.
    pub unit: CompilationUnit,
    /// All diagnostics, ordered by source location.
    pub diagnostics: Vec<Diagnostic>,
    pub stats: Stats,
}

impl TranspileResult {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    /// Serialize the compilation unit (with diagnostics) as JSON.
    pub fn ir_to_json(&self) -> serde_json::Result<String> {
        #[derive(Serialize)]
        struct UnitDump<'a> {
            nodes: &'a NodeMap,
            #[serde(rename = "rootId")]
            root_id: NodeId,
            diagnostics: &'a [Diagnostic],
        }
        serde_json::to_string_pretty(&UnitDump {
            nodes: &self.unit.nodes,
            root_id: self.unit.root,
            diagnostics: &self.diagnostics,
        })
    }
}

/// Run the whole pipeline over one source string.
///
/// Stage order: parse → ast-validate → lower → ir-validate → emit → cache.
/// Any stage can add diagnostics; in strict mode error-severity
/// diagnostics abort at the next stage boundary, and IR validation
/// failures abort unconditionally.
pub fn transpile(source: &str, options: &Options) -> TranspileResult {
    let started = Instant::now();
    let cached = if options.cache && options.target == Target::Lua {
        cache::lookup(source, options)
    } else {
        None
    };

    let mut diagnostics = Diagnostics::new();
    let line_map = LineMap::new(source);

    // Parse (tolerant): downstream stages see a best-effort tree so one
    // run reports as much as possible, but syntax errors suppress output.
    let parsed = ls_parse::parse_with_recovery(source, Dialect::Script);
    let parse_failed = parsed.has_errors();
    for error in parsed.errors {
        diagnostics.push(error.into_diagnostic());
    }

    // AST validation: semantic pre-flight, warnings unless strict.
    diagnostics.extend(ls_parse::validate::validate_program(
        &parsed.program,
        Dialect::Script,
        options.strict,
        &line_map,
    ));
    if options.strict && diagnostics.has_errors() {
        return finish(String::new(), CompilationUnit::default(), diagnostics, false, started);
    }

    // Lower.
    let lower_options = LowerOptions {
        strict: options.strict,
        max_nodes: options.max_nodes,
        max_depth: options.max_depth,
    };
    let lowered = ls_lower::lower(&parsed.program, &line_map, &lower_options);
    let memory_limited = lowered
        .diagnostics
        .iter()
        .any(|d| d.code == ErrorCode::MemoryLimit);
    diagnostics.extend(lowered.diagnostics);
    let unit = lowered.unit;

    // IR validation: violations mean the emitter cannot trust the graph.
    let violations = ls_lower::validate::validate_unit(&unit);
    let ir_invalid = !violations.is_empty();
    diagnostics.extend(violations);

    if ir_invalid || memory_limited || (options.strict && diagnostics.has_errors()) {
        return finish(String::new(), unit, diagnostics, false, started);
    }

    if options.target != Target::Lua {
        diagnostics.push(Diagnostic::error(
            ErrorCode::UnsupportedByBackend,
            format!(
                "the {} backend is not linked into this build; it consumes the compilation unit externally",
                options.target.as_str()
            ),
        ));
        return finish(String::new(), unit, diagnostics, false, started);
    }

    if parse_failed {
        // Syntax errors abort emission; the unit is still returned for
        // inspection alongside the full diagnostic list.
        return finish(String::new(), unit, diagnostics, false, started);
    }

    // Emit (or reuse the cached text).
    let (output, cache_hit) = match cached {
        Some(output) => (output, true),
        None => {
            let emitted = ls_emit::emit(&unit, &EmitOptions {
                debug_info: options.emit_debug_info,
            });
            diagnostics.extend(emitted.diagnostics);
            if options.cache && !diagnostics.has_errors() {
                cache::store(source, options, &emitted.lua);
            }
            (emitted.lua, false)
        }
    };

    debug!(
        nodes = unit.node_count(),
        cache_hit,
        diagnostics = diagnostics.len(),
        "transpile finished"
    );
    finish(output, unit, diagnostics, cache_hit, started)
}

fn finish(
    output: String,
    unit: CompilationUnit,
    mut diagnostics: Diagnostics,
    cache_hit: bool,
    started: Instant,
) -> TranspileResult {
    diagnostics.sort_by_location();
    let stats = Stats {
        node_count: unit.node_count(),
        cache_hit,
        duration_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
    };
    TranspileResult {
        output,
        unit,
        diagnostics: diagnostics.into_vec(),
        stats,
    }
}
