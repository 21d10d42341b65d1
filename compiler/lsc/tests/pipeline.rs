//! Pipeline behavior: diagnostics, strict mode, caching, limits, targets.

use ls_diagnostic::{ErrorCode, Severity};
use lsc::{transpile, Options, Target};
use pretty_assertions::assert_eq;

fn no_cache() -> Options {
    Options {
        cache: false,
        ..Options::default()
    }
}

#[test]
fn diagnostics_are_ordered_by_source_location() {
    // Two recoverable syntax errors on different lines.
    let source = "let = 1;\nlet ok = 2;\nlet ) = 3;";
    let result = transpile(source, &no_cache());
    assert!(result.has_errors());
    let lines: Vec<u32> = result
        .diagnostics
        .iter()
        .filter_map(|d| d.loc.map(|loc| loc.line))
        .collect();
    let mut sorted = lines.clone();
    sorted.sort_unstable();
    assert_eq!(lines, sorted);
}

#[test]
fn parse_errors_suppress_output_but_keep_ir() {
    let result = transpile("let x = ;\nlet y = 2;", &no_cache());
    assert!(result.has_errors());
    assert_eq!(result.output, "");
    // The recovered statement still lowered into the unit.
    assert!(result.stats.node_count > 0);
}

#[test]
fn strict_mode_turns_ast_warnings_fatal() {
    let source = "function f() { yield 1; }";
    let relaxed = transpile(source, &no_cache());
    assert!(
        relaxed
            .diagnostics
            .iter()
            .any(|d| d.severity == Severity::Warning && d.code == ErrorCode::AstValidation),
        "non-strict validation downgrades: {:?}",
        relaxed.diagnostics
    );

    let strict = transpile(
        source,
        &Options {
            strict: true,
            cache: false,
            ..Options::default()
        },
    );
    assert!(strict.has_errors());
    assert_eq!(strict.output, "", "strict mode aborts before emission");
}

#[test]
fn unsupported_constructs_still_emit_best_effort_output() {
    let result = transpile("let t = a instanceof B;", &no_cache());
    assert!(result
        .diagnostics
        .iter()
        .any(|d| d.code == ErrorCode::UnsupportedConstruct));
    assert!(result.output.contains("UNSUPPORTED: instanceof"));
}

#[test]
fn non_lua_targets_report_unsupported_by_backend() {
    let result = transpile(
        "let x = 1;",
        &Options {
            target: Target::Wasm,
            cache: false,
            ..Options::default()
        },
    );
    assert!(result
        .diagnostics
        .iter()
        .any(|d| d.code == ErrorCode::UnsupportedByBackend));
    assert_eq!(result.output, "");
    // The unit is still produced for external backends.
    assert!(result.stats.node_count > 0);
}

#[test]
fn node_budget_reports_memory_limit_and_aborts() {
    let result = transpile(
        "let a = 1; let b = 2; let c = 3; let d = 4; let e = 5;",
        &Options {
            max_nodes: 8,
            cache: false,
            ..Options::default()
        },
    );
    assert!(result
        .diagnostics
        .iter()
        .any(|d| d.code == ErrorCode::MemoryLimit));
    assert_eq!(result.output, "");
}

#[test]
fn cache_round_trip_is_byte_identical() {
    let source = "function cachetest(n) { return n * 2; }";
    let options = Options::default();
    let first = transpile(source, &options);
    let second = transpile(source, &options);
    assert!(!first.stats.cache_hit);
    assert!(second.stats.cache_hit, "second call hits the cache");
    assert_eq!(first.output, second.output);

    // Cache off produces the same bytes.
    let uncached = transpile(source, &no_cache());
    assert!(!uncached.stats.cache_hit);
    assert_eq!(uncached.output, first.output);
}

#[test]
fn stats_report_node_count() {
    let result = transpile("let x = 1 + 2;", &no_cache());
    assert!(result.stats.node_count >= 4, "{:?}", result.stats);
    assert!(!result.stats.cache_hit);
}

#[test]
fn ir_json_dump_has_flat_node_map() {
    let result = transpile("let x = 1;", &no_cache());
    let json = match result.ir_to_json() {
        Ok(json) => json,
        Err(error) => panic!("serialization failed: {error}"),
    };
    let value: serde_json::Value = match serde_json::from_str(&json) {
        Ok(value) => value,
        Err(error) => panic!("round trip failed: {error}"),
    };
    assert!(value["nodes"]["node_0"].is_object());
    assert!(value["rootId"].is_string());
    assert!(value["diagnostics"].is_array());
}

#[test]
fn ir_validation_failures_are_fatal_without_strict() {
    // The public pipeline cannot produce invalid IR; pin the policy at the
    // validator level instead: IrValidation is always-fatal by code.
    assert!(ErrorCode::IrValidation.is_always_fatal());
    assert!(!ErrorCode::UnsupportedConstruct.is_always_fatal());
}
