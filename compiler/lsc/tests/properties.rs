//! Property tests over randomly generated programs.
//!
//! Programs are assembled from templates that stay inside the supported
//! subset, so lowering must be total (no `Unsupported` nodes), the IR must
//! validate, and transpilation must be deterministic byte for byte.

use lsc::{transpile, Options};
use proptest::prelude::*;

fn ident() -> impl Strategy<Value = String> {
    // A `v` prefix keeps generated names clear of keywords.
    "v[a-z0-9]{0,5}".prop_map(|s| s)
}

fn number() -> impl Strategy<Value = i32> {
    0..1000i32
}

fn statement() -> impl Strategy<Value = String> {
    prop_oneof![
        (ident(), number()).prop_map(|(id, n)| format!("let {id} = {n};")),
        (ident(), number(), number())
            .prop_map(|(id, a, b)| format!("let {id} = {a} + {b} * 2;")),
        ident().prop_map(|id| format!("function {id}(a, b) {{ return a + b; }}")),
        (ident(), number()).prop_map(|(id, n)| format!("if ({n} > 10) {{ {id} = {n}; }}")),
        (number(), number())
            .prop_map(|(a, b)| format!("for (const x of [{a}, {b}]) {{ console.log(x); }}")),
        (ident(), number()).prop_map(|(id, n)| format!("let {id} = `value ${{{n} + 1}}`;")),
        (ident(), number()).prop_map(|(id, n)| {
            format!("const {{ p: {id} = {n} }} = settings;")
        }),
        ident().prop_map(|id| format!("function {id}(x) {{ return x ?? 0; }}")),
        Just("while (false) { break; }".to_string()),
        (ident(), number()).prop_map(|(id, n)| {
            format!("function* {id}() {{ yield {n}; }}")
        }),
    ]
}

fn program() -> impl Strategy<Value = String> {
    prop::collection::vec(statement(), 1..6).prop_map(|stmts| stmts.join("\n"))
}

fn no_cache() -> Options {
    Options {
        cache: false,
        ..Options::default()
    }
}

proptest! {
    #[test]
    fn transpilation_is_deterministic(source in program()) {
        let first = transpile(&source, &no_cache());
        let second = transpile(&source, &no_cache());
        prop_assert_eq!(&first.output, &second.output);
    }

    #[test]
    fn cache_agrees_with_fresh_emission(source in program()) {
        let cached = transpile(&source, &Options::default());
        let fresh = transpile(&source, &no_cache());
        prop_assert_eq!(&cached.output, &fresh.output);
    }

    #[test]
    fn supported_subset_lowers_totally(source in program()) {
        let result = transpile(&source, &no_cache());
        let errors: Vec<_> = result
            .diagnostics
            .iter()
            .filter(|d| d.is_error())
            .collect();
        prop_assert!(errors.is_empty(), "diagnostics: {errors:?}");
        let unsupported = result
            .unit
            .nodes
            .iter()
            .filter(|node| node.kind.name() == "Unsupported")
            .count();
        prop_assert_eq!(unsupported, 0);
    }

    #[test]
    fn lowered_ir_always_validates(source in program()) {
        let result = transpile(&source, &no_cache());
        let violations = ls_lower::validate::validate_unit(&result.unit);
        prop_assert!(violations.is_empty(), "violations: {violations:?}");
    }

    #[test]
    fn context_markers_are_consistent(source in program()) {
        // Yield/await never survive lowering; generator markers do.
        let result = transpile(&source, &no_cache());
        for node in result.unit.nodes.iter() {
            prop_assert!(node.kind.name() != "YieldExpr");
            prop_assert!(node.kind.name() != "AwaitExpr");
        }
    }

    #[test]
    fn output_is_preamble_plus_program(source in program()) {
        let result = transpile(&source, &no_cache());
        prop_assert!(result.output.starts_with(ls_emit::PREAMBLE));
        prop_assert!(!result.output.contains("UNSUPPORTED"));
    }
}
