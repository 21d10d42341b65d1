use crate::{lower, validate::validate_unit, LowerOptions, LowerResult};
use ls_diagnostic::ErrorCode;
use ls_ir::ast::Dialect;
use ls_ir::{Builder, CompilationUnit, LineMap, LitValue, MemberProp, NodeId, NodeKind};
use pretty_assertions::assert_eq;

fn lower_source(source: &str) -> LowerResult {
    lower_with(source, &LowerOptions::default())
}

fn lower_with(source: &str, options: &LowerOptions) -> LowerResult {
    let program = match ls_parse::parse(source, Dialect::Script) {
        Ok(program) => program,
        Err(error) => panic!("parse failed: {error}"),
    };
    let line_map = LineMap::new(source);
    lower(&program, &line_map, options)
}

fn count_kind(unit: &CompilationUnit, name: &str) -> usize {
    unit.nodes
        .iter()
        .filter(|node| node.kind.name() == name)
        .count()
}

fn has_ident(unit: &CompilationUnit, name: &str) -> bool {
    unit.nodes.iter().any(|node| {
        matches!(&node.kind, NodeKind::Identifier { name: n } if n == name)
    })
}

fn helper_calls(unit: &CompilationUnit, helper: &str) -> usize {
    unit.nodes
        .iter()
        .filter(|node| {
            let NodeKind::Call { callee, .. } = &node.kind else {
                return false;
            };
            let Some(NodeKind::Member {
                object,
                property: MemberProp::Named(name),
            }) = unit.nodes.kind(*callee)
            else {
                return false;
            };
            name == helper
                && matches!(
                    unit.nodes.kind(*object),
                    Some(NodeKind::Identifier { name }) if name == "__ls"
                )
        })
        .count()
}

fn coroutine_calls(unit: &CompilationUnit, which: &str) -> usize {
    unit.nodes
        .iter()
        .filter(|node| {
            let NodeKind::Call { callee, .. } = &node.kind else {
                return false;
            };
            let Some(NodeKind::Member {
                object,
                property: MemberProp::Named(name),
            }) = unit.nodes.kind(*callee)
            else {
                return false;
            };
            name == which
                && matches!(
                    unit.nodes.kind(*object),
                    Some(NodeKind::Identifier { name }) if name == "coroutine"
                )
        })
        .count()
}

fn assert_clean(result: &LowerResult) {
    let errors: Vec<_> = result.diagnostics.iter().filter(|d| d.is_error()).collect();
    assert!(errors.is_empty(), "unexpected diagnostics: {errors:?}");
    let violations = validate_unit(&result.unit);
    assert!(violations.is_empty(), "IR violations: {violations:?}");
}

#[test]
fn simple_function_lowers_directly() {
    let result = lower_source("function add(a, b) { return a + b; }");
    assert_clean(&result);
    assert_eq!(count_kind(&result.unit, "FunctionDecl"), 1);
    assert_eq!(count_kind(&result.unit, "Unsupported"), 0);
    let decl = result
        .unit
        .nodes
        .iter()
        .find(|n| n.kind.name() == "FunctionDecl");
    match decl.map(|n| &n.kind) {
        Some(NodeKind::FunctionDecl { name, params, .. }) => {
            assert_eq!(name, "add");
            assert_eq!(params.len(), 2);
        }
        other => panic!("expected FunctionDecl, got {other:?}"),
    }
}

#[test]
fn array_destructuring_expands_to_indexed_reads() {
    let result = lower_source("let [a, , b] = xs;");
    assert_clean(&result);
    assert!(has_ident(&result.unit, "_d"), "destructuring temp exists");
    assert!(has_ident(&result.unit, "a"));
    assert!(has_ident(&result.unit, "b"));
    // Indices are 1-based: the skipped element leaves reads at 1 and 3.
    let indices: Vec<f64> = result
        .unit
        .nodes
        .iter()
        .filter_map(|node| match &node.kind {
            NodeKind::Member {
                property: MemberProp::Computed(key),
                ..
            } => match result.unit.nodes.kind(*key) {
                Some(NodeKind::Literal {
                    value: LitValue::Number { value, .. },
                }) => Some(*value),
                _ => None,
            },
            _ => None,
        })
        .collect();
    assert_eq!(indices, vec![1.0, 3.0]);
}

#[test]
fn object_default_uses_nil_test_conditional() {
    let result = lower_source("const { x: a = 10, y } = pt;");
    assert_clean(&result);
    assert_eq!(count_kind(&result.unit, "Conditional"), 1);
    assert_eq!(helper_calls(&result.unit, "rest_object"), 0);
}

#[test]
fn object_rest_excludes_named_keys() {
    let result = lower_source("const { x, ...r } = o;");
    assert_clean(&result);
    assert_eq!(helper_calls(&result.unit, "rest_object"), 1);
    assert!(result.unit.nodes.iter().any(|node| {
        matches!(
            &node.kind,
            NodeKind::Literal { value: LitValue::String { value } } if value == "x"
        )
    }));
}

#[test]
fn array_rest_uses_one_based_start() {
    let result = lower_source("const [first, ...rest] = xs;");
    assert_clean(&result);
    assert_eq!(helper_calls(&result.unit, "rest_array"), 1);
    assert!(result.unit.nodes.iter().any(|node| {
        matches!(
            &node.kind,
            NodeKind::Literal { value: LitValue::Number { value, .. } } if *value == 2.0
        )
    }));
}

#[test]
fn for_of_lowers_to_iterator_protocol() {
    let result = lower_source("for (const x of [1, 2, 3]) console.log(x);");
    assert_clean(&result);
    assert_eq!(helper_calls(&result.unit, "iter"), 1);
    assert_eq!(count_kind(&result.unit, "While"), 1);
    assert_eq!(count_kind(&result.unit, "Break"), 1);
    assert_eq!(count_kind(&result.unit, "ForOf"), 0, "for-of is rewritten");
}

#[test]
fn spread_call_goes_through_apply() {
    let result = lower_source("f(a, ...b, c);");
    assert_clean(&result);
    assert_eq!(helper_calls(&result.unit, "apply"), 1);
    assert_eq!(count_kind(&result.unit, "Spread"), 1);
}

#[test]
fn generator_wraps_body_in_coroutine_factory() {
    let result = lower_source("function* g() { yield 1; yield 2; }");
    assert_clean(&result);
    assert_eq!(coroutine_calls(&result.unit, "wrap"), 1);
    assert_eq!(coroutine_calls(&result.unit, "yield"), 2);
    assert_eq!(count_kind(&result.unit, "YieldExpr"), 0, "yields rewritten");
}

#[test]
fn yield_delegate_pulls_from_iterator() {
    let result = lower_source("function* g() { yield* h(); }");
    assert_clean(&result);
    assert_eq!(helper_calls(&result.unit, "iter"), 1);
    assert!(coroutine_calls(&result.unit, "yield") >= 1);
}

#[test]
fn async_function_builds_cooperative_runner() {
    let result = lower_source("async function f() { const v = await g(); return v; }");
    assert_clean(&result);
    assert_eq!(coroutine_calls(&result.unit, "create"), 1);
    assert_eq!(coroutine_calls(&result.unit, "status"), 1);
    assert_eq!(coroutine_calls(&result.unit, "resume"), 2);
    assert_eq!(count_kind(&result.unit, "AwaitExpr"), 0, "awaits rewritten");
}

#[test]
fn class_lowers_to_metatable_tables() {
    let result = lower_source(
        "class B extends A { constructor(x) { super(x); this.x = x; } m() { return this.x; } }",
    );
    assert_clean(&result);
    assert_eq!(count_kind(&result.unit, "ClassDecl"), 0, "class rewritten");
    assert!(has_ident(&result.unit, "setmetatable"));
    assert!(has_ident(&result.unit, "self"));
    // constructor + m + new, each assigned onto B.
    let member_writes = result
        .unit
        .nodes
        .iter()
        .filter(|node| {
            let NodeKind::Assignment { target, .. } = &node.kind else {
                return false;
            };
            matches!(
                result.unit.nodes.kind(*target),
                Some(NodeKind::Member { .. })
            )
        })
        .count();
    assert!(member_writes >= 3, "found {member_writes} member writes");
    assert_eq!(count_kind(&result.unit, "Super"), 0, "super rewritten");
}

#[test]
fn optional_chain_guards_each_step() {
    let result = lower_source("const v = obj?.inner?.value ?? 0;");
    assert_clean(&result);
    assert_eq!(count_kind(&result.unit, "OptionalMember"), 0);
    assert_eq!(count_kind(&result.unit, "OptionalCall"), 0);
    // Two guarded steps plus no fallback branch (plain ?? conditional).
    assert_eq!(count_kind(&result.unit, "If"), 2);
    assert_eq!(count_kind(&result.unit, "Conditional"), 1);
    assert!(has_ident(&result.unit, "_t"));
}

#[test]
fn nullish_evaluates_left_once() {
    let result = lower_source("const v = f() ?? 0;");
    assert_clean(&result);
    // f() lands in a temp; the conditional reads the temp twice.
    assert_eq!(count_kind(&result.unit, "Conditional"), 1);
    assert!(has_ident(&result.unit, "_t"));
}

#[test]
fn template_literal_concatenates_with_tostring() {
    let result = lower_source("const s = `sum: ${a + b}!`;");
    assert_clean(&result);
    assert!(has_ident(&result.unit, "tostring"));
    assert!(count_kind(&result.unit, "BinaryOp") >= 3, "concat chain + add");
    assert_eq!(count_kind(&result.unit, "TemplateLiteral"), 0);
}

#[test]
fn switch_lowers_to_guarded_chain() {
    let result = lower_source(
        "switch (x) { case 1: a(); break; case 2: b(); break; default: c(); }",
    );
    assert_clean(&result);
    assert_eq!(count_kind(&result.unit, "Switch"), 0, "switch rewritten");
    assert_eq!(count_kind(&result.unit, "DoWhile"), 1, "repeat wrapper");
    assert_eq!(count_kind(&result.unit, "If"), 2);
}

#[test]
fn switch_fallthrough_is_unsupported() {
    let result = lower_source("switch (x) { case 1: a(); case 2: b(); }");
    assert!(result
        .diagnostics
        .iter()
        .any(|d| d.code == ErrorCode::UnsupportedConstruct));
}

#[test]
fn continue_gets_repeat_wrapper() {
    let result = lower_source("while (x) { if (y) continue; f(); }");
    assert_clean(&result);
    // The wrapper is a repeat-until-true carrying the body.
    assert_eq!(count_kind(&result.unit, "DoWhile"), 1);
    assert!(count_kind(&result.unit, "Break") >= 1, "continue became break");
    assert_eq!(count_kind(&result.unit, "Continue"), 0);
}

#[test]
fn break_outside_loop_is_reported() {
    let result = lower_source("break;");
    assert!(result
        .diagnostics
        .iter()
        .any(|d| d.code == ErrorCode::AstValidation));
}

#[test]
fn instanceof_is_unsupported_but_recoverable() {
    let result = lower_source("const t = a instanceof B;");
    assert!(result
        .diagnostics
        .iter()
        .any(|d| d.code == ErrorCode::UnsupportedConstruct));
    assert_eq!(count_kind(&result.unit, "Unsupported"), 1);
}

#[test]
fn var_declarations_hoist_to_function_top() {
    let result = lower_source("function f() { if (c) { var x = 1; } return x; }");
    assert_clean(&result);
    // One hoisted `local x` declaration, with the initializer lowered to
    // an assignment in place.
    let hoists = result
        .unit
        .nodes
        .iter()
        .filter(|node| {
            matches!(
                &node.kind,
                NodeKind::VarDecl {
                    decl_kind: ls_ir::DeclKind::Var,
                    init,
                    ..
                } if !init.is_valid()
            )
        })
        .count();
    assert_eq!(hoists, 1);
}

#[test]
fn try_catch_lowers_to_pcall() {
    let result = lower_source("try { risky(); } catch (e) { handle(e); } finally { done(); }");
    assert_clean(&result);
    assert!(has_ident(&result.unit, "pcall"));
    assert_eq!(count_kind(&result.unit, "Try"), 0, "try rewritten");
    assert_eq!(count_kind(&result.unit, "ArrayPattern"), 1, "ok/err pair");
}

#[test]
fn node_budget_aborts_with_memory_limit() {
    let options = LowerOptions {
        max_nodes: 10,
        ..LowerOptions::default()
    };
    let result = lower_with("let a = 1; let b = 2; let c = 3; let d = 4;", &options);
    assert!(result
        .diagnostics
        .iter()
        .any(|d| d.code == ErrorCode::MemoryLimit));
}

#[test]
fn depth_limit_reports_memory_limit() {
    let options = LowerOptions {
        max_depth: 4,
        ..LowerOptions::default()
    };
    let result = lower_with("let a = 1 + (2 + (3 + (4 + (5 + 6))));", &options);
    assert!(result
        .diagnostics
        .iter()
        .any(|d| d.code == ErrorCode::MemoryLimit));
}

#[test]
fn fully_supported_program_has_no_unsupported_nodes() {
    let source = r#"
        function greet(name = "world", ...rest) {
            return `hello ${name}`;
        }
        const { a = 1, ...others } = opts;
        for (const x of items) {
            if (x > 2) break;
        }
        class Point {
            constructor(x, y) { this.x = x; this.y = y; }
            norm() { return this.x * this.x + this.y * this.y; }
        }
        const p = new Point(1, 2);
        let total = p.norm() ?? 0;
    "#;
    let result = lower_source(source);
    assert_clean(&result);
    assert_eq!(count_kind(&result.unit, "Unsupported"), 0);
}

// IR validator on hand-built graphs

#[test]
fn validator_rejects_dangling_references() {
    let mut builder = Builder::new();
    let lit = builder.literal_number(1.0, "1", None);
    let stmt = builder.return_stmt(NodeId::new(99), None);
    let root = builder.program(vec![stmt], None);
    let _ = lit;
    let unit = builder.finish(root);
    let violations = validate_unit(&unit);
    assert!(violations
        .iter()
        .any(|d| d.message.contains("missing node")));
}

#[test]
fn validator_rejects_patterns_outside_binding_positions() {
    let mut builder = Builder::new();
    let inner = builder.identifier("a", None);
    let pattern = builder.array_pattern(vec![inner], None);
    // A pattern as a return argument is never legal.
    let ret = builder.return_stmt(pattern, None);
    let root = builder.program(vec![ret], None);
    let unit = builder.finish(root);
    let violations = validate_unit(&unit);
    assert!(violations
        .iter()
        .any(|d| d.message.contains("binding position")));
}

#[test]
fn validator_rejects_yield_outside_generator() {
    let mut builder = Builder::new();
    let arg = builder.literal_number(1.0, "1", None);
    let yielded = builder.yield_expr(arg, false, None);
    let stmt = builder.expression_stmt(yielded, None);
    let body = builder.block(vec![stmt], None);
    let f = builder.function_decl("f", Vec::new(), body, false, false, None);
    let root = builder.program(vec![f], None);
    let unit = builder.finish(root);
    let violations = validate_unit(&unit);
    assert!(violations.iter().any(|d| d.message.contains("yield")));
}

#[test]
fn validator_accepts_marked_generator_yield() {
    let mut builder = Builder::new();
    let arg = builder.literal_number(1.0, "1", None);
    let yielded = builder.yield_expr(arg, false, None);
    let stmt = builder.expression_stmt(yielded, None);
    let body = builder.block(vec![stmt], None);
    let f = builder.function_decl("g", Vec::new(), body, true, false, None);
    let root = builder.program(vec![f], None);
    let unit = builder.finish(root);
    assert_eq!(validate_unit(&unit), Vec::new());
}

#[test]
fn validator_checks_optional_chain_boundary() {
    let mut builder = Builder::new();
    let base = builder.identifier("a", None);
    // Outermost optional member wrongly marked as non-boundary.
    let member = builder.optional_member(
        base,
        MemberProp::Named("b".to_string()),
        false,
        None,
    );
    let stmt = builder.expression_stmt(member, None);
    let root = builder.program(vec![stmt], None);
    let unit = builder.finish(root);
    let violations = validate_unit(&unit);
    assert!(violations.iter().any(|d| d.message.contains("boundary")));
}
