use crate::{parse, parse_with_recovery, validate};
use ls_ir::ast::{
    AssignTarget, BinaryOp, Dialect, Expr, ExprKind, LogicalOp, PatternKind, Program, Stmt,
    StmtKind,
};
use ls_ir::LineMap;
use pretty_assertions::assert_eq;

fn parse_ok(source: &str) -> Program {
    match parse(source, Dialect::Script) {
        Ok(program) => program,
        Err(error) => panic!("parse failed: {error}"),
    }
}

fn first_expr(source: &str) -> Expr {
    let program = parse_ok(source);
    match program.body.into_iter().next().map(|s| s.kind) {
        Some(StmtKind::Expression(expression)) => *expression,
        other => panic!("expected expression statement, got {other:?}"),
    }
}

fn first_stmt(source: &str) -> Stmt {
    let program = parse_ok(source);
    match program.body.into_iter().next() {
        Some(stmt) => stmt,
        None => panic!("empty program"),
    }
}

#[test]
fn binary_precedence_builds_left_spine() {
    // a + b * c parses as a + (b * c)
    let expression = first_expr("a + b * c;");
    match expression.kind {
        ExprKind::Binary {
            op: BinaryOp::Add,
            left,
            right,
        } => {
            assert!(matches!(left.kind, ExprKind::Ident(name) if name == "a"));
            assert!(matches!(
                right.kind,
                ExprKind::Binary {
                    op: BinaryOp::Mul,
                    ..
                }
            ));
        }
        other => panic!("expected Add at the top, got {other:?}"),
    }
}

#[test]
fn exponent_is_right_associative() {
    let expression = first_expr("a ** b ** c;");
    match expression.kind {
        ExprKind::Binary {
            op: BinaryOp::Pow,
            left,
            right,
        } => {
            assert!(matches!(left.kind, ExprKind::Ident(name) if name == "a"));
            assert!(matches!(
                right.kind,
                ExprKind::Binary {
                    op: BinaryOp::Pow,
                    ..
                }
            ));
        }
        other => panic!("expected Pow at the top, got {other:?}"),
    }
}

#[test]
fn nullish_sits_below_or() {
    let expression = first_expr("a || b ?? c;");
    match expression.kind {
        ExprKind::Logical {
            op: LogicalOp::Nullish,
            left,
            ..
        } => {
            assert!(matches!(
                left.kind,
                ExprKind::Logical {
                    op: LogicalOp::Or,
                    ..
                }
            ));
        }
        other => panic!("expected Nullish at the top, got {other:?}"),
    }
}

#[test]
fn parenthesized_expression_reshapes_tree() {
    let expression = first_expr("(a + b) * c;");
    assert!(matches!(
        expression.kind,
        ExprKind::Binary {
            op: BinaryOp::Mul,
            ..
        }
    ));
}

#[test]
fn optional_chain_flags_are_set() {
    let expression = first_expr("a?.b?.();");
    match expression.kind {
        ExprKind::Call {
            optional, callee, ..
        } => {
            assert!(optional, "?.() sets the call's optional flag");
            assert!(matches!(
                callee.kind,
                ExprKind::Member { optional: true, .. }
            ));
        }
        other => panic!("expected optional call, got {other:?}"),
    }
}

#[test]
fn arrow_with_single_parameter() {
    let expression = first_expr("x => x + 1;");
    match expression.kind {
        ExprKind::Arrow(function) => {
            assert_eq!(function.params.len(), 1);
            assert!(matches!(
                &function.params[0].kind,
                PatternKind::Ident(name) if name == "x"
            ));
        }
        other => panic!("expected arrow, got {other:?}"),
    }
}

#[test]
fn parenthesized_arrow_backtracks_to_sequence() {
    // `(a, b)` alone is a sequence, not an arrow head.
    let expression = first_expr("(a, b);");
    assert!(matches!(expression.kind, ExprKind::Sequence(items) if items.len() == 2));

    let arrow = first_expr("(a, b) => a;");
    assert!(matches!(arrow.kind, ExprKind::Arrow(f) if f.params.len() == 2));
}

#[test]
fn async_arrow_and_async_function() {
    let arrow = first_expr("async x => x;");
    assert!(matches!(arrow.kind, ExprKind::Arrow(f) if f.is_async));

    let stmt = first_stmt("async function f() {}");
    assert!(matches!(
        stmt.kind,
        StmtKind::FunctionDecl(f) if f.is_async && f.name.as_deref() == Some("f")
    ));
}

#[test]
fn generator_function_sets_marker() {
    let stmt = first_stmt("function* g() { yield 1; }");
    assert!(matches!(stmt.kind, StmtKind::FunctionDecl(f) if f.is_generator));
}

#[test]
fn destructuring_declaration_parses_patterns() {
    let stmt = first_stmt("let { x: a = 10, ...r } = pt;");
    match stmt.kind {
        StmtKind::VarDecl { declarators, .. } => {
            match &declarators[0].pattern.kind {
                PatternKind::Object { properties, rest } => {
                    assert_eq!(properties.len(), 1);
                    assert!(matches!(
                        &properties[0].value.kind,
                        PatternKind::Default { .. }
                    ));
                    assert!(rest.is_some());
                }
                other => panic!("expected object pattern, got {other:?}"),
            }
        }
        other => panic!("expected var decl, got {other:?}"),
    }
}

#[test]
fn array_pattern_with_holes_and_rest() {
    let stmt = first_stmt("let [a, , b, ...rest] = xs;");
    match stmt.kind {
        StmtKind::VarDecl { declarators, .. } => match &declarators[0].pattern.kind {
            PatternKind::Array { elements } => {
                assert_eq!(elements.len(), 4);
                assert!(elements[1].is_none(), "hole is an elision");
                assert!(matches!(
                    elements[3].as_ref().map(|p| &p.kind),
                    Some(PatternKind::Rest(_))
                ));
            }
            other => panic!("expected array pattern, got {other:?}"),
        },
        other => panic!("expected var decl, got {other:?}"),
    }
}

#[test]
fn assignment_destructuring_reinterprets_literal() {
    let expression = first_expr("[a, b] = pair;");
    match expression.kind {
        ExprKind::Assign { target, .. } => {
            assert!(matches!(
                target,
                AssignTarget::Pattern(p) if matches!(p.kind, PatternKind::Array { .. })
            ));
        }
        other => panic!("expected assignment, got {other:?}"),
    }
}

#[test]
fn for_of_over_existing_binding() {
    let stmt = first_stmt("for (x of xs) {}");
    match stmt.kind {
        StmtKind::ForOf {
            decl_kind, binding, ..
        } => {
            assert!(decl_kind.is_none());
            assert!(matches!(binding.kind, PatternKind::Ident(name) if name == "x"));
        }
        other => panic!("expected for-of, got {other:?}"),
    }
}

#[test]
fn for_in_is_rejected() {
    let result = parse("for (const k in obj) {}", Dialect::Script);
    match result {
        Err(error) => assert!(error.message.contains("for…in")),
        Ok(_) => panic!("for-in should not parse"),
    }
}

#[test]
fn template_literal_splits_interpolations() {
    let expression = first_expr("`sum: ${a + b}!`;");
    match expression.kind {
        ExprKind::Template {
            quasis,
            expressions,
        } => {
            assert_eq!(quasis.len(), 2);
            assert_eq!(quasis[0].cooked, "sum: ");
            assert_eq!(quasis[1].cooked, "!");
            assert_eq!(expressions.len(), 1);
            assert!(matches!(
                expressions[0].kind,
                ExprKind::Binary {
                    op: BinaryOp::Add,
                    ..
                }
            ));
        }
        other => panic!("expected template, got {other:?}"),
    }
}

#[test]
fn class_with_members() {
    let stmt = first_stmt(
        "class B extends A { constructor(x) { super(x); } m() {} static s() {} }",
    );
    match stmt.kind {
        StmtKind::ClassDecl(class) => {
            assert_eq!(class.name.as_deref(), Some("B"));
            assert!(class.superclass.is_some());
            assert_eq!(class.members.len(), 3);
            assert!(class.members[0].is_constructor);
            assert!(class.members[2].is_static);
        }
        other => panic!("expected class decl, got {other:?}"),
    }
}

#[test]
fn semicolons_insert_at_line_breaks() {
    let program = parse_ok("let a = 1\nlet b = 2\nconsole.log(a + b)");
    assert_eq!(program.body.len(), 3);
}

#[test]
fn missing_semicolon_on_same_line_is_an_error() {
    assert!(parse("let a = 1 let b = 2", Dialect::Script).is_err());
}

#[test]
fn return_stops_at_newline() {
    let program = parse_ok("function f() { return\n1; }");
    match &program.body[0].kind {
        StmtKind::FunctionDecl(function) => match &function.body {
            ls_ir::ast::FunctionBody::Block(body) => {
                assert!(matches!(body[0].kind, StmtKind::Return(None)));
            }
            other => panic!("expected block body, got {other:?}"),
        },
        other => panic!("expected function, got {other:?}"),
    }
}

#[test]
fn recovery_collects_multiple_errors() {
    let output = parse_with_recovery("let = 1;\nlet ok = 2;\nlet ) = 3;", Dialect::Script);
    assert!(output.errors.len() >= 2, "errors: {:?}", output.errors);
    // The healthy middle statement still parses.
    assert!(output.program.body.iter().any(|stmt| matches!(
        &stmt.kind,
        StmtKind::VarDecl { declarators, .. }
            if declarators.first().and_then(|d| d.pattern.as_ident()) == Some("ok")
    )));
}

#[test]
fn parse_error_carries_position_and_snippet() {
    let error = match parse("let x = ;", Dialect::Script) {
        Err(error) => error,
        Ok(_) => panic!("should not parse"),
    };
    assert_eq!(error.line, 1);
    assert_eq!(error.column, 9);
    assert_eq!(error.snippet, "let x = ;");
}

// AST validation

fn validation_messages(source: &str, strict: bool) -> Vec<String> {
    let program = parse_ok(source);
    let line_map = LineMap::new(source);
    validate::validate_program(&program, Dialect::Script, strict, &line_map)
        .into_iter()
        .map(|d| d.message)
        .collect()
}

#[test]
fn yield_outside_generator_is_flagged() {
    let messages = validation_messages("function f() { yield 1; }", true);
    assert!(messages.iter().any(|m| m.contains("yield")));
}

#[test]
fn await_outside_async_is_flagged() {
    let messages = validation_messages("function f() { await g(); }", true);
    assert!(messages.iter().any(|m| m.contains("await")));
}

#[test]
fn arrow_inherits_async_context() {
    let messages = validation_messages("async function f() { const g = () => await h(); }", true);
    assert!(messages.is_empty(), "unexpected: {messages:?}");
}

#[test]
fn super_outside_subclass_is_flagged() {
    let messages = validation_messages("class C { m() { super.m(); } }", true);
    assert!(messages.iter().any(|m| m.contains("super")));
}

#[test]
fn validation_downgrades_without_strict() {
    let program = parse_ok("function f() { yield 1; }");
    let line_map = LineMap::new("function f() { yield 1; }");
    let diagnostics = validate::validate_program(&program, Dialect::Script, false, &line_map);
    assert!(!diagnostics.is_empty());
    assert!(diagnostics.iter().all(|d| !d.is_error()));
}
