use crate::{emit, EmitOptions, PREAMBLE};
use ls_ir::ast::Dialect;
use ls_ir::LineMap;
use ls_lower::{lower, LowerOptions};
use pretty_assertions::assert_eq;

/// Transpile and return only the program text after the preamble.
fn body(source: &str) -> String {
    let program = match ls_parse::parse(source, Dialect::Script) {
        Ok(program) => program,
        Err(error) => panic!("parse failed: {error}"),
    };
    let line_map = LineMap::new(source);
    let lowered = lower(&program, &line_map, &LowerOptions::default());
    let errors: Vec<_> = lowered.diagnostics.iter().filter(|d| d.is_error()).collect();
    assert!(errors.is_empty(), "lowering diagnostics: {errors:?}");
    let violations = ls_lower::validate::validate_unit(&lowered.unit);
    assert!(violations.is_empty(), "IR violations: {violations:?}");

    let output = emit(&lowered.unit, &EmitOptions::default());
    assert!(output.diagnostics.is_empty(), "emit diagnostics: {:?}", output.diagnostics);
    let text = output.lua;
    let Some(rest) = text.strip_prefix(PREAMBLE) else {
        panic!("output does not start with the preamble");
    };
    rest.trim_start_matches('\n').to_string()
}

#[test]
fn output_always_starts_with_the_preamble() {
    let program = match ls_parse::parse("let x = 1;", Dialect::Script) {
        Ok(program) => program,
        Err(error) => panic!("parse failed: {error}"),
    };
    let line_map = LineMap::new("let x = 1;");
    let lowered = lower(&program, &line_map, &LowerOptions::default());
    let output = emit(&lowered.unit, &EmitOptions::default());
    assert!(output.lua.starts_with(PREAMBLE));
}

#[test]
fn simple_function_matches_expected_shape() {
    assert_eq!(
        body("function add(a, b) { return a + b; }"),
        "function add(a, b)\n  return a + b\nend\n"
    );
}

#[test]
fn for_of_over_array_literal() {
    let expected = "\
do
  local _iter = __ls.iter({1, 2, 3})
  while true do
    local x = _iter()
    if x == nil then break end
    console.log(x)
  end
end
";
    assert_eq!(body("for (const x of [1, 2, 3]) console.log(x);"), expected);
}

#[test]
fn object_destructuring_with_defaults() {
    let expected = "\
local _d = pt
local a = _d.x == nil and 10 or _d.x
local y = _d.y
";
    assert_eq!(body("const { x: a = 10, y } = pt;"), expected);
}

#[test]
fn optional_chain_evaluates_each_step_once() {
    let expected = "\
local _t = nil
if obj ~= nil then _t = obj.inner end
local _t2 = nil
if _t ~= nil then _t2 = _t.value end
local v = _t2 == nil and 0 or _t2
";
    assert_eq!(body("const v = obj?.inner?.value ?? 0;"), expected);
}

#[test]
fn generator_becomes_coroutine_factory() {
    let expected = "\
function g()
  return coroutine.wrap(function()
    coroutine.yield(1)
    coroutine.yield(2)
  end)
end
";
    assert_eq!(body("function* g() { yield 1; yield 2; }"), expected);
}

#[test]
fn class_with_inheritance_builds_metatables() {
    let text = body(
        "class B extends A { constructor(x) { super(x); this.x = x; } }",
    );
    assert!(text.contains("local B = {}"), "class table: {text}");
    assert!(
        text.contains("setmetatable(B, { __index = A })"),
        "metatable link: {text}"
    );
    assert!(
        text.contains("function B.constructor(self, x)"),
        "constructor: {text}"
    );
    assert!(text.contains("A.constructor(self, x)"), "super call: {text}");
    assert!(text.contains("self.x = x"), "field write: {text}");
    assert!(text.contains("function B.new(...)"), "allocator: {text}");
    assert!(text.contains("return self"), "allocator returns: {text}");
}

#[test]
fn minimal_parentheses_for_flat_expressions() {
    assert_eq!(body("x = a + b * c;"), "x = a + b * c\n");
    assert_eq!(body("x = (a + b) * c;"), "x = (a + b) * c\n");
    assert_eq!(body("x = a - (b - c);"), "x = a - (b - c)\n");
    assert_eq!(body("x = -(a ** b);"), "x = -a ^ b\n");
    assert_eq!(body("x = (-a) ** b;"), "x = (-a) ^ b\n");
}

#[test]
fn logical_operators_map_to_and_or() {
    assert_eq!(body("x = a && b || !c;"), "x = a and b or not c\n");
}

#[test]
fn equality_maps_onto_lua_spellings() {
    assert_eq!(body("x = a === b;"), "x = a == b\n");
    assert_eq!(body("x = a !== b;"), "x = a ~= b\n");
}

#[test]
fn string_concatenation_uses_dotdot_with_tostring() {
    assert_eq!(body("x = \"n = \" + n;"), "x = \"n = \" .. tostring(n)\n");
}

#[test]
fn bit_operators_call_runtime_helpers() {
    assert_eq!(body("x = a & b;"), "x = __ls.band(a, b)\n");
    assert_eq!(body("x = a << 2;"), "x = __ls.shl(a, 2)\n");
}

#[test]
fn method_calls_pass_the_receiver() {
    assert_eq!(body("obj.run(1);"), "obj:run(1)\n");
    assert_eq!(body("console.log(1);"), "console.log(1)\n");
}

#[test]
fn spread_call_goes_through_apply() {
    assert_eq!(
        body("f(a, ...b, c);"),
        "__ls.apply(f, {a, table.unpack(b), c})\n"
    );
}

#[test]
fn keyword_identifiers_are_mangled() {
    assert_eq!(body("let end = 1;"), "local end_ = 1\n");
}

#[test]
fn nested_functions_are_local() {
    let expected = "\
function outer()
  local function inner()
    return 1
  end
  return inner()
end
";
    assert_eq!(
        body("function outer() { function inner() { return 1; } return inner(); }"),
        expected
    );
}

#[test]
fn throw_emits_error_call() {
    assert_eq!(body("throw msg;"), "error(msg)\n");
}

#[test]
fn bare_expressions_bind_to_placeholder() {
    assert_eq!(body("a + b;"), "local _ = a + b\n");
}

#[test]
fn falsy_conditional_consequent_uses_closure() {
    assert_eq!(
        body("x = c ? null : d;"),
        "x = (function() if c then return nil else return d end end)()\n"
    );
}

#[test]
fn do_while_emits_repeat_until() {
    let expected = "\
repeat
  f()
until not (cond)
";
    assert_eq!(body("do { f(); } while (cond);"), expected);
}

#[test]
fn emission_is_deterministic() {
    let source = "function f(a) { return `v: ${a}`; } for (const x of xs) f(x);";
    assert_eq!(body(source), body(source));
}

#[test]
fn debug_info_annotates_statements() {
    let program = match ls_parse::parse("let x = 1;\nlet y = 2;", Dialect::Script) {
        Ok(program) => program,
        Err(error) => panic!("parse failed: {error}"),
    };
    let line_map = LineMap::new("let x = 1;\nlet y = 2;");
    let lowered = lower(&program, &line_map, &LowerOptions::default());
    let output = emit(&lowered.unit, &EmitOptions { debug_info: true });
    assert!(output.lua.contains("-- 1:"));
    assert!(output.lua.contains("-- 2:"));
}
