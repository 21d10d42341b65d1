//! End-to-end transpilation scenarios.

use ls_emit::PREAMBLE;
use lsc::{transpile, Options};
use pretty_assertions::assert_eq;

fn no_cache() -> Options {
    Options {
        cache: false,
        ..Options::default()
    }
}

/// Transpile and return the program text after the preamble.
fn body(source: &str) -> String {
    let result = transpile(source, &no_cache());
    assert!(
        !result.has_errors(),
        "diagnostics: {:?}",
        result.diagnostics
    );
    let Some(rest) = result.output.strip_prefix(PREAMBLE) else {
        panic!("output does not start with the preamble");
    };
    rest.trim_start_matches('\n').to_string()
}

#[test]
fn s1_simple_function() {
    assert_eq!(
        body("function add(a,b){ return a+b; }"),
        "function add(a, b)\n  return a + b\nend\n"
    );
}

#[test]
fn s2_for_of_over_array() {
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
    assert_eq!(body("for (const x of [1,2,3]) console.log(x);"), expected);
}

#[test]
fn s3_object_destructuring_with_defaults() {
    let expected = "\
local _d = pt
local a = _d.x == nil and 10 or _d.x
local y = _d.y
";
    assert_eq!(body("const { x: a = 10, y } = pt;"), expected);
}

#[test]
fn s4_optional_chaining() {
    let text = body("const v = obj?.inner?.value ?? 0;");
    // One evaluation of obj and of obj.inner, guarded stepwise, falling
    // back to 0 when any step is nil.
    assert_eq!(text.matches("obj").count(), 2, "obj read once + guard: {text}");
    assert_eq!(
        text,
        "\
local _t = nil
if obj ~= nil then _t = obj.inner end
local _t2 = nil
if _t ~= nil then _t2 = _t.value end
local v = _t2 == nil and 0 or _t2
"
    );
}

#[test]
fn s5_generator() {
    assert_eq!(
        body("function* g(){ yield 1; yield 2; }"),
        "\
function g()
  return coroutine.wrap(function()
    coroutine.yield(1)
    coroutine.yield(2)
  end)
end
"
    );
}

#[test]
fn s6_class_with_inheritance() {
    let text = body("class B extends A { constructor(x){ super(x); this.x = x; } }");
    assert!(text.contains("local B = {}"), "table decl: {text}");
    assert!(
        text.contains("setmetatable(B, { __index = A })"),
        "metatable: {text}"
    );
    assert!(
        text.contains("function B.constructor(self, x)"),
        "constructor: {text}"
    );
    assert!(
        text.contains("A.constructor(self, x)"),
        "super dispatch: {text}"
    );
    assert!(text.contains("function B.new(...)"), "allocator: {text}");
}

#[test]
fn preamble_is_byte_identical_across_inputs() {
    let first = transpile("let a = 1;", &no_cache());
    let second = transpile("function f() { return 2; }", &no_cache());
    assert_eq!(&first.output[..PREAMBLE.len()], PREAMBLE);
    assert_eq!(
        &first.output[..PREAMBLE.len()],
        &second.output[..PREAMBLE.len()]
    );
}

#[test]
fn empty_program_is_exactly_the_preamble() {
    let result = transpile("", &no_cache());
    assert_eq!(result.output, PREAMBLE);
}
