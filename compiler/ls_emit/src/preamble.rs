//! The fixed runtime preamble.
//!
//! Every emitted program begins with this exact text. The helpers it
//! declares are the contract between the emitter and the runtime: the
//! iterator protocol behind `for…of`, argument-tuple application for
//! spread calls, rest captures for destructuring, table merge for object
//! spread, integer and bit arithmetic, and the `console`/`undefined`
//! globals. Changing a single byte is a breaking compatibility change;
//! the test suite pins the string by exact equality.

/// Runtime prologue prepended to every emitted program.
pub const PREAMBLE: &str = r#"-- LuaScript runtime support
if not table.unpack then table.unpack = unpack end

local __ls = {}

function __ls.iter(x)
  if type(x) == "function" then
    return x
  end
  if type(x) == "string" then
    local i = 0
    return function()
      i = i + 1
      if i > #x then return nil end
      return string.sub(x, i, i)
    end
  end
  if type(x) == "table" then
    if type(x.next) == "function" then
      return function()
        local step = x.next(x)
        if step == nil or step.done then return nil end
        return step.value
      end
    end
    local i = 0
    return function()
      i = i + 1
      if i > #x then return nil end
      return x[i]
    end
  end
  return function() return nil end
end

function __ls.apply(f, args)
  return f(table.unpack(args))
end

function __ls.rest_array(t, from)
  local out = {}
  for i = from, #t do
    out[#out + 1] = t[i]
  end
  return out
end

function __ls.rest_object(t, excluded)
  local skip = {}
  for i = 1, #excluded do
    skip[excluded[i]] = true
  end
  local out = {}
  for k, v in pairs(t) do
    if not skip[k] then out[k] = v end
  end
  return out
end

function __ls.assign(target, source)
  for k, v in pairs(source) do
    target[k] = v
  end
  return target
end

function __ls.idiv(a, b)
  return math.floor(a / b)
end

local function __ls_bits(a, b, op)
  local out, bit = 0, 1
  a = a % 0x100000000
  b = b % 0x100000000
  for _ = 1, 32 do
    local x, y = a % 2, b % 2
    if op(x, y) == 1 then out = out + bit end
    a = (a - x) / 2
    b = (b - y) / 2
    bit = bit * 2
  end
  return out
end

function __ls.band(a, b)
  return __ls_bits(a, b, function(x, y) return (x == 1 and y == 1) and 1 or 0 end)
end

function __ls.bor(a, b)
  return __ls_bits(a, b, function(x, y) return (x == 1 or y == 1) and 1 or 0 end)
end

function __ls.bxor(a, b)
  return __ls_bits(a, b, function(x, y) return x ~= y and 1 or 0 end)
end

function __ls.bnot(a)
  return 0xFFFFFFFF - (a % 0x100000000)
end

function __ls.shl(a, n)
  return (a % 0x100000000) * (2 ^ n) % 0x100000000
end

function __ls.shr(a, n)
  return math.floor((a % 0x100000000) / (2 ^ n))
end

console = {
  log = function(...) print(...) end,
  error = function(...) print(...) end,
  warn = function(...) print(...) end,
}
undefined = nil
"#;

#[cfg(test)]
mod tests {
    use super::PREAMBLE;

    #[test]
    fn preamble_declares_every_contract_helper() {
        for helper in [
            "__ls.iter",
            "__ls.apply",
            "__ls.rest_array",
            "__ls.rest_object",
            "__ls.assign",
            "__ls.idiv",
            "__ls.band",
            "__ls.bor",
            "__ls.bxor",
            "__ls.bnot",
            "__ls.shl",
            "__ls.shr",
        ] {
            assert!(
                PREAMBLE.contains(&format!("function {helper}(")),
                "missing helper {helper}"
            );
        }
        assert!(PREAMBLE.contains("console = {"));
        assert!(PREAMBLE.contains("undefined = nil"));
    }

    #[test]
    fn preamble_is_balanced_lua() {
        let functions = PREAMBLE.matches("function").count();
        let ends = PREAMBLE.matches("end").count();
        assert!(functions > 0);
        assert!(ends >= functions, "every function needs an end");
    }
}
