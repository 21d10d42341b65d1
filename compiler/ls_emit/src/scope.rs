//! Scope-aware name mangling.
//!
//! Each emitted scope keeps a rename map from source names to emitted
//! names. Identifiers that collide with Lua keywords get a `_` suffix;
//! repeated declarations in one scope disambiguate with `_<n>`. Names that
//! never go through `declare` (runtime globals like `print`, `pcall`, the
//! preamble tables) pass through keyword mangling only.

use rustc_hash::FxHashMap;

/// Lua keywords (5.1 plus `goto`, reserved under LuaJIT).
const LUA_KEYWORDS: &[&str] = &[
    "and", "break", "do", "else", "elseif", "end", "false", "for", "function", "goto", "if",
    "in", "local", "nil", "not", "or", "repeat", "return", "then", "true", "until", "while",
];

pub(crate) fn is_lua_keyword(name: &str) -> bool {
    LUA_KEYWORDS.contains(&name)
}

/// Whether a name can appear verbatim as a Lua identifier.
pub(crate) fn is_lua_ident(name: &str) -> bool {
    if name.is_empty() || is_lua_keyword(name) {
        return false;
    }
    let mut chars = name.chars();
    let first = chars.next().is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    first && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[derive(Default)]
pub(crate) struct ScopeStack {
    scopes: Vec<FxHashMap<String, String>>,
}

impl ScopeStack {
    pub(crate) fn new() -> Self {
        ScopeStack {
            scopes: vec![FxHashMap::default()],
        }
    }

    pub(crate) fn push(&mut self) {
        self.scopes.push(FxHashMap::default());
    }

    pub(crate) fn pop(&mut self) {
        self.scopes.pop();
        debug_assert!(!self.scopes.is_empty(), "popped the root scope");
    }

    /// Register a binding, returning the name to emit for it.
    pub(crate) fn declare(&mut self, name: &str) -> String {
        // Varargs pass straight through.
        if name == "..." {
            return name.to_string();
        }
        let base = if is_lua_keyword(name) {
            format!("{name}_")
        } else {
            name.to_string()
        };
        let mut candidate = base.clone();
        let mut counter = 1;
        while self
            .scopes
            .last()
            .is_some_and(|scope| scope.values().any(|taken| taken == &candidate))
        {
            counter += 1;
            candidate = format!("{base}_{counter}");
        }
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.to_string(), candidate.clone());
        }
        candidate
    }

    /// Resolve a reference to its emitted name.
    pub(crate) fn lookup(&self, name: &str) -> String {
        for scope in self.scopes.iter().rev() {
            if let Some(found) = scope.get(name) {
                return found.clone();
            }
        }
        if is_lua_keyword(name) {
            format!("{name}_")
        } else {
            name.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn keywords_get_suffixed() {
        let mut scopes = ScopeStack::new();
        assert_eq!(scopes.declare("end"), "end_");
        assert_eq!(scopes.lookup("end"), "end_");
        assert_eq!(scopes.lookup("local"), "local_");
    }

    #[test]
    fn plain_names_pass_through() {
        let mut scopes = ScopeStack::new();
        assert_eq!(scopes.declare("total"), "total");
        assert_eq!(scopes.lookup("total"), "total");
        assert_eq!(scopes.lookup("print"), "print");
    }

    #[test]
    fn same_scope_collisions_get_counters() {
        let mut scopes = ScopeStack::new();
        assert_eq!(scopes.declare("x"), "x");
        assert_eq!(scopes.declare("x"), "x_2");
        assert_eq!(scopes.lookup("x"), "x_2");
    }

    #[test]
    fn inner_scopes_shadow_and_restore() {
        let mut scopes = ScopeStack::new();
        scopes.declare("x");
        scopes.push();
        assert_eq!(scopes.declare("x"), "x");
        scopes.pop();
        assert_eq!(scopes.lookup("x"), "x");
    }

    #[test]
    fn ident_validity() {
        assert!(is_lua_ident("value"));
        assert!(is_lua_ident("_t2"));
        assert!(!is_lua_ident("end"));
        assert!(!is_lua_ident("1x"));
        assert!(!is_lua_ident("a-b"));
        assert!(!is_lua_ident(""));
    }
}
