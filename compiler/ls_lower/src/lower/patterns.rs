//! Destructuring expansion and assignment targets.
//!
//! Every binding-position pattern becomes a sequence of simple
//! declarations keyed on a fresh temporary:
//!
//! ```text
//! let [a, , b] = expr   →  local _d = expr
//!                          local a = _d[1]
//!                          local b = _d[3]
//! ```
//!
//! Defaults test the extracted value against nil, rest elements go through
//! the `__ls.rest_array` / `__ls.rest_object` helpers, and nested patterns
//! recurse through `_nested` temporaries. Source element indices shift by
//! the array pattern's one-based bias when they become table reads.

use super::Lowerer;
use ls_ir::ast::{self, DeclKind, ExprKind, MemberKey, PatternKind, PropertyKey};
use ls_ir::{BinOp, NodeId};

/// A resolved assignment target whose sub-expressions are evaluated once.
pub(crate) enum Target {
    Name(String),
    Member {
        /// Re-readable object node (identifier or literal).
        object: NodeId,
        prop: TargetProp,
    },
}

pub(crate) enum TargetProp {
    Named(String),
    /// Re-readable key node.
    Computed(NodeId),
}

impl Lowerer<'_> {
    // Declarations

    pub(crate) fn lower_declarator(
        &mut self,
        kind: DeclKind,
        declarator: &ast::Declarator,
        out: &mut Vec<NodeId>,
    ) {
        let loc = self.loc(declarator.span);
        // `var` bindings were hoisted to the function top (or are globals
        // at script level), so they lower to assignments.
        let declare = match kind {
            DeclKind::Var => None,
            other => Some(other),
        };
        match (&declarator.pattern.kind, &declarator.init) {
            (PatternKind::Ident(name), Some(init)) => {
                let value = self.lower_expr(init, out);
                match declare {
                    Some(kind) => {
                        let binder = self.builder.identifier(name, loc);
                        let decl = self.builder.var_decl(kind, binder, value, loc);
                        out.push(decl);
                    }
                    None => {
                        let target = self.builder.identifier(name, loc);
                        let assign = self.builder.assignment(target, value, loc);
                        let stmt = self.builder.expression_stmt(assign, loc);
                        out.push(stmt);
                    }
                }
            }
            (PatternKind::Ident(name), None) => {
                // `var x;` is covered entirely by hoisting.
                if let Some(kind) = declare {
                    let binder = self.builder.identifier(name, loc);
                    let decl = self.builder.var_decl(kind, binder, NodeId::INVALID, loc);
                    out.push(decl);
                }
            }
            (_, Some(init)) => {
                let value = self.lower_expr(init, out);
                let source = self.builder.fresh_destructure();
                let binder = self.builder.identifier(&source, None);
                let decl = self.builder.var_decl(DeclKind::Let, binder, value, loc);
                out.push(decl);
                self.expand_pattern(&declarator.pattern, &source, declare, out);
            }
            (_, None) => {
                self.report_semantic(
                    "destructuring declaration without an initializer",
                    declarator.span,
                );
            }
        }
    }

    /// Expand a pattern over the value held by `source`.
    ///
    /// `declare` selects between fresh declarations (`let`/`const`) and
    /// assignments into existing bindings (destructuring assignment, `var`).
    pub(crate) fn expand_pattern(
        &mut self,
        pattern: &ast::Pattern,
        source: &str,
        declare: Option<DeclKind>,
        out: &mut Vec<NodeId>,
    ) {
        match &pattern.kind {
            PatternKind::Ident(name) => {
                let value = self.builder.identifier(source, None);
                self.bind(name, value, declare, out);
            }
            PatternKind::Default { target, value } => {
                let source_read = self.builder.identifier(source, None);
                let nil_lit = self.builder.literal_undefined(None);
                let test = self.builder.binary(BinOp::Eq, source_read, nil_lit, None);
                let mut default_prelude = Vec::new();
                let default_id = self.lower_expr(value, &mut default_prelude);
                if !default_prelude.is_empty() {
                    // Defaults with temporaries would evaluate eagerly here.
                    out.append(&mut default_prelude);
                }
                let source_again = self.builder.identifier(source, None);
                let picked = self
                    .builder
                    .conditional(test, default_id, source_again, None);
                self.bind_value(target, picked, declare, out);
            }
            PatternKind::Array { elements } => {
                for (index, element) in elements.iter().enumerate() {
                    let Some(element) = element else { continue };
                    if let PatternKind::Rest(inner) = &element.kind {
                        // Capture the tail, one-based from this position.
                        let source_read = self.builder.identifier(source, None);
                        let from = self.builder.literal_number(
                            (index + 1) as f64,
                            format!("{}", index + 1),
                            None,
                        );
                        let rest =
                            self.helper_call("rest_array", vec![source_read, from], None);
                        self.bind_value(inner, rest, declare, out);
                        continue;
                    }
                    let source_read = self.builder.identifier(source, None);
                    let key = self.builder.literal_number(
                        (index + 1) as f64,
                        format!("{}", index + 1),
                        None,
                    );
                    let access = self.builder.member_computed(source_read, key, None);
                    self.bind_element(element, access, declare, out);
                }
            }
            PatternKind::Object { properties, rest } => {
                // Keys excluded from the rest capture, evaluated once.
                let mut excluded: Vec<NodeId> = Vec::new();
                for property in properties {
                    let source_read = self.builder.identifier(source, None);
                    let access = match &property.key {
                        PropertyKey::Ident(name) | PropertyKey::Str(name) => {
                            if rest.is_some() {
                                let key = self.builder.literal_string(name, None);
                                excluded.push(key);
                            }
                            self.builder.member_named(source_read, name, None)
                        }
                        PropertyKey::Num { value, raw } => {
                            let key = self.builder.literal_number(*value, raw, None);
                            if rest.is_some() {
                                excluded.push(key);
                            }
                            self.builder.member_computed(source_read, key, None)
                        }
                        PropertyKey::Computed(expression) => {
                            let key = self.lower_expr(expression, out);
                            let key = self.ensure_simple(key, out);
                            if rest.is_some() {
                                excluded.push(key);
                            }
                            self.builder.member_computed(source_read, key, None)
                        }
                    };
                    self.bind_element(&property.value, access, declare, out);
                }
                if let Some(rest) = rest {
                    let source_read = self.builder.identifier(source, None);
                    let excluded_list = self.builder.array_literal(excluded, None);
                    let value = self.helper_call(
                        "rest_object",
                        vec![source_read, excluded_list],
                        None,
                    );
                    self.bind_value(rest, value, declare, out);
                }
            }
            PatternKind::Rest(_) => {
                self.report_semantic("rest element outside array or object pattern", pattern.span);
            }
        }
    }

    /// Bind an element pattern to an extracted value node.
    fn bind_element(
        &mut self,
        pattern: &ast::Pattern,
        access: NodeId,
        declare: Option<DeclKind>,
        out: &mut Vec<NodeId>,
    ) {
        match &pattern.kind {
            PatternKind::Ident(name) => self.bind(name, access, declare, out),
            PatternKind::Default { target, value } => {
                // (access == nil) and default or access; the access node is
                // a pure read over the source temp, so sharing it is safe.
                let nil_lit = self.builder.literal_undefined(None);
                let test = self.builder.binary(BinOp::Eq, access, nil_lit, None);
                let mut default_prelude = Vec::new();
                let default_id = self.lower_expr(value, &mut default_prelude);
                if !default_prelude.is_empty() {
                    out.append(&mut default_prelude);
                }
                let picked = self.builder.conditional(test, default_id, access, None);
                self.bind_value(target, picked, declare, out);
            }
            PatternKind::Array { .. } | PatternKind::Object { .. } => {
                // Nested patterns re-anchor on a fresh temporary.
                let nested = self.builder.fresh_nested();
                let binder = self.builder.identifier(&nested, None);
                let decl = self.builder.var_decl(DeclKind::Let, binder, access, None);
                out.push(decl);
                self.expand_pattern(pattern, &nested, declare, out);
            }
            PatternKind::Rest(_) => {
                self.report_semantic("misplaced rest element", pattern.span);
            }
        }
    }

    /// Bind a pattern to an already computed value node.
    fn bind_value(
        &mut self,
        pattern: &ast::Pattern,
        value: NodeId,
        declare: Option<DeclKind>,
        out: &mut Vec<NodeId>,
    ) {
        match &pattern.kind {
            PatternKind::Ident(name) => self.bind(name, value, declare, out),
            _ => {
                let nested = self.builder.fresh_nested();
                let binder = self.builder.identifier(&nested, None);
                let decl = self.builder.var_decl(DeclKind::Let, binder, value, None);
                out.push(decl);
                self.expand_pattern(pattern, &nested, declare, out);
            }
        }
    }

    fn bind(
        &mut self,
        name: &str,
        value: NodeId,
        declare: Option<DeclKind>,
        out: &mut Vec<NodeId>,
    ) {
        match declare {
            Some(kind) => {
                let binder = self.builder.identifier(name, None);
                let decl = self.builder.var_decl(kind, binder, value, None);
                out.push(decl);
            }
            None => {
                let target = self.builder.identifier(name, None);
                let assign = self.builder.assignment(target, value, None);
                let stmt = self.builder.expression_stmt(assign, None);
                out.push(stmt);
            }
        }
    }

    // Assignment targets

    /// Resolve an assignable expression so later reads and the final write
    /// evaluate its sub-expressions exactly once.
    pub(crate) fn resolve_target(
        &mut self,
        expression: &ast::Expr,
        out: &mut Vec<NodeId>,
    ) -> Option<Target> {
        match &expression.kind {
            ExprKind::Ident(name) => Some(Target::Name(name.clone())),
            ExprKind::This => Some(Target::Name("self".to_string())),
            ExprKind::Member {
                object,
                property,
                optional: false,
            } => {
                let object_id = self.lower_expr(object, out);
                let object_id = self.ensure_simple(object_id, out);
                let prop = match property {
                    MemberKey::Named(name) => TargetProp::Named(name.clone()),
                    MemberKey::Computed(key) => {
                        let key_id = self.lower_expr(key, out);
                        TargetProp::Computed(self.ensure_simple(key_id, out))
                    }
                };
                Some(Target::Member {
                    object: object_id,
                    prop,
                })
            }
            _ => None,
        }
    }

    /// Fresh node reading the target's current value.
    pub(crate) fn target_read(&mut self, target: &Target) -> NodeId {
        match target {
            Target::Name(name) => self.builder.identifier(name, None),
            Target::Member { object, prop } => match prop {
                TargetProp::Named(name) => self.builder.member_named(*object, name, None),
                TargetProp::Computed(key) => self.builder.member_computed(*object, *key, None),
            },
        }
    }

    /// Fresh node naming the target as an assignment destination.
    pub(crate) fn target_write(&mut self, target: &Target) -> NodeId {
        self.target_read(target)
    }
}

/// Collect every name bound by a pattern (for `var` hoisting).
pub(crate) fn pattern_names(pattern: &ast::Pattern, names: &mut Vec<String>) {
    match &pattern.kind {
        PatternKind::Ident(name) => names.push(name.clone()),
        PatternKind::Array { elements } => {
            for element in elements.iter().flatten() {
                pattern_names(element, names);
            }
        }
        PatternKind::Object { properties, rest } => {
            for property in properties {
                pattern_names(&property.value, names);
            }
            if let Some(rest) = rest {
                pattern_names(rest, names);
            }
        }
        PatternKind::Rest(inner) => pattern_names(inner, names),
        PatternKind::Default { target, .. } => pattern_names(target, names),
    }
}
