//! The Lua printer.
//!
//! Statements print line by line with two-space indentation; expressions
//! stream into the current line under a minimum-precedence context that
//! decides parentheses. `return`/`break` in non-final positions wrap in
//! `do … end` as Lua requires.

use crate::output::{Emitter, StringEmitter};
use crate::precedence::{
    bin_prec, log_prec, Assoc, PREC_AND, PREC_CONCAT, PREC_OR, PREC_PRIMARY, PREC_UNARY,
};
use crate::scope::{is_lua_ident, ScopeStack};
use crate::{EmitOptions, EmitOutput};
use ls_diagnostic::{Diagnostic, ErrorCode};
use ls_ir::{BinOp, CompilationUnit, LitValue, MemberProp, NodeId, NodeKind, PropKey};

const INDENT: usize = 2;

/// Recursion guard for hand-built cyclic graphs.
const MAX_EMIT_DEPTH: usize = 512;

pub(crate) struct LuaEmitter<'a> {
    unit: &'a CompilationUnit,
    options: &'a EmitOptions,
    out: StringEmitter,
    scopes: ScopeStack,
    diagnostics: Vec<Diagnostic>,
    indent: usize,
    depth: usize,
    module_scope: bool,
}

impl<'a> LuaEmitter<'a> {
    pub(crate) fn run(unit: &'a CompilationUnit, options: &'a EmitOptions) -> EmitOutput {
        let mut emitter = LuaEmitter {
            unit,
            options,
            out: StringEmitter::with_capacity(crate::PREAMBLE.len() + unit.node_count() * 8),
            scopes: ScopeStack::new(),
            diagnostics: Vec::new(),
            indent: 0,
            depth: 0,
            module_scope: true,
        };
        emitter.out.emit(crate::PREAMBLE);
        emitter.out.emit_newline();

        match emitter.kind(unit.root) {
            Some(NodeKind::Program { body }) => {
                let body = body.clone();
                emitter.emit_stmts(&body);
            }
            _ => {
                emitter.diagnostics.push(
                    Diagnostic::error(ErrorCode::EmitError, "root is not a Program node")
                        .with_node(unit.root),
                );
            }
        }

        emitter.out.ensure_trailing_newline();
        EmitOutput {
            lua: emitter.out.output(),
            diagnostics: emitter.diagnostics,
        }
    }

    fn kind(&self, id: NodeId) -> Option<&'a NodeKind> {
        self.unit.nodes.kind(id)
    }

    fn emit_error(&mut self, id: NodeId, what: &str) {
        self.diagnostics.push(
            Diagnostic::error(
                ErrorCode::EmitError,
                format!("cannot emit {what} (should not appear in validated IR)"),
            )
            .with_node(id),
        );
    }

    fn loc_of(&self, id: NodeId) -> Option<ls_ir::Loc> {
        self.unit.nodes.get(id).and_then(|node| node.loc)
    }

    // Lines and indentation

    fn start_line(&mut self) {
        self.out.emit_indent(self.indent * INDENT);
    }

    fn end_line(&mut self) {
        self.out.emit_newline();
    }

    fn line(&mut self, text: &str) {
        self.start_line();
        self.out.emit(text);
        self.end_line();
    }

    // Statements

    fn emit_stmts(&mut self, ids: &[NodeId]) {
        let last = ids.len().saturating_sub(1);
        for (index, &id) in ids.iter().enumerate() {
            self.emit_stmt(id, index == last);
        }
    }

    fn emit_stmt(&mut self, id: NodeId, is_last: bool) {
        if self.depth >= MAX_EMIT_DEPTH {
            self.emit_error(id, "deeply nested statement");
            return;
        }
        self.depth += 1;
        self.emit_stmt_inner(id, is_last);
        self.depth -= 1;
    }

    fn emit_stmt_inner(&mut self, id: NodeId, is_last: bool) {
        if self.options.debug_info {
            if let Some(loc) = self.loc_of(id) {
                self.line(&format!("-- {loc}"));
            }
        }
        let Some(kind) = self.kind(id) else {
            self.emit_error(id, "a dangling statement reference");
            return;
        };
        match kind.clone() {
            NodeKind::VarDecl { binder, init, .. } => self.emit_var_decl(id, binder, init),
            NodeKind::FunctionDecl {
                name,
                params,
                body,
                is_async,
                ..
            } => {
                let emitted = self.scopes.declare(&name);
                self.start_line();
                if is_async {
                    self.out.emit("--[[async]] ");
                }
                if !self.module_scope {
                    self.out.emit("local ");
                }
                self.out.emit("function ");
                self.out.emit(&emitted);
                self.emit_function_tail(&params, body);
                self.end_line();
            }
            NodeKind::Block { body } => {
                self.line("do");
                self.enter_block(&body);
                self.line("end");
            }
            NodeKind::If { .. } => self.emit_if(id),
            NodeKind::While { test, body } => {
                self.start_line();
                self.out.emit("while ");
                self.emit_expr(test, 0);
                self.out.emit(" do");
                self.end_line();
                self.enter_stmt_block(body);
                self.line("end");
            }
            NodeKind::DoWhile { body, test } => {
                self.line("repeat");
                self.enter_stmt_block(body);
                self.start_line();
                match self.kind(test) {
                    Some(NodeKind::Literal {
                        value: LitValue::Boolean { value: false },
                    }) => self.out.emit("until true"),
                    Some(NodeKind::Literal {
                        value: LitValue::Boolean { value: true },
                    }) => self.out.emit("until false"),
                    _ => {
                        self.out.emit("until not (");
                        self.emit_expr(test, 0);
                        self.out.emit(")");
                    }
                }
                self.end_line();
            }
            NodeKind::Return { argument } => {
                self.start_line();
                if !is_last {
                    self.out.emit("do ");
                }
                self.out.emit("return");
                if argument.is_valid() {
                    self.out.emit(" ");
                    self.emit_expr(argument, 0);
                }
                if !is_last {
                    self.out.emit(" end");
                }
                self.end_line();
            }
            NodeKind::Break => {
                if is_last {
                    self.line("break");
                } else {
                    self.line("do break end");
                }
            }
            NodeKind::Throw { argument } => {
                self.start_line();
                self.out.emit("error(");
                self.emit_expr(argument, 0);
                self.out.emit(")");
                self.end_line();
            }
            NodeKind::ExpressionStmt { expression } => self.emit_expr_stmt(expression),
            NodeKind::Empty => {}
            other => {
                let name = other.name();
                self.emit_error(id, name);
                let loc = self
                    .loc_of(id)
                    .map(|loc| loc.to_string())
                    .unwrap_or_else(|| "?".to_string());
                self.line(&format!("-- UNSUPPORTED: {name} at {loc}"));
            }
        }
    }

    fn emit_var_decl(&mut self, id: NodeId, binder: NodeId, init: NodeId) {
        // Collect bound names: one for identifier binders, several for the
        // multi-value `local a, b = f()` form used by lowered pcall/resume.
        let names: Vec<String> = match self.kind(binder) {
            Some(NodeKind::Identifier { name }) => vec![name.clone()],
            Some(NodeKind::ArrayPattern { elements, .. }) => {
                let elements = elements.clone();
                elements
                    .iter()
                    .map(|&element| match self.kind(element) {
                        Some(NodeKind::Identifier { name }) => name.clone(),
                        _ => "_".to_string(),
                    })
                    .collect()
            }
            _ => {
                self.emit_error(id, "a non-identifier declaration binder");
                vec!["_".to_string()]
            }
        };
        let emitted: Vec<String> = names.iter().map(|name| self.scopes.declare(name)).collect();
        self.start_line();
        self.out.emit("local ");
        self.out.emit(&emitted.join(", "));
        if init.is_valid() {
            self.out.emit(" = ");
            self.emit_expr(init, 0);
        }
        self.end_line();
    }

    fn emit_expr_stmt(&mut self, expression: NodeId) {
        match self.kind(expression) {
            Some(NodeKind::Assignment { target, value }) => {
                let target = *target;
                let value = *value;
                self.emit_assignment_stmt(target, value);
            }
            Some(NodeKind::Call { .. } | NodeKind::New { .. } | NodeKind::YieldExpr { .. }) => {
                self.start_line();
                self.emit_expr(expression, 0);
                self.end_line();
            }
            Some(NodeKind::Unsupported { construct }) => {
                let construct = construct.clone();
                let loc = self
                    .loc_of(expression)
                    .map(|loc| loc.to_string())
                    .unwrap_or_else(|| "?".to_string());
                self.line(&format!("-- UNSUPPORTED: {construct} at {loc}"));
            }
            _ => {
                // Lua only allows calls as expression statements.
                self.start_line();
                self.out.emit("local _ = ");
                self.emit_expr(expression, 0);
                self.end_line();
            }
        }
    }

    fn emit_assignment_stmt(&mut self, target: NodeId, value: NodeId) {
        // `B.m = function(self, …) … end` prints as a named function
        // definition when the target is a dotted path.
        if let (
            Some(NodeKind::Member {
                object,
                property: MemberProp::Named(prop),
            }),
            Some(NodeKind::FunctionExpr {
                params,
                body,
                is_async,
                ..
            }),
        ) = (self.kind(target), self.kind(value))
        {
            if is_lua_ident(prop) {
                if let Some(NodeKind::Identifier { name }) = self.kind(*object) {
                    let path = format!("{}.{}", self.scopes.lookup(name), prop);
                    let params = params.clone();
                    let body = *body;
                    let is_async = *is_async;
                    self.start_line();
                    if is_async {
                        self.out.emit("--[[async]] ");
                    }
                    self.out.emit("function ");
                    self.out.emit(&path);
                    self.emit_function_tail(&params, body);
                    self.end_line();
                    return;
                }
            }
        }

        self.start_line();
        match self.kind(target).cloned() {
            Some(NodeKind::Identifier { name }) => {
                let emitted = self.scopes.lookup(&name);
                self.out.emit(&emitted);
            }
            Some(NodeKind::Member { .. }) => self.emit_expr(target, PREC_PRIMARY),
            Some(NodeKind::ArrayPattern { elements, .. }) => {
                // Multi-value assignment: `_ok, _res = resume(…)`.
                let names: Vec<String> = elements
                    .iter()
                    .map(|&element| match self.kind(element) {
                        Some(NodeKind::Identifier { name }) => self.scopes.lookup(name),
                        _ => "_".to_string(),
                    })
                    .collect();
                self.out.emit(&names.join(", "));
            }
            _ => {
                self.emit_error(target, "an invalid assignment target");
                self.out.emit("_");
            }
        }
        self.out.emit(" = ");
        self.emit_expr(value, 0);
        self.end_line();
    }

    fn emit_if(&mut self, id: NodeId) {
        // Single-statement consequents with no else print on one line:
        // `if x == nil then break end`.
        if let Some(NodeKind::If {
            test,
            consequent,
            alternate,
        }) = self.kind(id)
        {
            let (test, consequent, alternate) = (*test, *consequent, *alternate);
            if !alternate.is_valid() {
                if let Some(simple) = self.simple_stmt(consequent) {
                    self.start_line();
                    self.out.emit("if ");
                    self.emit_expr(test, 0);
                    self.out.emit(" then ");
                    self.emit_inline_stmt(simple);
                    self.out.emit(" end");
                    self.end_line();
                    return;
                }
            }

            self.start_line();
            self.out.emit("if ");
            self.emit_expr(test, 0);
            self.out.emit(" then");
            self.end_line();
            self.enter_stmt_block(consequent);

            let mut alt = alternate;
            while alt.is_valid() {
                match self.kind(alt) {
                    Some(NodeKind::If {
                        test,
                        consequent,
                        alternate,
                    }) => {
                        let (test, consequent, next) = (*test, *consequent, *alternate);
                        self.start_line();
                        self.out.emit("elseif ");
                        self.emit_expr(test, 0);
                        self.out.emit(" then");
                        self.end_line();
                        self.enter_stmt_block(consequent);
                        alt = next;
                    }
                    _ => {
                        self.line("else");
                        self.enter_stmt_block(alt);
                        break;
                    }
                }
            }
            self.line("end");
        }
    }

    /// The single statement inside a consequent, when it is simple enough
    /// to inline.
    fn simple_stmt(&mut self, id: NodeId) -> Option<NodeId> {
        let inner = match self.kind(id) {
            Some(NodeKind::Block { body }) if body.len() == 1 => body[0],
            Some(NodeKind::Block { .. }) => return None,
            _ => id,
        };
        match self.kind(inner) {
            Some(NodeKind::Break) => Some(inner),
            Some(NodeKind::Return { .. }) => Some(inner),
            Some(NodeKind::ExpressionStmt { expression }) => match self.kind(*expression) {
                Some(NodeKind::Assignment { target, value }) => {
                    // Function-valued assignments span lines.
                    if matches!(
                        self.kind(*value),
                        Some(NodeKind::FunctionExpr { .. } | NodeKind::Arrow { .. })
                    ) {
                        return None;
                    }
                    match self.kind(*target) {
                        Some(NodeKind::Identifier { .. } | NodeKind::Member { .. }) => Some(inner),
                        _ => None,
                    }
                }
                _ => None,
            },
            _ => None,
        }
    }

    fn emit_inline_stmt(&mut self, id: NodeId) {
        match self.kind(id) {
            Some(NodeKind::Break) => self.out.emit("break"),
            Some(NodeKind::Return { argument }) => {
                let argument = *argument;
                self.out.emit("return");
                if argument.is_valid() {
                    self.out.emit(" ");
                    self.emit_expr(argument, 0);
                }
            }
            Some(NodeKind::ExpressionStmt { expression }) => {
                if let Some(NodeKind::Assignment { target, value }) = self.kind(*expression) {
                    let (target, value) = (*target, *value);
                    match self.kind(target).cloned() {
                        Some(NodeKind::Identifier { name }) => {
                            let emitted = self.scopes.lookup(&name);
                            self.out.emit(&emitted);
                        }
                        _ => self.emit_expr(target, PREC_PRIMARY),
                    }
                    self.out.emit(" = ");
                    self.emit_expr(value, 0);
                }
            }
            _ => {}
        }
    }

    /// Emit a statement-position child indented one level, unwrapping a
    /// Block so function/if bodies do not nest a redundant `do`.
    fn enter_stmt_block(&mut self, id: NodeId) {
        self.indent += 1;
        match self.kind(id) {
            Some(NodeKind::Block { body }) => {
                let body = body.clone();
                self.scopes.push();
                let saved = self.module_scope;
                self.module_scope = false;
                self.emit_stmts(&body);
                self.module_scope = saved;
                self.scopes.pop();
            }
            _ => self.emit_stmt(id, true),
        }
        self.indent -= 1;
    }

    fn enter_block(&mut self, body: &[NodeId]) {
        self.indent += 1;
        self.scopes.push();
        let saved = self.module_scope;
        self.module_scope = false;
        self.emit_stmts(body);
        self.module_scope = saved;
        self.scopes.pop();
        self.indent -= 1;
    }

    // Functions

    /// Emit `(params)` plus the indented body and closing `end` (without a
    /// trailing newline; callers finish the line).
    fn emit_function_tail(&mut self, params: &[NodeId], body: NodeId) {
        self.scopes.push();
        let saved = self.module_scope;
        self.module_scope = false;

        self.out.emit("(");
        let mut first = true;
        for &param in params {
            if !first {
                self.out.emit(", ");
            }
            first = false;
            let name = match self.kind(param) {
                Some(NodeKind::ParamDecl { binding, .. }) => match self.kind(*binding) {
                    Some(NodeKind::Identifier { name }) => name.clone(),
                    _ => {
                        self.emit_error(param, "a pattern parameter");
                        "_".to_string()
                    }
                },
                _ => {
                    self.emit_error(param, "a non-parameter in a parameter list");
                    "_".to_string()
                }
            };
            let emitted = self.scopes.declare(&name);
            self.out.emit(&emitted);
        }
        self.out.emit(")");
        self.end_line();

        self.indent += 1;
        match self.kind(body) {
            Some(NodeKind::Block { body }) => {
                let body = body.clone();
                self.emit_stmts(&body);
            }
            _ => self.emit_stmt(body, true),
        }
        self.indent -= 1;

        self.module_scope = saved;
        self.scopes.pop();
        self.start_line();
        self.out.emit("end");
    }

    // Expressions

    fn prec_of(&self, id: NodeId) -> u8 {
        match self.kind(id) {
            Some(NodeKind::BinaryOp { op, .. }) => bin_prec(*op).0,
            Some(NodeKind::LogicalOp { op, .. }) => log_prec(*op),
            Some(NodeKind::UnaryOp { .. }) => PREC_UNARY,
            Some(NodeKind::Conditional { .. }) => PREC_OR,
            _ => PREC_PRIMARY,
        }
    }

    fn emit_expr(&mut self, id: NodeId, min_prec: u8) {
        if self.depth >= MAX_EMIT_DEPTH {
            self.emit_error(id, "deeply nested expression");
            self.out.emit("nil");
            return;
        }
        self.depth += 1;
        let needs_parens = self.prec_of(id) < min_prec;
        if needs_parens {
            self.out.emit("(");
        }
        self.emit_expr_inner(id);
        if needs_parens {
            self.out.emit(")");
        }
        self.depth -= 1;
    }

    fn emit_expr_inner(&mut self, id: NodeId) {
        let Some(kind) = self.kind(id).cloned() else {
            self.emit_error(id, "a dangling expression reference");
            self.out.emit("nil");
            return;
        };
        match kind {
            NodeKind::Literal { value } => self.emit_literal(&value),
            NodeKind::Identifier { name } => {
                let emitted = self.scopes.lookup(&name);
                self.out.emit(&emitted);
            }
            NodeKind::BinaryOp { op, left, right } => {
                let (prec, assoc) = bin_prec(op);
                // Concatenation is associative over strings, so chains in
                // either direction stay unparenthesized.
                let (left_min, right_min) = match (op, assoc) {
                    (BinOp::Concat, _) => (PREC_CONCAT, PREC_CONCAT),
                    (_, Assoc::Left) => (prec, prec + 1),
                    (_, Assoc::Right) => (prec + 1, prec),
                };
                self.emit_expr(left, left_min);
                self.out.emit(" ");
                self.out.emit(op.lua());
                self.out.emit(" ");
                self.emit_expr(right, right_min);
            }
            NodeKind::LogicalOp { op, left, right } => {
                let prec = log_prec(op);
                let text = match op {
                    ls_ir::LogOp::And => "and",
                    ls_ir::LogOp::Or | ls_ir::LogOp::Nullish => "or",
                };
                self.emit_expr(left, prec);
                self.out.emit(" ");
                self.out.emit(text);
                self.out.emit(" ");
                self.emit_expr(right, prec + 1);
            }
            NodeKind::UnaryOp { op, operand } => {
                self.out.emit(op.lua());
                // `--` would start a comment; parenthesize nested negation.
                let nested_neg = op == ls_ir::UnOp::Neg
                    && matches!(
                        self.kind(operand),
                        Some(NodeKind::UnaryOp {
                            op: ls_ir::UnOp::Neg,
                            ..
                        })
                    );
                if nested_neg {
                    self.out.emit("(");
                    self.emit_expr(operand, 0);
                    self.out.emit(")");
                } else {
                    self.emit_expr(operand, PREC_UNARY);
                }
            }
            NodeKind::Conditional {
                test,
                consequent,
                alternate,
            } => self.emit_conditional(test, consequent, alternate),
            NodeKind::Call {
                callee,
                arguments,
                this_call,
            } => self.emit_call(callee, &arguments, this_call),
            NodeKind::New { callee, arguments } => {
                self.emit_postfix_base(callee);
                self.out.emit(".new(");
                self.emit_args(&arguments);
                self.out.emit(")");
            }
            NodeKind::Member { object, property } => self.emit_member(object, &property),
            NodeKind::OptionalMember {
                object, property, ..
            } => self.emit_member(object, &property),
            NodeKind::ArrayLiteral { elements } => {
                self.out.emit("{");
                let mut first = true;
                for &element in &elements {
                    if !first {
                        self.out.emit(", ");
                    }
                    first = false;
                    match self.kind(element) {
                        Some(NodeKind::Spread { argument }) => {
                            let argument = *argument;
                            self.out.emit("table.unpack(");
                            self.emit_expr(argument, 0);
                            self.out.emit(")");
                        }
                        _ => self.emit_expr(element, 0),
                    }
                }
                self.out.emit("}");
            }
            NodeKind::ObjectLiteral { properties } => self.emit_object(&properties),
            NodeKind::FunctionExpr {
                params,
                body,
                is_async,
                ..
            } => {
                if is_async {
                    self.out.emit("--[[async]] ");
                }
                self.out.emit("function");
                self.emit_function_tail(&params, body);
            }
            NodeKind::Arrow {
                params,
                body,
                is_async,
            } => {
                if is_async {
                    self.out.emit("--[[async]] ");
                }
                self.out.emit("function");
                self.emit_function_tail(&params, body);
            }
            NodeKind::YieldExpr { argument, .. } => {
                self.out.emit("coroutine.yield(");
                if argument.is_valid() {
                    self.emit_expr(argument, 0);
                }
                self.out.emit(")");
            }
            NodeKind::Spread { argument } => {
                // Only valid inside array literals and packed argument
                // tuples; elsewhere it degrades to the unpack call.
                self.out.emit("table.unpack(");
                self.emit_expr(argument, 0);
                self.out.emit(")");
            }
            NodeKind::Assignment { .. } => {
                self.emit_error(id, "an assignment in expression position");
                self.out.emit("nil");
            }
            NodeKind::Unsupported { construct } => {
                self.out.emit("nil --[[ UNSUPPORTED: ");
                self.out.emit(&construct);
                self.out.emit(" ]]");
            }
            other => {
                let name = other.name();
                self.emit_error(id, name);
                self.out.emit("nil --[[ ");
                self.out.emit(name);
                self.out.emit(" ]]");
            }
        }
    }

    fn emit_literal(&mut self, value: &LitValue) {
        match value {
            LitValue::Number { value, raw } => {
                let text = number_text(*value, raw);
                self.out.emit(&text);
            }
            LitValue::String { value } => {
                let quoted = lua_quote(value);
                self.out.emit(&quoted);
            }
            LitValue::Boolean { value } => {
                self.out.emit(if *value { "true" } else { "false" });
            }
            LitValue::Null | LitValue::Undefined => self.out.emit("nil"),
        }
    }

    /// `test and cons or alt`, falling back to a closure when the
    /// consequent is falsy (where the and/or idiom breaks down).
    fn emit_conditional(&mut self, test: NodeId, consequent: NodeId, alternate: NodeId) {
        let falsy_consequent = matches!(
            self.kind(consequent),
            Some(NodeKind::Literal {
                value: LitValue::Null | LitValue::Undefined | LitValue::Boolean { value: false },
            })
        );
        if falsy_consequent {
            self.out.emit("(function() if ");
            self.emit_expr(test, 0);
            self.out.emit(" then return ");
            self.emit_expr(consequent, 0);
            self.out.emit(" else return ");
            self.emit_expr(alternate, 0);
            self.out.emit(" end end)()");
            return;
        }
        self.emit_expr(test, PREC_AND);
        self.out.emit(" and ");
        self.emit_expr(consequent, PREC_AND + 1);
        self.out.emit(" or ");
        self.emit_expr(alternate, PREC_OR + 1);
    }

    fn emit_call(&mut self, callee: NodeId, arguments: &[NodeId], this_call: bool) {
        if this_call {
            if let Some(NodeKind::Member {
                object,
                property: MemberProp::Named(name),
            }) = self.kind(callee)
            {
                if is_lua_ident(name) {
                    let (object, name) = (*object, name.clone());
                    self.emit_postfix_base(object);
                    self.out.emit(":");
                    self.out.emit(&name);
                    self.out.emit("(");
                    self.emit_args(arguments);
                    self.out.emit(")");
                    return;
                }
            }
        }
        self.emit_postfix_base(callee);
        self.out.emit("(");
        self.emit_args(arguments);
        self.out.emit(")");
    }

    fn emit_args(&mut self, arguments: &[NodeId]) {
        let mut first = true;
        for &argument in arguments {
            if !first {
                self.out.emit(", ");
            }
            first = false;
            self.emit_expr(argument, 0);
        }
    }

    fn emit_member(&mut self, object: NodeId, property: &MemberProp) {
        self.emit_postfix_base(object);
        match property {
            MemberProp::Named(name) if is_lua_ident(name) => {
                self.out.emit(".");
                self.out.emit(name);
            }
            MemberProp::Named(name) => {
                let quoted = lua_quote(name);
                self.out.emit("[");
                self.out.emit(&quoted);
                self.out.emit("]");
            }
            MemberProp::Computed(key) => {
                self.out.emit("[");
                self.emit_expr(*key, 0);
                self.out.emit("]");
            }
        }
    }

    /// Emit a callee/member base, parenthesizing anything that cannot
    /// legally take a suffix in Lua (literals, closures, operators).
    fn emit_postfix_base(&mut self, id: NodeId) {
        let safe = matches!(
            self.kind(id),
            Some(
                NodeKind::Identifier { .. }
                    | NodeKind::Member { .. }
                    | NodeKind::OptionalMember { .. }
                    | NodeKind::Call { .. }
                    | NodeKind::New { .. }
            )
        );
        if safe {
            self.emit_expr(id, PREC_PRIMARY);
        } else {
            self.out.emit("(");
            self.emit_expr(id, 0);
            self.out.emit(")");
        }
    }

    fn emit_object(&mut self, properties: &[NodeId]) {
        if properties.is_empty() {
            self.out.emit("{}");
            return;
        }
        self.out.emit("{ ");
        let mut first = true;
        for &property in properties {
            if !first {
                self.out.emit(", ");
            }
            first = false;
            match self.kind(property).cloned() {
                Some(NodeKind::PropertyInit { key, value, .. }) => {
                    match key {
                        PropKey::Ident(name) if is_lua_ident(&name) => {
                            self.out.emit(&name);
                        }
                        PropKey::Ident(name) | PropKey::Str(name) => {
                            let quoted = lua_quote(&name);
                            self.out.emit("[");
                            self.out.emit(&quoted);
                            self.out.emit("]");
                        }
                        PropKey::Num(value) => {
                            let text = number_text(value, "");
                            self.out.emit("[");
                            self.out.emit(&text);
                            self.out.emit("]");
                        }
                        PropKey::Computed(key) => {
                            self.out.emit("[");
                            self.emit_expr(key, 0);
                            self.out.emit("]");
                        }
                    }
                    self.out.emit(" = ");
                    self.emit_expr(value, 0);
                }
                Some(NodeKind::Spread { argument }) => {
                    // Table constructors cannot splice; last-position
                    // spread still expands.
                    self.out.emit("table.unpack(");
                    self.emit_expr(argument, 0);
                    self.out.emit(")");
                }
                _ => {
                    self.emit_error(property, "a non-property object member");
                    self.out.emit("nil");
                }
            }
        }
        self.out.emit(" }");
    }

}

/// Render a numeric literal, reusing the source spelling when Lua accepts
/// it verbatim.
fn number_text(value: f64, raw: &str) -> String {
    let cleaned: String = raw.chars().filter(|&c| c != '_').collect();
    if is_lua_number(&cleaned) {
        return cleaned;
    }
    if value.is_nan() {
        return "(0 / 0)".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 {
            "math.huge".to_string()
        } else {
            "-math.huge".to_string()
        };
    }
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

/// Decimal and hexadecimal spellings shared between the two languages.
fn is_lua_number(text: &str) -> bool {
    if text.is_empty() {
        return false;
    }
    let bytes = text.as_bytes();
    if text.len() > 2 && (bytes[1] == b'x' || bytes[1] == b'X') && bytes[0] == b'0' {
        return text[2..].bytes().all(|b| b.is_ascii_hexdigit());
    }
    let mut seen_digit = false;
    let mut seen_dot = false;
    let mut seen_exp = false;
    let mut prev_exp = false;
    for &b in bytes {
        match b {
            b'0'..=b'9' => {
                seen_digit = true;
                prev_exp = false;
            }
            b'.' if !seen_dot && !seen_exp => {
                seen_dot = true;
                prev_exp = false;
            }
            b'e' | b'E' if seen_digit && !seen_exp => {
                seen_exp = true;
                prev_exp = true;
            }
            b'+' | b'-' if prev_exp => {
                prev_exp = false;
            }
            _ => return false,
        }
    }
    seen_digit
}

/// Quote a string with Lua escaping.
fn lua_quote(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => {
                out.push_str(&format!("\\{}", c as u32));
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

#[cfg(test)]
mod tests {
    use super::{is_lua_number, lua_quote, number_text};
    use pretty_assertions::assert_eq;

    #[test]
    fn number_spellings_reuse_source_where_lua_accepts() {
        assert_eq!(number_text(42.0, "42"), "42");
        assert_eq!(number_text(3.5, "3.5"), "3.5");
        assert_eq!(number_text(255.0, "0xff"), "0xff");
        assert_eq!(number_text(1000.0, "1_000"), "1000");
        assert_eq!(number_text(1000.0, "1e3"), "1e3");
        // Binary literals are not Lua; fall back to the value.
        assert_eq!(number_text(5.0, "0b101"), "5");
    }

    #[test]
    fn lua_number_recognizer() {
        assert!(is_lua_number("0"));
        assert!(is_lua_number("10.25"));
        assert!(is_lua_number("2e-8"));
        assert!(is_lua_number("0xAF"));
        assert!(!is_lua_number("0b11"));
        assert!(!is_lua_number("0o17"));
        assert!(!is_lua_number("1.2.3"));
        assert!(!is_lua_number(""));
    }

    #[test]
    fn strings_quote_and_escape() {
        assert_eq!(lua_quote("plain"), "\"plain\"");
        assert_eq!(lua_quote("a\nb"), "\"a\\nb\"");
        assert_eq!(lua_quote("say \"hi\""), "\"say \\\"hi\\\"\"");
        assert_eq!(lua_quote("back\\slash"), "\"back\\\\slash\"");
    }
}
