//! Pre-flight AST validation.
//!
//! A lightweight semantic check between parsing and lowering. The typed AST
//! makes most malformed shapes unrepresentable (functions always have
//! bodies, markers only sit on function-like nodes, patterns only parse in
//! binding positions); what remains is contextual: `yield` outside a
//! generator, `await` outside `async`, `super` outside a subclass method,
//! duplicate constructors.
//!
//! Failures are warnings unless `strict` is set, in which case they become
//! errors and the pipeline aborts before lowering.

use ls_diagnostic::{Diagnostic, ErrorCode};
use ls_ir::ast::{
    Class, Dialect, Expr, ExprKind, ForInit, Function, FunctionBody, Pattern, PatternKind,
    Program, Stmt, StmtKind,
};
use ls_ir::{LineMap, Span};

/// Validate a parsed program, producing semantic diagnostics.
pub fn validate_program(
    program: &Program,
    dialect: Dialect,
    strict: bool,
    line_map: &LineMap,
) -> Vec<Diagnostic> {
    let mut validator = Validator {
        dialect,
        strict,
        line_map,
        diagnostics: Vec::new(),
    };
    let ctx = Ctx {
        in_generator: false,
        in_async: false,
        in_function: false,
        in_subclass_member: false,
    };
    for stmt in &program.body {
        validator.stmt(stmt, ctx);
    }
    validator.diagnostics
}

/// Contextual flags carried down the walk.
#[derive(Copy, Clone)]
struct Ctx {
    in_generator: bool,
    in_async: bool,
    in_function: bool,
    in_subclass_member: bool,
}

struct Validator<'a> {
    dialect: Dialect,
    strict: bool,
    line_map: &'a LineMap,
    diagnostics: Vec<Diagnostic>,
}

impl Validator<'_> {
    fn report(&mut self, message: impl Into<String>, span: Span) {
        let diagnostic = Diagnostic::error(ErrorCode::AstValidation, message)
            .with_loc(self.line_map.loc(span.start));
        self.diagnostics.push(if self.strict {
            diagnostic
        } else {
            diagnostic.downgraded()
        });
    }

    fn warn(&mut self, message: impl Into<String>, span: Span) {
        self.diagnostics.push(
            Diagnostic::warning(ErrorCode::AstValidation, message)
                .with_loc(self.line_map.loc(span.start)),
        );
    }

    fn stmt(&mut self, stmt: &Stmt, ctx: Ctx) {
        match &stmt.kind {
            StmtKind::VarDecl { declarators, .. } => {
                for declarator in declarators {
                    self.pattern(&declarator.pattern, ctx);
                    if let Some(init) = &declarator.init {
                        self.expr(init, ctx);
                    }
                }
            }
            StmtKind::FunctionDecl(function) => self.function(function, ctx),
            StmtKind::ClassDecl(class) => self.class(class, ctx),
            StmtKind::Block(body) => {
                for stmt in body {
                    self.stmt(stmt, ctx);
                }
            }
            StmtKind::If {
                test,
                consequent,
                alternate,
            } => {
                self.expr(test, ctx);
                self.stmt(consequent, ctx);
                if let Some(alternate) = alternate {
                    self.stmt(alternate, ctx);
                }
            }
            StmtKind::While { test, body } => {
                self.expr(test, ctx);
                self.stmt(body, ctx);
            }
            StmtKind::DoWhile { body, test } => {
                self.stmt(body, ctx);
                self.expr(test, ctx);
            }
            StmtKind::For {
                init,
                test,
                update,
                body,
            } => {
                match init {
                    Some(ForInit::VarDecl { declarators, .. }) => {
                        for declarator in declarators {
                            self.pattern(&declarator.pattern, ctx);
                            if let Some(init) = &declarator.init {
                                self.expr(init, ctx);
                            }
                        }
                    }
                    Some(ForInit::Expr(expr)) => self.expr(expr, ctx),
                    None => {}
                }
                if let Some(test) = test {
                    self.expr(test, ctx);
                }
                if let Some(update) = update {
                    self.expr(update, ctx);
                }
                self.stmt(body, ctx);
            }
            StmtKind::ForOf {
                binding,
                iterable,
                body,
                ..
            } => {
                self.pattern(binding, ctx);
                self.expr(iterable, ctx);
                self.stmt(body, ctx);
            }
            StmtKind::Return(argument) => {
                if !ctx.in_function {
                    self.report("`return` outside a function", stmt.span);
                }
                if let Some(argument) = argument {
                    self.expr(argument, ctx);
                }
            }
            StmtKind::Break | StmtKind::Continue | StmtKind::Empty => {}
            StmtKind::Throw(argument) => self.expr(argument, ctx),
            StmtKind::Try {
                block,
                handler,
                finalizer,
            } => {
                for stmt in block {
                    self.stmt(stmt, ctx);
                }
                if let Some(handler) = handler {
                    if let Some(param) = &handler.param {
                        self.pattern(param, ctx);
                    }
                    for stmt in &handler.body {
                        self.stmt(stmt, ctx);
                    }
                }
                if let Some(finalizer) = finalizer {
                    for stmt in finalizer {
                        self.stmt(stmt, ctx);
                    }
                }
            }
            StmtKind::Switch {
                discriminant,
                cases,
            } => {
                self.expr(discriminant, ctx);
                for case in cases {
                    if let Some(test) = &case.test {
                        self.expr(test, ctx);
                    }
                    for stmt in &case.body {
                        self.stmt(stmt, ctx);
                    }
                }
            }
            StmtKind::Expression(expression) => self.expr(expression, ctx),
        }
    }

    fn expr(&mut self, expression: &Expr, ctx: Ctx) {
        match &expression.kind {
            ExprKind::Yield { argument, .. } => {
                if !ctx.in_generator {
                    self.report("`yield` outside a generator function", expression.span);
                }
                if let Some(argument) = argument {
                    self.expr(argument, ctx);
                }
            }
            ExprKind::Await(argument) => {
                if !ctx.in_async {
                    if !ctx.in_function && self.dialect == Dialect::Module {
                        self.warn(
                            "top-level `await` runs synchronously without a scheduler",
                            expression.span,
                        );
                    } else {
                        self.report("`await` outside an async function", expression.span);
                    }
                }
                self.expr(argument, ctx);
            }
            ExprKind::Super => {
                if !ctx.in_subclass_member {
                    self.report(
                        "`super` is only valid inside a method of a class with `extends`",
                        expression.span,
                    );
                }
            }
            ExprKind::Function(function) => self.function(function, ctx),
            ExprKind::Arrow(function) => self.arrow(function, ctx),
            ExprKind::Class(class) => self.class(class, ctx),
            ExprKind::Template { expressions, .. } => {
                for expression in expressions {
                    self.expr(expression, ctx);
                }
            }
            ExprKind::Binary { left, right, .. } | ExprKind::Logical { left, right, .. } => {
                self.expr(left, ctx);
                self.expr(right, ctx);
            }
            ExprKind::Unary { argument, .. } | ExprKind::Update { argument, .. } => {
                self.expr(argument, ctx);
            }
            ExprKind::Assign { target, value, .. } => {
                match target {
                    ls_ir::ast::AssignTarget::Expr(target) => self.expr(target, ctx),
                    ls_ir::ast::AssignTarget::Pattern(pattern) => self.pattern(pattern, ctx),
                }
                self.expr(value, ctx);
            }
            ExprKind::Conditional {
                test,
                consequent,
                alternate,
            } => {
                self.expr(test, ctx);
                self.expr(consequent, ctx);
                self.expr(alternate, ctx);
            }
            ExprKind::Call {
                callee, arguments, ..
            }
            | ExprKind::New { callee, arguments } => {
                self.expr(callee, ctx);
                for argument in arguments {
                    self.expr(argument, ctx);
                }
            }
            ExprKind::Member {
                object, property, ..
            } => {
                self.expr(object, ctx);
                if let ls_ir::ast::MemberKey::Computed(property) = property {
                    self.expr(property, ctx);
                }
            }
            ExprKind::Array(elements) => {
                for element in elements.iter().flatten() {
                    self.expr(element, ctx);
                }
            }
            ExprKind::Object(members) => {
                for member in members {
                    match member {
                        ls_ir::ast::ObjectMember::Property { key, value, .. } => {
                            if let ls_ir::ast::PropertyKey::Computed(key) = key {
                                self.expr(key, ctx);
                            }
                            self.expr(value, ctx);
                        }
                        ls_ir::ast::ObjectMember::Spread { argument, .. } => {
                            self.expr(argument, ctx);
                        }
                    }
                }
            }
            ExprKind::Spread(argument) => self.expr(argument, ctx),
            ExprKind::Sequence(expressions) => {
                for expression in expressions {
                    self.expr(expression, ctx);
                }
            }
            ExprKind::Number { .. }
            | ExprKind::Str(_)
            | ExprKind::Bool(_)
            | ExprKind::Null
            | ExprKind::Ident(_)
            | ExprKind::This => {}
        }
    }

    fn pattern(&mut self, pattern: &Pattern, ctx: Ctx) {
        match &pattern.kind {
            PatternKind::Ident(_) => {}
            PatternKind::Array { elements } => {
                for element in elements.iter().flatten() {
                    self.pattern(element, ctx);
                }
            }
            PatternKind::Object { properties, rest } => {
                for property in properties {
                    if let ls_ir::ast::PropertyKey::Computed(key) = &property.key {
                        self.expr(key, ctx);
                    }
                    self.pattern(&property.value, ctx);
                }
                if let Some(rest) = rest {
                    self.pattern(rest, ctx);
                }
            }
            PatternKind::Rest(inner) => self.pattern(inner, ctx),
            PatternKind::Default { target, value } => {
                self.pattern(target, ctx);
                self.expr(value, ctx);
            }
        }
    }

    fn function(&mut self, function: &Function, outer: Ctx) {
        let ctx = Ctx {
            in_generator: function.is_generator,
            in_async: function.is_async,
            in_function: true,
            // `super` does not survive ordinary function boundaries.
            in_subclass_member: false,
        };
        for param in &function.params {
            self.pattern(param, outer);
        }
        match &function.body {
            FunctionBody::Block(body) => {
                for stmt in body {
                    self.stmt(stmt, ctx);
                }
            }
            FunctionBody::Expression(expression) => self.expr(expression, ctx),
        }
    }

    /// Arrows keep the enclosing async/super context but never a generator's.
    fn arrow(&mut self, function: &Function, outer: Ctx) {
        let ctx = Ctx {
            in_generator: false,
            in_async: function.is_async || outer.in_async,
            in_function: true,
            in_subclass_member: outer.in_subclass_member,
        };
        for param in &function.params {
            self.pattern(param, outer);
        }
        match &function.body {
            FunctionBody::Block(body) => {
                for stmt in body {
                    self.stmt(stmt, ctx);
                }
            }
            FunctionBody::Expression(expression) => self.expr(expression, ctx),
        }
    }

    fn class(&mut self, class: &Class, outer: Ctx) {
        if let Some(superclass) = &class.superclass {
            self.expr(superclass, outer);
        }
        let mut constructors = 0usize;
        for member in &class.members {
            if member.is_constructor {
                constructors += 1;
                if constructors > 1 {
                    self.report("duplicate constructor in class body", member.span);
                }
            }
            let ctx = Ctx {
                in_generator: member.function.is_generator,
                in_async: member.function.is_async,
                in_function: true,
                in_subclass_member: class.superclass.is_some(),
            };
            if let ls_ir::ast::PropertyKey::Computed(key) = &member.key {
                self.expr(key, outer);
            }
            for param in &member.function.params {
                self.pattern(param, outer);
            }
            match &member.function.body {
                FunctionBody::Block(body) => {
                    for stmt in body {
                        self.stmt(stmt, ctx);
                    }
                }
                FunctionBody::Expression(expression) => self.expr(expression, ctx),
            }
        }
    }
}
