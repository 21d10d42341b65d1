//! Function, arrow, generator, and async lowering.
//!
//! Parameters lower to simple names plus a body prelude: defaults become
//! nil-tests, pattern parameters destructure a fresh temporary, rest
//! parameters collect Lua varargs. `var` declarations hoist to the top of
//! their enclosing function as bare locals.
//!
//! Generators wrap their body in a `coroutine.wrap` factory; `async`
//! functions wrap theirs in a synchronous cooperative runner that resumes
//! the coroutine until completion, feeding awaited values back in.

use super::patterns::pattern_names;
use super::{Frame, FrameKind, Lowerer};
use ls_ir::ast::{self, DeclKind, ForInit, FunctionBody, PatternKind, StmtKind};
use ls_ir::{BinOp, NodeId, Span};
use rustc_hash::FxHashSet;

impl Lowerer<'_> {
    pub(crate) fn lower_function_decl(
        &mut self,
        function: &ast::Function,
        span: Span,
        out: &mut Vec<NodeId>,
    ) {
        let name = function.name.clone().unwrap_or_default();
        let (params, body) = self.lower_function_parts(function, false, false);
        let id = self.builder.function_decl(
            name,
            params,
            body,
            function.is_generator,
            function.is_async,
            self.loc(span),
        );
        out.push(id);
    }

    pub(crate) fn lower_function_expr(
        &mut self,
        function: &ast::Function,
        with_self: bool,
        span: Span,
    ) -> NodeId {
        let (params, body) = self.lower_function_parts(function, with_self, false);
        self.builder.function_expr(
            function.name.clone().unwrap_or_default(),
            params,
            body,
            function.is_generator,
            function.is_async,
            self.loc(span),
        )
    }

    /// Arrows keep the enclosing `async` context: an arrow inside an async
    /// function runs on the caller's coroutine, so its awaits yield there.
    pub(crate) fn lower_arrow(&mut self, function: &ast::Function, span: Span) -> NodeId {
        let inherit_async = self.frame_kind() == FrameKind::Async;
        let (params, body) = self.lower_function_parts(function, false, inherit_async);
        self.builder
            .arrow(params, body, function.is_async, self.loc(span))
    }

    /// Shared parameter/body lowering. Returns the lowered parameter list
    /// and the function body block.
    pub(crate) fn lower_function_parts(
        &mut self,
        function: &ast::Function,
        with_self: bool,
        inherit_async: bool,
    ) -> (Vec<NodeId>, NodeId) {
        let kind = if function.is_generator {
            FrameKind::Generator
        } else if function.is_async || inherit_async {
            FrameKind::Async
        } else {
            FrameKind::Normal
        };
        self.frames.push(Frame { kind });
        // Loops never cross function boundaries.
        let saved_loops = std::mem::take(&mut self.loops);

        let mut params = Vec::new();
        let mut prelude = Vec::new();
        if with_self {
            let binding = self.builder.identifier("self", None);
            let param = self.builder.param_decl(binding, NodeId::INVALID, None);
            params.push(param);
        }
        let mut param_names: Vec<String> = Vec::new();
        for pattern in &function.params {
            pattern_names(pattern, &mut param_names);
            self.lower_param(pattern, &mut params, &mut prelude);
        }

        // Hoist `var` declarations to the function top.
        let hoisted = hoisted_var_names(function, &param_names);
        let mut hoist_decls = Vec::new();
        for name in &hoisted {
            let binder = self.builder.identifier(name, None);
            let decl = self
                .builder
                .var_decl(DeclKind::Var, binder, NodeId::INVALID, None);
            hoist_decls.push(decl);
        }

        let body_stmts = match &function.body {
            FunctionBody::Block(body) => self.lower_stmts(body),
            FunctionBody::Expression(expression) => {
                let mut stmts = Vec::new();
                let value = self.lower_expr(expression, &mut stmts);
                let ret = self.builder.return_stmt(value, self.loc(expression.span));
                stmts.push(ret);
                stmts
            }
        };

        let body = if function.is_generator {
            self.wrap_generator(prelude, hoist_decls, body_stmts)
        } else if function.is_async {
            self.wrap_async(prelude, hoist_decls, body_stmts)
        } else {
            let mut stmts = prelude;
            stmts.append(&mut hoist_decls);
            stmts.extend(body_stmts);
            self.builder.block(stmts, None)
        };

        self.loops = saved_loops;
        self.frames.pop();
        (params, body)
    }

    fn lower_param(
        &mut self,
        pattern: &ast::Pattern,
        params: &mut Vec<NodeId>,
        prelude: &mut Vec<NodeId>,
    ) {
        match &pattern.kind {
            PatternKind::Ident(name) => {
                let binding = self.builder.identifier(name, self.loc(pattern.span));
                let param = self.builder.param_decl(binding, NodeId::INVALID, None);
                params.push(param);
            }
            PatternKind::Default { target, value } => {
                // p = d  →  p plus `if p == nil then p = d end` in the body.
                let name = match &target.kind {
                    PatternKind::Ident(name) => name.clone(),
                    _ => self.builder.fresh_destructure(),
                };
                let binding = self.builder.identifier(&name, self.loc(pattern.span));
                let param = self.builder.param_decl(binding, NodeId::INVALID, None);
                params.push(param);

                let read = self.builder.identifier(&name, None);
                let nil_lit = self.builder.literal_undefined(None);
                let test = self.builder.binary(BinOp::Eq, read, nil_lit, None);
                let mut branch = Vec::new();
                let default_id = self.lower_expr(value, &mut branch);
                let write = self.builder.identifier(&name, None);
                let assign = self.builder.assignment(write, default_id, None);
                let assign_stmt = self.builder.expression_stmt(assign, None);
                branch.push(assign_stmt);
                let branch_block = self.builder.block(branch, None);
                let guard = self
                    .builder
                    .if_stmt(test, branch_block, NodeId::INVALID, None);
                prelude.push(guard);

                if !matches!(target.kind, PatternKind::Ident(_)) {
                    self.expand_pattern(target, &name, Some(DeclKind::Let), prelude);
                }
            }
            PatternKind::Rest(inner) => {
                // …rest → Lua varargs collected into a table.
                let dots = self.builder.identifier("...", self.loc(pattern.span));
                let param = self.builder.param_decl(dots, NodeId::INVALID, None);
                params.push(param);

                let dots_read = self.builder.identifier("...", None);
                let packed = self.builder.array_literal(vec![dots_read], None);
                match &inner.kind {
                    PatternKind::Ident(name) => {
                        let binder = self.builder.identifier(name, None);
                        let decl = self
                            .builder
                            .var_decl(DeclKind::Let, binder, packed, None);
                        prelude.push(decl);
                    }
                    _ => {
                        let temp = self.builder.fresh_destructure();
                        let binder = self.builder.identifier(&temp, None);
                        let decl = self
                            .builder
                            .var_decl(DeclKind::Let, binder, packed, None);
                        prelude.push(decl);
                        self.expand_pattern(inner, &temp, Some(DeclKind::Let), prelude);
                    }
                }
            }
            PatternKind::Array { .. } | PatternKind::Object { .. } => {
                let temp = self.builder.fresh_destructure();
                let binding = self.builder.identifier(&temp, self.loc(pattern.span));
                let param = self.builder.param_decl(binding, NodeId::INVALID, None);
                params.push(param);
                self.expand_pattern(pattern, &temp, Some(DeclKind::Let), prelude);
            }
        }
    }

    /// `function* g(…)` → `function g(…) return coroutine.wrap(function() … end) end`
    fn wrap_generator(
        &mut self,
        mut prelude: Vec<NodeId>,
        hoist_decls: Vec<NodeId>,
        body_stmts: Vec<NodeId>,
    ) -> NodeId {
        // Parameter defaults run at call time; the body runs lazily inside
        // the coroutine.
        let mut inner_stmts = hoist_decls;
        inner_stmts.extend(body_stmts);
        let inner_block = self.builder.block(inner_stmts, None);
        let inner = self
            .builder
            .function_expr("", Vec::new(), inner_block, false, false, None);
        let wrap = self.coroutine_call("wrap", vec![inner], None);
        let ret = self.builder.return_stmt(wrap, None);
        prelude.push(ret);
        self.builder.block(prelude, None)
    }

    /// Async functions run their body on a coroutine driven synchronously
    /// to completion; each await yields the awaited value and gets it
    /// straight back. A scheduler can hook the same shape later.
    fn wrap_async(
        &mut self,
        mut prelude: Vec<NodeId>,
        hoist_decls: Vec<NodeId>,
        body_stmts: Vec<NodeId>,
    ) -> NodeId {
        let mut inner_stmts = hoist_decls;
        inner_stmts.extend(body_stmts);
        let inner_block = self.builder.block(inner_stmts, None);
        let inner = self
            .builder
            .function_expr("", Vec::new(), inner_block, false, false, None);

        // local _co = coroutine.create(function() … end)
        let create = self.coroutine_call("create", vec![inner], None);
        let co_name = self.builder.fresh_temp();
        let co_ident = self.builder.identifier(&co_name, None);
        let co_decl = self.builder.var_decl(DeclKind::Let, co_ident, create, None);
        prelude.push(co_decl);

        // local _ok, _res = coroutine.resume(_co)
        let ok_name = self.builder.fresh_temp();
        let res_name = self.builder.fresh_temp();
        let co_read = self.builder.identifier(&co_name, None);
        let first_resume = self.coroutine_call("resume", vec![co_read], None);
        let ok_ident = self.builder.identifier(&ok_name, None);
        let res_ident = self.builder.identifier(&res_name, None);
        let binder = self.builder.array_pattern(vec![ok_ident, res_ident], None);
        let resume_decl = self
            .builder
            .var_decl(DeclKind::Let, binder, first_resume, None);
        prelude.push(resume_decl);

        // while coroutine.status(_co) ~= "dead" do
        //   _ok, _res = coroutine.resume(_co, _res)
        // end
        let co_read = self.builder.identifier(&co_name, None);
        let status = self.coroutine_call("status", vec![co_read], None);
        let dead = self.builder.literal_string("dead", None);
        let running = self.builder.binary(BinOp::NotEq, status, dead, None);

        let co_read = self.builder.identifier(&co_name, None);
        let res_read = self.builder.identifier(&res_name, None);
        let resume = self.coroutine_call("resume", vec![co_read, res_read], None);
        let ok_write = self.builder.identifier(&ok_name, None);
        let res_write = self.builder.identifier(&res_name, None);
        let target = self.builder.array_pattern(vec![ok_write, res_write], None);
        let assign = self.builder.assignment(target, resume, None);
        let assign_stmt = self.builder.expression_stmt(assign, None);
        let loop_block = self.builder.block(vec![assign_stmt], None);
        let run_loop = self.builder.while_stmt(running, loop_block, None);
        prelude.push(run_loop);

        let res_final = self.builder.identifier(&res_name, None);
        let ret = self.builder.return_stmt(res_final, None);
        prelude.push(ret);
        self.builder.block(prelude, None)
    }
}

/// Names needing a hoisted `local` at the function top: every `var` bound
/// in the body (not crossing nested functions), minus parameter names.
fn hoisted_var_names(function: &ast::Function, param_names: &[String]) -> Vec<String> {
    let mut names = Vec::new();
    if let FunctionBody::Block(body) = &function.body {
        collect_vars(body, &mut names);
    }
    let mut seen: FxHashSet<&str> = param_names.iter().map(String::as_str).collect();
    let mut out = Vec::new();
    for name in &names {
        if seen.insert(name.as_str()) {
            out.push(name.clone());
        }
    }
    out
}

fn collect_vars(stmts: &[ast::Stmt], names: &mut Vec<String>) {
    for stmt in stmts {
        match &stmt.kind {
            StmtKind::VarDecl {
                kind: DeclKind::Var,
                declarators,
            } => {
                for declarator in declarators {
                    pattern_names(&declarator.pattern, names);
                }
            }
            StmtKind::Block(body) => collect_vars(body, names),
            StmtKind::If {
                consequent,
                alternate,
                ..
            } => {
                collect_vars(std::slice::from_ref(consequent), names);
                if let Some(alternate) = alternate {
                    collect_vars(std::slice::from_ref(alternate), names);
                }
            }
            StmtKind::While { body, .. } | StmtKind::DoWhile { body, .. } => {
                collect_vars(std::slice::from_ref(body), names);
            }
            StmtKind::For { init, body, .. } => {
                if let Some(ForInit::VarDecl {
                    kind: DeclKind::Var,
                    declarators,
                }) = init
                {
                    for declarator in declarators {
                        pattern_names(&declarator.pattern, names);
                    }
                }
                collect_vars(std::slice::from_ref(body), names);
            }
            StmtKind::ForOf {
                decl_kind,
                binding,
                body,
                ..
            } => {
                if *decl_kind == Some(DeclKind::Var) {
                    pattern_names(binding, names);
                }
                collect_vars(std::slice::from_ref(body), names);
            }
            StmtKind::Try {
                block,
                handler,
                finalizer,
            } => {
                collect_vars(block, names);
                if let Some(handler) = handler {
                    collect_vars(&handler.body, names);
                }
                if let Some(finalizer) = finalizer {
                    collect_vars(finalizer, names);
                }
            }
            StmtKind::Switch { cases, .. } => {
                for case in cases {
                    collect_vars(&case.body, names);
                }
            }
            _ => {}
        }
    }
}
