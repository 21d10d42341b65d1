//! Lowerer state, program entry, and statement dispatch.
//!
//! Statement lowering pushes into a growing list because one source
//! statement may expand to several IR statements (destructuring, hoisted
//! temporaries for optional chains). Expression lowering receives the same
//! list as a sink for the temporaries it introduces.

mod classes;
mod expr;
mod functions;
mod optional;
mod patterns;

use crate::{LowerOptions, LowerResult};
use ls_diagnostic::{Diagnostic, Diagnostics, ErrorCode};
use ls_ir::ast::{self, DeclKind, ForInit, StmtKind};
use ls_ir::{BinOp, Builder, LineMap, LogOp, Loc, NodeId, Span, UnOp};
use tracing::debug;

/// Receivers whose member calls stay plain (no implicit `self`): the
/// runtime namespaces of the preamble and the Lua standard library.
pub(crate) const PLAIN_NAMESPACES: &[&str] = &[
    "console", "coroutine", "table", "math", "string", "os", "io",
];

/// Per-function lowering state.
pub(crate) struct Frame {
    pub(crate) kind: FrameKind,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub(crate) enum FrameKind {
    Script,
    Normal,
    Generator,
    Async,
}

/// How `break`/`continue` lower inside the innermost loop or switch.
pub(crate) struct LoopLowering {
    pub(crate) is_switch: bool,
    /// The loop body was wrapped in `repeat … until true`, so `continue`
    /// becomes `break`.
    pub(crate) continue_via_break: bool,
    /// Real breaks must set this flag before breaking the wrapper.
    pub(crate) break_flag: Option<String>,
}

/// Enclosing class context for `this`/`super` lowering.
pub(crate) struct ClassCtx {
    /// Name holding the superclass table, when the class extends one.
    pub(crate) super_ref: Option<String>,
}

pub(crate) struct Lowerer<'a> {
    pub(crate) builder: Builder,
    pub(crate) diagnostics: Diagnostics,
    pub(crate) frames: Vec<Frame>,
    pub(crate) loops: Vec<LoopLowering>,
    pub(crate) classes: Vec<ClassCtx>,
    pub(crate) depth: usize,
    pub(crate) line_map: &'a LineMap,
    pub(crate) options: &'a LowerOptions,
    pub(crate) aborted: bool,
    depth_reported: bool,
}

impl<'a> Lowerer<'a> {
    pub(crate) fn run(
        program: &ast::Program,
        line_map: &'a LineMap,
        options: &'a LowerOptions,
    ) -> LowerResult {
        let mut lowerer = Lowerer {
            builder: Builder::new(),
            diagnostics: Diagnostics::new(),
            frames: vec![Frame {
                kind: FrameKind::Script,
            }],
            loops: Vec::new(),
            classes: Vec::new(),
            depth: 0,
            line_map,
            options,
            aborted: false,
            depth_reported: false,
        };

        let mut body = Vec::new();
        for stmt in &program.body {
            if lowerer.aborted {
                break;
            }
            lowerer.lower_stmt(stmt, &mut body);
            lowerer.check_node_budget();
        }
        let loc = lowerer.loc(program.span);
        let root = lowerer.builder.program(body, loc);
        debug!(
            nodes = lowerer.builder.node_count(),
            diagnostics = lowerer.diagnostics.len(),
            "lowering finished"
        );
        LowerResult {
            unit: lowerer.builder.finish(root),
            diagnostics: lowerer.diagnostics.into_vec(),
        }
    }

    // Shared helpers

    pub(crate) fn loc(&self, span: Span) -> Option<Loc> {
        Some(self.line_map.loc(span.start))
    }

    /// Kind of the innermost function frame (the script frame when at
    /// top level).
    pub(crate) fn frame_kind(&self) -> FrameKind {
        self.frames.last().map_or(FrameKind::Script, |f| f.kind)
    }

    pub(crate) fn report_unsupported(&mut self, construct: &str, span: Span) -> NodeId {
        let loc = self.loc(span);
        self.diagnostics.push(
            Diagnostic::error(
                ErrorCode::UnsupportedConstruct,
                format!("unsupported construct: {construct}"),
            )
            .with_loc(self.line_map.loc(span.start)),
        );
        self.builder.unsupported(construct, loc)
    }

    pub(crate) fn report_semantic(&mut self, message: impl Into<String>, span: Span) {
        self.diagnostics.push(
            Diagnostic::error(ErrorCode::AstValidation, message)
                .with_loc(self.line_map.loc(span.start)),
        );
    }

    fn check_node_budget(&mut self) {
        if !self.aborted && self.builder.node_count() > self.options.max_nodes {
            self.aborted = true;
            self.diagnostics.push(Diagnostic::error(
                ErrorCode::MemoryLimit,
                format!(
                    "IR node budget exceeded: {} nodes (limit {})",
                    self.builder.node_count(),
                    self.options.max_nodes
                ),
            ));
        }
    }

    /// Depth guard shared by statement and expression lowering. Returns
    /// `false` (and reports once) when the recursion bound is hit.
    pub(crate) fn enter(&mut self) -> bool {
        if self.depth >= self.options.max_depth {
            if !self.depth_reported {
                self.depth_reported = true;
                self.diagnostics.push(Diagnostic::error(
                    ErrorCode::MemoryLimit,
                    format!(
                        "lowering recursion depth exceeded (limit {})",
                        self.options.max_depth
                    ),
                ));
            }
            return false;
        }
        self.depth += 1;
        true
    }

    pub(crate) fn leave(&mut self) {
        self.depth -= 1;
    }

    // Statements

    pub(crate) fn lower_stmts(&mut self, stmts: &[ast::Stmt]) -> Vec<NodeId> {
        let mut out = Vec::new();
        for stmt in stmts {
            if self.aborted {
                break;
            }
            self.lower_stmt(stmt, &mut out);
            self.check_node_budget();
        }
        out
    }

    /// Lower a sub-statement into a single node (wrapping multiple
    /// expansion products in a Block).
    pub(crate) fn lower_stmt_as_block(&mut self, stmt: &ast::Stmt) -> NodeId {
        let mut out = Vec::new();
        self.lower_stmt(stmt, &mut out);
        if out.len() == 1 {
            out[0]
        } else {
            let loc = self.loc(stmt.span);
            self.builder.block(out, loc)
        }
    }

    pub(crate) fn lower_stmt(&mut self, stmt: &ast::Stmt, out: &mut Vec<NodeId>) {
        if !self.enter() {
            return;
        }
        self.lower_stmt_inner(stmt, out);
        self.leave();
    }

    fn lower_stmt_inner(&mut self, stmt: &ast::Stmt, out: &mut Vec<NodeId>) {
        let span = stmt.span;
        match &stmt.kind {
            StmtKind::VarDecl { kind, declarators } => {
                for declarator in declarators {
                    self.lower_declarator(*kind, declarator, out);
                }
            }
            StmtKind::FunctionDecl(function) => self.lower_function_decl(function, span, out),
            StmtKind::ClassDecl(class) => {
                self.lower_class_decl(class, span, out);
            }
            StmtKind::Block(body) => {
                let stmts = self.lower_stmts(body);
                let id = self.builder.block(stmts, self.loc(span));
                out.push(id);
            }
            StmtKind::If {
                test,
                consequent,
                alternate,
            } => {
                let test_id = self.lower_expr(test, out);
                let cons_id = self.lower_stmt_as_block(consequent);
                let alt_id = match alternate {
                    Some(alternate) => self.lower_stmt_as_block(alternate),
                    None => NodeId::INVALID,
                };
                let id = self.builder.if_stmt(test_id, cons_id, alt_id, self.loc(span));
                out.push(id);
            }
            StmtKind::While { test, body } => self.lower_while(test, body, span, out),
            StmtKind::DoWhile { body, test } => self.lower_do_while(body, test, span, out),
            StmtKind::For {
                init,
                test,
                update,
                body,
            } => self.lower_for(init.as_ref(), test.as_deref(), update.as_deref(), body, span, out),
            StmtKind::ForOf {
                decl_kind,
                binding,
                iterable,
                body,
            } => self.lower_for_of(*decl_kind, binding, iterable, body, span, out),
            StmtKind::Return(argument) => {
                let arg_id = match argument {
                    Some(argument) => self.lower_expr(argument, out),
                    None => NodeId::INVALID,
                };
                let id = self.builder.return_stmt(arg_id, self.loc(span));
                out.push(id);
            }
            StmtKind::Break => self.lower_break(span, out),
            StmtKind::Continue => self.lower_continue(span, out),
            StmtKind::Throw(argument) => {
                let arg_id = self.lower_expr(argument, out);
                let id = self.builder.throw_stmt(arg_id, self.loc(span));
                out.push(id);
            }
            StmtKind::Try {
                block,
                handler,
                finalizer,
            } => self.lower_try(block, handler.as_ref(), finalizer.as_deref(), span, out),
            StmtKind::Switch {
                discriminant,
                cases,
            } => self.lower_switch(discriminant, cases, span, out),
            StmtKind::Expression(expression) => self.lower_expr_stmt(expression, out),
            StmtKind::Empty => {
                let id = self.builder.empty_stmt(self.loc(span));
                out.push(id);
            }
        }
    }

    // Loops

    fn lower_while(
        &mut self,
        test: &ast::Expr,
        body: &ast::Stmt,
        span: Span,
        out: &mut Vec<NodeId>,
    ) {
        let mut test_prelude = Vec::new();
        let test_id = self.lower_expr(test, &mut test_prelude);
        if test_prelude.is_empty() {
            let body_id = self.lower_loop_body(body);
            let id = self.builder.while_stmt(test_id, body_id, self.loc(span));
            out.push(id);
        } else {
            // The condition needs temporaries, so it must re-evaluate inside
            // the loop: while true do <prelude> if not t then break end … end
            let not_test = self.builder.unary(UnOp::Not, test_id, None);
            let brk = self.builder.break_stmt(None);
            let brk_block = self.builder.block(vec![brk], None);
            let guard = self.builder.if_stmt(not_test, brk_block, NodeId::INVALID, None);
            let body_id = self.lower_loop_body(body);
            let mut stmts = test_prelude;
            stmts.push(guard);
            stmts.push(body_id);
            let block = self.builder.block(stmts, self.loc(span));
            let true_lit = self.builder.literal_bool(true, None);
            let id = self.builder.while_stmt(true_lit, block, self.loc(span));
            out.push(id);
        }
    }

    fn lower_do_while(
        &mut self,
        body: &ast::Stmt,
        test: &ast::Expr,
        span: Span,
        out: &mut Vec<NodeId>,
    ) {
        let body_id = self.lower_loop_body(body);
        // Condition temporaries evaluate at the end of each iteration,
        // right before the test reads them.
        let mut test_prelude = Vec::new();
        let test_id = self.lower_expr(test, &mut test_prelude);
        let body_id = if test_prelude.is_empty() {
            body_id
        } else {
            let mut stmts = vec![body_id];
            stmts.append(&mut test_prelude);
            self.builder.block(stmts, None)
        };
        let id = self.builder.do_while_stmt(body_id, test_id, self.loc(span));
        out.push(id);
    }

    fn lower_for(
        &mut self,
        init: Option<&ForInit>,
        test: Option<&ast::Expr>,
        update: Option<&ast::Expr>,
        body: &ast::Stmt,
        span: Span,
        out: &mut Vec<NodeId>,
    ) {
        // do <init> while <test> do <body> <update> end end
        let mut stmts = Vec::new();
        match init {
            Some(ForInit::VarDecl { kind, declarators }) => {
                for declarator in declarators {
                    self.lower_declarator(*kind, declarator, &mut stmts);
                }
            }
            Some(ForInit::Expr(expression)) => self.lower_expr_stmt(expression, &mut stmts),
            None => {}
        }

        let mut test_prelude = Vec::new();
        let test_id = match test {
            Some(test) => self.lower_expr(test, &mut test_prelude),
            None => self.builder.literal_bool(true, None),
        };

        let body_id = self.lower_loop_body(body);
        let mut loop_body = Vec::new();
        let loop_test = if test_prelude.is_empty() {
            test_id
        } else {
            loop_body.append(&mut test_prelude);
            let not_test = self.builder.unary(UnOp::Not, test_id, None);
            let brk = self.builder.break_stmt(None);
            let brk_block = self.builder.block(vec![brk], None);
            let guard = self.builder.if_stmt(not_test, brk_block, NodeId::INVALID, None);
            loop_body.push(guard);
            self.builder.literal_bool(true, None)
        };
        loop_body.push(body_id);
        if let Some(update) = update {
            self.lower_expr_stmt(update, &mut loop_body);
        }
        let loop_block = self.builder.block(loop_body, None);
        let while_id = self.builder.while_stmt(loop_test, loop_block, self.loc(span));
        stmts.push(while_id);
        let id = self.builder.block(stmts, self.loc(span));
        out.push(id);
    }

    fn lower_for_of(
        &mut self,
        decl_kind: Option<DeclKind>,
        binding: &ast::Pattern,
        iterable: &ast::Expr,
        body: &ast::Stmt,
        span: Span,
        out: &mut Vec<NodeId>,
    ) {
        // do
        //   local _iter = __ls.iter(<iterable>)
        //   while true do
        //     local x = _iter()
        //     if x == nil then break end
        //     <body>
        //   end
        // end
        let mut stmts = Vec::new();
        let iterable_id = self.lower_expr(iterable, &mut stmts);
        let iter_call = self.helper_call("iter", vec![iterable_id], None);
        let iter_name = self.builder.fresh_iter();
        let iter_ident = self.builder.identifier(&iter_name, None);
        let iter_decl =
            self.builder
                .var_decl(DeclKind::Let, iter_ident, iter_call, self.loc(span));
        stmts.push(iter_decl);

        let mut loop_body = Vec::new();

        // Bind the step value: straight into the name for identifier
        // patterns declared here, through a destructuring temp otherwise.
        // `var` bindings were hoisted (or are globals), so they assign.
        let declares = matches!(decl_kind, Some(DeclKind::Let | DeclKind::Const));
        let step_name = match &binding.kind {
            ast::PatternKind::Ident(name) if declares => name.clone(),
            _ => self.builder.fresh_destructure(),
        };
        let iter_ref = self.builder.identifier(&iter_name, None);
        let step_call = self.builder.call(iter_ref, Vec::new(), false, None);
        let step_ident = self.builder.identifier(&step_name, None);
        let step_decl = self.builder.var_decl(
            DeclKind::Let,
            step_ident,
            step_call,
            self.loc(binding.span),
        );
        loop_body.push(step_decl);

        let step_read = self.builder.identifier(&step_name, None);
        let nil_lit = self.builder.literal_null(None);
        let test = self.builder.binary(BinOp::Eq, step_read, nil_lit, None);
        let brk = self.builder.break_stmt(None);
        let brk_block = self.builder.block(vec![brk], None);
        let guard = self.builder.if_stmt(test, brk_block, NodeId::INVALID, None);
        loop_body.push(guard);

        match &binding.kind {
            ast::PatternKind::Ident(_) if declares => {}
            ast::PatternKind::Ident(name) => {
                // Assign into the pre-existing (or hoisted/global) binding.
                let target = self.builder.identifier(name, None);
                let value = self.builder.identifier(&step_name, None);
                let assign = self.builder.assignment(target, value, None);
                let assign_stmt = self.builder.expression_stmt(assign, None);
                loop_body.push(assign_stmt);
            }
            _ => {
                let kind = declares.then(|| decl_kind.unwrap_or(DeclKind::Let));
                self.expand_pattern(binding, &step_name, kind, &mut loop_body);
            }
        }

        let body_id = self.lower_loop_body(body);
        loop_body.push(body_id);

        let true_lit = self.builder.literal_bool(true, None);
        let loop_block = self.builder.block(loop_body, None);
        let while_id = self.builder.while_stmt(true_lit, loop_block, self.loc(span));
        stmts.push(while_id);
        let id = self.builder.block(stmts, self.loc(span));
        out.push(id);
    }

    /// Lower a loop body, wrapping it in `repeat … until true` when it
    /// contains a `continue` bound to this loop.
    fn lower_loop_body(&mut self, body: &ast::Stmt) -> NodeId {
        let has_continue = stmt_contains_continue(body);
        let has_break = has_continue && stmt_contains_break(body);
        let break_flag = has_break.then(|| self.builder.fresh_temp());

        self.loops.push(LoopLowering {
            is_switch: false,
            continue_via_break: has_continue,
            break_flag: break_flag.clone(),
        });
        let inner = self.lower_stmt_as_block(body);
        self.loops.pop();

        if !has_continue {
            return inner;
        }

        // [local _t = false] repeat <inner> until true [if _t then break]
        let mut stmts = Vec::new();
        if let Some(flag) = &break_flag {
            let flag_ident = self.builder.identifier(flag, None);
            let false_lit = self.builder.literal_bool(false, None);
            let decl = self
                .builder
                .var_decl(DeclKind::Let, flag_ident, false_lit, None);
            stmts.push(decl);
        }
        let false_lit = self.builder.literal_bool(false, None);
        let wrapper = self.builder.do_while_stmt(inner, false_lit, None);
        stmts.push(wrapper);
        if let Some(flag) = &break_flag {
            let flag_read = self.builder.identifier(flag, None);
            let brk = self.builder.break_stmt(None);
            let brk_block = self.builder.block(vec![brk], None);
            let guard = self
                .builder
                .if_stmt(flag_read, brk_block, NodeId::INVALID, None);
            stmts.push(guard);
        }
        self.builder.block(stmts, None)
    }

    fn lower_break(&mut self, span: Span, out: &mut Vec<NodeId>) {
        let Some(target) = self.loops.last() else {
            self.report_semantic("`break` outside a loop or switch", span);
            let id = self.builder.empty_stmt(self.loc(span));
            out.push(id);
            return;
        };
        if let Some(flag) = target.break_flag.clone() {
            let flag_ident = self.builder.identifier(&flag, None);
            let true_lit = self.builder.literal_bool(true, None);
            let assign = self.builder.assignment(flag_ident, true_lit, None);
            let assign_stmt = self.builder.expression_stmt(assign, None);
            out.push(assign_stmt);
        }
        let id = self.builder.break_stmt(self.loc(span));
        out.push(id);
    }

    fn lower_continue(&mut self, span: Span, out: &mut Vec<NodeId>) {
        match self.loops.last() {
            None => {
                self.report_semantic("`continue` outside a loop", span);
                let id = self.builder.empty_stmt(self.loc(span));
                out.push(id);
            }
            Some(target) if target.is_switch => {
                let id = self.report_unsupported("continue across a switch", span);
                let stmt = self.builder.expression_stmt(id, self.loc(span));
                out.push(stmt);
            }
            Some(target) if target.continue_via_break => {
                let id = self.builder.break_stmt(self.loc(span));
                out.push(id);
            }
            Some(_) => {
                // The pre-scan wraps every loop whose body contains a
                // continue, so this arm means the scan missed one.
                let id = self.report_unsupported("continue", span);
                let stmt = self.builder.expression_stmt(id, self.loc(span));
                out.push(stmt);
            }
        }
    }

    // Switch

    fn lower_switch(
        &mut self,
        discriminant: &ast::Expr,
        cases: &[ast::SwitchCase],
        span: Span,
        out: &mut Vec<NodeId>,
    ) {
        // Group consecutive empty-bodied cases with the next body, then
        // lower to an if/elseif chain inside `repeat … until true` so that
        // `break` works.
        let mut groups: Vec<(Vec<&ast::Expr>, &ast::SwitchCase, bool)> = Vec::new();
        let mut pending: Vec<&ast::Expr> = Vec::new();
        for case in cases {
            match (&case.test, case.body.is_empty()) {
                (Some(test), true) => pending.push(test),
                (Some(test), false) => {
                    let mut tests = std::mem::take(&mut pending);
                    tests.push(test);
                    groups.push((tests, case, false));
                }
                (None, _) => {
                    let tests = std::mem::take(&mut pending);
                    groups.push((tests, case, true));
                }
            }
        }
        if !pending.is_empty() {
            // Trailing tests with no body: they match and do nothing.
            if let Some(last) = cases.last() {
                groups.push((std::mem::take(&mut pending), last, false));
            }
        }

        // No-fallthrough restriction: every non-final body must end in an
        // unconditional jump.
        for (index, (_, case, _)) in groups.iter().enumerate() {
            if index + 1 < groups.len() && !case.body.is_empty() && !ends_with_jump(&case.body) {
                self.report_unsupported("switch fallthrough", case.span);
            }
        }

        let disc_id = self.lower_expr(discriminant, out);
        let switch_name = self.builder.fresh_temp();
        let switch_ident = self.builder.identifier(&switch_name, None);
        let decl = self
            .builder
            .var_decl(DeclKind::Let, switch_ident, disc_id, self.loc(span));
        out.push(decl);

        self.loops.push(LoopLowering {
            is_switch: true,
            continue_via_break: false,
            break_flag: None,
        });

        // Lower group tests and bodies in source order.
        struct LoweredGroup {
            test: NodeId,
            body: NodeId,
            is_default: bool,
        }
        let mut lowered: Vec<LoweredGroup> = Vec::new();
        for (tests, case, is_default) in &groups {
            let mut test_id = NodeId::INVALID;
            for test in tests {
                let mut prelude = Vec::new();
                let value = self.lower_expr(test, &mut prelude);
                if !prelude.is_empty() {
                    // Case tests with temporaries would evaluate eagerly.
                    self.report_unsupported("effectful switch case test", case.span);
                }
                let read = self.builder.identifier(&switch_name, None);
                let eq = self.builder.binary(BinOp::Eq, read, value, None);
                test_id = if test_id.is_valid() {
                    self.builder.logical(LogOp::Or, test_id, eq, None)
                } else {
                    eq
                };
            }
            let body_stmts = self.lower_stmts(&case.body);
            let body = self.builder.block(body_stmts, self.loc(case.span));
            lowered.push(LoweredGroup {
                test: test_id,
                body,
                is_default: *is_default,
            });
        }
        self.loops.pop();

        // Assemble the chain: cases in order, default as the final else.
        let default_body = lowered
            .iter()
            .find(|g| g.is_default)
            .map(|g| g.body)
            .unwrap_or(NodeId::INVALID);
        let mut chain = default_body;
        for group in lowered.iter().rev() {
            if group.is_default || !group.test.is_valid() {
                continue;
            }
            chain = self
                .builder
                .if_stmt(group.test, group.body, chain, self.loc(span));
        }

        let chain_block = if chain.is_valid() {
            self.builder.block(vec![chain], None)
        } else {
            self.builder.block(Vec::new(), None)
        };
        let false_lit = self.builder.literal_bool(false, None);
        let wrapper = self
            .builder
            .do_while_stmt(chain_block, false_lit, self.loc(span));
        out.push(wrapper);
    }

    // Try

    fn lower_try(
        &mut self,
        block: &[ast::Stmt],
        handler: Option<&ast::CatchClause>,
        finalizer: Option<&[ast::Stmt]>,
        span: Span,
        out: &mut Vec<NodeId>,
    ) {
        // local _ok, _res = pcall(function() <block> end)
        // if not _ok then <catch, e bound to _res> end
        // <finally>
        // if _ok and _res ~= nil then return _res end   -- when block returns
        // if not _ok then error(_res) end                -- when no catch
        let body_stmts = self.lower_stmts(block);
        let body_block = self.builder.block(body_stmts, None);
        let closure =
            self.builder
                .function_expr("", Vec::new(), body_block, false, false, None);
        let pcall_ident = self.builder.identifier("pcall", None);
        let pcall = self.builder.call(pcall_ident, vec![closure], false, None);

        let ok_name = self.builder.fresh_temp();
        let res_name = self.builder.fresh_temp();
        let ok_ident = self.builder.identifier(&ok_name, None);
        let res_ident = self.builder.identifier(&res_name, None);
        let binder = self.builder.array_pattern(vec![ok_ident, res_ident], None);
        let decl = self
            .builder
            .var_decl(DeclKind::Let, binder, pcall, self.loc(span));
        out.push(decl);

        if let Some(handler) = handler {
            let mut catch_stmts = Vec::new();
            if let Some(param) = &handler.param {
                match &param.kind {
                    ast::PatternKind::Ident(name) => {
                        let ident = self.builder.identifier(name, None);
                        let res_read = self.builder.identifier(&res_name, None);
                        let catch_decl =
                            self.builder
                                .var_decl(DeclKind::Let, ident, res_read, self.loc(param.span));
                        catch_stmts.push(catch_decl);
                    }
                    _ => {
                        self.expand_pattern(param, &res_name, Some(DeclKind::Let), &mut catch_stmts);
                    }
                }
            }
            catch_stmts.extend(self.lower_stmts(&handler.body));
            let catch_block = self.builder.block(catch_stmts, self.loc(handler.span));
            let ok_read = self.builder.identifier(&ok_name, None);
            let not_ok = self.builder.unary(UnOp::Not, ok_read, None);
            let guard = self
                .builder
                .if_stmt(not_ok, catch_block, NodeId::INVALID, None);
            out.push(guard);
        }

        if let Some(finalizer) = finalizer {
            let mut finally_stmts = self.lower_stmts(finalizer);
            out.append(&mut finally_stmts);
        }

        // Propagate a captured return value out of the wrapping closure.
        let in_function = self.frame_kind() != FrameKind::Script;
        if in_function && block.iter().any(stmt_contains_return) {
            let ok_read = self.builder.identifier(&ok_name, None);
            let res_read = self.builder.identifier(&res_name, None);
            let nil_lit = self.builder.literal_null(None);
            let has_value = self.builder.binary(BinOp::NotEq, res_read, nil_lit, None);
            let test = self
                .builder
                .logical(LogOp::And, ok_read, has_value, None);
            let res_again = self.builder.identifier(&res_name, None);
            let ret = self.builder.return_stmt(res_again, None);
            let ret_block = self.builder.block(vec![ret], None);
            let guard = self.builder.if_stmt(test, ret_block, NodeId::INVALID, None);
            out.push(guard);
        }

        if handler.is_none() {
            // try/finally without catch re-raises after the finalizer.
            let ok_read = self.builder.identifier(&ok_name, None);
            let not_ok = self.builder.unary(UnOp::Not, ok_read, None);
            let res_read = self.builder.identifier(&res_name, None);
            let rethrow = self.builder.throw_stmt(res_read, None);
            let rethrow_block = self.builder.block(vec![rethrow], None);
            let guard = self
                .builder
                .if_stmt(not_ok, rethrow_block, NodeId::INVALID, None);
            out.push(guard);
        }
    }

    // Runtime helper calls

    /// `__ls.<name>(args)`.
    pub(crate) fn helper_call(
        &mut self,
        name: &str,
        args: Vec<NodeId>,
        loc: Option<Loc>,
    ) -> NodeId {
        let table = self.builder.identifier("__ls", None);
        let member = self.builder.member_named(table, name, None);
        self.builder.call(member, args, false, loc)
    }

    /// `coroutine.<name>(args)`.
    pub(crate) fn coroutine_call(
        &mut self,
        name: &str,
        args: Vec<NodeId>,
        loc: Option<Loc>,
    ) -> NodeId {
        let table = self.builder.identifier("coroutine", None);
        let member = self.builder.member_named(table, name, None);
        self.builder.call(member, args, false, loc)
    }
}

// AST scans (never cross function boundaries)

fn body_contains(stmts: &[ast::Stmt], pred: &mut dyn FnMut(&ast::Stmt) -> Scan) -> bool {
    stmts.iter().any(|stmt| scan_stmt(stmt, pred))
}

enum Scan {
    Found,
    Stop,
    Descend,
}

fn scan_stmt(stmt: &ast::Stmt, pred: &mut dyn FnMut(&ast::Stmt) -> Scan) -> bool {
    match pred(stmt) {
        Scan::Found => return true,
        Scan::Stop => return false,
        Scan::Descend => {}
    }
    match &stmt.kind {
        StmtKind::Block(body) => body_contains(body, pred),
        StmtKind::If {
            consequent,
            alternate,
            ..
        } => {
            scan_stmt(consequent, pred)
                || alternate.as_deref().is_some_and(|a| scan_stmt(a, pred))
        }
        StmtKind::Try {
            block,
            handler,
            finalizer,
        } => {
            body_contains(block, pred)
                || handler.as_ref().is_some_and(|h| body_contains(&h.body, pred))
                || finalizer.as_deref().is_some_and(|f| body_contains(f, pred))
        }
        StmtKind::Switch { cases, .. } => cases
            .iter()
            .any(|case| body_contains(&case.body, pred)),
        _ => false,
    }
}

/// Whether a loop body contains a `continue` bound to that loop.
fn stmt_contains_continue(body: &ast::Stmt) -> bool {
    scan_stmt(body, &mut |stmt| match &stmt.kind {
        StmtKind::Continue => Scan::Found,
        StmtKind::While { .. }
        | StmtKind::DoWhile { .. }
        | StmtKind::For { .. }
        | StmtKind::ForOf { .. }
        | StmtKind::FunctionDecl(_)
        | StmtKind::ClassDecl(_) => Scan::Stop,
        _ => Scan::Descend,
    })
}

/// Whether a loop body contains a `break` bound to that loop
/// (switches capture their own breaks).
fn stmt_contains_break(body: &ast::Stmt) -> bool {
    scan_stmt(body, &mut |stmt| match &stmt.kind {
        StmtKind::Break => Scan::Found,
        StmtKind::While { .. }
        | StmtKind::DoWhile { .. }
        | StmtKind::For { .. }
        | StmtKind::ForOf { .. }
        | StmtKind::Switch { .. }
        | StmtKind::FunctionDecl(_)
        | StmtKind::ClassDecl(_) => Scan::Stop,
        _ => Scan::Descend,
    })
}

/// Whether a try block contains a `return` that the pcall closure captures.
pub(crate) fn stmt_contains_return(stmt: &ast::Stmt) -> bool {
    scan_stmt(stmt, &mut |stmt| match &stmt.kind {
        StmtKind::Return(_) => Scan::Found,
        StmtKind::FunctionDecl(_) | StmtKind::ClassDecl(_) => Scan::Stop,
        _ => Scan::Descend,
    })
}

/// Whether a case body ends with an unconditional jump.
fn ends_with_jump(body: &[ast::Stmt]) -> bool {
    matches!(
        body.last().map(|s| &s.kind),
        Some(
            StmtKind::Break
                | StmtKind::Continue
                | StmtKind::Return(_)
                | StmtKind::Throw(_)
        )
    )
}
