//! Optional chaining and nullish coalescing.
//!
//! A chain lowers into a ladder of guarded temporaries so every source
//! sub-expression evaluates at most once:
//!
//! ```text
//! obj?.inner?.value        local _t = obj
//!                          local _t2 = nil
//!                          if _t ~= nil then _t2 = _t.inner end
//!                          local _t3 = nil
//!                          if _t2 ~= nil then _t3 = _t2.value end
//! ```
//!
//! The short-circuit boundary is the outermost optional link: once a guard
//! fails, every later temporary stays nil. Non-optional links that follow
//! an optional one run inside the same guard (only `?.` short-circuits).

use super::Lowerer;
use ls_ir::ast::{self, ExprKind, MemberKey};
use ls_ir::{BinOp, NodeId, Span, UnOp};

/// One link of a member/call chain, outermost last.
enum Link<'a> {
    Member {
        property: &'a MemberKey,
        optional: bool,
        span: Span,
    },
    Call {
        arguments: &'a [ast::Expr],
        optional: bool,
        span: Span,
    },
}

impl Link<'_> {
    fn optional(&self) -> bool {
        match self {
            Link::Member { optional, .. } | Link::Call { optional, .. } => *optional,
        }
    }
}

/// Peel a chain down to its base, collecting links outermost-last.
fn collect_chain<'a>(expression: &'a ast::Expr, links: &mut Vec<Link<'a>>) -> &'a ast::Expr {
    match &expression.kind {
        ExprKind::Member {
            object,
            property,
            optional,
        } => {
            let base = collect_chain(object, links);
            links.push(Link::Member {
                property,
                optional: *optional,
                span: expression.span,
            });
            base
        }
        ExprKind::Call {
            callee,
            arguments,
            optional,
        } => {
            let base = collect_chain(callee, links);
            links.push(Link::Call {
                arguments,
                optional: *optional,
                span: expression.span,
            });
            base
        }
        _ => expression,
    }
}

impl Lowerer<'_> {
    pub(crate) fn lower_optional_chain(
        &mut self,
        expression: &ast::Expr,
        out: &mut Vec<NodeId>,
    ) -> NodeId {
        let mut links = Vec::new();
        let base = collect_chain(expression, &mut links);
        let mut current = self.lower_expr(base, out);

        let mut index = 0;
        // Links before the first optional apply unguarded.
        while index < links.len() && !links[index].optional() {
            current = self.apply_link(current, &links, &mut index, out);
        }

        // Each optional link starts a guarded run covering the
        // non-optional links that follow it.
        while index < links.len() {
            let guard_on = self.ensure_simple(current, out);

            let result = self.builder.fresh_temp();
            let result_ident = self.builder.identifier(&result, None);
            let nil_init = self.builder.literal_undefined(None);
            let decl = self
                .builder
                .var_decl(ls_ir::DeclKind::Let, result_ident, nil_init, None);
            out.push(decl);

            let mut branch = Vec::new();
            let mut value = guard_on;
            // Consume the optional link and every following plain link.
            let mut first = true;
            while index < links.len() && (first || !links[index].optional()) {
                first = false;
                value = self.apply_link(value, &links, &mut index, &mut branch);
            }
            let write = self.builder.identifier(&result, None);
            let assign = self.builder.assignment(write, value, None);
            let assign_stmt = self.builder.expression_stmt(assign, None);
            branch.push(assign_stmt);

            let read = self.builder.identifier(&result, None);
            let guard_read = guard_on;
            let nil_lit = self.builder.literal_null(None);
            let test = self
                .builder
                .binary(BinOp::NotEq, guard_read, nil_lit, None);
            let branch_block = self.builder.block(branch, None);
            let guard = self
                .builder
                .if_stmt(test, branch_block, NodeId::INVALID, None);
            out.push(guard);
            current = read;
        }

        current
    }

    /// Apply one link (or a named-member + call pair, which becomes a
    /// method call keeping its receiver), advancing the index.
    fn apply_link(
        &mut self,
        value: NodeId,
        links: &[Link<'_>],
        index: &mut usize,
        sink: &mut Vec<NodeId>,
    ) -> NodeId {
        match &links[*index] {
            Link::Member { property, span, .. } => {
                let loc = self.loc(*span);
                // Method-call pairing: `x.m(args)` keeps its receiver.
                if let MemberKey::Named(name) = property {
                    if let Some(Link::Call {
                        arguments,
                        optional: false,
                        span: call_span,
                    }) = links.get(*index + 1)
                    {
                        let receiver = self.ensure_simple(value, sink);
                        let callee = self.builder.member_named(receiver, name, None);
                        let args = self.lower_args(arguments, sink);
                        *index += 2;
                        return self
                            .builder
                            .call(callee, args, true, self.loc(*call_span));
                    }
                    *index += 1;
                    if name == "length" {
                        return self.builder.unary(UnOp::Len, value, loc);
                    }
                    return self.builder.member_named(value, name, loc);
                }
                *index += 1;
                let MemberKey::Computed(key) = property else {
                    return value;
                };
                let key_id = self.lower_expr(key, sink);
                self.builder.member_computed(value, key_id, loc)
            }
            Link::Call {
                arguments, span, ..
            } => {
                *index += 1;
                let args = self.lower_args(arguments, sink);
                self.builder.call(value, args, false, self.loc(*span))
            }
        }
    }

    /// `a ?? b` → `(a == nil) and b or a` over a single evaluation of `a`.
    pub(crate) fn lower_nullish(
        &mut self,
        left: &ast::Expr,
        right: &ast::Expr,
        span: Span,
        out: &mut Vec<NodeId>,
    ) -> NodeId {
        let loc = self.loc(span);
        let left_id = self.lower_expr(left, out);
        let left_simple = self.ensure_simple(left_id, out);

        let mut right_prelude = Vec::new();
        let right_id = self.lower_expr(right, &mut right_prelude);

        if right_prelude.is_empty() {
            let nil_lit = self.builder.literal_null(None);
            let test = self.builder.binary(BinOp::Eq, left_simple, nil_lit, None);
            return self.builder.conditional(test, right_id, left_simple, loc);
        }

        // The fallback hoists temporaries; keep it lazy.
        let result = self.builder.fresh_temp();
        let result_ident = self.builder.identifier(&result, None);
        let decl = self
            .builder
            .var_decl(ls_ir::DeclKind::Let, result_ident, left_simple, loc);
        out.push(decl);
        let read = self.builder.identifier(&result, None);
        let nil_lit = self.builder.literal_null(None);
        let test = self.builder.binary(BinOp::Eq, read, nil_lit, None);
        let mut branch = right_prelude;
        let write = self.builder.identifier(&result, None);
        let assign = self.builder.assignment(write, right_id, None);
        let assign_stmt = self.builder.expression_stmt(assign, None);
        branch.push(assign_stmt);
        let branch_block = self.builder.block(branch, None);
        let guard = self
            .builder
            .if_stmt(test, branch_block, NodeId::INVALID, None);
        out.push(guard);
        self.builder.identifier(&result, None)
    }
}
