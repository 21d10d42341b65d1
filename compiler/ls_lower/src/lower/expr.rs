//! Expression lowering.
//!
//! Expressions lower into a value node plus any prelude statements pushed
//! into the caller's sink (temporaries for optional chains, destructuring
//! assignment, update expressions). Branching constructs re-lower their
//! arms with private sinks so hoisted work stays lazy.

use super::{FrameKind, Lowerer, PLAIN_NAMESPACES};
use ls_ir::ast::{
    self, AssignTarget, BinaryOp, ExprKind, LogicalOp, MemberKey, ObjectMember, PropertyKey,
    UnaryOp, UpdateOp,
};
use ls_ir::{
    BinOp, LitValue, LogOp, NodeId, NodeKind, PrimitiveType, PropKey, Span, TypeDesc, UnOp,
};

impl Lowerer<'_> {
    pub(crate) fn lower_expr(&mut self, expression: &ast::Expr, out: &mut Vec<NodeId>) -> NodeId {
        if !self.enter() {
            let loc = self.loc(expression.span);
            return self.builder.unsupported("deeply nested expression", loc);
        }
        let id = self.lower_expr_inner(expression, out);
        self.leave();
        id
    }

    /// Lower an expression in statement position.
    ///
    /// Pure results (a bare identifier or literal) are dropped; everything
    /// else becomes an expression statement.
    pub(crate) fn lower_expr_stmt(&mut self, expression: &ast::Expr, out: &mut Vec<NodeId>) {
        match &expression.kind {
            ExprKind::Assign { .. } => {
                let _ = self.lower_assign(expression, out, false);
            }
            ExprKind::Update { op, argument, .. } => {
                self.lower_update_stmt(*op, argument, out);
            }
            _ => {
                let id = self.lower_expr(expression, out);
                if !self.is_pure(id) {
                    let loc = self.loc(expression.span);
                    let stmt = self.builder.expression_stmt(id, loc);
                    out.push(stmt);
                }
            }
        }
    }

    fn is_pure(&self, id: NodeId) -> bool {
        matches!(
            self.builder.kind(id),
            Some(NodeKind::Literal { .. } | NodeKind::Identifier { .. })
        )
    }

    fn lower_expr_inner(&mut self, expression: &ast::Expr, out: &mut Vec<NodeId>) -> NodeId {
        let span = expression.span;
        let loc = self.loc(span);
        match &expression.kind {
            ExprKind::Number { value, raw } => self.builder.literal_number(*value, raw, loc),
            ExprKind::Str(value) => self.builder.literal_string(value, loc),
            ExprKind::Bool(value) => self.builder.literal_bool(*value, loc),
            ExprKind::Null => self.builder.literal_null(loc),
            ExprKind::Ident(name) => {
                if name == "undefined" {
                    self.builder.literal_undefined(loc)
                } else {
                    self.builder.identifier(name, loc)
                }
            }
            ExprKind::Template {
                quasis,
                expressions,
            } => self.lower_template(quasis, expressions, span, out),
            ExprKind::Binary { op, left, right } => {
                self.lower_binary(*op, left, right, span, out)
            }
            ExprKind::Logical { op, left, right } => {
                self.lower_logical(*op, left, right, span, out)
            }
            ExprKind::Unary { op, argument } => self.lower_unary(*op, argument, span, out),
            ExprKind::Update {
                op,
                prefix,
                argument,
            } => self.lower_update_expr(*op, *prefix, argument, out),
            ExprKind::Assign { .. } => self
                .lower_assign(expression, out, true)
                .unwrap_or(NodeId::INVALID),
            ExprKind::Conditional {
                test,
                consequent,
                alternate,
            } => self.lower_conditional(test, consequent, alternate, span, out),
            ExprKind::Call { .. } | ExprKind::Member { .. }
                if has_optional_link(expression) =>
            {
                self.lower_optional_chain(expression, out)
            }
            ExprKind::Call {
                callee, arguments, ..
            } => self.lower_call(callee, arguments, span, out),
            ExprKind::Member {
                object, property, ..
            } => self.lower_member(object, property, span, out),
            ExprKind::New { callee, arguments } => {
                self.lower_new(callee, arguments, span, out)
            }
            ExprKind::Array(elements) => self.lower_array(elements, span, out),
            ExprKind::Object(members) => self.lower_object(members, span, out),
            ExprKind::Spread(_) => {
                self.report_unsupported("spread outside call or literal", span)
            }
            ExprKind::Function(function) => self.lower_function_expr(function, false, span),
            ExprKind::Arrow(function) => self.lower_arrow(function, span),
            ExprKind::Class(class) => self.lower_class_expr(class, span, out),
            ExprKind::This => self.builder.identifier("self", loc),
            ExprKind::Super => {
                self.report_semantic("`super` outside a method call or member access", span);
                self.report_unsupported("bare super", span)
            }
            ExprKind::Sequence(expressions) => {
                for expression in &expressions[..expressions.len().saturating_sub(1)] {
                    self.lower_expr_stmt(expression, out);
                }
                match expressions.last() {
                    Some(last) => self.lower_expr(last, out),
                    None => self.builder.literal_undefined(loc),
                }
            }
            ExprKind::Yield { argument, delegate } => {
                self.lower_yield(argument.as_deref(), *delegate, span, out)
            }
            ExprKind::Await(argument) => self.lower_await(argument, span, out),
        }
    }

    // Operators

    fn lower_binary(
        &mut self,
        op: BinaryOp,
        left: &ast::Expr,
        right: &ast::Expr,
        span: Span,
        out: &mut Vec<NodeId>,
    ) -> NodeId {
        let loc = self.loc(span);
        let direct = match op {
            BinaryOp::Sub => Some(BinOp::Sub),
            BinaryOp::Mul => Some(BinOp::Mul),
            BinaryOp::Div => Some(BinOp::Div),
            BinaryOp::Mod => Some(BinOp::Mod),
            BinaryOp::Pow => Some(BinOp::Pow),
            BinaryOp::Eq | BinaryOp::StrictEq => Some(BinOp::Eq),
            BinaryOp::NotEq | BinaryOp::StrictNotEq => Some(BinOp::NotEq),
            BinaryOp::Lt => Some(BinOp::Lt),
            BinaryOp::LtEq => Some(BinOp::LtEq),
            BinaryOp::Gt => Some(BinOp::Gt),
            BinaryOp::GtEq => Some(BinOp::GtEq),
            _ => None,
        };
        if let Some(bin) = direct {
            let left_id = self.lower_expr(left, out);
            let right_id = self.lower_expr(right, out);
            return self.builder.binary(bin, left_id, right_id, loc);
        }
        match op {
            BinaryOp::Add => {
                let left_id = self.lower_expr(left, out);
                let right_id = self.lower_expr(right, out);
                if self.is_stringy(left_id) || self.is_stringy(right_id) {
                    let left_id = self.coerce_string(left_id);
                    let right_id = self.coerce_string(right_id);
                    let id = self.builder.binary(BinOp::Concat, left_id, right_id, loc);
                    self.builder
                        .set_type(id, TypeDesc::primitive(PrimitiveType::String));
                    id
                } else {
                    self.builder.binary(BinOp::Add, left_id, right_id, loc)
                }
            }
            BinaryOp::BitAnd | BinaryOp::BitOr | BinaryOp::BitXor | BinaryOp::Shl
            | BinaryOp::Shr => {
                let helper = match op {
                    BinaryOp::BitAnd => "band",
                    BinaryOp::BitOr => "bor",
                    BinaryOp::BitXor => "bxor",
                    BinaryOp::Shl => "shl",
                    _ => "shr",
                };
                let left_id = self.lower_expr(left, out);
                let right_id = self.lower_expr(right, out);
                self.helper_call(helper, vec![left_id, right_id], loc)
            }
            BinaryOp::In => {
                // `k in t` → `t[k] ~= nil`
                let key_id = self.lower_expr(left, out);
                let table_id = self.lower_expr(right, out);
                let member = self.builder.member_computed(table_id, key_id, None);
                let nil_lit = self.builder.literal_null(None);
                self.builder.binary(BinOp::NotEq, member, nil_lit, loc)
            }
            BinaryOp::UShr => self.report_unsupported("unsigned right shift", span),
            BinaryOp::Instanceof => self.report_unsupported("instanceof", span),
            _ => self.report_unsupported(op.as_str(), span),
        }
    }

    fn lower_logical(
        &mut self,
        op: LogicalOp,
        left: &ast::Expr,
        right: &ast::Expr,
        span: Span,
        out: &mut Vec<NodeId>,
    ) -> NodeId {
        let loc = self.loc(span);
        if op == LogicalOp::Nullish {
            return self.lower_nullish(left, right, span, out);
        }
        let left_id = self.lower_expr(left, out);
        let mut right_prelude = Vec::new();
        let right_id = self.lower_expr(right, &mut right_prelude);
        if right_prelude.is_empty() {
            let lua_op = if op == LogicalOp::And {
                LogOp::And
            } else {
                LogOp::Or
            };
            return self.builder.logical(lua_op, left_id, right_id, loc);
        }

        // The right side hoists temporaries, so it must stay lazy:
        //   local _t = <left>
        //   if <_t truthy/falsy> then <prelude> _t = <right> end
        let temp = self.builder.fresh_temp();
        let temp_ident = self.builder.identifier(&temp, None);
        let decl = self
            .builder
            .var_decl(ls_ir::DeclKind::Let, temp_ident, left_id, loc);
        out.push(decl);
        let temp_read = self.builder.identifier(&temp, None);
        let test = if op == LogicalOp::And {
            temp_read
        } else {
            self.builder.unary(UnOp::Not, temp_read, None)
        };
        let mut branch = right_prelude;
        let temp_write = self.builder.identifier(&temp, None);
        let assign = self.builder.assignment(temp_write, right_id, None);
        let assign_stmt = self.builder.expression_stmt(assign, None);
        branch.push(assign_stmt);
        let branch_block = self.builder.block(branch, None);
        let guard = self
            .builder
            .if_stmt(test, branch_block, NodeId::INVALID, None);
        out.push(guard);
        self.builder.identifier(&temp, None)
    }

    fn lower_unary(
        &mut self,
        op: UnaryOp,
        argument: &ast::Expr,
        span: Span,
        out: &mut Vec<NodeId>,
    ) -> NodeId {
        let loc = self.loc(span);
        match op {
            UnaryOp::Minus => {
                let id = self.lower_expr(argument, out);
                self.builder.unary(UnOp::Neg, id, loc)
            }
            UnaryOp::Not => {
                let id = self.lower_expr(argument, out);
                self.builder.unary(UnOp::Not, id, loc)
            }
            // Unary plus is a numeric no-op on this target.
            UnaryOp::Plus => self.lower_expr(argument, out),
            UnaryOp::BitNot => {
                let id = self.lower_expr(argument, out);
                self.helper_call("bnot", vec![id], loc)
            }
            UnaryOp::TypeOf => {
                let id = self.lower_expr(argument, out);
                let type_fn = self.builder.identifier("type", None);
                self.builder.call(type_fn, vec![id], false, loc)
            }
            UnaryOp::Void => {
                self.lower_expr_stmt(argument, out);
                self.builder.literal_undefined(loc)
            }
            UnaryOp::Delete => self.lower_delete(argument, span, out),
        }
    }

    fn lower_delete(
        &mut self,
        argument: &ast::Expr,
        span: Span,
        out: &mut Vec<NodeId>,
    ) -> NodeId {
        let loc = self.loc(span);
        let ExprKind::Member {
            object,
            property,
            optional: false,
        } = &argument.kind
        else {
            return self.report_unsupported("delete of a non-member expression", span);
        };
        let object_id = self.lower_expr(object, out);
        let member = match property {
            MemberKey::Named(name) => self.builder.member_named(object_id, name, None),
            MemberKey::Computed(key) => {
                let key_id = self.lower_expr(key, out);
                self.builder.member_computed(object_id, key_id, None)
            }
        };
        let nil_lit = self.builder.literal_null(None);
        let assign = self.builder.assignment(member, nil_lit, loc);
        let stmt = self.builder.expression_stmt(assign, loc);
        out.push(stmt);
        self.builder.literal_bool(true, loc)
    }

    // Assignment and update

    /// Lower an assignment. Returns the expression value when requested.
    pub(crate) fn lower_assign(
        &mut self,
        expression: &ast::Expr,
        out: &mut Vec<NodeId>,
        need_value: bool,
    ) -> Option<NodeId> {
        let ExprKind::Assign { op, target, value } = &expression.kind else {
            return None;
        };
        let span = expression.span;
        let loc = self.loc(span);

        // Destructuring assignment: evaluate once, then fan out.
        if let AssignTarget::Pattern(pattern) = target {
            let value_id = self.lower_expr(value, out);
            let temp = self.builder.fresh_destructure();
            let temp_ident = self.builder.identifier(&temp, None);
            let decl = self
                .builder
                .var_decl(ls_ir::DeclKind::Let, temp_ident, value_id, loc);
            out.push(decl);
            self.expand_pattern(pattern, &temp, None, out);
            return Some(self.builder.identifier(&temp, loc));
        }

        let AssignTarget::Expr(target_expr) = target else {
            return None;
        };
        let resolved = match self.resolve_target(target_expr, out) {
            Some(resolved) => resolved,
            None => {
                let id = self.report_unsupported("assignment target", span);
                return Some(id);
            }
        };

        if let Some(logical) = op.logical_op() {
            // `a ??= b` and friends: the right side evaluates only when
            // the branch is taken.
            let read = self.target_read(&resolved);
            let test = match logical {
                LogicalOp::And => read,
                LogicalOp::Or => self.builder.unary(UnOp::Not, read, None),
                LogicalOp::Nullish => {
                    let nil_lit = self.builder.literal_null(None);
                    self.builder.binary(BinOp::Eq, read, nil_lit, None)
                }
            };
            let mut branch = Vec::new();
            let value_id = self.lower_expr(value, &mut branch);
            let write_target = self.target_write(&resolved);
            let assign = self.builder.assignment(write_target, value_id, loc);
            let assign_stmt = self.builder.expression_stmt(assign, None);
            branch.push(assign_stmt);
            let branch_block = self.builder.block(branch, None);
            let guard = self
                .builder
                .if_stmt(test, branch_block, NodeId::INVALID, loc);
            out.push(guard);
            return Some(self.target_read(&resolved));
        }

        let value_id = if let Some(binary) = op.binary_op() {
            let read = self.target_read(&resolved);
            let rhs = self.lower_expr(value, out);
            self.build_compound_value(binary, read, rhs)
        } else {
            self.lower_expr(value, out)
        };
        let write_target = self.target_write(&resolved);
        let assign = self.builder.assignment(write_target, value_id, loc);
        let stmt = self.builder.expression_stmt(assign, loc);
        out.push(stmt);
        need_value.then(|| self.target_read(&resolved))
    }

    /// The combined value of a compound assignment, with the same operator
    /// mapping as plain binary expressions.
    fn build_compound_value(&mut self, op: BinaryOp, read: NodeId, rhs: NodeId) -> NodeId {
        match op {
            BinaryOp::Add => {
                if self.is_stringy(read) || self.is_stringy(rhs) {
                    let left = self.coerce_string(read);
                    let right = self.coerce_string(rhs);
                    self.builder.binary(BinOp::Concat, left, right, None)
                } else {
                    self.builder.binary(BinOp::Add, read, rhs, None)
                }
            }
            BinaryOp::Sub => self.builder.binary(BinOp::Sub, read, rhs, None),
            BinaryOp::Mul => self.builder.binary(BinOp::Mul, read, rhs, None),
            BinaryOp::Div => self.builder.binary(BinOp::Div, read, rhs, None),
            BinaryOp::Mod => self.builder.binary(BinOp::Mod, read, rhs, None),
            BinaryOp::Pow => self.builder.binary(BinOp::Pow, read, rhs, None),
            BinaryOp::BitAnd => self.helper_call("band", vec![read, rhs], None),
            BinaryOp::BitOr => self.helper_call("bor", vec![read, rhs], None),
            BinaryOp::BitXor => self.helper_call("bxor", vec![read, rhs], None),
            BinaryOp::Shl => self.helper_call("shl", vec![read, rhs], None),
            BinaryOp::Shr => self.helper_call("shr", vec![read, rhs], None),
            _ => self.builder.binary(BinOp::Add, read, rhs, None),
        }
    }

    fn lower_update_expr(
        &mut self,
        op: UpdateOp,
        prefix: bool,
        argument: &ast::Expr,
        out: &mut Vec<NodeId>,
    ) -> NodeId {
        let span = argument.span;
        let Some(resolved) = self.resolve_target(argument, out) else {
            return self.report_unsupported("update target", span);
        };
        let bin = if op == UpdateOp::Inc {
            BinOp::Add
        } else {
            BinOp::Sub
        };

        if prefix {
            let read = self.target_read(&resolved);
            let one = self.builder.literal_number(1.0, "1", None);
            let value = self.builder.binary(bin, read, one, None);
            let write_target = self.target_write(&resolved);
            let assign = self.builder.assignment(write_target, value, self.loc(span));
            let stmt = self.builder.expression_stmt(assign, None);
            out.push(stmt);
            return self.target_read(&resolved);
        }

        // Postfix yields the value before the update.
        let temp = self.builder.fresh_temp();
        let read = self.target_read(&resolved);
        let temp_ident = self.builder.identifier(&temp, None);
        let decl = self
            .builder
            .var_decl(ls_ir::DeclKind::Let, temp_ident, read, None);
        out.push(decl);
        let temp_read = self.builder.identifier(&temp, None);
        let one = self.builder.literal_number(1.0, "1", None);
        let value = self.builder.binary(bin, temp_read, one, None);
        let write_target = self.target_write(&resolved);
        let assign = self.builder.assignment(write_target, value, self.loc(span));
        let stmt = self.builder.expression_stmt(assign, None);
        out.push(stmt);
        self.builder.identifier(&temp, None)
    }

    fn lower_update_stmt(&mut self, op: UpdateOp, argument: &ast::Expr, out: &mut Vec<NodeId>) {
        let span = argument.span;
        let Some(resolved) = self.resolve_target(argument, out) else {
            let id = self.report_unsupported("update target", span);
            let stmt = self.builder.expression_stmt(id, self.loc(span));
            out.push(stmt);
            return;
        };
        let bin = if op == UpdateOp::Inc {
            BinOp::Add
        } else {
            BinOp::Sub
        };
        let read = self.target_read(&resolved);
        let one = self.builder.literal_number(1.0, "1", None);
        let value = self.builder.binary(bin, read, one, None);
        let write_target = self.target_write(&resolved);
        let assign = self.builder.assignment(write_target, value, self.loc(span));
        let stmt = self.builder.expression_stmt(assign, self.loc(span));
        out.push(stmt);
    }

    // Conditionals

    fn lower_conditional(
        &mut self,
        test: &ast::Expr,
        consequent: &ast::Expr,
        alternate: &ast::Expr,
        span: Span,
        out: &mut Vec<NodeId>,
    ) -> NodeId {
        let loc = self.loc(span);
        let test_id = self.lower_expr(test, out);
        let mut cons_prelude = Vec::new();
        let cons_id = self.lower_expr(consequent, &mut cons_prelude);
        let mut alt_prelude = Vec::new();
        let alt_id = self.lower_expr(alternate, &mut alt_prelude);

        if cons_prelude.is_empty() && alt_prelude.is_empty() {
            return self.builder.conditional(test_id, cons_id, alt_id, loc);
        }

        // Arms hoist temporaries; keep them lazy with an if/else.
        let temp = self.builder.fresh_temp();
        let temp_ident = self.builder.identifier(&temp, None);
        let decl = self.builder.var_decl(
            ls_ir::DeclKind::Let,
            temp_ident,
            NodeId::INVALID,
            loc,
        );
        out.push(decl);

        let mut cons_branch = cons_prelude;
        let cons_write = self.builder.identifier(&temp, None);
        let cons_assign = self.builder.assignment(cons_write, cons_id, None);
        let cons_stmt = self.builder.expression_stmt(cons_assign, None);
        cons_branch.push(cons_stmt);
        let cons_block = self.builder.block(cons_branch, None);

        let mut alt_branch = alt_prelude;
        let alt_write = self.builder.identifier(&temp, None);
        let alt_assign = self.builder.assignment(alt_write, alt_id, None);
        let alt_stmt = self.builder.expression_stmt(alt_assign, None);
        alt_branch.push(alt_stmt);
        let alt_block = self.builder.block(alt_branch, None);

        let guard = self.builder.if_stmt(test_id, cons_block, alt_block, loc);
        out.push(guard);
        self.builder.identifier(&temp, None)
    }

    // Calls, members, construction

    pub(crate) fn lower_call(
        &mut self,
        callee: &ast::Expr,
        arguments: &[ast::Expr],
        span: Span,
        out: &mut Vec<NodeId>,
    ) -> NodeId {
        let loc = self.loc(span);

        // `super(args)` → Base.constructor(self, args)
        if matches!(callee.kind, ExprKind::Super) {
            let Some(super_ref) = self.super_ref() else {
                self.report_semantic("`super` call outside a subclass constructor", span);
                return self.report_unsupported("super call", span);
            };
            let base = self.builder.identifier(&super_ref, None);
            let ctor = self.builder.member_named(base, "constructor", None);
            let mut args = vec![self.builder.identifier("self", None)];
            args.extend(self.lower_args(arguments, out));
            return self.builder.call(ctor, args, false, loc);
        }

        // `super.m(args)` → Base.m(self, args)
        if let ExprKind::Member {
            object,
            property,
            optional: false,
        } = &callee.kind
        {
            if matches!(object.kind, ExprKind::Super) {
                let Some(super_ref) = self.super_ref() else {
                    self.report_semantic("`super` outside a subclass method", span);
                    return self.report_unsupported("super method call", span);
                };
                let base = self.builder.identifier(&super_ref, None);
                let member = match property {
                    MemberKey::Named(name) => self.builder.member_named(base, name, None),
                    MemberKey::Computed(key) => {
                        let key_id = self.lower_expr(key, out);
                        self.builder.member_computed(base, key_id, None)
                    }
                };
                let mut args = vec![self.builder.identifier("self", None)];
                args.extend(self.lower_args(arguments, out));
                return self.builder.call(member, args, false, loc);
            }

            // Method-style call through a member.
            return self.lower_member_call(object, property, arguments, span, out);
        }

        let callee_id = self.lower_expr(callee, out);
        if has_spread(arguments) {
            let packed = self.lower_spread_args(None, arguments, out);
            return self.helper_call("apply", vec![callee_id, packed], loc);
        }
        let args = self.lower_args(arguments, out);
        self.builder.call(callee_id, args, false, loc)
    }

    fn lower_member_call(
        &mut self,
        object: &ast::Expr,
        property: &MemberKey,
        arguments: &[ast::Expr],
        span: Span,
        out: &mut Vec<NodeId>,
    ) -> NodeId {
        let loc = self.loc(span);
        let plain = matches!(
            &object.kind,
            ExprKind::Ident(name) if PLAIN_NAMESPACES.contains(&name.as_str())
        );
        let object_id = self.lower_expr(object, out);

        if plain {
            let callee = match property {
                MemberKey::Named(name) => self.builder.member_named(object_id, name, None),
                MemberKey::Computed(key) => {
                    let key_id = self.lower_expr(key, out);
                    self.builder.member_computed(object_id, key_id, None)
                }
            };
            if has_spread(arguments) {
                let packed = self.lower_spread_args(None, arguments, out);
                return self.helper_call("apply", vec![callee, packed], loc);
            }
            let args = self.lower_args(arguments, out);
            return self.builder.call(callee, args, false, loc);
        }

        // Method call: the receiver becomes the implicit first argument.
        match property {
            MemberKey::Named(name) => {
                if has_spread(arguments) {
                    let receiver = self.ensure_simple(object_id, out);
                    let callee = self.builder.member_named(receiver, name, None);
                    let packed = self.lower_spread_args(Some(receiver), arguments, out);
                    self.helper_call("apply", vec![callee, packed], loc)
                } else {
                    let callee = self.builder.member_named(object_id, name, None);
                    let args = self.lower_args(arguments, out);
                    self.builder.call(callee, args, true, loc)
                }
            }
            MemberKey::Computed(key) => {
                // `o[k](args)`: Lua method-call syntax needs a name, so the
                // receiver is temped and passed explicitly.
                let receiver = self.ensure_simple(object_id, out);
                let key_id = self.lower_expr(key, out);
                let callee = self.builder.member_computed(receiver, key_id, None);
                if has_spread(arguments) {
                    let packed = self.lower_spread_args(Some(receiver), arguments, out);
                    self.helper_call("apply", vec![callee, packed], loc)
                } else {
                    let mut args = vec![receiver];
                    args.extend(self.lower_args(arguments, out));
                    self.builder.call(callee, args, false, loc)
                }
            }
        }
    }

    pub(crate) fn lower_member(
        &mut self,
        object: &ast::Expr,
        property: &MemberKey,
        span: Span,
        out: &mut Vec<NodeId>,
    ) -> NodeId {
        let loc = self.loc(span);
        if matches!(object.kind, ExprKind::Super) {
            let Some(super_ref) = self.super_ref() else {
                self.report_semantic("`super` outside a subclass method", span);
                return self.report_unsupported("super member access", span);
            };
            let base = self.builder.identifier(&super_ref, None);
            return match property {
                MemberKey::Named(name) => self.builder.member_named(base, name, loc),
                MemberKey::Computed(key) => {
                    let key_id = self.lower_expr(key, out);
                    self.builder.member_computed(base, key_id, loc)
                }
            };
        }
        let object_id = self.lower_expr(object, out);
        match property {
            // `.length` reads become the Lua length operator.
            MemberKey::Named(name) if name == "length" => {
                self.builder.unary(UnOp::Len, object_id, loc)
            }
            MemberKey::Named(name) => self.builder.member_named(object_id, name, loc),
            MemberKey::Computed(key) => {
                let key_id = self.lower_expr(key, out);
                self.builder.member_computed(object_id, key_id, loc)
            }
        }
    }

    fn lower_new(
        &mut self,
        callee: &ast::Expr,
        arguments: &[ast::Expr],
        span: Span,
        out: &mut Vec<NodeId>,
    ) -> NodeId {
        let loc = self.loc(span);
        let callee_id = self.lower_expr(callee, out);
        if has_spread(arguments) {
            let ctor = self.builder.member_named(callee_id, "new", None);
            let packed = self.lower_spread_args(None, arguments, out);
            return self.helper_call("apply", vec![ctor, packed], loc);
        }
        let args = self.lower_args(arguments, out);
        self.builder.new_expr(callee_id, args, loc)
    }

    /// Lower plain (spread-free) arguments.
    pub(crate) fn lower_args(
        &mut self,
        arguments: &[ast::Expr],
        out: &mut Vec<NodeId>,
    ) -> Vec<NodeId> {
        arguments
            .iter()
            .map(|argument| self.lower_expr(argument, out))
            .collect()
    }

    /// Pack arguments (with spreads) into an array-literal tuple for
    /// `__ls.apply`. Spread elements emit as `table.unpack(x)`.
    fn lower_spread_args(
        &mut self,
        receiver: Option<NodeId>,
        arguments: &[ast::Expr],
        out: &mut Vec<NodeId>,
    ) -> NodeId {
        let mut elements = Vec::with_capacity(arguments.len() + 1);
        if let Some(receiver) = receiver {
            elements.push(receiver);
        }
        for argument in arguments {
            match &argument.kind {
                ExprKind::Spread(inner) => {
                    let inner_id = self.lower_expr(inner, out);
                    let spread = self.builder.spread(inner_id, self.loc(argument.span));
                    elements.push(spread);
                }
                _ => elements.push(self.lower_expr(argument, out)),
            }
        }
        self.builder.array_literal(elements, None)
    }

    /// Materialize a value into a node that is safe to re-read
    /// (identifiers and literals re-evaluate without side effects).
    pub(crate) fn ensure_simple(&mut self, id: NodeId, out: &mut Vec<NodeId>) -> NodeId {
        if matches!(
            self.builder.kind(id),
            Some(NodeKind::Identifier { .. } | NodeKind::Literal { .. })
        ) {
            return id;
        }
        let temp = self.builder.fresh_temp();
        let temp_ident = self.builder.identifier(&temp, None);
        let decl = self
            .builder
            .var_decl(ls_ir::DeclKind::Let, temp_ident, id, None);
        out.push(decl);
        self.builder.identifier(&temp, None)
    }

    // Literals

    fn lower_array(
        &mut self,
        elements: &[Option<ast::Expr>],
        span: Span,
        out: &mut Vec<NodeId>,
    ) -> NodeId {
        let loc = self.loc(span);
        let mut lowered = Vec::with_capacity(elements.len());
        for element in elements {
            match element {
                None => lowered.push(self.builder.literal_undefined(None)),
                Some(ast::Expr {
                    kind: ExprKind::Spread(inner),
                    span: spread_span,
                }) => {
                    let inner_id = self.lower_expr(inner, out);
                    let loc = self.loc(*spread_span);
                    lowered.push(self.builder.spread(inner_id, loc));
                }
                Some(element) => lowered.push(self.lower_expr(element, out)),
            }
        }
        self.builder.array_literal(lowered, loc)
    }

    fn lower_object(
        &mut self,
        members: &[ObjectMember],
        span: Span,
        out: &mut Vec<NodeId>,
    ) -> NodeId {
        let loc = self.loc(span);
        let has_object_spread = members
            .iter()
            .any(|member| matches!(member, ObjectMember::Spread { .. }));

        if !has_object_spread {
            let mut properties = Vec::with_capacity(members.len());
            for member in members {
                let ObjectMember::Property {
                    key,
                    value,
                    shorthand,
                    span: prop_span,
                    ..
                } = member
                else {
                    continue;
                };
                let key_ir = self.lower_prop_key(key, out);
                let value_id = self.lower_property_value(value, out);
                let prop = self.builder.property_init(
                    key_ir,
                    value_id,
                    *shorthand,
                    self.loc(*prop_span),
                );
                properties.push(prop);
            }
            return self.builder.object_literal(properties, loc);
        }

        // Spread members merge into a fresh table in source order:
        //   local _t = {}
        //   __ls.assign(_t, a)  -- for `...a`
        //   _t.k = v            -- for `k: v`
        let temp = self.builder.fresh_temp();
        let empty = self.builder.object_literal(Vec::new(), None);
        let temp_ident = self.builder.identifier(&temp, None);
        let decl = self
            .builder
            .var_decl(ls_ir::DeclKind::Let, temp_ident, empty, loc);
        out.push(decl);
        for member in members {
            match member {
                ObjectMember::Spread { argument, span } => {
                    let source = self.lower_expr(argument, out);
                    let target = self.builder.identifier(&temp, None);
                    let call = self.helper_call("assign", vec![target, source], self.loc(*span));
                    let stmt = self.builder.expression_stmt(call, None);
                    out.push(stmt);
                }
                ObjectMember::Property {
                    key,
                    value,
                    span: prop_span,
                    ..
                } => {
                    let value_id = self.lower_property_value(value, out);
                    let target = self.builder.identifier(&temp, None);
                    let member_id = match self.lower_prop_key(key, out) {
                        PropKey::Ident(name) | PropKey::Str(name) => {
                            self.builder.member_named(target, name, None)
                        }
                        PropKey::Num(value) => {
                            let key_id =
                                self.builder.literal_number(value, format_num(value), None);
                            self.builder.member_computed(target, key_id, None)
                        }
                        PropKey::Computed(key_id) => {
                            self.builder.member_computed(target, key_id, None)
                        }
                    };
                    let assign = self.builder.assignment(member_id, value_id, None);
                    let stmt = self.builder.expression_stmt(assign, self.loc(*prop_span));
                    out.push(stmt);
                }
            }
        }
        self.builder.identifier(&temp, loc)
    }

    pub(crate) fn lower_prop_key(
        &mut self,
        key: &PropertyKey,
        out: &mut Vec<NodeId>,
    ) -> PropKey {
        match key {
            PropertyKey::Ident(name) => PropKey::Ident(name.clone()),
            PropertyKey::Str(value) => PropKey::Str(value.clone()),
            PropertyKey::Num { value, .. } => PropKey::Num(*value),
            PropertyKey::Computed(expression) => {
                PropKey::Computed(self.lower_expr(expression, out))
            }
        }
    }

    /// Object property values: methods and plain function expressions get
    /// a `self` parameter, since member calls pass the receiver. Arrows
    /// stay receiver-free (lexical `this`).
    fn lower_property_value(&mut self, value: &ast::Expr, out: &mut Vec<NodeId>) -> NodeId {
        match &value.kind {
            ExprKind::Function(function) => {
                self.lower_function_expr(function, true, value.span)
            }
            _ => self.lower_expr(value, out),
        }
    }

    // Templates

    fn lower_template(
        &mut self,
        quasis: &[ast::TemplateElement],
        expressions: &[ast::Expr],
        span: Span,
        out: &mut Vec<NodeId>,
    ) -> NodeId {
        let loc = self.loc(span);
        let mut pieces: Vec<NodeId> = Vec::new();
        for (index, quasi) in quasis.iter().enumerate() {
            if !quasi.cooked.is_empty() {
                let id = self.builder.literal_string(&quasi.cooked, None);
                pieces.push(id);
            }
            if let Some(expression) = expressions.get(index) {
                let value = self.lower_expr(expression, out);
                pieces.push(self.coerce_string(value));
            }
        }
        let Some(&first) = pieces.first() else {
            return self.builder.literal_string("", loc);
        };
        let mut acc = first;
        for &piece in &pieces[1..] {
            acc = self.builder.binary(BinOp::Concat, acc, piece, None);
            self.builder
                .set_type(acc, TypeDesc::primitive(PrimitiveType::String));
        }
        acc
    }

    // Generator / async operators

    fn lower_yield(
        &mut self,
        argument: Option<&ast::Expr>,
        delegate: bool,
        span: Span,
        out: &mut Vec<NodeId>,
    ) -> NodeId {
        if self.frame_kind() != FrameKind::Generator {
            self.report_semantic("`yield` outside a generator function", span);
            return self.report_unsupported("yield", span);
        }
        let loc = self.loc(span);

        if delegate {
            // yield* d: pull from the delegate's iterator and re-yield.
            let Some(delegate_expr) = argument else {
                return self.report_unsupported("yield* without a delegate", span);
            };
            let delegate_id = self.lower_expr(delegate_expr, out);
            let iter_call = self.helper_call("iter", vec![delegate_id], None);
            let iter_name = self.builder.fresh_iter();
            let iter_ident = self.builder.identifier(&iter_name, None);
            let iter_decl = self
                .builder
                .var_decl(ls_ir::DeclKind::Let, iter_ident, iter_call, loc);
            out.push(iter_decl);

            let step_name = self.builder.fresh_temp();
            let mut loop_body = Vec::new();
            let iter_read = self.builder.identifier(&iter_name, None);
            let step_call = self.builder.call(iter_read, Vec::new(), false, None);
            let step_ident = self.builder.identifier(&step_name, None);
            let step_decl =
                self.builder
                    .var_decl(ls_ir::DeclKind::Let, step_ident, step_call, None);
            loop_body.push(step_decl);
            let step_read = self.builder.identifier(&step_name, None);
            let nil_lit = self.builder.literal_null(None);
            let done = self.builder.binary(BinOp::Eq, step_read, nil_lit, None);
            let brk = self.builder.break_stmt(None);
            let brk_block = self.builder.block(vec![brk], None);
            let guard = self.builder.if_stmt(done, brk_block, NodeId::INVALID, None);
            loop_body.push(guard);
            let step_again = self.builder.identifier(&step_name, None);
            let re_yield = self.coroutine_call("yield", vec![step_again], None);
            let re_yield_stmt = self.builder.expression_stmt(re_yield, None);
            loop_body.push(re_yield_stmt);

            let true_lit = self.builder.literal_bool(true, None);
            let body_block = self.builder.block(loop_body, None);
            let while_id = self.builder.while_stmt(true_lit, body_block, loc);
            out.push(while_id);
            return self.builder.literal_undefined(loc);
        }

        let args = match argument {
            Some(argument) => vec![self.lower_expr(argument, out)],
            None => Vec::new(),
        };
        self.coroutine_call("yield", args, loc)
    }

    fn lower_await(
        &mut self,
        argument: &ast::Expr,
        span: Span,
        out: &mut Vec<NodeId>,
    ) -> NodeId {
        let value = self.lower_expr(argument, out);
        if self.frame_kind() == FrameKind::Async {
            let loc = self.loc(span);
            return self.coroutine_call("yield", vec![value], loc);
        }
        // Outside async (top-level await in modules): awaiting an already
        // resolved value is the value itself.
        value
    }

    // Shared predicates

    fn is_stringy(&self, id: NodeId) -> bool {
        match self.builder.kind(id) {
            Some(NodeKind::Literal {
                value: LitValue::String { .. },
            }) => true,
            _ => self.builder.node_ty(id).is_some_and(TypeDesc::is_string),
        }
    }

    fn coerce_string(&mut self, id: NodeId) -> NodeId {
        if self.is_stringy(id) {
            return id;
        }
        let tostring = self.builder.identifier("tostring", None);
        let call = self.builder.call(tostring, vec![id], false, None);
        self.builder
            .set_type(call, TypeDesc::primitive(PrimitiveType::String));
        call
    }

    pub(crate) fn super_ref(&self) -> Option<String> {
        self.classes.last().and_then(|ctx| ctx.super_ref.clone())
    }
}

/// Whether any argument is a spread element.
pub(crate) fn has_spread(arguments: &[ast::Expr]) -> bool {
    arguments
        .iter()
        .any(|argument| matches!(argument.kind, ExprKind::Spread(_)))
}

/// Whether a member/call chain contains an optional link.
pub(crate) fn has_optional_link(expression: &ast::Expr) -> bool {
    match &expression.kind {
        ExprKind::Member {
            object, optional, ..
        } => *optional || has_optional_link(object),
        ExprKind::Call {
            callee, optional, ..
        } => *optional || has_optional_link(callee),
        _ => false,
    }
}

/// Plain decimal spelling for synthesized numeric keys.
pub(crate) fn format_num(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}
