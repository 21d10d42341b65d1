//! Class lowering onto metatable-linked tables.
//!
//! ```text
//! class B extends A { constructor(x) { super(x); } m() {} }
//! ```
//! becomes
//! ```text
//! local B = {}
//! setmetatable(B, { __index = A })
//! B.constructor = function(self, x) A.constructor(self, x) end
//! B.m = function(self) end
//! B.new = function(...)
//!   local self = setmetatable({}, { __index = B })
//!   B.constructor(self, ...)
//!   return self
//! end
//! ```
//!
//! Every method (static included) takes an explicit `self` first parameter:
//! member calls pass the receiver, and a static call's receiver is the
//! class table itself. `super` resolves against the recorded superclass
//! reference; a missing constructor is synthesized to forward its
//! arguments upward.

use super::{ClassCtx, Lowerer};
use ls_ir::ast::{self, DeclKind, ExprKind, PropertyKey};
use ls_ir::{NodeId, PropKey, Span};

impl Lowerer<'_> {
    pub(crate) fn lower_class_decl(
        &mut self,
        class: &ast::Class,
        span: Span,
        out: &mut Vec<NodeId>,
    ) {
        let name = match &class.name {
            Some(name) => name.clone(),
            None => self.builder.fresh_temp(),
        };
        self.lower_class_into(class, &name, span, out);
    }

    pub(crate) fn lower_class_expr(
        &mut self,
        class: &ast::Class,
        span: Span,
        out: &mut Vec<NodeId>,
    ) -> NodeId {
        let name = match &class.name {
            Some(name) => name.clone(),
            None => self.builder.fresh_temp(),
        };
        self.lower_class_into(class, &name, span, out);
        self.builder.identifier(&name, self.loc(span))
    }

    fn lower_class_into(
        &mut self,
        class: &ast::Class,
        name: &str,
        span: Span,
        out: &mut Vec<NodeId>,
    ) {
        let loc = self.loc(span);

        // local C = {}
        let empty = self.builder.object_literal(Vec::new(), None);
        let binder = self.builder.identifier(name, loc);
        let decl = self.builder.var_decl(DeclKind::Let, binder, empty, loc);
        out.push(decl);

        // Evaluate the superclass once and link the metatable.
        let super_ref = match &class.superclass {
            None => None,
            Some(superclass) => {
                let reference = match &superclass.kind {
                    ExprKind::Ident(base) => base.clone(),
                    _ => {
                        let value = self.lower_expr(superclass, out);
                        let temp = self.builder.fresh_temp();
                        let temp_ident = self.builder.identifier(&temp, None);
                        let temp_decl =
                            self.builder
                                .var_decl(DeclKind::Let, temp_ident, value, None);
                        out.push(temp_decl);
                        temp
                    }
                };
                let class_read = self.builder.identifier(name, None);
                let base_read = self.builder.identifier(&reference, None);
                let index_prop = self.builder.property_init(
                    PropKey::Ident("__index".to_string()),
                    base_read,
                    false,
                    None,
                );
                let meta = self.builder.object_literal(vec![index_prop], None);
                let setmeta = self.builder.identifier("setmetatable", None);
                let call = self
                    .builder
                    .call(setmeta, vec![class_read, meta], false, None);
                let stmt = self.builder.expression_stmt(call, None);
                out.push(stmt);
                Some(reference)
            }
        };

        self.classes.push(ClassCtx {
            super_ref: super_ref.clone(),
        });

        let mut has_constructor = false;
        for member in &class.members {
            let value = self.lower_function_expr(&member.function, true, member.span);
            let class_read = self.builder.identifier(name, None);
            let target = match &member.key {
                PropertyKey::Ident(key) | PropertyKey::Str(key) => {
                    self.builder.member_named(class_read, key, None)
                }
                PropertyKey::Num { value: num, raw } => {
                    let key = self.builder.literal_number(*num, raw, None);
                    self.builder.member_computed(class_read, key, None)
                }
                PropertyKey::Computed(expression) => {
                    let key = self.lower_expr(expression, out);
                    self.builder.member_computed(class_read, key, None)
                }
            };
            let assign = self.builder.assignment(target, value, self.loc(member.span));
            let stmt = self.builder.expression_stmt(assign, self.loc(member.span));
            out.push(stmt);
            has_constructor = has_constructor || member.is_constructor;
        }

        if !has_constructor {
            let ctor = self.synthesize_constructor(super_ref.as_deref());
            let class_read = self.builder.identifier(name, None);
            let target = self.builder.member_named(class_read, "constructor", None);
            let assign = self.builder.assignment(target, ctor, None);
            let stmt = self.builder.expression_stmt(assign, None);
            out.push(stmt);
        }

        self.classes.pop();

        // C.new allocator.
        let allocator = self.build_allocator(name);
        let class_read = self.builder.identifier(name, None);
        let target = self.builder.member_named(class_read, "new", None);
        let assign = self.builder.assignment(target, allocator, None);
        let stmt = self.builder.expression_stmt(assign, None);
        out.push(stmt);
    }

    /// Default constructor: forwards to the superclass when there is one.
    fn synthesize_constructor(&mut self, super_ref: Option<&str>) -> NodeId {
        let self_binding = self.builder.identifier("self", None);
        let self_param = self.builder.param_decl(self_binding, NodeId::INVALID, None);
        let mut params = vec![self_param];
        let mut body = Vec::new();
        if let Some(base) = super_ref {
            let dots = self.builder.identifier("...", None);
            let dots_param = self.builder.param_decl(dots, NodeId::INVALID, None);
            params.push(dots_param);
            let base_read = self.builder.identifier(base, None);
            let ctor = self.builder.member_named(base_read, "constructor", None);
            let self_read = self.builder.identifier("self", None);
            let dots_read = self.builder.identifier("...", None);
            let call = self
                .builder
                .call(ctor, vec![self_read, dots_read], false, None);
            let stmt = self.builder.expression_stmt(call, None);
            body.push(stmt);
        }
        let block = self.builder.block(body, None);
        self.builder
            .function_expr("", params, block, false, false, None)
    }

    /// `C.new = function(...) … end`
    fn build_allocator(&mut self, name: &str) -> NodeId {
        let dots = self.builder.identifier("...", None);
        let dots_param = self.builder.param_decl(dots, NodeId::INVALID, None);

        // local self = setmetatable({}, { __index = C })
        let instance = self.builder.object_literal(Vec::new(), None);
        let class_read = self.builder.identifier(name, None);
        let index_prop = self.builder.property_init(
            PropKey::Ident("__index".to_string()),
            class_read,
            false,
            None,
        );
        let meta = self.builder.object_literal(vec![index_prop], None);
        let setmeta = self.builder.identifier("setmetatable", None);
        let alloc = self.builder.call(setmeta, vec![instance, meta], false, None);
        let self_ident = self.builder.identifier("self", None);
        let self_decl = self.builder.var_decl(DeclKind::Let, self_ident, alloc, None);

        // C.constructor(self, ...)
        let class_again = self.builder.identifier(name, None);
        let ctor = self.builder.member_named(class_again, "constructor", None);
        let self_read = self.builder.identifier("self", None);
        let dots_read = self.builder.identifier("...", None);
        let ctor_call = self
            .builder
            .call(ctor, vec![self_read, dots_read], false, None);
        let ctor_stmt = self.builder.expression_stmt(ctor_call, None);

        // return self
        let self_final = self.builder.identifier("self", None);
        let ret = self.builder.return_stmt(self_final, None);

        let block = self.builder.block(vec![self_decl, ctor_stmt, ret], None);
        self.builder
            .function_expr("", vec![dots_param], block, false, false, None)
    }
}
