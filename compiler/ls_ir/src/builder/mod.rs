//! Node factory for the IR.
//!
//! The builder is the only way to create IR nodes: it owns the monotonic id
//! counter and the backing map, so ids and storage can never drift apart.
//! Constructors take already-built child ids, never syntax fragments.
//!
//! The builder also mints the fresh temporaries lowering introduces so that
//! source sub-expressions are evaluated exactly once (`_d` for destructured
//! sources, `_nested` for inner patterns, `_iter` for loop iterators, `_t`
//! for everything else). The first temporary of each family is the bare
//! prefix; later ones append their counter (`_d`, `_d2`, `_d3`, …).

#[cfg(test)]
mod tests;

use crate::node::{
    BinOp, CompilationUnit, DeclKind, LitValue, LogOp, MemberProp, Node, NodeId, NodeMap,
    NodeKind, PropKey, TypeDesc, UnOp,
};
use crate::Loc;

/// Allocates IR nodes with unique ids.
pub struct Builder {
    nodes: NodeMap,
    next_id: u32,
    temp_destructure: u32,
    temp_nested: u32,
    temp_iter: u32,
    temp_general: u32,
}

impl Default for Builder {
    fn default() -> Self {
        Self::new()
    }
}

fn numbered(prefix: &str, n: u32) -> String {
    if n == 1 {
        prefix.to_string()
    } else {
        format!("{prefix}{n}")
    }
}

impl Builder {
    pub fn new() -> Self {
        Builder {
            nodes: NodeMap::new(),
            next_id: 0,
            temp_destructure: 0,
            temp_nested: 0,
            temp_iter: 0,
            temp_general: 0,
        }
    }

    /// Number of nodes allocated so far.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Read back an allocated node's kind.
    pub fn kind(&self, id: NodeId) -> Option<&NodeKind> {
        self.nodes.kind(id)
    }

    /// Read back an allocated node's advisory type.
    pub fn node_ty(&self, id: NodeId) -> Option<&TypeDesc> {
        self.nodes.get(id).and_then(|node| node.ty.as_ref())
    }

    /// Attach or replace the advisory type of an allocated node.
    ///
    /// Nodes are mutated only within the lowering pass that created them;
    /// after [`Builder::finish`] the graph is frozen.
    pub fn set_type(&mut self, id: NodeId, ty: TypeDesc) {
        if let Some(node) = self.nodes.get_mut(id) {
            node.ty = Some(ty);
        }
    }

    /// Freeze the graph into a compilation unit rooted at `root`.
    pub fn finish(self, root: NodeId) -> CompilationUnit {
        CompilationUnit {
            nodes: self.nodes,
            root,
        }
    }

    // Temporaries

    /// Fresh temporary for a destructured source value.
    pub fn fresh_destructure(&mut self) -> String {
        self.temp_destructure += 1;
        numbered("_d", self.temp_destructure)
    }

    /// Fresh temporary for a nested pattern level.
    pub fn fresh_nested(&mut self) -> String {
        self.temp_nested += 1;
        numbered("_nested", self.temp_nested)
    }

    /// Fresh temporary for a loop iterator.
    pub fn fresh_iter(&mut self) -> String {
        self.temp_iter += 1;
        numbered("_iter", self.temp_iter)
    }

    /// Fresh general-purpose temporary.
    pub fn fresh_temp(&mut self) -> String {
        self.temp_general += 1;
        numbered("_t", self.temp_general)
    }

    fn alloc(&mut self, kind: NodeKind, loc: Option<Loc>, ty: Option<TypeDesc>) -> NodeId {
        let id = NodeId::new(self.next_id);
        self.next_id += 1;
        self.nodes.push(Node { id, kind, loc, ty });
        id
    }

    // Module

    pub fn program(&mut self, body: Vec<NodeId>, loc: Option<Loc>) -> NodeId {
        self.alloc(NodeKind::Program { body }, loc, None)
    }

    // Declarations

    pub fn var_decl(
        &mut self,
        decl_kind: DeclKind,
        binder: NodeId,
        init: NodeId,
        loc: Option<Loc>,
    ) -> NodeId {
        self.alloc(
            NodeKind::VarDecl {
                decl_kind,
                binder,
                init,
            },
            loc,
            None,
        )
    }

    pub fn function_decl(
        &mut self,
        name: impl Into<String>,
        params: Vec<NodeId>,
        body: NodeId,
        is_generator: bool,
        is_async: bool,
        loc: Option<Loc>,
    ) -> NodeId {
        self.alloc(
            NodeKind::FunctionDecl {
                name: name.into(),
                params,
                body,
                is_generator,
                is_async,
            },
            loc,
            None,
        )
    }

    pub fn param_decl(&mut self, binding: NodeId, default: NodeId, loc: Option<Loc>) -> NodeId {
        self.alloc(NodeKind::ParamDecl { binding, default }, loc, None)
    }

    // Statements

    pub fn block(&mut self, body: Vec<NodeId>, loc: Option<Loc>) -> NodeId {
        self.alloc(NodeKind::Block { body }, loc, None)
    }

    pub fn if_stmt(
        &mut self,
        test: NodeId,
        consequent: NodeId,
        alternate: NodeId,
        loc: Option<Loc>,
    ) -> NodeId {
        self.alloc(
            NodeKind::If {
                test,
                consequent,
                alternate,
            },
            loc,
            None,
        )
    }

    pub fn while_stmt(&mut self, test: NodeId, body: NodeId, loc: Option<Loc>) -> NodeId {
        self.alloc(NodeKind::While { test, body }, loc, None)
    }

    pub fn do_while_stmt(&mut self, body: NodeId, test: NodeId, loc: Option<Loc>) -> NodeId {
        self.alloc(NodeKind::DoWhile { body, test }, loc, None)
    }

    pub fn return_stmt(&mut self, argument: NodeId, loc: Option<Loc>) -> NodeId {
        self.alloc(NodeKind::Return { argument }, loc, None)
    }

    pub fn break_stmt(&mut self, loc: Option<Loc>) -> NodeId {
        self.alloc(NodeKind::Break, loc, None)
    }

    pub fn throw_stmt(&mut self, argument: NodeId, loc: Option<Loc>) -> NodeId {
        self.alloc(NodeKind::Throw { argument }, loc, None)
    }

    pub fn expression_stmt(&mut self, expression: NodeId, loc: Option<Loc>) -> NodeId {
        self.alloc(NodeKind::ExpressionStmt { expression }, loc, None)
    }

    pub fn empty_stmt(&mut self, loc: Option<Loc>) -> NodeId {
        self.alloc(NodeKind::Empty, loc, None)
    }

    // Expressions

    fn literal(&mut self, value: LitValue, loc: Option<Loc>) -> NodeId {
        let ty = TypeDesc::primitive(value.type_tag());
        self.alloc(NodeKind::Literal { value }, loc, Some(ty))
    }

    pub fn literal_number(&mut self, value: f64, raw: impl Into<String>, loc: Option<Loc>) -> NodeId {
        self.literal(
            LitValue::Number {
                value,
                raw: raw.into(),
            },
            loc,
        )
    }

    pub fn literal_string(&mut self, value: impl Into<String>, loc: Option<Loc>) -> NodeId {
        self.literal(
            LitValue::String {
                value: value.into(),
            },
            loc,
        )
    }

    pub fn literal_bool(&mut self, value: bool, loc: Option<Loc>) -> NodeId {
        self.literal(LitValue::Boolean { value }, loc)
    }

    pub fn literal_null(&mut self, loc: Option<Loc>) -> NodeId {
        self.literal(LitValue::Null, loc)
    }

    pub fn literal_undefined(&mut self, loc: Option<Loc>) -> NodeId {
        self.literal(LitValue::Undefined, loc)
    }

    pub fn identifier(&mut self, name: impl Into<String>, loc: Option<Loc>) -> NodeId {
        self.alloc(NodeKind::Identifier { name: name.into() }, loc, None)
    }

    pub fn binary(&mut self, op: BinOp, left: NodeId, right: NodeId, loc: Option<Loc>) -> NodeId {
        self.alloc(NodeKind::BinaryOp { op, left, right }, loc, None)
    }

    pub fn unary(&mut self, op: UnOp, operand: NodeId, loc: Option<Loc>) -> NodeId {
        self.alloc(NodeKind::UnaryOp { op, operand }, loc, None)
    }

    pub fn logical(&mut self, op: LogOp, left: NodeId, right: NodeId, loc: Option<Loc>) -> NodeId {
        self.alloc(NodeKind::LogicalOp { op, left, right }, loc, None)
    }

    pub fn assignment(&mut self, target: NodeId, value: NodeId, loc: Option<Loc>) -> NodeId {
        self.alloc(NodeKind::Assignment { target, value }, loc, None)
    }

    pub fn call(
        &mut self,
        callee: NodeId,
        arguments: Vec<NodeId>,
        this_call: bool,
        loc: Option<Loc>,
    ) -> NodeId {
        self.alloc(
            NodeKind::Call {
                callee,
                arguments,
                this_call,
            },
            loc,
            None,
        )
    }

    pub fn new_expr(&mut self, callee: NodeId, arguments: Vec<NodeId>, loc: Option<Loc>) -> NodeId {
        self.alloc(NodeKind::New { callee, arguments }, loc, None)
    }

    pub fn member_named(
        &mut self,
        object: NodeId,
        property: impl Into<String>,
        loc: Option<Loc>,
    ) -> NodeId {
        self.alloc(
            NodeKind::Member {
                object,
                property: MemberProp::Named(property.into()),
            },
            loc,
            None,
        )
    }

    pub fn member_computed(&mut self, object: NodeId, property: NodeId, loc: Option<Loc>) -> NodeId {
        self.alloc(
            NodeKind::Member {
                object,
                property: MemberProp::Computed(property),
            },
            loc,
            None,
        )
    }

    pub fn optional_member(
        &mut self,
        object: NodeId,
        property: MemberProp,
        boundary: bool,
        loc: Option<Loc>,
    ) -> NodeId {
        self.alloc(
            NodeKind::OptionalMember {
                object,
                property,
                boundary,
            },
            loc,
            None,
        )
    }

    pub fn conditional(
        &mut self,
        test: NodeId,
        consequent: NodeId,
        alternate: NodeId,
        loc: Option<Loc>,
    ) -> NodeId {
        self.alloc(
            NodeKind::Conditional {
                test,
                consequent,
                alternate,
            },
            loc,
            None,
        )
    }

    pub fn array_literal(&mut self, elements: Vec<NodeId>, loc: Option<Loc>) -> NodeId {
        self.alloc(NodeKind::ArrayLiteral { elements }, loc, None)
    }

    pub fn object_literal(&mut self, properties: Vec<NodeId>, loc: Option<Loc>) -> NodeId {
        self.alloc(NodeKind::ObjectLiteral { properties }, loc, None)
    }

    pub fn property_init(
        &mut self,
        key: PropKey,
        value: NodeId,
        shorthand: bool,
        loc: Option<Loc>,
    ) -> NodeId {
        self.alloc(
            NodeKind::PropertyInit {
                key,
                value,
                shorthand,
            },
            loc,
            None,
        )
    }

    pub fn spread(&mut self, argument: NodeId, loc: Option<Loc>) -> NodeId {
        self.alloc(NodeKind::Spread { argument }, loc, None)
    }

    pub fn arrow(
        &mut self,
        params: Vec<NodeId>,
        body: NodeId,
        is_async: bool,
        loc: Option<Loc>,
    ) -> NodeId {
        self.alloc(
            NodeKind::Arrow {
                params,
                body,
                is_async,
            },
            loc,
            None,
        )
    }

    pub fn function_expr(
        &mut self,
        name: impl Into<String>,
        params: Vec<NodeId>,
        body: NodeId,
        is_generator: bool,
        is_async: bool,
        loc: Option<Loc>,
    ) -> NodeId {
        self.alloc(
            NodeKind::FunctionExpr {
                name: name.into(),
                params,
                body,
                is_generator,
                is_async,
            },
            loc,
            None,
        )
    }

    pub fn yield_expr(&mut self, argument: NodeId, delegate: bool, loc: Option<Loc>) -> NodeId {
        self.alloc(NodeKind::YieldExpr { argument, delegate }, loc, None)
    }

    // Patterns

    pub fn array_pattern(&mut self, elements: Vec<NodeId>, loc: Option<Loc>) -> NodeId {
        self.alloc(
            NodeKind::ArrayPattern {
                elements,
                index_bias: 1,
            },
            loc,
            None,
        )
    }

    // Error recovery

    pub fn unsupported(&mut self, construct: impl Into<String>, loc: Option<Loc>) -> NodeId {
        self.alloc(
            NodeKind::Unsupported {
                construct: construct.into(),
            },
            loc,
            None,
        )
    }
}
