//! The canonical IR node model.
//!
//! Every node lives in a flat [`NodeMap`] owned by one [`CompilationUnit`];
//! inter-node references are [`NodeId`]s, never embedded pointers. The kind
//! set is closed: lowering maps every supported surface construct onto it,
//! and anything outside the supported subset becomes [`NodeKind::Unsupported`]
//! so later stages can keep going and report every problem at once.

mod serialize;
#[cfg(test)]
mod tests;

use crate::Loc;
use serde::{Deserialize, Serialize};
use std::fmt;

pub use crate::ast::DeclKind;

/// Index into the node map.
///
/// Prints and serializes as the stable string `node_<n>`, unique within one
/// compilation. Equality is an O(1) integer compare.
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
#[repr(transparent)]
pub struct NodeId(u32);

impl NodeId {
    /// Sentinel for "no node" (absent else-branch, missing initializer).
    pub const INVALID: NodeId = NodeId(u32::MAX);

    #[inline]
    pub const fn new(index: u32) -> Self {
        NodeId(index)
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn is_valid(self) -> bool {
        self.0 != u32::MAX
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            write!(f, "node_{}", self.0)
        } else {
            write!(f, "NodeId::INVALID")
        }
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node_{}", self.0)
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::INVALID
    }
}

/// Binary operators over the Lua operator set.
///
/// Surface operators are mapped here during lowering: `===`/`==` become
/// [`BinOp::Eq`], string-typed `+` becomes [`BinOp::Concat`], bit operators
/// become runtime-helper calls and never reach this enum.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    Concat,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
}

impl BinOp {
    /// Lua spelling of the operator.
    pub const fn lua(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Mod => "%",
            BinOp::Pow => "^",
            BinOp::Concat => "..",
            BinOp::Eq => "==",
            BinOp::NotEq => "~=",
            BinOp::Lt => "<",
            BinOp::LtEq => "<=",
            BinOp::Gt => ">",
            BinOp::GtEq => ">=",
        }
    }
}

/// Unary operators. `Len` is the Lua `#` operator, produced when lowering
/// `.length` member reads.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnOp {
    Neg,
    Not,
    Len,
}

impl UnOp {
    pub const fn lua(self) -> &'static str {
        match self {
            UnOp::Neg => "-",
            UnOp::Not => "not ",
            UnOp::Len => "#",
        }
    }
}

/// Short-circuit operators. `Nullish` is eliminated by lowering; it stays in
/// the vocabulary so hand-built graphs remain printable (emitted as `or`).
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogOp {
    And,
    Or,
    Nullish,
}

/// Primitive type tags for literals and type descriptors.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveType {
    Number,
    Boolean,
    String,
    Null,
    Undefined,
    Void,
}

/// Advisory type descriptors. They guide emission (numeric vs. string `+`)
/// but are not a checked type system.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TypeDesc {
    Primitive { name: PrimitiveType },
    Array { element: Box<TypeDesc> },
    Object { fields: Option<Vec<(String, TypeDesc)>> },
    Function { params: Vec<TypeDesc>, ret: Box<TypeDesc> },
    Union { arms: Vec<TypeDesc> },
    Any,
    Ref { name: String },
}

impl TypeDesc {
    pub const fn primitive(name: PrimitiveType) -> Self {
        TypeDesc::Primitive { name }
    }

    /// Whether this descriptor is statically known to be a string.
    pub fn is_string(&self) -> bool {
        matches!(
            self,
            TypeDesc::Primitive {
                name: PrimitiveType::String
            }
        )
    }
}

/// Literal values. The discriminant is the concrete primitive type tag every
/// literal must carry.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum LitValue {
    Number { value: f64, raw: String },
    String { value: String },
    Boolean { value: bool },
    Null,
    Undefined,
}

impl LitValue {
    pub const fn type_tag(&self) -> PrimitiveType {
        match self {
            LitValue::Number { .. } => PrimitiveType::Number,
            LitValue::String { .. } => PrimitiveType::String,
            LitValue::Boolean { .. } => PrimitiveType::Boolean,
            LitValue::Null => PrimitiveType::Null,
            LitValue::Undefined => PrimitiveType::Undefined,
        }
    }

    /// Both `null` and `undefined` emit as Lua `nil`.
    pub const fn is_nil(&self) -> bool {
        matches!(self, LitValue::Null | LitValue::Undefined)
    }
}

/// Member access key: a fixed name or a computed expression.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberProp {
    Named(String),
    Computed(NodeId),
}

/// Property key for `PropertyInit` / `PropertyPattern` nodes.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropKey {
    Ident(String),
    Str(String),
    Num(f64),
    Computed(NodeId),
}

impl PropKey {
    /// Static name of this key, when it has one.
    pub fn static_name(&self) -> Option<&str> {
        match self {
            PropKey::Ident(name) | PropKey::Str(name) => Some(name),
            PropKey::Num(_) | PropKey::Computed(_) => None,
        }
    }
}

/// The closed set of IR node kinds: the canonical forms lowering produces.
///
/// High-level surface constructs (classes, switch, try, for/for-of,
/// template literals, optional calls, sequences, `this`/`super`, await)
/// exist only in the AST; lowering rewrites all of them into this set, so
/// every kind here has a producer and an emitter arm.
///
/// Child references are by [`NodeId`]; `NodeId::INVALID` encodes an absent
/// optional child (missing initializer, no else-branch, bare `return`).
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum NodeKind {
    // Module
    Program {
        body: Vec<NodeId>,
    },

    // Declarations
    VarDecl {
        decl_kind: DeclKind,
        binder: NodeId,
        init: NodeId,
    },
    FunctionDecl {
        name: String,
        params: Vec<NodeId>,
        body: NodeId,
        is_generator: bool,
        is_async: bool,
    },
    ParamDecl {
        binding: NodeId,
        default: NodeId,
    },

    // Statements
    Block {
        body: Vec<NodeId>,
    },
    If {
        test: NodeId,
        consequent: NodeId,
        alternate: NodeId,
    },
    While {
        test: NodeId,
        body: NodeId,
    },
    DoWhile {
        body: NodeId,
        test: NodeId,
    },
    Return {
        argument: NodeId,
    },
    Break,
    Throw {
        argument: NodeId,
    },
    ExpressionStmt {
        expression: NodeId,
    },
    Empty,

    // Expressions
    Literal {
        value: LitValue,
    },
    Identifier {
        name: String,
    },
    BinaryOp {
        op: BinOp,
        left: NodeId,
        right: NodeId,
    },
    UnaryOp {
        op: UnOp,
        operand: NodeId,
    },
    LogicalOp {
        op: LogOp,
        left: NodeId,
        right: NodeId,
    },
    Assignment {
        target: NodeId,
        value: NodeId,
    },
    Call {
        callee: NodeId,
        arguments: Vec<NodeId>,
        /// Emit as a Lua method call (`obj:m(...)`) passing the receiver.
        this_call: bool,
    },
    New {
        callee: NodeId,
        arguments: Vec<NodeId>,
    },
    Member {
        object: NodeId,
        property: MemberProp,
    },
    OptionalMember {
        object: NodeId,
        property: MemberProp,
        /// Set on the outermost optional node of a chain, where the
        /// short-circuit `nil` is produced.
        boundary: bool,
    },
    Conditional {
        test: NodeId,
        consequent: NodeId,
        alternate: NodeId,
    },
    ArrayLiteral {
        elements: Vec<NodeId>,
    },
    ObjectLiteral {
        properties: Vec<NodeId>,
    },
    PropertyInit {
        key: PropKey,
        value: NodeId,
        shorthand: bool,
    },
    Spread {
        argument: NodeId,
    },
    Arrow {
        params: Vec<NodeId>,
        body: NodeId,
        is_async: bool,
    },
    FunctionExpr {
        name: String,
        params: Vec<NodeId>,
        body: NodeId,
        is_generator: bool,
        is_async: bool,
    },
    YieldExpr {
        argument: NodeId,
        delegate: bool,
    },

    // Patterns
    ArrayPattern {
        elements: Vec<NodeId>,
        /// Added to source element indices when emitting table reads;
        /// Lua arrays are 1-based.
        index_bias: u32,
    },

    // Error recovery
    Unsupported {
        construct: String,
    },
}

impl NodeKind {
    /// Stable kind name for diagnostics.
    pub const fn name(&self) -> &'static str {
        match self {
            NodeKind::Program { .. } => "Program",
            NodeKind::VarDecl { .. } => "VarDecl",
            NodeKind::FunctionDecl { .. } => "FunctionDecl",
            NodeKind::ParamDecl { .. } => "ParamDecl",
            NodeKind::Block { .. } => "Block",
            NodeKind::If { .. } => "If",
            NodeKind::While { .. } => "While",
            NodeKind::DoWhile { .. } => "DoWhile",
            NodeKind::Return { .. } => "Return",
            NodeKind::Break => "Break",
            NodeKind::Throw { .. } => "Throw",
            NodeKind::ExpressionStmt { .. } => "ExpressionStmt",
            NodeKind::Empty => "Empty",
            NodeKind::Literal { .. } => "Literal",
            NodeKind::Identifier { .. } => "Identifier",
            NodeKind::BinaryOp { .. } => "BinaryOp",
            NodeKind::UnaryOp { .. } => "UnaryOp",
            NodeKind::LogicalOp { .. } => "LogicalOp",
            NodeKind::Assignment { .. } => "Assignment",
            NodeKind::Call { .. } => "Call",
            NodeKind::New { .. } => "New",
            NodeKind::Member { .. } => "Member",
            NodeKind::OptionalMember { .. } => "OptionalMember",
            NodeKind::Conditional { .. } => "Conditional",
            NodeKind::ArrayLiteral { .. } => "ArrayLiteral",
            NodeKind::ObjectLiteral { .. } => "ObjectLiteral",
            NodeKind::PropertyInit { .. } => "PropertyInit",
            NodeKind::Spread { .. } => "Spread",
            NodeKind::Arrow { .. } => "Arrow",
            NodeKind::FunctionExpr { .. } => "FunctionExpr",
            NodeKind::YieldExpr { .. } => "YieldExpr",
            NodeKind::ArrayPattern { .. } => "ArrayPattern",
            NodeKind::Unsupported { .. } => "Unsupported",
        }
    }

    /// Whether this kind is a pattern node (restricted to binding positions).
    pub const fn is_pattern(&self) -> bool {
        matches!(self, NodeKind::ArrayPattern { .. })
    }

    /// Whether this kind may appear directly in `Program.body`.
    pub const fn is_program_item(&self) -> bool {
        matches!(
            self,
            NodeKind::VarDecl { .. }
                | NodeKind::FunctionDecl { .. }
                | NodeKind::Block { .. }
                | NodeKind::If { .. }
                | NodeKind::While { .. }
                | NodeKind::DoWhile { .. }
                | NodeKind::Return { .. }
                | NodeKind::Break
                | NodeKind::Throw { .. }
                | NodeKind::ExpressionStmt { .. }
                | NodeKind::Empty
                | NodeKind::Unsupported { .. }
        )
    }

    /// All valid child references, in evaluation order where one exists.
    ///
    /// `NodeId::INVALID` children are skipped, so callers can treat the
    /// result as the exact reference set of this node.
    pub fn children(&self) -> Vec<NodeId> {
        fn add(out: &mut Vec<NodeId>, id: NodeId) {
            if id.is_valid() {
                out.push(id);
            }
        }
        fn add_all(out: &mut Vec<NodeId>, ids: &[NodeId]) {
            for &id in ids {
                add(out, id);
            }
        }
        fn add_key(out: &mut Vec<NodeId>, key: &PropKey) {
            if let PropKey::Computed(id) = key {
                add(out, *id);
            }
        }

        let mut out = Vec::new();
        match self {
            NodeKind::Program { body } | NodeKind::Block { body } => add_all(&mut out, body),
            NodeKind::VarDecl { binder, init, .. } => {
                add(&mut out, *binder);
                add(&mut out, *init);
            }
            NodeKind::FunctionDecl { params, body, .. }
            | NodeKind::FunctionExpr { params, body, .. }
            | NodeKind::Arrow { params, body, .. } => {
                add_all(&mut out, params);
                add(&mut out, *body);
            }
            NodeKind::ParamDecl { binding, default } => {
                add(&mut out, *binding);
                add(&mut out, *default);
            }
            NodeKind::If {
                test,
                consequent,
                alternate,
            }
            | NodeKind::Conditional {
                test,
                consequent,
                alternate,
            } => {
                add(&mut out, *test);
                add(&mut out, *consequent);
                add(&mut out, *alternate);
            }
            NodeKind::While { test, body } => {
                add(&mut out, *test);
                add(&mut out, *body);
            }
            NodeKind::DoWhile { body, test } => {
                add(&mut out, *body);
                add(&mut out, *test);
            }
            NodeKind::Return { argument }
            | NodeKind::Throw { argument }
            | NodeKind::Spread { argument }
            | NodeKind::YieldExpr { argument, .. } => add(&mut out, *argument),
            NodeKind::ExpressionStmt { expression } => add(&mut out, *expression),
            NodeKind::BinaryOp { left, right, .. }
            | NodeKind::LogicalOp { left, right, .. } => {
                add(&mut out, *left);
                add(&mut out, *right);
            }
            NodeKind::UnaryOp { operand, .. } => add(&mut out, *operand),
            NodeKind::Assignment { target, value } => {
                add(&mut out, *target);
                add(&mut out, *value);
            }
            NodeKind::Call {
                callee, arguments, ..
            }
            | NodeKind::New { callee, arguments } => {
                add(&mut out, *callee);
                add_all(&mut out, arguments);
            }
            NodeKind::Member { object, property }
            | NodeKind::OptionalMember {
                object, property, ..
            } => {
                add(&mut out, *object);
                if let MemberProp::Computed(id) = property {
                    add(&mut out, *id);
                }
            }
            NodeKind::ArrayLiteral { elements }
            | NodeKind::ArrayPattern { elements, .. } => add_all(&mut out, elements),
            NodeKind::ObjectLiteral { properties } => add_all(&mut out, properties),
            NodeKind::PropertyInit { key, value, .. } => {
                add_key(&mut out, key);
                add(&mut out, *value);
            }
            NodeKind::Literal { .. }
            | NodeKind::Identifier { .. }
            | NodeKind::Break
            | NodeKind::Empty
            | NodeKind::Unsupported { .. } => {}
        }
        out
    }
}

/// One IR node: kind plus optional location and advisory type.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    #[serde(flatten)]
    pub kind: NodeKind,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub loc: Option<Loc>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub ty: Option<TypeDesc>,
}

/// Dense `id → node` storage. Ids are assigned monotonically by the
/// [`crate::Builder`], so the backing vector doubles as the map.
#[derive(Clone, PartialEq, Debug, Default)]
pub struct NodeMap {
    nodes: Vec<Node>,
}

impl NodeMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a node. Returns `None` for `INVALID` or out-of-range ids,
    /// so validation never panics on a dangling reference.
    #[inline]
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        if id.is_valid() {
            self.nodes.get(id.index())
        } else {
            None
        }
    }

    /// Look up a node's kind.
    #[inline]
    pub fn kind(&self, id: NodeId) -> Option<&NodeKind> {
        self.get(id).map(|node| &node.kind)
    }

    #[inline]
    pub(crate) fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        if id.is_valid() {
            self.nodes.get_mut(id.index())
        } else {
            None
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterate all nodes in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    /// Append a node. Only the builder calls this; the node's id must equal
    /// the current length.
    pub(crate) fn push(&mut self, node: Node) {
        debug_assert_eq!(node.id.index(), self.nodes.len(), "non-monotonic node id");
        self.nodes.push(node);
    }

    pub(crate) fn from_nodes(nodes: Vec<Node>) -> Self {
        NodeMap { nodes }
    }
}

/// The product of lowering: the node map plus the root `Program` id.
///
/// Serializes as `{ "nodes": { "node_0": … }, "rootId": "node_…" }`;
/// pipeline diagnostics travel alongside in the transpile result.
#[derive(Clone, PartialEq, Debug, Default, Serialize, Deserialize)]
pub struct CompilationUnit {
    pub nodes: NodeMap,
    #[serde(rename = "rootId")]
    pub root: NodeId,
}

impl CompilationUnit {
    /// Node count, reported in pipeline stats.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}
