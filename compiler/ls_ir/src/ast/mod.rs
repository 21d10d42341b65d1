//! ESTree-shaped syntax tree for the LuaScript surface language.
//!
//! Produced by `ls_parse`, consumed by `ls_lower`. Every node carries a byte
//! [`Span`]; the lowerer translates spans to line/column locations on IR
//! nodes. The shapes follow the ESTree vocabulary (Program, declarations,
//! statements, expressions, patterns) restricted to the supported subset.

mod ops;

pub use ops::{AssignOp, BinaryOp, LogicalOp, UnaryOp, UpdateOp};

use crate::Span;

/// Parsing dialect. `Module` permits top-level `await` (as a warning path);
/// `Script` treats it as an error.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
pub enum Dialect {
    #[default]
    Script,
    Module,
}

/// Declaration keyword for variable statements and `for`/`for-of` bindings.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeclKind {
    Let,
    Const,
    Var,
}

/// A complete parsed source file.
#[derive(Clone, Debug, PartialEq)]
pub struct Program {
    pub body: Vec<Stmt>,
    pub span: Span,
}

/// Shared shape for function declarations, function expressions, arrows,
/// and class methods.
#[derive(Clone, Debug, PartialEq)]
pub struct Function {
    pub name: Option<String>,
    pub params: Vec<Pattern>,
    pub body: FunctionBody,
    pub is_async: bool,
    pub is_generator: bool,
    pub span: Span,
}

/// Arrows may have a bare expression body; everything else uses a block.
#[derive(Clone, Debug, PartialEq)]
pub enum FunctionBody {
    Block(Vec<Stmt>),
    Expression(Box<Expr>),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq)]
pub enum StmtKind {
    VarDecl {
        kind: DeclKind,
        declarators: Vec<Declarator>,
    },
    FunctionDecl(Box<Function>),
    ClassDecl(Box<Class>),
    Block(Vec<Stmt>),
    If {
        test: Box<Expr>,
        consequent: Box<Stmt>,
        alternate: Option<Box<Stmt>>,
    },
    While {
        test: Box<Expr>,
        body: Box<Stmt>,
    },
    DoWhile {
        body: Box<Stmt>,
        test: Box<Expr>,
    },
    For {
        init: Option<ForInit>,
        test: Option<Box<Expr>>,
        update: Option<Box<Expr>>,
        body: Box<Stmt>,
    },
    ForOf {
        decl_kind: Option<DeclKind>,
        binding: Pattern,
        iterable: Box<Expr>,
        body: Box<Stmt>,
    },
    Return(Option<Box<Expr>>),
    Break,
    Continue,
    Throw(Box<Expr>),
    Try {
        block: Vec<Stmt>,
        handler: Option<CatchClause>,
        finalizer: Option<Vec<Stmt>>,
    },
    Switch {
        discriminant: Box<Expr>,
        cases: Vec<SwitchCase>,
    },
    Expression(Box<Expr>),
    Empty,
}

/// One `pattern = init` element of a variable statement.
#[derive(Clone, Debug, PartialEq)]
pub struct Declarator {
    pub pattern: Pattern,
    pub init: Option<Expr>,
    pub span: Span,
}

/// C-style `for` initializer: a declaration or a bare expression.
#[derive(Clone, Debug, PartialEq)]
pub enum ForInit {
    VarDecl {
        kind: DeclKind,
        declarators: Vec<Declarator>,
    },
    Expr(Box<Expr>),
}

#[derive(Clone, Debug, PartialEq)]
pub struct CatchClause {
    pub param: Option<Pattern>,
    pub body: Vec<Stmt>,
    pub span: Span,
}

/// A `case test:` or `default:` arm. `test` is `None` for `default`.
#[derive(Clone, Debug, PartialEq)]
pub struct SwitchCase {
    pub test: Option<Expr>,
    pub body: Vec<Stmt>,
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Class {
    pub name: Option<String>,
    pub superclass: Option<Box<Expr>>,
    pub members: Vec<ClassMember>,
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ClassMember {
    pub key: PropertyKey,
    pub function: Function,
    pub is_static: bool,
    pub is_constructor: bool,
    pub span: Span,
}

/// Property key in object literals, object patterns, and class bodies.
#[derive(Clone, Debug, PartialEq)]
pub enum PropertyKey {
    Ident(String),
    Str(String),
    Num { value: f64, raw: String },
    Computed(Box<Expr>),
}

impl PropertyKey {
    /// Static name of this key, when it has one.
    pub fn static_name(&self) -> Option<&str> {
        match self {
            PropertyKey::Ident(name) | PropertyKey::Str(name) => Some(name),
            PropertyKey::Num { .. } | PropertyKey::Computed(_) => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ExprKind {
    Number {
        value: f64,
        raw: String,
    },
    Str(String),
    Bool(bool),
    Null,
    Template {
        quasis: Vec<TemplateElement>,
        expressions: Vec<Expr>,
    },
    Ident(String),
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Logical {
        op: LogicalOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        argument: Box<Expr>,
    },
    Update {
        op: UpdateOp,
        prefix: bool,
        argument: Box<Expr>,
    },
    Assign {
        op: AssignOp,
        target: AssignTarget,
        value: Box<Expr>,
    },
    Conditional {
        test: Box<Expr>,
        consequent: Box<Expr>,
        alternate: Box<Expr>,
    },
    Call {
        callee: Box<Expr>,
        arguments: Vec<Expr>,
        /// `?.()`: short-circuits when the callee is nullish.
        optional: bool,
    },
    New {
        callee: Box<Expr>,
        arguments: Vec<Expr>,
    },
    Member {
        object: Box<Expr>,
        property: MemberKey,
        /// `?.`: short-circuits when the object is nullish.
        optional: bool,
    },
    Array(Vec<Option<Expr>>),
    Object(Vec<ObjectMember>),
    Spread(Box<Expr>),
    Function(Box<Function>),
    Arrow(Box<Function>),
    Class(Box<Class>),
    This,
    Super,
    Sequence(Vec<Expr>),
    Yield {
        argument: Option<Box<Expr>>,
        delegate: bool,
    },
    Await(Box<Expr>),
}

/// Member access: `.name` or `[expr]`.
#[derive(Clone, Debug, PartialEq)]
pub enum MemberKey {
    Named(String),
    Computed(Box<Expr>),
}

/// Left side of an assignment: a plain target expression, or a
/// destructuring pattern reinterpreted from an array/object literal.
#[derive(Clone, Debug, PartialEq)]
pub enum AssignTarget {
    Expr(Box<Expr>),
    Pattern(Box<Pattern>),
}

/// Object-literal member: a property or a spread.
#[derive(Clone, Debug, PartialEq)]
pub enum ObjectMember {
    Property {
        key: PropertyKey,
        value: Expr,
        shorthand: bool,
        computed: bool,
        /// Method shorthand `{ m() {} }`: binds the receiver.
        is_method: bool,
        span: Span,
    },
    Spread {
        argument: Expr,
        span: Span,
    },
}

/// Template literal chunk between interpolations.
#[derive(Clone, Debug, PartialEq)]
pub struct TemplateElement {
    /// Escape-processed text.
    pub cooked: String,
    /// Verbatim source text.
    pub raw: String,
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Pattern {
    pub kind: PatternKind,
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq)]
pub enum PatternKind {
    Ident(String),
    Array {
        /// `None` entries are elisions: `[a, , b]`.
        elements: Vec<Option<Pattern>>,
    },
    Object {
        properties: Vec<PatternProperty>,
        rest: Option<Box<Pattern>>,
    },
    Rest(Box<Pattern>),
    Default {
        target: Box<Pattern>,
        value: Box<Expr>,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub struct PatternProperty {
    pub key: PropertyKey,
    pub value: Pattern,
    pub shorthand: bool,
    pub computed: bool,
    pub span: Span,
}

impl Pattern {
    /// The plain identifier bound by this pattern, when it is one.
    pub fn as_ident(&self) -> Option<&str> {
        match &self.kind {
            PatternKind::Ident(name) => Some(name),
            _ => None,
        }
    }
}
