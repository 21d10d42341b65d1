//! AST and IR types for the LuaScript compiler.
//!
//! This crate owns the two tree representations the pipeline moves through:
//!
//! - [`ast`], the ESTree-shaped syntax tree produced by the parser.
//! - [`NodeKind`] and friends, the canonical IR produced by lowering and
//!   consumed by the emitter, stored as a flat `id → node` map.
//!
//! IR nodes are created exclusively through the [`Builder`], which owns the
//! monotonic node counter and the temporary-name counters used by lowering.

pub mod ast;
mod builder;
mod line_map;
mod node;
mod span;

pub use builder::Builder;
pub use line_map::{LineMap, Loc};
pub use node::{
    BinOp, CompilationUnit, DeclKind, LitValue, LogOp, MemberProp, Node, NodeId, NodeMap,
    NodeKind, PrimitiveType, PropKey, TypeDesc, UnOp,
};
pub use span::Span;
