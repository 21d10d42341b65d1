//! Post-lowering IR validation.
//!
//! Walks the finalized node map and enforces the structural invariants the
//! emitter relies on. Validation never rewrites nodes; each violation
//! produces an `IrValidation` diagnostic naming the offending node. These
//! diagnostics indicate lowering bugs, so the pipeline treats them as
//! fatal regardless of strict mode.

use ls_diagnostic::{Diagnostic, ErrorCode};
use ls_ir::{CompilationUnit, NodeId, NodeKind, TypeDesc};
use rustc_hash::FxHashSet;

/// Validate a compilation unit, returning every violation found.
pub fn validate_unit(unit: &CompilationUnit) -> Vec<Diagnostic> {
    let mut validator = Validator {
        unit,
        diagnostics: Vec::new(),
    };
    validator.check_root();
    validator.check_nodes();
    validator.check_optional_boundaries();
    validator.check_context();
    validator.diagnostics
}

struct Validator<'a> {
    unit: &'a CompilationUnit,
    diagnostics: Vec<Diagnostic>,
}

/// Function context for the yield check.
#[derive(Copy, Clone, Eq, PartialEq)]
enum FnCtx {
    Top,
    Normal,
    Generator,
    Async,
}

#[derive(Copy, Clone)]
struct Ctx {
    fn_ctx: FnCtx,
    loop_depth: u32,
}

impl Validator<'_> {
    fn report(&mut self, id: NodeId, message: impl Into<String>) {
        self.diagnostics
            .push(Diagnostic::error(ErrorCode::IrValidation, message).with_node(id));
    }

    fn kind(&self, id: NodeId) -> Option<&NodeKind> {
        self.unit.nodes.kind(id)
    }

    fn check_root(&mut self) {
        if self.unit.nodes.is_empty() {
            return;
        }
        match self.kind(self.unit.root) {
            Some(NodeKind::Program { .. }) => {}
            Some(other) => {
                let name = other.name();
                self.report(
                    self.unit.root,
                    format!("root must be a Program, found {name}"),
                );
            }
            None => self.report(self.unit.root, "root id does not resolve to a node"),
        }
    }

    /// Per-node structural checks: dangling references, program body
    /// membership, pattern positions, literal type tags.
    fn check_nodes(&mut self) {
        let mut work = Vec::new();
        for node in self.unit.nodes.iter() {
            for child in node.kind.children() {
                if self.unit.nodes.get(child).is_none() {
                    work.push((node.id, format!("reference to missing node {child}")));
                }
            }

            if let NodeKind::Program { body } = &node.kind {
                for &item in body {
                    if let Some(kind) = self.kind(item) {
                        if !kind.is_program_item() {
                            work.push((
                                item,
                                format!("{} is not valid in Program body", kind.name()),
                            ));
                        }
                    }
                }
            }

            if let NodeKind::Literal { value } = &node.kind {
                let expected = value.type_tag();
                let tagged = matches!(
                    node.ty,
                    Some(TypeDesc::Primitive { name }) if name == expected
                );
                if !tagged {
                    work.push((node.id, "literal without a concrete type tag".to_string()));
                }
            }

            let allowed = pattern_slots(&node.kind);
            for child in node.kind.children() {
                if let Some(kind) = self.kind(child) {
                    if kind.is_pattern() && !allowed.contains(&child) {
                        work.push((
                            child,
                            format!(
                                "{} appears outside a binding position (parent {})",
                                kind.name(),
                                node.kind.name()
                            ),
                        ));
                    }
                }
            }
        }
        for (id, message) in work {
            self.report(id, message);
        }
    }

    /// An optional chain is closed: the outermost optional node carries the
    /// short-circuit boundary, inner ones do not.
    fn check_optional_boundaries(&mut self) {
        let mut inner: FxHashSet<NodeId> = FxHashSet::default();
        for node in self.unit.nodes.iter() {
            if let NodeKind::OptionalMember { object, .. } = &node.kind {
                if self.is_optional(*object) {
                    inner.insert(*object);
                }
            }
        }
        let mut work = Vec::new();
        for node in self.unit.nodes.iter() {
            let NodeKind::OptionalMember { boundary, .. } = &node.kind else {
                continue;
            };
            let is_inner = inner.contains(&node.id);
            if is_inner && *boundary {
                work.push((node.id, "inner optional node marked as chain boundary"));
            }
            if !is_inner && !*boundary {
                work.push((node.id, "outermost optional node missing chain boundary"));
            }
        }
        for (id, message) in work {
            self.report(id, message.to_string());
        }
    }

    fn is_optional(&self, id: NodeId) -> bool {
        matches!(self.kind(id), Some(NodeKind::OptionalMember { .. }))
    }

    /// Context-sensitive checks walked from the root: yield inside a
    /// generator-marked function, break inside a loop.
    fn check_context(&mut self) {
        let root = self.unit.root;
        if self.kind(root).is_none() {
            return;
        }
        let mut stack: Vec<(NodeId, Ctx)> = vec![(
            root,
            Ctx {
                fn_ctx: FnCtx::Top,
                loop_depth: 0,
            },
        )];
        // Guards against cycles in hand-built graphs.
        let mut visited: FxHashSet<NodeId> = FxHashSet::default();

        while let Some((id, ctx)) = stack.pop() {
            if !visited.insert(id) {
                continue;
            }
            let Some(kind) = self.kind(id).cloned() else {
                continue;
            };
            match &kind {
                NodeKind::YieldExpr { .. } => {
                    if ctx.fn_ctx != FnCtx::Generator {
                        self.report(id, "yield outside a generator function");
                    }
                }
                NodeKind::Break => {
                    if ctx.loop_depth == 0 {
                        self.report(id, "break outside a loop");
                    }
                }
                _ => {}
            }

            match &kind {
                NodeKind::FunctionDecl {
                    params,
                    body,
                    is_generator,
                    is_async,
                    ..
                }
                | NodeKind::FunctionExpr {
                    params,
                    body,
                    is_generator,
                    is_async,
                    ..
                } => {
                    let inner = Ctx {
                        fn_ctx: function_ctx(*is_generator, *is_async),
                        loop_depth: 0,
                    };
                    for &param in params {
                        stack.push((param, inner));
                    }
                    stack.push((*body, inner));
                }
                NodeKind::Arrow {
                    params,
                    body,
                    is_async,
                } => {
                    let inner = Ctx {
                        fn_ctx: function_ctx(false, *is_async),
                        loop_depth: 0,
                    };
                    for &param in params {
                        stack.push((param, inner));
                    }
                    stack.push((*body, inner));
                }
                NodeKind::While { test, body } => {
                    stack.push((*test, ctx));
                    stack.push((
                        *body,
                        Ctx {
                            loop_depth: ctx.loop_depth + 1,
                            ..ctx
                        },
                    ));
                }
                NodeKind::DoWhile { body, test } => {
                    stack.push((*test, ctx));
                    stack.push((
                        *body,
                        Ctx {
                            loop_depth: ctx.loop_depth + 1,
                            ..ctx
                        },
                    ));
                }
                other => {
                    for child in other.children() {
                        stack.push((child, ctx));
                    }
                }
            }
        }
    }
}

fn function_ctx(is_generator: bool, is_async: bool) -> FnCtx {
    if is_generator {
        FnCtx::Generator
    } else if is_async {
        FnCtx::Async
    } else {
        FnCtx::Normal
    }
}

/// Child slots where pattern nodes are legal for a given parent.
fn pattern_slots(kind: &NodeKind) -> Vec<NodeId> {
    match kind {
        NodeKind::VarDecl { binder, .. } => vec![*binder],
        NodeKind::ParamDecl { binding, .. } => vec![*binding],
        NodeKind::Assignment { target, .. } => vec![*target],
        NodeKind::ArrayPattern { elements, .. } => elements.clone(),
        _ => Vec::new(),
    }
}
