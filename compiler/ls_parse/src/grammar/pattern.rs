//! Binding patterns and expression-to-pattern reinterpretation.
//!
//! Destructuring assignment targets parse as array/object literals first
//! (the grammar cannot know earlier), then get reinterpreted here when an
//! `=` follows.

use super::Parser;
use crate::ParseError;
use ls_ir::ast::{
    AssignOp, AssignTarget, Expr, ExprKind, ObjectMember, Pattern, PatternKind, PatternProperty,
};
use ls_ir::Span;
use ls_lexer::TokenKind;

impl Parser<'_> {
    /// Binding pattern without default: identifier, array, or object form.
    pub(crate) fn parse_binding_pattern(&mut self) -> Result<Pattern, ParseError> {
        let start = self.cursor.span();
        match self.cursor.kind() {
            TokenKind::Ident(_) => {
                let (name, span) = self.expect_ident("binding name")?;
                Ok(Pattern {
                    kind: PatternKind::Ident(name),
                    span,
                })
            }
            TokenKind::LBracket => self.parse_array_pattern(start),
            TokenKind::LBrace => self.parse_object_pattern(start),
            other => Err(self.error_here(format!(
                "expected binding pattern, found {}",
                other.describe()
            ))),
        }
    }

    /// Binding element: pattern with optional rest marker and default.
    /// Used for parameters and array pattern elements.
    pub(crate) fn parse_binding_element(&mut self) -> Result<Pattern, ParseError> {
        let start = self.cursor.span();
        if self.cursor.eat(&TokenKind::DotDotDot) {
            let inner = self.parse_binding_pattern()?;
            return Ok(Pattern {
                kind: PatternKind::Rest(Box::new(inner)),
                span: start.merge(self.cursor.prev_span()),
            });
        }
        let pattern = self.parse_binding_pattern()?;
        if self.cursor.eat(&TokenKind::Eq) {
            let value = self.parse_assignment()?;
            return Ok(Pattern {
                kind: PatternKind::Default {
                    target: Box::new(pattern),
                    value: Box::new(value),
                },
                span: start.merge(self.cursor.prev_span()),
            });
        }
        Ok(pattern)
    }

    fn parse_array_pattern(&mut self, start: Span) -> Result<Pattern, ParseError> {
        self.expect(&TokenKind::LBracket, "`[`")?;
        let mut elements = Vec::new();
        loop {
            if self.cursor.at(&TokenKind::RBracket) {
                break;
            }
            if self.cursor.at_eof() {
                return Err(self.error_here("unexpected end of input in array pattern"));
            }
            if self.cursor.eat(&TokenKind::Comma) {
                elements.push(None);
                continue;
            }
            let element = self.parse_binding_element()?;
            let is_rest = matches!(element.kind, PatternKind::Rest(_));
            elements.push(Some(element));
            if is_rest && !self.cursor.at(&TokenKind::RBracket) {
                return Err(self.error_here("rest element must be last in an array pattern"));
            }
            if !self.cursor.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::RBracket, "`]`")?;
        Ok(Pattern {
            kind: PatternKind::Array { elements },
            span: start.merge(self.cursor.prev_span()),
        })
    }

    fn parse_object_pattern(&mut self, start: Span) -> Result<Pattern, ParseError> {
        self.expect(&TokenKind::LBrace, "`{`")?;
        let mut properties = Vec::new();
        let mut rest = None;
        while !self.cursor.at(&TokenKind::RBrace) {
            if self.cursor.at_eof() {
                return Err(self.error_here("unexpected end of input in object pattern"));
            }
            if self.cursor.eat(&TokenKind::DotDotDot) {
                let inner = self.parse_binding_pattern()?;
                if !matches!(inner.kind, PatternKind::Ident(_)) {
                    return Err(self.error(
                        "object rest must bind a plain identifier",
                        inner.span,
                    ));
                }
                if !self.cursor.at(&TokenKind::RBrace) {
                    return Err(self.error_here("rest element must be last in an object pattern"));
                }
                rest = Some(Box::new(inner));
                break;
            }

            let prop_start = self.cursor.span();
            let computed = self.cursor.at(&TokenKind::LBracket);
            let key = self.parse_property_key()?;
            let (value, shorthand) = if self.cursor.eat(&TokenKind::Colon) {
                (self.parse_binding_element_no_rest()?, false)
            } else {
                let name = match key.static_name() {
                    Some(name) if !computed => name.to_string(),
                    _ => {
                        return Err(self.error_here(
                            "computed object pattern keys need `: binding`",
                        ))
                    }
                };
                let base = Pattern {
                    kind: PatternKind::Ident(name),
                    span: prop_start,
                };
                if self.cursor.eat(&TokenKind::Eq) {
                    let default = self.parse_assignment()?;
                    (
                        Pattern {
                            kind: PatternKind::Default {
                                target: Box::new(base),
                                value: Box::new(default),
                            },
                            span: prop_start.merge(self.cursor.prev_span()),
                        },
                        true,
                    )
                } else {
                    (base, true)
                }
            };
            properties.push(PatternProperty {
                key,
                value,
                shorthand,
                computed,
                span: prop_start.merge(self.cursor.prev_span()),
            });
            if !self.cursor.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::RBrace, "`}`")?;
        Ok(Pattern {
            kind: PatternKind::Object { properties, rest },
            span: start.merge(self.cursor.prev_span()),
        })
    }

    /// Pattern with optional default, but no rest (object property values).
    fn parse_binding_element_no_rest(&mut self) -> Result<Pattern, ParseError> {
        let start = self.cursor.span();
        let pattern = self.parse_binding_pattern()?;
        if self.cursor.eat(&TokenKind::Eq) {
            let value = self.parse_assignment()?;
            return Ok(Pattern {
                kind: PatternKind::Default {
                    target: Box::new(pattern),
                    value: Box::new(value),
                },
                span: start.merge(self.cursor.prev_span()),
            });
        }
        Ok(pattern)
    }

    // Reinterpretation

    /// Reinterpret a parsed expression as a binding pattern
    /// (`for (x of …)` heads, destructuring assignment).
    pub(crate) fn expr_to_pattern(&self, expression: Expr) -> Result<Pattern, ParseError> {
        let span = expression.span;
        let kind = match expression.kind {
            ExprKind::Ident(name) => PatternKind::Ident(name),
            ExprKind::Array(elements) => {
                let mut out = Vec::with_capacity(elements.len());
                let count = elements.len();
                for (index, element) in elements.into_iter().enumerate() {
                    match element {
                        None => out.push(None),
                        Some(Expr {
                            kind: ExprKind::Spread(inner),
                            span: spread_span,
                        }) => {
                            if index + 1 != count {
                                return Err(self.error(
                                    "rest element must be last in an array pattern",
                                    spread_span,
                                ));
                            }
                            let inner = self.expr_to_pattern(*inner)?;
                            out.push(Some(Pattern {
                                kind: PatternKind::Rest(Box::new(inner)),
                                span: spread_span,
                            }));
                        }
                        Some(element) => out.push(Some(self.expr_to_element_pattern(element)?)),
                    }
                }
                PatternKind::Array { elements: out }
            }
            ExprKind::Object(members) => {
                let mut properties = Vec::new();
                let mut rest = None;
                let count = members.len();
                for (index, member) in members.into_iter().enumerate() {
                    match member {
                        ObjectMember::Spread {
                            argument,
                            span: spread_span,
                        } => {
                            if index + 1 != count {
                                return Err(self.error(
                                    "rest element must be last in an object pattern",
                                    spread_span,
                                ));
                            }
                            let inner = self.expr_to_pattern(argument)?;
                            if !matches!(inner.kind, PatternKind::Ident(_)) {
                                return Err(self.error(
                                    "object rest must bind a plain identifier",
                                    spread_span,
                                ));
                            }
                            rest = Some(Box::new(inner));
                        }
                        ObjectMember::Property {
                            key,
                            value,
                            shorthand,
                            computed,
                            span: prop_span,
                            ..
                        } => {
                            let value = self.expr_to_element_pattern(value)?;
                            properties.push(PatternProperty {
                                key,
                                value,
                                shorthand,
                                computed,
                                span: prop_span,
                            });
                        }
                    }
                }
                PatternKind::Object { properties, rest }
            }
            _ => {
                return Err(self.error(
                    "invalid destructuring target; expected identifier, array, or object",
                    span,
                ))
            }
        };
        Ok(Pattern { kind, span })
    }

    /// Element position: defaults show up as `=` assignments.
    fn expr_to_element_pattern(&self, expression: Expr) -> Result<Pattern, ParseError> {
        if let ExprKind::Assign {
            op: AssignOp::Assign,
            target: AssignTarget::Expr(target),
            value,
        } = expression.kind
        {
            let span = expression.span;
            let target = self.expr_to_pattern(*target)?;
            return Ok(Pattern {
                kind: PatternKind::Default {
                    target: Box::new(target),
                    value,
                },
                span,
            });
        }
        self.expr_to_pattern(expression)
    }

    /// Classify the left side of an assignment.
    pub(crate) fn expr_to_assign_target(
        &self,
        left: Expr,
        op: AssignOp,
    ) -> Result<AssignTarget, ParseError> {
        match &left.kind {
            ExprKind::Array(_) | ExprKind::Object(_) => {
                if op != AssignOp::Assign {
                    return Err(self.error(
                        "destructuring works only with plain `=` assignment",
                        left.span,
                    ));
                }
                let pattern = self.expr_to_pattern(left)?;
                Ok(AssignTarget::Pattern(Box::new(pattern)))
            }
            ExprKind::Ident(_) => Ok(AssignTarget::Expr(Box::new(left))),
            ExprKind::Member { optional, .. } => {
                if *optional {
                    return Err(self.error(
                        "optional member access is not a valid assignment target",
                        left.span,
                    ));
                }
                Ok(AssignTarget::Expr(Box::new(left)))
            }
            _ => Err(self.error("invalid assignment target", left.span)),
        }
    }
}
