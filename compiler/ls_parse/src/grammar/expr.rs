//! Expression grammar.
//!
//! Entry point is `parse_expression` (comma sequences) over
//! `parse_assignment`, then the usual precedence chain down to primaries.
//! Arrow functions are recognized by speculative parsing: save the cursor,
//! try a parameter list, and commit only when `=>` follows.

use super::{KeywordText, Parser};
use crate::ParseError;
use ls_ir::ast::{
    AssignOp, BinaryOp, Expr, ExprKind, Function, FunctionBody, LogicalOp, MemberKey,
    ObjectMember, Pattern, PatternKind, TemplateElement, UnaryOp, UpdateOp,
};
use ls_ir::Span;
use ls_lexer::{split_template, TemplatePart, TokenKind};

fn expr(kind: ExprKind, span: Span) -> Expr {
    Expr { kind, span }
}

impl Parser<'_> {
    // Entry points

    /// Full expression, including comma sequences.
    pub(crate) fn parse_expression(&mut self) -> Result<Expr, ParseError> {
        let start = self.cursor.span();
        let first = self.parse_assignment()?;
        if !self.cursor.at(&TokenKind::Comma) {
            return Ok(first);
        }
        let mut expressions = vec![first];
        while self.cursor.eat(&TokenKind::Comma) {
            expressions.push(self.parse_assignment()?);
        }
        Ok(expr(
            ExprKind::Sequence(expressions),
            start.merge(self.cursor.prev_span()),
        ))
    }

    /// Assignment expression (no commas).
    pub(crate) fn parse_assignment(&mut self) -> Result<Expr, ParseError> {
        let guard = self.enter_expr()?;
        let result = self.parse_assignment_inner();
        self.exit_expr(guard);
        result
    }

    fn parse_assignment_inner(&mut self) -> Result<Expr, ParseError> {
        let start = self.cursor.span();

        if let Some(arrow) = self.try_parse_arrow()? {
            return Ok(arrow);
        }
        if self.cursor.at(&TokenKind::Yield) {
            return self.parse_yield(start);
        }

        let left = self.parse_conditional()?;
        let op = match self.cursor.kind() {
            TokenKind::Eq => AssignOp::Assign,
            TokenKind::PlusEq => AssignOp::Add,
            TokenKind::MinusEq => AssignOp::Sub,
            TokenKind::StarEq => AssignOp::Mul,
            TokenKind::SlashEq => AssignOp::Div,
            TokenKind::PercentEq => AssignOp::Mod,
            TokenKind::StarStarEq => AssignOp::Pow,
            TokenKind::ShlEq => AssignOp::Shl,
            TokenKind::ShrEq => AssignOp::Shr,
            TokenKind::AmpEq => AssignOp::BitAnd,
            TokenKind::PipeEq => AssignOp::BitOr,
            TokenKind::CaretEq => AssignOp::BitXor,
            TokenKind::AndAndEq => AssignOp::And,
            TokenKind::OrOrEq => AssignOp::Or,
            TokenKind::QuestionQuestionEq => AssignOp::Nullish,
            _ => return Ok(left),
        };
        self.cursor.advance();
        let target = self.expr_to_assign_target(left, op)?;
        let value = self.parse_assignment()?;
        Ok(expr(
            ExprKind::Assign {
                op,
                target,
                value: Box::new(value),
            },
            start.merge(self.cursor.prev_span()),
        ))
    }

    // Arrows

    /// Recognize an arrow function head, or return `None` leaving the
    /// cursor untouched.
    fn try_parse_arrow(&mut self) -> Result<Option<Expr>, ParseError> {
        let start = self.cursor.span();

        // `x => …`
        if self.cursor.at_ident().is_some()
            && matches!(self.cursor.peek(1), TokenKind::Arrow)
            && !self.cursor.kind().is_ident("async")
        {
            let (name, name_span) = self.expect_ident("parameter")?;
            let params = vec![Pattern {
                kind: PatternKind::Ident(name),
                span: name_span,
            }];
            return Ok(Some(self.parse_arrow_tail(start, params, false)?));
        }

        // `async x => …`
        if self.cursor.kind().is_ident("async")
            && matches!(self.cursor.peek(1), TokenKind::Ident(_))
            && matches!(self.cursor.peek(2), TokenKind::Arrow)
        {
            self.cursor.advance();
            let (name, name_span) = self.expect_ident("parameter")?;
            let params = vec![Pattern {
                kind: PatternKind::Ident(name),
                span: name_span,
            }];
            return Ok(Some(self.parse_arrow_tail(start, params, true)?));
        }

        // `(…) => …` and `async (…) => …`: speculative.
        let is_async_paren =
            self.cursor.kind().is_ident("async") && matches!(self.cursor.peek(1), TokenKind::LParen);
        if self.cursor.at(&TokenKind::LParen) || is_async_paren {
            let snapshot = self.cursor.position();
            if is_async_paren {
                self.cursor.advance();
            }
            match self.parse_param_list() {
                Ok(params) if self.cursor.at(&TokenKind::Arrow) => {
                    return Ok(Some(self.parse_arrow_tail(start, params, is_async_paren)?));
                }
                _ => self.cursor.set_position(snapshot),
            }
        }

        Ok(None)
    }

    fn parse_arrow_tail(
        &mut self,
        start: Span,
        params: Vec<Pattern>,
        is_async: bool,
    ) -> Result<Expr, ParseError> {
        if self.cursor.newline_before() {
            return Err(self.error_here("`=>` must stay on the same line as its parameters"));
        }
        self.expect(&TokenKind::Arrow, "`=>`")?;
        let body = if self.cursor.at(&TokenKind::LBrace) {
            FunctionBody::Block(self.parse_block()?)
        } else {
            FunctionBody::Expression(Box::new(self.parse_assignment()?))
        };
        let span = start.merge(self.cursor.prev_span());
        Ok(expr(
            ExprKind::Arrow(Box::new(Function {
                name: None,
                params,
                body,
                is_async,
                is_generator: false,
                span,
            })),
            span,
        ))
    }

    // Yield

    fn parse_yield(&mut self, start: Span) -> Result<Expr, ParseError> {
        self.cursor.advance();
        let delegate = self.cursor.eat(&TokenKind::Star);
        let argument = if self.yield_argument_follows() {
            Some(Box::new(self.parse_assignment()?))
        } else if delegate {
            return Err(self.error_here("`yield*` needs a delegate expression"));
        } else {
            None
        };
        Ok(expr(
            ExprKind::Yield { argument, delegate },
            start.merge(self.cursor.prev_span()),
        ))
    }

    fn yield_argument_follows(&self) -> bool {
        if self.cursor.newline_before() {
            return false;
        }
        !matches!(
            self.cursor.kind(),
            TokenKind::Semicolon
                | TokenKind::RParen
                | TokenKind::RBracket
                | TokenKind::RBrace
                | TokenKind::Comma
                | TokenKind::Colon
                | TokenKind::Eof
        )
    }

    // Precedence chain

    fn parse_conditional(&mut self) -> Result<Expr, ParseError> {
        let start = self.cursor.span();
        let test = self.parse_nullish()?;
        if !self.cursor.eat(&TokenKind::Question) {
            return Ok(test);
        }
        let consequent = self.parse_assignment()?;
        self.expect(&TokenKind::Colon, "`:` in conditional expression")?;
        let alternate = self.parse_assignment()?;
        Ok(expr(
            ExprKind::Conditional {
                test: Box::new(test),
                consequent: Box::new(consequent),
                alternate: Box::new(alternate),
            },
            start.merge(self.cursor.prev_span()),
        ))
    }

    fn parse_logical_level(
        &mut self,
        next: fn(&mut Self) -> Result<Expr, ParseError>,
        token: &TokenKind,
        op: LogicalOp,
    ) -> Result<Expr, ParseError> {
        let start = self.cursor.span();
        let mut left = next(self)?;
        while self.cursor.eat(token) {
            let right = next(self)?;
            left = expr(
                ExprKind::Logical {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                start.merge(self.cursor.prev_span()),
            );
        }
        Ok(left)
    }

    fn parse_nullish(&mut self) -> Result<Expr, ParseError> {
        self.parse_logical_level(
            Self::parse_or,
            &TokenKind::QuestionQuestion,
            LogicalOp::Nullish,
        )
    }

    fn parse_or(&mut self) -> Result<Expr, ParseError> {
        self.parse_logical_level(Self::parse_and, &TokenKind::OrOr, LogicalOp::Or)
    }

    fn parse_and(&mut self) -> Result<Expr, ParseError> {
        self.parse_logical_level(Self::parse_bit_or, &TokenKind::AndAnd, LogicalOp::And)
    }

    fn parse_binary_level(
        &mut self,
        next: fn(&mut Self) -> Result<Expr, ParseError>,
        map: fn(&TokenKind) -> Option<BinaryOp>,
    ) -> Result<Expr, ParseError> {
        let start = self.cursor.span();
        let mut left = next(self)?;
        while let Some(op) = map(self.cursor.kind()) {
            self.cursor.advance();
            let right = next(self)?;
            left = expr(
                ExprKind::Binary {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                start.merge(self.cursor.prev_span()),
            );
        }
        Ok(left)
    }

    fn parse_bit_or(&mut self) -> Result<Expr, ParseError> {
        self.parse_binary_level(Self::parse_bit_xor, |k| {
            matches!(k, TokenKind::Pipe).then_some(BinaryOp::BitOr)
        })
    }

    fn parse_bit_xor(&mut self) -> Result<Expr, ParseError> {
        self.parse_binary_level(Self::parse_bit_and, |k| {
            matches!(k, TokenKind::Caret).then_some(BinaryOp::BitXor)
        })
    }

    fn parse_bit_and(&mut self) -> Result<Expr, ParseError> {
        self.parse_binary_level(Self::parse_equality, |k| {
            matches!(k, TokenKind::Amp).then_some(BinaryOp::BitAnd)
        })
    }

    fn parse_equality(&mut self) -> Result<Expr, ParseError> {
        self.parse_binary_level(Self::parse_relational, |k| match k {
            TokenKind::EqEqEq => Some(BinaryOp::StrictEq),
            TokenKind::NotEqEq => Some(BinaryOp::StrictNotEq),
            TokenKind::EqEq => Some(BinaryOp::Eq),
            TokenKind::NotEq => Some(BinaryOp::NotEq),
            _ => None,
        })
    }

    fn parse_relational(&mut self) -> Result<Expr, ParseError> {
        self.parse_binary_level(Self::parse_shift, |k| match k {
            TokenKind::Lt => Some(BinaryOp::Lt),
            TokenKind::LtEq => Some(BinaryOp::LtEq),
            TokenKind::Gt => Some(BinaryOp::Gt),
            TokenKind::GtEq => Some(BinaryOp::GtEq),
            TokenKind::In => Some(BinaryOp::In),
            TokenKind::Instanceof => Some(BinaryOp::Instanceof),
            _ => None,
        })
    }

    fn parse_shift(&mut self) -> Result<Expr, ParseError> {
        self.parse_binary_level(Self::parse_additive, |k| match k {
            TokenKind::Shl => Some(BinaryOp::Shl),
            TokenKind::Shr => Some(BinaryOp::Shr),
            TokenKind::UShr => Some(BinaryOp::UShr),
            _ => None,
        })
    }

    fn parse_additive(&mut self) -> Result<Expr, ParseError> {
        self.parse_binary_level(Self::parse_multiplicative, |k| match k {
            TokenKind::Plus => Some(BinaryOp::Add),
            TokenKind::Minus => Some(BinaryOp::Sub),
            _ => None,
        })
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, ParseError> {
        self.parse_binary_level(Self::parse_exponent, |k| match k {
            TokenKind::Star => Some(BinaryOp::Mul),
            TokenKind::Slash => Some(BinaryOp::Div),
            TokenKind::Percent => Some(BinaryOp::Mod),
            _ => None,
        })
    }

    fn parse_exponent(&mut self) -> Result<Expr, ParseError> {
        let start = self.cursor.span();
        let left = self.parse_unary()?;
        if !self.cursor.eat(&TokenKind::StarStar) {
            return Ok(left);
        }
        // Right-associative.
        let right = self.parse_exponent()?;
        Ok(expr(
            ExprKind::Binary {
                op: BinaryOp::Pow,
                left: Box::new(left),
                right: Box::new(right),
            },
            start.merge(self.cursor.prev_span()),
        ))
    }

    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        let start = self.cursor.span();
        let op = match self.cursor.kind() {
            TokenKind::Bang => Some(UnaryOp::Not),
            TokenKind::Minus => Some(UnaryOp::Minus),
            TokenKind::Plus => Some(UnaryOp::Plus),
            TokenKind::Tilde => Some(UnaryOp::BitNot),
            TokenKind::TypeOf => Some(UnaryOp::TypeOf),
            TokenKind::Void => Some(UnaryOp::Void),
            TokenKind::Delete => Some(UnaryOp::Delete),
            _ => None,
        };
        if let Some(op) = op {
            self.cursor.advance();
            let argument = self.parse_unary()?;
            return Ok(expr(
                ExprKind::Unary {
                    op,
                    argument: Box::new(argument),
                },
                start.merge(self.cursor.prev_span()),
            ));
        }

        match self.cursor.kind() {
            TokenKind::PlusPlus | TokenKind::MinusMinus => {
                let op = if self.cursor.at(&TokenKind::PlusPlus) {
                    UpdateOp::Inc
                } else {
                    UpdateOp::Dec
                };
                self.cursor.advance();
                let argument = self.parse_unary()?;
                self.check_update_target(&argument)?;
                Ok(expr(
                    ExprKind::Update {
                        op,
                        prefix: true,
                        argument: Box::new(argument),
                    },
                    start.merge(self.cursor.prev_span()),
                ))
            }
            TokenKind::Await => {
                self.cursor.advance();
                let argument = self.parse_unary()?;
                Ok(expr(
                    ExprKind::Await(Box::new(argument)),
                    start.merge(self.cursor.prev_span()),
                ))
            }
            _ => self.parse_postfix(),
        }
    }

    fn check_update_target(&self, argument: &Expr) -> Result<(), ParseError> {
        match &argument.kind {
            ExprKind::Ident(_) | ExprKind::Member { .. } => Ok(()),
            _ => Err(self.error(
                "`++`/`--` need a variable or member target",
                argument.span,
            )),
        }
    }

    fn parse_postfix(&mut self) -> Result<Expr, ParseError> {
        let start = self.cursor.span();
        let argument = self.parse_call_chain()?;
        if self.cursor.newline_before() {
            return Ok(argument);
        }
        let op = match self.cursor.kind() {
            TokenKind::PlusPlus => Some(UpdateOp::Inc),
            TokenKind::MinusMinus => Some(UpdateOp::Dec),
            _ => None,
        };
        match op {
            Some(op) => {
                self.cursor.advance();
                self.check_update_target(&argument)?;
                Ok(expr(
                    ExprKind::Update {
                        op,
                        prefix: false,
                        argument: Box::new(argument),
                    },
                    start.merge(self.cursor.prev_span()),
                ))
            }
            None => Ok(argument),
        }
    }

    // Calls and members

    /// Member/call suffix chain. Also used for `extends` clauses.
    pub(crate) fn parse_call_chain(&mut self) -> Result<Expr, ParseError> {
        let start = self.cursor.span();
        let mut current = self.parse_new_or_primary()?;
        loop {
            match self.cursor.kind() {
                TokenKind::Dot => {
                    self.cursor.advance();
                    let name = self.expect_member_name()?;
                    current = expr(
                        ExprKind::Member {
                            object: Box::new(current),
                            property: MemberKey::Named(name),
                            optional: false,
                        },
                        start.merge(self.cursor.prev_span()),
                    );
                }
                TokenKind::LBracket => {
                    self.cursor.advance();
                    let property = self.parse_expression()?;
                    self.expect(&TokenKind::RBracket, "`]`")?;
                    current = expr(
                        ExprKind::Member {
                            object: Box::new(current),
                            property: MemberKey::Computed(Box::new(property)),
                            optional: false,
                        },
                        start.merge(self.cursor.prev_span()),
                    );
                }
                TokenKind::LParen => {
                    let arguments = self.parse_args()?;
                    current = expr(
                        ExprKind::Call {
                            callee: Box::new(current),
                            arguments,
                            optional: false,
                        },
                        start.merge(self.cursor.prev_span()),
                    );
                }
                TokenKind::QuestionDot => {
                    self.cursor.advance();
                    current = match self.cursor.kind() {
                        TokenKind::LParen => {
                            let arguments = self.parse_args()?;
                            expr(
                                ExprKind::Call {
                                    callee: Box::new(current),
                                    arguments,
                                    optional: true,
                                },
                                start.merge(self.cursor.prev_span()),
                            )
                        }
                        TokenKind::LBracket => {
                            self.cursor.advance();
                            let property = self.parse_expression()?;
                            self.expect(&TokenKind::RBracket, "`]`")?;
                            expr(
                                ExprKind::Member {
                                    object: Box::new(current),
                                    property: MemberKey::Computed(Box::new(property)),
                                    optional: true,
                                },
                                start.merge(self.cursor.prev_span()),
                            )
                        }
                        _ => {
                            let name = self.expect_member_name()?;
                            expr(
                                ExprKind::Member {
                                    object: Box::new(current),
                                    property: MemberKey::Named(name),
                                    optional: true,
                                },
                                start.merge(self.cursor.prev_span()),
                            )
                        }
                    };
                }
                TokenKind::Template(_) => {
                    return Err(self.error_here("tagged templates are not supported"));
                }
                _ => break,
            }
        }
        Ok(current)
    }

    fn parse_new_or_primary(&mut self) -> Result<Expr, ParseError> {
        if !self.cursor.at(&TokenKind::New) {
            return self.parse_primary();
        }
        let start = self.cursor.span();
        self.cursor.advance();

        // Member accesses bind to the constructee before the argument list.
        let mut callee = self.parse_new_or_primary()?;
        loop {
            match self.cursor.kind() {
                TokenKind::Dot => {
                    self.cursor.advance();
                    let name = self.expect_member_name()?;
                    callee = expr(
                        ExprKind::Member {
                            object: Box::new(callee),
                            property: MemberKey::Named(name),
                            optional: false,
                        },
                        start.merge(self.cursor.prev_span()),
                    );
                }
                TokenKind::LBracket => {
                    self.cursor.advance();
                    let property = self.parse_expression()?;
                    self.expect(&TokenKind::RBracket, "`]`")?;
                    callee = expr(
                        ExprKind::Member {
                            object: Box::new(callee),
                            property: MemberKey::Computed(Box::new(property)),
                            optional: false,
                        },
                        start.merge(self.cursor.prev_span()),
                    );
                }
                _ => break,
            }
        }
        let arguments = if self.cursor.at(&TokenKind::LParen) {
            self.parse_args()?
        } else {
            Vec::new()
        };
        Ok(expr(
            ExprKind::New {
                callee: Box::new(callee),
                arguments,
            },
            start.merge(self.cursor.prev_span()),
        ))
    }

    /// Parenthesized argument list; spread allowed in any position.
    fn parse_args(&mut self) -> Result<Vec<Expr>, ParseError> {
        self.expect(&TokenKind::LParen, "`(`")?;
        let mut arguments = Vec::new();
        while !self.cursor.at(&TokenKind::RParen) {
            if self.cursor.at_eof() {
                return Err(self.error_here("unexpected end of input in argument list"));
            }
            let argument = if self.cursor.at(&TokenKind::DotDotDot) {
                let spread_start = self.cursor.span();
                self.cursor.advance();
                let inner = self.parse_assignment()?;
                expr(
                    ExprKind::Spread(Box::new(inner)),
                    spread_start.merge(self.cursor.prev_span()),
                )
            } else {
                self.parse_assignment()?
            };
            arguments.push(argument);
            if !self.cursor.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::RParen, "`)`")?;
        Ok(arguments)
    }

    /// Member name after `.`: identifiers and keywords.
    fn expect_member_name(&mut self) -> Result<String, ParseError> {
        match self.cursor.kind() {
            TokenKind::Ident(name) => {
                let name = name.clone();
                self.cursor.advance();
                Ok(name)
            }
            other => {
                let keyword = other.keyword_text();
                if keyword.is_empty() {
                    Err(self.error_here(format!(
                        "expected property name, found {}",
                        other.describe()
                    )))
                } else {
                    self.cursor.advance();
                    Ok(keyword)
                }
            }
        }
    }

    // Primaries

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        let start = self.cursor.span();
        match self.cursor.kind().clone() {
            TokenKind::Number { value, raw } => {
                self.cursor.advance();
                Ok(expr(ExprKind::Number { value, raw }, start))
            }
            TokenKind::Str(value) => {
                self.cursor.advance();
                Ok(expr(ExprKind::Str(value), start))
            }
            TokenKind::True => {
                self.cursor.advance();
                Ok(expr(ExprKind::Bool(true), start))
            }
            TokenKind::False => {
                self.cursor.advance();
                Ok(expr(ExprKind::Bool(false), start))
            }
            TokenKind::Null => {
                self.cursor.advance();
                Ok(expr(ExprKind::Null, start))
            }
            TokenKind::This => {
                self.cursor.advance();
                Ok(expr(ExprKind::This, start))
            }
            TokenKind::Super => {
                self.cursor.advance();
                Ok(expr(ExprKind::Super, start))
            }
            TokenKind::Template(raw) => self.parse_template(&raw, start),
            TokenKind::Ident(name) => {
                if name == "async" && matches!(self.cursor.peek(1), TokenKind::Function) {
                    self.cursor.advance();
                    self.cursor.advance();
                    let function = self.parse_function_tail(true, false)?;
                    return Ok(expr(
                        ExprKind::Function(Box::new(function)),
                        start.merge(self.cursor.prev_span()),
                    ));
                }
                self.cursor.advance();
                Ok(expr(ExprKind::Ident(name), start))
            }
            TokenKind::Function => {
                self.cursor.advance();
                let function = self.parse_function_tail(false, false)?;
                Ok(expr(
                    ExprKind::Function(Box::new(function)),
                    start.merge(self.cursor.prev_span()),
                ))
            }
            TokenKind::Class => {
                let class = self.parse_class()?;
                Ok(expr(
                    ExprKind::Class(Box::new(class)),
                    start.merge(self.cursor.prev_span()),
                ))
            }
            TokenKind::LParen => {
                self.cursor.advance();
                let inner = self.parse_expression()?;
                self.expect(&TokenKind::RParen, "`)`")?;
                Ok(inner)
            }
            TokenKind::LBracket => self.parse_array_literal(start),
            TokenKind::LBrace => self.parse_object_literal(start),
            other => Err(self.error_here(format!(
                "expected expression, found {}",
                other.describe()
            ))),
        }
    }

    fn parse_template(&mut self, raw: &str, start: Span) -> Result<Expr, ParseError> {
        self.cursor.advance();
        // Parts are relative to the inner text, one byte past the backtick.
        let inner_offset = start.start + 1;
        let mut quasis = Vec::new();
        let mut expressions = Vec::new();
        for part in split_template(raw) {
            match part {
                TemplatePart::Quasi {
                    cooked,
                    raw,
                    offset,
                } => {
                    let abs = inner_offset + u32::try_from(offset).unwrap_or(u32::MAX);
                    let span = Span::new(abs, abs + u32::try_from(raw.len()).unwrap_or(0));
                    quasis.push(TemplateElement { cooked, raw, span });
                }
                TemplatePart::Expr { source, offset } => {
                    let abs = inner_offset + u32::try_from(offset).unwrap_or(u32::MAX);
                    expressions.push(self.parse_subexpression(&source, abs)?);
                }
            }
        }
        Ok(expr(
            ExprKind::Template {
                quasis,
                expressions,
            },
            start,
        ))
    }

    /// Parse an interpolated expression source on its own token stream,
    /// shifting token spans so locations point into the full source.
    fn parse_subexpression(&mut self, source: &str, offset: u32) -> Result<Expr, ParseError> {
        let mut lexed = ls_lexer::lex(source);
        if let Some(error) = lexed.errors.first() {
            let span = Span::new(offset + error.span.start, offset + error.span.end);
            return Err(self.error(error.message.clone(), span));
        }
        for token in &mut lexed.tokens {
            token.span = Span::new(offset + token.span.start, offset + token.span.end);
        }
        let mut sub = Parser::new(&lexed.tokens, self.source, self.line_map, self.dialect);
        let parsed = sub.parse_expression()?;
        if !sub.cursor.at_eof() {
            return Err(sub.error_here(format!(
                "unexpected {} in template expression",
                sub.cursor.kind().describe()
            )));
        }
        Ok(parsed)
    }

    fn parse_array_literal(&mut self, start: Span) -> Result<Expr, ParseError> {
        self.expect(&TokenKind::LBracket, "`[`")?;
        let mut elements = Vec::new();
        loop {
            if self.cursor.at(&TokenKind::RBracket) {
                break;
            }
            if self.cursor.at_eof() {
                return Err(self.error_here("unexpected end of input in array literal"));
            }
            if self.cursor.eat(&TokenKind::Comma) {
                // Elision: `[a, , b]`.
                elements.push(None);
                continue;
            }
            let element = if self.cursor.at(&TokenKind::DotDotDot) {
                let spread_start = self.cursor.span();
                self.cursor.advance();
                let inner = self.parse_assignment()?;
                expr(
                    ExprKind::Spread(Box::new(inner)),
                    spread_start.merge(self.cursor.prev_span()),
                )
            } else {
                self.parse_assignment()?
            };
            elements.push(Some(element));
            if !self.cursor.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::RBracket, "`]`")?;
        Ok(expr(
            ExprKind::Array(elements),
            start.merge(self.cursor.prev_span()),
        ))
    }

    fn parse_object_literal(&mut self, start: Span) -> Result<Expr, ParseError> {
        self.expect(&TokenKind::LBrace, "`{`")?;
        let mut members = Vec::new();
        while !self.cursor.at(&TokenKind::RBrace) {
            if self.cursor.at_eof() {
                return Err(self.error_here("unexpected end of input in object literal"));
            }
            members.push(self.parse_object_member()?);
            if !self.cursor.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::RBrace, "`}`")?;
        Ok(expr(
            ExprKind::Object(members),
            start.merge(self.cursor.prev_span()),
        ))
    }

    fn parse_object_member(&mut self) -> Result<ObjectMember, ParseError> {
        let start = self.cursor.span();

        if self.cursor.at(&TokenKind::DotDotDot) {
            self.cursor.advance();
            let argument = self.parse_assignment()?;
            return Ok(ObjectMember::Spread {
                argument,
                span: start.merge(self.cursor.prev_span()),
            });
        }

        // Method modifiers: `async m() {}`, `*gen() {}`.
        let is_async = self.cursor.kind().is_ident("async")
            && !matches!(
                self.cursor.peek(1),
                TokenKind::Colon | TokenKind::Comma | TokenKind::RBrace | TokenKind::LParen | TokenKind::Eq
            );
        if is_async {
            self.cursor.advance();
        }
        let is_generator = self.cursor.eat(&TokenKind::Star);

        let computed = self.cursor.at(&TokenKind::LBracket);
        let key = self.parse_property_key()?;

        // Method shorthand.
        if self.cursor.at(&TokenKind::LParen) {
            let params = self.parse_param_list()?;
            let body = self.parse_block()?;
            let span = start.merge(self.cursor.prev_span());
            let function = Function {
                name: key.static_name().map(str::to_string),
                params,
                body: FunctionBody::Block(body),
                is_async,
                is_generator,
                span,
            };
            return Ok(ObjectMember::Property {
                key,
                value: expr(ExprKind::Function(Box::new(function)), span),
                shorthand: false,
                computed,
                is_method: true,
                span,
            });
        }
        if is_async || is_generator {
            return Err(self.error_here("expected `(` to start a method body"));
        }

        // `key: value`.
        if self.cursor.eat(&TokenKind::Colon) {
            let value = self.parse_assignment()?;
            return Ok(ObjectMember::Property {
                key,
                value,
                shorthand: false,
                computed,
                is_method: false,
                span: start.merge(self.cursor.prev_span()),
            });
        }

        // Shorthand `{ x }` (and `{ x = d }` inside destructuring targets).
        let name = match key.static_name() {
            Some(name) if !computed => name.to_string(),
            _ => {
                return Err(self.error_here(format!(
                    "expected `:` after property key, found {}",
                    self.cursor.kind().describe()
                )))
            }
        };
        let name_expr = expr(ExprKind::Ident(name.clone()), start);
        let value = if self.cursor.eat(&TokenKind::Eq) {
            let default = self.parse_assignment()?;
            expr(
                ExprKind::Assign {
                    op: AssignOp::Assign,
                    target: ls_ir::ast::AssignTarget::Expr(Box::new(name_expr)),
                    value: Box::new(default),
                },
                start.merge(self.cursor.prev_span()),
            )
        } else {
            name_expr
        };
        Ok(ObjectMember::Property {
            key,
            value,
            shorthand: true,
            computed: false,
            is_method: false,
            span: start.merge(self.cursor.prev_span()),
        })
    }
}
