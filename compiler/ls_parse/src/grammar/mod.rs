//! Statement grammar and the parser state.
//!
//! Expression and pattern productions live in the sibling modules; this
//! module owns the parser state, statement dispatch, functions, and classes.

mod expr;
mod pattern;

use crate::cursor::Cursor;
use crate::ParseError;
use ls_ir::ast::{
    CatchClause, Class, ClassMember, DeclKind, Declarator, Dialect, ForInit, Function,
    FunctionBody, Pattern, PatternKind, Program, PropertyKey, Stmt, StmtKind, SwitchCase,
};
use ls_ir::{LineMap, Span};
use ls_lexer::{Token, TokenKind};

/// Hard cap on expression nesting, to keep pathological input from
/// exhausting the host stack before the lowerer's own depth limit applies.
const MAX_EXPR_DEPTH: usize = 512;

/// Parser state over one token stream.
pub(crate) struct Parser<'a> {
    pub(crate) cursor: Cursor<'a>,
    pub(crate) source: &'a str,
    pub(crate) line_map: &'a LineMap,
    pub(crate) dialect: Dialect,
    pub(crate) depth: usize,
}

impl<'a> Parser<'a> {
    pub(crate) fn new(
        tokens: &'a [Token],
        source: &'a str,
        line_map: &'a LineMap,
        dialect: Dialect,
    ) -> Self {
        Parser {
            cursor: Cursor::new(tokens),
            source,
            line_map,
            dialect,
            depth: 0,
        }
    }

    // Error helpers

    pub(crate) fn error(&self, message: impl Into<String>, span: Span) -> ParseError {
        ParseError::new(message, span, self.source, self.line_map)
    }

    pub(crate) fn error_here(&self, message: impl Into<String>) -> ParseError {
        self.error(message, self.cursor.span())
    }

    /// Consume `kind` or fail with "expected … found …".
    pub(crate) fn expect(&mut self, kind: &TokenKind, what: &str) -> Result<Span, ParseError> {
        if self.cursor.at(kind) {
            let span = self.cursor.span();
            self.cursor.advance();
            Ok(span)
        } else {
            Err(self.error_here(format!(
                "expected {what}, found {}",
                self.cursor.kind().describe()
            )))
        }
    }

    /// Consume an identifier token, returning its text.
    pub(crate) fn expect_ident(&mut self, what: &str) -> Result<(String, Span), ParseError> {
        match self.cursor.kind() {
            TokenKind::Ident(name) => {
                let span = self.cursor.span();
                let name = name.clone();
                self.cursor.advance();
                Ok((name, span))
            }
            other => Err(self.error_here(format!("expected {what}, found {}", other.describe()))),
        }
    }

    /// Statement terminator with automatic insertion at line breaks,
    /// closing braces, and end of input.
    fn eat_semicolon(&mut self) -> Result<(), ParseError> {
        if self.cursor.eat(&TokenKind::Semicolon) {
            return Ok(());
        }
        if matches!(self.cursor.kind(), TokenKind::RBrace | TokenKind::Eof)
            || self.cursor.newline_before()
        {
            return Ok(());
        }
        Err(self.error_here(format!(
            "expected `;`, found {}",
            self.cursor.kind().describe()
        )))
    }

    /// Guard expression recursion depth.
    pub(crate) fn enter_expr(&mut self) -> Result<DepthGuard, ParseError> {
        if self.depth >= MAX_EXPR_DEPTH {
            return Err(self.error_here("expression nesting too deep"));
        }
        self.depth += 1;
        Ok(DepthGuard)
    }

    pub(crate) fn exit_expr(&mut self, _guard: DepthGuard) {
        self.depth -= 1;
    }

    // Program

    pub(crate) fn parse_program_strict(&mut self) -> Result<Program, ParseError> {
        let start = self.cursor.span();
        let mut body = Vec::new();
        while !self.cursor.at_eof() {
            body.push(self.parse_stmt()?);
        }
        let span = start.merge(self.cursor.prev_span());
        Ok(Program { body, span })
    }

    pub(crate) fn parse_program_recovering(&mut self, errors: &mut Vec<ParseError>) -> Program {
        let start = self.cursor.span();
        let mut body = Vec::new();
        while !self.cursor.at_eof() {
            let before = self.cursor.position();
            match self.parse_stmt() {
                Ok(stmt) => body.push(stmt),
                Err(error) => {
                    errors.push(error);
                    self.synchronize();
                    if self.cursor.position() == before {
                        // No progress; skip the offending token outright.
                        self.cursor.advance();
                    }
                }
            }
        }
        let span = start.merge(self.cursor.prev_span());
        Program { body, span }
    }

    // Statements

    pub(crate) fn parse_stmt(&mut self) -> Result<Stmt, ParseError> {
        let start = self.cursor.span();
        match self.cursor.kind() {
            TokenKind::Let => self.parse_var_stmt(DeclKind::Let, start),
            TokenKind::Const => self.parse_var_stmt(DeclKind::Const, start),
            TokenKind::Var => self.parse_var_stmt(DeclKind::Var, start),
            TokenKind::Function => {
                self.cursor.advance();
                let function = self.parse_function_tail(false, true)?;
                Ok(self.stmt(StmtKind::FunctionDecl(Box::new(function)), start))
            }
            TokenKind::Ident(name)
                if name == "async" && matches!(self.cursor.peek(1), TokenKind::Function) =>
            {
                self.cursor.advance();
                self.cursor.advance();
                let function = self.parse_function_tail(true, true)?;
                Ok(self.stmt(StmtKind::FunctionDecl(Box::new(function)), start))
            }
            TokenKind::Class => {
                let class = self.parse_class()?;
                if class.name.is_none() {
                    return Err(self.error("class declarations need a name", start));
                }
                Ok(self.stmt(StmtKind::ClassDecl(Box::new(class)), start))
            }
            TokenKind::LBrace => {
                let body = self.parse_block()?;
                Ok(self.stmt(StmtKind::Block(body), start))
            }
            TokenKind::If => self.parse_if(start),
            TokenKind::While => self.parse_while(start),
            TokenKind::Do => self.parse_do_while(start),
            TokenKind::For => self.parse_for(start),
            TokenKind::Return => self.parse_return(start),
            TokenKind::Break => {
                self.cursor.advance();
                self.eat_semicolon()?;
                Ok(self.stmt(StmtKind::Break, start))
            }
            TokenKind::Continue => {
                self.cursor.advance();
                self.eat_semicolon()?;
                Ok(self.stmt(StmtKind::Continue, start))
            }
            TokenKind::Throw => {
                self.cursor.advance();
                if self.cursor.newline_before() {
                    return Err(self.error_here("`throw` argument must start on the same line"));
                }
                let argument = self.parse_expression()?;
                self.eat_semicolon()?;
                Ok(self.stmt(StmtKind::Throw(Box::new(argument)), start))
            }
            TokenKind::Try => self.parse_try(start),
            TokenKind::Switch => self.parse_switch(start),
            TokenKind::Semicolon => {
                self.cursor.advance();
                Ok(self.stmt(StmtKind::Empty, start))
            }
            _ => {
                let expression = self.parse_expression()?;
                self.eat_semicolon()?;
                Ok(self.stmt(StmtKind::Expression(Box::new(expression)), start))
            }
        }
    }

    fn stmt(&self, kind: StmtKind, start: Span) -> Stmt {
        Stmt {
            kind,
            span: start.merge(self.cursor.prev_span()),
        }
    }

    fn parse_var_stmt(&mut self, kind: DeclKind, start: Span) -> Result<Stmt, ParseError> {
        self.cursor.advance();
        let declarators = self.parse_declarators(kind)?;
        self.eat_semicolon()?;
        Ok(self.stmt(StmtKind::VarDecl { kind, declarators }, start))
    }

    fn parse_declarators(&mut self, kind: DeclKind) -> Result<Vec<Declarator>, ParseError> {
        let mut declarators = Vec::new();
        loop {
            let start = self.cursor.span();
            let pattern = self.parse_binding_pattern()?;
            let init = if self.cursor.eat(&TokenKind::Eq) {
                Some(self.parse_assignment()?)
            } else {
                None
            };
            if init.is_none() && kind == DeclKind::Const {
                return Err(self.error("`const` declarations need an initializer", start));
            }
            if init.is_none() && !matches!(pattern.kind, PatternKind::Ident(_)) {
                return Err(self.error("destructuring declarations need an initializer", start));
            }
            declarators.push(Declarator {
                pattern,
                init,
                span: start.merge(self.cursor.prev_span()),
            });
            if !self.cursor.eat(&TokenKind::Comma) {
                break;
            }
        }
        Ok(declarators)
    }

    fn parse_block(&mut self) -> Result<Vec<Stmt>, ParseError> {
        self.expect(&TokenKind::LBrace, "`{`")?;
        let mut body = Vec::new();
        while !self.cursor.at(&TokenKind::RBrace) {
            if self.cursor.at_eof() {
                return Err(self.error_here("unexpected end of input inside block"));
            }
            body.push(self.parse_stmt()?);
        }
        self.expect(&TokenKind::RBrace, "`}`")?;
        Ok(body)
    }

    fn parse_if(&mut self, start: Span) -> Result<Stmt, ParseError> {
        self.cursor.advance();
        self.expect(&TokenKind::LParen, "`(` after `if`")?;
        let test = self.parse_expression()?;
        self.expect(&TokenKind::RParen, "`)`")?;
        let consequent = Box::new(self.parse_stmt()?);
        let alternate = if self.cursor.eat(&TokenKind::Else) {
            Some(Box::new(self.parse_stmt()?))
        } else {
            None
        };
        Ok(self.stmt(
            StmtKind::If {
                test: Box::new(test),
                consequent,
                alternate,
            },
            start,
        ))
    }

    fn parse_while(&mut self, start: Span) -> Result<Stmt, ParseError> {
        self.cursor.advance();
        self.expect(&TokenKind::LParen, "`(` after `while`")?;
        let test = self.parse_expression()?;
        self.expect(&TokenKind::RParen, "`)`")?;
        let body = Box::new(self.parse_stmt()?);
        Ok(self.stmt(
            StmtKind::While {
                test: Box::new(test),
                body,
            },
            start,
        ))
    }

    fn parse_do_while(&mut self, start: Span) -> Result<Stmt, ParseError> {
        self.cursor.advance();
        let body = Box::new(self.parse_stmt()?);
        self.expect(&TokenKind::While, "`while` after `do` body")?;
        self.expect(&TokenKind::LParen, "`(`")?;
        let test = self.parse_expression()?;
        self.expect(&TokenKind::RParen, "`)`")?;
        self.eat_semicolon()?;
        Ok(self.stmt(
            StmtKind::DoWhile {
                body,
                test: Box::new(test),
            },
            start,
        ))
    }

    fn parse_for(&mut self, start: Span) -> Result<Stmt, ParseError> {
        self.cursor.advance();
        self.expect(&TokenKind::LParen, "`(` after `for`")?;

        // Declaration-introduced binding: `for (let …` / `for (const …`.
        let decl_kind = match self.cursor.kind() {
            TokenKind::Let => Some(DeclKind::Let),
            TokenKind::Const => Some(DeclKind::Const),
            TokenKind::Var => Some(DeclKind::Var),
            _ => None,
        };

        if let Some(kind) = decl_kind {
            self.cursor.advance();
            let pattern_start = self.cursor.span();
            let pattern = self.parse_binding_pattern()?;

            if self.cursor.kind().is_ident("of") {
                self.cursor.advance();
                return self.parse_for_of_tail(start, Some(kind), pattern);
            }
            if self.cursor.at(&TokenKind::In) {
                return Err(self.error_here("`for…in` is not supported; use `for…of`"));
            }

            // C-style: finish the first declarator, then the rest.
            let init = if self.cursor.eat(&TokenKind::Eq) {
                Some(self.parse_assignment()?)
            } else {
                None
            };
            let mut declarators = vec![Declarator {
                pattern,
                init,
                span: pattern_start.merge(self.cursor.prev_span()),
            }];
            while self.cursor.eat(&TokenKind::Comma) {
                let d_start = self.cursor.span();
                let pattern = self.parse_binding_pattern()?;
                let init = if self.cursor.eat(&TokenKind::Eq) {
                    Some(self.parse_assignment()?)
                } else {
                    None
                };
                declarators.push(Declarator {
                    pattern,
                    init,
                    span: d_start.merge(self.cursor.prev_span()),
                });
            }
            let init = Some(ForInit::VarDecl { kind, declarators });
            return self.parse_c_for_tail(start, init);
        }

        if self.cursor.at(&TokenKind::Semicolon) {
            return self.parse_c_for_tail(start, None);
        }

        // Expression head: either `for (x of …)` over an existing binding
        // or a C-style initializer expression.
        let head = self.parse_expression()?;
        if self.cursor.kind().is_ident("of") {
            self.cursor.advance();
            let pattern = self.expr_to_pattern(head)?;
            return self.parse_for_of_tail(start, None, pattern);
        }
        if self.cursor.at(&TokenKind::In) {
            return Err(self.error_here("`for…in` is not supported; use `for…of`"));
        }
        self.parse_c_for_tail(start, Some(ForInit::Expr(Box::new(head))))
    }

    fn parse_for_of_tail(
        &mut self,
        start: Span,
        decl_kind: Option<DeclKind>,
        binding: Pattern,
    ) -> Result<Stmt, ParseError> {
        let iterable = self.parse_assignment()?;
        self.expect(&TokenKind::RParen, "`)`")?;
        let body = Box::new(self.parse_stmt()?);
        Ok(self.stmt(
            StmtKind::ForOf {
                decl_kind,
                binding,
                iterable: Box::new(iterable),
                body,
            },
            start,
        ))
    }

    fn parse_c_for_tail(
        &mut self,
        start: Span,
        init: Option<ForInit>,
    ) -> Result<Stmt, ParseError> {
        self.expect(&TokenKind::Semicolon, "`;` after `for` initializer")?;
        let test = if self.cursor.at(&TokenKind::Semicolon) {
            None
        } else {
            Some(Box::new(self.parse_expression()?))
        };
        self.expect(&TokenKind::Semicolon, "`;` after `for` condition")?;
        let update = if self.cursor.at(&TokenKind::RParen) {
            None
        } else {
            Some(Box::new(self.parse_expression()?))
        };
        self.expect(&TokenKind::RParen, "`)`")?;
        let body = Box::new(self.parse_stmt()?);
        Ok(self.stmt(
            StmtKind::For {
                init,
                test,
                update,
                body,
            },
            start,
        ))
    }

    fn parse_return(&mut self, start: Span) -> Result<Stmt, ParseError> {
        self.cursor.advance();
        let argument = if matches!(
            self.cursor.kind(),
            TokenKind::Semicolon | TokenKind::RBrace | TokenKind::Eof
        ) || self.cursor.newline_before()
        {
            None
        } else {
            Some(Box::new(self.parse_expression()?))
        };
        self.eat_semicolon()?;
        Ok(self.stmt(StmtKind::Return(argument), start))
    }

    fn parse_try(&mut self, start: Span) -> Result<Stmt, ParseError> {
        self.cursor.advance();
        let block = self.parse_block()?;
        let handler = if self.cursor.at(&TokenKind::Catch) {
            let catch_start = self.cursor.span();
            self.cursor.advance();
            let param = if self.cursor.eat(&TokenKind::LParen) {
                let pattern = self.parse_binding_pattern()?;
                self.expect(&TokenKind::RParen, "`)`")?;
                Some(pattern)
            } else {
                None
            };
            let body = self.parse_block()?;
            Some(CatchClause {
                param,
                body,
                span: catch_start.merge(self.cursor.prev_span()),
            })
        } else {
            None
        };
        let finalizer = if self.cursor.eat(&TokenKind::Finally) {
            Some(self.parse_block()?)
        } else {
            None
        };
        if handler.is_none() && finalizer.is_none() {
            return Err(self.error_here("`try` needs a `catch` or `finally` clause"));
        }
        Ok(self.stmt(
            StmtKind::Try {
                block,
                handler,
                finalizer,
            },
            start,
        ))
    }

    fn parse_switch(&mut self, start: Span) -> Result<Stmt, ParseError> {
        self.cursor.advance();
        self.expect(&TokenKind::LParen, "`(` after `switch`")?;
        let discriminant = self.parse_expression()?;
        self.expect(&TokenKind::RParen, "`)`")?;
        self.expect(&TokenKind::LBrace, "`{`")?;

        let mut cases = Vec::new();
        let mut seen_default = false;
        while !self.cursor.at(&TokenKind::RBrace) {
            let case_start = self.cursor.span();
            let test = if self.cursor.eat(&TokenKind::Case) {
                let test = self.parse_expression()?;
                Some(test)
            } else if self.cursor.at(&TokenKind::Default) {
                if seen_default {
                    return Err(self.error_here("duplicate `default` clause"));
                }
                seen_default = true;
                self.cursor.advance();
                None
            } else {
                return Err(self.error_here(format!(
                    "expected `case` or `default`, found {}",
                    self.cursor.kind().describe()
                )));
            };
            self.expect(&TokenKind::Colon, "`:`")?;
            let mut body = Vec::new();
            while !matches!(
                self.cursor.kind(),
                TokenKind::Case | TokenKind::Default | TokenKind::RBrace | TokenKind::Eof
            ) {
                body.push(self.parse_stmt()?);
            }
            cases.push(SwitchCase {
                test,
                body,
                span: case_start.merge(self.cursor.prev_span()),
            });
        }
        self.expect(&TokenKind::RBrace, "`}`")?;
        Ok(self.stmt(
            StmtKind::Switch {
                discriminant: Box::new(discriminant),
                cases,
            },
            start,
        ))
    }

    // Functions and classes

    /// Parse the remainder of a function after `function` (and any `async`)
    /// has been consumed: optional `*`, optional name, params, block body.
    pub(crate) fn parse_function_tail(
        &mut self,
        is_async: bool,
        require_name: bool,
    ) -> Result<Function, ParseError> {
        let start = self.cursor.prev_span();
        let is_generator = self.cursor.eat(&TokenKind::Star);
        let name = if self.cursor.at_ident().is_some() {
            Some(self.expect_ident("function name")?.0)
        } else if require_name {
            return Err(self.error_here("function declarations need a name"));
        } else {
            None
        };
        let params = self.parse_param_list()?;
        let body = self.parse_block()?;
        Ok(Function {
            name,
            params,
            body: FunctionBody::Block(body),
            is_async,
            is_generator,
            span: start.merge(self.cursor.prev_span()),
        })
    }

    /// Parenthesized parameter list: patterns with defaults and a trailing
    /// rest element.
    pub(crate) fn parse_param_list(&mut self) -> Result<Vec<Pattern>, ParseError> {
        self.expect(&TokenKind::LParen, "`(`")?;
        let mut params = Vec::new();
        while !self.cursor.at(&TokenKind::RParen) {
            if self.cursor.at_eof() {
                return Err(self.error_here("unexpected end of input in parameter list"));
            }
            let param = self.parse_binding_element()?;
            let is_rest = matches!(param.kind, PatternKind::Rest(_));
            params.push(param);
            if is_rest && !self.cursor.at(&TokenKind::RParen) {
                return Err(self.error_here("rest parameter must be last"));
            }
            if !self.cursor.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::RParen, "`)`")?;
        Ok(params)
    }

    pub(crate) fn parse_class(&mut self) -> Result<Class, ParseError> {
        let start = self.cursor.span();
        self.expect(&TokenKind::Class, "`class`")?;
        let name = self.cursor.at_ident().map(str::to_string);
        if name.is_some() {
            self.cursor.advance();
        }
        let superclass = if self.cursor.eat(&TokenKind::Extends) {
            Some(Box::new(self.parse_call_chain()?))
        } else {
            None
        };
        self.expect(&TokenKind::LBrace, "`{` to open class body")?;

        let mut members = Vec::new();
        while !self.cursor.at(&TokenKind::RBrace) {
            if self.cursor.at_eof() {
                return Err(self.error_here("unexpected end of input inside class body"));
            }
            if self.cursor.eat(&TokenKind::Semicolon) {
                continue;
            }
            members.push(self.parse_class_member()?);
        }
        self.expect(&TokenKind::RBrace, "`}`")?;
        Ok(Class {
            name,
            superclass,
            members,
            span: start.merge(self.cursor.prev_span()),
        })
    }

    fn parse_class_member(&mut self) -> Result<ClassMember, ParseError> {
        let start = self.cursor.span();

        // `static` is contextual: only a modifier when a member key follows.
        let is_static = self.cursor.kind().is_ident("static")
            && !matches!(self.cursor.peek(1), TokenKind::LParen | TokenKind::Eq);
        if is_static {
            self.cursor.advance();
        }
        let is_async = self.cursor.kind().is_ident("async")
            && !matches!(self.cursor.peek(1), TokenKind::LParen | TokenKind::Eq);
        if is_async {
            self.cursor.advance();
        }
        let is_generator = self.cursor.eat(&TokenKind::Star);

        let key = self.parse_property_key()?;
        if !self.cursor.at(&TokenKind::LParen) {
            return Err(self.error_here("class fields are not supported; expected `(`"));
        }
        let params = self.parse_param_list()?;
        let body = self.parse_block()?;
        let is_constructor = !is_static && key.static_name() == Some("constructor");
        if is_constructor && (is_async || is_generator) {
            return Err(self.error("constructors cannot be async or generators", start));
        }
        let span = start.merge(self.cursor.prev_span());
        Ok(ClassMember {
            key,
            function: Function {
                name: None,
                params,
                body: FunctionBody::Block(body),
                is_async,
                is_generator,
                span,
            },
            is_static,
            is_constructor,
            span,
        })
    }

    /// Property key in object literals and class bodies.
    pub(crate) fn parse_property_key(&mut self) -> Result<PropertyKey, ParseError> {
        match self.cursor.kind().clone() {
            TokenKind::Ident(name) => {
                self.cursor.advance();
                Ok(PropertyKey::Ident(name))
            }
            TokenKind::Str(value) => {
                self.cursor.advance();
                Ok(PropertyKey::Str(value))
            }
            TokenKind::Number { value, raw } => {
                self.cursor.advance();
                Ok(PropertyKey::Num { value, raw })
            }
            TokenKind::LBracket => {
                self.cursor.advance();
                let expr = self.parse_assignment()?;
                self.expect(&TokenKind::RBracket, "`]`")?;
                Ok(PropertyKey::Computed(Box::new(expr)))
            }
            // Keywords are valid property names (`obj.default`, `{ in: 1 }`).
            other if !other.text_is_empty() => {
                self.cursor.advance();
                Ok(PropertyKey::Ident(other.keyword_text()))
            }
            other => Err(self.error_here(format!(
                "expected property name, found {}",
                other.describe()
            ))),
        }
    }
}

/// Opaque token proving `enter_expr` was paired with `exit_expr`.
pub(crate) struct DepthGuard;

/// Keyword-as-property-name support.
trait KeywordText {
    fn text_is_empty(&self) -> bool;
    fn keyword_text(&self) -> String;
}

impl KeywordText for TokenKind {
    fn text_is_empty(&self) -> bool {
        self.keyword_text().is_empty()
    }

    fn keyword_text(&self) -> String {
        let described = self.describe();
        match self {
            TokenKind::Number { .. }
            | TokenKind::Str(_)
            | TokenKind::Template(_)
            | TokenKind::Ident(_)
            | TokenKind::Eof => String::new(),
            _ => {
                let inner = described.trim_matches('`');
                if inner.chars().all(|c| c.is_ascii_alphabetic()) {
                    inner.to_string()
                } else {
                    String::new()
                }
            }
        }
    }
}
