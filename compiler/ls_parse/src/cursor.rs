//! Token cursor for navigating the token stream.

use ls_ir::Span;
use ls_lexer::{Token, TokenKind};

/// Cursor over the lexed token stream.
///
/// The stream always ends with an `Eof` token, so `current()` is total.
/// Positions can be saved and restored for speculative parsing (arrow
/// parameter lists).
pub(crate) struct Cursor<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub(crate) fn new(tokens: &'a [Token]) -> Self {
        debug_assert!(
            matches!(tokens.last().map(|t| &t.kind), Some(TokenKind::Eof)),
            "token stream must end with Eof"
        );
        Cursor { tokens, pos: 0 }
    }

    /// Current position, for snapshots and progress checks.
    #[inline]
    pub(crate) fn position(&self) -> usize {
        self.pos
    }

    /// Restore a previously saved position.
    #[inline]
    pub(crate) fn set_position(&mut self, pos: usize) {
        debug_assert!(pos <= self.tokens.len());
        self.pos = pos;
    }

    #[inline]
    pub(crate) fn current(&self) -> &'a Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    #[inline]
    pub(crate) fn kind(&self) -> &'a TokenKind {
        &self.current().kind
    }

    #[inline]
    pub(crate) fn span(&self) -> Span {
        self.current().span
    }

    /// Span of the most recently consumed token.
    #[inline]
    pub(crate) fn prev_span(&self) -> Span {
        if self.pos == 0 {
            Span::DUMMY
        } else {
            self.tokens[self.pos - 1].span
        }
    }

    /// Whether a line break precedes the current token.
    #[inline]
    pub(crate) fn newline_before(&self) -> bool {
        self.current().newline_before
    }

    /// Peek `n` tokens ahead (0 = current).
    #[inline]
    pub(crate) fn peek(&self, n: usize) -> &'a TokenKind {
        let idx = (self.pos + n).min(self.tokens.len() - 1);
        &self.tokens[idx].kind
    }

    #[inline]
    pub(crate) fn at(&self, kind: &TokenKind) -> bool {
        self.kind() == kind
    }

    #[inline]
    pub(crate) fn at_eof(&self) -> bool {
        matches!(self.kind(), TokenKind::Eof)
    }

    /// Current token's identifier text, if it is an identifier.
    #[inline]
    pub(crate) fn at_ident(&self) -> Option<&'a str> {
        match self.kind() {
            TokenKind::Ident(name) => Some(name),
            _ => None,
        }
    }

    /// Advance past the current token.
    #[inline]
    pub(crate) fn advance(&mut self) -> &'a Token {
        let token = &self.tokens[self.pos.min(self.tokens.len() - 1)];
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    /// Consume the current token when it matches.
    #[inline]
    pub(crate) fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.at(kind) {
            self.advance();
            true
        } else {
            false
        }
    }
}
