//! Statement-boundary error recovery.

use crate::grammar::Parser;
use ls_lexer::TokenKind;

impl Parser<'_> {
    /// Skip tokens until a plausible statement boundary.
    ///
    /// Stops after a `;` or `}` (the error's statement is over) or before a
    /// token that can open a statement. The recovering driver guarantees
    /// forward progress when this stops immediately.
    pub(crate) fn synchronize(&mut self) {
        loop {
            match self.cursor.kind() {
                TokenKind::Eof => return,
                TokenKind::Semicolon | TokenKind::RBrace => {
                    self.cursor.advance();
                    return;
                }
                TokenKind::Let
                | TokenKind::Const
                | TokenKind::Var
                | TokenKind::Function
                | TokenKind::Class
                | TokenKind::If
                | TokenKind::While
                | TokenKind::Do
                | TokenKind::For
                | TokenKind::Return
                | TokenKind::Break
                | TokenKind::Continue
                | TokenKind::Throw
                | TokenKind::Try
                | TokenKind::Switch => return,
                _ => {
                    self.cursor.advance();
                }
            }
        }
    }
}
