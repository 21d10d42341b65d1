//! Lexer for the LuaScript surface language.
//!
//! Tokenization happens in two layers: a logos-derived [`raw_token::RawToken`]
//! scan, then a conversion pass that drops trivia while recording, on each
//! token, whether a line break preceded it. The parser needs that flag for
//! automatic semicolon insertion and the restricted productions
//! (`return`/`break`/`continue`/`throw` stop at a newline).
//!
//! Template literals are captured as one raw token; [`split_template`]
//! separates quasis from interpolated expression sources so the parser can
//! re-enter the expression grammar on each `${…}` slice.

mod raw_token;
mod template;
mod token;
mod unescape;

#[cfg(test)]
mod tests;

pub use template::{split_template, TemplatePart};
pub use token::{Token, TokenKind};

use logos::Logos;
use ls_ir::Span;
use raw_token::RawToken;

/// A lexing failure with its source span.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LexError {
    pub message: String,
    pub span: Span,
}

/// Everything the lexer produced: tokens (always terminated by
/// [`TokenKind::Eof`]) plus any scan errors.
#[derive(Debug, Default)]
pub struct LexOutput {
    pub tokens: Vec<Token>,
    pub errors: Vec<LexError>,
}

/// Tokenize a source string.
///
/// Scan errors never abort: the offending byte is skipped and recorded so
/// the parser sees a best-effort stream.
pub fn lex(source: &str) -> LexOutput {
    let mut output = LexOutput::default();
    let mut newline_before = false;
    let mut lexer = RawToken::lexer(source);

    while let Some(result) = lexer.next() {
        let span = Span::from_range(lexer.span());
        match result {
            Ok(RawToken::Newline) => {
                newline_before = true;
            }
            Ok(RawToken::LineComment) => {}
            Ok(RawToken::BlockComment) => {
                if lexer.slice().contains('\n') {
                    newline_before = true;
                }
            }
            Ok(raw) => {
                if let Some(kind) = token::convert(raw, lexer.slice()) {
                    output.tokens.push(Token {
                        kind,
                        span,
                        newline_before: std::mem::take(&mut newline_before),
                    });
                }
            }
            Err(()) => {
                output.errors.push(LexError {
                    message: error_message(lexer.slice()),
                    span,
                });
            }
        }
    }

    let end = Span::from_range(source.len()..source.len());
    output.tokens.push(Token {
        kind: TokenKind::Eof,
        span: end,
        newline_before,
    });
    output
}

fn error_message(slice: &str) -> String {
    match slice.chars().next() {
        Some('`') => "unterminated template literal".to_string(),
        Some('"' | '\'') => "unterminated string literal".to_string(),
        Some(c) => format!("unexpected character `{c}`"),
        None => "unexpected end of input".to_string(),
    }
}
