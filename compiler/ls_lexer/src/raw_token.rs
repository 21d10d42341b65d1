//! Raw token definition.
//!
//! The `RawToken` enum is the logos-derived tokenizer output before trivia
//! stripping and payload conversion. String, template, and number payloads
//! are extracted from the matched slice in `token::convert`.

use logos::{Lexer, Logos};

/// Raw token from logos.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t\r\u{feff}]+")] // Skip horizontal whitespace and the BOM
pub(crate) enum RawToken {
    #[regex(r"//[^\n]*")]
    LineComment,

    #[regex(r"/\*([^*]|\*+[^*/])*\*+/")]
    BlockComment,

    #[token("\n")]
    Newline,

    // Keywords
    #[token("break")]
    Break,
    #[token("case")]
    Case,
    #[token("catch")]
    Catch,
    #[token("class")]
    Class,
    #[token("const")]
    Const,
    #[token("continue")]
    Continue,
    #[token("default")]
    Default,
    #[token("delete")]
    Delete,
    #[token("do")]
    Do,
    #[token("else")]
    Else,
    #[token("extends")]
    Extends,
    #[token("false")]
    False,
    #[token("finally")]
    Finally,
    #[token("for")]
    For,
    #[token("function")]
    Function,
    #[token("if")]
    If,
    #[token("in")]
    In,
    #[token("instanceof")]
    Instanceof,
    #[token("let")]
    Let,
    #[token("new")]
    New,
    #[token("null")]
    Null,
    #[token("return")]
    Return,
    #[token("super")]
    Super,
    #[token("switch")]
    Switch,
    #[token("this")]
    This,
    #[token("throw")]
    Throw,
    #[token("true")]
    True,
    #[token("try")]
    Try,
    #[token("typeof")]
    TypeOf,
    #[token("var")]
    Var,
    #[token("void")]
    Void,
    #[token("while")]
    While,
    #[token("yield")]
    Yield,
    #[token("await")]
    Await,

    // Punctuation, longest first where prefixes overlap
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token(";")]
    Semicolon,
    #[token(",")]
    Comma,
    #[token("...")]
    DotDotDot,
    #[token(".")]
    Dot,
    #[token("?.")]
    QuestionDot,
    #[token("??=")]
    QuestionQuestionEq,
    #[token("??")]
    QuestionQuestion,
    #[token("?")]
    Question,
    #[token(":")]
    Colon,
    #[token("=>")]
    Arrow,
    #[token("===")]
    EqEqEq,
    #[token("==")]
    EqEq,
    #[token("=")]
    Eq,
    #[token("!==")]
    NotEqEq,
    #[token("!=")]
    NotEq,
    #[token("!")]
    Bang,
    #[token("+=")]
    PlusEq,
    #[token("++")]
    PlusPlus,
    #[token("+")]
    Plus,
    #[token("-=")]
    MinusEq,
    #[token("--")]
    MinusMinus,
    #[token("-")]
    Minus,
    #[token("**=")]
    StarStarEq,
    #[token("**")]
    StarStar,
    #[token("*=")]
    StarEq,
    #[token("*")]
    Star,
    #[token("/=")]
    SlashEq,
    #[token("/")]
    Slash,
    #[token("%=")]
    PercentEq,
    #[token("%")]
    Percent,
    #[token("<<=")]
    ShlEq,
    #[token("<<")]
    Shl,
    #[token("<=")]
    LtEq,
    #[token("<")]
    Lt,
    #[token(">>>")]
    UShr,
    #[token(">>=")]
    ShrEq,
    #[token(">>")]
    Shr,
    #[token(">=")]
    GtEq,
    #[token(">")]
    Gt,
    #[token("&&=")]
    AndAndEq,
    #[token("&&")]
    AndAnd,
    #[token("&=")]
    AmpEq,
    #[token("&")]
    Amp,
    #[token("||=")]
    OrOrEq,
    #[token("||")]
    OrOr,
    #[token("|=")]
    PipeEq,
    #[token("|")]
    Pipe,
    #[token("^=")]
    CaretEq,
    #[token("^")]
    Caret,
    #[token("~")]
    Tilde,

    // Literals
    #[regex(r"[0-9][0-9_]*(\.[0-9][0-9_]*)?([eE][+-]?[0-9]+)?")]
    #[regex(r"\.[0-9][0-9_]*([eE][+-]?[0-9]+)?")]
    #[regex(r"0[xX][0-9a-fA-F][0-9a-fA-F_]*")]
    #[regex(r"0[bB][01][01_]*")]
    #[regex(r"0[oO][0-7][0-7_]*")]
    Number,

    #[regex(r#""([^"\\\n]|\\[^\n]|\\\n)*""#)]
    #[regex(r"'([^'\\\n]|\\[^\n]|\\\n)*'")]
    Str,

    #[token("`", lex_template)]
    Template,

    #[regex(r"[A-Za-z_$][A-Za-z0-9_$]*")]
    Ident,
}

/// Consume a template literal after its opening backtick.
///
/// Tracks `${…}` interpolation nesting (including strings and nested
/// templates inside interpolations) so closing braces and backticks pair up
/// correctly. Returns `None` when the template is unterminated, which logos
/// reports as an error token at the opening backtick.
fn lex_template(lexer: &mut Lexer<'_, RawToken>) -> Option<()> {
    let rest = lexer.remainder().as_bytes();
    let mut i = 0;
    // Interpolation brace depth; 0 means we are in literal text.
    let mut depth = 0usize;
    // Inside an interpolation, the quote byte of an active string, if any.
    let mut quote: Option<u8> = None;

    while i < rest.len() {
        let byte = rest[i];
        if byte == b'\\' {
            i += 2;
            continue;
        }
        if let Some(q) = quote {
            if byte == q {
                quote = None;
            }
            i += 1;
            continue;
        }
        if depth == 0 {
            match byte {
                b'`' => {
                    lexer.bump(i + 1);
                    return Some(());
                }
                b'$' if rest.get(i + 1) == Some(&b'{') => {
                    depth = 1;
                    i += 2;
                    continue;
                }
                _ => {}
            }
        } else {
            match byte {
                b'{' => depth += 1,
                b'}' => depth -= 1,
                b'"' | b'\'' | b'`' => quote = Some(byte),
                _ => {}
            }
        }
        i += 1;
    }
    None
}
