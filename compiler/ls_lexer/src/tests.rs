use crate::{lex, TokenKind};
use pretty_assertions::assert_eq;

fn kinds(source: &str) -> Vec<TokenKind> {
    lex(source).tokens.into_iter().map(|t| t.kind).collect()
}

#[test]
fn keywords_and_identifiers() {
    assert_eq!(
        kinds("let x = y;"),
        vec![
            TokenKind::Let,
            TokenKind::Ident("x".to_string()),
            TokenKind::Eq,
            TokenKind::Ident("y".to_string()),
            TokenKind::Semicolon,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn contextual_keywords_stay_identifiers() {
    assert_eq!(
        kinds("of static async undefined"),
        vec![
            TokenKind::Ident("of".to_string()),
            TokenKind::Ident("static".to_string()),
            TokenKind::Ident("async".to_string()),
            TokenKind::Ident("undefined".to_string()),
            TokenKind::Eof,
        ]
    );
}

#[test]
fn keyword_prefix_does_not_split_identifier() {
    assert_eq!(
        kinds("letter"),
        vec![TokenKind::Ident("letter".to_string()), TokenKind::Eof]
    );
}

#[test]
fn multi_char_operators_lex_longest_first() {
    assert_eq!(
        kinds("a === b ?? c?.d ... e => f"),
        vec![
            TokenKind::Ident("a".to_string()),
            TokenKind::EqEqEq,
            TokenKind::Ident("b".to_string()),
            TokenKind::QuestionQuestion,
            TokenKind::Ident("c".to_string()),
            TokenKind::QuestionDot,
            TokenKind::Ident("d".to_string()),
            TokenKind::DotDotDot,
            TokenKind::Ident("e".to_string()),
            TokenKind::Arrow,
            TokenKind::Ident("f".to_string()),
            TokenKind::Eof,
        ]
    );
}

#[test]
fn numbers_keep_raw_text_and_value() {
    let tokens = lex("42 3.5 0xff 1_000 0b101 1e3").tokens;
    let expected = [
        (42.0, "42"),
        (3.5, "3.5"),
        (255.0, "0xff"),
        (1000.0, "1_000"),
        (5.0, "0b101"),
        (1000.0, "1e3"),
    ];
    for (token, (value, raw)) in tokens.iter().zip(expected) {
        match &token.kind {
            TokenKind::Number { value: v, raw: r } => {
                assert_eq!(*v, value, "value of {raw}");
                assert_eq!(r, raw);
            }
            other => panic!("expected number, got {other:?}"),
        }
    }
}

#[test]
fn strings_are_unescaped() {
    assert_eq!(
        kinds(r#""a\nb" 'c'"#),
        vec![
            TokenKind::Str("a\nb".to_string()),
            TokenKind::Str("c".to_string()),
            TokenKind::Eof,
        ]
    );
}

#[test]
fn template_token_captures_inner_text() {
    assert_eq!(
        kinds("`a ${x + 1} b`"),
        vec![
            TokenKind::Template("a ${x + 1} b".to_string()),
            TokenKind::Eof,
        ]
    );
}

#[test]
fn template_with_nested_braces_and_strings() {
    assert_eq!(
        kinds("`${ {a: \"}\"} }`"),
        vec![
            TokenKind::Template("${ {a: \"}\"} }".to_string()),
            TokenKind::Eof,
        ]
    );
}

#[test]
fn newline_flag_marks_following_token() {
    let tokens = lex("a\nb c").tokens;
    assert!(!tokens[0].newline_before);
    assert!(tokens[1].newline_before, "b follows a newline");
    assert!(!tokens[2].newline_before);
}

#[test]
fn comments_are_dropped_but_count_as_newlines() {
    let tokens = lex("a /* x\ny */ b // tail\nc").tokens;
    let kinds: Vec<_> = tokens.iter().map(|t| t.kind.clone()).collect();
    assert_eq!(
        kinds,
        vec![
            TokenKind::Ident("a".to_string()),
            TokenKind::Ident("b".to_string()),
            TokenKind::Ident("c".to_string()),
            TokenKind::Eof,
        ]
    );
    assert!(tokens[1].newline_before, "block comment spanned lines");
    assert!(tokens[2].newline_before, "line comment ends its line");
}

#[test]
fn unterminated_string_reports_error() {
    let output = lex("let s = \"oops");
    assert_eq!(output.errors.len(), 1);
    assert!(output.errors[0].message.contains("unterminated string"));
}

#[test]
fn unexpected_character_reports_error_and_continues() {
    let output = lex("a # b");
    assert_eq!(output.errors.len(), 1);
    assert!(output.errors[0].message.contains('#'));
    let kinds: Vec<_> = output.tokens.into_iter().map(|t| t.kind).collect();
    assert_eq!(
        kinds,
        vec![
            TokenKind::Ident("a".to_string()),
            TokenKind::Ident("b".to_string()),
            TokenKind::Eof,
        ]
    );
}
