//! Template literal splitting.
//!
//! The lexer captures a template literal as one raw token. This module
//! splits the inner text into alternating quasis and interpolated
//! expression sources, so the parser re-enters the expression grammar on
//! each `${…}` slice. Offsets are relative to the inner text; callers add
//! the token's start (plus one for the opening backtick) to get absolute
//! positions.

use crate::unescape::unescape;

/// One piece of a template literal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TemplatePart {
    /// Literal chunk between interpolations.
    Quasi {
        cooked: String,
        raw: String,
        offset: usize,
    },
    /// Interpolated expression source (the text between `${` and `}`).
    Expr { source: String, offset: usize },
}

/// Split raw template text (without surrounding backticks) into parts.
///
/// Quasis come out escape-processed. An empty leading/trailing quasi is
/// still produced so parts always alternate quasi, expr, quasi, …
pub fn split_template(inner: &str) -> Vec<TemplatePart> {
    let bytes = inner.as_bytes();
    let mut parts = Vec::new();
    let mut quasi_start = 0usize;
    let mut i = 0usize;

    while i < bytes.len() {
        let byte = bytes[i];
        if byte == b'\\' {
            i += 2;
            continue;
        }
        if byte == b'$' && bytes.get(i + 1) == Some(&b'{') {
            let raw = &inner[quasi_start..i];
            parts.push(TemplatePart::Quasi {
                cooked: unescape(raw),
                raw: raw.to_string(),
                offset: quasi_start,
            });

            let expr_start = i + 2;
            let expr_end = match find_interpolation_end(bytes, expr_start) {
                Some(end) => end,
                // Unbalanced interpolation cannot happen in tokens produced
                // by the lexer; treat the rest as expression text.
                None => bytes.len(),
            };
            parts.push(TemplatePart::Expr {
                source: inner[expr_start..expr_end].to_string(),
                offset: expr_start,
            });
            i = (expr_end + 1).min(bytes.len());
            quasi_start = i;
            continue;
        }
        i += 1;
    }

    let raw = &inner[quasi_start..];
    parts.push(TemplatePart::Quasi {
        cooked: unescape(raw),
        raw: raw.to_string(),
        offset: quasi_start,
    });
    parts
}

/// Find the `}` closing an interpolation that starts at `from`.
fn find_interpolation_end(bytes: &[u8], from: usize) -> Option<usize> {
    let mut depth = 1usize;
    let mut quote: Option<u8> = None;
    let mut i = from;
    while i < bytes.len() {
        let byte = bytes[i];
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
        match byte {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            b'"' | b'\'' | b'`' => quote = Some(byte),
            _ => {}
        }
        i += 1;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn plain_text_is_one_quasi() {
        let parts = split_template("hello");
        assert_eq!(
            parts,
            vec![TemplatePart::Quasi {
                cooked: "hello".to_string(),
                raw: "hello".to_string(),
                offset: 0,
            }]
        );
    }

    #[test]
    fn interpolations_alternate_with_quasis() {
        let parts = split_template("a${x}b${y}c");
        assert_eq!(parts.len(), 5);
        assert_eq!(
            parts[1],
            TemplatePart::Expr {
                source: "x".to_string(),
                offset: 3,
            }
        );
        assert_eq!(
            parts[3],
            TemplatePart::Expr {
                source: "y".to_string(),
                offset: 8,
            }
        );
    }

    #[test]
    fn adjacent_interpolations_produce_empty_quasis() {
        let parts = split_template("${a}${b}");
        assert_eq!(parts.len(), 5);
        assert!(
            matches!(&parts[0], TemplatePart::Quasi { cooked, .. } if cooked.is_empty()),
            "leading quasi should be empty"
        );
        assert!(
            matches!(&parts[2], TemplatePart::Quasi { cooked, .. } if cooked.is_empty()),
            "middle quasi should be empty"
        );
    }

    #[test]
    fn nested_braces_stay_in_expression() {
        let parts = split_template("v=${ {a: 1}.a }!");
        assert_eq!(parts.len(), 3);
        assert_eq!(
            parts[1],
            TemplatePart::Expr {
                source: " {a: 1}.a ".to_string(),
                offset: 4,
            }
        );
    }

    #[test]
    fn strings_inside_interpolation_hide_braces() {
        let parts = split_template("${f(\"}\")}tail");
        assert_eq!(parts.len(), 3);
        assert_eq!(
            parts[1],
            TemplatePart::Expr {
                source: "f(\"}\")".to_string(),
                offset: 2,
            }
        );
    }

    #[test]
    fn escaped_dollar_is_literal() {
        let parts = split_template(r"\${x}");
        assert_eq!(parts.len(), 1);
        assert!(matches!(&parts[0], TemplatePart::Quasi { cooked, .. } if cooked == "${x}"));
    }
}
