//! String escape processing.

/// Process escape sequences in a string or template chunk.
///
/// Unknown escapes keep their literal character (`\q` → `q`), matching the
/// source language. Escaped line terminators disappear entirely.
pub(crate) fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('b') => out.push('\u{8}'),
            Some('f') => out.push('\u{c}'),
            Some('v') => out.push('\u{b}'),
            Some('0') => out.push('\0'),
            Some('\n') => {}
            Some('x') => {
                let hex: String = chars.by_ref().take(2).collect();
                match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                    Some(decoded) => out.push(decoded),
                    None => {
                        out.push('x');
                        out.push_str(&hex);
                    }
                }
            }
            Some('u') => unescape_unicode(&mut chars, &mut out),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

/// Decode `\uNNNN` or `\u{…}` after the `u` has been consumed.
fn unescape_unicode(chars: &mut std::str::Chars<'_>, out: &mut String) {
    let mut lookahead = chars.clone();
    if lookahead.next() == Some('{') {
        let digits: String = lookahead.by_ref().take_while(|&c| c != '}').collect();
        match u32::from_str_radix(&digits, 16).ok().and_then(char::from_u32) {
            Some(decoded) => {
                out.push(decoded);
                *chars = lookahead;
            }
            None => out.push('u'),
        }
    } else {
        let digits: String = chars.by_ref().take(4).collect();
        match u32::from_str_radix(&digits, 16).ok().and_then(char::from_u32) {
            Some(decoded) => out.push(decoded),
            None => {
                out.push('u');
                out.push_str(&digits);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn common_escapes() {
        assert_eq!(unescape(r"a\nb\tc"), "a\nb\tc");
        assert_eq!(unescape(r#"say \"hi\""#), "say \"hi\"");
        assert_eq!(unescape(r"back\\slash"), "back\\slash");
    }

    #[test]
    fn unknown_escape_keeps_char() {
        assert_eq!(unescape(r"\q"), "q");
    }

    #[test]
    fn hex_and_unicode() {
        assert_eq!(unescape(r"\x41"), "A");
        assert_eq!(unescape("\\u0041"), "A");
        assert_eq!(unescape(r"\u{1F600}"), "\u{1F600}");
    }

    #[test]
    fn line_continuation_disappears() {
        assert_eq!(unescape("a\\\nb"), "ab");
    }
}
