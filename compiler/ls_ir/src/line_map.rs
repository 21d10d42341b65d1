//! Byte offset to line/column translation.

use serde::{Deserialize, Serialize};
use std::fmt;

/// 1-based line/column position.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Serialize, Deserialize)]
pub struct Loc {
    pub line: u32,
    pub column: u32,
}

impl Loc {
    #[inline]
    pub const fn new(line: u32, column: u32) -> Self {
        Loc { line, column }
    }
}

impl fmt::Display for Loc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Precomputed line starts for O(log n) offset → line/column lookups.
///
/// Columns count bytes, which matches the surface language's ASCII-heavy
/// syntax; multibyte identifiers shift columns but never lines.
pub struct LineMap {
    /// Byte offset of the first character of each line. Always starts with 0.
    line_starts: Vec<u32>,
    source_len: u32,
}

impl LineMap {
    /// Build a line map by scanning the source once.
    pub fn new(source: &str) -> Self {
        let mut line_starts = vec![0u32];
        for (i, byte) in source.bytes().enumerate() {
            if byte == b'\n' {
                line_starts.push(u32::try_from(i + 1).unwrap_or(u32::MAX));
            }
        }
        LineMap {
            line_starts,
            source_len: u32::try_from(source.len()).unwrap_or(u32::MAX),
        }
    }

    /// Translate a byte offset into a 1-based line/column pair.
    ///
    /// Offsets past the end of the source clamp to the last position.
    pub fn loc(&self, offset: u32) -> Loc {
        let offset = offset.min(self.source_len);
        let line_idx = match self.line_starts.binary_search(&offset) {
            Ok(idx) => idx,
            Err(idx) => idx - 1,
        };
        let line_start = self.line_starts[line_idx];
        Loc {
            line: u32::try_from(line_idx + 1).unwrap_or(u32::MAX),
            column: offset - line_start + 1,
        }
    }

    /// Number of lines in the source.
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Byte range of a 1-based line, without the trailing newline.
    ///
    /// Used to extract snippets for parse errors.
    pub fn line_range(&self, line: u32) -> Option<std::ops::Range<usize>> {
        let idx = line.checked_sub(1)? as usize;
        let start = *self.line_starts.get(idx)? as usize;
        let end = self
            .line_starts
            .get(idx + 1)
            .map_or(self.source_len as usize, |next| {
                (*next as usize).saturating_sub(1)
            });
        Some(start..end.max(start))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn first_line_is_one_based() {
        let map = LineMap::new("let x = 1;\nlet y = 2;\n");
        assert_eq!(map.loc(0), Loc::new(1, 1));
        assert_eq!(map.loc(4), Loc::new(1, 5));
    }

    #[test]
    fn newline_starts_next_line() {
        let map = LineMap::new("a\nbb\nccc");
        assert_eq!(map.loc(2), Loc::new(2, 1));
        assert_eq!(map.loc(3), Loc::new(2, 2));
        assert_eq!(map.loc(5), Loc::new(3, 1));
        assert_eq!(map.line_count(), 3);
    }

    #[test]
    fn offsets_clamp_to_end() {
        let map = LineMap::new("ab");
        assert_eq!(map.loc(100), Loc::new(1, 3));
    }

    #[test]
    fn line_range_extracts_snippet() {
        let source = "first\nsecond\nthird";
        let map = LineMap::new(source);
        let range = map.line_range(2);
        assert_eq!(range.map(|r| &source[r]), Some("second"));
        assert_eq!(map.line_range(9), None);
    }
}
