//! Source positions. A `Span` is a byte range into the original source text;
//! line/column are recovered on demand via `LineIndex` for the plain-text
//! diagnostic format (`Line L:C - message`). Snippet rendering uses the byte
//! range directly and never needs line/column at all.

/// A byte range `[start, end)` into a single source file.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Hash)]
pub struct Span {
    pub start: u32,
    pub end: u32,
}

impl Span {
    pub fn new(start: u32, end: u32) -> Self {
        debug_assert!(start <= end);
        Self { start, end }
    }

    pub fn at(pos: u32) -> Self {
        Self::new(pos, pos)
    }

    pub fn to_range(self) -> std::ops::Range<usize> {
        self.start as usize..self.end as usize
    }

    pub fn join(self, other: Span) -> Span {
        Span::new(self.start.min(other.start), self.end.max(other.end))
    }
}

/// One-based line/column position, the unit spec.md's `Line L:C` format uses.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct LineCol {
    pub line: u32,
    pub column: u32,
}

/// Maps byte offsets to line/column positions. Built once per source file.
#[derive(Clone, Debug)]
pub struct LineIndex {
    /// Byte offset of the start of each line.
    line_starts: Vec<u32>,
}

impl LineIndex {
    pub fn new(source: &str) -> Self {
        let mut line_starts = vec![0u32];
        for (i, b) in source.bytes().enumerate() {
            if b == b'\n' {
                line_starts.push(i as u32 + 1);
            }
        }
        Self { line_starts }
    }

    pub fn line_col(&self, offset: u32) -> LineCol {
        let line = match self.line_starts.binary_search(&offset) {
            Ok(l) => l,
            Err(l) => l - 1,
        };
        let column = offset - self.line_starts[line];
        LineCol {
            line: line as u32 + 1,
            column: column + 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_col_first_line() {
        let idx = LineIndex::new("let x = 1;\nlet y = 2;\n");
        assert_eq!(idx.line_col(0), LineCol { line: 1, column: 1 });
        assert_eq!(idx.line_col(4), LineCol { line: 1, column: 5 });
    }

    #[test]
    fn line_col_second_line() {
        let idx = LineIndex::new("let x = 1;\nlet y = 2;\n");
        assert_eq!(idx.line_col(11), LineCol { line: 2, column: 1 });
    }

    #[test]
    fn span_join_takes_union() {
        let a = Span::new(2, 5);
        let b = Span::new(4, 9);
        assert_eq!(a.join(b), Span::new(2, 9));
    }
}
