use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineInfo<'src> {
    pub line: usize,
    pub column: usize,
    pub line_text: &'src str,
}

/// Byte range into the source text a node or token was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Smallest span covering both `self` and `other`.
    pub fn to(&self, other: Span) -> Span {
        Span::new(self.start.min(other.start), self.end.max(other.end))
    }

    pub fn line_info<'src>(&self, source: &'src str) -> Option<LineInfo<'src>> {
        if self.start > self.end || self.end > source.len() {
            return None;
        }
        let bytes = source.as_bytes();

        let line = bytes[..self.start].iter().filter(|&&b| b == b'\n').count() + 1;
        let line_start = bytes[..self.start]
            .iter()
            .rposition(|b| *b == b'\n')
            .map(|pos| pos + 1)
            .unwrap_or(0);
        let column = self.start - line_start + 1;

        let line_end = bytes[self.start..]
            .iter()
            .position(|b| *b == b'\n')
            .map(|pos| self.start + pos)
            .unwrap_or(source.len());

        Some(LineInfo {
            line,
            column,
            line_text: source.get(line_start..line_end).unwrap_or_default(),
        })
    }

    /// Slice the source. Out-of-range spans yield an empty string.
    pub fn as_str<'src>(&self, source: &'src str) -> &'src str {
        source.get(self.start..self.end).unwrap_or_default()
    }
}
