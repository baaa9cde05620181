use crate::parser::span::Span;

/// Precomputed line starts for offset-to-line lookups.
#[derive(Debug, Clone)]
pub struct LineIndex {
    line_starts: Vec<usize>,
    len: usize,
}

impl LineIndex {
    pub fn new(source: &str) -> Self {
        let mut line_starts = vec![0];
        for (i, &b) in source.as_bytes().iter().enumerate() {
            if b == b'\n' {
                line_starts.push(i + 1);
            }
        }
        Self {
            line_starts,
            len: source.len(),
        }
    }

    /// Returns (line, column) for a byte offset, both 0-based.
    /// Offsets past the end clamp to the end of the last line.
    pub fn line_col(&self, offset: usize) -> (usize, usize) {
        if offset > self.len {
            let last_line = self.line_starts.len() - 1;
            let last_start = self.line_starts[last_line];
            return (last_line, self.len.saturating_sub(last_start));
        }

        match self.line_starts.binary_search(&offset) {
            Ok(line) => (line, 0),
            Err(insert_idx) => {
                let line = insert_idx - 1;
                (line, offset - self.line_starts[line])
            }
        }
    }

    /// 1-based line number, the way PHP reports declaration lines.
    pub fn line_number(&self, offset: usize) -> usize {
        self.line_col(offset).0 + 1
    }

    /// 1-based (start line, end line) of a span.
    pub fn line_span(&self, span: Span) -> (usize, usize) {
        let end = if span.end > span.start {
            span.end - 1
        } else {
            span.end
        };
        (self.line_number(span.start), self.line_number(end))
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_offsets_to_lines() {
        let index = LineIndex::new("<?php\nclass A {\n}\n");
        assert_eq!(index.line_number(0), 1);
        assert_eq!(index.line_number(6), 2);
        assert_eq!(index.line_number(17), 3);
        assert_eq!(index.line_span(Span::new(6, 18)), (2, 3));
        assert_eq!(index.line_count(), 4);
    }
}
