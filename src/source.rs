use std::ops::Range;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceOffset(usize);

impl SourceOffset {
    pub fn byte_offset(&self) -> usize {
        self.0
    }

    /// 1-based line and column of this offset in `source`.
    pub fn line_col(&self, source: &str) -> (usize, usize) {
        let before = &source[..self.0.min(source.len())];
        let line = before.matches('\n').count() + 1;
        let col = before.rsplit('\n').next().map_or(0, |tail| tail.chars().count()) + 1;
        (line, col)
    }
}

impl From<usize> for SourceOffset {
    fn from(offset: usize) -> Self {
        Self(offset)
    }
}

impl From<SourceOffset> for miette::SourceOffset {
    fn from(offset: SourceOffset) -> Self {
        offset.0.into()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceSpan {
    offset: SourceOffset,
    length: usize,
}

impl SourceSpan {
    pub fn new(offset: SourceOffset, length: usize) -> Self {
        Self { offset, length }
    }
    pub fn start(&self) -> SourceOffset {
        self.offset
    }
    pub fn end(&self) -> SourceOffset {
        (self.offset.0 + self.length).into()
    }
    pub fn len(&self) -> usize {
        self.length
    }
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }
    /// Smallest span covering both `self` and `other`.
    pub fn to(&self, other: SourceSpan) -> SourceSpan {
        let start = self.offset.0.min(other.offset.0);
        let end = self.end().0.max(other.end().0);
        (start..end).into()
    }
}

impl From<Range<usize>> for SourceSpan {
    fn from(range: Range<usize>) -> Self {
        Self::new(range.start.into(), range.end - range.start)
    }
}

impl From<SourceSpan> for miette::SourceSpan {
    fn from(span: SourceSpan) -> Self {
        Self::new(span.offset.into(), span.length.into())
    }
}
