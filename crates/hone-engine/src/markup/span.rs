use serde::{Deserialize, Serialize};

/// A byte range `[start, end)` into a source string.
///
/// Parsed nodes store spans rather than copied text, so slicing the source
/// with any span reproduces the exact bytes that were parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Span {
    /// Inclusive start byte offset.
    pub start: usize,
    /// Exclusive end byte offset.
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Returns the length in bytes. Uses saturating subtraction for safety.
    #[must_use]
    pub fn len(self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Returns true if the span is empty (start >= end).
    #[must_use]
    pub fn is_empty(self) -> bool {
        self.len() == 0
    }

    /// Slices `source` with this span.
    ///
    /// Panics if the span is out of bounds or not on a char boundary, which
    /// only happens when the span was derived from a different string.
    pub fn slice(self, source: &str) -> &str {
        &source[self.start..self.end]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn len_and_empty() {
        assert_eq!(Span::new(3, 8).len(), 5);
        assert!(Span::new(4, 4).is_empty());
        // inverted spans saturate instead of underflowing
        assert_eq!(Span::new(9, 2).len(), 0);
    }

    #[test]
    fn slice_reproduces_source() {
        let src = "<p>Hello</p>";
        assert_eq!(Span::new(3, 8).slice(src), "Hello");
    }
}
