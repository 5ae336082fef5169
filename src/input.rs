//! Input abstraction over the two supported unit families.
//!
//! The engine consumes a sequence of atomic units. For `str` input the unit
//! is one character and positions are byte offsets (primitives only ever
//! advance across whole characters, so positions produced by parsers always
//! land on character boundaries). For `[U]` input the unit is one element
//! and positions are element indexes.

/// A parseable input sequence.
///
/// `slice` is used by span capture; `start` and `end` must be positions
/// previously produced by parsers on this same input.
pub trait Input: 'static {
    /// Owned snapshot of a sub-range of the input.
    type Slice: 'static;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn slice(&self, start: usize, end: usize) -> Self::Slice;
}

impl Input for str {
    type Slice = String;

    fn len(&self) -> usize {
        str::len(self)
    }

    fn slice(&self, start: usize, end: usize) -> String {
        self[start..end].to_string()
    }
}

impl<U: Clone + 'static> Input for [U] {
    type Slice = Vec<U>;

    fn len(&self) -> usize {
        <[U]>::len(self)
    }

    fn slice(&self, start: usize, end: usize) -> Vec<U> {
        self[start..end].to_vec()
    }
}
