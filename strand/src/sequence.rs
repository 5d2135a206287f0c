//! Lazy number sequences.

use std::iter::FusedIterator;

/// The Fibonacci sequence `0, 1, 1, 2, 3, 5, ...` as a lazy iterator.
///
/// Values are produced on demand. The iterator ends after the largest
/// Fibonacci number that fits in a `u64` instead of overflowing.
///
/// # Examples
///
/// ```rust
/// use strand::sequence::Fibonacci;
///
/// let first: Vec<u64> = Fibonacci::new().take(8).collect();
/// assert_eq!(first, [0, 1, 1, 2, 3, 5, 8, 13]);
/// ```
#[derive(Debug, Clone)]
pub struct Fibonacci {
    /// The next value and the one after it, if representable.
    next: Option<(u64, Option<u64>)>,
}

impl Fibonacci {
    /// Creates the sequence, positioned before its first value, `0`.
    pub fn new() -> Self {
        Self {
            next: Some((0, Some(1))),
        }
    }
}

impl Default for Fibonacci {
    fn default() -> Self {
        Self::new()
    }
}

impl Iterator for Fibonacci {
    type Item = u64;

    fn next(&mut self) -> Option<u64> {
        let (current, following) = self.next?;

        self.next = following.map(|following| (following, current.checked_add(following)));

        Some(current)
    }
}

impl FusedIterator for Fibonacci {}
