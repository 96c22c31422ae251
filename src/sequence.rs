//! Per-registry record identifier allocation.

/// Monotonic counter handing out identifiers 1, 2, 3, ... in creation order.
///
/// Registries call [`SequenceAllocator::allocate`] only after a create has
/// passed validation, so a rejected create never consumes an identifier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SequenceAllocator {
    last: u64,
}

impl SequenceAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Continue a sequence whose last issued identifier was `last`.
    pub fn resume(last: u64) -> Self {
        Self { last }
    }

    /// Identifier issued most recently, 0 if none.
    pub fn last(&self) -> u64 {
        self.last
    }

    /// Identifier the next allocation will return.
    pub fn peek(&self) -> u64 {
        self.last + 1
    }

    pub fn allocate(&mut self) -> u64 {
        self.last += 1;
        self.last
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_at_one() {
        let mut seq = SequenceAllocator::new();
        assert_eq!(seq.last(), 0);
        assert_eq!(seq.peek(), 1);
        assert_eq!(seq.allocate(), 1);
    }

    #[test]
    fn test_increments_by_one() {
        let mut seq = SequenceAllocator::new();
        let ids: Vec<u64> = (0..5).map(|_| seq.allocate()).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_peek_does_not_allocate() {
        let mut seq = SequenceAllocator::new();
        assert_eq!(seq.peek(), 1);
        assert_eq!(seq.peek(), 1);
        assert_eq!(seq.allocate(), 1);
    }

    #[test]
    fn test_resume_continues() {
        let mut seq = SequenceAllocator::resume(7);
        assert_eq!(seq.allocate(), 8);
    }
}
