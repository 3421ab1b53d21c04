//! Vote counting for one quorum fetch

use seqquorum_core::Fingerprint;
use std::collections::HashMap;

/// Votes needed for a majority among `nodes` voters
pub fn majority_threshold(nodes: usize) -> usize {
    nodes / 2 + 1
}

/// Per-fingerprint vote counts.
///
/// Owned by the task consuming node results; never shared.
#[derive(Debug, Default)]
pub struct VoteTally {
    counts: HashMap<Fingerprint, usize>,
    total: usize,
}

impl VoteTally {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one vote and return the new count for `fingerprint`
    pub fn record(&mut self, fingerprint: Fingerprint) -> usize {
        self.total += 1;
        let count = self.counts.entry(fingerprint).or_insert(0);
        *count += 1;
        *count
    }

    /// Fingerprint with the most votes, if any
    pub fn leader(&self) -> Option<(Fingerprint, usize)> {
        self.counts
            .iter()
            .max_by_key(|(_, count)| **count)
            .map(|(fingerprint, count)| (*fingerprint, *count))
    }

    /// Number of distinct answers seen
    pub fn distinct(&self) -> usize {
        self.counts.len()
    }

    /// Total votes
    pub fn total(&self) -> usize {
        self.total
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_majority_threshold() {
        assert_eq!(majority_threshold(1), 1);
        assert_eq!(majority_threshold(2), 2);
        assert_eq!(majority_threshold(3), 2);
        assert_eq!(majority_threshold(4), 3);
        assert_eq!(majority_threshold(5), 3);
    }

    #[test]
    fn test_vote_tally() {
        let mut tally = VoteTally::new();
        let a = Fingerprint::from_bytes([1u8; 32]);
        let b = Fingerprint::from_bytes([2u8; 32]);

        assert_eq!(tally.record(a), 1);
        assert_eq!(tally.record(b), 1);
        assert_eq!(tally.record(a), 2);

        assert_eq!(tally.leader(), Some((a, 2)));
        assert_eq!(tally.distinct(), 2);
        assert_eq!(tally.total(), 3);
    }

    #[test]
    fn test_empty_tally() {
        let tally = VoteTally::new();
        assert!(tally.leader().is_none());
        assert_eq!(tally.total(), 0);
    }
}
