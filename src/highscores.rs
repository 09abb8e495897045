//! Survival-time leaderboard
//!
//! Keeps the top 10 run times, longest first. Stored inside the save data
//! as a plain array of milliseconds.

use serde::{Deserialize, Serialize};

/// Maximum number of ranked times to keep
pub const MAX_HIGH_SCORES: usize = 10;

/// Ranked survival times (ms), sorted descending
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(transparent)]
pub struct HighScores {
    pub entries: Vec<f64>,
}

impl HighScores {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Check if a time makes the leaderboard
    pub fn qualifies(&self, time_ms: f64) -> bool {
        if self.entries.len() < MAX_HIGH_SCORES {
            return true;
        }
        self.entries.last().map(|&t| time_ms > t).unwrap_or(true)
    }

    /// Get the rank a time would achieve (1-indexed, None if doesn't qualify)
    pub fn potential_rank(&self, time_ms: f64) -> Option<usize> {
        if !self.qualifies(time_ms) {
            return None;
        }
        let rank = self.entries.iter().position(|&t| time_ms > t);
        Some(rank.unwrap_or(self.entries.len()) + 1)
    }

    /// Insert a run time. Returns the rank achieved (1-indexed) or None.
    pub fn add_time(&mut self, time_ms: f64) -> Option<usize> {
        let rank = self.potential_rank(time_ms)?;
        self.entries.insert(rank - 1, time_ms);
        self.entries.truncate(MAX_HIGH_SCORES);
        Some(rank)
    }

    /// Repair order and length after loading untrusted data
    pub fn normalize(&mut self) {
        self.entries.retain(|t| t.is_finite());
        self.entries.sort_by(|a, b| b.total_cmp(a));
        self.entries.truncate(MAX_HIGH_SCORES);
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Longest ranked time (if any)
    pub fn top_time(&self) -> Option<f64> {
        self.entries.first().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_ranks_and_insertion() {
        let mut scores = HighScores::new();
        assert_eq!(scores.add_time(30_000.0), Some(1));
        assert_eq!(scores.add_time(60_000.0), Some(1));
        assert_eq!(scores.add_time(45_000.0), Some(2));
        assert_eq!(scores.entries, vec![60_000.0, 45_000.0, 30_000.0]);
        assert_eq!(scores.top_time(), Some(60_000.0));
    }

    #[test]
    fn test_full_board_rejects_short_runs() {
        let mut scores = HighScores::new();
        for i in 1..=10 {
            scores.add_time(i as f64 * 1000.0);
        }
        assert_eq!(scores.len(), 10);
        assert!(!scores.qualifies(1000.0));
        assert_eq!(scores.add_time(500.0), None);
        assert_eq!(scores.add_time(5500.0), Some(6));
        assert_eq!(scores.len(), 10);
        assert_eq!(scores.entries.last(), Some(&2000.0));
    }

    #[test]
    fn test_serializes_as_plain_array() {
        let mut scores = HighScores::new();
        scores.add_time(1234.5);
        assert_eq!(serde_json::to_string(&scores).unwrap(), "[1234.5]");
    }

    #[test]
    fn test_normalize_repairs_bad_input() {
        let mut scores: HighScores =
            serde_json::from_str("[1,5,3,2,9,8,7,6,4,10,11,12]").unwrap();
        scores.normalize();
        assert_eq!(scores.len(), 10);
        assert_eq!(scores.top_time(), Some(12.0));
        assert_eq!(scores.entries.last(), Some(&3.0));
    }

    proptest! {
        #[test]
        fn prop_board_stays_sorted_and_bounded(times in prop::collection::vec(0.0f64..1e7, 0..40)) {
            let mut scores = HighScores::new();
            for t in times {
                scores.add_time(t);
            }
            prop_assert!(scores.len() <= MAX_HIGH_SCORES);
            prop_assert!(scores.entries.windows(2).all(|w| w[0] >= w[1]));
        }
    }
}
