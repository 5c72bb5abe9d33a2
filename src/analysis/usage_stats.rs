use std::collections::HashMap;
use std::hash::Hash;

#[derive(Debug, Clone, PartialEq)]
pub struct UsageStats<K> {
    pub key: K,
    pub matches: usize,
    pub wins: usize,
}

impl<K> UsageStats<K> {
    pub fn new(key: K) -> Self {
        UsageStats {
            key,
            matches: 0,
            wins: 0,
        }
    }

    /// Percentage rounded to one decimal, halves to even; zero when nothing
    /// was played.
    pub fn win_rate(&self) -> f64 {
        if self.matches == 0 {
            0.0
        } else {
            let rate = self.wins as f64 / self.matches as f64 * 100.0;
            (rate * 10.0).round_ties_even() / 10.0
        }
    }
}

/// Match and win counts per key (hero id, item id).
pub struct UsageTracker<K> {
    stats: HashMap<K, UsageStats<K>>,
}

impl<K: Eq + Hash + Clone> UsageTracker<K> {
    pub fn new() -> Self {
        UsageTracker {
            stats: HashMap::new(),
        }
    }

    pub fn add_match(&mut self, key: K, won: bool) {
        let entry = self
            .stats
            .entry(key.clone())
            .or_insert_with(|| UsageStats::new(key));

        entry.matches += 1;
        if won {
            entry.wins += 1;
        }
    }

    pub fn get_stats(&self) -> Vec<UsageStats<K>> {
        self.stats.values().cloned().collect()
    }
}

impl<K: Eq + Hash + Clone> Default for UsageTracker<K> {
    fn default() -> Self {
        Self::new()
    }
}
