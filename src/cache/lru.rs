//! LRU Tracker Module
//!
//! Least Recently Used ordering for the opt-in capacity bound.

use std::collections::VecDeque;

// == LRU Tracker ==
/// Tracks access order for LRU eviction strategy.
///
/// Keys are stored in a VecDeque where:
/// - Front = Most recently used
/// - Back = Least recently used
#[derive(Debug, Default)]
pub struct LruTracker {
    order: VecDeque<String>,
}

impl LruTracker {
    pub fn new() -> Self {
        Self::default()
    }

    // == Touch ==
    /// Marks a key as most recently used.
    pub fn touch(&mut self, key: &str) {
        self.remove(key);
        self.order.push_front(key.to_string());
    }

    pub fn remove(&mut self, key: &str) {
        self.order.retain(|k| k != key);
    }

    // == Evict Oldest ==
    /// Returns and removes the least recently used key.
    pub fn evict_oldest(&mut self) -> Option<String> {
        self.order.pop_back()
    }

    pub fn clear(&mut self) {
        self.order.clear();
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_touch_orders_keys() {
        let mut lru = LruTracker::new();

        lru.touch("top-rated:168:100");
        lru.touch("artist:1:RatingScore:0:20");
        lru.touch("tag:481:RatingScore:0:20");

        assert_eq!(lru.evict_oldest(), Some("top-rated:168:100".to_string()));
    }

    #[test]
    fn test_touch_existing_key_moves_it_to_front() {
        let mut lru = LruTracker::new();

        lru.touch("a");
        lru.touch("b");
        lru.touch("c");
        lru.touch("a");

        assert_eq!(lru.evict_oldest(), Some("b".to_string()));
        assert_eq!(lru.evict_oldest(), Some("c".to_string()));
        assert_eq!(lru.evict_oldest(), Some("a".to_string()));
        assert_eq!(lru.evict_oldest(), None);
    }

    #[test]
    fn test_remove_and_clear() {
        let mut lru = LruTracker::new();

        lru.touch("a");
        lru.touch("b");
        lru.remove("a");
        lru.remove("missing");

        assert_eq!(lru.evict_oldest(), Some("b".to_string()));
        assert_eq!(lru.evict_oldest(), None);

        lru.touch("c");
        lru.clear();
        assert_eq!(lru.evict_oldest(), None);
    }
}
