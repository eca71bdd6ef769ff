use std::collections::HashMap;
use std::sync::Arc;

use super::compare::compare;
use super::types::{Comparison, Configuration};

type CacheKey = (Vec<u64>, u32);

/// Caller-side memoisation of [`compare`] keyed on the exact configuration
/// and horizon. The engines stay stateless; this only skips recomputation
/// when the same inputs come back.
#[derive(Debug)]
pub struct ComparisonCache {
    entries: HashMap<CacheKey, Arc<Comparison>>,
    capacity: usize,
    hits: u64,
    misses: u64,
}

impl ComparisonCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: HashMap::new(),
            capacity: capacity.max(1),
            hits: 0,
            misses: 0,
        }
    }

    pub fn get_or_compute(&mut self, config: &Configuration, years: u32) -> Arc<Comparison> {
        let key = (config.fingerprint(), years);
        if let Some(found) = self.entries.get(&key) {
            self.hits += 1;
            return Arc::clone(found);
        }

        self.misses += 1;
        // No recency tracking; a full cache simply starts over.
        if self.entries.len() >= self.capacity {
            self.entries.clear();
        }
        let comparison = Arc::new(compare(config, years));
        self.entries.insert(key, Arc::clone(&comparison));
        comparison
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }
}

impl Default for ComparisonCache {
    fn default() -> Self {
        Self::new(256)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_request_is_served_from_cache() {
        let mut cache = ComparisonCache::new(8);
        let config = Configuration::default();

        let first = cache.get_or_compute(&config, 10);
        let second = cache.get_or_compute(&config, 10);

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.hits(), 1);
        assert_eq!(cache.misses(), 1);
        assert_eq!(*first, compare(&config, 10));
    }

    #[test]
    fn horizon_and_fields_are_part_of_the_key() {
        let mut cache = ComparisonCache::new(8);
        let config = Configuration::default();
        let changed = Configuration {
            monthly_rent_paid: config.monthly_rent_paid + 1.0,
            ..config.clone()
        };

        cache.get_or_compute(&config, 5);
        cache.get_or_compute(&config, 10);
        cache.get_or_compute(&changed, 10);

        assert_eq!(cache.len(), 3);
        assert_eq!(cache.hits(), 0);
        assert_eq!(cache.misses(), 3);
    }

    #[test]
    fn full_cache_starts_over() {
        let mut cache = ComparisonCache::new(2);
        let config = Configuration::default();

        cache.get_or_compute(&config, 1);
        cache.get_or_compute(&config, 2);
        cache.get_or_compute(&config, 3);

        assert_eq!(cache.len(), 1);
        assert!(!cache.is_empty());
    }
}
