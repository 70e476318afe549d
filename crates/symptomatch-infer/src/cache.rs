//! LRU cache for predictor output.
//!
//! Predictions depend only on the presence vector and demographics, so
//! repeated queries can skip the model entirely.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use ndarray::Array1;
use parking_lot::Mutex;
use symptomatch_core::Demographics;

use crate::predictor::{Prediction, PredictorBackend};

/// Cached prediction entry with timestamp.
struct CacheEntry {
    predictions: Vec<Prediction>,
    inserted_at: Instant,
}

/// Thread-safe LRU prediction cache.
pub struct PredictionCache {
    inner: Mutex<CacheInner>,
}

struct CacheInner {
    entries: HashMap<String, CacheEntry>,
    order: Vec<String>,
    max_size: usize,
    ttl: Duration,
}

impl PredictionCache {
    /// Create a new cache with the given capacity and TTL.
    pub fn new(max_size: usize, ttl: Duration) -> Self {
        Self {
            inner: Mutex::new(CacheInner {
                entries: HashMap::with_capacity(max_size),
                order: Vec::with_capacity(max_size),
                max_size,
                ttl,
            }),
        }
    }

    /// Cache key: indices of present features plus demographic tags.
    pub fn key_for(features: &Array1<f64>, demographics: &Demographics) -> String {
        let present: Vec<String> = features
            .iter()
            .enumerate()
            .filter(|(_, v)| **v != 0.0)
            .map(|(i, _)| i.to_string())
            .collect();
        format!(
            "{}|{}|{}",
            present.join(","),
            demographics.age_group,
            demographics.gender
        )
    }

    /// Get cached predictions. Returns None on miss or expired entry.
    pub fn get(&self, key: &str) -> Option<Vec<Prediction>> {
        let mut inner = self.inner.lock();

        let fresh = inner
            .entries
            .get(key)
            .map(|e| (e.inserted_at.elapsed() < inner.ttl, e.predictions.clone()));

        match fresh {
            Some((true, predictions)) => {
                if let Some(pos) = inner.order.iter().position(|k| k == key) {
                    let k = inner.order.remove(pos);
                    inner.order.push(k);
                }
                Some(predictions)
            }
            Some((false, _)) => {
                inner.entries.remove(key);
                inner.order.retain(|k| k != key);
                None
            }
            None => None,
        }
    }

    /// Insert predictions into the cache.
    pub fn put(&self, key: String, predictions: Vec<Prediction>) {
        let mut inner = self.inner.lock();
        if inner.max_size == 0 {
            return;
        }

        if inner.entries.contains_key(&key) {
            inner.entries.insert(
                key.clone(),
                CacheEntry {
                    predictions,
                    inserted_at: Instant::now(),
                },
            );
            inner.order.retain(|k| k != &key);
            inner.order.push(key);
            return;
        }

        // Evict oldest if at capacity
        while inner.entries.len() >= inner.max_size && !inner.order.is_empty() {
            let oldest = inner.order.remove(0);
            inner.entries.remove(&oldest);
        }

        inner.order.push(key.clone());
        inner.entries.insert(
            key,
            CacheEntry {
                predictions,
                inserted_at: Instant::now(),
            },
        );
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Memoizing wrapper around another backend. Unanswered queries are not cached.
pub struct CachedPredictor {
    inner: Arc<dyn PredictorBackend>,
    cache: PredictionCache,
}

impl CachedPredictor {
    pub fn new(inner: Arc<dyn PredictorBackend>, cache: PredictionCache) -> Self {
        Self { inner, cache }
    }
}

impl PredictorBackend for CachedPredictor {
    fn predict(&self, features: &Array1<f64>, demographics: &Demographics) -> Option<Vec<Prediction>> {
        let key = PredictionCache::key_for(features, demographics);
        if let Some(hit) = self.cache.get(&key) {
            return Some(hit);
        }
        let predictions = self.inner.predict(features, demographics)?;
        self.cache.put(key, predictions.clone());
        Some(predictions)
    }

    fn is_available(&self) -> bool {
        self.inner.is_available()
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn prediction(label: &str, p: f64) -> Vec<Prediction> {
        vec![Prediction {
            label: label.into(),
            probability: p,
        }]
    }

    #[test]
    fn test_cache_hit_and_miss() {
        let cache = PredictionCache::new(10, Duration::from_secs(3600));
        assert!(cache.get("a").is_none());

        cache.put("a".into(), prediction("Flu", 0.9));
        assert_eq!(cache.get("a"), Some(prediction("Flu", 0.9)));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_cache_eviction() {
        let cache = PredictionCache::new(2, Duration::from_secs(3600));
        cache.put("a".into(), prediction("A", 0.1));
        cache.put("b".into(), prediction("B", 0.2));
        cache.put("c".into(), prediction("C", 0.3));
        assert_eq!(cache.len(), 2);
        assert!(cache.get("a").is_none());
        assert!(cache.get("b").is_some());
        assert!(cache.get("c").is_some());
    }

    #[test]
    fn test_cache_ttl_expiry() {
        let cache = PredictionCache::new(10, Duration::from_millis(1));
        cache.put("ephemeral".into(), prediction("A", 0.5));
        std::thread::sleep(Duration::from_millis(5));
        assert!(cache.get("ephemeral").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_zero_capacity_stores_nothing() {
        let cache = PredictionCache::new(0, Duration::from_secs(60));
        cache.put("a".into(), prediction("A", 0.5));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_key_includes_demographics() {
        let x = array![1.0, 0.0, 1.0];
        let adult = Demographics::new(Some("adult"), None);
        assert_eq!(PredictionCache::key_for(&x, &adult), "0,2|adult|unknown");
        assert_ne!(
            PredictionCache::key_for(&x, &adult),
            PredictionCache::key_for(&x, &Demographics::default())
        );
    }

    struct CountingPredictor {
        calls: AtomicUsize,
    }

    impl PredictorBackend for CountingPredictor {
        fn predict(&self, _: &Array1<f64>, _: &Demographics) -> Option<Vec<Prediction>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Some(prediction("Flu", 0.7))
        }
        fn is_available(&self) -> bool {
            true
        }
        fn name(&self) -> &str {
            "counting"
        }
    }

    #[test]
    fn test_cached_predictor_calls_inner_once() {
        let inner = Arc::new(CountingPredictor {
            calls: AtomicUsize::new(0),
        });
        let cached = CachedPredictor::new(inner.clone(), PredictionCache::new(8, Duration::from_secs(60)));
        let x = array![1.0, 0.0];
        let d = Demographics::default();
        assert_eq!(cached.predict(&x, &d), cached.predict(&x, &d));
        assert_eq!(inner.calls.load(Ordering::SeqCst), 1);
        assert_eq!(cached.name(), "counting");
    }
}
