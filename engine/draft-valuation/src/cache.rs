//! Bounded memoization of pool-wide signals
//!
//! Market value and talent depend only on the remaining pool, so they are
//! cached under a content hash of that pool. Entries are never invalidated;
//! new pools get new keys and the least recently used entry is evicted once
//! the cache is full.

use crate::config::ScoringConfig;
use crate::scoring;
use crate::types::Player;
use siphasher::sip::SipHasher13;
use std::collections::{HashMap, VecDeque};
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use tracing::debug;

/// Content hash of a remaining-player list
pub type PoolKey = u64;

/// Pool-wide signals, index-aligned with the hashed player list
#[derive(Debug, Clone, PartialEq)]
pub struct PoolSignals {
    pub market: Vec<f64>,
    pub talent: Vec<f64>,
}

impl PoolSignals {
    pub fn compute(players: &[Player], cfg: &ScoringConfig) -> Self {
        Self { market: scoring::market_values(players, cfg), talent: scoring::talent_scores(players) }
    }
}

/// Hash the fields the pool signals depend on, in list order
pub fn pool_key(players: &[Player], cfg: &ScoringConfig) -> PoolKey {
    let mut hasher = SipHasher13::new_with_keys(0xDEADBEEF, 0xCAFEBABE);
    cfg.z_clip.to_bits().hash(&mut hasher);
    players.len().hash(&mut hasher);
    for p in players {
        p.name.hash(&mut hasher);
        p.position.hash(&mut hasher);
        p.value.map(f64::to_bits).hash(&mut hasher);
        p.blend_rank.map(f64::to_bits).hash(&mut hasher);
    }
    hasher.finish()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

/// LRU cache of [`PoolSignals`]
#[derive(Debug)]
pub struct ValuationCache {
    capacity: usize,
    entries: HashMap<PoolKey, Arc<PoolSignals>>,
    /// Keys from least to most recently used
    order: VecDeque<PoolKey>,
    stats: CacheStats,
}

impl ValuationCache {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            entries: HashMap::with_capacity(capacity),
            order: VecDeque::with_capacity(capacity),
            stats: CacheStats::default(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    pub fn contains(&self, key: PoolKey) -> bool {
        self.entries.contains_key(&key)
    }

    pub fn get(&mut self, key: PoolKey) -> Option<Arc<PoolSignals>> {
        let hit = self.entries.get(&key).cloned()?;
        self.touch(key);
        Some(hit)
    }

    pub fn insert(&mut self, key: PoolKey, signals: Arc<PoolSignals>) {
        if self.entries.insert(key, signals).is_some() {
            self.touch(key);
            return;
        }
        self.order.push_back(key);
        while self.entries.len() > self.capacity {
            let Some(oldest) = self.order.pop_front() else {
                break;
            };
            self.entries.remove(&oldest);
            self.stats.evictions += 1;
        }
    }

    /// Cached signals for `players`, computing and storing them on a miss
    pub fn signals_for(&mut self, players: &[Player], cfg: &ScoringConfig) -> Arc<PoolSignals> {
        let key = pool_key(players, cfg);
        if let Some(hit) = self.get(key) {
            self.stats.hits += 1;
            debug!("Pool signal cache hit for {:016x}", key);
            return hit;
        }

        self.stats.misses += 1;
        debug!("Pool signal cache miss for {:016x} ({} players)", key, players.len());
        let signals = Arc::new(PoolSignals::compute(players, cfg));
        self.insert(key, Arc::clone(&signals));
        signals
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }

    fn touch(&mut self, key: PoolKey) {
        if let Some(pos) = self.order.iter().position(|k| *k == key) {
            self.order.remove(pos);
        }
        self.order.push_back(key);
    }
}

impl Default for ValuationCache {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_CACHE_CAPACITY)
    }
}
