use std::{
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::{Duration, Instant},
};

use dashmap::DashMap;
use log::*;

use crate::db_types::{ArticleServicePrice, PriceKey};

#[derive(Debug, Clone)]
struct CachedPrice {
    price: ArticleServicePrice,
    stored_at: Instant,
}

/// A read-through cache of price rows, keyed by the full (article, service type, service) triple.
///
/// The cache is never authoritative. A miss or an expired entry sends the caller to the store, and price edits must
/// call [`PriceCache::invalidate`] once they commit.
///
/// Every invalidation advances the cache generation. A reader takes the generation with [`PriceCache::generation`]
/// before it opens the transaction it reads prices in, and hands it back to [`PriceCache::insert`]. Rows read under an
/// older generation are never cached, since an edit may have committed after the reader's snapshot was taken.
#[derive(Debug, Clone)]
pub struct PriceCache {
    entries: Arc<DashMap<PriceKey, CachedPrice>>,
    generation: Arc<AtomicU64>,
    ttl: Duration,
}

impl PriceCache {
    pub fn new(ttl: Duration) -> Self {
        Self { entries: Arc::new(DashMap::new()), generation: Arc::new(AtomicU64::new(0)), ttl }
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    pub fn get(&self, key: &PriceKey) -> Option<ArticleServicePrice> {
        let hit = self.entries.get(key).filter(|e| e.stored_at.elapsed() < self.ttl).map(|e| e.price.clone());
        match &hit {
            Some(_) => trace!("🧮️ Price cache hit for the {key}"),
            None => trace!("🧮️ Price cache miss for the {key}"),
        }
        hit
    }

    /// Caches a row that was read under `generation`. Returns false if the row was not cached.
    pub fn insert(&self, price: ArticleServicePrice, generation: u64) -> bool {
        if self.ttl.is_zero() {
            return false;
        }
        let key = price.key();
        // The generation is checked while the entry is locked, so a concurrent invalidation either refuses this
        // insert or removes it afterwards.
        let entry = self.entries.entry(key);
        if self.generation() != generation {
            trace!("🧮️ The {key} was read before a price edit. Not caching it.");
            return false;
        }
        entry.insert(CachedPrice { price, stored_at: Instant::now() });
        true
    }

    pub fn invalidate(&self, key: &PriceKey) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        if self.entries.remove(key).is_some() {
            debug!("🧮️ Dropped the cached {key}");
        }
    }

    /// Drops expired entries.
    pub fn purge_expired(&self) {
        let ttl = self.ttl;
        self.entries.retain(|_, e| e.stored_at.elapsed() < ttl);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
