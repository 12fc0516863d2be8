//! Suggestion cache
//!
//! Maps a hash of the triggering context to previously generated suggestion
//! text. Entries expire after a TTL (checked lazily on read and swept
//! periodically) and the cache holds at most `capacity` entries, evicting the
//! oldest insertion when full.
//!
//! The key covers the `key_chars` characters ending at the cursor plus the
//! document metadata, so edits far before the cursor still hit while any edit
//! near it misses. It uses the std `DefaultHasher`; a collision can surface a
//! wrong suggestion, which the user still has to accept before anything is
//! inserted.

use std::collections::hash_map::DefaultHasher;
use std::collections::{HashMap, VecDeque};
use std::hash::{Hash, Hasher};

use serde::Serialize;

use super::clock::now_ms;
use super::context::{DocumentMeta, trailing_chars};
use crate::config::assist_types::CacheConfig;

/// A cached suggestion
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub key: u64,
    pub text: String,
    pub confidence: Option<f32>,
    pub created_at: u64,
}

/// Cache counters for observability
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CacheStats {
    pub size: usize,
    pub capacity: usize,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub expirations: u64,
    /// hits / (hits + misses), 0.0 before any lookup
    pub hit_rate: f64,
}

#[derive(Debug)]
pub struct SuggestionCache {
    entries: HashMap<u64, CacheEntry>,
    /// Keys in insertion order, oldest first
    order: VecDeque<u64>,
    capacity: usize,
    ttl_ms: u64,
    key_chars: usize,
    hits: u64,
    misses: u64,
    evictions: u64,
    expirations: u64,
}

impl SuggestionCache {
    pub fn new(capacity: usize, ttl_ms: u64, key_chars: usize) -> Self {
        Self {
            entries: HashMap::with_capacity(capacity),
            order: VecDeque::with_capacity(capacity),
            capacity,
            ttl_ms,
            key_chars,
            hits: 0,
            misses: 0,
            evictions: 0,
            expirations: 0,
        }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(config.capacity, config.ttl_ms, config.key_chars)
    }

    /// Hash of the canonical projection of a context
    ///
    /// `before_cursor` is the document text up to the cursor.
    pub fn context_key(&self, before_cursor: &str, meta: &DocumentMeta) -> u64 {
        let mut hasher = DefaultHasher::new();
        trailing_chars(before_cursor, self.key_chars).hash(&mut hasher);
        meta.hash(&mut hasher);
        hasher.finish()
    }

    pub fn get(&mut self, before_cursor: &str, meta: &DocumentMeta) -> Option<String> {
        self.get_at(before_cursor, meta, now_ms())
    }

    pub fn get_at(&mut self, before_cursor: &str, meta: &DocumentMeta, now: u64) -> Option<String> {
        let key = self.context_key(before_cursor, meta);
        self.lookup_at(key, now).map(|entry| entry.text)
    }

    /// Look up by precomputed key; an expired entry is removed and reported as a miss
    pub fn lookup_at(&mut self, key: u64, now: u64) -> Option<CacheEntry> {
        let expired = match self.entries.get(&key) {
            Some(entry) => self.is_expired(entry, now),
            None => {
                self.misses += 1;
                return None;
            }
        };

        if expired {
            self.remove(key);
            self.expirations += 1;
            self.misses += 1;
            return None;
        }

        self.hits += 1;
        self.entries.get(&key).cloned()
    }

    pub fn set(&mut self, before_cursor: &str, meta: &DocumentMeta, text: &str) {
        self.set_at(before_cursor, meta, text, now_ms());
    }

    pub fn set_at(&mut self, before_cursor: &str, meta: &DocumentMeta, text: &str, now: u64) {
        let key = self.context_key(before_cursor, meta);
        self.insert_at(key, text.to_string(), None, now);
    }

    /// Insert by precomputed key, evicting the oldest entry when full
    ///
    /// Re-inserting an existing key refreshes it and moves it to the back of
    /// the eviction order.
    pub fn insert_at(&mut self, key: u64, text: String, confidence: Option<f32>, now: u64) {
        if self.capacity == 0 {
            return;
        }

        if self.entries.contains_key(&key) {
            self.order.retain(|k| *k != key);
        } else if self.entries.len() >= self.capacity
            && let Some(oldest) = self.order.pop_front()
        {
            self.entries.remove(&oldest);
            self.evictions += 1;
            log::debug!("Evicted oldest cache entry {:016x}", oldest);
        }

        self.order.push_back(key);
        self.entries.insert(
            key,
            CacheEntry {
                key,
                text,
                confidence,
                created_at: now,
            },
        );
    }

    /// Drop every expired entry, returning how many were removed
    pub fn evict_expired(&mut self) -> usize {
        self.evict_expired_at(now_ms())
    }

    pub fn evict_expired_at(&mut self, now: u64) -> usize {
        let before = self.entries.len();
        let ttl_ms = self.ttl_ms;
        self.entries
            .retain(|_, entry| now.saturating_sub(entry.created_at) < ttl_ms);
        let entries = &self.entries;
        self.order.retain(|key| entries.contains_key(key));

        let removed = before - self.entries.len();
        self.expirations += removed as u64;
        removed
    }

    pub fn remove(&mut self, key: u64) -> Option<CacheEntry> {
        let entry = self.entries.remove(&key)?;
        self.order.retain(|k| *k != key);
        Some(entry)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        let lookups = self.hits + self.misses;
        CacheStats {
            size: self.entries.len(),
            capacity: self.capacity,
            hits: self.hits,
            misses: self.misses,
            evictions: self.evictions,
            expirations: self.expirations,
            hit_rate: if lookups == 0 {
                0.0
            } else {
                self.hits as f64 / lookups as f64
            },
        }
    }

    fn is_expired(&self, entry: &CacheEntry, now: u64) -> bool {
        now.saturating_sub(entry.created_at) >= self.ttl_ms
    }
}

impl Default for SuggestionCache {
    fn default() -> Self {
        Self::from_config(&CacheConfig::default())
    }
}

#[cfg(test)]
#[path = "cache_tests.rs"]
mod cache_tests;
