//! In-memory cache of parsed fetch results.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use sha2::{Digest, Sha256};

use crate::domain::{FetchRequest, MarketData};

/// Cache key: `entsoe_` + hex SHA-256 of metric, window and area.
pub fn cache_key(request: &FetchRequest) -> String {
    let mut hasher = Sha256::new();
    hasher.update(request.metric.key().as_bytes());
    hasher.update(b"|");
    hasher.update(request.period_start.to_rfc3339().as_bytes());
    hasher.update(b"|");
    hasher.update(request.period_end.to_rfc3339().as_bytes());
    hasher.update(b"|");
    hasher.update(request.area_code.as_bytes());
    format!("entsoe_{}", hex::encode(hasher.finalize()))
}

struct Entry {
    data: MarketData,
    stored_at: Instant,
}

pub struct ResultCache {
    ttl: Duration,
    entries: Mutex<HashMap<String, Entry>>,
}

impl ResultCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Fresh entry for `request`, if any. Expired entries are evicted on read.
    pub fn get(&self, request: &FetchRequest) -> Option<MarketData> {
        let key = cache_key(request);
        let mut entries = self.entries.lock();
        match entries.get(&key) {
            Some(entry) if entry.stored_at.elapsed() < self.ttl => Some(entry.data.clone()),
            Some(_) => {
                entries.remove(&key);
                None
            }
            None => None,
        }
    }

    /// Store `data`, dropping every entry that has outlived the TTL.
    pub fn insert(&self, request: &FetchRequest, data: MarketData) {
        let mut entries = self.entries.lock();
        let ttl = self.ttl;
        entries.retain(|_, entry| entry.stored_at.elapsed() < ttl);
        entries.insert(
            cache_key(request),
            Entry {
                data,
                stored_at: Instant::now(),
            },
        );
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

impl std::fmt::Debug for ResultCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultCache")
            .field("ttl", &self.ttl)
            .field("entries", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{MetricKind, Series};
    use chrono::{TimeZone, Utc};

    fn request(area: &str) -> FetchRequest {
        FetchRequest::new(
            MetricKind::ActualLoad,
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap(),
            area,
        )
        .unwrap()
    }

    fn data() -> MarketData {
        MarketData::Single(Series::new("Actual Load", "MW"))
    }

    #[test]
    fn keys_are_prefixed_and_distinct() {
        let at = cache_key(&request("10YAT-APG------L"));
        let de = cache_key(&request("10YDE-VE-------2"));
        assert!(at.starts_with("entsoe_"));
        assert_eq!(at.len(), "entsoe_".len() + 64);
        assert_ne!(at, de);
        assert_eq!(at, cache_key(&request("10YAT-APG------L")));
    }

    #[test]
    fn entries_expire_after_ttl() {
        let cache = ResultCache::new(Duration::from_secs(3600));
        cache.insert(&request("AT"), data());
        assert_eq!(cache.get(&request("AT")), Some(data()));
        assert_eq!(cache.get(&request("DE")), None);

        let expired = ResultCache::new(Duration::ZERO);
        expired.insert(&request("AT"), data());
        assert_eq!(expired.get(&request("AT")), None);
        assert!(expired.is_empty());
    }

    #[test]
    fn inserts_prune_stale_entries_for_other_keys() {
        let cache = ResultCache::new(Duration::from_millis(20));
        cache.insert(&request("AT"), data());
        cache.insert(&request("DE"), data());
        assert_eq!(cache.len(), 2);

        std::thread::sleep(Duration::from_millis(40));
        cache.insert(&request("CZ"), data());
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&request("CZ")), Some(data()));
    }
}
