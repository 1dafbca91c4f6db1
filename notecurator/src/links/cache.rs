use moka::sync::Cache;
use notecurator_types::ExternalCheck;
use std::time::Duration;

const MAX_ENTRIES: u64 = 10_000;

/// URL -> last check result, expiring after a fixed time-to-live.
#[derive(Clone)]
pub struct LinkCache {
    inner: Cache<String, ExternalCheck>,
}

impl LinkCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: Cache::builder()
                .max_capacity(MAX_ENTRIES)
                .time_to_live(ttl)
                .build(),
        }
    }

    pub fn get(&self, url: &str) -> Option<ExternalCheck> {
        self.inner.get(url)
    }

    pub fn insert(&self, url: &str, check: ExternalCheck) {
        self.inner.insert(url.to_string(), check);
    }
}
