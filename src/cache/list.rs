//! Shared-tier cache for the article list.

use std::{
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use metrics::counter;
use tracing::{debug, warn};

use crate::domain::entities::ArticleSummary;

use super::shared::{CacheError, SharedCache};

pub const ARTICLE_LIST_KEY: &str = "articles";

pub(crate) const METRIC_LIST_HIT: &str = "inkblog_cache_list_hit_total";
pub(crate) const METRIC_LIST_MISS: &str = "inkblog_cache_list_miss_total";
pub(crate) const METRIC_LIST_ERROR: &str = "inkblog_cache_list_error_total";

const TARGET: &str = "inkblog::cache::list";

/// Monotonic count of list invalidations seen by this process.
pub type Epoch = u64;

/// Read-through list cache. Every backend failure degrades to a miss.
#[derive(Clone)]
pub struct ArticleListCache {
    backend: Arc<dyn SharedCache>,
    ttl: Duration,
    epoch: Arc<AtomicU64>,
}

impl ArticleListCache {
    pub fn new(backend: Arc<dyn SharedCache>, ttl: Duration) -> Self {
        Self {
            backend,
            ttl,
            epoch: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Capture before reading the store; pass to [`Self::fill_list`].
    pub fn epoch(&self) -> Epoch {
        self.epoch.load(Ordering::SeqCst)
    }

    pub async fn get_list(&self) -> Option<Vec<ArticleSummary>> {
        let raw = match self.backend.get(ARTICLE_LIST_KEY).await {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                counter!(METRIC_LIST_MISS).increment(1);
                return None;
            }
            Err(err) => {
                self.report("get_list", &err);
                return None;
            }
        };

        match serde_json::from_str::<Vec<ArticleSummary>>(&raw) {
            Ok(list) => {
                counter!(METRIC_LIST_HIT).increment(1);
                Some(list)
            }
            Err(err) => {
                self.report("get_list.decode", &CacheError::Decode(err.to_string()));
                None
            }
        }
    }

    pub async fn put_list(&self, items: &[ArticleSummary]) {
        let encoded = match serde_json::to_string(items) {
            Ok(encoded) => encoded,
            Err(err) => {
                self.report("put_list.encode", &CacheError::Encode(err.to_string()));
                return;
            }
        };

        if let Err(err) = self.backend.set_ex(ARTICLE_LIST_KEY, encoded, self.ttl).await {
            self.report("put_list", &err);
        }
    }

    /// Store a list read from the store unless an invalidation ran since `seen`.
    ///
    /// An invalidation that lands between the epoch check and the write is
    /// caught by the second check, which removes the entry again.
    pub async fn fill_list(&self, items: &[ArticleSummary], seen: Epoch) {
        if self.epoch() != seen {
            debug!(target: TARGET, seen, "list changed during read; skipping fill");
            return;
        }

        self.put_list(items).await;

        if self.epoch() != seen {
            debug!(target: TARGET, seen, "list changed during fill; dropping entry");
            self.delete_entry("fill_list.retract").await;
        }
    }

    pub async fn invalidate_list(&self) {
        self.epoch.fetch_add(1, Ordering::SeqCst);
        self.delete_entry("invalidate_list").await;
    }

    async fn delete_entry(&self, op: &'static str) {
        if let Err(err) = self.backend.delete(ARTICLE_LIST_KEY).await {
            self.report(op, &err);
        }
    }

    fn report(&self, op: &'static str, err: &CacheError) {
        counter!(METRIC_LIST_ERROR).increment(1);
        warn!(
            target: TARGET,
            op,
            backend = self.backend.backend(),
            error = %err,
            "shared cache operation failed; continuing without cache"
        );
    }
}
