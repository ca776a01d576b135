//! Per-process article cache keyed by id.

use std::{
    num::NonZeroUsize,
    sync::{
        RwLock,
        atomic::{AtomicU64, Ordering},
    },
    time::{Duration, Instant},
};

use lru::LruCache;
use metrics::counter;

use crate::domain::entities::Article;

use super::list::Epoch;
use super::lock::{rw_read, rw_write};

const SOURCE: &str = "cache::local";

pub(crate) const METRIC_ARTICLE_HIT: &str = "inkblog_cache_article_hit_total";
pub(crate) const METRIC_ARTICLE_MISS: &str = "inkblog_cache_article_miss_total";
pub(crate) const METRIC_ARTICLE_EVICT: &str = "inkblog_cache_article_evict_total";

struct LocalEntry {
    article: Article,
    inserted_at: Instant,
    ttl: Duration,
}

impl LocalEntry {
    fn is_live(&self, now: Instant) -> bool {
        now.duration_since(self.inserted_at) < self.ttl
    }
}

pub struct LocalArticleCache {
    entries: RwLock<LruCache<i64, LocalEntry>>,
    ttl: Duration,
    /// Bumped under the write lock by every invalidation.
    epoch: AtomicU64,
}

impl LocalArticleCache {
    pub fn new(capacity: NonZeroUsize, ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(LruCache::new(capacity)),
            ttl,
            epoch: AtomicU64::new(0),
        }
    }

    /// Capture before reading the store; pass to [`Self::fill_article`].
    pub fn epoch(&self) -> Epoch {
        self.epoch.load(Ordering::SeqCst)
    }

    pub fn get_article(&self, id: i64) -> Option<Article> {
        let now = Instant::now();
        let hit = rw_read(&self.entries, SOURCE, "get_article")
            .peek(&id)
            .map(|entry| entry.is_live(now).then(|| entry.article.clone()));

        match hit {
            Some(Some(article)) => {
                counter!(METRIC_ARTICLE_HIT).increment(1);
                Some(article)
            }
            Some(None) => {
                rw_write(&self.entries, SOURCE, "get_article.expire").pop(&id);
                counter!(METRIC_ARTICLE_MISS).increment(1);
                None
            }
            None => {
                counter!(METRIC_ARTICLE_MISS).increment(1);
                None
            }
        }
    }

    pub fn put_article(&self, id: i64, article: Article) {
        let mut entries = rw_write(&self.entries, SOURCE, "put_article");
        self.insert(&mut entries, id, article);
    }

    /// Store an article read from the store unless an invalidation ran since `seen`.
    pub fn fill_article(&self, id: i64, article: Article, seen: Epoch) -> bool {
        let mut entries = rw_write(&self.entries, SOURCE, "fill_article");
        if self.epoch.load(Ordering::SeqCst) != seen {
            return false;
        }
        self.insert(&mut entries, id, article);
        true
    }

    pub fn invalidate_article(&self, id: i64) {
        let mut entries = rw_write(&self.entries, SOURCE, "invalidate_article");
        self.epoch.fetch_add(1, Ordering::SeqCst);
        entries.pop(&id);
    }

    fn insert(&self, entries: &mut LruCache<i64, LocalEntry>, id: i64, article: Article) {
        let entry = LocalEntry {
            article,
            inserted_at: Instant::now(),
            ttl: self.ttl,
        };
        if matches!(entries.push(id, entry), Some((evicted_id, _)) if evicted_id != id) {
            counter!(METRIC_ARTICLE_EVICT).increment(1);
        }
    }

    pub fn len(&self) -> usize {
        rw_read(&self.entries, SOURCE, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
