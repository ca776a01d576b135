//! Two-tier article cache.
//!
//! - **Shared tier**: the article list, stored under one key in Redis (or the
//!   in-process [`MemorySharedCache`] when Redis is not reachable).
//! - **Local tier**: individual articles keyed by id, held in this process.
//!
//! Both tiers are best effort. A write to the article store must call
//! [`ArticleCache::invalidate_for_write`] before it is acknowledged.

mod list;
mod local;
mod lock;
mod redis;
mod shared;

use std::{sync::Arc, time::Duration};

use tokio::time::timeout;
use tracing::{debug, warn};

use crate::config::CacheSettings;

pub use list::{ARTICLE_LIST_KEY, ArticleListCache, Epoch};
pub use local::LocalArticleCache;
pub use self::redis::RedisCache;
pub use shared::{CacheError, MemorySharedCache, SharedCache};

pub(crate) use list::{METRIC_LIST_ERROR, METRIC_LIST_HIT, METRIC_LIST_MISS};
pub(crate) use local::{METRIC_ARTICLE_EVICT, METRIC_ARTICLE_HIT, METRIC_ARTICLE_MISS};

const TARGET: &str = "inkblog::cache";
const REDIS_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Both cache tiers, injected into the article service.
#[derive(Clone)]
pub struct ArticleCache {
    list: ArticleListCache,
    local: Arc<LocalArticleCache>,
}

impl ArticleCache {
    pub fn new(list: ArticleListCache, local: LocalArticleCache) -> Self {
        Self {
            list,
            local: Arc::new(local),
        }
    }

    /// Build both tiers from settings, connecting to Redis when configured.
    ///
    /// A Redis connection failure is not fatal: the list tier falls back to
    /// an in-process store for the lifetime of the process.
    pub async fn from_settings(settings: &CacheSettings) -> Self {
        let backend: Arc<dyn SharedCache> = match settings.redis_url.as_deref() {
            Some(url) => match timeout(REDIS_CONNECT_TIMEOUT, RedisCache::connect(url)).await {
                Ok(Ok(redis)) => {
                    debug!(target: TARGET, "connected to redis list cache");
                    Arc::new(redis)
                }
                Ok(Err(err)) => {
                    warn!(
                        target: TARGET,
                        error = %err,
                        "redis unavailable; using in-process list cache"
                    );
                    Arc::new(MemorySharedCache::new())
                }
                Err(_) => {
                    warn!(
                        target: TARGET,
                        timeout_secs = REDIS_CONNECT_TIMEOUT.as_secs(),
                        "redis connection timed out; using in-process list cache"
                    );
                    Arc::new(MemorySharedCache::new())
                }
            },
            None => Arc::new(MemorySharedCache::new()),
        };

        Self::new(
            ArticleListCache::new(backend, settings.list_ttl),
            LocalArticleCache::new(settings.article_capacity, settings.article_ttl),
        )
    }

    pub fn list(&self) -> &ArticleListCache {
        &self.list
    }

    pub fn local(&self) -> &LocalArticleCache {
        &self.local
    }

    /// Clear the shared list entry and, when known, the written article's entry.
    pub async fn invalidate_for_write(&self, id: Option<i64>) {
        self.list.invalidate_list().await;
        if let Some(id) = id {
            self.local.invalidate_article(id);
        }
        debug!(target: TARGET, article_id = ?id, "article caches invalidated");
    }
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroUsize;

    use time::OffsetDateTime;

    use super::*;
    use crate::domain::entities::{Article, ArticleSummary};

    fn cache() -> ArticleCache {
        ArticleCache::new(
            ArticleListCache::new(Arc::new(MemorySharedCache::new()), Duration::from_secs(300)),
            LocalArticleCache::new(NonZeroUsize::new(8).unwrap(), Duration::from_secs(300)),
        )
    }

    fn article(id: i64) -> Article {
        Article {
            id,
            title: format!("article {id}"),
            content: Some("plain".to_string()),
            markdown: None,
            created_at: OffsetDateTime::UNIX_EPOCH,
            updated_at: OffsetDateTime::UNIX_EPOCH,
        }
    }

    #[tokio::test]
    async fn invalidate_for_write_clears_both_tiers() {
        let cache = cache();
        let first = article(1);
        let second = article(2);
        let list: Vec<ArticleSummary> = vec![first.summary(), second.summary()];
        cache.list().put_list(&list).await;
        cache.local().put_article(1, first);
        cache.local().put_article(2, second);

        cache.invalidate_for_write(Some(1)).await;

        assert!(cache.list().get_list().await.is_none());
        assert!(cache.local().get_article(1).is_none());
        assert!(cache.local().get_article(2).is_some());
    }

    #[tokio::test]
    async fn create_invalidation_only_touches_list() {
        let cache = cache();
        cache.list().put_list(&[article(1).summary()]).await;
        cache.local().put_article(1, article(1));

        cache.invalidate_for_write(None).await;

        assert!(cache.list().get_list().await.is_none());
        assert!(cache.local().get_article(1).is_some());
    }
}
