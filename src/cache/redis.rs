use std::time::Duration;

use async_trait::async_trait;
use redis::{AsyncCommands, aio::ConnectionManager};

use super::shared::{CacheError, SharedCache};

/// Redis-backed shared cache over a reconnecting connection manager.
#[derive(Clone)]
pub struct RedisCache {
    connection: ConnectionManager,
}

impl RedisCache {
    pub async fn connect(url: &str) -> Result<Self, CacheError> {
        let client = redis::Client::open(url).map_err(|err| CacheError::backend(err.to_string()))?;
        let connection = ConnectionManager::new(client)
            .await
            .map_err(|err| CacheError::backend(err.to_string()))?;
        Ok(Self { connection })
    }
}

#[async_trait]
impl SharedCache for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self.connection.clone();
        conn.get::<_, Option<String>>(key)
            .await
            .map_err(|err| CacheError::backend(err.to_string()))
    }

    async fn set_ex(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError> {
        // Redis rejects SETEX with a zero expiry.
        let seconds = ttl.as_secs();
        if seconds == 0 {
            return self.delete(key).await;
        }
        let mut conn = self.connection.clone();
        conn.set_ex::<_, _, ()>(key, value, seconds)
            .await
            .map_err(|err| CacheError::backend(err.to_string()))
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        let mut conn = self.connection.clone();
        conn.del::<_, ()>(key)
            .await
            .map_err(|err| CacheError::backend(err.to_string()))
    }

    fn backend(&self) -> &'static str {
        "redis"
    }
}
