//! MySQL-backed repository implementations.

mod articles;
mod util;

pub use util::map_sqlx_error;

use std::sync::Arc;

use sqlx::mysql::{MySqlPool, MySqlPoolOptions};

#[derive(Clone)]
pub struct MySqlRepositories {
    pool: Arc<MySqlPool>,
}

impl MySqlRepositories {
    pub fn new(pool: MySqlPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }

    pub async fn connect(url: &str, max_connections: u32) -> Result<MySqlPool, sqlx::Error> {
        MySqlPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await
    }

    pub async fn run_migrations(pool: &MySqlPool) -> Result<(), sqlx::Error> {
        sqlx::migrate!("./migrations")
            .run(pool)
            .await
            .map_err(Into::into)
    }
}
