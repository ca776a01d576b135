use crate::application::repos::RepoError;

// SQLSTATE values reported by MySQL.
const SQLSTATE_DATA_TOO_LONG: &str = "22001";
const SQLSTATE_QUERY_INTERRUPTED: &str = "70100";

pub fn map_sqlx_error(err: sqlx::Error) -> RepoError {
    match err {
        sqlx::Error::Database(db) if db.code().as_deref() == Some(SQLSTATE_DATA_TOO_LONG) => {
            RepoError::InvalidInput {
                message: db.message().to_string(),
            }
        }
        sqlx::Error::Database(db) if db.code().as_deref() == Some(SQLSTATE_QUERY_INTERRUPTED) => {
            RepoError::Timeout
        }
        sqlx::Error::PoolTimedOut => RepoError::Timeout,
        other => RepoError::from_persistence(other),
    }
}
