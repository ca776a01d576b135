use async_trait::async_trait;
use time::{OffsetDateTime, PrimitiveDateTime};

use crate::{
    application::repos::{ArticlesRepo, CreateArticleParams, RepoError, UpdateArticleParams},
    domain::entities::{Article, ArticleSummary},
};

use super::{MySqlRepositories, map_sqlx_error};

#[derive(sqlx::FromRow)]
struct ArticleRow {
    id: i64,
    title: String,
    content: Option<String>,
    markdown_content: Option<String>,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl From<ArticleRow> for Article {
    fn from(row: ArticleRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            content: row.content,
            markdown: row.markdown_content,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ArticleSummaryRow {
    id: i64,
    title: String,
    created_at: OffsetDateTime,
}

impl From<ArticleSummaryRow> for ArticleSummary {
    fn from(row: ArticleSummaryRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            created_at: row.created_at,
        }
    }
}

const SELECT_ARTICLE: &str = "SELECT id, title, content, markdown_content, created_at, updated_at \
     FROM articles WHERE id = ?";

impl MySqlRepositories {
    async fn fetch_article(&self, id: i64) -> Result<Option<Article>, RepoError> {
        let row = sqlx::query_as::<_, ArticleRow>(SELECT_ARTICLE)
            .bind(id)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(row.map(Article::from))
    }
}

#[async_trait]
impl ArticlesRepo for MySqlRepositories {
    async fn list_summaries(&self) -> Result<Vec<ArticleSummary>, RepoError> {
        let rows = sqlx::query_as::<_, ArticleSummaryRow>(
            "SELECT id, title, created_at FROM articles ORDER BY created_at DESC, id DESC",
        )
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(ArticleSummary::from).collect())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Article>, RepoError> {
        self.fetch_article(id).await
    }

    async fn create_article(&self, params: CreateArticleParams) -> Result<Article, RepoError> {
        let result =
            sqlx::query("INSERT INTO articles (title, content, markdown_content) VALUES (?, ?, ?)")
                .bind(&params.title)
                .bind(&params.content)
                .bind(&params.markdown)
                .execute(self.pool())
                .await
                .map_err(map_sqlx_error)?;

        let id = i64::try_from(result.last_insert_id())
            .map_err(|_| RepoError::from_persistence("inserted id exceeds i64 range"))?;

        self.fetch_article(id)
            .await?
            .ok_or_else(|| RepoError::from_persistence("inserted article could not be read back"))
    }

    async fn update_article(
        &self,
        params: UpdateArticleParams,
    ) -> Result<Option<Article>, RepoError> {
        // MySQL reports zero affected rows for an unchanged row, so existence
        // is decided by reading the row back.
        sqlx::query(
            "UPDATE articles SET title = ?, content = ?, markdown_content = ?, \
             updated_at = CURRENT_TIMESTAMP WHERE id = ?",
        )
        .bind(&params.title)
        .bind(&params.content)
        .bind(&params.markdown)
        .bind(params.id)
        .execute(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        self.fetch_article(params.id).await
    }

    async fn delete_article(&self, id: i64) -> Result<bool, RepoError> {
        let result = sqlx::query("DELETE FROM articles WHERE id = ?")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn current_time(&self) -> Result<OffsetDateTime, RepoError> {
        let now: PrimitiveDateTime = sqlx::query_scalar("SELECT UTC_TIMESTAMP()")
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(now.assume_utc())
    }
}
