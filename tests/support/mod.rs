//! In-memory fakes and a router harness shared by the integration tests.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use axum::response::Response;
use http_body_util::BodyExt;
use serde_json::Value;
use time::{OffsetDateTime, macros::datetime};
use tokio::sync::Mutex;
use tower::ServiceExt;

use inkblog::application::ai::{AiContentService, ScriptedRandom};
use inkblog::application::articles::ArticleService;
use inkblog::application::repos::{
    ArticlesRepo, CreateArticleParams, RepoError, UpdateArticleParams,
};
use inkblog::application::ssr::{LoaderRegistry, RouteTable, SsrRenderer, TemplateSource};
use inkblog::cache::{
    ArticleCache, ArticleListCache, CacheError, LocalArticleCache, MemorySharedCache, SharedCache,
};
use inkblog::client::{ArticleFetcher, FetchError};
use inkblog::domain::entities::{Article, ArticleSummary};
use inkblog::infra::assets::StaticAssets;
use inkblog::infra::http::{HttpState, build_router};
use inkblog_api_types::ApiEnvelope;

pub const TEMPLATE: &str = "<!doctype html><html><head><title>inkblog</title></head><body><div id=\"root\"></div><script src=\"/static/js/main.js\"></script></body></html>";
pub const BUNDLE_SCRIPT: &str = "console.log(\"inkblog\");";

#[derive(Default)]
pub struct MemoryArticles {
    rows: Mutex<BTreeMap<i64, Article>>,
    next_id: AtomicUsize,
    reads: AtomicUsize,
    offline: AtomicBool,
}

impl MemoryArticles {
    pub fn new() -> Self {
        Self {
            next_id: AtomicUsize::new(100),
            ..Self::default()
        }
    }

    pub async fn seed(&self, article: Article) {
        self.rows.lock().await.insert(article.id, article);
    }

    /// Number of list and lookup queries that reached the store.
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn check_online(&self) -> Result<(), RepoError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(RepoError::Persistence("store offline".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl ArticlesRepo for MemoryArticles {
    async fn list_summaries(&self) -> Result<Vec<ArticleSummary>, RepoError> {
        self.check_online()?;
        self.reads.fetch_add(1, Ordering::SeqCst);
        let rows = self.rows.lock().await;
        let mut summaries: Vec<ArticleSummary> = rows.values().map(Article::summary).collect();
        summaries.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(summaries)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Article>, RepoError> {
        self.check_online()?;
        self.reads.fetch_add(1, Ordering::SeqCst);
        Ok(self.rows.lock().await.get(&id).cloned())
    }

    async fn create_article(&self, params: CreateArticleParams) -> Result<Article, RepoError> {
        self.check_online()?;
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) as i64;
        let now = OffsetDateTime::now_utc();
        let article = Article {
            id,
            title: params.title,
            content: params.content,
            markdown: params.markdown,
            created_at: now,
            updated_at: now,
        };
        self.rows.lock().await.insert(id, article.clone());
        Ok(article)
    }

    async fn update_article(
        &self,
        params: UpdateArticleParams,
    ) -> Result<Option<Article>, RepoError> {
        self.check_online()?;
        let mut rows = self.rows.lock().await;
        let Some(article) = rows.get_mut(&params.id) else {
            return Ok(None);
        };
        article.title = params.title;
        article.content = params.content;
        article.markdown = params.markdown;
        article.updated_at = OffsetDateTime::now_utc();
        Ok(Some(article.clone()))
    }

    async fn delete_article(&self, id: i64) -> Result<bool, RepoError> {
        self.check_online()?;
        Ok(self.rows.lock().await.remove(&id).is_some())
    }

    async fn current_time(&self) -> Result<OffsetDateTime, RepoError> {
        self.check_online()?;
        Ok(OffsetDateTime::now_utc())
    }
}

/// Shared cache whose every operation fails.
pub struct BrokenCache;

#[async_trait]
impl SharedCache for BrokenCache {
    async fn get(&self, _key: &str) -> Result<Option<String>, CacheError> {
        Err(CacheError::backend("connection refused"))
    }

    async fn set_ex(&self, _key: &str, _value: String, _ttl: Duration) -> Result<(), CacheError> {
        Err(CacheError::backend("connection refused"))
    }

    async fn delete(&self, _key: &str) -> Result<(), CacheError> {
        Err(CacheError::backend("connection refused"))
    }

    fn backend(&self) -> &'static str {
        "broken"
    }
}

pub fn article(id: i64, title: &str, markdown: &str) -> Article {
    let created_at = datetime!(2024-03-01 09:30 UTC) + time::Duration::days(id);
    Article {
        id,
        title: title.to_string(),
        content: None,
        markdown: Some(markdown.to_string()),
        created_at,
        updated_at: created_at,
    }
}

/// Both cache tiers backed by process memory.
pub fn memory_cache() -> ArticleCache {
    ArticleCache::new(
        ArticleListCache::new(Arc::new(MemorySharedCache::new()), Duration::from_secs(300)),
        LocalArticleCache::new(
            NonZeroUsize::new(64).expect("non-zero"),
            Duration::from_secs(300),
        ),
    )
}

pub struct TestApp {
    pub router: Router,
    pub repo: Arc<MemoryArticles>,
    pub articles: ArticleService,
    pub bundle_dir: tempfile::TempDir,
}

pub struct TestAppBuilder {
    shared: Arc<dyn SharedCache>,
    template_file: Option<&'static str>,
}

impl Default for TestAppBuilder {
    fn default() -> Self {
        Self {
            shared: Arc::new(MemorySharedCache::new()),
            template_file: Some(TEMPLATE),
        }
    }
}

impl TestAppBuilder {
    pub fn shared_cache(mut self, shared: Arc<dyn SharedCache>) -> Self {
        self.shared = shared;
        self
    }

    /// Leave the bundle without an `index.html`.
    pub fn without_template(mut self) -> Self {
        self.template_file = None;
        self
    }

    pub fn build(self) -> TestApp {
        let bundle_dir = tempfile::tempdir().expect("tempdir");
        std::fs::create_dir_all(bundle_dir.path().join("static/js")).expect("bundle dirs");
        std::fs::write(bundle_dir.path().join("static/js/main.js"), BUNDLE_SCRIPT)
            .expect("bundle script");
        if let Some(template) = self.template_file {
            std::fs::write(bundle_dir.path().join("index.html"), template).expect("template");
        }

        let repo = Arc::new(MemoryArticles::new());
        let cache = ArticleCache::new(
            ArticleListCache::new(self.shared, Duration::from_secs(300)),
            LocalArticleCache::new(
                NonZeroUsize::new(64).expect("non-zero"),
                Duration::from_secs(300),
            ),
        );
        let articles = ArticleService::new(repo.clone(), cache);

        let renderer = SsrRenderer::new(
            RouteTable::standard(),
            LoaderRegistry::standard(articles.clone()),
            TemplateSource::from_path(bundle_dir.path().join("index.html")),
        );
        let state = HttpState {
            articles: articles.clone(),
            ai: Arc::new(AiContentService::new(
                None,
                Arc::new(ScriptedRandom::new(vec![2, 4])),
            )),
            renderer,
            assets: StaticAssets::new(bundle_dir.path()),
        };

        TestApp {
            router: build_router(state),
            repo,
            articles,
            bundle_dir,
        }
    }
}

impl TestApp {
    pub fn new() -> Self {
        TestAppBuilder::default().build()
    }

    pub fn builder() -> TestAppBuilder {
        TestAppBuilder::default()
    }

    pub async fn request(&self, method: Method, uri: &str, body: Option<Value>) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        self.router
            .clone()
            .oneshot(builder.body(body).expect("request"))
            .await
            .expect("router is infallible")
    }

    /// POST an arbitrary body labelled as JSON.
    pub async fn post_raw(&self, uri: &str, body: &'static str) -> Response {
        let request = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .expect("request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible")
    }

    pub async fn get_json(&self, uri: &str) -> (StatusCode, Value) {
        let response = self.request(Method::GET, uri, None).await;
        let status = response.status();
        (status, json_body(response).await)
    }

    pub async fn send_json(&self, method: Method, uri: &str, body: Value) -> (StatusCode, Value) {
        let response = self.request(method, uri, Some(body)).await;
        let status = response.status();
        (status, json_body(response).await)
    }

    pub async fn get_html(&self, uri: &str) -> (StatusCode, String) {
        let response = self.request(Method::GET, uri, None).await;
        let status = response.status();
        (status, text_body(response).await)
    }

    /// Fetcher that goes through this app's JSON API.
    pub fn fetcher(&self) -> Arc<dyn ArticleFetcher> {
        Arc::new(RouterFetcher {
            router: self.router.clone(),
        })
    }
}

pub async fn text_body(response: Response) -> String {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("collect body")
        .to_bytes();
    String::from_utf8(bytes.to_vec()).expect("utf-8 body")
}

pub async fn json_body(response: Response) -> Value {
    let text = text_body(response).await;
    serde_json::from_str(&text).expect("json body")
}

/// [`ArticleFetcher`] that answers through the router instead of the network.
pub struct RouterFetcher {
    router: Router,
}

impl RouterFetcher {
    async fn get<T: serde::de::DeserializeOwned>(
        &self,
        uri: &str,
    ) -> Result<Option<T>, FetchError> {
        let request = Request::builder()
            .uri(uri)
            .body(Body::empty())
            .expect("request");
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let text = text_body(response).await;
        let envelope: ApiEnvelope<T> =
            serde_json::from_str(&text).map_err(|err| FetchError::Decode(err.to_string()))?;
        envelope
            .data
            .map(Some)
            .ok_or_else(|| FetchError::Api(envelope.error.unwrap_or_default()))
    }
}

#[async_trait]
impl ArticleFetcher for RouterFetcher {
    async fn fetch_articles(&self) -> Result<Vec<ArticleSummary>, FetchError> {
        self.get("/api/articles")
            .await?
            .ok_or_else(|| FetchError::Api("article list missing".to_string()))
    }

    async fn fetch_article(&self, id: &str) -> Result<Option<Article>, FetchError> {
        self.get(&format!("/api/articles/{id}")).await
    }
}
