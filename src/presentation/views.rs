//! Askama views for the page components and the application shell.
//!
//! The server renderer and the client hydrator both go through
//! [`render_app`], so equal data always yields equal markup.

use askama::Template;
use time::{
    OffsetDateTime,
    format_description::{FormatItem, well_known::Rfc3339},
};

use crate::application::ssr::{Component, RenderError, SsrContext};
use crate::domain::{
    articles::{HUMAN_DATE_FORMAT, HUMAN_DATETIME_FORMAT},
    entities::{Article, ArticleSummary},
};
use crate::presentation::markdown::{ArticleBody, article_body};

#[derive(Debug, Clone)]
pub struct DateView {
    pub human: String,
    pub machine: String,
}

impl DateView {
    fn from_datetime(value: OffsetDateTime) -> Self {
        Self::formatted(value, HUMAN_DATE_FORMAT)
    }

    fn formatted(value: OffsetDateTime, human: &[FormatItem<'_>]) -> Self {
        Self {
            human: value.format(human).unwrap_or_default(),
            machine: value.format(&Rfc3339).unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ArticleListItemView {
    pub id: i64,
    pub title: String,
    pub date: DateView,
}

impl From<&ArticleSummary> for ArticleListItemView {
    fn from(summary: &ArticleSummary) -> Self {
        Self {
            id: summary.id,
            title: summary.title.clone(),
            date: DateView::from_datetime(summary.created_at),
        }
    }
}

#[derive(Template)]
#[template(path = "components/article_list.html")]
pub struct ArticleListTemplate {
    /// `None` while the list has not been loaded.
    pub articles: Option<Vec<ArticleListItemView>>,
}

#[derive(Debug, Clone)]
pub struct ArticleDetailView {
    pub id: i64,
    pub title: String,
    pub date: DateView,
    /// Present once the article has been edited after creation.
    pub updated: Option<DateView>,
    pub body_html: Option<String>,
    pub paragraphs: Vec<String>,
}

impl From<&Article> for ArticleDetailView {
    fn from(article: &Article) -> Self {
        let (body_html, paragraphs) = match article_body(article) {
            ArticleBody::Html(html) => (Some(html), Vec::new()),
            ArticleBody::Paragraphs(paragraphs) => (None, paragraphs),
        };
        Self {
            id: article.id,
            title: article.title.clone(),
            date: DateView::from_datetime(article.created_at),
            updated: (article.updated_at != article.created_at)
                .then(|| DateView::formatted(article.updated_at, HUMAN_DATETIME_FORMAT)),
            body_html,
            paragraphs,
        }
    }
}

#[derive(Template)]
#[template(path = "components/article_detail.html")]
pub struct ArticleDetailTemplate {
    pub article: Option<ArticleDetailView>,
    /// Whether a lookup finished; distinguishes "missing" from "loading".
    pub loaded: bool,
}

#[derive(Template)]
#[template(path = "components/article_admin.html")]
pub struct ArticleAdminTemplate;

#[derive(Template)]
#[template(path = "components/not_found.html")]
pub struct NotFoundTemplate;

#[derive(Template)]
#[template(path = "app.html")]
pub struct AppTemplate {
    pub pages: Vec<String>,
}

fn render<T: Template>(component: &'static str, template: &T) -> Result<String, RenderError> {
    template
        .render()
        .map_err(|source| RenderError::Template { component, source })
}

pub fn render_component(component: Component, context: &SsrContext) -> Result<String, RenderError> {
    match component {
        Component::ArticleList => {
            let articles = context
                .articles()
                .map(|items| items.iter().map(ArticleListItemView::from).collect());
            render(component.name(), &ArticleListTemplate { articles })
        }
        Component::ArticleDetail => {
            let looked_up = context.article();
            let template = ArticleDetailTemplate {
                loaded: looked_up.is_some(),
                article: looked_up.flatten().as_ref().map(ArticleDetailView::from),
            };
            render(component.name(), &template)
        }
        Component::ArticleAdmin => render(component.name(), &ArticleAdminTemplate),
        Component::NotFound => render(component.name(), &NotFoundTemplate),
    }
}

/// The shell with every component rendered in order.
pub fn render_app(components: &[Component], context: &SsrContext) -> Result<String, RenderError> {
    let pages = components
        .iter()
        .map(|component| render_component(*component, context))
        .collect::<Result<Vec<_>, _>>()?;
    render("App", &AppTemplate { pages })
}
