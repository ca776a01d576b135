//! Article body rendering shared by every page path.

use ammonia::Builder as AmmoniaBuilder;
use comrak::{Options, markdown_to_html};
use once_cell::sync::Lazy;

use crate::domain::entities::Article;

static MARKDOWN_OPTIONS: Lazy<Options<'static>> = Lazy::new(default_options);
static SANITIZER: Lazy<AmmoniaBuilder<'static>> = Lazy::new(build_sanitizer);

fn default_options() -> Options<'static> {
    let mut options = Options::default();
    let ext = &mut options.extension;
    ext.strikethrough = true;
    ext.table = true;
    ext.autolink = true;
    ext.tasklist = true;
    ext.footnotes = true;

    let render = &mut options.render;
    render.github_pre_lang = true;
    render.r#unsafe = true;
    options
}

fn build_sanitizer() -> AmmoniaBuilder<'static> {
    let mut builder = AmmoniaBuilder::default();
    builder.add_tags(&["input"]);
    builder.add_tag_attributes("input", &["type", "checked", "disabled"]);
    builder.add_tag_attributes("code", &["class"]);
    builder.add_tag_attributes("pre", &["lang"]);
    builder
}

/// Markdown to sanitised HTML.
pub fn render_markdown(markdown: &str) -> String {
    let html = markdown_to_html(markdown, &MARKDOWN_OPTIONS);
    SANITIZER.clean(&html).to_string()
}

/// Rendered body of an article.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArticleBody {
    /// Sanitised HTML from the markdown source.
    Html(String),
    /// Legacy plain text, one paragraph per line. Escaped by the template.
    Paragraphs(Vec<String>),
}

pub fn plain_paragraphs(text: &str) -> Vec<String> {
    text.split('\n')
        .map(|line| line.trim_end_matches('\r').to_string())
        .collect()
}

/// Markdown when present, otherwise the legacy content.
pub fn article_body(article: &Article) -> ArticleBody {
    match (article.markdown.as_deref(), article.content.as_deref()) {
        (Some(markdown), _) if !markdown.trim().is_empty() => {
            ArticleBody::Html(render_markdown(markdown))
        }
        (_, Some(content)) if !content.is_empty() => {
            ArticleBody::Paragraphs(plain_paragraphs(content))
        }
        _ => ArticleBody::Paragraphs(Vec::new()),
    }
}
