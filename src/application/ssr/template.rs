//! The client bundle's HTML entry document.

use std::{cell::Cell, path::PathBuf, rc::Rc};

use lol_html::{RewriteStrSettings, element, html_content::ContentType, rewrite_str};
use tokio::sync::OnceCell;

use super::RenderError;

/// Served when the entry document cannot be read.
pub const MINIMAL_DOCUMENT: &str = "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n<title>inkblog</title>\n</head>\n<body>\n<div id=\"root\"></div>\n</body>\n</html>\n";

pub const MOUNT_SELECTOR: &str = "div#root";

enum Origin {
    File(PathBuf),
    Inline,
}

/// Lazily read, then cached, template document.
///
/// A failed read is not cached, so a later request retries once the bundle exists.
pub struct TemplateSource {
    origin: Origin,
    cell: OnceCell<String>,
}

impl TemplateSource {
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self {
            origin: Origin::File(path.into()),
            cell: OnceCell::new(),
        }
    }

    pub fn inline(html: impl Into<String>) -> Self {
        Self {
            origin: Origin::Inline,
            cell: OnceCell::new_with(Some(html.into())),
        }
    }

    pub async fn load(&self) -> Result<&str, RenderError> {
        let html = self
            .cell
            .get_or_try_init(|| async {
                match &self.origin {
                    Origin::File(path) => tokio::fs::read_to_string(path).await.map_err(|source| {
                        RenderError::TemplateUnavailable {
                            path: path.display().to_string(),
                            source,
                        }
                    }),
                    Origin::Inline => Err(RenderError::Rewrite(
                        "inline template missing".to_string(),
                    )),
                }
            })
            .await?;
        Ok(html.as_str())
    }

    /// The template as-is, or [`MINIMAL_DOCUMENT`] when it cannot be read.
    pub async fn document_or_minimal(&self) -> String {
        match self.load().await {
            Ok(html) => html.to_string(),
            Err(_) => MINIMAL_DOCUMENT.to_string(),
        }
    }
}

/// Replace the mount point's content with `markup` and insert `script` right after it.
pub fn splice(template: &str, markup: &str, script: &str) -> Result<String, RenderError> {
    let mounted = Rc::new(Cell::new(false));

    let rewritten = rewrite_str(
        template,
        RewriteStrSettings {
            element_content_handlers: vec![element!(MOUNT_SELECTOR, {
                let mounted = Rc::clone(&mounted);
                move |el| {
                    if mounted.get() {
                        return Ok(());
                    }
                    mounted.set(true);
                    el.set_inner_content(markup, ContentType::Html);
                    el.after(script, ContentType::Html);
                    Ok(())
                }
            })],
            ..RewriteStrSettings::default()
        },
    )
    .map_err(|err| RenderError::Rewrite(err.to_string()))?;

    if !mounted.get() {
        return Err(RenderError::MountPointMissing);
    }
    Ok(rewritten)
}
