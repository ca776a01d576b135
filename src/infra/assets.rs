//! Static asset serving from the client bundle directory.

use std::path::{Component as PathComponent, Path, PathBuf};

use axum::{
    body::Body,
    http::{HeaderValue, StatusCode, header},
    response::Response,
};
use bytes::Bytes;
use mime_guess::Mime;
use tracing::warn;

const TARGET: &str = "inkblog::infra::assets";

const IMMUTABLE_CACHE: &str = "public, max-age=31536000, immutable";
const DAY_CACHE: &str = "public, max-age=86400";

/// Files of the built client bundle, served before any page handling.
#[derive(Debug, Clone)]
pub struct StaticAssets {
    root: PathBuf,
}

struct Asset {
    contents: Bytes,
    mime: Mime,
    cache_control: &'static str,
}

impl StaticAssets {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Response for `request_path` when it names a regular file in the bundle.
    ///
    /// `None` lets the caller continue with page handling.
    pub async fn serve(&self, request_path: &str) -> Option<Response> {
        let asset = self.resolve_asset(request_path).await?;
        Some(build_response(asset))
    }

    async fn resolve_asset(&self, request_path: &str) -> Option<Asset> {
        let candidate = sanitize(request_path)?;
        let full = self.root.join(&candidate);

        let metadata = tokio::fs::metadata(&full).await.ok()?;
        if !metadata.is_file() {
            return None;
        }

        let contents = match tokio::fs::read(&full).await {
            Ok(contents) => contents,
            Err(err) => {
                warn!(
                    target: TARGET,
                    path = %full.display(),
                    error = %err,
                    "failed to read static asset"
                );
                return None;
            }
        };

        Some(Asset {
            contents: Bytes::from(contents),
            mime: mime_guess::from_path(&candidate).first_or_octet_stream(),
            cache_control: cache_control_for(&candidate),
        })
    }
}

/// Relative path inside the bundle, or `None` for directories and anything escaping the root.
fn sanitize(request_path: &str) -> Option<PathBuf> {
    let candidate = request_path.split(['?', '#']).next().unwrap_or_default();
    let candidate = candidate.trim_start_matches('/');
    if candidate.is_empty() || candidate.ends_with('/') || candidate.contains("..") {
        return None;
    }

    let path = PathBuf::from(candidate);
    path.components()
        .all(|component| matches!(component, PathComponent::Normal(_)))
        .then_some(path)
}

fn cache_control_for(relative: &Path) -> &'static str {
    if relative.starts_with("static/js") || relative.starts_with("static/css") {
        IMMUTABLE_CACHE
    } else {
        DAY_CACHE
    }
}

fn build_response(asset: Asset) -> Response {
    let len = asset.contents.len();
    let mut response = Response::new(Body::from(asset.contents));
    *response.status_mut() = StatusCode::OK;

    let headers = response.headers_mut();
    if let Ok(value) = HeaderValue::from_str(asset.mime.as_ref()) {
        headers.insert(header::CONTENT_TYPE, value);
    }
    if let Ok(value) = HeaderValue::from_str(&len.to_string()) {
        headers.insert(header::CONTENT_LENGTH, value);
    }
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static(asset.cache_control),
    );

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bundle() -> (tempfile::TempDir, StaticAssets) {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("static/js")).unwrap();
        std::fs::write(dir.path().join("static/js/main.js"), "console.log(1);").unwrap();
        std::fs::write(dir.path().join("favicon.ico"), [0u8, 1, 2]).unwrap();
        let assets = StaticAssets::new(dir.path());
        (dir, assets)
    }

    #[tokio::test]
    async fn bundle_scripts_are_cached_for_a_year() {
        let (_dir, assets) = bundle();
        let response = assets.serve("/static/js/main.js").await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CACHE_CONTROL).unwrap(),
            IMMUTABLE_CACHE
        );
        let content_type = response.headers().get(header::CONTENT_TYPE).unwrap();
        assert!(content_type.to_str().unwrap().ends_with("javascript"));
    }

    #[tokio::test]
    async fn other_files_are_cached_for_a_day() {
        let (_dir, assets) = bundle();
        let response = assets.serve("/favicon.ico").await.unwrap();
        assert_eq!(response.headers().get(header::CACHE_CONTROL).unwrap(), DAY_CACHE);
    }

    #[tokio::test]
    async fn directories_missing_files_and_traversal_fall_through() {
        let (_dir, assets) = bundle();
        assert!(assets.serve("/").await.is_none());
        assert!(assets.serve("/static/js").await.is_none());
        assert!(assets.serve("/article/7").await.is_none());
        assert!(assets.serve("/../etc/passwd").await.is_none());
    }
}
