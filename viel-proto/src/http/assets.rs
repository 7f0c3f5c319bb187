use std::path::{Component, Path, PathBuf};

use anyhow::Result;
use hyper::header;
use hyper::{Response, StatusCode};
use percent_encoding::percent_decode_str;

use super::codec::{file_body, text_body, HttpResponse};

const INDEX: &str = "index.html";

/// The prebuilt single-page frontend.
/// Paths that don't name a file get `index.html`, the frontend router
/// takes over from there.
pub(crate) struct Assets {
    root: Option<PathBuf>,
}

impl Assets {
    pub(crate) fn new(root: Option<PathBuf>) -> Self {
        Self { root }
    }

    pub(crate) async fn serve(&self, uri_path: &str) -> Result<HttpResponse> {
        let root = match self.root.as_ref() {
            Some(r) => r,
            None => {
                return Ok(Response::builder()
                    .status(StatusCode::NOT_FOUND)
                    .body(text_body("No frontend configured"))?)
            }
        };

        let target = match self.resolve(root, uri_path).await {
            Some(path) => path,
            None => root.join(INDEX),
        };

        let file = match tokio::fs::File::open(&target).await {
            Ok(f) => f,
            Err(e) => {
                tracing::warn!(path=%target.display(), err=%e, "static asset unavailable");
                return Ok(Response::builder()
                    .status(StatusCode::NOT_FOUND)
                    .body(text_body("Not found"))?);
            }
        };
        let len = file.metadata().await?.len();

        Ok(Response::builder()
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, content_type(&target))
            .header(header::CONTENT_LENGTH, len)
            .body(file_body(file))?)
    }

    /// An existing file below the root, `None` otherwise
    async fn resolve(&self, root: &Path, uri_path: &str) -> Option<PathBuf> {
        let relative = safe_relative(uri_path)?;
        if relative.as_os_str().is_empty() {
            return None;
        }
        let candidate = root.join(relative);
        match tokio::fs::metadata(&candidate).await {
            Ok(meta) if meta.is_file() => Some(candidate),
            _ => None,
        }
    }
}

/// Percent-decode an URI path and keep it only if it stays below the root
fn safe_relative(uri_path: &str) -> Option<PathBuf> {
    let decoded = percent_decode_str(uri_path).decode_utf8().ok()?;
    let mut out = PathBuf::new();
    for component in Path::new(decoded.as_ref()).components() {
        match component {
            Component::Normal(c) => out.push(c),
            Component::RootDir | Component::CurDir => (),
            Component::ParentDir | Component::Prefix(_) => return None,
        }
    }
    Some(out)
}

fn content_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "html" | "htm" => "text/html; charset=utf-8",
        "js" | "mjs" => "text/javascript; charset=utf-8",
        "css" => "text/css; charset=utf-8",
        "json" | "map" => "application/json",
        "webmanifest" => "application/manifest+json",
        "txt" => "text/plain; charset=utf-8",
        "svg" => "image/svg+xml",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "ico" => "image/x-icon",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "ttf" => "font/ttf",
        _ => "application/octet-stream",
    }
}
