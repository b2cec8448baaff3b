//! Static file unit.
//!
//! # Responsibilities
//! - Map the request path below the current mount onto a directory
//! - Respond with the file when one exists; otherwise let dispatch continue
//!
//! # Design Decisions
//! - Only `GET` and `HEAD` are served
//! - Paths containing `.` or `..` components are never resolved
//! - A directory is served through its `index.html`, if present

use std::path::{Path, PathBuf};

use axum::http::{header, HeaderValue, Method};
use futures_util::future::BoxFuture;
use futures_util::FutureExt;

use crate::dispatch::{Handler, HandlerUnit, RequestContext, Signal};
use crate::routing::split_path;

/// A unit that serves files from `root`.
///
/// Mount it ahead of the routes it should shadow: a hit responds and ends
/// dispatch, a miss returns `Continue`.
pub fn serve_dir(root: impl Into<PathBuf>) -> HandlerUnit {
    HandlerUnit::normal(ServeDir { root: root.into() })
}

struct ServeDir {
    root: PathBuf,
}

impl Handler for ServeDir {
    fn call<'a>(&'a self, ctx: &'a mut RequestContext) -> BoxFuture<'a, Signal> {
        self.serve(ctx).boxed()
    }
}

impl ServeDir {
    async fn serve(&self, ctx: &mut RequestContext) -> Signal {
        if ctx.method != Method::GET && ctx.method != Method::HEAD {
            return Signal::Continue;
        }
        let Some(path) = resolve(&self.root, &ctx.path, &ctx.base_url) else {
            return Signal::Continue;
        };

        let path = match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_dir() => path.join("index.html"),
            Ok(_) => path,
            Err(_) => return Signal::Continue,
        };

        match tokio::fs::read(&path).await {
            Ok(contents) => {
                tracing::debug!(file = %path.display(), bytes = contents.len(), "Serving static file");
                ctx.set_header(header::CONTENT_TYPE, HeaderValue::from_static(content_type(&path)));
                ctx.send(contents)
            }
            Err(_) => Signal::Continue,
        }
    }
}

/// The file under `root` for `path` with the `base_url` segments removed.
fn resolve(root: &Path, path: &str, base_url: &str) -> Option<PathBuf> {
    let skip = split_path(base_url).len();
    let mut file = root.to_path_buf();
    for segment in split_path(path).into_iter().skip(skip) {
        if segment == "." || segment == ".." || segment.contains('\\') {
            return None;
        }
        file.push(segment);
    }
    Some(file)
}

fn content_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("html") | Some("htm") => "text/html; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("js") | Some("mjs") => "text/javascript; charset=utf-8",
        Some("json") => "application/json",
        Some("txt") => "text/plain; charset=utf-8",
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("ico") => "image/x-icon",
        Some("wasm") => "application/wasm",
        _ => "application/octet-stream",
    }
}
