//! Static file serving out of the configured www-root. No relation to the
//! game lane: these requests never touch a `Game`.

use crate::error::ClientError;
use axum::body::Body;
use axum::http::{header, Method, Response, StatusCode};
use percent_encoding::percent_decode_str;
use std::path::{Component, Path, PathBuf};

fn content_type_for(ext: &str) -> &'static str {
    match ext {
        "html" => "text/html",
        "js" => "text/javascript",
        "json" => "application/json",
        "svg" => "image/svg+xml",
        "png" => "image/png",
        _ => "application/octet-stream",
    }
}

fn decode_query(raw: &str) -> String {
    percent_decode_str(raw).decode_utf8_lossy().replace('+', " ")
}

fn resolve_path(root: &Path, query: &str) -> PathBuf {
    if query == "/" || query == "/index.html" {
        return root.join("index.html");
    }
    let relative = query.trim_start_matches('/');
    root.join(relative)
}

/// Lexically resolves `.`/`..` components without touching the
/// filesystem, mirroring `std::filesystem::weakly_canonical` — unlike
/// `Path::canonicalize`, this works for paths that don't exist yet, so a
/// missing-but-in-root file can still be told apart from one that
/// escapes the root.
fn normalize_lexical(path: &Path) -> PathBuf {
    let mut stack: Vec<Component> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if matches!(stack.last(), Some(Component::Normal(_))) {
                    stack.pop();
                } else {
                    stack.push(component);
                }
            }
            other => stack.push(other),
        }
    }
    stack.into_iter().collect()
}

fn is_sub_path(path: &Path, base: &Path) -> bool {
    let path = normalize_lexical(path);
    let base = normalize_lexical(base);
    path.starts_with(base)
}

/// Serves `query` (already the raw `request.uri().path()`) out of `root`.
/// Mirrors the original's GET/HEAD-only, path-traversal-rejecting, file
/// lookup: bad encoding or an out-of-root path is a 400, a missing file a
/// 404, anything else a 405 with the two-verb `Allow` header.
pub async fn serve(root: &Path, method: &Method, raw_query: &str) -> Result<Response<Body>, ClientError> {
    if method != Method::GET && method != Method::HEAD {
        return Err(ClientError::InvalidMethod { allow: "GET, HEAD" });
    }

    let query = decode_query(raw_query);
    let abs_path = resolve_path(root, &query);

    if !is_sub_path(&abs_path, root) {
        return Err(ClientError::BadRequest);
    }

    if !abs_path.is_file() {
        return Err(ClientError::FileNotFound);
    }

    let ext = abs_path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default();
    let content_type = content_type_for(ext);

    if method == Method::HEAD {
        return Ok(Response::builder()
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, content_type)
            .body(Body::empty())
            .expect("static response is well-formed"));
    }

    let bytes = tokio::fs::read(&abs_path)
        .await
        .map_err(|e| ClientError::Internal(e.to_string()))?;

    Ok(Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .body(Body::from(bytes))
        .expect("static response is well-formed"))
}
