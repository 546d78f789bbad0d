//! Static file serving module
//!
//! Resolves request paths under the serving root and produces file,
//! directory listing, redirect, not-modified, and not-found responses.

use crate::config::AppState;
use crate::handler::router::RequestContext;
use crate::http::{self, cache, listing, mime, path};
use crate::logger;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;
use std::fs::Metadata;
use std::path::{Path, PathBuf};
use tokio::fs;

const NOT_FOUND: &str = "File not found";

/// Serve a GET or HEAD request from the serving root
pub async fn serve(ctx: &RequestContext, state: &AppState) -> Response<Full<Bytes>> {
    let requested = path::translate_path(&state.root, &ctx.path);

    let Some(fs_path) = confine_to_root(&requested, &state.root, &ctx.path).await else {
        return http::build_404_response(NOT_FOUND, ctx.is_head);
    };
    let Ok(metadata) = fs::metadata(&fs_path).await else {
        return http::build_404_response(NOT_FOUND, ctx.is_head);
    };

    if metadata.is_dir() {
        return serve_directory(ctx, state, &fs_path).await;
    }

    // A file cannot be addressed as a directory
    if ctx.path.ends_with('/') {
        return http::build_404_response(NOT_FOUND, ctx.is_head);
    }
    // Content type follows the requested name, not a symlink target
    serve_file(ctx, &fs_path, mime::content_type_for(&requested), &metadata).await
}

/// Canonicalize `fs_path` and refuse anything that resolves outside the root.
///
/// Path translation already strips `..` segments; this catches symlinks that
/// point elsewhere.
async fn confine_to_root(fs_path: &Path, root: &Path, request_path: &str) -> Option<PathBuf> {
    // Missing files are the common 404 case, no need to log
    let canonical = fs::canonicalize(fs_path).await.ok()?;
    if canonical.starts_with(root) {
        Some(canonical)
    } else {
        logger::log_warning(&format!(
            "Path traversal attempt blocked: {request_path} -> {}",
            canonical.display()
        ));
        None
    }
}

async fn serve_directory(
    ctx: &RequestContext,
    state: &AppState,
    dir: &Path,
) -> Response<Full<Bytes>> {
    if !ctx.path.ends_with('/') {
        let location = match &ctx.query {
            Some(q) => format!("{}/?{q}", ctx.path),
            None => format!("{}/", ctx.path),
        };
        return http::build_redirect_response(&location);
    }

    for index_file in &state.config.http.index_files {
        let index_path = dir.join(index_file);
        let Some(confined) = confine_to_root(&index_path, &state.root, &ctx.path).await else {
            continue;
        };
        if let Ok(metadata) = fs::metadata(&confined).await {
            if metadata.is_file() {
                let content_type = mime::content_type_for(&index_path);
                return serve_file(ctx, &confined, content_type, &metadata).await;
            }
        }
    }

    serve_listing(ctx, dir).await
}

async fn serve_listing(ctx: &RequestContext, dir: &Path) -> Response<Full<Bytes>> {
    match listing::read_entries(dir).await {
        Ok(entries) => {
            let display_path = path::decode_for_display(&ctx.path);
            http::build_html_response(listing::render_listing(&display_path, &entries), ctx.is_head)
        }
        Err(e) => {
            logger::log_warning(&format!(
                "Failed to list directory '{}': {e}",
                dir.display()
            ));
            http::build_404_response("No permission to list directory", ctx.is_head)
        }
    }
}

async fn serve_file(
    ctx: &RequestContext,
    file_path: &Path,
    content_type: &str,
    metadata: &Metadata,
) -> Response<Full<Bytes>> {
    let modified = metadata.modified().ok();

    if let Some(modified) = modified {
        if cache::is_not_modified(
            ctx.if_modified_since.as_deref(),
            ctx.has_if_none_match,
            modified,
        ) {
            return http::build_304_response();
        }
    }

    let content = match fs::read(file_path).await {
        Ok(c) => c,
        Err(e) => {
            logger::log_error(&format!(
                "Failed to read file '{}': {e}",
                file_path.display()
            ));
            return http::build_404_response(NOT_FOUND, ctx.is_head);
        }
    };

    let last_modified = modified.map(cache::format_http_date);
    http::build_file_response(
        Bytes::from(content),
        content_type,
        last_modified.as_deref(),
        ctx.is_head,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use http_body_util::BodyExt;
    use hyper::{Method, StatusCode};

    fn state_for(root: &Path) -> AppState {
        let mut cfg = Config::default();
        cfg.http.root = root.to_path_buf();
        AppState::new(&cfg).unwrap()
    }

    fn get(path: &str) -> RequestContext {
        RequestContext {
            method: Method::GET,
            path: path.to_string(),
            query: None,
            is_head: false,
            if_modified_since: None,
            has_if_none_match: false,
        }
    }

    async fn body_of(resp: Response<Full<Bytes>>) -> Vec<u8> {
        resp.into_body().collect().await.unwrap().to_bytes().to_vec()
    }

    #[tokio::test]
    async fn test_serves_file_bytes() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("app.js"), b"console.log(1);").unwrap();
        let state = state_for(dir.path());

        let resp = serve(&get("/app.js"), &state).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()["content-type"], "text/javascript; charset=utf-8");
        assert_eq!(resp.headers()["content-length"], "15");
        assert!(resp.headers().contains_key("last-modified"));
        assert_eq!(body_of(resp).await, b"console.log(1);");
    }

    #[tokio::test]
    async fn test_head_has_no_body() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), b"abc").unwrap();
        let state = state_for(dir.path());

        let mut ctx = get("/a.txt");
        ctx.method = Method::HEAD;
        ctx.is_head = true;
        let resp = serve(&ctx, &state).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()["content-length"], "3");
        assert!(body_of(resp).await.is_empty());
    }

    #[tokio::test]
    async fn test_missing_file_is_404() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_for(dir.path());

        let resp = serve(&get("/nope.html"), &state).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_file_with_trailing_slash_is_404() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), b"abc").unwrap();
        let state = state_for(dir.path());

        let resp = serve(&get("/a.txt/"), &state).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_directory_redirects_to_slash() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("docs")).unwrap();
        let state = state_for(dir.path());

        let mut ctx = get("/docs");
        ctx.query = Some("lang=en".to_string());
        let resp = serve(&ctx, &state).await;
        assert_eq!(resp.status(), StatusCode::MOVED_PERMANENTLY);
        assert_eq!(resp.headers()["location"], "/docs/?lang=en");
    }

    #[tokio::test]
    async fn test_directory_index_served() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("docs")).unwrap();
        std::fs::write(dir.path().join("docs/index.htm"), b"<h1>docs</h1>").unwrap();
        let state = state_for(dir.path());

        let resp = serve(&get("/docs/"), &state).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_of(resp).await, b"<h1>docs</h1>");
    }

    #[tokio::test]
    async fn test_directory_listing() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("test.html"), b"x").unwrap();
        std::fs::create_dir(dir.path().join("js")).unwrap();
        let state = state_for(dir.path());

        let resp = serve(&get("/"), &state).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()["content-type"], "text/html; charset=utf-8");
        let html = String::from_utf8(body_of(resp).await).unwrap();
        assert!(html.contains("Directory listing for /"));
        assert!(html.contains("<a href=\"js/\">js/</a>"));
        assert!(html.contains("<a href=\"test.html\">test.html</a>"));
    }

    #[tokio::test]
    async fn test_if_modified_since_yields_304() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), b"abc").unwrap();
        let state = state_for(dir.path());

        let first = serve(&get("/a.txt"), &state).await;
        let last_modified = first.headers()["last-modified"].to_str().unwrap().to_string();

        let mut ctx = get("/a.txt");
        ctx.if_modified_since = Some(last_modified.clone());
        let resp = serve(&ctx, &state).await;
        assert_eq!(resp.status(), StatusCode::NOT_MODIFIED);
        assert!(body_of(resp).await.is_empty());

        ctx.has_if_none_match = true;
        let resp = serve(&ctx, &state).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_parent_segments_stay_inside_root() {
        let outer = tempfile::tempdir().unwrap();
        std::fs::write(outer.path().join("secret.txt"), b"secret").unwrap();
        let root = outer.path().join("site");
        std::fs::create_dir(&root).unwrap();
        let state = state_for(&root);

        let resp = serve(&get("/../secret.txt"), &state).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let resp = serve(&get("/%2e%2e/secret.txt"), &state).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_symlink_out_of_root_refused() {
        let outer = tempfile::tempdir().unwrap();
        std::fs::write(outer.path().join("secret.txt"), b"secret").unwrap();
        let root = outer.path().join("site");
        std::fs::create_dir(&root).unwrap();
        std::os::unix::fs::symlink(outer.path().join("secret.txt"), root.join("link.txt")).unwrap();
        let state = state_for(&root);

        let resp = serve(&get("/link.txt"), &state).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_symlinked_index_out_of_root_refused() {
        let outer = tempfile::tempdir().unwrap();
        std::fs::write(outer.path().join("secret.txt"), b"secret").unwrap();
        let root = outer.path().join("site");
        std::fs::create_dir(&root).unwrap();
        std::os::unix::fs::symlink(outer.path().join("secret.txt"), root.join("index.html")).unwrap();
        let state = state_for(&root);

        let resp = serve(&get("/index.html"), &state).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        // Falls back to the listing rather than leaking the target
        let resp = serve(&get("/"), &state).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let html = String::from_utf8(body_of(resp).await).unwrap();
        assert!(html.contains("Directory listing for /"));
        assert!(!html.contains("secret"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_symlink_content_type_follows_requested_name() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("app.js.v3"), b"export {};").unwrap();
        std::os::unix::fs::symlink(dir.path().join("app.js.v3"), dir.path().join("app.js")).unwrap();
        let state = state_for(dir.path());

        let resp = serve(&get("/app.js"), &state).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()["content-type"], "text/javascript; charset=utf-8");
        assert_eq!(body_of(resp).await, b"export {};");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_colon_in_file_name() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("12:00.txt"), b"noon").unwrap();
        let state = state_for(dir.path());

        for path in ["/12%3A00.txt", "/12:00.txt"] {
            let resp = serve(&get(path), &state).await;
            assert_eq!(resp.status(), StatusCode::OK, "{path}");
            assert_eq!(body_of(resp).await, b"noon");
        }
    }
}
