use std::path::{Component, Path, PathBuf};

use axum::{
    extract::State,
    http::{header, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json,
};
use log::warn;
use serde_json::json;
use tokio::fs;

use crate::context::ServerContext;

/// Serves files from the site root for every request no route matched
pub async fn serve(State(context): State<ServerContext>, method: Method, uri: Uri) -> Response {
    if method != Method::GET && method != Method::HEAD {
        return StatusCode::METHOD_NOT_ALLOWED.into_response();
    }

    let path = uri.path();

    if path == "/api" || path.starts_with("/api/") {
        let body = json!({ "message": "API endpoint not found" });
        return (StatusCode::NOT_FOUND, Json(body)).into_response();
    }

    let Some(file) = resolve(&context.config.site_root, path) else {
        return not_found();
    };

    match fs::read(&file).await {
        Ok(content) => ([(header::CONTENT_TYPE, content_type(&file))], content).into_response(),
        Err(e) => {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!("Could not read {}: {}", file.display(), e);
            }

            not_found()
        }
    }
}

fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        [(header::CONTENT_TYPE, "text/html")],
        "404 Not Found",
    )
        .into_response()
}

/// Maps a request path onto a file below `root`.
/// Returns [None] for anything that would leave the root.
pub fn resolve(root: &Path, path: &str) -> Option<PathBuf> {
    let path = path.split('?').next().unwrap_or_default();
    let relative = match path.strip_prefix('/')? {
        "" => "index.html",
        relative => relative,
    };

    // `//admin` and `/./admin` would otherwise resolve to files the gate never saw
    if relative.split('/').any(|s| s.is_empty() || s == ".") {
        return None;
    }

    let mut resolved = root.to_path_buf();

    for component in Path::new(relative).components() {
        match component {
            Component::Normal(part) => resolved.push(part),
            _ => return None,
        }
    }

    Some(resolved)
}

pub fn content_type(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|x| x.to_str())
        .map(|x| x.to_ascii_lowercase());

    match extension.as_deref() {
        Some("html") => "text/html",
        Some("css") => "text/css",
        Some("js") => "text/javascript",
        Some("json") => "application/json",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_resolve() {
        let root = Path::new("/site");

        assert_eq!(resolve(root, "/"), Some(PathBuf::from("/site/index.html")));
        assert_eq!(
            resolve(root, "/css/main.css?v=2"),
            Some(PathBuf::from("/site/css/main.css"))
        );
        assert_eq!(
            resolve(root, "/pages/airport.html"),
            Some(PathBuf::from("/site/pages/airport.html"))
        );
    }

    #[test]
    fn test_resolve_rejects_traversal() {
        let root = Path::new("/site");

        assert_eq!(resolve(root, "/../backend/db.json"), None);
        assert_eq!(resolve(root, "/pages/../../etc/passwd"), None);
        assert_eq!(resolve(root, "/./index.html"), None);
    }

    #[test]
    fn test_resolve_rejects_empty_segments() {
        let root = Path::new("/site");

        assert_eq!(resolve(root, "//admin/dashboard.html"), None);
        assert_eq!(resolve(root, "//profile.html"), None);
        assert_eq!(resolve(root, "/admin//dashboard.html"), None);
        assert_eq!(resolve(root, "//"), None);
        assert_eq!(resolve(root, "index.html"), None);
    }

    #[test]
    fn test_content_type() {
        assert_eq!(content_type(Path::new("index.html")), "text/html");
        assert_eq!(content_type(Path::new("MAIN.CSS")), "text/css");
        assert_eq!(content_type(Path::new("app.js")), "text/javascript");
        assert_eq!(content_type(Path::new("data.json")), "application/json");
        assert_eq!(content_type(Path::new("logo.png")), "application/octet-stream");
        assert_eq!(content_type(Path::new("LICENSE")), "application/octet-stream");
    }
}
