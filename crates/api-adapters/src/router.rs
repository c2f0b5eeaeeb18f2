//! Static single-page-app server.
//!
//! Files under the static dir are served as-is; any other path falls back to
//! `index.html` so client-side routes resolve.

use std::path::Path;

use axum::http::{header, HeaderValue, Method};
use axum::Router;
use tower_http::cors::{AllowHeaders, AllowOrigin, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

pub const INDEX_FILE: &str = "index.html";

/// Responses must always be revalidated; the page is a live board.
fn no_cache_layers() -> [SetResponseHeaderLayer<HeaderValue>; 3] {
    [
        SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-cache, no-store, must-revalidate"),
        ),
        SetResponseHeaderLayer::overriding(header::PRAGMA, HeaderValue::from_static("no-cache")),
        SetResponseHeaderLayer::overriding(header::EXPIRES, HeaderValue::from_static("0")),
    ]
}

/// Mirrors the caller's origin and allows credentials.
pub fn cors_policy() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_methods([Method::GET, Method::HEAD, Method::OPTIONS])
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}

pub fn spa_router(static_dir: impl AsRef<Path>) -> Router {
    let static_dir = static_dir.as_ref();
    let index = static_dir.join(INDEX_FILE);
    tracing::debug!(dir = %static_dir.display(), "serving static files");

    let files = ServeDir::new(static_dir).fallback(ServeFile::new(index));
    let [cache_control, pragma, expires] = no_cache_layers();

    Router::new()
        .fallback_service(files)
        .layer(cache_control)
        .layer(pragma)
        .layer(expires)
        .layer(cors_policy())
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    fn site() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(INDEX_FILE), "<html>ultragol</html>").unwrap();
        std::fs::write(dir.path().join("app.js"), "console.log('gol');").unwrap();
        dir
    }

    async fn body_of(response: axum::response::Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn serves_existing_files() {
        let dir = site();
        let response = spa_router(dir.path())
            .oneshot(Request::get("/app.js").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_of(response).await, "console.log('gol');");
    }

    #[tokio::test]
    async fn unknown_paths_fall_back_to_index_without_caching() {
        let dir = site();
        let response = spa_router(dir.path())
            .oneshot(Request::get("/match/123").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let headers = response.headers();
        assert_eq!(headers[header::CACHE_CONTROL], "no-cache, no-store, must-revalidate");
        assert_eq!(headers[header::PRAGMA], "no-cache");
        assert_eq!(headers[header::EXPIRES], "0");
        assert_eq!(body_of(response).await, "<html>ultragol</html>");
    }

    #[tokio::test]
    async fn cors_mirrors_the_origin() {
        let dir = site();
        let response = spa_router(dir.path())
            .oneshot(
                Request::get("/")
                    .header(header::ORIGIN, "https://fans.example")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let headers = response.headers();
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "https://fans.example");
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");
    }
}
