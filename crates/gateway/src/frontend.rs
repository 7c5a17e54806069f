//! Embedded single-page frontend.
//!
//! `frontend/` is compiled into the binary with `include_str!`, so the
//! gateway ships as one executable. The page talks to the JSON API only.

use axum::{
    Router,
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::get,
};

const INDEX_HTML: &str = include_str!("../../../frontend/index.html");
const STYLE_CSS: &str = include_str!("../../../frontend/style.css");
const APP_JS: &str = include_str!("../../../frontend/app.js");

pub fn frontend_router() -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/static/style.css", get(css_handler))
        .route("/static/app.js", get(js_handler))
}

async fn index_handler() -> Html<&'static str> {
    Html(INDEX_HTML)
}

fn asset(content_type: &'static str, body: &'static str) -> Response {
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, content_type),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        body,
    )
        .into_response()
}

async fn css_handler() -> Response {
    asset("text/css; charset=utf-8", STYLE_CSS)
}

async fn js_handler() -> Response {
    asset("application/javascript; charset=utf-8", APP_JS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    async fn fetch(uri: &str) -> (StatusCode, String, String) {
        let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let response = frontend_router().oneshot(req).await.unwrap();
        let status = response.status();
        let content_type = response
            .headers()
            .get("content-type")
            .map(|v| v.to_str().unwrap().to_string())
            .unwrap_or_default();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, content_type, String::from_utf8_lossy(&body).into_owned())
    }

    #[tokio::test]
    async fn serves_index_html() {
        let (status, _, text) = fetch("/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(text.contains("<!DOCTYPE html>"));
        assert!(text.contains("RadImpress"));
        assert!(text.contains("/static/app.js"));
        assert!(text.contains("id=\"prompt-used\""));
        assert!(text.contains("id=\"document-used\""));
    }

    #[tokio::test]
    async fn serves_css() {
        let (status, content_type, _) = fetch("/static/style.css").await;
        assert_eq!(status, StatusCode::OK);
        assert!(content_type.contains("text/css"));
    }

    #[tokio::test]
    async fn serves_js_that_calls_the_api() {
        let (status, content_type, text) = fetch("/static/app.js").await;
        assert_eq!(status, StatusCode::OK);
        assert!(content_type.contains("javascript"));
        assert!(text.contains("/api/sessions"));
        assert!(text.contains("/api/studies"));
        assert!(text.contains("session.prompt_used"));
        assert!(text.contains("session.document_used"));
    }
}
