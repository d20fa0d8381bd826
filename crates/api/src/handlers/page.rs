use axum::response::Html;

const INDEX_HTML: &str = include_str!("../../assets/index.html");

/// GET / -- the single-page upload, preview and download UI.
pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}
