use axum::response::Html;

/// Serves the bundled single-page UI.
pub async fn handler() -> Html<&'static str> {
    Html(include_str!("../../assets/index.html"))
}
