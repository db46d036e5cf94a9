//! Static order lookup page.

use axum::response::Html;

/// Serve the lookup page: an input box that fetches `/order/{id}` and
/// renders the JSON response.
pub async fn home() -> Html<&'static str> {
    Html(include_str!("../../static/index.html"))
}
