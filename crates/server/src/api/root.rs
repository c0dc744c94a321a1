use std::sync::Arc;

use axum::response::Html;
use axum::routing::get;
use axum::Router;

use crate::state::AppState;

const INDEX_PAGE: &str = r#"<!DOCTYPE html>
<html>
  <head>
    <title>agentgate</title>
  </head>
  <body>
    <h1>agentgate</h1>
    <p>Query relay for Llama Stack agents.</p>
    <ul>
      <li><a href="/docs">API documentation</a></li>
      <li><a href="/v1/info">Service info</a></li>
      <li><a href="/readiness">Readiness</a></li>
    </ul>
  </body>
</html>
"#;

/// Landing page
#[utoipa::path(
    get,
    path = "/",
    tag = "Root",
    responses(
        (status = 200, description = "HTML landing page", content_type = "text/html")
    )
)]
pub async fn root() -> Html<&'static str> {
    Html(INDEX_PAGE)
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/", get(root))
}
