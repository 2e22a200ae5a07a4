use std::sync::atomic::Ordering;

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{Html, Response},
};

use crate::AppState;

pub async fn healthz() -> &'static str {
    "OK"
}

pub async fn metrics(State(state): State<AppState>) -> Html<String> {
    let hits = state.hits.load(Ordering::Relaxed);
    Html(format!(
        "<html>\n<body>\n    <h1>Welcome, Chirpy Admin</h1>\n    <p>Chirpy has been visited {} times!</p>\n</body>\n</html>",
        hits
    ))
}

pub async fn reset(State(state): State<AppState>) -> StatusCode {
    state.hits.store(0, Ordering::Relaxed);
    StatusCode::OK
}

/// Count every request that reaches the static file service.
pub async fn count_hit(State(state): State<AppState>, req: Request, next: Next) -> Response {
    state.hits.fetch_add(1, Ordering::Relaxed);
    next.run(req).await
}
