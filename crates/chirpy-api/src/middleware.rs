use axum::{
    extract::{Request, State},
    http::{StatusCode, header},
    middleware::Next,
    response::Response,
};
use chirpy_auth::policy;
use tracing::warn;

use crate::AppState;

/// Verify the bearer token and expose the caller's `Identity` to handlers.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    let identity = policy::authenticate(auth_header, &state.tokens, chrono::Utc::now())
        .map_err(|e| {
            warn!("Rejected {} {}: {}", req.method(), req.uri().path(), e);
            StatusCode::UNAUTHORIZED
        })?;

    req.extensions_mut().insert(identity);
    Ok(next.run(req).await)
}
