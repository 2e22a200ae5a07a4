use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode, header},
};
use tracing::{info, warn};

use chirpy_auth::policy;
use chirpy_types::api::PolkaWebhook;

use crate::AppState;
use crate::error::{db_status, join_error};

const USER_UPGRADED: &str = "user.upgraded";

/// Payment provider callback. Authenticated with `Authorization: ApiKey <key>`.
///
/// The body is only parsed once the key checks out, so an unauthenticated
/// caller always sees 401.
pub async fn polka(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, StatusCode> {
    let Some(expected) = state.polka_key.as_deref() else {
        warn!("Polka webhook received but no API key is configured");
        return Err(StatusCode::UNAUTHORIZED);
    };
    let presented = policy::credential(
        headers.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok()),
        "ApiKey",
    )
    .map_err(|_| StatusCode::UNAUTHORIZED)?;
    if !policy::api_key_matches(presented, expected) {
        warn!("Polka webhook with wrong API key");
        return Err(StatusCode::UNAUTHORIZED);
    }

    let Json(hook) = Json::<PolkaWebhook>::from_bytes(&body).map_err(|rejection| {
        warn!("Malformed Polka webhook: {}", rejection.body_text());
        rejection.status()
    })?;

    if hook.event != USER_UPGRADED {
        return Ok(StatusCode::NO_CONTENT);
    }

    let user_id = hook.data.user_id;
    let db = state.clone();
    tokio::task::spawn_blocking(move || {
        let mut user = db.db.get_user_by_id(user_id)?;
        user.is_chirpy_premium = true;
        db.db.update_user(user)
    })
    .await
    .map_err(join_error)?
    .map_err(db_status)?;

    info!("User {} upgraded to Chirpy Red", user_id);
    Ok(StatusCode::NO_CONTENT)
}
