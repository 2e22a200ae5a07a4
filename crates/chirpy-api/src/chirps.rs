use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::{debug, warn};

use chirpy_auth::Identity;
use chirpy_auth::policy::{self, Decision};
use chirpy_types::api::{ChirpRequest, ChirpResponse, ErrorResponse, ValidateChirpResponse};
use chirpy_types::models::MAX_CHIRP_LENGTH;

use crate::AppState;
use crate::error::{db_status, join_error};
use crate::profanity::clean_body;

fn too_long(body: &str) -> bool {
    body.chars().count() > MAX_CHIRP_LENGTH
}

pub async fn list_chirps(State(state): State<AppState>) -> Result<impl IntoResponse, StatusCode> {
    let db = state.clone();
    let posts = tokio::task::spawn_blocking(move || db.db.list_posts())
        .await
        .map_err(join_error)?;

    Ok(Json(
        posts.into_iter().map(ChirpResponse::from).collect::<Vec<_>>(),
    ))
}

pub async fn get_chirp(
    State(state): State<AppState>,
    Path(chirp_id): Path<u64>,
) -> Result<impl IntoResponse, StatusCode> {
    let db = state.clone();
    let post = tokio::task::spawn_blocking(move || db.db.get_post(chirp_id))
        .await
        .map_err(join_error)?
        .map_err(db_status)?;

    Ok(Json(ChirpResponse::from(post)))
}

pub async fn create_chirp(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(req): Json<ChirpRequest>,
) -> Result<impl IntoResponse, StatusCode> {
    if too_long(&req.body) {
        return Err(StatusCode::BAD_REQUEST);
    }
    let body = clean_body(&req.body);
    let author = identity.user_id;

    let db = state.clone();
    let post = tokio::task::spawn_blocking(move || db.db.create_post(&body, Some(author)))
        .await
        .map_err(join_error)?
        .map_err(db_status)?;

    debug!("User {} created chirp {}", author, post.id);
    Ok((StatusCode::CREATED, Json(ChirpResponse::from(post))))
}

/// Replace a chirp's body. Only the author may edit an authored chirp.
pub async fn update_chirp(
    State(state): State<AppState>,
    Path(chirp_id): Path<u64>,
    Extension(identity): Extension<Identity>,
    Json(req): Json<ChirpRequest>,
) -> Result<impl IntoResponse, StatusCode> {
    if too_long(&req.body) {
        return Err(StatusCode::BAD_REQUEST);
    }
    let body = clean_body(&req.body);

    let db = state.clone();
    let post = tokio::task::spawn_blocking(move || {
        // The author never changes, so checking before the update is race-free
        let existing = db.db.get_post(chirp_id).map_err(db_status)?;
        if policy::decide(identity.user_id, existing.author) == Decision::Forbidden {
            warn!("User {} may not edit chirp {}", identity.user_id, chirp_id);
            return Err(StatusCode::FORBIDDEN);
        }
        db.db.update_post(chirp_id, &body).map_err(db_status)
    })
    .await
    .map_err(join_error)??;

    Ok(Json(ChirpResponse::from(post)))
}

pub async fn delete_chirp(
    State(state): State<AppState>,
    Path(chirp_id): Path<u64>,
    Extension(identity): Extension<Identity>,
) -> Result<StatusCode, StatusCode> {
    let db = state.clone();
    tokio::task::spawn_blocking(move || db.db.delete_post(chirp_id, identity.user_id))
        .await
        .map_err(join_error)?
        .map_err(db_status)?;

    Ok(StatusCode::NO_CONTENT)
}

/// Length check plus profanity filter, without storing anything.
pub async fn validate_chirp(Json(req): Json<ChirpRequest>) -> Response {
    if too_long(&req.body) {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "Chirp is too long".to_string(),
            }),
        )
            .into_response();
    }

    Json(ValidateChirpResponse {
        cleaned_body: clean_body(&req.body),
    })
    .into_response()
}
