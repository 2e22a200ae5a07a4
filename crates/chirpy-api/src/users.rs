use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};

use chirpy_types::api::UserResponse;

use crate::AppState;
use crate::error::join_error;

pub async fn list_users(State(state): State<AppState>) -> Result<impl IntoResponse, StatusCode> {
    let db = state.clone();
    let users = tokio::task::spawn_blocking(move || db.db.list_users())
        .await
        .map_err(join_error)?;

    Ok(Json(
        users.into_iter().map(UserResponse::from).collect::<Vec<_>>(),
    ))
}
