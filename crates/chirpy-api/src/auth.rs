use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use tracing::{info, warn};

use chirpy_auth::AuthError;
use chirpy_db::Database;
use chirpy_types::api::{LoginRequest, LoginResponse, RegisterRequest, UserResponse};
use chirpy_types::models::{NewUser, User};

use crate::AppState;
use crate::error::{auth_status, db_status, join_error};

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, StatusCode> {
    // Validate input
    if req.email.trim().is_empty() || !req.email.contains('@') {
        return Err(StatusCode::BAD_REQUEST);
    }
    if req.password.is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }

    // Argon2 hashing blocks; run it off the async runtime
    let db = state.clone();
    let user = tokio::task::spawn_blocking(move || {
        db.db.create_user(NewUser {
            name: req.name,
            email: req.email,
            password: req.password,
        })
    })
    .await
    .map_err(join_error)?
    .map_err(db_status)?;

    info!("Registered user {}", user.id);
    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, StatusCode> {
    let db = state.clone();
    let email = req.email.clone();
    let user = tokio::task::spawn_blocking(move || check_credentials(&db.db, &req.email, &req.password))
        .await
        .map_err(join_error)?
        .map_err(|e| {
            warn!("Failed login for {}", email);
            auth_status(e)
        })?;

    let token = state
        .tokens
        .issue_token(user.id, &user.email, chrono::Utc::now())
        .map_err(auth_status)?;

    Ok(Json(LoginResponse {
        id: user.id,
        email: user.email,
        token,
    }))
}

/// Unknown email and wrong password fail identically, and at the same cost.
fn check_credentials(db: &Database, email: &str, password: &str) -> Result<User, AuthError> {
    let passwords = db.passwords();
    match db.get_user_by_email(email) {
        Ok(user) if passwords.verify_password(password, &user.password) => Ok(user),
        Ok(_) => Err(AuthError::InvalidCredentials),
        Err(_) => {
            passwords.verify_absent(password);
            Err(AuthError::InvalidCredentials)
        }
    }
}
