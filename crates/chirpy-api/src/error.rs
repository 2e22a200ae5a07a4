use axum::http::StatusCode;
use tokio::task::JoinError;
use tracing::error;

use chirpy_auth::AuthError;
use chirpy_db::DbError;

pub(crate) fn db_status(err: DbError) -> StatusCode {
    match err {
        DbError::NotFound { .. } => StatusCode::NOT_FOUND,
        DbError::Conflict(_) => StatusCode::CONFLICT,
        DbError::Forbidden => StatusCode::FORBIDDEN,
        DbError::Invalid(_) => StatusCode::BAD_REQUEST,
        DbError::Auth(e) => auth_status(e),
        other @ (DbError::Format { .. }
        | DbError::Persistence { .. }
        | DbError::IdsExhausted { .. }) => {
            error!("Store failure: {}", other);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

pub(crate) fn auth_status(err: AuthError) -> StatusCode {
    match err {
        AuthError::Unauthenticated | AuthError::InvalidToken | AuthError::InvalidCredentials => {
            StatusCode::UNAUTHORIZED
        }
        other @ (AuthError::SecretUnset | AuthError::Hashing(_) | AuthError::Signing(_)) => {
            error!("Auth failure: {}", other);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

pub(crate) fn join_error(e: JoinError) -> StatusCode {
    error!("spawn_blocking join error: {}", e);
    StatusCode::INTERNAL_SERVER_ERROR
}
