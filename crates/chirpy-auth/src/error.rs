use thiserror::Error;

pub type AuthResult<T> = Result<T, AuthError>;

#[derive(Debug, Error)]
pub enum AuthError {
    /// No usable `Authorization` header was presented.
    #[error("authentication required")]
    Unauthenticated,

    /// A token was presented but is tampered, malformed, or expired.
    #[error("invalid or expired token")]
    InvalidToken,

    /// Login failed. Deliberately says nothing about which half was wrong.
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("signing secret is not configured")]
    SecretUnset,

    #[error("password hashing failed: {0}")]
    Hashing(String),

    #[error("token signing failed: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),
}
