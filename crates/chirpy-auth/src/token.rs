use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{AuthError, AuthResult};

pub const ISSUER: &str = "chirpy";

/// Session tokens live for a fixed day.
pub fn token_lifetime() -> Duration {
    Duration::hours(24)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub iss: String,
    /// User id, as a decimal string.
    pub sub: String,
    pub email: String,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn user_id(&self) -> AuthResult<u64> {
        self.sub.parse().map_err(|_| AuthError::InvalidToken)
    }
}

/// Issues and verifies HS256 session tokens bound to one process-wide secret.
#[derive(Clone)]
pub struct TokenService {
    has_secret: bool,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl TokenService {
    pub fn new(secret: &[u8]) -> Self {
        Self {
            has_secret: !secret.is_empty(),
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
        }
    }

    pub fn issue_token(&self, user_id: u64, email: &str, now: DateTime<Utc>) -> AuthResult<String> {
        if !self.has_secret {
            return Err(AuthError::SecretUnset);
        }

        let claims = Claims {
            iss: ISSUER.to_string(),
            sub: user_id.to_string(),
            email: email.to_string(),
            iat: now.timestamp(),
            exp: (now + token_lifetime()).timestamp(),
        };

        Ok(encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?)
    }

    /// Check signature, issuer and expiry against `now`.
    ///
    /// Every failure collapses into `InvalidToken`.
    pub fn verify_token(&self, token: &str, now: DateTime<Utc>) -> AuthResult<Claims> {
        if !self.has_secret {
            return Err(AuthError::InvalidToken);
        }

        // Expiry is checked below against the caller's clock, not the system's.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_issuer(&[ISSUER]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);

        let data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            debug!("Token rejected: {}", e);
            AuthError::InvalidToken
        })?;

        if now.timestamp() >= data.claims.exp {
            debug!("Token for subject {} expired", data.claims.sub);
            return Err(AuthError::InvalidToken);
        }

        Ok(data.claims)
    }
}
