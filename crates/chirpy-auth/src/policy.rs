//! Per-request authorization.
//!
//! A protected request moves through
//! `Unauthenticated -> TokenPresented -> TokenVerified -> Allowed | Forbidden`.
//! [`authenticate`] covers the first three steps and reports where it halted
//! through the error kind; [`decide`] covers the last one.

use chrono::{DateTime, Utc};
use subtle::ConstantTimeEq;

use crate::error::{AuthError, AuthResult};
use crate::token::TokenService;

/// The caller, as proven by a verified session token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: u64,
    pub email: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allowed,
    Forbidden,
}

/// Extract the credential from an `Authorization: <scheme> <credential>` header.
pub fn credential<'a>(header: Option<&'a str>, scheme: &str) -> AuthResult<&'a str> {
    let (presented_scheme, value) = header
        .map(str::trim)
        .and_then(|h| h.split_once(' '))
        .ok_or(AuthError::Unauthenticated)?;

    let value = value.trim();
    if !presented_scheme.eq_ignore_ascii_case(scheme)
        || value.is_empty()
        || value.contains(char::is_whitespace)
    {
        return Err(AuthError::Unauthenticated);
    }
    Ok(value)
}

/// Resolve the caller's identity from a bearer header.
///
/// Missing or malformed headers fail with `Unauthenticated`; a present but
/// bad or expired token fails with `InvalidToken`.
pub fn authenticate(
    header: Option<&str>,
    tokens: &TokenService,
    now: DateTime<Utc>,
) -> AuthResult<Identity> {
    let token = credential(header, "Bearer")?;
    let claims = tokens.verify_token(token, now)?;
    Ok(Identity {
        user_id: claims.user_id()?,
        email: claims.email,
    })
}

/// Ownership check for a mutation on a resource owned by `owner`.
///
/// Resources without a recorded owner are open to any authenticated caller.
pub fn decide(requester: u64, owner: Option<u64>) -> Decision {
    match owner {
        Some(owner) if owner != requester => Decision::Forbidden,
        _ => Decision::Allowed,
    }
}

/// Constant-time comparison for shared API keys.
pub fn api_key_matches(presented: &str, expected: &str) -> bool {
    !expected.is_empty() && bool::from(presented.as_bytes().ct_eq(expected.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens() -> TokenService {
        TokenService::new(b"policy-test-secret")
    }

    #[test]
    fn test_credential_parsing() {
        assert_eq!(credential(Some("Bearer abc"), "Bearer").unwrap(), "abc");
        assert_eq!(credential(Some("bearer abc"), "Bearer").unwrap(), "abc");
        assert_eq!(credential(Some("ApiKey k1"), "ApiKey").unwrap(), "k1");

        for header in [None, Some(""), Some("Bearer"), Some("Bearer "), Some("Basic abc"), Some("Bearer a b")] {
            assert!(matches!(
                credential(header, "Bearer"),
                Err(AuthError::Unauthenticated)
            ));
        }
    }

    #[test]
    fn test_authenticate_halts() {
        let tokens = tokens();
        let now = Utc::now();

        assert!(matches!(
            authenticate(None, &tokens, now),
            Err(AuthError::Unauthenticated)
        ));
        assert!(matches!(
            authenticate(Some("Bearer garbage"), &tokens, now),
            Err(AuthError::InvalidToken)
        ));

        let token = tokens.issue_token(3, "c@d.e", now).unwrap();
        let header = format!("Bearer {}", token);
        let identity = authenticate(Some(header.as_str()), &tokens, now).unwrap();
        assert_eq!(
            identity,
            Identity {
                user_id: 3,
                email: "c@d.e".to_string()
            }
        );
    }

    #[test]
    fn test_decide_ownership() {
        assert_eq!(decide(1, Some(1)), Decision::Allowed);
        assert_eq!(decide(2, Some(1)), Decision::Forbidden);
        assert_eq!(decide(2, None), Decision::Allowed);
    }

    #[test]
    fn test_api_key_matches() {
        assert!(api_key_matches("f271c81ff7084ee5b99a5091b42d486e", "f271c81ff7084ee5b99a5091b42d486e"));
        assert!(!api_key_matches("wrong", "f271c81ff7084ee5b99a5091b42d486e"));
        assert!(!api_key_matches("", ""));
    }
}
