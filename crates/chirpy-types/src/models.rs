use serde::{Deserialize, Serialize};

/// Longest chirp body accepted, counted in characters rather than bytes.
pub const MAX_CHIRP_LENGTH: usize = 140;

/// A stored chirp. Field names are the on-disk names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Post {
    pub id: u64,
    pub body: String,
    /// Id of the user who wrote the chirp. Chirps written before ownership
    /// was tracked carry no author and are not ownership-gated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<u64>,
}

/// A stored user account.
///
/// `password` only ever holds a PHC-formatted Argon2 hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct User {
    pub id: u64,
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub is_chirpy_premium: bool,
}

/// Registration input. The password is plaintext until the store hashes it.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password: String,
}
