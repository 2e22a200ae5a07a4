use argon2::{
    Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version,
    password_hash::{SaltString, rand_core::OsRng},
};

use crate::error::{AuthError, AuthResult};

/// Argon2id work factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashCost {
    pub memory_kib: u32,
    pub iterations: u32,
}

impl HashCost {
    /// Smallest cost Argon2 accepts. Only meant for tests.
    pub const MINIMAL: HashCost = HashCost {
        memory_kib: 8,
        iterations: 1,
    };

    pub fn with_iterations(iterations: u32) -> Self {
        Self {
            iterations,
            ..Self::default()
        }
    }
}

impl Default for HashCost {
    fn default() -> Self {
        Self {
            memory_kib: Params::DEFAULT_M_COST,
            iterations: Params::DEFAULT_T_COST,
        }
    }
}

/// Salted one-way password hashing with Argon2id.
pub struct Passwords {
    argon2: Argon2<'static>,
    /// Hash compared against when the account does not exist.
    dummy: String,
}

impl Passwords {
    pub fn new(cost: HashCost) -> AuthResult<Self> {
        let params = Params::new(
            cost.memory_kib,
            cost.iterations,
            Params::DEFAULT_P_COST,
            None,
        )
        .map_err(|e| AuthError::Hashing(e.to_string()))?;

        let mut passwords = Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
            dummy: String::new(),
        };
        passwords.dummy = passwords.hash_password("chirpy-dummy-password")?;
        Ok(passwords)
    }

    /// Hash a plaintext password into a PHC string with a fresh random salt.
    pub fn hash_password(&self, plaintext: &str) -> AuthResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2
            .hash_password(plaintext.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AuthError::Hashing(e.to_string()))
    }

    /// Check a plaintext password against a stored hash.
    ///
    /// An unparseable hash never matches.
    pub fn verify_password(&self, plaintext: &str, hash: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(hash) else {
            return false;
        };
        self.argon2
            .verify_password(plaintext.as_bytes(), &parsed)
            .is_ok()
    }

    /// Whether `value` is a PHC hash string rather than plaintext.
    pub fn is_hash(value: &str) -> bool {
        PasswordHash::new(value).is_ok()
    }

    /// Run a full verification against a throwaway hash and return false.
    ///
    /// Login calls this when the email is unknown so both failure paths pay
    /// the same hashing cost.
    pub fn verify_absent(&self, plaintext: &str) -> bool {
        self.verify_password(plaintext, &self.dummy);
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn passwords() -> Passwords {
        Passwords::new(HashCost::MINIMAL).unwrap()
    }

    #[test]
    fn test_hash_and_verify() {
        let passwords = passwords();
        let hash = passwords.hash_password("secret1").unwrap();

        assert_ne!(hash, "secret1");
        assert!(hash.starts_with("$argon2id$"));
        assert!(passwords.verify_password("secret1", &hash));
        assert!(!passwords.verify_password("secret2", &hash));
    }

    #[test]
    fn test_hashes_are_salted() {
        let passwords = passwords();
        let a = passwords.hash_password("same").unwrap();
        let b = passwords.hash_password("same").unwrap();

        assert_ne!(a, b);
        assert!(passwords.verify_password("same", &a));
        assert!(passwords.verify_password("same", &b));
    }

    #[test]
    fn test_garbage_hash_never_matches() {
        let passwords = passwords();
        assert!(!passwords.verify_password("secret1", "secret1"));
        assert!(!passwords.verify_password("", ""));
    }

    #[test]
    fn test_is_hash() {
        let hash = passwords().hash_password("secret1").unwrap();
        assert!(Passwords::is_hash(&hash));
        assert!(!Passwords::is_hash("secret1"));
    }

    #[test]
    fn test_verify_absent_is_false() {
        let passwords = passwords();
        assert!(!passwords.verify_absent("chirpy-dummy-password"));
    }

    #[test]
    fn test_dummy_hash_is_real() {
        let passwords = passwords();
        assert!(Passwords::is_hash(&passwords.dummy));
        assert!(passwords.verify_password("chirpy-dummy-password", &passwords.dummy));
    }

    #[test]
    fn test_invalid_cost_rejected() {
        let cost = HashCost {
            memory_kib: 1,
            iterations: 0,
        };
        assert!(matches!(Passwords::new(cost), Err(AuthError::Hashing(_))));
    }
}
