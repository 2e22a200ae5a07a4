use chirpy_auth::Passwords;
use chirpy_types::models::{NewUser, User};
use tracing::debug;

use crate::Database;
use crate::error::{DbError, DbResult};

impl Database {
    /// Register a user. The plaintext password is hashed before the table is
    /// touched; a taken email fails with `Conflict` and changes nothing.
    pub fn create_user(&self, new_user: NewUser) -> DbResult<User> {
        let password = self.passwords.hash_password(&new_user.password)?;

        self.users.write(|rows| {
            if rows.records.values().any(|u| u.email == new_user.email) {
                return Err(DbError::Conflict(new_user.email));
            }

            let user = User {
                id: rows.allocate_id()?,
                name: new_user.name,
                email: new_user.email,
                password,
                is_chirpy_premium: false,
            };
            rows.records.insert(user.id, user.clone());
            debug!("Created user {}", user.id);
            Ok(user)
        })
    }

    /// Exact, case-sensitive email lookup.
    pub fn get_user_by_email(&self, email: &str) -> DbResult<User> {
        self.users.read(|rows| {
            rows.records
                .values()
                .find(|u| u.email == email)
                .cloned()
                .ok_or_else(|| DbError::not_found("user", email))
        })
    }

    pub fn get_user_by_id(&self, id: u64) -> DbResult<User> {
        self.users.read(|rows| {
            rows.records
                .get(&id)
                .cloned()
                .ok_or_else(|| DbError::not_found("user", id))
        })
    }

    pub fn list_users(&self) -> Vec<User> {
        self.users.read(|rows| rows.records.values().cloned().collect())
    }

    /// Replace a stored user wholesale.
    ///
    /// The email must stay unique and `password` must still be a hash.
    pub fn update_user(&self, user: User) -> DbResult<User> {
        if !Passwords::is_hash(&user.password) {
            return Err(DbError::Invalid("password must be stored hashed".to_string()));
        }

        self.users.write(|rows| {
            if !rows.records.contains_key(&user.id) {
                return Err(DbError::not_found("user", user.id));
            }
            if rows
                .records
                .values()
                .any(|u| u.id != user.id && u.email == user.email)
            {
                return Err(DbError::Conflict(user.email));
            }

            rows.records.insert(user.id, user.clone());
            debug!("Updated user {}", user.id);
            Ok(user)
        })
    }

    /// The hasher shared with login.
    pub fn passwords(&self) -> &Passwords {
        &self.passwords
    }
}
