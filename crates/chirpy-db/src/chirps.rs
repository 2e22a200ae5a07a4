use chirpy_auth::policy::{self, Decision};
use chirpy_types::models::{MAX_CHIRP_LENGTH, Post};
use tracing::{debug, warn};

use crate::Database;
use crate::error::{DbError, DbResult};

fn validate_body(body: &str) -> DbResult<()> {
    let len = body.chars().count();
    if len > MAX_CHIRP_LENGTH {
        return Err(DbError::Invalid(format!(
            "chirp is {} characters, limit is {}",
            len, MAX_CHIRP_LENGTH
        )));
    }
    Ok(())
}

impl Database {
    pub fn create_post(&self, body: &str, author: Option<u64>) -> DbResult<Post> {
        validate_body(body)?;

        self.chirps.write(|rows| {
            let post = Post {
                id: rows.allocate_id()?,
                body: body.to_string(),
                author,
            };
            rows.records.insert(post.id, post.clone());
            debug!("Created chirp {}", post.id);
            Ok(post)
        })
    }

    pub fn get_post(&self, id: u64) -> DbResult<Post> {
        self.chirps.read(|rows| {
            rows.records
                .get(&id)
                .cloned()
                .ok_or_else(|| DbError::not_found("chirp", id))
        })
    }

    /// All chirps in ascending id order.
    pub fn list_posts(&self) -> Vec<Post> {
        self.chirps.read(|rows| rows.records.values().cloned().collect())
    }

    /// Replace a chirp's body. The author is kept.
    pub fn update_post(&self, id: u64, new_body: &str) -> DbResult<Post> {
        validate_body(new_body)?;

        self.chirps.write(|rows| {
            let post = rows
                .records
                .get_mut(&id)
                .ok_or_else(|| DbError::not_found("chirp", id))?;
            post.body = new_body.to_string();
            Ok(post.clone())
        })
    }

    /// Delete a chirp on behalf of `requester_id`.
    ///
    /// Only the author may delete an authored chirp; others get `Forbidden`
    /// and the chirp stays.
    pub fn delete_post(&self, id: u64, requester_id: u64) -> DbResult<()> {
        self.chirps.write(|rows| {
            let post = rows
                .records
                .get(&id)
                .ok_or_else(|| DbError::not_found("chirp", id))?;

            if policy::decide(requester_id, post.author) == Decision::Forbidden {
                warn!("User {} may not delete chirp {}", requester_id, id);
                return Err(DbError::Forbidden);
            }

            rows.records.remove(&id);
            debug!("Deleted chirp {}", id);
            Ok(())
        })
    }
}
