//! Lock-guarded chirp and user tables persisted as JSON files.

pub mod codec;
pub mod error;

mod chirps;
mod table;
mod users;

use std::fs;
use std::path::Path;
use std::sync::Arc;

use chirpy_auth::Passwords;
use chirpy_types::models::{Post, User};
use tracing::info;

pub use error::{DbError, DbResult};

use crate::table::Table;

pub const CHIRPS_FILE: &str = "chirps.json";
pub const USERS_FILE: &str = "users.json";

/// The record store. Construct once at startup and share by reference.
///
/// The two tables lock independently; reads share, writes are exclusive and
/// include the snapshot write.
pub struct Database {
    chirps: Table<Post>,
    users: Table<User>,
    passwords: Arc<Passwords>,
}

impl Database {
    /// Open (or create) both table files under `data_dir`.
    ///
    /// A corrupt table file fails with `DbError::Format`.
    pub fn open(data_dir: &Path, passwords: Arc<Passwords>) -> DbResult<Self> {
        fs::create_dir_all(data_dir).map_err(|source| DbError::Persistence {
            table: "data directory",
            source,
        })?;

        let chirps = Table::open(data_dir.join(CHIRPS_FILE))?;
        let users = Table::open(data_dir.join(USERS_FILE))?;

        info!("Database opened at {}", data_dir.display());
        Ok(Self {
            chirps,
            users,
            passwords,
        })
    }
}
