use std::io;

use chirpy_auth::AuthError;
use thiserror::Error;

use crate::codec::CodecError;

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("{table} record {key} not found")]
    NotFound { table: &'static str, key: String },

    #[error("email already registered: {0}")]
    Conflict(String),

    #[error("requester does not own this record")]
    Forbidden,

    #[error("invalid record: {0}")]
    Invalid(String),

    #[error("no ids left in {table}")]
    IdsExhausted { table: &'static str },

    /// Stored bytes could not be decoded. Fatal when hit at startup.
    #[error("corrupt table file {path}: {source}")]
    Format {
        path: String,
        #[source]
        source: CodecError,
    },

    /// The snapshot write failed. The in-memory table already holds the change.
    #[error("failed to persist {table}: {source}")]
    Persistence {
        table: &'static str,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Auth(#[from] AuthError),
}

impl DbError {
    pub(crate) fn not_found(table: &'static str, key: impl ToString) -> Self {
        DbError::NotFound {
            table,
            key: key.to_string(),
        }
    }
}
