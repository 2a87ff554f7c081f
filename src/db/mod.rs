//! SQLite transport layer: connection bootstrap and error taxonomy.
//!
//! # Responsibility
//! - Open and configure SQLite connections for DAO callers.
//! - Classify transport-level failures (`DbError`).
//!
//! # Invariants
//! - Returned connections have `foreign_keys=ON` and a busy timeout set.
//! - Schema ownership stays with the caller; this crate never creates or
//!   migrates application tables.

use std::error::Error;
use std::fmt::{Display, Formatter};

mod open;

pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

/// Transport-level database error.
#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    /// A persisted row could not be mapped back into an entity.
    InvalidRow(String),
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::InvalidRow(message) => write!(f, "invalid persisted row: {message}"),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::InvalidRow(_) => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
