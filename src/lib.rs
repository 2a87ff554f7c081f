//! Generic entity-to-row persistence over SQLite.
//!
//! One coordinator ([`Dao`]) exposes a uniform CRUD vocabulary — store,
//! save, update, find, delete, count, adjust-numeric-property, list-related
//! — for any type registered in an [`EntityRegistry`]. SQL generation and
//! statement execution sit behind their own seams so the decision logic in
//! the coordinator stays testable in isolation.

pub mod dao;
pub mod db;
pub mod exec;
pub mod logging;
pub mod meta;
pub mod sql;

pub use dao::{Dao, DaoError, DaoResult, KeyStrategy};
pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use exec::{SqliteExecutor, StatementExecutor};
pub use logging::{default_log_level, init_logging, logging_status};
pub use meta::{Entity, EntityMeta, EntityRegistry};
pub use sql::SqlStatement;

/// Returns the crate version.
pub fn crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
