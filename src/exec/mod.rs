//! Statement execution facility.
//!
//! # Responsibility
//! - Run generated statements against SQLite and map results back.
//! - Keep prepared-statement lifetimes scoped to each call.
//!
//! # Invariants
//! - Prepared handles are dropped on every exit path, success or failure.
//! - Generated-key capture is requested through a dedicated entry point,
//!   never inferred after the fact.

use crate::db::DbResult;
use crate::meta::Entity;
use crate::sql::SqlStatement;
use rusqlite::{params_from_iter, Connection};

/// Execution contract the DAO coordinates against.
///
/// Kept as a trait so tests and alternative backends can stand in for the
/// SQLite implementation.
pub trait StatementExecutor {
    /// Executes a write statement and returns the affected-row count.
    fn execute(&self, stmt: &SqlStatement) -> DbResult<usize>;

    /// Executes an insert with generated-key capture and returns the key.
    fn execute_returning_key(&self, stmt: &SqlStatement) -> DbResult<i64>;

    /// Runs a select and maps the first row, or `None` when no row matches.
    fn fetch_one<E: Entity>(&self, stmt: &SqlStatement) -> DbResult<Option<E>>;

    /// Runs a select and maps every matching row in result order.
    fn fetch_all<E: Entity>(&self, stmt: &SqlStatement) -> DbResult<Vec<E>>;

    /// Runs a single-value aggregate select (COUNT-style).
    fn fetch_count(&self, stmt: &SqlStatement) -> DbResult<i64>;
}

/// SQLite-backed executor borrowing an open connection.
pub struct SqliteExecutor<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteExecutor<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl StatementExecutor for SqliteExecutor<'_> {
    fn execute(&self, stmt: &SqlStatement) -> DbResult<usize> {
        let mut prepared = self.conn.prepare(&stmt.sql)?;
        let affected = prepared.execute(params_from_iter(stmt.params.iter()))?;
        Ok(affected)
    }

    fn execute_returning_key(&self, stmt: &SqlStatement) -> DbResult<i64> {
        let mut prepared = self.conn.prepare(&stmt.sql)?;
        prepared.execute(params_from_iter(stmt.params.iter()))?;
        Ok(self.conn.last_insert_rowid())
    }

    fn fetch_one<E: Entity>(&self, stmt: &SqlStatement) -> DbResult<Option<E>> {
        let mut prepared = self.conn.prepare(&stmt.sql)?;
        let mut rows = prepared.query(params_from_iter(stmt.params.iter()))?;

        if let Some(row) = rows.next()? {
            return Ok(Some(E::from_row(row)?));
        }
        Ok(None)
    }

    fn fetch_all<E: Entity>(&self, stmt: &SqlStatement) -> DbResult<Vec<E>> {
        let mut prepared = self.conn.prepare(&stmt.sql)?;
        let mut rows = prepared.query(params_from_iter(stmt.params.iter()))?;
        let mut entities = Vec::new();

        while let Some(row) = rows.next()? {
            entities.push(E::from_row(row)?);
        }
        Ok(entities)
    }

    fn fetch_count(&self, stmt: &SqlStatement) -> DbResult<i64> {
        let count = self.conn.query_row(
            &stmt.sql,
            params_from_iter(stmt.params.iter()),
            |row| row.get::<_, i64>(0),
        )?;
        Ok(count)
    }
}
