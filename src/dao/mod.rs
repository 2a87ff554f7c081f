//! Generic DAO coordinator.
//!
//! # Responsibility
//! - Expose the uniform store/save/update/find/delete/count surface for any
//!   registered entity type.
//! - Decide insert-vs-update from entity state and keep the in-memory id
//!   field consistent with the database across every path.
//!
//! # Invariants
//! - Every operation resolves the entity descriptor first; an unregistered
//!   type is a configuration error, never a silent pass-through.
//! - `store` executes exactly one insert or one update, decided once up
//!   front from the persistence test.
//! - In-memory mutation (id write-back, mirrored property value) happens
//!   only after the corresponding database write succeeded.

use crate::db::DbError;
use crate::exec::StatementExecutor;
use crate::meta::{Entity, EntityMeta, EntityRegistry};
use crate::sql;
use log::debug;
use rusqlite::types::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

pub type DaoResult<T> = Result<T, DaoError>;

/// Semantic DAO error, layered above transport-level `DbError`.
#[derive(Debug)]
pub enum DaoError {
    /// The runtime type was never registered as an entity.
    NotMapped(&'static str),
    /// A named property does not exist on the entity type.
    UnknownProperty {
        type_name: &'static str,
        property: String,
    },
    /// The supplied value cannot be stored in the named property.
    PropertyTypeMismatch {
        type_name: &'static str,
        property: String,
    },
    /// The external key generator failed.
    KeyGeneration(String),
    Db(DbError),
}

impl Display for DaoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotMapped(type_name) => write!(f, "not a mapped entity: {type_name}"),
            Self::UnknownProperty {
                type_name,
                property,
            } => write!(f, "unknown property `{property}` on {type_name}"),
            Self::PropertyTypeMismatch {
                type_name,
                property,
            } => write!(
                f,
                "value not storable in property `{property}` on {type_name}"
            ),
            Self::KeyGeneration(message) => write!(f, "key generation failed: {message}"),
            Self::Db(err) => write!(f, "{err}"),
        }
    }
}

impl Error for DaoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for DaoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

/// Primary-key generation strategy for the insert branch of `store`.
///
/// `External` carries its generator, so the misconfigured state "external
/// keys but no generator" cannot be constructed.
#[derive(Clone)]
pub enum KeyStrategy {
    /// The database assigns the key at insert time; it is read back and
    /// written into the entity afterwards.
    DatabaseGenerated,
    /// The generator allocates the key before the insert is built, and the
    /// key travels inside the insert statement.
    External(Arc<dyn Fn(&EntityMeta) -> Result<i64, String> + Send + Sync>),
}

impl KeyStrategy {
    pub fn external(
        generator: impl Fn(&EntityMeta) -> Result<i64, String> + Send + Sync + 'static,
    ) -> Self {
        Self::External(Arc::new(generator))
    }
}

impl Default for KeyStrategy {
    fn default() -> Self {
        Self::DatabaseGenerated
    }
}

impl std::fmt::Debug for KeyStrategy {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DatabaseGenerated => f.write_str("DatabaseGenerated"),
            Self::External(_) => f.write_str("External"),
        }
    }
}

/// Generic entity persistence coordinator.
///
/// Stateless per call: it composes the SQL generator and the executor for
/// each operation. The registry, executor, and key strategy are injected at
/// construction; there is no ambient global state.
pub struct Dao<X: StatementExecutor> {
    registry: EntityRegistry,
    executor: X,
    keys: KeyStrategy,
}

impl<X: StatementExecutor> Dao<X> {
    /// Creates a coordinator with the default database-generated keys.
    pub fn new(registry: EntityRegistry, executor: X) -> Self {
        Self {
            registry,
            executor,
            keys: KeyStrategy::DatabaseGenerated,
        }
    }

    pub fn with_key_strategy(mut self, keys: KeyStrategy) -> Self {
        self.keys = keys;
        self
    }

    pub fn key_strategy(&self) -> &KeyStrategy {
        &self.keys
    }

    /// Replaces the key strategy. Intended for startup configuration, not
    /// for mutation under concurrent traffic.
    pub fn set_key_strategy(&mut self, keys: KeyStrategy) {
        self.keys = keys;
    }

    pub fn registry(&self) -> &EntityRegistry {
        &self.registry
    }

    fn meta_of<E: Entity>(&self) -> DaoResult<&EntityMeta> {
        self.registry
            .resolve::<E>()
            .ok_or_else(|| DaoError::NotMapped(std::any::type_name::<E>()))
    }

    /// Rejects column names absent from the descriptor before they can
    /// reach a statement builder.
    fn ensure_column(meta: &EntityMeta, name: &str) -> DaoResult<()> {
        if meta.columns.iter().any(|column| *column == name) {
            Ok(())
        } else {
            Err(DaoError::UnknownProperty {
                type_name: meta.type_name,
                property: name.to_string(),
            })
        }
    }

    // ---------------------------------------------------------------- store

    /// Inserts or updates the entity, decided once by the persistence test.
    ///
    /// Transient entities (null or zero id) are inserted and receive their
    /// generated key in place; persistent entities get a full-column update.
    ///
    /// # Contract
    /// - Exactly one insert or one update executes, never both.
    /// - The id field is mutated only on the insert branch, and only after
    ///   the key is known.
    pub fn store<E: Entity>(&self, entity: &mut E) -> DaoResult<()> {
        let meta = self.meta_of::<E>()?;

        if is_persistent(&entity.id_value()) {
            debug!(
                "event=store module=dao branch=update entity={}",
                meta.type_name
            );
            self.executor.execute(&sql::update_all_columns(entity))?;
            return Ok(());
        }

        debug!(
            "event=store module=dao branch=insert entity={}",
            meta.type_name
        );
        match &self.keys {
            KeyStrategy::DatabaseGenerated => {
                // The id column must stay out of the statement: a transient
                // entity can still carry a literal zero id, and SQLite would
                // happily key the row 0 instead of assigning a fresh rowid.
                let stmt = sql::insert_without_id(entity);
                let key = self.executor.execute_returning_key(&stmt)?;
                entity.set_id(key);
            }
            KeyStrategy::External(generate) => {
                let key = generate(meta).map_err(DaoError::KeyGeneration)?;
                entity.set_id(key);
                self.executor.execute(&sql::insert(entity))?;
            }
        }
        Ok(())
    }

    /// Unconditionally inserts the entity, skipping the persistence test.
    pub fn save<E: Entity>(&self, entity: &E) -> DaoResult<()> {
        self.meta_of::<E>()?;
        self.executor.execute(&sql::insert(entity))?;
        Ok(())
    }

    /// Inserts each entity in order.
    ///
    /// Not transactional: a failure on element `k` propagates immediately
    /// and leaves elements before `k` already committed. Callers needing
    /// atomicity wrap the batch in their own transaction.
    pub fn save_all<E: Entity>(&self, entities: &[E]) -> DaoResult<()> {
        for entity in entities {
            self.save(entity)?;
        }
        Ok(())
    }

    // ---------------------------------------------------------------- update

    /// Unconditional full-column update by primary key.
    pub fn update<E: Entity>(&self, entity: &E) -> DaoResult<()> {
        self.meta_of::<E>()?;
        self.executor.execute(&sql::update_all_columns(entity))?;
        Ok(())
    }

    /// Updates each entity in order; same partial-failure behavior as
    /// [`Dao::save_all`].
    pub fn update_all<E: Entity>(&self, entities: &[E]) -> DaoResult<()> {
        for entity in entities {
            self.update(entity)?;
        }
        Ok(())
    }

    /// Writes one property to the database and mirrors it in memory.
    ///
    /// # Contract
    /// - After a successful call, database and in-memory value both equal
    ///   `value`; after a failed call, both are unchanged. The two can
    ///   never diverge: a value the entity refuses to hold is rejected
    ///   before the database write, and a failed write rolls the in-memory
    ///   mirror back.
    pub fn update_property<E: Entity>(
        &self,
        entity: &mut E,
        name: &str,
        value: Value,
    ) -> DaoResult<()> {
        let meta = self.meta_of::<E>()?;
        let previous = entity
            .property(name)
            .ok_or_else(|| DaoError::UnknownProperty {
                type_name: meta.type_name,
                property: name.to_string(),
            })?;

        // Statement first: it must key on the entity's current id, even
        // when the property being written is the id itself.
        let stmt = sql::update_column(entity, name, value.clone());

        if !entity.set_property(name, value) {
            return Err(DaoError::PropertyTypeMismatch {
                type_name: meta.type_name,
                property: name.to_string(),
            });
        }

        match self.executor.execute(&stmt) {
            Ok(_) => Ok(()),
            Err(err) => {
                entity.set_property(name, previous);
                Err(err.into())
            }
        }
    }

    /// Pushes the current in-memory value of one property to the database.
    ///
    /// No in-memory mutation happens; the entity already holds the value.
    pub fn flush_property<E: Entity>(&self, entity: &E, name: &str) -> DaoResult<()> {
        let meta = self.meta_of::<E>()?;
        let value = entity
            .property(name)
            .ok_or_else(|| DaoError::UnknownProperty {
                type_name: meta.type_name,
                property: name.to_string(),
            })?;

        self.executor
            .execute(&sql::update_column(entity, name, value))?;
        Ok(())
    }

    // ---------------------------------------------------------------- find

    /// Finds one entity by primary key. `Ok(None)` when no row matches.
    pub fn find_by_id<E: Entity>(&self, id: i64) -> DaoResult<Option<E>> {
        self.meta_of::<E>()?;
        Ok(self.executor.fetch_one(&sql::find_by_id::<E>(id))?)
    }

    /// Finds one entity matching a single property. `Ok(None)` on no match.
    pub fn find_one_by_property<E: Entity>(
        &self,
        name: &str,
        value: Value,
    ) -> DaoResult<Option<E>> {
        let meta = self.meta_of::<E>()?;
        Self::ensure_column(meta, name)?;
        Ok(self
            .executor
            .fetch_one(&sql::find_by_column::<E>(name, value))?)
    }

    /// Finds one entity by example. `Ok(None)` when no row matches.
    pub fn find_one<E: Entity>(&self, criteria: &E) -> DaoResult<Option<E>> {
        self.meta_of::<E>()?;
        Ok(self.executor.fetch_one(&sql::find_by_example(criteria))?)
    }

    /// Finds all entities matching the example.
    pub fn find<E: Entity>(&self, criteria: &E) -> DaoResult<Vec<E>> {
        self.meta_of::<E>()?;
        Ok(self.executor.fetch_all(&sql::find_by_example(criteria))?)
    }

    /// Finds rows of `T` filtered by another type's example criteria.
    pub fn find_as<T: Entity, C: Entity>(&self, criteria: &C) -> DaoResult<Vec<T>> {
        self.meta_of::<T>()?;
        self.meta_of::<C>()?;
        Ok(self
            .executor
            .fetch_all(&sql::find_by_example_as::<T, C>(criteria))?)
    }

    // ---------------------------------------------------------------- delete

    /// Deletes by type and key. Touches no in-memory entity.
    pub fn delete_by_id<E: Entity>(&self, id: i64) -> DaoResult<()> {
        self.meta_of::<E>()?;
        self.executor.execute(&sql::delete_by_id::<E>(id))?;
        Ok(())
    }

    /// Deletes the entity's row, then resets its id to zero in memory.
    ///
    /// # Contract
    /// - The id reset happens only when the delete affected at least one
    ///   row; deleting an absent row leaves the entity untouched.
    pub fn delete<E: Entity>(&self, entity: &mut E) -> DaoResult<()> {
        self.meta_of::<E>()?;
        let affected = self.executor.execute(&sql::delete_by_entity(entity))?;

        if affected > 0 {
            entity.set_id(0);
        }
        Ok(())
    }

    /// Deletes each entity in order; same partial-failure behavior as
    /// [`Dao::save_all`].
    pub fn delete_all<E: Entity>(&self, entities: &mut [E]) -> DaoResult<()> {
        for entity in entities.iter_mut() {
            self.delete(entity)?;
        }
        Ok(())
    }

    // ---------------------------------------------------------------- misc

    /// Counts all rows of the entity's table.
    pub fn count<E: Entity>(&self) -> DaoResult<i64> {
        self.meta_of::<E>()?;
        Ok(self.executor.fetch_count(&sql::count::<E>())?)
    }

    /// Server-side `column = column + delta` by primary key. No in-memory
    /// entity is involved.
    pub fn increase_property<E: Entity>(
        &self,
        id: i64,
        name: &str,
        delta: i64,
    ) -> DaoResult<()> {
        let meta = self.meta_of::<E>()?;
        Self::ensure_column(meta, name)?;
        self.executor
            .execute(&sql::increase_column::<E>(id, name, delta, true))?;
        Ok(())
    }

    /// Server-side `column = column - delta` by primary key.
    pub fn decrease_property<E: Entity>(
        &self,
        id: i64,
        name: &str,
        delta: i64,
    ) -> DaoResult<()> {
        let meta = self.meta_of::<E>()?;
        Self::ensure_column(meta, name)?;
        self.executor
            .execute(&sql::increase_column::<E>(id, name, delta, false))?;
        Ok(())
    }

    /// Lists rows of `T` referencing the source entity's key through the
    /// `{source_table}_{source_id_column}` column convention.
    pub fn find_related<T: Entity, S: Entity>(&self, source: &S) -> DaoResult<Vec<T>> {
        self.meta_of::<T>()?;
        self.meta_of::<S>()?;
        Ok(self
            .executor
            .fetch_all(&sql::find_foreign::<T, S>(source))?)
    }

    /// Lists every row of the entity's table.
    pub fn list_all<E: Entity>(&self) -> DaoResult<Vec<E>> {
        self.meta_of::<E>()?;
        Ok(self.executor.fetch_all(&sql::select_all::<E>())?)
    }
}

/// Persistence test: null id or numeric zero id means transient; any other
/// value, including non-numeric keys, means persistent.
fn is_persistent(id: &Value) -> bool {
    match id {
        Value::Null => false,
        Value::Integer(v) => *v != 0,
        Value::Real(v) => *v != 0.0,
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::is_persistent;
    use rusqlite::types::Value;

    #[test]
    fn null_id_is_transient() {
        assert!(!is_persistent(&Value::Null));
    }

    #[test]
    fn zero_numeric_id_is_transient() {
        assert!(!is_persistent(&Value::Integer(0)));
        assert!(!is_persistent(&Value::Real(0.0)));
    }

    #[test]
    fn nonzero_numeric_id_is_persistent() {
        assert!(is_persistent(&Value::Integer(7)));
        assert!(is_persistent(&Value::Integer(-1)));
        assert!(is_persistent(&Value::Real(2.5)));
    }

    #[test]
    fn non_numeric_id_is_always_persistent() {
        assert!(is_persistent(&Value::Text("a7f0".to_string())));
        assert!(is_persistent(&Value::Blob(vec![0])));
    }
}
