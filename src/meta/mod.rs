//! Entity metadata: the mapping contract and the type-keyed registry.
//!
//! # Responsibility
//! - Define the `Entity` contract every mapped type implements.
//! - Resolve runtime types to their `EntityMeta` descriptor.
//!
//! # Invariants
//! - One descriptor per registered type; descriptors are immutable after
//!   registration.
//! - Resolving an unregistered type yields `None`; the DAO surfaces that as
//!   a configuration error, never a silent fallback.

use crate::db::DbError;
use rusqlite::types::Value;
use rusqlite::Row;
use std::any::TypeId;
use std::collections::HashMap;

/// Contract for a type mapped to a relational table.
///
/// Property access goes through `rusqlite::types::Value` so the DAO can move
/// field values around without knowing the concrete type. Implementations
/// are expected to be plain hand-written mappings; the id column must be
/// included in `columns()`.
pub trait Entity: Sized + 'static {
    fn table_name() -> &'static str;
    fn id_column() -> &'static str;
    fn columns() -> &'static [&'static str];

    /// Current id value. `Value::Null` means the entity has no id yet.
    fn id_value(&self) -> Value;

    /// Writes a generated numeric key into the id field.
    fn set_id(&mut self, id: i64);

    /// Current value of a mapped property, or `None` for an unknown name.
    fn property(&self, name: &str) -> Option<Value>;

    /// Writes a mapped property. Returns `false` for an unknown name.
    fn set_property(&mut self, name: &str, value: Value) -> bool;

    /// Maps one result row back into an entity.
    fn from_row(row: &Row<'_>) -> Result<Self, DbError>;
}

/// Descriptor for one registered entity type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityMeta {
    pub type_name: &'static str,
    pub table: &'static str,
    pub id_column: &'static str,
    pub columns: &'static [&'static str],
}

/// Runtime registry of mapped entity types.
///
/// Registration is a deliberate startup act: the DAO refuses to touch a type
/// that was never registered, even though the `Entity` bound is satisfied
/// statically. This keeps "not a mapped entity" a detectable configuration
/// error instead of an accident.
#[derive(Debug, Default)]
pub struct EntityRegistry {
    entries: HashMap<TypeId, EntityMeta>,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an entity type. Re-registering the same type is a no-op.
    pub fn register<E: Entity>(&mut self) {
        self.entries
            .entry(TypeId::of::<E>())
            .or_insert_with(|| EntityMeta {
                type_name: std::any::type_name::<E>(),
                table: E::table_name(),
                id_column: E::id_column(),
                columns: E::columns(),
            });
    }

    /// Resolves the descriptor for a type, or `None` when unregistered.
    pub fn resolve<E: Entity>(&self) -> Option<&EntityMeta> {
        self.entries.get(&TypeId::of::<E>())
    }

    pub fn is_registered<E: Entity>(&self) -> bool {
        self.entries.contains_key(&TypeId::of::<E>())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
