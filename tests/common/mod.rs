//! Shared fixtures: mapped test entities and schema setup.
#![allow(dead_code)]

use entity_dao::db::DbError;
use entity_dao::{Entity, EntityRegistry};
use rusqlite::types::Value;
use rusqlite::{Connection, Row};

/// Person row with a database-assigned numeric key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Person {
    pub id: Option<i64>,
    pub name: String,
    pub score: i64,
}

impl Person {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            score: 0,
        }
    }
}

impl Entity for Person {
    fn table_name() -> &'static str {
        "persons"
    }
    fn id_column() -> &'static str {
        "id"
    }
    fn columns() -> &'static [&'static str] {
        &["id", "name", "score"]
    }
    fn id_value(&self) -> Value {
        self.id.map_or(Value::Null, Value::Integer)
    }
    fn set_id(&mut self, id: i64) {
        self.id = Some(id);
    }
    fn property(&self, name: &str) -> Option<Value> {
        match name {
            "id" => Some(self.id_value()),
            "name" => Some(Value::Text(self.name.clone())),
            "score" => Some(Value::Integer(self.score)),
            _ => None,
        }
    }
    fn set_property(&mut self, name: &str, value: Value) -> bool {
        match (name, value) {
            ("id", Value::Integer(v)) => self.id = Some(v),
            ("id", Value::Null) => self.id = None,
            ("name", Value::Text(v)) => self.name = v,
            ("score", Value::Integer(v)) => self.score = v,
            _ => return false,
        }
        true
    }
    fn from_row(row: &Row<'_>) -> Result<Self, DbError> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            score: row.get("score")?,
        })
    }
}

/// Order row referencing a person through the `persons_id` column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub id: Option<i64>,
    pub persons_id: i64,
    pub label: String,
}

impl Order {
    pub fn new(persons_id: i64, label: impl Into<String>) -> Self {
        Self {
            id: None,
            persons_id,
            label: label.into(),
        }
    }
}

impl Entity for Order {
    fn table_name() -> &'static str {
        "orders"
    }
    fn id_column() -> &'static str {
        "id"
    }
    fn columns() -> &'static [&'static str] {
        &["id", "persons_id", "label"]
    }
    fn id_value(&self) -> Value {
        self.id.map_or(Value::Null, Value::Integer)
    }
    fn set_id(&mut self, id: i64) {
        self.id = Some(id);
    }
    fn property(&self, name: &str) -> Option<Value> {
        match name {
            "id" => Some(self.id_value()),
            "persons_id" => Some(Value::Integer(self.persons_id)),
            "label" => Some(Value::Text(self.label.clone())),
            _ => None,
        }
    }
    fn set_property(&mut self, name: &str, value: Value) -> bool {
        match (name, value) {
            ("id", Value::Integer(v)) => self.id = Some(v),
            ("id", Value::Null) => self.id = None,
            ("persons_id", Value::Integer(v)) => self.persons_id = v,
            ("label", Value::Text(v)) => self.label = v,
            _ => return false,
        }
        true
    }
    fn from_row(row: &Row<'_>) -> Result<Self, DbError> {
        Ok(Self {
            id: row.get("id")?,
            persons_id: row.get("persons_id")?,
            label: row.get("label")?,
        })
    }
}

/// Name-only criteria projection over the `persons` table.
#[derive(Debug, Clone, Default)]
pub struct PersonByName {
    pub id: Option<i64>,
    pub name: Option<String>,
}

impl PersonByName {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: Some(name.into()),
        }
    }
}

impl Entity for PersonByName {
    fn table_name() -> &'static str {
        "persons"
    }
    fn id_column() -> &'static str {
        "id"
    }
    fn columns() -> &'static [&'static str] {
        &["id", "name"]
    }
    fn id_value(&self) -> Value {
        self.id.map_or(Value::Null, Value::Integer)
    }
    fn set_id(&mut self, id: i64) {
        self.id = Some(id);
    }
    fn property(&self, name: &str) -> Option<Value> {
        match name {
            "id" => Some(self.id_value()),
            "name" => Some(
                self.name
                    .clone()
                    .map_or(Value::Null, Value::Text),
            ),
            _ => None,
        }
    }
    fn set_property(&mut self, name: &str, value: Value) -> bool {
        match (name, value) {
            ("id", Value::Integer(v)) => self.id = Some(v),
            ("id", Value::Null) => self.id = None,
            ("name", Value::Text(v)) => self.name = Some(v),
            ("name", Value::Null) => self.name = None,
            _ => return false,
        }
        true
    }
    fn from_row(row: &Row<'_>) -> Result<Self, DbError> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
        })
    }
}

/// Creates the test schema on an open connection.
pub fn create_schema(conn: &Connection) {
    conn.execute_batch(
        "CREATE TABLE persons (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            score INTEGER NOT NULL DEFAULT 0
        );
        CREATE TABLE orders (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            persons_id INTEGER NOT NULL REFERENCES persons(id),
            label TEXT NOT NULL
        );",
    )
    .unwrap();
}

/// Registry with every test entity registered.
pub fn registry() -> EntityRegistry {
    let mut registry = EntityRegistry::new();
    registry.register::<Person>();
    registry.register::<Order>();
    registry.register::<PersonByName>();
    registry
}
