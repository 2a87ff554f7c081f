//! SQL generation facility.
//!
//! # Responsibility
//! - Build executable statement descriptions from entity metadata and
//!   in-memory entity state.
//!
//! # Invariants
//! - Builders have no execution side effects; they only assemble text and
//!   bind values.
//! - Table names and column lists come from static `Entity` metadata.
//!   Caller-supplied column names are validated against that metadata by the
//!   coordinator before they reach a builder, so both are interpolated
//!   directly.

use crate::meta::Entity;
use rusqlite::types::Value;

/// Opaque executable statement: SQL text plus positional bind values.
#[derive(Debug, Clone, PartialEq)]
pub struct SqlStatement {
    pub sql: String,
    pub params: Vec<Value>,
}

/// Builds an insert from the entity's current state.
///
/// Columns holding `Value::Null` are skipped; any other value, the id
/// included, travels with the statement.
pub fn insert<E: Entity>(entity: &E) -> SqlStatement {
    build_insert(entity, false)
}

/// Builds an insert that always omits the id column, whatever its current
/// value. Used when the database assigns the key, so a leftover zero id can
/// never leak into the row.
pub fn insert_without_id<E: Entity>(entity: &E) -> SqlStatement {
    build_insert(entity, true)
}

fn build_insert<E: Entity>(entity: &E, skip_id: bool) -> SqlStatement {
    let mut columns = Vec::new();
    let mut params = Vec::new();

    for column in E::columns() {
        if skip_id && *column == E::id_column() {
            continue;
        }
        match entity.property(column) {
            Some(Value::Null) | None => {}
            Some(value) => {
                columns.push(*column);
                params.push(value);
            }
        }
    }

    if columns.is_empty() {
        return SqlStatement {
            sql: format!("INSERT INTO {} DEFAULT VALUES", E::table_name()),
            params,
        };
    }

    let placeholders = vec!["?"; columns.len()].join(", ");
    SqlStatement {
        sql: format!(
            "INSERT INTO {} ({}) VALUES ({})",
            E::table_name(),
            columns.join(", "),
            placeholders
        ),
        params,
    }
}

/// Builds a full-column update by primary key from the entity's current
/// state. Null-valued columns are written as NULL.
pub fn update_all_columns<E: Entity>(entity: &E) -> SqlStatement {
    let mut assignments = Vec::new();
    let mut params = Vec::new();

    for column in E::columns() {
        if *column == E::id_column() {
            continue;
        }
        assignments.push(format!("{column} = ?"));
        params.push(entity.property(column).unwrap_or(Value::Null));
    }

    params.push(entity.id_value());
    SqlStatement {
        sql: format!(
            "UPDATE {} SET {} WHERE {} = ?",
            E::table_name(),
            assignments.join(", "),
            E::id_column()
        ),
        params,
    }
}

/// Builds a single-column update by primary key.
pub fn update_column<E: Entity>(entity: &E, name: &str, value: Value) -> SqlStatement {
    SqlStatement {
        sql: format!(
            "UPDATE {} SET {} = ? WHERE {} = ?",
            E::table_name(),
            name,
            E::id_column()
        ),
        params: vec![value, entity.id_value()],
    }
}

pub fn find_by_id<E: Entity>(id: i64) -> SqlStatement {
    SqlStatement {
        sql: format!(
            "{} WHERE {} = ?",
            select_clause::<E>(),
            E::id_column()
        ),
        params: vec![Value::Integer(id)],
    }
}

pub fn find_by_column<E: Entity>(name: &str, value: Value) -> SqlStatement {
    SqlStatement {
        sql: format!("{} WHERE {} = ?", select_clause::<E>(), name),
        params: vec![value],
    }
}

/// Builds a query-by-example select: every non-null property of the example
/// becomes an equality filter. An all-null example matches every row.
pub fn find_by_example<E: Entity>(example: &E) -> SqlStatement {
    let (filter, params) = example_filter(example);
    SqlStatement {
        sql: format!("{}{}", select_clause::<E>(), filter),
        params,
    }
}

/// Query-by-example against a different target type: the filter comes from
/// the criteria object, rows are selected from the target's table.
pub fn find_by_example_as<T: Entity, C: Entity>(criteria: &C) -> SqlStatement {
    let (filter, params) = example_filter(criteria);
    SqlStatement {
        sql: format!("{}{}", select_clause::<T>(), filter),
        params,
    }
}

pub fn delete_by_id<E: Entity>(id: i64) -> SqlStatement {
    SqlStatement {
        sql: format!(
            "DELETE FROM {} WHERE {} = ?",
            E::table_name(),
            E::id_column()
        ),
        params: vec![Value::Integer(id)],
    }
}

/// Delete keyed by the entity's current id value.
pub fn delete_by_entity<E: Entity>(entity: &E) -> SqlStatement {
    SqlStatement {
        sql: format!(
            "DELETE FROM {} WHERE {} = ?",
            E::table_name(),
            E::id_column()
        ),
        params: vec![entity.id_value()],
    }
}

pub fn count<E: Entity>() -> SqlStatement {
    SqlStatement {
        sql: format!("SELECT COUNT(*) FROM {}", E::table_name()),
        params: Vec::new(),
    }
}

/// Builds a server-side `column = column + delta` update by primary key.
/// The `positive` flag selects the sign; the delta itself is passed as-is.
pub fn increase_column<E: Entity>(id: i64, name: &str, delta: i64, positive: bool) -> SqlStatement {
    let signed = if positive { delta } else { -delta };
    SqlStatement {
        sql: format!(
            "UPDATE {} SET {} = {} + ? WHERE {} = ?",
            E::table_name(),
            name,
            name,
            E::id_column()
        ),
        params: vec![Value::Integer(signed), Value::Integer(id)],
    }
}

/// Builds a select for rows of `T` referencing `source` through the
/// `{source_table}_{source_id_column}` foreign-key column convention.
pub fn find_foreign<T: Entity, S: Entity>(source: &S) -> SqlStatement {
    SqlStatement {
        sql: format!(
            "{} WHERE {}_{} = ?",
            select_clause::<T>(),
            S::table_name(),
            S::id_column()
        ),
        params: vec![source.id_value()],
    }
}

pub fn select_all<E: Entity>() -> SqlStatement {
    SqlStatement {
        sql: select_clause::<E>(),
        params: Vec::new(),
    }
}

fn select_clause<E: Entity>() -> String {
    format!("SELECT {} FROM {}", E::columns().join(", "), E::table_name())
}

fn example_filter<E: Entity>(example: &E) -> (String, Vec<Value>) {
    let mut predicates = Vec::new();
    let mut params = Vec::new();

    for column in E::columns() {
        match example.property(column) {
            Some(Value::Null) | None => {}
            Some(value) => {
                predicates.push(format!("{column} = ?"));
                params.push(value);
            }
        }
    }

    if predicates.is_empty() {
        (String::new(), params)
    } else {
        (format!(" WHERE {}", predicates.join(" AND ")), params)
    }
}
