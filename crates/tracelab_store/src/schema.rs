//! Table definitions.

use crate::error::{StoreError, StoreResult};
use crate::value::Value;

/// Column data type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    /// 64-bit signed integer.
    Int64,
    /// UTF-8 string.
    String,
}

impl ColumnType {
    /// Returns true if a non-null `value` has this type.
    #[must_use]
    pub fn matches(self, value: &Value) -> bool {
        matches!(
            (self, value),
            (ColumnType::Int64, Value::Int64(_)) | (ColumnType::String, Value::String(_))
        )
    }
}

/// A column definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDef {
    /// Column name.
    pub name: String,
    /// Column type.
    pub ty: ColumnType,
    /// Whether NULL is allowed.
    pub nullable: bool,
}

/// A secondary index. Only its existence matters to the in-memory store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexDef {
    /// Index name.
    pub name: String,
    /// Indexed columns.
    pub columns: Vec<String>,
}

/// A foreign key from a column of this table to a column of a parent table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKey {
    /// Referencing column in this table.
    pub column: String,
    /// Parent table.
    pub references_table: String,
    /// Referenced column in the parent table.
    pub references_column: String,
}

/// A table definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDef {
    /// Table name.
    pub name: String,
    /// Columns in storage order.
    pub columns: Vec<ColumnDef>,
    /// Primary key columns.
    pub primary_key: Vec<String>,
    /// Secondary indexes.
    pub indexes: Vec<IndexDef>,
    /// Foreign keys.
    pub foreign_keys: Vec<ForeignKey>,
}

impl TableDef {
    /// Creates an empty table definition.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            primary_key: Vec::new(),
            indexes: Vec::new(),
            foreign_keys: Vec::new(),
        }
    }

    /// Adds a non-null column.
    #[must_use]
    pub fn with_column(mut self, name: impl Into<String>, ty: ColumnType) -> Self {
        self.columns.push(ColumnDef {
            name: name.into(),
            ty,
            nullable: false,
        });
        self
    }

    /// Adds a nullable column.
    #[must_use]
    pub fn with_nullable_column(mut self, name: impl Into<String>, ty: ColumnType) -> Self {
        self.columns.push(ColumnDef {
            name: name.into(),
            ty,
            nullable: true,
        });
        self
    }

    /// Sets the primary key columns.
    #[must_use]
    pub fn with_primary_key<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.primary_key = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Adds a secondary index.
    #[must_use]
    pub fn with_index<I, S>(mut self, name: impl Into<String>, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.indexes.push(IndexDef {
            name: name.into(),
            columns: columns.into_iter().map(Into::into).collect(),
        });
        self
    }

    /// Adds a foreign key.
    #[must_use]
    pub fn with_foreign_key(
        mut self,
        column: impl Into<String>,
        references_table: impl Into<String>,
        references_column: impl Into<String>,
    ) -> Self {
        self.foreign_keys.push(ForeignKey {
            column: column.into(),
            references_table: references_table.into(),
            references_column: references_column.into(),
        });
        self
    }

    /// Returns the storage position of a column.
    pub fn column_index(&self, name: &str) -> StoreResult<usize> {
        self.columns
            .iter()
            .position(|c| c.name == name)
            .ok_or_else(|| {
                StoreError::invalid_statement(format!("no column {name} in table {}", self.name))
            })
    }

    /// Returns the storage positions of the primary key columns.
    pub fn primary_key_indexes(&self) -> StoreResult<Vec<usize>> {
        self.primary_key
            .iter()
            .map(|c| self.column_index(c))
            .collect()
    }

    /// Looks up a secondary index by name.
    pub fn index(&self, name: &str) -> StoreResult<&IndexDef> {
        self.indexes.iter().find(|i| i.name == name).ok_or_else(|| {
            StoreError::invalid_statement(format!("no index {name} on table {}", self.name))
        })
    }

    /// Validates and orders insert assignments into a full storage row.
    ///
    /// Unassigned nullable columns become NULL.
    pub fn build_row(&self, assignments: &[(String, Value)]) -> StoreResult<Vec<Value>> {
        for (i, (name, _)) in assignments.iter().enumerate() {
            self.column_index(name)?;
            if assignments[..i].iter().any(|(n, _)| n == name) {
                return Err(StoreError::invalid_statement(format!(
                    "column {name} assigned twice"
                )));
            }
        }

        self.columns
            .iter()
            .map(|col| {
                let value = assignments
                    .iter()
                    .find(|(n, _)| *n == col.name)
                    .map_or(Value::Null, |(_, v)| v.clone());
                if value.is_null() {
                    if col.nullable {
                        return Ok(value);
                    }
                    return Err(StoreError::invalid_statement(format!(
                        "column {}.{} is not nullable",
                        self.name, col.name
                    )));
                }
                if !col.ty.matches(&value) {
                    return Err(StoreError::invalid_statement(format!(
                        "column {}.{} expects {:?}, got {}",
                        self.name,
                        col.name,
                        col.ty,
                        value.type_name()
                    )));
                }
                Ok(value)
            })
            .collect()
    }
}

/// The set of tables a store serves.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    tables: Vec<TableDef>,
}

impl Schema {
    /// Creates an empty schema.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a table.
    #[must_use]
    pub fn with_table(mut self, table: TableDef) -> Self {
        self.tables.push(table);
        self
    }

    /// Looks up a table by name.
    pub fn table(&self, name: &str) -> StoreResult<&TableDef> {
        self.tables
            .iter()
            .find(|t| t.name == name)
            .ok_or_else(|| StoreError::invalid_statement(format!("no table named {name}")))
    }

    /// Returns all tables.
    #[must_use]
    pub fn tables(&self) -> &[TableDef] {
        &self.tables
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn people() -> TableDef {
        TableDef::new("People")
            .with_column("PersonId", ColumnType::Int64)
            .with_column("Name", ColumnType::String)
            .with_nullable_column("Nickname", ColumnType::String)
            .with_primary_key(["PersonId"])
            .with_index("PeopleByName", ["Name"])
    }

    #[test]
    fn build_row_orders_and_fills_nulls() {
        let row = people()
            .build_row(&[
                ("Name".into(), Value::from("Ada")),
                ("PersonId".into(), Value::from(1)),
            ])
            .unwrap();
        assert_eq!(row, vec![Value::Int64(1), Value::from("Ada"), Value::Null]);
    }

    #[test]
    fn build_row_rejects_bad_assignments() {
        let table = people();
        assert!(table.build_row(&[("Name".into(), Value::from("Ada"))]).is_err());
        assert!(table
            .build_row(&[
                ("PersonId".into(), Value::from("one")),
                ("Name".into(), Value::from("Ada")),
            ])
            .is_err());
        assert!(table
            .build_row(&[
                ("PersonId".into(), Value::from(1)),
                ("PersonId".into(), Value::from(2)),
                ("Name".into(), Value::from("Ada")),
            ])
            .is_err());
        assert!(table
            .build_row(&[
                ("PersonId".into(), Value::from(1)),
                ("Name".into(), Value::from("Ada")),
                ("Age".into(), Value::from(40)),
            ])
            .is_err());
    }

    #[test]
    fn lookups() {
        let schema = Schema::new().with_table(people());
        let table = schema.table("People").unwrap();
        assert_eq!(table.primary_key_indexes().unwrap(), vec![0]);
        assert!(table.index("PeopleByName").is_ok());
        assert!(table.index("PeopleByAge").is_err());
        assert!(schema.table("Pets").is_err());
    }
}
