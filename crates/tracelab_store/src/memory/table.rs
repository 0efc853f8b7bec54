//! Versioned table storage and read execution.

use crate::error::{StoreError, StoreResult};
use crate::schema::{Schema, TableDef};
use crate::statement::{Select, Statement};
use crate::value::{Row, Value};
use std::collections::{BTreeMap, HashMap};

/// A committed row and the sequence number of the commit that wrote it.
#[derive(Debug, Clone)]
pub(crate) struct StoredRow {
    pub values: Vec<Value>,
    pub seq: u64,
}

/// Rows of one table, keyed by primary key.
#[derive(Debug, Default)]
pub(crate) struct TableData {
    pub rows: BTreeMap<Vec<Value>, StoredRow>,
    pub last_commit_seq: u64,
}

/// An insert buffered by a read-write transaction.
#[derive(Debug, Clone)]
pub(crate) struct PendingInsert {
    pub table: String,
    pub key: Vec<Value>,
    pub values: Vec<Value>,
}

/// What a transaction read from one table: rows matching `filter`
/// (storage column position, value). An empty filter covers the whole table.
#[derive(Debug, Clone)]
pub(crate) struct ReadFootprint {
    pub table: String,
    pub filter: Vec<(usize, Value)>,
}

impl ReadFootprint {
    pub fn matches(&self, row: &[Value]) -> bool {
        self.filter.iter().all(|(i, v)| row.get(*i) == Some(v))
    }
}

/// The rows a read may see: committed rows up to `seq`, plus the reader's
/// own uncommitted inserts.
#[derive(Debug, Clone, Copy)]
pub(crate) struct View<'a> {
    pub seq: u64,
    pub pending: &'a [PendingInsert],
}

/// Result of a read: rows plus the footprints to validate at commit.
#[derive(Debug)]
pub(crate) struct Executed {
    pub rows: Vec<Row>,
    pub footprints: Vec<ReadFootprint>,
}

pub(crate) fn table_data<'t>(
    tables: &'t HashMap<String, TableData>,
    name: &str,
) -> StoreResult<&'t TableData> {
    tables
        .get(name)
        .ok_or_else(|| StoreError::invalid_statement(format!("no table named {name}")))
}

fn visible_rows(
    tables: &HashMap<String, TableData>,
    table: &str,
    view: View<'_>,
) -> StoreResult<Vec<Vec<Value>>> {
    let data = table_data(tables, table)?;
    let mut merged: BTreeMap<&[Value], &[Value]> = data
        .rows
        .iter()
        .filter(|(_, row)| row.seq <= view.seq)
        .map(|(key, row)| (key.as_slice(), row.values.as_slice()))
        .collect();
    for insert in view.pending.iter().filter(|p| p.table == table) {
        merged.insert(insert.key.as_slice(), insert.values.as_slice());
    }
    Ok(merged.into_values().map(<[Value]>::to_vec).collect())
}

/// Tables participating in a select, with their offset in the combined row.
struct Scope<'s> {
    tables: Vec<(&'s TableDef, usize)>,
}

/// A column resolved against a [`Scope`].
#[derive(Debug, Clone, Copy)]
struct ResolvedColumn {
    table: usize,
    local: usize,
    combined: usize,
}

impl<'s> Scope<'s> {
    fn resolve(&self, name: &str) -> StoreResult<ResolvedColumn> {
        if let Some((qualifier, column)) = name.split_once('.') {
            let (pos, (def, offset)) = self
                .tables
                .iter()
                .enumerate()
                .find(|(_, (def, _))| def.name == qualifier)
                .ok_or_else(|| {
                    StoreError::invalid_statement(format!("table {qualifier} is not in scope"))
                })?;
            let local = def.column_index(column)?;
            return Ok(ResolvedColumn {
                table: pos,
                local,
                combined: offset + local,
            });
        }

        self.tables
            .iter()
            .enumerate()
            .find_map(|(pos, (def, offset))| {
                def.column_index(name).ok().map(|local| ResolvedColumn {
                    table: pos,
                    local,
                    combined: offset + local,
                })
            })
            .ok_or_else(|| StoreError::invalid_statement(format!("unknown column {name}")))
    }

    fn all_columns(&self) -> Vec<String> {
        let qualify = self.tables.len() > 1;
        self.tables
            .iter()
            .flat_map(|(def, _)| {
                def.columns.iter().map(move |c| {
                    if qualify {
                        format!("{}.{}", def.name, c.name)
                    } else {
                        c.name.clone()
                    }
                })
            })
            .collect()
    }
}

/// Executes a read statement against `view`.
pub(crate) fn execute_read(
    schema: &Schema,
    tables: &HashMap<String, TableData>,
    stmt: &Statement,
    view: View<'_>,
) -> StoreResult<Executed> {
    match stmt {
        Statement::Select(select) => execute_select(schema, tables, select, view),
        Statement::Count { table, column } => {
            let def = schema.table(table)?;
            let index = def.column_index(column)?;
            let count = visible_rows(tables, table, view)?
                .iter()
                .filter(|row| !row[index].is_null())
                .count();
            let count = i64::try_from(count)
                .map_err(|_| StoreError::column("row count does not fit INT64"))?;
            Ok(Executed {
                rows: vec![Row::new(
                    vec![format!("COUNT({column})")],
                    vec![Value::Int64(count)],
                )],
                footprints: vec![ReadFootprint {
                    table: table.clone(),
                    filter: Vec::new(),
                }],
            })
        }
        Statement::Insert(insert) => Err(StoreError::invalid_statement(format!(
            "INSERT into {} requires a read-write transaction",
            insert.table
        ))),
    }
}

fn execute_select(
    schema: &Schema,
    tables: &HashMap<String, TableData>,
    select: &Select,
    view: View<'_>,
) -> StoreResult<Executed> {
    let left = schema.table(&select.table)?;
    if let Some(index) = &select.force_index {
        left.index(index)?;
    }

    let mut scope = Scope {
        tables: vec![(left, 0)],
    };
    let right = match &select.join {
        Some(join) => {
            let right = schema.table(&join.table)?;
            scope.tables.push((right, left.columns.len()));
            Some((
                right,
                left.column_index(&join.left_column)?,
                right.column_index(&join.right_column)?,
            ))
        }
        None => None,
    };

    let column_names = if select.columns.is_empty() {
        scope.all_columns()
    } else {
        select.columns.clone()
    };
    let projection = column_names
        .iter()
        .map(|c| scope.resolve(c))
        .collect::<StoreResult<Vec<_>>>()?;
    let filter = select
        .filter
        .iter()
        .map(|(c, v)| Ok((scope.resolve(c)?, v.clone())))
        .collect::<StoreResult<Vec<_>>>()?;

    let left_rows = visible_rows(tables, &left.name, view)?;
    let combined: Vec<Vec<Value>> = match right {
        None => left_rows,
        Some((right, left_col, right_col)) => {
            let right_rows = visible_rows(tables, &right.name, view)?;
            let mut joined = Vec::new();
            for l in &left_rows {
                if l[left_col].is_null() {
                    continue;
                }
                for r in right_rows.iter().filter(|r| r[right_col] == l[left_col]) {
                    let mut row = l.clone();
                    row.extend_from_slice(r);
                    joined.push(row);
                }
            }
            joined
        }
    };

    let limit = select.limit.unwrap_or(usize::MAX);
    let rows = combined
        .into_iter()
        .filter(|row| filter.iter().all(|(col, v)| row[col.combined] == *v))
        .take(limit)
        .map(|row| {
            let values = projection.iter().map(|c| row[c.combined].clone()).collect();
            Row::new(column_names.clone(), values)
        })
        .collect();

    let footprints = scope
        .tables
        .iter()
        .enumerate()
        .map(|(pos, (def, _))| ReadFootprint {
            table: def.name.clone(),
            filter: filter
                .iter()
                .filter(|(col, _)| col.table == pos)
                .map(|(col, v)| (col.local, v.clone()))
                .collect(),
        })
        .collect();

    Ok(Executed { rows, footprints })
}
