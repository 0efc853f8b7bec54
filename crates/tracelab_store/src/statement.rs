//! Statement model.
//!
//! Statements are structured rather than parsed from text. Their `Display`
//! renders SQL, which is what log lines show.

use crate::value::Value;
use std::fmt;

/// An inner equi-join against a second table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Join {
    /// Right-hand table.
    pub table: String,
    /// Join column of the left table.
    pub left_column: String,
    /// Join column of the right table.
    pub right_column: String,
}

/// A read over one table, optionally joined with another.
///
/// Column names may be qualified (`Singers.SingerId`) or bare; bare names
/// resolve against the left table first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Select {
    /// Left (or only) table.
    pub table: String,
    /// Projected columns.
    pub columns: Vec<String>,
    /// Conjunction of equality predicates.
    pub filter: Vec<(String, Value)>,
    /// Optional join.
    pub join: Option<Join>,
    /// Index the read must use; it has to exist on the table.
    pub force_index: Option<String>,
    /// Maximum number of rows returned.
    pub limit: Option<usize>,
}

impl Select {
    /// Sets the projected columns.
    #[must_use]
    pub fn columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Adds an equality predicate.
    #[must_use]
    pub fn filter_eq(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter.push((column.into(), value.into()));
        self
    }

    /// Joins `table` on `left_column = right_column`.
    #[must_use]
    pub fn join(
        mut self,
        table: impl Into<String>,
        left_column: impl Into<String>,
        right_column: impl Into<String>,
    ) -> Self {
        self.join = Some(Join {
            table: table.into(),
            left_column: left_column.into(),
            right_column: right_column.into(),
        });
        self
    }

    /// Forces the read through a named index.
    #[must_use]
    pub fn force_index(mut self, index: impl Into<String>) -> Self {
        self.force_index = Some(index.into());
        self
    }

    /// Limits the number of returned rows.
    #[must_use]
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// A single-row insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Insert {
    /// Target table.
    pub table: String,
    /// Column assignments.
    pub values: Vec<(String, Value)>,
}

impl Insert {
    /// Assigns a column.
    #[must_use]
    pub fn value(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.push((column.into(), value.into()));
        self
    }
}

/// A statement the store can execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    /// Row read.
    Select(Select),
    /// Row insert; only valid inside a read-write transaction.
    Insert(Insert),
    /// `SELECT COUNT(column) FROM table`; counts non-null values.
    Count {
        /// Counted table.
        table: String,
        /// Counted column.
        column: String,
    },
}

impl Statement {
    /// Starts a select over `table`.
    pub fn select(table: impl Into<String>) -> Select {
        Select {
            table: table.into(),
            columns: Vec::new(),
            filter: Vec::new(),
            join: None,
            force_index: None,
            limit: None,
        }
    }

    /// Starts an insert into `table`.
    pub fn insert(table: impl Into<String>) -> Insert {
        Insert {
            table: table.into(),
            values: Vec::new(),
        }
    }

    /// Counts non-null values of `column` in `table`.
    pub fn count(table: impl Into<String>, column: impl Into<String>) -> Self {
        Statement::Count {
            table: table.into(),
            column: column.into(),
        }
    }

    /// Returns true if the statement writes.
    #[must_use]
    pub fn is_write(&self) -> bool {
        matches!(self, Statement::Insert(_))
    }
}

impl From<Select> for Statement {
    fn from(select: Select) -> Self {
        Statement::Select(select)
    }
}

impl From<Insert> for Statement {
    fn from(insert: Insert) -> Self {
        Statement::Insert(insert)
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Statement::Select(s) => {
                let columns = if s.columns.is_empty() {
                    "*".to_owned()
                } else {
                    s.columns.join(", ")
                };
                write!(f, "SELECT {columns} FROM {}", s.table)?;
                if let Some(index) = &s.force_index {
                    write!(f, "@{{FORCE_INDEX={index}}}")?;
                }
                if let Some(join) = &s.join {
                    write!(
                        f,
                        " JOIN {} ON {}.{} = {}.{}",
                        join.table, s.table, join.left_column, join.table, join.right_column
                    )?;
                }
                for (i, (column, value)) in s.filter.iter().enumerate() {
                    let keyword = if i == 0 { "WHERE" } else { "AND" };
                    write!(f, " {keyword} {column} = {value}")?;
                }
                if let Some(limit) = s.limit {
                    write!(f, " LIMIT {limit}")?;
                }
                Ok(())
            }
            Statement::Insert(i) => {
                let columns: Vec<&str> = i.values.iter().map(|(c, _)| c.as_str()).collect();
                let values: Vec<String> = i.values.iter().map(|(_, v)| v.to_string()).collect();
                write!(
                    f,
                    "INSERT {} ({}) VALUES ({})",
                    i.table,
                    columns.join(", "),
                    values.join(", ")
                )
            }
            Statement::Count { table, column } => {
                write!(f, "SELECT COUNT({column}) FROM {table}")
            }
        }
    }
}
