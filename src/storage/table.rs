//! Table storage for FlatDB
//!
//! A table is a header of column names followed by rows of text fields. All
//! operations here are pure transformations over the in-memory table; nothing
//! reaches disk until the commit protocol persists the result.

use crate::error::{Error, Result};

/// A single row: text fields positionally correlated with the header
pub type Row = Vec<String>;

/// Column name matching policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnMatch {
    /// Case-sensitive exact match
    Exact,
    /// ASCII case-insensitive match
    IgnoreCase,
}

impl ColumnMatch {
    /// Whether a header column satisfies the requested name
    pub fn matches(self, column: &str, name: &str) -> bool {
        match self {
            ColumnMatch::Exact => column == name,
            ColumnMatch::IgnoreCase => column.eq_ignore_ascii_case(name),
        }
    }
}

/// In-memory image of one table file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    /// Table name (file stem)
    name: String,
    /// Column names, in header order
    columns: Vec<String>,
    /// Rows, in file order
    rows: Vec<Row>,
}

impl Table {
    /// Create an empty table with the given header
    pub fn new(name: impl Into<String>, columns: Vec<String>) -> Self {
        Self {
            name: name.into(),
            columns,
            rows: Vec::new(),
        }
    }

    /// Create a table from an existing header and rows
    pub fn with_rows(name: impl Into<String>, columns: Vec<String>, rows: Vec<Row>) -> Self {
        Self {
            name: name.into(),
            columns,
            rows,
        }
    }

    /// Get table name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get column names
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Get all rows
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Number of rows (header excluded)
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Resolve a column name to its position in the header
    pub fn column_index(&self, name: &str, policy: ColumnMatch) -> Result<usize> {
        self.columns
            .iter()
            .position(|c| policy.matches(c, name))
            .ok_or_else(|| Error::ColumnNotFound(name.to_string(), self.name.clone()))
    }

    /// Append a row; the value count must equal the column count
    pub fn insert(&mut self, values: Row) -> Result<()> {
        if values.len() != self.columns.len() {
            return Err(Error::ShapeMismatch {
                table: self.name.clone(),
                expected: self.columns.len(),
                found: values.len(),
            });
        }
        self.rows.push(values);
        Ok(())
    }

    /// Set `set_column` to `set_value` in every row whose `where_column`
    /// equals `where_value`. Returns the number of rows changed.
    ///
    /// Both columns are resolved before any row is touched, so a missing
    /// column leaves the table unchanged.
    pub fn update_where(
        &mut self,
        set_column: &str,
        set_value: &str,
        where_column: &str,
        where_value: &str,
        policy: ColumnMatch,
    ) -> Result<usize> {
        let set_idx = self.column_index(set_column, policy)?;
        let where_idx = self.column_index(where_column, policy)?;

        let mut changed = 0;
        for row in &mut self.rows {
            if row.get(where_idx).map(String::as_str) != Some(where_value) {
                continue;
            }
            // Field counts are not re-validated here; pad short rows.
            if row.len() <= set_idx {
                row.resize(set_idx + 1, String::new());
            }
            row[set_idx] = set_value.to_string();
            changed += 1;
        }
        Ok(changed)
    }

    /// Drop every row, keeping the header. Returns the number removed.
    pub fn delete_all(&mut self) -> usize {
        let removed = self.rows.len();
        self.rows.clear();
        removed
    }

    /// Rows whose `column` field equals `value` exactly
    pub fn select_where(&self, column: &str, value: &str, policy: ColumnMatch) -> Result<Vec<&Row>> {
        let idx = self.column_index(column, policy)?;
        Ok(self
            .rows
            .iter()
            .filter(|row| row.get(idx).map(String::as_str) == Some(value))
            .collect())
    }
}
