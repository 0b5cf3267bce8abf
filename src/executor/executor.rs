//! Command executor for FlatDB
//!
//! This module runs parsed statements against the shared [`Store`] on behalf
//! of one session, and renders results and errors as the text callers see.

use std::sync::Arc;

use indexmap::IndexMap;
use tracing::debug;

use crate::catalog::Session;
use crate::error::{Error, ErrorKind, Result};
use crate::sql::ast::*;
use crate::sql::parse;
use crate::storage::format::encode_record;
use crate::storage::{Row, Table};
use crate::store::Store;

/// Query result
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult {
    /// Banner for row listings, e.g. `users WHERE id=1`
    pub title: Option<String>,
    /// Column names
    pub columns: Vec<String>,
    /// Result rows
    pub rows: Vec<Row>,
    /// Number of affected rows (for INSERT/UPDATE/DELETE)
    pub affected_rows: usize,
    /// Message
    pub message: Option<String>,
}

impl QueryResult {
    /// Create a result with a message
    pub fn with_message(message: impl Into<String>) -> Self {
        Self {
            title: None,
            columns: Vec::new(),
            rows: Vec::new(),
            affected_rows: 0,
            message: Some(message.into()),
        }
    }

    /// Create a result with affected rows count
    pub fn with_affected_rows(count: usize, message: impl Into<String>) -> Self {
        Self {
            affected_rows: count,
            ..Self::with_message(message)
        }
    }

    /// A table's header and rows under a banner
    pub fn listing(title: impl Into<String>, table: Table) -> Self {
        let columns = table.columns().to_vec();
        let rows = table.rows().to_vec();
        Self {
            title: Some(title.into()),
            columns,
            rows,
            affected_rows: 0,
            message: None,
        }
    }

    /// A one-column list of names, or `empty` when there are none
    pub fn names(column: &str, names: Vec<String>, empty: &str) -> Self {
        let message = names.is_empty().then(|| empty.to_string());
        Self {
            title: None,
            columns: vec![column.to_string()],
            rows: names.into_iter().map(|n| vec![n]).collect(),
            affected_rows: 0,
            message,
        }
    }

    /// Rows as ordered `column -> value` maps. Fields missing from short
    /// rows come out empty.
    pub fn records(&self) -> Vec<IndexMap<String, String>> {
        self.rows
            .iter()
            .map(|row| {
                self.columns
                    .iter()
                    .enumerate()
                    .map(|(i, c)| (c.clone(), row.get(i).cloned().unwrap_or_default()))
                    .collect()
            })
            .collect()
    }

    /// Render as newline-joined text, without a trailing newline
    pub fn to_text(&self) -> String {
        if let Some(title) = &self.title {
            let mut lines = Vec::with_capacity(self.rows.len() + 2);
            lines.push(format!("---- {} ----", title));
            lines.push(encode_record(&self.columns));
            lines.extend(self.rows.iter().map(|row| encode_record(row)));
            return lines.join("\n");
        }
        if let Some(message) = &self.message {
            return message.clone();
        }
        self.rows
            .iter()
            .map(|row| encode_record(row))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Execution Engine
///
/// One engine per caller: it owns the caller's session and shares the store.
pub struct ExecutionEngine {
    store: Arc<Store>,
    session: Session,
}

impl ExecutionEngine {
    /// Create a new execution engine with no database selected
    pub fn new(store: Arc<Store>) -> Self {
        Self {
            store,
            session: Session::new(),
        }
    }

    /// The database this engine's session has selected
    pub fn current_database(&self) -> Option<&str> {
        self.session.current_database()
    }

    pub fn store(&self) -> &Arc<Store> {
        &self.store
    }

    /// Parse and run one command, returning the text shown to the user.
    /// Never fails: errors are rendered into the returned text.
    pub fn execute(&mut self, command: &str) -> String {
        let stmt = match parse(command) {
            Ok(stmt) => stmt,
            Err(e) => return render_error(&e, None),
        };
        let operation = failure_label(&stmt);

        match self.execute_statement(stmt) {
            Ok(result) => result.to_text(),
            Err(e) => render_error(&e, operation),
        }
    }

    /// Run a parsed statement
    pub fn execute_statement(&mut self, stmt: Statement) -> Result<QueryResult> {
        debug!(?stmt, database = ?self.current_database(), "executing");

        match stmt {
            Statement::CreateDatabase(name) => {
                self.store.create_database(&name)?;
                Ok(QueryResult::with_message(format!("Database created: {}", name)))
            }
            Statement::UseDatabase(name) => {
                self.store.use_database(&mut self.session, &name)?;
                Ok(QueryResult::with_message(format!("Using database: {}", name)))
            }
            Statement::DropDatabase(name) => {
                self.store.drop_database(&mut self.session, &name)?;
                Ok(QueryResult::with_message(format!("Database deleted: {}", name)))
            }
            Statement::CreateTable(ct) => {
                self.store
                    .create_table(&self.session, &ct.table_name, ct.columns)?;
                Ok(QueryResult::with_message(format!(
                    "Table created: {}",
                    ct.table_name
                )))
            }
            Statement::DropTable(name) => {
                self.store.drop_table(&self.session, &name)?;
                Ok(QueryResult::with_message(format!("Table deleted: {}", name)))
            }
            Statement::Insert(insert) => self.execute_insert(insert),
            Statement::Select(select) => self.execute_select(select),
            Statement::Update(update) => self.execute_update(update),
            Statement::Delete(delete) => {
                let removed = self.store.delete_all(&self.session, &delete.table_name)?;
                Ok(QueryResult::with_affected_rows(removed, "All rows deleted."))
            }
            Statement::ShowTables => {
                let tables = self.store.list_tables(&self.session)?;
                Ok(QueryResult::names("table", tables, "No tables found."))
            }
            Statement::ShowDatabases => {
                let databases = self.store.list_databases()?;
                Ok(QueryResult::names("database", databases, "No databases found."))
            }
        }
    }

    fn execute_insert(&mut self, insert: InsertStatement) -> Result<QueryResult> {
        self.store
            .insert(&self.session, &insert.table_name, insert.values)?;
        Ok(QueryResult::with_affected_rows(1, "Row inserted successfully."))
    }

    fn execute_select(&mut self, select: SelectStatement) -> Result<QueryResult> {
        let table_name = select.table_name;
        match select.filter {
            None => {
                let table = self.store.select_all(&self.session, &table_name)?;
                Ok(QueryResult::listing(table_name, table))
            }
            Some(Condition { column, value }) => {
                let table =
                    self.store
                        .select_where(&self.session, &table_name, &column, &value)?;
                let title = format!("{} WHERE {}={}", table_name, column, value);
                Ok(QueryResult::listing(title, table))
            }
        }
    }

    fn execute_update(&mut self, update: UpdateStatement) -> Result<QueryResult> {
        let changed = self.store.update(
            &self.session,
            &update.table_name,
            &update.assignment.column,
            &update.assignment.value,
            &update.filter.column,
            &update.filter.value,
        )?;
        // The count is reported structurally only; the text stays fixed.
        Ok(QueryResult::with_affected_rows(changed, "Update successful."))
    }
}

/// Operation name used to prefix a failed mutation's error
pub fn failure_label(stmt: &Statement) -> Option<&'static str> {
    match stmt {
        Statement::Insert(_) => Some("Insert"),
        Statement::Update(_) => Some("Update"),
        Statement::Delete(_) => Some("Delete"),
        _ => None,
    }
}

/// Render an error the way the command boundary shows it
pub fn render_error(error: &Error, operation: Option<&str>) -> String {
    match (error.kind(), operation) {
        (ErrorKind::Syntax, _) => error.to_string(),
        (ErrorKind::NoDatabaseSelected, _) => format!("Error: {}", error),
        (_, Some(op)) => format!("{} failed: {}", op, error),
        (_, None) => format!("Error: {}", error),
    }
}
