//! The shared record store
//!
//! One `Store` serves every session in the process. It holds no session
//! state: each table-scoped call takes the caller's [`Session`].
//!
//! Mutations (insert, update, delete) hold the table's lock from the read of
//! the current file through the commit. Reads take no lock. A reader that
//! opened a table file just before a commit's rename keeps reading the old
//! file; it sees a complete previous version, never a partial one.

use std::path::PathBuf;

use tracing::{debug, info, warn};

use crate::catalog::{validate_name, Catalog, Session};
use crate::config::StoreConfig;
use crate::error::{Error, Result};
use crate::storage::{
    ColumnMatch, CommitLog, FlatFileEngine, RecoveryReport, Row, StorageEngine, Table,
};
use crate::transaction::LockManager;

/// The record store
#[derive(Debug)]
pub struct Store {
    config: StoreConfig,
    catalog: Catalog,
    engine: Box<dyn StorageEngine>,
    locks: LockManager,
}

impl Store {
    /// Open the store with the flat-file engine and run crash recovery
    pub fn open(config: StoreConfig) -> Result<Self> {
        let log = CommitLog::open(&config.commit_log)?;
        let engine = FlatFileEngine::new(log, config.sync_on_commit);
        Self::with_engine(config, Box::new(engine))
    }

    /// Open the store over a custom storage engine and run crash recovery
    pub fn with_engine(config: StoreConfig, engine: Box<dyn StorageEngine>) -> Result<Self> {
        let catalog = Catalog::open(&config.data_dir, engine.table_extension())?;
        let store = Self {
            locks: LockManager::new(config.lock_granularity),
            config,
            catalog,
            engine,
        };
        info!(
            data_dir = %store.config.data_dir.display(),
            commit_log = %store.config.commit_log.display(),
            "opening store"
        );
        store.recover();
        Ok(store)
    }

    /// Discard candidate files left by interrupted commits
    pub fn recover(&self) -> RecoveryReport {
        self.engine.recover(self.catalog.root())
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    fn column_match(&self) -> ColumnMatch {
        if self.config.case_sensitive_columns {
            ColumnMatch::Exact
        } else {
            ColumnMatch::IgnoreCase
        }
    }

    // ========== Databases ==========

    pub fn create_database(&self, name: &str) -> Result<()> {
        self.catalog.create_database(name)?;
        info!(database = name, "database created");
        Ok(())
    }

    /// Select `name` for the session
    pub fn use_database(&self, session: &mut Session, name: &str) -> Result<()> {
        if !self.catalog.database_exists(name) {
            validate_name(name)?;
            return Err(Error::DatabaseNotFound(name.to_string()));
        }
        session.select(name);
        Ok(())
    }

    /// Drop `name`, clearing the session's selection if it pointed there
    pub fn drop_database(&self, session: &mut Session, name: &str) -> Result<()> {
        self.catalog.drop_database(name)?;
        session.deselect_if(name);
        info!(database = name, "database deleted");
        Ok(())
    }

    pub fn list_databases(&self) -> Result<Vec<String>> {
        self.catalog.list_databases()
    }

    // ========== Tables ==========

    fn table_path(&self, session: &Session, table: &str) -> Result<(String, PathBuf)> {
        let database = session.require_database()?;
        let path = self.catalog.table_path(database, table)?;
        Ok((database.to_string(), path))
    }

    pub fn create_table(&self, session: &Session, table: &str, columns: Vec<String>) -> Result<()> {
        let (database, path) = self.table_path(session, table)?;
        self.validate_columns(&columns)?;
        if !self.catalog.database_exists(&database) {
            return Err(Error::DatabaseNotFound(database));
        }
        self.engine.create(&path, &Table::new(table, columns))?;
        info!(database = %database, table, "table created");
        Ok(())
    }

    fn validate_columns(&self, columns: &[String]) -> Result<()> {
        if columns.is_empty() {
            return Err(Error::Syntax("A table needs at least one column.".to_string()));
        }
        let policy = self.column_match();
        for (i, column) in columns.iter().enumerate() {
            validate_name(column)?;
            if columns[..i].iter().any(|prev| policy.matches(prev, column)) {
                return Err(Error::Syntax(format!("Duplicate column name: {}", column)));
            }
        }
        Ok(())
    }

    pub fn drop_table(&self, session: &Session, table: &str) -> Result<()> {
        let database = session.require_database()?;
        self.catalog.drop_table(database, table)?;
        info!(database, table, "table deleted");
        Ok(())
    }

    pub fn list_tables(&self, session: &Session) -> Result<Vec<String>> {
        self.catalog.list_tables(session.require_database()?)
    }

    // ========== Rows ==========

    /// Run `op` on the current table image under the table lock, then commit
    fn mutate<T>(
        &self,
        session: &Session,
        table: &str,
        op: impl FnOnce(&mut Table) -> Result<T>,
    ) -> Result<T> {
        let (_, path) = self.table_path(session, table)?;
        let _guard = self.locks.acquire(&path);

        let result = self.engine.load(&path, table).and_then(|mut data| {
            let out = op(&mut data)?;
            self.engine.commit(&path, &data)?;
            Ok(out)
        });
        if let Err(e) = &result {
            warn!(table, error = %e, "transaction rolled back, no data loss");
        }
        result
    }

    /// Append a row
    pub fn insert(&self, session: &Session, table: &str, values: Row) -> Result<()> {
        self.mutate(session, table, |data| data.insert(values))?;
        debug!(table, "row inserted");
        Ok(())
    }

    /// Replace `set_column` in every row whose `where_column` equals
    /// `where_value`. Returns the number of rows changed.
    pub fn update(
        &self,
        session: &Session,
        table: &str,
        set_column: &str,
        set_value: &str,
        where_column: &str,
        where_value: &str,
    ) -> Result<usize> {
        let policy = self.column_match();
        let changed = self.mutate(session, table, |data| {
            data.update_where(set_column, set_value, where_column, where_value, policy)
        })?;
        debug!(table, changed, "rows updated");
        Ok(changed)
    }

    /// Remove every row, keeping the header. Returns the number removed.
    pub fn delete_all(&self, session: &Session, table: &str) -> Result<usize> {
        let removed = self.mutate(session, table, |data| Ok(data.delete_all()))?;
        debug!(table, removed, "rows deleted");
        Ok(removed)
    }

    /// Read the whole table
    pub fn select_all(&self, session: &Session, table: &str) -> Result<Table> {
        let (_, path) = self.table_path(session, table)?;
        self.engine.load(&path, table)
    }

    /// Read the rows whose `column` equals `value`
    pub fn select_where(
        &self,
        session: &Session,
        table: &str,
        column: &str,
        value: &str,
    ) -> Result<Table> {
        let data = self.select_all(session, table)?;
        let rows = data
            .select_where(column, value, self.column_match())?
            .into_iter()
            .cloned()
            .collect();
        Ok(Table::with_rows(table, data.columns().to_vec(), rows))
    }
}
