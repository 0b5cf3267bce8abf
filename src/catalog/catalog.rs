//! Catalog for FlatDB
//!
//! Databases are directories under the data root; tables are files inside a
//! database directory. The catalog owns that layout and validates names
//! before they are turned into paths.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Check that a database, table or column name is made of word characters
pub fn validate_name(name: &str) -> Result<()> {
    if !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        Ok(())
    } else {
        Err(Error::InvalidName(name.to_string()))
    }
}

/// Directory-backed catalog
#[derive(Debug, Clone)]
pub struct Catalog {
    /// Root directory holding one subdirectory per database
    root: PathBuf,
    /// Table file extension, without the dot
    extension: String,
}

impl Catalog {
    /// Create a catalog rooted at `root`, creating the directory if needed
    pub fn open(root: impl Into<PathBuf>, extension: impl Into<String>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self {
            root,
            extension: extension.into(),
        })
    }

    /// Root data directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory of a database
    pub fn database_path(&self, name: &str) -> Result<PathBuf> {
        validate_name(name)?;
        Ok(self.root.join(name))
    }

    /// File of a table within a database
    pub fn table_path(&self, database: &str, table: &str) -> Result<PathBuf> {
        validate_name(table)?;
        Ok(self
            .database_path(database)?
            .join(format!("{}.{}", table, self.extension)))
    }

    /// Check if a database exists
    pub fn database_exists(&self, name: &str) -> bool {
        self.database_path(name).map_or(false, |p| p.is_dir())
    }

    /// Create a database directory
    pub fn create_database(&self, name: &str) -> Result<()> {
        let path = self.database_path(name)?;
        match fs::create_dir(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                Err(Error::DatabaseAlreadyExists(name.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Remove a database directory and every table in it
    pub fn drop_database(&self, name: &str) -> Result<()> {
        let path = self.database_path(name)?;
        if !path.is_dir() {
            return Err(Error::DatabaseNotFound(name.to_string()));
        }
        fs::remove_dir_all(&path)?;
        Ok(())
    }

    /// List database names, sorted
    pub fn list_databases(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                if let Some(name) = entry.file_name().to_str() {
                    names.push(name.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }

    /// List table names of a database, sorted
    pub fn list_tables(&self, database: &str) -> Result<Vec<String>> {
        let dir = self.database_path(database)?;
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(Error::DatabaseNotFound(database.to_string()))
            }
            Err(e) => return Err(e.into()),
        };

        let suffix = format!(".{}", self.extension);
        let mut names = Vec::new();
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            if let Some(stem) = entry
                .file_name()
                .to_str()
                .and_then(|n| n.strip_suffix(&suffix))
            {
                names.push(stem.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    /// Check if a table exists
    pub fn table_exists(&self, database: &str, table: &str) -> bool {
        self.table_path(database, table)
            .map_or(false, |p| p.is_file())
    }

    /// Delete a table file
    pub fn drop_table(&self, database: &str, table: &str) -> Result<()> {
        let path = self.table_path(database, table)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(Error::TableNotFound(table.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> (tempfile::TempDir, Catalog) {
        let dir = tempfile::tempdir().unwrap();
        let catalog = Catalog::open(dir.path().join("data"), "txt").unwrap();
        (dir, catalog)
    }

    #[test]
    fn test_validate_name() {
        assert!(validate_name("users_2").is_ok());
        assert!(matches!(validate_name(""), Err(Error::InvalidName(_))));
        assert!(matches!(validate_name("../etc"), Err(Error::InvalidName(_))));
        assert!(matches!(validate_name("a b"), Err(Error::InvalidName(_))));
    }

    #[test]
    fn test_create_and_drop_database() {
        let (_dir, catalog) = catalog();

        catalog.create_database("shop").unwrap();
        assert!(catalog.database_exists("shop"));

        let result = catalog.create_database("shop");
        assert!(matches!(result, Err(Error::DatabaseAlreadyExists(_))));

        fs::write(catalog.table_path("shop", "items").unwrap(), "a\n").unwrap();
        catalog.drop_database("shop").unwrap();
        assert!(!catalog.database_exists("shop"));

        let result = catalog.drop_database("shop");
        assert!(matches!(result, Err(Error::DatabaseNotFound(_))));
    }

    #[test]
    fn test_list_databases_sorted_dirs_only() {
        let (_dir, catalog) = catalog();
        catalog.create_database("zeta").unwrap();
        catalog.create_database("alpha").unwrap();
        fs::write(catalog.root().join("notes.txt"), "").unwrap();

        assert_eq!(catalog.list_databases().unwrap(), vec!["alpha", "zeta"]);
    }

    #[test]
    fn test_list_tables_ignores_candidates() {
        let (_dir, catalog) = catalog();
        catalog.create_database("db").unwrap();
        let db = catalog.database_path("db").unwrap();
        fs::write(db.join("b.txt"), "x\n").unwrap();
        fs::write(db.join("a.txt"), "x\n").unwrap();
        fs::write(db.join("a.txt.tmp"), "x\n").unwrap();

        assert_eq!(catalog.list_tables("db").unwrap(), vec!["a", "b"]);
        assert!(matches!(
            catalog.list_tables("gone"),
            Err(Error::DatabaseNotFound(_))
        ));
    }

    #[test]
    fn test_drop_table() {
        let (_dir, catalog) = catalog();
        catalog.create_database("db").unwrap();
        fs::write(catalog.table_path("db", "t").unwrap(), "a\n").unwrap();

        assert!(catalog.table_exists("db", "t"));
        catalog.drop_table("db", "t").unwrap();
        assert!(!catalog.table_exists("db", "t"));
        assert!(matches!(
            catalog.drop_table("db", "t"),
            Err(Error::TableNotFound(_))
        ));
    }
}
