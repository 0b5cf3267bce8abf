//! Command Abstract Syntax Tree (AST)
//!
//! This module defines the parsed form of every command.

/// A parsed command
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// CREATE DATABASE name
    CreateDatabase(String),
    /// USE name
    UseDatabase(String),
    /// DROP DATABASE name
    DropDatabase(String),
    /// CREATE TABLE name (columns)
    CreateTable(CreateTableStatement),
    /// DROP TABLE name
    DropTable(String),
    /// INSERT INTO name VALUES (values)
    Insert(InsertStatement),
    /// SELECT * FROM name [WHERE col=val]
    Select(SelectStatement),
    /// UPDATE name SET col=val WHERE col=val
    Update(UpdateStatement),
    /// DELETE FROM name
    Delete(DeleteStatement),
    /// SHOW TABLES
    ShowTables,
    /// SHOW DATABASES
    ShowDatabases,
}

/// `column = value`, used by WHERE and SET
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub column: String,
    /// Literal value with any quotes stripped
    pub value: String,
}

impl Condition {
    pub fn new(column: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            value: value.into(),
        }
    }
}

/// CREATE TABLE statement
#[derive(Debug, Clone, PartialEq)]
pub struct CreateTableStatement {
    pub table_name: String,
    /// Column names in declaration order
    pub columns: Vec<String>,
}

/// INSERT statement
#[derive(Debug, Clone, PartialEq)]
pub struct InsertStatement {
    pub table_name: String,
    /// Values in column order, quotes stripped
    pub values: Vec<String>,
}

/// SELECT statement
#[derive(Debug, Clone, PartialEq)]
pub struct SelectStatement {
    pub table_name: String,
    /// Optional WHERE clause
    pub filter: Option<Condition>,
}

/// UPDATE statement
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateStatement {
    pub table_name: String,
    /// SET clause
    pub assignment: Condition,
    /// WHERE clause
    pub filter: Condition,
}

/// DELETE statement
#[derive(Debug, Clone, PartialEq)]
pub struct DeleteStatement {
    pub table_name: String,
}
