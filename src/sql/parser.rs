//! Command parser
//!
//! This module turns one line of command text into a [`Statement`].
//!
//! The command family is decided from the leading keywords before anything
//! else, so input that starts like a known command but is malformed reports
//! that command's syntax error rather than "unknown command".

use tracing::debug;

use super::ast::*;
use super::lexer::{Lexer, PUNCTUATION};
use super::token::{Keyword, Spanned, Token};
use crate::catalog::validate_name;
use crate::error::{Error, Result};

/// Command families, recognized from the first two words
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    CreateDatabase,
    UseDatabase,
    DropDatabase,
    CreateTable,
    DropTable,
    Insert,
    Select,
    Update,
    Delete,
    ShowTables,
    ShowDatabases,
}

impl CommandKind {
    /// Recognize the command family of `command`, ignoring keyword case
    pub fn detect(command: &str) -> Option<Self> {
        let mut words = command
            .split(|c: char| c.is_whitespace() || PUNCTUATION.contains(&c))
            .filter(|w| !w.is_empty())
            .map(|w| w.to_ascii_uppercase());
        let first = words.next()?;
        let second = words.next().unwrap_or_default();

        let kind = match (first.as_str(), second.as_str()) {
            ("CREATE", "DATABASE") => CommandKind::CreateDatabase,
            ("CREATE", "TABLE") => CommandKind::CreateTable,
            ("DROP", "DATABASE") => CommandKind::DropDatabase,
            ("DROP", "TABLE") => CommandKind::DropTable,
            ("USE", _) => CommandKind::UseDatabase,
            ("INSERT", "INTO") => CommandKind::Insert,
            ("SELECT", _) => CommandKind::Select,
            ("UPDATE", _) => CommandKind::Update,
            ("DELETE", "FROM") => CommandKind::Delete,
            ("SHOW", "TABLES") => CommandKind::ShowTables,
            ("SHOW", "DATABASES") => CommandKind::ShowDatabases,
            _ => return None,
        };
        Some(kind)
    }

    /// Name used in this family's syntax error
    pub fn label(self) -> &'static str {
        match self {
            CommandKind::CreateDatabase => "CREATE DATABASE",
            CommandKind::UseDatabase => "USE",
            CommandKind::DropDatabase => "DROP DATABASE",
            CommandKind::CreateTable => "CREATE TABLE",
            CommandKind::DropTable => "DROP TABLE",
            CommandKind::Insert => "INSERT",
            CommandKind::Select => "SELECT",
            CommandKind::Update => "UPDATE",
            CommandKind::Delete => "DELETE",
            CommandKind::ShowTables | CommandKind::ShowDatabases => "SHOW",
        }
    }

    /// The user-facing syntax error for this family
    pub fn syntax_error(self) -> Error {
        Error::Syntax(format!("Invalid {} syntax.", self.label()))
    }
}

/// Parse one command line
pub fn parse(command: &str) -> Result<Statement> {
    let command = command.trim();
    if command.is_empty() || command == ";" {
        return Err(Error::EmptyCommand);
    }

    let kind = CommandKind::detect(command)
        .ok_or_else(|| Error::UnknownCommand(command.to_string()))?;

    let result = Parser::new(command).and_then(|mut parser| parser.parse(kind));
    result.map_err(|e| match e {
        Error::InvalidName(_) => e,
        other => {
            debug!(command, error = %other, "syntax error");
            kind.syntax_error()
        }
    })
}

/// Command parser
///
/// Tokens are pulled from the lexer one at a time, so an INSERT value list
/// can be read as raw text instead of tokens.
pub struct Parser {
    /// Input characters, for scanning raw value lists
    input: Vec<char>,
    lexer: Lexer,
    current: Spanned,
}

impl Parser {
    /// Create a new parser from a command string
    pub fn new(command: &str) -> Result<Self> {
        let mut lexer = Lexer::new(command);
        let current = lexer.next_token()?;

        Ok(Self {
            input: command.chars().collect(),
            lexer,
            current,
        })
    }

    /// Parse the whole input as a command of the given family
    pub fn parse(&mut self, kind: CommandKind) -> Result<Statement> {
        let stmt = match kind {
            CommandKind::CreateDatabase => {
                self.expect_keywords(&[Keyword::Create, Keyword::Database])?;
                Statement::CreateDatabase(self.expect_name()?)
            }
            CommandKind::UseDatabase => {
                self.expect_keyword(Keyword::Use)?;
                Statement::UseDatabase(self.expect_name()?)
            }
            CommandKind::DropDatabase => {
                self.expect_keywords(&[Keyword::Drop, Keyword::Database])?;
                Statement::DropDatabase(self.expect_name()?)
            }
            CommandKind::CreateTable => self.parse_create_table().map(Statement::CreateTable)?,
            CommandKind::DropTable => {
                self.expect_keywords(&[Keyword::Drop, Keyword::Table])?;
                Statement::DropTable(self.expect_name()?)
            }
            CommandKind::Insert => self.parse_insert().map(Statement::Insert)?,
            CommandKind::Select => self.parse_select().map(Statement::Select)?,
            CommandKind::Update => self.parse_update().map(Statement::Update)?,
            CommandKind::Delete => {
                self.expect_keywords(&[Keyword::Delete, Keyword::From])?;
                Statement::Delete(DeleteStatement {
                    table_name: self.expect_name()?,
                })
            }
            CommandKind::ShowTables => {
                self.expect_keywords(&[Keyword::Show, Keyword::Tables])?;
                Statement::ShowTables
            }
            CommandKind::ShowDatabases => {
                self.expect_keywords(&[Keyword::Show, Keyword::Databases])?;
                Statement::ShowDatabases
            }
        };

        // Consume optional semicolon
        if self.check(&Token::Semicolon) {
            self.advance()?;
        }
        if !self.is_at_end() {
            return Err(self.unexpected("end of command"));
        }

        Ok(stmt)
    }

    // ========== CREATE TABLE ==========

    fn parse_create_table(&mut self) -> Result<CreateTableStatement> {
        self.expect_keywords(&[Keyword::Create, Keyword::Table])?;
        let table_name = self.expect_name()?;

        self.expect(&Token::LParen)?;
        let mut columns = vec![self.expect_name()?];
        while self.check(&Token::Comma) {
            self.advance()?;
            columns.push(self.expect_name()?);
        }
        self.expect(&Token::RParen)?;

        Ok(CreateTableStatement {
            table_name,
            columns,
        })
    }

    // ========== INSERT ==========

    fn parse_insert(&mut self) -> Result<InsertStatement> {
        self.expect_keywords(&[Keyword::Insert, Keyword::Into])?;
        let table_name = self.expect_name()?;
        self.expect_keyword(Keyword::Values)?;

        if !self.check(&Token::LParen) {
            return Err(self.unexpected("'('"));
        }
        let (values, end) = self.scan_value_list(self.current.end)?;

        // Resume tokenizing after the closing paren
        self.lexer.seek(end);
        self.advance()?;

        Ok(InsertStatement { table_name, values })
    }

    /// Read the raw value list starting just after `(`. Returns the values
    /// and the position just past the closing `)`.
    ///
    /// A value starting with `'` is a literal up to the next `'`. Any other
    /// value is the trimmed text up to the next comma or closing paren that
    /// is not nested inside parentheses.
    fn scan_value_list(&self, start: usize) -> Result<(Vec<String>, usize)> {
        let mut pos = self.skip_whitespace(start);
        if self.input.get(pos) == Some(&')') {
            return Err(Error::Syntax("expected value, found ')'".to_string()));
        }

        let mut values = Vec::new();
        loop {
            pos = self.skip_whitespace(pos);
            let (value, next) = match self.input.get(pos) {
                Some('\'') => self.scan_quoted(pos)?,
                _ => self.scan_unquoted(pos),
            };
            values.push(value);

            pos = self.skip_whitespace(next);
            match self.input.get(pos) {
                Some(',') => pos += 1,
                Some(')') => return Ok((values, pos + 1)),
                Some(c) => return Err(Error::Syntax(format!("expected ',' or ')', found '{}'", c))),
                None => return Err(Error::Syntax("unclosed value list".to_string())),
            }
        }
    }

    fn scan_quoted(&self, start: usize) -> Result<(String, usize)> {
        let close = self.input[start + 1..]
            .iter()
            .position(|&c| c == '\'')
            .ok_or(Error::UnterminatedString(start))?;
        let end = start + 1 + close;
        Ok((self.input[start + 1..end].iter().collect(), end + 1))
    }

    fn scan_unquoted(&self, start: usize) -> (String, usize) {
        let mut depth = 0usize;
        let mut pos = start;
        while let Some(&c) = self.input.get(pos) {
            match c {
                ',' if depth == 0 => break,
                ')' if depth == 0 => break,
                '(' => depth += 1,
                ')' => depth -= 1,
                _ => {}
            }
            pos += 1;
        }
        let value: String = self.input[start..pos].iter().collect();
        (value.trim().to_string(), pos)
    }

    fn skip_whitespace(&self, mut pos: usize) -> usize {
        while self.input.get(pos).map_or(false, |c| c.is_whitespace()) {
            pos += 1;
        }
        pos
    }

    // ========== SELECT ==========

    fn parse_select(&mut self) -> Result<SelectStatement> {
        self.expect_keyword(Keyword::Select)?;
        self.expect(&Token::Asterisk)?;
        self.expect_keyword(Keyword::From)?;
        let table_name = self.expect_name()?;

        let filter = if self.current().is_keyword(Keyword::Where) {
            self.advance()?;
            Some(self.parse_condition()?)
        } else {
            None
        };

        Ok(SelectStatement { table_name, filter })
    }

    // ========== UPDATE ==========

    fn parse_update(&mut self) -> Result<UpdateStatement> {
        self.expect_keyword(Keyword::Update)?;
        let table_name = self.expect_name()?;
        self.expect_keyword(Keyword::Set)?;
        let assignment = self.parse_condition()?;
        self.expect_keyword(Keyword::Where)?;
        let filter = self.parse_condition()?;

        Ok(UpdateStatement {
            table_name,
            assignment,
            filter,
        })
    }

    /// `column = value` where value is a bare word or a quoted literal
    fn parse_condition(&mut self) -> Result<Condition> {
        let column = self.expect_name()?;
        self.expect(&Token::Eq)?;

        let value = match self.current().clone() {
            Token::StringLiteral(s) => s,
            Token::Word(w) if is_word(&w) => w,
            _ => return Err(self.unexpected("value")),
        };
        self.advance()?;

        Ok(Condition { column, value })
    }

    // ========== Helpers ==========

    fn current(&self) -> &Token {
        &self.current.token
    }

    fn advance(&mut self) -> Result<()> {
        if !self.is_at_end() {
            self.current = self.lexer.next_token()?;
        }
        Ok(())
    }

    fn is_at_end(&self) -> bool {
        matches!(self.current(), Token::Eof)
    }

    fn check(&self, token: &Token) -> bool {
        std::mem::discriminant(self.current()) == std::mem::discriminant(token)
    }

    fn unexpected(&self, expected: &str) -> Error {
        Error::Syntax(format!(
            "expected {}, found '{}'",
            expected,
            self.current()
        ))
    }

    fn expect(&mut self, token: &Token) -> Result<()> {
        if self.check(token) {
            self.advance()
        } else {
            Err(self.unexpected(&format!("'{}'", token)))
        }
    }

    fn expect_keyword(&mut self, keyword: Keyword) -> Result<()> {
        if self.current().is_keyword(keyword) {
            self.advance()
        } else {
            Err(self.unexpected(keyword.as_str()))
        }
    }

    fn expect_keywords(&mut self, keywords: &[Keyword]) -> Result<()> {
        keywords.iter().try_for_each(|k| self.expect_keyword(*k))
    }

    /// A database, table or column name
    fn expect_name(&mut self) -> Result<String> {
        match self.current().clone() {
            Token::Word(name) => {
                validate_name(&name)?;
                self.advance()?;
                Ok(name)
            }
            _ => Err(self.unexpected("name")),
        }
    }
}

fn is_word(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}
