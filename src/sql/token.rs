//! Command token definitions
//!
//! Keywords are not separate tokens: any word may be a keyword or a name
//! depending on where it appears, so `CREATE TABLE tables (...)` is legal.

use std::fmt;

/// Token types
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Run of characters that are not whitespace, quotes or punctuation
    Word(String),
    /// Single-quoted literal with the quotes stripped
    StringLiteral(String),

    // ========== Punctuation ==========
    LParen,
    RParen,
    Comma,
    Semicolon,
    Eq,
    Asterisk,

    /// End of input
    Eof,
}

impl Token {
    /// True if this is a word equal to `keyword`, ignoring case
    pub fn is_keyword(&self, keyword: Keyword) -> bool {
        matches!(self, Token::Word(w) if w.eq_ignore_ascii_case(keyword.as_str()))
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Word(w) => write!(f, "{}", w),
            Token::StringLiteral(s) => write!(f, "'{}'", s),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
            Token::Comma => write!(f, ","),
            Token::Semicolon => write!(f, ";"),
            Token::Eq => write!(f, "="),
            Token::Asterisk => write!(f, "*"),
            Token::Eof => write!(f, "end of input"),
        }
    }
}

/// A token with its character range in the input
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    pub token: Token,
    /// Index of the first character
    pub start: usize,
    /// Index one past the last character
    pub end: usize,
}

/// Command keywords
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    Create,
    Drop,
    Use,
    Show,
    Database,
    Databases,
    Table,
    Tables,
    Insert,
    Into,
    Values,
    Select,
    From,
    Where,
    Update,
    Set,
    Delete,
}

impl Keyword {
    pub fn as_str(self) -> &'static str {
        match self {
            Keyword::Create => "CREATE",
            Keyword::Drop => "DROP",
            Keyword::Use => "USE",
            Keyword::Show => "SHOW",
            Keyword::Database => "DATABASE",
            Keyword::Databases => "DATABASES",
            Keyword::Table => "TABLE",
            Keyword::Tables => "TABLES",
            Keyword::Insert => "INSERT",
            Keyword::Into => "INTO",
            Keyword::Values => "VALUES",
            Keyword::Select => "SELECT",
            Keyword::From => "FROM",
            Keyword::Where => "WHERE",
            Keyword::Update => "UPDATE",
            Keyword::Set => "SET",
            Keyword::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
