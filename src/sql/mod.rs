//! Command language module
//!
//! This module contains the lexer, parser and AST for the command set.

pub mod ast;
pub mod lexer;
pub mod parser;
pub mod token;

pub use ast::Statement;
pub use lexer::Lexer;
pub use parser::{parse, CommandKind, Parser};
pub use token::{Keyword, Spanned, Token};
