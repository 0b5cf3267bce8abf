//! Command lexer (tokenizer)
//!
//! This module converts a command line into a stream of tokens.

use super::token::{Spanned, Token};
use crate::error::{Error, Result};

/// Characters that end a word
pub(crate) const PUNCTUATION: [char; 7] = ['(', ')', ',', ';', '=', '*', '\''];

/// Command lexer
pub struct Lexer {
    /// Input characters
    input: Vec<char>,
    /// Current position in input
    position: usize,
}

impl Lexer {
    /// Create a new lexer for the given input
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            position: 0,
        }
    }

    /// Continue lexing from character offset `position`
    pub fn seek(&mut self, position: usize) {
        self.position = position.min(self.input.len());
    }

    /// Get the next token from the input
    pub fn next_token(&mut self) -> Result<Spanned> {
        self.skip_whitespace();
        let start = self.position;

        if self.is_at_end() {
            return Ok(self.spanned(Token::Eof, start));
        }

        let token = match self.current_char() {
            '(' => Token::LParen,
            ')' => Token::RParen,
            ',' => Token::Comma,
            ';' => Token::Semicolon,
            '=' => Token::Eq,
            '*' => Token::Asterisk,
            '\'' => return self.read_string(),
            _ => return Ok(self.read_word()),
        };
        self.advance();
        Ok(self.spanned(token, start))
    }

    fn spanned(&self, token: Token, start: usize) -> Spanned {
        Spanned {
            token,
            start,
            end: self.position,
        }
    }

    /// Check if we've reached the end of input
    fn is_at_end(&self) -> bool {
        self.position >= self.input.len()
    }

    /// Get the current character
    fn current_char(&self) -> char {
        self.input[self.position]
    }

    /// Advance to the next character
    fn advance(&mut self) {
        self.position += 1;
    }

    /// Skip whitespace characters
    fn skip_whitespace(&mut self) {
        while !self.is_at_end() && self.current_char().is_whitespace() {
            self.advance();
        }
    }

    /// Read a single-quoted literal. There are no escapes: the literal ends
    /// at the next quote.
    fn read_string(&mut self) -> Result<Spanned> {
        let start = self.position;
        self.advance(); // skip opening quote

        let mut value = String::new();
        while !self.is_at_end() {
            let ch = self.current_char();
            self.advance();
            if ch == '\'' {
                return Ok(self.spanned(Token::StringLiteral(value), start));
            }
            value.push(ch);
        }

        Err(Error::UnterminatedString(start))
    }

    /// Read a bare word
    fn read_word(&mut self) -> Spanned {
        let start = self.position;
        let mut value = String::new();

        while !self.is_at_end() {
            let ch = self.current_char();
            if ch.is_whitespace() || PUNCTUATION.contains(&ch) {
                break;
            }
            value.push(ch);
            self.advance();
        }

        self.spanned(Token::Word(value), start)
    }
}
