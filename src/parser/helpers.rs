use crate::lexer::{Token, TokenType};
use crate::parser::error::ParseError;
use crate::parser::Parser;

use std::mem::discriminant;

/// Trait for token matching and consumption
pub trait TokenMatching {
    /// Check if the current token matches the expected type
    fn check(&self, expected_type: TokenType) -> bool;

    /// Match and consume a token if it's the expected type
    fn match_token(&mut self, expected_type: TokenType) -> bool;

    /// Peek at the token after the current one
    fn peek_matches(&self, expected_type: TokenType) -> bool;

    /// Consume a token of the given type, or return an error
    fn consume(&mut self, expected_type: TokenType, expected: &str) -> Result<Token, ParseError>;

    /// Consume the logical end of a statement. `Dedent` and end of input
    /// count as an implicit newline so a file need not end with one.
    fn consume_newline(&mut self) -> Result<(), ParseError>;

    /// Check if the current token ends the statement
    fn check_newline(&self) -> bool;

    /// Consume an identifier token and return its name
    fn consume_identifier(&mut self, expected: &str) -> Result<String, ParseError>;
}

impl TokenMatching for Parser {
    fn check(&self, expected_type: TokenType) -> bool {
        match &self.current {
            Some(token) => discriminant(&token.token_type) == discriminant(&expected_type),
            None => false,
        }
    }

    fn match_token(&mut self, expected_type: TokenType) -> bool {
        if self.check(expected_type) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn peek_matches(&self, expected_type: TokenType) -> bool {
        match self.tokens.front() {
            Some(token) => discriminant(&token.token_type) == discriminant(&expected_type),
            None => false,
        }
    }

    fn consume(&mut self, expected_type: TokenType, expected: &str) -> Result<Token, ParseError> {
        if self.check(expected_type) {
            Ok(self.advance().unwrap())
        } else {
            match &self.current {
                Some(token) => Err(ParseError::unexpected_token(
                    expected,
                    token.token_type.clone(),
                    token.line,
                    token.column,
                )),
                None => Err(ParseError::eof(
                    expected,
                    self.last_line(),
                    self.last_column(),
                )),
            }
        }
    }

    fn consume_newline(&mut self) -> Result<(), ParseError> {
        match &self.current {
            Some(token) => match token.token_type {
                TokenType::Newline => {
                    self.advance();
                    Ok(())
                }
                TokenType::Dedent | TokenType::EOF => Ok(()),
                _ => Err(ParseError::unexpected_token(
                    "newline",
                    token.token_type.clone(),
                    token.line,
                    token.column,
                )),
            },
            None => Ok(()),
        }
    }

    fn check_newline(&self) -> bool {
        matches!(
            self.current.as_ref().map(|t| &t.token_type),
            Some(TokenType::Newline) | Some(TokenType::Dedent) | Some(TokenType::EOF) | None
        )
    }

    fn consume_identifier(&mut self, expected: &str) -> Result<String, ParseError> {
        match &self.current {
            Some(token) => {
                if let TokenType::Identifier(name) = &token.token_type {
                    let name = name.clone();
                    self.advance();
                    Ok(name)
                } else {
                    Err(ParseError::unexpected_token(
                        expected,
                        token.token_type.clone(),
                        token.line,
                        token.column,
                    ))
                }
            }
            None => Err(ParseError::eof(expected, self.last_line(), self.last_column())),
        }
    }
}
