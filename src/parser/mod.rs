mod error;
mod expr;
mod helpers;
mod stmt;

pub use error::ParseError;
pub use expr::ExprParser;
pub use helpers::TokenMatching;
pub use stmt::StmtParser;

use crate::ast::Module;
use crate::lexer::{Token, TokenType};

use std::collections::VecDeque;

/// Parser for Serval source code
///
/// A recursive descent parser over the lexer's token stream, producing a
/// `Module` AST. Errors are collected and parsing resynchronizes at
/// statement boundaries so several syntax errors can be reported at once.
pub struct Parser {
    /// Queue of tokens to be processed
    tokens: VecDeque<Token>,

    /// Current token being processed
    current: Option<Token>,

    /// Last token that was processed
    last_token: Option<Token>,

    /// Errors encountered during parsing
    errors: Vec<ParseError>,
}

impl Parser {
    /// Creates a new parser with the given tokens
    pub fn new(tokens: Vec<Token>) -> Self {
        let mut tokens_deque = VecDeque::from(tokens);
        let current = tokens_deque.pop_front();

        Parser {
            tokens: tokens_deque,
            current,
            last_token: None,
            errors: Vec::new(),
        }
    }

    /// Parses the entire input and returns a module
    pub fn parse(&mut self) -> Result<Module, Vec<ParseError>> {
        let mut body = Vec::new();

        while let Some(token) = &self.current {
            if matches!(token.token_type, TokenType::EOF) {
                break;
            }

            while self.match_token(TokenType::Newline) {}

            if self.current.is_none()
                || matches!(
                    self.current.as_ref().map(|t| &t.token_type),
                    Some(TokenType::EOF)
                )
            {
                break;
            }

            match self.parse_statement() {
                Ok(stmt) => body.push(Box::new(stmt)),
                Err(e) => {
                    self.errors.push(e);
                    self.synchronize();
                }
            }
        }

        if self.errors.is_empty() {
            Ok(Module { body })
        } else {
            Err(self.errors.clone())
        }
    }

    /// Advance to the next token, returning the one that was current
    pub(crate) fn advance(&mut self) -> Option<Token> {
        let next = self.tokens.pop_front();
        let consumed = std::mem::replace(&mut self.current, next);
        self.last_token = consumed.clone();
        consumed
    }

    /// Skip tokens until the start of the next statement
    fn synchronize(&mut self) {
        while let Some(token) = &self.current {
            match token.token_type {
                TokenType::Newline => {
                    self.advance();
                    return;
                }
                TokenType::EOF => return,
                _ => {
                    self.advance();
                }
            }
        }
    }

    /// Location of the current token, falling back to the last one consumed
    pub(crate) fn current_location(&self) -> (usize, usize) {
        if let Some(token) = &self.current {
            (token.line, token.column)
        } else {
            (self.last_line(), self.last_column())
        }
    }

    pub(crate) fn last_line(&self) -> usize {
        self.last_token.as_ref().map(|t| t.line).unwrap_or(1)
    }

    pub(crate) fn last_column(&self) -> usize {
        self.last_token.as_ref().map(|t| t.column).unwrap_or(1)
    }
}

/// Convenience entry point: parse a token stream into a module
pub fn parse(tokens: Vec<Token>) -> Result<Module, Vec<ParseError>> {
    Parser::new(tokens).parse()
}
