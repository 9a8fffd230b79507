use crate::lexer::TokenType;
use std::fmt;

/// Errors that can occur during parsing
#[derive(Debug, Clone)]
pub enum ParseError {
    /// An unexpected token was encountered
    UnexpectedToken {
        expected: String,
        found: TokenType,
        line: usize,
        column: usize,
    },

    /// Invalid syntax was detected
    InvalidSyntax {
        message: String,
        line: usize,
        column: usize,
    },

    /// End of file was reached unexpectedly
    EOF {
        expected: String,
        line: usize,
        column: usize,
    },
}

impl ParseError {
    pub fn line(&self) -> usize {
        match self {
            ParseError::UnexpectedToken { line, .. } => *line,
            ParseError::InvalidSyntax { line, .. } => *line,
            ParseError::EOF { line, .. } => *line,
        }
    }

    pub fn column(&self) -> usize {
        match self {
            ParseError::UnexpectedToken { column, .. } => *column,
            ParseError::InvalidSyntax { column, .. } => *column,
            ParseError::EOF { column, .. } => *column,
        }
    }

    pub fn unexpected_token(expected: &str, found: TokenType, line: usize, column: usize) -> Self {
        ParseError::UnexpectedToken {
            expected: expected.to_string(),
            found,
            line,
            column,
        }
    }

    pub fn invalid_syntax(message: &str, line: usize, column: usize) -> Self {
        ParseError::InvalidSyntax {
            message: message.to_string(),
            line,
            column,
        }
    }

    pub fn eof(expected: &str, line: usize, column: usize) -> Self {
        ParseError::EOF {
            expected: expected.to_string(),
            line,
            column,
        }
    }

    /// Get a user-friendly error message
    pub fn get_message(&self) -> String {
        match self {
            ParseError::UnexpectedToken {
                expected,
                found,
                line,
                column,
            } => {
                format!(
                    "Line {}, column {}: Expected {}, but found {}",
                    line, column, expected, found
                )
            }
            ParseError::InvalidSyntax {
                message,
                line,
                column,
            } => {
                format!("Line {}, column {}: {}", line, column, message)
            }
            ParseError::EOF {
                expected,
                line,
                column,
            } => {
                format!(
                    "Line {}, column {}: Unexpected end of file, expected {}",
                    line, column, expected
                )
            }
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.get_message())
    }
}

impl std::error::Error for ParseError {}
