pub mod error;
pub mod token;

use std::collections::HashSet;

pub use error::LexerError;
pub use token::{Token, TokenType};

/// Lexer for Serval source code.
///
/// Produces a flat token stream with Python-style `Indent`/`Dedent`/`Newline`
/// tokens. Newlines inside parentheses or brackets are suppressed, so
/// expressions may span lines without continuation characters.
pub struct Lexer {
    chars: Vec<char>,
    position: usize,
    line: usize,
    column: usize,
    indent_stack: Vec<usize>,
    at_line_start: bool,
    paren_level: usize,
    bracket_level: usize,
    errors: Vec<LexerError>,
    keywords: HashSet<&'static str>,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        let mut keywords = HashSet::new();
        for kw in &[
            "def", "return", "if", "elif", "else", "while", "for", "in", "break",
            "continue", "pass", "True", "False", "None", "and", "or", "not",
        ] {
            keywords.insert(*kw);
        }

        Lexer {
            chars: input.chars().collect(),
            position: 0,
            line: 1,
            column: 1,
            indent_stack: vec![0],
            at_line_start: true,
            paren_level: 0,
            bracket_level: 0,
            errors: Vec::new(),
            keywords,
        }
    }

    pub fn get_errors(&self) -> &[LexerError] {
        &self.errors
    }

    pub fn tokenize(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();

        loop {
            if self.at_line_start && self.paren_level == 0 && self.bracket_level == 0 {
                self.handle_indentation(&mut tokens);
            }

            if self.is_at_end() {
                break;
            }

            self.skip_inline_whitespace();
            if self.is_at_end() {
                break;
            }

            let current_char = self.peek_char();

            if current_char == '#' {
                self.consume_while(|c| c != '\n');
                continue;
            }

            if current_char == '\n' {
                let line = self.line;
                let column = self.column;
                self.consume_char();
                if self.paren_level == 0 && self.bracket_level == 0 {
                    tokens.push(Token::new(TokenType::Newline, line, column, "\n".to_string()));
                    self.at_line_start = true;
                }
                continue;
            }

            // Explicit line continuation
            if current_char == '\\' && self.peek_char_n(1) == '\n' {
                self.consume_char();
                self.consume_char();
                continue;
            }

            let token = if current_char.is_alphabetic() || current_char == '_' {
                self.handle_identifier()
            } else if current_char.is_ascii_digit()
                || (current_char == '.' && self.peek_char_n(1).is_ascii_digit())
            {
                self.handle_number()
            } else if current_char == '"' || current_char == '\'' {
                self.handle_string()
            } else {
                self.handle_operator_or_delimiter()
            };

            self.update_nesting_level(&token.token_type);
            tokens.push(token);
        }

        while self.indent_stack.len() > 1 {
            self.indent_stack.pop();
            tokens.push(Token::new(
                TokenType::Dedent,
                self.line,
                self.column,
                "".to_string(),
            ));
        }

        tokens.push(Token::new(
            TokenType::EOF,
            self.line,
            self.column,
            "".to_string(),
        ));
        tokens
    }

    /// Measure the indentation of the next non-blank line and emit
    /// `Indent`/`Dedent` tokens against the indent stack. Blank and
    /// comment-only lines never affect indentation.
    fn handle_indentation(&mut self, tokens: &mut Vec<Token>) {
        loop {
            let mut indent = 0usize;
            while !self.is_at_end() {
                match self.peek_char() {
                    ' ' => {
                        indent += 1;
                        self.consume_char();
                    }
                    '\t' => {
                        indent += 8 - (indent % 8);
                        self.consume_char();
                    }
                    '\r' => {
                        self.consume_char();
                    }
                    _ => break,
                }
            }

            if self.is_at_end() {
                return;
            }

            match self.peek_char() {
                '#' => {
                    self.consume_while(|c| c != '\n');
                    if !self.is_at_end() {
                        self.consume_char();
                    }
                    continue;
                }
                '\n' => {
                    self.consume_char();
                    continue;
                }
                _ => {}
            }

            let previous = *self.indent_stack.last().unwrap_or(&0);
            if indent > previous {
                self.indent_stack.push(indent);
                tokens.push(Token::new(
                    TokenType::Indent,
                    self.line,
                    self.column,
                    "".to_string(),
                ));
            } else if indent < previous {
                while indent < *self.indent_stack.last().unwrap_or(&0) {
                    self.indent_stack.pop();
                    tokens.push(Token::new(
                        TokenType::Dedent,
                        self.line,
                        self.column,
                        "".to_string(),
                    ));
                }
                if indent != *self.indent_stack.last().unwrap_or(&0) {
                    self.errors.push(LexerError::new(
                        "unindent does not match any outer indentation level",
                        self.line,
                        self.column,
                    ));
                    self.indent_stack.push(indent);
                }
            }

            self.at_line_start = false;
            return;
        }
    }

    fn handle_identifier(&mut self) -> Token {
        let line = self.line;
        let column = self.column;
        let start = self.position;

        self.consume_while(|c| c.is_alphanumeric() || c == '_');
        let text: String = self.chars[start..self.position].iter().collect();

        let token_type = if self.keywords.contains(text.as_str()) {
            match text.as_str() {
                "def" => TokenType::Def,
                "return" => TokenType::Return,
                "if" => TokenType::If,
                "elif" => TokenType::Elif,
                "else" => TokenType::Else,
                "while" => TokenType::While,
                "for" => TokenType::For,
                "in" => TokenType::In,
                "break" => TokenType::Break,
                "continue" => TokenType::Continue,
                "pass" => TokenType::Pass,
                "True" => TokenType::True,
                "False" => TokenType::False,
                "None" => TokenType::None,
                "and" => TokenType::And,
                "or" => TokenType::Or,
                "not" => TokenType::Not,
                _ => unreachable!(),
            }
        } else {
            TokenType::Identifier(text.clone())
        };

        Token::new(token_type, line, column, text)
    }

    fn handle_number(&mut self) -> Token {
        let line = self.line;
        let column = self.column;
        let start = self.position;

        self.consume_while(|c| c.is_ascii_digit());
        let mut is_float = false;
        if !self.is_at_end() && self.peek_char() == '.' && self.peek_char_n(1).is_ascii_digit() {
            is_float = true;
            self.consume_char();
            self.consume_while(|c| c.is_ascii_digit());
        } else if !self.is_at_end() && self.peek_char() == '.' && !self.peek_char_n(1).is_alphabetic()
        {
            is_float = true;
            self.consume_char();
        }

        let text: String = self.chars[start..self.position].iter().collect();
        if is_float {
            match text.parse::<f64>() {
                Ok(value) => Token::new(TokenType::FloatLiteral(value), line, column, text),
                Err(_) => {
                    self.errors
                        .push(LexerError::new(format!("invalid float literal: {}", text), line, column));
                    Token::new(TokenType::Invalid(text.clone()), line, column, text)
                }
            }
        } else {
            match text.parse::<i64>() {
                Ok(value) => Token::new(TokenType::IntLiteral(value), line, column, text),
                Err(_) => {
                    self.errors.push(LexerError::new(
                        format!("integer literal out of range: {}", text),
                        line,
                        column,
                    ));
                    Token::new(TokenType::Invalid(text.clone()), line, column, text)
                }
            }
        }
    }

    fn handle_string(&mut self) -> Token {
        let line = self.line;
        let column = self.column;
        let quote = self.peek_char();
        self.consume_char();

        let mut value = String::new();
        loop {
            if self.is_at_end() || self.peek_char() == '\n' {
                self.errors.push(
                    LexerError::new("unterminated string literal", line, column)
                        .with_suggestion(format!("add a closing {} quote", quote)),
                );
                return Token::new(TokenType::Invalid(value.clone()), line, column, value);
            }

            let c = self.peek_char();
            self.consume_char();

            if c == quote {
                break;
            }

            if c == '\\' {
                if self.is_at_end() {
                    continue;
                }
                let escaped = self.peek_char();
                self.consume_char();
                match escaped {
                    'n' => value.push('\n'),
                    't' => value.push('\t'),
                    'r' => value.push('\r'),
                    '\\' => value.push('\\'),
                    '\'' => value.push('\''),
                    '"' => value.push('"'),
                    other => {
                        value.push('\\');
                        value.push(other);
                    }
                }
            } else {
                value.push(c);
            }
        }

        Token::new(
            TokenType::StringLiteral(value.clone()),
            line,
            column,
            value,
        )
    }

    fn handle_operator_or_delimiter(&mut self) -> Token {
        let line = self.line;
        let column = self.column;
        let c = self.peek_char();
        self.consume_char();

        let follows_equal = !self.is_at_end() && self.peek_char() == '=';

        let (token_type, lexeme) = match c {
            '+' if follows_equal => {
                self.consume_char();
                (TokenType::PlusAssign, "+=")
            }
            '+' => (TokenType::Plus, "+"),
            '-' if follows_equal => {
                self.consume_char();
                (TokenType::MinusAssign, "-=")
            }
            '-' => (TokenType::Minus, "-"),
            '*' if follows_equal => {
                self.consume_char();
                (TokenType::MulAssign, "*=")
            }
            '*' if !self.is_at_end() && self.peek_char() == '*' => {
                self.consume_char();
                (TokenType::Power, "**")
            }
            '*' => (TokenType::Multiply, "*"),
            '/' if follows_equal => {
                self.consume_char();
                (TokenType::DivAssign, "/=")
            }
            '/' if !self.is_at_end() && self.peek_char() == '/' => {
                self.consume_char();
                (TokenType::FloorDivide, "//")
            }
            '/' => (TokenType::Divide, "/"),
            '%' if follows_equal => {
                self.consume_char();
                (TokenType::ModAssign, "%=")
            }
            '%' => (TokenType::Modulo, "%"),
            '=' if follows_equal => {
                self.consume_char();
                (TokenType::Equal, "==")
            }
            '=' => (TokenType::Assign, "="),
            '!' if follows_equal => {
                self.consume_char();
                (TokenType::NotEqual, "!=")
            }
            '<' if follows_equal => {
                self.consume_char();
                (TokenType::LessEqual, "<=")
            }
            '<' => (TokenType::LessThan, "<"),
            '>' if follows_equal => {
                self.consume_char();
                (TokenType::GreaterEqual, ">=")
            }
            '>' => (TokenType::GreaterThan, ">"),
            '(' => (TokenType::LeftParen, "("),
            ')' => (TokenType::RightParen, ")"),
            '[' => (TokenType::LeftBracket, "["),
            ']' => (TokenType::RightBracket, "]"),
            ',' => (TokenType::Comma, ","),
            ':' => (TokenType::Colon, ":"),
            '@' => (TokenType::At, "@"),
            other => {
                self.errors.push(LexerError::new(
                    format!("unexpected character: '{}'", other),
                    line,
                    column,
                ));
                return Token::new(
                    TokenType::Invalid(other.to_string()),
                    line,
                    column,
                    other.to_string(),
                );
            }
        };

        Token::new(token_type, line, column, lexeme.to_string())
    }

    fn update_nesting_level(&mut self, token_type: &TokenType) {
        match token_type {
            TokenType::LeftParen => self.paren_level += 1,
            TokenType::RightParen => {
                if self.paren_level > 0 {
                    self.paren_level -= 1;
                }
            }
            TokenType::LeftBracket => self.bracket_level += 1,
            TokenType::RightBracket => {
                if self.bracket_level > 0 {
                    self.bracket_level -= 1;
                }
            }
            _ => {}
        }
    }

    fn skip_inline_whitespace(&mut self) {
        while !self.is_at_end() {
            match self.peek_char() {
                ' ' | '\t' | '\r' => {
                    self.consume_char();
                }
                _ => break,
            }
        }
    }

    fn consume_while<F>(&mut self, predicate: F)
    where
        F: Fn(char) -> bool,
    {
        while !self.is_at_end() && predicate(self.peek_char()) {
            self.consume_char();
        }
    }

    fn consume_char(&mut self) -> Option<char> {
        let c = self.chars.get(self.position).copied()?;
        self.position += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn peek_char(&self) -> char {
        self.chars.get(self.position).copied().unwrap_or('\0')
    }

    fn peek_char_n(&self, n: usize) -> char {
        self.chars.get(self.position + n).copied().unwrap_or('\0')
    }

    fn is_at_end(&self) -> bool {
        self.position >= self.chars.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token_types(source: &str) -> Vec<TokenType> {
        let mut lexer = Lexer::new(source);
        let tokens = lexer.tokenize();
        assert!(lexer.get_errors().is_empty(), "{:?}", lexer.get_errors());
        tokens.into_iter().map(|t| t.token_type).collect()
    }

    #[test]
    fn test_simple_assignment() {
        let types = token_types("x = 42\n");
        assert_eq!(
            types,
            vec![
                TokenType::Identifier("x".to_string()),
                TokenType::Assign,
                TokenType::IntLiteral(42),
                TokenType::Newline,
                TokenType::EOF,
            ]
        );
    }

    #[test]
    fn test_def_with_indentation() {
        let types = token_types("def f(n):\n    return n\n");
        assert_eq!(
            types,
            vec![
                TokenType::Def,
                TokenType::Identifier("f".to_string()),
                TokenType::LeftParen,
                TokenType::Identifier("n".to_string()),
                TokenType::RightParen,
                TokenType::Colon,
                TokenType::Newline,
                TokenType::Indent,
                TokenType::Return,
                TokenType::Identifier("n".to_string()),
                TokenType::Newline,
                TokenType::Dedent,
                TokenType::EOF,
            ]
        );
    }

    #[test]
    fn test_operators() {
        let types = token_types("1 ** 2 // 3 <= 4 != 5\n");
        assert_eq!(
            types,
            vec![
                TokenType::IntLiteral(1),
                TokenType::Power,
                TokenType::IntLiteral(2),
                TokenType::FloorDivide,
                TokenType::IntLiteral(3),
                TokenType::LessEqual,
                TokenType::IntLiteral(4),
                TokenType::NotEqual,
                TokenType::IntLiteral(5),
                TokenType::Newline,
                TokenType::EOF,
            ]
        );
    }

    #[test]
    fn test_newline_suppressed_in_parens() {
        let types = token_types("f(1,\n  2)\n");
        assert_eq!(
            types,
            vec![
                TokenType::Identifier("f".to_string()),
                TokenType::LeftParen,
                TokenType::IntLiteral(1),
                TokenType::Comma,
                TokenType::IntLiteral(2),
                TokenType::RightParen,
                TokenType::Newline,
                TokenType::EOF,
            ]
        );
    }

    #[test]
    fn test_blank_and_comment_lines_ignored() {
        let types = token_types("def f():\n    # comment\n\n    pass\n");
        assert_eq!(
            types,
            vec![
                TokenType::Def,
                TokenType::Identifier("f".to_string()),
                TokenType::LeftParen,
                TokenType::RightParen,
                TokenType::Colon,
                TokenType::Newline,
                TokenType::Indent,
                TokenType::Pass,
                TokenType::Newline,
                TokenType::Dedent,
                TokenType::EOF,
            ]
        );
    }

    #[test]
    fn test_string_escapes() {
        let types = token_types("s = 'a\\nb'\n");
        assert_eq!(
            types,
            vec![
                TokenType::Identifier("s".to_string()),
                TokenType::Assign,
                TokenType::StringLiteral("a\nb".to_string()),
                TokenType::Newline,
                TokenType::EOF,
            ]
        );
    }

    #[test]
    fn test_decorator_tokens() {
        let types = token_types("@tco(add=add)\ndef f():\n    pass\n");
        assert_eq!(types[0], TokenType::At);
        assert_eq!(types[1], TokenType::Identifier("tco".to_string()));
    }

    #[test]
    fn test_bad_dedent_reports_error() {
        let mut lexer = Lexer::new("if x:\n        pass\n    pass\n");
        lexer.tokenize();
        assert!(!lexer.get_errors().is_empty());
    }

    #[test]
    fn test_unterminated_string_reports_error() {
        let mut lexer = Lexer::new("s = 'abc\n");
        lexer.tokenize();
        assert_eq!(lexer.get_errors().len(), 1);
    }
}
