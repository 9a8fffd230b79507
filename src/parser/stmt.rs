use crate::ast::{Expr, Operator, Parameter, Stmt};
use crate::lexer::TokenType;
use crate::parser::error::ParseError;
use crate::parser::expr::ExprParser;
use crate::parser::helpers::TokenMatching;
use crate::parser::Parser;

/// Parser methods for statements
pub trait StmtParser {
    /// Parse a statement
    fn parse_statement(&mut self) -> Result<Stmt, ParseError>;

    /// Parse a function definition (the leading `def` is still current)
    fn parse_function_def(&mut self, decorator_list: Vec<Box<Expr>>) -> Result<Stmt, ParseError>;

    /// Parse function parameters
    fn parse_parameters(&mut self) -> Result<Vec<Parameter>, ParseError>;

    /// Parse decorators
    fn parse_decorators(&mut self) -> Result<Vec<Box<Expr>>, ParseError>;

    /// Parse a return statement
    fn parse_return(&mut self) -> Result<Stmt, ParseError>;

    /// Parse an if statement (also used for `elif` chains)
    fn parse_if(&mut self) -> Result<Stmt, ParseError>;

    /// Parse a while statement
    fn parse_while(&mut self) -> Result<Stmt, ParseError>;

    /// Parse a for statement
    fn parse_for(&mut self) -> Result<Stmt, ParseError>;

    /// Parse an expression statement, assignment or augmented assignment
    fn parse_expr_statement(&mut self) -> Result<Stmt, ParseError>;

    /// Parse an indented block
    fn parse_suite(&mut self) -> Result<Vec<Box<Stmt>>, ParseError>;
}

impl StmtParser for Parser {
    fn parse_statement(&mut self) -> Result<Stmt, ParseError> {
        let (line, column) = self.current_location();

        match self.current.as_ref().map(|t| &t.token_type) {
            Some(TokenType::At) => {
                let decorators = self.parse_decorators()?;
                if self.check(TokenType::Def) {
                    self.parse_function_def(decorators)
                } else {
                    let (line, column) = self.current_location();
                    Err(ParseError::invalid_syntax(
                        "Expected function definition after decorators",
                        line,
                        column,
                    ))
                }
            }
            Some(TokenType::Def) => self.parse_function_def(Vec::new()),
            Some(TokenType::Return) => self.parse_return(),
            Some(TokenType::If) => self.parse_if(),
            Some(TokenType::While) => self.parse_while(),
            Some(TokenType::For) => self.parse_for(),
            Some(TokenType::Pass) => {
                self.advance();
                self.consume_newline()?;
                Ok(Stmt::Pass { line, column })
            }
            Some(TokenType::Break) => {
                self.advance();
                self.consume_newline()?;
                Ok(Stmt::Break { line, column })
            }
            Some(TokenType::Continue) => {
                self.advance();
                self.consume_newline()?;
                Ok(Stmt::Continue { line, column })
            }
            Some(_) => self.parse_expr_statement(),
            None => Err(ParseError::eof("statement", line, column)),
        }
    }

    fn parse_function_def(&mut self, decorator_list: Vec<Box<Expr>>) -> Result<Stmt, ParseError> {
        let (line, column) = self.current_location();
        self.consume(TokenType::Def, "'def'")?;
        let name = self.consume_identifier("function name")?;
        self.consume(TokenType::LeftParen, "'('")?;
        let params = self.parse_parameters()?;
        self.consume(TokenType::RightParen, "')'")?;
        self.consume(TokenType::Colon, "':'")?;
        let body = self.parse_suite()?;

        Ok(Stmt::FunctionDef {
            name,
            params,
            body,
            decorator_list,
            line,
            column,
        })
    }

    fn parse_parameters(&mut self) -> Result<Vec<Parameter>, ParseError> {
        let mut params = Vec::new();

        if self.check(TokenType::RightParen) {
            return Ok(params);
        }

        loop {
            let name = self.consume_identifier("parameter name")?;
            let default = if self.match_token(TokenType::Assign) {
                Some(Box::new(self.parse_expression()?))
            } else {
                None
            };
            params.push(Parameter { name, default });

            if !self.match_token(TokenType::Comma) {
                break;
            }
            if self.check(TokenType::RightParen) {
                break;
            }
        }

        Ok(params)
    }

    fn parse_decorators(&mut self) -> Result<Vec<Box<Expr>>, ParseError> {
        let mut decorators = Vec::new();

        while self.check(TokenType::At) {
            let (line, column) = self.current_location();
            self.advance();
            let name = self.consume_identifier("decorator name")?;
            let mut decorator = Expr::Name {
                id: name,
                line,
                column,
            };
            if self.match_token(TokenType::LeftParen) {
                decorator = self.parse_call_arguments(decorator)?;
            }
            decorators.push(Box::new(decorator));
            self.consume(TokenType::Newline, "newline after decorator")?;
        }

        Ok(decorators)
    }

    fn parse_return(&mut self) -> Result<Stmt, ParseError> {
        let (line, column) = self.current_location();
        self.consume(TokenType::Return, "'return'")?;

        let value = if self.check_newline() {
            None
        } else {
            Some(Box::new(self.parse_expression()?))
        };
        self.consume_newline()?;

        Ok(Stmt::Return {
            value,
            line,
            column,
        })
    }

    fn parse_if(&mut self) -> Result<Stmt, ParseError> {
        let (line, column) = self.current_location();
        // Either `if` or `elif` begins the statement
        self.advance();
        let test = self.parse_expression()?;
        self.consume(TokenType::Colon, "':'")?;
        let body = self.parse_suite()?;

        let orelse = if self.check(TokenType::Elif) {
            vec![Box::new(self.parse_if()?)]
        } else if self.match_token(TokenType::Else) {
            self.consume(TokenType::Colon, "':'")?;
            self.parse_suite()?
        } else {
            Vec::new()
        };

        Ok(Stmt::If {
            test: Box::new(test),
            body,
            orelse,
            line,
            column,
        })
    }

    fn parse_while(&mut self) -> Result<Stmt, ParseError> {
        let (line, column) = self.current_location();
        self.consume(TokenType::While, "'while'")?;
        let test = self.parse_expression()?;
        self.consume(TokenType::Colon, "':'")?;
        let body = self.parse_suite()?;

        let orelse = if self.match_token(TokenType::Else) {
            self.consume(TokenType::Colon, "':'")?;
            self.parse_suite()?
        } else {
            Vec::new()
        };

        Ok(Stmt::While {
            test: Box::new(test),
            body,
            orelse,
            line,
            column,
        })
    }

    fn parse_for(&mut self) -> Result<Stmt, ParseError> {
        let (line, column) = self.current_location();
        self.consume(TokenType::For, "'for'")?;
        let (target_line, target_column) = self.current_location();
        let target = self.consume_identifier("loop variable")?;
        self.consume(TokenType::In, "'in'")?;
        let iter = self.parse_expression()?;
        self.consume(TokenType::Colon, "':'")?;
        let body = self.parse_suite()?;

        let orelse = if self.match_token(TokenType::Else) {
            self.consume(TokenType::Colon, "':'")?;
            self.parse_suite()?
        } else {
            Vec::new()
        };

        Ok(Stmt::For {
            target: Box::new(Expr::Name {
                id: target,
                line: target_line,
                column: target_column,
            }),
            iter: Box::new(iter),
            body,
            orelse,
            line,
            column,
        })
    }

    fn parse_expr_statement(&mut self) -> Result<Stmt, ParseError> {
        let (line, column) = self.current_location();
        let first = self.parse_expression()?;

        if self.check(TokenType::Assign) {
            // Possibly chained: a = b = value
            let mut exprs = vec![first];
            while self.match_token(TokenType::Assign) {
                exprs.push(self.parse_expression()?);
            }
            let value = exprs.pop().unwrap();
            for target in &exprs {
                if !matches!(target, Expr::Name { .. } | Expr::Subscript { .. }) {
                    return Err(ParseError::invalid_syntax(
                        "cannot assign to this expression",
                        target.line(),
                        target.column(),
                    ));
                }
            }
            self.consume_newline()?;
            return Ok(Stmt::Assign {
                targets: exprs.into_iter().map(Box::new).collect(),
                value: Box::new(value),
                line,
                column,
            });
        }

        let aug_op = match self.current.as_ref().map(|t| &t.token_type) {
            Some(TokenType::PlusAssign) => Some(Operator::Add),
            Some(TokenType::MinusAssign) => Some(Operator::Sub),
            Some(TokenType::MulAssign) => Some(Operator::Mult),
            Some(TokenType::DivAssign) => Some(Operator::Div),
            Some(TokenType::ModAssign) => Some(Operator::Mod),
            _ => None,
        };

        if let Some(op) = aug_op {
            if !matches!(first, Expr::Name { .. }) {
                return Err(ParseError::invalid_syntax(
                    "augmented assignment target must be a name",
                    first.line(),
                    first.column(),
                ));
            }
            self.advance();
            let value = self.parse_expression()?;
            self.consume_newline()?;
            return Ok(Stmt::AugAssign {
                target: Box::new(first),
                op,
                value: Box::new(value),
                line,
                column,
            });
        }

        self.consume_newline()?;
        Ok(Stmt::Expr {
            value: Box::new(first),
            line,
            column,
        })
    }

    fn parse_suite(&mut self) -> Result<Vec<Box<Stmt>>, ParseError> {
        self.consume(TokenType::Newline, "newline after ':'")?;
        self.consume(TokenType::Indent, "an indented block")?;

        let mut body = Vec::new();
        loop {
            while self.match_token(TokenType::Newline) {}

            if self.match_token(TokenType::Dedent) {
                break;
            }
            if self.check(TokenType::EOF) || self.current.is_none() {
                break;
            }

            body.push(Box::new(self.parse_statement()?));
        }

        if body.is_empty() {
            let (line, column) = self.current_location();
            return Err(ParseError::invalid_syntax(
                "expected at least one statement in block",
                line,
                column,
            ));
        }

        Ok(body)
    }
}
