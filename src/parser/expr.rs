use crate::ast::{BoolOperator, CmpOperator, Expr, NameConstant, Number, Operator, UnaryOperator};
use crate::lexer::TokenType;
use crate::parser::error::ParseError;
use crate::parser::helpers::TokenMatching;
use crate::parser::Parser;

/// Parser methods for expressions
pub trait ExprParser {
    /// Parse a full expression (conditional expressions and below)
    fn parse_expression(&mut self) -> Result<Expr, ParseError>;

    /// Parse an `or` chain
    fn parse_or(&mut self) -> Result<Expr, ParseError>;

    /// Parse an `and` chain
    fn parse_and(&mut self) -> Result<Expr, ParseError>;

    /// Parse a `not` expression
    fn parse_not(&mut self) -> Result<Expr, ParseError>;

    /// Parse a comparison
    fn parse_comparison(&mut self) -> Result<Expr, ParseError>;

    /// Parse addition and subtraction
    fn parse_arith(&mut self) -> Result<Expr, ParseError>;

    /// Parse multiplication, division, floor division and modulo
    fn parse_term(&mut self) -> Result<Expr, ParseError>;

    /// Parse a unary expression
    fn parse_unary(&mut self) -> Result<Expr, ParseError>;

    /// Parse exponentiation (right associative)
    fn parse_power(&mut self) -> Result<Expr, ParseError>;

    /// Parse call and subscript suffixes
    fn parse_postfix(&mut self) -> Result<Expr, ParseError>;

    /// Parse call arguments after an opening parenthesis has been consumed
    fn parse_call_arguments(&mut self, func: Expr) -> Result<Expr, ParseError>;

    /// Parse an atom: literal, name, parenthesized expression or list display
    fn parse_atom(&mut self) -> Result<Expr, ParseError>;
}

impl ExprParser for Parser {
    fn parse_expression(&mut self) -> Result<Expr, ParseError> {
        let body = self.parse_or()?;

        // Conditional expression: `a if cond else b`
        if self.check(TokenType::If) {
            let (line, column) = (body.line(), body.column());
            self.advance();
            let test = self.parse_or()?;
            self.consume(TokenType::Else, "'else' in conditional expression")?;
            let orelse = self.parse_expression()?;
            return Ok(Expr::IfExp {
                test: Box::new(test),
                body: Box::new(body),
                orelse: Box::new(orelse),
                line,
                column,
            });
        }

        Ok(body)
    }

    fn parse_or(&mut self) -> Result<Expr, ParseError> {
        let first = self.parse_and()?;

        if !self.check(TokenType::Or) {
            return Ok(first);
        }

        let (line, column) = (first.line(), first.column());
        let mut values = vec![Box::new(first)];
        while self.match_token(TokenType::Or) {
            values.push(Box::new(self.parse_and()?));
        }

        Ok(Expr::BoolOp {
            op: BoolOperator::Or,
            values,
            line,
            column,
        })
    }

    fn parse_and(&mut self) -> Result<Expr, ParseError> {
        let first = self.parse_not()?;

        if !self.check(TokenType::And) {
            return Ok(first);
        }

        let (line, column) = (first.line(), first.column());
        let mut values = vec![Box::new(first)];
        while self.match_token(TokenType::And) {
            values.push(Box::new(self.parse_not()?));
        }

        Ok(Expr::BoolOp {
            op: BoolOperator::And,
            values,
            line,
            column,
        })
    }

    fn parse_not(&mut self) -> Result<Expr, ParseError> {
        if self.check(TokenType::Not) {
            let (line, column) = self.current_location();
            self.advance();
            let operand = self.parse_not()?;
            return Ok(Expr::UnaryOp {
                op: UnaryOperator::Not,
                operand: Box::new(operand),
                line,
                column,
            });
        }

        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> Result<Expr, ParseError> {
        let left = self.parse_arith()?;

        let op = match self.current.as_ref().map(|t| &t.token_type) {
            Some(TokenType::Equal) => CmpOperator::Eq,
            Some(TokenType::NotEqual) => CmpOperator::NotEq,
            Some(TokenType::LessThan) => CmpOperator::Lt,
            Some(TokenType::LessEqual) => CmpOperator::LtE,
            Some(TokenType::GreaterThan) => CmpOperator::Gt,
            Some(TokenType::GreaterEqual) => CmpOperator::GtE,
            _ => return Ok(left),
        };

        let (line, column) = (left.line(), left.column());
        self.advance();
        let right = self.parse_arith()?;

        Ok(Expr::Compare {
            left: Box::new(left),
            op,
            right: Box::new(right),
            line,
            column,
        })
    }

    fn parse_arith(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_term()?;

        loop {
            let op = match self.current.as_ref().map(|t| &t.token_type) {
                Some(TokenType::Plus) => Operator::Add,
                Some(TokenType::Minus) => Operator::Sub,
                _ => break,
            };
            let (line, column) = (left.line(), left.column());
            self.advance();
            let right = self.parse_term()?;
            left = Expr::BinOp {
                left: Box::new(left),
                op,
                right: Box::new(right),
                line,
                column,
            };
        }

        Ok(left)
    }

    fn parse_term(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_unary()?;

        loop {
            let op = match self.current.as_ref().map(|t| &t.token_type) {
                Some(TokenType::Multiply) => Operator::Mult,
                Some(TokenType::Divide) => Operator::Div,
                Some(TokenType::FloorDivide) => Operator::FloorDiv,
                Some(TokenType::Modulo) => Operator::Mod,
                _ => break,
            };
            let (line, column) = (left.line(), left.column());
            self.advance();
            let right = self.parse_unary()?;
            left = Expr::BinOp {
                left: Box::new(left),
                op,
                right: Box::new(right),
                line,
                column,
            };
        }

        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        let op = match self.current.as_ref().map(|t| &t.token_type) {
            Some(TokenType::Plus) => Some(UnaryOperator::UAdd),
            Some(TokenType::Minus) => Some(UnaryOperator::USub),
            _ => None,
        };

        if let Some(op) = op {
            let (line, column) = self.current_location();
            self.advance();
            let operand = self.parse_unary()?;
            return Ok(Expr::UnaryOp {
                op,
                operand: Box::new(operand),
                line,
                column,
            });
        }

        self.parse_power()
    }

    fn parse_power(&mut self) -> Result<Expr, ParseError> {
        let base = self.parse_postfix()?;

        if self.check(TokenType::Power) {
            let (line, column) = (base.line(), base.column());
            self.advance();
            // Exponent binds tighter than unary on the left, looser on the
            // right, matching Python: -2 ** -2 is -(2 ** (-2)).
            let exponent = self.parse_unary()?;
            return Ok(Expr::BinOp {
                left: Box::new(base),
                op: Operator::Pow,
                right: Box::new(exponent),
                line,
                column,
            });
        }

        Ok(base)
    }

    fn parse_postfix(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_atom()?;

        loop {
            if self.match_token(TokenType::LeftParen) {
                expr = self.parse_call_arguments(expr)?;
            } else if self.check(TokenType::LeftBracket) {
                let (line, column) = (expr.line(), expr.column());
                self.advance();
                let slice = self.parse_expression()?;
                self.consume(TokenType::RightBracket, "']'")?;
                expr = Expr::Subscript {
                    value: Box::new(expr),
                    slice: Box::new(slice),
                    line,
                    column,
                };
            } else {
                break;
            }
        }

        Ok(expr)
    }

    fn parse_call_arguments(&mut self, func: Expr) -> Result<Expr, ParseError> {
        let (line, column) = (func.line(), func.column());
        let mut args = Vec::new();
        let mut keywords = Vec::new();

        if !self.check(TokenType::RightParen) {
            loop {
                // Keyword argument: `name=value`
                if self.check(TokenType::Identifier(String::new()))
                    && self.peek_matches(TokenType::Assign)
                {
                    let name = self.consume_identifier("keyword argument name")?;
                    self.advance(); // '='
                    let value = self.parse_expression()?;
                    keywords.push((name, Box::new(value)));
                } else {
                    if !keywords.is_empty() {
                        let (line, column) = self.current_location();
                        return Err(ParseError::invalid_syntax(
                            "positional argument follows keyword argument",
                            line,
                            column,
                        ));
                    }
                    args.push(Box::new(self.parse_expression()?));
                }

                if !self.match_token(TokenType::Comma) {
                    break;
                }

                // Trailing comma
                if self.check(TokenType::RightParen) {
                    break;
                }
            }
        }

        self.consume(TokenType::RightParen, "')'")?;

        Ok(Expr::Call {
            func: Box::new(func),
            args,
            keywords,
            line,
            column,
        })
    }

    fn parse_atom(&mut self) -> Result<Expr, ParseError> {
        let (line, column) = self.current_location();

        let token = match &self.current {
            Some(token) => token.clone(),
            None => return Err(ParseError::eof("expression", line, column)),
        };

        match token.token_type {
            TokenType::IntLiteral(value) => {
                self.advance();
                Ok(Expr::Num {
                    value: Number::Integer(value),
                    line,
                    column,
                })
            }
            TokenType::FloatLiteral(value) => {
                self.advance();
                Ok(Expr::Num {
                    value: Number::Float(value),
                    line,
                    column,
                })
            }
            TokenType::StringLiteral(value) => {
                self.advance();
                Ok(Expr::Str {
                    value,
                    line,
                    column,
                })
            }
            TokenType::True => {
                self.advance();
                Ok(Expr::NameConstant {
                    value: NameConstant::True,
                    line,
                    column,
                })
            }
            TokenType::False => {
                self.advance();
                Ok(Expr::NameConstant {
                    value: NameConstant::False,
                    line,
                    column,
                })
            }
            TokenType::None => {
                self.advance();
                Ok(Expr::NameConstant {
                    value: NameConstant::None,
                    line,
                    column,
                })
            }
            TokenType::Identifier(name) => {
                self.advance();
                Ok(Expr::Name {
                    id: name,
                    line,
                    column,
                })
            }
            TokenType::LeftParen => {
                self.advance();
                let expr = self.parse_expression()?;
                self.consume(TokenType::RightParen, "')'")?;
                Ok(expr)
            }
            TokenType::LeftBracket => {
                self.advance();
                let mut elts = Vec::new();
                if !self.check(TokenType::RightBracket) {
                    loop {
                        elts.push(Box::new(self.parse_expression()?));
                        if !self.match_token(TokenType::Comma) {
                            break;
                        }
                        if self.check(TokenType::RightBracket) {
                            break;
                        }
                    }
                }
                self.consume(TokenType::RightBracket, "']'")?;
                Ok(Expr::List { elts, line, column })
            }
            other => Err(ParseError::unexpected_token(
                "expression",
                other,
                line,
                column,
            )),
        }
    }
}
