//! Expression parsing for QASM3.

use super::Parser;
use crate::ast::{BinOp, Expression};
use crate::error::{CompileError, CompileResult};
use crate::lexer::Token;

impl Parser {
    /// Parse an expression.
    pub(crate) fn parse_expression(&mut self) -> CompileResult<Expression> {
        self.parse_binary_expr(0)
    }

    /// Parse binary expression with precedence climbing.
    fn parse_binary_expr(&mut self, min_prec: u8) -> CompileResult<Expression> {
        let mut left = self.parse_unary_expr()?;

        while let Some(op) = self.peek_binary_op() {
            let prec = op_precedence(op);
            if prec < min_prec {
                break;
            }
            self.advance(); // consume operator

            let right = self.parse_binary_expr(prec + 1)?;
            left = Expression::BinOp {
                left: Box::new(left),
                op,
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    /// Parse unary expression.
    ///
    /// Each call is one nesting level, so parentheses, indices and
    /// prefix operators all count towards the limit.
    fn parse_unary_expr(&mut self) -> CompileResult<Expression> {
        self.nested(|p| {
            if p.consume(&Token::Minus) {
                let expr = p.parse_unary_expr()?;
                return Ok(Expression::Neg(Box::new(expr)));
            }
            if p.consume(&Token::Not) {
                let expr = p.parse_unary_expr()?;
                return Ok(Expression::Not(Box::new(expr)));
            }
            p.parse_primary_expr()
        })
    }

    /// Parse primary expression.
    fn parse_primary_expr(&mut self) -> CompileResult<Expression> {
        let token = self
            .advance()
            .ok_or_else(|| CompileError::UnexpectedEof("expression".into()))?;

        match token {
            Token::IntLiteral(v) => i64::try_from(v)
                .map(Expression::Int)
                .map_err(|_| self.unexpected("integer below 2^63", &Token::IntLiteral(v))),
            Token::FloatLiteral(v) => Ok(Expression::Float(v)),
            Token::Pi => Ok(Expression::Pi),
            Token::Tau => Ok(Expression::Tau),
            Token::Euler => Ok(Expression::Euler),
            Token::True => Ok(Expression::Bool(true)),
            Token::False => Ok(Expression::Bool(false)),
            Token::Identifier(name) => {
                if self.consume(&Token::LParen) {
                    let args = self.parse_expression_list()?;
                    self.expect(Token::RParen)?;
                    Ok(Expression::FnCall { name, args })
                } else if self.consume(&Token::LBracket) {
                    let index = self.parse_expression()?;
                    self.expect(Token::RBracket)?;
                    Ok(Expression::Index {
                        name,
                        index: Box::new(index),
                    })
                } else {
                    Ok(Expression::Identifier(name))
                }
            }
            Token::LParen => {
                let expr = self.parse_expression()?;
                self.expect(Token::RParen)?;
                Ok(Expression::Paren(Box::new(expr)))
            }
            other => Err(self.unexpected("expression", &other)),
        }
    }

    /// Peek at binary operator.
    fn peek_binary_op(&self) -> Option<BinOp> {
        match self.peek()? {
            Token::Plus => Some(BinOp::Add),
            Token::Minus => Some(BinOp::Sub),
            Token::Star => Some(BinOp::Mul),
            Token::Slash => Some(BinOp::Div),
            Token::Percent => Some(BinOp::Mod),
            Token::Power => Some(BinOp::Pow),
            Token::EqEq => Some(BinOp::Eq),
            Token::NotEq => Some(BinOp::NotEq),
            Token::Lt => Some(BinOp::Lt),
            Token::LtEq => Some(BinOp::LtEq),
            Token::Gt => Some(BinOp::Gt),
            Token::GtEq => Some(BinOp::GtEq),
            Token::And => Some(BinOp::And),
            Token::Or => Some(BinOp::Or),
            Token::Ampersand => Some(BinOp::BitAnd),
            Token::Pipe => Some(BinOp::BitOr),
            Token::Caret => Some(BinOp::BitXor),
            Token::LShift => Some(BinOp::LShift),
            Token::RShift => Some(BinOp::RShift),
            _ => None,
        }
    }

    /// Parse expression list.
    pub(crate) fn parse_expression_list(&mut self) -> CompileResult<Vec<Expression>> {
        if self.check(&Token::RParen) {
            return Ok(vec![]);
        }
        let mut exprs = vec![self.parse_expression()?];
        while self.consume(&Token::Comma) {
            exprs.push(self.parse_expression()?);
        }
        Ok(exprs)
    }
}

/// Get operator precedence.
fn op_precedence(op: BinOp) -> u8 {
    match op {
        BinOp::Or => 1,
        BinOp::And => 2,
        BinOp::BitOr => 3,
        BinOp::BitXor => 4,
        BinOp::BitAnd => 5,
        BinOp::Eq | BinOp::NotEq => 6,
        BinOp::Lt | BinOp::LtEq | BinOp::Gt | BinOp::GtEq => 7,
        BinOp::LShift | BinOp::RShift => 8,
        BinOp::Add | BinOp::Sub => 9,
        BinOp::Mul | BinOp::Div | BinOp::Mod => 10,
        BinOp::Pow => 11,
    }
}
