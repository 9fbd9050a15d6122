//! Statement parsing for QASM3.

use super::Parser;
use crate::ast::{
    AssignOp, Block, DefParam, GateCall, GateModifier, Operand, Range, Spanned, Statement, Type,
};
use crate::error::{CompileError, CompileResult};
use crate::lexer::Token;

impl Parser {
    /// Parse a statement together with the line it starts on.
    pub(super) fn parse_statement(&mut self) -> CompileResult<Spanned<Statement>> {
        let line = self.current_line();
        let token = self
            .peek()
            .cloned()
            .ok_or_else(|| CompileError::UnexpectedEof("statement".into()))?;

        let node = match token {
            Token::Include => self.parse_include(),
            Token::Qubit => self.parse_qubit_decl(),
            Token::Bit => self.parse_bit_decl(),
            Token::Input => self.parse_input_decl(),
            Token::Const
            | Token::Int
            | Token::Uint
            | Token::Float
            | Token::Angle
            | Token::Bool => self.parse_classical_decl(),
            Token::Measure => self.parse_measure(),
            Token::Reset => self.parse_reset(),
            Token::Barrier => self.parse_barrier(),
            Token::If => self.parse_if(),
            Token::For => self.parse_for(),
            Token::While => self.parse_while(),
            Token::Gate => self.parse_gate_def(),
            Token::Def => self.parse_def(),
            Token::Return => self.parse_return(),
            Token::Identifier(_) | Token::GateU | Token::GateCX => {
                self.parse_identifier_statement()
            }
            _ => {
                self.advance();
                Err(self.unexpected("statement", &token))
            }
        }?;

        Ok(Spanned::new(node, line))
    }

    /// Parse include statement.
    fn parse_include(&mut self) -> CompileResult<Statement> {
        self.expect(Token::Include)?;
        let path = self.parse_string_literal()?;
        self.expect(Token::Semicolon)?;
        Ok(Statement::Include(path))
    }

    /// Parse qubit declaration.
    fn parse_qubit_decl(&mut self) -> CompileResult<Statement> {
        self.expect(Token::Qubit)?;
        let size = if self.check(&Token::LBracket) {
            Some(self.parse_size()?)
        } else {
            None
        };
        let name = self.parse_identifier()?;
        self.expect(Token::Semicolon)?;
        Ok(Statement::QubitDecl { name, size })
    }

    /// Parse bit declaration.
    fn parse_bit_decl(&mut self) -> CompileResult<Statement> {
        self.expect(Token::Bit)?;
        let size = if self.check(&Token::LBracket) {
            Some(self.parse_size()?)
        } else {
            None
        };
        let name = self.parse_identifier()?;
        self.expect(Token::Semicolon)?;
        Ok(Statement::BitDecl { name, size })
    }

    /// Parse a type such as `float[64]`, `int`, `qubit[2]` or `bool`.
    fn parse_type(&mut self) -> CompileResult<Type> {
        let token = self
            .advance()
            .ok_or_else(|| CompileError::UnexpectedEof("type".into()))?;
        let width = if matches!(token, Token::Bool) || !self.check(&Token::LBracket) {
            None
        } else {
            Some(self.parse_size()?)
        };

        Ok(match token {
            Token::Qubit => Type::Qubit(width),
            Token::Bit => Type::Bit(width),
            Token::Int => Type::Int(width),
            Token::Uint => Type::Uint(width),
            Token::Float => Type::Float(width),
            Token::Angle => Type::Angle(width),
            Token::Bool => Type::Bool,
            other => return Err(self.unexpected("type", &other)),
        })
    }

    /// Parse input declaration.
    fn parse_input_decl(&mut self) -> CompileResult<Statement> {
        self.expect(Token::Input)?;
        let ty = self.parse_type()?;
        let name = self.parse_identifier()?;
        self.expect(Token::Semicolon)?;
        Ok(Statement::InputDecl { ty, name })
    }

    /// Parse classical variable declaration.
    fn parse_classical_decl(&mut self) -> CompileResult<Statement> {
        let is_const = self.consume(&Token::Const);
        let ty = self.parse_type()?;
        let name = self.parse_identifier()?;
        let init = if self.consume(&Token::Eq) {
            Some(self.parse_expression()?)
        } else {
            None
        };
        self.expect(Token::Semicolon)?;
        Ok(Statement::ClassicalDecl {
            ty,
            name,
            init,
            is_const,
        })
    }

    /// Parse measure statement.
    fn parse_measure(&mut self) -> CompileResult<Statement> {
        self.expect(Token::Measure)?;
        let qubits = self.parse_operands()?;

        // Without an arrow the statement has no classical target.
        let bits = if self.consume(&Token::Arrow) {
            self.parse_operands()?
        } else {
            vec![]
        };

        self.expect(Token::Semicolon)?;
        Ok(Statement::Measure { qubits, bits })
    }

    /// Parse reset statement.
    fn parse_reset(&mut self) -> CompileResult<Statement> {
        self.expect(Token::Reset)?;
        let qubits = self.parse_operands()?;
        self.expect(Token::Semicolon)?;
        Ok(Statement::Reset { qubits })
    }

    /// Parse barrier statement.
    fn parse_barrier(&mut self) -> CompileResult<Statement> {
        self.expect(Token::Barrier)?;
        let qubits = if self.check(&Token::Semicolon) {
            vec![]
        } else {
            self.parse_operands()?
        };
        self.expect(Token::Semicolon)?;
        Ok(Statement::Barrier { qubits })
    }

    /// Parse if statement.
    fn parse_if(&mut self) -> CompileResult<Statement> {
        self.expect(Token::If)?;
        self.expect(Token::LParen)?;
        let condition = self.parse_expression()?;
        self.expect(Token::RParen)?;

        let then_body = self.parse_block_or_statement()?;
        let else_body = if self.consume(&Token::Else) {
            Some(self.parse_block_or_statement()?)
        } else {
            None
        };

        Ok(Statement::If {
            condition,
            then_body,
            else_body,
        })
    }

    /// Parse for loop: `for [type] i in [start:end]` or `[start:step:end]`.
    fn parse_for(&mut self) -> CompileResult<Statement> {
        self.expect(Token::For)?;
        if matches!(self.peek(), Some(Token::Int | Token::Uint)) {
            self.parse_type()?;
        }
        let variable = self.parse_identifier()?;
        self.expect(Token::In)?;
        self.expect(Token::LBracket)?;
        let start = self.parse_expression()?;
        self.expect(Token::Colon)?;
        let second = self.parse_expression()?;
        let range = if self.consume(&Token::Colon) {
            let end = self.parse_expression()?;
            Range {
                start,
                end,
                step: Some(second),
            }
        } else {
            Range {
                start,
                end: second,
                step: None,
            }
        };
        self.expect(Token::RBracket)?;

        let body = self.parse_block_or_statement()?;
        Ok(Statement::For {
            variable,
            range,
            body,
        })
    }

    /// Parse while loop.
    fn parse_while(&mut self) -> CompileResult<Statement> {
        self.expect(Token::While)?;
        self.expect(Token::LParen)?;
        let condition = self.parse_expression()?;
        self.expect(Token::RParen)?;
        let body = self.parse_block_or_statement()?;
        Ok(Statement::While { condition, body })
    }

    /// Parse gate definition.
    fn parse_gate_def(&mut self) -> CompileResult<Statement> {
        self.expect(Token::Gate)?;
        let name = self.parse_identifier()?;

        let params = if self.consume(&Token::LParen) {
            let p = if self.check(&Token::RParen) {
                vec![]
            } else {
                self.parse_identifier_list()?
            };
            self.expect(Token::RParen)?;
            p
        } else {
            vec![]
        };

        let qubits = self.parse_identifier_list()?;
        let body = self.parse_block()?;

        Ok(Statement::GateDef {
            name,
            params,
            qubits,
            body,
        })
    }

    /// Parse subroutine definition.
    fn parse_def(&mut self) -> CompileResult<Statement> {
        self.expect(Token::Def)?;
        let name = self.parse_identifier()?;

        self.expect(Token::LParen)?;
        let mut params = Vec::new();
        if !self.check(&Token::RParen) {
            loop {
                let ty = self.parse_type()?;
                let name = self.parse_identifier()?;
                params.push(DefParam { ty, name });
                if !self.consume(&Token::Comma) {
                    break;
                }
            }
        }
        self.expect(Token::RParen)?;

        let returns = if self.consume(&Token::Arrow) {
            Some(self.parse_type()?)
        } else {
            None
        };
        let body = self.parse_block()?;

        Ok(Statement::Def {
            name,
            params,
            returns,
            body,
        })
    }

    /// Parse return statement.
    fn parse_return(&mut self) -> CompileResult<Statement> {
        self.expect(Token::Return)?;
        let value = if self.check(&Token::Semicolon) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect(Token::Semicolon)?;
        Ok(Statement::Return(value))
    }

    /// Parse statement starting with identifier (gate call or assignment).
    fn parse_identifier_statement(&mut self) -> CompileResult<Statement> {
        let mut modifiers = Vec::new();
        let name = loop {
            let name = self.parse_gate_name()?;
            match self.parse_modifier(&name)? {
                Some(m) => modifiers.push(m),
                None => break name,
            }
        };

        if modifiers.is_empty() && self.starts_assignment() {
            return self.parse_assignment(name);
        }

        self.parse_gate_call(name, modifiers)
    }

    fn starts_assignment(&self) -> bool {
        matches!(
            self.peek(),
            Some(
                Token::Eq
                    | Token::LBracket
                    | Token::PlusEq
                    | Token::MinusEq
                    | Token::StarEq
                    | Token::SlashEq
            )
        )
    }

    /// Parse the remainder of a gate modifier if `name` introduces one.
    fn parse_modifier(&mut self, name: &str) -> CompileResult<Option<GateModifier>> {
        let is_modifier = matches!(name, "ctrl" | "negctrl" | "inv" | "pow")
            && (self.check(&Token::At) || self.check(&Token::LParen));
        if !is_modifier {
            return Ok(None);
        }

        let arg = if self.consume(&Token::LParen) {
            let e = self.parse_expression()?;
            self.expect(Token::RParen)?;
            Some(e)
        } else {
            None
        };
        self.expect(Token::At)?;

        let modifier = match (name, arg) {
            ("inv", None) => GateModifier::Inv,
            ("pow", Some(e)) => GateModifier::Pow(e),
            ("ctrl", arg) => GateModifier::Ctrl(arg),
            ("negctrl", arg) => GateModifier::NegCtrl(arg),
            _ => {
                return Err(CompileError::Syntax {
                    line: self.line,
                    expected: "well-formed gate modifier".into(),
                    found: name.to_string(),
                });
            }
        };
        Ok(Some(modifier))
    }

    /// Parse assignment statement.
    fn parse_assignment(&mut self, target: String) -> CompileResult<Statement> {
        let index = if self.consume(&Token::LBracket) {
            let idx = self.parse_expression()?;
            self.expect(Token::RBracket)?;
            Some(idx)
        } else {
            None
        };

        let op_token = self
            .advance()
            .ok_or_else(|| CompileError::UnexpectedEof("assignment operator".into()))?;
        let op = match op_token {
            Token::Eq => AssignOp::Assign,
            Token::PlusEq => AssignOp::Add,
            Token::MinusEq => AssignOp::Sub,
            Token::StarEq => AssignOp::Mul,
            Token::SlashEq => AssignOp::Div,
            other => return Err(self.unexpected("assignment operator", &other)),
        };

        // `c = measure q;` is a measurement, not a classical assignment.
        if op == AssignOp::Assign && self.consume(&Token::Measure) {
            let qubits = self.parse_operands()?;
            self.expect(Token::Semicolon)?;
            let bits = vec![Operand {
                register: target,
                index,
            }];
            return Ok(Statement::Measure { qubits, bits });
        }

        let value = self.parse_expression()?;
        self.expect(Token::Semicolon)?;

        Ok(Statement::Assignment {
            target,
            index,
            op,
            value,
        })
    }

    /// Parse gate call.
    fn parse_gate_call(
        &mut self,
        name: String,
        modifiers: Vec<GateModifier>,
    ) -> CompileResult<Statement> {
        let params = if self.consume(&Token::LParen) {
            let p = self.parse_expression_list()?;
            self.expect(Token::RParen)?;
            p
        } else {
            vec![]
        };

        let qubits = self.parse_operands()?;
        self.expect(Token::Semicolon)?;

        Ok(Statement::Gate(GateCall {
            name,
            params,
            qubits,
            modifiers,
        }))
    }

    /// Parse a braced block.
    fn parse_block(&mut self) -> CompileResult<Block> {
        self.expect(Token::LBrace)?;
        self.nested(|p| {
            let mut stmts = Vec::new();
            while !p.check(&Token::RBrace) {
                if p.is_eof() {
                    return Err(CompileError::UnexpectedEof("}".into()));
                }
                stmts.push(p.parse_statement()?);
            }
            p.expect(Token::RBrace)?;
            Ok(stmts)
        })
    }

    /// Parse a block or single statement.
    fn parse_block_or_statement(&mut self) -> CompileResult<Block> {
        if self.check(&Token::LBrace) {
            self.parse_block()
        } else {
            self.nested(|p| Ok(vec![p.parse_statement()?]))
        }
    }

    /// Parse a comma-separated operand list.
    pub(crate) fn parse_operands(&mut self) -> CompileResult<Vec<Operand>> {
        let mut refs = vec![self.parse_operand()?];
        while self.consume(&Token::Comma) {
            refs.push(self.parse_operand()?);
        }
        Ok(refs)
    }

    /// Parse `name` or `name[index]`.
    pub(crate) fn parse_operand(&mut self) -> CompileResult<Operand> {
        let register = self.parse_identifier()?;
        let index = if self.consume(&Token::LBracket) {
            let index = self.parse_expression()?;
            self.expect(Token::RBracket)?;
            Some(index)
        } else {
            None
        };
        Ok(Operand { register, index })
    }
}
