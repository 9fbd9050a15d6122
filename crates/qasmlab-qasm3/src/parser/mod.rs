//! Parser for `OpenQASM` 3.

mod expression;
mod statement;

use crate::ast::Program;
use crate::error::{CompileError, CompileResult};
use crate::lexer::{SpannedToken, Token, tokenize};

/// Deepest nesting of blocks and expressions the parser accepts.
pub const MAX_NESTING_DEPTH: usize = 128;

/// Parse a source string into an AST [`Program`].
pub fn parse_program(source: &str) -> CompileResult<Program> {
    let mut parser = Parser::new(source)?;
    parser.parse_program()
}

/// Parser state.
pub(crate) struct Parser {
    tokens: Vec<SpannedToken>,
    pos: usize,
    /// Line of the most recently consumed token.
    line: usize,
    depth: usize,
}

impl Parser {
    /// Create a new parser from source.
    pub(crate) fn new(source: &str) -> CompileResult<Self> {
        let mut tokens = Vec::new();
        for result in tokenize(source) {
            match result {
                Ok(t) => tokens.push(t),
                Err((line, message)) => return Err(CompileError::Lexer { line, message }),
            }
        }

        Ok(Self {
            tokens,
            pos: 0,
            line: 1,
            depth: 0,
        })
    }

    /// Check if we've reached the end.
    pub(crate) fn is_eof(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    /// Peek at the current token.
    pub(crate) fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|t| &t.token)
    }

    /// Line of the next token, or of the last one at end of input.
    pub(crate) fn current_line(&self) -> usize {
        self.tokens.get(self.pos).map_or(self.line, |t| t.line)
    }

    /// Advance and return the current token.
    pub(crate) fn advance(&mut self) -> Option<Token> {
        let spanned = self.tokens.get(self.pos)?;
        self.line = spanned.line;
        let token = spanned.token.clone();
        self.pos += 1;
        Some(token)
    }

    /// Expect a specific token.
    #[allow(clippy::needless_pass_by_value)]
    pub(crate) fn expect(&mut self, expected: Token) -> CompileResult<()> {
        let found = self
            .advance()
            .ok_or_else(|| CompileError::UnexpectedEof(expected.to_string()))?;

        if std::mem::discriminant(&found) != std::mem::discriminant(&expected) {
            return Err(self.unexpected(expected.to_string(), &found));
        }
        Ok(())
    }

    /// Check if current token matches.
    pub(crate) fn check(&self, token: &Token) -> bool {
        self.peek()
            .is_some_and(|t| std::mem::discriminant(t) == std::mem::discriminant(token))
    }

    /// Consume token if it matches.
    pub(crate) fn consume(&mut self, token: &Token) -> bool {
        if self.check(token) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Run `f` one nesting level deeper.
    pub(crate) fn nested<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> CompileResult<T>,
    ) -> CompileResult<T> {
        if self.depth >= MAX_NESTING_DEPTH {
            return Err(CompileError::structural(
                self.current_line(),
                format!("nesting exceeds {MAX_NESTING_DEPTH} levels"),
            ));
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    /// Syntax error for a token that was just consumed.
    pub(crate) fn unexpected(&self, expected: impl Into<String>, found: &Token) -> CompileError {
        CompileError::Syntax {
            line: self.line,
            expected: expected.into(),
            found: found.to_string(),
        }
    }

    /// Parse the entire program.
    fn parse_program(&mut self) -> CompileResult<Program> {
        let version = if self.consume(&Token::OpenQasm) {
            let version = self.parse_version()?;
            self.expect(Token::Semicolon)?;
            Some(version)
        } else {
            None
        };

        let mut statements = Vec::new();
        while !self.is_eof() {
            statements.push(self.parse_statement()?);
        }

        Ok(Program {
            version,
            statements,
        })
    }

    /// Parse version number.
    pub(crate) fn parse_version(&mut self) -> CompileResult<String> {
        match self.advance() {
            Some(Token::FloatLiteral(v)) => Ok(format!("{v:?}")),
            Some(Token::IntLiteral(v)) => Ok(format!("{v}.0")),
            Some(other) => Err(CompileError::InvalidVersion(other.to_string())),
            None => Err(CompileError::UnexpectedEof("version number".into())),
        }
    }

    /// Parse identifier list.
    pub(crate) fn parse_identifier_list(&mut self) -> CompileResult<Vec<String>> {
        let mut ids = vec![self.parse_identifier()?];
        while self.consume(&Token::Comma) {
            ids.push(self.parse_identifier()?);
        }
        Ok(ids)
    }

    /// Parse an identifier.
    pub(crate) fn parse_identifier(&mut self) -> CompileResult<String> {
        match self.advance() {
            Some(Token::Identifier(s)) => Ok(s),
            Some(other) => Err(self.unexpected("identifier", &other)),
            None => Err(CompileError::UnexpectedEof("identifier".into())),
        }
    }

    /// Parse a gate name, including the built-in `U` and `CX`.
    pub(crate) fn parse_gate_name(&mut self) -> CompileResult<String> {
        match self.advance() {
            Some(Token::Identifier(s)) => Ok(s),
            Some(Token::GateU) => Ok("U".into()),
            Some(Token::GateCX) => Ok("CX".into()),
            Some(other) => Err(self.unexpected("gate name", &other)),
            None => Err(CompileError::UnexpectedEof("gate name".into())),
        }
    }

    /// Parse an integer literal.
    pub(crate) fn parse_int_literal(&mut self) -> CompileResult<u64> {
        match self.advance() {
            Some(Token::IntLiteral(v)) => Ok(v),
            Some(other) => Err(self.unexpected("integer", &other)),
            None => Err(CompileError::UnexpectedEof("integer".into())),
        }
    }

    /// Parse a bracketed size such as `[4]` into a `u32`.
    pub(crate) fn parse_size(&mut self) -> CompileResult<u32> {
        self.expect(Token::LBracket)?;
        let size = self.parse_int_literal()?;
        self.expect(Token::RBracket)?;
        u32::try_from(size).map_err(|_| CompileError::Syntax {
            line: self.line,
            expected: "size below 2^32".into(),
            found: size.to_string(),
        })
    }

    /// Parse a string literal.
    pub(crate) fn parse_string_literal(&mut self) -> CompileResult<String> {
        match self.advance() {
            Some(Token::StringLiteral(s)) => Ok(s),
            Some(other) => Err(self.unexpected("string literal", &other)),
            None => Err(CompileError::UnexpectedEof("string literal".into())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Expression, Operand, Statement, Type};

    fn statements(source: &str) -> Vec<Statement> {
        parse_program(source)
            .unwrap()
            .statements
            .into_iter()
            .map(|s| s.node)
            .collect()
    }

    #[test]
    fn test_parse_bell_state() {
        let source = r"
            OPENQASM 3.0;
            qubit[2] q;
            bit[2] c;
            h q[0];
            cx q[0], q[1];
            c = measure q;
        ";

        let program = parse_program(source).unwrap();
        assert_eq!(program.version.as_deref(), Some("3.0"));
        assert_eq!(program.statements.len(), 5);
        assert_eq!(
            program.statements[4].node,
            Statement::Measure {
                qubits: vec![Operand::whole("q")],
                bits: vec![Operand::whole("c")],
            }
        );
    }

    #[test]
    fn test_header_is_optional() {
        let program = parse_program("qubit q;\nh q;").unwrap();
        assert!(program.version.is_none());
        assert_eq!(program.statements.len(), 2);
    }

    #[test]
    fn test_statement_lines() {
        let program = parse_program("OPENQASM 3.0;\nqubit[2] q;\n\nh q[0];\n").unwrap();
        assert_eq!(program.statements[0].line, 2);
        assert_eq!(program.statements[1].line, 4);
    }

    #[test]
    fn test_parse_input_declaration() {
        let stmts = statements("input float[64] theta;");
        assert_eq!(
            stmts[0],
            Statement::InputDecl {
                ty: Type::Float(Some(64)),
                name: "theta".into()
            }
        );
    }

    #[test]
    fn test_parse_for_with_step() {
        let stmts = statements("for int i in [0:2:6] { h q[i]; }");
        let Statement::For { variable, range, body } = &stmts[0] else {
            panic!("expected for loop");
        };
        assert_eq!(variable, "i");
        assert_eq!(range.start, Expression::Int(0));
        assert_eq!(range.step, Some(Expression::Int(2)));
        assert_eq!(range.end, Expression::Int(6));
        assert_eq!(body.len(), 1);
    }

    #[test]
    fn test_parse_if_else() {
        let stmts = statements("if (c[0] == 1) { x q[0]; } else { h q[0]; }");
        let Statement::If { else_body, .. } = &stmts[0] else {
            panic!("expected if");
        };
        assert_eq!(else_body.as_ref().map(Vec::len), Some(1));
    }

    #[test]
    fn test_parse_modifiers() {
        let stmts = statements("ctrl @ inv @ x q[0], q[1];");
        let Statement::Gate(call) = &stmts[0] else {
            panic!("expected gate");
        };
        assert_eq!(call.name, "x");
        assert_eq!(call.modifiers.len(), 2);
    }

    #[test]
    fn test_parse_def() {
        let stmts = statements("def flip(qubit a, float[64] t) -> bit { rx(t) a; return 1; }");
        let Statement::Def { name, params, returns, body } = &stmts[0] else {
            panic!("expected def");
        };
        assert_eq!(name, "flip");
        assert_eq!(params.len(), 2);
        assert_eq!(returns, &Some(Type::Bit(None)));
        assert_eq!(body.len(), 2);
    }

    #[test]
    fn test_parse_error_reports_line() {
        let err = parse_program("qubit q;\nh q[0;\n").unwrap_err();
        assert!(matches!(err, CompileError::Syntax { line: 2, .. }));
        assert!(err.is_structural());
    }

    #[test]
    fn test_qasm2_declaration_is_syntax_error() {
        let err = parse_program("OPENQASM 2.0;\nqreg q[2];").unwrap_err();
        assert!(matches!(err, CompileError::Syntax { line: 2, .. }));
    }

    #[test]
    fn test_nesting_limit() {
        let nest = |n: usize| format!("{}h q;{}", "if (true) { ".repeat(n), "}".repeat(n));
        assert!(parse_program(&nest(MAX_NESTING_DEPTH - 1)).is_ok());

        let err = parse_program(&nest(20_000)).unwrap_err();
        assert!(matches!(err, CompileError::Structural { line: 1, .. }));
    }

    #[test]
    fn test_unbraced_bodies_count_as_nesting() {
        let source = format!("{}h q;", "for i in [0:1] ".repeat(20_000));
        assert!(parse_program(&source).unwrap_err().is_structural());
    }

    #[test]
    fn test_expression_nesting_limit() {
        let parens = |n: usize| format!("rx({}1{}) q;", "(".repeat(n), ")".repeat(n));
        assert!(parse_program(&parens(64)).is_ok());
        assert!(parse_program(&parens(100_000)).unwrap_err().is_structural());

        let negations = format!("rx({}1) q;", "-".repeat(100_000));
        assert!(parse_program(&negations).unwrap_err().is_structural());

        let indices = format!("h q[{}0{}];", "a[".repeat(100_000), "]".repeat(100_000));
        assert!(parse_program(&indices).unwrap_err().is_structural());
    }

    #[test]
    fn test_unexpected_eof() {
        let err = parse_program("qubit[2] q;\nh q[0]").unwrap_err();
        assert!(matches!(err, CompileError::UnexpectedEof(_)));
    }
}
