//! Abstract Syntax Tree for `OpenQASM` 3.
//!
//! Every statement carries the 1-based source line it started on. The tree
//! renders back to source through [`std::fmt::Display`], which is how an
//! expanded program is shown to users.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A complete QASM3 program.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Program {
    /// QASM version (e.g., "3.0"), if the header is present.
    pub version: Option<String>,
    /// Statements in the program.
    pub statements: Block,
}

/// A node tagged with the line it starts on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spanned<T> {
    pub node: T,
    pub line: usize,
}

impl<T> Spanned<T> {
    pub fn new(node: T, line: usize) -> Self {
        Self { node, line }
    }
}

/// A sequence of statements.
pub type Block = Vec<Spanned<Statement>>;

/// A statement in a QASM3 program.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Statement {
    /// Include statement.
    Include(String),

    /// Qubit declaration: `qubit[n] name;` or `qubit name;`
    QubitDecl { name: String, size: Option<u32> },

    /// Classical bit declaration: `bit[n] name;` or `bit name;`
    BitDecl { name: String, size: Option<u32> },

    /// Free parameter: `input float[64] theta;`
    InputDecl { ty: Type, name: String },

    /// Classical variable: `int[32] n = 4;`, `const float x = 0.5;`
    ClassicalDecl {
        ty: Type,
        name: String,
        init: Option<Expression>,
        is_const: bool,
    },

    /// Gate application.
    Gate(GateCall),

    /// Measurement: `measure q -> c;`, `c = measure q;` or `measure q;`
    Measure {
        qubits: Vec<Operand>,
        bits: Vec<Operand>,
    },

    /// Reset: `reset q;`
    Reset { qubits: Vec<Operand> },

    /// Barrier: `barrier q;`
    Barrier { qubits: Vec<Operand> },

    /// If statement.
    If {
        condition: Expression,
        then_body: Block,
        else_body: Option<Block>,
    },

    /// For loop over `[start:end]` or `[start:step:end]`, end exclusive.
    For {
        variable: String,
        range: Range,
        body: Block,
    },

    /// While loop.
    While { condition: Expression, body: Block },

    /// Gate definition.
    GateDef {
        name: String,
        params: Vec<String>,
        qubits: Vec<String>,
        body: Block,
    },

    /// Subroutine definition.
    Def {
        name: String,
        params: Vec<DefParam>,
        returns: Option<Type>,
        body: Block,
    },

    /// Classical assignment.
    Assignment {
        target: String,
        index: Option<Expression>,
        op: AssignOp,
        value: Expression,
    },

    /// Return from a subroutine.
    Return(Option<Expression>),

    /// Placeholder left where a conditional was removed.
    Skipped,
}

impl Statement {
    /// Short name of the construct, used in diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Statement::Include(_) => "include",
            Statement::QubitDecl { .. } => "qubit declaration",
            Statement::BitDecl { .. } => "bit declaration",
            Statement::InputDecl { .. } => "input declaration",
            Statement::ClassicalDecl { .. } => "classical declaration",
            Statement::Gate(_) => "gate call",
            Statement::Measure { .. } => "measure",
            Statement::Reset { .. } => "reset",
            Statement::Barrier { .. } => "barrier",
            Statement::If { .. } => "if",
            Statement::For { .. } => "for",
            Statement::While { .. } => "while",
            Statement::GateDef { .. } => "gate definition",
            Statement::Def { .. } => "def",
            Statement::Assignment { .. } => "assignment",
            Statement::Return(_) => "return",
            Statement::Skipped => "skipped conditional",
        }
    }
}

/// Declared type of a variable or subroutine parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Type {
    Qubit(Option<u32>),
    Bit(Option<u32>),
    Int(Option<u32>),
    Uint(Option<u32>),
    Float(Option<u32>),
    Angle(Option<u32>),
    Bool,
}

/// A subroutine parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefParam {
    pub ty: Type,
    pub name: String,
}

/// Assignment operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssignOp {
    Assign,
    Add,
    Sub,
    Mul,
    Div,
}

/// A gate call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateCall {
    /// Gate name as written.
    pub name: String,
    /// Gate parameters (angles, etc.).
    pub params: Vec<Expression>,
    /// Operands the gate acts on.
    pub qubits: Vec<Operand>,
    /// Modifiers (ctrl, inv, pow), outermost first.
    pub modifiers: Vec<GateModifier>,
}

/// Gate modifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GateModifier {
    /// Control modifier: `ctrl @ gate`
    Ctrl(Option<Expression>),
    /// Negated control: `negctrl @ gate`
    NegCtrl(Option<Expression>),
    /// Inverse: `inv @ gate`
    Inv,
    /// Power: `pow(n) @ gate`
    Pow(Expression),
}

/// Reference to a register (`q`) or one of its elements (`q[i]`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operand {
    pub register: String,
    pub index: Option<Expression>,
}

impl Operand {
    /// Reference a single element.
    pub fn indexed(register: impl Into<String>, index: i64) -> Self {
        Self {
            register: register.into(),
            index: Some(Expression::Int(index)),
        }
    }

    /// Reference a whole register.
    pub fn whole(register: impl Into<String>) -> Self {
        Self {
            register: register.into(),
            index: None,
        }
    }
}

/// A range for iteration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Range {
    pub start: Expression,
    pub end: Expression,
    pub step: Option<Expression>,
}

/// An expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expression {
    /// Integer literal.
    Int(i64),
    /// Float literal.
    Float(f64),
    /// Boolean literal.
    Bool(bool),
    /// Identifier.
    Identifier(String),
    /// Pi constant.
    Pi,
    /// Tau constant (2*pi).
    Tau,
    /// Euler's number.
    Euler,
    /// Arithmetic negation.
    Neg(Box<Expression>),
    /// Logical negation.
    Not(Box<Expression>),
    /// Binary operation.
    BinOp {
        left: Box<Expression>,
        op: BinOp,
        right: Box<Expression>,
    },
    /// Function call.
    FnCall { name: String, args: Vec<Expression> },
    /// Index expression: `c[i]`.
    Index {
        name: String,
        index: Box<Expression>,
    },
    /// Parenthesized expression.
    Paren(Box<Expression>),
}

impl Expression {
    /// Try to evaluate as a constant f64.
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Expression::Int(v) => Some(*v as f64),
            Expression::Float(v) => Some(*v),
            Expression::Pi => Some(std::f64::consts::PI),
            Expression::Tau => Some(std::f64::consts::TAU),
            Expression::Euler => Some(std::f64::consts::E),
            Expression::Neg(e) => e.as_f64().map(|v| -v),
            Expression::BinOp { left, op, right } => {
                let l = left.as_f64()?;
                let r = right.as_f64()?;
                Some(match op {
                    BinOp::Add => l + r,
                    BinOp::Sub => l - r,
                    BinOp::Mul => l * r,
                    BinOp::Div => l / r,
                    BinOp::Pow => l.powf(r),
                    BinOp::Mod => l % r,
                    _ => return None,
                })
            }
            Expression::Paren(e) => e.as_f64(),
            _ => None,
        }
    }

    /// Try to evaluate as an integer, using only integer literals.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Expression::Int(v) => Some(*v),
            Expression::Neg(e) => e.as_int()?.checked_neg(),
            Expression::Paren(e) => e.as_int(),
            Expression::BinOp { left, op, right } => {
                let l = left.as_int()?;
                let r = right.as_int()?;
                match op {
                    BinOp::Add => l.checked_add(r),
                    BinOp::Sub => l.checked_sub(r),
                    BinOp::Mul => l.checked_mul(r),
                    BinOp::Div => l.checked_div(r),
                    BinOp::Mod => l.checked_rem(r),
                    BinOp::Pow => u32::try_from(r).ok().and_then(|r| l.checked_pow(r)),
                    BinOp::LShift => u32::try_from(r).ok().and_then(|r| l.checked_shl(r)),
                    BinOp::RShift => u32::try_from(r).ok().and_then(|r| l.checked_shr(r)),
                    _ => None,
                }
            }
            _ => None,
        }
    }

    /// Replace every occurrence of identifier `name` with an integer.
    #[must_use]
    pub fn substitute(&self, name: &str, value: i64) -> Expression {
        let sub = |e: &Expression| Box::new(e.substitute(name, value));
        match self {
            Expression::Identifier(id) if id == name => Expression::Int(value),
            Expression::Neg(e) => Expression::Neg(sub(e)),
            Expression::Not(e) => Expression::Not(sub(e)),
            Expression::Paren(e) => Expression::Paren(sub(e)),
            Expression::BinOp { left, op, right } => Expression::BinOp {
                left: sub(left),
                op: *op,
                right: sub(right),
            },
            Expression::FnCall { name: f, args } => Expression::FnCall {
                name: f.clone(),
                args: args.iter().map(|a| a.substitute(name, value)).collect(),
            },
            Expression::Index { name: n, index } => Expression::Index {
                name: n.clone(),
                index: sub(index),
            },
            other => other.clone(),
        }
    }

    /// Collapse integer-only subexpressions into literals.
    #[must_use]
    pub fn fold(&self) -> Expression {
        if let Some(v) = self.as_int() {
            return Expression::Int(v);
        }
        let fold = |e: &Expression| Box::new(e.fold());
        match self {
            Expression::Neg(e) => Expression::Neg(fold(e)),
            Expression::Not(e) => Expression::Not(fold(e)),
            Expression::Paren(e) => match e.fold() {
                // Parentheses around an atom are noise once folded.
                inner @ (Expression::Int(_) | Expression::Identifier(_)) => inner,
                inner => Expression::Paren(Box::new(inner)),
            },
            Expression::BinOp { left, op, right } => Expression::BinOp {
                left: fold(left),
                op: *op,
                right: fold(right),
            },
            Expression::FnCall { name, args } => Expression::FnCall {
                name: name.clone(),
                args: args.iter().map(Expression::fold).collect(),
            },
            Expression::Index { name, index } => Expression::Index {
                name: name.clone(),
                index: fold(index),
            },
            other => other.clone(),
        }
    }

    /// First identifier referenced by the expression, in source order.
    pub fn first_identifier(&self) -> Option<&str> {
        match self {
            Expression::Identifier(id) => Some(id.as_str()),
            Expression::Index { name, .. } => Some(name.as_str()),
            Expression::Neg(e) | Expression::Not(e) | Expression::Paren(e) => e.first_identifier(),
            Expression::BinOp { left, right, .. } => {
                left.first_identifier().or_else(|| right.first_identifier())
            }
            Expression::FnCall { args, .. } => args.iter().find_map(Expression::first_identifier),
            _ => None,
        }
    }

    /// Visit every identifier name referenced by the expression.
    pub fn for_each_identifier<'a>(&'a self, f: &mut impl FnMut(&'a str)) {
        match self {
            Expression::Identifier(id) => f(id.as_str()),
            Expression::Index { name, index } => {
                f(name.as_str());
                index.for_each_identifier(f);
            }
            Expression::Neg(e) | Expression::Not(e) | Expression::Paren(e) => {
                e.for_each_identifier(f);
            }
            Expression::BinOp { left, right, .. } => {
                left.for_each_identifier(f);
                right.for_each_identifier(f);
            }
            Expression::FnCall { args, .. } => {
                for a in args {
                    a.for_each_identifier(f);
                }
            }
            _ => {}
        }
    }
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    And,
    Or,
    BitAnd,
    BitOr,
    BitXor,
    LShift,
    RShift,
}

impl BinOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Mod => "%",
            BinOp::Pow => "**",
            BinOp::Eq => "==",
            BinOp::NotEq => "!=",
            BinOp::Lt => "<",
            BinOp::LtEq => "<=",
            BinOp::Gt => ">",
            BinOp::GtEq => ">=",
            BinOp::And => "&&",
            BinOp::Or => "||",
            BinOp::BitAnd => "&",
            BinOp::BitOr => "|",
            BinOp::BitXor => "^",
            BinOp::LShift => "<<",
            BinOp::RShift => ">>",
        }
    }
}

// ============================================================================
// Source rendering
// ============================================================================

/// Write a nested binary operation in parentheses so precedence survives.
fn fmt_operand(f: &mut fmt::Formatter<'_>, e: &Expression) -> fmt::Result {
    match e {
        Expression::BinOp { .. } => write!(f, "({e})"),
        _ => write!(f, "{e}"),
    }
}

fn join<T: fmt::Display>(items: &[T]) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Int(v) => write!(f, "{v}"),
            Expression::Float(v) => write!(f, "{v:?}"),
            Expression::Bool(b) => write!(f, "{b}"),
            Expression::Identifier(id) => write!(f, "{id}"),
            Expression::Pi => write!(f, "pi"),
            Expression::Tau => write!(f, "tau"),
            Expression::Euler => write!(f, "euler"),
            Expression::Neg(e) => {
                write!(f, "-")?;
                fmt_operand(f, e)
            }
            Expression::Not(e) => {
                write!(f, "!")?;
                fmt_operand(f, e)
            }
            Expression::BinOp { left, op, right } => {
                fmt_operand(f, left)?;
                write!(f, " {} ", op.symbol())?;
                fmt_operand(f, right)
            }
            Expression::FnCall { name, args } => write!(f, "{name}({})", join(args)),
            Expression::Index { name, index } => write!(f, "{name}[{index}]"),
            Expression::Paren(e) => write!(f, "({e})"),
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.index {
            Some(index) => write!(f, "{}[{index}]", self.register),
            None => write!(f, "{}", self.register),
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (name, width) = match self {
            Type::Qubit(w) => ("qubit", w),
            Type::Bit(w) => ("bit", w),
            Type::Int(w) => ("int", w),
            Type::Uint(w) => ("uint", w),
            Type::Float(w) => ("float", w),
            Type::Angle(w) => ("angle", w),
            Type::Bool => return write!(f, "bool"),
        };
        match width {
            Some(w) => write!(f, "{name}[{w}]"),
            None => write!(f, "{name}"),
        }
    }
}

impl fmt::Display for GateModifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GateModifier::Ctrl(None) => write!(f, "ctrl"),
            GateModifier::Ctrl(Some(n)) => write!(f, "ctrl({n})"),
            GateModifier::NegCtrl(None) => write!(f, "negctrl"),
            GateModifier::NegCtrl(Some(n)) => write!(f, "negctrl({n})"),
            GateModifier::Inv => write!(f, "inv"),
            GateModifier::Pow(e) => write!(f, "pow({e})"),
        }
    }
}

impl fmt::Display for GateCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for m in &self.modifiers {
            write!(f, "{m} @ ")?;
        }
        write!(f, "{}", self.name)?;
        if !self.params.is_empty() {
            write!(f, "({})", join(&self.params))?;
        }
        write!(f, " {};", join(&self.qubits))
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.step {
            Some(step) => write!(f, "[{}:{step}:{}]", self.start, self.end),
            None => write!(f, "[{}:{}]", self.start, self.end),
        }
    }
}

impl fmt::Display for AssignOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AssignOp::Assign => "=",
            AssignOp::Add => "+=",
            AssignOp::Sub => "-=",
            AssignOp::Mul => "*=",
            AssignOp::Div => "/=",
        };
        write!(f, "{s}")
    }
}

fn write_block(f: &mut fmt::Formatter<'_>, block: &Block, indent: usize) -> fmt::Result {
    writeln!(f, "{{")?;
    for stmt in block {
        write_statement(f, &stmt.node, indent + 1)?;
    }
    write!(f, "{:width$}}}", "", width = indent * 4)
}

fn write_statement(f: &mut fmt::Formatter<'_>, stmt: &Statement, indent: usize) -> fmt::Result {
    write!(f, "{:width$}", "", width = indent * 4)?;
    match stmt {
        Statement::Include(path) => write!(f, "include \"{path}\";")?,
        Statement::QubitDecl { name, size } => write!(f, "{} {name};", Type::Qubit(*size))?,
        Statement::BitDecl { name, size } => write!(f, "{} {name};", Type::Bit(*size))?,
        Statement::InputDecl { ty, name } => write!(f, "input {ty} {name};")?,
        Statement::ClassicalDecl {
            ty,
            name,
            init,
            is_const,
        } => {
            if *is_const {
                write!(f, "const ")?;
            }
            match init {
                Some(init) => write!(f, "{ty} {name} = {init};")?,
                None => write!(f, "{ty} {name};")?,
            }
        }
        Statement::Gate(call) => write!(f, "{call}")?,
        Statement::Measure { qubits, bits } => {
            if bits.is_empty() {
                write!(f, "measure {};", join(qubits))?;
            } else {
                write!(f, "measure {} -> {};", join(qubits), join(bits))?;
            }
        }
        Statement::Reset { qubits } => write!(f, "reset {};", join(qubits))?,
        Statement::Barrier { qubits } if qubits.is_empty() => write!(f, "barrier;")?,
        Statement::Barrier { qubits } => write!(f, "barrier {};", join(qubits))?,
        Statement::If {
            condition,
            then_body,
            else_body,
        } => {
            write!(f, "if ({condition}) ")?;
            write_block(f, then_body, indent)?;
            if let Some(else_body) = else_body {
                write!(f, " else ")?;
                write_block(f, else_body, indent)?;
            }
        }
        Statement::For {
            variable,
            range,
            body,
        } => {
            write!(f, "for int {variable} in {range} ")?;
            write_block(f, body, indent)?;
        }
        Statement::While { condition, body } => {
            write!(f, "while ({condition}) ")?;
            write_block(f, body, indent)?;
        }
        Statement::GateDef {
            name,
            params,
            qubits,
            body,
        } => {
            write!(f, "gate {name}")?;
            if !params.is_empty() {
                write!(f, "({})", params.join(", "))?;
            }
            write!(f, " {} ", qubits.join(", "))?;
            write_block(f, body, indent)?;
        }
        Statement::Def {
            name,
            params,
            returns,
            body,
        } => {
            let params: Vec<String> = params.iter().map(|p| format!("{} {}", p.ty, p.name)).collect();
            write!(f, "def {name}({})", params.join(", "))?;
            if let Some(ty) = returns {
                write!(f, " -> {ty}")?;
            }
            write!(f, " ")?;
            write_block(f, body, indent)?;
        }
        Statement::Assignment {
            target,
            index,
            op,
            value,
        } => match index {
            Some(index) => write!(f, "{target}[{index}] {op} {value};")?,
            None => write!(f, "{target} {op} {value};")?,
        },
        Statement::Return(Some(value)) => write!(f, "return {value};")?,
        Statement::Return(None) => write!(f, "return;")?,
        Statement::Skipped => write!(f, "// conditional statement skipped")?,
    }
    writeln!(f)
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_statement(f, self, 0)
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(version) = &self.version {
            writeln!(f, "OPENQASM {version};")?;
        }
        for stmt in &self.statements {
            write_statement(f, &stmt.node, 0)?;
        }
        Ok(())
    }
}
