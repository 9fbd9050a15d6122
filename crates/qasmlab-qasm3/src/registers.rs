//! Register declarations and index resolution.

use indexmap::IndexMap;
use qasmlab_ir::{ClbitId, QubitId};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ast::{Block, Statement};
use crate::error::{CompileError, CompileResult};

/// Whether a register holds qubits or classical bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegisterKind {
    Qubit,
    Bit,
}

impl RegisterKind {
    pub fn as_str(self) -> &'static str {
        match self {
            RegisterKind::Qubit => "qubit",
            RegisterKind::Bit => "bit",
        }
    }
}

impl fmt::Display for RegisterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A declared register and its slice of the global index space.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterDecl {
    pub name: String,
    pub kind: RegisterKind,
    pub size: u32,
    pub offset: u32,
}

/// Qubit and bit registers in declaration order.
///
/// Qubit registers occupy contiguous slices of the qubit space in the order
/// they are declared, and bit registers likewise for the bit space. Names
/// are unique per kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegisterTable {
    qubits: IndexMap<String, RegisterDecl>,
    bits: IndexMap<String, RegisterDecl>,
    num_qubits: u32,
    num_clbits: u32,
}

impl RegisterTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect the top-level declarations of a block: all qubit registers
    /// first, then all bit registers.
    pub fn build(statements: &Block) -> CompileResult<Self> {
        let mut table = Self::new();
        for stmt in statements {
            if let Statement::QubitDecl { name, size } = &stmt.node {
                table.declare(RegisterKind::Qubit, name, size.unwrap_or(1), stmt.line)?;
            }
        }
        for stmt in statements {
            if let Statement::BitDecl { name, size } = &stmt.node {
                table.declare(RegisterKind::Bit, name, size.unwrap_or(1), stmt.line)?;
            }
        }
        Ok(table)
    }

    /// Declare a register after the ones already present.
    pub fn declare(
        &mut self,
        kind: RegisterKind,
        name: &str,
        size: u32,
        line: usize,
    ) -> CompileResult<&RegisterDecl> {
        if size == 0 {
            return Err(CompileError::structural(
                line,
                format!("{kind} register '{name}' has size 0"),
            ));
        }

        let (registers, total) = match kind {
            RegisterKind::Qubit => (&mut self.qubits, &mut self.num_qubits),
            RegisterKind::Bit => (&mut self.bits, &mut self.num_clbits),
        };
        if registers.contains_key(name) {
            return Err(CompileError::DuplicateDeclaration {
                name: name.to_string(),
                kind: kind.as_str(),
                line,
            });
        }

        let offset = *total;
        *total = offset.checked_add(size).ok_or_else(|| {
            CompileError::structural(line, format!("{kind} count overflows at register '{name}'"))
        })?;

        let decl = RegisterDecl {
            name: name.to_string(),
            kind,
            size,
            offset,
        };
        Ok(registers.entry(name.to_string()).or_insert(decl))
    }

    pub fn qubit(&self, name: &str) -> Option<&RegisterDecl> {
        self.qubits.get(name)
    }

    pub fn bit(&self, name: &str) -> Option<&RegisterDecl> {
        self.bits.get(name)
    }

    /// Qubit registers in declaration order.
    pub fn qubit_registers(&self) -> impl Iterator<Item = &RegisterDecl> {
        self.qubits.values()
    }

    /// Bit registers in declaration order.
    pub fn bit_registers(&self) -> impl Iterator<Item = &RegisterDecl> {
        self.bits.values()
    }

    pub fn num_qubits(&self) -> u32 {
        self.num_qubits
    }

    pub fn num_clbits(&self) -> u32 {
        self.num_clbits
    }

    /// Look up a register of the given kind, failing on unknown names.
    pub fn lookup(&self, kind: RegisterKind, name: &str, line: usize) -> CompileResult<&RegisterDecl> {
        let found = match kind {
            RegisterKind::Qubit => self.qubit(name),
            RegisterKind::Bit => self.bit(name),
        };
        found.ok_or_else(|| CompileError::UnknownSymbol {
            name: name.to_string(),
            line,
        })
    }

    /// Global qubit index of `name[index]`.
    pub fn resolve_qubit(&self, name: &str, index: i64, line: usize) -> CompileResult<QubitId> {
        let decl = self.lookup(RegisterKind::Qubit, name, line)?;
        decl.global_index(index, line).map(QubitId)
    }

    /// Global bit index of `name[index]`.
    pub fn resolve_bit(&self, name: &str, index: i64, line: usize) -> CompileResult<ClbitId> {
        let decl = self.lookup(RegisterKind::Bit, name, line)?;
        decl.global_index(index, line).map(ClbitId)
    }
}

impl RegisterDecl {
    /// Offset plus `index`, if the index lies in the register.
    pub fn global_index(&self, index: i64, line: usize) -> CompileResult<u32> {
        match u32::try_from(index) {
            Ok(i) if i < self.size => Ok(self.offset + i),
            _ => Err(CompileError::Range {
                register: self.name.clone(),
                index,
                size: self.size,
                line,
            }),
        }
    }

    /// Every global index in the register, in order.
    pub fn indices(&self) -> std::ops::Range<u32> {
        self.offset..self.offset + self.size
    }
}
