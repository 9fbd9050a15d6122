//! Global qubit and classical bit indices.
//!
//! Register-relative references (`q[1]`, `c[0]`) are resolved to these flat
//! indices before a program is built. Qubit registers and bit registers are
//! numbered independently, each starting at zero.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Global index of a qubit within a program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct QubitId(pub u32);

impl QubitId {
    /// The index as a `usize`, for addressing state vectors and bit masks.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for QubitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "q{}", self.0)
    }
}

impl From<u32> for QubitId {
    fn from(id: u32) -> Self {
        QubitId(id)
    }
}

/// Global index of a classical bit within a program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ClbitId(pub u32);

impl ClbitId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ClbitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "c{}", self.0)
    }
}

impl From<u32> for ClbitId {
    fn from(id: u32) -> Self {
        ClbitId(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qubit_display() {
        assert_eq!(QubitId(0).to_string(), "q0");
        assert_eq!(QubitId(7).index(), 7);
    }

    #[test]
    fn test_clbit_display() {
        assert_eq!(ClbitId(3).to_string(), "c3");
        assert_eq!(ClbitId::from(2).index(), 2);
    }
}
