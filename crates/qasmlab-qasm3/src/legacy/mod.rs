//! `OpenQASM` 2.0 fallback route.
//!
//! When the structural route cannot take a source apart, the compiler
//! rewrites it into the 2.0 dialect with [`convert_to_qasm2`] and hands the
//! result to a [`LegacyLoader`].

mod convert;
mod loader;

pub use convert::convert_to_qasm2;
pub use loader::{LegacyLoader, Qasm2Loader};
