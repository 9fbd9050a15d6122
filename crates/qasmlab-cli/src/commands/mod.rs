//! CLI command implementations.

pub mod check;
pub mod common;
pub mod compile;
pub mod convert;
pub mod run;
pub mod version;
