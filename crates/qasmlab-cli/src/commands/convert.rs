//! Convert command implementation.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use console::style;

use qasmlab_qasm3::convert_to_qasm2;

use super::common::load_source;

/// Execute the convert command: rewrite a source into `OpenQASM` 2.0.
pub fn execute(input: &Path, output: Option<&Path>) -> Result<()> {
    let source = load_source(input)?;
    let converted = convert_to_qasm2(&source);

    match output {
        Some(path) => {
            fs::write(path, &converted)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!(
                "{} Wrote {}",
                style("✓").green().bold(),
                style(path.display()).green()
            );
        }
        None => print!("{converted}"),
    }
    Ok(())
}
