//! Check command implementation.

use std::path::Path;

use anyhow::{Context, Result};
use console::style;

use super::common::{compiler, load_source};
use crate::config::Config;

/// Execute the check command.
///
/// Findings are reported, not fatal. Fails only if the source does not parse.
pub fn execute(input: &Path, config: &Config) -> Result<()> {
    let source = load_source(input)?;
    let report = compiler(config)
        .validate(&source)
        .with_context(|| format!("Failed to check {}", input.display()))?;

    if report.is_clean() {
        println!(
            "{} {}: no issues found",
            style("✓").green().bold(),
            style(input.display()).green()
        );
    } else {
        println!(
            "{} {}: {} issue(s)",
            style("!").yellow().bold(),
            style(input.display()).green(),
            report.findings.len()
        );
        for finding in &report.findings {
            println!("  line {}: {}", finding.line, finding.message);
        }
    }

    if !report.complete {
        println!("  {}", style("Nesting too deep; check was incomplete").dim());
    }
    if !report.has_measurements {
        println!("  {}", style("No measurements; nothing to simulate").dim());
    }

    Ok(())
}
