//! Compile command implementation.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use console::style;
use serde::Serialize;

use qasmlab_ir::Operation;
use qasmlab_qasm3::{Finding, Route, emit};

use super::common::{OutputFormat, compiler, load_source};
use crate::config::Config;

#[derive(Serialize)]
struct CompileReport<'a> {
    route: Route,
    num_qubits: u32,
    num_clbits: u32,
    parameters: &'a [String],
    operations: &'a [Operation],
    findings: &'a [Finding],
}

/// Execute the compile command.
pub fn execute(
    input: &Path,
    format: OutputFormat,
    print_source: bool,
    output: Option<&Path>,
    config: &Config,
) -> Result<()> {
    let source = load_source(input)?;
    let out = compiler(config)
        .compile_with_report(&source)
        .with_context(|| format!("Failed to compile {}", input.display()))?;
    let program = &out.program;
    let findings = out
        .validation
        .as_ref()
        .map_or(&[][..], |report| report.findings.as_slice());

    if let Some(path) = output {
        fs::write(path, emit(program))
            .with_context(|| format!("Failed to write {}", path.display()))?;
    }

    match format {
        OutputFormat::Json => {
            let report = CompileReport {
                route: out.route,
                num_qubits: program.num_qubits(),
                num_clbits: program.num_clbits(),
                parameters: program.parameters(),
                operations: program.operations(),
                findings,
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Text => {
            println!(
                "{} Compiled {} via {} route",
                style("✓").green().bold(),
                style(input.display()).green(),
                style(out.route).yellow()
            );
            println!(
                "  Result: {} qubits, {} bits, {} ops ({} measurements)",
                program.num_qubits(),
                program.num_clbits(),
                program.len(),
                program.num_measurements()
            );
            if !program.parameters().is_empty() {
                println!("  Parameters: {}", program.parameters().join(", "));
            }
            for (name, count) in program.count_ops() {
                println!("    {name:<8} {count}");
            }
            for finding in findings {
                println!(
                    "  {} line {}: {}",
                    style("warning:").yellow(),
                    finding.line,
                    finding.message
                );
            }
            if let Some(path) = output {
                println!("  Output: {}", style(path.display()).green());
            }
        }
    }

    if print_source {
        print!("{}", emit(program));
    }

    Ok(())
}
