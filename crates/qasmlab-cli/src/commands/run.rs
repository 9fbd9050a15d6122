//! Run command implementation.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use qasmlab_adapter_sim::StatevectorEngine;
use qasmlab_hal::Orchestrator;

use super::common::{OutputFormat, compiler, load_source, print_results};
use crate::config::Config;

/// Execute the run command.
pub async fn execute(
    input: &Path,
    shots: Option<u32>,
    seed: Option<u64>,
    format: OutputFormat,
    config: &Config,
) -> Result<()> {
    let shots = shots.unwrap_or(config.simulation.shots);
    let seed = seed.or(config.simulation.seed);
    let text = format == OutputFormat::Text;

    if text {
        println!(
            "{} Running {} ({} shots)",
            style("→").cyan().bold(),
            style(input.display()).green(),
            shots
        );
    }

    let source = load_source(input)?;
    let out = compiler(config)
        .compile_with_report(&source)
        .with_context(|| format!("Failed to compile {}", input.display()))?;
    if text {
        println!(
            "  Compiled via {} route: {} qubits, {} ops",
            style(out.route).yellow(),
            out.program.num_qubits(),
            out.program.len()
        );
    }

    let mut engine = StatevectorEngine::new().with_max_qubits(config.simulation.max_qubits);
    if let Some(seed) = seed {
        engine = engine.with_seed(seed);
    }
    let orchestrator = Orchestrator::new(engine);

    let spinner = if text {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .context("Invalid progress template")?,
        );
        spinner.set_message("Simulating...");
        spinner.enable_steady_tick(Duration::from_millis(100));
        Some(spinner)
    } else {
        None
    };

    let result = orchestrator.simulate(out.program, shots).await;
    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }
    let result = result.context("Simulation failed")?;

    match format {
        OutputFormat::Text => print_results(&result),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
    }

    Ok(())
}
