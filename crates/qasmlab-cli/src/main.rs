//! qasmlab command-line interface
//!
//! ```text
//! qasmlab compile bell.qasm --emit
//! qasmlab run bell.qasm --shots 2000 --seed 7
//! qasmlab check bell.qasm
//! qasmlab convert bell.qasm -o bell2.qasm
//! ```

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use console::style;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;

use commands::common::OutputFormat;
use commands::{check, compile, convert, run, version};
use config::Config;

/// qasmlab - compile OpenQASM 3 into circuits and simulate them
#[derive(Parser)]
#[command(name = "qasmlab")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Configuration file (default: ~/.qasmlab/config.yaml)
    #[arg(long, global = true, env = "QASMLAB_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a source file and summarize the circuit
    Compile {
        /// Input file (OpenQASM 3, or 2.0 via the fallback route)
        input: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,

        /// Print the compiled circuit as flat OpenQASM 3
        #[arg(long)]
        emit: bool,

        /// Write the compiled circuit as flat OpenQASM 3
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Compile and simulate a source file
    Run {
        /// Input file
        input: PathBuf,

        /// Number of shots (default from config)
        #[arg(short, long)]
        shots: Option<u32>,

        /// Sampling seed for repeatable counts
        #[arg(long)]
        seed: Option<u64>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Report registers used before they are declared
    Check {
        /// Input file
        input: PathBuf,
    },

    /// Rewrite a source into OpenQASM 2.0
    Convert {
        /// Input file
        input: PathBuf,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show version information
    Version,
}

fn init_logging(verbose: u8, configured: Option<&str>) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(configured.unwrap_or("warn"))),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn dispatch(command: Commands, config: &Config) -> anyhow::Result<()> {
    match command {
        Commands::Compile {
            input,
            format,
            emit,
            output,
        } => compile::execute(&input, format, emit, output.as_deref(), config),

        Commands::Run {
            input,
            shots,
            seed,
            format,
        } => run::execute(&input, shots, seed, format, config).await,

        Commands::Check { input } => check::execute(&input, config),

        Commands::Convert { input, output } => convert::execute(&input, output.as_deref()),

        Commands::Version => {
            version::execute();
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let result = match Config::load(cli.config.as_deref()) {
        Ok(config) => {
            init_logging(cli.verbose, config.log_level.as_deref());
            dispatch(cli.command, &config).await
        }
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        eprintln!("{} {:#}", style("Error:").red().bold(), e);
        std::process::exit(1);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_compile_args() {
        let cli = Cli::try_parse_from([
            "qasmlab", "compile", "bell.qasm", "--format", "json", "--emit", "-o", "out.qasm",
        ])
        .unwrap();
        match cli.command {
            Commands::Compile {
                input,
                format,
                emit,
                output,
            } => {
                assert_eq!(input, PathBuf::from("bell.qasm"));
                assert_eq!(format, OutputFormat::Json);
                assert!(emit);
                assert_eq!(output, Some(PathBuf::from("out.qasm")));
            }
            _ => panic!("expected compile"),
        }
    }

    #[test]
    fn test_run_defaults_come_from_config() {
        let cli = Cli::try_parse_from(["qasmlab", "run", "bell.qasm"]).unwrap();
        match cli.command {
            Commands::Run {
                shots,
                seed,
                format,
                ..
            } => {
                assert_eq!(shots, None);
                assert_eq!(seed, None);
                assert_eq!(format, OutputFormat::Text);
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn test_run_with_shots_and_seed() {
        let cli =
            Cli::try_parse_from(["qasmlab", "run", "x.qasm", "-s", "100", "--seed", "3"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Run {
                shots: Some(100),
                seed: Some(3),
                ..
            }
        ));
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli =
            Cli::try_parse_from(["qasmlab", "check", "a.qasm", "-vv", "--config", "c.yaml"])
                .unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.config, Some(PathBuf::from("c.yaml")));
        assert!(matches!(cli.command, Commands::Check { .. }));
    }

    #[test]
    fn test_missing_input_rejected() {
        assert!(Cli::try_parse_from(["qasmlab", "compile"]).is_err());
        assert!(Cli::try_parse_from(["qasmlab", "run", "a.qasm", "--format", "xml"]).is_err());
        assert!(Cli::try_parse_from(["qasmlab"]).is_err());
    }

    #[test]
    fn test_version_subcommand() {
        let cli = Cli::try_parse_from(["qasmlab", "version"]).unwrap();
        assert!(matches!(cli.command, Commands::Version));
    }
}
