//! CLI configuration.
//!
//! Sources, highest precedence first: `QASMLAB_*` environment variables,
//! the YAML file (`--config`, else `~/.qasmlab/config.yaml` if present),
//! built-in defaults. Command-line flags override all of these.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use qasmlab_adapter_sim::DEFAULT_MAX_QUBITS;
use qasmlab_qasm3::{Capabilities, CompilerConfig, ExpansionLimits};

pub const DEFAULT_SHOTS: u32 = 1024;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub compiler: CompilerSection,
    pub simulation: SimulationSection,
    /// `EnvFilter` directive used when neither `-v` nor `RUST_LOG` is given.
    pub log_level: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerSection {
    /// Set to `false` to skip the full-grammar route.
    pub full_parser: bool,
    /// Set to `false` to skip the legacy fallback.
    pub legacy_loader: bool,
    pub limits: ExpansionLimits,
}

impl Default for CompilerSection {
    fn default() -> Self {
        Self {
            full_parser: true,
            legacy_loader: true,
            limits: ExpansionLimits::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationSection {
    pub shots: u32,
    pub seed: Option<u64>,
    pub max_qubits: u32,
}

impl Default for SimulationSection {
    fn default() -> Self {
        Self {
            shots: DEFAULT_SHOTS,
            seed: None,
            max_qubits: DEFAULT_MAX_QUBITS,
        }
    }
}

impl Config {
    /// Load the file, then apply the process environment.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut config = match explicit {
            Some(path) => Self::from_file(path)?,
            None => match default_path().filter(|p| p.exists()) {
                Some(path) => Self::from_file(&path)?,
                None => Self::default(),
            },
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            anyhow::bail!("Config file not found: {}", path.display());
        }
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        let config = Self::from_yaml(&text)
            .with_context(|| format!("Invalid config: {}", path.display()))?;
        debug!(path = %path.display(), "Loaded config");
        Ok(config)
    }

    pub fn from_yaml(text: &str) -> Result<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml_ng::from_str(text)?)
    }

    /// Apply `QASMLAB_*` overrides read through `lookup`.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(v) = lookup("QASMLAB_SHOTS") {
            self.simulation.shots = v
                .parse()
                .with_context(|| format!("QASMLAB_SHOTS is not a shot count: '{v}'"))?;
        }
        if let Some(v) = lookup("QASMLAB_SEED") {
            self.simulation.seed = Some(
                v.parse()
                    .with_context(|| format!("QASMLAB_SEED is not a seed: '{v}'"))?,
            );
        }
        if let Some(v) = lookup("QASMLAB_MAX_QUBITS") {
            self.simulation.max_qubits = v
                .parse()
                .with_context(|| format!("QASMLAB_MAX_QUBITS is not a qubit count: '{v}'"))?;
        }
        if let Some(v) = lookup("QASMLAB_LOG") {
            self.log_level = Some(v);
        }
        Ok(())
    }

    /// Compiler settings. Routes missing from this build stay off.
    pub fn compiler_config(&self) -> CompilerConfig {
        CompilerConfig {
            capabilities: Capabilities::detect().restrict(Capabilities {
                full_parser: self.compiler.full_parser,
                legacy_loader: self.compiler.legacy_loader,
            }),
            limits: self.compiler.limits,
        }
    }
}

/// `~/.qasmlab/config.yaml`
pub fn default_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".qasmlab").join("config.yaml"))
}
