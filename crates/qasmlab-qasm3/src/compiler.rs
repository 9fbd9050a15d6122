//! Compiler entry point and route selection.

use qasmlab_ir::CircuitProgram;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::ast::Program;
use crate::capability::Capabilities;
use crate::error::{CompileError, CompileResult};
use crate::expand::{ExpansionLimits, Expander};
use crate::legacy::{LegacyLoader, Qasm2Loader, convert_to_qasm2};
use crate::lower::lower_program;
use crate::parser::parse_program;
use crate::resolve::resolve;
use crate::validate::{ValidationReport, Validator};

/// Compiler configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    pub capabilities: Capabilities,
    pub limits: ExpansionLimits,
}

/// The route that produced a program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Route {
    /// Full-grammar parse and direct lowering.
    Direct,
    /// Expansion, register table and statement resolution.
    Structural,
    /// Conversion to `OpenQASM` 2.0 and the legacy loader.
    Fallback,
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Route::Direct => write!(f, "direct"),
            Route::Structural => write!(f, "structural"),
            Route::Fallback => write!(f, "fallback"),
        }
    }
}

/// A compiled program and how it was produced.
#[derive(Debug, Clone)]
pub struct CompileOutput {
    pub program: CircuitProgram,
    pub route: Route,
    /// Present when the full-grammar parser ran.
    pub validation: Option<ValidationReport>,
}

/// Turns source text into a [`CircuitProgram`].
///
/// Routes are tried in order. With the full parser available the source is
/// parsed, validated and lowered directly; if that declines, the structural
/// route expands control flow and resolves statements. A structural failure
/// falls back to the legacy loader when one is available. Semantic errors
/// from the structural route are final.
pub struct Compiler {
    config: CompilerConfig,
    loader: Box<dyn LegacyLoader + Send + Sync>,
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new(CompilerConfig::default())
    }
}

impl std::fmt::Debug for Compiler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Compiler")
            .field("config", &self.config)
            .field("loader", &self.loader.name())
            .finish()
    }
}

impl Compiler {
    pub fn new(config: CompilerConfig) -> Self {
        Self {
            config,
            loader: Box::new(Qasm2Loader),
        }
    }

    /// Replace the legacy loader.
    #[must_use]
    pub fn with_loader(mut self, loader: impl LegacyLoader + Send + Sync + 'static) -> Self {
        self.loader = Box::new(loader);
        self
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    /// Compile source text into a circuit program.
    pub fn compile(&self, source: &str) -> CompileResult<CircuitProgram> {
        self.compile_with_report(source).map(|out| out.program)
    }

    /// Compile, also reporting the route taken and validator findings.
    #[instrument(skip_all, fields(len = source.len()))]
    pub fn compile_with_report(&self, source: &str) -> CompileResult<CompileOutput> {
        let caps = self.config.capabilities;
        let mut validation = None;

        if caps.full_parser {
            match self.try_direct(source) {
                Ok((program, report)) => {
                    info!(route = %Route::Direct, ops = program.len(), "Compiled");
                    return Ok(CompileOutput {
                        program,
                        route: Route::Direct,
                        validation: Some(report),
                    });
                }
                Err((e, report)) => {
                    debug!(error = %e, "Direct lowering declined, trying structural route");
                    validation = report;
                }
            }
        }

        let primary = match self.try_structural(source) {
            Ok(program) => {
                info!(route = %Route::Structural, ops = program.len(), "Compiled");
                return Ok(CompileOutput {
                    program,
                    route: Route::Structural,
                    validation,
                });
            }
            Err(e) => e,
        };

        if !primary.is_structural() || !caps.legacy_loader {
            return Err(primary);
        }

        debug!(error = %primary, loader = self.loader.name(), "Trying legacy fallback");
        let converted = convert_to_qasm2(source);
        match self.loader.load(&converted) {
            Ok(program) => {
                info!(route = %Route::Fallback, ops = program.len(), "Compiled");
                Ok(CompileOutput {
                    program,
                    route: Route::Fallback,
                    validation,
                })
            }
            Err(fallback) => Err(CompileError::Combined {
                primary: Box::new(primary),
                fallback: Box::new(fallback),
            }),
        }
    }

    /// Run the validator over a source.
    pub fn validate(&self, source: &str) -> CompileResult<ValidationReport> {
        if !self.config.capabilities.full_parser {
            return Err(CompileError::ParseUnavailable);
        }
        Ok(Validator::default().validate(&parse_program(source)?))
    }

    /// Parse and expand a source, without resolving it.
    pub fn expand(&self, source: &str) -> CompileResult<Program> {
        Expander::new(self.config.limits).expand(&parse_program(source)?)
    }

    #[allow(clippy::type_complexity)]
    fn try_direct(
        &self,
        source: &str,
    ) -> Result<(CircuitProgram, ValidationReport), (CompileError, Option<ValidationReport>)> {
        let tree = parse_program(source).map_err(|e| (e, None))?;
        let report = Validator::default().validate(&tree);
        for finding in &report.findings {
            warn!(line = finding.line, symbol = %finding.symbol, "{}", finding.message);
        }
        if !report.complete {
            warn!("Validation stopped at the nesting limit");
        }
        match lower_program(&tree) {
            Ok(program) => Ok((program, report)),
            Err(e) => Err((e, Some(report))),
        }
    }

    fn try_structural(&self, source: &str) -> CompileResult<CircuitProgram> {
        let expanded = self.expand(source)?;
        resolve(&expanded)
    }
}
