//! Runs the `qasmlab` binary against temporary source and config files.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

const BELL: &str = "OPENQASM 3.0;\ninclude \"stdgates.inc\";\nqubit[2] q;\nbit[2] c;\nh q[0];\ncx q[0], q[1];\nmeasure q -> c;\n";

struct Workspace {
    dir: TempDir,
    config: PathBuf,
}

impl Workspace {
    fn new(config: &str) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, config).unwrap();
        Self { dir, config: path }
    }

    fn file(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    fn run(&self, args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_qasmlab"))
            .args(args)
            .arg("--config")
            .arg(&self.config)
            .env_remove("QASMLAB_SHOTS")
            .env_remove("QASMLAB_SEED")
            .env_remove("QASMLAB_MAX_QUBITS")
            .env_remove("QASMLAB_LOG")
            .env_remove("RUST_LOG")
            .output()
            .unwrap()
    }
}

fn arg(path: &Path) -> &str {
    path.to_str().unwrap()
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

// ============================================================================
// compile
// ============================================================================

#[test]
fn test_compile_json_report() {
    let ws = Workspace::new("");
    let input = ws.file("bell.qasm", BELL);
    let output = ws.run(&["compile", arg(&input), "--format", "json"]);
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(report["num_qubits"], 2);
    assert_eq!(report["num_clbits"], 2);
    assert_eq!(report["operations"].as_array().unwrap().len(), 4);
    assert!(report["route"].is_string());
}

#[test]
fn test_compile_structural_only_config() {
    let ws = Workspace::new("compiler:\n  full_parser: false\n  legacy_loader: false\n");
    let input = ws.file("loop.qasm", "qubit[3] q;\nfor i in [0:3] { h q[i]; }\n");
    let output = ws.run(&["compile", arg(&input), "--format", "json"]);
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(report["route"], "structural");
    assert_eq!(report["operations"].as_array().unwrap().len(), 3);
}

#[test]
fn test_compile_writes_emitted_source() {
    let ws = Workspace::new("");
    let input = ws.file("bell.qasm", BELL);
    let target = ws.dir.path().join("flat.qasm");
    let output = ws.run(&["compile", arg(&input), "-o", arg(&target)]);
    assert!(output.status.success());

    let emitted = fs::read_to_string(&target).unwrap();
    assert!(emitted.starts_with("OPENQASM 3.0;"));
    assert!(emitted.contains("cx q[0], q[1];"));
    assert!(emitted.contains("c[1] = measure q[1];"));
}

#[test]
fn test_compile_error_exits_nonzero() {
    let ws = Workspace::new("");
    let input = ws.file("bad.qasm", "qubit[2] q;\nh z[0];\n");
    let output = ws.run(&["compile", arg(&input)]);
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Error:"));
    assert!(stderr.contains("Unknown symbol 'z'"));
}

#[test]
fn test_missing_input_file() {
    let ws = Workspace::new("");
    let output = ws.run(&["compile", "/nonexistent/input.qasm"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("File not found"));
}

// ============================================================================
// run
// ============================================================================

#[test]
fn test_run_json_counts() {
    let ws = Workspace::new("simulation:\n  seed: 42\n");
    let input = ws.file("bell.qasm", BELL);
    let output = ws.run(&["run", arg(&input), "--shots", "100", "--format", "json"]);
    assert!(output.status.success());

    let result: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(result["shots"], 100);
    assert_eq!(result["num_qubits"], 2);
    let counts = result["counts"].as_object().unwrap();
    assert!(counts.keys().all(|k| k == "00" || k == "11"));
    let total: u64 = counts.values().map(|v| v.as_u64().unwrap()).sum();
    assert_eq!(total, 100);
}

#[test]
fn test_run_shots_from_config() {
    let ws = Workspace::new("simulation:\n  shots: 37\n");
    let input = ws.file("x.qasm", "qubit[2] q;\nbit[2] c;\nx q[0];\nmeasure q -> c;\n");
    let output = ws.run(&["run", arg(&input), "--format", "json"]);
    assert!(output.status.success());

    let result: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(result["shots"], 37);
    assert_eq!(result["counts"]["01"], 37);
}

#[test]
fn test_run_without_measurement_fails() {
    let ws = Workspace::new("");
    let input = ws.file("nomeas.qasm", "qubit[1] q;\nh q[0];\n");
    let output = ws.run(&["run", arg(&input), "--format", "json"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Simulation failed"));
}

#[test]
fn test_run_respects_max_qubits() {
    let ws = Workspace::new("simulation:\n  max_qubits: 1\n");
    let input = ws.file("bell.qasm", BELL);
    let output = ws.run(&["run", arg(&input), "--format", "json"]);
    assert_eq!(output.status.code(), Some(1));
}

// ============================================================================
// check / convert / version
// ============================================================================

#[test]
fn test_check_reports_undeclared_register() {
    let ws = Workspace::new("");
    let input = ws.file("early.qasm", "h q[0];\nqubit[1] q;\n");
    let output = ws.run(&["check", arg(&input)]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("Qubit 'q' used before declaration"));
}

#[test]
fn test_convert_to_stdout() {
    let ws = Workspace::new("");
    let input = ws.file("bell.qasm", BELL);
    let output = ws.run(&["convert", arg(&input)]);
    assert!(output.status.success());

    let text = stdout(&output);
    assert!(text.starts_with("OPENQASM 2.0;"));
    assert!(text.contains("qreg q[2];"));
    assert!(text.contains("measure q[1] -> c[1];"));
}

#[test]
fn test_bad_config_file() {
    let ws = Workspace::new("simulation:\n  shots: many\n");
    let output = ws.run(&["version"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Invalid config"));
}

#[test]
fn test_version() {
    let ws = Workspace::new("");
    let output = ws.run(&["version"]);
    assert!(output.status.success());
    assert!(stdout(&output).contains(env!("CARGO_PKG_VERSION")));
}
