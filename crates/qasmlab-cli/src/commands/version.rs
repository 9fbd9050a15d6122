//! Version command implementation.

use console::style;

use qasmlab_qasm3::Capabilities;

/// Execute the version command.
pub fn execute() {
    let version = env!("CARGO_PKG_VERSION");

    println!(
        "{} {} - OpenQASM 3 compiler and statevector simulator",
        style("qasmlab").cyan().bold(),
        style(format!("v{version}")).yellow()
    );
    println!();
    println!("Components:");
    println!("  qasmlab-ir           Circuit program representation");
    println!("  qasmlab-qasm3        Parser, expander, resolver and fallback");
    println!("  qasmlab-hal          Engine interface and orchestrator");
    println!("  qasmlab-adapter-sim  Statevector engine");
    println!();

    let caps = Capabilities::detect();
    let flag = |on: bool| if on { style("yes").green() } else { style("no").dim() };
    println!("Routes:");
    println!("  full parser    {}", flag(caps.full_parser));
    println!("  legacy loader  {}", flag(caps.legacy_loader));
    println!();
    println!("License: {}", style("Apache-2.0").dim());
}
