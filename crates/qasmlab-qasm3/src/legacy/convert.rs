//! Text rewrite from `OpenQASM` 3 to the 2.0 dialect.

use rustc_hash::FxHashMap;

const STDGATES: &str = "stdgates.inc";

/// Rewrite `OpenQASM` 3 source into `OpenQASM` 2.0.
///
/// The header becomes `OPENQASM 2.0;`, `qubit`/`bit` declarations become
/// `qreg`/`creg`, the standard gate include is dropped and whole-register
/// measurements are spelled out per index. Anything else is kept as is,
/// one statement per line. Line comments are dropped and runs of blank
/// lines collapse to one.
pub fn convert_to_qasm2(source: &str) -> String {
    let mut qubit_sizes: FxHashMap<String, u32> = FxHashMap::default();
    let mut out: Vec<String> = Vec::new();

    for raw in source.lines() {
        let line = strip_line_comment(raw);
        if line.trim().is_empty() {
            if out.last().is_some_and(|l| !l.is_empty()) {
                out.push(String::new());
            }
            continue;
        }

        let indent = &line[..line.len() - line.trim_start().len()];
        for piece in line.trim().split_inclusive(';') {
            let piece = piece.trim();
            if piece.is_empty() {
                continue;
            }
            let converted = match piece.strip_suffix(';') {
                Some(stmt) => convert_statement(stmt.trim(), &mut qubit_sizes),
                None => vec![piece.to_string()],
            };
            out.extend(converted.into_iter().map(|s| format!("{indent}{s}")));
        }
    }

    while out.last().is_some_and(String::is_empty) {
        out.pop();
    }
    let mut text = out.join("\n");
    text.push('\n');
    text
}

/// Convert one statement, given without its trailing `;`.
fn convert_statement(stmt: &str, qubit_sizes: &mut FxHashMap<String, u32>) -> Vec<String> {
    if stmt.starts_with("OPENQASM") {
        return vec!["OPENQASM 2.0;".to_string()];
    }
    if let Some(path) = stmt.strip_prefix("include") {
        if path.trim().trim_matches('"') == STDGATES {
            return Vec::new();
        }
    }
    if let Some((size, name)) = declaration(stmt, "qubit") {
        qubit_sizes.insert(name.to_string(), size);
        return vec![format!("qreg {name}[{size}];")];
    }
    if let Some((size, name)) = declaration(stmt, "bit") {
        return vec![format!("creg {name}[{size}];")];
    }
    if let Some((qubits, bits)) = measurement(stmt) {
        return expand_measure(qubits, bits, qubit_sizes);
    }
    vec![format!("{stmt};")]
}

/// `keyword[N] name` or `keyword name`, as `(size, name)`.
fn declaration<'a>(stmt: &'a str, keyword: &str) -> Option<(u32, &'a str)> {
    let rest = stmt.strip_prefix(keyword)?;
    let (size, name) = if let Some(sized) = rest.strip_prefix('[') {
        let (size, name) = sized.split_once(']')?;
        (size.trim().parse().ok()?, name)
    } else if rest.starts_with(char::is_whitespace) {
        (1, rest)
    } else {
        return None;
    };
    let name = name.trim();
    is_identifier(name).then_some((size, name))
}

/// Operands of `measure a -> b` or `b = measure a`.
fn measurement(stmt: &str) -> Option<(&str, &str)> {
    if let Some(rest) = stmt.strip_prefix("measure") {
        let (qubits, bits) = rest.split_once("->")?;
        return Some((qubits.trim(), bits.trim()));
    }
    let (bits, rhs) = stmt.split_once('=')?;
    let qubits = rhs.trim().strip_prefix("measure")?;
    let bits = bits.trim();
    (!bits.is_empty() && !bits.ends_with(['=', '!', '<', '>', '+', '-', '*', '/']))
        .then_some((qubits.trim(), bits))
}

fn expand_measure(qubits: &str, bits: &str, qubit_sizes: &FxHashMap<String, u32>) -> Vec<String> {
    match qubit_sizes.get(qubits) {
        Some(&size) if is_identifier(bits) => (0..size)
            .map(|i| format!("measure {qubits}[{i}] -> {bits}[{i}];"))
            .collect(),
        _ => vec![format!("measure {qubits} -> {bits};")],
    }
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Drop a `//` comment, ignoring slashes inside string literals.
fn strip_line_comment(line: &str) -> &str {
    let mut in_string = false;
    let bytes = line.as_bytes();
    for (i, &b) in bytes.iter().enumerate() {
        match b {
            b'"' => in_string = !in_string,
            b'/' if !in_string && bytes.get(i + 1) == Some(&b'/') => return &line[..i],
            _ => {}
        }
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_and_declarations() {
        let out = convert_to_qasm2(
            "OPENQASM 3.0;\ninclude \"stdgates.inc\";\nqubit[2] q;\nbit[2] c;\nqubit a;\nbit b;\n",
        );
        assert_eq!(
            out,
            "OPENQASM 2.0;\nqreg q[2];\ncreg c[2];\nqreg a[1];\ncreg b[1];\n"
        );
    }

    #[test]
    fn test_other_includes_are_kept() {
        let out = convert_to_qasm2("include \"qelib1.inc\";\n");
        assert_eq!(out, "include \"qelib1.inc\";\n");
    }

    #[test]
    fn test_whole_register_measure_is_expanded() {
        let out = convert_to_qasm2("qubit[3] q;\nbit[3] c;\nmeasure q -> c;\n");
        assert!(out.ends_with(
            "measure q[0] -> c[0];\nmeasure q[1] -> c[1];\nmeasure q[2] -> c[2];\n"
        ));
    }

    #[test]
    fn test_assignment_measure() {
        let out = convert_to_qasm2("qubit[2] q;\nbit[2] c;\nc = measure q;\nc[0] = measure q[1];\n");
        assert!(out.contains("measure q[0] -> c[0];\nmeasure q[1] -> c[1];\n"));
        assert!(out.ends_with("measure q[1] -> c[0];\n"));
    }

    #[test]
    fn test_comparisons_are_not_measurements() {
        let out = convert_to_qasm2("if (c == measure_count) x q[0];");
        assert_eq!(out, "if (c == measure_count) x q[0];\n");
    }

    #[test]
    fn test_comments_and_blank_lines() {
        let out = convert_to_qasm2("// header\n\n\nqreg q[1]; // trailing\n\n\n\nh q[0];\n\n");
        assert_eq!(out, "qreg q[1];\n\nh q[0];\n");
    }

    #[test]
    fn test_statements_split_per_line() {
        let out = convert_to_qasm2("qubit[2] q; h q[0]; cx q[0], q[1];");
        assert_eq!(out, "qreg q[2];\nh q[0];\ncx q[0], q[1];\n");
    }

    #[test]
    fn test_identifier_prefix_is_not_a_declaration() {
        let out = convert_to_qasm2("bits_used q[0];");
        assert_eq!(out, "bits_used q[0];\n");
    }

    #[test]
    fn test_comment_inside_string() {
        assert_eq!(strip_line_comment("include \"a//b\"; // x"), "include \"a//b\"; ");
    }
}
