use std::path::PathBuf;
use std::process::{Command, Output};

fn get_binary_path() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_divmagic"))
}

fn run(args: &[&str]) -> Output {
    Command::new(get_binary_path())
        .args(args)
        .output()
        .expect("Failed to execute divmagic")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn debug_info(output: &Output) -> String {
    format!(
        "status: {:?}\nstderr: {}\nstdout: {}",
        output.status,
        String::from_utf8_lossy(&output.stderr),
        String::from_utf8_lossy(&output.stdout)
    )
}

#[test]
fn test_search_finds_verified_solutions() {
    let output = run(&[
        "search",
        "9",
        "--width",
        "8",
        "-j",
        "2",
        "--partitions-per-worker",
        "4",
        "--stats",
    ]);
    assert_eq!(output.status.code(), Some(0), "{}", debug_info(&output));

    let stdout = stdout(&output);
    assert!(stdout.contains("Verified solutions (3):"), "{}", stdout);
    assert!(stdout.contains("multiplier=57, shift=9"));
    assert!(stdout.contains("multiplier=114, shift=10"));
    assert!(stdout.contains("multiplier=228, shift=11"));
    assert!(stdout.contains("Search Statistics:"));
    assert!(stdout.contains("Partitions: 8"));
}

#[test]
fn test_search_accepts_hex_divisor() {
    let output = run(&["search", "0x3", "-w", "8", "-j", "1", "--partitions-per-worker", "2"]);
    assert_eq!(output.status.code(), Some(0), "{}", debug_info(&output));
    assert!(stdout(&output).contains("multiplier=171, shift=9"));
}

#[test]
fn test_search_with_fast_path_reports_fallback() {
    let output = run(&[
        "search",
        "9",
        "-w",
        "8",
        "-j",
        "1",
        "--partitions-per-worker",
        "2",
        "--fast-path",
    ]);
    assert_eq!(output.status.code(), Some(0), "{}", debug_info(&output));
    let stdout = stdout(&output);
    assert!(stdout.contains("Fast path: rejected"), "{}", stdout);
    assert!(stdout.contains("Verified solutions"));
}

#[test]
fn test_verify_accepts_known_magic() {
    let output = run(&["verify", "9", "57", "9", "--width", "8"]);
    assert_eq!(output.status.code(), Some(0), "{}", debug_info(&output));
    assert!(stdout(&output).contains("Accepted"));
}

#[test]
fn test_verify_rejects_identity() {
    let output = run(&["verify", "9", "1", "0", "--width", "8", "--no-screen"]);
    assert_eq!(output.status.code(), Some(1), "{}", debug_info(&output));
    let stdout = stdout(&output);
    assert!(stdout.contains("Rejected: x = "), "{}", stdout);
}

#[test]
fn test_verify_rejects_out_of_range_candidate() {
    let output = run(&["verify", "9", "256", "9", "--width", "8"]);
    assert_eq!(output.status.code(), Some(1), "{}", debug_info(&output));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("outside the 8-bit domain"), "{}", stderr);
}

#[test]
fn test_invalid_divisor_is_an_input_error() {
    for divisor in ["0", "1", "256"] {
        let output = run(&["search", divisor, "--width", "8"]);
        assert_eq!(output.status.code(), Some(1), "{}", debug_info(&output));
        let stderr = String::from_utf8_lossy(&output.stderr);
        assert!(stderr.contains("invalid divisor"), "{}", stderr);
    }
}

#[test]
fn test_invalid_width_is_an_input_error() {
    let output = run(&["verify", "3", "1", "0", "--width", "65"]);
    assert_eq!(output.status.code(), Some(1), "{}", debug_info(&output));
    assert!(String::from_utf8_lossy(&output.stderr).contains("invalid width"));
}

#[test]
fn test_scaled_variant_is_rejected() {
    let output = run(&["scaled", "9", "--width", "8"]);
    assert_eq!(output.status.code(), Some(1), "{}", debug_info(&output));
    assert!(stdout(&output).contains("rejected"));
}

#[test]
fn test_formula_prints_smtlib() {
    let output = run(&["formula", "9", "-w", "8", "--min", "0x20", "--max", "0x40"]);
    assert_eq!(output.status.code(), Some(0), "{}", debug_info(&output));

    let stdout = stdout(&output);
    assert!(stdout.contains("(set-logic BV)"));
    assert!(stdout.contains("(declare-const a (_ BitVec 8))"));
    assert!(stdout.contains("(declare-const s (_ BitVec 8))"));
    assert!(stdout.contains("forall"));
    assert!(stdout.contains("(check-sat)"));
}

#[test]
fn test_counterexample_formula_needs_candidate() {
    let output = run(&["formula", "9", "-w", "8", "--kind", "counterexample"]);
    assert_eq!(output.status.code(), Some(1), "{}", debug_info(&output));

    let output = run(&[
        "formula",
        "9",
        "-w",
        "8",
        "--kind",
        "counterexample",
        "--multiplier",
        "57",
        "--shift",
        "9",
    ]);
    assert_eq!(output.status.code(), Some(0), "{}", debug_info(&output));
    assert!(stdout(&output).contains("(declare-const x (_ BitVec 8))"));
}

#[test]
fn test_search_without_solution_exits_with_failure() {
    let output = run(&["search", "7", "-w", "8", "-j", "1", "--partitions-per-worker", "2"]);
    assert_eq!(output.status.code(), Some(1), "{}", debug_info(&output));
    assert!(stdout(&output).contains("No solution found in explored space."));
}
