use std::env;
use std::fs;
use std::path::PathBuf;
use std::process::Command;
use std::time::{SystemTime, UNIX_EPOCH};

fn write_temp_gedcom(contents: &str) -> PathBuf {
    let mut path = env::temp_dir();
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let filename = format!("gedgraph_cli_test_{}_{}.ged", std::process::id(), nanos);
    path.push(filename);
    fs::write(&path, contents).expect("write temp gedcom");
    path
}

fn run_cli(args: &[&str]) -> std::process::Output {
    let exe = env!("CARGO_BIN_EXE_gedgraph");
    Command::new(exe)
        .args(args)
        .output()
        .expect("run gedgraph binary")
}

#[test]
fn validate_lenient_outputs_report_only() {
    let sample = "0 @I1@ INDI\n1 NAME Jane /Doe/\n0 TRLR";
    let path = write_temp_gedcom(sample);

    let output = run_cli(&["--validate", path.to_str().unwrap()]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Validation: lenient - errors: 0, warnings: 0"));
}

#[test]
fn validate_strict_reports_a_dangling_reference_warning() {
    let sample = "0 @F1@ FAM\n1 HUSB @I999@\n0 TRLR";
    let path = write_temp_gedcom(sample);

    let output = run_cli(&[
        "--validate",
        "--validation-level",
        "strict",
        path.to_str().unwrap(),
    ]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("dangling HUSB reference: @I999@"));
}

#[test]
fn validation_level_requires_validate_flag() {
    let sample = "0 @I1@ INDI\n0 TRLR";
    let path = write_temp_gedcom(sample);

    let output = run_cli(&["--validation-level", "strict", path.to_str().unwrap()]);

    assert_eq!(output.status.code(), Some(3));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("requires --validate"));
}

#[test]
fn missing_filename_is_a_usage_error() {
    let output = run_cli(&[]);
    assert_eq!(output.status.code(), Some(3));
}

#[test]
fn stats_reports_graph_summary() {
    let sample = "0 @I1@ INDI\n1 NAME A\n1 FAMS @F1@\n0 @I2@ INDI\n1 NAME B\n1 FAMC @F1@\n\
0 @F1@ FAM\n1 HUSB @I1@\n1 CHIL @I2@\n0 TRLR";
    let path = write_temp_gedcom(sample);

    let output = run_cli(&["--stats", path.to_str().unwrap()]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("nodes: 2"));
}
