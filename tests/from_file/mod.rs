//! Integration tests running the crate binary on the files in `tests/data/`.

use std::path::PathBuf;
use std::process::Command;

use serde_json::Value;

#[test]
fn prints_csv_rows_as_json() {
    let expected = std::fs::read_to_string(fixture_path("products_expected.json"))
        .expect("failed to read expected output fixture");

    let output = Command::new(env!("CARGO_BIN_EXE_data-fixtures"))
        .arg(fixture_path("products.csv"))
        .output()
        .expect("failed to execute binary");

    assert!(
        output.status.success(),
        "binary exited with non-zero status.\nstderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8(output.stdout).expect("binary output was not valid UTF-8");

    assert_eq!(parse(&stdout), parse(&expected));
}

#[test]
fn relative_paths_are_resolved_against_the_fixture_directory() {
    let output = Command::new(env!("CARGO_BIN_EXE_data-fixtures"))
        .arg("users.json")
        .env("DATA_FIXTURES_PATH", fixture_path(""))
        .output()
        .expect("failed to execute binary");

    assert!(output.status.success());
    let users = parse(&String::from_utf8_lossy(&output.stdout));
    assert_eq!(users["users"][0]["name"], "Alice");
}

#[test]
fn malformed_file_fails() {
    let output = Command::new(env!("CARGO_BIN_EXE_data-fixtures"))
        .arg(fixture_path("broken.json"))
        .output()
        .expect("failed to execute binary");

    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
}

/// Returns the absolute path to a test fixture file in `tests/data/`.
fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("data")
        .join(name)
}

fn parse(raw: &str) -> Value {
    serde_json::from_str(raw).expect("output is valid JSON")
}
