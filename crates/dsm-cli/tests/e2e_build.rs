//! E2E tests for `dsm build` / `dsm edges` / `dsm check`.
//!
//! Covers rendering, export formats, exit codes, and the edge-list round trip.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn dsm_cmd(dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("dsm"));
    cmd.current_dir(dir);
    cmd.env("DSM_LOG", "error");
    cmd.env_remove("FORMAT");
    cmd
}

fn write_input(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).expect("write input");
    path
}

fn dataset() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../data/dsm38.txt")
}

fn stdout_of(cmd: &mut Command) -> String {
    let output = cmd.output().expect("dsm should not crash");
    assert!(
        output.status.success(),
        "dsm failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8(output.stdout).expect("utf8 stdout")
}

#[test]
fn build_renders_four_node_scenario() {
    let dir = TempDir::new().expect("tempdir");
    let input = write_input(dir.path(), "rel.txt", "size 4\n0 2\n1 3\n");

    dsm_cmd(dir.path())
        .args(["build", "--format", "text"])
        .arg(&input)
        .assert()
        .success()
        .stdout("1 0 1 0\n0 1 0 1\n1 0 1 0\n0 1 0 1\n");
}

#[test]
fn build_identity_only() {
    let dir = TempDir::new().expect("tempdir");
    let input = write_input(dir.path(), "rel.txt", "size 3\n");

    dsm_cmd(dir.path())
        .args(["build", "--format", "text"])
        .arg(&input)
        .assert()
        .success()
        .stdout("1 0 0\n0 1 0\n0 0 1\n");
}

#[test]
fn build_out_of_range_fails_with_indices() {
    let dir = TempDir::new().expect("tempdir");
    let input = write_input(dir.path(), "rel.txt", "size 3\n0 1\n2 3\n");

    dsm_cmd(dir.path())
        .args(["build", "--format", "text"])
        .arg(&input)
        .assert()
        .failure()
        .stdout("")
        .stderr(predicate::str::contains("(2, 3)"))
        .stderr(predicate::str::contains("E1002"));
}

#[test]
fn build_invalid_size_fails() {
    let dir = TempDir::new().expect("tempdir");
    let input = write_input(dir.path(), "rel.txt", "size 0\n");

    dsm_cmd(dir.path())
        .args(["build", "--format", "text"])
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid matrix size 0"));
}

#[test]
fn build_without_symmetrize_reports_asymmetry() {
    let dir = TempDir::new().expect("tempdir");

    dsm_cmd(dir.path())
        .args(["build", "--format", "text", "--no-symmetrize"])
        .arg(dataset())
        .assert()
        .failure()
        .stderr(predicate::str::contains("M[0][2] != M[2][0]"))
        .stderr(predicate::str::contains("E2001"));
}

#[test]
fn build_json_error_is_structured() {
    let dir = TempDir::new().expect("tempdir");
    let input = write_input(dir.path(), "rel.txt", "0 1\n");

    let output = dsm_cmd(dir.path())
        .env("RUST_BACKTRACE", "1")
        .args(["--json", "build"])
        .arg(&input)
        .output()
        .expect("dsm should not crash");
    assert!(!output.status.success());

    let json: Value = serde_json::from_slice(&output.stderr).expect("stderr is one JSON object");
    assert_eq!(json["error"]["error_code"], "E3003");
}

#[test]
fn text_error_is_printed_once() {
    let dir = TempDir::new().expect("tempdir");
    let input = write_input(dir.path(), "rel.txt", "0 1\n");

    let output = dsm_cmd(dir.path())
        .env("RUST_BACKTRACE", "1")
        .args(["build", "--format", "text"])
        .arg(&input)
        .output()
        .expect("dsm should not crash");
    assert_eq!(output.status.code(), Some(1));

    let stderr = String::from_utf8(output.stderr).expect("utf8 stderr");
    assert_eq!(stderr.matches("does not declare a size").count(), 1, "{stderr}");
    assert!(stderr.starts_with("error: "));
    assert!(!stderr.contains("Error:"));
    assert!(!stderr.contains("backtrace"));
}

#[test]
fn config_error_json_is_the_only_stderr_output() {
    let dir = TempDir::new().expect("tempdir");
    write_input(dir.path(), "dsm.toml", "[build\n");
    let input = write_input(dir.path(), "rel.txt", "size 1\n");

    let output = dsm_cmd(dir.path())
        .env("RUST_BACKTRACE", "1")
        .args(["build", "--format", "json"])
        .arg(&input)
        .output()
        .expect("dsm should not crash");
    assert!(!output.status.success());

    let json: Value = serde_json::from_slice(&output.stderr).expect("stderr is one JSON object");
    assert_eq!(json["error"]["error_code"], "E4001");
}

#[test]
fn oversized_matrix_is_rejected() {
    let dir = TempDir::new().expect("tempdir");
    let input = write_input(dir.path(), "rel.txt", "size 4000000000\n0 1\n");

    dsm_cmd(dir.path())
        .args(["build", "--format", "text"])
        .arg(&input)
        .assert()
        .failure()
        .stdout("")
        .stderr(predicate::str::contains("exceeds the limit"))
        .stderr(predicate::str::contains("E1003"));
}

#[test]
fn build_dataset_json_snapshot() {
    let dir = TempDir::new().expect("tempdir");
    let stdout = stdout_of(dsm_cmd(dir.path()).args(["build", "--format", "json"]).arg(dataset()));

    let json: Value = serde_json::from_str(&stdout).expect("valid JSON");
    assert_eq!(json["ok"], true);
    assert_eq!(json["declared"], 108);
    assert_eq!(json["mirrored"], 108);
    assert_eq!(json["matrix"]["size"], 38);
    assert_eq!(json["matrix"]["symmetric"], true);
    assert_eq!(json["matrix"]["edges"].as_array().map(Vec::len), Some(108));
    assert_eq!(json["matrix"]["rows"].as_array().map(Vec::len), Some(38));
}

#[test]
fn build_pretty_shows_summary() {
    let dir = TempDir::new().expect("tempdir");
    let input = write_input(
        dir.path(),
        "rel.toml",
        "size = 2\nlabels = [\"Pump\", \"Valve\"]\nrelations = [[0, 1]]\n",
    );

    dsm_cmd(dir.path())
        .args(["build", "--format", "pretty"])
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("Relation matrix"))
        .stdout(predicate::str::contains("symmetric:   yes"))
        .stdout(predicate::str::contains("1 Valve | 1 1"));
}

#[test]
fn build_csv_export() {
    let dir = TempDir::new().expect("tempdir");
    let input = write_input(dir.path(), "rel.json", r#"{"size": 3, "relations": [[2, 0]]}"#);

    dsm_cmd(dir.path())
        .args(["build", "--export", "csv"])
        .arg(&input)
        .assert()
        .success()
        .stdout("1,0,1\n0,1,0\n1,0,1\n");
}

#[test]
fn size_flag_overrides_input() {
    let dir = TempDir::new().expect("tempdir");
    let input = write_input(dir.path(), "rel.txt", "size 2\n0 1\n");

    dsm_cmd(dir.path())
        .args(["build", "--format", "text", "--size", "3"])
        .arg(&input)
        .assert()
        .success()
        .stdout("1 1 0\n1 1 0\n0 0 1\n");
}

#[test]
fn edges_round_trip_through_stdin() {
    let dir = TempDir::new().expect("tempdir");
    let input = write_input(dir.path(), "rel.txt", "size 5\n0 1\n1 2\n2 0\n");

    let edges = stdout_of(dsm_cmd(dir.path()).args(["edges", "--format", "text"]).arg(&input));
    assert_eq!(edges, "size 5\n0 1\n0 2\n1 2\n");

    let direct = stdout_of(dsm_cmd(dir.path()).args(["build", "--format", "text"]).arg(&input));
    let replayed = stdout_of(
        dsm_cmd(dir.path())
            .args(["build", "--format", "text", "-"])
            .write_stdin(edges),
    );
    assert_eq!(direct, replayed);
}

#[test]
fn edges_dataset_matches_snapshot_fingerprint() {
    let dir = TempDir::new().expect("tempdir");
    let edges = stdout_of(dsm_cmd(dir.path()).args(["edges", "--format", "json"]).arg(dataset()));
    let build = stdout_of(dsm_cmd(dir.path()).args(["build", "--export", "json"]).arg(dataset()));

    let edges: Value = serde_json::from_str(&edges).expect("valid JSON");
    let build: Value = serde_json::from_str(&build).expect("valid JSON");
    assert_eq!(edges["fingerprint"], build["fingerprint"]);
    assert_eq!(edges["edges"][0]["i"], 0);
    assert_eq!(edges["edges"][0]["j"], 2);
}

#[test]
fn edges_follow_config_validate() {
    let dir = TempDir::new().expect("tempdir");
    write_input(dir.path(), "dsm.toml", "[build]\nsymmetrize = false\nvalidate = false\n");
    let input = write_input(dir.path(), "rel.txt", "size 3\n2 0\n");

    let edges = stdout_of(dsm_cmd(dir.path()).args(["edges", "--format", "text"]).arg(&input));
    assert_eq!(edges, "size 3\n0 2\n");
}

#[test]
fn check_reports_one_directional_pairs() {
    let dir = TempDir::new().expect("tempdir");
    let input = write_input(dir.path(), "rel.txt", "size 3\n0 1\n1 0\n0 2\n");

    dsm_cmd(dir.path())
        .args(["check", "--format", "text"])
        .arg(&input)
        .assert()
        .failure()
        .stdout(predicate::str::contains("symmetric=false"))
        .stdout(predicate::str::contains("asymmetric: (0, 2)"))
        .stderr(predicate::str::contains("M[0][2] != M[2][0]"));
}

#[test]
fn check_passes_for_symmetric_declarations() {
    let dir = TempDir::new().expect("tempdir");
    let input = write_input(dir.path(), "rel.txt", "size 2\n0 1\n1 0\n");

    let stdout = stdout_of(dsm_cmd(dir.path()).args(["check", "--format", "json"]).arg(&input));
    let json: Value = serde_json::from_str(&stdout).expect("valid JSON");
    assert_eq!(json["ok"], true);
    assert_eq!(json["directed_cells"], 2);
    assert_eq!(json["asymmetric_pairs"], serde_json::json!([]));
}

#[test]
fn project_config_disables_symmetrize() {
    let dir = TempDir::new().expect("tempdir");
    write_input(dir.path(), "dsm.toml", "[build]\nsymmetrize = false\nvalidate = false\n");
    let input = write_input(dir.path(), "rel.txt", "size 2\n0 1\n");

    dsm_cmd(dir.path())
        .args(["build", "--format", "text"])
        .arg(&input)
        .assert()
        .success()
        .stdout("1 1\n0 1\n");
}

#[test]
fn format_env_selects_json() {
    let dir = TempDir::new().expect("tempdir");
    let input = write_input(dir.path(), "rel.txt", "size 1\n");

    let stdout = stdout_of(dsm_cmd(dir.path()).env("FORMAT", "json").arg("build").arg(&input));
    let json: Value = serde_json::from_str(&stdout).expect("valid JSON");
    assert_eq!(json["matrix"]["rows"], serde_json::json!([[1]]));
}

#[test]
fn missing_input_fails() {
    let dir = TempDir::new().expect("tempdir");

    dsm_cmd(dir.path())
        .args(["build", "--format", "text", "absent.txt"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("absent.txt"));
}

#[test]
fn malformed_config_is_reported() {
    let dir = TempDir::new().expect("tempdir");
    write_input(dir.path(), "dsm.toml", "[build\n");
    let input = write_input(dir.path(), "rel.txt", "size 1\n");

    dsm_cmd(dir.path())
        .args(["build", "--format", "text"])
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("dsm.toml"))
        .stderr(predicate::str::contains("E4001"));
}
