//! The `bulletin` binary: exit codes, offline validation and the diagnostic log.

use super::test_utils::{passing_document, thin_document};
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

fn bulletin(workspace: &Path, args: &[&str]) -> Output {
    let isolated_config = workspace.join(".xdg");
    std::fs::create_dir_all(&isolated_config).unwrap();
    Command::new(env!("CARGO_BIN_EXE_bulletin"))
        .env("XDG_CONFIG_HOME", &isolated_config)
        .env_remove("OPENAI_API_KEY")
        .env_remove("BULLETIN_LOG")
        .arg("--workspace")
        .arg(workspace)
        .args(args)
        .output()
        .unwrap()
}

#[test]
fn validate_accepts_conforming_document() {
    let temp = TempDir::new().unwrap();
    std::fs::write(temp.path().join("good.html"), passing_document()).unwrap();

    let output = bulletin(temp.path(), &["validate", "good.html"]);
    assert!(
        output.status.success(),
        "stderr={}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(String::from_utf8_lossy(&output.stdout).contains("No deficiencies"));
}

#[test]
fn validate_rejects_thin_document() {
    let temp = TempDir::new().unwrap();
    std::fs::write(temp.path().join("thin.html"), thin_document()).unwrap();

    let output = bulletin(temp.path(), &["validate", "thin.html"]);
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("missing marker 'stylesheet'"));
    assert!(stderr.contains("units below threshold (1/10)"));
    assert!(!temp.path().join("error.log").exists());
}

#[test]
fn run_without_credential_logs_and_exits_nonzero() {
    let temp = TempDir::new().unwrap();
    std::fs::create_dir_all(temp.path().join("templates")).unwrap();
    std::fs::write(temp.path().join("templates/reference.html"), passing_document()).unwrap();

    let output = bulletin(temp.path(), &[]);
    assert_eq!(output.status.code(), Some(1));
    assert!(!temp.path().join("generated-content.html").exists());

    let log = std::fs::read_to_string(temp.path().join("error.log")).unwrap();
    let lines: Vec<&str> = log.lines().collect();
    assert_eq!(lines.len(), 1);
    assert!(lines[0].starts_with('['));
    assert!(lines[0].contains("] error: Credential error"));
}

#[test]
fn repeated_failures_append_to_the_log() {
    let temp = TempDir::new().unwrap();

    bulletin(temp.path(), &["run"]);
    bulletin(temp.path(), &["run"]);

    let log = std::fs::read_to_string(temp.path().join("error.log")).unwrap();
    assert_eq!(log.lines().count(), 2);
    assert!(log.lines().all(|line| line.contains("Configuration error")));
}

#[test]
fn invalid_policy_is_rejected() {
    let temp = TempDir::new().unwrap();
    let output = bulletin(temp.path(), &["probe", "--policy", "sometimes"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(!temp.path().join("error.log").exists());
}
