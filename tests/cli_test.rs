mod common;

use std::fs;
use std::process::{Command, Stdio};

use anyhow::Result;
use common::{TestRepo, JAN_1_2024};

fn git_summary() -> Command {
    Command::new(env!("CARGO_BIN_EXE_git-summary"))
}

#[test]
fn writes_summary_and_reports_progress() -> Result<()> {
    let mut test_repo = TestRepo::new()?;
    test_repo.write("index.js", "console.log(1);\n")?;
    test_repo.commit("Initial", JAN_1_2024, &["index.js"], &[])?;

    let output_path = test_repo.scratch_dir().join("summary.json");
    let output = git_summary()
        .arg(&test_repo.repo_path)
        .arg("--output")
        .arg(&output_path)
        .output()?;

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8(output.stdout)?;
    assert!(stdout.contains("Analyzing repository: project (branch: main)"));
    assert!(stdout.contains("JSON summary created:"));

    let summary: serde_json::Value = serde_json::from_str(&fs::read_to_string(&output_path)?)?;
    assert_eq!(summary["files"][0]["relative_path"], "index.js");
    assert_eq!(summary["files"][0]["metadata"]["language"], "JavaScript");

    Ok(())
}

#[test]
fn stdout_mode_prints_only_json() -> Result<()> {
    let mut test_repo = TestRepo::new()?;
    test_repo.write("a.md", "# a\n")?;
    test_repo.commit("Initial", JAN_1_2024, &["a.md"], &[])?;

    let output = git_summary()
        .arg(&test_repo.repo_path)
        .arg("--stdout")
        .output()?;

    assert!(output.status.success());
    let summary: serde_json::Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(summary["files"][0]["relative_path"], "a.md");

    Ok(())
}

#[test]
fn closed_stdout_is_an_error_not_a_panic() -> Result<()> {
    let mut test_repo = TestRepo::new()?;
    test_repo.write("a.txt", "a\n")?;
    test_repo.commit("Initial", JAN_1_2024, &["a.txt"], &[])?;

    let mut child = git_summary()
        .arg(&test_repo.repo_path)
        .arg("--stdout")
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;
    // Close the read end before the summary is written.
    drop(child.stdout.take());
    let output = child.wait_with_output()?;

    let stderr = String::from_utf8(output.stderr)?;
    assert!(!stderr.contains("panicked"), "stderr: {stderr}");
    assert_ne!(output.status.code(), Some(101));

    Ok(())
}

#[test]
fn invalid_repository_exits_nonzero() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let output_path = dir.path().join("out.json");

    let output = git_summary()
        .arg(dir.path())
        .arg("--output")
        .arg(&output_path)
        .output()?;

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8(output.stderr)?;
    assert!(stderr.contains("Error: Not a git repository"));
    assert!(!output_path.exists());

    Ok(())
}

#[test]
fn unknown_branch_exits_nonzero() -> Result<()> {
    let mut test_repo = TestRepo::new()?;
    test_repo.write("a.txt", "a\n")?;
    test_repo.commit("Initial", JAN_1_2024, &["a.txt"], &[])?;

    let output = git_summary()
        .arg(&test_repo.repo_path)
        .args(["--branch", "nope", "--quiet", "--stdout"])
        .output()?;

    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
    let stderr = String::from_utf8(output.stderr)?;
    assert!(stderr.contains("Branch not found: nope"));

    Ok(())
}
