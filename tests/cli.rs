//! Runs of the compiled binary: output streams and signal handling.

use std::io::Write;
use std::process::{Command, Stdio};
use tempfile::{NamedTempFile, TempDir};

const BIN: &str = env!("CARGO_BIN_EXE_kafka-workload-generator");

fn write_template(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

fn command(template: &NamedTempFile) -> Command {
    let mut cmd = Command::new(BIN);
    cmd.args(["--mode", "batch", "-f", template.path().to_str().unwrap()])
        .env("RUST_LOG", "info")
        .env("NO_COLOR", "1");
    cmd
}

#[test]
fn test_batch_to_stdout_contains_only_payloads() {
    let template = write_template(r#"{"n": {{fake-int sequential=true min=0 max=9}} }"#);

    let output = command(&template).args(["-r", "3"]).output().unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    let lines: Vec<_> = stdout.lines().collect();
    assert_eq!(lines, vec![r#"{"n": 0 }"#, r#"{"n": 1 }"#, r#"{"n": 2 }"#]);

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Sent 3 records in total across 1 producers"));
}

#[cfg(unix)]
#[test]
fn test_sigterm_drains_and_reports_total() {
    let template = write_template(r#"{"n": {{fake-int sequential=true min=0 max=1000}} }"#);
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("out.jsonl");

    let child = command(&template)
        .args(["-r", "100", "-T", "10", "-o", out.to_str().unwrap()])
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();

    std::thread::sleep(std::time::Duration::from_millis(1500));
    let killed = Command::new("kill")
        .args(["-TERM", &child.id().to_string()])
        .status()
        .unwrap();
    assert!(killed.success());

    let output = child.wait_with_output().unwrap();
    assert!(output.status.success());

    let written = std::fs::read_to_string(&out).unwrap().lines().count();
    assert!(written > 0 && written < 100, "wrote {written} lines");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("termination signal (SIGTERM)"));
    assert!(
        stderr.contains(&format!("Sent {written} records in total across 1 producers")),
        "{stderr}"
    );
}
