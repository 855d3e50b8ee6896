//! Basic CLI E2E tests.
//!
//! Tests invoke the built binary with HOME pointed at a temporary
//! directory, so every test starts from default configuration.

use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

/// Run a CLI command and return (code, stdout, stderr).
fn run_cli(home: &Path, args: &[&str]) -> (i32, String, String) {
    let output = Command::new(env!("CARGO_BIN_EXE_tenang"))
        .args(args)
        .env("HOME", home)
        .env_remove("TENANG_ENV")
        .env_remove("TENANG_LOG")
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (code, stdout, stderr)
}

/// Run a CLI command with `input` on stdin, then close stdin.
/// Returns (code, stdout), or panics if the process is still running after `limit`.
fn run_cli_with_input(home: &Path, args: &[&str], input: &str, limit: Duration) -> (i32, String) {
    let mut child = Command::new(env!("CARGO_BIN_EXE_tenang"))
        .args(args)
        .env("HOME", home)
        .env_remove("TENANG_ENV")
        .env_remove("TENANG_LOG")
        .env_remove("RUST_LOG")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("Failed to spawn CLI command");

    let mut stdin = child.stdin.take().expect("stdin is piped");
    stdin.write_all(input.as_bytes()).unwrap();
    drop(stdin);

    let started = Instant::now();
    loop {
        if child.try_wait().unwrap().is_some() {
            break;
        }
        if started.elapsed() > limit {
            child.kill().ok();
            child.wait().ok();
            panic!("`tenang {}` still running after {limit:?}", args.join(" "));
        }
        std::thread::sleep(Duration::from_millis(50));
    }

    let output = child.wait_with_output().unwrap();
    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    (output.status.code().unwrap_or(-1), stdout)
}

/// Parse JSON-lines output.
fn json_lines(stdout: &str) -> Vec<serde_json::Value> {
    stdout
        .lines()
        .map(|line| serde_json::from_str(line).expect("Failed to parse JSON output"))
        .collect()
}

fn count_type(lines: &[serde_json::Value], ty: &str) -> usize {
    lines.iter().filter(|l| l["event"]["type"] == ty).count()
}

#[test]
fn test_presets_list() {
    let home = tempfile::tempdir().unwrap();
    let (code, stdout, _) = run_cli(home.path(), &["presets"]);
    assert_eq!(code, 0, "presets failed");
    assert!(stdout.contains("*  10 min"), "default not marked: {stdout}");
    assert!(stdout.contains("60 min"));
}

#[test]
fn test_presets_json() {
    let home = tempfile::tempdir().unwrap();
    let (code, stdout, _) = run_cli(home.path(), &["presets", "--json"]);
    assert_eq!(code, 0);
    let presets: Vec<u64> = serde_json::from_str(stdout.trim()).unwrap();
    assert_eq!(presets, vec![5, 10, 15, 20, 30, 45, 60]);
}

#[test]
fn test_simulate_counts_breaths() {
    let home = tempfile::tempdir().unwrap();
    let (code, stdout, stderr) = run_cli(
        home.path(),
        &["session", "simulate", "--seconds", "40", "--breathing", "--json"],
    );
    assert_eq!(code, 0, "simulate failed: {stderr}");

    let lines = json_lines(&stdout);
    assert_eq!(count_type(&lines, "BreathCompleted"), 2);
    assert_eq!(count_type(&lines, "Progress"), 40);
    assert_eq!(count_type(&lines, "SessionCompleted"), 1);

    let last = lines.last().unwrap();
    assert_eq!(last["event"]["type"], "SessionCompleted");
    assert_eq!(last["clock_ms"], 40_000);
}

#[test]
fn test_simulate_pause_is_not_counted() {
    let home = tempfile::tempdir().unwrap();
    let (code, stdout, stderr) = run_cli(
        home.path(),
        &[
            "session",
            "simulate",
            "--seconds",
            "10",
            "--no-breathing",
            "--pause-at",
            "3",
            "--pause-for",
            "5",
            "--json",
        ],
    );
    assert_eq!(code, 0, "simulate failed: {stderr}");

    let lines = json_lines(&stdout);
    assert_eq!(count_type(&lines, "Progress"), 10);
    assert_eq!(count_type(&lines, "PhaseChanged"), 0);

    let paused = lines
        .iter()
        .find(|l| l["event"]["type"] == "SessionPaused")
        .unwrap();
    assert_eq!(paused["event"]["remaining_secs"], 7);

    let last = lines.last().unwrap();
    assert_eq!(last["event"]["type"], "SessionCompleted");
    assert_eq!(last["clock_ms"], 15_000);
}

#[test]
fn test_simulate_text_output() {
    let home = tempfile::tempdir().unwrap();
    let (code, stdout, _) = run_cli(
        home.path(),
        &["session", "simulate", "--seconds", "5", "--breathing"],
    );
    assert_eq!(code, 0);
    assert!(stdout.contains("session started: 00:05"));
    assert!(stdout.contains("Tarik napas"));
    assert!(stdout.contains("session complete (00:05)"));
}

#[test]
fn test_simulate_rejects_zero_duration() {
    let home = tempfile::tempdir().unwrap();
    let (code, _, stderr) = run_cli(home.path(), &["session", "simulate", "--seconds", "0"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("Invalid duration"), "stderr: {stderr}");
}

#[test]
fn test_config_get_and_set() {
    let home = tempfile::tempdir().unwrap();
    let (code, stdout, _) = run_cli(home.path(), &["config", "get", "session.default_minutes"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "10");

    let (code, stdout, _) = run_cli(
        home.path(),
        &["config", "set", "session.default_minutes", "20"],
    );
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "ok");

    let (_, stdout, _) = run_cli(home.path(), &["config", "get", "session.default_minutes"]);
    assert_eq!(stdout.trim(), "20");
    assert!(home.path().join(".config/tenang/config.toml").exists());
}

#[test]
fn test_config_set_rejects_invalid_pattern() {
    let home = tempfile::tempdir().unwrap();
    let (code, _, _) = run_cli(home.path(), &["config", "set", "breathing.hold_secs", "0"]);
    assert_eq!(code, 1);

    let (_, stdout, _) = run_cli(home.path(), &["config", "get", "breathing.hold_secs"]);
    assert_eq!(stdout.trim(), "7");
}

#[test]
fn test_config_unknown_key() {
    let home = tempfile::tempdir().unwrap();
    let (code, _, stderr) = run_cli(home.path(), &["config", "get", "nope"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("unknown key"));
}

#[test]
fn test_session_uses_configured_default() {
    let home = tempfile::tempdir().unwrap();
    run_cli(home.path(), &["config", "set", "session.default_minutes", "1"]);
    let (code, stdout, _) = run_cli(
        home.path(),
        &["session", "simulate", "--no-breathing", "--json"],
    );
    assert_eq!(code, 0);
    let lines = json_lines(&stdout);
    assert_eq!(lines[0]["event"]["duration_secs"], 60);
    assert_eq!(count_type(&lines, "Progress"), 60);
}

#[test]
fn test_run_exits_when_input_closes_while_paused() {
    let home = tempfile::tempdir().unwrap();
    let (code, stdout) = run_cli_with_input(
        home.path(),
        &["session", "run", "--minutes", "1", "--no-breathing"],
        "p\n",
        Duration::from_secs(20),
    );
    assert_eq!(code, 0);
    assert!(stdout.contains("paused at"), "stdout: {stdout}");
    assert!(!stdout.contains("session complete"));
}

#[test]
fn test_run_exits_when_input_closes_after_reset() {
    let home = tempfile::tempdir().unwrap();
    let (code, stdout) = run_cli_with_input(
        home.path(),
        &["session", "run", "--minutes", "1"],
        "r\n",
        Duration::from_secs(20),
    );
    assert_eq!(code, 0);
    assert!(stdout.contains("reset to 01:00"), "stdout: {stdout}");
}

#[test]
fn test_presets_with_huge_entry() {
    let home = tempfile::tempdir().unwrap();
    let (code, _, _) = run_cli(
        home.path(),
        &["config", "set", "session.presets", "[10, 400000000000000000]"],
    );
    assert_eq!(code, 0);

    let (code, stdout, stderr) = run_cli(home.path(), &["presets"]);
    assert_eq!(code, 0, "presets failed: {stderr}");
    assert!(stdout.contains("*  10 min"), "stdout: {stdout}");
    assert!(stdout.contains("400000000000000000 min"));
}
