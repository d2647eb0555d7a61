//! End-to-end tests for the `lr` binary
//!
//! These drive the real binary with piped stdin and real child processes.

#![allow(deprecated)]
use std::time::{Duration, Instant};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn lr() -> Command {
    let mut cmd = Command::cargo_bin("lr").unwrap();
    cmd.env_remove("RUST_LOG").timeout(Duration::from_secs(30));
    cmd
}

// =============================================================================
// Output forwarding and ordering
// =============================================================================

#[test]
fn test_echo_each_line_in_order() {
    lr().args(["--rate", "100", "--inflight", "1", "echo", "{}"])
        .write_stdin("a\nb\nc\n")
        .assert()
        .success()
        .stdout("a\nb\nc\n");
}

#[test]
fn test_placeholder_replaced_everywhere_in_fragment() {
    lr().args(["--rate", "100", "echo", "{}-{}", "x{}}"])
        .write_stdin("v\n")
        .assert()
        .success()
        .stdout("v-v xv}\n");
}

#[test]
fn test_child_stderr_forwarded() {
    lr().args(["--rate", "100", "sh", "-c", "echo err-{} >&2"])
        .write_stdin("one\n")
        .assert()
        .success()
        .stderr(predicate::str::contains("err-one"));
}

#[test]
fn test_empty_input_succeeds_without_launching() {
    lr().args(["echo", "{}"]).write_stdin("").assert().success().stdout("");
}

#[test]
fn test_unterminated_last_line_is_processed() {
    lr().args(["--rate", "100", "echo", "{}"])
        .write_stdin("first\nlast")
        .assert()
        .success()
        .stdout("first\nlast\n");
}

#[test]
fn test_every_line_runs_exactly_once_with_concurrency() {
    let input: String = (0..20).map(|i| format!("line-{}\n", i)).collect();
    let output = lr()
        .args(["--rate", "1000", "--inflight", "4", "echo", "{}"])
        .write_stdin(input)
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    let mut lines: Vec<&str> = stdout.lines().collect();
    lines.sort();
    let mut expected: Vec<String> = (0..20).map(|i| format!("line-{}", i)).collect();
    expected.sort();
    assert_eq!(lines, expected);
}

#[test]
fn test_non_utf8_line_passed_through() {
    let output = lr()
        .args(["--rate", "100", "--inflight", "1", "printf", "%s\\n", "{}"])
        .write_stdin(&b"caf\xe9.txt\nok\n"[..])
        .output()
        .unwrap();

    assert!(output.status.success());
    assert_eq!(output.stdout, b"caf\xe9.txt\nok\n");
}

#[test]
fn test_input_read_error_reported_once() {
    // Reading a directory fails with EISDIR until the reader gives up.
    let temp = TempDir::new().unwrap();
    let output = std::process::Command::new(assert_cmd::cargo::cargo_bin("lr"))
        .env_remove("RUST_LOG")
        .args(["--rate", "100", "true"])
        .stdin(std::fs::File::open(temp.path()).unwrap())
        .output()
        .unwrap();

    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(
        stderr.matches("Is a directory").count(),
        linerate::source::MAX_CONSECUTIVE_READ_ERRORS as usize,
        "{}",
        stderr
    );
}

// =============================================================================
// Rate limiting
// =============================================================================

#[test]
fn test_rate_spaces_launches_after_burst() {
    // Burst of one, then a launch every 500ms: 5 lines need 4 ticks.
    let started = Instant::now();
    lr().args(["--rate", "2", "--inflight", "1", "true"])
        .write_stdin("1\n2\n3\n4\n5\n")
        .assert()
        .success();
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_millis(1800), "finished too fast: {:?}", elapsed);
}

#[test]
fn test_initial_burst_up_to_inflight() {
    // Rate gate starts full at the in-flight capacity, so five lines with
    // --inflight 5 launch without waiting for the 1/sec clock.
    let started = Instant::now();
    lr().args(["--rate", "1", "--inflight", "5", "true"])
        .write_stdin("1\n2\n3\n4\n5\n")
        .assert()
        .success();
    assert!(started.elapsed() < Duration::from_secs(3));
}

#[test]
fn test_rate_beyond_timer_resolution() {
    lr().args(["--rate", "2000000000", "--inflight", "1", "echo", "{}"])
        .write_stdin("1\n2\n3\n")
        .assert()
        .success()
        .stdout("1\n2\n3\n");
}

#[test]
fn test_token_bucket_refill() {
    let started = Instant::now();
    lr().args(["--rate", "4", "--inflight", "2", "--refill", "token-bucket", "true"])
        .write_stdin("1\n2\n3\n4\n")
        .assert()
        .success();
    // Two in the burst, then one per 250ms tick.
    assert!(started.elapsed() >= Duration::from_millis(450));
}

// =============================================================================
// Configuration errors
// =============================================================================

#[test]
fn test_missing_command_fails() {
    lr().args(["--rate", "5"])
        .write_stdin("a\n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("COMMAND"));
}

#[test]
fn test_zero_rate_rejected() {
    lr().args(["--rate", "0", "true"]).write_stdin("a\n").assert().failure();
}

#[test]
fn test_zero_inflight_from_config_rejected() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("lr.yml");
    std::fs::write(&path, "inflight: 0\n").unwrap();

    lr().arg("--config")
        .arg(&path)
        .args(["echo", "{}"])
        .write_stdin("a\n")
        .assert()
        .failure()
        .stdout("")
        .stderr(predicate::str::contains("inflight"));
}

#[test]
fn test_config_file_supplies_limits() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("lr.yml");
    std::fs::write(&path, "rate: 100\ninflight: 1\n").unwrap();

    lr().arg("-c")
        .arg(&path)
        .args(["echo", "{}"])
        .write_stdin("x\ny\n")
        .assert()
        .success()
        .stdout("x\ny\n");
}

#[test]
fn test_missing_config_file_fails() {
    lr().args(["--config", "/nonexistent/lr.yml", "true"])
        .write_stdin("a\n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("lr.yml"));
}

// =============================================================================
// Execution failures
// =============================================================================

#[test]
fn test_failing_command_stops_run() {
    lr().args(["--rate", "100", "--inflight", "1", "sh", "-c", "echo {}; test {} != b"])
        .write_stdin("a\nb\nc\nd\n")
        .assert()
        .failure()
        .stdout(predicate::str::contains("a"))
        .stdout(predicate::str::contains("b"))
        .stdout(predicate::str::contains("c").not())
        .stdout(predicate::str::contains("d").not())
        .stderr(predicate::str::contains("exit status 1"));
}

#[test]
fn test_unknown_program_fails() {
    lr().args(["linerate-definitely-not-installed", "{}"])
        .write_stdin("a\n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to launch"));
}

#[test]
fn test_failure_kills_in_flight_siblings() {
    let temp = TempDir::new().unwrap();
    let marker = temp.path().join("finished");
    let script = format!(
        "if [ {{}} = slow ]; then sleep 3 >/dev/null 2>&1; touch {}; else exit 3; fi",
        marker.display()
    );

    let started = Instant::now();
    lr().args(["--rate", "100", "--inflight", "2", "sh", "-c"])
        .arg(&script)
        .write_stdin("slow\nfail\n")
        .assert()
        .failure();
    assert!(started.elapsed() < Duration::from_secs(3));

    std::thread::sleep(Duration::from_secs(4).saturating_sub(started.elapsed()));
    assert!(!marker.exists(), "sibling should have been killed");
}
