use assert_cmd::prelude::*;
use predicates::prelude::*;
use rstest::rstest;
use std::fs;
use std::path::PathBuf;
use std::process::Command;
use tempfile::tempdir;

const VALID: &str = r#"
[chassis]
wheel_diameter_in = 4.0
track_width_in = 11.5

[gearset]
cartridge = "green"
ratio = 1.0

[settle]
at_target_error = 5.0
at_target_derivative = 5.0
at_target_time_ms = 50

[timing]
loop_period_ms = 5

[pid]
kp = 0.01
ki = 0.0
kd = 0.0
bias = 0.0

[sim]
max_ticks_per_read = 20.0
"#;

fn write_config(dir: &tempfile::TempDir, toml: &str) -> PathBuf {
    let path = dir.path().join("cfg.toml");
    fs::write(&path, toml).unwrap();
    path
}

#[rstest]
#[case(&["--help"], 0, "Usage:", "stdout")]
#[case(&["self-check"], 0, "self-check ok", "stdout")]
#[case(&["move", "--meters", "0.1"], 0, "move complete", "stdout")]
#[case(&["move", "--meters", "-0.1"], 0, "move complete", "stdout")]
#[case(&["turn", "--degrees", "45"], 0, "turn complete", "stdout")]
#[case(&["hold", "--ticks", "500"], 0, "hold complete", "stdout")]
#[case(&["move"], 2, "required", "stderr")]
#[case(&["--max-run-ms", "1", "move", "--meters", "1.0"], 4, "max run time", "stderr")]
fn cli_table_cases(
    #[case] args: &[&str],
    #[case] exit_code: i32,
    #[case] needle: &str,
    #[case] stream: &str,
) {
    let dir = tempdir().unwrap();
    let cfg = write_config(&dir, VALID);

    let mut cmd = Command::cargo_bin("tankctl").unwrap();
    cmd.arg("--config").arg(&cfg);
    for a in args {
        cmd.arg(a);
    }

    let assert = cmd.assert().code(exit_code);
    match stream {
        "stdout" => {
            assert.stdout(predicate::str::contains(needle));
        }
        "stderr" => {
            assert.stderr(predicate::str::contains(needle));
        }
        other => panic!("unknown stream: {other}"),
    }
}

#[test]
fn zero_gear_ratio_is_rejected() {
    let dir = tempdir().unwrap();
    let cfg = write_config(&dir, &VALID.replace("ratio = 1.0", "ratio = 0.0"));

    Command::cargo_bin("tankctl")
        .unwrap()
        .arg("--config")
        .arg(&cfg)
        .arg("self-check")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Configuration is invalid"))
        .stderr(predicate::str::contains("gearset.ratio must be > 0"));
}

#[test]
fn missing_config_file_is_reported() {
    let dir = tempdir().unwrap();
    Command::cargo_bin("tankctl")
        .unwrap()
        .arg("--config")
        .arg(dir.path().join("nope.toml"))
        .arg("self-check")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Could not read the config file"));
}

#[test]
fn json_outcome_is_parseable() {
    let dir = tempdir().unwrap();
    let cfg = write_config(&dir, VALID);

    let output = Command::cargo_bin("tankctl")
        .unwrap()
        .arg("--config")
        .arg(&cfg)
        .arg("--json")
        .args(["move", "--meters", "0.1"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    let line = stdout.lines().last().unwrap();
    let v: serde_json::Value = serde_json::from_str(line).unwrap();
    assert_eq!(v["command"], "move");
    assert_eq!(v["status"], "complete");
    let target = v["target_ticks"].as_f64().unwrap();
    let left = v["left"].as_f64().unwrap();
    assert!((target - 112.8).abs() < 0.1, "target {target}");
    assert!((left - target).abs() < 1e-9, "left {left}");
}

#[test]
fn json_error_carries_reason() {
    let dir = tempdir().unwrap();
    let cfg = write_config(&dir, VALID);

    let output = Command::cargo_bin("tankctl")
        .unwrap()
        .arg("--config")
        .arg(&cfg)
        .args(["--json", "--max-run-ms", "1", "turn", "--degrees", "90"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(4));

    let stderr = String::from_utf8(output.stderr).unwrap();
    let line = stderr
        .lines()
        .rev()
        .find(|l| l.contains("\"reason\""))
        .unwrap();
    let v: serde_json::Value = serde_json::from_str(line).unwrap();
    assert_eq!(v["reason"], "MaxRuntime");
    assert_eq!(v["details"]["max_run_ms"], 1);
}
