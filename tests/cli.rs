//! End-to-end runs of the check-imu binary.

use std::io::Write;
use std::process::{Command, Output};

fn check_imu(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_check-imu"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run check-imu")
}

#[test]
fn simulated_run_stops_after_frame_limit() {
    let output = check_imu(&["--frames", "3", "--rate", "500"]);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let stdout = String::from_utf8(output.stdout).unwrap();
    assert_eq!(stdout.matches("\x1b[2J\x1b[1;1H").count(), 3);
    assert_eq!(stdout.matches("accelerometer:").count(), 3);
    assert_eq!(stdout.matches("gyro:").count(), 3);
    assert_eq!(stdout.matches("|  value: ").count(), 18);
}

#[test]
fn replay_run_draws_recorded_values() {
    let mut recording = tempfile::NamedTempFile::new().unwrap();
    writeln!(recording, r#"{{"accel":[0.0,0.0,9.8],"gyro":[0.0,0.0,0.0]}}"#).unwrap();
    writeln!(recording, r#"{{"accel":[-3.5,1.25,9.8],"gyro":[0.5,0.0,-0.5]}}"#).unwrap();

    let path = recording.path().to_str().unwrap();
    let output = check_imu(&["--replay", path, "--frames", "2", "--rate", "500"]);
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("value: 9.800000"));
    assert!(stdout.contains("value: -3.500000"));
    assert!(stdout.contains("value: -0.500000"));
}

#[test]
fn capture_fault_exits_with_failure() {
    let output = check_imu(&["--replay", "/nonexistent/motion.jsonl"]);
    assert_eq!(output.status.code(), Some(1));

    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.starts_with("Capture error calling open_replay(/nonexistent/motion.jsonl):"));
}

#[test]
fn recording_end_exits_with_failure() {
    let mut recording = tempfile::NamedTempFile::new().unwrap();
    writeln!(recording, r#"{{"accel":[0.0,0.0,9.8],"gyro":[0.0,0.0,0.0]}}"#).unwrap();

    let mut config = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    writeln!(config, "[source]\nrate_hz = 500\nloop_playback = false").unwrap();

    let output = check_imu(&[
        "-c",
        config.path().to_str().unwrap(),
        "-r",
        recording.path().to_str().unwrap(),
    ]);
    assert_eq!(output.status.code(), Some(1));

    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("end of recording"));
}

#[test]
fn invalid_config_exits_with_failure() {
    let output = check_imu(&["--rate", "0"]);
    assert_eq!(output.status.code(), Some(1));

    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("source.rate_hz"));
}
