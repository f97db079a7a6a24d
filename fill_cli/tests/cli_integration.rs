use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::process::{Command, Stdio};
use std::time::Duration;
use tempfile::tempdir;

#[test]
fn help_lists_usage() {
    let mut cmd = Command::cargo_bin("fill_cli").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage:"));
}

#[test]
fn simulate_run_creates_config_with_defaults_then_shuts_down_cleanly() {
    let dir = tempdir().unwrap();
    let cfg_path = dir.path().join("filler.ini");

    let mut cmd = Command::cargo_bin("fill_cli").unwrap();
    cmd.arg("--config")
        .arg(&cfg_path)
        .arg("--simulate")
        .stdout(Stdio::null())
        .stderr(Stdio::null());
    let mut child = cmd.spawn().unwrap();

    std::thread::sleep(Duration::from_millis(300));
    assert!(cfg_path.exists(), "config file should be created with defaults");

    #[cfg(unix)]
    unsafe {
        // ctrlc's default handler set only traps SIGINT, matching Ctrl-C.
        libc::kill(child.id() as i32, libc::SIGINT);
    }
    #[cfg(not(unix))]
    {
        child.kill().ok();
    }

    let _ = child.wait();

    let contents = std::fs::read_to_string(&cfg_path).unwrap();
    assert!(contents.contains("fill_weight"));
}
