//! End-to-end tests for the spoolctl binary.
//!
//! Each test points the CLI at its own temp directory and isolates it from
//! the caller's environment (config file, env overrides).

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn spoolctl(spool_dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("spoolctl").expect("spoolctl binary should exist");
    cmd.env_remove("SPOOL_CONFIG")
        .env_remove("SPOOL_CAPACITY_MB")
        .env_remove("RUST_LOG")
        .env("SPOOL_DIR", spool_dir)
        .env("XDG_CONFIG_HOME", spool_dir.join("no-config"))
        .arg("--quiet");
    cmd
}

fn stdout_json(output: &std::process::Output) -> Value {
    serde_json::from_slice(&output.stdout).expect("stdout should be JSON")
}

mod status {
    use super::*;

    #[test]
    fn empty_spool_reports_zero() {
        let dir = TempDir::new().unwrap();
        let output = spoolctl(dir.path()).arg("status").output().unwrap();
        assert!(output.status.success());

        let json = stdout_json(&output);
        assert_eq!(json["command"], "status");
        assert_eq!(json["status"]["committed_files"], 0);
        assert_eq!(json["status"]["capacity_mb"], 10);
    }

    #[test]
    fn capacity_flag_is_clamped() {
        let dir = TempDir::new().unwrap();
        let output = spoolctl(dir.path())
            .args(["--capacity-mb", "50000", "status"])
            .output()
            .unwrap();
        assert_eq!(stdout_json(&output)["status"]["capacity_mb"], 1000);
    }
}

mod push_and_drain {
    use super::*;

    #[test]
    fn pushed_payload_drains_to_out_dir() {
        let dir = TempDir::new().unwrap();
        let spool = dir.path().join("spool");
        let payload = dir.path().join("batch.json");
        fs::write(&payload, br#"{"name":"Event"}"#).unwrap();

        spoolctl(&spool)
            .args(["push", payload.to_str().unwrap(), "--content-encoding", "gzip"])
            .assert()
            .success()
            .stdout(predicate::str::contains("\"command\": \"push\""));

        let out_dir = dir.path().join("out");
        let output = spoolctl(&spool)
            .args(["drain", "--out-dir", out_dir.to_str().unwrap()])
            .output()
            .unwrap();
        assert!(output.status.success());

        let json = stdout_json(&output);
        assert_eq!(json["drained"], 1);
        assert_eq!(json["records"][0]["content_encoding"], "gzip");
        let written = json["records"][0]["written_to"].as_str().unwrap();
        assert_eq!(fs::read(written).unwrap(), br#"{"name":"Event"}"#);
    }

    #[test]
    fn raw_push_has_no_content_type() {
        let dir = TempDir::new().unwrap();
        let payload = dir.path().join("blob.bin");
        fs::write(&payload, [0u8, 1, 2, 3]).unwrap();
        let spool = dir.path().join("spool");

        spoolctl(&spool)
            .args(["push", "--raw", payload.to_str().unwrap()])
            .assert()
            .success();

        let output = spoolctl(&spool).arg("drain").output().unwrap();
        let json = stdout_json(&output);
        assert_eq!(json["records"][0]["content_type"], "");
        assert_eq!(json["records"][0]["payload_bytes"], 4);
    }

    #[test]
    fn drain_empty_spool_exits_nothing_to_do() {
        let dir = TempDir::new().unwrap();
        spoolctl(dir.path()).arg("drain").assert().code(1);
    }

    #[test]
    fn push_missing_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        spoolctl(dir.path())
            .args(["push", dir.path().join("missing").to_str().unwrap()])
            .assert()
            .code(21)
            .stderr(predicate::str::contains("\"code\": 40"));
    }

    #[test]
    fn push_into_full_spool_is_refused() {
        let dir = TempDir::new().unwrap();
        let spool = dir.path().join("spool");
        let big = dir.path().join("big.bin");
        fs::write(&big, vec![7u8; 1024 * 1024]).unwrap();

        spoolctl(&spool)
            .args(["--capacity-mb", "1", "push", big.to_str().unwrap()])
            .assert()
            .success();
        spoolctl(&spool)
            .args(["--capacity-mb", "1", "push", big.to_str().unwrap()])
            .assert()
            .code(2)
            .stderr(predicate::str::contains("(1MB) has been exceeded"));
    }
}

mod sweep {
    use super::*;

    #[test]
    fn sweeps_old_temp_files_only_when_asked() {
        let dir = TempDir::new().unwrap();
        let leftover = dir.path().join("Transmission-0000000000001-aaaaaaaa-000000.tmp");
        fs::write(&leftover, b"partial").unwrap();

        spoolctl(dir.path()).arg("status").assert().success();
        assert!(leftover.exists());

        spoolctl(dir.path())
            .args(["sweep-temp", "--older-than-secs", "3600"])
            .assert()
            .code(1);
        assert!(leftover.exists());

        let output = spoolctl(dir.path())
            .args(["sweep-temp", "--older-than-secs", "0"])
            .output()
            .unwrap();
        assert!(output.status.success());
        assert_eq!(stdout_json(&output)["swept"], 1);
        assert!(!leftover.exists());
    }
}

mod errors {
    use super::*;

    #[test]
    fn unknown_command_fails() {
        let dir = TempDir::new().unwrap();
        spoolctl(dir.path())
            .arg("nonexistent-command")
            .assert()
            .failure()
            .stderr(predicate::str::contains("error"));
    }

    #[test]
    fn invalid_config_file_exits_config_error() {
        let dir = TempDir::new().unwrap();
        let config = dir.path().join("spool.json");
        fs::write(&config, r#"{"cache_size": 0}"#).unwrap();

        spoolctl(dir.path())
            .args(["--config", config.to_str().unwrap(), "status"])
            .assert()
            .code(11)
            .stderr(predicate::str::contains("cache_size"));
    }

    #[test]
    fn spool_path_that_is_a_file_exits_config_error() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("plain");
        fs::write(&file, b"x").unwrap();

        spoolctl(&file).arg("status").assert().code(11);
    }
}
