#![cfg(unix)]

use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::sync::atomic::{AtomicU64, Ordering};

// Records the invocation and refuses the connection, so every run stops after one call.
const LOGGING_SSH: &str = r#"#!/bin/sh
printf '%s\n' "$*" >> "$FAKE_SSH_LOG"
exit 255
"#;

fn make_temp_home() -> PathBuf {
    static HOME_SEQ: AtomicU64 = AtomicU64::new(0);
    let seq = HOME_SEQ.fetch_add(1, Ordering::Relaxed);
    let home = std::env::temp_dir().join(format!("clustercheck-env-test-{}-{seq}", std::process::id()));
    let _ = std::fs::remove_dir_all(&home);
    std::fs::create_dir_all(home.join("bin")).expect("create home");

    use std::os::unix::fs::PermissionsExt;
    let ssh = home.join("bin/ssh");
    std::fs::write(&ssh, LOGGING_SSH).expect("write ssh");
    let mut perms = std::fs::metadata(&ssh).expect("metadata").permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&ssh, perms).expect("chmod");
    home
}

fn clustercheck_cmd(home: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_clustercheck"));
    cmd.current_dir(home);
    cmd.env("HOME", home);
    for key in [
        "SSH_HOST",
        "SSH_USER",
        "SSH_PORT",
        "SSH_KEY",
        "REMOTE_SSH_HOST",
        "REMOTE_SSH_USER",
        "CONFIG_OUTPUT_FILE",
        "CLUSTERCHECK_CONFIG",
        "CLUSTERCHECK_NAMESPACE",
        "CLUSTERCHECK_DEPLOYMENTS",
        "RUST_LOG",
    ] {
        cmd.env_remove(key);
    }
    let path = format!(
        "{}:{}",
        home.join("bin").display(),
        std::env::var("PATH").unwrap_or_default()
    );
    cmd.env("PATH", path);
    cmd.env("FAKE_SSH_LOG", home.join("ssh.log"));
    cmd
}

fn run(mut cmd: Command) -> Output {
    cmd.output().expect("run clustercheck")
}

fn ssh_log(home: &Path) -> String {
    std::fs::read_to_string(home.join("ssh.log")).unwrap_or_default()
}

fn report_target(path: &Path) -> String {
    let s = std::fs::read_to_string(path).expect("read report");
    let v: serde_json::Value = serde_json::from_str(&s).expect("parse report");
    v["target"].as_str().unwrap_or_default().to_string()
}

#[test]
fn flags_override_environment() {
    let home = make_temp_home();
    let mut cmd = clustercheck_cmd(&home);
    cmd.env("SSH_HOST", "env-host")
        .env("SSH_USER", "env-user")
        .env("SSH_PORT", "2200")
        .args(["-h", "flag-host", "-u", "flag-user", "-p", "2222"]);
    let out = run(cmd);
    assert_eq!(out.status.code(), Some(1));

    let log = ssh_log(&home);
    assert!(log.contains("-p 2222 flag-user@flag-host"), "{log}");
    assert_eq!(report_target(&home.join("cluster-config.json")), "flag-user@flag-host:2222");
    let _ = std::fs::remove_dir_all(&home);
}

#[test]
fn primary_variables_win_over_legacy_ones() {
    let home = make_temp_home();
    let mut cmd = clustercheck_cmd(&home);
    cmd.env("SSH_HOST", "primary")
        .env("REMOTE_SSH_HOST", "legacy")
        .env("REMOTE_SSH_USER", "legacy-user")
        .env("SSH_PORT", "2200");
    let out = run(cmd);
    assert_eq!(out.status.code(), Some(1));

    let log = ssh_log(&home);
    assert!(log.contains("-p 2200 legacy-user@primary"), "{log}");
    let _ = std::fs::remove_dir_all(&home);
}

#[test]
fn output_file_and_key_come_from_environment() {
    let home = make_temp_home();
    let out_path = home.join("reports/out.json");
    let mut cmd = clustercheck_cmd(&home);
    cmd.env("SSH_HOST", "h")
        .env("SSH_USER", "u")
        .env("SSH_KEY", "/keys/deploy")
        .env("CONFIG_OUTPUT_FILE", &out_path);
    let out = run(cmd);
    assert_eq!(out.status.code(), Some(1));

    assert!(ssh_log(&home).contains("-i /keys/deploy -p 22 u@h"));
    assert_eq!(report_target(&out_path), "u@h:22");
    assert!(!home.join("cluster-config.json").exists());
    let _ = std::fs::remove_dir_all(&home);
}

#[test]
fn missing_user_is_rejected_before_connecting() {
    let home = make_temp_home();
    let mut cmd = clustercheck_cmd(&home);
    cmd.env("SSH_HOST", "h");
    let out = run(cmd);
    assert_eq!(out.status.code(), Some(1));

    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("SSH host and user are required"), "stderr={stderr}");
    assert!(ssh_log(&home).is_empty());
    assert!(!home.join("cluster-config.json").exists());
    let _ = std::fs::remove_dir_all(&home);
}

#[test]
fn profile_env_override_changes_the_namespace() {
    let home = make_temp_home();
    let mut cmd = clustercheck_cmd(&home);
    cmd.env("CLUSTERCHECK_NAMESPACE", "photos-staging")
        .args(["config", "--show", "--json"]);
    let out = run(cmd);
    assert!(out.status.success(), "stderr={}", String::from_utf8_lossy(&out.stderr));

    let v: serde_json::Value = serde_json::from_slice(&out.stdout).expect("json");
    assert_eq!(v["cluster"]["namespace"], "photos-staging");
    assert_eq!(v["runtime"]["name"], "microk8s");
    let _ = std::fs::remove_dir_all(&home);
}
