use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::sync::atomic::{AtomicU64, Ordering};

fn clustercheck_cmd(home: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_clustercheck"));
    cmd.current_dir(home);
    cmd.env("HOME", home);
    cmd.env_remove("CLUSTERCHECK_CONFIG");
    cmd.env_remove("CLUSTERCHECK_NAMESPACE");
    cmd.env_remove("CLUSTERCHECK_DEPLOYMENTS");
    cmd.env_remove("SSH_HOST");
    cmd.env_remove("SSH_USER");
    cmd.env_remove("REMOTE_SSH_HOST");
    cmd.env_remove("REMOTE_SSH_USER");
    cmd
}

fn run(home: &Path, args: &[&str]) -> Output {
    clustercheck_cmd(home).args(args).output().expect("run clustercheck")
}

fn make_temp_home() -> PathBuf {
    static HOME_SEQ: AtomicU64 = AtomicU64::new(0);
    let seq = HOME_SEQ.fetch_add(1, Ordering::Relaxed);
    let home = std::env::temp_dir().join(format!("clustercheck-exit-test-{}-{seq}", std::process::id()));
    let _ = std::fs::remove_dir_all(&home);
    std::fs::create_dir_all(&home).expect("create home");
    home
}

#[test]
fn help_exits_0_and_lists_host_option() {
    let home = make_temp_home();
    let out = run(&home, &["--help"]);
    assert_eq!(out.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("--host"), "stdout={stdout}");
    let _ = std::fs::remove_dir_all(&home);
}

#[test]
fn no_target_exits_1() {
    let home = make_temp_home();
    let out = run(&home, &[]);
    assert_eq!(out.status.code(), Some(1));
    let _ = std::fs::remove_dir_all(&home);
}

#[test]
fn unknown_flag_exits_1() {
    let home = make_temp_home();
    let out = run(&home, &["--definitely-not-a-flag"]);
    assert_eq!(out.status.code(), Some(1));
    let _ = std::fs::remove_dir_all(&home);
}

#[test]
fn completion_unknown_shell_exits_1() {
    let home = make_temp_home();
    let out = run(&home, &["completion", "nope"]);
    assert_eq!(out.status.code(), Some(1));
    let _ = std::fs::remove_dir_all(&home);
}

#[test]
fn completion_bash_exits_0() {
    let home = make_temp_home();
    let out = run(&home, &["completion", "bash"]);
    assert_eq!(out.status.code(), Some(0));
    assert!(String::from_utf8_lossy(&out.stdout).contains("clustercheck"));
    let _ = std::fs::remove_dir_all(&home);
}

#[test]
fn missing_profile_file_exits_1() {
    let home = make_temp_home();
    let out = run(
        &home,
        &["--config", "/definitely/not/here.toml", "-h", "h", "-u", "u"],
    );
    assert_eq!(out.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("failed to read config file"), "stderr={stderr}");
    let _ = std::fs::remove_dir_all(&home);
}

#[test]
fn malformed_profile_exits_1() {
    let home = make_temp_home();
    let path = home.join("profile.toml");
    std::fs::write(&path, "[cluster]\nnamespace = 3\n").expect("write");
    let out = clustercheck_cmd(&home)
        .env("CLUSTERCHECK_CONFIG", &path)
        .args(["config", "--show"])
        .output()
        .expect("run clustercheck");
    assert_eq!(out.status.code(), Some(1));
    let _ = std::fs::remove_dir_all(&home);
}
