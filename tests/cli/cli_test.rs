//! CLI contract tests.

use std::io::Write;

use assert_cmd::Command;

fn bin() -> Command {
    Command::cargo_bin("checkup-bot").expect("binary should build")
}

#[test]
fn help_lists_subcommands() {
    let output = bin().arg("--help").output().expect("should run");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("start"));
    assert!(stdout.contains("validate"));
}

#[test]
fn validate_accepts_good_config() {
    let mut file = tempfile::NamedTempFile::new().expect("should create temp file");
    writeln!(file, "[chat]\nchannel_id = \"-100\"").expect("should write config");

    bin()
        .arg("validate")
        .arg("--config")
        .arg(file.path())
        .assert()
        .success();
}

#[test]
fn validate_rejects_missing_config() {
    let dir = tempfile::tempdir().expect("should create temp dir");
    bin()
        .arg("validate")
        .arg("--config")
        .arg(dir.path().join("nope.toml"))
        .assert()
        .failure();
}

#[test]
fn start_fails_without_token() {
    let home = tempfile::tempdir().expect("should create temp dir");
    let mut file = tempfile::NamedTempFile::new_in(home.path()).expect("should create temp file");
    writeln!(
        file,
        "[chat]\nchannel_id = \"-100\"\nbot_token_env = \"CHECKUP_BOT_CLI_TEST_NO_TOKEN\""
    )
    .expect("should write config");

    bin()
        .env("HOME", home.path())
        .env_remove("CHECKUP_BOT_CLI_TEST_NO_TOKEN")
        .arg("start")
        .arg("--config")
        .arg(file.path())
        .assert()
        .failure();
}
