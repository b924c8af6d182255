use assert_cmd::Command;
use predicates::prelude::*;

#[allow(deprecated)]
fn dcm_cmd() -> Command {
    Command::cargo_bin("dcm").unwrap()
}

#[test]
fn test_version_command() {
    dcm_cmd()
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("dcm "));
}

#[test]
fn test_version_flag() {
    dcm_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_unknown_command_fails() {
    dcm_cmd().arg("frobnicate").assert().failure();
}
