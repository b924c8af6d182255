use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

const INDEX: &str = "quay.io/acme/index:v1";

const CATALOG: &str = r#"{"schema": "olm.package", "name": "etcd", "defaultChannel": "stable"}
{"schema": "olm.bundle", "name": "etcd.v1", "package": "etcd", "image": "quay.io/etcd:v1",
 "properties": [{"type": "olm.package", "value": {"packageName": "etcd", "version": "1.0.0"}},
                {"type": "olm.channel", "value": {"name": "stable"}}]}
"#;

#[allow(deprecated)]
fn dcm_cmd(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("dcm").unwrap();
    cmd.env("HOME", home.path()).env_remove("DCM_IMAGE_MIRROR");
    cmd
}

fn mirror() -> TempDir {
    let mirror = TempDir::new().unwrap();
    let dir = mirror.path().join(INDEX.replace(['/', ':', '@'], "_"));
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("catalog.json"), CATALOG).unwrap();
    mirror
}

#[test]
fn test_migrate_to_default_output_dir() {
    let home = TempDir::new().unwrap();
    let mirror = mirror();

    dcm_cmd(&home)
        .current_dir(home.path())
        .arg("--image-mirror")
        .arg(mirror.path())
        .args(["migrate", INDEX])
        .assert()
        .success()
        .stderr(predicate::str::contains("1 file(s) written"));

    assert!(home.path().join("index").join("etcd").join("index.json").is_file());
}

#[test]
fn test_migrate_rejects_non_empty_output() {
    let home = TempDir::new().unwrap();
    let mirror = mirror();
    let out = home.path().join("out");
    fs::create_dir_all(&out).unwrap();
    fs::write(out.join("existing.json"), "{}").unwrap();

    dcm_cmd(&home)
        .env("DCM_IMAGE_MIRROR", mirror.path())
        .args(["migrate", INDEX, "--output-dir"])
        .arg(&out)
        .assert()
        .failure()
        .stderr(predicate::str::contains("must be empty"));
}

#[test]
fn test_migrate_uses_config_mirror() {
    let home = TempDir::new().unwrap();
    let mirror = mirror();
    let config_dir = home.path().join(".dcm");
    fs::create_dir_all(&config_dir).unwrap();
    fs::write(
        config_dir.join("config.toml"),
        format!(
            "[images]\nmirror = {:?}\n\n[catalog]\nfile-name = \"catalog.json\"\n",
            mirror.path().display().to_string()
        ),
    )
    .unwrap();
    let out = home.path().join("out");

    dcm_cmd(&home)
        .args(["migrate", INDEX, "-o"])
        .arg(&out)
        .assert()
        .success();

    assert!(out.join("etcd").join("catalog.json").is_file());
}
