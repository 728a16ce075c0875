use assert_cmd::Command;
use predicates::prelude::*;
use std::path::{Path, PathBuf};

fn fixtures() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../test-fixtures")
}

fn cli() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_matter-conformance"));
    cmd.env("RUST_LOG", "error");
    cmd
}

#[test]
fn validate_device_conforming_snapshot() {
    cli()
        .arg("validate-device")
        .arg("--snapshot")
        .arg(fixtures().join("snapshots/on_off_light.json"))
        .assert()
        .success()
        .stdout(predicate::str::contains("conforms"));
}

#[test]
fn validate_device_missing_snapshot_fails() {
    cli()
        .args(["validate-device", "--snapshot", "does-not-exist.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("does-not-exist.json"));
}

#[test]
fn validate_device_types_against_fixture_requirements() {
    cli()
        .arg("validate-device-types")
        .arg("--device-type-data")
        .arg(fixtures().join("device-types"))
        .arg("--snapshot")
        .arg(fixtures().join("snapshots/on_off_light.json"))
        .assert()
        .success()
        .stdout(predicate::str::contains("conforms"));
}

#[test]
fn validate_device_types_reports_findings() {
    let dir = tempfile::tempdir().unwrap();
    // Requires a Level Control server the snapshot does not have.
    std::fs::write(
        dir.path().join("light.json"),
        r#"{"id": "0x0100", "revision": 3, "server_clusters": [{"id": "0x0008"}], "client_clusters": []}"#,
    )
    .unwrap();

    cli()
        .arg("validate-device-types")
        .arg("--device-type-data")
        .arg(dir.path())
        .arg("--snapshot")
        .arg(fixtures().join("snapshots/on_off_light.json"))
        .assert()
        .failure()
        .stdout(predicate::str::contains("finding"));
}

#[test]
fn generate_pics_then_report() {
    let out = tempfile::tempdir().unwrap();
    // Leftovers from an earlier run are removed.
    std::fs::write(out.path().join("stale.xml"), "<clusterPICS/>").unwrap();

    cli()
        .arg("generate-pics")
        .arg("--cluster-data")
        .arg(fixtures().join("cluster_info.json"))
        .arg("--pics-template")
        .arg(fixtures().join("pics-templates"))
        .arg("--pics-output")
        .arg(out.path())
        .arg("--snapshot")
        .arg(fixtures().join("snapshots/on_off_light.json"))
        .assert()
        .success()
        .stdout(predicate::str::contains("PICS files written"));

    assert!(!out.path().join("stale.xml").exists());
    assert!(out.path().join("endpoint1/On-Off Cluster Test Plan.xml").is_file());

    cli()
        .arg("pics-report")
        .arg(out.path().join("endpoint1"))
        .assert()
        .success()
        .stdout(predicate::str::contains("OO.S - true"));
}

#[test]
fn generate_pics_missing_template_dir_fails() {
    let out = tempfile::tempdir().unwrap();
    cli()
        .arg("generate-pics")
        .arg("--cluster-data")
        .arg(fixtures().join("cluster_info.json"))
        .arg("--pics-template")
        .arg(out.path().join("nowhere"))
        .arg("--pics-output")
        .arg(out.path().join("pics"))
        .arg("--snapshot")
        .arg(fixtures().join("snapshots/on_off_light.json"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"));
}

#[test]
fn check_requirements_fixtures_pass() {
    cli()
        .arg("check-requirements")
        .arg(fixtures().join("device-types"))
        .assert()
        .success()
        .stdout(predicate::str::contains("0 validation errors"));
}

#[test]
fn check_requirements_reports_bad_file() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("bad.json"),
        r#"{"id": "0x0100", "revision": 1, "server_clusters": [{"id": "0x0006"}, {"id": "0x0006"}], "client_clusters": []}"#,
    )
    .unwrap();

    cli()
        .arg("check-requirements")
        .arg(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("duplicate cluster"))
        .stdout(predicate::str::contains("1 validation error"));
}
