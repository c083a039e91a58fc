use std::path::Path;

use assert_cmd::Command;
use predicates::str::contains;

mod common;
use common::{write_bmp, write_sidecar, VALID_SIDECAR};

fn annota() -> Command {
    Command::cargo_bin("annota").unwrap()
}

fn create(image: &Path) {
    annota()
        .arg("create")
        .arg(image)
        .args(["--width", "320", "--height", "200"])
        .assert()
        .success();
}

const BOX: &str = r#"{"type":"box","geometry":{"x":0,"y":0,"width":10,"height":5}}"#;

#[test]
fn runs() {
    annota().assert().success();
}

#[test]
fn outputs_tool_name() {
    annota()
        .arg("-V")
        .assert()
        .success()
        .stdout("annota 0.1.0\n");
}

#[test]
fn create_with_explicit_size() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let image = temp.path().join("level1.png");

    annota()
        .arg("create")
        .arg(&image)
        .args(["--width", "1920", "--height", "1080"])
        .assert()
        .success()
        .stdout(contains("level1.meta"))
        .stdout(contains("1920x1080"));

    assert!(temp.path().join("level1.meta").is_file());
}

#[test]
fn create_reads_size_from_image() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let image = temp.path().join("menu.bmp");
    write_bmp(&image, 12, 8);

    annota().arg("create").arg(&image).assert().success();

    annota()
        .arg("show")
        .arg(&image)
        .assert()
        .success()
        .stdout(contains("image 12x8"));
}

#[test]
fn create_records_tool_from_env() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let image = temp.path().join("a.png");

    annota()
        .env("ANNOTA_TOOL", "level-editor")
        .env("ANNOTA_TOOL_VERSION", "3.2.1")
        .arg("create")
        .arg(&image)
        .args(["--width", "2", "--height", "2"])
        .assert()
        .success();

    annota()
        .args(["show", "--output", "json"])
        .arg(&image)
        .assert()
        .success()
        .stdout(contains("\"tool\": \"level-editor\""))
        .stdout(contains("\"tool_version\": \"3.2.1\""));
}

#[test]
fn create_refuses_to_replace_existing_sidecar() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let image = temp.path().join("a.png");
    create(&image);

    annota()
        .arg("create")
        .arg(&image)
        .args(["--width", "1", "--height", "1"])
        .assert()
        .failure()
        .stderr(contains("already exists"));

    annota()
        .arg("create")
        .arg(&image)
        .args(["--width", "1", "--height", "1", "--force"])
        .assert()
        .success();
}

#[test]
fn create_rejects_zero_size() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let image = temp.path().join("a.png");

    annota()
        .arg("create")
        .arg(&image)
        .args(["--width", "0", "--height", "5"])
        .assert()
        .failure()
        .stderr(contains("Image dimensions must be positive, got 0x5"));

    assert!(!temp.path().join("a.meta").exists());
}

#[test]
fn create_without_size_or_image_fails() {
    let temp = tempfile::tempdir().expect("create temp dir");
    annota()
        .arg("create")
        .arg(temp.path().join("missing.png"))
        .assert()
        .failure()
        .stderr(contains("Failed to read image dimensions"));
}

#[test]
fn add_show_and_remove() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let image = temp.path().join("a.png");
    create(&image);

    annota()
        .arg("add")
        .arg(&image)
        .arg("start_button")
        .args(["--display-name", "Start", "--attributes", BOX])
        .args(["--extra", r#"{"z_order": 2}"#])
        .assert()
        .success()
        .stdout(contains("1 annotation(s)"));

    annota()
        .arg("show")
        .arg(&image)
        .assert()
        .success()
        .stdout(contains("start_button"))
        .stdout(contains("box"));

    annota()
        .arg("remove")
        .arg(&image)
        .arg("start_button")
        .assert()
        .success()
        .stdout(contains("0 annotation(s) left"));

    annota()
        .arg("remove")
        .arg(&image)
        .arg("start_button")
        .assert()
        .failure()
        .stderr(contains("No annotation named 'start_button'"));
}

#[test]
fn add_duplicate_requires_overwrite() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let image = temp.path().join("a.png");
    create(&image);

    let add = |overwrite: bool| {
        let mut cmd = annota();
        cmd.arg("add")
            .arg(&image)
            .arg("target")
            .args(["--display-name", "Target", "--attributes", BOX]);
        if overwrite {
            cmd.arg("--overwrite");
        }
        cmd.assert()
    };

    add(false).success();
    add(false).failure().stderr(contains("already exists"));
    add(true).success().stdout(contains("1 annotation(s)"));
}

#[test]
fn add_custom_attributes() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let image = temp.path().join("a.png");
    create(&image);

    annota()
        .arg("add")
        .arg(&image)
        .arg("outline")
        .args([
            "--display-name",
            "Outline",
            "--attributes",
            r#"{"type":"polygon","points":[[0,0],[4,0],[2,3]]}"#,
        ])
        .assert()
        .success();

    annota()
        .args(["show", "--output", "json"])
        .arg(&image)
        .assert()
        .success()
        .stdout(contains("\"type\": \"polygon\""));
}

#[test]
fn add_rejects_ill_shaped_builtin() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let image = temp.path().join("a.png");
    create(&image);

    annota()
        .arg("add")
        .arg(&image)
        .arg("bad")
        .args(["--display-name", "Bad", "--attributes", r#"{"type":"point"}"#])
        .assert()
        .failure()
        .stderr(contains("attributes: missing field `geometry`"));
}

#[test]
fn add_rejects_malformed_json() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let image = temp.path().join("a.png");
    create(&image);

    annota()
        .arg("add")
        .arg(&image)
        .arg("bad")
        .args(["--display-name", "Bad", "--attributes", "{type: box"])
        .assert()
        .failure()
        .stderr(contains("Invalid --attributes value"));
}

#[test]
fn show_missing_sidecar_fails() {
    let temp = tempfile::tempdir().expect("create temp dir");
    annota()
        .arg("show")
        .arg(temp.path().join("nothing.png"))
        .assert()
        .failure()
        .stderr(contains("Sidecar file not found"));
}

#[test]
fn show_rejects_unknown_output_format() {
    let temp = tempfile::tempdir().expect("create temp dir");
    write_sidecar(temp.path(), "menu.meta", VALID_SIDECAR);

    annota()
        .args(["show", "--output", "yaml"])
        .arg(temp.path().join("menu.png"))
        .assert()
        .failure()
        .stderr(contains("Unsupported format"));
}

#[test]
fn scan_reports_valid_and_invalid_sidecars() {
    let temp = tempfile::tempdir().expect("create temp dir");
    write_sidecar(temp.path(), "menu.meta", VALID_SIDECAR);
    write_sidecar(&temp.path().join("nested"), "hud.meta", VALID_SIDECAR);

    annota()
        .arg("scan")
        .arg(temp.path())
        .assert()
        .success()
        .stdout(contains("Scanned 2 sidecar file(s), 0 invalid"));

    let broken = VALID_SIDECAR.replace("\"height\": 720", "\"height\": 0");
    write_sidecar(temp.path(), "broken.meta", &broken);

    annota()
        .arg("scan")
        .arg(temp.path())
        .assert()
        .failure()
        .stdout(contains("[ERROR]"))
        .stdout(contains("file.height"))
        .stdout(contains("Scanned 3 sidecar file(s), 1 invalid"));
}
