use assert_cmd::Command;
use predicates::prelude::*;

const ENV_OVERRIDES: [&str; 16] = [
    "SCAN_DIR",
    "FULLY_INDEXED_DIR",
    "PARTIAL_INDEXED_DIR",
    "FAILED_DIR",
    "LOG_DIR",
    "TESSERACT_CMD",
    "POPPLER_PATH",
    "OCR_DPI",
    "HOST",
    "PORT",
    "MAX_RETRIES",
    "RETRY_DELAY",
    "BATCH_DELAY",
    "PROCESS_DELAY",
    "LOG_LEVEL",
    "SCANROUTE_PROFILE",
];

fn scanroute() -> Command {
    let mut cmd = Command::cargo_bin("scanroute").unwrap();
    for key in ENV_OVERRIDES {
        cmd.env_remove(key);
    }
    cmd
}

#[test]
fn config_init_then_show() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");

    scanroute()
        .arg("--config")
        .arg(&path)
        .args(["config", "init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created configuration file"));

    scanroute()
        .arg("--config")
        .arg(&path)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"scan_dir\": \"incoming-scan\""));
}

#[test]
fn config_set_then_get() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");

    scanroute()
        .arg("--config")
        .arg(&path)
        .args(["config", "set", "server.port", "9100"])
        .assert()
        .success();

    scanroute()
        .arg("--config")
        .arg(&path)
        .args(["config", "get", "server.port"])
        .assert()
        .success()
        .stdout(predicate::str::diff("9100\n"));
}

#[test]
fn config_get_honours_environment() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");

    scanroute()
        .arg("--config")
        .arg(&path)
        .env("OCR_DPI", "300")
        .args(["config", "get", "ocr.dpi"])
        .assert()
        .success()
        .stdout(predicate::str::diff("300\n"));
}

#[test]
fn config_set_unknown_key_fails() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");

    scanroute()
        .arg("--config")
        .arg(&path)
        .args(["config", "set", "ocr.nonsense", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn process_missing_file_fails() {
    let dir = tempfile::tempdir().unwrap();

    scanroute()
        .current_dir(dir.path())
        .args(["process", "missing.pdf"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Input file not found"));
}

#[test]
fn missing_explicit_config_fails() {
    let dir = tempfile::tempdir().unwrap();

    scanroute()
        .arg("--config")
        .arg(dir.path().join("absent.json"))
        .args(["batch", "--dry-run"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Config file not found"));
}

#[test]
fn batch_on_empty_scan_folder() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir(dir.path().join("scan")).unwrap();

    scanroute()
        .env("SCAN_DIR", dir.path().join("scan"))
        .current_dir(dir.path())
        .args(["batch", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No documents to process"));
}
