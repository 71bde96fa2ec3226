use serde_json::{Value, json};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

const DESCRIPTORS: &str = r#"
enums:
  - name: Mode
    members: [Idle, Busy]
types:
  - name: Settings
    fields:
      - name: Host
        type: string
        required: true
        length: { min: 1, max: 64 }
      - name: Port
        type: u16
        range: { min: 1, max: 65535 }
        default: 8080
      - name: Mode
        type: Mode
      - name: Peers
        type: List<Peer>
  - name: Peer
    fields:
      - name: Address
        type: string
        pattern: "[a-z.]+"
"#;

fn cargo_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_confed"))
}

fn run(dir: &Path, args: &[&str]) -> Output {
    Command::new(cargo_bin())
        .arg("--dir")
        .arg(dir)
        .args(args)
        .output()
        .expect("confed should execute")
}

fn assert_exit_code(output: &Output, expected: i32) {
    let actual = output.status.code().unwrap_or(-1);
    assert_eq!(
        actual,
        expected,
        "unexpected exit code; stdout: {}; stderr: {}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn read_json(path: &Path) -> Value {
    let content = fs::read_to_string(path).expect("document should exist");
    serde_json::from_str(&content).expect("document should be JSON")
}

/// A temp directory holding the descriptors and a generated `Settings` document
fn generated() -> TempDir {
    let dir = TempDir::new().expect("temp dir");
    let descriptors = dir.path().join("settings.yaml");
    fs::write(&descriptors, DESCRIPTORS).expect("descriptors should be writable");

    let output = run(
        dir.path(),
        &[
            "generate",
            "--descriptors",
            descriptors.to_string_lossy().as_ref(),
            "--type",
            "Settings",
        ],
    );
    assert_exit_code(&output, 0);
    dir
}

#[test]
fn generate_writes_schema_and_default_document() {
    let dir = generated();

    assert!(dir.path().join("Settings.definition.json").exists());
    assert_eq!(
        read_json(&dir.path().join("Settings.json")),
        json!({"Port": 8080, "Mode": 0, "Peers": []})
    );
}

#[test]
fn generate_keeps_existing_document() {
    let dir = generated();
    let data = dir.path().join("Settings.json");
    fs::write(&data, r#"{"Host": "kept", "Port": 1}"#).unwrap();

    let descriptors = dir.path().join("settings.yaml");
    let output = run(
        dir.path(),
        &[
            "generate",
            "--descriptors",
            descriptors.to_string_lossy().as_ref(),
            "--type",
            "Settings",
        ],
    );
    assert_exit_code(&output, 0);
    assert_eq!(read_json(&data), json!({"Host": "kept", "Port": 1}));
}

#[test]
fn generate_fails_for_unknown_type() {
    let dir = TempDir::new().unwrap();
    let descriptors = dir.path().join("settings.yaml");
    fs::write(&descriptors, DESCRIPTORS).unwrap();

    let output = run(
        dir.path(),
        &[
            "generate",
            "--descriptors",
            descriptors.to_string_lossy().as_ref(),
            "--type",
            "Missing",
        ],
    );
    assert_exit_code(&output, 1);
    assert!(String::from_utf8_lossy(&output.stderr).contains("Missing"));
}

#[test]
fn validate_reports_missing_required_value() {
    let dir = generated();

    let output = run(dir.path(), &["validate", "--name", "Settings"]);
    assert_exit_code(&output, 1);

    let out = stdout(&output);
    assert!(out.contains("1 issue(s) found"));
    assert!(out.contains("Host: Value is required (required)"));
}

#[test]
fn validate_without_schema_fails() {
    let dir = TempDir::new().unwrap();

    let output = run(dir.path(), &["validate", "--name", "Settings"]);
    assert_exit_code(&output, 1);
    assert!(String::from_utf8_lossy(&output.stderr).contains("Schema file not found"));
}

#[test]
fn set_saves_valid_document() {
    let dir = generated();

    let output = run(dir.path(), &["set", "--name", "Settings", "Host=example", "Port=9000"]);
    assert_exit_code(&output, 0);
    assert!(stdout(&output).contains("saved"));
    assert_eq!(
        read_json(&dir.path().join("Settings.json")),
        json!({"Host": "example", "Port": 9000, "Mode": 0, "Peers": []})
    );

    let output = run(dir.path(), &["validate", "--name", "Settings"]);
    assert_exit_code(&output, 0);
    assert!(stdout(&output).contains("valid"));
}

#[test]
fn set_refuses_to_write_invalid_document() {
    let dir = generated();
    let data = dir.path().join("Settings.json");
    let before = fs::read_to_string(&data).unwrap();

    let output = run(dir.path(), &["set", "--name", "Settings", "Host=example", "Port=0"]);
    assert_exit_code(&output, 1);

    let out = stdout(&output);
    assert!(out.contains("Port"));
    assert!(out.contains("document not saved"));
    assert_eq!(fs::read_to_string(&data).unwrap(), before);
}

#[test]
fn set_adds_array_elements() {
    let dir = generated();

    let output = run(
        dir.path(),
        &[
            "set",
            "--name",
            "Settings",
            "--add",
            "Peers",
            "Host=example",
            "Peers[0].Address=a.example",
        ],
    );
    assert_exit_code(&output, 0);
    assert_eq!(
        read_json(&dir.path().join("Settings.json"))["Peers"],
        json!([{"Address": "a.example"}])
    );
}

#[test]
fn set_rejects_unknown_path() {
    let dir = generated();

    let output = run(dir.path(), &["set", "--name", "Settings", "Nope=1"]);
    assert_exit_code(&output, 1);
    assert!(String::from_utf8_lossy(&output.stderr).contains("Nope"));
}

#[test]
fn show_marks_invalid_nodes() {
    let dir = generated();

    let output = run(dir.path(), &["show", "--name", "Settings"]);
    assert_exit_code(&output, 0);

    let out = stdout(&output);
    let host = out
        .lines()
        .find(|line| line.contains("Host"))
        .expect("host line");
    assert!(host.starts_with('!'));
    assert!(host.contains("(unset)"));
    assert!(out.lines().any(|line| line.contains("Port = 8080")));
}

#[test]
fn config_file_sets_store_directory() {
    let dir = generated();
    let config = dir.path().join("confed.yaml");
    fs::write(
        &config,
        format!("store:\n  data_dir: {}\n", dir.path().display()),
    )
    .unwrap();

    let output = Command::new(cargo_bin())
        .args(["--config", config.to_string_lossy().as_ref()])
        .args(["validate", "--name", "Settings"])
        .output()
        .expect("confed should execute");
    assert_exit_code(&output, 1);
    assert!(stdout(&output).contains("Host"));
}
