use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

struct Workspace {
    dir: TempDir,
    config_dir: TempDir,
    cache_dir: TempDir,
}

impl Workspace {
    fn new() -> Self {
        Self {
            dir: TempDir::new().expect("work dir"),
            config_dir: TempDir::new().expect("config dir"),
            cache_dir: TempDir::new().expect("cache dir"),
        }
    }

    fn file(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        fs::write(&path, contents).expect("write fixture");
        path
    }

    fn run(&self, args: &[&str]) -> Output {
        let exe = env!("CARGO_BIN_EXE_contentcmp_cli");
        Command::new(exe)
            .args(args)
            .env("XDG_CONFIG_HOME", self.config_dir.path())
            .env("XDG_CACHE_HOME", self.cache_dir.path())
            .env("APPDATA", self.config_dir.path())
            .env("LOCALAPPDATA", self.cache_dir.path())
            .env("HOME", self.config_dir.path())
            .env("RUST_LOG", "warn")
            .output()
            .expect("failed to run contentcmp_cli")
    }

    fn run_json(&self, args: &[&str], expected_code: i32) -> Value {
        let output = self.run(args);
        assert_eq!(
            output.status.code(),
            Some(expected_code),
            "unexpected exit status\n{}",
            String::from_utf8_lossy(&output.stderr)
        );
        let stdout = String::from_utf8(output.stdout).expect("stdout not utf-8");
        serde_json::from_str(&stdout).expect("invalid json output")
    }
}

fn path_str(path: &Path) -> &str {
    path.to_str().expect("utf-8 path")
}

#[test]
fn test_text_identical_files_pass() {
    let ws = Workspace::new();
    let expected = ws.file("expected.txt", "alpha\nbeta\ngamma\n");
    let actual = ws.file("actual.txt", "alpha\nbeta\ngamma\n");

    let report = ws.run_json(
        &["text", path_str(&expected), path_str(&actual), "--format", "json"],
        0,
    );

    assert!(report["summary"].as_array().unwrap().is_empty());
    assert!(report["details"].as_array().unwrap().is_empty());
    assert!(report["statistics"]
        .as_str()
        .unwrap()
        .contains("match: 100.00%"));
}

#[test]
fn test_text_mismatch_exits_with_failure_code() {
    let ws = Workspace::new();
    let expected = ws.file("expected.txt", "alpha\nbeta\ngamma\n");
    let actual = ws.file("actual.txt", "alpha\nBETA\ngamma\n");

    let report = ws.run_json(
        &["text", path_str(&expected), path_str(&actual), "--format", "json"],
        2,
    );

    let details = report["details"].as_array().unwrap();
    assert_eq!(details.len(), 1);
    assert_eq!(details[0]["kind"], "MISMATCH");
    assert_eq!(details[0]["expected_line"], 2);
    assert!(details[0]["note"].as_str().unwrap().contains("letter case"));
}

#[test]
fn test_text_missing_line_is_realigned() {
    let ws = Workspace::new();
    let expected = ws.file("expected.txt", "one\ntwo\nthree\n");
    let actual = ws.file("actual.txt", "one\nthree\n");

    let report = ws.run_json(
        &[
            "text",
            path_str(&expected),
            path_str(&actual),
            "--format",
            "json",
            "--verbose",
        ],
        2,
    );

    let kinds: Vec<&str> = report["details"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["kind"].as_str().unwrap())
        .collect();
    assert_eq!(kinds, vec!["MATCHED", "MISSING", "MATCHED"]);

    let messages: Vec<&str> = report["summary"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["message"].as_str().unwrap())
        .collect();
    assert_eq!(messages, vec!["content size differs", "line count differs"]);
}

#[test]
fn test_diff_mode_prints_transcript_and_exits_zero() {
    let ws = Workspace::new();
    let expected = ws.file("expected.txt", "a\nb\n");
    let actual = ws.file("actual.txt", "a\nc\nb\n");

    let output = ws.run(&["text", path_str(&expected), path_str(&actual), "--mode", "diff"]);

    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("c (missing in EXPECTED)"));
    assert!(stdout.contains("[found at ACTUAL line 3]"));
}

#[test]
fn test_text_report_written_to_file() {
    let ws = Workspace::new();
    let expected = ws.file("expected.txt", "x\n");
    let actual = ws.file("actual.txt", "x\n");
    let out = ws.dir.path().join("report.html");

    let output = ws.run(&[
        "text",
        path_str(&expected),
        path_str(&actual),
        "--format",
        "html",
        "--output",
        path_str(&out),
    ]);

    assert_eq!(output.status.code(), Some(0));
    assert!(output.stdout.is_empty());
    let html = fs::read_to_string(&out).unwrap();
    assert!(html.starts_with("<div class=\"comparison\">"));
    assert!(html.contains("class=\"statistics\""));
}

#[test]
fn test_missing_input_file_is_an_error() {
    let ws = Workspace::new();
    let actual = ws.file("actual.txt", "x\n");
    let missing = ws.dir.path().join("nope.txt");

    let output = ws.run(&["text", path_str(&missing), path_str(&actual)]);

    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn test_csv_identity_join_reports_missing_records() {
    let ws = Workspace::new();
    let expected = ws.file("expected.csv", "id,name,qty\n1,apple,3\n2,pear,5\n");
    let actual = ws.file("actual.csv", "id,name,qty\n1,apple,4\n3,plum,1\n");

    let report = ws.run_json(
        &[
            "csv",
            path_str(&expected),
            path_str(&actual),
            "--identity",
            "id",
            "--format",
            "json",
        ],
        2,
    );

    let failed: Vec<&str> = report["failed_identities"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap())
        .collect();
    assert_eq!(failed, vec!["1", "2", "3"]);
    assert_eq!(report["expected_row_count"], 2);
    assert_eq!(report["actual_row_count"], 2);

    let discrepancies = report["discrepancies"].as_array().unwrap();
    assert_eq!(discrepancies.len(), 3);
    let rendered: Vec<String> = discrepancies.iter().map(|row| row.to_string()).collect();
    assert!(rendered.iter().any(|row| row.contains("RECORD MISSING IN ACTUAL")));
    assert!(rendered.iter().any(|row| row.contains("RECORD MISSING IN EXPECTED")));
    assert!(rendered.iter().any(|row| row.contains("\"qty\"")));
}

#[test]
fn test_csv_field_mapping_pass() {
    let ws = Workspace::new();
    let expected = ws.file("expected.csv", "id,amount\n1,10\n2,20\n");
    let actual = ws.file("actual.csv", "key,total\n2,20\n1,10\n");

    let output = ws.run(&[
        "csv",
        path_str(&expected),
        path_str(&actual),
        "--identity",
        "id",
        "--actual-identity",
        "key",
        "--map",
        "amount=total",
    ]);

    assert_eq!(
        output.status.code(),
        Some(0),
        "{}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("success rate: 100.00%"));
}

#[test]
fn test_csv_unknown_identity_column_is_an_error() {
    let ws = Workspace::new();
    let expected = ws.file("expected.csv", "id,name\n1,a\n");
    let actual = ws.file("actual.csv", "id,name\n1,a\n");

    let output = ws.run(&[
        "csv",
        path_str(&expected),
        path_str(&actual),
        "--identity",
        "code",
    ]);

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("code"));
}

#[test]
fn test_config_command_creates_default_file() {
    let ws = Workspace::new();

    let output = ws.run(&["config"]);

    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8(output.stdout).unwrap();
    let path = PathBuf::from(stdout.trim());
    assert!(path.ends_with("contentcmp.toml"));
    assert!(path.exists());
    let contents = fs::read_to_string(&path).unwrap();
    assert!(contents.contains("mode = \"thorough\""));
}
