use serde_json::Value;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::time::{SystemTime, UNIX_EPOCH};

struct TempDirGuard {
    path: PathBuf,
}

impl TempDirGuard {
    fn new(prefix: &str) -> Self {
        let unique = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock should be after unix epoch")
            .as_nanos();
        let path = std::env::temp_dir().join(format!(
            "ucr-cli-{prefix}-{}-{unique}",
            std::process::id()
        ));
        fs::create_dir_all(&path).expect("temp dir should be created");
        Self { path }
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempDirGuard {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.path);
    }
}

fn run_ucr<I, S>(args: I) -> Output
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let bin = env!("CARGO_BIN_EXE_ucr");
    Command::new(bin)
        .args(args)
        .output()
        .expect("ucr command should execute")
}

fn assert_success(output: &Output) {
    if !output.status.success() {
        panic!(
            "command failed with status {:?}\nstdout:\n{}\nstderr:\n{}",
            output.status.code(),
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr),
        );
    }
}

fn assert_failure(output: &Output) {
    if output.status.success() {
        panic!(
            "command unexpectedly succeeded\nstdout:\n{}\nstderr:\n{}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr),
        );
    }
}

fn stdout_text(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr_text(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn parse_json_stdout(output: &Output) -> Value {
    serde_json::from_slice::<Value>(&output.stdout).unwrap_or_else(|e| {
        panic!(
            "expected valid JSON stdout, got error: {e}\nstdout:\n{}",
            String::from_utf8_lossy(&output.stdout)
        )
    })
}

fn complete_record_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../ucr-kernel/tests/fixtures/complete_record.json")
}

fn complete_record() -> Value {
    let path = complete_record_path();
    let text = fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("failed to read {}: {e}", path.display()));
    serde_json::from_str(&text).expect("fixture should be valid JSON")
}

fn write_record(path: &Path, record: &Value) {
    let text = serde_json::to_string_pretty(record).expect("record should serialize");
    fs::write(path, text).expect("record should be written");
}

const LINEAGE: &str = "5f2c9a1e-7b3d-4c8e-9a6f-1d2e3f4a5b6c";

#[test]
fn modules_json_lists_builtin_registry() {
    let output = run_ucr(["modules", "--json"]);
    assert_success(&output);
    let payload = parse_json_stdout(&output);
    let ids: Vec<&str> = payload
        .as_array()
        .expect("modules should be an array")
        .iter()
        .filter_map(|m| m["id"].as_str())
        .collect();
    assert_eq!(ids.len(), 5);
    assert!(ids.contains(&"keyword-generation"));
    assert!(ids.contains(&"guardrail-audit"));
}

#[test]
fn modules_reads_toml_config() {
    let tmp = TempDirGuard::new("modules-config");
    let config = tmp.path().join("modules.toml");
    fs::write(
        &config,
        r#"
[[module]]
id = "brand-audit"
name = "Brand audit"
required_sections = ["A"]

[[module.entity_checks]]
id = "domain"
metric = "brand_domain"
"#,
    )
    .expect("config should be written");

    let output = run_ucr([
        "modules",
        "--config",
        config.to_str().expect("utf-8 path"),
        "--json",
    ]);
    assert_success(&output);
    let payload = parse_json_stdout(&output);
    assert_eq!(payload[0]["id"], "brand-audit");
    assert_eq!(payload[0]["entity_checks"][0]["min"], 1);
}

#[test]
fn check_admits_complete_record_with_verifiable_trace() {
    let record = complete_record_path();
    let output = run_ucr([
        "check",
        record.to_str().expect("utf-8 path"),
        "--module",
        "keyword-generation",
        "--json",
    ]);
    assert_success(&output);
    let payload = parse_json_stdout(&output);
    assert_eq!(payload["admitted"], true);
    assert_eq!(payload["report"]["status"], "ready");
    assert_eq!(payload["audit"]["admitted"], true);
    assert!(payload["audit"]["trace_digest"].as_str().is_some());
    assert_eq!(payload["audit"]["entries"][0]["rule_id"], "lifecycle.status");
}

#[test]
fn check_reports_missing_requirements_without_failing() {
    let tmp = TempDirGuard::new("check-missing");
    let mut record = complete_record();
    record["sections"]
        .as_object_mut()
        .expect("sections should be an object")
        .remove("competitive_set");
    let path = tmp.path().join("record.json");
    write_record(&path, &record);

    let output = run_ucr([
        "check",
        path.to_str().expect("utf-8 path"),
        "--module",
        "competitor-analysis",
    ]);
    assert_success(&output);
    let text = stdout_text(&output);
    assert!(text.contains("Admitted: no"));
    assert!(text.contains("critical"));
}

#[test]
fn check_unknown_module_fails() {
    let record = complete_record_path();
    let output = run_ucr([
        "check",
        record.to_str().expect("utf-8 path"),
        "--module",
        "no-such-module",
    ]);
    assert_failure(&output);
    assert!(stderr_text(&output).contains("unknown module `no-such-module`"));
}

#[test]
fn score_json_grades_complete_record_high() {
    let record = complete_record_path();
    let output = run_ucr(["score", record.to_str().expect("utf-8 path"), "--json"]);
    assert_success(&output);
    let payload = parse_json_stdout(&output);
    assert_eq!(payload["overall"], 100);
    assert_eq!(payload["grade"], "high");
}

#[test]
fn scan_blocks_excluded_terms_under_hard_exclusion() {
    let record = complete_record_path();
    let output = run_ucr([
        "scan",
        record.to_str().expect("utf-8 path"),
        "--text",
        "Cheap Brooks alternatives",
        "--json",
    ]);
    assert_success(&output);
    let payload = parse_json_stdout(&output);
    assert_eq!(payload["blocked"], true);
    assert!(payload["text"].is_null());
    assert_eq!(payload["violations"].as_array().map(Vec::len), Some(2));
}

#[test]
fn save_history_diff_restore_flow() {
    let tmp = TempDirGuard::new("history");
    let store = tmp.path().join("history.jsonl");
    let store_arg = store.to_str().expect("utf-8 path");
    let record_path = tmp.path().join("record.json");
    let record_arg = record_path.to_str().expect("utf-8 path");

    let mut record = complete_record();
    write_record(&record_path, &record);
    let first = run_ucr(["save", record_arg, "--store", store_arg, "--json"]);
    assert_success(&first);
    assert_eq!(parse_json_stdout(&first)["snapshot"]["version"], 1);

    let again = run_ucr(["save", record_arg, "--store", store_arg, "--json"]);
    assert_success(&again);
    let again = parse_json_stdout(&again);
    assert_eq!(again["created"], false);
    assert_eq!(again["snapshot"]["version"], 1);

    record["sections"]["brand_identity"]["domain"] = Value::from("acme.run");
    write_record(&record_path, &record);
    let second = run_ucr(["save", record_arg, "--store", store_arg, "--json"]);
    assert_success(&second);
    assert_eq!(parse_json_stdout(&second)["snapshot"]["version"], 2);

    let history = run_ucr(["history", LINEAGE, "--store", store_arg, "--json"]);
    assert_success(&history);
    assert_eq!(parse_json_stdout(&history)["count"], 2);

    let diff = run_ucr(["diff", LINEAGE, "1", "2", "--store", store_arg, "--json"]);
    assert_success(&diff);
    let diff = parse_json_stdout(&diff);
    assert_eq!(diff["changes"][0]["field"], "brand_identity.domain");
    assert_eq!(diff["changes"][0]["old_value"], "acmerunning.com");
    assert_eq!(diff["changes"][0]["new_value"], "acme.run");

    let restore = run_ucr(["restore", LINEAGE, "1", "--store", store_arg, "--json"]);
    assert_success(&restore);
    let restore = parse_json_stdout(&restore);
    assert_eq!(restore["snapshot"]["version"], 3);
    assert_eq!(restore["restored_from"], 1);

    let check = run_ucr(["diff", LINEAGE, "1", "3", "--store", store_arg, "--json"]);
    assert_success(&check);
    assert_eq!(
        parse_json_stdout(&check)["changes"].as_array().map(Vec::len),
        Some(0)
    );
}

#[test]
fn restore_missing_version_fails() {
    let tmp = TempDirGuard::new("restore-missing");
    let store = tmp.path().join("history.jsonl");
    let store_arg = store.to_str().expect("utf-8 path");
    let record = complete_record_path();
    assert_success(&run_ucr([
        "save",
        record.to_str().expect("utf-8 path"),
        "--store",
        store_arg,
    ]));

    let output = run_ucr(["restore", LINEAGE, "9", "--store", store_arg]);
    assert_failure(&output);
    assert!(stderr_text(&output).contains("snapshot not found"));
}

#[test]
fn history_rejects_malformed_lineage() {
    let output = run_ucr(["history", "not-a-uuid"]);
    assert_failure(&output);
    assert!(stderr_text(&output).contains("invalid lineage id"));
}

#[test]
fn save_rejects_record_without_lineage() {
    let tmp = TempDirGuard::new("save-no-lineage");
    let store = tmp.path().join("history.jsonl");
    let mut record = complete_record();
    record
        .as_object_mut()
        .expect("record should be an object")
        .remove("lineage_id");
    let path = tmp.path().join("record.json");
    write_record(&path, &record);

    let output = run_ucr([
        "save",
        path.to_str().expect("utf-8 path"),
        "--store",
        store.to_str().expect("utf-8 path"),
    ]);
    assert_failure(&output);
    assert!(stderr_text(&output).contains("missing field `lineage_id`"));
    assert!(!store.exists());
}
