// CLI integration tests for the leafmap binary.
use std::io::Write;
use std::process::{Command, Stdio};

use serde_json::{Value, json};

fn cmd() -> Command {
    let exe = env!("CARGO_BIN_EXE_leafmap");
    Command::new(exe)
}

fn parse_json(value: &str) -> Value {
    serde_json::from_str(value).expect("valid json")
}

fn run_with_stdin(args: &[&str], input: &str) -> std::process::Output {
    let mut child = cmd()
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("spawn");
    child
        .stdin
        .take()
        .expect("stdin")
        .write_all(input.as_bytes())
        .expect("write stdin");
    child.wait_with_output().expect("wait")
}

fn stderr_notices(output: &std::process::Output) -> Vec<Value> {
    String::from_utf8_lossy(&output.stderr)
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(parse_json)
        .filter(|value| value.get("notice").is_some())
        .collect()
}

#[test]
fn demo_emits_the_flat_sample() {
    let output = cmd().arg("demo").output().expect("demo");
    assert!(output.status.success());
    let flat = parse_json(std::str::from_utf8(&output.stdout).expect("utf8").trim());
    assert_eq!(
        flat,
        json!({
            "key1": "val1", "key2": "val2", "key3": "val3", "key4": "val4",
            "key5": "val5", "key6": "val6", "key7": "val7", "key8": "val8"
        })
    );
}

#[test]
fn flatten_inline_json() {
    let output = cmd()
        .args(["flatten", r#"{"a": {"x": "1"}, "plain": "p"}"#])
        .output()
        .expect("flatten");
    assert!(output.status.success());
    let flat = parse_json(std::str::from_utf8(&output.stdout).expect("utf8").trim());
    assert_eq!(flat, json!({"x": "1", "plain": "p"}));
}

#[test]
fn file_and_stdin_inputs_agree() {
    let document = r#"{"outer": {"inner": {"k": "v"}}, "plain": "p"}"#;
    let temp = tempfile::tempdir().expect("tempdir");
    let path = temp.path().join("doc.json");
    std::fs::write(&path, document).expect("write doc");

    let from_file = cmd()
        .args(["flatten", "-f", path.to_str().unwrap()])
        .output()
        .expect("flatten file");
    assert!(from_file.status.success());

    let from_stdin = run_with_stdin(&["flatten"], document);
    assert!(from_stdin.status.success());

    assert_eq!(from_file.stdout, from_stdin.stdout);
    let flat = parse_json(std::str::from_utf8(&from_file.stdout).expect("utf8").trim());
    assert_eq!(flat, json!({"k": "v", "plain": "p"}));
}

#[test]
fn jsonl_stream_emits_one_object_per_record() {
    let input = "{\"a\":{\"x\":\"1\"}}\n{\"b\":{\"y\":\"2\"}}\n";
    let output = run_with_stdin(&["flatten", "--in", "jsonl"], input);
    assert!(output.status.success());
    let lines = String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(parse_json)
        .collect::<Vec<_>>();
    assert_eq!(lines, vec![json!({"x": "1"}), json!({"y": "2"})]);
}

#[test]
fn auto_mode_detects_record_streams() {
    let input = "{\"a\":{\"x\":\"1\"}}\n{\"b\":{\"y\":\"2\"}}\n";
    let output = run_with_stdin(&["flatten"], input);
    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout).lines().count(), 2);
}

#[test]
fn errors_skip_continues_past_bad_records() {
    let input = "{\"a\":{\"x\":\"1\"}}\nnot json\n{\"b\":{\"y\":\"2\"}}\n";
    let output = run_with_stdin(&["flatten", "--in", "jsonl", "--errors", "skip"], input);
    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout).lines().count(), 2);
    let notices = stderr_notices(&output);
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0]["notice"]["kind"], "skipped-record");
    assert_eq!(notices[0]["notice"]["details"]["line"], 2);
}

#[test]
fn missing_file_exit_code() {
    let temp = tempfile::tempdir().expect("tempdir");
    let path = temp.path().join("absent.json");
    let output = cmd()
        .args(["flatten", "-f", path.to_str().unwrap()])
        .output()
        .expect("flatten");
    assert_eq!(output.status.code().unwrap(), 3);
    let err = parse_json(String::from_utf8_lossy(&output.stderr).trim());
    assert_eq!(err["error"]["kind"], "NotFound");
}

#[test]
fn invalid_json_exit_code() {
    let output = cmd().args(["flatten", "not json"]).output().expect("flatten");
    assert_eq!(output.status.code().unwrap(), 4);
    let err = parse_json(String::from_utf8_lossy(&output.stderr).trim());
    assert_eq!(err["error"]["kind"], "Parse");
    assert!(err["error"].get("hint").is_some());
}

#[test]
fn strict_collision_exit_code() {
    let output = cmd()
        .args(["flatten", "--strict", r#"{"a": {"x": "1"}, "b": {"x": "2"}}"#])
        .output()
        .expect("flatten");
    assert_eq!(output.status.code().unwrap(), 5);
    let err = parse_json(String::from_utf8_lossy(&output.stderr).trim());
    assert_eq!(err["error"]["kind"], "Collision");
    assert_eq!(err["error"]["key"], "x");
    assert!(output.stdout.is_empty());
}

#[test]
fn default_collision_is_last_key_wins() {
    let output = cmd()
        .args(["flatten", r#"{"a": {"x": "1"}, "b": {"x": "2"}}"#])
        .output()
        .expect("flatten");
    assert!(output.status.success());
    let flat = parse_json(std::str::from_utf8(&output.stdout).expect("utf8").trim());
    assert_eq!(flat, json!({"x": "2"}));
    let notices = stderr_notices(&output);
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0]["notice"]["kind"], "shadowed-keys");
    assert_eq!(notices[0]["notice"]["details"]["count"], 1);
}

#[test]
fn skipped_values_notice_and_quiet() {
    let input = r#"{"keep": "yes", "n": 5, "flag": true}"#;
    let noisy = cmd().args(["flatten", input]).output().expect("flatten");
    assert!(noisy.status.success());
    let flat = parse_json(std::str::from_utf8(&noisy.stdout).expect("utf8").trim());
    assert_eq!(flat, json!({"keep": "yes"}));
    let notices = stderr_notices(&noisy);
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0]["notice"]["kind"], "skipped-values");
    assert_eq!(notices[0]["notice"]["details"]["count"], 2);

    let quiet = cmd()
        .args(["flatten", "--quiet", input])
        .output()
        .expect("flatten quiet");
    assert!(quiet.status.success());
    assert!(quiet.stderr.is_empty());
}

#[test]
fn lines_format_emits_key_value_pairs() {
    let output = cmd()
        .args(["flatten", "--format", "lines", r#"{"a": {"x": "1", "y": "2"}}"#])
        .output()
        .expect("flatten");
    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout), "x=1\ny=2\n");
}

#[test]
fn usage_exit_code_for_conflicting_inputs() {
    let output = cmd()
        .args(["flatten", "{}", "-f", "also.json"])
        .output()
        .expect("flatten");
    assert_eq!(output.status.code().unwrap(), 2);
    let err = parse_json(String::from_utf8_lossy(&output.stderr).trim());
    assert_eq!(err["error"]["kind"], "Usage");
}

#[test]
fn empty_input_is_a_parse_error() {
    let output = run_with_stdin(&["flatten"], "   \n");
    assert_eq!(output.status.code().unwrap(), 4);
    let err = parse_json(String::from_utf8_lossy(&output.stderr).trim());
    assert_eq!(err["error"]["kind"], "Parse");
    assert_eq!(err["error"]["message"], "empty input");
}

#[test]
fn version_emits_json_when_piped() {
    let output = cmd().arg("version").output().expect("version");
    assert!(output.status.success());
    let info = parse_json(std::str::from_utf8(&output.stdout).expect("utf8").trim());
    assert_eq!(info["name"], "leafmap");
    assert_eq!(info["version"], env!("CARGO_PKG_VERSION"));
}
