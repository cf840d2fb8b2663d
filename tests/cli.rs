use std::io::Write;
use std::path::Path;
use std::process::{Command, Output, Stdio};

const NUMSTAT: &str = "5\t1\tREADME.md\n40\t0\tsrc/x.ts\n";
const NAME_STATUS: &str = "M\tREADME.md\nA\tsrc/x.ts\n";

const QUESTIONS: &str = r#"{"questions":[
    {"kind":"purpose","file":"src/x.ts","question":"What does x.ts add?","options":["Login flow","Logging"],"answer":"Login flow","explanation":"It exports login()."},
    {"kind":"edge-case","file":"src/x.ts","question":"What happens on an empty password?","options":["Crash","Validation error"],"answer":"Validation error"},
    {"kind":"impact","question":"Which docs changed?","options":["README","None"],"answer":"README"}
]}"#;

fn write_inputs(dir: &Path) {
    std::fs::write(dir.join("numstat.txt"), NUMSTAT).unwrap();
    std::fs::write(dir.join("name-status.txt"), NAME_STATUS).unwrap();
    std::fs::write(dir.join("questions.json"), QUESTIONS).unwrap();
}

fn doi(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_doi"))
        .args(args)
        .current_dir(dir)
        .output()
        .unwrap()
}

const FILE_SOURCE: &[&str] = &[
    "--numstat",
    "numstat.txt",
    "--name-status",
    "name-status.txt",
    "--branch",
    "feature/login-flow",
];

fn with_source<'a>(args: &[&'a str]) -> Vec<&'a str> {
    let mut all = args.to_vec();
    all.extend_from_slice(FILE_SOURCE);
    all
}

#[test]
fn analyze_from_files_as_json() {
    let dir = tempfile::tempdir().unwrap();
    write_inputs(dir.path());

    let output = doi(dir.path(), &with_source(&["analyze", "--format", "json"]));
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["inferredIntent"], "add new functionality: login flow");
    assert_eq!(json["changes"][0]["description"], "Added 1 new file (+40 lines)");
    assert_eq!(json["keyFiles"][0], "src/x.ts");
}

#[test]
fn analyze_text_and_markdown() {
    let dir = tempfile::tempdir().unwrap();
    write_inputs(dir.path());

    let output = doi(dir.path(), &with_source(&["analyze"]));
    let text = String::from_utf8_lossy(&output.stdout);
    assert!(text.contains("Intent: add new functionality: login flow"));
    assert!(text.contains("Key files:"));

    let output = doi(dir.path(), &with_source(&["analyze", "--format", "markdown"]));
    let md = String::from_utf8_lossy(&output.stdout);
    assert!(md.starts_with("# Diff Summary"));
}

#[test]
fn numstat_requires_name_status() {
    let dir = tempfile::tempdir().unwrap();
    write_inputs(dir.path());

    let output = doi(dir.path(), &["analyze", "--numstat", "numstat.txt"]);
    assert!(!output.status.success());
}

#[test]
fn commands_lists_git_templates() {
    let dir = tempfile::tempdir().unwrap();

    let output = doi(dir.path(), &["commands", "--base", "develop", "--patch"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<_> = stdout.lines().collect();
    assert_eq!(lines[0], "git rev-parse --abbrev-ref HEAD");
    assert_eq!(lines[1], "git diff --numstat -M develop...HEAD");
    assert_eq!(lines.last().copied(), Some("git diff -M develop...HEAD"));

    let output = doi(dir.path(), &["commands", "--base", "-x"]);
    assert!(!output.status.success());
}

#[test]
fn prompt_from_files() {
    let dir = tempfile::tempdir().unwrap();
    write_inputs(dir.path());
    std::fs::write(dir.path().join("patch.diff"), "+export function login() {}\n").unwrap();

    let mut args = with_source(&["prompt", "--count", "2", "--format", "json"]);
    args.extend_from_slice(&["--patch-file", "patch.diff"]);
    let output = doi(dir.path(), &args);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["questionCount"], 2);
    let user = json["userPrompt"].as_str().unwrap();
    assert!(user.contains("Write 2 questions."));
    assert!(user.contains("+export function login() {}"));
}

#[test]
fn quiz_records_missed_questions() {
    let dir = tempfile::tempdir().unwrap();
    write_inputs(dir.path());

    let mut child = Command::new(env!("CARGO_BIN_EXE_doi"))
        .args(with_source(&["quiz", "--questions", "questions.json"]))
        .current_dir(dir.path())
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();
    // correct, wrong, skipped
    child
        .stdin
        .take()
        .unwrap()
        .write_all(b"a\nA\n\n")
        .unwrap();
    let output = child.wait_with_output().unwrap();
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Question 1/3 [purpose] (src/x.ts)"));
    assert!(stdout.contains("Correct! It exports login()."));
    assert!(stdout.contains("Not quite. The answer is B) Validation error."));
    assert!(stdout.contains("Skipped. The answer is A) README."));
    assert!(stdout.contains("Score: 1/3 correct (1 incorrect, 1 skipped)"));
    assert!(stdout.contains("Saved 2 vibe-debt items"));

    let output = doi(dir.path(), &["debt", "list", "--format", "json"]);
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let records = json.as_array().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["branch"], "feature/login-flow");
    assert_eq!(records[0]["debt"].as_array().unwrap().len(), 2);
    assert!(records[0]["path"]
        .as_str()
        .unwrap()
        .contains("feature-login-flow-"));
}

#[test]
fn quiz_honors_json_format_when_saving() {
    let dir = tempfile::tempdir().unwrap();
    write_inputs(dir.path());

    let mut child = Command::new(env!("CARGO_BIN_EXE_doi"))
        .args(with_source(&[
            "quiz",
            "--questions",
            "questions.json",
            "--format",
            "json",
        ]))
        .current_dir(dir.path())
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();
    child.stdin.take().unwrap().write_all(b"b\n\n\n").unwrap();
    let output = child.wait_with_output().unwrap();
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(!stdout.contains("Saved 3 vibe-debt items"));
    let start = stdout.find("\n{").expect("json record after the quiz");
    let json: serde_json::Value = serde_json::from_str(&stdout[start..]).unwrap();
    assert!(json["savedTo"].as_str().unwrap().contains(".doi/vibe-debt"));
    assert_eq!(json["record"]["debt"].as_array().unwrap().len(), 3);
}

#[test]
fn debt_record_from_results_file() {
    let dir = tempfile::tempdir().unwrap();
    write_inputs(dir.path());
    let results = r#"[
        {
            "question": {
                "id": "0123456789ab",
                "kind": "behavior",
                "question": "What does login() return?",
                "file": "src/x.ts",
                "options": ["A token", "Nothing"],
                "answer": "A token"
            },
            "outcome": "incorrect",
            "userAnswer": "Nothing"
        }
    ]"#;
    std::fs::write(dir.path().join("results.json"), results).unwrap();

    let output = doi(
        dir.path(),
        &with_source(&["debt", "record", "--results", "results.json", "--format", "json"]),
    );
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert!(json["savedTo"].as_str().unwrap().contains(".doi/vibe-debt"));
    assert_eq!(json["record"]["debt"][0]["correctAnswer"], "A token");

    let output = doi(dir.path(), &["debt", "list"]);
    let text = String::from_utf8_lossy(&output.stdout);
    assert!(text.contains("feature/login-flow  0/1 correct  1 debt"));
    assert!(text.contains("[incorrect] What does login() return?"));
}

#[test]
fn debt_list_empty() {
    let dir = tempfile::tempdir().unwrap();
    let output = doi(dir.path(), &["debt", "list"]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("No vibe debt recorded."));
}
