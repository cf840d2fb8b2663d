use chrono::{TimeZone, Utc};
use doi_core::{ChangeType, ChangedFile, DiffStats, GitDiff};
use doi_difflens::generate_diff_summary;
use doi_quiz::present::{format_question, format_results};
use doi_quiz::prompt::{build_question_prompt, parse_questions_response};
use doi_quiz::{DebtStore, QuizAnswer, QuizOutcome};

fn diff() -> GitDiff {
    let files = vec![
        ChangedFile::new("src/auth.rs", ChangeType::Modified, 30, 12),
        ChangedFile::new("src/auth.test.ts", ChangeType::Added, 25, 0),
        ChangedFile::new("Cargo.toml", ChangeType::Modified, 1, 1),
    ];
    GitDiff {
        base_branch: "main".into(),
        current_branch: "fix/token-refresh".into(),
        stats: DiffStats::from_files(&files),
        files,
        commits: Vec::new(),
    }
}

const LLM_REPLY: &str = r#"```json
{
  "questions": [
    {
      "kind": "behavior",
      "file": "src/auth.rs",
      "question": "What does the client do after a 401?",
      "options": ["Gives up", "Refreshes the token once", "Retries forever"],
      "answer": "Refreshes the token once",
      "explanation": "refresh() runs before a single retry."
    },
    {
      "kind": "edge-case",
      "file": "src/auth.rs",
      "question": "What if the refresh itself fails?",
      "options": ["The original error is returned", "It panics"],
      "answer": "A"
    },
    {
      "kind": "impact",
      "question": "Which dependency changed?",
      "options": ["none", "reqwest"],
      "answer": "reqwest"
    }
  ]
}
```"#;

#[test]
fn quiz_round_trip_to_vibe_debt() {
    let diff = diff();
    let summary = generate_diff_summary(&diff);

    let prompt = build_question_prompt(&summary, None, 3);
    assert!(prompt.contains("Intent: fix a bug: token refresh"));

    let questions = parse_questions_response(LLM_REPLY);
    assert_eq!(questions.len(), 3);
    assert_eq!(questions[1].answer, "The original error is returned");
    assert!(format_question(0, questions.len(), &questions[0]).contains("  B) Refreshes the token once"));

    let answers = vec![
        QuizAnswer::grade(questions[0].clone(), Some("B")),
        QuizAnswer::grade(questions[1].clone(), Some("b")),
        QuizAnswer::grade(questions[2].clone(), None),
    ];
    let outcomes: Vec<_> = answers.iter().map(|a| a.outcome).collect();
    assert_eq!(
        outcomes,
        vec![QuizOutcome::Correct, QuizOutcome::Incorrect, QuizOutcome::Skipped]
    );
    assert!(format_results(&answers).starts_with("Score: 1/3 correct"));

    let now = Utc.with_ymd_and_hms(2026, 10, 19, 9, 30, 0).unwrap();
    let record = doi_quiz::VibeDebtRecord::from_results(&summary, &diff, &answers, now);

    let dir = tempfile::tempdir().unwrap();
    let store = DebtStore::new(dir.path().join(".doi/vibe-debt"));
    let path = store.save(&record).unwrap().expect("record has debt");
    assert_eq!(
        path.file_name().unwrap().to_string_lossy(),
        "fix-token-refresh-20261019-093000.json"
    );

    let loaded = store.load(&path).unwrap();
    assert_eq!(loaded.debt.len(), 2);
    assert_eq!(loaded.debt[0].question_id, questions[1].id);
    assert_eq!(loaded.score.total, 3);
    assert_eq!(loaded.intent, "fix a bug: token refresh");
}
