use std::fmt;

use doi_difflens::DiffSummary;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// How the LLM should write quiz questions.
pub const QUESTION_GUIDELINES: &str = "\
Guidelines:
- Ask about the change itself, not general programming knowledge
- Every question must be answerable from the diff and its summary
- Prefer the key files; name the file a question is about
- Exactly one option is correct; the others should be plausible
- Use between 2 and 4 options per question
- Mix question kinds:
  - purpose: why the change was made
  - behavior: what the code now does differently
  - edge-case: inputs or states the change must handle
  - impact: what else in the codebase is affected
  - design: why this approach over an alternative";

const SYSTEM_PROMPT: &str = "\
You are doi, a reviewer who checks that a developer understands the code \
they are about to ship. Many changes are written with AI assistance; your \
questions should reveal whether the author actually knows what their branch does.

{guidelines}

Respond with a JSON object:
{
  \"questions\": [
    {
      \"kind\": \"purpose\" | \"behavior\" | \"edge-case\" | \"impact\" | \"design\",
      \"file\": \"path/to/file.rs\",
      \"question\": \"What happens when ...?\",
      \"options\": [\"...\", \"...\", \"...\", \"...\"],
      \"answer\": \"the correct option, copied verbatim\",
      \"explanation\": \"Why that option is correct\"
    }
  ]
}";

/// Build the system prompt for the quiz-writing LLM.
///
/// # Examples
///
/// ```
/// use doi_quiz::prompt::build_system_prompt;
///
/// let prompt = build_system_prompt();
/// assert!(prompt.contains("edge-case"));
/// assert!(prompt.contains("\"questions\""));
/// ```
pub fn build_system_prompt() -> String {
    SYSTEM_PROMPT.replace("{guidelines}", QUESTION_GUIDELINES)
}

/// Build the user prompt asking for `count` questions about `summary`.
///
/// # Examples
///
/// ```
/// use doi_core::GitDiff;
/// use doi_difflens::generate_diff_summary;
/// use doi_quiz::prompt::build_question_prompt;
///
/// let summary = generate_diff_summary(&GitDiff::default());
/// let prompt = build_question_prompt(&summary, Some("+let x = 1;"), 3);
/// assert!(prompt.contains("Write 3 questions"));
/// assert!(prompt.contains("+let x = 1;"));
/// ```
pub fn build_question_prompt(summary: &DiffSummary, diff_excerpt: Option<&str>, count: usize) -> String {
    let mut prompt = String::from("Quiz the author on the following change.\n\n");
    prompt.push_str(&format!("Overview: {}\n", summary.overview));
    prompt.push_str(&format!("Intent: {}\n", summary.inferred_intent));
    prompt.push_str(&format!(
        "Stats: {} files, +{} -{}\n",
        summary.files_changed.len(),
        summary.stats.lines_added,
        summary.stats.lines_removed
    ));

    if !summary.changes.is_empty() {
        prompt.push_str("\nChanges:\n");
        for change in &summary.changes {
            prompt.push_str(&format!(
                "- {}: {} ({})\n",
                change.category,
                change.description,
                change.files.join(", ")
            ));
        }
    }

    if !summary.key_files.is_empty() {
        prompt.push_str("\nKey files:\n");
        for path in &summary.key_files {
            prompt.push_str(&format!("- {path}\n"));
        }
    }

    if let Some(excerpt) = diff_excerpt {
        prompt.push_str(&format!("\n```diff\n{excerpt}\n```\n"));
    }

    prompt.push_str(&format!(
        "\nWrite {count} {}.\n",
        if count == 1 { "question" } else { "questions" }
    ));
    prompt
}

/// First `max_lines` lines of a patch, with a note on what was cut.
///
/// # Examples
///
/// ```
/// use doi_quiz::prompt::diff_excerpt;
///
/// assert_eq!(diff_excerpt("a\nb\nc", 2), "a\nb\n... (1 more lines truncated)");
/// assert_eq!(diff_excerpt("a\nb", 5), "a\nb");
/// ```
pub fn diff_excerpt(patch: &str, max_lines: usize) -> String {
    let lines: Vec<&str> = patch.lines().collect();
    if lines.len() <= max_lines {
        return lines.join("\n");
    }
    let mut out = lines[..max_lines].join("\n");
    out.push_str(&format!(
        "\n... ({} more lines truncated)",
        lines.len() - max_lines
    ));
    out
}

/// What aspect of the change a question probes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuestionKind {
    Purpose,
    Behavior,
    EdgeCase,
    Impact,
    Design,
}

impl QuestionKind {
    fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().replace(['_', ' '], "-").as_str() {
            "purpose" | "intent" => Some(Self::Purpose),
            "behavior" | "behaviour" => Some(Self::Behavior),
            "edge-case" | "edgecase" => Some(Self::EdgeCase),
            "impact" => Some(Self::Impact),
            "design" => Some(Self::Design),
            _ => None,
        }
    }
}

impl fmt::Display for QuestionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Purpose => write!(f, "purpose"),
            Self::Behavior => write!(f, "behavior"),
            Self::EdgeCase => write!(f, "edge-case"),
            Self::Impact => write!(f, "impact"),
            Self::Design => write!(f, "design"),
        }
    }
}

/// A validated quiz question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizQuestion {
    /// Stable id, see [`question_id`].
    pub id: String,
    pub kind: QuestionKind,
    pub question: String,
    /// File the question is about, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    /// Multiple-choice options; empty for open questions.
    #[serde(default)]
    pub options: Vec<String>,
    /// The correct answer. One of `options` when options are present.
    pub answer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

impl QuizQuestion {
    /// Index of the correct option, if the question is multiple choice.
    pub fn answer_index(&self) -> Option<usize> {
        self.options.iter().position(|o| o == &self.answer)
    }
}

/// Id of a question: the first 12 hex chars of SHA-256 over file and text.
///
/// # Examples
///
/// ```
/// use doi_quiz::prompt::question_id;
///
/// let id = question_id(Some("src/auth.rs"), "Why cache the token?");
/// assert_eq!(id.len(), 12);
/// assert_eq!(id, question_id(Some("src/auth.rs"), "Why cache the token?"));
/// assert_ne!(id, question_id(None, "Why cache the token?"));
/// ```
pub fn question_id(file: Option<&str>, question: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(file.unwrap_or_default().as_bytes());
    hasher.update(question.as_bytes());
    let digest = format!("{:x}", hasher.finalize());
    digest[..12].to_string()
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LlmResponse {
    Wrapped { questions: Vec<LlmQuestion> },
    Bare(Vec<LlmQuestion>),
}

#[derive(Deserialize)]
struct LlmQuestion {
    kind: Option<String>,
    file: Option<String>,
    question: Option<String>,
    #[serde(default)]
    options: Vec<String>,
    answer: Option<String>,
    explanation: Option<String>,
}

/// Parse the LLM JSON response into validated [`QuizQuestion`] entries.
///
/// Handles markdown code fences around JSON and accepts either
/// `{"questions": [...]}` or a bare array. Returns an empty vec on parse
/// failure; entries with an unknown kind, no question text, more than 4
/// options, or an answer outside the options are skipped. A single-letter
/// answer such as `"B"` is resolved to the matching option.
///
/// # Examples
///
/// ```
/// use doi_quiz::prompt::parse_questions_response;
///
/// let json = r#"{"questions":[{"kind":"purpose","question":"Why?","options":["a","b"],"answer":"b"}]}"#;
/// let questions = parse_questions_response(json);
/// assert_eq!(questions.len(), 1);
/// assert_eq!(questions[0].answer_index(), Some(1));
/// ```
pub fn parse_questions_response(response: &str) -> Vec<QuizQuestion> {
    let cleaned = strip_code_fences(response);

    let parsed: LlmResponse = match serde_json::from_str(cleaned) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("warning: failed to parse quiz questions: {e}");
            return Vec::new();
        }
    };
    let raw = match parsed {
        LlmResponse::Wrapped { questions } | LlmResponse::Bare(questions) => questions,
    };

    let mut questions = Vec::new();
    for q in raw {
        let Some(kind) = q.kind.as_deref().and_then(QuestionKind::parse) else {
            continue;
        };
        let Some(text) = q.question.map(|t| t.trim().to_string()).filter(|t| !t.is_empty()) else {
            continue;
        };
        let options: Vec<String> = q
            .options
            .iter()
            .map(|o| o.trim().to_string())
            .filter(|o| !o.is_empty())
            .collect();
        if options.len() == 1 || options.len() > 4 {
            continue;
        }
        let Some(answer) = q.answer.map(|a| a.trim().to_string()).filter(|a| !a.is_empty()) else {
            continue;
        };
        let answer = if options.is_empty() {
            answer
        } else if options.contains(&answer) {
            answer
        } else {
            match crate::present::letter_to_index(&answer).and_then(|i| options.get(i)) {
                Some(option) => option.clone(),
                None => continue,
            }
        };
        let file = q.file.map(|f| f.trim().to_string()).filter(|f| !f.is_empty());

        questions.push(QuizQuestion {
            id: question_id(file.as_deref(), &text),
            kind,
            question: text,
            file,
            options,
            answer,
            explanation: q.explanation.filter(|e| !e.trim().is_empty()),
        });
    }

    questions
}

fn strip_code_fences(s: &str) -> &str {
    let trimmed = s.trim();
    if let Some(rest) = trimmed.strip_prefix("```json") {
        if let Some(inner) = rest.strip_suffix("```") {
            return inner.trim();
        }
    }
    if let Some(rest) = trimmed.strip_prefix("```") {
        if let Some(inner) = rest.strip_suffix("```") {
            return inner.trim();
        }
    }
    trimmed
}
