//! Plain-text rendering of the quiz for whatever UI the host has.

use doi_difflens::DiffSummary;

use crate::debt::{QuizAnswer, QuizOutcome, QuizScore};
use crate::prompt::QuizQuestion;

/// Map an answer letter (`A`..`Z`, any case) to an option index.
///
/// # Examples
///
/// ```
/// use doi_quiz::present::letter_to_index;
///
/// assert_eq!(letter_to_index("A"), Some(0));
/// assert_eq!(letter_to_index(" d "), Some(3));
/// assert_eq!(letter_to_index("AB"), None);
/// assert_eq!(letter_to_index("1"), None);
/// ```
pub fn letter_to_index(letter: &str) -> Option<usize> {
    let mut chars = letter.trim().chars();
    let c = chars.next()?;
    if chars.next().is_some() || !c.is_ascii_alphabetic() {
        return None;
    }
    Some(usize::from(c.to_ascii_uppercase() as u8 - b'A'))
}

/// Inverse of [`letter_to_index`].
pub fn index_to_letter(index: usize) -> Option<char> {
    u8::try_from(index)
        .ok()
        .filter(|i| *i < 26)
        .map(|i| char::from(b'A' + i))
}

/// Opening text shown before the first question.
pub fn format_summary_intro(summary: &DiffSummary) -> String {
    let mut out = String::from("Do you understand this change?\n\n");
    out.push_str(&format!("{}\n", summary.overview));
    if !summary.key_files.is_empty() {
        out.push_str("\nKey files:\n");
        for path in &summary.key_files {
            out.push_str(&format!("  - {path}\n"));
        }
    }
    out
}

/// One question with lettered options. `index` is zero-based.
///
/// # Examples
///
/// ```
/// use doi_quiz::present::format_question;
/// use doi_quiz::prompt::{question_id, QuestionKind, QuizQuestion};
///
/// let q = QuizQuestion {
///     id: question_id(None, "Why?"),
///     kind: QuestionKind::Purpose,
///     question: "Why?".into(),
///     file: None,
///     options: vec!["Speed".into(), "Safety".into()],
///     answer: "Safety".into(),
///     explanation: None,
/// };
/// assert_eq!(
///     format_question(0, 3, &q),
///     "Question 1/3 [purpose]\nWhy?\n  A) Speed\n  B) Safety\n"
/// );
/// ```
pub fn format_question(index: usize, total: usize, question: &QuizQuestion) -> String {
    let mut out = format!("Question {}/{total} [{}]", index + 1, question.kind);
    if let Some(file) = &question.file {
        out.push_str(&format!(" ({file})"));
    }
    out.push('\n');
    out.push_str(&question.question);
    out.push('\n');
    for (i, option) in question.options.iter().enumerate() {
        if let Some(letter) = index_to_letter(i) {
            out.push_str(&format!("  {letter}) {option}\n"));
        }
    }
    out
}

fn labelled_answer(question: &QuizQuestion) -> String {
    match question.answer_index().and_then(index_to_letter) {
        Some(letter) => format!("{letter}) {}", question.answer),
        None => question.answer.clone(),
    }
}

/// Feedback line after the user answers (or skips) a question.
pub fn format_feedback(question: &QuizQuestion, outcome: QuizOutcome) -> String {
    let mut out = match outcome {
        QuizOutcome::Correct => "Correct!".to_string(),
        QuizOutcome::Incorrect => format!("Not quite. The answer is {}.", labelled_answer(question)),
        QuizOutcome::Skipped => format!("Skipped. The answer is {}.", labelled_answer(question)),
    };
    if let Some(explanation) = &question.explanation {
        out.push(' ');
        out.push_str(explanation);
    }
    out
}

/// Final score plus a note on how much vibe debt the quiz produced.
///
/// # Examples
///
/// ```
/// use doi_quiz::present::format_results;
///
/// assert_eq!(
///     format_results(&[]),
///     "Score: 0/0 correct (0 incorrect, 0 skipped)\nNo vibe debt. Ship it.\n"
/// );
/// ```
pub fn format_results(answers: &[QuizAnswer]) -> String {
    let score = QuizScore::from_answers(answers);
    let mut out = format!(
        "Score: {}/{} correct ({} incorrect, {} skipped)\n",
        score.correct, score.total, score.incorrect, score.skipped
    );
    let debt = score.incorrect + score.skipped;
    if debt == 0 {
        out.push_str("No vibe debt. Ship it.\n");
    } else {
        out.push_str(&format!(
            "{debt} {} recorded as vibe debt. Review {} before merging.\n",
            if debt == 1 { "question" } else { "questions" },
            if debt == 1 { "it" } else { "them" }
        ));
    }
    out
}
