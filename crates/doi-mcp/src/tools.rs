//! Tool implementations for the doi MCP server.
//!
//! Five tools are exposed: `get_git_commands`, `analyze_diff`,
//! `build_quiz_prompt`, `record_vibe_debt`, and `list_vibe_debt`. Each
//! returns pretty JSON via `CallToolResult`.

use std::path::{Path, PathBuf};

use doi_core::{DoiConfig, GitDiff};
use doi_difflens::parser::{build_git_diff, RawGitOutput};
use doi_difflens::{commands, Analyzer, DiffSummary};
use doi_quiz::present::format_results;
use doi_quiz::prompt::{
    build_question_prompt, build_system_prompt, diff_excerpt, parse_questions_response,
};
use doi_quiz::{DebtStore, QuizAnswer, QuizScore, VibeDebtRecord};
use rmcp::{
    handler::server::{tool::ToolRouter, wrapper::Parameters},
    model::*,
    schemars, tool, tool_router, ErrorData as McpError,
};
use serde::{Deserialize, Serialize};

/// MCP server exposing the diff quiz tools.
///
/// # Examples
///
/// ```
/// use doi_mcp::tools::DoiServer;
/// use std::path::PathBuf;
///
/// let server = DoiServer::new(PathBuf::from("."));
/// ```
#[derive(Clone)]
pub struct DoiServer {
    pub(crate) repo_path: PathBuf,
    pub(crate) config: DoiConfig,
    pub(crate) tool_router: ToolRouter<Self>,
}

// --- Parameter structs ---

/// Parameters for the `get_git_commands` tool.
#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct GetGitCommandsParams {
    /// Base branch to diff against (default: configured base branch).
    pub base: Option<String>,
    /// Also return the full-patch command used for a prompt excerpt.
    pub include_patch: Option<bool>,
}

/// Captured output of the commands from `get_git_commands`.
#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct AnalyzeDiffParams {
    /// Output of `git rev-parse --abbrev-ref HEAD`.
    pub current_branch: String,
    /// Output of the `numstat` command.
    pub numstat: String,
    /// Output of the `name_status` command.
    pub name_status: String,
    /// Output of the `log` command (optional).
    pub log: Option<String>,
    /// Base branch the diff was taken against (default: configured base branch).
    pub base: Option<String>,
}

/// Parameters for the `build_quiz_prompt` tool.
#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct BuildQuizPromptParams {
    /// Output of `git rev-parse --abbrev-ref HEAD`.
    pub current_branch: String,
    /// Output of the `numstat` command.
    pub numstat: String,
    /// Output of the `name_status` command.
    pub name_status: String,
    /// Output of the `log` command (optional).
    pub log: Option<String>,
    /// Base branch the diff was taken against (default: configured base branch).
    pub base: Option<String>,
    /// Output of the `patch` command, embedded as a truncated excerpt.
    pub patch: Option<String>,
    /// Number of questions to ask for (default: configured question count).
    pub count: Option<usize>,
}

/// Parameters for the `record_vibe_debt` tool.
#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct RecordVibeDebtParams {
    /// Output of `git rev-parse --abbrev-ref HEAD`.
    pub current_branch: String,
    /// Output of the `numstat` command.
    pub numstat: String,
    /// Output of the `name_status` command.
    pub name_status: String,
    /// Output of the `log` command (optional).
    pub log: Option<String>,
    /// Base branch the diff was taken against (default: configured base branch).
    pub base: Option<String>,
    /// The quiz questions as JSON, in the shape the quiz prompt asks for.
    pub questions: String,
    /// The developer's answer to each question, in order: an option letter,
    /// the answer text, or null to skip.
    pub answers: Vec<Option<String>>,
    /// Repository path (default: server's configured path).
    pub path: Option<String>,
}

/// Parameters for the `list_vibe_debt` tool.
#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ListVibeDebtParams {
    /// Only records for this branch.
    pub branch: Option<String>,
    /// Repository path (default: server's configured path).
    pub path: Option<String>,
}

// --- Response structs ---

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GitCommandsResponse {
    base_branch: String,
    commands: Vec<GitCommandEntry>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GitCommandEntry {
    name: String,
    command: String,
    args: Vec<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct QuizPromptResponse {
    system_prompt: String,
    user_prompt: String,
    question_count: usize,
    summary: DiffSummary,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RecordResponse {
    saved_to: Option<String>,
    score: QuizScore,
    debt_count: usize,
    results: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DebtListResponse {
    records: Vec<DebtListEntry>,
    total: usize,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DebtListEntry {
    path: String,
    branch: String,
    created_at: String,
    score: QuizScore,
    debt_count: usize,
}

fn mcp_err(msg: impl Into<String>) -> McpError {
    McpError::internal_error(msg.into(), None)
}

fn json_result<T: Serialize>(value: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(value).map_err(|e| mcp_err(e.to_string()))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

#[tool_router]
impl DoiServer {
    /// Create a new server with the given repository path and default config.
    pub fn new(repo_path: PathBuf) -> Self {
        Self::with_config(repo_path, DoiConfig::default())
    }

    /// Create a new server with an explicit configuration.
    pub fn with_config(repo_path: PathBuf, config: DoiConfig) -> Self {
        Self {
            repo_path,
            config,
            tool_router: Self::tool_router(),
        }
    }

    fn resolve_path(&self, path: &Option<String>) -> Result<PathBuf, McpError> {
        let canonical_repo_path = self.repo_path.canonicalize().map_err(|e| {
            mcp_err(format!(
                "Failed to access configured repository path {}: {e}",
                self.repo_path.display()
            ))
        })?;

        let requested_path = match path {
            Some(p) => {
                let input_path = PathBuf::from(p);
                if input_path.is_absolute() {
                    input_path
                } else {
                    canonical_repo_path.join(input_path)
                }
            }
            None => canonical_repo_path.clone(),
        };

        let canonical_requested_path = requested_path.canonicalize().map_err(|e| {
            mcp_err(format!(
                "Failed to resolve path {}: {e}",
                requested_path.display()
            ))
        })?;

        if !canonical_requested_path.starts_with(&canonical_repo_path) {
            return Err(mcp_err(format!(
                "Path {} is outside the configured repository {}",
                canonical_requested_path.display(),
                canonical_repo_path.display()
            )));
        }

        Ok(canonical_requested_path)
    }

    fn base_branch(&self, base: &Option<String>) -> String {
        base.clone()
            .unwrap_or_else(|| self.config.analysis.base_branch.clone())
    }

    fn analyzer(&self) -> Result<Analyzer, McpError> {
        Analyzer::from_config(&self.config.categories, self.config.analysis.key_file_limit)
            .map_err(|e| mcp_err(e.to_string()))
    }

    fn diff_from(
        &self,
        base: &Option<String>,
        current_branch: &str,
        numstat: &str,
        name_status: &str,
        log: &Option<String>,
    ) -> Result<GitDiff, McpError> {
        let raw = RawGitOutput {
            base_branch: self.base_branch(base),
            current_branch: current_branch.to_string(),
            numstat: numstat.to_string(),
            name_status: name_status.to_string(),
            log: log.clone().unwrap_or_default(),
        };
        build_git_diff(&raw).map_err(|e| {
            mcp_err(format!(
                "Failed to parse git output: {e}. Pass the unmodified output of the commands from get_git_commands."
            ))
        })
    }

    fn debt_store(&self, path: &Option<String>) -> Result<DebtStore, McpError> {
        let root = self.resolve_path(path)?;
        Ok(DebtStore::from_config(&root, &self.config.debt))
    }

    #[tool(
        name = "get_git_commands",
        description = "List the git commands whose output the other doi tools need, for the current branch against a base branch. Run each in the repository and pass the raw stdout to analyze_diff, build_quiz_prompt, or record_vibe_debt under the matching parameter name."
    )]
    pub fn get_git_commands(
        &self,
        Parameters(params): Parameters<GetGitCommandsParams>,
    ) -> Result<CallToolResult, McpError> {
        let base = self.base_branch(&params.base);
        let mut cmds = commands::all(&base).map_err(|e| mcp_err(e.to_string()))?;
        if params
            .include_patch
            .unwrap_or(self.config.quiz.include_diff_excerpt)
        {
            cmds.push(commands::patch(&base).map_err(|e| mcp_err(e.to_string()))?);
        }

        let response = GitCommandsResponse {
            base_branch: base,
            commands: cmds
                .into_iter()
                .map(|c| GitCommandEntry {
                    name: c.name.to_string(),
                    command: c.to_string(),
                    args: c.args,
                })
                .collect(),
        };
        json_result(&response)
    }

    #[tool(
        name = "analyze_diff",
        description = "Summarize a branch diff from captured git output: changes grouped by category (new-feature, modified-logic, refactoring, deletion, configuration, testing, documentation), the key files worth reviewing, the inferred intent, and a one-sentence overview."
    )]
    pub fn analyze_diff(
        &self,
        Parameters(params): Parameters<AnalyzeDiffParams>,
    ) -> Result<CallToolResult, McpError> {
        let diff = self.diff_from(
            &params.base,
            &params.current_branch,
            &params.numstat,
            &params.name_status,
            &params.log,
        )?;
        let summary = self.analyzer()?.summarize(&diff);
        json_result(&summary)
    }

    #[tool(
        name = "build_quiz_prompt",
        description = "Build the system and user prompts for writing multiple-choice questions that test whether the developer understands their own change. Send both prompts to a model, then quiz the developer with the questions it returns."
    )]
    pub fn build_quiz_prompt(
        &self,
        Parameters(params): Parameters<BuildQuizPromptParams>,
    ) -> Result<CallToolResult, McpError> {
        let diff = self.diff_from(
            &params.base,
            &params.current_branch,
            &params.numstat,
            &params.name_status,
            &params.log,
        )?;
        let summary = self.analyzer()?.summarize(&diff);
        let count = params
            .count
            .unwrap_or(self.config.quiz.question_count)
            .max(1);
        let excerpt = params
            .patch
            .as_deref()
            .map(|p| diff_excerpt(p, self.config.quiz.max_excerpt_lines));

        let response = QuizPromptResponse {
            system_prompt: build_system_prompt(),
            user_prompt: build_question_prompt(&summary, excerpt.as_deref(), count),
            question_count: count,
            summary,
        };
        json_result(&response)
    }

    #[tool(
        name = "record_vibe_debt",
        description = "Grade the developer's quiz answers and store the questions they missed or skipped as a vibe-debt record under the repository. Returns the score and the saved file path (null when nothing was missed and clean runs are not kept)."
    )]
    pub fn record_vibe_debt(
        &self,
        Parameters(params): Parameters<RecordVibeDebtParams>,
    ) -> Result<CallToolResult, McpError> {
        let diff = self.diff_from(
            &params.base,
            &params.current_branch,
            &params.numstat,
            &params.name_status,
            &params.log,
        )?;
        let summary = self.analyzer()?.summarize(&diff);

        let questions = parse_questions_response(&params.questions);
        if questions.is_empty() {
            return Err(mcp_err(
                "No valid questions found. Pass the questions JSON returned for build_quiz_prompt.",
            ));
        }
        if questions.len() != params.answers.len() {
            return Err(mcp_err(format!(
                "Got {} answers for {} questions; pass null for skipped questions.",
                params.answers.len(),
                questions.len()
            )));
        }

        let answers: Vec<QuizAnswer> = questions
            .into_iter()
            .zip(&params.answers)
            .map(|(q, a)| QuizAnswer::grade(q, a.as_deref()))
            .collect();
        let record = VibeDebtRecord::from_results(&summary, &diff, &answers, chrono::Utc::now());

        let store = self.debt_store(&params.path)?;
        let saved = store.save(&record).map_err(|e| mcp_err(e.to_string()))?;

        let response = RecordResponse {
            saved_to: saved.as_deref().map(display_path),
            score: record.score,
            debt_count: record.debt.len(),
            results: format_results(&answers),
        };
        json_result(&response)
    }

    #[tool(
        name = "list_vibe_debt",
        description = "List stored vibe-debt records, oldest file name first, with each record's score and number of missed questions."
    )]
    pub fn list_vibe_debt(
        &self,
        Parameters(params): Parameters<ListVibeDebtParams>,
    ) -> Result<CallToolResult, McpError> {
        let store = self.debt_store(&params.path)?;
        let records = store.load_all().map_err(|e| mcp_err(e.to_string()))?;

        let records: Vec<DebtListEntry> = records
            .into_iter()
            .filter(|(_, r)| params.branch.as_ref().map_or(true, |b| &r.branch == b))
            .map(|(path, r)| DebtListEntry {
                path: display_path(&path),
                branch: r.branch,
                created_at: r.created_at.to_rfc3339(),
                score: r.score,
                debt_count: r.debt.len(),
            })
            .collect();

        let response = DebtListResponse {
            total: records.len(),
            records,
        };
        json_result(&response)
    }
}

fn display_path(path: &Path) -> String {
    path.display().to_string()
}
