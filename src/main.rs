use std::io::{BufRead, IsTerminal, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;
use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use miette::{Context, IntoDiagnostic, Result};

use doi_core::{DoiConfig, GitDiff, OutputFormat};
use doi_difflens::parser::{build_git_diff, RawGitOutput};
use doi_difflens::{commands, Analyzer, DiffSummary};
use doi_quiz::present::{format_feedback, format_question, format_results, format_summary_intro};
use doi_quiz::prompt::{
    build_question_prompt, build_system_prompt, diff_excerpt, parse_questions_response,
};
use doi_quiz::{DebtStore, QuizAnswer, VibeDebtRecord};

#[derive(Parser)]
#[command(
    name = "doi",
    version,
    about = "Do I understand this? A comprehension quiz for your own diff",
    long_about = "doi checks that you understand the branch you are about to ship.\n\n\
                   It summarizes the diff against a base branch, builds a prompt for an LLM to\n\
                   write multiple-choice questions about it, quizzes you, and records the\n\
                   questions you missed as vibe debt.\n\n\
                   Examples:\n  \
                     doi analyze --base main          Summarize the current branch\n  \
                     doi prompt --count 3             Print a quiz prompt for an LLM\n  \
                     doi quiz --questions q.json      Take the quiz in the terminal\n  \
                     doi debt list                    Show recorded vibe debt\n  \
                     doi mcp                          Serve the tools over MCP"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Path to configuration file (default: .doi.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(
        long,
        global = true,
        default_value = "text",
        long_help = "Output format for command results.\n\n\
                       Formats:\n  \
                         text      Human-readable summaries (default)\n  \
                         json      Machine-readable JSON with camelCase keys\n  \
                         markdown  GitHub-flavored Markdown"
    )]
    format: OutputFormat,

    /// Enable verbose output
    #[arg(long, short, global = true)]
    verbose: bool,

    /// When to use colors
    #[arg(long, global = true, default_value = "auto")]
    color: ColorChoice,
}

/// Where the diff comes from: git in `--repo`, or captured output files.
#[derive(Args)]
struct DiffSource {
    /// Base branch to diff against (default: analysis.base_branch, "main")
    #[arg(long)]
    base: Option<String>,

    /// Repository to run git in
    #[arg(long, default_value = ".")]
    repo: PathBuf,

    /// Read `git diff --numstat` output from a file instead of running git
    #[arg(long, requires = "name_status")]
    numstat: Option<PathBuf>,

    /// Read `git diff --name-status` output from a file
    #[arg(long, requires = "numstat")]
    name_status: Option<PathBuf>,

    /// Read the `doi commands` log output from a file
    #[arg(long, requires = "numstat")]
    log: Option<PathBuf>,

    /// Branch name to report when reading from files (default: HEAD)
    #[arg(long, requires = "numstat")]
    branch: Option<String>,
}

#[derive(Subcommand)]
enum Command {
    /// Summarize the current branch's changes
    #[command(long_about = "Summarize the current branch's changes.\n\n\
        Groups changed files by category, ranks the key files, infers the intent of\n\
        the branch, and writes a one-sentence overview. Runs git by default; pass\n\
        --numstat and --name-status to analyze captured output instead.\n\n\
        Examples:\n  doi analyze\n  doi analyze --base develop --format json\n  \
        doi analyze --numstat ns.txt --name-status st.txt --branch feature/login")]
    Analyze {
        #[command(flatten)]
        source: DiffSource,
    },
    /// Print the git commands doi runs
    Commands {
        /// Base branch to diff against (default: analysis.base_branch, "main")
        #[arg(long)]
        base: Option<String>,

        /// Include the full-patch command used for prompt excerpts
        #[arg(long)]
        patch: bool,
    },
    /// Print the LLM prompt that asks for quiz questions
    #[command(long_about = "Print the LLM prompt that asks for quiz questions.\n\n\
        Outputs the system prompt followed by the question prompt. Send both to a\n\
        model and save its JSON reply for `doi quiz --questions`.\n\n\
        Examples:\n  doi prompt --count 3\n  doi prompt --excerpt --format json")]
    Prompt {
        #[command(flatten)]
        source: DiffSource,

        /// Number of questions to ask for (default: quiz.question_count, 5)
        #[arg(long)]
        count: Option<usize>,

        /// Include a truncated patch excerpt from git
        #[arg(long, conflicts_with = "patch_file")]
        excerpt: bool,

        /// Include a truncated patch excerpt read from a file
        #[arg(long)]
        patch_file: Option<PathBuf>,
    },
    /// Take the quiz in the terminal and record vibe debt
    #[command(long_about = "Take the quiz in the terminal and record vibe debt.\n\n\
        Reads the model's question JSON, asks each question, and reads one answer\n\
        per line from stdin: an option letter or the answer text. A blank line skips\n\
        the question. Missed and skipped questions are saved under debt.dir.\n\n\
        Examples:\n  doi quiz --questions questions.json")]
    Quiz {
        #[command(flatten)]
        source: DiffSource,

        /// File with the model's question JSON
        #[arg(long)]
        questions: PathBuf,
    },
    /// Record or list vibe debt
    Debt {
        #[command(subcommand)]
        action: DebtAction,
    },
    /// Start MCP server for IDE and agent integration
    #[command(long_about = "Start MCP server for IDE and agent integration.\n\n\
        Runs a Model Context Protocol server on stdio exposing get_git_commands,\n\
        analyze_diff, build_quiz_prompt, record_vibe_debt, and list_vibe_debt.")]
    Mcp {
        /// Repository path (default: current directory)
        #[arg(long, default_value = ".")]
        path: PathBuf,
    },
    /// Create a default .doi.toml configuration file
    #[command(long_about = "Create a default .doi.toml configuration file.\n\n\
        Generates a commented-out template with all available options.\n\
        Fails if .doi.toml already exists.")]
    Init,
    /// Generate shell completion scripts
    #[command(hide = true)]
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand)]
enum DebtAction {
    /// Save a vibe-debt record from answered questions
    Record {
        #[command(flatten)]
        source: DiffSource,

        /// JSON array of answered questions (question, outcome, userAnswer)
        #[arg(long)]
        results: PathBuf,
    },
    /// List saved vibe-debt records
    List {
        /// Repository whose records to list
        #[arg(long, default_value = ".")]
        repo: PathBuf,

        /// Only records for this branch
        #[arg(long)]
        branch: Option<String>,
    },
}

#[derive(Clone, PartialEq, Eq, ValueEnum)]
enum ColorChoice {
    /// Auto-detect based on terminal
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

impl DiffSource {
    fn base_branch(&self, config: &DoiConfig) -> String {
        self.base
            .clone()
            .unwrap_or_else(|| config.analysis.base_branch.clone())
    }

    fn load(&self, config: &DoiConfig, verbose: bool) -> Result<GitDiff> {
        let base = self.base_branch(config);
        let raw = match &self.numstat {
            Some(numstat) => RawGitOutput {
                base_branch: base,
                current_branch: self.branch.clone().unwrap_or_else(|| "HEAD".to_string()),
                numstat: read_input(numstat)?,
                name_status: read_optional(&self.name_status)?,
                log: read_optional(&self.log)?,
            },
            None => {
                if verbose {
                    for cmd in commands::all(&base)? {
                        eprintln!("running: {cmd}");
                    }
                }
                commands::collect(&self.repo, &base)?
            }
        };
        let diff = build_git_diff(&raw)?;
        if verbose {
            eprintln!(
                "{} files changed on {} since {} ({} commits)",
                diff.files.len(),
                diff.current_branch,
                diff.base_branch,
                diff.commits.len()
            );
        }
        Ok(diff)
    }
}

fn print_welcome(use_color: bool) {
    let version = env!("CARGO_PKG_VERSION");

    if use_color {
        println!("\x1b[1m\x1b[33m?\x1b[0m \x1b[1mdoi\x1b[0m v{version} - do you understand the code you are shipping?\n");

        println!("Quick start:");
        println!("  \x1b[36mdoi init\x1b[0m                  Create a .doi.toml config file");
        println!("  \x1b[36mdoi analyze\x1b[0m               Summarize your branch");
        println!("  \x1b[36mdoi prompt\x1b[0m                Print a quiz prompt for an LLM\n");

        println!("All commands:");
        println!("  \x1b[32manalyze\x1b[0m   Categorized diff summary with key files and intent");
        println!("  \x1b[32mcommands\x1b[0m  Git commands used to collect the diff");
        println!("  \x1b[32mprompt\x1b[0m    LLM prompt for writing quiz questions");
        println!("  \x1b[32mquiz\x1b[0m      Take the quiz in the terminal");
        println!("  \x1b[32mdebt\x1b[0m      Record and list vibe debt");
        println!("  \x1b[32mmcp\x1b[0m       Start MCP server for IDE integration");
        println!("  \x1b[32minit\x1b[0m      Create default configuration\n");
    } else {
        println!("doi v{version} - do you understand the code you are shipping?\n");

        println!("Quick start:");
        println!("  doi init                  Create a .doi.toml config file");
        println!("  doi analyze               Summarize your branch");
        println!("  doi prompt                Print a quiz prompt for an LLM\n");

        println!("All commands:");
        println!("  analyze   Categorized diff summary with key files and intent");
        println!("  commands  Git commands used to collect the diff");
        println!("  prompt    LLM prompt for writing quiz questions");
        println!("  quiz      Take the quiz in the terminal");
        println!("  debt      Record and list vibe debt");
        println!("  mcp       Start MCP server for IDE integration");
        println!("  init      Create default configuration\n");
    }

    println!("Run 'doi <command> --help' for details.");
}

fn read_input(path: &Path) -> Result<String> {
    std::fs::read_to_string(path)
        .into_diagnostic()
        .wrap_err(format!("reading {}", path.display()))
}

fn read_optional(path: &Option<PathBuf>) -> Result<String> {
    match path {
        Some(p) => read_input(p),
        None => Ok(String::new()),
    }
}

fn print_summary(summary: &DiffSummary, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(summary).into_diagnostic()?);
        }
        OutputFormat::Markdown => print!("{}", summary.to_markdown()),
        OutputFormat::Text => print!("{summary}"),
    }
    Ok(())
}

fn save_record(
    store: &DebtStore,
    record: &VibeDebtRecord,
    format: OutputFormat,
    verbose: bool,
) -> Result<()> {
    let saved = store.save(record)?;
    match format {
        OutputFormat::Json => {
            let out = serde_json::json!({
                "savedTo": saved.as_ref().map(|p| p.display().to_string()),
                "record": record,
            });
            println!("{}", serde_json::to_string_pretty(&out).into_diagnostic()?);
        }
        OutputFormat::Text | OutputFormat::Markdown => match &saved {
            Some(path) => println!(
                "Saved {} vibe-debt {} to {}",
                record.debt.len(),
                if record.debt.len() == 1 { "item" } else { "items" },
                path.display()
            ),
            None => {
                if verbose {
                    eprintln!("no vibe debt to save (debt.save_clean is off)");
                }
            }
        },
    }
    Ok(())
}

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct DebtListEntry<'a> {
    path: String,
    #[serde(flatten)]
    record: &'a VibeDebtRecord,
}

fn print_debt_list(records: &[(PathBuf, VibeDebtRecord)], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let entries: Vec<DebtListEntry<'_>> = records
                .iter()
                .map(|(path, record)| DebtListEntry {
                    path: path.display().to_string(),
                    record,
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&entries).into_diagnostic()?);
        }
        OutputFormat::Markdown => {
            println!("# Vibe Debt\n");
            if records.is_empty() {
                println!("No vibe debt recorded.");
                return Ok(());
            }
            println!("| Branch | Date | Score | Debt |");
            println!("|--------|------|-------|------|");
            for (_, r) in records {
                println!(
                    "| `{}` | {} | {}/{} | {} |",
                    r.branch,
                    r.created_at.format("%Y-%m-%d %H:%M"),
                    r.score.correct,
                    r.score.total,
                    r.debt.len()
                );
            }
        }
        OutputFormat::Text => {
            if records.is_empty() {
                println!("No vibe debt recorded.");
                return Ok(());
            }
            for (path, r) in records {
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                println!(
                    "{name}  {}  {}/{} correct  {} debt",
                    r.branch,
                    r.score.correct,
                    r.score.total,
                    r.debt.len()
                );
                for item in &r.debt {
                    println!("    [{}] {}", item.outcome, item.question);
                }
            }
        }
    }
    Ok(())
}

const DEFAULT_CONFIG: &str = r#"# doi configuration

[analysis]
# base_branch = "main"
# key_file_limit = 5

[quiz]
# question_count = 5
# include_diff_excerpt = false
# max_excerpt_lines = 400

[debt]
# dir = ".doi/vibe-debt"
# save_clean = false

# Extra glob patterns, added to the built-in category tables
[categories]
# configuration = ["deploy/**"]
# testing = ["qa/**"]
# documentation = ["handbook/**"]
"#;

#[tokio::main]
async fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .build(),
        )
    }))
    .into_diagnostic()?;
    human_panic::setup_panic!();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => DoiConfig::from_file(path)?,
        None => {
            let default_path = Path::new(".doi.toml");
            if default_path.exists() {
                DoiConfig::from_file(default_path)?
            } else {
                DoiConfig::default()
            }
        }
    };

    let use_color = match cli.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => std::io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err(),
    };

    if cli.verbose {
        eprintln!("format: {}", cli.format);
        if !config.categories.is_empty() {
            eprintln!(
                "Custom category patterns: {} configuration, {} testing, {} documentation",
                config.categories.configuration.len(),
                config.categories.testing.len(),
                config.categories.documentation.len(),
            );
        }
    }

    let analyzer = Analyzer::from_config(&config.categories, config.analysis.key_file_limit)?;

    match cli.command {
        None => {
            print_welcome(use_color);
            return Ok(());
        }
        Some(Command::Analyze { ref source }) => {
            let diff = source.load(&config, cli.verbose)?;
            print_summary(&analyzer.summarize(&diff), cli.format)?;
        }
        Some(Command::Commands { ref base, patch }) => {
            let base = base
                .clone()
                .unwrap_or_else(|| config.analysis.base_branch.clone());
            let mut cmds = commands::all(&base)?;
            if patch {
                cmds.push(commands::patch(&base)?);
            }

            match cli.format {
                OutputFormat::Json => {
                    let out: Vec<_> = cmds
                        .iter()
                        .map(|c| serde_json::json!({ "name": c.name, "command": c.to_string() }))
                        .collect();
                    println!("{}", serde_json::to_string_pretty(&out).into_diagnostic()?);
                }
                OutputFormat::Markdown => {
                    println!("```sh");
                    for cmd in &cmds {
                        println!("{cmd}");
                    }
                    println!("```");
                }
                OutputFormat::Text => {
                    for cmd in &cmds {
                        println!("{cmd}");
                    }
                }
            }
        }
        Some(Command::Prompt {
            ref source,
            count,
            excerpt,
            ref patch_file,
        }) => {
            let diff = source.load(&config, cli.verbose)?;
            let summary = analyzer.summarize(&diff);
            let count = count.unwrap_or(config.quiz.question_count).max(1);

            let patch = match patch_file {
                Some(path) => Some(read_input(path)?),
                None if excerpt || config.quiz.include_diff_excerpt => {
                    let cmd = commands::patch(&source.base_branch(&config))?;
                    if cli.verbose {
                        eprintln!("running: {cmd}");
                    }
                    Some(cmd.run(&source.repo)?)
                }
                None => None,
            };
            let excerpt = patch
                .as_deref()
                .map(|p| diff_excerpt(p, config.quiz.max_excerpt_lines));

            let system = build_system_prompt();
            let user = build_question_prompt(&summary, excerpt.as_deref(), count);
            match cli.format {
                OutputFormat::Json => {
                    let out = serde_json::json!({
                        "systemPrompt": system,
                        "userPrompt": user,
                        "questionCount": count,
                    });
                    println!("{}", serde_json::to_string_pretty(&out).into_diagnostic()?);
                }
                OutputFormat::Markdown => {
                    println!("## System\n\n{system}\n\n## User\n\n{user}");
                }
                OutputFormat::Text => {
                    println!("{system}\n\n---\n\n{user}");
                }
            }
        }
        Some(Command::Quiz {
            ref source,
            ref questions,
        }) => {
            let diff = source.load(&config, cli.verbose)?;
            let summary = analyzer.summarize(&diff);

            let reply = read_input(questions)?;
            let questions = parse_questions_response(&reply);
            if questions.is_empty() {
                miette::bail!("no valid quiz questions found in the question file");
            }
            let total = questions.len();

            println!("{}", format_summary_intro(&summary));
            let stdin = std::io::stdin();
            let mut answers = Vec::with_capacity(total);
            for (i, question) in questions.into_iter().enumerate() {
                print!("{}", format_question(i, total, &question));
                print!("> ");
                std::io::stdout().flush().into_diagnostic()?;

                let mut line = String::new();
                stdin
                    .lock()
                    .read_line(&mut line)
                    .into_diagnostic()
                    .wrap_err("reading answer")?;
                let answer = QuizAnswer::grade(question, Some(&line));
                println!("{}\n", format_feedback(&answer.question, answer.outcome));
                answers.push(answer);
            }
            print!("{}", format_results(&answers));

            let record = VibeDebtRecord::from_results(&summary, &diff, &answers, Utc::now());
            let store = DebtStore::from_config(&source.repo, &config.debt);
            save_record(&store, &record, cli.format, cli.verbose)?;
        }
        Some(Command::Debt { ref action }) => match action {
            DebtAction::Record { source, results } => {
                let diff = source.load(&config, cli.verbose)?;
                let summary = analyzer.summarize(&diff);
                let answers: Vec<QuizAnswer> = serde_json::from_str(&read_input(results)?)
                    .into_diagnostic()
                    .wrap_err(format!("parsing quiz results from {}", results.display()))?;

                let record = VibeDebtRecord::from_results(&summary, &diff, &answers, Utc::now());
                let store = DebtStore::from_config(&source.repo, &config.debt);
                save_record(&store, &record, cli.format, cli.verbose)?;
            }
            DebtAction::List { repo, branch } => {
                let store = DebtStore::from_config(repo, &config.debt);
                if cli.verbose {
                    eprintln!("reading vibe debt from {}", store.dir().display());
                }
                let records: Vec<_> = store
                    .load_all()?
                    .into_iter()
                    .filter(|(_, r)| branch.as_ref().map_or(true, |b| &r.branch == b))
                    .collect();
                print_debt_list(&records, cli.format)?;
            }
        },
        Some(Command::Mcp { ref path }) => {
            doi_mcp::server::run_server(path.clone(), config).await?;
        }
        Some(Command::Init) => {
            let path = Path::new(".doi.toml");
            if path.exists() {
                miette::bail!(".doi.toml already exists");
            }
            std::fs::write(path, DEFAULT_CONFIG).into_diagnostic()?;
            println!("Created .doi.toml with default configuration");
        }
        Some(Command::Completions { shell }) => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "doi", &mut std::io::stdout());
        }
    }

    Ok(())
}
