//! Binary entry point for the sharpfix CLI.
//!
//! ## Usage
//!
//! ```bash
//! # Report findings for every rule
//! sharpfix analyze
//!
//! # Preview the fix for one finding as a unified diff
//! sharpfix --format diff fix --at src/Lib.cs:12:29 --dry-run
//!
//! # Apply every ACNU0001 fix in the workspace
//! sharpfix fix --all --rule ACNU0001
//! ```
//!
//! Responses are JSON on stdout unless `--format` says otherwise. Errors are
//! always a JSON error response, and the exit code is the error code.

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use tokio_util::sync::CancellationToken;

use sharpfix::cli::{self, FixTarget};
use sharpfix::error::{OutputErrorCode, SharpfixError};
use sharpfix::output::{emit_response, ErrorResponse};

// ============================================================================
// CLI Structure
// ============================================================================

/// Static analysis and signature rewrites for C#.
#[derive(Parser, Debug)]
#[command(name = "sharpfix", version, about = "Static analysis and signature rewrites for C#")]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,
    #[command(subcommand)]
    command: Command,
}

/// Global arguments shared by all subcommands.
#[derive(Parser, Debug)]
struct GlobalArgs {
    /// Workspace root directory (default: current directory).
    #[arg(long, global = true)]
    workspace: Option<PathBuf>,

    /// Log level for tracing output. `RUST_LOG` takes precedence.
    #[arg(long, global = true, value_enum, default_value = "warn")]
    log_level: LogLevel,

    /// Output format.
    #[arg(long, global = true, value_enum, default_value = "json")]
    format: OutputFormat,
}

/// Log level for tracing output.
#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    fn to_tracing_level(self) -> tracing::Level {
        match self {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Full JSON response (default).
    #[default]
    Json,
    /// Human-readable summary.
    Text,
    /// Unified diff of the changes (fix only; other commands print text).
    Diff,
}

/// CLI subcommands.
#[derive(Subcommand, Debug)]
enum Command {
    /// Report findings.
    Analyze {
        /// Restrict to a rule, e.g. ACNU0001. May be repeated.
        #[arg(long = "rule")]
        rules: Vec<String>,
    },
    /// Apply the fix for one finding, or for all of them.
    Fix {
        /// Location of the finding (file:line:col).
        #[arg(long, conflicts_with = "all", required_unless_present = "all")]
        at: Option<String>,
        /// Fix every fixable finding.
        #[arg(long)]
        all: bool,
        /// Restrict to a rule, e.g. ACNU0001. May be repeated.
        #[arg(long = "rule")]
        rules: Vec<String>,
        /// Preview changes without writing files.
        #[arg(long)]
        dry_run: bool,
    },
    /// List the rules.
    Rules,
}

// ============================================================================
// Main Entry Point
// ============================================================================

fn main() -> ExitCode {
    let cli = Cli::parse();

    init_tracing(cli.global.log_level);

    match execute(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let error_code = OutputErrorCode::from(&err);
            let response = ErrorResponse::from_error(&err);

            // Errors go to stdout as JSON, whatever the format.
            let _ = emit_response(&response, &mut io::stdout());
            let _ = io::stdout().flush();

            ExitCode::from(error_code.code())
        }
    }
}

/// Initialize tracing subscriber.
fn init_tracing(level: LogLevel) {
    use tracing_subscriber::fmt::format::FmtSpan;
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.to_tracing_level().to_string()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_span_events(FmtSpan::CLOSE)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn execute(cli: Cli) -> Result<(), SharpfixError> {
    let format = cli.global.format;
    match cli.command {
        Command::Analyze { rules } => execute_analyze(&cli.global, &rules, format),
        Command::Fix {
            at,
            all: _,
            rules,
            dry_run,
        } => execute_fix(&cli.global, at.as_deref(), &rules, dry_run, format),
        Command::Rules => execute_rules(format),
    }
}

// ============================================================================
// Command Executors
// ============================================================================

fn workspace_root(global: &GlobalArgs) -> Result<PathBuf, SharpfixError> {
    match &global.workspace {
        Some(path) => Ok(path.clone()),
        None => Ok(std::env::current_dir()?),
    }
}

fn execute_analyze(
    global: &GlobalArgs,
    rules: &[String],
    format: OutputFormat,
) -> Result<(), SharpfixError> {
    let rules = cli::parse_rules(rules)?;
    let solution = cli::load_solution(&workspace_root(global)?)?;
    let response = cli::analyze(&solution, &rules)?;
    match format {
        OutputFormat::Json => emit(&response),
        OutputFormat::Text | OutputFormat::Diff => print(&cli::render_findings(&response)),
    }
}

fn execute_fix(
    global: &GlobalArgs,
    at: Option<&str>,
    rules: &[String],
    dry_run: bool,
    format: OutputFormat,
) -> Result<(), SharpfixError> {
    let rules = cli::parse_rules(rules)?;
    let target = match at {
        Some(arg) => FixTarget::at(arg)?,
        None => FixTarget::All,
    };
    let root = workspace_root(global)?;
    let solution = cli::load_solution(&root)?;
    let mut outcome = cli::fix(&solution, &target, &rules, &CancellationToken::new())?;

    if !dry_run {
        let written = cli::write_changes(&root, &outcome.changes)?;
        outcome.response.applied = true;
        outcome.response.files_written = Some(written);
    }

    match format {
        OutputFormat::Json => emit(&outcome.response),
        OutputFormat::Text => print(&cli::render_fix_summary(&outcome.response)),
        OutputFormat::Diff => print(&outcome.response.diff),
    }
}

fn execute_rules(format: OutputFormat) -> Result<(), SharpfixError> {
    let response = cli::rules();
    match format {
        OutputFormat::Json => emit(&response),
        OutputFormat::Text | OutputFormat::Diff => print(&cli::render_rules(&response)),
    }
}

fn emit<T: serde::Serialize>(response: &T) -> Result<(), SharpfixError> {
    emit_response(response, &mut io::stdout()).map_err(|e| SharpfixError::internal(e.to_string()))?;
    let _ = io::stdout().flush();
    Ok(())
}

fn print(text: &str) -> Result<(), SharpfixError> {
    let mut stdout = io::stdout();
    stdout.write_all(text.as_bytes())?;
    stdout.flush()?;
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    mod cli_parsing {
        use super::*;

        #[test]
        fn parse_analyze_with_rules() {
            let cli = Cli::try_parse_from([
                "sharpfix", "analyze", "--rule", "ACNU0001", "--rule", "ACNU0005",
            ])
            .unwrap();
            match cli.command {
                Command::Analyze { rules } => assert_eq!(rules, vec!["ACNU0001", "ACNU0005"]),
                other => panic!("unexpected command {:?}", other),
            }
        }

        #[test]
        fn parse_fix_at() {
            let cli = Cli::try_parse_from([
                "sharpfix", "fix", "--at", "src/A.cs:3:7", "--dry-run",
            ])
            .unwrap();
            match cli.command {
                Command::Fix {
                    at, all, dry_run, ..
                } => {
                    assert_eq!(at.as_deref(), Some("src/A.cs:3:7"));
                    assert!(!all);
                    assert!(dry_run);
                }
                other => panic!("unexpected command {:?}", other),
            }
        }

        #[test]
        fn fix_requires_at_or_all() {
            assert!(Cli::try_parse_from(["sharpfix", "fix"]).is_err());
            assert!(Cli::try_parse_from(["sharpfix", "fix", "--all"]).is_ok());
        }

        #[test]
        fn fix_at_conflicts_with_all() {
            let result = Cli::try_parse_from(["sharpfix", "fix", "--all", "--at", "A.cs:1:1"]);
            assert!(result.is_err());
        }

        #[test]
        fn global_flags_follow_subcommand() {
            let cli = Cli::try_parse_from([
                "sharpfix", "rules", "--format", "text", "--workspace", "/tmp/ws",
            ])
            .unwrap();
            assert_eq!(cli.global.format, OutputFormat::Text);
            assert_eq!(cli.global.workspace, Some(PathBuf::from("/tmp/ws")));
        }

        #[test]
        fn defaults() {
            let cli = Cli::try_parse_from(["sharpfix", "rules"]).unwrap();
            assert!(matches!(cli.global.log_level, LogLevel::Warn));
            assert_eq!(cli.global.format, OutputFormat::Json);
        }
    }

    mod log_level {
        use super::*;

        #[test]
        fn levels_convert_to_tracing_levels() {
            assert_eq!(LogLevel::Trace.to_tracing_level(), tracing::Level::TRACE);
            assert_eq!(LogLevel::Debug.to_tracing_level(), tracing::Level::DEBUG);
            assert_eq!(LogLevel::Info.to_tracing_level(), tracing::Level::INFO);
            assert_eq!(LogLevel::Warn.to_tracing_level(), tracing::Level::WARN);
            assert_eq!(LogLevel::Error.to_tracing_level(), tracing::Level::ERROR);
        }
    }
}
