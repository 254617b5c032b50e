mod api;
mod commands;
mod config;
mod serve;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};

use observatory_logging::{init_tracing, init_tracing_with_file, LogFormat};

use crate::commands::Command;
use crate::config::PathOverrides;

#[derive(Parser, Debug)]
#[command(
    name = "observatory",
    about = "Live observer for AI coding assistant transcripts",
    version
)]
struct Cli {
    /// Path to observatory.toml (default: <config dir>/observatory/observatory.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding per-project session transcripts
    #[arg(long, global = true)]
    projects_dir: Option<PathBuf>,

    /// Directory holding agent transcripts (default: projects dir)
    #[arg(long, global = true)]
    agents_dir: Option<PathBuf>,

    /// Log level filter (RUST_LOG takes precedence)
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Log output format
    #[arg(long, global = true, value_enum, default_value = "pretty")]
    log_format: LogFormatChoice,

    /// Also write daily-rotated JSON logs into this directory
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormatChoice {
    Pretty,
    Json,
    Compact,
}

impl From<LogFormatChoice> for LogFormat {
    fn from(choice: LogFormatChoice) -> Self {
        match choice {
            LogFormatChoice::Pretty => LogFormat::Pretty,
            LogFormatChoice::Json => LogFormat::Json,
            LogFormatChoice::Compact => LogFormat::Compact,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_format: LogFormat = cli.log_format.into();
    let _log_guard = match &cli.log_dir {
        Some(dir) => Some(
            init_tracing_with_file(&cli.log_level, log_format, dir)
                .with_context(|| format!("Failed to open log directory {}", dir.display()))?,
        ),
        None => {
            init_tracing(&cli.log_level, log_format);
            None
        }
    };

    let settings = config::load_settings(
        cli.config.as_deref(),
        PathOverrides {
            projects_dir: cli.projects_dir,
            agents_dir: cli.agents_dir,
        },
    )?;

    tracing::debug!(
        projects_dir = %settings.store.projects_dir.display(),
        agents_dir = %settings.store.agents_dir.display(),
        "Resolved settings"
    );

    match cli.command {
        Command::Serve { port } => serve::handle_serve_command(settings, port).await,
        command => commands::handle_command(command, &settings),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "observatory",
            "events",
            "--session",
            "abc",
            "--limit",
            "5",
            "--projects-dir",
            "/tmp/p",
        ])
        .unwrap();

        assert_eq!(cli.projects_dir, Some(PathBuf::from("/tmp/p")));
        match cli.command {
            Command::Events { session, limit, json } => {
                assert_eq!(session.as_deref(), Some("abc"));
                assert_eq!(limit, 5);
                assert!(!json);
            }
            other => panic!("expected events, got {:?}", other),
        }
    }

    #[test]
    fn test_cli_rejects_conflicting_agent_filters() {
        let result = Cli::try_parse_from(["observatory", "agents", "--stats", "--id", "x"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_verifies() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
