//! gitmigrate — migrate a named list of repositories from a GitLab group
//! to a GitHub organization.
//!
//! `run` performs the migration; `plan` is a read-only preview of what a
//! run would do.

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use gitmigrate_core::allow_list::AllowList;
use gitmigrate_core::config::AppConfig;
use gitmigrate_core::engine::MigrationEngine;
use gitmigrate_core::git::GitMirror;
use gitmigrate_core::github::GitHubClient;
use gitmigrate_core::gitlab::GitLabClient;

/// Exit status for configuration problems. No network call has been made
/// when the process exits with this code.
const EXIT_CONFIG: u8 = 2;
/// Exit status for fatal inventory / reconciliation errors.
const EXIT_FATAL: u8 = 1;

/// GitLab → GitHub repository migration tool.
#[derive(Parser)]
#[command(name = "gitmigrate", version, about)]
struct Cli {
    /// Path to the configuration file.
    #[arg(short, long, default_value = "~/.config/gitmigrate/config.toml")]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Migrate every allow-listed repository.
    Run,

    /// Show what a run would do, without creating, cloning, or pushing
    /// anything.
    Plan,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let config_path = expand_tilde(&cli.config);

    // Configuration problems are reported before tracing is set up; the log
    // file location itself comes from the config.
    let config = match AppConfig::load_and_resolve(&config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("configuration error: {e}");
            return ExitCode::from(EXIT_CONFIG);
        }
    };

    let _log_guard = match init_tracing(&config) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("failed to initialize logging: {e:#}");
            return ExitCode::from(EXIT_CONFIG);
        }
    };

    let allow_list = match AllowList::load(&config.migrate.repo_list) {
        Ok(list) => list,
        Err(e) => {
            error!(error = %e, "failed to load allow-list");
            return ExitCode::from(EXIT_CONFIG);
        }
    };

    let engine = build_engine(config);

    let result = match cli.command {
        Commands::Run => cmd_run(&engine, &allow_list).await,
        Commands::Plan => cmd_plan(&engine, &allow_list).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %format!("{e:#}"), "migration aborted");
            ExitCode::from(EXIT_FATAL)
        }
    }
}

/// Build the engine and its provider clients from a resolved configuration.
fn build_engine(config: AppConfig) -> MigrationEngine {
    let gitlab = GitLabClient::new(
        &config.gitlab.api_url,
        config.gitlab.token.as_deref().unwrap_or_default(),
    );
    let github = GitHubClient::new(
        &config.github.api_url,
        config.github.token.as_deref().unwrap_or_default(),
    );
    MigrationEngine::new(config, gitlab, github, GitMirror::new())
}

/// Execute the migration and print a summary.
async fn cmd_run(engine: &MigrationEngine, allow_list: &AllowList) -> Result<()> {
    info!("starting migration run");
    let summary = engine.run(allow_list).await.context("migration run failed")?;

    if summary.candidates == 0 {
        println!("Nothing to migrate.");
        return Ok(());
    }

    println!(
        "Migration complete: {} migrated, {} skipped, {} failed",
        summary.migrated,
        summary.skipped,
        summary.failed.len()
    );
    for failure in &summary.failed {
        println!("  ✗ {}: {}", failure.name, failure.reason);
    }
    Ok(())
}

/// Print the read-only plan.
async fn cmd_plan(engine: &MigrationEngine, allow_list: &AllowList) -> Result<()> {
    let entries = engine.plan(allow_list).await.context("plan failed")?;

    if entries.is_empty() {
        println!("Nothing to migrate.");
        return Ok(());
    }

    for entry in &entries {
        if entry.exists_at_destination {
            println!("● {} — exists at destination, would skip", entry.name);
        } else {
            println!("○ {} — would create and mirror", entry.name);
        }
    }
    Ok(())
}

/// Console logging always; plus a run-scoped append-only log file when
/// `[migrate] log_dir` is configured. The returned guard must stay alive
/// for the duration of the run so buffered file output is flushed on exit.
fn init_tracing(
    config: &AppConfig,
) -> Result<Option<tracing_appender::non_blocking::WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match &config.migrate.log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("failed to create log directory: {}", dir.display()))?;
            let file_name = format!(
                "migrate-{}.log",
                chrono::Utc::now().format("%Y%m%dT%H%M%SZ")
            );
            let appender = tracing_appender::rolling::never(dir, file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer())
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_writer(writer)
                        .with_ansi(false),
                )
                .init();
            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::fmt().with_env_filter(filter).init();
            Ok(None)
        }
    }
}

/// Expand `~` to the user's home directory.
fn expand_tilde(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return format!("{}/{}", home.display(), rest);
        }
    }
    path.to_string()
}
