//! CLI administration tool for deadlink-checker.
//!
//! Runs checks in the foreground and inspects stored results without requiring
//! HTTP API access.
//!
//! # Usage
//!
//! ```bash
//! # Check every stored link with the configured settings
//! cargo run --bin admin -- check run
//!
//! # Override concurrency and timeout, skip the confirmation
//! cargo run --bin admin -- check run --max-workers 10 --batch-size 50 --timeout 5 -y
//!
//! # Show the broken links of a run
//! cargo run --bin admin -- check results 5f0c2f7e-... --invalid-only
//!
//! # Check database connection
//! cargo run --bin admin -- db check
//! ```
//!
//! # Environment Variables
//!
//! Same as the server: `DATABASE_URL` (or `DB_*` components) plus the
//! `CHECK_*` settings. Command-line flags take precedence.

use deadlink_checker::application::services::{CheckController, CheckStatus};
use deadlink_checker::config::Config;
use deadlink_checker::domain::entities::CheckResult;
use deadlink_checker::domain::repositories::ResultFilter;
use deadlink_checker::server::{build_controller, connect_database};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use dialoguer::Confirm;
use std::io::Write;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

/// Width of the progress bar in characters.
const BAR_WIDTH: usize = 30;

/// CLI tool for managing deadlink-checker.
#[derive(Parser)]
#[command(name = "admin")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Top-level command groups.
#[derive(Subcommand)]
enum Commands {
    /// Run and inspect link checks
    Check {
        #[command(subcommand)]
        action: CheckAction,
    },

    /// Database operations
    Db {
        #[command(subcommand)]
        action: DbAction,
    },
}

#[derive(Subcommand)]
enum CheckAction {
    /// Check every stored link and print a report
    Run {
        /// Concurrent validations per batch
        #[arg(short = 'w', long)]
        max_workers: Option<usize>,

        /// Links per batch
        #[arg(short, long)]
        batch_size: Option<usize>,

        /// Per-request timeout in seconds
        #[arg(short, long)]
        timeout: Option<u64>,

        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// Show stored results of a run
    Results {
        run_id: Uuid,

        /// Only list broken links
        #[arg(short, long)]
        invalid_only: bool,
    },
}

/// Database operation subcommands.
#[derive(Subcommand)]
enum DbAction {
    /// Check database connection
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    let mut config = Config::from_env()?;

    match cli.command {
        Commands::Check { action } => match action {
            CheckAction::Run {
                max_workers,
                batch_size,
                timeout,
                yes,
            } => {
                if let Some(workers) = max_workers {
                    config.check_pool_size = workers;
                }
                if let Some(size) = batch_size {
                    config.check_batch_size = size;
                }
                if let Some(secs) = timeout {
                    config.check_timeout_seconds = secs;
                }
                config.validate()?;
                run_check(&config, yes).await?
            }
            CheckAction::Results {
                run_id,
                invalid_only,
            } => {
                config.validate()?;
                show_results(&config, run_id, invalid_only).await?
            }
        },
        Commands::Db { action } => handle_db_action(action, &config).await?,
    }

    Ok(())
}

/// Runs a full check in the foreground.
///
/// # Flow
///
/// 1. Confirm that earlier results will be cleared (unless `--yes` or history
///    is retained)
/// 2. Start the run and redraw a progress line every second
/// 3. Ctrl-C requests a stop; in-flight checks still finish
/// 4. Print the summary and every broken link
async fn run_check(config: &Config, skip_confirm: bool) -> Result<()> {
    println!("{}", "🔗 Link Check".bright_blue().bold());
    println!();

    let pool = connect_database(config).await?;
    let controller = build_controller(
        pool,
        config.check_settings(),
        config.validator_config(),
    )?;

    let total = controller
        .link_count()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to count links: {}", e))?;

    println!("  Links:       {}", total.to_string().bright_white().bold());
    println!("  Workers:     {}", config.check_pool_size.to_string().cyan());
    println!("  Batch size:  {}", config.check_batch_size.to_string().cyan());
    println!("  Timeout:     {}", format!("{}s", config.check_timeout_seconds).cyan());
    println!();

    if !skip_confirm && !config.check_retain_history {
        let confirmed = Confirm::new()
            .with_prompt("Results of earlier runs will be cleared. Continue?")
            .default(true)
            .interact()?;

        if !confirmed {
            println!("{}", "❌ Cancelled".red());
            return Ok(());
        }
    }

    let run_id = controller
        .start()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to start check run: {}", e))?;

    follow_progress(&controller).await;
    controller.wait_for_completion().await;

    let invalid = controller
        .results(run_id, ResultFilter::all().invalid_only(true))
        .await
        .map_err(|e| anyhow::anyhow!("Failed to load results: {}", e))?;

    print_summary(&controller.status());
    print_invalid(&invalid);

    Ok(())
}

/// Redraws the progress line until the run completes.
async fn follow_progress(controller: &CheckController) {
    let mut ticker = tokio::time::interval(Duration::from_secs(1));
    let mut stop_sent = false;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let status = controller.status();
                draw_progress(&status);
                if !status.is_running {
                    println!();
                    return;
                }
            }
            _ = tokio::signal::ctrl_c(), if !stop_sent => {
                stop_sent = true;
                controller.stop();
                println!();
                println!("{}", "⏹  Stop requested, finishing in-flight checks...".yellow());
            }
        }
    }
}

fn draw_progress(status: &CheckStatus) {
    let filled = (status.percent.min(100) as usize * BAR_WIDTH) / 100;
    let bar = format!(
        "{}{}",
        "█".repeat(filled).green(),
        "░".repeat(BAR_WIDTH - filled).bright_black()
    );
    let eta = status
        .estimated_remaining_seconds
        .map(|secs| format!(" eta {secs}s"))
        .unwrap_or_default();

    print!(
        "\r  {} {:>3}% {}/{}  {} {}  {} {}  {}{}   ",
        bar,
        status.percent,
        status.processed,
        status.total,
        "valid".green(),
        status.valid,
        "invalid".red(),
        status.invalid,
        status.elapsed.bright_black(),
        eta.bright_black()
    );
    std::io::stdout().flush().ok();
}

fn print_summary(status: &CheckStatus) {
    println!();
    println!("{}", "📊 Summary".bright_blue().bold());
    println!();
    if let Some(run_id) = status.run_id {
        println!("  Run:       {}", run_id.to_string().bright_black());
    }
    println!("  Checked:   {}/{}", status.processed, status.total);
    println!("  Valid:     {}", status.valid.to_string().bright_green().bold());
    println!("  Invalid:   {}", status.invalid.to_string().bright_red().bold());
    println!("  Duration:  {}", status.elapsed.bright_white());
    if status.processed < status.total {
        println!(
            "  {}",
            format!("{} links not checked (stopped)", status.total - status.processed).yellow()
        );
    }
    println!();
}

fn print_invalid(results: &[CheckResult]) {
    if results.is_empty() {
        println!("{}", "✅ No broken links found".green().bold());
        println!();
        return;
    }

    println!("{}", "❌ Broken links".red().bold());
    println!();
    println!(
        "  {:<8} {:<20} {:<50} {}",
        "Link".bright_white().bold(),
        "Kind".bright_white().bold(),
        "URL".bright_white().bold(),
        "Message".bright_white().bold()
    );
    println!("  {}", "─".repeat(100).bright_black());

    for result in results {
        let kind = result
            .error_kind
            .map(|kind| kind.to_string())
            .unwrap_or_default();

        println!(
            "  {:<8} {:<20} {:<50} {}",
            result.link_id.to_string().bright_black(),
            kind.red(),
            result.url.cyan(),
            result.error_message.as_deref().unwrap_or("").bright_black()
        );
    }

    println!();
    println!("  Total: {}", results.len().to_string().bright_white().bold());
    println!();
}

/// Lists stored results of a run.
async fn show_results(config: &Config, run_id: Uuid, invalid_only: bool) -> Result<()> {
    println!("{}", "📋 Check Results".bright_blue().bold());
    println!("  Run: {}", run_id.to_string().bright_black());
    println!();

    let pool = connect_database(config).await?;
    let controller = build_controller(
        pool,
        config.check_settings(),
        config.validator_config(),
    )?;

    let results = controller
        .results(run_id, ResultFilter::all().invalid_only(invalid_only))
        .await
        .map_err(|e| anyhow::anyhow!("Failed to load results: {}", e))?;

    if results.is_empty() {
        println!("{}", "  No results found for this run".yellow());
        return Ok(());
    }

    if invalid_only {
        print_invalid(&results);
        return Ok(());
    }

    for result in &results {
        let verdict = if result.is_valid {
            "VALID".green()
        } else {
            "INVALID".red()
        };
        let detail = match (result.status_code, result.error_kind) {
            (Some(code), _) if result.is_valid => code.to_string(),
            (_, Some(kind)) => kind.to_string(),
            _ => String::new(),
        };

        println!(
            "  {:<8} {:<8} {:<12} {:>6}ms  {}",
            result.link_id.to_string().bright_black(),
            verdict,
            detail,
            result.latency_ms,
            result.url.cyan()
        );
    }

    let invalid = results.iter().filter(|r| !r.is_valid).count();
    println!();
    println!(
        "  Total: {}  Invalid: {}",
        results.len().to_string().bright_white().bold(),
        invalid.to_string().bright_red().bold()
    );
    println!();

    Ok(())
}

/// Handles database diagnostic commands.
async fn handle_db_action(action: DbAction, config: &Config) -> Result<()> {
    match action {
        DbAction::Check => {
            println!("{}", "🔍 Checking database connection...".bright_blue());

            let pool = connect_database(config).await?;
            sqlx::query("SELECT 1")
                .execute(&pool)
                .await
                .context("Database query failed")?;

            let links: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM links")
                .fetch_one(&pool)
                .await?;

            println!("{}", "✅ Database connection OK".green().bold());
            println!("  Links: {}", links.to_string().bright_white());
        }
    }

    Ok(())
}
