//! # Lounge CLI
//!
//! Operator tool for the lounge database.
//!
//! ## Commands
//! ```text
//! lounge migrate                         apply pending migrations
//! lounge seed [--days 14]                populate an empty tenant with demo data
//! lounge report <kind> [window options]  print a report as JSON
//!
//! kind:   summary | admins | sales | analytics | discounts | tables
//! window: --from 2024-01-01 --to 2024-01-07 --t-from 22:00 --t-to 04:00
//!         --user-id 3 | all
//! ```
//!
//! ## Startup Sequence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. Parse arguments (clap)                                              │
//! │  2. Initialize logging (tracing-subscriber, RUST_LOG override)          │
//! │  3. Load configuration (lounge.toml, LOUNGE_* env, defaults)            │
//! │  4. Open database (SQLite, WAL, migrations unless `migrate`)            │
//! │  5. Run the command, print JSON to stdout                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Logs go to stderr so stdout stays machine-readable.

mod config;
mod seed;

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Local;
use clap::{Args, Parser, Subcommand, ValueEnum};
use lounge_core::params::RawReportParams;
use lounge_db::{migrations, Database, ReportService};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::LoungeConfig;

#[derive(Debug, Parser)]
#[command(name = "lounge", version, about = "Lounge venue management")]
struct Cli {
    /// Configuration file (default: ./lounge.toml when present)
    #[arg(long, global = true, env = "LOUNGE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Apply pending schema migrations
    Migrate,

    /// Populate an empty tenant with demo data
    Seed {
        /// Days of bookings, ending today
        #[arg(long, default_value_t = 14)]
        days: i64,
    },

    /// Print a report as JSON
    Report {
        #[arg(value_enum)]
        kind: ReportKind,

        #[command(flatten)]
        window: WindowArgs,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ReportKind {
    Summary,
    Admins,
    Sales,
    Analytics,
    Discounts,
    Tables,
}

/// Raw window options; defaults and validation live in `RawReportParams`.
#[derive(Debug, Args)]
struct WindowArgs {
    /// First date, YYYY-MM-DD (default: 7 days ago)
    #[arg(long)]
    from: Option<String>,

    /// Last date, YYYY-MM-DD (default: today)
    #[arg(long)]
    to: Option<String>,

    /// Daily start time, HH:MM[:SS] (default: 00:00)
    #[arg(long)]
    t_from: Option<String>,

    /// Daily end time; earlier than --t-from wraps past midnight (default: 23:59:59)
    #[arg(long)]
    t_to: Option<String>,

    /// Staff member id, or "all"
    #[arg(long)]
    user_id: Option<String>,
}

impl From<WindowArgs> for RawReportParams {
    fn from(args: WindowArgs) -> Self {
        RawReportParams {
            from: args.from,
            to: args.to,
            t_from: args.t_from,
            t_to: args.t_to,
            user_id: args.user_id,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let config = LoungeConfig::load(cli.config.as_deref()).context("loading configuration")?;
    info!(
        database = %config.database_path.display(),
        company_id = config.company_id,
        branch_id = config.branch_id,
        "Configuration loaded"
    );

    let migrate_only = matches!(cli.command, Command::Migrate);
    let db = Database::new(config.db_config().run_migrations(!migrate_only))
        .await
        .context("opening database")?;

    let result = run(&db, &config, cli.command).await;
    db.close().await;
    result
}

async fn run(db: &Database, config: &LoungeConfig, command: Command) -> Result<()> {
    let today = Local::now().date_naive();

    match command {
        Command::Migrate => {
            db.run_migrations().await?;
            let (total, applied) = migrations::migration_status(db.pool()).await?;
            info!(total, applied, "Schema up to date");
        }
        Command::Seed { days } => {
            let summary =
                seed::run(db, config.tenant(), config.booking_policy(), days, today).await?;
            print_json(&summary)?;
        }
        Command::Report { kind, window } => {
            let query = RawReportParams::from(window)
                .parse(today)
                .context("invalid report parameters")?;
            let reports = ReportService::new(db.clone()).with_timeout(config.report_timeout());
            let tenant = config.tenant();

            match kind {
                ReportKind::Summary => print_json(&reports.summary(tenant, &query).await?)?,
                ReportKind::Admins => print_json(&reports.admins(tenant, &query).await?)?,
                ReportKind::Sales => print_json(&reports.sales(tenant, &query).await?)?,
                ReportKind::Analytics => print_json(&reports.analytics(tenant, &query).await?)?,
                ReportKind::Discounts => print_json(&reports.discounts(tenant, &query).await?)?,
                ReportKind::Tables => print_json(&reports.tables(tenant, &query).await?)?,
            }
        }
    }
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=lounge_db=trace` - Trace the database layer only
/// - Default: INFO, DEBUG for lounge crates, WARN for sqlx
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,lounge=debug,sqlx=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
