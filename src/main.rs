use std::path::PathBuf;

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

mod api;
mod db;
mod eligibility;
mod error;
mod ledger;
mod models;
mod report;
mod roster;

use models::AttendanceStatus;

#[derive(Parser)]
#[command(name = "attendance-engine")]
#[command(about = "Enrollment attendance engine: rosters, marks and reports", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load realistic seed data
    Seed,
    /// List customers eligible for a class session on a date
    Roster {
        #[arg(long)]
        session: Uuid,
        #[arg(long)]
        date: NaiveDate,
    },
    /// Record one customer's attendance for a date
    Mark {
        #[arg(long)]
        enrollment_session: Uuid,
        #[arg(long)]
        date: NaiveDate,
        #[arg(long)]
        status: AttendanceStatus,
        /// E-mail of the instructor recording the mark
        #[arg(long)]
        instructor: String,
    },
    /// Aggregate attendance per customer over a date range
    Report {
        #[arg(long)]
        session: Uuid,
        #[arg(long)]
        from: NaiveDate,
        #[arg(long)]
        to: NaiveDate,
        /// Also write the summaries to a CSV file
        #[arg(long)]
        csv: Option<PathBuf>,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let database_url = std::env::var("DATABASE_URL")
        .context("DATABASE_URL must be set to a production Postgres instance")?;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .context("failed to connect to Postgres")?;

    match cli.command {
        Commands::InitDb => {
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            db::seed(&pool).await?;
            println!("Seed data inserted.");
        }
        Commands::Roster { session, date } => {
            let response = api::get_roster(&pool, session, date).await;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        Commands::Mark {
            enrollment_session,
            date,
            status,
            instructor,
        } => {
            let response =
                api::mark_attendance(&pool, enrollment_session, date, status, &instructor).await;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        Commands::Report {
            session,
            from,
            to,
            csv,
        } => {
            let response = api::get_report(&pool, session, from, to).await;
            if let (Some(path), Some(summaries)) = (csv.as_ref(), response.data.as_ref()) {
                report::write_csv(path, summaries)?;
                println!("Report written to {}.", path.display());
            }
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
    }

    Ok(())
}
