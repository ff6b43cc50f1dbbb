//! Flourish CSV importer CLI.
//!
//! Usage:
//!     flourish-import --csv questions.csv --database sqlite:/path/to/flourish.db

use std::fs::File;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use flourish_db::DbConnection;
use flourish_import::ImportOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(
    name = "flourish-import",
    about = "Import sections, subsections and questions from a CSV file"
)]
struct Args {
    /// Path to the CSV file (columns: Section, Subsection, Question)
    #[arg(long)]
    csv: PathBuf,

    /// Database URL (sqlite:PATH or duckdb:PATH)
    #[arg(long)]
    database: String,

    /// Import into this survey entity instead of the active one
    #[arg(long)]
    survey_id: Option<i64>,

    /// Print the statistics as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "flourish_import=info,flourish_db=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();

    let conn = DbConnection::open_from_url(&args.database)
        .with_context(|| format!("Failed to open database: {}", args.database))?;
    let file = File::open(&args.csv)
        .with_context(|| format!("Failed to open CSV file: {}", args.csv.display()))?;

    let options = ImportOptions {
        survey_id: args.survey_id,
    };
    let stats = flourish_import::import_csv_with_options(file, &conn, &options)
        .context("Import failed")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        println!("Import completed successfully!");
        println!();
        println!("{stats}");
    }

    Ok(())
}
