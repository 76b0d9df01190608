mod cli;

use anyhow::Result;
use citynotes::config::CityNotesConfig;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "citynotes", version, about = "Save Dutch cities and keep notes on them")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Find the best catalog match for a query
    Search { query: String },
    /// Save the best catalog match for a query
    Save { query: String },
    /// List saved cities, most recent first
    List,
    /// Remove a saved city by id
    Remove { id: String },
    /// Replace the notes of a saved city
    Notes { id: String, text: String },
    /// Edit notes interactively; each stdin line is appended and autosaved
    Edit { id: String },
    /// Print the saved collection as JSON
    Export,
    /// Add every city from a JSON export file
    Import { file: PathBuf },
    /// Show collection statistics
    Stats,
    /// Check database health
    Doctor,
    /// Delete the saved collection
    Reset,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = CityNotesConfig::load()?;

    // Log to stderr so stdout stays clean for `export`.
    let filter = EnvFilter::try_new(&config.logging.log_level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Search { query } => cli::search::search(&config, &query)?,
        Command::Save { query } => cli::search::save(&config, &query).await?,
        Command::List => cli::list::list(&config)?,
        Command::Remove { id } => cli::list::remove(&config, &id).await?,
        Command::Notes { id, text } => cli::list::notes(&config, &id, &text).await?,
        Command::Edit { id } => cli::edit::edit(&config, &id).await?,
        Command::Export => cli::export::export(&config)?,
        Command::Import { file } => cli::import::import(&config, &file).await?,
        Command::Stats => cli::stats::stats(&config)?,
        Command::Doctor => cli::doctor::doctor(&config)?,
        Command::Reset => cli::reset::reset(&config)?,
    }

    Ok(())
}
