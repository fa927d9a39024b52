use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use session::config::BrowserConfig;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Event map query tooling")]
struct Args {
    /// JSON config file; EVENTMAP_* variables override it
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compile a filter state (JSON) into the events query
    Compile {
        /// Filter JSON file; reads stdin when omitted
        #[arg(long)]
        filters: Option<PathBuf>,

        /// Selected event id, kept visible by the bbox clause
        #[arg(long)]
        selected: Option<String>,

        /// Compile as if the search index failed to build
        #[arg(long)]
        no_fts: bool,
    },

    /// Print the engine startup script
    BootstrapSql {
        /// Dataset path (defaults to the configured one)
        #[arg(long)]
        dataset: Option<String>,
    },

    /// Print the autocomplete lookup for a prefix
    SuggestSql {
        prefix: String,
    },

    /// Days between an epoch and a date (YYYYMMDD or YYYY-MM-DD)
    DayIndex {
        date: String,
        #[arg(long, default_value = "20250101")]
        epoch: String,
    },

    /// Date at a day offset from an epoch
    FromDayIndex {
        #[arg(allow_negative_numbers = true)]
        index: i64,
        #[arg(long, default_value = "20250101")]
        epoch: String,
    },

    /// Print the effective configuration
    Config,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let config = BrowserConfig::load(args.config.as_deref())?;

    match args.command {
        Command::Compile {
            filters,
            selected,
            no_fts,
        } => {
            let json = match filters {
                Some(path) => fs::read_to_string(path)?,
                None => {
                    let mut buf = String::new();
                    io::stdin().read_to_string(&mut buf)?;
                    buf
                }
            };
            let sql = tools::compile_filters(&json, selected.as_deref(), !no_fts, config.limits)?;
            println!("{sql}");
        }
        Command::BootstrapSql { dataset } => {
            let dataset = dataset.unwrap_or(config.dataset_path);
            info!(%dataset, "bootstrap script");
            print!("{}", tools::bootstrap_script(&dataset));
        }
        Command::SuggestSql { prefix } => {
            println!("{}", tools::suggest_sql(&prefix, config.suggestion_limit));
        }
        Command::DayIndex { date, epoch } => {
            println!("{}", tools::day_index(&date, &epoch)?);
        }
        Command::FromDayIndex { index, epoch } => {
            println!("{}", tools::from_day_index(index, &epoch)?);
        }
        Command::Config => {
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
    }
    Ok(())
}
