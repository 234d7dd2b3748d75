mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "cmc-ics")]
#[command(about = "Scrape the CMC event calendar into an ICS feed")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Mean delay between automated requests, in milliseconds
    #[arg(long)]
    delay_ms: Option<u64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape the calendar and write an ICS file
    Dump {
        /// Output file path
        #[arg(short, long, default_value = "./cmc-cal.ics")]
        output: String,

        /// Calendar name embedded in the feed
        #[arg(long)]
        calendar_name: Option<String>,
    },

    /// Scrape the calendar and print the entries
    List {
        /// Print entries as JSON
        #[arg(long)]
        json: bool,

        /// Keep only entries dated today or later (Mountain Time)
        #[arg(long)]
        upcoming: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("cmc_ics_core={log_level},cmc_ics_cli={log_level}").into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match cli.command {
        Commands::Dump {
            output,
            calendar_name,
        } => {
            commands::dump_command(commands::DumpParams {
                output,
                calendar_name,
                delay_ms: cli.delay_ms,
            })
            .await
        }

        Commands::List { json, upcoming } => {
            commands::list_command(json, upcoming, cli.delay_ms).await
        }
    }
}
