use ao3scrap::config::{IdsConfig, WorksConfig};
use ao3scrap::process::{collect_ids, scrape_works};
use ao3scrap::{info_time, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(version, about = "Scrape AO3 work ids and works into CSV")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Collect work ids by paginating through a search
    Ids(IdsConfig),
    /// Scrape text and metadata for a list of work ids
    Works(WorksConfig),
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ao3scrap=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let start_time = Local::now();
    let log_path = match &cli.command {
        Command::Ids(config) => collect_ids(config).await?,
        Command::Works(config) => scrape_works(config).await?,
    };
    info_time!(start_time, "Log file saved at: {}", log_path.display());

    Ok(())
}
