use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use oeis_common::{Config, SeqId};
use oeis_graph::{GraphClient, GraphWriter};
use oeis_scraper::{FileRecordSource, HttpRecordSource, Pipeline};

#[derive(Parser)]
#[command(name = "oeis-scraper", about = "Scrape OEIS sequence pages into Neo4j")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scrape a contiguous identifier range from the web interface.
    Scrape {
        /// First numeric identifier suffix (inclusive).
        #[arg(value_parser = clap::value_parser!(u32).range(..=999_999))]
        start: u32,
        /// Last numeric identifier suffix (inclusive).
        #[arg(value_parser = clap::value_parser!(u32).range(..=999_999))]
        end: u32,
        /// Override the number of concurrent fetch workers.
        #[arg(long)]
        workers: Option<usize>,
    },
    /// Load pre-fetched .seq record files from a directory tree.
    Load {
        /// Root directory to scan for .seq files.
        dir: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("oeis_scraper=info".parse()?)
                .add_directive("oeis_graph=info".parse()?)
                .add_directive("oeis_common=info".parse()?),
        )
        .init();

    info!("OEIS graph loader starting...");

    let cli = Cli::parse();

    // Config is resolved before any network activity; missing credentials
    // abort here with a clear message.
    let config = Config::from_env();
    config.log_redacted();

    let client = GraphClient::connect(&config).await?;
    let writer = GraphWriter::new(client, config.neo4j_batch_size);

    let stats = match cli.command {
        Command::Scrape { start, end, workers } => {
            let ids: Vec<SeqId> = (start..=end).map(SeqId::from_number).collect();
            let source = Arc::new(HttpRecordSource::new(&config.base_url));
            let pipeline = Pipeline::new(
                source,
                workers.unwrap_or(config.num_workers),
                config.progress_interval,
            );
            pipeline.run(ids, &writer).await
        }
        Command::Load { dir } => {
            let source = FileRecordSource::scan(&dir)?;
            let ids = source.ids();
            let pipeline =
                Pipeline::new(Arc::new(source), config.num_workers, config.progress_interval);
            pipeline.run(ids, &writer).await
        }
    };

    println!("{stats}");
    Ok(())
}
