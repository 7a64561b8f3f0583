//! pdfharvest CLI: bulk PDF manual downloader.
//!
//! Collects PDF links from a vendor search API and public HTML pages and
//! downloads them into a local directory, skipping files already on disk.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
