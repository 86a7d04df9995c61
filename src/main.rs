mod cli;
mod config;
mod dataset;
mod error;
mod insights;
mod job;
mod notify;
mod output;
mod plot;
mod providers;

use anyhow::Result;
use clap::Parser;
use cli::Cli;
use log::info;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    output::print_banner();

    let cli = Cli::parse();
    info!("Starting RepoLens - Repository Engagement Analysis");
    cli.execute().await?;

    Ok(())
}
