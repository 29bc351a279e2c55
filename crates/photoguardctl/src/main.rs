//! photoguardctl - run and operate the PhotoGuard moderation service

mod cli;
mod commands;

use clap::Parser;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so command output on stdout stays machine-readable
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr).with_target(true))
        .with(filter)
        .init();

    let cli = Cli::parse();
    cli.execute().await
}
