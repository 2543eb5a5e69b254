//! Binary crate for the `luma` command-line tool.
//!
//! This crate focuses on:
//! - Parsing CLI arguments
//! - The interactive session and configuration prompts
//! - Rendering notices from the core for a terminal

use clap::Parser;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

mod cli;
mod interactive;
mod output;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cmd = cli::Cli::parse();
    init_tracing(cmd.verbose);
    cmd.run().await
}

fn init_tracing(verbose: bool) {
    let default =
        if verbose { "luma=debug,forecast_core=debug" } else { "luma=info,forecast_core=info" };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
