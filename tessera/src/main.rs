// tessera/src/main.rs

mod cli;
mod commands;
mod mapping;

use clap::Parser;
use cli::{Cli, Commands};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        // --- USE CASE: IMPORT ---
        Commands::Import(args) => {
            // 1. Setup Logging (Tracing)
            // RUST_LOG=debug tessera import ... for the details
            let default_level = if args.debug { "debug" } else { "info" };
            tracing_subscriber::fmt()
                .with_env_filter(
                    EnvFilter::try_from_default_env()
                        .unwrap_or_else(|_| EnvFilter::new(default_level)),
                )
                .with_writer(std::io::stderr)
                .init();

            commands::import::execute(args).await
        }
    }
}
