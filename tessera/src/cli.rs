// tessera/src/cli.rs
//
// Single source of truth for all CLI definitions (Clap structs).

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "tessera")]
#[command(about = "Record-by-record import pipeline for element-based catalogs", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 🚀 Runs an import (Sources -> Mapping Rules -> Writer)
    Import(ImportArgs),
}

#[derive(Args)]
pub struct ImportArgs {
    /// Source files or directories (directories expand to their .xml files)
    #[arg(required = true)]
    pub sources: Vec<PathBuf>,

    /// Mapping configuration file (YAML)
    #[arg(long, short)]
    pub config: PathBuf,

    /// Identifier maps fixture (JSON); skips the catalog round trip
    #[arg(long)]
    pub ids: Option<PathBuf>,

    /// Catalog API root, ex: http://localhost/api
    #[arg(long, env = "TESSERA_API_ROOT")]
    pub api_root: Option<String>,

    /// Catalog API key
    #[arg(long, env = "TESSERA_API_KEY")]
    pub api_key: Option<String>,

    /// Writer: null | json | catalog
    #[arg(long, short)]
    pub writer: Option<String>,

    /// Output file for the json writer
    #[arg(long)]
    pub out: Option<PathBuf>,

    /// Extra settings, repeatable: -s log.batch_size=100
    #[arg(long = "set", short, value_name = "KEY=VALUE")]
    pub settings: Vec<String>,

    /// Verbose diagnostics (an explicit RUST_LOG still wins)
    #[arg(long)]
    pub debug: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{Result, bail};
    use clap::Parser;

    #[test]
    fn test_cli_parse_import_defaults() -> Result<()> {
        let args = Cli::parse_from(["tessera", "import", "--config", "mapping.yml", "sources"]);
        match args.command {
            Commands::Import(import) => {
                assert_eq!(import.config.to_string_lossy(), "mapping.yml");
                assert_eq!(import.sources.len(), 1);
                assert_eq!(import.writer, None);
                assert!(!import.debug);
                Ok(())
            }
        }
    }

    #[test]
    fn test_cli_parse_import_full() -> Result<()> {
        let args = Cli::parse_from([
            "tessera",
            "import",
            "--config",
            "mapping.yml",
            "--ids",
            "ids.json",
            "--writer",
            "json",
            "--out",
            "out.jsonl",
            "-s",
            "processing_thread_pool=4",
            "-s",
            "log.batch_size=100",
            "a.xml",
            "b.xml",
        ]);
        match args.command {
            Commands::Import(import) => {
                assert_eq!(import.writer.as_deref(), Some("json"));
                assert_eq!(import.settings.len(), 2);
                assert_eq!(import.sources.len(), 2);
                Ok(())
            }
        }
    }

    #[test]
    fn test_cli_rejects_missing_sources() -> Result<()> {
        let parsed = Cli::try_parse_from(["tessera", "import", "--config", "mapping.yml"]);
        if parsed.is_ok() {
            bail!("Expected a parse error without sources");
        }
        Ok(())
    }
}
