// tessera/src/commands/import.rs
//
// USE CASE: Run an import.

use std::sync::Arc;

use anyhow::{Context, bail};
use serde_json::Value;
use tessera_core::application::{IdentifierResolver, Importer};
use tessera_core::domain::{IdentifierMaps, SettingsStore};
use tessera_core::infrastructure::adapters::{HttpCatalog, MemoryStore, load_identifier_maps};
use tessera_core::infrastructure::readers::XmlReader;
use tessera_core::infrastructure::writers::{CatalogWriter, JsonFileWriter, NullWriter};
use tessera_core::ports::ItemWriter;

use crate::cli::ImportArgs;
use crate::mapping::load_mapping;

pub async fn execute(args: ImportArgs) -> anyhow::Result<()> {
    let start = std::time::Instant::now();

    // A. Settings (overrides from the command line, then defaults)
    let mut settings = SettingsStore::new();
    for pair in &args.settings {
        let (key, raw) = pair
            .split_once('=')
            .with_context(|| format!("setting '{}' is not KEY=VALUE", pair))?;
        // Values parse as JSON when they can, fall back to plain strings.
        let value =
            serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
        settings.set(key, value);
    }
    if let Some(writer) = &args.writer {
        settings.set("writer", Value::String(writer.clone()));
    }
    settings.fill_in_defaults();
    tracing::debug!(settings = ?settings, "effective settings");

    // B. Identifier maps (fixture file, or the live catalog)
    println!("⚙️  Resolving identifiers...");
    let maps: Arc<IdentifierMaps> = match (&args.ids, &args.api_root) {
        (Some(path), _) => Arc::new(load_identifier_maps(path).with_context(|| {
            format!("Failed to load identifier maps from {}", path.display())
        })?),
        (None, Some(api_root)) => {
            // The catalog only serves element sets, elements and item types;
            // collection and existing-item ids need a fixture file.
            let resolver = IdentifierResolver::new(
                Arc::new(HttpCatalog::new(api_root)),
                Arc::new(MemoryStore::default()),
            );
            resolver.maps().await?
        }
        (None, None) => bail!("either --ids or --api-root is required"),
    };

    // C. Mapping rules (declaration failures report the config file line)
    println!("⚙️  Loading mapping rules from {}...", args.config.display());
    let rules = load_mapping(&args.config, maps.clone())?;
    println!("   Declared {} item type rule(s).", rules.len());

    // D. Writer
    let writer: Arc<dyn ItemWriter> = match settings.get_str("writer").as_deref() {
        Some("null") => Arc::new(NullWriter),
        Some("json") => {
            let out = args
                .out
                .as_ref()
                .context("--out is required with the json writer")?;
            Arc::new(JsonFileWriter::create(out)?)
        }
        Some("catalog") => {
            let api_root = args
                .api_root
                .as_ref()
                .context("--api-root is required with the catalog writer")?;
            Arc::new(CatalogWriter::new(api_root, args.api_key.clone()))
        }
        other => bail!("unknown writer '{}'", other.unwrap_or_default()),
    };

    // E. Reader (XML sources only for now)
    match settings.get_str("reader").as_deref() {
        Some("xml") | None => {}
        Some(other) => bail!("unknown reader '{}'", other),
    }
    let reader = XmlReader::new(&settings, &args.sources);

    // F. Run the Pipeline (Application Layer)
    let importer = Importer::new(Arc::new(settings), maps, rules);
    match importer.process(reader, writer).await {
        Ok(report) if report.success => {
            println!(
                "\n✨ SUCCESS! {} records imported in {:.2?}",
                report.record_count,
                start.elapsed()
            );
            Ok(())
        }
        Ok(report) => {
            eprintln!(
                "\n❌ FAILURE. {} records skipped by the writer.",
                report.skipped_by_writer
            );
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("\n💥 CRITICAL IMPORT ERROR: {}", e);
            std::process::exit(1);
        }
    }
}
