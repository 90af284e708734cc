//! The `skylens analyze` command.
//!
//! Reads an image, runs the generate → validate pipeline for the requested
//! category, and prints the resulting record as JSON on stdout.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use skylens_core::{
    build_providers, AnalysisService, Category, Config, Orchestrator, SchemaRegistry,
    StaticAvailability,
};

const DEFAULT_PROMPT: &str =
    "You are analyzing imagery from a humanitarian crisis response. Describe what the \
     image shows, assess the situation, and recommend concrete response actions.";

/// Arguments for the `analyze` command.
#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Image file to analyze
    pub image: PathBuf,

    /// Image category selecting the validation schema
    #[arg(long, default_value = "crisis_map")]
    pub category: String,

    /// Prompt sent to the analysis backend
    #[arg(long)]
    pub prompt: Option<String>,

    /// Instructions describing the metadata fields to extract
    /// (defaults to instructions generated from the category schema)
    #[arg(long)]
    pub instructions: Option<String>,

    /// Provider to use by name ("random" selects among available backends)
    #[arg(short, long)]
    pub model: Option<String>,

    /// Print compact JSON instead of pretty-printed
    #[arg(long)]
    pub compact: bool,
}

/// Execute the analyze command.
pub async fn execute(args: AnalyzeArgs, config: Config) -> anyhow::Result<()> {
    let providers = build_providers(&config);
    if providers.is_empty() {
        anyhow::bail!(
            "No analysis providers are registered. Enable the stub provider or \
             configure an API key (see `skylens config show`)."
        );
    }

    let records = config
        .orchestrator
        .availability
        .iter()
        .map(|entry| entry.to_record())
        .collect();
    let orchestrator = Arc::new(Orchestrator::new(
        providers,
        Arc::new(StaticAvailability::new(records)),
    ));

    let schemas = Arc::new(match config.schema_dir() {
        Some(dir) => SchemaRegistry::new(Arc::new(skylens_core::schema::FileSchemaStore::new(dir))),
        None => SchemaRegistry::with_builtin(),
    });

    let category = Category::from(args.category.as_str());
    let instructions = match args.instructions {
        Some(instructions) => instructions,
        None => schemas.get(&category).await?.metadata_instructions(),
    };
    let prompt = args.prompt.as_deref().unwrap_or(DEFAULT_PROMPT);

    // The CLI model flag wins; otherwise the configured default applies.
    let model = args
        .model
        .clone()
        .unwrap_or_else(|| config.orchestrator.default_provider.clone());

    let image_bytes = tokio::fs::read(&args.image).await.map_err(|e| {
        anyhow::anyhow!("cannot read image {}: {e}", args.image.display())
    })?;

    let service =
        AnalysisService::with_limits(orchestrator, schemas, &config.limits);
    let record = service
        .analyze(&image_bytes, prompt, &instructions, Some(&model), &category)
        .await?;

    if record.fallback_used {
        tracing::warn!(
            provider = %record.provider_name,
            original = record.original_provider_name.as_deref().unwrap_or(""),
            "analysis served by fallback provider"
        );
    }
    if !record.is_valid {
        tracing::warn!(
            detail = record.error_message.as_deref().unwrap_or(""),
            "analysis failed schema validation; record flagged"
        );
    }

    let output = if args.compact {
        serde_json::to_string(&record)?
    } else {
        serde_json::to_string_pretty(&record)?
    };
    println!("{output}");

    Ok(())
}
