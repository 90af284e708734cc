//! The `skylens providers` command.
//!
//! Lists registered analysis backends with their family and availability
//! state, merging the static availability records from configuration.

use clap::Args;
use skylens_core::{build_providers, Config};

/// Arguments for the `providers` command.
#[derive(Args, Debug)]
pub struct ProvidersArgs {
    /// Output as JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

/// Execute the providers command.
pub async fn execute(args: ProvidersArgs, config: Config) -> anyhow::Result<()> {
    let providers = build_providers(&config);

    if args.json {
        let descriptors: Vec<_> = providers.iter().map(|p| p.describe()).collect();
        println!("{}", serde_json::to_string_pretty(&descriptors)?);
        return Ok(());
    }

    if providers.is_empty() {
        println!("No providers registered.");
        return Ok(());
    }

    println!("{:<12} {:<8} {:<10} {}", "NAME", "FAMILY", "CONFIGURED", "AVAILABILITY");
    for provider in &providers {
        let descriptor = provider.describe();
        let entry = config
            .orchestrator
            .availability
            .iter()
            .find(|e| e.name == descriptor.name);
        let availability = match entry {
            Some(e) if e.fallback_default => "available (fallback default)",
            Some(e) if e.available => "available",
            Some(_) => "disabled",
            None => "unlisted",
        };
        println!(
            "{:<12} {:<8} {:<10} {}",
            descriptor.name,
            descriptor.family.to_string(),
            if descriptor.available_hint { "yes" } else { "no" },
            availability
        );
    }

    Ok(())
}
