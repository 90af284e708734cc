//! Skylens Core - Crisis-imagery analysis library.
//!
//! Skylens ingests crisis-map and drone images, sends them to one of
//! several interchangeable vision-language backends, and validates the
//! structured result against a category-specific schema before handing it
//! back for persistence.
//!
//! # Architecture
//!
//! ```text
//! Image + prompt → Orchestrator (select/fallback across providers)
//!                → raw AnalysisResult
//!                → normalize + validate against category schema
//!                → AnalysisRecord (document, validity, provenance)
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use skylens_core::{
//!     build_providers, AnalysisService, Category, Config, Orchestrator,
//!     SchemaRegistry, StaticAvailability,
//! };
//!
//! #[tokio::main]
//! async fn main() -> skylens_core::Result<()> {
//!     let config = Config::load()?;
//!     let records = config.orchestrator.availability.iter().map(|e| e.to_record()).collect();
//!     let orchestrator = Arc::new(Orchestrator::new(
//!         build_providers(&config),
//!         Arc::new(StaticAvailability::new(records)),
//!     ));
//!     let service = AnalysisService::new(orchestrator, Arc::new(SchemaRegistry::with_builtin()));
//!
//!     let image = std::fs::read("./map.png")?;
//!     let record = service
//!         .analyze(&image, "Describe this map.", "", None, &Category::from("crisis_map"))
//!         .await?;
//!     println!("valid: {}", record.is_valid);
//!     Ok(())
//! }
//! ```

// Module declarations
pub mod analysis;
pub mod config;
pub mod error;
pub mod schema;
pub mod service;
pub mod types;
pub mod validate;

// Re-exports for convenient access
pub use analysis::{
    build_providers, AnalysisProvider, AnalysisRequest, ImageInput, Orchestrator,
    StaticAvailability, RANDOM_PROVIDER,
};
pub use config::Config;
pub use error::{
    AnalysisError, AvailabilityError, ConfigError, ProviderError, Result, SchemaError,
    SkylensError,
};
pub use schema::{SchemaDocument, SchemaRegistry};
pub use service::AnalysisService;
pub use types::{
    AnalysisRecord, AnalysisResult, AvailabilityRecord, Category, ProviderDescriptor,
    ProviderFamily, ValidationOutcome,
};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
