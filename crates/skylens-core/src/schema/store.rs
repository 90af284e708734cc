//! Schema stores: where category contracts are fetched from.

use async_trait::async_trait;
use std::path::PathBuf;

use crate::error::SchemaError;
use crate::types::Category;

use super::document::SchemaDocument;

/// Durable source of schema documents, keyed by category.
///
/// Admin-side schema edits happen behind this boundary; the registry caches
/// what it fetches and is told when to invalidate.
#[async_trait]
pub trait SchemaStore: Send + Sync {
    async fn fetch(&self, category: &str) -> Result<SchemaDocument, SchemaError>;
}

/// Store serving only the compiled-in schemas.
#[derive(Debug, Default)]
pub struct BuiltinSchemaStore;

impl BuiltinSchemaStore {
    pub fn new() -> Self {
        Self
    }

    fn builtin(category: &str) -> Option<SchemaDocument> {
        match category {
            Category::CRISIS_MAP => Some(SchemaDocument::crisis_map()),
            Category::DRONE_IMAGE => Some(SchemaDocument::drone_image()),
            _ => None,
        }
    }
}

#[async_trait]
impl SchemaStore for BuiltinSchemaStore {
    async fn fetch(&self, category: &str) -> Result<SchemaDocument, SchemaError> {
        Self::builtin(category).ok_or_else(|| SchemaError::NotFound {
            category: category.to_string(),
        })
    }
}

/// Store reading `<category>.json` files from a directory.
///
/// Categories without a file fall back to the built-in schemas, so a
/// deployment can override just one category.
pub struct FileSchemaStore {
    dir: PathBuf,
}

impl FileSchemaStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl SchemaStore for FileSchemaStore {
    async fn fetch(&self, category: &str) -> Result<SchemaDocument, SchemaError> {
        let path = self.dir.join(format!("{category}.json"));
        match tokio::fs::read_to_string(&path).await {
            Ok(content) => {
                serde_json::from_str(&content).map_err(|e| SchemaError::Store {
                    message: format!("invalid schema file for '{category}': {e}"),
                })
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                BuiltinSchemaStore::builtin(category).ok_or_else(|| SchemaError::NotFound {
                    category: category.to_string(),
                })
            }
            Err(e) => Err(SchemaError::Store {
                message: format!("cannot read schema file for '{category}': {e}"),
            }),
        }
    }
}
