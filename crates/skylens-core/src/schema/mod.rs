//! Category schemas: the contracts analysis documents are validated against.
//!
//! Schemas live in a durable store and are cached here per category. Admin
//! edits invalidate the cache entry so the next lookup reflects the new
//! contract without a process restart.

mod document;
mod store;

pub use document::{FieldKind, FieldSpec, SchemaDocument, METADATA_SENTINEL, REQUIRED_TOP_LEVEL};
pub use store::{BuiltinSchemaStore, FileSchemaStore, SchemaStore};

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::SchemaError;
use crate::types::Category;

/// Read-through schema cache over a durable store.
///
/// Entries are whole `Arc<SchemaDocument>` values swapped under an RwLock:
/// a concurrent reader sees the old or the new schema, never a partial one.
pub struct SchemaRegistry {
    store: Arc<dyn SchemaStore>,
    cache: RwLock<HashMap<String, Arc<SchemaDocument>>>,
}

impl SchemaRegistry {
    pub fn new(store: Arc<dyn SchemaStore>) -> Self {
        Self {
            store,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Registry over the compiled-in schemas only.
    pub fn with_builtin() -> Self {
        Self::new(Arc::new(BuiltinSchemaStore::new()))
    }

    /// Get the schema for a category, fetching on cache miss.
    ///
    /// A missing schema is a hard error: the caller cannot validate
    /// anything without knowing which contract applies.
    pub async fn get(&self, category: &Category) -> Result<Arc<SchemaDocument>, SchemaError> {
        if let Some(schema) = self.cache.read().await.get(category.as_str()) {
            return Ok(schema.clone());
        }

        let schema = Arc::new(self.store.fetch(category.as_str()).await?);
        self.cache
            .write()
            .await
            .insert(category.as_str().to_string(), schema.clone());
        tracing::debug!(category = %category, "schema cached");
        Ok(schema)
    }

    /// Drop the cached entry for one category.
    ///
    /// Called after an admin schema edit; the very next `get` for the
    /// category fetches from the store.
    pub async fn invalidate(&self, category: &str) {
        self.cache.write().await.remove(category);
        tracing::debug!(category, "schema cache entry invalidated");
    }

    /// Drop every cached entry.
    pub async fn invalidate_all(&self) {
        self.cache.write().await.clear();
    }
}
