//! Configuration validation with range checks.

use crate::error::ConfigError;

use super::Config;

impl Config {
    /// Validate configuration values are within acceptable ranges.
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.limits.max_image_bytes == 0 {
            return Err(ConfigError::ValidationError(
                "limits.max_image_bytes must be > 0".into(),
            ));
        }
        if self.limits.hosted_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "limits.hosted_timeout_ms must be > 0".into(),
            ));
        }
        if self.orchestrator.default_provider.is_empty() {
            return Err(ConfigError::ValidationError(
                "orchestrator.default_provider must not be empty".into(),
            ));
        }
        let defaults = self
            .orchestrator
            .availability
            .iter()
            .filter(|entry| entry.fallback_default)
            .count();
        if defaults > 1 {
            return Err(ConfigError::ValidationError(
                "orchestrator.availability may mark at most one fallback_default".into(),
            ));
        }
        for entry in &self.orchestrator.availability {
            if entry.name.is_empty() {
                return Err(ConfigError::ValidationError(
                    "orchestrator.availability entries must have a name".into(),
                ));
            }
        }
        Ok(())
    }
}
