//! Synthesizer configuration.
//!
//! Configuration can be embedded in an application's TOML config under a
//! `[graphql]` (or similar) section and handed to
//! [`crate::SchemaSynthesizer::with_config`].
//!
//! # Example Configuration
//!
//! ```toml
//! [graphql]
//! shared_input_types = true
//! max_depth = 15
//! max_complexity = 500
//! introspection = true
//! ```

use serde::{Deserialize, Serialize};

/// Schema synthesis configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynthConfig {
    /// Deduplicate structurally identical input object types.
    /// When two input structs hash to the same shape, the first registered
    /// schema name is reused for both.
    /// Default: true
    #[serde(default = "default_shared_input_types")]
    pub shared_input_types: bool,

    /// Maximum query depth allowed.
    /// Limits nesting of fields to prevent denial-of-service attacks.
    /// Default: 15
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// Maximum query complexity allowed.
    /// Each field has a complexity cost; complex queries are rejected.
    /// Default: 500
    #[serde(default = "default_max_complexity")]
    pub max_complexity: usize,

    /// Enable GraphQL introspection queries.
    /// Should be disabled in production for security.
    /// Default: true (development-friendly)
    #[serde(default = "default_introspection")]
    pub introspection: bool,
}

fn default_shared_input_types() -> bool {
    true
}

fn default_max_depth() -> usize {
    15
}

fn default_max_complexity() -> usize {
    500
}

fn default_introspection() -> bool {
    true
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self {
            shared_input_types: default_shared_input_types(),
            max_depth: default_max_depth(),
            max_complexity: default_max_complexity(),
            introspection: default_introspection(),
        }
    }
}

impl SynthConfig {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration values are invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_depth == 0 {
            return Err("graphql.max_depth must be > 0".into());
        }
        if self.max_complexity == 0 {
            return Err("graphql.max_complexity must be > 0".into());
        }
        Ok(())
    }
}
