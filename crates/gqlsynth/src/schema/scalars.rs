//! Custom scalar overrides.
//!
//! A scalar override short-circuits type mapping: any field, argument, or
//! return whose type dereferences to a covered object key maps to the named
//! scalar instead of being expanded. The registry is seeded with a
//! `DateTime` override for the well-known timestamp type, validating RFC
//! 3339 text on input.

use std::sync::Arc;

use async_graphql::Value;
use async_graphql::dynamic::Scalar;
use indexmap::IndexMap;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use super::TIMESTAMP_TYPE;

/// Schema name of the seeded timestamp scalar.
pub const DATETIME_SCALAR: &str = "DateTime";

type ValidateFn = Arc<dyn Fn(&Value) -> bool + Send + Sync>;

/// One custom scalar mapping for a native object type.
#[derive(Clone)]
pub struct ScalarOverride {
    /// Scalar type name registered in the schema.
    pub schema_name: String,
    description: Option<String>,
    validate: Option<ValidateFn>,
}

impl ScalarOverride {
    /// Creates an override that accepts any input value.
    #[must_use]
    pub fn new(schema_name: impl Into<String>) -> Self {
        Self {
            schema_name: schema_name.into(),
            description: None,
            validate: None,
        }
    }

    /// Sets the scalar description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Installs an input validator.
    #[must_use]
    pub fn validator(mut self, validate: impl Fn(&Value) -> bool + Send + Sync + 'static) -> Self {
        self.validate = Some(Arc::new(validate));
        self
    }

    /// Runs the validator against a raw input value.
    #[must_use]
    pub fn is_valid(&self, value: &Value) -> bool {
        match &self.validate {
            Some(validate) => validate(value),
            None => true,
        }
    }

    pub(crate) fn to_scalar(&self) -> Scalar {
        let mut scalar = Scalar::new(&self.schema_name);
        if let Some(description) = &self.description {
            scalar = scalar.description(description);
        }
        if let Some(validate) = &self.validate {
            let validate = validate.clone();
            scalar = scalar.validator(move |value| validate(value));
        }
        scalar
    }
}

/// The seeded DateTime override: RFC 3339 text.
#[must_use]
pub fn datetime_scalar() -> ScalarOverride {
    ScalarOverride::new(DATETIME_SCALAR)
        .description("An RFC 3339 timestamp, e.g. 2024-01-15T10:30:00Z")
        .validator(|value| match value {
            Value::String(s) => OffsetDateTime::parse(s, &Rfc3339).is_ok(),
            _ => false,
        })
}

/// Object key → scalar override table.
#[derive(Clone, Default)]
pub struct ScalarOverrides {
    map: IndexMap<String, ScalarOverride>,
}

impl ScalarOverrides {
    /// The default table, covering the well-known timestamp type.
    #[must_use]
    pub fn seeded() -> Self {
        let mut overrides = Self::default();
        overrides.insert(TIMESTAMP_TYPE, datetime_scalar());
        overrides
    }

    /// Registers (or replaces) an override for an object key.
    pub fn insert(&mut self, key: impl Into<String>, scalar: ScalarOverride) {
        self.map.insert(key.into(), scalar);
    }

    /// Whether an object key is covered.
    #[must_use]
    pub fn covers(&self, key: &str) -> bool {
        self.map.contains_key(key)
    }

    /// Looks up the override for an object key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&ScalarOverride> {
        self.map.get(key)
    }

    /// Iterates over the registered overrides.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ScalarOverride)> {
        self.map.iter().map(|(k, v)| (k.as_str(), v))
    }
}
