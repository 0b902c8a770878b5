//! Field annotation parsing.
//!
//! Fields opt into the schema through an annotation string of the form
//! `name[,nonNull]`. An empty string means the field is not exposed; the
//! dedicated `-` marker excludes it explicitly (useful to silence map-typed
//! fields, which have no schema representation).

use crate::error::SynthError;

/// Marker that excludes a field from the schema.
pub const EXCLUDED_MARKER: &str = "-";

/// The only flag token the annotation grammar accepts.
const NON_NULL_FLAG: &str = "nonNull";

/// Parsed form of one field annotation. Immutable once parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldAnnotation {
    /// Name the field is exposed under; empty when the field is not exposed.
    pub exposed_name: String,
    /// Whether the schema type is wrapped in a non-null.
    pub non_null: bool,
}

impl FieldAnnotation {
    /// Parses a declaration string.
    ///
    /// # Errors
    ///
    /// Returns [`SynthError::MalformedAnnotation`] when more than one comma is
    /// present or the second segment is not exactly `nonNull`.
    pub fn parse(tag: &str) -> Result<Self, SynthError> {
        let parts: Vec<&str> = tag.split(',').collect();
        if parts.len() > 2 {
            return Err(SynthError::MalformedAnnotation(tag.to_string()));
        }

        let mut annotation = Self {
            exposed_name: parts[0].to_string(),
            non_null: false,
        };

        if parts.len() == 2 {
            if parts[1] == NON_NULL_FLAG {
                annotation.non_null = true;
            } else {
                return Err(SynthError::MalformedAnnotation(tag.to_string()));
            }
        }

        Ok(annotation)
    }

    /// Whether the field participates in the schema at all.
    #[must_use]
    pub fn is_exposed(&self) -> bool {
        !self.exposed_name.is_empty() && self.exposed_name != EXCLUDED_MARKER
    }

    /// Re-serializes the annotation into its declaration form.
    #[must_use]
    pub fn serialize(&self) -> String {
        if self.non_null {
            format!("{},{NON_NULL_FLAG}", self.exposed_name)
        } else {
            self.exposed_name.clone()
        }
    }
}
