//! Schema synthesis.
//!
//! [`builder`] holds the one-shot orchestrator that walks a
//! [`crate::descriptor::TypeSet`] and assembles a dynamic schema;
//! [`scalars`] holds the custom scalar override table.

pub mod builder;
pub mod scalars;

pub use builder::SchemaSynthesizer;
pub use scalars::{DATETIME_SCALAR, ScalarOverride, ScalarOverrides, datetime_scalar};

/// Registry key of the well-known timestamp type, covered by the seeded
/// `DateTime` scalar.
pub const TIMESTAMP_TYPE: &str = "Timestamp";
