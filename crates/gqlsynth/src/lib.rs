//! GraphQL schema synthesis from explicit type descriptors.
//!
//! Applications describe their native data model once — objects, annotated
//! fields, and methods with real invoke closures — and `gqlsynth` turns the
//! description into an executable dynamic GraphQL schema:
//!
//! - annotated fields become object fields with lookup resolvers
//! - methods become resolver fields with flattened arguments, context and
//!   query-metadata injection, and per-field error reporting
//! - cyclic and mutually recursive type graphs are handled by expanding each
//!   type exactly once
//! - structurally identical input types collapse onto one schema type
//!
//! # Example
//!
//! ```ignore
//! use gqlsynth::{RetValue, SchemaSynthesizer, TypeDesc, TypeSet};
//!
//! let mut types = TypeSet::new();
//! types.object("Widget", |o| {
//!     o.field("ID", "id,nonNull", TypeDesc::String);
//!     o.field("Name", "name", TypeDesc::String);
//! });
//! types.object("Query", |o| {
//!     o.method("get_widget", |m| {
//!         m.resolver()
//!             .returns(TypeDesc::optional(TypeDesc::object("Widget")))
//!             .invoke(|_| vec![RetValue::Data(widget_value())]);
//!     });
//! });
//!
//! let schema = SchemaSynthesizer::new(types).query("Query").build()?;
//! ```

pub mod annotation;
pub mod classify;
pub mod config;
pub mod context;
pub mod descriptor;
pub mod error;
pub mod resolver;
pub mod schema;

pub use annotation::FieldAnnotation;
pub use classify::{Classification, FnSig, SlotInfo};
pub use config::SynthConfig;
pub use context::{QueryInfo, RequestContext, RequestContextBuilder};
pub use descriptor::{
    FieldDesc, InvokeFn, MethodDesc, MethodIntent, ObjectDesc, RetValue, SlotValue, TypeDesc,
    TypeSet,
};
pub use error::{ResolveError, SynthError};
pub use schema::{
    DATETIME_SCALAR, ScalarOverride, ScalarOverrides, SchemaSynthesizer, TIMESTAMP_TYPE,
    datetime_scalar,
};

/// Result type for schema synthesis operations.
pub type Result<T> = std::result::Result<T, SynthError>;
