//! Error types for schema synthesis and field resolution.
//!
//! Build-time errors ([`SynthError`]) are detected synchronously during the
//! one-shot synthesis pass, wrapped with the enclosing type/field/method name,
//! and abort the entire build — no partial schema is ever returned.
//! Resolution-time errors ([`ResolveError`]) are local to one field and are
//! surfaced per-field by the execution engine.

use thiserror::Error;

/// Errors raised while synthesizing a schema.
#[derive(Debug, Error)]
pub enum SynthError {
    /// Annotation string violates the `name[,nonNull]` grammar.
    #[error("invalid annotation, expected `name[,nonNull]`, got `{0}`")]
    MalformedAnnotation(String),

    /// A bound callable's receiver does not dereference to an object type.
    #[error("resolver receiver must be an object type, got {0}")]
    InvalidReceiver(String),

    /// Callable declares more parameters than the classifier accepts.
    #[error("callable accepts at most {max} parameters, got {got}")]
    TooManyArguments { max: usize, got: usize },

    /// Callable declares more than two return values.
    #[error("callable may declare at most two return values, got {0}")]
    TooManyReturns(usize),

    /// More than one parameter was left for the input slot.
    #[error("expected at most one input parameter, second was {0}")]
    AmbiguousInput(String),

    /// More than one return value was left for the output slot.
    #[error("expected at most one output value, second was {0}")]
    AmbiguousOutput(String),

    /// Input slot is not a non-collection object with annotated fields.
    #[error("input type {0} must be a non-collection object with at least one annotated field")]
    InvalidInputShape(String),

    /// Object-kind output exposes no annotated fields.
    #[error("output type {0} must expose at least one annotated field")]
    InvalidOutputShape(String),

    /// Callable produces no usable output value.
    #[error("callable declares no output value")]
    MissingOutput,

    /// The type kind has no schema representation.
    #[error("type {0} has no schema representation")]
    UnsupportedType(String),

    /// Map kinds never map to a schema type; the field must be excluded.
    #[error("map type {0} is not representable; exclude the field with `-`")]
    UnsupportedMapType(String),

    /// Two structurally different types claim the same schema type name.
    #[error("schema type name `{name}` claimed by both {first} and {second}")]
    TypeNameCollision {
        name: String,
        first: String,
        second: String,
    },

    /// A descriptor key that was never registered in the type set.
    #[error("unknown type key `{0}`")]
    UnknownType(String),

    /// The execution engine rejected the assembled schema.
    #[error("failed to build schema: {0}")]
    SchemaBuildFailed(String),

    /// Wraps an error with the enclosing type/field/method for diagnosis.
    #[error("{at}: {source}")]
    In {
        at: String,
        #[source]
        source: Box<SynthError>,
    },
}

impl SynthError {
    /// Wraps the error with the name of the enclosing type, field, or method.
    #[must_use]
    pub fn within(self, at: impl Into<String>) -> Self {
        Self::In {
            at: at.into(),
            source: Box::new(self),
        }
    }

    /// Returns the error kind, looking through context wrappers.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MalformedAnnotation(_) => "MALFORMED_ANNOTATION",
            Self::InvalidReceiver(_) => "INVALID_RECEIVER",
            Self::TooManyArguments { .. } => "TOO_MANY_ARGUMENTS",
            Self::TooManyReturns(_) => "TOO_MANY_RETURNS",
            Self::AmbiguousInput(_) => "AMBIGUOUS_INPUT",
            Self::AmbiguousOutput(_) => "AMBIGUOUS_OUTPUT",
            Self::InvalidInputShape(_) => "INVALID_INPUT_SHAPE",
            Self::InvalidOutputShape(_) => "INVALID_OUTPUT_SHAPE",
            Self::MissingOutput => "MISSING_OUTPUT",
            Self::UnsupportedType(_) => "UNSUPPORTED_TYPE",
            Self::UnsupportedMapType(_) => "UNSUPPORTED_MAP_TYPE",
            Self::TypeNameCollision { .. } => "TYPE_NAME_COLLISION",
            Self::UnknownType(_) => "UNKNOWN_TYPE",
            Self::SchemaBuildFailed(_) => "SCHEMA_BUILD_FAILED",
            Self::In { source, .. } => source.kind(),
        }
    }
}

/// Errors raised while resolving one field at request time.
///
/// These never panic and never abort sibling resolutions; the execution
/// engine reports them per-field (the engine's blanket `From` converts them
/// via their `Display` form). The underlying callable's own returned error
/// always takes precedence over the output value.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// A raw argument value could not be coerced into its declared shape.
    #[error("argument coercion failed: expected {expected}, got {got}")]
    Coercion { expected: String, got: String },

    /// The underlying callable returned an error value.
    #[error("{0}")]
    Callable(String),
}
