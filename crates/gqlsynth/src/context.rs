//! Request context and query metadata carriers.
//!
//! These are the two well-known marker types the classifier recognizes by
//! identity ([`crate::descriptor::TypeDesc::Context`] and
//! [`crate::descriptor::TypeDesc::Info`]). A [`RequestContext`] is installed
//! on the request (or schema) via the engine's data mechanism and handed into
//! every callable that declares a context parameter, unmodified. A
//! [`QueryInfo`] describes the field currently being resolved.

use std::collections::HashMap;
use std::sync::Arc;

use async_graphql::Value;

/// Request-scoped context passed through the execution engine into resolvers.
///
/// Cheap to clone; the value map is shared behind an `Arc` and immutable once
/// built, so concurrent sibling resolutions can read it freely.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    values: Arc<HashMap<String, Value>>,
}

impl RequestContext {
    /// Creates an empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts building a context.
    #[must_use]
    pub fn builder() -> RequestContextBuilder {
        RequestContextBuilder::default()
    }

    /// Looks up a context value by key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Whether the context carries no values.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Builder for [`RequestContext`].
#[derive(Debug, Default)]
pub struct RequestContextBuilder {
    values: HashMap<String, Value>,
}

impl RequestContextBuilder {
    /// Adds a value under the given key.
    #[must_use]
    pub fn value(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    /// Finishes the context.
    #[must_use]
    pub fn build(self) -> RequestContext {
        RequestContext {
            values: Arc::new(self.values),
        }
    }
}

/// Metadata about the field a callable is resolving.
///
/// Captured once at synthesis time; every invocation of the same resolver
/// observes the same metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryInfo {
    /// Schema name of the object the field lives on.
    pub parent_type: String,
    /// Exposed name of the field being resolved.
    pub field_name: String,
}
