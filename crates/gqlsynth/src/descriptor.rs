//! Native type descriptors.
//!
//! The synthesizer never inspects real Rust types. Applications describe
//! their data model once through a [`TypeSet`]: an arena of object
//! descriptors indexed by key. [`TypeDesc`] values reference objects *by
//! key*, never by owned value, so self-referential and mutually referential
//! type graphs are declared directly — `Widget` may carry a field of type
//! `optional(object("Widget"))` without any ceremony.
//!
//! Methods carry real invoke closures. At resolution time a callable
//! receives its arguments as a positionally ordered slice of [`SlotValue`]s
//! (reordered into the positions it declared them in) and answers with a
//! positionally ordered list of [`RetValue`]s.

use std::fmt;
use std::sync::Arc;

use async_graphql::Value;
use indexmap::IndexMap;

use crate::context::{QueryInfo, RequestContext};

/// One native type shape.
///
/// `Context`, `Info` and `Error` are the well-known marker kinds: the
/// classifier recognizes them by identity (after stripping one level of
/// `Optional`/`List` wrapping) rather than by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeDesc {
    /// Signed integer of any width.
    Int,
    /// Unsigned integer of any width.
    Uint,
    /// Floating point of any width.
    Float,
    Bool,
    String,
    /// Growable ordered sequence.
    List(Arc<TypeDesc>),
    /// Fixed-length ordered sequence; maps like [`TypeDesc::List`].
    Array(Arc<TypeDesc>),
    /// Mapping kind; never representable in a schema.
    Map(Arc<TypeDesc>, Arc<TypeDesc>),
    /// Pointer analogue: one level of wrapping stripped for identity
    /// comparisons. Not a nullability signal — nullability comes from the
    /// field annotation.
    Optional(Arc<TypeDesc>),
    /// Reference to an object descriptor registered in a [`TypeSet`].
    Object(String),
    /// The request-context carrier marker.
    Context,
    /// The query-metadata carrier marker.
    Info,
    /// The error-carrier marker, recognized in return position.
    Error,
    /// Interface-like kind with no schema representation.
    Any,
}

impl TypeDesc {
    /// Shorthand for `List`.
    #[must_use]
    pub fn list(elem: TypeDesc) -> Self {
        Self::List(Arc::new(elem))
    }

    /// Shorthand for `Array`.
    #[must_use]
    pub fn array(elem: TypeDesc) -> Self {
        Self::Array(Arc::new(elem))
    }

    /// Shorthand for `Map`.
    #[must_use]
    pub fn map(key: TypeDesc, value: TypeDesc) -> Self {
        Self::Map(Arc::new(key), Arc::new(value))
    }

    /// Shorthand for `Optional`.
    #[must_use]
    pub fn optional(inner: TypeDesc) -> Self {
        Self::Optional(Arc::new(inner))
    }

    /// Shorthand for `Object`.
    #[must_use]
    pub fn object(key: impl Into<String>) -> Self {
        Self::Object(key.into())
    }

    /// The well-known timestamp type, covered by the seeded DateTime scalar.
    #[must_use]
    pub fn timestamp() -> Self {
        Self::Object(crate::schema::TIMESTAMP_TYPE.into())
    }

    /// Strips one level of `Optional`/`List`/`Array` wrapping.
    #[must_use]
    pub fn dereferenced(&self) -> &TypeDesc {
        match self {
            Self::Optional(inner) | Self::List(inner) | Self::Array(inner) => inner,
            other => other,
        }
    }

    /// Whether this is the object (struct) kind.
    #[must_use]
    pub fn is_object(&self) -> bool {
        matches!(self, Self::Object(_))
    }

    /// The registry key, when this is an object reference.
    #[must_use]
    pub fn object_key(&self) -> Option<&str> {
        match self {
            Self::Object(key) => Some(key),
            _ => None,
        }
    }
}

impl fmt::Display for TypeDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int => write!(f, "int"),
            Self::Uint => write!(f, "uint"),
            Self::Float => write!(f, "float"),
            Self::Bool => write!(f, "bool"),
            Self::String => write!(f, "string"),
            Self::List(elem) => write!(f, "list<{elem}>"),
            Self::Array(elem) => write!(f, "array<{elem}>"),
            Self::Map(key, value) => write!(f, "map<{key}, {value}>"),
            Self::Optional(inner) => write!(f, "optional<{inner}>"),
            Self::Object(key) => write!(f, "{key}"),
            Self::Context => write!(f, "context"),
            Self::Info => write!(f, "info"),
            Self::Error => write!(f, "error"),
            Self::Any => write!(f, "any"),
        }
    }
}

/// One positional argument handed to a native callable.
#[derive(Debug, Clone)]
pub enum SlotValue {
    /// The source value or the coerced input value.
    Data(Value),
    /// The request-context carrier, passed through verbatim.
    Context(RequestContext),
    /// Per-field query metadata.
    Info(QueryInfo),
}

impl SlotValue {
    /// The data value, if this slot carries one.
    #[must_use]
    pub fn as_data(&self) -> Option<&Value> {
        match self {
            Self::Data(value) => Some(value),
            _ => None,
        }
    }

    /// The request context, if this slot carries one.
    #[must_use]
    pub fn as_context(&self) -> Option<&RequestContext> {
        match self {
            Self::Context(ctx) => Some(ctx),
            _ => None,
        }
    }

    /// The query metadata, if this slot carries one.
    #[must_use]
    pub fn as_info(&self) -> Option<&QueryInfo> {
        match self {
            Self::Info(info) => Some(info),
            _ => None,
        }
    }
}

/// One positional return value produced by a native callable.
#[derive(Debug, Clone)]
pub enum RetValue {
    /// An output value.
    Data(Value),
    /// The error slot; `None` mirrors the absence of an error.
    Error(Option<String>),
}

impl RetValue {
    /// Convenience constructor for a successful error slot.
    #[must_use]
    pub fn ok() -> Self {
        Self::Error(None)
    }

    /// Convenience constructor for a failed error slot.
    #[must_use]
    pub fn err(message: impl Into<String>) -> Self {
        Self::Error(Some(message.into()))
    }
}

/// The invoke closure attached to a method descriptor.
pub type InvokeFn = Arc<dyn Fn(&[SlotValue]) -> Vec<RetValue> + Send + Sync>;

/// How a method participates in schema synthesis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MethodIntent {
    /// Try the resolver signature; fall back to the plain getter path; a
    /// method fitting neither is silently skipped.
    #[default]
    Auto,
    /// Declared resolver: a classification failure aborts the build instead
    /// of being swallowed.
    Resolver,
    /// Never exposed (lifecycle hooks and the like).
    Skip,
}

/// One externally visible field of an object.
#[derive(Debug, Clone)]
pub struct FieldDesc {
    /// Native field name; resolvers read values under this key first.
    pub name: String,
    /// Annotation string, parsed with [`crate::annotation::FieldAnnotation`].
    pub tag: String,
    /// Declared field type.
    pub ty: TypeDesc,
}

/// One method (or attached free function) of an object.
#[derive(Clone)]
pub struct MethodDesc {
    /// Native method name; the exposed field name is its lower-camel form.
    pub name: String,
    /// Participation marker.
    pub intent: MethodIntent,
    /// Declared parameter types, in order, excluding the receiver.
    pub params: Vec<TypeDesc>,
    /// Declared return types, in order.
    pub returns: Vec<TypeDesc>,
    /// Whether the callable has no bound receiver.
    pub unbound: bool,
    /// The callable itself.
    pub invoke: InvokeFn,
}

impl fmt::Debug for MethodDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodDesc")
            .field("name", &self.name)
            .field("intent", &self.intent)
            .field("params", &self.params)
            .field("returns", &self.returns)
            .field("unbound", &self.unbound)
            .finish_non_exhaustive()
    }
}

/// One registered object descriptor.
#[derive(Debug, Clone, Default)]
pub struct ObjectDesc {
    /// Explicit schema type name override; the registry key is used when
    /// absent.
    pub schema_name: Option<String>,
    /// Externally visible fields, in declaration order.
    pub fields: Vec<FieldDesc>,
    /// Methods, in declaration order.
    pub methods: Vec<MethodDesc>,
}

impl ObjectDesc {
    /// Whether any field carries an annotation that exposes it.
    pub(crate) fn has_annotated_field(&self) -> bool {
        self.fields.iter().any(|field| {
            crate::annotation::FieldAnnotation::parse(&field.tag)
                .map(|ann| ann.is_exposed())
                .unwrap_or(false)
        })
    }
}

/// The descriptor registry: an ordered arena of object descriptors.
///
/// Native type identity is the registry key. The set is immutable once
/// handed to a [`crate::SchemaSynthesizer`].
#[derive(Debug, Clone, Default)]
pub struct TypeSet {
    objects: IndexMap<String, ObjectDesc>,
}

impl TypeSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an object descriptor under `key`, built through the closure.
    ///
    /// Registering the same key twice replaces the earlier descriptor.
    pub fn object(
        &mut self,
        key: impl Into<String>,
        build: impl FnOnce(&mut ObjectBuilder),
    ) -> &mut Self {
        let mut builder = ObjectBuilder::default();
        build(&mut builder);
        self.objects.insert(key.into(), builder.desc);
        self
    }

    /// Looks up a descriptor by key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&ObjectDesc> {
        self.objects.get(key)
    }

    /// Whether a descriptor is registered under `key`.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.objects.contains_key(key)
    }

    /// Registered keys, in registration order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.objects.keys().map(String::as_str)
    }
}

/// Builder handed to the [`TypeSet::object`] closure.
#[derive(Debug, Default)]
pub struct ObjectBuilder {
    desc: ObjectDesc,
}

impl ObjectBuilder {
    /// Overrides the schema type name (the capability that replaces naming
    /// conventions: the first-seen override wins during deduplication).
    pub fn schema_name(&mut self, name: impl Into<String>) -> &mut Self {
        self.desc.schema_name = Some(name.into());
        self
    }

    /// Declares a field with its annotation string.
    pub fn field(
        &mut self,
        name: impl Into<String>,
        tag: impl Into<String>,
        ty: TypeDesc,
    ) -> &mut Self {
        self.desc.fields.push(FieldDesc {
            name: name.into(),
            tag: tag.into(),
            ty,
        });
        self
    }

    /// Declares a bound method.
    pub fn method(
        &mut self,
        name: impl Into<String>,
        build: impl FnOnce(&mut MethodBuilder),
    ) -> &mut Self {
        self.push_method(name.into(), false, build)
    }

    /// Attaches an unbound callable (no receiver) as a field.
    pub fn function(
        &mut self,
        name: impl Into<String>,
        build: impl FnOnce(&mut MethodBuilder),
    ) -> &mut Self {
        self.push_method(name.into(), true, build)
    }

    fn push_method(
        &mut self,
        name: String,
        unbound: bool,
        build: impl FnOnce(&mut MethodBuilder),
    ) -> &mut Self {
        let mut builder = MethodBuilder {
            desc: MethodDesc {
                name,
                intent: MethodIntent::default(),
                params: Vec::new(),
                returns: Vec::new(),
                unbound,
                invoke: Arc::new(|_| Vec::new()),
            },
        };
        build(&mut builder);
        self.desc.methods.push(builder.desc);
        self
    }
}

/// Builder handed to the [`ObjectBuilder::method`] closure.
#[derive(Debug)]
pub struct MethodBuilder {
    desc: MethodDesc,
}

impl MethodBuilder {
    /// Sets the participation marker.
    pub fn intent(&mut self, intent: MethodIntent) -> &mut Self {
        self.desc.intent = intent;
        self
    }

    /// Marks the method as a declared resolver.
    pub fn resolver(&mut self) -> &mut Self {
        self.intent(MethodIntent::Resolver)
    }

    /// Marks the method as never exposed.
    pub fn skip(&mut self) -> &mut Self {
        self.intent(MethodIntent::Skip)
    }

    /// Appends a parameter type.
    pub fn param(&mut self, ty: TypeDesc) -> &mut Self {
        self.desc.params.push(ty);
        self
    }

    /// Appends a return type.
    pub fn returns(&mut self, ty: TypeDesc) -> &mut Self {
        self.desc.returns.push(ty);
        self
    }

    /// Installs the invoke closure.
    pub fn invoke(
        &mut self,
        f: impl Fn(&[SlotValue]) -> Vec<RetValue> + Send + Sync + 'static,
    ) -> &mut Self {
        self.desc.invoke = Arc::new(f);
        self
    }
}
