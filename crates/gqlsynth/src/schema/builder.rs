//! Schema synthesis orchestrator.
//!
//! [`SchemaSynthesizer`] walks the descriptor registry in a single
//! synchronous pass and assembles a dynamic schema. Objects are expanded
//! depth-first; a key re-entered while still on the expansion stack is
//! reserved as a placeholder and its fields are filled in by the in-flight
//! expansion, so cyclic type graphs expand exactly once. All dynamic types
//! are registered with the engine only in the finalization step, which means
//! every occurrence of a cyclic type shares one registered object.
//!
//! Build-time failures carry the enclosing type/field/method name and abort
//! the build; no partial schema escapes.

use std::collections::HashMap;
use std::sync::Arc;

use async_graphql::Value;
use async_graphql::dynamic::{
    Field, FieldFuture, FieldValue, InputObject, InputValue, Object, Schema, Subscription,
    SubscriptionField, SubscriptionFieldFuture, TypeRef,
};
use async_stream::stream;
use indexmap::IndexMap;
use sha2::{Digest, Sha256};
use tracing::{debug, trace};

use crate::annotation::FieldAnnotation;
use crate::classify::{Classification, FnSig, SlotInfo, classify};
use crate::config::SynthConfig;
use crate::context::{QueryInfo, RequestContext};
use crate::descriptor::{MethodDesc, MethodIntent, ObjectDesc, TypeDesc, TypeSet};
use crate::error::SynthError;
use crate::resolver::{self, BoundResolver};

use super::scalars::{ScalarOverride, ScalarOverrides};

/// One-shot schema synthesizer.
///
/// Configure roots and overrides, then call [`build`](Self::build), which
/// consumes the synthesizer. The produced resolvers are `Send + Sync` and
/// safe for concurrent per-field invocation.
pub struct SchemaSynthesizer {
    types: Arc<TypeSet>,
    config: SynthConfig,
    scalars: ScalarOverrides,
    query_key: Option<String>,
    mutation_key: Option<String>,
    subscription_key: Option<String>,
}

impl SchemaSynthesizer {
    /// Creates a synthesizer over a descriptor registry.
    #[must_use]
    pub fn new(types: TypeSet) -> Self {
        Self {
            types: Arc::new(types),
            config: SynthConfig::default(),
            scalars: ScalarOverrides::seeded(),
            query_key: None,
            mutation_key: None,
            subscription_key: None,
        }
    }

    /// Replaces the default configuration.
    #[must_use]
    pub fn with_config(mut self, config: SynthConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the query root object.
    #[must_use]
    pub fn query(mut self, key: impl Into<String>) -> Self {
        self.query_key = Some(key.into());
        self
    }

    /// Sets the mutation root object.
    #[must_use]
    pub fn mutation(mut self, key: impl Into<String>) -> Self {
        self.mutation_key = Some(key.into());
        self
    }

    /// Sets the subscription root object.
    #[must_use]
    pub fn subscription(mut self, key: impl Into<String>) -> Self {
        self.subscription_key = Some(key.into());
        self
    }

    /// Registers a custom scalar override for an object key.
    #[must_use]
    pub fn register_scalar(mut self, key: impl Into<String>, scalar: ScalarOverride) -> Self {
        self.scalars.insert(key, scalar);
        self
    }

    /// Synthesizes the schema.
    ///
    /// # Errors
    ///
    /// Any [`SynthError`]; the error names the type, field, or method it was
    /// detected in.
    pub fn build(self) -> Result<Schema, SynthError> {
        self.config
            .validate()
            .map_err(SynthError::SchemaBuildFailed)?;
        let query_key = self
            .query_key
            .clone()
            .ok_or_else(|| SynthError::SchemaBuildFailed("a query root must be set".into()))?;

        let mut expansion = Expansion {
            types: self.types.clone(),
            scalars: self.scalars,
            shared_input_types: self.config.shared_input_types,
            registry: IndexMap::new(),
            processing: Vec::new(),
            fields_cache: IndexMap::new(),
            input_names: IndexMap::new(),
            input_defs: IndexMap::new(),
            hash_registry: HashMap::new(),
            hash_cache: HashMap::new(),
            claimed: HashMap::new(),
        };

        let query_name = expansion.expand_object(&query_key)?;
        let mutation_name = match &self.mutation_key {
            Some(key) => Some(expansion.expand_object(key)?),
            None => None,
        };
        let subscription = match &self.subscription_key {
            Some(key) => Some(expansion.build_subscription(key)?),
            None => None,
        };

        debug!(
            objects = expansion.registry.len(),
            inputs = expansion.input_defs.len(),
            "finalizing schema"
        );

        let mut builder = Schema::build(
            &query_name,
            mutation_name.as_deref(),
            subscription.as_ref().map(|(name, _)| name.as_str()),
        );

        for (_, scalar) in expansion.scalars.iter() {
            builder = builder.register(scalar.to_scalar());
        }

        let mut fields_cache = std::mem::take(&mut expansion.fields_cache);
        for (key, entry) in &expansion.registry {
            let fields = fields_cache.swap_remove(key).ok_or_else(|| {
                SynthError::SchemaBuildFailed(format!("type {key} was never materialized"))
            })?;
            let mut object = Object::new(&entry.schema_name);
            if fields.is_empty() {
                object = object.field(placeholder_field());
            }
            for field in fields {
                object = object.field(field);
            }
            builder = builder.register(object);
        }

        for (name, values) in expansion.input_defs {
            let mut input = InputObject::new(name);
            for value in values {
                input = input.field(value);
            }
            builder = builder.register(input);
        }

        if let Some((_, subscription)) = subscription {
            builder = builder.register(subscription);
        }

        let mut builder = builder
            .limit_depth(self.config.max_depth)
            .limit_complexity(self.config.max_complexity);
        if !self.config.introspection {
            builder = builder.disable_introspection();
        }

        builder
            .finish()
            .map_err(|err| SynthError::SchemaBuildFailed(err.to_string()))
    }
}

struct RegEntry {
    schema_name: String,
}

/// Mutable expansion state for one build pass.
struct Expansion {
    types: Arc<TypeSet>,
    scalars: ScalarOverrides,
    shared_input_types: bool,
    /// Output object key → schema name. Monotonic.
    registry: IndexMap<String, RegEntry>,
    /// Keys currently expanding, stack discipline.
    processing: Vec<String>,
    /// Output object key → completed field list.
    fields_cache: IndexMap<String, Vec<Field>>,
    /// Input object key → schema name.
    input_names: IndexMap<String, String>,
    /// Input schema name → field list, canonical representatives only.
    input_defs: IndexMap<String, Vec<InputValue>>,
    /// Structural hash → first-seen input type name.
    hash_registry: HashMap<String, String>,
    hash_cache: HashMap<String, String>,
    /// Schema type name → native identity that claimed it.
    claimed: HashMap<String, String>,
}

impl Expansion {
    fn claim(&mut self, name: &str, identity: &str) -> Result<(), SynthError> {
        match self.claimed.get(name) {
            Some(first) if first != identity => Err(SynthError::TypeNameCollision {
                name: name.to_string(),
                first: first.clone(),
                second: identity.to_string(),
            }),
            Some(_) => Ok(()),
            None => {
                self.claimed.insert(name.to_string(), identity.to_string());
                Ok(())
            }
        }
    }

    fn lookup(&self, key: &str) -> Result<ObjectDesc, SynthError> {
        self.types
            .get(key)
            .cloned()
            .ok_or_else(|| SynthError::UnknownType(key.to_string()))
    }

    /// Expands an output object, returning its schema type name.
    fn expand_object(&mut self, key: &str) -> Result<String, SynthError> {
        if let Some(entry) = self.registry.get(key) {
            return Ok(entry.schema_name.clone());
        }
        let desc = self.lookup(key)?;
        let schema_name = desc.schema_name.clone().unwrap_or_else(|| key.to_string());
        self.claim(&schema_name, &format!("type {key}"))?;

        if self.processing.iter().any(|k| k == key) {
            // Re-entered mid-expansion: reserve the name now, the in-flight
            // expansion fills in the fields when the stack unwinds.
            trace!(key, "cyclic reference, reserving type name");
            self.registry.insert(
                key.to_string(),
                RegEntry {
                    schema_name: schema_name.clone(),
                },
            );
            return Ok(schema_name);
        }

        debug!(key, schema_name, "expanding object type");
        self.processing.push(key.to_string());
        let fields = self.expand_fields(key, &schema_name, &desc);
        self.processing.pop();
        let fields = fields.map_err(|err| err.within(format!("type {key}")))?;

        self.fields_cache.insert(key.to_string(), fields);
        self.registry.insert(
            key.to_string(),
            RegEntry {
                schema_name: schema_name.clone(),
            },
        );
        Ok(schema_name)
    }

    fn expand_fields(
        &mut self,
        key: &str,
        schema_name: &str,
        desc: &ObjectDesc,
    ) -> Result<Vec<Field>, SynthError> {
        let mut fields: IndexMap<String, Field> = IndexMap::new();

        for field in &desc.fields {
            let annotation = FieldAnnotation::parse(&field.tag)
                .map_err(|err| err.within(format!("field {}", field.name)))?;
            if !annotation.is_exposed() {
                continue;
            }
            let mut type_ref = self
                .output_type_ref(&field.ty)
                .map_err(|err| err.within(format!("field {}", field.name)))?;
            if annotation.non_null {
                type_ref = TypeRef::NonNull(Box::new(type_ref));
            }

            let exposed = annotation.exposed_name.clone();
            let native = field.name.clone();
            let exposed_for_resolver = exposed.clone();
            let dynamic_field = Field::new(exposed.clone(), type_ref, move |ctx| {
                let native = native.clone();
                let exposed = exposed_for_resolver.clone();
                FieldFuture::new(async move {
                    let parent = ctx
                        .parent_value
                        .as_value()
                        .cloned()
                        .unwrap_or(Value::Null);
                    // Absent fields resolve to null, not to a phantom value.
                    match resolver::field_of(&parent, &native, &exposed) {
                        Value::Null => Ok(None),
                        value => Ok(Some(FieldValue::value(value))),
                    }
                })
            });
            fields.insert(exposed, dynamic_field);
        }

        for method in &desc.methods {
            if method.intent == MethodIntent::Skip {
                continue;
            }
            // Under Auto intent, a bound method is a resolver candidate only
            // when it declares an error return; the declared intent and
            // unbound callables always take the resolver path.
            let strict = method.intent == MethodIntent::Resolver || method.unbound;
            if strict || has_error_return(method) {
                let classification = match self.classify_method(key, method) {
                    Ok(classification) => classification,
                    Err(err) if strict => {
                        return Err(err.within(format!("method {}", method.name)));
                    }
                    Err(err) => {
                        trace!(method = method.name, reason = %err, "skipping method");
                        continue;
                    }
                };
                let (exposed, field) = self
                    .resolver_field(schema_name, method, classification)
                    .map_err(|err| err.within(format!("method {}", method.name)))?;
                // Resolver methods replace annotated fields of the same name.
                fields.insert(exposed, field);
            } else {
                // Plain getter path: zero parameters, one representable
                // return, bound as a computed field.
                match self.getter_classification(key, method) {
                    Some(classification) => {
                        let (exposed, field) = self
                            .resolver_field(schema_name, method, classification)
                            .map_err(|err| err.within(format!("method {}", method.name)))?;
                        // Getters never displace an annotated field.
                        fields.entry(exposed).or_insert(field);
                    }
                    None => {
                        trace!(method = method.name, "method fits neither resolver nor getter");
                    }
                }
            }
        }

        Ok(fields.into_values().collect())
    }

    fn classify_method(
        &self,
        key: &str,
        method: &MethodDesc,
    ) -> Result<Classification, SynthError> {
        let sig = FnSig {
            receiver: (!method.unbound)
                .then(|| TypeDesc::optional(TypeDesc::object(key))),
            params: method.params.clone(),
            returns: method.returns.clone(),
        };
        classify(&sig, &self.types, |k| self.scalars.covers(k))
    }

    /// The plain getter shape: no parameters, one return that is neither a
    /// marker nor an unrepresentable kind.
    fn getter_classification(&self, key: &str, method: &MethodDesc) -> Option<Classification> {
        if method.unbound || !method.params.is_empty() || method.returns.len() != 1 {
            return None;
        }
        let ret = &method.returns[0];
        match ret.dereferenced() {
            TypeDesc::Error | TypeDesc::Any | TypeDesc::Context | TypeDesc::Info => return None,
            TypeDesc::Object(k) => {
                if !self.scalars.covers(k) {
                    let desc = self.types.get(k)?;
                    if !desc.has_annotated_field() {
                        return None;
                    }
                }
            }
            _ => {}
        }
        Some(Classification {
            receiver_key: Some(key.to_string()),
            context: None,
            info: None,
            input: None,
            output: Some(SlotInfo::new(ret, 0)),
            error_index: None,
            param_count: 0,
            return_count: 1,
        })
    }

    fn resolver_field(
        &mut self,
        schema_name: &str,
        method: &MethodDesc,
        classification: Classification,
    ) -> Result<(String, Field), SynthError> {
        let exposed = lower_camel(&method.name);
        let output = classification
            .output
            .as_ref()
            .ok_or(SynthError::MissingOutput)?;
        let type_ref = self.output_type_ref(&output.declared)?;
        let args = self.input_arguments(&classification)?;

        let resolver = BoundResolver::new(
            classification,
            method.invoke.clone(),
            self.types.clone(),
            QueryInfo {
                parent_type: schema_name.to_string(),
                field_name: exposed.clone(),
            },
        );
        let mut field = Field::new(exposed.clone(), type_ref, move |ctx| {
            let resolver = resolver.clone();
            FieldFuture::new(async move {
                let parent = ctx
                    .parent_value
                    .as_value()
                    .cloned()
                    .unwrap_or(Value::Null);
                let args = ctx.args.as_index_map().clone();
                let request = ctx
                    .data_opt::<RequestContext>()
                    .cloned()
                    .unwrap_or_default();
                let value = resolver
                    .call(parent, &args, request)
                    .map_err(async_graphql::Error::from)?;
                match value {
                    Value::Null => Ok(None),
                    value => Ok(Some(FieldValue::value(value))),
                }
            })
        });
        for arg in args {
            field = field.argument(arg);
        }
        Ok((exposed, field))
    }

    /// Flattens the input object's annotated fields into field arguments.
    fn input_arguments(
        &mut self,
        classification: &Classification,
    ) -> Result<Vec<InputValue>, SynthError> {
        let Some(input) = &classification.input else {
            return Ok(Vec::new());
        };
        let TypeDesc::Object(input_key) = input.dereferenced() else {
            return Err(SynthError::InvalidInputShape(input.declared.to_string()));
        };
        let input_key = input_key.clone();
        let desc = self.lookup(&input_key)?;

        let mut args = Vec::new();
        for field in &desc.fields {
            let annotation = FieldAnnotation::parse(&field.tag)
                .map_err(|err| err.within(format!("field {} of {input_key}", field.name)))?;
            if !annotation.is_exposed() {
                continue;
            }
            let mut type_ref = self
                .input_type_ref(&field.ty)
                .map_err(|err| err.within(format!("field {} of {input_key}", field.name)))?;
            if annotation.non_null {
                type_ref = TypeRef::NonNull(Box::new(type_ref));
            }
            args.push(InputValue::new(annotation.exposed_name.clone(), type_ref));
        }
        Ok(args)
    }

    /// Maps a type into its output-position type reference.
    fn output_type_ref(&mut self, ty: &TypeDesc) -> Result<TypeRef, SynthError> {
        if let Some(name) = self.scalar_name(ty) {
            return Ok(TypeRef::named(name));
        }
        match ty {
            TypeDesc::Int | TypeDesc::Uint => Ok(TypeRef::named(TypeRef::INT)),
            TypeDesc::Float => Ok(TypeRef::named(TypeRef::FLOAT)),
            TypeDesc::Bool => Ok(TypeRef::named(TypeRef::BOOLEAN)),
            TypeDesc::String => Ok(TypeRef::named(TypeRef::STRING)),
            TypeDesc::List(elem) | TypeDesc::Array(elem) => {
                Ok(TypeRef::List(Box::new(self.output_type_ref(elem)?)))
            }
            TypeDesc::Optional(inner) => self.output_type_ref(inner),
            TypeDesc::Object(key) => {
                let name = self.expand_object(key)?;
                Ok(TypeRef::named(name))
            }
            TypeDesc::Map(..) => Err(SynthError::UnsupportedMapType(ty.to_string())),
            other => Err(SynthError::UnsupportedType(other.to_string())),
        }
    }

    /// Maps a type into its input-position type reference.
    fn input_type_ref(&mut self, ty: &TypeDesc) -> Result<TypeRef, SynthError> {
        if let Some(name) = self.scalar_name(ty) {
            return Ok(TypeRef::named(name));
        }
        match ty {
            TypeDesc::Int | TypeDesc::Uint => Ok(TypeRef::named(TypeRef::INT)),
            TypeDesc::Float => Ok(TypeRef::named(TypeRef::FLOAT)),
            TypeDesc::Bool => Ok(TypeRef::named(TypeRef::BOOLEAN)),
            TypeDesc::String => Ok(TypeRef::named(TypeRef::STRING)),
            TypeDesc::List(elem) | TypeDesc::Array(elem) => {
                Ok(TypeRef::List(Box::new(self.input_type_ref(elem)?)))
            }
            TypeDesc::Optional(inner) => self.input_type_ref(inner),
            TypeDesc::Object(key) => {
                let name = self.input_object_ref(key)?;
                Ok(TypeRef::named(name))
            }
            TypeDesc::Map(..) => Err(SynthError::UnsupportedMapType(ty.to_string())),
            other => Err(SynthError::UnsupportedType(other.to_string())),
        }
    }

    /// Scalar overrides short-circuit kind dispatch for bare and
    /// `Optional`-wrapped object references.
    fn scalar_name(&self, ty: &TypeDesc) -> Option<String> {
        let key = match ty {
            TypeDesc::Object(key) => key,
            TypeDesc::Optional(inner) => match inner.as_ref() {
                TypeDesc::Object(key) => key,
                _ => return None,
            },
            _ => return None,
        };
        self.scalars.get(key).map(|s| s.schema_name.clone())
    }

    /// Expands an input object, returning its schema type name.
    ///
    /// Structurally identical input types collapse onto the first registered
    /// name when `shared_input_types` is on.
    fn input_object_ref(&mut self, key: &str) -> Result<String, SynthError> {
        if let Some(name) = self.input_names.get(key) {
            return Ok(name.clone());
        }
        let desc = self.lookup(key)?;

        let hash = self.struct_hash(key, &desc)?;
        if self.shared_input_types
            && let Some(name) = self.hash_registry.get(&hash)
        {
            let name = name.clone();
            debug!(key, name, "reusing structurally identical input type");
            self.input_names.insert(key.to_string(), name.clone());
            return Ok(name);
        }

        let name = desc.schema_name.clone().unwrap_or_else(|| key.to_string());
        self.claim(&name, &format!("input {key}"))?;
        // Reserve the name before recursing so self-referential input
        // types terminate.
        self.input_names.insert(key.to_string(), name.clone());
        self.hash_registry.entry(hash).or_insert_with(|| name.clone());

        debug!(key, name, "expanding input type");
        let mut values = Vec::new();
        for field in &desc.fields {
            let annotation = FieldAnnotation::parse(&field.tag)
                .map_err(|err| err.within(format!("field {} of input {key}", field.name)))?;
            if !annotation.is_exposed() {
                continue;
            }
            let mut type_ref = self
                .input_type_ref(&field.ty)
                .map_err(|err| err.within(format!("field {} of input {key}", field.name)))?;
            if annotation.non_null {
                type_ref = TypeRef::NonNull(Box::new(type_ref));
            }
            values.push(InputValue::new(annotation.exposed_name.clone(), type_ref));
        }
        self.input_defs.insert(name.clone(), values);
        Ok(name)
    }

    /// SHA-256 over the ordered `(exposed name, type signature)` pairs of
    /// the annotated fields. Native names and the registry key do not
    /// participate, so renamed-but-identical structs hash equal.
    fn struct_hash(&mut self, key: &str, desc: &ObjectDesc) -> Result<String, SynthError> {
        if let Some(hash) = self.hash_cache.get(key) {
            return Ok(hash.clone());
        }
        let mut hasher = Sha256::new();
        hasher.update(b"struct:");
        for field in &desc.fields {
            let annotation = FieldAnnotation::parse(&field.tag)
                .map_err(|err| err.within(format!("field {} of input {key}", field.name)))?;
            if !annotation.is_exposed() {
                continue;
            }
            hasher.update(annotation.exposed_name.as_bytes());
            hasher.update(b":");
            hasher.update(field.ty.to_string().as_bytes());
            if annotation.non_null {
                hasher.update(b"!");
            }
            hasher.update(b";");
        }
        let hash = format!("{:x}", hasher.finalize());
        self.hash_cache.insert(key.to_string(), hash.clone());
        Ok(hash)
    }

    /// Expands the subscription root: every resolver method becomes a
    /// subscription field whose stream yields the single resolved value.
    fn build_subscription(&mut self, key: &str) -> Result<(String, Subscription), SynthError> {
        let desc = self.lookup(key)?;
        let schema_name = desc.schema_name.clone().unwrap_or_else(|| key.to_string());
        self.claim(&schema_name, &format!("type {key}"))?;

        let mut subscription = Subscription::new(schema_name.clone());
        for method in &desc.methods {
            if method.intent == MethodIntent::Skip {
                continue;
            }
            let strict = method.intent == MethodIntent::Resolver || method.unbound;
            if !strict && !has_error_return(method) {
                trace!(method = method.name, "skipping method without error return");
                continue;
            }
            let classification = match self.classify_method(key, method) {
                Ok(classification) => classification,
                Err(err) if strict => {
                    return Err(err
                        .within(format!("method {}", method.name))
                        .within(format!("type {key}")));
                }
                Err(err) => {
                    trace!(method = method.name, reason = %err, "skipping method");
                    continue;
                }
            };

            let exposed = lower_camel(&method.name);
            let output = classification
                .output
                .as_ref()
                .ok_or(SynthError::MissingOutput)?;
            let type_ref = self
                .output_type_ref(&output.declared)
                .map_err(|err| err.within(format!("method {}", method.name)))?;
            let args = self
                .input_arguments(&classification)
                .map_err(|err| err.within(format!("method {}", method.name)))?;

            let resolver = BoundResolver::new(
                classification,
                method.invoke.clone(),
                self.types.clone(),
                QueryInfo {
                    parent_type: schema_name.clone(),
                    field_name: exposed.clone(),
                },
            );
            let mut field = SubscriptionField::new(exposed.clone(), type_ref, move |ctx| {
                let resolver = resolver.clone();
                let args = ctx.args.as_index_map().clone();
                SubscriptionFieldFuture::new(async move {
                    let value = resolver
                        .call(Value::Null, &args, RequestContext::default())
                        .map_err(async_graphql::Error::from)?;
                    Ok(stream! {
                        yield Ok::<_, async_graphql::Error>(value);
                    })
                })
            });
            for arg in args {
                field = field.argument(arg);
            }
            subscription = subscription.field(field);
        }
        Ok((schema_name, subscription))
    }
}

fn has_error_return(method: &MethodDesc) -> bool {
    method
        .returns
        .iter()
        .any(|ret| ret.dereferenced() == &TypeDesc::Error)
}

/// Objects with no exposed fields are invalid in GraphQL; register a
/// hidden placeholder instead of failing the whole build.
fn placeholder_field() -> Field {
    Field::new("_placeholder", TypeRef::named(TypeRef::STRING), |_ctx| {
        FieldFuture::new(async move { Ok(None::<FieldValue>) })
    })
}

/// Lower-camel form of a method name: `get_widget` and `GetWidget` both
/// expose as `getWidget`.
fn lower_camel(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper_next = false;
    for ch in name.chars() {
        if ch == '_' {
            upper_next = true;
            continue;
        }
        if out.is_empty() {
            out.extend(ch.to_lowercase());
        } else if upper_next {
            out.extend(ch.to_uppercase());
            upper_next = false;
        } else {
            out.push(ch);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::RetValue;

    #[test]
    fn test_lower_camel() {
        assert_eq!(lower_camel("get_widget"), "getWidget");
        assert_eq!(lower_camel("GetWidget"), "getWidget");
        assert_eq!(lower_camel("widgets"), "widgets");
        assert_eq!(lower_camel("created_at"), "createdAt");
        assert_eq!(lower_camel("ID"), "iD");
    }

    fn widget_types() -> TypeSet {
        let mut types = TypeSet::new();
        types.object("Widget", |o| {
            o.field("ID", "id,nonNull", TypeDesc::String);
            o.field("Name", "name", TypeDesc::String);
            o.field("Parent", "parent", TypeDesc::optional(TypeDesc::object("Widget")));
        });
        types.object("Query", |o| {
            o.method("get_widget", |m| {
                m.resolver()
                    .returns(TypeDesc::optional(TypeDesc::object("Widget")))
                    .invoke(|_| vec![RetValue::Data(Value::Null)]);
            });
        });
        types
    }

    #[test]
    fn test_build_handles_self_referential_types() {
        let schema = SchemaSynthesizer::new(widget_types())
            .query("Query")
            .build()
            .unwrap();
        let sdl = schema.sdl();
        assert!(sdl.contains("type Widget"));
        assert!(sdl.contains("parent: Widget"));
        assert!(sdl.contains("getWidget: Widget"));
    }

    #[test]
    fn test_build_requires_query_root() {
        let err = SchemaSynthesizer::new(widget_types()).build().unwrap_err();
        assert_eq!(err.kind(), "SCHEMA_BUILD_FAILED");
    }

    #[test]
    fn test_build_rejects_unknown_root() {
        let err = SchemaSynthesizer::new(widget_types())
            .query("Ghost")
            .build()
            .unwrap_err();
        assert_eq!(err.kind(), "UNKNOWN_TYPE");
    }

    #[test]
    fn test_schema_name_override_and_collision() {
        let mut types = TypeSet::new();
        types.object("WidgetV1", |o| {
            o.schema_name("Widget");
            o.field("ID", "id", TypeDesc::String);
        });
        types.object("WidgetV2", |o| {
            o.schema_name("Widget");
            o.field("Name", "name", TypeDesc::String);
        });
        types.object("Query", |o| {
            o.field("A", "a", TypeDesc::object("WidgetV1"));
            o.field("B", "b", TypeDesc::object("WidgetV2"));
        });
        let err = SchemaSynthesizer::new(types)
            .query("Query")
            .build()
            .unwrap_err();
        assert_eq!(err.kind(), "TYPE_NAME_COLLISION");
    }

    #[test]
    fn test_declared_resolver_failure_aborts() {
        let mut types = TypeSet::new();
        types.object("Query", |o| {
            o.method("broken", |m| {
                m.resolver().returns(TypeDesc::Error);
            });
        });
        let err = SchemaSynthesizer::new(types)
            .query("Query")
            .build()
            .unwrap_err();
        assert_eq!(err.kind(), "MISSING_OUTPUT");
        assert!(err.to_string().contains("method broken"));
    }

    #[test]
    fn test_auto_intent_skips_non_resolver_methods() {
        let mut types = TypeSet::new();
        types.object("Query", |o| {
            o.field("Version", "version", TypeDesc::String);
            // No output at all: silently ignored under Auto intent.
            o.method("reset", |m| {
                m.returns(TypeDesc::Error);
            });
        });
        let schema = SchemaSynthesizer::new(types)
            .query("Query")
            .build()
            .unwrap();
        assert!(!schema.sdl().contains("reset"));
    }

    #[test]
    fn test_auto_getter_binds_computed_field() {
        let mut types = TypeSet::new();
        types.object("Widget", |o| {
            o.field("ID", "id", TypeDesc::String);
            o.method("display_name", |m| {
                m.returns(TypeDesc::String)
                    .invoke(|_| vec![RetValue::Data(Value::String("w".into()))]);
            });
        });
        types.object("Query", |o| {
            o.field("Widget", "widget", TypeDesc::optional(TypeDesc::object("Widget")));
        });
        let schema = SchemaSynthesizer::new(types)
            .query("Query")
            .build()
            .unwrap();
        assert!(schema.sdl().contains("displayName: String"));
    }

    #[test]
    fn test_getter_never_displaces_annotated_field() {
        let mut types = TypeSet::new();
        types.object("Query", |o| {
            o.field("Name", "name", TypeDesc::String);
            // Same exposed name as the tag field; the field wins.
            o.method("name", |m| {
                m.returns(TypeDesc::Int)
                    .invoke(|_| vec![RetValue::Data(Value::Number(1.into()))]);
            });
        });
        let schema = SchemaSynthesizer::new(types)
            .query("Query")
            .build()
            .unwrap();
        let sdl = schema.sdl();
        assert!(sdl.contains("name: String"));
        assert!(!sdl.contains("name: Int"));
    }

    #[test]
    fn test_auto_method_without_error_return_is_not_a_resolver() {
        let mut types = TypeSet::new();
        types.object("Filter", |o| {
            o.field("Name", "name", TypeDesc::String);
        });
        types.object("Query", |o| {
            o.field("Version", "version", TypeDesc::String);
            // Takes arguments but declares no error return; under Auto
            // intent that is neither a resolver nor a getter.
            o.method("find", |m| {
                m.param(TypeDesc::object("Filter"))
                    .returns(TypeDesc::String)
                    .invoke(|_| vec![RetValue::Data(Value::Null)]);
            });
        });
        let schema = SchemaSynthesizer::new(types)
            .query("Query")
            .build()
            .unwrap();
        assert!(!schema.sdl().contains("find"));
    }

    #[test]
    fn test_auto_method_with_error_return_is_a_resolver() {
        let mut types = TypeSet::new();
        types.object("Query", |o| {
            o.method("version", |m| {
                m.returns(TypeDesc::String)
                    .returns(TypeDesc::Error)
                    .invoke(|_| vec![RetValue::Data(Value::String("1".into())), RetValue::ok()]);
            });
        });
        let schema = SchemaSynthesizer::new(types)
            .query("Query")
            .build()
            .unwrap();
        assert!(schema.sdl().contains("version: String"));
    }

    #[test]
    fn test_unbound_function_without_output_aborts() {
        let mut types = TypeSet::new();
        types.object("Query", |o| {
            o.field("Version", "version", TypeDesc::String);
            o.function("purge", |m| {
                m.returns(TypeDesc::Error);
            });
        });
        let err = SchemaSynthesizer::new(types)
            .query("Query")
            .build()
            .unwrap_err();
        assert_eq!(err.kind(), "MISSING_OUTPUT");
        assert!(err.to_string().contains("method purge"));
    }

    #[test]
    fn test_unbound_function_exposed_as_field() {
        let mut types = TypeSet::new();
        types.object("Query", |o| {
            o.function("server_time", |m| {
                m.returns(TypeDesc::String)
                    .invoke(|slots| {
                        // No receiver slot for free functions.
                        assert!(slots.is_empty());
                        vec![RetValue::Data(Value::String("now".into()))]
                    });
            });
        });
        let schema = SchemaSynthesizer::new(types)
            .query("Query")
            .build()
            .unwrap();
        assert!(schema.sdl().contains("serverTime: String"));
    }

    #[test]
    fn test_excluded_map_field_is_allowed() {
        let mut types = TypeSet::new();
        types.object("Query", |o| {
            o.field("Version", "version", TypeDesc::String);
            o.field(
                "Extras",
                "-",
                TypeDesc::map(TypeDesc::String, TypeDesc::String),
            );
        });
        assert!(SchemaSynthesizer::new(types).query("Query").build().is_ok());
    }

    #[test]
    fn test_exposed_map_field_fails() {
        let mut types = TypeSet::new();
        types.object("Query", |o| {
            o.field(
                "Extras",
                "extras",
                TypeDesc::map(TypeDesc::String, TypeDesc::String),
            );
        });
        let err = SchemaSynthesizer::new(types)
            .query("Query")
            .build()
            .unwrap_err();
        assert_eq!(err.kind(), "UNSUPPORTED_MAP_TYPE");
    }

    #[test]
    fn test_input_type_dedup_first_name_wins() {
        fn filter_types() -> TypeSet {
            let mut types = TypeSet::new();
            types.object("ByName", |o| {
                o.field("Name", "name", TypeDesc::String);
            });
            types.object("AlsoByName", |o| {
                o.field("Title", "name", TypeDesc::String);
            });
            types.object("Query", |o| {
                o.method("first", |m| {
                    m.resolver()
                        .param(TypeDesc::object("ByName"))
                        .returns(TypeDesc::String)
                        .invoke(|_| vec![RetValue::Data(Value::Null)]);
                });
                o.method("second", |m| {
                    m.resolver()
                        .param(TypeDesc::object("AlsoByName"))
                        .returns(TypeDesc::String)
                        .invoke(|_| vec![RetValue::Data(Value::Null)]);
                });
            });
            types
        }

        // Flattened args share shapes, so nested inputs are needed to observe
        // the dedup; exercise it through the expansion state directly.
        let mut expansion = Expansion {
            types: Arc::new(filter_types()),
            scalars: ScalarOverrides::seeded(),
            shared_input_types: true,
            registry: IndexMap::new(),
            processing: Vec::new(),
            fields_cache: IndexMap::new(),
            input_names: IndexMap::new(),
            input_defs: IndexMap::new(),
            hash_registry: HashMap::new(),
            hash_cache: HashMap::new(),
            claimed: HashMap::new(),
        };
        let first = expansion.input_object_ref("ByName").unwrap();
        let second = expansion.input_object_ref("AlsoByName").unwrap();
        assert_eq!(first, "ByName");
        assert_eq!(second, "ByName");
        assert_eq!(expansion.input_defs.len(), 1);

        // With sharing off, each struct gets its own type.
        expansion.shared_input_types = false;
        expansion.input_names.clear();
        expansion.input_defs.clear();
        expansion.hash_registry.clear();
        expansion.claimed.clear();
        let first = expansion.input_object_ref("ByName").unwrap();
        let second = expansion.input_object_ref("AlsoByName").unwrap();
        assert_ne!(first, second);
        assert_eq!(expansion.input_defs.len(), 2);
    }

    #[test]
    fn test_introspection_toggle() {
        let mut config = SynthConfig::default();
        config.introspection = false;
        let schema = SchemaSynthesizer::new(widget_types())
            .with_config(config)
            .query("Query")
            .build()
            .unwrap();
        // Introspection is disabled at execution time; the schema itself
        // still renders.
        assert!(schema.sdl().contains("type Query"));
    }
}
