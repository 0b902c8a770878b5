//! Request-time invocation of classified callables.
//!
//! A [`BoundResolver`] pairs one callable's classification with its invoke
//! closure. At request time it coerces the raw argument map into the input
//! slot's declared shape, reorders all slot values back into the positions
//! the callable declared them in, invokes, and splits the positional return
//! list into `(output, error)`. A present error always wins over the output.

use std::sync::Arc;

use async_graphql::{Name, Value};
use indexmap::IndexMap;
use tracing::trace;

use crate::annotation::FieldAnnotation;
use crate::classify::Classification;
use crate::context::{QueryInfo, RequestContext};
use crate::descriptor::{InvokeFn, RetValue, SlotValue, TypeDesc, TypeSet};
use crate::error::ResolveError;

/// One synthesized resolver, ready to be attached to a schema field.
///
/// Cloning is cheap; all state is shared and read-only, so one resolver may
/// serve concurrent per-field invocations.
#[derive(Clone)]
pub struct BoundResolver {
    classification: Arc<Classification>,
    invoke: InvokeFn,
    types: Arc<TypeSet>,
    info: QueryInfo,
}

impl BoundResolver {
    pub(crate) fn new(
        classification: Classification,
        invoke: InvokeFn,
        types: Arc<TypeSet>,
        info: QueryInfo,
    ) -> Self {
        Self {
            classification: Arc::new(classification),
            invoke,
            types,
            info,
        }
    }

    /// Invokes the callable for one field resolution.
    ///
    /// `parent` is the source value (`Null` on root objects); `raw_args` is
    /// the engine's argument map keyed by exposed name.
    ///
    /// # Errors
    ///
    /// [`ResolveError::Coercion`] when an argument does not fit its declared
    /// shape; [`ResolveError::Callable`] when the callable's error slot is
    /// populated.
    pub fn call(
        &self,
        parent: Value,
        raw_args: &IndexMap<Name, Value>,
        request: RequestContext,
    ) -> Result<Value, ResolveError> {
        let c = &self.classification;
        let bound = c.receiver_key.is_some();
        let offset = usize::from(bound);

        let mut slots = vec![SlotValue::Data(Value::Null); offset + c.param_count];
        if bound {
            slots[0] = SlotValue::Data(parent);
        }
        if let Some(slot) = &c.context {
            slots[offset + slot.index] = SlotValue::Context(request);
        }
        if let Some(slot) = &c.info {
            slots[offset + slot.index] = SlotValue::Info(self.info.clone());
        }
        if let Some(slot) = &c.input {
            let mut object = IndexMap::new();
            for (name, value) in raw_args {
                object.insert(name.clone(), value.clone());
            }
            let coerced = coerce(&Value::Object(object), &slot.declared, &self.types)?;
            slots[offset + slot.index] = SlotValue::Data(coerced);
        }

        trace!(
            parent_type = %self.info.parent_type,
            field = %self.info.field_name,
            slots = slots.len(),
            "invoking resolver"
        );

        let returns = (self.invoke)(&slots);
        let mut output = Value::Null;
        for ret in returns {
            match ret {
                RetValue::Error(Some(message)) => {
                    return Err(ResolveError::Callable(message));
                }
                RetValue::Error(None) => {}
                RetValue::Data(value) => output = value,
            }
        }
        Ok(output)
    }
}

/// Reads a field from a resolved parent object, native name first with the
/// exposed name as fallback. Non-object parents resolve to `Null`.
pub(crate) fn field_of(parent: &Value, native: &str, exposed: &str) -> Value {
    let Value::Object(object) = parent else {
        return Value::Null;
    };
    object
        .get(native)
        .or_else(|| object.get(exposed))
        .cloned()
        .unwrap_or(Value::Null)
}

/// Coerces a raw engine value into the declared native shape.
///
/// Nullability is enforced by the engine's validation phase, so `Null`
/// passes through untouched. Input objects are re-keyed from exposed field
/// names to native field names.
pub(crate) fn coerce(
    value: &Value,
    declared: &TypeDesc,
    types: &TypeSet,
) -> Result<Value, ResolveError> {
    if matches!(value, Value::Null) {
        return Ok(Value::Null);
    }

    match declared {
        TypeDesc::Optional(inner) => coerce(value, inner, types),
        TypeDesc::List(elem) | TypeDesc::Array(elem) => match value {
            Value::List(items) => {
                let mut out = Vec::with_capacity(items.len());
                for item in items {
                    out.push(coerce(item, elem, types)?);
                }
                Ok(Value::List(out))
            }
            // One bare value coerces to a single-element list.
            other => Ok(Value::List(vec![coerce(other, elem, types)?])),
        },
        TypeDesc::Int | TypeDesc::Uint => match value {
            Value::Number(n) if n.is_i64() || n.is_u64() => Ok(value.clone()),
            other => Err(mismatch(declared, other)),
        },
        TypeDesc::Float => match value {
            Value::Number(_) => Ok(value.clone()),
            other => Err(mismatch(declared, other)),
        },
        TypeDesc::Bool => match value {
            Value::Boolean(_) => Ok(value.clone()),
            other => Err(mismatch(declared, other)),
        },
        TypeDesc::String => match value {
            Value::String(_) => Ok(value.clone()),
            Value::Enum(name) => Ok(Value::String(name.to_string())),
            other => Err(mismatch(declared, other)),
        },
        TypeDesc::Object(key) => {
            let Value::Object(given) = value else {
                return Err(mismatch(declared, value));
            };
            let Some(desc) = types.get(key) else {
                return Err(ResolveError::Coercion {
                    expected: key.clone(),
                    got: describe(value),
                });
            };
            let mut out = IndexMap::new();
            for field in &desc.fields {
                let Ok(annotation) = FieldAnnotation::parse(&field.tag) else {
                    continue;
                };
                if !annotation.is_exposed() {
                    continue;
                }
                if let Some(raw) = given.get(annotation.exposed_name.as_str()) {
                    let coerced = coerce(raw, &field.ty, types)?;
                    out.insert(Name::new(&field.name), coerced);
                }
            }
            Ok(Value::Object(out))
        }
        other => Err(ResolveError::Coercion {
            expected: other.to_string(),
            got: describe(value),
        }),
    }
}

fn mismatch(expected: &TypeDesc, got: &Value) -> ResolveError {
    ResolveError::Coercion {
        expected: expected.to_string(),
        got: describe(got),
    }
}

fn describe(value: &Value) -> String {
    match value {
        Value::Null => "null",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Boolean(_) => "boolean",
        Value::Binary(_) => "binary",
        Value::Enum(_) => "enum",
        Value::List(_) => "list",
        Value::Object(_) => "object",
    }
    .to_string()
}
