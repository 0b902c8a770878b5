//! Callable signature classification.
//!
//! Each candidate resolver signature is sorted into slots: an optional
//! receiver, at most one context parameter, at most one query-info
//! parameter, at most one data input, at most one data output, and at most
//! one error return. Marker parameters are recognized by dereferenced
//! identity, so `optional<context>` and `list<context>` both count as the
//! context slot. Parameter order never changes the outcome — the slot
//! records remember each declared position so invocation can reorder values
//! back into the callable's own layout.

use tracing::trace;

use crate::descriptor::{TypeDesc, TypeSet};
use crate::error::SynthError;

/// Parameter budget for a callable without a receiver.
pub const MAX_PARAMS_UNBOUND: usize = 3;
/// Parameter budget for a bound callable, counting the receiver slot.
pub const MAX_PARAMS_BOUND: usize = 4;
/// Return-value budget.
pub const MAX_RETURNS: usize = 2;

/// A callable signature as declared in a descriptor.
#[derive(Debug, Clone)]
pub struct FnSig {
    /// Receiver type for bound methods; `None` for free functions.
    pub receiver: Option<TypeDesc>,
    /// Parameter types in declaration order, excluding the receiver.
    pub params: Vec<TypeDesc>,
    /// Return types in declaration order.
    pub returns: Vec<TypeDesc>,
}

/// One classified parameter or return slot.
#[derive(Debug, Clone)]
pub struct SlotInfo {
    /// The type as declared.
    pub declared: TypeDesc,
    /// Position within the declared parameter (or return) list.
    pub index: usize,
    /// Whether the declaration wraps the type in `Optional`.
    pub is_optional: bool,
    /// Whether the declaration is a list or array.
    pub is_collection: bool,
}

impl SlotInfo {
    pub(crate) fn new(declared: &TypeDesc, index: usize) -> Self {
        Self {
            is_optional: matches!(declared, TypeDesc::Optional(_)),
            is_collection: matches!(declared, TypeDesc::List(_) | TypeDesc::Array(_)),
            declared: declared.clone(),
            index,
        }
    }

    /// The declared type with one wrapping level stripped.
    #[must_use]
    pub fn dereferenced(&self) -> &TypeDesc {
        self.declared.dereferenced()
    }
}

/// The outcome of classifying one callable.
#[derive(Debug, Clone)]
pub struct Classification {
    /// Registry key of the receiver's object type, for bound methods.
    pub receiver_key: Option<String>,
    /// Context-marker parameter, if declared.
    pub context: Option<SlotInfo>,
    /// Query-info parameter, if declared.
    pub info: Option<SlotInfo>,
    /// The single data input, if declared.
    pub input: Option<SlotInfo>,
    /// The single data output.
    pub output: Option<SlotInfo>,
    /// Position of the error return, if declared.
    pub error_index: Option<usize>,
    /// Total declared parameter count, for sizing the invocation slice.
    pub param_count: usize,
    /// Total declared return count.
    pub return_count: usize,
}

/// Classifies a callable signature against the descriptor registry.
///
/// `is_scalar` reports whether an object key is covered by a custom scalar
/// override; such outputs are exempt from the annotated-field requirement.
///
/// # Errors
///
/// See [`SynthError`]; every rule of the slot model maps to one variant.
pub fn classify(
    sig: &FnSig,
    types: &TypeSet,
    is_scalar: impl Fn(&str) -> bool,
) -> Result<Classification, SynthError> {
    let receiver_key = match &sig.receiver {
        Some(receiver) => match receiver.dereferenced() {
            TypeDesc::Object(key) => Some(key.clone()),
            other => return Err(SynthError::InvalidReceiver(other.to_string())),
        },
        None => None,
    };

    let max_params = if receiver_key.is_some() {
        MAX_PARAMS_BOUND
    } else {
        MAX_PARAMS_UNBOUND
    };
    let declared = sig.params.len() + usize::from(receiver_key.is_some());
    if declared > max_params {
        return Err(SynthError::TooManyArguments {
            max: max_params,
            got: declared,
        });
    }
    if sig.returns.len() > MAX_RETURNS {
        return Err(SynthError::TooManyReturns(sig.returns.len()));
    }

    let mut out = Classification {
        receiver_key,
        context: None,
        info: None,
        input: None,
        output: None,
        error_index: None,
        param_count: sig.params.len(),
        return_count: sig.returns.len(),
    };

    for (index, param) in sig.params.iter().enumerate() {
        match param.dereferenced() {
            TypeDesc::Context => out.context = Some(SlotInfo::new(param, index)),
            TypeDesc::Info => out.info = Some(SlotInfo::new(param, index)),
            _ => {
                if out.input.is_some() {
                    return Err(SynthError::AmbiguousInput(param.to_string()));
                }
                out.input = Some(SlotInfo::new(param, index));
            }
        }
    }

    for (index, ret) in sig.returns.iter().enumerate() {
        if ret.dereferenced() == &TypeDesc::Error {
            out.error_index = Some(index);
        } else {
            if out.output.is_some() {
                return Err(SynthError::AmbiguousOutput(ret.to_string()));
            }
            out.output = Some(SlotInfo::new(ret, index));
        }
    }

    if let Some(input) = &out.input {
        validate_input(input, types)?;
    }
    match &out.output {
        Some(output) => validate_output(output, types, &is_scalar)?,
        None => return Err(SynthError::MissingOutput),
    }

    trace!(
        params = out.param_count,
        returns = out.return_count,
        has_input = out.input.is_some(),
        has_context = out.context.is_some(),
        "classified callable"
    );
    Ok(out)
}

fn validate_input(input: &SlotInfo, types: &TypeSet) -> Result<(), SynthError> {
    if input.is_collection {
        return Err(SynthError::InvalidInputShape(input.declared.to_string()));
    }
    let TypeDesc::Object(key) = input.dereferenced() else {
        return Err(SynthError::InvalidInputShape(input.declared.to_string()));
    };
    let desc = types
        .get(key)
        .ok_or_else(|| SynthError::UnknownType(key.clone()))?;
    if !desc.has_annotated_field() {
        return Err(SynthError::InvalidInputShape(key.clone()));
    }
    Ok(())
}

fn validate_output(
    output: &SlotInfo,
    types: &TypeSet,
    is_scalar: &impl Fn(&str) -> bool,
) -> Result<(), SynthError> {
    let TypeDesc::Object(key) = output.dereferenced() else {
        return Ok(());
    };
    if is_scalar(key) {
        return Ok(());
    }
    let desc = types
        .get(key)
        .ok_or_else(|| SynthError::UnknownType(key.clone()))?;
    if !desc.has_annotated_field() {
        return Err(SynthError::InvalidOutputShape(key.clone()));
    }
    Ok(())
}
