//! Named-field access over a versioned source object.
//!
//! The reader that parses serialized assets is not part of this crate; it
//! only has to expose its objects through [`SourceObject`]. An implementation
//! for `serde_json::Value` is provided for JSON object dumps.

use serde_json::Value as JsonValue;

/// A scalar leaf value of a source object.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scalar<'a> {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(&'a str),
}

impl<'a> Scalar<'a> {
    /// Numeric value as `f32`. Integers are widened.
    pub fn as_f32(&self) -> Option<f32> {
        match *self {
            Scalar::Int(i) => Some(i as f32),
            Scalar::Float(f) => Some(f as f32),
            _ => None,
        }
    }

    /// Non-negative integral value. Booleans map to 0/1.
    pub fn as_u64(&self) -> Option<u64> {
        match *self {
            Scalar::Bool(b) => Some(u64::from(b)),
            Scalar::Int(i) => u64::try_from(i).ok(),
            Scalar::Float(f) if f >= 0.0 && f.fract() == 0.0 && f <= u64::MAX as f64 => {
                Some(f as u64)
            }
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&'a str> {
        match *self {
            Scalar::Str(s) => Some(s),
            _ => None,
        }
    }
}

/// Result of a named-field lookup: a scalar or a list of child objects.
#[derive(Debug)]
pub enum Value<'a, O> {
    Scalar(Scalar<'a>),
    List(Vec<&'a O>),
}

impl<'a, O> Value<'a, O> {
    pub fn as_scalar(&self) -> Option<Scalar<'a>> {
        match self {
            Value::Scalar(s) => Some(*s),
            Value::List(_) => None,
        }
    }

    pub fn into_list(self) -> Option<Vec<&'a O>> {
        match self {
            Value::List(items) => Some(items),
            Value::Scalar(_) => None,
        }
    }
}

/// Generic structured object with named fields.
///
/// Lookups of absent fields return `None`; whether an absent field is an
/// error is decided by the caller.
pub trait SourceObject: Sized {
    /// Look up a scalar or list field.
    fn get_value(&self, field: &str) -> Option<Value<'_, Self>>;

    /// Look up a nested object field.
    fn get_object(&self, field: &str) -> Option<&Self>;

    /// The scalar held by this node, if it is a leaf (list elements).
    fn as_scalar(&self) -> Option<Scalar<'_>>;
}

impl SourceObject for JsonValue {
    fn get_value(&self, field: &str) -> Option<Value<'_, Self>> {
        match self.as_object()?.get(field)? {
            JsonValue::Array(items) => Some(Value::List(items.iter().collect())),
            other => other.as_scalar().map(Value::Scalar),
        }
    }

    fn get_object(&self, field: &str) -> Option<&Self> {
        self.as_object()?.get(field).filter(|v| v.is_object())
    }

    fn as_scalar(&self) -> Option<Scalar<'_>> {
        match self {
            JsonValue::Bool(b) => Some(Scalar::Bool(*b)),
            JsonValue::Number(n) => n
                .as_i64()
                .map(Scalar::Int)
                .or_else(|| n.as_f64().map(Scalar::Float)),
            JsonValue::String(s) => Some(Scalar::Str(s)),
            _ => None,
        }
    }
}
