//! Loggable values and the field sanitizer
//!
//! Every value attached to a log record passes through [`sanitize`], which
//! produces an owned [`Value`] tree. Nothing in a `Value` borrows from or
//! shares mutable state with the caller, so a logger holding sanitized
//! fields can be cloned and shared freely.
//!
//! Conversion rules, in order:
//! 1. errors become their message string
//! 2. maps become a fresh [`Fields`] map with every value sanitized
//! 3. optional and pointer-like values sanitize their target, or `Null`
//! 4. records go through `serde` (see [`Structured`]), skipping fields that
//!    are not serialized
//! 5. sequences become a fresh list; an absent sequence stays `Null`
//! 6. primitives are kept as they are

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

/// Key/value fields attached to a record. Ordered so rendered output is stable.
pub type Fields = BTreeMap<String, Value>;

/// JSON-safe value produced by the sanitizer.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    String(String),
    List(Vec<Value>),
    Map(Fields),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&Fields> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(l) => Some(l),
            _ => None,
        }
    }

    /// Convert to serde_json::Value for JSON serialization
    #[must_use]
    pub fn to_json_value(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Int(i) => serde_json::Value::Number((*i).into()),
            Value::UInt(u) => serde_json::Value::Number((*u).into()),
            Value::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::List(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json_value).collect())
            }
            Value::Map(fields) => serde_json::Value::Object(
                fields
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json_value()))
                    .collect(),
            ),
        }
    }

    fn from_json(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else if let Some(u) = n.as_u64() {
                    Value::UInt(u)
                } else {
                    n.as_f64().map(Value::Float).unwrap_or(Value::Null)
                }
            }
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::List(items.into_iter().map(Value::from_json).collect())
            }
            serde_json::Value::Object(map) => Value::Map(
                map.into_iter()
                    .map(|(k, v)| (k, Value::from_json(v)))
                    .collect(),
            ),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::UInt(u) => write!(f, "{}", u),
            Value::Float(fl) => write!(f, "{}", fl),
            Value::String(s) => write!(f, "{}", s),
            Value::List(_) | Value::Map(_) => write!(f, "{}", self.to_json_value()),
        }
    }
}

/// Types that know how to turn themselves into a [`Value`].
///
/// Implemented for primitives, strings, collections, smart pointers and
/// error types. Records that derive `Serialize` can be wrapped in
/// [`Structured`]; anything else can implement this trait directly.
pub trait Loggable {
    fn to_log_value(&self) -> Value;
}

/// Sanitize any loggable value into an owned [`Value`].
///
/// Floats are kept as they are, NaN included. Since `NaN != NaN`, two values
/// holding a NaN never compare equal with `==`, even when one was sanitized
/// from the other; compare their `Debug` output instead.
pub fn sanitize<T: Loggable + ?Sized>(value: &T) -> Value {
    value.to_log_value()
}

/// Errors are logged by their message.
pub fn sanitize_error(err: &(dyn std::error::Error + 'static)) -> Value {
    Value::String(err.to_string())
}

/// Sanitize a record through its `Serialize` implementation.
///
/// Fields marked `#[serde(skip)]` are not visible and therefore omitted. A
/// value that fails to serialize is replaced by its error message.
pub fn sanitize_serialize<T: Serialize + ?Sized>(value: &T) -> Value {
    match serde_json::to_value(value) {
        Ok(json) => Value::from_json(json),
        Err(err) => Value::String(err.to_string()),
    }
}

/// Merge `new` on top of a copy of `old`; `new` wins on key collision.
///
/// The result never shares state with either input.
pub fn merge<I, K, V>(old: &Fields, new: I) -> Fields
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Loggable,
{
    let mut merged: Fields = old.iter().map(|(k, v)| (k.clone(), sanitize(v))).collect();
    for (key, value) in new {
        merged.insert(key.into(), sanitize(&value));
    }
    merged
}

/// Wrapper that logs a record through its `Serialize` implementation.
///
/// ```
/// use chain_logger::{sanitize, Structured, Value};
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct Order {
///     id: u32,
///     #[serde(skip)]
///     secret: String,
/// }
///
/// let order = Order { id: 7, secret: "hunter2".into() };
/// let value = sanitize(&Structured(&order));
/// let map = value.as_map().unwrap();
/// assert_eq!(map["id"], Value::Int(7));
/// assert!(!map.contains_key("secret"));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Structured<T>(pub T);

impl<T: Serialize> Loggable for Structured<T> {
    fn to_log_value(&self) -> Value {
        sanitize_serialize(&self.0)
    }
}

impl Loggable for Value {
    fn to_log_value(&self) -> Value {
        self.clone()
    }
}

impl Loggable for serde_json::Value {
    fn to_log_value(&self) -> Value {
        Value::from_json(self.clone())
    }
}

impl Loggable for () {
    fn to_log_value(&self) -> Value {
        Value::Null
    }
}

impl Loggable for bool {
    fn to_log_value(&self) -> Value {
        Value::Bool(*self)
    }
}

macro_rules! loggable_int {
    ($($t:ty),*) => {
        $(impl Loggable for $t {
            fn to_log_value(&self) -> Value {
                Value::Int(*self as i64)
            }
        })*
    };
}

macro_rules! loggable_wide_uint {
    ($($t:ty),*) => {
        $(impl Loggable for $t {
            fn to_log_value(&self) -> Value {
                match i64::try_from(*self) {
                    Ok(i) => Value::Int(i),
                    Err(_) => Value::UInt(*self as u64),
                }
            }
        })*
    };
}

loggable_int!(i8, i16, i32, i64, isize, u8, u16, u32);
loggable_wide_uint!(u64, usize);

impl Loggable for f32 {
    fn to_log_value(&self) -> Value {
        Value::Float(f64::from(*self))
    }
}

impl Loggable for f64 {
    fn to_log_value(&self) -> Value {
        Value::Float(*self)
    }
}

impl Loggable for char {
    fn to_log_value(&self) -> Value {
        Value::String(self.to_string())
    }
}

impl Loggable for str {
    fn to_log_value(&self) -> Value {
        Value::String(self.to_string())
    }
}

impl Loggable for String {
    fn to_log_value(&self) -> Value {
        Value::String(self.clone())
    }
}

impl Loggable for Cow<'_, str> {
    fn to_log_value(&self) -> Value {
        Value::String(self.to_string())
    }
}

impl<T: Loggable> Loggable for Option<T> {
    fn to_log_value(&self) -> Value {
        match self {
            Some(inner) => inner.to_log_value(),
            None => Value::Null,
        }
    }
}

impl<T: Loggable + ?Sized> Loggable for &T {
    fn to_log_value(&self) -> Value {
        (**self).to_log_value()
    }
}

impl<T: Loggable + ?Sized> Loggable for Box<T> {
    fn to_log_value(&self) -> Value {
        (**self).to_log_value()
    }
}

impl<T: Loggable + ?Sized> Loggable for Arc<T> {
    fn to_log_value(&self) -> Value {
        (**self).to_log_value()
    }
}

impl<T: Loggable + ?Sized> Loggable for Rc<T> {
    fn to_log_value(&self) -> Value {
        (**self).to_log_value()
    }
}

impl<T: Loggable> Loggable for [T] {
    fn to_log_value(&self) -> Value {
        Value::List(self.iter().map(Loggable::to_log_value).collect())
    }
}

impl<T: Loggable, const N: usize> Loggable for [T; N] {
    fn to_log_value(&self) -> Value {
        self.as_slice().to_log_value()
    }
}

impl<T: Loggable> Loggable for Vec<T> {
    fn to_log_value(&self) -> Value {
        self.as_slice().to_log_value()
    }
}

impl<T: Loggable> Loggable for VecDeque<T> {
    fn to_log_value(&self) -> Value {
        Value::List(self.iter().map(Loggable::to_log_value).collect())
    }
}

impl<K: fmt::Display, V: Loggable, S> Loggable for HashMap<K, V, S> {
    fn to_log_value(&self) -> Value {
        Value::Map(
            self.iter()
                .map(|(k, v)| (k.to_string(), v.to_log_value()))
                .collect(),
        )
    }
}

impl<K: fmt::Display, V: Loggable> Loggable for BTreeMap<K, V> {
    fn to_log_value(&self) -> Value {
        Value::Map(
            self.iter()
                .map(|(k, v)| (k.to_string(), v.to_log_value()))
                .collect(),
        )
    }
}

impl Loggable for dyn std::error::Error + 'static {
    fn to_log_value(&self) -> Value {
        sanitize_error(self)
    }
}

impl Loggable for dyn std::error::Error + Send + Sync + 'static {
    fn to_log_value(&self) -> Value {
        sanitize_error(self)
    }
}

impl Loggable for std::io::Error {
    fn to_log_value(&self) -> Value {
        sanitize_error(self)
    }
}

impl Loggable for std::fmt::Error {
    fn to_log_value(&self) -> Value {
        sanitize_error(self)
    }
}

impl Loggable for crate::core::error::LoggerError {
    fn to_log_value(&self) -> Value {
        sanitize_error(self)
    }
}
