//! Dynamically-typed values under test
//!
//! Every assertion takes its operands as [`Value`]s. The variant is the
//! runtime category the engine dispatches on; scalar variants also carry the
//! width of the Rust type they were built from so type identity and deep
//! equality stay exact.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::channel::Channel;

/// Signed integer widths
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntWidth {
    I8,
    I16,
    I32,
    I64,
    Isize,
}

impl fmt::Display for IntWidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntWidth::I8 => write!(f, "i8"),
            IntWidth::I16 => write!(f, "i16"),
            IntWidth::I32 => write!(f, "i32"),
            IntWidth::I64 => write!(f, "i64"),
            IntWidth::Isize => write!(f, "isize"),
        }
    }
}

/// Unsigned integer widths (`U8` doubles as byte)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UintWidth {
    U8,
    U16,
    U32,
    U64,
    Usize,
}

impl fmt::Display for UintWidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UintWidth::U8 => write!(f, "u8"),
            UintWidth::U16 => write!(f, "u16"),
            UintWidth::U32 => write!(f, "u32"),
            UintWidth::U64 => write!(f, "u64"),
            UintWidth::Usize => write!(f, "usize"),
        }
    }
}

/// Floating point widths
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FloatWidth {
    F32,
    F64,
}

impl fmt::Display for FloatWidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FloatWidth::F32 => write!(f, "f32"),
            FloatWidth::F64 => write!(f, "f64"),
        }
    }
}

/// Runtime category of a value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    Nil,
    Bool,
    Int,
    Uint,
    Float,
    Str,
    Array,
    Slice,
    Map,
    Chan,
    Opaque,
}

impl Kind {
    /// Signed or unsigned integer
    pub fn is_integer(&self) -> bool {
        matches!(self, Kind::Int | Kind::Uint)
    }

    pub fn is_float(&self) -> bool {
        matches!(self, Kind::Float)
    }

    /// Integer or float
    pub fn is_numeric(&self) -> bool {
        self.is_integer() || self.is_float()
    }

    /// Array or slice
    pub fn is_sequence(&self) -> bool {
        matches!(self, Kind::Array | Kind::Slice)
    }

    /// Categories that have a length
    pub fn has_len(&self) -> bool {
        matches!(
            self,
            Kind::Str | Kind::Array | Kind::Slice | Kind::Map | Kind::Chan
        )
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Kind::Nil => write!(f, "nil"),
            Kind::Bool => write!(f, "bool"),
            Kind::Int => write!(f, "int"),
            Kind::Uint => write!(f, "uint"),
            Kind::Float => write!(f, "float"),
            Kind::Str => write!(f, "string"),
            Kind::Array => write!(f, "array"),
            Kind::Slice => write!(f, "slice"),
            Kind::Map => write!(f, "map"),
            Kind::Chan => write!(f, "chan"),
            Kind::Opaque => write!(f, "opaque"),
        }
    }
}

/// A value under test
///
/// # Examples
///
/// ```
/// use assay::{Kind, Value};
///
/// assert_eq!(Value::from(7u8).kind(), Kind::Uint);
/// assert_eq!(Value::from(vec![1, 2]).len(), Some(2));
/// assert_eq!(Value::from(None::<i32>), Value::Nil);
/// ```
#[derive(Debug, Clone)]
pub enum Value {
    Nil,
    Bool(bool),
    Int(i64, IntWidth),
    Uint(u64, UintWidth),
    Float(f64, FloatWidth),
    Str(String),
    /// Fixed-size array; the length is part of its type
    Array(Vec<Value>),
    Slice(Vec<Value>),
    /// Key/value pairs; equality ignores order
    Map(Vec<(Value, Value)>),
    Chan(Channel),
    /// Any other Rust value, kept as its type name and debug rendering
    Opaque {
        type_name: &'static str,
        repr: String,
    },
}

impl Value {
    /// Capture an arbitrary value the engine has no category for
    pub fn opaque<T: fmt::Debug + ?Sized>(value: &T) -> Self {
        Value::Opaque {
            type_name: std::any::type_name::<T>(),
            repr: format!("{:?}", value),
        }
    }

    pub fn kind(&self) -> Kind {
        match self {
            Value::Nil => Kind::Nil,
            Value::Bool(_) => Kind::Bool,
            Value::Int(..) => Kind::Int,
            Value::Uint(..) => Kind::Uint,
            Value::Float(..) => Kind::Float,
            Value::Str(_) => Kind::Str,
            Value::Array(_) => Kind::Array,
            Value::Slice(_) => Kind::Slice,
            Value::Map(_) => Kind::Map,
            Value::Chan(_) => Kind::Chan,
            Value::Opaque { .. } => Kind::Opaque,
        }
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    /// Dynamic type name, e.g. `i32`, `[_; 3]`, `chan<u8>`
    pub fn type_name(&self) -> String {
        match self {
            Value::Nil => "nil".to_string(),
            Value::Bool(_) => "bool".to_string(),
            Value::Int(_, w) => w.to_string(),
            Value::Uint(_, w) => w.to_string(),
            Value::Float(_, w) => w.to_string(),
            Value::Str(_) => "str".to_string(),
            Value::Array(items) => format!("[_; {}]", items.len()),
            Value::Slice(_) => "[_]".to_string(),
            Value::Map(_) => "map".to_string(),
            Value::Chan(ch) => format!("chan<{}>", ch.elem_type()),
            Value::Opaque { type_name, .. } => type_name.to_string(),
        }
    }

    /// Check if two values have the same dynamic type (kind and width)
    pub fn same_type(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Int(_, a), Value::Int(_, b)) => a == b,
            (Value::Uint(_, a), Value::Uint(_, b)) => a == b,
            (Value::Float(_, a), Value::Float(_, b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a.len() == b.len(),
            (Value::Chan(a), Value::Chan(b)) => a.elem_type() == b.elem_type(),
            (Value::Opaque { type_name: a, .. }, Value::Opaque { type_name: b, .. }) => a == b,
            (a, b) => a.kind() == b.kind(),
        }
    }

    /// Length of container-like values; `None` for every other category
    pub fn len(&self) -> Option<usize> {
        match self {
            Value::Str(s) => Some(s.len()),
            Value::Array(items) | Value::Slice(items) => Some(items.len()),
            Value::Map(entries) => Some(entries.len()),
            Value::Chan(ch) => Some(ch.len()),
            _ => None,
        }
    }

    /// `Some(true)` for zero-length containers, `None` if there is no length
    pub fn is_empty(&self) -> Option<bool> {
        self.len().map(|len| len == 0)
    }

    /// Sign relative to zero; `None` for non-numeric values and NaN
    pub fn sign(&self) -> Option<Ordering> {
        match self {
            Value::Int(v, _) => Some(v.cmp(&0)),
            Value::Uint(v, _) => Some(v.cmp(&0)),
            Value::Float(v, _) => v.partial_cmp(&0.0),
            _ => None,
        }
    }

    /// `Some(true)` if a numeric value equals zero
    pub fn is_zero(&self) -> Option<bool> {
        match self {
            Value::Int(v, _) => Some(*v == 0),
            Value::Uint(v, _) => Some(*v == 0),
            Value::Float(v, _) => Some(*v == 0.0),
            _ => None,
        }
    }

    /// `Some(true)` if a float is NaN
    pub fn is_nan(&self) -> Option<bool> {
        match self {
            Value::Float(v, _) => Some(v.is_nan()),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Items of an array or slice
    pub fn as_items(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) | Value::Slice(items) => Some(items),
            _ => None,
        }
    }

    /// Keys of a map, in stored order
    pub fn keys(&self) -> Option<impl Iterator<Item = &Value>> {
        match self {
            Value::Map(entries) => Some(entries.iter().map(|(k, _)| k)),
            _ => None,
        }
    }

    /// Look up a map entry by deep-equal key
    pub fn get(&self, key: &Value) -> Option<&Value> {
        match self {
            Value::Map(entries) => entries.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }

    /// Text used when matching a value against a pattern
    pub fn to_text(&self) -> String {
        match self {
            Value::Str(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a, wa), Value::Int(b, wb)) => wa == wb && a == b,
            (Value::Uint(a, wa), Value::Uint(b, wb)) => wa == wb && a == b,
            (Value::Float(a, wa), Value::Float(b, wb)) => wa == wb && a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Slice(a), Value::Slice(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => same_entries(a, b),
            (Value::Chan(a), Value::Chan(b)) => a.same_channel(b),
            (
                Value::Opaque { type_name: ta, repr: ra },
                Value::Opaque { type_name: tb, repr: rb },
            ) => ta == tb && ra == rb,
            _ => false,
        }
    }
}

/// Order-insensitive entry comparison; each entry of `b` is matched at most once
fn same_entries(a: &[(Value, Value)], b: &[(Value, Value)]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut used = vec![false; b.len()];
    a.iter().all(|(ka, va)| {
        let slot = b
            .iter()
            .enumerate()
            .position(|(i, (kb, vb))| !used[i] && ka == kb && va == vb);
        match slot {
            Some(i) => {
                used[i] = true;
                true
            }
            None => false,
        }
    })
}

fn write_items(f: &mut fmt::Formatter<'_>, items: &[Value]) -> fmt::Result {
    write!(f, "[")?;
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", item)?;
    }
    write!(f, "]")
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(v, _) => write!(f, "{}", v),
            Value::Uint(v, _) => write!(f, "{}", v),
            Value::Float(v, FloatWidth::F32) => write!(f, "{}", *v as f32),
            Value::Float(v, FloatWidth::F64) => write!(f, "{}", v),
            Value::Str(s) => write!(f, "{:?}", s),
            Value::Array(items) | Value::Slice(items) => write_items(f, items),
            Value::Map(entries) => {
                write!(f, "{{")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", k, v)?;
                }
                write!(f, "}}")
            }
            Value::Chan(ch) => write!(f, "chan<{}>(len={})", ch.elem_type(), ch.len()),
            Value::Opaque { repr, .. } => write!(f, "{}", repr),
        }
    }
}

// =====================
// Conversions
// =====================

macro_rules! from_int {
    ($($ty:ty => $width:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::Int(v as i64, IntWidth::$width)
                }
            }
        )*
    };
}

macro_rules! from_uint {
    ($($ty:ty => $width:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::Uint(v as u64, UintWidth::$width)
                }
            }
        )*
    };
}

from_int!(i8 => I8, i16 => I16, i32 => I32, i64 => I64, isize => Isize);
from_uint!(u8 => U8, u16 => U16, u32 => U32, u64 => U64, usize => Usize);

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(v as f64, FloatWidth::F32)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v, FloatWidth::F64)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<char> for Value {
    fn from(v: char) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<&String> for Value {
    fn from(v: &String) -> Self {
        Value::Str(v.clone())
    }
}

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::Nil
    }
}

impl From<&Value> for Value {
    fn from(v: &Value) -> Self {
        v.clone()
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Nil, Into::into)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::Slice(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Clone + Into<Value>> From<&[T]> for Value {
    fn from(v: &[T]) -> Self {
        Value::Slice(v.iter().cloned().map(Into::into).collect())
    }
}

impl<T: Into<Value>, const N: usize> From<[T; N]> for Value {
    fn from(v: [T; N]) -> Self {
        Value::Array(v.into_iter().map(Into::into).collect())
    }
}

impl<K: Into<Value>, V: Into<Value>, S> From<HashMap<K, V, S>> for Value {
    fn from(v: HashMap<K, V, S>) -> Self {
        Value::Map(v.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl<K: Into<Value>, V: Into<Value>> From<BTreeMap<K, V>> for Value {
    fn from(v: BTreeMap<K, V>) -> Self {
        Value::Map(v.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl From<Channel> for Value {
    fn from(v: Channel) -> Self {
        Value::Chan(v)
    }
}

impl From<&Channel> for Value {
    fn from(v: &Channel) -> Self {
        Value::Chan(v.clone())
    }
}

impl From<JsonValue> for Value {
    fn from(v: JsonValue) -> Self {
        match v {
            JsonValue::Null => Value::Nil,
            JsonValue::Bool(b) => Value::Bool(b),
            JsonValue::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(i, IntWidth::I64)
                } else if let Some(u) = n.as_u64() {
                    Value::Uint(u, UintWidth::U64)
                } else {
                    Value::Float(n.as_f64().unwrap_or(f64::NAN), FloatWidth::F64)
                }
            }
            JsonValue::String(s) => Value::Str(s),
            JsonValue::Array(items) => Value::Slice(items.into_iter().map(Value::from).collect()),
            JsonValue::Object(map) => Value::Map(
                map.into_iter()
                    .map(|(k, v)| (Value::Str(k), Value::from(v)))
                    .collect(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_kind_dispatch() {
        assert_eq!(Value::from(-3i16).kind(), Kind::Int);
        assert_eq!(Value::from(3usize).kind(), Kind::Uint);
        assert_eq!(Value::from(0.5f32).kind(), Kind::Float);
        assert_eq!(Value::from("x").kind(), Kind::Str);
        assert_eq!(Value::from([1, 2]).kind(), Kind::Array);
        assert_eq!(Value::from(vec![1, 2]).kind(), Kind::Slice);
        assert_eq!(Value::from(()).kind(), Kind::Nil);
        assert_eq!(Value::opaque(&std::time::Duration::ZERO).kind(), Kind::Opaque);
    }

    #[test]
    fn test_deep_equality_requires_same_width() {
        assert_eq!(Value::from(1i32), Value::from(1i32));
        assert_ne!(Value::from(1i32), Value::from(1i64));
        assert_ne!(Value::from(1u8), Value::from(1i8));
        assert_ne!(Value::from(f64::NAN), Value::from(f64::NAN));
    }

    #[test]
    fn test_deep_equality_containers() {
        assert_eq!(Value::from(vec!["a", "b"]), Value::from(vec!["a", "b"]));
        assert_ne!(Value::from(vec!["a", "b"]), Value::from(["a", "b"]));
        assert_ne!(Value::from(vec!["a", "b"]), Value::from(vec!["b", "a"]));

        let a = Value::Map(vec![
            (Value::from("x"), Value::from(1)),
            (Value::from("y"), Value::from(2)),
        ]);
        let b = Value::Map(vec![
            (Value::from("y"), Value::from(2)),
            (Value::from("x"), Value::from(1)),
        ]);
        assert_eq!(a, b);
        assert_eq!(a.get(&Value::from("y")), Some(&Value::from(2)));
    }

    #[test]
    fn test_map_equality_matches_entries_once() {
        let doubled = Value::Map(vec![
            (Value::from("x"), Value::from(1)),
            (Value::from("x"), Value::from(1)),
        ]);
        let mixed = Value::Map(vec![
            (Value::from("x"), Value::from(1)),
            (Value::from("y"), Value::from(2)),
        ]);
        assert_ne!(doubled, mixed);
        assert_ne!(mixed, doubled);
        assert_eq!(doubled, doubled.clone());
    }

    #[test]
    fn test_keys_and_sequences() {
        let map = Value::from(BTreeMap::from([("a", 1), ("b", 2)]));
        let keys: Vec<&Value> = map.keys().unwrap().collect();
        assert_eq!(keys, vec![&Value::from("a"), &Value::from("b")]);
        assert!(Value::from(1).keys().is_none());
        assert!(Kind::Array.is_sequence() && Kind::Slice.is_sequence());
        assert!(!Kind::Str.is_sequence());
    }

    #[test]
    fn test_sign_and_zero() {
        assert_eq!(Value::from(-2).sign(), Some(Ordering::Less));
        assert_eq!(Value::from(0u32).sign(), Some(Ordering::Equal));
        assert_eq!(Value::from(f64::NAN).sign(), None);
        assert_eq!(Value::from(-0.0f64).is_zero(), Some(true));
        assert_eq!(Value::from("0").is_zero(), None);
    }

    #[test]
    fn test_len_by_category() {
        assert_eq!(Value::from("héllo").len(), Some(6));
        assert_eq!(Value::from(Vec::<i32>::new()).is_empty(), Some(true));
        assert_eq!(Value::from(42).len(), None);
        assert_eq!(Value::Nil.is_empty(), None);
    }

    #[test]
    fn test_type_names() {
        assert_eq!(Value::from(1i32).type_name(), "i32");
        assert_eq!(Value::from([1, 2, 3]).type_name(), "[_; 3]");
        assert!(Value::from([1, 2, 3]).same_type(&Value::from([4, 5, 6])));
        assert!(!Value::from([1, 2, 3]).same_type(&Value::from([4, 5])));
        assert!(!Value::from(1.0f32).same_type(&Value::from(1.0f64)));
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::from("hi").to_string(), "\"hi\"");
        assert_eq!(Value::from(vec![1, 2]).to_string(), "[1, 2]");
        assert_eq!(Value::from(0.1f32).to_string(), "0.1");
        assert_eq!(Value::from(Some("a")).to_text(), "a");
    }

    #[test]
    fn test_from_json() {
        let value = Value::from(json!({"tags": ["a", "b"], "count": 2, "ratio": 0.5, "none": null}));
        assert_eq!(value.kind(), Kind::Map);
        assert_eq!(value.get(&Value::from("count")), Some(&Value::Int(2, IntWidth::I64)));
        assert_eq!(value.get(&Value::from("none")), Some(&Value::Nil));
        assert_eq!(
            value.get(&Value::from("tags")),
            Some(&Value::from(vec!["a", "b"]))
        );
        assert_eq!(Value::from(json!(u64::MAX)), Value::from(u64::MAX));
    }
}
