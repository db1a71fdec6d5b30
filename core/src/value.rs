//! Dynamically typed values bound in template scopes.
//!
//! Values deserialize from any self-describing format through serde, so host
//! data usually arrives as JSON:
//!
//! ```
//! use stencil_core::value::Value;
//!
//! let value: Value = serde_json::from_str(r#"{"name": "Ada", "tags": ["a", "b"]}"#).unwrap();
//! assert_eq!(value.field("name"), Value::from("Ada"));
//! assert_eq!(value.field("tags").field("size"), Value::Int(2));
//! ```

use core::cmp::Ordering;
use core::fmt;
use std::collections::BTreeMap;

use ecow::{EcoString, EcoVec};
use serde::{Deserialize, Serialize};

/// A runtime value.
///
/// Strings and arrays are reference counted, so cloning a value out of a
/// scope is cheap. Maps are ordered to keep rendering deterministic.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    #[default]
    Nil,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(EcoString),
    Array(EcoVec<Value>),
    Map(BTreeMap<EcoString, Value>),
}

impl Value {
    /// Name of the value's type, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::Array(_) => "array",
            Value::Map(_) => "map",
        }
    }

    /// Only `nil` and `false` are falsy.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Nil | Value::Bool(false))
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    /// True for `nil`, `false`, and empty strings, arrays and maps.
    pub fn is_blank(&self) -> bool {
        match self {
            Value::Nil | Value::Bool(false) => true,
            Value::Str(s) => s.is_empty(),
            Value::Array(items) => items.is_empty(),
            Value::Map(map) => map.is_empty(),
            _ => false,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Numeric view of ints and floats.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(&items[..]),
            _ => None,
        }
    }

    /// Number of characters, elements or entries; zero for scalars.
    pub fn size(&self) -> usize {
        match self {
            Value::Str(s) => s.chars().count(),
            Value::Array(items) => items.len(),
            Value::Map(map) => map.len(),
            _ => 0,
        }
    }

    /// Property access (`value.name`).
    ///
    /// Maps look up the key. Arrays and strings answer the `size`, `first`
    /// and `last` pseudo-properties. Anything else is `nil`.
    pub fn field(&self, name: &str) -> Value {
        match (self, name) {
            (Value::Map(map), _) => map.get(name).cloned().unwrap_or_default(),
            (Value::Array(_) | Value::Str(_), "size") => Value::Int(self.size() as i64),
            (Value::Array(items), "first") => items.first().cloned().unwrap_or_default(),
            (Value::Array(items), "last") => items.last().cloned().unwrap_or_default(),
            (Value::Str(s), "first") => s.chars().next().map(Value::from).unwrap_or_default(),
            (Value::Str(s), "last") => s.chars().last().map(Value::from).unwrap_or_default(),
            _ => Value::Nil,
        }
    }

    /// Subscript access (`value[key]`). Negative array indices count from the end.
    pub fn index(&self, key: &Value) -> Value {
        match (self, key) {
            (Value::Array(items), Value::Int(i)) => {
                let len = items.len() as i64;
                let i = if *i < 0 { len + i } else { *i };
                if (0..len).contains(&i) {
                    items[i as usize].clone()
                } else {
                    Value::Nil
                }
            }
            (Value::Map(map), Value::Str(k)) => map.get(k).cloned().unwrap_or_default(),
            (Value::Str(_) | Value::Array(_), Value::Str(k)) => self.field(k),
            _ => Value::Nil,
        }
    }

    /// Substring, element, or key membership.
    pub fn contains(&self, needle: &Value) -> bool {
        match (self, needle) {
            (Value::Str(s), Value::Str(n)) => s.contains(n.as_str()),
            (Value::Array(items), _) => items.iter().any(|item| item.loose_eq(needle)),
            (Value::Map(map), Value::Str(k)) => map.contains_key(k),
            _ => false,
        }
    }

    /// Equality where ints and floats compare numerically.
    pub fn loose_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Int(a), Value::Float(b)) | (Value::Float(b), Value::Int(a)) => {
                (*a as f64) == *b
            }
            _ => self == other,
        }
    }

    /// Ordering between numbers or between strings; `None` otherwise.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
            (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
            _ => self.as_float()?.partial_cmp(&other.as_float()?),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => Ok(()),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            // Debug keeps the trailing `.0` on integral floats.
            Value::Float(x) => write!(f, "{:?}", x),
            Value::Str(s) => f.write_str(s),
            Value::Array(items) => items.iter().try_for_each(|item| write!(f, "{}", item)),
            Value::Map(map) => {
                f.write_str("{")?;
                for (i, (key, value)) in map.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{:?}: {}", key.as_str(), value)?;
                }
                f.write_str("}")
            }
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i.into())
    }
}

impl From<usize> for Value {
    fn from(n: usize) -> Self {
        Value::Int(n as i64)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<char> for Value {
    fn from(c: char) -> Self {
        let mut s = EcoString::new();
        s.push(c);
        Value::Str(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.into())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s.into())
    }
}

impl From<EcoString> for Value {
    fn from(s: EcoString) -> Self {
        Value::Str(s)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::Array(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or_default()
    }
}

impl<K: Into<EcoString>, V: Into<Value>> FromIterator<(K, V)> for Value {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Value::Map(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}
