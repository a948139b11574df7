//! Dynamically typed values stored in a [`Namespace`](crate::Namespace).
//!
//! Parsed arguments, constants, defaults, and choices all share the
//! [`Value`] model. Rendering follows the conventions users of classic
//! argument parsers expect in help and error text: `None`, `True`, and
//! lists printed as `['a', 'b']`.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Sentinel meaning "leave this out".
///
/// Used as a destination (nothing is stored), a help string (the argument is
/// hidden), a default (the destination is never seeded), and an arity.
pub const SUPPRESS: &str = "==SUPPRESS==";

/// Namespace key under which subcommand leftovers are collected.
pub const UNRECOGNIZED_ARGS_ATTR: &str = "_unrecognized_args";

/// A parsed or configured argument value.
///
/// # Examples
///
/// ```
/// use argkit_core::Value;
///
/// let list = Value::from(vec![Value::from("a"), Value::from(2)]);
/// assert_eq!(list.to_string(), "['a', 2]");
/// assert_eq!(Value::Null.to_string(), "None");
/// assert_eq!(Value::from("x").repr(), "'x'");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum Value {
    /// Absence of a value.
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Renders the value the way it appears inside a list or an error
    /// message: strings are quoted, everything else matches [`Display`].
    ///
    /// [`Display`]: fmt::Display
    pub fn repr(&self) -> String {
        match self {
            Value::Str(s) => format!("'{s}'"),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("None"),
            Value::Bool(true) => f.write_str("True"),
            Value::Bool(false) => f.write_str("False"),
            Value::Int(n) => write!(f, "{n}"),
            Value::Float(x) if x.is_finite() && x.fract() == 0.0 => write!(f, "{x:.1}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Str(s) => f.write_str(s),
            Value::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    f.write_str(&item.repr())?;
                }
                f.write_str("]")
            }
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Str(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(i64::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Value::List(value)
    }
}

/// Default attached to an action or a container.
///
/// `Unset` seeds the destination with [`Value::Null`]; `Suppress` leaves the
/// destination out of the namespace entirely.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum DefaultValue {
    #[default]
    Unset,
    Suppress,
    Value(Value),
}

impl DefaultValue {
    pub fn is_unset(&self) -> bool {
        matches!(self, DefaultValue::Unset)
    }

    pub fn is_suppress(&self) -> bool {
        matches!(self, DefaultValue::Suppress)
    }

    /// The explicitly configured value, if any.
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            DefaultValue::Value(v) => Some(v),
            _ => None,
        }
    }

    /// Value used to seed a namespace, or `None` when suppressed.
    pub fn seed(&self) -> Option<Value> {
        match self {
            DefaultValue::Unset => Some(Value::Null),
            DefaultValue::Suppress => None,
            DefaultValue::Value(v) => Some(v.clone()),
        }
    }
}

impl fmt::Display for DefaultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefaultValue::Unset => f.write_str("None"),
            DefaultValue::Suppress => f.write_str(SUPPRESS),
            DefaultValue::Value(v) => write!(f, "{v}"),
        }
    }
}

impl From<Value> for DefaultValue {
    fn from(value: Value) -> Self {
        DefaultValue::Value(value)
    }
}

impl Serialize for DefaultValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            DefaultValue::Unset => serializer.serialize_none(),
            DefaultValue::Suppress => serializer.serialize_str(SUPPRESS),
            DefaultValue::Value(v) => v.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for DefaultValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match Value::deserialize(deserializer)? {
            Value::Null => DefaultValue::Unset,
            Value::Str(s) if s == SUPPRESS => DefaultValue::Suppress,
            other => DefaultValue::Value(other),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_matches_classic_rendering() {
        assert_eq!(Value::Bool(true).to_string(), "True");
        assert_eq!(Value::Float(2.0).to_string(), "2.0");
        assert_eq!(Value::Float(0.5).to_string(), "0.5");
        assert_eq!(Value::from("plain").to_string(), "plain");
        assert_eq!(
            Value::List(vec![Value::Null, Value::from("x")]).to_string(),
            "[None, 'x']"
        );
    }

    #[test]
    fn test_default_value_seed() {
        assert_eq!(DefaultValue::Unset.seed(), Some(Value::Null));
        assert_eq!(DefaultValue::Suppress.seed(), None);
        assert_eq!(DefaultValue::from(Value::Int(3)).seed(), Some(Value::Int(3)));
    }

    #[test]
    fn test_default_value_deserializes_suppress_sentinel() {
        let parsed: DefaultValue = serde_json::from_str("\"==SUPPRESS==\"").unwrap();
        assert!(parsed.is_suppress());

        let parsed: DefaultValue = serde_json::from_str("null").unwrap();
        assert!(parsed.is_unset());

        let parsed: DefaultValue = serde_json::from_str("[1, \"a\"]").unwrap();
        assert_eq!(
            parsed,
            DefaultValue::Value(Value::List(vec![Value::Int(1), Value::from("a")]))
        );
    }
}
