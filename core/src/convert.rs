//! Named type converters applied to raw command-line strings.

use std::fmt;
use std::sync::Arc;

use crate::error::ArgumentTypeError;
use crate::value::Value;

type ConvertFn = dyn Fn(&str) -> Result<Value, ArgumentTypeError> + Send + Sync;

/// A named conversion from a raw string to a [`Value`].
///
/// The name appears in `invalid <name> value` messages and, when the help
/// style asks for it, as the default metavar.
///
/// # Examples
///
/// ```
/// use argkit_core::{ArgumentTypeError, Converter, Value};
///
/// let port = Converter::new("port", |raw| {
///     raw.parse::<u16>()
///         .map(|p| Value::Int(i64::from(p)))
///         .map_err(|_| ArgumentTypeError::Message(format!("{raw} is not a port")))
/// });
/// assert_eq!(port.convert("8080"), Ok(Value::Int(8080)));
/// assert!(port.convert("http").is_err());
/// ```
#[derive(Clone)]
pub struct Converter {
    name: String,
    func: Arc<ConvertFn>,
}

impl Converter {
    pub fn new<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&str) -> Result<Value, ArgumentTypeError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            func: Arc::new(func),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn convert(&self, raw: &str) -> Result<Value, ArgumentTypeError> {
        (self.func)(raw)
    }
}

impl fmt::Debug for Converter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Converter").field(&self.name).finish()
    }
}

/// Converters registered under the `type` scope of every new registry.
pub(crate) fn builtin_converters() -> Vec<Converter> {
    vec![
        Converter::new("str", |raw| Ok(Value::Str(raw.to_string()))),
        Converter::new("int", |raw| {
            raw.trim()
                .parse::<i64>()
                .map(Value::Int)
                .map_err(|_| ArgumentTypeError::Invalid)
        }),
        Converter::new("float", |raw| {
            raw.trim()
                .parse::<f64>()
                .map(Value::Float)
                .map_err(|_| ArgumentTypeError::Invalid)
        }),
        Converter::new("bool", |raw| match raw.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(Value::Bool(true)),
            "0" | "false" | "no" | "off" => Ok(Value::Bool(false)),
            _ => Err(ArgumentTypeError::Invalid),
        }),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builtin(name: &str) -> Converter {
        builtin_converters()
            .into_iter()
            .find(|c| c.name() == name)
            .unwrap()
    }

    #[test]
    fn test_int_converter() {
        let int = builtin("int");
        assert_eq!(int.convert("42"), Ok(Value::Int(42)));
        assert_eq!(int.convert("-7"), Ok(Value::Int(-7)));
        assert_eq!(int.convert("4.2"), Err(ArgumentTypeError::Invalid));
    }

    #[test]
    fn test_bool_converter_accepts_common_spellings() {
        let flag = builtin("bool");
        assert_eq!(flag.convert("Yes"), Ok(Value::Bool(true)));
        assert_eq!(flag.convert("off"), Ok(Value::Bool(false)));
        assert_eq!(flag.convert("maybe"), Err(ArgumentTypeError::Invalid));
    }
}
