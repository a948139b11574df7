//! Argument specifications passed to `add_argument`.

use serde::{Deserialize, Serialize};

use crate::convert::Converter;
use crate::error::ConstructionError;
use crate::nargs::Nargs;
use crate::value::{DefaultValue, SUPPRESS, Value};

/// Display name used for an argument's values in usage and help.
///
/// A tuple supplies one name per value for fixed or paired arities
/// (`--point X Y`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Metavar {
    Name(String),
    Tuple(Vec<String>),
}

impl Metavar {
    pub fn tuple<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Metavar::Tuple(names.into_iter().map(Into::into).collect())
    }

    /// `size` copies of a plain name, or the tuple as given.
    pub fn parts(&self, size: usize) -> Vec<String> {
        match self {
            Metavar::Name(name) => vec![name.clone(); size],
            Metavar::Tuple(names) => names.clone(),
        }
    }

    pub fn is_suppressed(&self) -> bool {
        matches!(self, Metavar::Name(name) if name == SUPPRESS)
    }

    /// Checks that a tuple metavar has as many names as the arity renders.
    pub fn check_arity(&self, nargs: Option<Nargs>) -> Result<(), ConstructionError> {
        let Metavar::Tuple(names) = self else {
            return Ok(());
        };
        let fits = match nargs {
            None | Some(Nargs::Optional) | Some(Nargs::Parser) => names.len() == 1,
            Some(Nargs::ZeroOrMore) | Some(Nargs::OneOrMore) => matches!(names.len(), 1 | 2),
            Some(Nargs::Exact(n)) => names.len() == n,
            Some(Nargs::Remainder) | Some(Nargs::Suppress) => true,
        };
        if fits {
            Ok(())
        } else {
            Err(ConstructionError::MetavarArity)
        }
    }
}

impl From<&str> for Metavar {
    fn from(value: &str) -> Self {
        Metavar::Name(value.to_string())
    }
}

impl From<String> for Metavar {
    fn from(value: String) -> Self {
        Metavar::Name(value)
    }
}

/// Everything `add_argument` needs to build an action.
///
/// Option strings decide the kind: none, or a single token without a prefix
/// character, makes a positional argument; anything else an optional one.
///
/// # Examples
///
/// ```
/// use argkit_core::{Argument, Nargs};
///
/// let files = Argument::new(["files"]).with_nargs(Nargs::OneOrMore);
/// let verbose = Argument::new(["-v", "--verbose"])
///     .with_action("count")
///     .with_help("increase verbosity");
/// assert_eq!(verbose.option_strings, vec!["-v", "--verbose"]);
/// assert_eq!(files.nargs, Some(Nargs::OneOrMore));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Argument {
    pub option_strings: Vec<String>,
    /// Registry key of the action; empty selects `store`.
    pub action: String,
    pub dest: Option<String>,
    pub nargs: Option<Nargs>,
    pub const_value: Option<Value>,
    pub default: DefaultValue,
    /// Registry key of a type converter, resolved when the argument is added.
    pub type_name: Option<String>,
    /// Converter used directly, taking precedence over `type_name`.
    pub converter: Option<Converter>,
    pub choices: Option<Vec<Value>>,
    pub required: Option<bool>,
    pub help: Option<String>,
    pub metavar: Option<Metavar>,
    pub deprecated: bool,
    pub version: Option<String>,
    pub(crate) dest_inferred: bool,
}

impl Argument {
    pub fn new<I, S>(option_strings: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            option_strings: option_strings.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.action = action.into();
        self
    }

    pub fn with_dest(mut self, dest: impl Into<String>) -> Self {
        self.dest = Some(dest.into());
        self
    }

    pub fn with_nargs(mut self, nargs: Nargs) -> Self {
        self.nargs = Some(nargs);
        self
    }

    pub fn with_const(mut self, value: impl Into<Value>) -> Self {
        self.const_value = Some(value.into());
        self
    }

    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = DefaultValue::Value(value.into());
        self
    }

    /// Keeps the destination out of the namespace unless the argument is
    /// given.
    pub fn with_suppressed_default(mut self) -> Self {
        self.default = DefaultValue::Suppress;
        self
    }

    pub fn with_type(mut self, type_name: impl Into<String>) -> Self {
        self.type_name = Some(type_name.into());
        self
    }

    pub fn with_converter(mut self, converter: Converter) -> Self {
        self.converter = Some(converter);
        self
    }

    pub fn with_choices<I, V>(mut self, choices: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.choices = Some(choices.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_required(mut self, required: bool) -> Self {
        self.required = Some(required);
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    pub fn with_metavar(mut self, metavar: impl Into<Metavar>) -> Self {
        self.metavar = Some(metavar.into());
        self
    }

    pub fn with_deprecated(mut self, deprecated: bool) -> Self {
        self.deprecated = deprecated;
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Whether `dest` was derived from the option strings rather than given.
    pub fn dest_inferred(&self) -> bool {
        self.dest_inferred
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metavar_arity_for_paired_values() {
        let pair = Metavar::tuple(["FIRST", "REST"]);
        assert!(pair.check_arity(Some(Nargs::ZeroOrMore)).is_ok());
        assert!(pair.check_arity(Some(Nargs::Exact(2))).is_ok());
        assert_eq!(
            pair.check_arity(None),
            Err(ConstructionError::MetavarArity)
        );
        assert_eq!(
            pair.check_arity(Some(Nargs::Exact(3))),
            Err(ConstructionError::MetavarArity)
        );
    }

    #[test]
    fn test_plain_metavar_repeats() {
        assert_eq!(Metavar::from("X").parts(2), vec!["X", "X"]);
        assert!(Metavar::from(SUPPRESS).is_suppressed());
    }
}
