//! Argument arity.

use std::fmt;
use std::str::FromStr;

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};

use crate::error::ConstructionError;
use crate::value::SUPPRESS;

/// How many command-line strings an action consumes.
///
/// Actions carry `Option<Nargs>`; `None` means exactly one value that is
/// stored unwrapped rather than as a one-element list.
///
/// # Examples
///
/// ```
/// use argkit_core::Nargs;
///
/// assert_eq!("+".parse::<Nargs>().unwrap(), Nargs::OneOrMore);
/// assert_eq!("3".parse::<Nargs>().unwrap(), Nargs::Exact(3));
/// assert!("many".parse::<Nargs>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Nargs {
    /// A fixed number of values, gathered into a list.
    Exact(usize),
    /// `?`: zero or one value.
    Optional,
    /// `*`: any number of values.
    ZeroOrMore,
    /// `+`: at least one value.
    OneOrMore,
    /// `...`: every remaining string, options included.
    Remainder,
    /// `A...`: a subcommand name followed by everything after it.
    Parser,
    /// `==SUPPRESS==`: consumes nothing and stores nothing.
    Suppress,
}

impl FromStr for Nargs {
    type Err = ConstructionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "?" => Ok(Nargs::Optional),
            "*" => Ok(Nargs::ZeroOrMore),
            "+" => Ok(Nargs::OneOrMore),
            "..." => Ok(Nargs::Remainder),
            "A..." => Ok(Nargs::Parser),
            SUPPRESS => Ok(Nargs::Suppress),
            other => other
                .parse::<usize>()
                .map(Nargs::Exact)
                .map_err(|_| ConstructionError::InvalidNargs(other.to_string())),
        }
    }
}

impl fmt::Display for Nargs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Nargs::Exact(n) => write!(f, "{n}"),
            Nargs::Optional => f.write_str("?"),
            Nargs::ZeroOrMore => f.write_str("*"),
            Nargs::OneOrMore => f.write_str("+"),
            Nargs::Remainder => f.write_str("..."),
            Nargs::Parser => f.write_str("A..."),
            Nargs::Suppress => f.write_str(SUPPRESS),
        }
    }
}

impl Serialize for Nargs {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Nargs::Exact(n) => serializer.serialize_u64(*n as u64),
            other => serializer.serialize_str(&other.to_string()),
        }
    }
}

impl<'de> Deserialize<'de> for Nargs {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct NargsVisitor;

        impl Visitor<'_> for NargsVisitor {
            type Value = Nargs;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a count or one of ?, *, +, ..., A..., ==SUPPRESS==")
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Nargs, E> {
                Ok(Nargs::Exact(v as usize))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Nargs, E> {
                usize::try_from(v)
                    .map(Nargs::Exact)
                    .map_err(|_| E::custom(format!("invalid nargs value: {v}")))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Nargs, E> {
                v.parse().map_err(E::custom)
            }
        }

        deserializer.deserialize_any(NargsVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbols_round_trip_through_display() {
        for symbol in ["?", "*", "+", "...", "A...", "==SUPPRESS==", "0", "2"] {
            let nargs: Nargs = symbol.parse().unwrap();
            assert_eq!(nargs.to_string(), symbol);
        }
    }

    #[test]
    fn test_rejects_unknown_symbol() {
        assert_eq!(
            "-1".parse::<Nargs>(),
            Err(ConstructionError::InvalidNargs("-1".to_string()))
        );
    }

    #[test]
    fn test_deserializes_counts_and_symbols() {
        let parsed: Vec<Nargs> = serde_json::from_str(r#"[2, "+", "?"]"#).unwrap();
        assert_eq!(parsed, vec![Nargs::Exact(2), Nargs::OneOrMore, Nargs::Optional]);
    }
}
