use crate::argument::Argument;
use crate::error::{ArgumentError, ConstructionError, ParseError};
use crate::namespace::Namespace;
use crate::nargs::Nargs;
use crate::parser::ArgumentParser;
use crate::value::Value;

use super::{Action, ActionCore, require_no_nargs};

/// Counts occurrences of a flag (`-vvv` stores 3).
#[derive(Debug, Clone)]
pub struct CountAction {
    core: ActionCore,
}

impl CountAction {
    pub fn new(argument: &Argument) -> Result<Self, ConstructionError> {
        require_no_nargs("count", argument)?;
        let mut core = ActionCore::from_argument(argument);
        core.nargs = Some(Nargs::Exact(0));
        Ok(Self { core })
    }
}

impl Action for CountAction {
    fn kind(&self) -> &'static str {
        "count"
    }

    fn core(&self) -> &ActionCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ActionCore {
        &mut self.core
    }

    fn invoke(
        &self,
        _parser: &ArgumentParser,
        namespace: &mut Namespace,
        _values: Value,
        _option_string: Option<&str>,
    ) -> Result<(), ParseError> {
        let current = match namespace.get(&self.core.dest) {
            None | Some(Value::Null) => 0,
            Some(Value::Int(n)) => *n,
            Some(other) => {
                return Err(ArgumentError::for_action(
                    &self.core,
                    format!("cannot count from non-integer value {}", other.repr()),
                )
                .into());
            }
        };
        let Some(next) = current.checked_add(1) else {
            return Err(ArgumentError::for_action(&self.core, "count overflow").into());
        };
        namespace.set(self.core.dest.clone(), Value::Int(next));
        Ok(())
    }

    fn clone_box(&self) -> Box<dyn Action> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::ParserSettings;

    fn parser_with(argument: Argument) -> ArgumentParser {
        let mut settings = ParserSettings::new("tool");
        settings.exit_on_error = false;
        let mut parser = ArgumentParser::new(settings).unwrap();
        parser.add_argument(argument).unwrap();
        parser
    }

    #[test]
    fn test_count_starts_from_default() {
        let parser = parser_with(Argument::new(["-v"]).with_action("count").with_default(2));
        let ns = parser.parse_args(["-v", "-v"]).unwrap();
        assert_eq!(ns.get("v"), Some(&Value::Int(4)));
    }

    #[test]
    fn test_count_overflow_is_an_argument_error() {
        let parser = parser_with(
            Argument::new(["-v"])
                .with_action("count")
                .with_default(i64::MAX),
        );
        let err = parser.parse_args(["-v"]).unwrap_err();
        assert_eq!(err.to_string(), "argument -v: count overflow");
    }
}
