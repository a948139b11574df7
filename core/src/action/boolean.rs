use crate::argument::Argument;
use crate::error::{ConstructionError, ParseError};
use crate::namespace::Namespace;
use crate::nargs::Nargs;
use crate::parser::ArgumentParser;
use crate::value::Value;

use super::{Action, ActionCore, require_no_nargs};

const NEGATION_PREFIX: &str = "--no-";

/// Paired flag: `--color` stores `True`, `--no-color` stores `False`.
///
/// Every long option string gains a `--no-` twin when the action is built.
#[derive(Debug, Clone)]
pub struct BooleanOptionalAction {
    core: ActionCore,
}

impl BooleanOptionalAction {
    pub fn new(argument: &Argument) -> Result<Self, ConstructionError> {
        require_no_nargs("boolean_optional", argument)?;
        let mut option_strings = Vec::with_capacity(argument.option_strings.len() * 2);
        for option in &argument.option_strings {
            if option.starts_with(NEGATION_PREFIX) {
                return Err(ConstructionError::InvalidBooleanOption(option.clone()));
            }
            option_strings.push(option.clone());
            if let Some(name) = option.strip_prefix("--") {
                option_strings.push(format!("{NEGATION_PREFIX}{name}"));
            }
        }
        let mut core = ActionCore::from_argument(argument);
        core.option_strings = option_strings;
        core.nargs = Some(Nargs::Exact(0));
        Ok(Self { core })
    }
}

impl Action for BooleanOptionalAction {
    fn kind(&self) -> &'static str {
        "boolean_optional"
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
        option_string: Option<&str>,
    ) -> Result<(), ParseError> {
        if let Some(option) = option_string {
            if self.core.option_strings.iter().any(|o| o == option) {
                let enabled = !option.starts_with(NEGATION_PREFIX);
                namespace.set(self.core.dest.clone(), Value::Bool(enabled));
            }
        }
        Ok(())
    }

    fn format_usage(&self) -> String {
        self.core.option_strings.join(" | ")
    }

    fn clone_box(&self) -> Box<dyn Action> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adds_negated_long_options() {
        let action =
            BooleanOptionalAction::new(&Argument::new(["-c", "--color"]).with_dest("color"))
                .unwrap();
        assert_eq!(action.core().option_strings, vec!["-c", "--color", "--no-color"]);
        assert_eq!(action.format_usage(), "-c | --color | --no-color");
    }

    #[test]
    fn test_rejects_negated_input() {
        let err = BooleanOptionalAction::new(&Argument::new(["--no-color"]).with_dest("color"))
            .unwrap_err();
        assert_eq!(
            err,
            ConstructionError::InvalidBooleanOption("--no-color".to_string())
        );
    }
}
