use crate::argument::Argument;
use crate::error::{ConstructionError, ParseError};
use crate::namespace::Namespace;
use crate::nargs::Nargs;
use crate::parser::ArgumentParser;
use crate::value::{DefaultValue, Value};

use super::{Action, ActionCore, check_value_arity, require_no_nargs};

/// Stores the converted value at the destination.
#[derive(Debug, Clone)]
pub struct StoreAction {
    core: ActionCore,
}

impl StoreAction {
    pub fn new(argument: &Argument) -> Result<Self, ConstructionError> {
        let core = ActionCore::from_argument(argument);
        check_value_arity(
            "store",
            &core,
            "if you have nothing to store, actions such as store_true or store_const may be more appropriate",
        )?;
        Ok(Self { core })
    }
}

impl Action for StoreAction {
    fn kind(&self) -> &'static str {
        "store"
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
        values: Value,
        _option_string: Option<&str>,
    ) -> Result<(), ParseError> {
        namespace.set(self.core.dest.clone(), values);
        Ok(())
    }

    fn clone_box(&self) -> Box<dyn Action> {
        Box::new(self.clone())
    }
}

/// Stores a fixed constant; consumes no values.
///
/// Also backs `store_true` and `store_false`, which fix the constant and
/// flip the default.
#[derive(Debug, Clone)]
pub struct StoreConstAction {
    core: ActionCore,
    kind: &'static str,
}

impl StoreConstAction {
    pub fn new(argument: &Argument) -> Result<Self, ConstructionError> {
        let constant = argument.const_value.clone().unwrap_or_default();
        Self::build("store_const", argument, constant, None)
    }

    pub fn store_true(argument: &Argument) -> Result<Self, ConstructionError> {
        Self::build("store_true", argument, Value::Bool(true), Some(false))
    }

    pub fn store_false(argument: &Argument) -> Result<Self, ConstructionError> {
        Self::build("store_false", argument, Value::Bool(false), Some(true))
    }

    fn build(
        kind: &'static str,
        argument: &Argument,
        constant: Value,
        implied_default: Option<bool>,
    ) -> Result<Self, ConstructionError> {
        require_no_nargs(kind, argument)?;
        let mut core = ActionCore::from_argument(argument);
        core.nargs = Some(Nargs::Exact(0));
        core.const_value = Some(constant);
        if let (DefaultValue::Unset, Some(flag)) = (&core.default, implied_default) {
            core.default = DefaultValue::Value(Value::Bool(flag));
        }
        Ok(Self { core, kind })
    }
}

impl Action for StoreConstAction {
    fn kind(&self) -> &'static str {
        self.kind
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
        let constant = self.core.const_value.clone().unwrap_or_default();
        namespace.set(self.core.dest.clone(), constant);
        Ok(())
    }

    fn clone_box(&self) -> Box<dyn Action> {
        Box::new(self.clone())
    }
}
