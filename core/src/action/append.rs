use crate::argument::Argument;
use crate::error::{ArgumentError, ConstructionError, ParseError};
use crate::namespace::Namespace;
use crate::nargs::Nargs;
use crate::parser::ArgumentParser;
use crate::value::Value;

use super::{Action, ActionCore, check_value_arity, copied_items, require_no_nargs};

/// Appends each occurrence's value to a list.
///
/// The list at the destination is copied before appending, so a list
/// default is never mutated by a parse.
#[derive(Debug, Clone)]
pub struct AppendAction {
    core: ActionCore,
}

impl AppendAction {
    pub fn new(argument: &Argument) -> Result<Self, ConstructionError> {
        let core = ActionCore::from_argument(argument);
        check_value_arity(
            "append",
            &core,
            "if arg strings are not supplying the value to append, the append_const action may be more appropriate",
        )?;
        Ok(Self { core })
    }
}

impl Action for AppendAction {
    fn kind(&self) -> &'static str {
        "append"
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
        let mut items = copied_items(namespace, &self.core)?;
        items.push(values);
        namespace.set(self.core.dest.clone(), Value::List(items));
        Ok(())
    }

    fn clone_box(&self) -> Box<dyn Action> {
        Box::new(self.clone())
    }
}

/// Appends a fixed constant; consumes no values.
#[derive(Debug, Clone)]
pub struct AppendConstAction {
    core: ActionCore,
}

impl AppendConstAction {
    pub fn new(argument: &Argument) -> Result<Self, ConstructionError> {
        require_no_nargs("append_const", argument)?;
        let mut core = ActionCore::from_argument(argument);
        core.nargs = Some(Nargs::Exact(0));
        core.const_value = Some(argument.const_value.clone().unwrap_or_default());
        Ok(Self { core })
    }
}

impl Action for AppendConstAction {
    fn kind(&self) -> &'static str {
        "append_const"
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
        let mut items = copied_items(namespace, &self.core)?;
        items.push(self.core.const_value.clone().unwrap_or_default());
        namespace.set(self.core.dest.clone(), Value::List(items));
        Ok(())
    }

    fn clone_box(&self) -> Box<dyn Action> {
        Box::new(self.clone())
    }
}

/// Splices each occurrence's values into a list.
#[derive(Debug, Clone)]
pub struct ExtendAction {
    core: ActionCore,
}

impl ExtendAction {
    pub fn new(argument: &Argument) -> Result<Self, ConstructionError> {
        let core = ActionCore::from_argument(argument);
        check_value_arity(
            "extend",
            &core,
            "if arg strings are not supplying the value to append, the append_const action may be more appropriate",
        )?;
        Ok(Self { core })
    }
}

impl Action for ExtendAction {
    fn kind(&self) -> &'static str {
        "extend"
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
        let Value::List(values) = values else {
            return Err(ArgumentError::for_action(
                &self.core,
                format!("cannot extend with non-sequence value {}", values.repr()),
            )
            .into());
        };
        let mut items = copied_items(namespace, &self.core)?;
        items.extend(values);
        namespace.set(self.core.dest.clone(), Value::List(items));
        Ok(())
    }

    fn clone_box(&self) -> Box<dyn Action> {
        Box::new(self.clone())
    }
}
