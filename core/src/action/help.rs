use crate::argument::Argument;
use crate::error::{ConstructionError, ExitRequest, ParseError};
use crate::namespace::Namespace;
use crate::nargs::Nargs;
use crate::parser::ArgumentParser;
use crate::value::{DefaultValue, SUPPRESS, Value};

use super::{Action, ActionCore, require_no_nargs};

fn exit_action_core(kind: &str, argument: &Argument) -> Result<ActionCore, ConstructionError> {
    require_no_nargs(kind, argument)?;
    let mut core = ActionCore::from_argument(argument);
    core.nargs = Some(Nargs::Exact(0));
    if argument.dest.is_none() || argument.dest_inferred() {
        core.dest = SUPPRESS.to_string();
    }
    if core.default.is_unset() {
        core.default = DefaultValue::Suppress;
    }
    Ok(core)
}

/// Requests exit with the parser's full help text.
#[derive(Debug, Clone)]
pub struct HelpAction {
    core: ActionCore,
}

impl HelpAction {
    pub fn new(argument: &Argument) -> Result<Self, ConstructionError> {
        Ok(Self {
            core: exit_action_core("help", argument)?,
        })
    }
}

impl Action for HelpAction {
    fn kind(&self) -> &'static str {
        "help"
    }

    fn core(&self) -> &ActionCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ActionCore {
        &mut self.core
    }

    fn invoke(
        &self,
        parser: &ArgumentParser,
        _namespace: &mut Namespace,
        _values: Value,
        _option_string: Option<&str>,
    ) -> Result<(), ParseError> {
        Err(ParseError::Exit(ExitRequest::success(parser.format_help())))
    }

    fn clone_box(&self) -> Box<dyn Action> {
        Box::new(self.clone())
    }
}

/// Requests exit with a formatted version string.
#[derive(Debug, Clone)]
pub struct VersionAction {
    core: ActionCore,
    version: Option<String>,
}

impl VersionAction {
    pub fn new(argument: &Argument) -> Result<Self, ConstructionError> {
        let mut core = exit_action_core("version", argument)?;
        if core.help.is_none() {
            core.help = Some("show program's version number and exit".to_string());
        }
        Ok(Self {
            core,
            version: argument.version.clone(),
        })
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }
}

impl Action for VersionAction {
    fn kind(&self) -> &'static str {
        "version"
    }

    fn core(&self) -> &ActionCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ActionCore {
        &mut self.core
    }

    fn invoke(
        &self,
        parser: &ArgumentParser,
        _namespace: &mut Namespace,
        _values: Value,
        _option_string: Option<&str>,
    ) -> Result<(), ParseError> {
        let text = parser.format_version(self.version.as_deref().unwrap_or_default());
        Err(ParseError::Exit(ExitRequest::success(text)))
    }

    fn describe(&self) -> Vec<(&'static str, String)> {
        let mut fields = vec![("kind", self.kind().to_string())];
        fields.extend(self.core.describe());
        if let Some(version) = &self.version {
            fields.push(("version", version.clone()));
        }
        fields
    }

    fn clone_box(&self) -> Box<dyn Action> {
        Box::new(self.clone())
    }
}
