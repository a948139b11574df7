use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::argument::{Argument, Metavar};
use crate::error::{ArgumentError, ConstructionError, ParseError};
use crate::namespace::Namespace;
use crate::nargs::Nargs;
use crate::parser::{ArgumentParser, ParserSettings};
use crate::value::{UNRECOGNIZED_ARGS_ATTR, Value};

use super::{Action, ActionCore};

/// Builds the child parser for each subcommand.
pub type ParserFactory =
    Arc<dyn Fn(ParserSettings) -> Result<ArgumentParser, ConstructionError> + Send + Sync>;

/// Options for [`SubParsersAction::add_parser`].
#[derive(Debug, Clone, Default)]
pub struct SubparserOptions {
    pub aliases: Vec<String>,
    /// Help line shown in the parent's command listing. Commands without help
    /// are accepted but not listed.
    pub help: Option<String>,
    pub deprecated: bool,
    /// Settings for the child parser. `prog` defaults to
    /// `"<parent usage prefix> <name>"`.
    pub settings: ParserSettings,
}

impl SubparserOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_aliases<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.aliases = aliases.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    pub fn with_deprecated(mut self, deprecated: bool) -> Self {
        self.deprecated = deprecated;
        self
    }

    pub fn with_settings(mut self, settings: ParserSettings) -> Self {
        self.settings = settings;
        self
    }
}

/// Help-only entry listing one subcommand under the subcommands action.
#[derive(Debug, Clone)]
pub struct ChoicesPseudoAction {
    core: ActionCore,
}

impl ChoicesPseudoAction {
    fn new(name: &str, aliases: &[String], help: Option<String>) -> Self {
        let mut metavar = name.to_string();
        if !aliases.is_empty() {
            metavar = format!("{metavar} ({})", aliases.join(", "));
        }
        Self {
            core: ActionCore {
                dest: name.to_string(),
                help,
                metavar: Some(Metavar::Name(metavar)),
                ..ActionCore::default()
            },
        }
    }
}

impl Action for ChoicesPseudoAction {
    fn kind(&self) -> &'static str {
        "choice"
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
        _namespace: &mut Namespace,
        _values: Value,
        _option_string: Option<&str>,
    ) -> Result<(), ParseError> {
        Ok(())
    }

    fn clone_box(&self) -> Box<dyn Action> {
        Box::new(self.clone())
    }
}

/// Dispatches the remaining command line to a named child parser.
///
/// The first consumed string selects the child; everything after it is
/// parsed by the child into a fresh namespace whose entries are then copied
/// over the parent's. Strings the child does not recognize are collected
/// under [`UNRECOGNIZED_ARGS_ATTR`] for the parent to report.
#[derive(Clone)]
pub struct SubParsersAction {
    core: ActionCore,
    prog_prefix: String,
    factory: ParserFactory,
    parsers: Vec<ArgumentParser>,
    names: Vec<(String, usize)>,
    choices_actions: Vec<ChoicesPseudoAction>,
    deprecated: BTreeSet<String>,
}

impl SubParsersAction {
    pub fn new(argument: &Argument) -> Result<Self, ConstructionError> {
        let mut core = ActionCore::from_argument(argument);
        core.nargs = Some(Nargs::Parser);
        core.choices = Some(Vec::new());
        Ok(Self {
            core,
            prog_prefix: String::new(),
            factory: Arc::new(ArgumentParser::new),
            parsers: Vec::new(),
            names: Vec::new(),
            choices_actions: Vec::new(),
            deprecated: BTreeSet::new(),
        })
    }

    pub fn prog_prefix(&self) -> &str {
        &self.prog_prefix
    }

    pub fn set_prog_prefix(&mut self, prefix: impl Into<String>) {
        self.prog_prefix = prefix.into();
    }

    pub fn set_factory(&mut self, factory: ParserFactory) {
        self.factory = factory;
    }

    /// Registers a subcommand and returns its parser for further setup.
    pub fn add_parser(
        &mut self,
        name: &str,
        options: SubparserOptions,
    ) -> Result<&mut ArgumentParser, ConstructionError> {
        if self.index_of(name).is_some() {
            return Err(ConstructionError::ConflictingSubparser(name.to_string()));
        }
        for alias in &options.aliases {
            if alias == name || self.index_of(alias).is_some() {
                return Err(ConstructionError::ConflictingSubparserAlias(alias.clone()));
            }
        }

        let SubparserOptions {
            aliases,
            help,
            deprecated,
            mut settings,
        } = options;
        if settings.prog.is_none() {
            settings.prog = Some(format!("{} {name}", self.prog_prefix));
        }
        if help.is_some() {
            self.choices_actions
                .push(ChoicesPseudoAction::new(name, &aliases, help));
        }

        let parser = (self.factory)(settings)?;
        let index = self.parsers.len();
        self.parsers.push(parser);
        for key in std::iter::once(name.to_string()).chain(aliases) {
            if deprecated {
                self.deprecated.insert(key.clone());
            }
            self.core
                .choices
                .get_or_insert_with(Vec::new)
                .push(Value::Str(key.clone()));
            self.names.push((key, index));
        }
        debug!(command = name, prog_prefix = %self.prog_prefix, "registered subcommand parser");
        Ok(&mut self.parsers[index])
    }

    pub fn parser(&self, name: &str) -> Option<&ArgumentParser> {
        self.index_of(name).map(|i| &self.parsers[i])
    }

    pub fn parser_mut(&mut self, name: &str) -> Option<&mut ArgumentParser> {
        self.index_of(name).map(|i| &mut self.parsers[i])
    }

    /// Command names and aliases in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(|(name, _)| name.as_str())
    }

    fn index_of(&self, name: &str) -> Option<usize> {
        self.names
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, index)| *index)
    }
}

impl fmt::Debug for SubParsersAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubParsersAction")
            .field("core", &self.core)
            .field("prog_prefix", &self.prog_prefix)
            .field("names", &self.names)
            .field("deprecated", &self.deprecated)
            .finish_non_exhaustive()
    }
}

impl Action for SubParsersAction {
    fn kind(&self) -> &'static str {
        "parsers"
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
        namespace: &mut Namespace,
        values: Value,
        _option_string: Option<&str>,
    ) -> Result<(), ParseError> {
        let mut strings: Vec<String> = match values {
            Value::List(items) => items.iter().map(ToString::to_string).collect(),
            other => vec![other.to_string()],
        };
        if strings.is_empty() {
            return Err(ArgumentError::for_action(&self.core, "expected a command name").into());
        }
        let name = strings.remove(0);

        if !self.core.is_dest_suppressed() {
            namespace.set(self.core.dest.clone(), Value::Str(name.clone()));
        }

        let Some(child) = self.parser(&name) else {
            let choices: Vec<&str> = self.names().collect();
            return Err(ArgumentError::for_action(
                &self.core,
                format!("unknown parser '{name}' (choices: {})", choices.join(", ")),
            )
            .into());
        };
        if self.deprecated.contains(&name) {
            parser.warning(&format!("command '{name}' is deprecated"));
        }

        debug!(command = %name, args = strings.len(), "delegating to subcommand parser");
        let (child_namespace, leftovers) = child.parse_known_args(strings, None)?;
        for (dest, value) in child_namespace {
            namespace.set(dest, value);
        }
        if !leftovers.is_empty() {
            let mut unrecognized = match namespace.get(UNRECOGNIZED_ARGS_ATTR) {
                Some(Value::List(items)) => items.clone(),
                _ => Vec::new(),
            };
            unrecognized.extend(leftovers.into_iter().map(Value::Str));
            namespace.set(UNRECOGNIZED_ARGS_ATTR, Value::List(unrecognized));
        }
        Ok(())
    }

    fn subactions(&self) -> Vec<&dyn Action> {
        self.choices_actions
            .iter()
            .map(|action| action as &dyn Action)
            .collect()
    }

    fn as_subparsers(&self) -> Option<&SubParsersAction> {
        Some(self)
    }

    fn as_subparsers_mut(&mut self) -> Option<&mut SubParsersAction> {
        Some(self)
    }

    fn clone_box(&self) -> Box<dyn Action> {
        Box::new(self.clone())
    }
}
