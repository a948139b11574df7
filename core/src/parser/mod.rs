//! The top-level [`ArgumentParser`].

mod parse;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::action::{Action, ParserFactory, SubParsersAction};
use crate::argument::{Argument, Metavar};
use crate::container::{
    ActionId, ActionsContainer, ConflictHandler, ExclusiveGroupId, GroupId, Placement,
};
use crate::convert::Converter;
use crate::error::{ConstructionError, ExitRequest};
use crate::formatter::{FormatterSettings, HelpFormatter, UsageGroup};
use crate::group::{ExclusiveGroupMut, GroupMut};
use crate::value::{DefaultValue, SUPPRESS, Value};

/// Program name used when none is configured.
pub const DEFAULT_PROG: &str = "prog";

/// Exit status for command-line errors.
pub const ERROR_STATUS: i32 = 2;

/// Parser-wide configuration.
///
/// Deserializable so that parsers can be declared in YAML or JSON; missing
/// fields take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserSettings {
    pub prog: Option<String>,
    /// Usage line overriding the generated one; `%(prog)s` is expanded.
    pub usage: Option<String>,
    pub description: Option<String>,
    pub epilog: Option<String>,
    pub prefix_chars: String,
    /// Default applied to every argument that does not set its own.
    pub argument_default: DefaultValue,
    pub conflict_handler: ConflictHandler,
    /// Add `-h/--help`.
    pub add_help: bool,
    /// Accept unambiguous prefixes of long options.
    pub allow_abbrev: bool,
    /// Turn argument errors into an exit request with status 2 and usage.
    pub exit_on_error: bool,
    pub formatter: FormatterSettings,
}

impl Default for ParserSettings {
    fn default() -> Self {
        Self {
            prog: None,
            usage: None,
            description: None,
            epilog: None,
            prefix_chars: "-".to_string(),
            argument_default: DefaultValue::Unset,
            conflict_handler: ConflictHandler::Error,
            add_help: true,
            allow_abbrev: true,
            exit_on_error: true,
            formatter: FormatterSettings::default(),
        }
    }
}

impl ParserSettings {
    pub fn new(prog: impl Into<String>) -> Self {
        Self {
            prog: Some(prog.into()),
            ..Self::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_epilog(mut self, epilog: impl Into<String>) -> Self {
        self.epilog = Some(epilog.into());
        self
    }

    pub fn with_usage(mut self, usage: impl Into<String>) -> Self {
        self.usage = Some(usage.into());
        self
    }

    pub fn with_conflict_handler(mut self, handler: ConflictHandler) -> Self {
        self.conflict_handler = handler;
        self
    }

    pub fn without_help(mut self) -> Self {
        self.add_help = false;
        self
    }
}

/// Options for [`ArgumentParser::add_subparsers`].
#[derive(Clone, Default)]
pub struct SubparsersOptions {
    /// Section title; when title or description is set the commands get
    /// their own help section.
    pub title: Option<String>,
    pub description: Option<String>,
    /// Namespace key for the chosen command name; suppressed when `None`.
    pub dest: Option<String>,
    pub required: bool,
    pub help: Option<String>,
    pub metavar: Option<String>,
    /// Prefix for child `prog` names; defaults to the parser's usage
    /// without the `usage: ` prefix and positionals after the command.
    pub prog: Option<String>,
    pub factory: Option<ParserFactory>,
}

impl SubparsersOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_dest(mut self, dest: impl Into<String>) -> Self {
        self.dest = Some(dest.into());
        self
    }

    pub fn with_required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    pub fn with_metavar(mut self, metavar: impl Into<String>) -> Self {
        self.metavar = Some(metavar.into());
        self
    }
}

/// Command-line parser: an [`ActionsContainer`] plus program metadata,
/// help rendering, and the parse loop.
///
/// # Examples
///
/// ```
/// use argkit_core::{Argument, ArgumentParser, Nargs, ParserSettings, Value};
///
/// let mut parser = ArgumentParser::new(ParserSettings::new("copy")).unwrap();
/// parser.add_argument(Argument::new(["-v", "--verbose"]).with_action("store_true")).unwrap();
/// parser.add_argument(Argument::new(["sources"]).with_nargs(Nargs::OneOrMore)).unwrap();
/// parser.add_argument(Argument::new(["target"])).unwrap();
///
/// let ns = parser.parse_args(["-v", "a.txt", "b.txt", "out/"]).unwrap();
/// assert_eq!(ns.get("verbose"), Some(&Value::Bool(true)));
/// assert_eq!(ns.get("target"), Some(&Value::from("out/")));
/// assert_eq!(
///     ns.get("sources"),
///     Some(&Value::List(vec![Value::from("a.txt"), Value::from("b.txt")]))
/// );
/// ```
#[derive(Debug, Clone)]
pub struct ArgumentParser {
    settings: ParserSettings,
    prog: String,
    container: ActionsContainer,
    subparsers: Option<ActionId>,
}

impl ArgumentParser {
    pub fn new(settings: ParserSettings) -> Result<Self, ConstructionError> {
        let Some(first_prefix) = settings.prefix_chars.chars().next() else {
            return Err(ConstructionError::EmptyPrefixChars);
        };
        let prog = settings
            .prog
            .clone()
            .unwrap_or_else(|| DEFAULT_PROG.to_string());
        let mut container = ActionsContainer::new(
            settings.prefix_chars.clone(),
            settings.argument_default.clone(),
            settings.conflict_handler,
        );
        container.install_default_groups("positional arguments", "options");

        if settings.add_help {
            let prefix = if settings.prefix_chars.contains('-') {
                '-'
            } else {
                first_prefix
            };
            container.add_argument(
                Argument::new([format!("{prefix}h"), format!("{prefix}{prefix}help")])
                    .with_action("help")
                    .with_suppressed_default()
                    .with_help("show this help message and exit"),
            )?;
        }

        Ok(Self {
            settings,
            prog,
            container,
            subparsers: None,
        })
    }

    pub fn prog(&self) -> &str {
        &self.prog
    }

    pub fn settings(&self) -> &ParserSettings {
        &self.settings
    }

    pub fn container(&self) -> &ActionsContainer {
        &self.container
    }

    pub fn container_mut(&mut self) -> &mut ActionsContainer {
        &mut self.container
    }

    pub fn add_argument(&mut self, argument: Argument) -> Result<ActionId, ConstructionError> {
        self.container.add_argument(argument)
    }

    pub fn add_argument_group(
        &mut self,
        title: Option<&str>,
        description: Option<&str>,
    ) -> GroupMut<'_> {
        self.container.add_argument_group(title, description)
    }

    pub fn group_mut(&mut self, id: GroupId) -> Option<GroupMut<'_>> {
        self.container.group_mut(id)
    }

    pub fn add_mutually_exclusive_group(&mut self, required: bool) -> ExclusiveGroupMut<'_> {
        self.container.add_mutually_exclusive_group(required)
    }

    pub fn exclusive_group_mut(&mut self, id: ExclusiveGroupId) -> Option<ExclusiveGroupMut<'_>> {
        self.container.exclusive_group_mut(id)
    }

    pub fn set_defaults<I, K, V>(&mut self, defaults: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        self.container.set_defaults(defaults);
    }

    pub fn get_default(&self, dest: &str) -> Option<Value> {
        self.container.get_default(dest)
    }

    /// Makes `converter` available as an argument `type`.
    pub fn register_type(&mut self, converter: Converter) {
        self.container.register_type(converter);
    }

    pub fn register_action<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn(&Argument) -> Result<Box<dyn Action>, ConstructionError> + Send + Sync + 'static,
    {
        self.container.register_action(name, factory);
    }

    /// Copies the arguments, groups, and defaults of `parent` into this
    /// parser.
    pub fn with_parent(&mut self, parent: &ArgumentParser) -> Result<(), ConstructionError> {
        self.container.add_container_actions(&parent.container)?;
        self.container.merge_defaults(parent.container.defaults());
        Ok(())
    }

    /// Adds the subcommands action. A parser can have at most one.
    pub fn add_subparsers(&mut self, options: SubparsersOptions) -> Result<ActionId, ConstructionError> {
        if self.subparsers.is_some() {
            return Err(ConstructionError::MultipleSubparsers);
        }

        let placement = if options.title.is_some() || options.description.is_some() {
            let title = options.title.as_deref().unwrap_or("subcommands");
            let group = self
                .container
                .add_argument_group(Some(title), options.description.as_deref())
                .id();
            Placement::Group(group)
        } else {
            Placement::Auto
        };

        let prog_prefix = match &options.prog {
            Some(prog) => prog.clone(),
            None => self.subcommand_prog_prefix(),
        };

        let mut argument = Argument::new(Vec::<String>::new())
            .with_action("parsers")
            .with_dest(options.dest.clone().unwrap_or_else(|| SUPPRESS.to_string()));
        argument.help = options.help.clone();
        argument.metavar = options.metavar.clone().map(Metavar::Name);
        let factory = self
            .container
            .registry()
            .action("parsers")
            .ok_or_else(|| ConstructionError::UnknownAction("parsers".to_string()))?;
        let mut action = factory(&argument)?;
        action.core_mut().required = options.required;
        let Some(subparsers) = action.as_subparsers_mut() else {
            return Err(ConstructionError::UnknownAction("parsers".to_string()));
        };
        subparsers.set_prog_prefix(prog_prefix);
        if let Some(factory) = options.factory {
            subparsers.set_factory(factory);
        }

        let id = self.container.add_action(action, placement)?;
        self.subparsers = Some(id);
        Ok(id)
    }

    /// Usage of this parser up to the subcommand: prog, optionals are
    /// omitted, positionals declared so far are kept.
    fn subcommand_prog_prefix(&self) -> String {
        let positionals: Vec<&dyn Action> = self
            .container
            .positionals()
            .into_iter()
            .map(|(_, action)| action)
            .collect();
        let mut formatter = self.formatter();
        formatter.add_usage(
            self.settings.usage.as_deref(),
            positionals,
            self.usage_groups(),
            Some(""),
        );
        formatter.format_help().trim().to_string()
    }

    pub fn subparsers(&self) -> Option<&SubParsersAction> {
        self.container
            .action(self.subparsers?)
            .and_then(|action| action.as_subparsers())
    }

    pub fn subparsers_mut(&mut self) -> Option<&mut SubParsersAction> {
        let id = self.subparsers?;
        self.container
            .action_mut(id)
            .and_then(|action| action.as_subparsers_mut())
    }

    pub fn formatter(&self) -> HelpFormatter<'_> {
        HelpFormatter::new(self.prog.clone(), &self.settings.formatter)
    }

    fn usage_groups(&self) -> Vec<UsageGroup<'_>> {
        self.container
            .exclusive_groups()
            .iter()
            .map(|group| UsageGroup {
                required: group.required(),
                actions: group
                    .action_ids()
                    .iter()
                    .filter_map(|id| self.container.action(*id))
                    .collect(),
            })
            .collect()
    }

    fn all_actions(&self) -> Vec<&dyn Action> {
        self.container.actions().map(|(_, action)| action).collect()
    }

    pub fn format_usage(&self) -> String {
        let mut formatter = self.formatter();
        formatter.add_usage(
            self.settings.usage.as_deref(),
            self.all_actions(),
            self.usage_groups(),
            None,
        );
        formatter.format_help()
    }

    pub fn format_help(&self) -> String {
        let mut formatter = self.formatter();
        formatter.add_usage(
            self.settings.usage.as_deref(),
            self.all_actions(),
            self.usage_groups(),
            None,
        );
        formatter.add_text(self.settings.description.as_deref());
        for group in self.container.groups() {
            formatter.start_section(group.title());
            formatter.add_text(group.description());
            formatter.add_arguments(
                group
                    .action_ids()
                    .iter()
                    .filter_map(|id| self.container.action(*id)),
            );
            formatter.end_section();
        }
        formatter.add_text(self.settings.epilog.as_deref());
        formatter.format_help()
    }

    /// Renders a version string, expanding `%(prog)s`.
    pub fn format_version(&self, version: &str) -> String {
        let mut formatter = self.formatter();
        formatter.add_text(Some(version));
        formatter.format_help()
    }

    /// Exit request for a command-line error: usage followed by
    /// `<prog>: error: <message>`, status 2, on stderr.
    pub fn error(&self, message: &str) -> ExitRequest {
        ExitRequest::failure(
            ERROR_STATUS,
            format!("{}{}: error: {message}\n", self.format_usage(), self.prog),
        )
    }

    /// Emits a user-facing warning through `tracing`.
    pub fn warning(&self, message: &str) {
        warn!(prog = %self.prog, "{}: warning: {message}", self.prog);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::SubparserOptions;
    use crate::container::ConflictHandler;

    #[test]
    fn test_new_parser_has_help_option() {
        let parser = ArgumentParser::new(ParserSettings::new("tool")).unwrap();
        assert!(parser.container().option_action("-h").is_some());
        assert!(parser.container().option_action("--help").is_some());

        let bare = ArgumentParser::new(ParserSettings::new("tool").without_help()).unwrap();
        assert!(bare.container().is_empty());
    }

    #[test]
    fn test_help_uses_first_prefix_char_without_dash() {
        let settings = ParserSettings {
            prefix_chars: "+/".to_string(),
            ..ParserSettings::new("tool")
        };
        let parser = ArgumentParser::new(settings).unwrap();
        assert!(parser.container().option_action("+h").is_some());
        assert!(parser.container().option_action("++help").is_some());
    }

    #[test]
    fn test_empty_prefix_chars_rejected() {
        let settings = ParserSettings {
            prefix_chars: String::new(),
            ..ParserSettings::default()
        };
        assert_eq!(
            ArgumentParser::new(settings).unwrap_err(),
            ConstructionError::EmptyPrefixChars
        );
    }

    #[test]
    fn test_usage_starts_with_prog() {
        let mut parser = ArgumentParser::new(ParserSettings::new("tool")).unwrap();
        parser.add_argument(Argument::new(["input"])).unwrap();
        assert_eq!(parser.format_usage(), "usage: tool [-h] input\n");
    }

    #[test]
    fn test_error_renders_usage_and_message() {
        let parser = ArgumentParser::new(ParserSettings::new("tool")).unwrap();
        let request = parser.error("bad things");
        assert_eq!(request.status, 2);
        assert_eq!(request.message, "usage: tool [-h]\ntool: error: bad things\n");
    }

    #[test]
    fn test_only_one_subparsers_action() {
        let mut parser = ArgumentParser::new(ParserSettings::new("tool")).unwrap();
        parser.add_subparsers(SubparsersOptions::new()).unwrap();
        assert!(matches!(
            parser.add_subparsers(SubparsersOptions::new()),
            Err(ConstructionError::MultipleSubparsers)
        ));
    }

    #[test]
    fn test_subcommand_prog_includes_positionals() {
        let mut parser = ArgumentParser::new(ParserSettings::new("tool")).unwrap();
        parser.add_argument(Argument::new(["-q"]).with_action("store_true")).unwrap();
        parser.add_argument(Argument::new(["repo"])).unwrap();
        parser.add_subparsers(SubparsersOptions::new()).unwrap();
        let child = parser
            .subparsers_mut()
            .unwrap()
            .add_parser("push", SubparserOptions::new())
            .unwrap();
        assert_eq!(child.prog(), "tool repo push");
    }

    #[test]
    fn test_with_parent_copies_arguments_and_defaults() {
        let mut parent = ArgumentParser::new(ParserSettings::new("base").without_help()).unwrap();
        parent.add_argument(Argument::new(["--config"])).unwrap();
        parent.set_defaults([("mode", "fast")]);

        let mut child = ArgumentParser::new(ParserSettings::new("tool")).unwrap();
        child.with_parent(&parent).unwrap();
        assert!(child.container().option_action("--config").is_some());
        assert_eq!(child.get_default("mode"), Some(Value::from("fast")));
    }

    #[test]
    fn test_with_parent_keeps_child_action_defaults() {
        let mut parent = ArgumentParser::new(ParserSettings::new("base").without_help()).unwrap();
        parent.set_defaults([("level", 9)]);

        let mut child = ArgumentParser::new(ParserSettings::new("tool")).unwrap();
        child
            .add_argument(Argument::new(["--level"]).with_type("int").with_default(1))
            .unwrap();
        child.with_parent(&parent).unwrap();

        let (_, level) = child.container().option_action("--level").unwrap();
        assert_eq!(level.core().default, DefaultValue::Value(Value::Int(1)));
        assert_eq!(child.get_default("level"), Some(Value::Int(1)));
        let ns = child.parse_args(Vec::<String>::new()).unwrap();
        assert_eq!(ns.get("level"), Some(&Value::Int(1)));
    }

    #[test]
    fn test_with_parent_conflicting_help_requires_resolve() {
        let parent = ArgumentParser::new(ParserSettings::new("base")).unwrap();
        let mut child = ArgumentParser::new(ParserSettings::new("tool")).unwrap();
        assert!(child.with_parent(&parent).is_err());

        let mut resolving = ArgumentParser::new(
            ParserSettings::new("tool").with_conflict_handler(ConflictHandler::Resolve),
        )
        .unwrap();
        resolving.with_parent(&parent).unwrap();
        assert!(resolving.container().option_action("-h").is_some());
    }
}
