//! Actions: what happens when an argument is matched on the command line.
//!
//! Every action shares an [`ActionCore`] describing its option strings,
//! destination, arity, and help metadata, and implements [`Action::invoke`]
//! to mutate the [`Namespace`]. The built-in variants cover the classic
//! set:
//!
//! | Registry key       | Type                    | Effect                                 |
//! |--------------------|-------------------------|----------------------------------------|
//! | `store` (or empty) | [`StoreAction`]         | stores the converted value             |
//! | `store_const`      | [`StoreConstAction`]    | stores the constant                    |
//! | `store_true`       | [`StoreConstAction`]    | stores `True`, defaults to `False`     |
//! | `store_false`      | [`StoreConstAction`]    | stores `False`, defaults to `True`     |
//! | `append`           | [`AppendAction`]        | appends the value to a copied list     |
//! | `append_const`     | [`AppendConstAction`]   | appends the constant                   |
//! | `extend`           | [`ExtendAction`]        | splices the values into a copied list  |
//! | `count`            | [`CountAction`]         | increments a counter                   |
//! | `help`             | [`HelpAction`]          | requests exit with the help text       |
//! | `version`          | [`VersionAction`]       | requests exit with the version text    |
//! | `parsers`          | [`SubParsersAction`]    | delegates to a named child parser      |
//! | `boolean_optional` | [`BooleanOptionalAction`] | `--x` / `--no-x` pair                |

mod append;
mod boolean;
mod count;
mod help;
mod store;
mod subparsers;

use std::fmt;

pub use append::{AppendAction, AppendConstAction, ExtendAction};
pub use boolean::BooleanOptionalAction;
pub use count::CountAction;
pub use help::{HelpAction, VersionAction};
pub use store::{StoreAction, StoreConstAction};
pub use subparsers::{ChoicesPseudoAction, ParserFactory, SubParsersAction, SubparserOptions};

use crate::argument::{Argument, Metavar};
use crate::convert::Converter;
use crate::error::{ArgumentError, ConstructionError, ParseError};
use crate::namespace::Namespace;
use crate::nargs::Nargs;
use crate::parser::ArgumentParser;
use crate::value::{DefaultValue, SUPPRESS, Value};

/// Fields shared by every action.
#[derive(Debug, Clone, Default)]
pub struct ActionCore {
    pub option_strings: Vec<String>,
    pub dest: String,
    /// `None` means a single value stored unwrapped.
    pub nargs: Option<Nargs>,
    pub const_value: Option<Value>,
    pub default: DefaultValue,
    pub converter: Option<Converter>,
    pub choices: Option<Vec<Value>>,
    pub required: bool,
    pub help: Option<String>,
    pub metavar: Option<Metavar>,
    pub deprecated: bool,
}

impl ActionCore {
    pub fn from_argument(argument: &Argument) -> Self {
        Self {
            option_strings: argument.option_strings.clone(),
            dest: argument.dest.clone().unwrap_or_default(),
            nargs: argument.nargs,
            const_value: argument.const_value.clone(),
            default: argument.default.clone(),
            converter: argument.converter.clone(),
            choices: argument.choices.clone(),
            required: argument.required.unwrap_or(false),
            help: argument.help.clone(),
            metavar: argument.metavar.clone(),
            deprecated: argument.deprecated,
        }
    }

    pub fn is_positional(&self) -> bool {
        self.option_strings.is_empty()
    }

    /// Whether the action consumes no command-line strings.
    pub fn takes_no_values(&self) -> bool {
        self.nargs == Some(Nargs::Exact(0))
    }

    pub fn is_help_suppressed(&self) -> bool {
        self.help.as_deref() == Some(SUPPRESS)
    }

    pub fn is_dest_suppressed(&self) -> bool {
        self.dest == SUPPRESS
    }

    /// Keyword listing used when describing an action.
    pub fn describe(&self) -> Vec<(&'static str, String)> {
        let mut fields = vec![
            ("option_strings", format!("{:?}", self.option_strings)),
            ("dest", self.dest.clone()),
            (
                "nargs",
                self.nargs.map_or_else(|| "None".to_string(), |n| n.to_string()),
            ),
            (
                "const",
                self.const_value
                    .as_ref()
                    .map_or_else(|| "None".to_string(), Value::repr),
            ),
            ("default", self.default.to_string()),
            (
                "type",
                self.converter
                    .as_ref()
                    .map_or_else(|| "None".to_string(), |c| c.name().to_string()),
            ),
        ];
        if let Some(choices) = &self.choices {
            fields.push(("choices", Value::List(choices.clone()).to_string()));
        }
        fields.push(("required", Value::Bool(self.required).to_string()));
        fields.push(("help", self.help.clone().unwrap_or_else(|| "None".into())));
        if let Some(metavar) = &self.metavar {
            fields.push(("metavar", metavar.parts(1).join(", ")));
        }
        if self.deprecated {
            fields.push(("deprecated", "True".to_string()));
        }
        fields
    }
}

/// Behavior attached to a declared argument.
///
/// Implementations are constructed by factories registered in the action
/// registry and owned by an actions container. `invoke` receives the parser
/// that matched the action so that help, version, and subcommand actions can
/// reach the formatter and child parsers.
pub trait Action: fmt::Debug + Send + Sync {
    /// Registry-style name of the variant, used in descriptions.
    fn kind(&self) -> &'static str;

    fn core(&self) -> &ActionCore;

    fn core_mut(&mut self) -> &mut ActionCore;

    fn invoke(
        &self,
        parser: &ArgumentParser,
        namespace: &mut Namespace,
        values: Value,
        option_string: Option<&str>,
    ) -> Result<(), ParseError>;

    fn describe(&self) -> Vec<(&'static str, String)> {
        let mut fields = vec![("kind", self.kind().to_string())];
        fields.extend(self.core().describe());
        fields
    }

    /// Text shown in usage for an optional that takes no values.
    fn format_usage(&self) -> String {
        self.core()
            .option_strings
            .first()
            .cloned()
            .unwrap_or_default()
    }

    /// Nested entries listed under this action in help output.
    fn subactions(&self) -> Vec<&dyn Action> {
        Vec::new()
    }

    fn as_subparsers(&self) -> Option<&SubParsersAction> {
        None
    }

    fn as_subparsers_mut(&mut self) -> Option<&mut SubParsersAction> {
        None
    }

    fn clone_box(&self) -> Box<dyn Action>;
}

impl Clone for Box<dyn Action> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// Name used to refer to an action in error messages.
///
/// Option strings joined with `/`, then the metavar, then the destination,
/// then the choices rendered as `{a,b}`.
pub fn action_name(core: &ActionCore) -> Option<String> {
    if !core.option_strings.is_empty() {
        return Some(core.option_strings.join("/"));
    }
    match &core.metavar {
        Some(Metavar::Name(name)) if name != SUPPRESS => return Some(name.clone()),
        Some(Metavar::Tuple(names)) => {
            let paired = names.len() == 2
                && matches!(core.nargs, Some(Nargs::ZeroOrMore) | Some(Nargs::OneOrMore));
            return Some(if paired {
                format!("{}[, {}]", names[0], names[1])
            } else {
                names.join(", ")
            });
        }
        _ => {}
    }
    if !core.dest.is_empty() && !core.is_dest_suppressed() {
        return Some(core.dest.clone());
    }
    core.choices.as_ref().map(|choices| choices_label(choices))
}

/// `{a,b,c}` rendering of a choice list.
pub(crate) fn choices_label(choices: &[Value]) -> String {
    let names: Vec<String> = choices.iter().map(ToString::to_string).collect();
    format!("{{{}}}", names.join(","))
}

/// Rejects an explicit arity on actions whose arity is fixed at zero.
pub(crate) fn require_no_nargs(kind: &str, argument: &Argument) -> Result<(), ConstructionError> {
    match argument.nargs {
        None | Some(Nargs::Exact(0)) => Ok(()),
        Some(other) => Err(ConstructionError::InvalidNargsForAction {
            action: kind.to_string(),
            nargs: other.to_string(),
        }),
    }
}

/// Arity checks shared by actions that consume values.
pub(crate) fn check_value_arity(
    kind: &str,
    core: &ActionCore,
    hint: &'static str,
) -> Result<(), ConstructionError> {
    if core.nargs == Some(Nargs::Exact(0)) {
        return Err(ConstructionError::ZeroNargsStore {
            action: kind.to_string(),
            hint,
        });
    }
    if core.const_value.is_some() && core.nargs != Some(Nargs::Optional) {
        return Err(ConstructionError::ConstRequiresOptional);
    }
    Ok(())
}

/// Current list stored at the action's dest, copied so the caller owns the
/// result. A non-list value already stored there is an error.
pub(crate) fn copied_items(
    namespace: &Namespace,
    core: &ActionCore,
) -> Result<Vec<Value>, ArgumentError> {
    match namespace.get(&core.dest) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::List(items)) => Ok(items.clone()),
        Some(other) => Err(ArgumentError::for_action(
            core,
            format!("cannot append to non-list value {}", other.repr()),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn core_with(option_strings: &[&str], dest: &str) -> ActionCore {
        ActionCore {
            option_strings: option_strings.iter().map(|s| s.to_string()).collect(),
            dest: dest.to_string(),
            ..ActionCore::default()
        }
    }

    #[test]
    fn test_action_name_prefers_option_strings() {
        let core = core_with(&["-f", "--foo"], "foo");
        assert_eq!(action_name(&core).as_deref(), Some("-f/--foo"));
    }

    #[test]
    fn test_action_name_falls_back_to_metavar_then_dest_then_choices() {
        let mut core = core_with(&[], "file");
        assert_eq!(action_name(&core).as_deref(), Some("file"));

        core.metavar = Some(Metavar::from("PATH"));
        assert_eq!(action_name(&core).as_deref(), Some("PATH"));

        core.metavar = Some(Metavar::tuple(["A", "B"]));
        core.nargs = Some(Nargs::OneOrMore);
        assert_eq!(action_name(&core).as_deref(), Some("A[, B]"));

        let mut command = core_with(&[], SUPPRESS);
        command.choices = Some(vec![Value::from("build"), Value::from("test")]);
        assert_eq!(action_name(&command).as_deref(), Some("{build,test}"));

        command.choices = None;
        assert_eq!(action_name(&command), None);
    }

    #[test]
    fn test_copied_items_never_aliases_namespace() {
        let mut ns = Namespace::new();
        ns.set("items", Value::List(vec![Value::Int(1)]));
        let core = core_with(&["--item"], "items");
        let mut items = copied_items(&ns, &core).unwrap();
        items.push(Value::Int(2));
        assert_eq!(ns.get("items"), Some(&Value::List(vec![Value::Int(1)])));
    }

    #[test]
    fn test_copied_items_rejects_scalar_dest() {
        let mut ns = Namespace::new();
        ns.set("items", "solo");
        let core = core_with(&["--item"], "items");
        assert_eq!(
            copied_items(&ns, &core).unwrap_err().to_string(),
            "argument --item: cannot append to non-list value 'solo'"
        );
    }
}
