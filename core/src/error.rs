//! Error types for parser construction and argument parsing.
//!
//! Construction problems (bad option strings, conflicting registrations,
//! invalid arity) surface as [`ConstructionError`] when an argument is
//! added. Problems with the command line itself surface as
//! [`ArgumentError`], and requests to terminate the program (help, version,
//! usage errors) as [`ExitRequest`]. [`ParseError`] carries either of the
//! latter two out of a parse.

use std::fmt;

use thiserror::Error;

use crate::action::{ActionCore, action_name};

/// Errors raised while declaring arguments, groups, or subcommands.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConstructionError {
    /// An option string does not start with one of the prefix characters.
    #[error("invalid option string '{option}': must start with a character '{prefix_chars}'")]
    InvalidOptionString {
        option: String,
        prefix_chars: String,
    },

    #[error("dest supplied twice for positional argument '{0}'")]
    DestSuppliedTwice(String),

    #[error("'required' is an invalid argument for positionals")]
    RequiredOnPositional,

    #[error("dest= is required for options like '{0}'")]
    MissingDest(String),

    /// A positional argument would consume no strings.
    #[error("action '{0}' is not valid for positional arguments")]
    ZeroNargsPositional(String),

    #[error("unknown action '{0}'")]
    UnknownAction(String),

    #[error("'{0}' is not callable")]
    UnknownType(String),

    #[error("invalid conflict_resolution value: '{0}'")]
    InvalidConflictHandler(String),

    #[error("invalid nargs value: '{0}'")]
    InvalidNargs(String),

    #[error("nargs for {action} actions must be != 0; {hint}")]
    ZeroNargsStore { action: String, hint: &'static str },

    #[error("nargs must be '?' to supply const")]
    ConstRequiresOptional,

    /// An action with fixed arity was given an explicit `nargs`.
    #[error("{action} action does not accept nargs {nargs}")]
    InvalidNargsForAction { action: String, nargs: String },

    #[error("length of metavar tuple does not match nargs")]
    MetavarArity,

    #[error(
        "argument {argument}: conflicting option string{}: {}",
        plural_suffix(.options),
        join_options(.options)
    )]
    ConflictingOptionStrings {
        argument: String,
        options: Vec<String>,
    },

    #[error("conflicting subparser: {0}")]
    ConflictingSubparser(String),

    #[error("conflicting subparser alias: {0}")]
    ConflictingSubparserAlias(String),

    #[error("cannot merge actions - two groups are named '{0}'")]
    DuplicateGroupTitle(String),

    #[error("invalid option name '{0}' for boolean_optional action")]
    InvalidBooleanOption(String),

    #[error("mutually exclusive arguments must be optional")]
    RequiredInExclusiveGroup,

    #[error("cannot have multiple subparser arguments")]
    MultipleSubparsers,

    #[error("prefix_chars must contain at least one character")]
    EmptyPrefixChars,
}

fn plural_suffix(options: &[String]) -> &'static str {
    if options.len() == 1 { "" } else { "s" }
}

fn join_options(options: &[String]) -> String {
    options.join(", ")
}

/// A command-line string could not be matched, converted, or accepted.
///
/// Messages are prefixed with the offending argument's name when one is
/// known: `argument -f/--foo: expected one argument`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgumentError {
    argument_name: Option<String>,
    message: String,
}

impl ArgumentError {
    /// Error attributed to the action described by `core`.
    pub fn for_action(core: &ActionCore, message: impl Into<String>) -> Self {
        Self {
            argument_name: action_name(core),
            message: message.into(),
        }
    }

    /// Error with no associated argument.
    pub fn bare(message: impl Into<String>) -> Self {
        Self {
            argument_name: None,
            message: message.into(),
        }
    }

    pub fn argument_name(&self) -> Option<&str> {
        self.argument_name.as_deref()
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ArgumentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.argument_name {
            Some(name) => write!(f, "argument {name}: {}", self.message),
            None => f.write_str(&self.message),
        }
    }
}

impl std::error::Error for ArgumentError {}

/// Failure reported by a type converter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArgumentTypeError {
    /// Message shown to the user verbatim.
    #[error("{0}")]
    Message(String),

    /// Generic rejection; rendered as `invalid <type> value: '<raw>'`.
    #[error("invalid value")]
    Invalid,
}

/// Output stream an [`ExitRequest`] should be written to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStream {
    Stdout,
    Stderr,
}

/// Request to print a message and terminate with a status code.
///
/// The library never exits the process itself; callers decide how to honor
/// the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExitRequest {
    pub status: i32,
    pub message: String,
    pub stream: OutputStream,
}

impl ExitRequest {
    /// Successful exit printing `message` to stdout (help, version).
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            status: 0,
            message: message.into(),
            stream: OutputStream::Stdout,
        }
    }

    /// Failing exit printing `message` to stderr.
    pub fn failure(status: i32, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            stream: OutputStream::Stderr,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == 0
    }
}

/// Outcome of a parse that did not produce a namespace.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("{}", describe_exit(.0))]
    Exit(ExitRequest),

    #[error(transparent)]
    Argument(#[from] ArgumentError),
}

fn describe_exit(request: &ExitRequest) -> String {
    format!("exit requested with status {}", request.status)
}

impl ParseError {
    /// The exit request, if parsing asked the program to terminate.
    pub fn exit_request(&self) -> Option<&ExitRequest> {
        match self {
            ParseError::Exit(request) => Some(request),
            ParseError::Argument(_) => None,
        }
    }
}
