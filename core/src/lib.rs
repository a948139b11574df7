//! Building blocks for argparse-style command-line parsers.
//!
//! This crate models a command line as a set of declared arguments and
//! interprets argument vectors against them:
//!
//! - [`Argument`]: the input to `add_argument` (option strings, action,
//!   arity ([`Nargs`]), default, type, choices, help metadata).
//! - [`Action`]: the behavior attached to an argument. Built-in variants
//!   store, count, append, extend, print help or version, and dispatch to
//!   subcommands; new ones are added through the [`Registry`].
//! - [`ActionsContainer`]: owns actions, groups, and defaults, and resolves
//!   option-string conflicts.
//! - [`HelpFormatter`]: renders usage and help text.
//! - [`ArgumentParser`]: ties everything together and parses into a
//!   [`Namespace`].
//!
//! Parsing never terminates the process. Help, version, and usage errors
//! come back as [`ParseError::Exit`] carrying an [`ExitRequest`] for the
//! caller to honor.
//!
//! # Example
//!
//! ```
//! use argkit_core::*;
//!
//! let mut parser = ArgumentParser::new(
//!     ParserSettings::new("fetch").with_description("Download files."),
//! )
//! .unwrap();
//! parser
//!     .add_argument(Argument::new(["-j", "--jobs"]).with_type("int").with_default(1))
//!     .unwrap();
//! parser.add_argument(Argument::new(["url"]).with_help("where to fetch from")).unwrap();
//!
//! let ns = parser.parse_args(["-j", "4", "https://example.com"]).unwrap();
//! assert_eq!(ns.get("jobs"), Some(&Value::Int(4)));
//! assert_eq!(ns.get("url"), Some(&Value::from("https://example.com")));
//!
//! let err = parser.parse_args(["--jobs", "many", "x"]).unwrap_err();
//! let exit = err.exit_request().unwrap();
//! assert_eq!(exit.status, 2);
//! assert!(exit.message.ends_with("fetch: error: argument -j/--jobs: invalid int value: 'many'\n"));
//! ```

pub mod action;
mod argument;
mod container;
mod convert;
mod error;
pub mod formatter;
mod group;
mod namespace;
mod nargs;
mod parser;
mod registry;
mod value;

pub use action::{
    Action, ActionCore, AppendAction, AppendConstAction, BooleanOptionalAction,
    ChoicesPseudoAction, CountAction, ExtendAction, HelpAction, ParserFactory, StoreAction,
    StoreConstAction, SubParsersAction, SubparserOptions, VersionAction, action_name,
};
pub use argument::{Argument, Metavar};
pub use container::{ActionId, ActionsContainer, ConflictHandler, ExclusiveGroupId, GroupId};
pub use convert::Converter;
pub use error::{
    ArgumentError, ArgumentTypeError, ConstructionError, ExitRequest, OutputStream, ParseError,
};
pub use formatter::{
    DEFAULT_TERMINAL_WIDTH, FormatterSettings, HelpFormatter, HelpStyle, TextMode, UsageGroup,
    expand_placeholders, wrap,
};
pub use group::{ArgumentGroup, ExclusiveGroupMut, GroupMut, MutuallyExclusiveGroup};
pub use namespace::Namespace;
pub use nargs::Nargs;
pub use parser::{ArgumentParser, DEFAULT_PROG, ERROR_STATUS, ParserSettings, SubparsersOptions};
pub use registry::{ActionFactory, Registry};
pub use value::{DefaultValue, SUPPRESS, UNRECOGNIZED_ARGS_ATTR, Value};
