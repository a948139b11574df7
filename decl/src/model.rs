//! Serde models for declarative parser definitions.
//!
//! A definition mirrors the builder API: parser settings at the top level,
//! then arguments, groups, exclusive groups, and an optional subcommand
//! table whose entries are themselves full parser definitions.
//!
//! ```yaml
//! prog: vcs
//! description: A tiny version control front end.
//! version: "%(prog)s 0.3"
//! arguments:
//!   - flags: ["-v", "--verbose"]
//!     action: count
//! subcommands:
//!   dest: command
//!   required: true
//!   parsers:
//!     - name: clone
//!       help: copy a repository
//!       arguments:
//!         - flags: [repo]
//! ```

use std::collections::BTreeMap;

use argkit_core::{
    Argument, ArgumentParser, DefaultValue, Metavar, Nargs, ParserSettings, SubparserOptions,
    SubparsersOptions, Value,
};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A complete parser definition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserDecl {
    #[serde(flatten)]
    pub settings: ParserSettings,
    /// Adds a `--version` option printing this text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub defaults: BTreeMap<String, Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub arguments: Vec<ArgumentDecl>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<GroupDecl>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub exclusive: Vec<ExclusiveDecl>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subcommands: Option<SubcommandsDecl>,
}

/// One `add_argument` call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArgumentDecl {
    /// Option strings, or a single positional name.
    pub flags: Vec<String>,
    pub action: Option<String>,
    pub dest: Option<String>,
    pub nargs: Option<Nargs>,
    #[serde(rename = "const")]
    pub const_value: Option<Value>,
    pub default: DefaultValue,
    #[serde(rename = "type")]
    pub type_name: Option<String>,
    pub choices: Option<Vec<Value>>,
    pub required: Option<bool>,
    pub help: Option<String>,
    pub metavar: Option<Metavar>,
    pub deprecated: bool,
    pub version: Option<String>,
}

impl ArgumentDecl {
    pub fn to_argument(&self) -> Argument {
        let mut argument = Argument::new(self.flags.iter().cloned());
        argument.action = self.action.clone().unwrap_or_default();
        argument.dest = self.dest.clone();
        argument.nargs = self.nargs;
        argument.const_value = self.const_value.clone();
        argument.default = self.default.clone();
        argument.type_name = self.type_name.clone();
        argument.choices = self.choices.clone();
        argument.required = self.required;
        argument.help = self.help.clone();
        argument.metavar = self.metavar.clone();
        argument.deprecated = self.deprecated;
        argument.version = self.version.clone();
        argument
    }
}

/// A titled help section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupDecl {
    pub title: Option<String>,
    pub description: Option<String>,
    pub arguments: Vec<ArgumentDecl>,
    /// Exclusive groups whose members are listed in this section.
    pub exclusive: Vec<ExclusiveDecl>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExclusiveDecl {
    pub required: bool,
    pub arguments: Vec<ArgumentDecl>,
}

/// The subcommand table; maps onto `add_subparsers` plus one `add_parser`
/// per entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubcommandsDecl {
    pub title: Option<String>,
    pub description: Option<String>,
    pub dest: Option<String>,
    pub required: bool,
    pub help: Option<String>,
    pub metavar: Option<String>,
    pub parsers: Vec<CommandDecl>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandDecl {
    pub name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub help: Option<String>,
    #[serde(default)]
    pub deprecated: bool,
    #[serde(flatten)]
    pub parser: ParserDecl,
}

impl ParserDecl {
    /// Builds the described parser.
    pub fn build(&self) -> Result<ArgumentParser> {
        let mut parser = ArgumentParser::new(self.settings.clone())?;
        self.populate(&mut parser)?;
        Ok(parser)
    }

    fn populate(&self, parser: &mut ArgumentParser) -> Result<()> {
        if let Some(version) = &self.version {
            parser.add_argument(
                Argument::new(["--version"])
                    .with_action("version")
                    .with_version(version.clone()),
            )?;
        }
        for argument in &self.arguments {
            parser.add_argument(argument.to_argument())?;
        }
        for group in &self.groups {
            let mut section =
                parser.add_argument_group(group.title.as_deref(), group.description.as_deref());
            for argument in &group.arguments {
                section.add_argument(argument.to_argument())?;
            }
            for exclusive in &group.exclusive {
                let mut members = section.add_mutually_exclusive_group(exclusive.required);
                for argument in &exclusive.arguments {
                    members.add_argument(argument.to_argument())?;
                }
            }
        }
        for exclusive in &self.exclusive {
            let mut members = parser.add_mutually_exclusive_group(exclusive.required);
            for argument in &exclusive.arguments {
                members.add_argument(argument.to_argument())?;
            }
        }
        if !self.defaults.is_empty() {
            parser.set_defaults(self.defaults.clone());
        }

        let Some(subcommands) = &self.subcommands else {
            return Ok(());
        };
        parser.add_subparsers(SubparsersOptions {
            title: subcommands.title.clone(),
            description: subcommands.description.clone(),
            dest: subcommands.dest.clone(),
            required: subcommands.required,
            help: subcommands.help.clone(),
            metavar: subcommands.metavar.clone(),
            ..SubparsersOptions::default()
        })?;
        let Some(action) = parser.subparsers_mut() else {
            return Ok(());
        };
        for command in &subcommands.parsers {
            let options = SubparserOptions {
                aliases: command.aliases.clone(),
                help: command.help.clone(),
                deprecated: command.deprecated,
                settings: command.parser.settings.clone(),
            };
            let child = action.add_parser(&command.name, options)?;
            command.parser.populate(child)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use argkit_core::{ConflictHandler, ConstructionError};

    use crate::error::DeclError;

    const VCS: &str = r#"
prog: vcs
description: A tiny version control front end.
version: "%(prog)s 0.3"
arguments:
  - flags: ["-v", "--verbose"]
    action: count
    help: more output
subcommands:
  title: commands
  dest: command
  required: true
  parsers:
    - name: clone
      help: copy a repository
      arguments:
        - flags: [repo]
        - flags: ["--depth"]
          type: int
    - name: log
      aliases: [history]
      help: show history
      arguments:
        - flags: ["-n"]
          type: int
          default: 10
"#;

    fn vcs() -> ParserDecl {
        serde_yaml::from_str(VCS).unwrap()
    }

    #[test]
    fn test_deserialize_nested_commands() {
        let decl = vcs();
        assert_eq!(decl.settings.prog.as_deref(), Some("vcs"));
        assert!(decl.settings.add_help);
        assert_eq!(decl.arguments[0].action.as_deref(), Some("count"));
        let subcommands = decl.subcommands.as_ref().unwrap();
        assert_eq!(subcommands.parsers.len(), 2);
        assert_eq!(subcommands.parsers[1].aliases, vec!["history"]);
        assert_eq!(
            subcommands.parsers[1].parser.arguments[0].default,
            DefaultValue::Value(Value::Int(10))
        );
    }

    #[test]
    fn test_build_and_parse() {
        let parser = vcs().build().unwrap();
        let ns = parser
            .parse_args(["-vv", "clone", "--depth", "1", "git://host/repo"])
            .unwrap();
        assert_eq!(ns.get("verbose"), Some(&Value::Int(2)));
        assert_eq!(ns.get("command"), Some(&Value::from("clone")));
        assert_eq!(ns.get("depth"), Some(&Value::Int(1)));
        assert_eq!(ns.get("repo"), Some(&Value::from("git://host/repo")));

        let ns = parser.parse_args(["history"]).unwrap();
        assert_eq!(ns.get("command"), Some(&Value::from("history")));
        assert_eq!(ns.get("n"), Some(&Value::Int(10)));
    }

    #[test]
    fn test_version_option_is_added() {
        let parser = vcs().build().unwrap();
        let err = parser.parse_args(["--version"]).unwrap_err();
        let exit = err.exit_request().unwrap();
        assert!(exit.is_success());
        assert_eq!(exit.message, "vcs 0.3\n");
    }

    #[test]
    fn test_groups_and_exclusive_sections() {
        let decl: ParserDecl = serde_yaml::from_str(
            r#"
prog: fmt
conflict_handler: resolve
groups:
  - title: output
    exclusive:
      - arguments:
          - flags: ["--json"]
            action: store_true
          - flags: ["--yaml"]
            action: store_true
defaults:
  indent: 2
"#,
        )
        .unwrap();
        assert_eq!(decl.settings.conflict_handler, ConflictHandler::Resolve);

        let parser = decl.build().unwrap();
        assert_eq!(parser.format_usage(), "usage: fmt [-h] [--json | --yaml]\n");
        let help = parser.format_help();
        let section = help.find("\noutput:\n").unwrap();
        assert!(help[section..].contains("--json"));
        assert!(help[section..].contains("--yaml"));

        let ns = parser.parse_args(["--yaml"]).unwrap();
        assert_eq!(ns.get("yaml"), Some(&Value::Bool(true)));
        assert_eq!(ns.get("indent"), Some(&Value::Int(2)));
    }

    #[test]
    fn test_suppressed_default_and_metavar_tuple() {
        let decl: ParserDecl = serde_json::from_str(
            r#"{
                "prog": "plot",
                "arguments": [
                    {"flags": ["--point"], "nargs": 2, "metavar": ["X", "Y"], "type": "float"},
                    {"flags": ["--label"], "default": "==SUPPRESS=="}
                ]
            }"#,
        )
        .unwrap();
        let parser = decl.build().unwrap();
        assert_eq!(
            parser.format_usage(),
            "usage: plot [-h] [--point X Y] [--label LABEL]\n"
        );
        let ns = parser.parse_args(Vec::<String>::new()).unwrap();
        assert!(ns.get("label").is_none());
        assert_eq!(ns.get("point"), Some(&Value::Null));
    }

    #[test]
    fn test_construction_errors_surface() {
        let decl: ParserDecl = serde_yaml::from_str(
            r#"
arguments:
  - flags: ["--size"]
    nargs: 3
    metavar: [W, H]
"#,
        )
        .unwrap();
        assert!(matches!(
            decl.build(),
            Err(DeclError::Construction(ConstructionError::MetavarArity))
        ));
    }
}
