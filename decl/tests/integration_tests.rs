use std::io::Write;
use std::path::Path;

use argkit_core::Value;
use argkit_decl::{DeclError, ParserDecl};

const DEPLOY_YAML: &str = r#"
prog: deploy
description: Ship a build to an environment.
epilog: Environments are configured in deploy.toml.
arguments:
  - flags: ["-n", "--dry-run"]
    action: store_true
    help: print the plan only
  - flags: [environment]
    choices: [staging, production]
    help: target environment
  - flags: [services]
    nargs: "*"
    help: "services to deploy (default: all)"
"#;

fn write_file(dir: &Path, name: &str, contents: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    let mut f = std::fs::File::create(&path).unwrap();
    f.write_all(contents.as_bytes()).unwrap();
    f.flush().unwrap();
    path
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

#[test]
fn test_load_yaml_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(dir.path(), "deploy.yaml", DEPLOY_YAML);

    let parser = ParserDecl::load(&path).unwrap().build().unwrap();
    assert_eq!(
        parser.format_usage(),
        "usage: deploy [-h] [-n] {staging,production} [services ...]\n"
    );

    let ns = parser.parse_args(["-n", "staging", "api", "web"]).unwrap();
    assert_eq!(ns.get("dry_run"), Some(&Value::Bool(true)));
    assert_eq!(ns.get("environment"), Some(&Value::from("staging")));
    assert_eq!(
        ns.get("services"),
        Some(&Value::List(vec![Value::from("api"), Value::from("web")]))
    );
}

#[test]
fn test_load_json_file_matches_yaml() {
    let dir = tempfile::tempdir().unwrap();
    let yaml = ParserDecl::from_yaml_str(DEPLOY_YAML).unwrap();
    let path = write_file(dir.path(), "deploy.json", &yaml.to_json_string().unwrap());

    let json = ParserDecl::load(&path).unwrap();
    assert_eq!(json, yaml);
}

#[test]
fn test_load_errors() {
    let dir = tempfile::tempdir().unwrap();

    let missing = ParserDecl::load(dir.path().join("absent.yaml"));
    assert!(matches!(missing, Err(DeclError::IoError(_))));

    let toml = write_file(dir.path(), "cli.toml", "prog = 'x'\n");
    let err = ParserDecl::load(&toml).unwrap_err();
    assert!(matches!(err, DeclError::UnsupportedFormat(_)));
    assert!(err.to_string().starts_with("unsupported definition format: "));
}

// ---------------------------------------------------------------------------
// Behavior of built parsers
// ---------------------------------------------------------------------------

#[test]
fn test_choice_error_reaches_exit_request() {
    let parser = ParserDecl::from_yaml_str(DEPLOY_YAML).unwrap().build().unwrap();
    let err = parser.parse_args(["qa"]).unwrap_err();
    let exit = err.exit_request().unwrap();
    assert_eq!(exit.status, 2);
    assert!(exit.message.ends_with(
        "deploy: error: argument environment: invalid choice: 'qa' (choose from staging, production)\n"
    ));
}

#[test]
fn test_duplicate_option_is_a_definition_error() {
    let decl = ParserDecl::from_yaml_str(
        r#"
prog: tool
arguments:
  - flags: ["--out"]
  - flags: ["--out"]
"#,
    )
    .unwrap();
    let err = decl.build().unwrap_err();
    assert!(matches!(err, DeclError::Construction(_)));
    assert!(err.to_string().starts_with("invalid parser definition: "));
}

#[test]
fn test_settings_without_help() {
    let parser = ParserDecl::from_yaml_str(
        r#"
prog: tool
add_help: false
exit_on_error: false
arguments:
  - flags: [input]
"#,
    )
    .unwrap()
    .build()
    .unwrap();
    assert_eq!(parser.format_usage(), "usage: tool input\n");
    assert_eq!(
        parser.parse_args(["-h"]).unwrap_err().to_string(),
        "the following arguments are required: input"
    );
}
