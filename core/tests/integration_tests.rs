use argkit_core::*;

fn fetch_parser() -> ArgumentParser {
    let mut parser = ArgumentParser::new(
        ParserSettings::new("fetch")
            .with_description("Download files from a mirror.")
            .with_epilog("See the manual for details."),
    )
    .unwrap();
    parser
        .add_argument(
            Argument::new(["-j", "--jobs"])
                .with_type("int")
                .with_default(1)
                .with_help("parallel downloads"),
        )
        .unwrap();
    parser
        .add_argument(
            Argument::new(["-q", "--quiet"])
                .with_action("store_true")
                .with_help("suppress progress output"),
        )
        .unwrap();
    parser
        .add_argument(Argument::new(["url"]).with_help("where to fetch from"))
        .unwrap();
    parser
}

fn quiet(mut settings: ParserSettings) -> ParserSettings {
    settings.exit_on_error = false;
    settings
}

#[test]
fn test_full_help_layout() {
    let expected = "\
usage: fetch [-h] [-j JOBS] [-q] url

Download files from a mirror.

positional arguments:
  url              where to fetch from

options:
  -h, --help       show this help message and exit
  -j, --jobs JOBS  parallel downloads
  -q, --quiet      suppress progress output

See the manual for details.
";
    assert_eq!(fetch_parser().format_help(), expected);
    assert_eq!(
        fetch_parser().format_usage(),
        "usage: fetch [-h] [-j JOBS] [-q] url\n"
    );
}

#[test]
fn test_help_request_is_exit_zero_on_stdout() {
    let err = fetch_parser().parse_args(["-q", "--help"]).unwrap_err();
    let exit = err.exit_request().unwrap();
    assert_eq!(exit.status, 0);
    assert_eq!(exit.stream, OutputStream::Stdout);
    assert_eq!(exit.message, fetch_parser().format_help());
}

#[test]
fn test_usage_error_is_exit_two_on_stderr() {
    let err = fetch_parser().parse_args(["-j"]).unwrap_err();
    let exit = err.exit_request().unwrap();
    assert_eq!(exit.status, 2);
    assert_eq!(exit.stream, OutputStream::Stderr);
    assert_eq!(
        exit.message,
        "usage: fetch [-h] [-j JOBS] [-q] url\nfetch: error: argument -j/--jobs: expected one argument\n"
    );
}

#[test]
fn test_subcommand_help_listing() {
    let mut parser = ArgumentParser::new(ParserSettings::new("vcs")).unwrap();
    parser
        .add_subparsers(SubparsersOptions::new().with_title("commands").with_dest("command"))
        .unwrap();
    let commands = parser.subparsers_mut().unwrap();
    commands
        .add_parser("clone", SubparserOptions::new().with_help("copy a repository"))
        .unwrap()
        .add_argument(Argument::new(["repo"]))
        .unwrap();
    commands
        .add_parser(
            "log",
            SubparserOptions::new()
                .with_aliases(["history"])
                .with_help("show history"),
        )
        .unwrap();

    let expected = "\
usage: vcs [-h] {clone,log,history} ...

options:
  -h, --help           show this help message and exit

commands:
  {clone,log,history}
    clone              copy a repository
    log (history)      show history
";
    assert_eq!(parser.format_help(), expected);

    let err = parser.parse_args(["clone", "-h"]).unwrap_err();
    let exit = err.exit_request().unwrap();
    assert!(exit.is_success());
    assert!(exit.message.starts_with("usage: vcs clone [-h] repo\n"));
    assert!(exit.message.contains("\n  repo\n"));

    let ns = parser.parse_args(["clone", "git://example/repo"]).unwrap();
    assert_eq!(ns.get("command"), Some(&Value::from("clone")));
    assert_eq!(ns.get("repo"), Some(&Value::from("git://example/repo")));
}

#[test]
fn test_required_subcommand_missing() {
    let mut parser = ArgumentParser::new(quiet(ParserSettings::new("vcs"))).unwrap();
    parser
        .add_subparsers(SubparsersOptions::new().with_required(true))
        .unwrap();
    parser
        .subparsers_mut()
        .unwrap()
        .add_parser("init", SubparserOptions::new())
        .unwrap();
    let err = parser.parse_args(Vec::<String>::new()).unwrap_err();
    assert_eq!(
        err.to_string(),
        "the following arguments are required: {init}"
    );
}

#[test]
fn test_append_default_is_not_mutated() {
    let mut parser = ArgumentParser::new(ParserSettings::new("tool")).unwrap();
    parser
        .add_argument(
            Argument::new(["--include"])
                .with_action("append")
                .with_default(Value::List(vec![Value::from("base")])),
        )
        .unwrap();

    let first = parser.parse_args(["--include", "a", "--include", "b"]).unwrap();
    assert_eq!(
        first.get("include"),
        Some(&Value::List(vec![
            Value::from("base"),
            Value::from("a"),
            Value::from("b")
        ]))
    );
    let second = parser.parse_args(Vec::<String>::new()).unwrap();
    assert_eq!(
        second.get("include"),
        Some(&Value::List(vec![Value::from("base")]))
    );
    assert_eq!(
        parser.get_default("include"),
        Some(Value::List(vec![Value::from("base")]))
    );
}

#[test]
fn test_count_and_extend() {
    let mut parser = ArgumentParser::new(ParserSettings::new("tool")).unwrap();
    parser
        .add_argument(Argument::new(["-v", "--verbose"]).with_action("count"))
        .unwrap();
    parser
        .add_argument(
            Argument::new(["--tag"])
                .with_action("extend")
                .with_nargs(Nargs::OneOrMore),
        )
        .unwrap();

    let ns = parser
        .parse_args(["-vvv", "--tag", "a", "b", "-v", "--tag", "c"])
        .unwrap();
    assert_eq!(ns.get("verbose"), Some(&Value::Int(4)));
    assert_eq!(
        ns.get("tag"),
        Some(&Value::List(vec![
            Value::from("a"),
            Value::from("b"),
            Value::from("c")
        ]))
    );

    let ns = parser.parse_args(Vec::<String>::new()).unwrap();
    assert_eq!(ns.get("verbose"), Some(&Value::Null));
}

#[test]
fn test_boolean_optional_pair() {
    let mut parser = ArgumentParser::new(ParserSettings::new("tool")).unwrap();
    parser
        .add_argument(
            Argument::new(["--color"])
                .with_action("boolean_optional")
                .with_default(true),
        )
        .unwrap();
    assert_eq!(
        parser.format_usage(),
        "usage: tool [-h] [--color | --no-color]\n"
    );
    assert_eq!(
        parser.parse_args(["--no-color"]).unwrap().get("color"),
        Some(&Value::Bool(false))
    );
    assert_eq!(
        parser.parse_args(["--color"]).unwrap().get("color"),
        Some(&Value::Bool(true))
    );
    assert_eq!(
        parser.parse_args(Vec::<String>::new()).unwrap().get("color"),
        Some(&Value::Bool(true))
    );
}

#[test]
fn test_version_action() {
    let mut parser = ArgumentParser::new(ParserSettings::new("fetch")).unwrap();
    parser
        .add_argument(
            Argument::new(["--version"])
                .with_action("version")
                .with_version("%(prog)s 1.2"),
        )
        .unwrap();
    let err = parser.parse_args(["--version"]).unwrap_err();
    assert_eq!(
        err.exit_request(),
        Some(&ExitRequest::success("fetch 1.2\n"))
    );
}

#[test]
fn test_parent_arguments_are_inherited() {
    let mut parent = ArgumentParser::new(ParserSettings::new("base").without_help()).unwrap();
    parent
        .add_argument(Argument::new(["--config"]).with_default("app.toml"))
        .unwrap();

    let mut child = ArgumentParser::new(ParserSettings::new("app")).unwrap();
    child.with_parent(&parent).unwrap();
    child.add_argument(Argument::new(["target"])).unwrap();

    let ns = child.parse_args(["--config", "dev.toml", "all"]).unwrap();
    assert_eq!(ns.get("config"), Some(&Value::from("dev.toml")));
    assert_eq!(ns.get("target"), Some(&Value::from("all")));
    assert_eq!(
        child.format_usage(),
        "usage: app [-h] [--config CONFIG] target\n"
    );
}

#[test]
fn test_mutually_exclusive_usage_and_parse() {
    let mut parser = ArgumentParser::new(quiet(ParserSettings::new("fmt"))).unwrap();
    let mut group = parser.add_mutually_exclusive_group(false);
    group
        .add_argument(Argument::new(["--json"]).with_action("store_true"))
        .unwrap();
    group
        .add_argument(Argument::new(["--yaml"]).with_action("store_true"))
        .unwrap();
    parser.add_argument(Argument::new(["input"])).unwrap();

    assert_eq!(
        parser.format_usage(),
        "usage: fmt [-h] [--json | --yaml] input\n"
    );
    let err = parser.parse_args(["--json", "--yaml", "x"]).unwrap_err();
    assert_eq!(
        err.to_string(),
        "argument --yaml: not allowed with argument --json"
    );
}

#[test]
fn test_metavar_tuple_in_help() {
    let mut parser = ArgumentParser::new(ParserSettings::new("plot")).unwrap();
    parser
        .add_argument(
            Argument::new(["--point"])
                .with_nargs(Nargs::Exact(2))
                .with_type("float")
                .with_metavar(Metavar::tuple(["X", "Y"])),
        )
        .unwrap();
    assert_eq!(parser.format_usage(), "usage: plot [-h] [--point X Y]\n");

    let ns = parser.parse_args(["--point", "1", "2.5"]).unwrap();
    assert_eq!(
        ns.get("point"),
        Some(&Value::List(vec![Value::Float(1.0), Value::Float(2.5)]))
    );

    let bad = Argument::new(["--size"])
        .with_nargs(Nargs::Exact(3))
        .with_metavar(Metavar::tuple(["W", "H"]));
    assert_eq!(
        parser.add_argument(bad).unwrap_err(),
        ConstructionError::MetavarArity
    );
}

#[test]
fn test_show_defaults_style() {
    let mut settings = ParserSettings::new("tool");
    settings.formatter.style.show_defaults = true;
    let mut parser = ArgumentParser::new(settings).unwrap();
    parser
        .add_argument(
            Argument::new(["--retries"])
                .with_type("int")
                .with_default(3)
                .with_help("how often to retry"),
        )
        .unwrap();
    assert!(
        parser
            .format_help()
            .contains("--retries RETRIES  how often to retry (default: 3)\n")
    );
}

#[test]
fn test_custom_converter_message_is_verbatim() {
    let mut parser = ArgumentParser::new(quiet(ParserSettings::new("tool"))).unwrap();
    parser.register_type(Converter::new("port", |raw| {
        match raw.parse::<i64>() {
            Ok(port) if (1..=65535).contains(&port) => Ok(Value::Int(port)),
            _ => Err(ArgumentTypeError::Message(format!("{raw} is not a valid port"))),
        }
    }));
    parser
        .add_argument(Argument::new(["--port"]).with_type("port"))
        .unwrap();

    assert_eq!(
        parser.parse_args(["--port", "8080"]).unwrap().get("port"),
        Some(&Value::Int(8080))
    );
    assert_eq!(
        parser.parse_args(["--port", "0"]).unwrap_err().to_string(),
        "argument --port: 0 is not a valid port"
    );
}

#[test]
fn test_namespace_rendering() {
    let parser = fetch_parser();
    let ns = parser.parse_args(["-j", "2", "http://x"]).unwrap();
    assert_eq!(
        ns.to_string(),
        "Namespace(jobs=2, quiet=False, url='http://x')"
    );
}

#[test]
fn test_settings_deserialize_with_defaults() {
    let settings: ParserSettings = serde_json::from_str(
        r#"{"prog": "tool", "conflict_handler": "resolve", "formatter": {"width": 60}}"#,
    )
    .unwrap();
    assert_eq!(settings.prog.as_deref(), Some("tool"));
    assert_eq!(settings.conflict_handler, ConflictHandler::Resolve);
    assert_eq!(settings.formatter.width, Some(60));
    assert_eq!(settings.formatter.max_help_position, 24);
    assert!(settings.add_help);

    let invalid = serde_json::from_str::<ParserSettings>(r#"{"conflict_handler": "ignore"}"#);
    assert!(invalid.is_err());
}
