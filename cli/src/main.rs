use std::io::Write;
use std::path::{Path, PathBuf};

use argkit_core::{ArgumentParser, ExitRequest, OutputStream, ParseError};
use argkit_decl::ParserDecl;
use clap::{Args, Parser, Subcommand};

/// Output format for namespaces and normalized definitions.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum CliOutputFormat {
    Json,
    Yaml,
}

#[derive(Debug, Parser)]
#[command(name = "argkit", version)]
#[command(about = "Render, check, and exercise declarative argument parsers")]
#[command(disable_help_subcommand = true)]
struct Cli {
    /// Emit debug logs on stderr.
    #[arg(long, global = true)]
    debug: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the formatted help of a parser definition.
    Help(DeclArgs),
    /// Print the usage line of a parser definition.
    Usage(DeclArgs),
    /// Build one or more parser definitions and summarize them.
    Check(CheckArgs),
    /// Parse an argument vector against a definition and print the namespace.
    Parse(ParseArgs),
    /// Print a definition normalized with every setting spelled out.
    Export(ExportArgs),
}

#[derive(Debug, Args)]
struct DeclArgs {
    /// Parser definition file (.yaml, .yml, or .json).
    decl: PathBuf,
}

#[derive(Debug, Args)]
struct CheckArgs {
    /// Parser definition files.
    #[arg(required = true)]
    decls: Vec<PathBuf>,
}

#[derive(Debug, Args)]
struct ParseArgs {
    /// Parser definition file.
    decl: PathBuf,
    /// Output format for the namespace.
    #[arg(long, default_value = "json")]
    format: CliOutputFormat,
    /// Arguments to parse, given after `--`.
    #[arg(last = true)]
    args: Vec<String>,
}

#[derive(Debug, Args)]
struct ExportArgs {
    /// Parser definition file.
    decl: PathBuf,
    /// Output format.
    #[arg(long, default_value = "yaml")]
    format: CliOutputFormat,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    let result = match cli.command {
        Command::Help(args) => run_help(args),
        Command::Usage(args) => run_usage(args),
        Command::Check(args) => run_check(args),
        Command::Parse(args) => run_parse(args),
        Command::Export(args) => run_export(args),
    };

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn init_tracing(debug: bool) {
    let filter = if debug {
        "argkit_core=debug,argkit_decl=debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .with_target(false)
        .init();
}

fn load_decl(path: &Path) -> Result<ParserDecl, String> {
    ParserDecl::load(path).map_err(|err| format!("Failed to load '{}': {err}", path.display()))
}

fn build_parser(path: &Path) -> Result<ArgumentParser, String> {
    load_decl(path)?
        .build()
        .map_err(|err| format!("Failed to build '{}': {err}", path.display()))
}

fn run_help(args: DeclArgs) -> Result<(), String> {
    let parser = build_parser(&args.decl)?;
    print!("{}", parser.format_help());
    Ok(())
}

fn run_usage(args: DeclArgs) -> Result<(), String> {
    let parser = build_parser(&args.decl)?;
    print!("{}", parser.format_usage());
    Ok(())
}

fn run_check(args: CheckArgs) -> Result<(), String> {
    for path in &args.decls {
        let parser = build_parser(path)?;
        let container = parser.container();
        println!(
            "{}: {} argument(s), {} group(s)",
            parser.prog(),
            container.len(),
            container.groups().len() + container.exclusive_groups().len()
        );
    }
    Ok(())
}

fn run_parse(args: ParseArgs) -> Result<(), String> {
    let parser = build_parser(&args.decl)?;
    let namespace = match parser.parse_args(&args.args) {
        Ok(namespace) => namespace,
        Err(ParseError::Exit(request)) => exit_with(&request),
        Err(ParseError::Argument(err)) => return Err(err.to_string()),
    };

    let raw = match args.format {
        CliOutputFormat::Json => serde_json::to_string_pretty(&namespace)
            .map(|raw| raw + "\n")
            .map_err(|err| format!("Failed to serialize namespace: {err}"))?,
        CliOutputFormat::Yaml => serde_yaml::to_string(&namespace)
            .map_err(|err| format!("Failed to serialize namespace: {err}"))?,
    };
    print!("{raw}");
    Ok(())
}

fn run_export(args: ExportArgs) -> Result<(), String> {
    let decl = load_decl(&args.decl)?;
    let raw = match args.format {
        CliOutputFormat::Json => decl.to_json_string().map(|raw| raw + "\n"),
        CliOutputFormat::Yaml => decl.to_yaml_string(),
    }
    .map_err(|err| format!("Failed to serialize '{}': {err}", args.decl.display()))?;
    print!("{raw}");
    Ok(())
}

/// Writes the parser's message to the requested stream and terminates.
fn exit_with(request: &ExitRequest) -> ! {
    match request.stream {
        OutputStream::Stdout => print!("{}", request.message),
        OutputStream::Stderr => eprint!("{}", request.message),
    }
    let _ = std::io::stdout().flush();
    std::process::exit(request.status)
}
