//! Purpose: `leafmap` CLI entry point and command dispatch bootstrap.
//! Role: Binary crate root; parses args, runs commands, emits results on stdout.
//! Invariants: Stdout carries only payload (flat results, version info, completions).
//! Invariants: Non-interactive diagnostics are emitted as JSON on stderr.
//! Invariants: Process exit code is derived from `core::error::to_exit_code`.
#![allow(clippy::result_large_err)]
use std::error::Error as StdError;
use std::io::{self, IsTerminal};
use std::time::{SystemTime, UNIX_EPOCH};

use clap::{
    CommandFactory, Parser, Subcommand, ValueEnum, ValueHint,
    error::ErrorKind as ClapErrorKind,
};
use clap_complete::aot::Shell;
use serde::Serialize;
use serde_json::{Map, Value, json};

mod command_dispatch;
mod ingest;
mod render;

use ingest::{ErrorPolicy, IngestMode};
use leafmap::core::error::{Error, ErrorKind, to_exit_code};
use leafmap::notice::{Notice, notice_json};

#[derive(Copy, Clone, Debug)]
struct RunOutcome {
    exit_code: i32,
}

impl RunOutcome {
    fn ok() -> Self {
        Self { exit_code: 0 }
    }

    fn with_code(exit_code: i32) -> Self {
        Self { exit_code }
    }
}

fn main() {
    let exit_code = match run() {
        Ok(outcome) => outcome.exit_code,
        Err((err, color_mode)) => {
            emit_error(&err, color_mode);
            to_exit_code(err.kind())
        }
    };
    std::process::exit(exit_code);
}

fn run() -> Result<RunOutcome, (Error, ColorMode)> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => match err.kind() {
            ClapErrorKind::DisplayHelp
            | ClapErrorKind::DisplayVersion
            | ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
                err.print().map_err(|io_err| {
                    (
                        Error::new(ErrorKind::Io)
                            .with_message("failed to write help")
                            .with_source(io_err),
                        ColorMode::Auto,
                    )
                })?;
                let exit_code = if matches!(
                    err.kind(),
                    ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
                ) {
                    2
                } else {
                    0
                };
                return Ok(RunOutcome::with_code(exit_code));
            }
            _ => {
                return Err((
                    Error::new(ErrorKind::Usage)
                        .with_message(clap_error_summary(&err))
                        .with_hint("Run `leafmap --help` for usage."),
                    ColorMode::Auto,
                ));
            }
        },
    };

    let color_mode = cli.color;
    let result = command_dispatch::dispatch_command(cli.command, color_mode);

    result
        .map_err(add_parse_hint)
        .map_err(add_io_hint)
        .map_err(add_internal_hint)
        .map_err(|err| (err, color_mode))
}

fn clap_error_summary(err: &clap::Error) -> String {
    for line in err.to_string().lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if let Some(rest) = trimmed.strip_prefix("error:") {
            return rest.trim().to_string();
        }
        return trimmed.to_string();
    }
    "invalid arguments".to_string()
}

#[derive(Parser)]
#[command(
    name = "leafmap",
    version,
    about = "Flatten nested JSON objects into their leaf key-value pairs",
    help_template = r#"{about-with-newline}
{before-help}USAGE
  {usage}

COMMANDS
{subcommands}

OPTIONS
{options}

{after-help}
"#,
    long_about = None,
    before_help = r#"Nested objects collapse to their string leaves. Structure is discarded:
a leaf keeps its own key, never a parent-path prefix.
"#,
    after_help = r#"EXAMPLES
  $ leafmap demo
  $ leafmap flatten '{"server": {"host": "db1", "port": "5432"}}'
  $ curl -s https://api.example.com/config | leafmap flatten
  $ leafmap flatten -f records.jsonl --in jsonl

LEARN MORE
  $ leafmap <command> --help"#,
    arg_required_else_help = true,
    disable_help_subcommand = false
)]
struct Cli {
    #[arg(
        long,
        default_value = "auto",
        value_enum,
        help = "Colorize stderr diagnostics and pretty JSON output: auto|always|never"
    )]
    color: ColorMode,

    #[command(subcommand)]
    command: Command,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum ColorMode {
    Auto,
    Always,
    Never,
}

impl ColorMode {
    fn use_color(self, is_tty: bool) -> bool {
        match self {
            ColorMode::Auto => is_tty,
            ColorMode::Always => true,
            ColorMode::Never => false,
        }
    }
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum OutputFormat {
    Pretty,
    Compact,
    Lines,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum InputMode {
    Auto,
    Json,
    Jsonl,
}

impl From<InputMode> for IngestMode {
    fn from(value: InputMode) -> Self {
        match value {
            InputMode::Auto => IngestMode::Auto,
            InputMode::Json => IngestMode::Json,
            InputMode::Jsonl => IngestMode::Jsonl,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, ValueEnum)]
enum ErrorPolicyCli {
    Stop,
    Skip,
}

impl From<ErrorPolicyCli> for ErrorPolicy {
    fn from(value: ErrorPolicyCli) -> Self {
        match value {
            ErrorPolicyCli::Stop => ErrorPolicy::Stop,
            ErrorPolicyCli::Skip => ErrorPolicy::Skip,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    #[command(
        about = "Flatten a JSON document to its leaf key-value pairs",
        long_about = r#"Flatten a JSON object of unbounded nesting into a single-level mapping.

Accepts inline JSON, file input (-f/--file, use - for stdin), or a stream on
stdin. JSON Lines input flattens each record independently and emits one
compact object per line."#,
        after_help = r#"EXAMPLES
  $ leafmap flatten '{"a": {"x": "1", "deeper": {"y": "2"}}}'
  $ leafmap flatten -f config.json --format lines
  $ jq -c '.items[]' data.json | leafmap flatten --in jsonl
  $ leafmap flatten -f doc.json --strict

NOTES
  - Values that are neither strings nor objects are skipped; a stderr notice
    reports the count (silence with --quiet)
  - Duplicate leaf keys across branches: the last key in traversal order
    wins; --strict fails instead (exit 5)
  - `--in auto` treats multi-line input as JSON Lines when the first line is
    a complete JSON value
  - `--errors skip` only applies to JSON Lines records"#
    )]
    Flatten {
        #[arg(help = "Inline JSON value")]
        data: Option<String>,
        #[arg(
            short = 'f',
            long = "file",
            help = "Input file path (use - for stdin)",
            conflicts_with = "data",
            value_hint = ValueHint::FilePath
        )]
        file: Option<String>,
        #[arg(
            short = 'i',
            long = "in",
            default_value = "auto",
            value_enum,
            help = "Input mode",
            long_help = r#"Input mode

  auto   Multi-line input whose first line is a complete JSON value is
         treated as JSON Lines; everything else as one JSON document
  json   Single JSON document
  jsonl  One JSON record per line"#
        )]
        input: InputMode,
        #[arg(
            short = 'e',
            long = "errors",
            default_value = "stop",
            value_enum,
            help = "JSON Lines error policy: stop|skip"
        )]
        errors: ErrorPolicyCli,
        #[arg(long, help = "Fail when a leaf key appears in more than one branch")]
        strict: bool,
        #[arg(
            long,
            value_enum,
            help = "Output format: pretty|compact|lines (default: pretty on a terminal, compact when piped)"
        )]
        format: Option<OutputFormat>,
        #[arg(long, help = "Suppress stderr notices (skipped values, shadowed keys)")]
        quiet: bool,
    },
    #[command(
        about = "Flatten the built-in sample document",
        long_about = r#"Flatten a fixed nested sample document and print the result.

The sample mirrors the shape produced by decoding a nested JSON document;
this command has no inputs and no failure path."#,
        after_help = r#"EXAMPLES
  $ leafmap demo
  $ leafmap demo --format lines"#
    )]
    Demo {
        #[arg(
            long,
            value_enum,
            help = "Output format: pretty|compact|lines (default: pretty on a terminal, compact when piped)"
        )]
        format: Option<OutputFormat>,
    },
    #[command(
        about = "Print version info",
        long_about = r#"Emit version info: a human one-liner on a terminal, JSON otherwise."#,
        after_help = r#"EXAMPLES
  $ leafmap version"#
    )]
    Version,
    #[command(
        arg_required_else_help = true,
        about = "Generate shell completions",
        long_about = r#"Generate shell completion scripts.

Prints a completion script for the given shell to stdout. Install the
generated file in your shell's completion directory (or source it) to
enable tab completion."#,
        after_help = r#"EXAMPLES
  $ leafmap completion bash > ~/.local/share/bash-completion/completions/leafmap
  $ leafmap completion zsh > ~/.zfunc/_leafmap
  $ leafmap completion fish > ~/.config/fish/completions/leafmap.fish"#
    )]
    Completion {
        #[arg(help = "Shell to generate completions for")]
        shell: Shell,
    },
}

fn add_parse_hint(err: Error) -> Error {
    if err.kind() != ErrorKind::Parse || err.hint().is_some() {
        return err;
    }
    err.with_hint("Input must be a JSON document (or JSON Lines with --in jsonl).")
}

fn add_io_hint(err: Error) -> Error {
    if err.hint().is_some() {
        return err;
    }
    match err.kind() {
        ErrorKind::NotFound => err.with_hint("Input file not found. Check the path."),
        ErrorKind::Io => err.with_hint("I/O error. Check the path and filesystem."),
        _ => err,
    }
}

fn add_internal_hint(err: Error) -> Error {
    if err.kind() != ErrorKind::Internal || err.hint().is_some() {
        return err;
    }
    err.with_hint(
        "Unexpected internal failure. Retry with RUST_BACKTRACE=1 and share command/context if it persists.",
    )
}

#[derive(Serialize)]
struct VersionInfo {
    name: &'static str,
    version: &'static str,
}

fn emit_version_output() {
    if io::stdout().is_terminal() {
        println!("leafmap {}", env!("CARGO_PKG_VERSION"));
    } else {
        let info = VersionInfo {
            name: "leafmap",
            version: env!("CARGO_PKG_VERSION"),
        };
        let json = serde_json::to_string(&info)
            .unwrap_or_else(|_| "{\"name\":\"leafmap\"}".to_string());
        println!("{json}");
    }
}

enum AnsiColor {
    Red,
    Yellow,
}

fn colorize_label(label: &str, enabled: bool, color: AnsiColor) -> String {
    if !enabled {
        return label.to_string();
    }
    let code = match color {
        AnsiColor::Red => "31",
        AnsiColor::Yellow => "33",
    };
    format!("\u{1b}[{code}m{label}\u{1b}[0m")
}

fn emit_error(err: &Error, color_mode: ColorMode) {
    let is_tty = io::stderr().is_terminal();
    if is_tty {
        eprintln!("{}", error_text(err, color_mode.use_color(is_tty)));
        return;
    }

    let value = error_json(err);
    let json = serde_json::to_string(&value).unwrap_or_else(|_| {
        "{\"error\":{\"kind\":\"Internal\",\"message\":\"json encode failed\"}}".to_string()
    });
    eprintln!("{json}");
}

fn notice_time_now() -> Option<String> {
    use time::format_description::well_known::Rfc3339;
    let duration = SystemTime::now().duration_since(UNIX_EPOCH).ok()?;
    let ts = time::OffsetDateTime::from_unix_timestamp_nanos(duration.as_nanos() as i128).ok()?;
    ts.format(&Rfc3339).ok()
}

fn emit_notice(notice: &Notice, color_mode: ColorMode) {
    let is_tty = io::stderr().is_terminal();
    if is_tty {
        let label = colorize_label("notice:", color_mode.use_color(is_tty), AnsiColor::Yellow);
        eprintln!("{label} {}", notice.message);
        return;
    }

    let value = notice_json(notice);
    let json = serde_json::to_string(&value).unwrap_or_else(|_| {
        "{\"notice\":{\"kind\":\"Internal\",\"message\":\"json encode failed\"}}".to_string()
    });
    eprintln!("{json}");
}

fn error_message(err: &Error) -> String {
    if let Some(message) = err.message() {
        return message.to_string();
    }
    match err.kind() {
        ErrorKind::Internal => "internal error".to_string(),
        ErrorKind::Usage => "usage error".to_string(),
        ErrorKind::NotFound => "not found".to_string(),
        ErrorKind::Parse => "invalid JSON input".to_string(),
        ErrorKind::Collision => "duplicate leaf key".to_string(),
        ErrorKind::Io => "i/o error".to_string(),
    }
}

fn error_causes(err: &Error) -> Vec<String> {
    let mut causes = Vec::new();
    let mut cur = err.source();
    while let Some(source) = cur {
        causes.push(source.to_string());
        cur = source.source();
    }
    causes
}

fn error_json(err: &Error) -> Value {
    let mut inner = Map::new();
    inner.insert("kind".to_string(), json!(format!("{:?}", err.kind())));
    inner.insert("message".to_string(), json!(error_message(err)));
    if let Some(hint) = err.hint() {
        inner.insert("hint".to_string(), json!(hint));
    }
    if let Some(path) = err.path() {
        inner.insert("path".to_string(), json!(path.display().to_string()));
    }
    if let Some(key) = err.key() {
        inner.insert("key".to_string(), json!(key));
    }
    if let Some(line) = err.line() {
        inner.insert("line".to_string(), json!(line));
    }
    let causes = error_causes(err);
    if !causes.is_empty() {
        inner.insert("causes".to_string(), json!(causes));
    }

    let mut outer = Map::new();
    outer.insert("error".to_string(), Value::Object(inner));
    Value::Object(outer)
}

fn error_text(err: &Error, use_color: bool) -> String {
    let mut lines = Vec::new();
    lines.push(format!(
        "{} {}",
        colorize_label("error:", use_color, AnsiColor::Red),
        error_message(err)
    ));

    if let Some(hint) = err.hint() {
        lines.push(format!(
            "{} {hint}",
            colorize_label("hint:", use_color, AnsiColor::Yellow)
        ));
    }
    if let Some(path) = err.path() {
        lines.push(format!(
            "{} {}",
            colorize_label("path:", use_color, AnsiColor::Yellow),
            path.display()
        ));
    }
    if let Some(key) = err.key() {
        lines.push(format!(
            "{} {key}",
            colorize_label("key:", use_color, AnsiColor::Yellow)
        ));
    }
    if let Some(line) = err.line() {
        lines.push(format!(
            "{} {line}",
            colorize_label("line:", use_color, AnsiColor::Yellow)
        ));
    }

    let causes = error_causes(err);
    if let Some(cause) = causes.first() {
        lines.push(format!(
            "{} {cause}",
            colorize_label("caused by:", use_color, AnsiColor::Yellow)
        ));
    }

    lines.join("\n")
}
