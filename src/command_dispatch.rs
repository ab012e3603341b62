//! Purpose: Hold top-level CLI command dispatch for `leafmap`.
//! Exports: `dispatch_command`.
//! Role: Keep `main.rs` focused on parse/bootstrap and delegate command execution.
//! Invariants: Stdout carries only payload; diagnostics go to stderr.
//! Invariants: Exit code semantics derive from error kinds.

use super::*;

use std::collections::BTreeMap;
use std::fs;
use std::io::Read;

use leafmap::core::flatten::{CollisionPolicy, FlattenOptions, flatten, flatten_with};

use crate::ingest::{IngestConfig, IngestFailure, ingest, resolve_mode};
use crate::render::{render_compact, render_lines, render_pretty};

pub(super) fn dispatch_command(
    command: Command,
    color_mode: ColorMode,
) -> Result<RunOutcome, Error> {
    match command {
        Command::Completion { shell } => {
            let mut cmd = Cli::command();
            clap_complete::aot::generate(shell, &mut cmd, "leafmap", &mut io::stdout());
            Ok(RunOutcome::ok())
        }
        Command::Version => {
            emit_version_output();
            Ok(RunOutcome::ok())
        }
        Command::Demo { format } => {
            let pairs = flatten(&sample_document());
            emit_pairs(&pairs, format, color_mode);
            Ok(RunOutcome::ok())
        }
        Command::Flatten {
            data,
            file,
            input,
            errors,
            strict,
            format,
            quiet,
        } => run_flatten(
            FlattenArgs {
                data,
                file,
                input,
                errors,
                strict,
                format,
                quiet,
            },
            color_mode,
        ),
    }
}

struct FlattenArgs {
    data: Option<String>,
    file: Option<String>,
    input: InputMode,
    errors: ErrorPolicyCli,
    strict: bool,
    format: Option<OutputFormat>,
    quiet: bool,
}

fn run_flatten(args: FlattenArgs, color_mode: ColorMode) -> Result<RunOutcome, Error> {
    let raw = read_input(args.data, args.file)?;
    if raw.trim().is_empty() {
        return Err(Error::new(ErrorKind::Parse)
            .with_message("empty input")
            .with_hint("Provide a JSON object inline, via --file, or on stdin."));
    }

    let options = FlattenOptions {
        collisions: if args.strict {
            CollisionPolicy::Reject
        } else {
            CollisionPolicy::LastKeyWins
        },
    };
    let mode = resolve_mode(&raw, args.input.into());
    let config = IngestConfig {
        mode,
        errors: args.errors.into(),
    };

    let mut skipped = 0u64;
    let mut shadowed = 0u64;
    match mode {
        // Record streams always emit one compact object per line.
        IngestMode::Jsonl => {
            ingest(
                &raw,
                config,
                |value| {
                    let report = flatten_with(&value, &options)?;
                    skipped += report.skipped;
                    shadowed += report.shadowed;
                    println!("{}", render_compact(&report.pairs));
                    Ok(())
                },
                |failure| {
                    if !args.quiet {
                        emit_notice(&skipped_record_notice(&failure), color_mode);
                    }
                },
            )?;
        }
        IngestMode::Json | IngestMode::Auto => {
            ingest(
                &raw,
                config,
                |value| {
                    let report = flatten_with(&value, &options)?;
                    skipped += report.skipped;
                    shadowed += report.shadowed;
                    emit_pairs(&report.pairs, args.format, color_mode);
                    Ok(())
                },
                |_| {},
            )?;
        }
    }

    if !args.quiet {
        if skipped > 0 {
            let message = format!("skipped {skipped} unsupported value{}", plural(skipped));
            emit_notice(&count_notice("skipped-values", message, skipped), color_mode);
        }
        if shadowed > 0 {
            let message = format!(
                "{shadowed} leaf key{} shadowed by a later branch",
                plural(shadowed)
            );
            emit_notice(&count_notice("shadowed-keys", message, shadowed), color_mode);
        }
    }
    Ok(RunOutcome::ok())
}

fn read_input(data: Option<String>, file: Option<String>) -> Result<String, Error> {
    if let Some(inline) = data {
        return Ok(inline);
    }
    match file {
        Some(path) if path == "-" => read_stdin(),
        Some(path) => fs::read_to_string(&path).map_err(|err| {
            let kind = match err.kind() {
                io::ErrorKind::NotFound => ErrorKind::NotFound,
                _ => ErrorKind::Io,
            };
            Error::new(kind)
                .with_message("failed to read input file")
                .with_path(&path)
                .with_source(err)
        }),
        None => {
            if io::stdin().is_terminal() {
                return Err(Error::new(ErrorKind::Usage)
                    .with_message("no input provided")
                    .with_hint("Pass inline JSON, --file <path>, or pipe a document on stdin."));
            }
            read_stdin()
        }
    }
}

fn read_stdin() -> Result<String, Error> {
    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer).map_err(|err| {
        Error::new(ErrorKind::Io)
            .with_message("failed to read stdin")
            .with_source(err)
    })?;
    Ok(buffer)
}

fn emit_pairs(
    pairs: &BTreeMap<String, String>,
    format: Option<OutputFormat>,
    color_mode: ColorMode,
) {
    let is_tty = io::stdout().is_terminal();
    let format = format.unwrap_or(if is_tty {
        OutputFormat::Pretty
    } else {
        OutputFormat::Compact
    });
    let rendered = match format {
        OutputFormat::Pretty => render_pretty(pairs, color_mode.use_color(is_tty)),
        OutputFormat::Compact => render_compact(pairs),
        OutputFormat::Lines => render_lines(pairs),
    };
    println!("{rendered}");
}

fn sample_document() -> Value {
    json!({
        "map1": {"key1": "val1", "key2": "val2", "key3": "val3"},
        "map2": {
            "key4": "val4",
            "map3": {"key5": "val5", "key6": "val6"},
            "map4": {
                "key7": "val7",
                "map5": {"key8": "val8"}
            }
        }
    })
}

fn plural(count: u64) -> &'static str {
    if count == 1 { "" } else { "s" }
}

fn count_notice(kind: &str, message: String, count: u64) -> Notice {
    let mut details = Map::new();
    details.insert("count".to_string(), json!(count));
    Notice {
        kind: kind.to_string(),
        time: notice_time_now().unwrap_or_default(),
        cmd: "flatten".to_string(),
        message,
        details,
    }
}

fn skipped_record_notice(failure: &IngestFailure) -> Notice {
    let mut details = Map::new();
    details.insert("line".to_string(), json!(failure.line));
    details.insert("error".to_string(), json!(failure.message));
    Notice {
        kind: "skipped-record".to_string(),
        time: notice_time_now().unwrap_or_default(),
        cmd: "flatten".to_string(),
        message: format!("skipped undecodable record at line {}", failure.line),
        details,
    }
}
