//! Purpose: Decode CLI input text into JSON values with explicit, testable modes.
//! Exports: `IngestMode`, `ErrorPolicy`, `IngestConfig`, `IngestOutcome`, `IngestFailure`, `resolve_mode`, `ingest`.
//! Role: Input decoding used by the CLI; isolates stream heuristics from dispatch.
//! Invariants: Auto detection is deterministic and documented in command help.
//! Invariants: Skip mode only continues at line boundaries; whole-document
//! input always stops on the first decode failure.
use leafmap::core::error::{Error, ErrorKind};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Parse JSON from a string slice.
fn json_from_str<T: DeserializeOwned>(s: &str) -> Result<T, serde_json::Error> {
    serde_json::from_str(s)
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum IngestMode {
    Auto,
    Json,
    Jsonl,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ErrorPolicy {
    Stop,
    Skip,
}

#[derive(Copy, Clone, Debug)]
pub struct IngestConfig {
    pub mode: IngestMode,
    pub errors: ErrorPolicy,
}

#[derive(Copy, Clone, Debug, Default)]
pub struct IngestOutcome {
    pub records: u64,
    pub ok: u64,
    pub failed: u64,
}

#[derive(Clone, Debug)]
pub struct IngestFailure {
    pub line: u64,
    pub message: String,
}

/// Resolve `Auto` to a concrete mode.
///
/// The first non-empty line decides: if it is a complete JSON value and more
/// non-empty lines follow, the input is a JSON Lines stream. A document whose
/// first line is an incomplete fragment (pretty-printed JSON) stays `Json`.
pub fn resolve_mode(input: &str, requested: IngestMode) -> IngestMode {
    if requested != IngestMode::Auto {
        return requested;
    }
    let mut lines = input.lines().filter(|line| !line.trim().is_empty());
    let Some(first) = lines.next() else {
        return IngestMode::Json;
    };
    if lines.next().is_some() && json_from_str::<Value>(first).is_ok() {
        IngestMode::Jsonl
    } else {
        IngestMode::Json
    }
}

pub fn ingest<F, N>(
    input: &str,
    config: IngestConfig,
    mut on_value: F,
    mut on_failure: N,
) -> Result<IngestOutcome, Error>
where
    F: FnMut(Value) -> Result<(), Error>,
    N: FnMut(IngestFailure),
{
    let mut outcome = IngestOutcome::default();
    match resolve_mode(input, config.mode) {
        IngestMode::Jsonl => {
            for (idx, line) in input.lines().enumerate() {
                if line.trim().is_empty() {
                    continue;
                }
                outcome.records += 1;
                let line_no = (idx + 1) as u64;
                match json_from_str::<Value>(line) {
                    Ok(value) => {
                        on_value(value)?;
                        outcome.ok += 1;
                    }
                    Err(err) => match config.errors {
                        ErrorPolicy::Stop => return Err(parse_error(err, Some(line_no))),
                        ErrorPolicy::Skip => {
                            outcome.failed += 1;
                            on_failure(IngestFailure {
                                line: line_no,
                                message: err.to_string(),
                            });
                        }
                    },
                }
            }
        }
        IngestMode::Json | IngestMode::Auto => {
            outcome.records = 1;
            let value: Value =
                json_from_str(input.trim()).map_err(|err| parse_error(err, None))?;
            on_value(value)?;
            outcome.ok = 1;
        }
    }
    Ok(outcome)
}

fn parse_error(err: serde_json::Error, line: Option<u64>) -> Error {
    let base = Error::new(ErrorKind::Parse)
        .with_message("invalid JSON input")
        .with_source(err);
    match line {
        Some(line_no) => base.with_line(line_no),
        None => base,
    }
}
