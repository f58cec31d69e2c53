//! Result persistence: CSV request log and JSON run summary.

use chrono::{DateTime, SecondsFormat, Utc};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::{BenchError, Result};
use crate::models::{RequestRecord, RunId, RunMode, RunSummary};

/// Column order of the request log
pub const CSV_HEADER: [&str; 6] = [
    "run_id",
    "prompt_id",
    "prompt",
    "latency_seconds",
    "timestamp_utc",
    "mode",
];

/// Destination for the records and the summary of a finished run
pub trait ResultWriter {
    fn write_requests(&self, records: &[RequestRecord]) -> Result<()>;
    fn write_summary(&self, summary: &RunSummary) -> Result<()>;

    /// Attempt both writes; neither depends on the other succeeding.
    /// Returns the first failure.
    fn write_all(&self, records: &[RequestRecord], summary: &RunSummary) -> Result<()> {
        let requests = self.write_requests(records);
        if let Err(e) = &requests {
            tracing::error!("Failed to write request log: {}", e);
        }
        let summary = self.write_summary(summary);
        if let Err(e) = &summary {
            tracing::error!("Failed to write run summary: {}", e);
        }
        requests.and(summary)
    }
}

/// Writes the two outputs to files, overwriting earlier runs
#[derive(Debug, Clone)]
pub struct FileResultWriter {
    requests_csv: PathBuf,
    summary_json: PathBuf,
}

impl FileResultWriter {
    pub fn new(requests_csv: impl Into<PathBuf>, summary_json: impl Into<PathBuf>) -> Self {
        Self {
            requests_csv: requests_csv.into(),
            summary_json: summary_json.into(),
        }
    }

    pub fn requests_csv(&self) -> &Path {
        &self.requests_csv
    }

    pub fn summary_json(&self) -> &Path {
        &self.summary_json
    }
}

impl ResultWriter for FileResultWriter {
    fn write_requests(&self, records: &[RequestRecord]) -> Result<()> {
        let mut out = BufWriter::new(File::create(&self.requests_csv)?);
        write_requests_csv(&mut out, records)?;
        out.flush()?;
        tracing::info!(path = %self.requests_csv.display(), rows = records.len(), "Wrote request log");
        Ok(())
    }

    fn write_summary(&self, summary: &RunSummary) -> Result<()> {
        let mut out = BufWriter::new(File::create(&self.summary_json)?);
        out.write_all(summary_to_json(summary)?.as_bytes())?;
        out.write_all(b"\n")?;
        out.flush()?;
        tracing::info!(path = %self.summary_json.display(), "Wrote run summary");
        Ok(())
    }
}

// ==================================================================================================
// JSON summary
// ==================================================================================================

/// Pretty-printed summary object
pub fn summary_to_json(summary: &RunSummary) -> Result<String> {
    Ok(serde_json::to_string_pretty(summary)?)
}

/// Print the summary block shown at the end of a run
pub fn print_summary(summary: &RunSummary) {
    println!("\n--- summary ---");
    println!("run_id: {}", summary.run_id);
    println!("mode: {}", summary.mode);
    println!("total_requests: {}", summary.total_requests);
    println!("total_time_seconds: {}", summary.total_time_seconds);
    println!("average_latency_seconds: {}", summary.average_latency_seconds);
    println!("min_latency_seconds: {}", summary.min_latency_seconds);
    println!("max_latency_seconds: {}", summary.max_latency_seconds);
    println!("throughput_rps: {}", summary.throughput_rps);
}

// ==================================================================================================
// CSV request log
// ==================================================================================================

/// Write a header row and one row per record
pub fn write_requests_csv<W: Write>(out: &mut W, records: &[RequestRecord]) -> Result<()> {
    writeln!(out, "{}", CSV_HEADER.join(","))?;
    for r in records {
        writeln!(
            out,
            "{},{},{},{},{},{}",
            csv_escape(r.run_id.as_str()),
            r.prompt_index,
            csv_escape(&r.prompt),
            r.latency_seconds,
            r.timestamp_utc.to_rfc3339_opts(SecondsFormat::AutoSi, true),
            r.mode
        )?;
    }
    Ok(())
}

/// Parse a request log produced by [`write_requests_csv`]
pub fn parse_requests_csv(input: &str) -> Result<Vec<RequestRecord>> {
    let rows = split_rows(input)?;
    let mut rows = rows.into_iter();

    match rows.next() {
        Some((_, header)) if header == CSV_HEADER => {}
        Some((line, header)) => {
            return Err(BenchError::Csv {
                line,
                message: format!("unexpected header: {}", header.join(",")),
            })
        }
        None => {
            return Err(BenchError::Csv {
                line: 1,
                message: "missing header".to_string(),
            })
        }
    }

    rows.map(|(line, fields)| parse_record(line, fields)).collect()
}

fn parse_record(line: usize, fields: Vec<String>) -> Result<RequestRecord> {
    if fields.len() != CSV_HEADER.len() {
        return Err(BenchError::Csv {
            line,
            message: format!(
                "expected {} fields, found {}",
                CSV_HEADER.len(),
                fields.len()
            ),
        });
    }
    let bad = |column: &str, e: String| BenchError::Csv {
        line,
        message: format!("invalid {}: {}", column, e),
    };

    let mut fields = fields.into_iter();
    let mut next = || fields.next().unwrap_or_default();

    let run_id = RunId::from(next());
    let prompt_index = next()
        .parse::<usize>()
        .map_err(|e| bad("prompt_id", e.to_string()))?;
    let prompt = next();
    let latency_seconds = next()
        .parse::<f64>()
        .map_err(|e| bad("latency_seconds", e.to_string()))?;
    let timestamp_utc = DateTime::parse_from_rfc3339(&next())
        .map_err(|e| bad("timestamp_utc", e.to_string()))?
        .with_timezone(&Utc);
    let mode = next().parse::<RunMode>().map_err(|e| bad("mode", e))?;

    Ok(RequestRecord {
        run_id,
        prompt_index,
        prompt,
        latency_seconds,
        timestamp_utc,
        mode,
    })
}

/// Quote a field when it contains a delimiter, quote or line break
fn csv_escape(value: &str) -> String {
    if value.contains(&[',', '"', '\n', '\r'][..]) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Split CSV text into rows of unquoted fields, tagged with their starting line
fn split_rows(input: &str) -> Result<Vec<(usize, Vec<String>)>> {
    let mut rows = Vec::new();
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut line = 1;
    let mut row_start = 1;
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => in_quotes = false,
                '\n' => {
                    line += 1;
                    field.push(c);
                }
                _ => field.push(c),
            }
            continue;
        }

        match c {
            '"' if field.is_empty() => in_quotes = true,
            ',' => fields.push(std::mem::take(&mut field)),
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' => {
                fields.push(std::mem::take(&mut field));
                rows.push((row_start, std::mem::take(&mut fields)));
                line += 1;
                row_start = line;
            }
            _ => field.push(c),
        }
    }

    if in_quotes {
        return Err(BenchError::Csv {
            line: row_start,
            message: "unterminated quoted field".to_string(),
        });
    }
    if !field.is_empty() || !fields.is_empty() {
        fields.push(field);
        rows.push((row_start, fields));
    }

    Ok(rows)
}
