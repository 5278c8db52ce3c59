//! Per-record progress reporting.
//!
//! Each enrichment pass reports the record it is working on so operators
//! can follow a long run that is bound by external lookups. Progress is
//! emitted on **stderr** so stdout keeps the pass summary parseable.

use std::io::Write;

/// A single progress event for an enrichment pass.
#[derive(Clone, Debug)]
pub enum EnrichProgressEvent {
    /// Working on record `n` of `total`.
    Processing {
        pass: &'static str,
        id: String,
        label: String,
        n: u64,
        total: u64,
    },
    /// A source lookup for the current record.
    Lookup {
        pass: &'static str,
        source: String,
        id: String,
    },
}

/// Reports enrichment progress. Implementations write to stderr (human or JSON).
pub trait EnrichProgressReporter {
    fn report(&self, event: EnrichProgressEvent);
}

/// Human-friendly progress on stderr: "persons  12 / 1,204  Marie Curie (pers_0012)".
pub struct StderrProgress;

impl EnrichProgressReporter for StderrProgress {
    fn report(&self, event: EnrichProgressEvent) {
        let line = match &event {
            EnrichProgressEvent::Processing {
                pass,
                id,
                label,
                n,
                total,
            } => format!(
                "{}  {} / {}  {} ({})\n",
                pass,
                format_number(*n),
                format_number(*total),
                label,
                id
            ),
            EnrichProgressEvent::Lookup { pass, source, id } => {
                format!("{}    lookup {} {}\n", pass, source, id)
            }
        };
        let _ = std::io::stderr().lock().write_all(line.as_bytes());
        let _ = std::io::stderr().lock().flush();
    }
}

/// Machine-readable progress: one JSON object per line on stderr.
pub struct JsonProgress;

impl EnrichProgressReporter for JsonProgress {
    fn report(&self, event: EnrichProgressEvent) {
        let obj = match &event {
            EnrichProgressEvent::Processing {
                pass,
                id,
                label,
                n,
                total,
            } => serde_json::json!({
                "event": "progress",
                "pass": pass,
                "phase": "processing",
                "id": id,
                "label": label,
                "n": n,
                "total": total
            }),
            EnrichProgressEvent::Lookup { pass, source, id } => serde_json::json!({
                "event": "progress",
                "pass": pass,
                "phase": "lookup",
                "source": source,
                "id": id
            }),
        };
        if let Ok(line) = serde_json::to_string(&obj) {
            let _ = writeln!(std::io::stderr().lock(), "{}", line);
            let _ = std::io::stderr().lock().flush();
        }
    }
}

/// No-op reporter when progress is disabled.
pub struct NoProgress;

impl EnrichProgressReporter for NoProgress {
    fn report(&self, _event: EnrichProgressEvent) {}
}

fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + (s.len() - 1) / 3);
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result.chars().rev().collect()
}

/// Progress mode for the CLI: off, human (stderr), or JSON (stderr).
#[derive(Clone, Copy, Debug, Eq, PartialEq, clap::ValueEnum)]
pub enum ProgressMode {
    Off,
    Human,
    Json,
}

impl ProgressMode {
    /// Default: human progress when stderr is a TTY, otherwise off.
    pub fn default_for_tty() -> Self {
        if atty::is(atty::Stream::Stderr) {
            ProgressMode::Human
        } else {
            ProgressMode::Off
        }
    }

    pub fn reporter(&self) -> Box<dyn EnrichProgressReporter> {
        match self {
            ProgressMode::Off => Box::new(NoProgress),
            ProgressMode::Human => Box::new(StderrProgress),
            ProgressMode::Json => Box::new(JsonProgress),
        }
    }
}
