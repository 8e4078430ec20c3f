//! Diagnostic sinks for per-episode error series.
//!
//! The agent reports `(episode, value, series)` triples at every episode end.
//! Reporting is fire-and-forget: a failing sink is logged and training goes on.

use std::fmt;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tracing::info;

/// Which error series a value belongs to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Series {
    /// Mean TD error of the episode's training batches
    EpisodeError,
    /// Moving average of `EpisodeError` over the last 100 episodes
    MovingAverage,
}

impl Series {
    pub fn as_str(&self) -> &'static str {
        match self {
            Series::EpisodeError => "episode_error",
            Series::MovingAverage => "moving_average",
        }
    }
}

impl fmt::Display for Series {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub trait DiagnosticsSink {
    fn record(&mut self, episode: usize, value: f64, series: Series) -> io::Result<()>;
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl DiagnosticsSink for NullSink {
    fn record(&mut self, _episode: usize, _value: f64, _series: Series) -> io::Result<()> {
        Ok(())
    }
}

/// Emits each value as a `tracing` event.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticsSink for TracingSink {
    fn record(&mut self, episode: usize, value: f64, series: Series) -> io::Result<()> {
        info!(episode, value, series = series.as_str(), "diagnostic");
        Ok(())
    }
}

/// Keeps every value in memory.
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    pub records: Vec<(usize, f64, Series)>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// `(episode, value)` pairs of one series, in recording order
    pub fn series(&self, series: Series) -> Vec<(usize, f64)> {
        self.records
            .iter()
            .filter(|(_, _, s)| *s == series)
            .map(|&(episode, value, _)| (episode, value))
            .collect()
    }

    pub fn last(&self, series: Series) -> Option<f64> {
        self.records
            .iter()
            .rev()
            .find(|(_, _, s)| *s == series)
            .map(|&(_, value, _)| value)
    }
}

impl DiagnosticsSink for MemorySink {
    fn record(&mut self, episode: usize, value: f64, series: Series) -> io::Result<()> {
        self.records.push((episode, value, series));
        Ok(())
    }
}

/// Appends `episode,series,value` rows to a CSV file.
pub struct CsvSink {
    writer: BufWriter<File>,
}

impl CsvSink {
    /// Create (or truncate) the file and write the header row.
    pub fn create<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let mut writer = BufWriter::new(File::create(path)?);
        writeln!(writer, "episode,series,value")?;
        writer.flush()?;
        Ok(CsvSink { writer })
    }
}

impl DiagnosticsSink for CsvSink {
    fn record(&mut self, episode: usize, value: f64, series: Series) -> io::Result<()> {
        writeln!(self.writer, "{},{},{}", episode, series, value)?;
        self.writer.flush()
    }
}

impl<S: DiagnosticsSink + ?Sized> DiagnosticsSink for Box<S> {
    fn record(&mut self, episode: usize, value: f64, series: Series) -> io::Result<()> {
        (**self).record(episode, value, series)
    }
}

/// Lets the caller keep a handle on a sink it gave to the agent.
impl<S: DiagnosticsSink> DiagnosticsSink for Arc<Mutex<S>> {
    fn record(&mut self, episode: usize, value: f64, series: Series) -> io::Result<()> {
        self.lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "diagnostics sink lock poisoned"))?
            .record(episode, value, series)
    }
}
