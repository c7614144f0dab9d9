//! Log file readers (candump, JSON lines)
//!
//! This module contains readers for the supported recorded log formats.
//! Each reader implements an iterator pattern over BusEvent objects.

use crate::types::{BusEvent, Result, ScanError};
use std::path::Path;

pub mod candump;
pub mod jsonl;

// Re-export reader types
pub use candump::CandumpReader;
pub use jsonl::JsonLinesReader;

/// Largest payload a CAN-FD frame carries
pub const MAX_PAYLOAD_LEN: usize = 64;

/// Common trait for all log file readers
///
/// This trait provides a unified interface for reading different log file
/// formats. Each reader yields events in file order.
pub trait EventSource: Iterator<Item = Result<BusEvent>> + Sized {
    /// Open a log file and return an iterator over its events
    fn open(path: &Path) -> Result<Self>;
}

/// Recorded log formats, chosen by file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Candump,
    JsonLines,
}

impl LogFormat {
    /// Determine the format from a file extension
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|s| s.to_str())
            .map(|s| s.to_lowercase());

        match extension.as_deref() {
            Some("log") | Some("candump") => Ok(LogFormat::Candump),
            Some("jsonl") | Some("ndjson") => Ok(LogFormat::JsonLines),
            _ => Err(ScanError::UnsupportedFormat(format!(
                "{:?} (expected .log, .candump, .jsonl or .ndjson)",
                path
            ))),
        }
    }
}

/// Open a log file with the reader matching its extension
pub fn open_log(path: &Path) -> Result<Box<dyn Iterator<Item = Result<BusEvent>>>> {
    log::info!("Reading log file: {:?}", path);

    match LogFormat::from_path(path)? {
        LogFormat::Candump => {
            log::debug!("Detected candump log format");
            Ok(Box::new(<CandumpReader as EventSource>::open(path)?))
        }
        LogFormat::JsonLines => {
            log::debug!("Detected JSON lines log format");
            Ok(Box::new(<JsonLinesReader as EventSource>::open(path)?))
        }
    }
}

/// Read a whole log file into memory
///
/// The scanner needs a stable snapshot, so the first bad record aborts.
pub fn read_log(path: &Path) -> Result<Vec<BusEvent>> {
    let events = open_log(path)?.collect::<Result<Vec<_>>>()?;
    log::info!("Read {} events from {:?}", events.len(), path);
    Ok(events)
}

/// Check that a log file can be opened, with a parse error naming it
fn open_file(path: &Path) -> Result<std::fs::File> {
    if !path.exists() {
        return Err(ScanError::LogParseError(format!(
            "Log file not found: {:?}",
            path
        )));
    }

    std::fs::File::open(path).map_err(|e| {
        ScanError::LogParseError(format!("Failed to open log file {:?}: {}", path, e))
    })
}
