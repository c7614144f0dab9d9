//! JSON lines log reader and writer
//!
//! One event per line:
//!
//! ```text
//! {"address":291,"bus":0,"mono_time":1000000000,"data":"deadbeef"}
//! ```
//!
//! `mono_time` is in nanoseconds, `data` is hex.

use crate::formats::{open_file, EventSource, MAX_PAYLOAD_LEN};
use crate::types::{BusEvent, Result, ScanError};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader, Lines, Write};
use std::path::Path;

/// On-disk form of a bus event
#[derive(Debug, Serialize, Deserialize)]
struct JsonEvent {
    address: u32,
    bus: u8,
    mono_time: u64,
    data: String,
}

impl From<&BusEvent> for JsonEvent {
    fn from(event: &BusEvent) -> Self {
        Self {
            address: event.address,
            bus: event.source,
            mono_time: event.timestamp_ns,
            data: hex::encode(&event.data),
        }
    }
}

impl TryFrom<JsonEvent> for BusEvent {
    type Error = String;

    fn try_from(record: JsonEvent) -> std::result::Result<Self, Self::Error> {
        let data = hex::decode(&record.data)
            .map_err(|e| format!("invalid data '{}': {}", record.data, e))?;
        if data.len() > MAX_PAYLOAD_LEN {
            return Err(format!("payload longer than {} bytes: {}", MAX_PAYLOAD_LEN, data.len()));
        }
        Ok(BusEvent::new(record.address, record.bus, record.mono_time, data))
    }
}

/// Iterator over the events of a JSON lines log
pub struct JsonLinesReader<R: BufRead = BufReader<File>> {
    lines: Lines<R>,
    line_number: usize,
}

impl<R: BufRead> JsonLinesReader<R> {
    pub fn from_reader(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line_number: 0,
        }
    }
}

impl EventSource for JsonLinesReader<BufReader<File>> {
    fn open(path: &Path) -> Result<Self> {
        let file = open_file(path)?;
        Ok(Self::from_reader(BufReader::new(file)))
    }
}

impl<R: BufRead> Iterator for JsonLinesReader<R> {
    type Item = Result<BusEvent>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(e) => return Some(Err(e.into())),
            };
            self.line_number += 1;

            if line.trim().is_empty() {
                continue;
            }

            let parsed = serde_json::from_str::<JsonEvent>(&line)
                .map_err(|e| e.to_string())
                .and_then(BusEvent::try_from);

            return Some(parsed.map_err(|reason| {
                ScanError::LogParseError(format!("JSON line {}: {}", self.line_number, reason))
            }));
        }
    }
}

/// Write events as JSON lines
pub fn write_events<'a, W, I>(writer: &mut W, events: I) -> Result<usize>
where
    W: Write,
    I: IntoIterator<Item = &'a BusEvent>,
{
    let mut written = 0;
    for event in events {
        serde_json::to_writer(&mut *writer, &JsonEvent::from(event))
            .map_err(|e| ScanError::IoError(e.into()))?;
        writer.write_all(b"\n")?;
        written += 1;
    }
    writer.flush()?;
    Ok(written)
}
