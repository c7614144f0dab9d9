//! candump log file reader
//!
//! Reads the text format written by `candump -l` (SocketCAN can-utils):
//!
//! ```text
//! (1436509052.249713) can0 123#DEADBEEF
//! (1436509052.250101) can1 18FEF1FE##1112233
//! (1436509052.251000) can0 7DF#R
//! ```
//!
//! - Classic frames: `<id>#<hex data>`
//! - CAN-FD frames: `<id>##<flags nibble><hex data>`
//! - Remote frames: `<id>#R[dlc]` (read with an empty payload)
//!
//! The bus id is the trailing number of the interface name (`can1` -> 1).
//! Interfaces without a number are numbered in order of first appearance.

use crate::formats::{open_file, EventSource, MAX_PAYLOAD_LEN};
use crate::types::{BusEvent, Result, ScanError};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::Path;

/// Iterator over the events of a candump log
pub struct CandumpReader<R: BufRead = BufReader<File>> {
    lines: Lines<R>,
    line_number: usize,
    buses: BusNumbering,
}

impl<R: BufRead> CandumpReader<R> {
    /// Read candump text from any buffered reader
    pub fn from_reader(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line_number: 0,
            buses: BusNumbering::default(),
        }
    }
}

impl EventSource for CandumpReader<BufReader<File>> {
    fn open(path: &Path) -> Result<Self> {
        let file = open_file(path)?;
        Ok(Self::from_reader(BufReader::new(file)))
    }
}

impl<R: BufRead> Iterator for CandumpReader<R> {
    type Item = Result<BusEvent>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(e) => return Some(Err(e.into())),
            };
            self.line_number += 1;

            let line = line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
                continue;
            }

            return Some(parse_line(line, &mut self.buses).map_err(|reason| {
                ScanError::LogParseError(format!("candump line {}: {}", self.line_number, reason))
            }));
        }
    }
}

/// Maps interface names to bus numbers
#[derive(Debug, Default)]
struct BusNumbering {
    assigned: HashMap<String, u8>,
    next_unnumbered: u8,
}

impl BusNumbering {
    fn bus_for(&mut self, interface: &str) -> std::result::Result<u8, String> {
        if let Some(&bus) = self.assigned.get(interface) {
            return Ok(bus);
        }

        let name = interface.trim_end_matches(|c: char| c.is_ascii_digit());
        let bus = match &interface[name.len()..] {
            "" => {
                let bus = self.next_unnumbered;
                self.next_unnumbered = self.next_unnumbered.saturating_add(1);
                bus
            }
            digits => digits
                .parse::<u8>()
                .map_err(|_| format!("interface number out of range: {}", interface))?,
        };

        log::debug!("Interface {} is bus {}", interface, bus);
        self.assigned.insert(interface.to_string(), bus);
        Ok(bus)
    }
}

fn parse_line(line: &str, buses: &mut BusNumbering) -> std::result::Result<BusEvent, String> {
    let mut fields = line.split_whitespace();

    let timestamp = fields.next().ok_or("missing timestamp")?;
    let interface = fields.next().ok_or("missing interface")?;
    let frame = fields.next().ok_or("missing frame")?;

    let timestamp_ns = parse_timestamp(timestamp)?;
    let source = buses.bus_for(interface)?;
    let (address, data) = parse_frame(frame)?;

    Ok(BusEvent {
        address,
        source,
        timestamp_ns,
        data,
    })
}

/// Parse `(<secs>.<fraction>)` into nanoseconds
fn parse_timestamp(field: &str) -> std::result::Result<u64, String> {
    let inner = field
        .strip_prefix('(')
        .and_then(|s| s.strip_suffix(')'))
        .ok_or_else(|| format!("malformed timestamp: {}", field))?;

    let (secs, fraction) = inner.split_once('.').unwrap_or((inner, ""));
    let bad = || format!("malformed timestamp: {}", field);

    if !fraction.bytes().all(|b| b.is_ascii_digit()) {
        return Err(bad());
    }
    let secs: u64 = secs.parse().map_err(|_| bad())?;

    // Right-pad (or cut) the fraction to nanoseconds
    let mut nanos: u64 = 0;
    for i in 0..9 {
        let digit = fraction.as_bytes().get(i).map(|b| (b - b'0') as u64).unwrap_or(0);
        nanos = nanos * 10 + digit;
    }

    secs.checked_mul(1_000_000_000)
        .and_then(|ns| ns.checked_add(nanos))
        .ok_or_else(bad)
}

/// Parse `<id>#<data>` / `<id>##<flags><data>` / `<id>#R`
fn parse_frame(frame: &str) -> std::result::Result<(u32, Vec<u8>), String> {
    let (id, rest) = frame
        .split_once('#')
        .ok_or_else(|| format!("missing '#' in frame: {}", frame))?;

    if id.is_empty() || id.len() > 8 {
        return Err(format!("invalid CAN ID: {}", id));
    }
    let address = u32::from_str_radix(id, 16).map_err(|_| format!("invalid CAN ID: {}", id))?;

    let payload = if let Some(fd) = rest.strip_prefix('#') {
        // First character is the CAN-FD flags nibble
        let mut chars = fd.chars();
        match chars.next() {
            Some(c) if c.is_ascii_hexdigit() => chars.as_str(),
            _ => return Err(format!("missing CAN-FD flags: {}", frame)),
        }
    } else if rest.starts_with('R') || rest.starts_with('r') {
        return Ok((address, Vec::new()));
    } else {
        rest
    };

    let data = hex::decode(payload).map_err(|e| format!("invalid data '{}': {}", payload, e))?;
    if data.len() > MAX_PAYLOAD_LEN {
        return Err(format!("payload longer than {} bytes: {}", MAX_PAYLOAD_LEN, data.len()));
    }

    Ok((address, data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};
    use tempfile::NamedTempFile;

    fn read_all(text: &str) -> Vec<Result<BusEvent>> {
        CandumpReader::from_reader(Cursor::new(text.to_string())).collect()
    }

    #[test]
    fn test_classic_fd_and_remote_frames() {
        let events = read_all(
            "(1436509052.249713) can0 123#DEADBEEF\n\
             (1436509052.250101) can1 18FEF1FE##1112233\n\
             (1436509052.251000) can0 7DF#R\n",
        );
        let events: Vec<BusEvent> = events.into_iter().map(|e| e.unwrap()).collect();

        assert_eq!(events.len(), 3);
        assert_eq!(events[0], BusEvent::new(0x123, 0, 1_436_509_052_249_713_000, vec![0xDE, 0xAD, 0xBE, 0xEF]));
        assert_eq!(events[1].address, 0x18FE_F1FE);
        assert_eq!(events[1].source, 1);
        assert_eq!(events[1].data, vec![0x11, 0x22, 0x33]);
        assert_eq!(events[2].address, 0x7DF);
        assert!(events[2].data.is_empty());
    }

    #[test]
    fn test_skips_blank_and_comment_lines() {
        let events = read_all("\n# recorded on the bench\n(1.5) can0 100#\n\n");
        assert_eq!(events.len(), 1);
        let event = events.into_iter().next().unwrap().unwrap();
        assert_eq!(event.timestamp_ns, 1_500_000_000);
        assert!(event.data.is_empty());
    }

    #[test]
    fn test_unnumbered_interfaces_in_order_of_appearance() {
        let events = read_all(
            "(1.0) vcan 100#01\n\
             (1.1) slcan 100#01\n\
             (1.2) vcan 100#01\n",
        );
        let buses: Vec<u8> = events.into_iter().map(|e| e.unwrap().source).collect();
        assert_eq!(buses, vec![0, 1, 0]);
    }

    #[test]
    fn test_non_ascii_interface_names() {
        let events = read_all("(1.0) canä 100#01\n(1.1) bü1 100#01\n(1.2) canä 100#02\n");
        let buses: Vec<u8> = events.into_iter().map(|e| e.unwrap().source).collect();
        assert_eq!(buses, vec![0, 1, 0]);
    }

    #[test]
    fn test_malformed_line_reports_line_number() {
        let events = read_all("(1.0) can0 100#01\n(1.1) can0 100#0\n(1.2) can0 100#02\n");
        assert_eq!(events.len(), 3);
        match &events[1] {
            Err(ScanError::LogParseError(msg)) => assert!(msg.contains("line 2"), "{}", msg),
            other => panic!("expected parse error, got {:?}", other),
        }
        assert!(events[2].is_ok());
    }

    #[test]
    fn test_timestamp_parsing() {
        assert_eq!(parse_timestamp("(0.000001)").unwrap(), 1_000);
        assert_eq!(parse_timestamp("(12)").unwrap(), 12_000_000_000);
        assert_eq!(parse_timestamp("(1.1234567891)").unwrap(), 1_123_456_789);
        assert!(parse_timestamp("1.0").is_err());
        assert!(parse_timestamp("(1.x)").is_err());
    }

    #[test]
    fn test_frame_errors() {
        assert!(parse_frame("123DEADBEEF").is_err());
        assert!(parse_frame("XYZ#00").is_err());
        assert!(parse_frame("123456789#00").is_err());
        assert!(parse_frame("123##").is_err());
        assert!(parse_frame(&format!("123##0{}", "00".repeat(64))).is_ok());
        assert!(parse_frame(&format!("123##0{}", "00".repeat(65))).is_err());
    }

    #[test]
    fn test_open_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "(100.0) can2 1A0#0102").unwrap();
        writeln!(temp_file, "(100.5) can2 1A0#0103").unwrap();
        temp_file.flush().unwrap();

        let events: Vec<BusEvent> = <CandumpReader as EventSource>::open(temp_file.path())
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].source, 2);
        assert_eq!(events[1].seconds_since(events[0].timestamp_ns), 0.5);
    }
}
