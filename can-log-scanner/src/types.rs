//! Core types for the CAN log scanner library
//!
//! This module defines the bus event model read from log files, the composite
//! keys the scanner works with, and the error type shared by the library.
//! Events are immutable once read - the scanner only looks at them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Timestamp type used when rendering absolute log times
pub type Timestamp = DateTime<Utc>;

/// Result type for scanner operations
pub type Result<T> = std::result::Result<T, ScanError>;

/// A single recorded bus message
///
/// This represents one frame as read from a log file. The payload is treated
/// as an opaque byte string; no signal decoding happens at this level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusEvent {
    /// Message identifier (11-bit or 29-bit CAN ID)
    pub address: u32,
    /// Bus / channel the frame was received on
    pub source: u8,
    /// Monotonic timestamp in nanoseconds
    pub timestamp_ns: u64,
    /// Frame data bytes (0-8 bytes for classic CAN, up to 64 for CAN-FD)
    pub data: Vec<u8>,
}

impl BusEvent {
    /// Create a new bus event
    pub fn new(address: u32, source: u8, timestamp_ns: u64, data: impl Into<Vec<u8>>) -> Self {
        Self {
            address,
            source,
            timestamp_ns,
            data: data.into(),
        }
    }

    /// Convert the timestamp to DateTime<Utc>
    ///
    /// Only meaningful for logs that record wall-clock time (candump does).
    pub fn timestamp(&self) -> Option<Timestamp> {
        let secs = (self.timestamp_ns / 1_000_000_000) as i64;
        let nsecs = (self.timestamp_ns % 1_000_000_000) as u32;
        DateTime::from_timestamp(secs, nsecs)
    }

    /// Seconds elapsed since `origin_ns`
    ///
    /// Negative if the event is older than the origin.
    pub fn seconds_since(&self, origin_ns: u64) -> f64 {
        self.timestamp_ns.wrapping_sub(origin_ns) as i64 as f64 / 1e9
    }

    /// Get the data length code (DLC) - number of data bytes
    pub fn dlc(&self) -> usize {
        self.data.len()
    }

    /// The (address, bus) pair this event belongs to
    pub fn address_bus(&self) -> AddressBusKey {
        AddressBusKey {
            address: self.address,
            bus: self.source,
        }
    }
}

/// "Have we seen this exact payload for this address" key
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObservationKey {
    pub address: u32,
    pub payload: Vec<u8>,
}

impl ObservationKey {
    pub fn from_event(event: &BusEvent) -> Self {
        Self {
            address: event.address,
            payload: event.data.clone(),
        }
    }
}

/// Physical message / bus pair that novel payloads are tallied under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AddressBusKey {
    pub address: u32,
    pub bus: u8,
}

impl AddressBusKey {
    pub fn new(address: u32, bus: u8) -> Self {
        Self { address, bus }
    }
}

impl fmt::Display for AddressBusKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:X}@{}", self.address, self.bus)
    }
}

/// Errors that can occur while loading inputs for a scan
///
/// The scan itself cannot fail; everything here happens before it runs.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("Invalid time input '{input}': {reason}")]
    InvalidTime { input: String, reason: String },

    #[error("Failed to parse log file: {0}")]
    LogParseError(String),

    #[error("Failed to parse DBC file: {0}")]
    DbcParseError(String),

    #[error("Unsupported log format: {0}")]
    UnsupportedFormat(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}
