//! CAN Log Scanner Library
//!
//! Finds message addresses whose payloads appear for the first time right
//! after a given moment in a recorded CAN log. Used to correlate a user action
//! at a known time (pressing a button, opening a door) with the bus traffic it
//! newly triggers.
//!
//! # Architecture
//!
//! - Log readers turn candump / JSON lines files into an ordered stream of
//!   [`BusEvent`]s
//! - The [`scanner`] makes one pass over the stream and counts novel payloads
//!   per (address, bus)
//! - A DBC-backed [`SignalDatabase`] names the addresses for display
//!
//! The library does NOT:
//! - Decode signal values (payloads are opaque byte strings)
//! - Capture live traffic
//! - Render reports
//!
//! Rendering and configuration files are in the application layer (can-log-cli).
//!
//! # Example Usage
//!
//! ```no_run
//! use can_log_scanner::{formats, scan, AddressList, ScanConfig, SignalDatabase};
//! use std::path::Path;
//!
//! let events = formats::read_log(Path::new("drive.log")).unwrap();
//!
//! let config = ScanConfig::new(0.0, 12.0)
//!     .with_block_list(AddressList::parse("1a0, 3e9", "block list").into_addresses());
//!
//! let mut names = SignalDatabase::new();
//! let file = names.next_file();
//! for message in can_log_scanner::signals::dbc::parse_dbc_file(Path::new("body.dbc")).unwrap() {
//!     names.add_message(file, message);
//! }
//!
//! for row in scan(&events, &config).to_rows(&names) {
//!     println!("{} 0x{:x} bus {}: {}", row.display_name, row.address, row.bus, row.count);
//! }
//! ```

// Public modules
pub mod address_list;
pub mod config;
pub mod formats;
pub mod scanner;
pub mod signals;
pub mod types;

// Re-export main types for convenience
pub use address_list::AddressList;
pub use config::{parse_time_field, ScanConfig, DEFAULT_WINDOW_WIDTH};
pub use formats::{open_log, read_log, EventSource, LogFormat};
pub use scanner::{scan, sort_rows, NoveltyCounts, NoveltyScanner, ResultRow, ScanStats, SortColumn};
pub use signals::{MessageKey, MessageNameLookup, NoNames, SignalDatabase};
pub use types::{AddressBusKey, BusEvent, ObservationKey, Result, ScanError, Timestamp};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
