//! Message name database and DBC parser
//!
//! Names are only used to label result rows; the scanner itself works on
//! raw addresses.

pub mod dbc;
pub mod database;

// Re-export key types for convenience
pub use database::{
    DatabaseStats, FileId, MessageDefinition, MessageKey, MessageNameLookup, NoNames,
    SignalDatabase,
};
