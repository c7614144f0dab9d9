//! DBC file parser
//!
//! Parses Vector DBC files and keeps the parts needed to name messages.

use crate::signals::database::MessageDefinition;
use crate::types::{Result, ScanError};
use std::path::Path;

/// Bit 31 of a DBC message ID marks an extended (29-bit) frame
const EXTENDED_ID_FLAG: u32 = 0x8000_0000;

/// Parse a DBC file and return message definitions
pub fn parse_dbc_file(path: &Path) -> Result<Vec<MessageDefinition>> {
    log::info!("Parsing DBC file: {:?}", path);

    // Read as bytes first (handle non-UTF8 encodings)
    let bytes = std::fs::read(path).map_err(|e| {
        ScanError::DbcParseError(format!("Failed to read file {:?}: {}", path, e))
    })?;

    let dbc_content = match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => {
            // Latin-1 maps every byte straight to a char (compatible with Windows-1252)
            log::warn!("DBC file is not UTF-8, trying Latin-1 encoding");
            e.into_bytes().iter().map(|&b| b as char).collect()
        }
    };

    let source_filename = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("unknown.dbc");

    let messages = parse_dbc_str(&dbc_content, source_filename).map_err(|e| match e {
        ScanError::DbcParseError(msg) => {
            ScanError::DbcParseError(format!("{:?}: {}", path, msg))
        }
        other => other,
    })?;

    log::info!("Parsed {} messages from {:?}", messages.len(), path);

    Ok(messages)
}

/// Parse DBC text; `source` is recorded on every definition
pub fn parse_dbc_str(content: &str, source: &str) -> Result<Vec<MessageDefinition>> {
    let dbc = can_dbc::DBC::from_slice(content.as_bytes())
        .map_err(|e| ScanError::DbcParseError(format!("{:?}", e)))?;

    Ok(dbc
        .messages()
        .iter()
        .map(|msg| convert_message(msg, source))
        .collect())
}

/// Convert a can-dbc message to our MessageDefinition
fn convert_message(dbc_msg: &can_dbc::Message, source: &str) -> MessageDefinition {
    MessageDefinition {
        id: dbc_msg.message_id().0 & !EXTENDED_ID_FLAG,
        name: dbc_msg.message_name().to_string(),
        size: *dbc_msg.message_size() as usize,
        sender: match dbc_msg.transmitter() {
            can_dbc::Transmitter::NodeName(name) => Some(name.to_string()),
            _ => None,
        },
        signal_names: dbc_msg
            .signals()
            .iter()
            .map(|sig| sig.name().to_string())
            .collect(),
        source: source.to_string(),
    }
}
