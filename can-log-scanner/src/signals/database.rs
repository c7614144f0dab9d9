//! Message name database
//!
//! Combines message definitions from multiple DBC files into a single
//! queryable database. Only what is needed to name a message is kept.

use std::collections::HashMap;

/// Identifier of a loaded definition file (its load order index)
pub type FileId = u32;

/// Lookup key for message names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageKey {
    /// Which definition file to consult
    pub file: FileId,
    /// CAN message ID
    pub address: u32,
}

impl MessageKey {
    pub fn new(file: FileId, address: u32) -> Self {
        Self { file, address }
    }

    /// Key with the default file identifier (0)
    pub fn default_file(address: u32) -> Self {
        Self::new(0, address)
    }
}

/// Resolves a message address to a human-readable name
///
/// Purely cosmetic: the scanner never consults it.
pub trait MessageNameLookup {
    fn message_name(&self, key: MessageKey) -> Option<String>;
}

/// Lookup that knows no names
#[derive(Debug, Clone, Copy, Default)]
pub struct NoNames;

impl MessageNameLookup for NoNames {
    fn message_name(&self, _key: MessageKey) -> Option<String> {
        None
    }
}

/// A CAN message definition
#[derive(Debug, Clone)]
pub struct MessageDefinition {
    /// CAN message ID
    pub id: u32,
    /// Message name
    pub name: String,
    /// Message size in bytes
    pub size: usize,
    /// Sender ECU name (optional)
    pub sender: Option<String>,
    /// Names of the signals carried by this message
    pub signal_names: Vec<String>,
    /// Source file (DBC filename)
    pub source: String,
}

/// A definition together with the file it was loaded from
#[derive(Debug, Clone)]
struct StoredMessage {
    file: FileId,
    definition: MessageDefinition,
}

/// The unified message database
#[derive(Default)]
pub struct SignalDatabase {
    /// Key: CAN ID, Value: definitions with that ID in load order
    messages: HashMap<u32, Vec<StoredMessage>>,
    /// Number of files registered so far
    files: FileId,
}

impl SignalDatabase {
    /// Create a new empty database
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve the identifier for the next definition file
    pub fn next_file(&mut self) -> FileId {
        let file = self.files;
        self.files += 1;
        file
    }

    /// Add a message definition that came from `file`
    pub fn add_message(&mut self, file: FileId, message: MessageDefinition) {
        if file >= self.files {
            self.files = file + 1;
        }
        self.messages
            .entry(message.id)
            .or_default()
            .push(StoredMessage {
                file,
                definition: message,
            });
    }

    /// Get the first definition for a CAN ID, from any file
    pub fn get_message(&self, can_id: u32) -> Option<&MessageDefinition> {
        self.messages
            .get(&can_id)
            .and_then(|msgs| msgs.first())
            .map(|stored| &stored.definition)
    }

    /// Get the definition for a CAN ID from one specific file
    pub fn get_message_in_file(&self, file: FileId, can_id: u32) -> Option<&MessageDefinition> {
        self.messages
            .get(&can_id)?
            .iter()
            .find(|stored| stored.file == file)
            .map(|stored| &stored.definition)
    }

    /// Get database statistics
    pub fn stats(&self) -> DatabaseStats {
        let definitions = self.messages.values().flat_map(|v| v.iter());
        let (num_messages, num_signals) = definitions.fold((0, 0), |(m, s), stored| {
            (m + 1, s + stored.definition.signal_names.len())
        });

        DatabaseStats {
            num_files: self.files as usize,
            num_messages,
            num_signals,
        }
    }
}

impl MessageNameLookup for SignalDatabase {
    /// Prefers the definition from the requested file, otherwise the first
    /// one loaded for the address.
    fn message_name(&self, key: MessageKey) -> Option<String> {
        self.get_message_in_file(key.file, key.address)
            .or_else(|| self.get_message(key.address))
            .map(|msg| msg.name.clone())
    }
}

/// Database statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DatabaseStats {
    /// Number of definition files loaded
    pub num_files: usize,
    /// Total number of message definitions
    pub num_messages: usize,
    /// Total number of signal definitions
    pub num_signals: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(id: u32, name: &str, source: &str) -> MessageDefinition {
        MessageDefinition {
            id,
            name: name.to_string(),
            size: 8,
            sender: Some("ECU1".to_string()),
            signal_names: vec!["EngineSpeed".to_string(), "EngineTemp".to_string()],
            source: source.to_string(),
        }
    }

    #[test]
    fn test_empty_database() {
        let db = SignalDatabase::new();
        let stats = db.stats();
        assert_eq!(stats.num_messages, 0);
        assert_eq!(stats.num_signals, 0);
        assert_eq!(db.message_name(MessageKey::default_file(0x123)), None);
    }

    #[test]
    fn test_add_message() {
        let mut db = SignalDatabase::new();
        let file = db.next_file();
        db.add_message(file, message(0x123, "EngineData", "powertrain.dbc"));

        let stats = db.stats();
        assert_eq!(stats.num_files, 1);
        assert_eq!(stats.num_messages, 1);
        assert_eq!(stats.num_signals, 2);

        let msg = db.get_message(0x123).unwrap();
        assert_eq!(msg.name, "EngineData");
        assert_eq!(
            db.message_name(MessageKey::default_file(0x123)),
            Some("EngineData".to_string())
        );
    }

    #[test]
    fn test_lookup_prefers_requested_file() {
        let mut db = SignalDatabase::new();
        let first = db.next_file();
        let second = db.next_file();
        db.add_message(first, message(0x200, "Body_A", "a.dbc"));
        db.add_message(second, message(0x200, "Body_B", "b.dbc"));
        db.add_message(second, message(0x300, "OnlyInB", "b.dbc"));

        assert_eq!(db.message_name(MessageKey::new(second, 0x200)), Some("Body_B".to_string()));
        assert_eq!(db.message_name(MessageKey::new(first, 0x200)), Some("Body_A".to_string()));
        // Falls back to any file that defines the address
        assert_eq!(db.message_name(MessageKey::default_file(0x300)), Some("OnlyInB".to_string()));
        assert_eq!(db.stats().num_messages, 3);
    }
}
