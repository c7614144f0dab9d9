//! Scan configuration types
//!
//! This module defines the parameters of a single novelty scan: the time
//! window and the address filters. Times are seconds relative to the first
//! event of the log, not absolute wall time.

use crate::types::{Result, ScanError};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Lookahead past the target time during which new payloads still count
pub const DEFAULT_WINDOW_WIDTH: f64 = 2.0;

/// Configuration for one novelty scan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Events before this time (seconds) are ignored entirely
    #[serde(default)]
    pub start_time: f64,

    /// Pivot time (seconds): payloads seen before it form the baseline
    pub target_time: f64,

    /// Width of the candidate window `[target, target + width)` in seconds
    #[serde(default = "default_window_width")]
    pub window_width: f64,

    /// Addresses excluded unconditionally
    #[serde(default)]
    pub block_list: HashSet<u32>,

    /// If non-empty, only these addresses are scanned
    #[serde(default)]
    pub allow_list: HashSet<u32>,
}

fn default_window_width() -> f64 {
    DEFAULT_WINDOW_WIDTH
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            start_time: 0.0,
            target_time: 0.0,
            window_width: DEFAULT_WINDOW_WIDTH,
            block_list: HashSet::new(),
            allow_list: HashSet::new(),
        }
    }
}

impl ScanConfig {
    /// Create a scan configuration for the given start and target times
    pub fn new(start_time: f64, target_time: f64) -> Self {
        Self {
            start_time,
            target_time,
            ..Self::default()
        }
    }

    /// Builder method: set the candidate window width
    pub fn with_window_width(mut self, width: f64) -> Self {
        self.window_width = width;
        self
    }

    /// Builder method: set the block list
    pub fn with_block_list(mut self, addresses: impl IntoIterator<Item = u32>) -> Self {
        self.block_list = addresses.into_iter().collect();
        self
    }

    /// Builder method: set the allow list
    pub fn with_allow_list(mut self, addresses: impl IntoIterator<Item = u32>) -> Self {
        self.allow_list = addresses.into_iter().collect();
        self
    }

    /// End of the candidate window (exclusive)
    pub fn window_end(&self) -> f64 {
        self.target_time + self.window_width
    }

    /// Check if an address passes the allow list
    pub fn is_allowed(&self, address: u32) -> bool {
        self.allow_list.is_empty() || self.allow_list.contains(&address)
    }

    /// Check if an address is on the block list
    pub fn is_blocked(&self, address: u32) -> bool {
        self.block_list.contains(&address)
    }

    /// Check if an address should be scanned at all (block wins over allow)
    pub fn should_scan_address(&self, address: u32) -> bool {
        self.is_allowed(address) && !self.is_blocked(address)
    }
}

/// Parse a time text field as whole seconds
///
/// Only base-10 integers are accepted, so sub-second targets cannot be
/// expressed through this path. Callers needing them build `ScanConfig`
/// directly.
pub fn parse_time_field(input: &str) -> Result<f64> {
    let trimmed = input.trim();
    trimmed
        .parse::<i64>()
        .map(|secs| secs as f64)
        .map_err(|e| ScanError::InvalidTime {
            input: input.to_string(),
            reason: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_config_builder() {
        let config = ScanConfig::new(1.0, 3.0)
            .with_window_width(0.5)
            .with_block_list([0x200])
            .with_allow_list([0x100, 0x200]);

        assert_eq!(config.start_time, 1.0);
        assert_eq!(config.target_time, 3.0);
        assert_eq!(config.window_end(), 3.5);
        assert!(config.should_scan_address(0x100));
        assert!(!config.should_scan_address(0x200)); // Blocked despite being allowed
        assert!(!config.should_scan_address(0x300)); // Not on the allow list
    }

    #[test]
    fn test_no_filters() {
        let config = ScanConfig::new(0.0, 0.0);

        assert_eq!(config.window_width, DEFAULT_WINDOW_WIDTH);
        assert!(config.should_scan_address(0x123));
        assert!(config.should_scan_address(0x1FFF_FFFF));
    }

    #[test]
    fn test_parse_time_field() {
        assert_eq!(parse_time_field("12").unwrap(), 12.0);
        assert_eq!(parse_time_field(" 3 ").unwrap(), 3.0);
        assert_eq!(parse_time_field("-1").unwrap(), -1.0);
    }

    #[test]
    fn test_parse_time_field_rejects_non_integers() {
        for input in ["", "abc", "1.5", "0x10"] {
            match parse_time_field(input) {
                Err(ScanError::InvalidTime { input: got, .. }) => assert_eq!(got, input),
                other => panic!("expected InvalidTime for {:?}, got {:?}", input, other),
            }
        }
    }

    #[test]
    fn test_config_deserialization_defaults() {
        let config: ScanConfig = serde_json::from_str(r#"{"target_time": 3.0}"#).unwrap();
        assert_eq!(config.start_time, 0.0);
        assert_eq!(config.window_width, DEFAULT_WINDOW_WIDTH);
        assert!(config.block_list.is_empty());
        assert!(config.allow_list.is_empty());
    }
}
