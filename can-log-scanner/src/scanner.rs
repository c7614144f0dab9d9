//! Novelty scanner
//!
//! Finds message payloads that debut right after a target time. One forward
//! pass over the event stream splits payload observations into baseline
//! traffic (seen before the target) and novel traffic (first seen inside
//! `[target, target + width)`), then tallies novel payloads per address/bus.
//!
//! Counting is per distinct payload: the same new payload repeated inside the
//! window counts once.

use crate::config::ScanConfig;
use crate::signals::{MessageKey, MessageNameLookup};
use crate::types::{AddressBusKey, BusEvent, ObservationKey};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

/// Name shown for addresses the lookup knows nothing about
pub const UNTITLED: &str = "untitled";

/// Scan a complete event stream
///
/// Events must be in non-decreasing timestamp order. The first event of the
/// stream (filtered or not) defines time zero.
pub fn scan<'a, I>(events: I, config: &ScanConfig) -> NoveltyCounts
where
    I: IntoIterator<Item = &'a BusEvent>,
{
    let mut scanner = NoveltyScanner::new(config);
    for event in events {
        scanner.observe(event);
    }
    scanner.finish()
}

/// Incremental form of [`scan`]
///
/// Feed events in order with [`observe`](Self::observe) and collect the
/// tally with [`finish`](Self::finish).
pub struct NoveltyScanner<'c> {
    config: &'c ScanConfig,
    /// Timestamp of the first event seen (time zero)
    origin_ns: Option<u64>,
    /// Payloads already known per address
    seen: HashSet<ObservationKey>,
    counts: HashMap<AddressBusKey, usize>,
    stats: ScanStats,
}

impl<'c> NoveltyScanner<'c> {
    pub fn new(config: &'c ScanConfig) -> Self {
        Self {
            config,
            origin_ns: None,
            seen: HashSet::new(),
            counts: HashMap::new(),
            stats: ScanStats::default(),
        }
    }

    /// Process the next event of the stream
    pub fn observe(&mut self, event: &BusEvent) {
        let origin = *self.origin_ns.get_or_insert(event.timestamp_ns);
        self.stats.events += 1;

        if !self.config.is_allowed(event.address) {
            self.stats.not_allowed += 1;
            return;
        }
        if self.config.is_blocked(event.address) {
            self.stats.blocked += 1;
            return;
        }

        let event_time = event.seconds_since(origin);
        self.stats.last_event_time = event_time;

        if event_time < self.config.start_time {
            self.stats.before_start += 1;
            return;
        }

        let key = ObservationKey::from_event(event);

        if event_time < self.config.target_time {
            if self.seen.insert(key) {
                self.stats.baseline_payloads += 1;
            }
        } else if event_time < self.config.window_end() {
            if !self.seen.contains(&key) {
                log::trace!(
                    "New payload for 0x{:X} on bus {} at {:.3}s: {}",
                    event.address,
                    event.source,
                    event_time,
                    hex::encode(&event.data)
                );
                *self.counts.entry(event.address_bus()).or_insert(0) += 1;
                self.seen.insert(key);
            }
        } else {
            self.stats.after_window += 1;
        }
    }

    /// Statistics gathered so far
    pub fn stats(&self) -> &ScanStats {
        &self.stats
    }

    /// Finish the scan and return the tally
    pub fn finish(self) -> NoveltyCounts {
        log::debug!(
            "Scan done: {} events, {} not allowed, {} blocked, {} before start, {} after window, \
             {} baseline payloads, {} addresses with new payloads",
            self.stats.events,
            self.stats.not_allowed,
            self.stats.blocked,
            self.stats.before_start,
            self.stats.after_window,
            self.stats.baseline_payloads,
            self.counts.len()
        );

        NoveltyCounts {
            counts: self.counts,
            stats: self.stats,
        }
    }
}

/// Per-filter bookkeeping for one scan (informational only)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScanStats {
    /// Total events fed to the scanner
    pub events: usize,
    /// Dropped by a non-empty allow list
    pub not_allowed: usize,
    /// Dropped by the block list
    pub blocked: usize,
    /// Earlier than the start time
    pub before_start: usize,
    /// At or past the end of the candidate window
    pub after_window: usize,
    /// Distinct payloads recorded as baseline
    pub baseline_payloads: usize,
    /// Relative time (s) of the last event that passed the address filters
    pub last_event_time: f64,
}

/// Result of a scan: distinct new payloads per (address, bus)
#[derive(Debug, Clone, Default)]
pub struct NoveltyCounts {
    counts: HashMap<AddressBusKey, usize>,
    stats: ScanStats,
}

impl NoveltyCounts {
    pub fn get(&self, address: u32, bus: u8) -> Option<usize> {
        self.counts.get(&AddressBusKey::new(address, bus)).copied()
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Iterate over the tally in no particular order
    pub fn iter(&self) -> impl Iterator<Item = (&AddressBusKey, &usize)> {
        self.counts.iter()
    }

    pub fn stats(&self) -> &ScanStats {
        &self.stats
    }

    pub fn as_map(&self) -> &HashMap<AddressBusKey, usize> {
        &self.counts
    }

    /// Materialize display rows, naming each address through `names`
    ///
    /// Names are looked up with the default file identifier. Row order is
    /// unspecified; use [`sort_rows`] for presentation.
    pub fn to_rows(&self, names: &dyn MessageNameLookup) -> Vec<ResultRow> {
        self.counts
            .iter()
            .map(|(key, &count)| ResultRow {
                display_name: names
                    .message_name(MessageKey::default_file(key.address))
                    .unwrap_or_else(|| UNTITLED.to_string()),
                address: key.address,
                bus: key.bus,
                count,
            })
            .collect()
    }
}

/// One line of the result table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultRow {
    pub display_name: String,
    pub address: u32,
    pub bus: u8,
    pub count: usize,
}

/// Column to sort result rows by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortColumn {
    Name,
    #[default]
    Address,
    Bus,
    Count,
}

/// Sort rows by a column; ties fall back to (address, bus)
pub fn sort_rows(rows: &mut [ResultRow], column: SortColumn, descending: bool) {
    rows.sort_by(|a, b| {
        let primary = match column {
            SortColumn::Name => a.display_name.cmp(&b.display_name),
            SortColumn::Address => Ordering::Equal,
            SortColumn::Bus => a.bus.cmp(&b.bus),
            SortColumn::Count => a.count.cmp(&b.count),
        };
        let ordering = primary.then_with(|| (a.address, a.bus).cmp(&(b.address, b.bus)));
        if descending {
            ordering.reverse()
        } else {
            ordering
        }
    });
}
