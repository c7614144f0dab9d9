// Invariants of the novelty scan over generated event streams
use can_log_scanner::{scan, AddressList, BusEvent, ScanConfig};
use proptest::prelude::*;
use std::collections::{HashMap, HashSet};

const SEC: u64 = 1_000_000_000;

/// Ordered streams over a handful of addresses and short payloads, so that
/// payloads collide often enough to exercise the seen set
fn event_stream() -> impl Strategy<Value = Vec<BusEvent>> {
    prop::collection::vec(
        (
            0u64..(SEC / 2),
            prop::sample::select(vec![0x100u32, 0x101, 0x200, 0x7DF]),
            0u8..2,
            prop::collection::vec(0u8..3, 0..3),
        ),
        0..80,
    )
    .prop_map(|steps| {
        let mut now = 0;
        steps
            .into_iter()
            .map(|(delta, address, bus, data)| {
                now += delta;
                BusEvent::new(address, bus, now, data)
            })
            .collect()
    })
}

fn address_set() -> impl Strategy<Value = HashSet<u32>> {
    prop::collection::hash_set(prop::sample::select(vec![0x100u32, 0x101, 0x200, 0x7DF]), 0..3)
}

proptest! {
    #[test]
    fn scan_is_deterministic(events in event_stream(), start in 0i64..10, target in 0i64..10) {
        let config = ScanConfig::new(start as f64, target as f64);
        let first = scan(&events, &config);
        let second = scan(&events, &config);
        prop_assert_eq!(first.as_map(), second.as_map());
    }

    #[test]
    fn results_stay_inside_allow_list(events in event_stream(), allow in address_set(), target in 0i64..10) {
        prop_assume!(!allow.is_empty());
        let config = ScanConfig::new(0.0, target as f64).with_allow_list(allow.clone());
        for (key, _) in scan(&events, &config).iter() {
            prop_assert!(allow.contains(&key.address));
        }
    }

    #[test]
    fn block_list_always_wins(events in event_stream(), allow in address_set(), block in address_set()) {
        let config = ScanConfig::new(0.0, 1.0)
            .with_allow_list(allow)
            .with_block_list(block.clone());
        for (key, _) in scan(&events, &config).iter() {
            prop_assert!(!block.contains(&key.address));
        }
    }

    #[test]
    fn count_never_exceeds_distinct_window_payloads(events in event_stream(), target in 0i64..10) {
        let config = ScanConfig::new(0.0, target as f64);
        let origin = events.first().map(|e| e.timestamp_ns).unwrap_or(0);

        let mut distinct: HashMap<(u32, u8), HashSet<Vec<u8>>> = HashMap::new();
        for event in &events {
            let t = event.seconds_since(origin);
            if t >= config.target_time && t < config.window_end() {
                distinct.entry((event.address, event.source)).or_default().insert(event.data.clone());
            }
        }

        for (key, &count) in scan(&events, &config).iter() {
            prop_assert!(count >= 1);
            prop_assert!(count <= distinct[&(key.address, key.bus)].len());
        }
    }
}

#[test]
fn baseline_payload_replayed_in_window_is_not_new() {
    let events = vec![
        BusEvent::new(0x100, 0, 0, vec![0x01]),
        BusEvent::new(0x100, 0, SEC / 2, vec![0x01]),
        BusEvent::new(0x100, 0, 3 * SEC, vec![0x01]),
        BusEvent::new(0x100, 0, 4 * SEC, vec![0x01]),
    ];
    assert!(scan(&events, &ScanConfig::new(0.0, 3.0)).is_empty());
}

#[test]
fn text_inputs_feed_a_scan() {
    // Allow list typed with a stray empty token and a typo
    let allow = AddressList::parse("100, , zz, 200", "allow list");
    assert_eq!(allow.rejected, vec!["zz".to_string()]);

    let start = can_log_scanner::parse_time_field("0").unwrap();
    let target = can_log_scanner::parse_time_field("1").unwrap();
    let config = ScanConfig::new(start, target).with_allow_list(allow.into_addresses());

    let events = vec![
        BusEvent::new(0x100, 0, 0, vec![0]),
        BusEvent::new(0x100, 0, SEC, vec![1]),
        BusEvent::new(0x200, 1, SEC + 1, vec![1]),
        BusEvent::new(0x300, 0, SEC + 2, vec![1]),
    ];
    let result = scan(&events, &config);

    assert_eq!(result.len(), 2);
    assert_eq!(result.get(0x100, 0), Some(1));
    assert_eq!(result.get(0x200, 1), Some(1));
}

#[test]
fn candump_log_end_to_end() {
    use std::io::Write;

    let mut log = tempfile::Builder::new().suffix(".log").tempfile().unwrap();
    writeln!(log, "(1700000000.000000) can0 100#41").unwrap();
    writeln!(log, "(1700000000.500000) can0 100#41").unwrap();
    writeln!(log, "(1700000003.000000) can0 100#42").unwrap();
    writeln!(log, "(1700000003.500000) can0 100#42").unwrap();
    writeln!(log, "(1700000006.000000) can0 100#43").unwrap();
    log.flush().unwrap();

    let events = can_log_scanner::read_log(log.path()).unwrap();
    let result = scan(&events, &ScanConfig::new(0.0, 3.0));

    assert_eq!(result.len(), 1);
    assert_eq!(result.get(0x100, 0), Some(1));
}
