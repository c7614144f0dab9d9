//! Standalone novelty scan over a log file
//!
//! Usage:
//!   find_new_signals <log_file> <target_secs> [--dbc <file.dbc>]
//!
//! Example:
//!   find_new_signals drive.log 12 --dbc body.dbc

use can_log_scanner::signals::dbc;
use can_log_scanner::{formats, parse_time_field, scan, sort_rows, ScanConfig, SignalDatabase, SortColumn};
use std::env;
use std::path::PathBuf;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        eprintln!("Usage: {} <log_file> <target_secs> [--dbc <file.dbc>]", args[0]);
        std::process::exit(1);
    }

    let log_path = PathBuf::from(&args[1]);
    let target = parse_time_field(&args[2])?;

    let mut names = SignalDatabase::new();
    let mut i = 3;
    while i < args.len() {
        if args[i] == "--dbc" && i + 1 < args.len() {
            let file = names.next_file();
            for message in dbc::parse_dbc_file(&PathBuf::from(&args[i + 1]))? {
                names.add_message(file, message);
            }
            i += 2;
        } else {
            eprintln!("Unknown argument: {}", args[i]);
            std::process::exit(1);
        }
    }

    let events = formats::read_log(&log_path)?;
    let result = scan(&events, &ScanConfig::new(0.0, target));

    let mut rows = result.to_rows(&names);
    sort_rows(&mut rows, SortColumn::Count, true);

    println!("=== NEW PAYLOADS IN [{}s, {}s) ===", target, target + can_log_scanner::DEFAULT_WINDOW_WIDTH);
    for row in &rows {
        println!("{:<32} 0x{:<8x} bus {:<3} {}", row.display_name, row.address, row.bus, row.count);
    }
    println!("\n{} events scanned, {} message(s) with new payloads", result.stats().events, rows.len());

    Ok(())
}
