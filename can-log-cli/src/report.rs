//! Report generation
//!
//! Renders the result rows of a scan as a TXT table or as JSON.

use anyhow::Result;
use can_log_scanner::{ResultRow, ScanConfig, ScanStats, Timestamp};
use serde::Serialize;
use std::fmt::Write;
use std::path::Path;

const HEADERS: [&str; 4] = ["Message Name", "Address", "Bus", "Count"];

/// Facts about the scan shown alongside the rows
pub struct ReportContext<'a> {
    pub log_path: &'a Path,
    pub first_event: Option<Timestamp>,
    pub last_event: Option<Timestamp>,
    pub config: &'a ScanConfig,
    pub stats: &'a ScanStats,
}

/// Render the TXT report: a summary block followed by the result table
pub fn render_txt(rows: &[ResultRow], ctx: &ReportContext<'_>) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "Log file:       {}", ctx.log_path.display());
    if let (Some(first), Some(last)) = (ctx.first_event, ctx.last_event) {
        let _ = writeln!(
            out,
            "Recorded:       {} .. {}",
            first.format("%Y-%m-%d %H:%M:%S%.3f"),
            last.format("%Y-%m-%d %H:%M:%S%.3f")
        );
    }
    let _ = writeln!(
        out,
        "Window:         start {}s, new in [{}s, {}s)",
        ctx.config.start_time,
        ctx.config.target_time,
        ctx.config.window_end()
    );
    let _ = writeln!(
        out,
        "Filters:        allow {}, block {}",
        format_addresses(ctx.config.allow_list.iter()),
        format_addresses(ctx.config.block_list.iter())
    );
    let _ = writeln!(
        out,
        "Events:         {} read, {} filtered by address, {} before start, {} after window",
        ctx.stats.events,
        ctx.stats.not_allowed + ctx.stats.blocked,
        ctx.stats.before_start,
        ctx.stats.after_window
    );
    let _ = writeln!(out, "Baseline:       {} distinct payloads", ctx.stats.baseline_payloads);
    let _ = writeln!(out, "Last event:     {:.3}s after log start", ctx.stats.last_event_time);
    out.push('\n');

    let cells: Vec<[String; 4]> = rows
        .iter()
        .map(|row| {
            [
                row.display_name.clone(),
                format!("{:x}", row.address),
                row.bus.to_string(),
                row.count.to_string(),
            ]
        })
        .collect();

    let mut widths = HEADERS.map(str::len);
    for line in &cells {
        for (width, cell) in widths.iter_mut().zip(line) {
            *width = (*width).max(cell.len());
        }
    }

    write_table_line(&mut out, &HEADERS.map(String::from), &widths);
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    let _ = writeln!(out, "{}", rule.join("-+-"));
    for line in &cells {
        write_table_line(&mut out, line, &widths);
    }

    let _ = writeln!(out, "\n{} message(s) with new payloads", rows.len());
    out
}

fn write_table_line(out: &mut String, cells: &[String; 4], widths: &[usize; 4]) {
    let padded: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
        .collect();
    let _ = writeln!(out, "{}", padded.join(" | ").trim_end());
}

fn format_addresses<'a>(addresses: impl Iterator<Item = &'a u32>) -> String {
    let mut sorted: Vec<u32> = addresses.copied().collect();
    if sorted.is_empty() {
        return "-".to_string();
    }
    sorted.sort_unstable();
    sorted
        .iter()
        .map(|a| format!("{:x}", a))
        .collect::<Vec<_>>()
        .join(",")
}

#[derive(Serialize)]
struct JsonReport<'a> {
    log: &'a Path,
    config: &'a ScanConfig,
    stats: &'a ScanStats,
    rows: &'a [ResultRow],
}

/// Render the JSON report
pub fn render_json(rows: &[ResultRow], ctx: &ReportContext<'_>) -> Result<String> {
    let report = JsonReport {
        log: ctx.log_path,
        config: ctx.config,
        stats: ctx.stats,
        rows,
    };
    let mut json = serde_json::to_string_pretty(&report)?;
    json.push('\n');
    Ok(json)
}
