//! CAN Log Scanner CLI Application
//!
//! Command-line front end for the can-log-scanner library:
//! - Reads a recorded CAN log (candump or JSON lines)
//! - Names messages from DBC files
//! - Runs the novelty scan around a target time
//! - Prints the result table (TXT/JSON)

use anyhow::{Context, Result};
use can_log_scanner::signals::dbc;
use can_log_scanner::{
    formats, parse_time_field, scan, sort_rows, AddressList, BusEvent, ScanConfig, SignalDatabase,
    SortColumn, DEFAULT_WINDOW_WIDTH,
};
use clap::Parser;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

mod config;
mod report;

use config::{AppConfig, OutputFormat};
use report::ReportContext;

/// CAN Log Scanner - Find messages whose payloads appear right after a moment
#[derive(Parser, Debug)]
#[command(name = "can-log-cli")]
#[command(about = "Find CAN messages with new payloads after a target time", long_about = None)]
#[command(version)]
struct Args {
    /// Path to a candump (.log) or JSON lines (.jsonl) log file
    #[arg(short, long, value_name = "FILE")]
    log: Option<PathBuf>,

    /// Path to DBC file(s) used to name messages (can be repeated)
    #[arg(long, value_name = "FILE")]
    dbc: Vec<PathBuf>,

    /// Ignore events before this time (whole seconds from log start)
    #[arg(long, value_name = "SECS", allow_hyphen_values = true)]
    start: Option<String>,

    /// Target time (whole seconds from log start); payloads seen before it are baseline
    #[arg(long, value_name = "SECS", allow_hyphen_values = true)]
    target: Option<String>,

    /// Seconds after the target during which new payloads are counted
    #[arg(long, value_name = "SECS")]
    window: Option<f64>,

    /// Comma separated hex addresses to ignore
    #[arg(long, value_name = "LIST")]
    block: Option<String>,

    /// Comma separated hex addresses to allow (all if empty)
    #[arg(long, value_name = "LIST")]
    allow: Option<String>,

    /// Column to sort the result table by
    #[arg(long, value_enum)]
    sort: Option<SortBy>,

    /// Sort in descending order
    #[arg(long, conflicts_with = "ascending")]
    descending: bool,

    /// Sort in ascending order (overrides `descending` from the config file)
    #[arg(long)]
    ascending: bool,

    /// Report format
    #[arg(long, value_enum)]
    format: Option<OutputFormat>,

    /// Output file for the report (default: stdout)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Also write the loaded events as JSON lines to this file
    #[arg(long, value_name = "FILE")]
    export: Option<PathBuf>,

    /// Path to configuration file (config.toml)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Verbosity level (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long)]
    quiet: bool,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum SortBy {
    Name,
    Address,
    Bus,
    Count,
}

impl From<SortBy> for SortColumn {
    fn from(sort: SortBy) -> Self {
        match sort {
            SortBy::Name => SortColumn::Name,
            SortBy::Address => SortColumn::Address,
            SortBy::Bus => SortColumn::Bus,
            SortBy::Count => SortColumn::Count,
        }
    }
}

/// Everything needed for one run, after merging config file and arguments
#[derive(Debug)]
struct Request {
    log: PathBuf,
    dbc_files: Vec<PathBuf>,
    scan: ScanConfig,
    sort: SortColumn,
    descending: bool,
    format: OutputFormat,
    output: Option<PathBuf>,
    export: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(args.verbose, args.quiet);

    log::info!("CAN Log Scanner CLI v{}", env!("CARGO_PKG_VERSION"));
    log::debug!("Using scanner library v{}", can_log_scanner::VERSION);

    let file_config = match &args.config {
        Some(path) => {
            log::info!("Loading configuration from: {:?}", path);
            config::load_config(path)?
        }
        None => AppConfig::default(),
    };

    // Time fields are validated before any file is touched
    let request = build_request(args, file_config)?;
    run(&request)
}

/// Merge command line and config file; command line wins
fn build_request(args: Args, file_config: AppConfig) -> Result<Request> {
    let AppConfig {
        input,
        scan: scan_section,
        output,
    } = file_config;

    let log = args
        .log
        .or(input.log)
        .context("No log file specified (use --log or [input] log in the config file)")?;

    let start_text = args
        .start
        .or_else(|| scan_section.start.map(|t| t.as_text()))
        .unwrap_or_else(|| "0".to_string());
    let target_text = args
        .target
        .or_else(|| scan_section.target.map(|t| t.as_text()))
        .context("No target time specified (use --target or [scan] target)")?;

    let start_time = parse_time_field(&start_text).context("Invalid start time")?;
    let target_time = parse_time_field(&target_text).context("Invalid target time")?;

    let window = args
        .window
        .or(scan_section.window)
        .unwrap_or(DEFAULT_WINDOW_WIDTH);
    if !(window.is_finite() && window >= 0.0) {
        anyhow::bail!("Invalid window width: {}", window);
    }

    let block_text = args
        .block
        .or_else(|| scan_section.block.map(|b| b.as_text()))
        .unwrap_or_default();
    let allow_text = args
        .allow
        .or_else(|| scan_section.allow.map(|a| a.as_text()))
        .unwrap_or_default();

    let scan = ScanConfig::new(start_time, target_time)
        .with_window_width(window)
        .with_block_list(AddressList::parse(&block_text, "block list").into_addresses())
        .with_allow_list(AddressList::parse(&allow_text, "allow list").into_addresses());

    let mut dbc_files = input.dbc_files;
    dbc_files.extend(args.dbc);

    Ok(Request {
        log,
        dbc_files,
        scan,
        sort: args.sort.map(SortColumn::from).unwrap_or(output.sort),
        descending: if args.ascending {
            false
        } else {
            args.descending || output.descending
        },
        format: args.format.unwrap_or(output.format),
        output: args.output.or(output.file),
        export: args.export,
    })
}

fn run(request: &Request) -> Result<()> {
    let names = load_names(&request.dbc_files)?;

    let events = formats::read_log(&request.log)
        .with_context(|| format!("Failed to read log file: {:?}", request.log))?;

    if let Some(path) = &request.export {
        export_events(path, &events)?;
    }

    let counts = scan(&events, &request.scan);
    let mut rows = counts.to_rows(&names);
    sort_rows(&mut rows, request.sort, request.descending);

    log::info!(
        "{} message(s) with new payloads in [{}s, {}s)",
        rows.len(),
        request.scan.target_time,
        request.scan.window_end()
    );

    let ctx = ReportContext {
        log_path: &request.log,
        first_event: events.first().and_then(BusEvent::timestamp),
        last_event: events.last().and_then(BusEvent::timestamp),
        config: &request.scan,
        stats: counts.stats(),
    };
    let rendered = match request.format {
        OutputFormat::Txt => report::render_txt(&rows, &ctx),
        OutputFormat::Json => report::render_json(&rows, &ctx)?,
    };

    match &request.output {
        Some(path) => {
            std::fs::write(path, rendered)
                .with_context(|| format!("Failed to write report: {:?}", path))?;
            log::info!("Report written to {:?}", path);
        }
        None => {
            io::stdout().write_all(rendered.as_bytes())?;
        }
    }

    Ok(())
}

/// Load every DBC file into one name database, one file id per DBC
fn load_names(paths: &[PathBuf]) -> Result<SignalDatabase> {
    let mut names = SignalDatabase::new();

    for path in paths {
        let messages = dbc::parse_dbc_file(path)
            .with_context(|| format!("Failed to load DBC file: {:?}", path))?;
        let file = names.next_file();
        for message in messages {
            names.add_message(file, message);
        }
    }

    let stats = names.stats();
    log::debug!(
        "Name database: {} files, {} messages, {} signals",
        stats.num_files,
        stats.num_messages,
        stats.num_signals
    );
    Ok(names)
}

fn export_events(path: &Path, events: &[BusEvent]) -> Result<()> {
    let file = File::create(path).with_context(|| format!("Failed to create {:?}", path))?;
    let mut writer = BufWriter::new(file);
    let written = formats::jsonl::write_events(&mut writer, events)?;
    log::info!("Exported {} events to {:?}", written, path);
    Ok(())
}

/// Initialize logging based on verbosity level
fn init_logging(verbose: u8, quiet: bool) {
    use env_logger::Builder;
    use log::LevelFilter;

    let level = if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    Builder::new()
        .filter_level(level)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}] {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}
