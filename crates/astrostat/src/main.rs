//! astrostat CLI — Astro A50 base station telemetry.

use std::sync::atomic::{AtomicBool, Ordering};

use clap::Parser;

mod cli;

/// Shared shutdown flag — set by Ctrl+C handler.
pub static RUNNING: AtomicBool = AtomicBool::new(true);

#[derive(Parser)]
#[command(
    name = "astrostat",
    version,
    about = "Query Astro A50 base station telemetry over HID"
)]
struct Args {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Pretty-print JSON output (implies --json)
    #[arg(long, global = true)]
    pretty: bool,

    /// Override the USB vendor id to search for (hex like 0x9886, or decimal)
    #[arg(long, global = true, value_parser = parse_vendor_id)]
    vendor_id: Option<u16>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: cli::Command,
}

fn parse_vendor_id(s: &str) -> Result<u16, String> {
    let s = s.trim();
    let (digits, radix) = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => (hex, 16),
        None => (s, 10),
    };
    u16::from_str_radix(digits, radix).map_err(|e| format!("invalid vendor id \"{s}\": {e}"))
}

fn main() {
    let args = Args::parse();

    let level = match args.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .format_target(false)
        .init();

    ctrlc::set_handler(move || {
        RUNNING.store(false, Ordering::SeqCst);
    })
    .ok();

    let output = cli::Output {
        json: args.json || args.pretty,
        pretty: args.pretty,
    };
    if let Err(e) = cli::run(args.command, output, args.vendor_id) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
