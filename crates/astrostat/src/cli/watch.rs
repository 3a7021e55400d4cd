//! `watch` subcommand — polling loop with change suppression.

use std::sync::atomic::Ordering;
use std::time::Duration;

use astrostat_lib::config::{Config, MIN_WATCH_INTERVAL_SECS};
use astrostat_lib::models::Snapshot;

use super::status::{CSV_HEADER, csv_row, render_human};
use super::{A50Client, Output, RUNNING, Result, SnapshotRequest, effective_config};

/// CLI interval wins over config; both are clamped to the floor.
pub(super) fn resolve_interval(cli_interval: Option<f64>, config: &Config) -> f64 {
    match cli_interval {
        Some(secs) if secs.is_finite() => secs.max(MIN_WATCH_INTERVAL_SECS),
        _ => config.effective_watch_interval_secs(),
    }
}

/// Stable comparison key for a reading: its JSON form without the
/// timestamp, so two otherwise identical polls compare equal.
pub(super) fn signature(snap: &Snapshot) -> Result<String> {
    serde_json::to_string(&snap.without_timestamp())
        .map_err(|e| astrostat_lib::AstrostatError::Config(format!("JSON encoding: {e}")))
}

/// Sleep in short slices so Ctrl+C interrupts the wait promptly.
fn sleep_interruptible(secs: f64) {
    let mut remaining_ms = (secs * 1000.0) as u64;
    while remaining_ms > 0 && RUNNING.load(Ordering::SeqCst) {
        let slice = remaining_ms.min(100);
        std::thread::sleep(Duration::from_millis(slice));
        remaining_ms -= slice;
    }
}

pub(super) fn cmd_watch(
    request: SnapshotRequest,
    interval: Option<f64>,
    count: Option<u64>,
    changes_only: bool,
    output: Output,
    csv: bool,
    vendor_id: Option<u16>,
) -> Result<()> {
    let config = effective_config(vendor_id);
    let interval_secs = resolve_interval(interval, &config);
    let mut client = A50Client::with_config(config)?;

    if csv {
        println!("{CSV_HEADER}");
    }

    let mut polls: u64 = 0;
    let mut last_signature: Option<String> = None;

    while RUNNING.load(Ordering::SeqCst) {
        match client.snapshot(request) {
            Ok(snap) => {
                let sig = signature(&snap)?;
                let changed = last_signature.as_deref() != Some(sig.as_str());
                if !changes_only || changed {
                    if csv {
                        println!("{}", csv_row(&snap));
                    } else if output.json {
                        output.print_json(&snap)?;
                    } else {
                        for line in render_human(&snap) {
                            println!("{line}");
                        }
                        println!();
                    }
                }
                last_signature = Some(sig);
            }
            // Keep polling through transient failures; the device drops
            // off the bus briefly when the headset docks or undocks.
            Err(e) => log::warn!("poll failed: {e}"),
        }

        polls += 1;
        if count.is_some_and(|limit| polls >= limit) {
            break;
        }
        sleep_interruptible(interval_secs);
    }
    Ok(())
}
