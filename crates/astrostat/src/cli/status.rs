//! `status` subcommand — one-shot telemetry snapshot.

use astrostat_lib::AstrostatError;
use astrostat_lib::models::Snapshot;

use super::{A50Client, Output, Result, SnapshotRequest, effective_config};

/// Fixed CSV column set, stable across selections; unselected fields are
/// empty cells.
pub(super) const CSV_HEADER: &str = "timestamp,battery_charge_percent,battery_is_charging,\
headset_is_docked,headset_is_on,sidetone_active_percent,sidetone_saved_percent";

/// Combine the selection flags and `--fields` list into a snapshot request.
/// Nothing selected means battery + headset.
pub(super) fn build_request(
    battery: bool,
    headset: bool,
    sidetone: bool,
    fields: &[String],
    no_timestamp: bool,
) -> Result<SnapshotRequest> {
    let mut request = SnapshotRequest {
        battery,
        headset,
        sidetone,
        timestamp: !no_timestamp,
    };
    for field in fields {
        match field.trim().to_ascii_lowercase().as_str() {
            "battery" => request.battery = true,
            "headset" => request.headset = true,
            "sidetone" => request.sidetone = true,
            "" => {}
            other => {
                return Err(AstrostatError::Config(format!(
                    "unknown field \"{other}\" (expected battery, headset or sidetone)"
                )));
            }
        }
    }
    if !request.battery && !request.headset && !request.sidetone {
        request.battery = true;
        request.headset = true;
    }
    Ok(request)
}

pub(super) fn render_human(snap: &Snapshot) -> Vec<String> {
    let mut lines = Vec::new();
    if let Some(t) = snap.timestamp {
        lines.push(format!("Timestamp:  {t:.3}"));
    }
    if let Some(b) = snap.battery {
        let charging = if b.is_charging { " (charging)" } else { "" };
        lines.push(format!("Battery:    {}%{charging}", b.charge_percent));
    }
    if let Some(h) = snap.headset {
        lines.push(format!("Headset:    docked={} on={}", h.is_docked, h.is_on));
    }
    if let Some(s) = snap.sidetone {
        lines.push(format!(
            "Sidetone:   active={}% saved={}%",
            s.active_percent, s.saved_percent
        ));
    }
    lines
}

pub(super) fn csv_row(snap: &Snapshot) -> String {
    fn cell(value: Option<impl std::fmt::Display>) -> String {
        value.map(|v| v.to_string()).unwrap_or_default()
    }
    [
        snap.timestamp.map(|t| format!("{t:.3}")).unwrap_or_default(),
        cell(snap.battery.map(|b| b.charge_percent)),
        cell(snap.battery.map(|b| b.is_charging)),
        cell(snap.headset.map(|h| h.is_docked)),
        cell(snap.headset.map(|h| h.is_on)),
        cell(snap.sidetone.map(|s| s.active_percent)),
        cell(snap.sidetone.map(|s| s.saved_percent)),
    ]
    .join(",")
}

pub(super) fn cmd_status(
    request: SnapshotRequest,
    output: Output,
    csv: bool,
    vendor_id: Option<u16>,
) -> Result<()> {
    let mut client = A50Client::with_config(effective_config(vendor_id))?;
    let snap = client.snapshot(request)?;

    if csv {
        println!("{CSV_HEADER}");
        println!("{}", csv_row(&snap));
    } else if output.json {
        output.print_json(&snap)?;
    } else {
        for line in render_human(&snap) {
            println!("{line}");
        }
    }
    Ok(())
}
