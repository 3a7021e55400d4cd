//! CLI subcommands — snapshot, watch loop, single queries, device listing.

mod config_cmd;
mod devices;
mod get;
mod status;
mod watch;

use clap::{Subcommand, ValueEnum};
use serde::Serialize;

pub(super) use crate::RUNNING;
pub(super) use astrostat_lib::client::A50Client;
pub(super) use astrostat_lib::config::Config;
pub(super) use astrostat_lib::error::Result;
pub(super) use astrostat_lib::models::SnapshotRequest;
pub(super) use astrostat_lib::protocol::SliderType;
pub(super) use astrostat_lib::transport::DiscoveredDevice;

/// Global output mode, derived from `--json` / `--pretty`.
#[derive(Debug, Clone, Copy)]
pub struct Output {
    pub json: bool,
    pub pretty: bool,
}

impl Output {
    pub(super) fn print_json<T: Serialize>(&self, value: &T) -> Result<()> {
        let rendered = if self.pretty {
            serde_json::to_string_pretty(value)
        } else {
            serde_json::to_string(value)
        }
        .map_err(|e| astrostat_lib::AstrostatError::Config(format!("JSON encoding: {e}")))?;
        println!("{rendered}");
        Ok(())
    }
}

// ── JSON output structs ──

#[derive(Serialize)]
pub(super) struct DevicesOutput {
    pub count: usize,
    pub devices: Vec<DiscoveredDevice>,
}

#[derive(Serialize)]
pub(super) struct ConfigOutput {
    pub config_file: Option<String>,
    pub config_file_exists: bool,
    pub settings: Config,
}

#[derive(Serialize)]
pub(super) struct ValueOutput {
    pub attribute: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slider: Option<String>,
    pub saved: bool,
    pub value: u8,
}

/// Attribute selector for `get`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Attribute {
    Battery,
    Headset,
    Slider,
    Eq,
    Balance,
    DefaultBalance,
    AlertVolume,
    MicEq,
    NoiseGate,
}

#[derive(Subcommand)]
pub enum Command {
    /// One-shot telemetry snapshot
    Status {
        /// Include the battery reading
        #[arg(long)]
        battery: bool,
        /// Include the dock/power reading
        #[arg(long)]
        headset: bool,
        /// Include active and saved sidetone levels
        #[arg(long)]
        sidetone: bool,
        /// Comma-separated field list (battery,headset,sidetone)
        #[arg(long, value_delimiter = ',')]
        fields: Vec<String>,
        /// Omit the capture timestamp
        #[arg(long)]
        no_timestamp: bool,
        /// Output one CSV row (with header)
        #[arg(long)]
        csv: bool,
    },

    /// Poll telemetry repeatedly until interrupted
    Watch {
        /// Seconds between polls (floor 0.25; default from config)
        #[arg(long)]
        interval: Option<f64>,
        /// Stop after this many readings
        #[arg(long)]
        count: Option<u64>,
        /// Only print readings that differ from the previous one
        #[arg(long)]
        changes_only: bool,
        /// Include the battery reading
        #[arg(long)]
        battery: bool,
        /// Include the dock/power reading
        #[arg(long)]
        headset: bool,
        /// Include active and saved sidetone levels
        #[arg(long)]
        sidetone: bool,
        /// Comma-separated field list (battery,headset,sidetone)
        #[arg(long, value_delimiter = ',')]
        fields: Vec<String>,
        /// Omit the capture timestamp
        #[arg(long)]
        no_timestamp: bool,
        /// Output CSV rows (header first)
        #[arg(long)]
        csv: bool,
    },

    /// Query a single attribute
    Get {
        /// Attribute to query
        #[arg(value_enum)]
        attribute: Attribute,
        /// Read the saved value instead of the active one
        #[arg(long)]
        saved: bool,
        /// Slider channel for `get slider`
        #[arg(long, default_value = "sidetone")]
        slider: SliderType,
    },

    /// List HID interfaces matching the vendor id
    Devices,

    /// Show current configuration and file path
    Config,
}

/// Config for this invocation: platform file plus the CLI vendor override.
pub(super) fn effective_config(vendor_id: Option<u16>) -> Config {
    let mut config = Config::load();
    if let Some(vid) = vendor_id {
        config.vendor_id = vid;
    }
    config
}

pub fn run(cmd: Command, output: Output, vendor_id: Option<u16>) -> Result<()> {
    match cmd {
        Command::Status {
            battery,
            headset,
            sidetone,
            fields,
            no_timestamp,
            csv,
        } => {
            let request =
                status::build_request(battery, headset, sidetone, &fields, no_timestamp)?;
            status::cmd_status(request, output, csv, vendor_id)
        }
        Command::Watch {
            interval,
            count,
            changes_only,
            battery,
            headset,
            sidetone,
            fields,
            no_timestamp,
            csv,
        } => {
            let request =
                status::build_request(battery, headset, sidetone, &fields, no_timestamp)?;
            watch::cmd_watch(request, interval, count, changes_only, output, csv, vendor_id)
        }
        Command::Get {
            attribute,
            saved,
            slider,
        } => get::cmd_get(attribute, saved, slider, output, vendor_id),
        Command::Devices => devices::cmd_devices(output, vendor_id),
        Command::Config => config_cmd::cmd_config(output, vendor_id),
    }
}
