//! Application configuration — TOML-based, platform-aware paths.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::protocol;

/// Header comment prepended to saved config files.
const CONFIG_HEADER: &str =
    "# astrostat configuration — changes made outside the tool may be overwritten.\n\n";

/// Floor for the watch interval; polling faster than this just burns retries.
pub const MIN_WATCH_INTERVAL_SECS: f64 = 0.25;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// USB vendor id the base station enumerates under.
    #[serde(default = "default_vendor_id")]
    pub vendor_id: u16,

    /// HID report lengths to try, in order.
    #[serde(default = "default_report_lengths")]
    pub report_lengths: Vec<usize>,

    /// Transport attempts per query.
    #[serde(default = "default_retries")]
    pub retries: u32,

    /// Delay after every successful query, in milliseconds.
    #[serde(default = "default_command_delay_ms")]
    pub command_delay_ms: u64,

    /// Backoff between failed query attempts, in milliseconds.
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// Settle delay between feature-report send and get, in milliseconds.
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,

    /// Bounded wait for an interrupt response, in milliseconds.
    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,

    /// Independent query+decode cycles for a battery read.
    #[serde(default = "default_battery_retries")]
    pub battery_retries: u32,

    /// Delay between battery read cycles, in milliseconds.
    #[serde(default = "default_battery_retry_delay_ms")]
    pub battery_retry_delay_ms: u64,

    /// Default polling interval for `watch`, in seconds.
    #[serde(default = "default_watch_interval_secs")]
    pub watch_interval_secs: f64,
}

fn default_vendor_id() -> u16 {
    protocol::ASTRO_VID
}
fn default_report_lengths() -> Vec<usize> {
    protocol::REPORT_LENGTHS.to_vec()
}
fn default_retries() -> u32 {
    protocol::DEFAULT_RETRIES
}
fn default_command_delay_ms() -> u64 {
    protocol::COMMAND_DELAY_MS
}
fn default_retry_backoff_ms() -> u64 {
    protocol::RETRY_BACKOFF_MS
}
fn default_settle_delay_ms() -> u64 {
    protocol::SETTLE_DELAY_MS
}
fn default_read_timeout_ms() -> u64 {
    protocol::READ_TIMEOUT_MS
}
fn default_battery_retries() -> u32 {
    protocol::BATTERY_READ_ATTEMPTS
}
fn default_battery_retry_delay_ms() -> u64 {
    protocol::BATTERY_RETRY_DELAY_MS
}
fn default_watch_interval_secs() -> f64 {
    2.0
}

impl Default for Config {
    fn default() -> Self {
        Config {
            vendor_id: default_vendor_id(),
            report_lengths: default_report_lengths(),
            retries: default_retries(),
            command_delay_ms: default_command_delay_ms(),
            retry_backoff_ms: default_retry_backoff_ms(),
            settle_delay_ms: default_settle_delay_ms(),
            read_timeout_ms: default_read_timeout_ms(),
            battery_retries: default_battery_retries(),
            battery_retry_delay_ms: default_battery_retry_delay_ms(),
            watch_interval_secs: default_watch_interval_secs(),
        }
    }
}

/// Validation errors that [`Config::validate`] can return.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    ZeroVendorId,
    EmptyReportLengths,
    /// A report length outside 1..=65; the device only speaks 64 and 65.
    BadReportLength(usize),
    ZeroRetries,
    ZeroBatteryRetries,
    /// The watch interval is below [`MIN_WATCH_INTERVAL_SECS`] or not finite.
    BadWatchInterval(f64),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::ZeroVendorId => write!(f, "vendor_id cannot be zero"),
            ValidationError::EmptyReportLengths => {
                write!(f, "report_lengths cannot be empty")
            }
            ValidationError::BadReportLength(n) => {
                write!(f, "report length {n} is out of range (expected 1..=65)")
            }
            ValidationError::ZeroRetries => write!(f, "retries must be at least 1"),
            ValidationError::ZeroBatteryRetries => {
                write!(f, "battery_retries must be at least 1")
            }
            ValidationError::BadWatchInterval(v) => {
                write!(
                    f,
                    "watch_interval_secs {v} is invalid (minimum {MIN_WATCH_INTERVAL_SECS})"
                )
            }
        }
    }
}

impl Config {
    /// Platform-specific config directory.
    pub fn dir() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("astrostat"))
    }

    /// Full path to the config file.
    pub fn path() -> Option<PathBuf> {
        Self::dir().map(|d| d.join("config.toml"))
    }

    /// Load config from disk, or return defaults if not found.
    pub fn load() -> Self {
        let (config, warnings) = Self::load_with_warnings();
        for w in &warnings {
            log::warn!("{w}");
        }
        config
    }

    /// Load config from the default path, returning the config and any
    /// parse warnings.
    pub fn load_with_warnings() -> (Self, Vec<String>) {
        let Some(path) = Self::path() else {
            return (Self::default(), vec![]);
        };
        Self::load_from(&path)
    }

    /// Load config from an arbitrary path, returning the config and any
    /// parse warnings.
    ///
    /// Returns `(defaults, [])` if the file doesn't exist.
    /// Returns `(defaults, [warning])` if the file exists but can't be parsed.
    pub fn load_from(path: &Path) -> (Self, Vec<String>) {
        match std::fs::read_to_string(path) {
            Ok(contents) => match toml::from_str(&contents) {
                Ok(config) => (config, vec![]),
                Err(e) => {
                    let warning = format!(
                        "config parse error ({}), using defaults: {e}",
                        path.display()
                    );
                    (Self::default(), vec![warning])
                }
            },
            Err(_) => (Self::default(), vec![]),
        }
    }

    /// Save config to an arbitrary path atomically (write to temp file,
    /// then rename).
    pub fn save_to(&self, path: &Path) -> std::io::Result<()> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let serialized = toml::to_string_pretty(self).map_err(std::io::Error::other)?;
        let contents = format!("{CONFIG_HEADER}{serialized}");
        let tmp = path.with_extension("toml.tmp");
        std::fs::write(&tmp, &contents)?;
        match std::fs::rename(&tmp, path) {
            Ok(()) => Ok(()),
            Err(_) => {
                // Rename can fail across filesystems; fall back to direct write + cleanup
                let result = std::fs::write(path, &contents);
                let _ = std::fs::remove_file(&tmp);
                result
            }
        }
    }

    /// Save config to the default platform path.
    pub fn save(&self) -> std::io::Result<()> {
        let Some(path) = Self::path() else {
            return Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "No config directory",
            ));
        };
        self.save_to(&path)
    }

    /// Watch interval clamped to the floor.
    pub fn effective_watch_interval_secs(&self) -> f64 {
        if self.watch_interval_secs.is_finite() {
            self.watch_interval_secs.max(MIN_WATCH_INTERVAL_SECS)
        } else {
            default_watch_interval_secs()
        }
    }

    /// Validate the entire config, collecting all errors.
    pub fn validate(&self) -> std::result::Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if self.vendor_id == 0 {
            errors.push(ValidationError::ZeroVendorId);
        }
        if self.report_lengths.is_empty() {
            errors.push(ValidationError::EmptyReportLengths);
        }
        for &len in &self.report_lengths {
            if len == 0 || len > 65 {
                errors.push(ValidationError::BadReportLength(len));
            }
        }
        if self.retries == 0 {
            errors.push(ValidationError::ZeroRetries);
        }
        if self.battery_retries == 0 {
            errors.push(ValidationError::ZeroBatteryRetries);
        }
        if !self.watch_interval_secs.is_finite()
            || self.watch_interval_secs < MIN_WATCH_INTERVAL_SECS
        {
            errors.push(ValidationError::BadWatchInterval(self.watch_interval_secs));
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}
