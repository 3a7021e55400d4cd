//! Client session — the retrying query engine and typed query API.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::config::Config;
use crate::decode;
use crate::error::{AstrostatError, Result};
use crate::models::{BatteryStatus, HeadsetStatus, SidetoneLevels, Snapshot, SnapshotRequest};
use crate::protocol::{self, Command, SliderType};
use crate::transport::{
    self, ChannelOptions, DiscoveredDevice, HidBackend, HidapiBackend, TransportError,
};

/// A session against one base station.
///
/// Holds the configuration and the cached last-good battery reading. Queries
/// take `&mut self`; the type is single-threaded by design, and a shared
/// concurrent port would need to guard the battery cache with a mutex.
pub struct A50Client<B: HidBackend = HidapiBackend> {
    backend: B,
    config: Config,
    last_good_battery: Option<BatteryStatus>,
}

impl A50Client<HidapiBackend> {
    /// Session with the configuration loaded from the platform config path.
    pub fn new() -> Result<Self> {
        Ok(Self::with_backend(HidapiBackend::new()?, Config::load()))
    }

    pub fn with_config(config: Config) -> Result<Self> {
        Ok(Self::with_backend(HidapiBackend::new()?, config))
    }
}

impl<B: HidBackend> A50Client<B> {
    pub fn with_backend(backend: B, config: Config) -> Self {
        A50Client {
            backend,
            config,
            last_good_battery: None,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Last battery reading that passed the sanity check, if any.
    pub fn last_good_battery(&self) -> Option<BatteryStatus> {
        self.last_good_battery
    }

    /// All HID interfaces matching the configured vendor id.
    pub fn discover(&mut self) -> Result<Vec<DiscoveredDevice>> {
        Ok(self.backend.discover(self.config.vendor_id)?)
    }

    fn find_device_path(&mut self) -> Result<String> {
        let devices = self.backend.discover(self.config.vendor_id)?;
        devices
            .into_iter()
            .next()
            .map(|d| d.path)
            .ok_or(AstrostatError::DeviceNotFound {
                vendor_id: self.config.vendor_id,
            })
    }

    fn channel_options(&self) -> ChannelOptions {
        ChannelOptions {
            report_lengths: self.config.report_lengths.clone(),
            settle_delay_ms: self.config.settle_delay_ms,
            read_timeout_ms: self.config.read_timeout_ms,
        }
    }

    /// Retrying query: resolve the device path once, then run transport
    /// passes until one yields a structurally valid payload.
    ///
    /// A transport-level error counts as a failed attempt and is kept as the
    /// eventual error source; it never aborts the remaining retries. Every
    /// successful query is followed by the inter-command delay to rate-limit
    /// traffic to the device.
    fn query(&mut self, command: Command, payload: &[u8]) -> Result<Vec<u8>> {
        let path = self.find_device_path()?;
        let opts = self.channel_options();
        let mut last_error: Option<TransportError> = None;

        for _ in 0..self.config.retries {
            match transport::send_command_once(
                &mut self.backend,
                &path,
                command.id(),
                payload,
                &opts,
            ) {
                Ok(Some(frame)) => {
                    if let Some(device_payload) = protocol::extract_payload(&frame) {
                        let device_payload = device_payload.to_vec();
                        sleep_ms(self.config.command_delay_ms);
                        return Ok(device_payload);
                    }
                }
                Ok(None) => {}
                Err(e) => {
                    log::debug!("transport attempt for {command} failed: {e}");
                    last_error = Some(e);
                }
            }
            sleep_ms(self.config.retry_backoff_ms);
        }

        Err(AstrostatError::Communication {
            command: command.id(),
            source: last_error,
        })
    }

    // ── Typed query API ──

    /// Battery reading with the retry-with-fallback policy: up to
    /// `battery_retries` independent query+decode cycles, accepting only
    /// percentages in 0..=100. A malformed or out-of-range cycle is retried;
    /// exhaustion falls back to the cached last-good value before failing.
    pub fn battery_status(&mut self) -> Result<BatteryStatus> {
        for _ in 0..self.config.battery_retries {
            let payload = self.query(Command::BatteryStatus, &[])?;
            if let Ok(status) = decode::battery_status(&payload)
                && status.charge_percent <= 100
            {
                self.last_good_battery = Some(status);
                return Ok(status);
            }
            sleep_ms(self.config.battery_retry_delay_ms);
        }

        if let Some(cached) = self.last_good_battery {
            log::debug!("battery reads exhausted, returning cached value");
            return Ok(cached);
        }
        Err(AstrostatError::NoSaneBattery)
    }

    pub fn headset_status(&mut self) -> Result<HeadsetStatus> {
        let payload = self.query(Command::HeadsetStatus, &[])?;
        decode::headset_status(&payload)
    }

    pub fn slider_value(&mut self, slider: SliderType, saved: bool) -> Result<u8> {
        let payload = self.query(Command::SliderValue, &[slider.id()])?;
        decode::slider_value(&payload, slider, saved)
    }

    pub fn active_eq_preset(&mut self) -> Result<u8> {
        let payload = self.query(Command::ActiveEqPreset, &[])?;
        decode::scalar_value(Command::ActiveEqPreset, &payload)
    }

    pub fn balance(&mut self) -> Result<u8> {
        let payload = self.query(Command::Balance, &[])?;
        decode::scalar_value(Command::Balance, &payload)
    }

    pub fn default_balance(&mut self, saved: bool) -> Result<u8> {
        let payload = self.query(Command::DefaultBalance, &[u8::from(saved)])?;
        decode::scalar_value(Command::DefaultBalance, &payload)
    }

    pub fn alert_volume(&mut self, saved: bool) -> Result<u8> {
        let payload = self.query(Command::AlertVolume, &[u8::from(saved)])?;
        decode::scalar_value(Command::AlertVolume, &payload)
    }

    pub fn mic_eq(&mut self, saved: bool) -> Result<u8> {
        let payload = self.query(Command::MicEq, &[u8::from(saved)])?;
        decode::scalar_value(Command::MicEq, &payload)
    }

    pub fn noise_gate_mode(&mut self, saved: bool) -> Result<u8> {
        let payload = self.query(Command::NoiseGateMode, &[])?;
        decode::noise_gate_mode(&payload, saved)
    }

    /// Composite reading. Sub-queries run in sequence; any failure aborts
    /// the whole snapshot.
    pub fn snapshot(&mut self, request: SnapshotRequest) -> Result<Snapshot> {
        let timestamp = request.timestamp.then(unix_timestamp);
        let battery = if request.battery {
            Some(self.battery_status()?)
        } else {
            None
        };
        let headset = if request.headset {
            Some(self.headset_status()?)
        } else {
            None
        };
        let sidetone = if request.sidetone {
            Some(SidetoneLevels {
                active_percent: self.slider_value(SliderType::Sidetone, false)?,
                saved_percent: self.slider_value(SliderType::Sidetone, true)?,
            })
        } else {
            None
        };
        Ok(Snapshot {
            timestamp,
            battery,
            headset,
            sidetone,
        })
    }
}

fn sleep_ms(millis: u64) {
    if millis > 0 {
        std::thread::sleep(Duration::from_millis(millis));
    }
}

fn unix_timestamp() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}
