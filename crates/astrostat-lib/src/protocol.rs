//! Protocol constants and frame codec for the Astro A50 base station.
//!
//! The base station speaks a simple request/response protocol over HID.
//! Requests are fixed-size reports of the form
//! `[0x02, command, payload_len, payload..., zero padding]`; responses echo
//! the `0x02` marker followed by a status byte, a length byte and the
//! command-specific payload. The device accepts two report-length
//! conventions: a plain 64-byte report, and a 65-byte report whose first
//! byte is a `0x00` report id in front of a 64-byte body.

use std::fmt;
use std::str::FromStr;

/// Logitech/Astro vendor id the base station enumerates under.
pub const ASTRO_VID: u16 = 0x9886;

/// Report-length conventions to try, in order.
pub const REPORT_LENGTHS: [usize; 2] = [64, 65];

/// Report length that carries a leading report-id byte.
pub const PREFIXED_REPORT_LENGTH: usize = 65;

/// Leading byte of every well-formed request/response frame.
pub const FRAME_MARKER: u8 = 0x02;

/// Status byte value indicating the device answered the request.
pub const STATUS_OK: u8 = 0x02;

/// Marker + status + length bytes.
pub const FRAME_HEADER_LEN: usize = 3;

// ── Timing ──

/// Delay after every successful query, rate-limiting traffic to the device.
pub const COMMAND_DELAY_MS: u64 = 80;

/// Backoff between failed query attempts.
pub const RETRY_BACKOFF_MS: u64 = 60;

/// Settle delay between sending a feature report and reading the reply.
pub const SETTLE_DELAY_MS: u64 = 30;

/// Bounded wait for an interrupt (input report) response.
pub const READ_TIMEOUT_MS: u64 = 250;

/// Delay between battery read cycles that produced no sane value.
pub const BATTERY_RETRY_DELAY_MS: u64 = 50;

/// Transport attempts per query before giving up.
pub const DEFAULT_RETRIES: u32 = 4;

/// Independent query+decode cycles for a battery read.
pub const BATTERY_READ_ATTEMPTS: u32 = 6;

// ── Commands ──

/// Queryable base-station attributes, one opcode byte each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Command {
    HeadsetStatus = 0x54,
    SliderValue = 0x68,
    NoiseGateMode = 0x6A,
    ActiveEqPreset = 0x6C,
    Balance = 0x72,
    DefaultBalance = 0x77,
    AlertVolume = 0x7A,
    MicEq = 0x7B,
    BatteryStatus = 0x7C,
}

impl Command {
    /// Opcode byte sent on the wire.
    pub fn id(self) -> u8 {
        self as u8
    }

    /// All commands, for exhaustive checks.
    pub const ALL: [Command; 9] = [
        Command::HeadsetStatus,
        Command::SliderValue,
        Command::NoiseGateMode,
        Command::ActiveEqPreset,
        Command::Balance,
        Command::DefaultBalance,
        Command::AlertVolume,
        Command::MicEq,
        Command::BatteryStatus,
    ];
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Command::HeadsetStatus => "headset-status",
            Command::SliderValue => "slider-value",
            Command::NoiseGateMode => "noise-gate-mode",
            Command::ActiveEqPreset => "active-eq-preset",
            Command::Balance => "balance",
            Command::DefaultBalance => "default-balance",
            Command::AlertVolume => "alert-volume",
            Command::MicEq => "mic-eq",
            Command::BatteryStatus => "battery-status",
        };
        write!(f, "{name}")
    }
}

/// Audio-channel selector for the slider-value command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum SliderType {
    StreamMic = 0x00,
    StreamChat = 0x01,
    StreamGame = 0x02,
    StreamAux = 0x03,
    Mic = 0x04,
    Sidetone = 0x05,
}

impl SliderType {
    /// Sub-selector byte sent as the command payload.
    pub fn id(self) -> u8 {
        self as u8
    }

    pub const ALL: [SliderType; 6] = [
        SliderType::StreamMic,
        SliderType::StreamChat,
        SliderType::StreamGame,
        SliderType::StreamAux,
        SliderType::Mic,
        SliderType::Sidetone,
    ];
}

impl fmt::Display for SliderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SliderType::StreamMic => "stream-mic",
            SliderType::StreamChat => "stream-chat",
            SliderType::StreamGame => "stream-game",
            SliderType::StreamAux => "stream-aux",
            SliderType::Mic => "mic",
            SliderType::Sidetone => "sidetone",
        };
        write!(f, "{name}")
    }
}

impl FromStr for SliderType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "stream-mic" => Ok(SliderType::StreamMic),
            "stream-chat" => Ok(SliderType::StreamChat),
            "stream-game" => Ok(SliderType::StreamGame),
            "stream-aux" => Ok(SliderType::StreamAux),
            "mic" => Ok(SliderType::Mic),
            "sidetone" => Ok(SliderType::Sidetone),
            other => Err(format!(
                "unknown slider type \"{other}\" (expected one of: stream-mic, \
                 stream-chat, stream-game, stream-aux, mic, sidetone)"
            )),
        }
    }
}

// ── Frame codec ──

/// Build a request frame for `command` with an optional payload.
///
/// The body is `[0x02, command, payload_len, payload...]` zero-padded to
/// `report_length` bytes. A 65-byte report gets a 64-byte body behind a
/// single `0x00` report-id byte.
pub fn build_request_frame(command: u8, payload: &[u8], report_length: usize) -> Vec<u8> {
    let body_len = if report_length == PREFIXED_REPORT_LENGTH {
        PREFIXED_REPORT_LENGTH - 1
    } else {
        report_length
    };

    let mut frame = Vec::with_capacity(report_length);
    if report_length == PREFIXED_REPORT_LENGTH {
        frame.push(0x00);
    }
    frame.push(FRAME_MARKER);
    frame.push(command);
    frame.push(payload.len() as u8);
    frame.extend_from_slice(payload);
    frame.resize(frame.len() + body_len - (FRAME_HEADER_LEN + payload.len()), 0);
    frame
}

/// Strip a leading report-id byte if the real frame marker follows it.
pub fn normalize_response_frame(frame: &[u8]) -> &[u8] {
    if frame.len() > 1 && frame[0] == 0x00 && frame[1] == FRAME_MARKER {
        &frame[1..]
    } else {
        frame
    }
}

/// Extract the payload from a normalized response frame.
///
/// Returns `None` unless the frame starts with the marker and status-ok
/// bytes. The length byte is clamped to the remaining frame bytes so a
/// truncated or garbage frame never indexes past the buffer.
pub fn extract_payload(frame: &[u8]) -> Option<&[u8]> {
    if frame.len() < FRAME_HEADER_LEN {
        return None;
    }
    if frame[0] != FRAME_MARKER || frame[1] != STATUS_OK {
        return None;
    }
    let payload_len = (frame[2] as usize).min(frame.len() - FRAME_HEADER_LEN);
    Some(&frame[FRAME_HEADER_LEN..FRAME_HEADER_LEN + payload_len])
}
