//! Payload decoding — command-specific structural checks and byte layout.
//!
//! Each function receives the raw payload extracted from a validated
//! response frame plus the parameters the query was issued with. Shape
//! failures return [`AstrostatError::UnexpectedPayload`] carrying the raw
//! bytes for diagnosis.

use crate::error::{AstrostatError, Result};
use crate::models::{BatteryStatus, HeadsetStatus};
use crate::protocol::{Command, SliderType};

fn unexpected(command: Command, payload: &[u8]) -> AstrostatError {
    AstrostatError::UnexpectedPayload {
        command: command.id(),
        payload: payload.to_vec(),
    }
}

/// Battery payload is 1 byte: bit 0x80 is the charging flag, the low 7 bits
/// are the percentage. Range checking is the caller's concern; a byte like
/// 0x7F decodes to 127 here and gets rejected by the battery read policy.
pub fn battery_status(payload: &[u8]) -> Result<BatteryStatus> {
    let Some(&status_byte) = payload.first() else {
        return Err(unexpected(Command::BatteryStatus, payload));
    };
    Ok(BatteryStatus {
        is_charging: status_byte & 0x80 != 0,
        charge_percent: status_byte & 0x7F,
    })
}

/// Headset payload is 1 byte of flags: bit 0x01 docked, bit 0x02 powered on.
pub fn headset_status(payload: &[u8]) -> Result<HeadsetStatus> {
    let Some(&status_byte) = payload.first() else {
        return Err(unexpected(Command::HeadsetStatus, payload));
    };
    Ok(HeadsetStatus {
        is_docked: status_byte & 0x01 != 0,
        is_on: status_byte & 0x02 != 0,
    })
}

/// Slider payload is `[0x68, sliderId, activeValue, savedValue]`. The echoed
/// command and slider id are checked by value equality.
pub fn slider_value(payload: &[u8], slider: SliderType, saved: bool) -> Result<u8> {
    if payload.len() < 4
        || payload[0] != Command::SliderValue.id()
        || payload[1] != slider.id()
    {
        return Err(unexpected(Command::SliderValue, payload));
    }
    Ok(payload[2 + usize::from(saved)])
}

/// Noise-gate payload is `[0x6A, activeMode, savedMode]`.
pub fn noise_gate_mode(payload: &[u8], saved: bool) -> Result<u8> {
    if payload.len() < 3 || payload[0] != Command::NoiseGateMode.id() {
        return Err(unexpected(Command::NoiseGateMode, payload));
    }
    Ok(payload[1 + usize::from(saved)])
}

/// Single-byte value commands (EQ preset, balance, default balance, alert
/// volume, mic EQ): the first payload byte is the value.
pub fn scalar_value(command: Command, payload: &[u8]) -> Result<u8> {
    let Some(&value) = payload.first() else {
        return Err(unexpected(command, payload));
    };
    Ok(value)
}
