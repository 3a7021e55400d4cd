//! Unified error type for the astrostat-lib crate.
//!
//! [`AstrostatError`] wraps the transport-level [`TransportError`] and the
//! domain-specific failure kinds of the query engine. `From` impls allow `?`
//! to propagate across module boundaries seamlessly.

use std::fmt;

use crate::transport::TransportError;

/// Unified error type for astrostat-lib operations.
#[derive(Debug)]
pub enum AstrostatError {
    /// No HID interface with the expected vendor id is present.
    DeviceNotFound {
        /// Vendor id that was searched for.
        vendor_id: u16,
    },
    /// All transport attempts for a command were exhausted.
    Communication {
        /// Opcode of the command that failed.
        command: u8,
        /// Last transport-level error seen, if any attempt produced one.
        source: Option<TransportError>,
    },
    /// The device answered, but the payload failed structural validation.
    UnexpectedPayload {
        /// Opcode of the command whose reply was malformed.
        command: u8,
        /// Raw payload bytes, kept for diagnostics.
        payload: Vec<u8>,
    },
    /// Repeated battery reads never produced a percentage in 0..=100.
    NoSaneBattery,
    /// Transport-level failure outside a query (enumeration, open).
    Transport(TransportError),
    /// Configuration validation error.
    Config(String),
    /// Standard I/O error (config persistence).
    Io(std::io::Error),
}

impl fmt::Display for AstrostatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AstrostatError::DeviceNotFound { vendor_id } => {
                write!(f, "no base station found (vendor id {vendor_id:#06x})")
            }
            AstrostatError::Communication { command, source } => match source {
                Some(e) => write!(
                    f,
                    "command {command:#04x} got no response after retries: {e}"
                ),
                None => write!(f, "command {command:#04x} got no response after retries"),
            },
            AstrostatError::UnexpectedPayload { command, payload } => {
                write!(
                    f,
                    "command {command:#04x} returned an unexpected payload ({} bytes)",
                    payload.len()
                )
            }
            AstrostatError::NoSaneBattery => {
                write!(f, "battery reads never produced a sane percentage")
            }
            AstrostatError::Transport(e) => write!(f, "{e}"),
            AstrostatError::Config(e) => write!(f, "Config error: {e}"),
            AstrostatError::Io(e) => write!(f, "I/O error: {e}"),
        }
    }
}

impl std::error::Error for AstrostatError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AstrostatError::Communication {
                source: Some(e), ..
            } => Some(e),
            AstrostatError::Transport(e) => Some(e),
            AstrostatError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<TransportError> for AstrostatError {
    fn from(e: TransportError) -> Self {
        AstrostatError::Transport(e)
    }
}

impl From<std::io::Error> for AstrostatError {
    fn from(e: std::io::Error) -> Self {
        AstrostatError::Io(e)
    }
}

/// Crate-level Result alias using [`AstrostatError`].
pub type Result<T> = std::result::Result<T, AstrostatError>;
