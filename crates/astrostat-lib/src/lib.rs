//! astrostat — Astro A50 base station telemetry over a vendor HID protocol.

pub mod client;
pub mod config;
pub mod decode;
pub mod error;
pub mod models;
pub mod protocol;
pub mod transport;

pub use client::A50Client;
pub use error::AstrostatError;
