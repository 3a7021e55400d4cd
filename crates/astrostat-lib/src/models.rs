//! Typed telemetry values returned by the query API.

use serde::Serialize;

/// Battery charge state of the headset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BatteryStatus {
    pub is_charging: bool,
    /// Charge percentage, 0..=100 for any value returned by the client.
    pub charge_percent: u8,
}

/// Dock and power state of the headset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HeadsetStatus {
    pub is_docked: bool,
    pub is_on: bool,
}

/// Active and saved sidetone slider levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SidetoneLevels {
    pub active_percent: u8,
    pub saved_percent: u8,
}

/// Which readings a [`crate::client::A50Client::snapshot`] call collects.
#[derive(Debug, Clone, Copy)]
pub struct SnapshotRequest {
    pub battery: bool,
    pub headset: bool,
    pub sidetone: bool,
    /// Stamp the snapshot with the current UNIX time.
    pub timestamp: bool,
}

impl Default for SnapshotRequest {
    fn default() -> Self {
        SnapshotRequest {
            battery: true,
            headset: true,
            sidetone: false,
            timestamp: true,
        }
    }
}

/// One combined telemetry reading. Fields not requested stay `None` and are
/// omitted from JSON output.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Snapshot {
    /// Seconds since the UNIX epoch, if requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub battery: Option<BatteryStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headset: Option<HeadsetStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sidetone: Option<SidetoneLevels>,
}

impl Snapshot {
    /// Copy of this snapshot with the timestamp removed, for change
    /// comparison between readings.
    pub fn without_timestamp(&self) -> Snapshot {
        Snapshot {
            timestamp: None,
            ..*self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_request_defaults() {
        let req = SnapshotRequest::default();
        assert!(req.battery);
        assert!(req.headset);
        assert!(!req.sidetone);
        assert!(req.timestamp);
    }

    #[test]
    fn snapshot_serializes_requested_fields() {
        let snap = Snapshot {
            timestamp: Some(1_700_000_000.5),
            battery: Some(BatteryStatus {
                is_charging: false,
                charge_percent: 57,
            }),
            headset: Some(HeadsetStatus {
                is_docked: true,
                is_on: true,
            }),
            sidetone: None,
        };
        let json = serde_json::to_string(&snap).unwrap();
        assert!(json.contains("\"timestamp\""));
        assert!(json.contains("\"charge_percent\":57"));
        assert!(json.contains("\"is_docked\":true"));
        assert!(!json.contains("sidetone"), "got: {json}");
    }

    #[test]
    fn snapshot_omits_none_fields() {
        let snap = Snapshot {
            timestamp: None,
            battery: None,
            headset: None,
            sidetone: Some(SidetoneLevels {
                active_percent: 50,
                saved_percent: 40,
            }),
        };
        let json = serde_json::to_string(&snap).unwrap();
        assert_eq!(
            json,
            "{\"sidetone\":{\"active_percent\":50,\"saved_percent\":40}}"
        );
    }

    #[test]
    fn without_timestamp_equal_when_values_match() {
        let a = Snapshot {
            timestamp: Some(1.0),
            battery: Some(BatteryStatus {
                is_charging: true,
                charge_percent: 80,
            }),
            headset: None,
            sidetone: None,
        };
        let b = Snapshot {
            timestamp: Some(2.0),
            ..a
        };
        assert_ne!(a, b);
        assert_eq!(a.without_timestamp(), b.without_timestamp());
    }
}
