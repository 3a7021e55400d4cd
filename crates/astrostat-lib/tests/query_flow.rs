//! End-to-end query flow tests against the mock HID backend.
//!
//! These exercise the public client API the way the CLI does, with scripted
//! device behavior: channel fallback, flaky devices, battery cache across a
//! session, and snapshot assembly.

use std::rc::Rc;

use astrostat_lib::client::A50Client;
use astrostat_lib::config::Config;
use astrostat_lib::error::AstrostatError;
use astrostat_lib::models::SnapshotRequest;
use astrostat_lib::protocol::SliderType;
use astrostat_lib::transport::mock::{MockBackend, MockReply, MockState};

fn test_config() -> Config {
    Config {
        command_delay_ms: 0,
        retry_backoff_ms: 0,
        settle_delay_ms: 0,
        read_timeout_ms: 0,
        battery_retry_delay_ms: 0,
        ..Config::default()
    }
}

fn client(state: &Rc<MockState>) -> A50Client<MockBackend> {
    A50Client::with_backend(MockBackend::new(Rc::clone(state)), test_config())
}

fn frame(payload: &[u8]) -> Vec<u8> {
    let mut f = vec![0x02, 0x02, payload.len() as u8];
    f.extend_from_slice(payload);
    f
}

#[test]
fn session_never_leaks_handles() {
    let state = MockState::with_device();
    state.push_feature(MockReply::Frame(frame(&[0x39])));
    state.push_feature(MockReply::Frame(frame(&[0x03])));
    let mut c = client(&state);

    c.battery_status().unwrap();
    c.headset_status().unwrap();
    // A failing query still closes every handle it opened.
    let _ = c.balance().unwrap_err();

    assert_eq!(state.opens.get(), state.closes.get());
    assert!(state.opens.get() > 2);
}

#[test]
fn interrupt_only_device_still_answers() {
    // A HID stack where feature reports always fail: every query falls
    // through to the interrupt channel.
    let state = MockState::with_device();
    state.fail_feature_send.set(true);
    state.push_interrupt(MockReply::Frame(frame(&[0xB9]))); // charging, 57%
    let mut c = client(&state);

    let status = c.battery_status().unwrap();
    assert!(status.is_charging);
    assert_eq!(status.charge_percent, 57);
    assert!(state.sent_frames.borrow().is_empty());
    assert_eq!(state.written_frames.borrow().len(), 1);
}

#[test]
fn report_id_prefixed_device_end_to_end() {
    // Some HID stacks hand back the report-id byte in front of the frame.
    let state = MockState::with_device();
    state.push_feature(MockReply::Frame(vec![0x00, 0x02, 0x02, 0x01, 0x64]));
    let mut c = client(&state);

    let status = c.battery_status().unwrap();
    assert!(!status.is_charging);
    assert_eq!(status.charge_percent, 100);
}

#[test]
fn flaky_device_answers_within_retry_budget() {
    let state = MockState::with_device();
    // Attempt 1: length 64 feature errors, interrupt silent; length 65
    // feature silent, interrupt garbage frame (extract fails).
    state.push_feature(MockReply::Error("pipe error"));
    state.push_feature(MockReply::Silence);
    state.push_interrupt(MockReply::Silence);
    state.push_interrupt(MockReply::Frame(vec![0xFF, 0xFF]));
    // Attempt 2: feature answers.
    state.push_feature(MockReply::Frame(frame(&[0x6A, 0x00, 0x01])));
    let mut c = client(&state);

    assert_eq!(c.noise_gate_mode(false).unwrap(), 0);
    // Nothing left scripted: the next query exhausts its retries.
    assert!(matches!(
        c.noise_gate_mode(true).unwrap_err(),
        AstrostatError::Communication { command: 0x6A, .. }
    ));
}

#[test]
fn battery_cache_survives_other_queries() {
    let state = MockState::with_device();
    state.push_feature(MockReply::Frame(frame(&[0x2A]))); // 42%
    let mut c = client(&state);
    assert_eq!(c.battery_status().unwrap().charge_percent, 42);

    state.push_feature(MockReply::Frame(frame(&[0x03])));
    c.headset_status().unwrap();

    // The battery turns insane for all six cycles; the cache answers.
    for _ in 0..6 {
        state.push_feature(MockReply::Frame(frame(&[0x7F])));
    }
    assert_eq!(c.battery_status().unwrap().charge_percent, 42);
}

#[test]
fn vendor_id_override_changes_discovery() {
    let state = MockState::with_device();
    let config = Config {
        vendor_id: 0x1234,
        ..test_config()
    };
    let mut c = A50Client::with_backend(MockBackend::new(Rc::clone(&state)), config);

    // The mock device enumerates under 0x9886, so an overridden vendor id
    // finds nothing and fails before any transport I/O.
    let err = c.headset_status().unwrap_err();
    assert!(matches!(
        err,
        AstrostatError::DeviceNotFound { vendor_id: 0x1234 }
    ));
    assert_eq!(state.opens.get(), 0);
}

#[test]
fn full_snapshot_serializes_to_expected_shape() {
    let state = MockState::with_device();
    state.push_feature(MockReply::Frame(frame(&[0x39])));
    state.push_feature(MockReply::Frame(frame(&[0x01])));
    state.push_feature(MockReply::Frame(frame(&[0x68, 0x05, 0x32, 0x28])));
    state.push_feature(MockReply::Frame(frame(&[0x68, 0x05, 0x32, 0x28])));
    let mut c = client(&state);

    let snap = c
        .snapshot(SnapshotRequest {
            battery: true,
            headset: true,
            sidetone: true,
            timestamp: false,
        })
        .unwrap();
    let json: serde_json::Value = serde_json::to_value(snap).unwrap();
    assert_eq!(json["battery"]["charge_percent"], 57);
    assert_eq!(json["battery"]["is_charging"], false);
    assert_eq!(json["headset"]["is_docked"], true);
    assert_eq!(json["headset"]["is_on"], false);
    assert_eq!(json["sidetone"]["active_percent"], 50);
    assert_eq!(json["sidetone"]["saved_percent"], 40);
    assert!(json.get("timestamp").is_none());
}

#[test]
fn slider_queries_all_channels() {
    let state = MockState::with_device();
    for slider in SliderType::ALL {
        state.push_feature(MockReply::Frame(frame(&[0x68, slider.id(), 10, 20])));
    }
    let mut c = client(&state);

    for slider in SliderType::ALL {
        assert_eq!(c.slider_value(slider, false).unwrap(), 10);
    }
    // Each request carried the matching sub-selector byte.
    let sent = state.sent_frames.borrow();
    for (i, slider) in SliderType::ALL.iter().enumerate() {
        assert_eq!(sent[i][3], slider.id());
    }
}
