//! HID transport — backend trait, hidapi implementation, channel fallback.
//!
//! The base station exposes its vendor protocol on a HID interface that
//! answers on one of two channels: feature reports (send, settle, get) or
//! interrupt transfers (write, timed read). Which channel and which report
//! length work varies across firmware and OS HID stacks, so
//! [`send_command_once`] tries every report length with both channels and
//! returns the first non-empty response.

use std::ffi::CString;
use std::fmt;
use std::time::Duration;

use serde::Serialize;

use crate::protocol;

// ── Error type ──

/// Transport-level error (enumeration, open, report I/O).
///
/// Messages follow the convention **"context: details"** where *context*
/// identifies the operation (e.g. `"open"`, `"send feature report"`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportError(String);

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        TransportError(message.into())
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HID transport error: {}", self.0)
    }
}

impl std::error::Error for TransportError {}

pub type TransportResult<T> = std::result::Result<T, TransportError>;

// ── Device enumeration ──

/// A discovered HID interface (not yet opened).
#[derive(Debug, Clone, Serialize)]
pub struct DiscoveredDevice {
    pub vendor_id: u16,
    pub product_id: u16,
    pub manufacturer: Option<String>,
    pub product: Option<String>,
    /// Platform HID path, passed back verbatim to [`HidBackend::open`].
    pub path: String,
}

// ── Traits ──

/// An open HID handle. Dropped handles release the underlying device.
pub trait HidHandle {
    fn send_feature_report(&mut self, data: &[u8]) -> TransportResult<()>;
    /// Request a feature report of `length` bytes for `report_id`.
    fn get_feature_report(&mut self, report_id: u8, length: usize) -> TransportResult<Vec<u8>>;
    fn write(&mut self, data: &[u8]) -> TransportResult<usize>;
    /// Read an input report, waiting at most `timeout_ms`. An empty result
    /// means the read timed out without data.
    fn read_timeout(&mut self, length: usize, timeout_ms: u64) -> TransportResult<Vec<u8>>;
}

/// HID enumeration and open. Implemented by [`HidapiBackend`] in production
/// and by [`mock::MockBackend`] in tests.
pub trait HidBackend {
    type Handle: HidHandle;

    /// List interfaces matching `vendor_id`, in enumeration order.
    fn discover(&mut self, vendor_id: u16) -> TransportResult<Vec<DiscoveredDevice>>;

    /// Open the interface at `path`.
    fn open(&mut self, path: &str) -> TransportResult<Self::Handle>;
}

// ── Channel fallback ──

/// Per-call transport parameters, derived from [`crate::config::Config`].
#[derive(Debug, Clone)]
pub struct ChannelOptions {
    /// Report lengths to try, in order.
    pub report_lengths: Vec<usize>,
    /// Settle delay between feature-report send and get.
    pub settle_delay_ms: u64,
    /// Bounded wait for an interrupt response.
    pub read_timeout_ms: u64,
}

impl Default for ChannelOptions {
    fn default() -> Self {
        ChannelOptions {
            report_lengths: protocol::REPORT_LENGTHS.to_vec(),
            settle_delay_ms: protocol::SETTLE_DELAY_MS,
            read_timeout_ms: protocol::READ_TIMEOUT_MS,
        }
    }
}

/// One full transport pass for a command: every report length, feature
/// channel then interrupt channel, a fresh scoped handle per length.
///
/// Channel-level I/O errors mean "try the next mechanism" and are only
/// logged at debug. An open failure aborts the pass and propagates; the
/// caller treats it as one failed attempt. Returns the first non-empty
/// response, normalized, or `Ok(None)` if the device never answered.
pub fn send_command_once<B: HidBackend>(
    backend: &mut B,
    path: &str,
    command: u8,
    payload: &[u8],
    opts: &ChannelOptions,
) -> TransportResult<Option<Vec<u8>>> {
    for &report_length in &opts.report_lengths {
        let mut handle = backend.open(path)?;
        let frame = protocol::build_request_frame(command, payload, report_length);

        match feature_exchange(&mut handle, &frame, report_length, opts) {
            Ok(Some(resp)) => return Ok(Some(resp)),
            Ok(None) => {}
            Err(e) => {
                log::debug!("feature channel failed (report length {report_length}): {e}");
            }
        }

        match interrupt_exchange(&mut handle, &frame, report_length, opts) {
            Ok(Some(resp)) => return Ok(Some(resp)),
            Ok(None) => {}
            Err(e) => {
                log::debug!("interrupt channel failed (report length {report_length}): {e}");
            }
        }
        // handle drops here, closing the device before the next length
    }
    Ok(None)
}

fn feature_exchange<H: HidHandle>(
    handle: &mut H,
    frame: &[u8],
    report_length: usize,
    opts: &ChannelOptions,
) -> TransportResult<Option<Vec<u8>>> {
    handle.send_feature_report(frame)?;
    if opts.settle_delay_ms > 0 {
        std::thread::sleep(Duration::from_millis(opts.settle_delay_ms));
    }
    let resp = handle.get_feature_report(0, report_length)?;
    Ok(non_empty_normalized(resp))
}

fn interrupt_exchange<H: HidHandle>(
    handle: &mut H,
    frame: &[u8],
    report_length: usize,
    opts: &ChannelOptions,
) -> TransportResult<Option<Vec<u8>>> {
    handle.write(frame)?;
    let resp = handle.read_timeout(report_length, opts.read_timeout_ms)?;
    Ok(non_empty_normalized(resp))
}

fn non_empty_normalized(resp: Vec<u8>) -> Option<Vec<u8>> {
    if resp.is_empty() {
        None
    } else {
        Some(protocol::normalize_response_frame(&resp).to_vec())
    }
}

// ── hidapi implementation ──

pub struct HidapiBackend {
    api: hidapi::HidApi,
}

impl HidapiBackend {
    pub fn new() -> TransportResult<Self> {
        let api = hidapi::HidApi::new()
            .map_err(|e| TransportError::new(format!("hidapi init: {e}")))?;
        Ok(HidapiBackend { api })
    }
}

impl HidBackend for HidapiBackend {
    type Handle = HidapiHandle;

    fn discover(&mut self, vendor_id: u16) -> TransportResult<Vec<DiscoveredDevice>> {
        self.api
            .refresh_devices()
            .map_err(|e| TransportError::new(format!("enumeration: {e}")))?;
        Ok(self
            .api
            .device_list()
            .filter(|d| d.vendor_id() == vendor_id)
            .map(|d| DiscoveredDevice {
                vendor_id: d.vendor_id(),
                product_id: d.product_id(),
                manufacturer: d.manufacturer_string().map(str::to_string),
                product: d.product_string().map(str::to_string),
                path: d.path().to_string_lossy().into_owned(),
            })
            .collect())
    }

    fn open(&mut self, path: &str) -> TransportResult<HidapiHandle> {
        let cpath = CString::new(path)
            .map_err(|e| TransportError::new(format!("open: invalid path: {e}")))?;
        let device = self
            .api
            .open_path(&cpath)
            .map_err(|e| TransportError::new(format!("open {path}: {e}")))?;
        device
            .set_blocking_mode(true)
            .map_err(|e| TransportError::new(format!("set blocking mode: {e}")))?;
        Ok(HidapiHandle { device })
    }
}

pub struct HidapiHandle {
    device: hidapi::HidDevice,
}

impl HidHandle for HidapiHandle {
    fn send_feature_report(&mut self, data: &[u8]) -> TransportResult<()> {
        self.device
            .send_feature_report(data)
            .map_err(|e| TransportError::new(format!("send feature report: {e}")))
    }

    fn get_feature_report(&mut self, report_id: u8, length: usize) -> TransportResult<Vec<u8>> {
        let mut buf = vec![0u8; length.max(1)];
        buf[0] = report_id;
        let n = self
            .device
            .get_feature_report(&mut buf)
            .map_err(|e| TransportError::new(format!("get feature report: {e}")))?;
        buf.truncate(n);
        Ok(buf)
    }

    fn write(&mut self, data: &[u8]) -> TransportResult<usize> {
        self.device
            .write(data)
            .map_err(|e| TransportError::new(format!("interrupt write: {e}")))
    }

    fn read_timeout(&mut self, length: usize, timeout_ms: u64) -> TransportResult<Vec<u8>> {
        let mut buf = vec![0u8; length];
        let n = self
            .device
            .read_timeout(&mut buf, timeout_ms as i32)
            .map_err(|e| TransportError::new(format!("interrupt read: {e}")))?;
        buf.truncate(n);
        Ok(buf)
    }
}

// ── Mock backend for testing ──

/// In-memory HID backend for unit and integration tests.
///
/// Always compiled (zero runtime cost), hidden from public docs.
#[doc(hidden)]
pub mod mock {
    use super::*;
    use std::cell::{Cell, RefCell};
    use std::collections::VecDeque;
    use std::rc::Rc;

    /// One scripted reply for a read channel.
    pub enum MockReply {
        /// Raw frame bytes returned to the caller.
        Frame(Vec<u8>),
        /// Empty read (device stayed silent / read timed out).
        Silence,
        /// Channel-level I/O error.
        Error(&'static str),
    }

    /// Shared mock state. Tests keep an `Rc` to it and inspect it after
    /// driving the code under test through a [`MockBackend`].
    #[derive(Default)]
    pub struct MockState {
        /// Devices returned by `discover`, unfiltered order.
        pub devices: RefCell<Vec<DiscoveredDevice>>,
        /// Scripted replies for `get_feature_report`, popped front first.
        /// An exhausted queue reads as silence.
        pub feature_replies: RefCell<VecDeque<MockReply>>,
        /// Scripted replies for `read_timeout`, popped front first.
        pub interrupt_replies: RefCell<VecDeque<MockReply>>,
        /// If true, `send_feature_report` fails (feature channel down).
        pub fail_feature_send: Cell<bool>,
        /// If true, `open` fails.
        pub fail_open: Cell<bool>,
        /// Frames passed to `send_feature_report`.
        pub sent_frames: RefCell<Vec<Vec<u8>>>,
        /// Frames passed to `write`.
        pub written_frames: RefCell<Vec<Vec<u8>>>,
        /// Successful `open` calls.
        pub opens: Cell<usize>,
        /// Handle drops.
        pub closes: Cell<usize>,
    }

    impl MockState {
        /// Fresh state with one discoverable base station.
        pub fn with_device() -> Rc<Self> {
            let state = Rc::new(MockState::default());
            state.devices.borrow_mut().push(DiscoveredDevice {
                vendor_id: protocol::ASTRO_VID,
                product_id: 0x002C,
                manufacturer: Some("Astro Gaming".into()),
                product: Some("A50 Base Station".into()),
                path: "mock://a50-base-station".into(),
            });
            state
        }

        pub fn push_feature(&self, reply: MockReply) {
            self.feature_replies.borrow_mut().push_back(reply);
        }

        pub fn push_interrupt(&self, reply: MockReply) {
            self.interrupt_replies.borrow_mut().push_back(reply);
        }
    }

    #[derive(Clone)]
    pub struct MockBackend {
        pub state: Rc<MockState>,
    }

    impl MockBackend {
        pub fn new(state: Rc<MockState>) -> Self {
            MockBackend { state }
        }
    }

    impl HidBackend for MockBackend {
        type Handle = MockHandle;

        fn discover(&mut self, vendor_id: u16) -> TransportResult<Vec<DiscoveredDevice>> {
            Ok(self
                .state
                .devices
                .borrow()
                .iter()
                .filter(|d| d.vendor_id == vendor_id)
                .cloned()
                .collect())
        }

        fn open(&mut self, _path: &str) -> TransportResult<MockHandle> {
            if self.state.fail_open.get() {
                return Err(TransportError::new("open: mock open failure injected"));
            }
            self.state.opens.set(self.state.opens.get() + 1);
            Ok(MockHandle {
                state: Rc::clone(&self.state),
            })
        }
    }

    pub struct MockHandle {
        state: Rc<MockState>,
    }

    impl Drop for MockHandle {
        fn drop(&mut self) {
            self.state.closes.set(self.state.closes.get() + 1);
        }
    }

    fn pop_reply(queue: &RefCell<VecDeque<MockReply>>) -> TransportResult<Vec<u8>> {
        match queue.borrow_mut().pop_front() {
            Some(MockReply::Frame(bytes)) => Ok(bytes),
            Some(MockReply::Silence) | None => Ok(Vec::new()),
            Some(MockReply::Error(msg)) => Err(TransportError::new(msg)),
        }
    }

    impl HidHandle for MockHandle {
        fn send_feature_report(&mut self, data: &[u8]) -> TransportResult<()> {
            if self.state.fail_feature_send.get() {
                return Err(TransportError::new("send feature report: injected failure"));
            }
            self.state.sent_frames.borrow_mut().push(data.to_vec());
            Ok(())
        }

        fn get_feature_report(&mut self, _report_id: u8, _length: usize) -> TransportResult<Vec<u8>> {
            pop_reply(&self.state.feature_replies)
        }

        fn write(&mut self, data: &[u8]) -> TransportResult<usize> {
            self.state.written_frames.borrow_mut().push(data.to_vec());
            Ok(data.len())
        }

        fn read_timeout(&mut self, _length: usize, _timeout_ms: u64) -> TransportResult<Vec<u8>> {
            pop_reply(&self.state.interrupt_replies)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mock::{MockBackend, MockReply, MockState};
    use super::*;

    fn zero_delay_opts() -> ChannelOptions {
        ChannelOptions {
            report_lengths: vec![64, 65],
            settle_delay_ms: 0,
            read_timeout_ms: 0,
        }
    }

    fn battery_reply() -> Vec<u8> {
        vec![0x02, 0x02, 0x01, 0x55]
    }

    // ── send_command_once ──

    #[test]
    fn feature_channel_answers_first() {
        let state = MockState::with_device();
        state.push_feature(MockReply::Frame(battery_reply()));
        let mut backend = MockBackend::new(std::rc::Rc::clone(&state));

        let resp =
            send_command_once(&mut backend, "mock://x", 0x7C, &[], &zero_delay_opts()).unwrap();
        assert_eq!(resp, Some(battery_reply()));
        // Answered on the first report length; interrupt channel never used.
        assert_eq!(state.opens.get(), 1);
        assert!(state.written_frames.borrow().is_empty());
    }

    #[test]
    fn interrupt_fallback_when_feature_silent() {
        let state = MockState::with_device();
        state.push_feature(MockReply::Silence);
        state.push_interrupt(MockReply::Frame(battery_reply()));
        let mut backend = MockBackend::new(std::rc::Rc::clone(&state));

        let resp =
            send_command_once(&mut backend, "mock://x", 0x7C, &[], &zero_delay_opts()).unwrap();
        assert_eq!(resp, Some(battery_reply()));
        assert_eq!(state.sent_frames.borrow().len(), 1);
        assert_eq!(state.written_frames.borrow().len(), 1);
    }

    #[test]
    fn feature_error_swallowed_interrupt_answers() {
        let state = MockState::with_device();
        state.fail_feature_send.set(true);
        state.push_interrupt(MockReply::Frame(battery_reply()));
        let mut backend = MockBackend::new(std::rc::Rc::clone(&state));

        let resp =
            send_command_once(&mut backend, "mock://x", 0x7C, &[], &zero_delay_opts()).unwrap();
        assert_eq!(resp, Some(battery_reply()));
    }

    #[test]
    fn interrupt_error_swallowed_next_length_answers() {
        let state = MockState::with_device();
        // Length 64: feature silent, interrupt errors. Length 65: feature answers.
        state.push_feature(MockReply::Silence);
        state.push_interrupt(MockReply::Error("device busy"));
        state.push_feature(MockReply::Frame(battery_reply()));
        let mut backend = MockBackend::new(std::rc::Rc::clone(&state));

        let resp =
            send_command_once(&mut backend, "mock://x", 0x7C, &[], &zero_delay_opts()).unwrap();
        assert_eq!(resp, Some(battery_reply()));
        assert_eq!(state.opens.get(), 2);
    }

    #[test]
    fn fully_silent_device_yields_none() {
        let state = MockState::with_device();
        let mut backend = MockBackend::new(std::rc::Rc::clone(&state));

        let resp =
            send_command_once(&mut backend, "mock://x", 0x7C, &[], &zero_delay_opts()).unwrap();
        assert_eq!(resp, None);
        // Both lengths tried, both channels each, one handle per length.
        assert_eq!(state.opens.get(), 2);
        assert_eq!(state.closes.get(), 2);
        assert_eq!(state.sent_frames.borrow().len(), 2);
        assert_eq!(state.written_frames.borrow().len(), 2);
    }

    #[test]
    fn open_failure_propagates() {
        let state = MockState::with_device();
        state.fail_open.set(true);
        let mut backend = MockBackend::new(std::rc::Rc::clone(&state));

        let err = send_command_once(&mut backend, "mock://x", 0x7C, &[], &zero_delay_opts())
            .unwrap_err();
        assert!(err.to_string().contains("open"), "got: {err}");
        assert_eq!(state.opens.get(), 0);
    }

    #[test]
    fn report_id_prefix_is_stripped() {
        let state = MockState::with_device();
        state.push_feature(MockReply::Frame(vec![0x00, 0x02, 0x02, 0x01, 0x55]));
        let mut backend = MockBackend::new(std::rc::Rc::clone(&state));

        let resp =
            send_command_once(&mut backend, "mock://x", 0x7C, &[], &zero_delay_opts()).unwrap();
        assert_eq!(resp, Some(battery_reply()));
    }

    #[test]
    fn frames_sized_per_report_length() {
        let state = MockState::with_device();
        let mut backend = MockBackend::new(std::rc::Rc::clone(&state));

        let _ = send_command_once(&mut backend, "mock://x", 0x68, &[0x05], &zero_delay_opts())
            .unwrap();
        let sent = state.sent_frames.borrow();
        assert_eq!(sent[0].len(), 64);
        assert_eq!(&sent[0][..4], &[0x02, 0x68, 0x01, 0x05]);
        assert_eq!(sent[1].len(), 65);
        assert_eq!(&sent[1][..5], &[0x00, 0x02, 0x68, 0x01, 0x05]);
    }

    #[test]
    fn handles_closed_on_every_path() {
        // Early return on the first length still drops its handle.
        let state = MockState::with_device();
        state.push_feature(MockReply::Frame(battery_reply()));
        let mut backend = MockBackend::new(std::rc::Rc::clone(&state));

        let _ = send_command_once(&mut backend, "mock://x", 0x7C, &[], &zero_delay_opts());
        assert_eq!(state.opens.get(), state.closes.get());
    }

    // ── Errors and discovery ──

    #[test]
    fn transport_error_display() {
        let e = TransportError::new("open /dev/hidraw0: permission denied");
        assert_eq!(
            e.to_string(),
            "HID transport error: open /dev/hidraw0: permission denied"
        );
    }

    #[test]
    fn discover_filters_on_vendor_id() {
        let state = MockState::with_device();
        state.devices.borrow_mut().push(DiscoveredDevice {
            vendor_id: 0x046D,
            product_id: 0x0001,
            manufacturer: None,
            product: None,
            path: "mock://other".into(),
        });
        let mut backend = MockBackend::new(std::rc::Rc::clone(&state));

        let found = backend.discover(protocol::ASTRO_VID).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].vendor_id, protocol::ASTRO_VID);

        let none = backend.discover(0xFFFF).unwrap();
        assert!(none.is_empty());
    }

    #[test]
    fn discovered_device_serializes() {
        let d = DiscoveredDevice {
            vendor_id: 0x9886,
            product_id: 0x002C,
            manufacturer: Some("Astro Gaming".into()),
            product: Some("A50 Base Station".into()),
            path: "/dev/hidraw3".into(),
        };
        let json = serde_json::to_string(&d).unwrap();
        assert!(json.contains("\"vendor_id\""));
        assert!(json.contains("\"path\""));
        assert!(json.contains("A50 Base Station"));
    }
}
