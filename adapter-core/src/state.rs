//! Adapter state shared between the serial receive context and the USB
//! tasks.
//!
//! Flags are atomics. The pending IN report and the pending control reply are
//! [`Signal`]s, so a new value overwrites an unconsumed one (latest wins).

use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::signal::Signal;
use portable_atomic::{AtomicBool, AtomicU16, AtomicU8, Ordering};

use adapter_proto::{SpoofStatus, MAX_CONTROL_TRANSFER};

use crate::profile::{AdapterProfile, StatusSource, BAUDRATE_UNIT, DEFAULT_BAUDRATE_CODE, MAX_PATCH_LEN};

/// Largest IN report or control reply the adapter buffers.
pub const MAX_REPORT_LEN: usize = MAX_CONTROL_TRANSFER;

pub type ReportBuf = heapless::Vec<u8, MAX_REPORT_LEN>;

/// Payload longer than [`MAX_REPORT_LEN`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Oversized {
    pub len: usize,
}

impl core::fmt::Display for Oversized {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{} bytes exceed the {} byte buffer", self.len, MAX_REPORT_LEN)
    }
}

fn to_buf(data: &[u8]) -> Result<ReportBuf, Oversized> {
    ReportBuf::from_slice(data).map_err(|_| Oversized { len: data.len() })
}

pub struct AdapterState {
    profile: &'static AdapterProfile,
    started: AtomicBool,
    spoofed: AtomicBool,
    ready: AtomicBool,
    baudrate_code: AtomicU8,
    vid: AtomicU16,
    pid: AtomicU16,
    started_signal: Signal<CriticalSectionRawMutex, ()>,
    ready_signal: Signal<CriticalSectionRawMutex, ()>,
    report: Signal<CriticalSectionRawMutex, ReportBuf>,
    last_report: Mutex<CriticalSectionRawMutex, RefCell<ReportBuf>>,
    reply: Signal<CriticalSectionRawMutex, ReportBuf>,
    feature_patch: Mutex<CriticalSectionRawMutex, RefCell<heapless::Vec<u8, MAX_PATCH_LEN>>>,
}

impl AdapterState {
    #[must_use]
    pub const fn new(profile: &'static AdapterProfile) -> Self {
        Self {
            profile,
            started: AtomicBool::new(false),
            spoofed: AtomicBool::new(false),
            ready: AtomicBool::new(false),
            baudrate_code: AtomicU8::new(DEFAULT_BAUDRATE_CODE),
            vid: AtomicU16::new(0),
            pid: AtomicU16::new(0),
            started_signal: Signal::new(),
            ready_signal: Signal::new(),
            report: Signal::new(),
            last_report: Mutex::new(RefCell::new(heapless::Vec::new())),
            reply: Signal::new(),
            feature_patch: Mutex::new(RefCell::new(heapless::Vec::new())),
        }
    }

    #[inline]
    #[must_use]
    pub fn profile(&self) -> &'static AdapterProfile {
        self.profile
    }

    #[must_use]
    pub fn spoof_status(&self) -> SpoofStatus {
        if self.spoofed.load(Ordering::Acquire) {
            SpoofStatus::Spoofed
        } else {
            SpoofStatus::NotSpoofed
        }
    }

    #[inline]
    #[must_use]
    pub fn is_spoofed(&self) -> bool {
        self.spoofed.load(Ordering::Acquire)
    }

    /// Byte carried by STATUS and START replies.
    #[must_use]
    pub fn status_byte(&self) -> u8 {
        match self.profile.status_source {
            StatusSource::Spoof => self.spoof_status().as_byte(),
            StatusSource::Started => u8::from(self.is_started()),
        }
    }

    /// Set the started flag. Returns the status byte from before the call.
    pub fn start(&self) -> u8 {
        let previous = self.status_byte();
        self.started.store(true, Ordering::Release);
        self.started_signal.signal(());
        previous
    }

    #[inline]
    #[must_use]
    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::Acquire)
    }

    pub async fn wait_started(&self) {
        while !self.is_started() {
            self.started_signal.wait().await;
        }
    }

    /// Authentication finished. Also marks the adapter ready.
    pub fn mark_spoofed(&self) {
        self.spoofed.store(true, Ordering::Release);
        self.mark_ready();
    }

    pub fn mark_ready(&self) {
        self.ready.store(true, Ordering::Release);
        self.ready_signal.signal(());
    }

    /// Whether IN reports may be sent. Always true for ungated profiles.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        !self.profile.gate_reports || self.ready.load(Ordering::Acquire)
    }

    pub async fn wait_ready(&self) {
        while !self.is_ready() {
            self.ready_signal.wait().await;
        }
    }

    /// Replace the pending IN report.
    ///
    /// # Errors
    ///
    /// [`Oversized`] if `report` does not fit an interrupt packet buffer.
    pub fn post_report(&self, report: &[u8]) -> Result<(), Oversized> {
        let buf = to_buf(report)?;
        self.last_report
            .lock(|last| last.borrow_mut().clone_from(&buf));
        self.report.signal(buf);
        Ok(())
    }

    /// Take the pending IN report, if any.
    #[cfg(test)]
    pub(crate) fn take_report(&self) -> Option<ReportBuf> {
        self.report.try_take()
    }

    pub async fn wait_report(&self) -> ReportBuf {
        self.report.wait().await
    }

    /// Run `f` on the most recent IN report, sent or not.
    pub fn with_last_report<R>(&self, f: impl FnOnce(&[u8]) -> R) -> R {
        self.last_report.lock(|last| f(&last.borrow()))
    }

    /// Store the authority's answer to a relayed control request.
    ///
    /// # Errors
    ///
    /// [`Oversized`] if `reply` is longer than a control transfer.
    pub fn post_reply(&self, reply: &[u8]) -> Result<(), Oversized> {
        self.reply.signal(to_buf(reply)?);
        Ok(())
    }

    pub fn try_take_reply(&self) -> Option<ReportBuf> {
        self.reply.try_take()
    }

    /// Forget a stale reply before relaying a new request.
    pub fn clear_reply(&self) {
        self.reply.reset();
    }

    pub fn set_ids(&self, vid: u16, pid: u16) {
        self.vid.store(vid, Ordering::Release);
        self.pid.store(pid, Ordering::Release);
    }

    /// `(vid, pid)` from the IDS command, `None` until one arrives.
    #[must_use]
    pub fn ids(&self) -> Option<(u16, u16)> {
        let vid = self.vid.load(Ordering::Acquire);
        let pid = self.pid.load(Ordering::Acquire);
        (vid != 0 || pid != 0).then_some((vid, pid))
    }

    #[must_use]
    pub fn baudrate_code(&self) -> u8 {
        self.baudrate_code.load(Ordering::Acquire)
    }

    pub fn set_baudrate_code(&self, code: u8) {
        self.baudrate_code.store(code, Ordering::Release);
    }

    /// Current UART speed in bits per second.
    #[must_use]
    pub fn baudrate(&self) -> u32 {
        if self.profile.generation.has_extended_commands() {
            u32::from(self.baudrate_code()) * BAUDRATE_UNIT
        } else {
            self.profile.fixed_baudrate
        }
    }

    /// Save bytes to splice into a static feature answer.
    pub fn set_feature_patch(&self, bytes: &[u8]) {
        let len = bytes.len().min(MAX_PATCH_LEN);
        self.feature_patch.lock(|patch| {
            let mut patch = patch.borrow_mut();
            patch.clear();
            // Cannot fail: `len` is capped to the capacity.
            let _ = patch.extend_from_slice(&bytes[..len]);
        });
    }

    /// Run `f` on the saved feature patch; empty until one is saved.
    pub fn with_feature_patch<R>(&self, f: impl FnOnce(&[u8]) -> R) -> R {
        self.feature_patch.lock(|patch| f(&patch.borrow()))
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use crate::profiles::{ps4_and_ps3, DS4, SIXAXIS, X360};
    use embassy_futures::block_on;

    #[test]
    fn test_report_latest_wins() {
        let state = AdapterState::new(&DS4);
        state.post_report(&[0xaa]).unwrap();
        state.post_report(&[0xbb, 0xcc]).unwrap();
        assert_eq!(state.take_report().unwrap().as_slice(), &[0xbb, 0xcc]);
        assert!(state.take_report().is_none());
        // The last report stays readable for GET_REPORT answers.
        state.with_last_report(|r| assert_eq!(r, &[0xbb, 0xcc]));
    }

    #[test]
    fn test_console_mode_decides_report_gating() {
        let ps4 = AdapterState::new(ps4_and_ps3(false));
        assert!(!ps4.is_ready());
        ps4.mark_ready();
        assert!(ps4.is_ready());

        let ps3 = AdapterState::new(ps4_and_ps3(true));
        assert!(ps3.is_ready());
        assert_eq!(ps3.start(), 0x00);
        assert_eq!(ps3.status_byte(), 0x01);
    }

    #[test]
    fn test_oversized_report_is_refused() {
        let state = AdapterState::new(&DS4);
        assert_eq!(state.post_report(&[0; 65]), Err(Oversized { len: 65 }));
        assert!(state.take_report().is_none());
        assert_eq!(state.post_reply(&[0; 80]), Err(Oversized { len: 80 }));
    }

    #[test]
    fn test_wait_report() {
        let state = AdapterState::new(&DS4);
        state.post_report(&[1, 2, 3]).unwrap();
        let report = block_on(state.wait_report());
        assert_eq!(report.as_slice(), &[1, 2, 3]);
    }

    #[test]
    fn test_reply_clear() {
        let state = AdapterState::new(&X360);
        state.post_reply(&[9, 9]).unwrap();
        state.clear_reply();
        assert!(state.try_take_reply().is_none());
        state.post_reply(&[7]).unwrap();
        assert_eq!(state.try_take_reply().unwrap().as_slice(), &[7]);
    }

    #[test]
    fn test_status_from_started_flag() {
        let state = AdapterState::new(&SIXAXIS);
        assert_eq!(state.status_byte(), 0);
        assert_eq!(state.start(), 0);
        assert_eq!(state.status_byte(), 1);
        assert_eq!(state.start(), 1);
        block_on(state.wait_started());
    }

    #[test]
    fn test_status_from_spoof_flag() {
        let state = AdapterState::new(&X360);
        assert_eq!(state.start(), 0);
        assert_eq!(state.status_byte(), 0);
        assert!(!state.is_ready());
        state.mark_spoofed();
        assert_eq!(state.status_byte(), 1);
        assert!(state.is_ready());
        block_on(state.wait_ready());
    }

    #[test]
    fn test_ungated_profile_is_always_ready() {
        let state = AdapterState::new(&DS4);
        assert!(state.is_ready());
    }

    #[test]
    fn test_ids_and_baudrate() {
        let state = AdapterState::new(&DS4);
        assert_eq!(state.ids(), None);
        state.set_ids(0x054c, 0x05c4);
        assert_eq!(state.ids(), Some((0x054c, 0x05c4)));

        assert_eq!(state.baudrate_code(), 5);
        assert_eq!(state.baudrate(), 500_000);
        state.set_baudrate_code(20);
        assert_eq!(state.baudrate(), 2_000_000);

        let legacy = AdapterState::new(&SIXAXIS);
        assert_eq!(legacy.baudrate(), 2_000_000);
    }

    #[test]
    fn test_feature_patch_is_capped() {
        let state = AdapterState::new(&DS4);
        state.with_feature_patch(|p| assert!(p.is_empty()));
        state.set_feature_patch(&[1, 2, 3, 4, 5, 6]);
        state.with_feature_patch(|p| assert_eq!(p, &[1, 2, 3, 4]));
    }
}
