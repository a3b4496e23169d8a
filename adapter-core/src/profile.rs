//! Per-variant adapter description.
//!
//! An [`AdapterProfile`] is pure data: endpoint layout, which serial commands
//! the adapter understands, and an ordered table of [`Rule`]s telling the
//! relay how to answer each USB control request.

use adapter_proto::{AdapterType, Command, ControlRequest};

/// Baud code in effect until a BAUDRATE command changes it.
pub const DEFAULT_BAUDRATE_CODE: u8 = 5;

/// Bits per second per baud code step.
pub const BAUDRATE_UNIT: u32 = 100_000;

/// Time allowed between a frame's command byte and its last payload byte.
pub const FRAME_BUDGET_MS: u64 = 10;

/// Serial protocol generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Generation {
    /// Baud rate fixed per profile (`fixed_baudrate`), no IDS/BAUDRATE/VERSION,
    /// no frame timeout.
    Legacy,
    /// Adds IDS, BAUDRATE and VERSION, and a per-frame receive budget.
    Common,
}

impl Generation {
    #[must_use]
    pub const fn has_extended_commands(self) -> bool {
        matches!(self, Self::Common)
    }

    /// Receive budget per frame, if the generation enforces one.
    #[must_use]
    pub const fn frame_budget_ms(self) -> Option<u64> {
        match self {
            Self::Legacy => None,
            Self::Common => Some(FRAME_BUDGET_MS),
        }
    }
}

/// What the STATUS and START replies report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StatusSource {
    /// The spoof status byte.
    Spoof,
    /// The started flag.
    Started,
}

/// Spoof phase a rule applies in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Phase {
    Any,
    Unspoofed,
    Spoofed,
}

impl Phase {
    #[must_use]
    pub const fn admits(self, spoofed: bool) -> bool {
        match self {
            Self::Any => true,
            Self::Unspoofed => !spoofed,
            Self::Spoofed => spoofed,
        }
    }
}

/// Match on `wValue`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ValueMatch {
    Any,
    Exact(u16),
    /// High byte only (HID report type).
    ReportType(u8),
}

/// Request matcher: `bmRequestType & type_mask == type_bits` plus optional
/// `bRequest`, `wValue` and `wIndex` conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RequestFilter {
    pub type_mask: u8,
    pub type_bits: u8,
    pub request: Option<u8>,
    pub value: ValueMatch,
    pub index: Option<u16>,
}

impl RequestFilter {
    /// Exact `bmRequestType`.
    #[must_use]
    pub const fn request_type(request_type: u8) -> Self {
        Self::masked(0xff, request_type)
    }

    #[must_use]
    pub const fn masked(type_mask: u8, type_bits: u8) -> Self {
        Self {
            type_mask,
            type_bits,
            request: None,
            value: ValueMatch::Any,
            index: None,
        }
    }

    #[must_use]
    pub const fn request(mut self, request: u8) -> Self {
        self.request = Some(request);
        self
    }

    #[must_use]
    pub const fn value(mut self, value: u16) -> Self {
        self.value = ValueMatch::Exact(value);
        self
    }

    #[must_use]
    pub const fn report_type(mut self, report_type: u8) -> Self {
        self.value = ValueMatch::ReportType(report_type);
        self
    }

    #[must_use]
    pub const fn index(mut self, index: u16) -> Self {
        self.index = Some(index);
        self
    }

    #[must_use]
    pub fn matches(&self, req: &ControlRequest) -> bool {
        if req.request_type & self.type_mask != self.type_bits {
            return false;
        }
        if self.request.is_some_and(|r| r != req.request) {
            return false;
        }
        let value_ok = match self.value {
            ValueMatch::Any => true,
            ValueMatch::Exact(v) => v == req.value,
            ValueMatch::ReportType(t) => t == req.report_type(),
        };
        value_ok && self.index.map_or(true, |i| i == req.index)
    }
}

/// Payload of a DEBUG frame describing a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DebugEcho {
    /// `[report id]`
    ReportId,
    /// `[report type, report id]`
    TypeAndId,
    /// The 8-byte request header.
    Header,
    /// The header followed by the OUT data.
    HeaderAndData,
}

/// Requests backed by persisted or remembered pairing data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PairingOp {
    /// DS4 GET 0x12: `12 | slave | 08 25 | master | 00`.
    Ds4Addresses,
    /// DS4 GET 0x13: link key.
    Ds4LinkKey,
    /// DS4 SET 0x12: slave address.
    Ds4SetSlave,
    /// DS4 SET 0x13: master address and link key.
    Ds4SetMasterAndLink,
    /// DS3 GET f5: table, carrying the saved master address after the first answer.
    Ds3Master(&'static [u8]),
    /// DS3 GET ef/f8: table with the saved ef byte at offset 7.
    Ds3EfByte(&'static [u8]),
    /// DS3 SET f5.
    Ds3SetMaster,
    /// DS3 SET ef.
    Ds3SetEfByte,
}

/// What to do with a matched request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Action {
    /// Forward to the authority and, for IN requests, wait for its answer.
    Relay,
    /// Static answer, truncated to `wLength`.
    Respond(&'static [u8]),
    /// Zero-length data stage.
    RespondEmpty,
    /// Accept an OUT request and discard its data.
    Accept,
    /// Answer with the last IN report, with `(offset, byte)` overrides.
    CurrentReport { overlay: &'static [(u8, u8)] },
    /// Send OUT data to the authority as an OUT_REPORT frame.
    ForwardOut { prefix: Option<u8> },
    /// Authentication sentinel: reset the adapter.
    FatalReset,
    /// Send a DEBUG frame. IN requests stay unhandled, OUT requests are accepted.
    Debug(DebugEcho),
    Pairing(PairingOp),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Rule {
    pub phase: Phase,
    pub filter: RequestFilter,
    pub action: Action,
    /// Set the ready flag when this rule fires.
    pub marks_ready: bool,
}

impl Rule {
    #[must_use]
    pub const fn new(filter: RequestFilter, action: Action) -> Self {
        Self {
            phase: Phase::Any,
            filter,
            action,
            marks_ready: false,
        }
    }

    #[must_use]
    pub const fn in_phase(mut self, phase: Phase) -> Self {
        self.phase = phase;
        self
    }

    #[must_use]
    pub const fn marking_ready(mut self) -> Self {
        self.marks_ready = true;
        self
    }
}

/// Interrupt endpoint layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EndpointConfig {
    pub address: u8,
    pub max_packet_size: u16,
    pub interval_ms: u8,
}

impl EndpointConfig {
    #[must_use]
    pub const fn new(address: u8, max_packet_size: u16, interval_ms: u8) -> Self {
        Self {
            address,
            max_packet_size,
            interval_ms,
        }
    }
}

/// Copy bytes out of OUT reports into a static feature answer.
///
/// An OUT report whose first byte is `trigger` has
/// `source_offset..source_offset + len` saved; later answers to feature
/// report `report_id` get those bytes at `target_offset`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FeaturePatch {
    pub trigger: u8,
    pub source_offset: usize,
    pub report_id: u8,
    pub target_offset: usize,
    pub len: usize,
}

/// Largest [`FeaturePatch::len`].
pub const MAX_PATCH_LEN: usize = 4;

/// Handshake that flips the status to spoofed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Handshake {
    /// `wValue` of the relayed request whose second occurrence completes the handshake.
    pub trigger: u16,
}

#[derive(Debug)]
pub struct AdapterProfile {
    pub name: &'static str,
    pub adapter_type: AdapterType,
    pub generation: Generation,
    pub status_source: StatusSource,
    /// UART speed of a legacy adapter. Common adapters start from the baud code.
    pub fixed_baudrate: u32,
    pub in_endpoint: EndpointConfig,
    pub out_endpoint: Option<EndpointConfig>,
    /// Command used to forward OUT endpoint data.
    pub out_report_command: Command,
    /// OUT report prefix that marks the adapter spoofed.
    pub out_spoof_prefix: Option<&'static [u8]>,
    pub handshake: Option<Handshake>,
    /// Hold IN reports back until the ready flag is set.
    pub gate_reports: bool,
    /// Echo every control request header as DEBUG before handling it.
    pub debug_every_request: bool,
    /// Send `DEBUG [id, len]` after each static answer.
    pub debug_static_replies: bool,
    pub feature_patch: Option<FeaturePatch>,
    pub rules: &'static [Rule],
}

impl AdapterProfile {
    /// UART speed at boot.
    #[must_use]
    pub const fn initial_baudrate(&self) -> u32 {
        match self.generation {
            Generation::Legacy => self.fixed_baudrate,
            Generation::Common => DEFAULT_BAUDRATE_CODE as u32 * BAUDRATE_UNIT,
        }
    }

    /// First rule admitting `req` in the given phase.
    #[must_use]
    pub fn find_rule(&self, req: &ControlRequest, spoofed: bool) -> Option<&'static Rule> {
        self.rules
            .iter()
            .find(|rule| rule.phase.admits(spoofed) && rule.filter.matches(req))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_masks_request_type() {
        let vendor = RequestFilter::masked(0x40, 0x40);
        assert!(vendor.matches(&ControlRequest::new(0xc0, 0x01, 0, 0, 4)));
        assert!(vendor.matches(&ControlRequest::new(0x41, 0x01, 0, 0, 4)));
        assert!(!vendor.matches(&ControlRequest::new(0xa1, 0x01, 0, 0, 4)));
    }

    #[test]
    fn test_filter_fields() {
        let filter = RequestFilter::request_type(0xa1)
            .request(0x01)
            .report_type(0x03)
            .index(2);
        assert!(filter.matches(&ControlRequest::new(0xa1, 0x01, 0x03f3, 2, 8)));
        assert!(!filter.matches(&ControlRequest::new(0xa1, 0x01, 0x01f3, 2, 8)));
        assert!(!filter.matches(&ControlRequest::new(0xa1, 0x09, 0x03f3, 2, 8)));
        assert!(!filter.matches(&ControlRequest::new(0xa1, 0x01, 0x03f3, 0, 8)));

        let exact = RequestFilter::request_type(0xa1).value(0x0303);
        assert!(exact.matches(&ControlRequest::new(0xa1, 0x01, 0x0303, 0, 48)));
        assert!(!exact.matches(&ControlRequest::new(0xa1, 0x01, 0x0304, 0, 48)));
    }

    #[test]
    fn test_only_common_generation_has_frame_budget() {
        assert_eq!(Generation::Legacy.frame_budget_ms(), None);
        assert_eq!(Generation::Common.frame_budget_ms(), Some(10));
    }

    #[test]
    fn test_phase_admits() {
        assert!(Phase::Any.admits(false) && Phase::Any.admits(true));
        assert!(Phase::Unspoofed.admits(false) && !Phase::Unspoofed.admits(true));
        assert!(!Phase::Spoofed.admits(false) && Phase::Spoofed.admits(true));
    }
}
