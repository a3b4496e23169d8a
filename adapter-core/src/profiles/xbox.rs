//! Xbox family: X360, original Xbox, Xbox One and the G920 wheel.

use adapter_proto::request::request;
use adapter_proto::{AdapterType, Command};

use super::{get_report, set_feature, set_idle, set_report, LEGACY_BAUDRATE};
use crate::profile::{
    Action, AdapterProfile, DebugEcho, EndpointConfig, Generation, Handshake, Phase,
    RequestFilter, Rule, StatusSource,
};

/// Any vendor request.
const VENDOR: RequestFilter = RequestFilter::masked(0x40, 0x40);
/// Vendor, device to host.
const VENDOR_IN: RequestFilter = RequestFilter::masked(0xc0, 0xc0);
/// Vendor, host to device.
const VENDOR_OUT: RequestFilter = RequestFilter::masked(0xc0, 0x40);
/// Vendor, device to host, interface bit set.
const VENDOR_IN_INTERFACE: RequestFilter = RequestFilter::masked(0xc1, 0xc1);

const X360_CAPABILITIES: &[u8] = &[
    0x00, 0x14, 0xff, 0xf7, 0xff, 0xff, 0xc0, 0xff, 0xc0, 0xff, 0xc0, 0xff, 0xc0, 0xff, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00,
];
const X360_SERIAL: &[u8] = &[0x01, 0x00, 0x83, 0x66];
const X360_A1: &[u8] = &[0x01, 0x02];

/// Value of the security request that asks the console to start over.
pub const X360_AUTH_SENTINEL: u16 = 0x5b17;

const X360_RULES: &[Rule] = &[
    Rule::new(VENDOR, Action::Relay).in_phase(Phase::Unspoofed),
    Rule::new(VENDOR_IN.value(X360_AUTH_SENTINEL), Action::FatalReset).in_phase(Phase::Spoofed),
    Rule::new(VENDOR_IN_INTERFACE.request(0x01), Action::Respond(X360_CAPABILITIES))
        .in_phase(Phase::Spoofed),
    Rule::new(VENDOR_IN.request(0x01), Action::Respond(X360_SERIAL)).in_phase(Phase::Spoofed),
    Rule::new(VENDOR_IN.request(0xa1), Action::Respond(X360_A1)).in_phase(Phase::Spoofed),
    Rule::new(VENDOR_IN, Action::RespondEmpty).in_phase(Phase::Spoofed),
    Rule::new(VENDOR_OUT, Action::Accept).in_phase(Phase::Spoofed),
];

/// Xbox 360 controller. Security requests are relayed until the handshake
/// completes, then answered locally.
pub static X360: AdapterProfile = AdapterProfile {
    name: "x360",
    adapter_type: AdapterType::X360,
    generation: Generation::Legacy,
    status_source: StatusSource::Spoof,
    fixed_baudrate: LEGACY_BAUDRATE,
    in_endpoint: EndpointConfig::new(1, 32, 1),
    out_endpoint: Some(EndpointConfig::new(2, 32, 8)),
    out_report_command: Command::OutReport,
    out_spoof_prefix: None,
    handshake: Some(Handshake { trigger: 0x5c10 }),
    gate_reports: true,
    debug_every_request: false,
    debug_static_replies: false,
    feature_patch: None,
    rules: X360_RULES,
};

const XBOX_DESCRIPTOR: &[u8] = &[
    0x10, 0x42, 0x00, 0x01, 0x01, 0x02, 0x14, 0x06, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff,
    0xff,
];
const XBOX_OUT_CAPABILITIES: &[u8] = &[0x00, 0x06, 0xff, 0xff, 0xff, 0xff];
const XBOX_IN_CAPABILITIES: &[u8] = &[
    0x00, 0x14, 0xff, 0x00, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff,
    0xff, 0xff, 0xff, 0xff, 0xff,
];

const XBOX_RULES: &[Rule] = &[
    Rule::new(
        RequestFilter::request_type(0xc1).request(0x06).value(0x4200),
        Action::Respond(XBOX_DESCRIPTOR),
    ),
    Rule::new(
        RequestFilter::request_type(0xc1)
            .request(request::GET_REPORT)
            .value(0x0200),
        Action::Respond(XBOX_OUT_CAPABILITIES),
    ),
    Rule::new(
        RequestFilter::request_type(0xc1)
            .request(request::GET_REPORT)
            .value(0x0100),
        Action::Respond(XBOX_IN_CAPABILITIES),
    ),
    Rule::new(
        get_report(0x0100),
        Action::CurrentReport {
            overlay: &[(12, 0x80), (14, 0x80), (16, 0x80), (18, 0x80)],
        },
    ),
    Rule::new(set_report(0x0200), Action::ForwardOut { prefix: None }),
];

/// Original Xbox controller.
pub static XBOX: AdapterProfile = AdapterProfile {
    name: "xbox",
    adapter_type: AdapterType::Xbox,
    generation: Generation::Common,
    status_source: StatusSource::Spoof,
    fixed_baudrate: LEGACY_BAUDRATE,
    in_endpoint: EndpointConfig::new(1, 32, 4),
    out_endpoint: Some(EndpointConfig::new(2, 32, 4)),
    out_report_command: Command::OutReport,
    out_spoof_prefix: None,
    handshake: None,
    gate_reports: false,
    debug_every_request: false,
    debug_static_replies: false,
    feature_patch: None,
    rules: XBOX_RULES,
};

/// Microsoft OS compatible id descriptor (`XGIP10`).
const XBOX_ONE_COMPAT_ID: &[u8] = &[
    0x28, 0x00, 0x00, 0x00, 0x00, 0x01, 0x04, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x01, 0x58, 0x47, 0x49, 0x50, 0x31, 0x30, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
];

const MS_OS_VENDOR_CODE: u8 = 144;

// GET_INTERFACE and SET_INTERFACE are answered by the USB stack.
const XBOX_ONE_RULES: &[Rule] = &[
    Rule::new(
        RequestFilter::masked(0xdf, 0xc0)
            .request(MS_OS_VENDOR_CODE)
            .index(0x0004),
        Action::Respond(XBOX_ONE_COMPAT_ID),
    ),
    Rule::new(
        RequestFilter::masked(0xdf, 0xc1)
            .request(MS_OS_VENDOR_CODE)
            .index(0x0005),
        Action::RespondEmpty,
    ),
];

/// Xbox One controller. Authentication runs over the interrupt endpoints; the
/// console's `06 20` packet means it succeeded.
pub static XBOX_ONE: AdapterProfile = AdapterProfile {
    name: "xone",
    adapter_type: AdapterType::XboxOne,
    generation: Generation::Legacy,
    status_source: StatusSource::Spoof,
    fixed_baudrate: LEGACY_BAUDRATE,
    in_endpoint: EndpointConfig::new(1, 64, 4),
    out_endpoint: Some(EndpointConfig::new(2, 64, 4)),
    out_report_command: Command::OutReport,
    out_spoof_prefix: Some(&[0x06, 0x20]),
    handshake: None,
    gate_reports: false,
    debug_every_request: false,
    debug_static_replies: false,
    feature_patch: None,
    rules: XBOX_ONE_RULES,
};

const G920_REPORT_11: &[u8] = &[
    0x11, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00,
];
const G920_REPORT_12: &[u8] = &{
    let mut report = [0u8; 64];
    report[0] = 0x12;
    report
};

const G920_RULES: &[Rule] = &[
    Rule::new(get_report(0x0101), Action::CurrentReport { overlay: &[] }),
    Rule::new(get_report(0x0111), Action::Respond(G920_REPORT_11)),
    Rule::new(get_report(0x0112), Action::Respond(G920_REPORT_12)),
    Rule::new(set_feature(), Action::Debug(DebugEcho::ReportId)),
    Rule::new(set_idle(), Action::Accept),
];

/// Logitech G920 wheel in Xbox One mode. Every control request is echoed to
/// the authority for analysis; OUT reports too, as DEBUG frames.
pub static G920_XBOX_ONE: AdapterProfile = AdapterProfile {
    name: "g920-xone",
    adapter_type: AdapterType::G920XboxOne,
    generation: Generation::Legacy,
    status_source: StatusSource::Started,
    fixed_baudrate: LEGACY_BAUDRATE,
    in_endpoint: EndpointConfig::new(1, 64, 4),
    out_endpoint: Some(EndpointConfig::new(2, 64, 4)),
    out_report_command: Command::Debug,
    out_spoof_prefix: None,
    handshake: None,
    gate_reports: false,
    debug_every_request: true,
    debug_static_replies: false,
    feature_patch: None,
    rules: G920_RULES,
};

#[cfg(test)]
mod tests {
    use super::*;
    use adapter_proto::request::report_type;
    use adapter_proto::ControlRequest;

    fn action(profile: &AdapterProfile, req: ControlRequest, spoofed: bool) -> Option<Action> {
        profile.find_rule(&req, spoofed).map(|r| r.action)
    }

    #[test]
    fn test_x360_relays_everything_before_spoofing() {
        let get = ControlRequest::new(0xc1, 0x01, 0x0100, 0, 20);
        let set = ControlRequest::new(0x41, 0x00, 0x0000, 0, 4);
        assert_eq!(action(&X360, get, false), Some(Action::Relay));
        assert_eq!(action(&X360, set, false), Some(Action::Relay));
        // Class requests are not for the relay.
        let class = ControlRequest::new(0xa1, 0x01, 0x0100, 0, 20);
        assert_eq!(action(&X360, class, false), None);
    }

    #[test]
    fn test_x360_spoofed_answers() {
        let sentinel = ControlRequest::new(0xc1, 0x01, X360_AUTH_SENTINEL, 0, 4);
        assert_eq!(action(&X360, sentinel, true), Some(Action::FatalReset));

        let caps = ControlRequest::new(0xc1, 0x01, 0x0100, 0, 20);
        assert_eq!(
            action(&X360, caps, true),
            Some(Action::Respond(X360_CAPABILITIES))
        );

        let serial = ControlRequest::new(0xc0, 0x01, 0x0000, 0, 4);
        assert_eq!(action(&X360, serial, true), Some(Action::Respond(X360_SERIAL)));

        let a1 = ControlRequest::new(0xc0, 0xa1, 0x0000, 0, 2);
        assert_eq!(action(&X360, a1, true), Some(Action::Respond(X360_A1)));

        let other = ControlRequest::new(0xc0, 0x82, 0x0000, 0, 8);
        assert_eq!(action(&X360, other, true), Some(Action::RespondEmpty));

        let out = ControlRequest::new(0x41, 0x83, 0x0000, 0, 8);
        assert_eq!(action(&X360, out, true), Some(Action::Accept));
    }

    #[test]
    fn test_xbox_one_compat_id() {
        let device = ControlRequest::new(0xc0, MS_OS_VENDOR_CODE, 0, 4, 40);
        assert_eq!(
            action(&XBOX_ONE, device, false),
            Some(Action::Respond(XBOX_ONE_COMPAT_ID))
        );
        assert_eq!(XBOX_ONE_COMPAT_ID.len(), 40);

        let wrong_index = ControlRequest::new(0xc0, MS_OS_VENDOR_CODE, 0, 6, 40);
        assert_eq!(action(&XBOX_ONE, wrong_index, false), None);

        let interface = ControlRequest::new(0xc1, MS_OS_VENDOR_CODE, 0, 5, 10);
        assert_eq!(action(&XBOX_ONE, interface, true), Some(Action::RespondEmpty));

        // Standard interface requests never reach the profile.
        let get_interface = ControlRequest::new(0x81, 0x0a, 0, 0, 1);
        assert_eq!(action(&XBOX_ONE, get_interface, true), None);
        let set_interface = ControlRequest::new(0x01, 0x0b, 0, 0, 0);
        assert_eq!(action(&XBOX_ONE, set_interface, true), None);
    }

    #[test]
    fn test_xbox_current_report_overlay() {
        let req = ControlRequest::new(0xa1, request::GET_REPORT, 0x0100, 0, 20);
        match action(&XBOX, req, false) {
            Some(Action::CurrentReport { overlay }) => assert_eq!(overlay.len(), 4),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_g920_tables() {
        assert_eq!(G920_REPORT_11.len(), 20);
        assert_eq!(G920_REPORT_12.len(), 64);
        assert_eq!(G920_REPORT_12[0], 0x12);
        let feature = ControlRequest::new(
            0x21,
            request::SET_REPORT,
            (report_type::FEATURE as u16) << 8 | 0x42,
            0,
            8,
        );
        assert_eq!(
            action(&G920_XBOX_ONE, feature, false),
            Some(Action::Debug(DebugEcho::ReportId))
        );
    }
}
