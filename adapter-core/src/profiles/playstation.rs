//! PlayStation family: DS3, DS4, the DS4 pairing helper and the Logitech and
//! Thrustmaster wheels for PS2, PS3 and PS4.

use adapter_proto::request::request;
use adapter_proto::{AdapterType, Command};

use super::{
    get_feature, get_report, set_feature, set_idle, set_report, CLASS_IN, LEGACY_BAUDRATE,
};
use crate::profile::{
    Action, AdapterProfile, DebugEcho, EndpointConfig, FeaturePatch, Generation, PairingOp,
    RequestFilter, Rule, StatusSource,
};

/// Zero-pad `head` to `N` bytes.
const fn padded<const N: usize>(head: &[u8]) -> [u8; N] {
    let mut out = [0u8; N];
    let mut i = 0;
    while i < head.len() {
        out[i] = head[i];
        i += 1;
    }
    out
}

/// Same as [`padded`], with `tail` written at `offset`.
const fn padded_with<const N: usize>(head: &[u8], offset: usize, tail: &[u8]) -> [u8; N] {
    let mut out = padded::<N>(head);
    let mut i = 0;
    while i < tail.len() {
        out[offset + i] = tail[i];
        i += 1;
    }
    out
}

const fn get_feature_id(id: u8) -> RequestFilter {
    get_report(0x0300 | id as u16)
}

const fn set_feature_id(id: u8) -> RequestFilter {
    set_report(0x0300 | id as u16)
}

// DualShock 3 feature reports.

const DS3_REPORT_01: [u8; 64] = padded(&[
    0x00, 0x01, 0x04, 0x00, 0x07, 0x0c, 0x01, 0x02, 0x18, 0x18, 0x18, 0x18, 0x09, 0x0a, 0x10,
    0x11, 0x12, 0x13, 0x00, 0x00, 0x00, 0x00, 0x04, 0x00, 0x02, 0x02, 0x02, 0x02, 0x00, 0x00,
    0x00, 0x04, 0x04, 0x04, 0x04, 0x00, 0x00, 0x04, 0x00, 0x01, 0x02, 0x07, 0x00, 0x17,
]);

const DS3_REPORT_F2: [u8; 64] = padded(&[
    0xf2, 0xff, 0xff, 0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x00, 0x03, 0x50, 0x81, 0xd8,
    0x01, 0x8a, 0x13, 0x00, 0x00, 0x00, 0x00, 0x04, 0x00, 0x02, 0x02, 0x02, 0x02, 0x00, 0x00,
    0x00, 0x04, 0x04, 0x04, 0x04, 0x00, 0x00, 0x04, 0x00, 0x01, 0x02, 0x07, 0x00, 0x17,
]);

/// Bytes 2..8 hold a dummy console address until the console has written its own.
const DS3_REPORT_F5: [u8; 64] = padded(&[
    0x01, 0x00, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0xff, 0xf7, 0x00, 0x03, 0x50, 0x81, 0xd8,
    0x01, 0x8a, 0x13, 0x00, 0x00, 0x00, 0x00, 0x04, 0x00, 0x02, 0x02, 0x02, 0x02, 0x00, 0x00,
    0x00, 0x04, 0x04, 0x04, 0x04, 0x00, 0x00, 0x04, 0x00, 0x01, 0x02, 0x07, 0x00, 0x17,
]);

const DS3_REPORT_EF: [u8; 64] = padded_with(
    &[
        0x00, 0xef, 0x04, 0x00, 0x07, 0x03, 0x01, 0xb0, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        0x00, 0x00, 0x02, 0x6b, 0x02, 0x68,
    ],
    48,
    &[0x05],
);

const DS3_REPORT_F8: [u8; 64] = padded_with(
    &[
        0x00, 0x01, 0x00, 0x00, 0x07, 0x03, 0x01, 0xb0, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        0x00, 0x00, 0x02, 0x6b, 0x02, 0x68,
    ],
    48,
    &[0x05],
);

const DS3_REPORT_F7: [u8; 64] = padded_with(
    &[
        0x01, 0x04, 0xc4, 0x02, 0xd6, 0x01, 0xee, 0xff, 0x14, 0x13, 0x01, 0x02, 0xc4, 0x01, 0xd6,
        0x00, 0x00, 0x02, 0x02, 0x02, 0x00, 0x03, 0x00, 0x00, 0x02, 0x00, 0x00, 0x02, 0x62, 0x01,
        0x02, 0x01, 0x5e, 0x00, 0x32,
    ],
    48,
    &[0x05],
);

const SIXAXIS_RULES: &[Rule] = &[
    Rule::new(get_feature_id(0x01), Action::Respond(&DS3_REPORT_01)),
    Rule::new(get_feature_id(0xf2), Action::Respond(&DS3_REPORT_F2)),
    Rule::new(
        get_feature_id(0xf5),
        Action::Pairing(PairingOp::Ds3Master(&DS3_REPORT_F5)),
    ),
    Rule::new(
        get_feature_id(0xef),
        Action::Pairing(PairingOp::Ds3EfByte(&DS3_REPORT_EF)),
    ),
    Rule::new(
        get_feature_id(0xf8),
        Action::Pairing(PairingOp::Ds3EfByte(&DS3_REPORT_F8)),
    ),
    Rule::new(get_feature_id(0xf7), Action::Respond(&DS3_REPORT_F7)),
    Rule::new(get_feature(), Action::Debug(DebugEcho::ReportId)),
    Rule::new(set_feature_id(0xf5), Action::Pairing(PairingOp::Ds3SetMaster)),
    Rule::new(set_feature_id(0xef), Action::Pairing(PairingOp::Ds3SetEfByte)),
    Rule::new(
        set_report(0x0201),
        Action::ForwardOut { prefix: Some(0x01) },
    )
    .marking_ready(),
    Rule::new(
        RequestFilter::masked(0xe0, 0x20).request(request::SET_IDLE),
        Action::Accept,
    ),
];

/// Sixaxis / DualShock 3. Reports flow from power-up; the console's LED
/// output report marks the controller ready.
pub static SIXAXIS: AdapterProfile = AdapterProfile {
    name: "sixaxis",
    adapter_type: AdapterType::Sixaxis,
    generation: Generation::Legacy,
    status_source: StatusSource::Started,
    fixed_baudrate: 2_000_000,
    in_endpoint: EndpointConfig::new(1, 64, 1),
    out_endpoint: Some(EndpointConfig::new(2, 64, 1)),
    out_report_command: Command::OutReport,
    out_spoof_prefix: None,
    handshake: None,
    gate_reports: false,
    debug_every_request: false,
    debug_static_replies: false,
    feature_patch: None,
    rules: SIXAXIS_RULES,
};

/// PS4 authentication status: no challenge pending.
const PS4_F3: &[u8] = &[0xf3, 0x00, 0x38, 0x38, 0x00, 0x00, 0x00, 0x00];

const DS4_REPORT_03: [u8; 48] = padded(&[
    0x03, 0x21, 0x27, 0x04, 0x4d, 0x00, 0x2c, 0x56, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x0d, 0x0d,
]);

const DS4_RULES: &[Rule] = &[
    Rule::new(get_report(0x0303), Action::Respond(&DS4_REPORT_03)).marking_ready(),
    Rule::new(get_report(0x03f3), Action::Respond(PS4_F3)),
    Rule::new(get_report(0x03f1), Action::Relay),
    Rule::new(get_report(0x03f2), Action::Relay),
    Rule::new(set_report(0x03f0), Action::Relay),
];

/// DualShock 4. The PS4 authentication challenge (f0) and its answers (f1,
/// f2) go through the authority.
pub static DS4: AdapterProfile = AdapterProfile {
    name: "ds4",
    adapter_type: AdapterType::Ds4,
    generation: Generation::Common,
    status_source: StatusSource::Spoof,
    fixed_baudrate: LEGACY_BAUDRATE,
    in_endpoint: EndpointConfig::new(4, 64, 5),
    out_endpoint: Some(EndpointConfig::new(3, 64, 5)),
    out_report_command: Command::OutReport,
    out_spoof_prefix: None,
    handshake: None,
    gate_reports: false,
    debug_every_request: false,
    debug_static_replies: false,
    feature_patch: None,
    rules: DS4_RULES,
};

const fn ps4_and_ps3_profile(
    name: &'static str,
    gate_reports: bool,
    rules: &'static [Rule],
) -> AdapterProfile {
    AdapterProfile {
        name,
        adapter_type: AdapterType::Ds4,
        generation: Generation::Legacy,
        status_source: StatusSource::Started,
        fixed_baudrate: LEGACY_BAUDRATE,
        in_endpoint: EndpointConfig::new(4, 64, 5),
        out_endpoint: Some(EndpointConfig::new(3, 64, 5)),
        out_report_command: Command::OutReport,
        out_spoof_prefix: None,
        handshake: None,
        gate_reports,
        debug_every_request: false,
        debug_static_replies: false,
        feature_patch: None,
        rules,
    }
}

/// Combined PS4/PS3 adapter, PS4 console: DualShock 4 answers, and no IN
/// report until the console has read the capabilities report.
pub static PS4_AND_PS3_PS4: AdapterProfile =
    ps4_and_ps3_profile("ps4-and-ps3-ps4", true, DS4_RULES);

/// Combined PS4/PS3 adapter, PS3 console: DualShock 3 feature reports, and
/// IN reports from power-up. TYPE still answers DS4.
pub static PS4_AND_PS3_PS3: AdapterProfile =
    ps4_and_ps3_profile("ps4-and-ps3-ps3", false, SIXAXIS_RULES);

/// Profile of the combined PS4/PS3 adapter for the console strap read at
/// boot.
#[must_use]
pub fn ps4_and_ps3(ps3: bool) -> &'static AdapterProfile {
    if ps3 {
        &PS4_AND_PS3_PS3
    } else {
        &PS4_AND_PS3_PS4
    }
}

const DS4_REPORT_A3: &[u8] = &[
    0xa3, 0x41, 0x75, 0x67, 0x20, 0x20, 0x33, 0x20, 0x32, 0x30, 0x31, 0x33, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x30, 0x37, 0x3a, 0x30, 0x31, 0x3a, 0x31, 0x32, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x01, 0x00, 0x31, 0x03, 0x00, 0x00, 0x00, 0x49, 0x00, 0x05, 0x00,
    0x00, 0x80, 0x03, 0x00,
];

const DS4_REPORT_02: &[u8] = &[
    0x02, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x87, 0x22, 0x7b, 0xdd, 0xb2, 0x22, 0x47, 0xdd,
    0xbd, 0x22, 0x43, 0xdd, 0x1c, 0x02, 0x1c, 0x02, 0x7f, 0x1e, 0x2e, 0xdf, 0x60, 0x1f, 0x4c,
    0xe0, 0x3a, 0x1d, 0xc6, 0xde, 0x08, 0x00,
];

const DS4_PAIRING_RULES: &[Rule] = &[
    Rule::new(get_report(0x03a3), Action::Respond(DS4_REPORT_A3)),
    Rule::new(get_report(0x0302), Action::Respond(DS4_REPORT_02)),
    Rule::new(get_report(0x0312), Action::Pairing(PairingOp::Ds4Addresses)),
    Rule::new(get_report(0x0313), Action::Pairing(PairingOp::Ds4LinkKey)),
    Rule::new(set_report(0x0312), Action::Pairing(PairingOp::Ds4SetSlave)),
    Rule::new(
        set_report(0x0313),
        Action::Pairing(PairingOp::Ds4SetMasterAndLink),
    ),
    Rule::new(set_report(0x0314), Action::Accept),
];

/// DualShock 4 used to pair a Bluetooth dongle with a PS4: addresses and link
/// key survive a power cycle.
pub static DS4_PAIRING: AdapterProfile = AdapterProfile {
    name: "ds4-pairing",
    adapter_type: AdapterType::Ds4,
    generation: Generation::Legacy,
    status_source: StatusSource::Started,
    fixed_baudrate: LEGACY_BAUDRATE,
    in_endpoint: EndpointConfig::new(4, 64, 1),
    out_endpoint: Some(EndpointConfig::new(3, 64, 1)),
    out_report_command: Command::OutReport,
    out_spoof_prefix: None,
    handshake: None,
    gate_reports: false,
    debug_every_request: false,
    debug_static_replies: false,
    feature_patch: None,
    rules: DS4_PAIRING_RULES,
};

const G29_REPORT_03: [u8; 48] = padded_with(
    &[
        0x03, 0x21, 0x27, 0x03, 0x11, 0x06, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        0x00, 0x00, 0x00, 0x0d, 0x0d,
    ],
    24,
    &[0x0d, 0x84, 0x03],
);

const G29_RULES: &[Rule] = &[
    Rule::new(get_feature_id(0xf1), Action::Relay),
    Rule::new(get_feature_id(0xf2), Action::Relay),
    Rule::new(get_feature_id(0x03), Action::Respond(&G29_REPORT_03)),
    Rule::new(get_feature_id(0xf3), Action::Respond(PS4_F3)),
    Rule::new(get_feature(), Action::Debug(DebugEcho::ReportId)),
    Rule::new(set_feature_id(0xf0), Action::Relay),
    Rule::new(set_feature(), Action::Debug(DebugEcho::ReportId)),
];

/// Logitech G29 wheel in PS4 mode.
pub static G29_PS4: AdapterProfile = AdapterProfile {
    name: "g29-ps4",
    adapter_type: AdapterType::G29Ps4,
    generation: Generation::Common,
    status_source: StatusSource::Spoof,
    fixed_baudrate: LEGACY_BAUDRATE,
    in_endpoint: EndpointConfig::new(4, 64, 5),
    out_endpoint: Some(EndpointConfig::new(3, 64, 5)),
    out_report_command: Command::OutReport,
    out_spoof_prefix: None,
    handshake: None,
    gate_reports: false,
    debug_every_request: false,
    debug_static_replies: false,
    feature_patch: None,
    rules: G29_RULES,
};

const T300RS_REPORT_4B: &[u8] = &[0x4b, 0x54, 0xd5, 0x80, 0x00, 0x00, 0x00, 0x00];
const T300RS_REPORT_4C: &[u8] = &[0x4c, 0x00, 0x02, 0x00, 0x00, 0x00, 0x02, 0x00];
const T300RS_REPORT_4D: &[u8] = &[0x4d, 0xe8, 0x03];
const T300RS_REPORT_4E: &[u8] = &[0x4e, 0x14];
const T300RS_REPORT_4F: &[u8] = &[0x4f, 0xc9, 0xa8, 0xb6, 0x15];

const T300RS_RULES: &[Rule] = &[
    Rule::new(get_feature_id(0xf1), Action::Relay),
    Rule::new(get_feature_id(0xf2), Action::Relay),
    Rule::new(get_feature_id(0x03), Action::Respond(&G29_REPORT_03)).marking_ready(),
    Rule::new(get_feature_id(0xf3), Action::Respond(PS4_F3)),
    Rule::new(get_feature_id(0x4b), Action::Respond(T300RS_REPORT_4B)),
    Rule::new(get_feature_id(0x4c), Action::Respond(T300RS_REPORT_4C)),
    Rule::new(get_feature_id(0x4d), Action::Respond(T300RS_REPORT_4D)),
    Rule::new(get_feature_id(0x4e), Action::Respond(T300RS_REPORT_4E)),
    Rule::new(get_feature_id(0x4f), Action::Respond(T300RS_REPORT_4F)),
    Rule::new(get_feature(), Action::Debug(DebugEcho::ReportId)),
    Rule::new(set_feature_id(0xf0), Action::Relay),
    Rule::new(set_feature(), Action::Debug(DebugEcho::HeaderAndData)),
];

/// Thrustmaster T300RS wheel in PS4 mode. Static answers and OUT reports are
/// reported to the authority as DEBUG frames.
pub static T300RS_PS4: AdapterProfile = AdapterProfile {
    name: "t300rs-ps4",
    adapter_type: AdapterType::T300rsPs4,
    generation: Generation::Legacy,
    status_source: StatusSource::Started,
    fixed_baudrate: LEGACY_BAUDRATE,
    in_endpoint: EndpointConfig::new(4, 64, 5),
    out_endpoint: Some(EndpointConfig::new(3, 64, 5)),
    out_report_command: Command::Debug,
    out_spoof_prefix: None,
    handshake: None,
    gate_reports: true,
    debug_every_request: false,
    debug_static_replies: true,
    feature_patch: Some(FeaturePatch {
        trigger: 0x38,
        source_offset: 2,
        report_id: 0x4b,
        target_offset: 1,
        len: 2,
    }),
    rules: T300RS_RULES,
};

const G27_RULES: &[Rule] = &[
    Rule::new(set_idle(), Action::Accept),
    Rule::new(
        RequestFilter::request_type(CLASS_IN).request(request::GET_REPORT),
        Action::Debug(DebugEcho::TypeAndId),
    ),
    Rule::new(set_feature(), Action::Debug(DebugEcho::Header)),
];

/// Logitech G27 wheel in PS3 mode.
pub static G27_PS3: AdapterProfile = AdapterProfile {
    name: "g27-ps3",
    adapter_type: AdapterType::G27Ps3,
    generation: Generation::Common,
    status_source: StatusSource::Spoof,
    fixed_baudrate: LEGACY_BAUDRATE,
    in_endpoint: EndpointConfig::new(1, 16, 2),
    out_endpoint: Some(EndpointConfig::new(2, 16, 2)),
    out_report_command: Command::OutReport,
    out_spoof_prefix: None,
    handshake: None,
    gate_reports: false,
    debug_every_request: false,
    debug_static_replies: false,
    feature_patch: None,
    rules: G27_RULES,
};

const PS2_WHEEL_RULES: &[Rule] = &[
    Rule::new(get_feature(), Action::Debug(DebugEcho::ReportId)),
    Rule::new(set_feature(), Action::Debug(DebugEcho::HeaderAndData)),
];

const fn ps2_wheel(
    name: &'static str,
    adapter_type: AdapterType,
    max_packet_size: u16,
) -> AdapterProfile {
    AdapterProfile {
        name,
        adapter_type,
        generation: Generation::Common,
        status_source: StatusSource::Spoof,
        fixed_baudrate: LEGACY_BAUDRATE,
        in_endpoint: EndpointConfig::new(1, max_packet_size, 10),
        out_endpoint: Some(EndpointConfig::new(2, max_packet_size, 10)),
        out_report_command: Command::OutReport,
        out_spoof_prefix: None,
        handshake: None,
        gate_reports: false,
        debug_every_request: false,
        debug_static_replies: false,
        feature_patch: None,
        rules: PS2_WHEEL_RULES,
    }
}

/// Logitech Driving Force (PS2).
pub static DF_PS2: AdapterProfile = ps2_wheel("df-ps2", AdapterType::DfPs2, 8);
/// Logitech Driving Force Pro (PS2).
pub static DFP_PS2: AdapterProfile = ps2_wheel("dfp-ps2", AdapterType::DfpPs2, 16);
/// Logitech GT Force (PS2).
pub static GTF_PS2: AdapterProfile = ps2_wheel("gtf-ps2", AdapterType::GtfPs2, 8);

#[cfg(test)]
mod tests {
    use super::*;
    use adapter_proto::ControlRequest;

    fn action(profile: &AdapterProfile, req: ControlRequest) -> Option<Action> {
        profile.find_rule(&req, false).map(|r| r.action)
    }

    #[test]
    fn test_table_sizes() {
        assert_eq!(DS4_REPORT_03.len(), 48);
        assert_eq!(G29_REPORT_03[24..27], [0x0d, 0x84, 0x03]);
        assert_eq!(DS4_REPORT_A3.len(), 49);
        assert_eq!(DS4_REPORT_02.len(), 37);
        assert_eq!(DS3_REPORT_EF[48], 0x05);
        assert_eq!(DS3_REPORT_F7[48], 0x05);
        assert_eq!(DS3_REPORT_F5[2..8], [0xaa; 6]);
    }

    #[test]
    fn test_ds4_feature_rules() {
        let caps = ControlRequest::new(0xa1, 0x01, 0x0303, 0, 48);
        let rule = DS4.find_rule(&caps, false).unwrap();
        assert!(rule.marks_ready);
        assert_eq!(rule.action, Action::Respond(&DS4_REPORT_03));

        let f1 = ControlRequest::new(0xa1, 0x01, 0x03f1, 0, 64);
        assert_eq!(action(&DS4, f1), Some(Action::Relay));
        let f0 = ControlRequest::new(0x21, 0x09, 0x03f0, 0, 64);
        assert_eq!(action(&DS4, f0), Some(Action::Relay));
        let other = ControlRequest::new(0x21, 0x09, 0x0305, 0, 8);
        assert_eq!(action(&DS4, other), None);
    }

    #[test]
    fn test_g29_unknown_feature_is_echoed() {
        let get = ControlRequest::new(0xa1, 0x01, 0x0360, 0, 8);
        assert_eq!(
            action(&G29_PS4, get),
            Some(Action::Debug(DebugEcho::ReportId))
        );
        let set = ControlRequest::new(0x21, 0x09, 0x0360, 0, 8);
        assert_eq!(
            action(&G29_PS4, set),
            Some(Action::Debug(DebugEcho::ReportId))
        );
    }

    #[test]
    fn test_t300rs_static_features() {
        for (id, table) in [
            (0x4b, T300RS_REPORT_4B),
            (0x4c, T300RS_REPORT_4C),
            (0x4d, T300RS_REPORT_4D),
            (0x4e, T300RS_REPORT_4E),
            (0x4f, T300RS_REPORT_4F),
        ] {
            let req = ControlRequest::new(0xa1, 0x01, 0x0300 | id, 0, 64);
            assert_eq!(action(&T300RS_PS4, req), Some(Action::Respond(table)));
            assert_eq!(table[0] as u16, id);
        }
    }

    #[test]
    fn test_sixaxis_rules() {
        let led = ControlRequest::new(0x21, 0x09, 0x0201, 0, 48);
        let rule = SIXAXIS.find_rule(&led, false).unwrap();
        assert!(rule.marks_ready);
        assert_eq!(rule.action, Action::ForwardOut { prefix: Some(0x01) });

        let idle = ControlRequest::new(0x21, 0x0a, 0, 0, 0);
        assert_eq!(action(&SIXAXIS, idle), Some(Action::Accept));

        let unknown = ControlRequest::new(0xa1, 0x01, 0x0342, 0, 8);
        assert_eq!(
            action(&SIXAXIS, unknown),
            Some(Action::Debug(DebugEcho::ReportId))
        );
    }

    #[test]
    fn test_ps4_and_ps3_selection() {
        let caps = ControlRequest::new(0xa1, 0x01, 0x0303, 0, 48);
        let pairing = ControlRequest::new(0xa1, 0x01, 0x03f5, 0, 64);

        let ps4 = ps4_and_ps3(false);
        assert!(core::ptr::eq(ps4, &PS4_AND_PS3_PS4));
        assert_eq!(ps4.adapter_type, AdapterType::Ds4);
        assert!(ps4.gate_reports);
        assert_eq!(ps4.initial_baudrate(), 500_000);
        assert!(ps4.find_rule(&caps, false).unwrap().marks_ready);
        assert_eq!(action(ps4, pairing), None);

        let ps3 = ps4_and_ps3(true);
        assert!(core::ptr::eq(ps3, &PS4_AND_PS3_PS3));
        assert_eq!(ps3.adapter_type, AdapterType::Ds4);
        assert!(!ps3.gate_reports);
        assert_eq!(ps3.initial_baudrate(), 500_000);
        assert_eq!(
            action(ps3, pairing),
            Some(Action::Pairing(PairingOp::Ds3Master(&DS3_REPORT_F5)))
        );
        assert_eq!(
            action(ps3, caps),
            Some(Action::Debug(DebugEcho::ReportId))
        );
        assert_eq!(ps3.in_endpoint, ps4.in_endpoint);
    }

    #[test]
    fn test_g27_get_report_is_echoed_with_type() {
        let req = ControlRequest::new(0xa1, 0x01, 0x0101, 0, 16);
        assert_eq!(
            action(&G27_PS3, req),
            Some(Action::Debug(DebugEcho::TypeAndId))
        );
    }
}
