//! Built-in adapter profiles.
//!
//! | Profile | Type | Generation | IN ep | OUT ep |
//! |---------|------|------------|-------|--------|
//! | [`JOYSTICK`] | 0x00 | common | 1/64/1ms | - |
//! | [`X360`] | 0x01 | legacy | 1/32/1ms | 2/32/8ms |
//! | [`SIXAXIS`] | 0x02 | legacy | 1/64/1ms | 2/64/1ms |
//! | [`XBOX`] | 0x04 | common | 1/32/4ms | 2/32/4ms |
//! | [`DS4`] | 0x05 | common | 4/64/5ms | 3/64/5ms |
//! | [`DS4_PAIRING`] | 0x05 | legacy | 4/64/1ms | 3/64/1ms |
//! | [`XBOX_ONE`] | 0x06 | legacy | 1/64/4ms | 2/64/4ms |
//! | [`T300RS_PS4`] | 0x07 | legacy | 4/64/5ms | 3/64/5ms |
//! | [`G27_PS3`] | 0x08 | common | 1/16/2ms | 2/16/2ms |
//! | [`G29_PS4`] | 0x09 | common | 4/64/5ms | 3/64/5ms |
//! | [`DF_PS2`] | 0x0a | common | 1/8/10ms | 2/8/10ms |
//! | [`DFP_PS2`] | 0x0b | common | 1/16/10ms | 2/16/10ms |
//! | [`GTF_PS2`] | 0x0c | common | 1/8/10ms | 2/8/10ms |
//! | [`G920_XBOX_ONE`] | 0x0d | legacy | 1/64/4ms | 2/64/4ms |
//! | [`SWITCH`] | 0x0e | common | 1/64/8ms | 2/64/8ms |
//! | [`PS4_AND_PS3_PS4`] | 0x05 | legacy | 4/64/5ms | 3/64/5ms |
//! | [`PS4_AND_PS3_PS3`] | 0x05 | legacy | 4/64/5ms | 3/64/5ms |
//!
//! The combined PS4/PS3 adapter picks one of its two profiles at boot with
//! [`ps4_and_ps3`].

mod playstation;
mod xbox;

pub use playstation::{
    ps4_and_ps3, DFP_PS2, DF_PS2, DS4, DS4_PAIRING, G27_PS3, G29_PS4, GTF_PS2, PS4_AND_PS3_PS3,
    PS4_AND_PS3_PS4, SIXAXIS, T300RS_PS4,
};
pub use xbox::{G920_XBOX_ONE, X360, XBOX, XBOX_ONE};

use adapter_proto::request::{report_type, request, request_type};
use adapter_proto::{AdapterType, Command};

use crate::profile::{
    Action, AdapterProfile, EndpointConfig, Generation, RequestFilter, Rule, StatusSource,
};

/// Baud rate of the legacy generation, unless a profile says otherwise.
pub const LEGACY_BAUDRATE: u32 = 500_000;

/// `bmRequestType` for class requests to an interface.
pub(crate) const CLASS_IN: u8 =
    request_type::DIR_IN | request_type::TYPE_CLASS | request_type::REC_INTERFACE;
pub(crate) const CLASS_OUT: u8 =
    request_type::DIR_OUT | request_type::TYPE_CLASS | request_type::REC_INTERFACE;

/// Class GET_REPORT for a feature report.
pub(crate) const fn get_feature() -> RequestFilter {
    RequestFilter::request_type(CLASS_IN)
        .request(request::GET_REPORT)
        .report_type(report_type::FEATURE)
}

/// Class SET_REPORT for a feature report.
pub(crate) const fn set_feature() -> RequestFilter {
    RequestFilter::request_type(CLASS_OUT)
        .request(request::SET_REPORT)
        .report_type(report_type::FEATURE)
}

/// Class GET_REPORT for an exact `wValue`.
pub(crate) const fn get_report(value: u16) -> RequestFilter {
    RequestFilter::request_type(CLASS_IN)
        .request(request::GET_REPORT)
        .value(value)
}

/// Class SET_REPORT for an exact `wValue`.
pub(crate) const fn set_report(value: u16) -> RequestFilter {
    RequestFilter::request_type(CLASS_OUT)
        .request(request::SET_REPORT)
        .value(value)
}

/// HID SET_IDLE to an interface.
pub(crate) const fn set_idle() -> RequestFilter {
    RequestFilter::request_type(CLASS_OUT).request(request::SET_IDLE)
}

const JOYSTICK_INIT: &[u8] = &[0x21, 0x26, 0x01, 0x07, 0x00, 0x00, 0x00, 0x00];

const JOYSTICK_RULES: &[Rule] = &[
    Rule::new(get_report(0x0300), Action::Respond(JOYSTICK_INIT)),
    Rule::new(
        RequestFilter::request_type(CLASS_IN).request(request::GET_REPORT),
        Action::CurrentReport { overlay: &[] },
    ),
];

/// Generic HID joystick.
pub static JOYSTICK: AdapterProfile = AdapterProfile {
    name: "joystick",
    adapter_type: AdapterType::Joystick,
    generation: Generation::Common,
    status_source: StatusSource::Spoof,
    fixed_baudrate: LEGACY_BAUDRATE,
    in_endpoint: EndpointConfig::new(1, 64, 1),
    out_endpoint: None,
    out_report_command: Command::OutReport,
    out_spoof_prefix: None,
    handshake: None,
    gate_reports: false,
    debug_every_request: false,
    debug_static_replies: false,
    feature_patch: None,
    rules: JOYSTICK_RULES,
};

/// Nintendo Switch controller. Control requests are left to the USB stack.
pub static SWITCH: AdapterProfile = AdapterProfile {
    name: "switch",
    adapter_type: AdapterType::Switch,
    generation: Generation::Common,
    status_source: StatusSource::Spoof,
    fixed_baudrate: LEGACY_BAUDRATE,
    in_endpoint: EndpointConfig::new(1, 64, 8),
    out_endpoint: Some(EndpointConfig::new(2, 64, 8)),
    out_report_command: Command::OutReport,
    out_spoof_prefix: None,
    handshake: None,
    gate_reports: false,
    debug_every_request: false,
    debug_static_replies: false,
    feature_patch: None,
    rules: &[],
};

/// Every built-in profile.
#[cfg(test)]
pub(crate) static ALL: &[&AdapterProfile] = &[
    &JOYSTICK,
    &X360,
    &SIXAXIS,
    &XBOX,
    &DS4,
    &DS4_PAIRING,
    &XBOX_ONE,
    &T300RS_PS4,
    &G27_PS3,
    &G29_PS4,
    &DF_PS2,
    &DFP_PS2,
    &GTF_PS2,
    &G920_XBOX_ONE,
    &SWITCH,
    &PS4_AND_PS3_PS4,
    &PS4_AND_PS3_PS3,
];

/// Look a profile up by name.
#[cfg(test)]
pub(crate) fn by_name(name: &str) -> Option<&'static AdapterProfile> {
    ALL.iter().copied().find(|p| p.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::{Action, PairingOp};
    use adapter_proto::MAX_CONTROL_TRANSFER;

    #[test]
    fn test_static_answers_fit_a_control_transfer() {
        for profile in ALL {
            for rule in profile.rules {
                let table = match rule.action {
                    Action::Respond(t)
                    | Action::Pairing(PairingOp::Ds3Master(t))
                    | Action::Pairing(PairingOp::Ds3EfByte(t)) => t,
                    _ => continue,
                };
                assert!(
                    table.len() <= MAX_CONTROL_TRANSFER,
                    "{}: {} bytes",
                    profile.name,
                    table.len()
                );
            }
        }
    }

    #[test]
    fn test_endpoint_layout() {
        for profile in ALL {
            assert!(profile.in_endpoint.max_packet_size as usize <= MAX_CONTROL_TRANSFER);
            assert!(profile.in_endpoint.address & 0x80 == 0);
            if let Some(out) = profile.out_endpoint {
                assert_ne!(out.address, profile.in_endpoint.address, "{}", profile.name);
            }
        }
        assert!(JOYSTICK.out_endpoint.is_none());
        assert_eq!(DS4.in_endpoint, EndpointConfig::new(4, 64, 5));
        assert_eq!(G27_PS3.out_endpoint, Some(EndpointConfig::new(2, 16, 2)));
    }

    #[test]
    fn test_adapter_types() {
        let types: [(&AdapterProfile, u8); 17] = [
            (&JOYSTICK, 0x00),
            (&X360, 0x01),
            (&SIXAXIS, 0x02),
            (&XBOX, 0x04),
            (&DS4, 0x05),
            (&DS4_PAIRING, 0x05),
            (&XBOX_ONE, 0x06),
            (&T300RS_PS4, 0x07),
            (&G27_PS3, 0x08),
            (&G29_PS4, 0x09),
            (&DF_PS2, 0x0a),
            (&DFP_PS2, 0x0b),
            (&GTF_PS2, 0x0c),
            (&G920_XBOX_ONE, 0x0d),
            (&SWITCH, 0x0e),
            (&PS4_AND_PS3_PS4, 0x05),
            (&PS4_AND_PS3_PS3, 0x05),
        ];
        for (profile, code) in types {
            assert_eq!(profile.adapter_type.as_byte(), code, "{}", profile.name);
        }
    }

    #[test]
    fn test_legacy_baudrate_is_per_profile() {
        assert_eq!(SIXAXIS.generation, Generation::Legacy);
        assert_eq!(SIXAXIS.initial_baudrate(), 2_000_000);
        assert_eq!(X360.initial_baudrate(), LEGACY_BAUDRATE);
        assert_eq!(PS4_AND_PS3_PS3.initial_baudrate(), LEGACY_BAUDRATE);
        // Common profiles start at the default code whatever they declare.
        assert_eq!(DS4.initial_baudrate(), 500_000);
    }

    #[test]
    fn test_names_are_unique() {
        for (i, a) in ALL.iter().enumerate() {
            for b in &ALL[i + 1..] {
                assert_ne!(a.name, b.name);
            }
            assert!(core::ptr::eq(by_name(a.name).unwrap(), *a));
        }
        assert!(by_name("ps5").is_none());
    }

    #[test]
    fn test_joystick_rules() {
        use adapter_proto::ControlRequest;
        let init = ControlRequest::new(CLASS_IN, request::GET_REPORT, 0x0300, 0, 8);
        assert_eq!(
            JOYSTICK.find_rule(&init, false).unwrap().action,
            Action::Respond(JOYSTICK_INIT)
        );
        let input = ControlRequest::new(CLASS_IN, request::GET_REPORT, 0x0100, 0, 8);
        assert!(matches!(
            JOYSTICK.find_rule(&input, false).unwrap().action,
            Action::CurrentReport { .. }
        ));
    }
}
