//! Interrupt endpoint pumps: IN reports from the authority to the host and
//! OUT reports from the host to the authority.

use core::future::Future;

use crate::state::{AdapterState, MAX_REPORT_LEN};
use crate::transport::{EndpointError, FrameSink, SerialError};

/// Interrupt IN endpoint.
pub trait InEndpoint {
    /// Send one report, waiting until the host polls for it.
    fn write_report(&mut self, report: &[u8]) -> impl Future<Output = Result<(), EndpointError>>;

    /// Wait until the host configures the endpoint.
    fn wait_enabled(&mut self) -> impl Future<Output = ()>;
}

/// Interrupt OUT endpoint.
pub trait OutEndpoint {
    /// Receive one packet into `buf`, returning its length.
    fn read_report(&mut self, buf: &mut [u8]) -> impl Future<Output = Result<usize, EndpointError>>;

    fn wait_enabled(&mut self) -> impl Future<Output = ()>;
}

/// Error type for pump operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PumpError {
    Endpoint(EndpointError),
    Serial(SerialError),
}

impl From<EndpointError> for PumpError {
    fn from(e: EndpointError) -> Self {
        Self::Endpoint(e)
    }
}

impl From<SerialError> for PumpError {
    fn from(e: SerialError) -> Self {
        Self::Serial(e)
    }
}

impl core::fmt::Display for PumpError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Endpoint(e) => write!(f, "endpoint: {e}"),
            Self::Serial(e) => write!(f, "serial: {e}"),
        }
    }
}

/// Sends the pending IN report whenever the adapter is ready.
pub struct InReportPump<'a> {
    state: &'a AdapterState,
}

impl<'a> InReportPump<'a> {
    pub fn new(state: &'a AdapterState) -> Self {
        Self { state }
    }

    /// Wait for readiness and a fresh report, then write it.
    ///
    /// A report posted while the adapter is not ready stays pending and is
    /// replaced by newer ones.
    pub async fn send_next_report<E: InEndpoint>(&mut self, ep: &mut E) -> Result<(), PumpError> {
        self.state.wait_ready().await;
        let report = self.state.wait_report().await;
        ep.write_report(&report).await?;
        Ok(())
    }

    pub async fn run<E: InEndpoint>(&mut self, ep: &mut E) -> ! {
        ep.wait_enabled().await;
        loop {
            match self.send_next_report(ep).await {
                Ok(()) => {}
                Err(PumpError::Endpoint(EndpointError::Disabled)) => {
                    debug!("IN endpoint disabled");
                    ep.wait_enabled().await;
                }
                Err(e) => warn!("IN report failed: {:?}", e),
            }
        }
    }
}

/// Forwards host OUT reports to the authority.
pub struct OutReportPump<'a, T> {
    state: &'a AdapterState,
    tx: T,
}

impl<'a, T: FrameSink> OutReportPump<'a, T> {
    pub fn new(state: &'a AdapterState, tx: T) -> Self {
        Self { state, tx }
    }

    /// Read one OUT packet and forward it. Returns the packet length; empty
    /// packets are not forwarded.
    pub async fn receive_next_report<E: OutEndpoint>(&mut self, ep: &mut E) -> Result<usize, PumpError> {
        let profile = self.state.profile();
        let max = profile
            .out_endpoint
            .map_or(MAX_REPORT_LEN, |cfg| usize::from(cfg.max_packet_size))
            .min(MAX_REPORT_LEN);
        let mut buf = [0u8; MAX_REPORT_LEN];
        let len = ep.read_report(&mut buf[..max]).await?;
        let data = &buf[..len];
        if data.is_empty() {
            return Ok(0);
        }

        self.tx.send_frame(profile.out_report_command, data)?;

        if let Some(prefix) = profile.out_spoof_prefix {
            if !self.state.is_spoofed() && data.starts_with(prefix) {
                info!("authentication complete");
                self.state.mark_spoofed();
            }
        }
        if let Some(patch) = profile.feature_patch {
            if data[0] == patch.trigger {
                let source = patch.source_offset..patch.source_offset + patch.len;
                match data.get(source) {
                    Some(bytes) => self.state.set_feature_patch(bytes),
                    None => warn!("short patch report ({=usize} bytes)", len),
                }
            }
        }
        Ok(len)
    }

    pub async fn run<E: OutEndpoint>(&mut self, ep: &mut E) -> ! {
        ep.wait_enabled().await;
        loop {
            match self.receive_next_report(ep).await {
                Ok(_) => {}
                Err(PumpError::Endpoint(EndpointError::Disabled)) => {
                    debug!("OUT endpoint disabled");
                    ep.wait_enabled().await;
                }
                Err(e) => warn!("OUT report failed: {:?}", e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use crate::profiles::{DS4, T300RS_PS4, X360, XBOX_ONE};
    use adapter_proto::Command;
    use embassy_futures::block_on;
    use std::collections::VecDeque;
    use std::vec::Vec;

    #[derive(Default)]
    struct MockIn {
        written: Vec<Vec<u8>>,
        fail: Option<EndpointError>,
    }

    impl InEndpoint for MockIn {
        fn write_report(&mut self, report: &[u8]) -> impl Future<Output = Result<(), EndpointError>> {
            let result = match self.fail.take() {
                Some(e) => Err(e),
                None => {
                    self.written.push(report.to_vec());
                    Ok(())
                }
            };
            core::future::ready(result)
        }

        fn wait_enabled(&mut self) -> impl Future<Output = ()> {
            core::future::ready(())
        }
    }

    struct MockOut {
        packets: VecDeque<Vec<u8>>,
    }

    impl MockOut {
        fn new(packets: &[&[u8]]) -> Self {
            Self {
                packets: packets.iter().map(|p| p.to_vec()).collect(),
            }
        }
    }

    impl OutEndpoint for MockOut {
        fn read_report(&mut self, buf: &mut [u8]) -> impl Future<Output = Result<usize, EndpointError>> {
            let result = match self.packets.pop_front() {
                Some(packet) if packet.len() > buf.len() => Err(EndpointError::BufferOverflow),
                Some(packet) => {
                    buf[..packet.len()].copy_from_slice(&packet);
                    Ok(packet.len())
                }
                None => Err(EndpointError::Disabled),
            };
            core::future::ready(result)
        }

        fn wait_enabled(&mut self) -> impl Future<Output = ()> {
            core::future::ready(())
        }
    }

    #[derive(Default)]
    struct Recorder {
        frames: Vec<(u8, Vec<u8>)>,
    }

    impl FrameSink for Recorder {
        fn send_frame(&mut self, command: Command, payload: &[u8]) -> Result<(), SerialError> {
            self.frames.push((command.as_byte(), payload.to_vec()));
            Ok(())
        }
    }

    #[test]
    fn test_in_pump_sends_latest_report() {
        let state = AdapterState::new(&DS4);
        state.post_report(&[1, 1]).unwrap();
        state.post_report(&[2, 2, 2]).unwrap();
        let mut ep = MockIn::default();
        block_on(InReportPump::new(&state).send_next_report(&mut ep)).unwrap();
        assert_eq!(ep.written, std::vec![std::vec![2, 2, 2]]);
        assert!(state.take_report().is_none());
    }

    #[test]
    fn test_in_pump_holds_report_until_ready() {
        let state = AdapterState::new(&X360);
        state.post_report(&[0x00, 0x14]).unwrap();
        assert!(!state.is_ready());
        state.mark_spoofed();

        let mut ep = MockIn::default();
        block_on(InReportPump::new(&state).send_next_report(&mut ep)).unwrap();
        assert_eq!(ep.written, std::vec![std::vec![0x00, 0x14]]);
    }

    #[test]
    fn test_in_pump_reports_endpoint_errors() {
        let state = AdapterState::new(&DS4);
        state.post_report(&[9]).unwrap();
        let mut ep = MockIn {
            fail: Some(EndpointError::Disabled),
            ..MockIn::default()
        };
        let result = block_on(InReportPump::new(&state).send_next_report(&mut ep));
        assert_eq!(result, Err(PumpError::Endpoint(EndpointError::Disabled)));
    }

    #[test]
    fn test_out_pump_forwards_reports() {
        let state = AdapterState::new(&DS4);
        let mut ep = MockOut::new(&[&[0x05, 0xff, 0x00], &[]]);
        let mut pump = OutReportPump::new(&state, Recorder::default());
        assert_eq!(block_on(pump.receive_next_report(&mut ep)), Ok(3));
        assert_eq!(block_on(pump.receive_next_report(&mut ep)), Ok(0));
        assert_eq!(pump.tx.frames, std::vec![(0xee, std::vec![0x05, 0xff, 0x00])]);
    }

    #[test]
    fn test_out_pump_respects_max_packet_size() {
        let state = AdapterState::new(&X360);
        let mut ep = MockOut::new(&[&[0u8; 33]]);
        let mut pump = OutReportPump::new(&state, Recorder::default());
        assert_eq!(
            block_on(pump.receive_next_report(&mut ep)),
            Err(PumpError::Endpoint(EndpointError::BufferOverflow))
        );
        assert!(pump.tx.frames.is_empty());
    }

    #[test]
    fn test_xbox_one_auth_packet_marks_spoofed() {
        let state = AdapterState::new(&XBOX_ONE);
        let mut ep = MockOut::new(&[&[0x06, 0x30, 0x01], &[0x06, 0x20, 0x00, 0x02]]);
        let mut pump = OutReportPump::new(&state, Recorder::default());
        block_on(pump.receive_next_report(&mut ep)).unwrap();
        assert!(!state.is_spoofed());
        block_on(pump.receive_next_report(&mut ep)).unwrap();
        assert!(state.is_spoofed());
        assert_eq!(pump.tx.frames.len(), 2);
    }

    #[test]
    fn test_t300rs_out_report_saves_patch_and_goes_out_as_debug() {
        let state = AdapterState::new(&T300RS_PS4);
        let mut ep = MockOut::new(&[&[0x38, 0x00, 0xab, 0xcd, 0xef]]);
        let mut pump = OutReportPump::new(&state, Recorder::default());
        block_on(pump.receive_next_report(&mut ep)).unwrap();
        state.with_feature_patch(|p| assert_eq!(p, &[0xab, 0xcd]));
        assert_eq!(pump.tx.frames[0].0, 0x99);
    }

    #[test]
    fn test_short_patch_report_is_ignored() {
        let state = AdapterState::new(&T300RS_PS4);
        let mut ep = MockOut::new(&[&[0x38, 0x00, 0xab]]);
        let mut pump = OutReportPump::new(&state, Recorder::default());
        block_on(pump.receive_next_report(&mut ep)).unwrap();
        state.with_feature_patch(|p| assert!(p.is_empty()));
    }
}
