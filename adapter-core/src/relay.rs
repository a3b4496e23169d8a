//! USB control request handling driven by an [`AdapterProfile`].
//!
//! The first matching [`Rule`](crate::profile::Rule) decides what happens to a
//! request. Relayed IN requests block the caller until the authority answers
//! with a CONTROL_DATA frame; the wait can be bounded with a [`Cancel`].

use adapter_proto::request::{report_type, request, request_type, HEADER_SIZE};
use adapter_proto::{Command, ControlRequest, MAX_CONTROL_TRANSFER};

use crate::pairing::{BdaddrExchange, PairingData, PairingStore};
use crate::profile::{Action, AdapterProfile, DebugEcho, PairingOp};
use crate::state::AdapterState;
use crate::transport::{FatalReset, FrameSink, RelayError, ResetReason};

/// Answer to a device-to-host request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InReply {
    /// Send the first `n` bytes of the caller's buffer.
    Data(usize),
    /// Stall.
    Rejected,
}

/// Answer to a host-to-device request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OutReply {
    Accepted,
    Rejected,
}

/// Stop condition for the blocking relay wait, polled once per spin.
pub trait Cancel {
    fn is_cancelled(&mut self) -> bool;
}

/// Wait forever.
#[derive(Debug, Default, Clone, Copy)]
pub struct Never;

impl Cancel for Never {
    #[inline]
    fn is_cancelled(&mut self) -> bool {
        false
    }
}

impl<F: FnMut() -> bool> Cancel for F {
    fn is_cancelled(&mut self) -> bool {
        self()
    }
}

/// Give up after a fixed number of polls.
#[derive(Debug, Clone, Copy)]
pub struct SpinLimit {
    remaining: u32,
}

impl SpinLimit {
    #[must_use]
    pub const fn new(spins: u32) -> Self {
        Self { remaining: spins }
    }
}

impl Cancel for SpinLimit {
    fn is_cancelled(&mut self) -> bool {
        match self.remaining.checked_sub(1) {
            Some(left) => {
                self.remaining = left;
                false
            }
            None => true,
        }
    }
}

/// Copy as much of `src` as fits, returning the count.
fn copy_into(dst: &mut [u8], src: &[u8]) -> usize {
    let n = dst.len().min(src.len());
    dst[..n].copy_from_slice(&src[..n]);
    n
}

/// Overwrite `dst[offset..]` with as much of `bytes` as fits.
fn splice(dst: &mut [u8], offset: usize, bytes: &[u8]) {
    if let Some(tail) = dst.get_mut(offset..) {
        copy_into(tail, bytes);
    }
}

const CLASS_SET_REPORT: (u8, u8) = (
    request_type::DIR_OUT | request_type::TYPE_CLASS | request_type::REC_INTERFACE,
    request::SET_REPORT,
);

pub struct ControlRelay<'a, T, R, S> {
    profile: &'static AdapterProfile,
    state: &'a AdapterState,
    tx: T,
    reset: R,
    store: S,
    handshake_latch: bool,
    pairing: PairingData,
    bdaddr: BdaddrExchange,
}

impl<'a, T, R, S> ControlRelay<'a, T, R, S>
where
    T: FrameSink,
    R: FatalReset,
    S: PairingStore,
{
    /// Build a relay, loading saved pairing data from `store`.
    pub fn new(state: &'a AdapterState, tx: T, reset: R, mut store: S) -> Self {
        let pairing = match store.load() {
            Ok(Some(data)) => data,
            Ok(None) => PairingData::default(),
            Err(e) => {
                warn!("pairing data unreadable: {:?}", e);
                PairingData::default()
            }
        };
        Self {
            profile: state.profile(),
            state,
            tx,
            reset,
            store,
            handshake_latch: false,
            pairing,
            bdaddr: BdaddrExchange::default(),
        }
    }

    #[must_use]
    pub fn pairing(&self) -> &PairingData {
        &self.pairing
    }

    /// Handle a device-to-host request, writing the data stage into `buf`.
    ///
    /// `None` leaves the request to the USB stack.
    pub fn control_in(&mut self, req: &ControlRequest, buf: &mut [u8]) -> Option<InReply> {
        self.control_in_with(req, buf, &mut Never)
    }

    /// [`control_in`](Self::control_in) with a bounded relay wait.
    pub fn control_in_with<C: Cancel>(
        &mut self,
        req: &ControlRequest,
        buf: &mut [u8],
        cancel: &mut C,
    ) -> Option<InReply> {
        self.try_control_in(req, buf, cancel).unwrap_or_else(|e| {
            warn!("control IN {:?} failed: {:?}", req, e);
            Some(InReply::Rejected)
        })
    }

    /// # Errors
    ///
    /// [`RelayError::Serial`] if a frame could not be written,
    /// [`RelayError::Cancelled`] if `cancel` fired during a relay.
    pub fn try_control_in<C: Cancel>(
        &mut self,
        req: &ControlRequest,
        buf: &mut [u8],
        cancel: &mut C,
    ) -> Result<Option<InReply>, RelayError> {
        if self.profile.debug_every_request {
            self.tx.send_frame(Command::Debug, &req.to_bytes())?;
        }
        let Some(rule) = self.profile.find_rule(req, self.state.is_spoofed()) else {
            return Ok(None);
        };
        if usize::from(req.length) > MAX_CONTROL_TRANSFER {
            warn!("rejecting {=u16} byte control IN", req.length);
            return Ok(Some(InReply::Rejected));
        }
        if rule.marks_ready {
            self.state.mark_ready();
        }

        let limit = usize::from(req.length).min(buf.len());
        let buf = &mut buf[..limit];
        let len = match rule.action {
            Action::Relay => {
                let n = self.relay_in(req, buf, cancel)?;
                self.check_handshake(req);
                n
            }
            Action::Respond(table) => {
                let n = copy_into(buf, table);
                self.apply_feature_patch(req, &mut buf[..n]);
                if self.profile.debug_static_replies {
                    self.tx
                        .send_frame(Command::Debug, &[req.report_id(), table.len() as u8])?;
                }
                n
            }
            Action::RespondEmpty => 0,
            Action::CurrentReport { overlay } => {
                let n = self.state.with_last_report(|report| copy_into(buf, report));
                for &(offset, byte) in overlay {
                    if let Some(b) = buf[..n].get_mut(usize::from(offset)) {
                        *b = byte;
                    }
                }
                n
            }
            Action::FatalReset => self.reset.trigger_fatal_reset(ResetReason::AuthSentinel),
            Action::Debug(echo) => {
                self.send_debug(echo, req, &[])?;
                return Ok(None);
            }
            Action::Pairing(op) => match self.pairing_in(op, buf) {
                Some(n) => n,
                None => return Ok(None),
            },
            Action::Accept | Action::ForwardOut { .. } => {
                warn!("host-to-device rule matched {:?}", req);
                return Ok(None);
            }
        };
        Ok(Some(InReply::Data(len)))
    }

    /// Handle a host-to-device request with its data stage.
    pub fn control_out(&mut self, req: &ControlRequest, data: &[u8]) -> Option<OutReply> {
        self.try_control_out(req, data).unwrap_or_else(|e| {
            warn!("control OUT {:?} failed: {:?}", req, e);
            Some(OutReply::Rejected)
        })
    }

    /// # Errors
    ///
    /// [`RelayError::Serial`] if a frame could not be written.
    pub fn try_control_out(
        &mut self,
        req: &ControlRequest,
        data: &[u8],
    ) -> Result<Option<OutReply>, RelayError> {
        if self.profile.debug_every_request {
            self.tx.send_frame(Command::Debug, &req.to_bytes())?;
        }
        let oversized = usize::from(req.length) > MAX_CONTROL_TRANSFER;
        let Some(rule) = self.profile.find_rule(req, self.state.is_spoofed()) else {
            // The data stage of a class SET_REPORT is always read.
            if !oversized && (req.request_type, req.request) == CLASS_SET_REPORT {
                return Ok(Some(OutReply::Accepted));
            }
            return Ok(None);
        };
        if oversized {
            warn!("rejecting {=u16} byte control OUT", req.length);
            return Ok(Some(OutReply::Rejected));
        }
        let data = &data[..data.len().min(usize::from(req.length))];
        if rule.marks_ready {
            self.state.mark_ready();
        }

        match rule.action {
            Action::Relay => {
                let data_len = usize::from(req.relay_frame_len()).saturating_sub(HEADER_SIZE);
                self.tx.send_frame_parts(
                    Command::ControlData,
                    &req.to_bytes(),
                    &data[..data.len().min(data_len)],
                )?;
            }
            Action::Accept | Action::RespondEmpty => {}
            Action::ForwardOut { prefix: Some(prefix) } => {
                self.tx.send_frame_parts(Command::OutReport, &[prefix], data)?;
            }
            Action::ForwardOut { prefix: None } => {
                self.tx.send_frame(Command::OutReport, data)?;
            }
            Action::Debug(echo) => self.send_debug(echo, req, data)?,
            Action::Pairing(op) => self.pairing_out(op, data),
            Action::FatalReset => self.reset.trigger_fatal_reset(ResetReason::AuthSentinel),
            Action::Respond(_) | Action::CurrentReport { .. } => {
                warn!("device-to-host rule matched {:?}", req);
                return Ok(None);
            }
        }
        Ok(Some(OutReply::Accepted))
    }

    fn relay_in<C: Cancel>(
        &mut self,
        req: &ControlRequest,
        buf: &mut [u8],
        cancel: &mut C,
    ) -> Result<usize, RelayError> {
        self.state.clear_reply();
        self.tx.send_frame(Command::ControlData, &req.to_bytes())?;
        loop {
            if let Some(reply) = self.state.try_take_reply() {
                return Ok(copy_into(buf, &reply));
            }
            if cancel.is_cancelled() {
                return Err(RelayError::Cancelled);
            }
            core::hint::spin_loop();
        }
    }

    /// The second relayed trigger request completes the handshake.
    fn check_handshake(&mut self, req: &ControlRequest) {
        let Some(handshake) = self.profile.handshake else {
            return;
        };
        if req.value != handshake.trigger {
            return;
        }
        if self.handshake_latch && !self.state.is_spoofed() {
            info!("handshake complete");
            self.state.mark_spoofed();
        }
        self.handshake_latch = true;
    }

    fn apply_feature_patch(&self, req: &ControlRequest, buf: &mut [u8]) {
        let Some(patch) = self.profile.feature_patch else {
            return;
        };
        if req.report_type() != report_type::FEATURE || req.report_id() != patch.report_id {
            return;
        }
        self.state
            .with_feature_patch(|bytes| splice(buf, patch.target_offset, bytes));
    }

    fn send_debug(
        &mut self,
        echo: DebugEcho,
        req: &ControlRequest,
        data: &[u8],
    ) -> Result<(), RelayError> {
        match echo {
            DebugEcho::ReportId => self.tx.send_frame(Command::Debug, &[req.report_id()]),
            DebugEcho::TypeAndId => self
                .tx
                .send_frame(Command::Debug, &[req.report_type(), req.report_id()]),
            DebugEcho::Header => self.tx.send_frame(Command::Debug, &req.to_bytes()),
            DebugEcho::HeaderAndData => {
                self.tx
                    .send_frame_parts(Command::Debug, &req.to_bytes(), data)
            }
        }?;
        Ok(())
    }

    fn pairing_in(&mut self, op: PairingOp, buf: &mut [u8]) -> Option<usize> {
        match op {
            PairingOp::Ds4Addresses => Some(copy_into(buf, &self.pairing.ds4_addresses())),
            PairingOp::Ds4LinkKey => Some(copy_into(buf, &self.pairing.link_key)),
            PairingOp::Ds3Master(table) => {
                let n = copy_into(buf, table);
                if self.bdaddr.master_requested {
                    splice(&mut buf[..n], 2, &self.bdaddr.master);
                } else {
                    self.bdaddr.master_requested = true;
                }
                Some(n)
            }
            PairingOp::Ds3EfByte(table) => {
                let n = copy_into(buf, table);
                if let Some(b) = buf[..n].get_mut(7) {
                    *b = self.bdaddr.ef_byte;
                }
                Some(n)
            }
            PairingOp::Ds4SetSlave
            | PairingOp::Ds4SetMasterAndLink
            | PairingOp::Ds3SetMaster
            | PairingOp::Ds3SetEfByte => {
                warn!("{:?} is a SET operation", op);
                None
            }
        }
    }

    fn pairing_out(&mut self, op: PairingOp, data: &[u8]) {
        match op {
            PairingOp::Ds4SetSlave => {
                let Some(slave) = data.get(..6) else {
                    warn!("short slave address ({=usize} bytes)", data.len());
                    return;
                };
                self.pairing.slave.copy_from_slice(slave);
                self.persist();
            }
            PairingOp::Ds4SetMasterAndLink => {
                let (Some(master), Some(link_key)) = (data.get(1..7), data.get(7..23)) else {
                    warn!("short link key report ({=usize} bytes)", data.len());
                    return;
                };
                self.pairing.master.copy_from_slice(master);
                self.pairing.link_key.copy_from_slice(link_key);
                self.persist();
            }
            PairingOp::Ds3SetMaster => {
                if let Some(master) = data.get(2..8) {
                    self.bdaddr.master.copy_from_slice(master);
                }
            }
            PairingOp::Ds3SetEfByte => {
                if let Some(&byte) = data.get(6) {
                    self.bdaddr.ef_byte = byte;
                }
            }
            PairingOp::Ds4Addresses
            | PairingOp::Ds4LinkKey
            | PairingOp::Ds3Master(_)
            | PairingOp::Ds3EfByte(_) => {
                warn!("{:?} is a GET operation", op);
            }
        }
    }

    fn persist(&mut self) {
        match self.store.save(&self.pairing) {
            Ok(()) => debug!("pairing data saved"),
            Err(e) => warn!("saving pairing data failed: {:?}", e),
        }
    }
}
