//! Serial command handling.
//!
//! [`Dispatcher::dispatch`] runs once per complete frame, in the receive
//! context, before the next frame is read.

use adapter_proto::{Command, Frame, FIRMWARE_VERSION};

use crate::profile::BAUDRATE_UNIT;
use crate::state::AdapterState;
use crate::transport::{BaudControl, FatalReset, FrameSink, ResetReason, SerialError};

pub struct Dispatcher<'a, T, R, B> {
    state: &'a AdapterState,
    tx: T,
    reset: R,
    baud: B,
}

impl<'a, T, R, B> Dispatcher<'a, T, R, B>
where
    T: FrameSink,
    R: FatalReset,
    B: BaudControl,
{
    pub fn new(state: &'a AdapterState, tx: T, reset: R, baud: B) -> Self {
        Self {
            state,
            tx,
            reset,
            baud,
        }
    }

    /// Act on one frame and send its reply, if the command has one.
    ///
    /// Unknown commands and commands the profile's generation does not know
    /// are dropped without a reply.
    ///
    /// # Errors
    ///
    /// Errors from writing the reply or reconfiguring the UART.
    pub fn dispatch(&mut self, frame: &Frame<'_>) -> Result<(), SerialError> {
        let Some(command) = frame.command() else {
            warn!("ignoring unknown command {=u8:#x}", frame.raw_command());
            return Ok(());
        };
        let payload = frame.payload();
        let extended = self.state.profile().generation.has_extended_commands();

        match command {
            Command::Type => {
                let adapter_type = self.state.profile().adapter_type.as_byte();
                self.tx.send_frame(Command::Type, &[adapter_type])
            }
            Command::Status => {
                let status = self.state.status_byte();
                self.tx.send_frame(Command::Status, &[status])
            }
            Command::Start => {
                let previous = self.state.start();
                info!("start (previous status {=u8})", previous);
                self.tx.send_frame(Command::Start, &[previous])
            }
            Command::ControlData => {
                if self.state.post_reply(payload).is_err() {
                    warn!("dropping {=usize} byte control reply", payload.len());
                }
                Ok(())
            }
            Command::Reset => self.reset.trigger_fatal_reset(ResetReason::Command),
            Command::InReport => {
                if self.state.post_report(payload).is_err() {
                    warn!("dropping {=usize} byte report", payload.len());
                }
                Ok(())
            }
            Command::Ids if extended => {
                let [v0, v1, p0, p1, ..] = *payload else {
                    warn!("short IDS payload ({=usize} bytes)", payload.len());
                    return Ok(());
                };
                let vid = u16::from_be_bytes([v0, v1]);
                let pid = u16::from_be_bytes([p0, p1]);
                debug!("ids {=u16:#06x}:{=u16:#06x}", vid, pid);
                self.state.set_ids(vid, pid);
                Ok(())
            }
            Command::Baudrate if extended => match payload.first() {
                None => {
                    let code = self.state.baudrate_code();
                    self.tx.send_frame(Command::Baudrate, &[code])
                }
                Some(0) => {
                    warn!("ignoring baud code 0");
                    Ok(())
                }
                Some(&code) => {
                    info!("baud code {=u8}", code);
                    self.state.set_baudrate_code(code);
                    self.baud.set_baudrate(u32::from(code) * BAUDRATE_UNIT)
                }
            },
            Command::Version if extended => {
                let (major, minor) = FIRMWARE_VERSION;
                self.tx.send_frame(Command::Version, &[major, minor])
            }
            Command::Ids | Command::Baudrate | Command::Version => {
                warn!("{:?} not supported by this adapter", command);
                Ok(())
            }
            Command::NoPacket | Command::Debug | Command::OutReport => {
                warn!("ignoring {:?} from authority", command);
                Ok(())
            }
        }
    }
}
