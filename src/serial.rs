//! UART side of the adapter.
//!
//! Receive runs a [`FrameDecoder`] over single bytes and dispatches each
//! complete frame before reading the next one. Transmit goes through a
//! queue drained by one task, so frames from the receive loop, the control
//! handler and the OUT pump never interleave on the wire.
//!
//! Both tasks belong on a higher priority executor than the USB stack: the
//! control handler spins while the authority answers a relayed request, and
//! that answer arrives through [`SerialReceiver`].

use adapter_core::{
    AdapterState, BaudControl, Dispatcher, FatalReset, FrameSink, ResetReason, SerialError,
};
use adapter_proto::{encode_to_vec, CodecError, Command, FrameDecoder, HEADER_LEN, MAX_PAYLOAD_LEN};
use defmt::{debug, info, warn};
use embassy_rp::uart::{Async, Error as UartError, UartRx, UartTx};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_sync::signal::Signal;
use embassy_time::{with_deadline, Duration, Instant};

use crate::reset::WatchdogReset;

/// Largest frame on the wire.
pub const MAX_FRAME_LEN: usize = HEADER_LEN + MAX_PAYLOAD_LEN;

/// Frames waiting for the transmit task.
pub const TX_QUEUE_DEPTH: usize = 8;

pub type TxFrame = heapless::Vec<u8, MAX_FRAME_LEN>;

/// Work for the transmit task, in wire order.
enum TxItem {
    Frame(TxFrame),
    /// Switch the UART once everything queued before it has left the pin.
    Baudrate(u32),
}

static TX_QUEUE: Channel<CriticalSectionRawMutex, TxItem, TX_QUEUE_DEPTH> = Channel::new();

/// Raised by the transmit task when a queued baud rate change is applied.
static BAUD_APPLIED: Signal<CriticalSectionRawMutex, u32> = Signal::new();

/// Handle for queueing outbound frames.
///
/// Never waits: a full queue is reported as [`SerialError::Busy`], since the
/// control handler calls this from a synchronous context.
#[derive(Debug, Clone, Copy, Default)]
pub struct TxQueue;

impl FrameSink for TxQueue {
    fn send_frame(&mut self, command: Command, payload: &[u8]) -> Result<(), SerialError> {
        let frame: TxFrame = encode_to_vec(command, payload).map_err(|e| match e {
            CodecError::PayloadTooLong | CodecError::BufferTooSmall => SerialError::PayloadTooLong,
        })?;
        TX_QUEUE
            .try_send(TxItem::Frame(frame))
            .map_err(|_| SerialError::Busy)
    }
}

/// Drain the transmit queue into the UART.
///
/// A baud rate change is applied once the frames queued ahead of it have
/// left the UART FIFO.
pub async fn run_tx(mut tx: UartTx<'static, Async>) -> ! {
    loop {
        match TX_QUEUE.receive().await {
            TxItem::Frame(frame) => {
                if let Err(e) = tx.write(&frame).await {
                    warn!("UART write failed: {:?}", uart_error_to_serial_error(e));
                }
            }
            TxItem::Baudrate(baudrate) => {
                if let Err(e) = tx.blocking_flush() {
                    warn!("UART flush failed: {:?}", uart_error_to_serial_error(e));
                }
                tx.set_baudrate(baudrate);
                BAUD_APPLIED.signal(baudrate);
            }
        }
    }
}

/// Hand a baud rate change to the transmit task and wait until it is live.
async fn change_baudrate(baudrate: u32) {
    BAUD_APPLIED.reset();
    TX_QUEUE.send(TxItem::Baudrate(baudrate)).await;
    BAUD_APPLIED.wait().await;
}

/// Baud rate change requested while dispatching a frame.
///
/// The receive loop applies it through the transmit task once the
/// dispatcher is done with the frame.
#[derive(Debug, Default)]
struct PendingBaud(Option<u32>);

impl BaudControl for PendingBaud {
    fn set_baudrate(&mut self, baudrate: u32) -> Result<(), SerialError> {
        self.0 = Some(baudrate);
        Ok(())
    }
}

/// Frame receive loop.
pub struct SerialReceiver {
    rx: UartRx<'static, Async>,
    decoder: FrameDecoder,
    frame_budget: Option<Duration>,
}

impl SerialReceiver {
    pub fn new(rx: UartRx<'static, Async>, state: &AdapterState) -> Self {
        let frame_budget = state
            .profile()
            .generation
            .frame_budget_ms()
            .map(Duration::from_millis);
        Self {
            rx,
            decoder: FrameDecoder::new(),
            frame_budget,
        }
    }

    /// Read one byte, giving up at `deadline` if one is set.
    async fn read_byte(&mut self, deadline: Option<Instant>) -> Result<u8, SerialError> {
        let mut byte = [0u8; 1];
        match deadline {
            Some(at) => with_deadline(at, self.rx.read(&mut byte))
                .await
                .map_err(|_| SerialError::Timeout)?
                .map_err(uart_error_to_serial_error)?,
            None => self
                .rx
                .read(&mut byte)
                .await
                .map_err(uart_error_to_serial_error)?,
        }
        Ok(byte[0])
    }

    /// Receive and dispatch frames forever.
    ///
    /// A frame that overruns its budget, or any UART error, resets the
    /// adapter: there is no way to find the next frame boundary again.
    pub async fn run(&mut self, state: &AdapterState) -> ! {
        let mut reset = WatchdogReset;
        let mut deadline: Option<Instant> = None;
        info!("serial receiver running, frame budget {:?}", self.frame_budget);

        loop {
            let byte = match self.read_byte(deadline).await {
                Ok(byte) => byte,
                Err(SerialError::Timeout) => reset.trigger_fatal_reset(ResetReason::FrameTimeout),
                Err(e) => {
                    warn!("UART receive failed: {:?}", e);
                    reset.trigger_fatal_reset(ResetReason::SerialFault)
                }
            };

            let mut pending = PendingBaud::default();
            if let Some(frame) = self.decoder.push_byte(byte) {
                deadline = None;
                let mut dispatcher = Dispatcher::new(state, TxQueue, WatchdogReset, &mut pending);
                if let Err(e) = dispatcher.dispatch(&frame) {
                    warn!("frame {=u8:#x} failed: {:?}", frame.raw_command(), e);
                }
            }

            if let Some(baudrate) = pending.0 {
                change_baudrate(baudrate).await;
                debug!("UART now at {=u32} baud", baudrate);
            }

            if deadline.is_none() && self.decoder.in_progress() {
                deadline = self.frame_budget.map(|budget| Instant::now() + budget);
            }
        }
    }
}

/// Map UART errors to [`SerialError`].
fn uart_error_to_serial_error(e: UartError) -> SerialError {
    match e {
        UartError::Overrun => SerialError::Overrun,
        UartError::Framing | UartError::Break => SerialError::Framing,
        UartError::Parity => SerialError::Io,
        _ => SerialError::Io,
    }
}
