//! Traits for the serial link and the reset primitive, plus their error types.

use adapter_proto::{Command, MAX_PAYLOAD_LEN};

/// Error type for serial operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SerialError {
    /// UART/communication I/O error.
    Io,
    /// Receive FIFO overrun.
    Overrun,
    /// UART framing or break error.
    Framing,
    /// A frame did not complete within its receive budget.
    Timeout,
    /// Frame payload longer than the length byte allows.
    PayloadTooLong,
    /// Transmit queue full.
    Busy,
}

impl core::fmt::Display for SerialError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Io => write!(f, "serial I/O error"),
            Self::Overrun => write!(f, "receive overrun"),
            Self::Framing => write!(f, "framing error"),
            Self::Timeout => write!(f, "frame timeout"),
            Self::PayloadTooLong => write!(f, "payload too long"),
            Self::Busy => write!(f, "transmit queue full"),
        }
    }
}

/// Error type for the blocking control-request relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RelayError {
    /// Writing the relayed request failed.
    Serial(SerialError),
    /// The caller's cancel condition fired before the authority answered.
    Cancelled,
}

impl From<SerialError> for RelayError {
    fn from(e: SerialError) -> Self {
        Self::Serial(e)
    }
}

impl core::fmt::Display for RelayError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Serial(e) => write!(f, "relay failed: {e}"),
            Self::Cancelled => write!(f, "relay cancelled"),
        }
    }
}

/// Error type for interrupt endpoint transfers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EndpointError {
    /// The endpoint is not configured (host not connected or reset).
    Disabled,
    /// The packet does not fit the buffer.
    BufferOverflow,
}

impl core::fmt::Display for EndpointError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Disabled => write!(f, "endpoint disabled"),
            Self::BufferOverflow => write!(f, "buffer overflow"),
        }
    }
}

/// Why the adapter is resetting itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ResetReason {
    /// RESET command from the authority.
    Command,
    /// A frame did not arrive completely within its budget.
    FrameTimeout,
    /// The host sent an authentication sentinel request.
    AuthSentinel,
    /// Unrecoverable UART error.
    SerialFault,
}

/// Outbound half of the serial link.
///
/// Each call writes one whole frame: no other frame may interleave with it.
pub trait FrameSink {
    /// Send `[command][payload.len()][payload]`.
    fn send_frame(&mut self, command: Command, payload: &[u8]) -> Result<(), SerialError>;

    /// Send a frame whose payload is `head` followed by `tail`.
    fn send_frame_parts(
        &mut self,
        command: Command,
        head: &[u8],
        tail: &[u8],
    ) -> Result<(), SerialError> {
        let total = head.len() + tail.len();
        if total > MAX_PAYLOAD_LEN {
            return Err(SerialError::PayloadTooLong);
        }
        let mut buf = [0u8; MAX_PAYLOAD_LEN];
        buf[..head.len()].copy_from_slice(head);
        buf[head.len()..total].copy_from_slice(tail);
        self.send_frame(command, &buf[..total])
    }
}

impl<T: FrameSink + ?Sized> FrameSink for &mut T {
    fn send_frame(&mut self, command: Command, payload: &[u8]) -> Result<(), SerialError> {
        (**self).send_frame(command, payload)
    }

    fn send_frame_parts(
        &mut self,
        command: Command,
        head: &[u8],
        tail: &[u8],
    ) -> Result<(), SerialError> {
        (**self).send_frame_parts(command, head, tail)
    }
}

/// The adapter's only recovery primitive: a full hardware reset.
pub trait FatalReset {
    fn trigger_fatal_reset(&mut self, reason: ResetReason) -> !;
}

impl<T: FatalReset + ?Sized> FatalReset for &mut T {
    fn trigger_fatal_reset(&mut self, reason: ResetReason) -> ! {
        (**self).trigger_fatal_reset(reason)
    }
}

/// UART reconfiguration for the BAUDRATE command.
pub trait BaudControl {
    fn set_baudrate(&mut self, baudrate: u32) -> Result<(), SerialError>;
}

impl<T: BaudControl + ?Sized> BaudControl for &mut T {
    fn set_baudrate(&mut self, baudrate: u32) -> Result<(), SerialError> {
        (**self).set_baudrate(baudrate)
    }
}
