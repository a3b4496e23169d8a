//! Frame encoding and the byte-at-a-time frame decoder.
//!
//! Wire format:
//!
//! ```text
//! [command:1][length:1][payload:length]
//! ```
//!
//! There is no checksum, no escaping and no delimiter. The receiver trusts the
//! length byte completely; after a lost byte the stream stays out of step
//! until the adapter is reset.

use crate::command::{Command, HEADER_LEN, MAX_PAYLOAD_LEN};

/// Error type for frame encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CodecError {
    /// Payload longer than the one-byte length field allows.
    PayloadTooLong,
    /// The output buffer cannot hold the encoded frame.
    BufferTooSmall,
}

impl core::fmt::Display for CodecError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::PayloadTooLong => write!(f, "payload too long"),
            Self::BufferTooSmall => write!(f, "buffer too small"),
        }
    }
}

/// Number of bytes `payload_len` occupies on the wire once framed.
#[inline]
#[must_use]
pub const fn encoded_len(payload_len: usize) -> usize {
    HEADER_LEN + payload_len
}

/// Encode a frame into `out`.
///
/// Returns the number of bytes written.
///
/// # Errors
///
/// [`CodecError::PayloadTooLong`] if `payload` exceeds 255 bytes,
/// [`CodecError::BufferTooSmall`] if `out` cannot hold the frame.
pub fn encode(command: Command, payload: &[u8], out: &mut [u8]) -> Result<usize, CodecError> {
    encode_raw(command.as_byte(), payload, out)
}

/// Encode a frame with an arbitrary command byte.
///
/// # Errors
///
/// Same as [`encode`].
pub fn encode_raw(command: u8, payload: &[u8], out: &mut [u8]) -> Result<usize, CodecError> {
    if payload.len() > MAX_PAYLOAD_LEN {
        return Err(CodecError::PayloadTooLong);
    }
    let total = encoded_len(payload.len());
    if out.len() < total {
        return Err(CodecError::BufferTooSmall);
    }
    out[0] = command;
    out[1] = payload.len() as u8;
    out[HEADER_LEN..total].copy_from_slice(payload);
    Ok(total)
}

/// Encode a frame into a `heapless::Vec`.
///
/// # Errors
///
/// Same as [`encode`], with `BufferTooSmall` when `N` is too small.
#[cfg(feature = "heapless")]
pub fn encode_to_vec<const N: usize>(
    command: Command,
    payload: &[u8],
) -> Result<heapless::Vec<u8, N>, CodecError> {
    let mut vec = heapless::Vec::new();
    vec.resize(N, 0).map_err(|_| CodecError::BufferTooSmall)?;
    let len = encode(command, payload, &mut vec)?;
    vec.truncate(len);
    Ok(vec)
}

/// A complete frame borrowed from the decoder buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Frame<'a> {
    command: u8,
    payload: &'a [u8],
}

impl<'a> Frame<'a> {
    /// Build a frame view from its parts.
    ///
    /// # Errors
    ///
    /// [`CodecError::PayloadTooLong`] if `payload` does not fit the length byte.
    pub fn new(command: u8, payload: &'a [u8]) -> Result<Self, CodecError> {
        if payload.len() > MAX_PAYLOAD_LEN {
            return Err(CodecError::PayloadTooLong);
        }
        Ok(Self { command, payload })
    }

    /// Decoded command, `None` if the byte is not part of the protocol.
    #[inline]
    #[must_use]
    pub fn command(&self) -> Option<Command> {
        Command::from_byte(self.command)
    }

    #[inline]
    #[must_use]
    pub fn raw_command(&self) -> u8 {
        self.command
    }

    #[inline]
    #[must_use]
    pub fn payload(&self) -> &'a [u8] {
        self.payload
    }

    /// Payload length, as carried in the length byte.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DecoderState {
    Command,
    Length,
    Payload { expected: usize },
}

/// Incremental frame decoder.
///
/// Feed bytes with [`FrameDecoder::push_byte`]; a frame is returned once its
/// last payload byte arrives. Frames are never queued: the returned view
/// borrows the decoder and must be handled before the next byte is pushed.
pub struct FrameDecoder {
    buffer: [u8; MAX_PAYLOAD_LEN],
    pos: usize,
    command: u8,
    state: DecoderState,
}

impl FrameDecoder {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            buffer: [0u8; MAX_PAYLOAD_LEN],
            pos: 0,
            command: 0,
            state: DecoderState::Command,
        }
    }

    /// Drop any partially received frame.
    pub fn reset(&mut self) {
        self.pos = 0;
        self.state = DecoderState::Command;
    }

    /// `true` once a command byte has been received and the frame is not complete yet.
    #[inline]
    #[must_use]
    pub fn in_progress(&self) -> bool {
        self.state != DecoderState::Command
    }

    /// Feed one byte.
    ///
    /// Returns `Some(frame)` when the byte completes a frame. A zero-length
    /// frame completes on its length byte.
    pub fn push_byte(&mut self, byte: u8) -> Option<Frame<'_>> {
        match self.state {
            DecoderState::Command => {
                self.command = byte;
                self.pos = 0;
                self.state = DecoderState::Length;
                None
            }
            DecoderState::Length => {
                let expected = byte as usize;
                if expected == 0 {
                    self.state = DecoderState::Command;
                    return Some(Frame {
                        command: self.command,
                        payload: &[],
                    });
                }
                self.state = DecoderState::Payload { expected };
                None
            }
            DecoderState::Payload { expected } => {
                self.buffer[self.pos] = byte;
                self.pos += 1;
                if self.pos < expected {
                    return None;
                }
                self.state = DecoderState::Command;
                Some(Frame {
                    command: self.command,
                    payload: &self.buffer[..expected],
                })
            }
        }
    }
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use std::vec::Vec;

    fn decode_all(bytes: &[u8]) -> Vec<(u8, Vec<u8>)> {
        let mut decoder = FrameDecoder::new();
        let mut frames = Vec::new();
        for &b in bytes {
            if let Some(frame) = decoder.push_byte(b) {
                frames.push((frame.raw_command(), frame.payload().to_vec()));
            }
        }
        frames
    }

    #[test]
    fn test_encode_layout() {
        let mut buf = [0u8; 8];
        let len = encode(Command::Baudrate, &[5], &mut buf).unwrap();
        assert_eq!(&buf[..len], &[0x77, 0x01, 0x05]);
    }

    #[test]
    fn test_encode_empty_payload() {
        let mut buf = [0u8; 2];
        let len = encode(Command::Type, &[], &mut buf).unwrap();
        assert_eq!(&buf[..len], &[0x11, 0x00]);
    }

    #[test]
    fn test_encode_rejects_long_payload() {
        let payload = [0u8; 256];
        let mut buf = [0u8; 300];
        assert_eq!(
            encode(Command::InReport, &payload, &mut buf),
            Err(CodecError::PayloadTooLong)
        );
    }

    #[test]
    fn test_encode_rejects_small_buffer() {
        let mut buf = [0u8; 3];
        assert_eq!(
            encode(Command::Version, &[8, 0], &mut buf),
            Err(CodecError::BufferTooSmall)
        );
    }

    #[test]
    fn test_round_trip_every_length() {
        let mut wire = [0u8; encoded_len(MAX_PAYLOAD_LEN)];
        for len in 0..=MAX_PAYLOAD_LEN {
            let payload: Vec<u8> = (0..len).map(|i| (i * 7 + len) as u8).collect();
            let n = encode(Command::InReport, &payload, &mut wire).unwrap();
            assert_eq!(n, len + 2);
            let frames = decode_all(&wire[..n]);
            assert_eq!(frames.len(), 1, "length {len}");
            assert_eq!(frames[0].0, 0xff);
            assert_eq!(frames[0].1, payload);
        }
    }

    #[test]
    fn test_back_to_back_frames() {
        let frames = decode_all(&[0x11, 0x00, 0xff, 0x02, 0xaa, 0xbb, 0x22, 0x00]);
        assert_eq!(
            frames,
            std::vec![
                (0x11, Vec::new()),
                (0xff, std::vec![0xaa, 0xbb]),
                (0x22, Vec::new()),
            ]
        );
    }

    #[test]
    fn test_unknown_command_is_still_framed() {
        let mut decoder = FrameDecoder::new();
        assert!(decoder.push_byte(0x42).is_none());
        assert!(decoder.push_byte(0x01).is_none());
        let frame = decoder.push_byte(0x07).unwrap();
        assert_eq!(frame.command(), None);
        assert_eq!(frame.raw_command(), 0x42);
        assert_eq!(frame.payload(), &[0x07]);
    }

    #[test]
    fn test_in_progress_and_reset() {
        let mut decoder = FrameDecoder::new();
        assert!(!decoder.in_progress());
        decoder.push_byte(0xff);
        assert!(decoder.in_progress());
        decoder.push_byte(0x04);
        decoder.push_byte(0x01);
        assert!(decoder.in_progress());

        decoder.reset();
        assert!(!decoder.in_progress());

        // Next byte is taken as a fresh command byte.
        decoder.push_byte(0x33);
        let frame = decoder.push_byte(0x00).unwrap();
        assert_eq!(frame.command(), Some(Command::Start));
    }

    #[test]
    fn test_frame_new_checks_length() {
        let long = [0u8; 256];
        assert_eq!(Frame::new(0x44, &long), Err(CodecError::PayloadTooLong));
        let frame = Frame::new(0x44, &long[..8]).unwrap();
        assert_eq!(frame.len(), 8);
        assert!(!frame.is_empty());
    }

    #[cfg(feature = "heapless")]
    #[test]
    fn test_encode_to_vec() {
        let vec: heapless::Vec<u8, 8> = encode_to_vec(Command::Status, &[1]).unwrap();
        assert_eq!(vec.as_slice(), &[0x22, 0x01, 0x01]);
        assert_eq!(
            encode_to_vec::<2>(Command::Status, &[1]),
            Err(CodecError::BufferTooSmall)
        );
    }
}
