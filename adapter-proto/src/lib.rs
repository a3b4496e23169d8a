//! Serial protocol between a controller emulation adapter and its control authority.
//!
//! The adapter impersonates a game controller on USB. Input reports and the
//! answers to authentication requests come from an external authority over a
//! UART link using the frames defined here.
//!
//! - [`command`]: command bytes, adapter types and status values
//! - [`codec`]: frame encoding and the incremental [`FrameDecoder`]
//! - [`request`]: the USB [`ControlRequest`] header relayed in `CONTROL_DATA` frames
//!
//! # Frame Format
//!
//! ```text
//! [command:1][length:1][payload:length]
//! ```
//!
//! # Example
//!
//! ```
//! use adapter_proto::{encode, Command, FrameDecoder};
//!
//! let mut wire = [0u8; 8];
//! let len = encode(Command::InReport, &[0x01, 0x80, 0x80], &mut wire).unwrap();
//!
//! let mut decoder = FrameDecoder::new();
//! let mut payload = None;
//! for &byte in &wire[..len] {
//!     if let Some(frame) = decoder.push_byte(byte) {
//!         assert_eq!(frame.command(), Some(Command::InReport));
//!         payload = Some(frame.len());
//!     }
//! }
//! assert_eq!(payload, Some(3));
//! ```
//!
//! # Features
//!
//! - **`std`**: Enable standard library support (for host testing)
//! - **`defmt`**: Enable defmt formatting (for embedded logging)
//! - **`heapless`**: Enable [`encode_to_vec`](codec::encode_to_vec)

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "std")]
extern crate std;

pub mod codec;
pub mod command;
pub mod request;

pub use codec::{encode, encode_raw, encoded_len, CodecError, Frame, FrameDecoder};
pub use command::{
    AdapterType, Command, SpoofStatus, FIRMWARE_VERSION, HEADER_LEN, MAX_CONTROL_TRANSFER,
    MAX_PAYLOAD_LEN,
};
pub use request::{ControlRequest, Direction};

#[cfg(feature = "heapless")]
pub use codec::encode_to_vec;
