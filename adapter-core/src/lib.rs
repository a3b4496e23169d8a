//! Platform-agnostic core of the controller emulation adapter.
//!
//! Nothing here touches hardware: the firmware plugs its UART, USB endpoints,
//! watchdog and flash in through the traits in [`transport`], [`pump`] and
//! [`pairing`], which keeps the whole adapter testable on the host.
//!
//! - [`profile`] / [`profiles`]: per-controller descriptor of how control
//!   requests are answered, and the built-in profiles
//! - [`state`]: flags and latest-value slots shared by the serial and USB contexts
//! - [`dispatcher`]: acts on frames from the authority
//! - [`relay`]: answers USB control requests, relaying some to the authority
//! - [`pump`]: moves interrupt IN/OUT reports
//! - [`pairing`]: Bluetooth pairing data and its storage
//! - [`identity`]: vid/pid and class codes presented to the host
//!
//! # Example
//!
//! ```
//! use adapter_core::profiles::DS4;
//! use adapter_core::AdapterState;
//!
//! let state = AdapterState::new(&DS4);
//! state.post_report(&[0x01, 0x80, 0x80, 0x80, 0x80]).unwrap();
//! state.with_last_report(|report| assert_eq!(report.len(), 5));
//! ```
//!
//! # Features
//!
//! - **`std`**: Enable standard library support (for host testing)
//! - **`defmt`**: Log through defmt (for embedded logging)

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "std")]
extern crate std;

#[macro_use]
mod fmt;

pub mod dispatcher;
pub mod identity;
pub mod pairing;
pub mod profile;
pub mod profiles;
pub mod pump;
pub mod relay;
pub mod state;
pub mod transport;

pub use dispatcher::Dispatcher;
pub use identity::UsbIdentity;
pub use pairing::{MemoryStore, NoStore, PairingData, PairingStore, StoreError};
pub use profile::{AdapterProfile, Generation};
pub use pump::{InEndpoint, InReportPump, OutEndpoint, OutReportPump, PumpError};
pub use relay::{Cancel, ControlRelay, InReply, Never, OutReply, SpinLimit};
pub use state::{AdapterState, ReportBuf, MAX_REPORT_LEN};
pub use transport::{
    BaudControl, EndpointError, FatalReset, FrameSink, RelayError, ResetReason, SerialError,
};
