//! RP2040 firmware for the UART-driven USB controller emulation adapter.
//!
//! The adapter enumerates as one controller model, chosen at build time with
//! an `adapter-*` feature, and lets an authority on the UART answer for it.
//! Everything protocol-level lives in `adapter-core`; this crate wires it to
//! the RP2040 peripherals.
//!
//! # Hardware
//!
//! | Signal | Pin |
//! |--------|-----|
//! | UART1 TX | GPIO 8 |
//! | UART1 RX | GPIO 9 |
//! | USB | on-chip full-speed device |
//! | Console strap (`adapter-ps4-and-ps3` only) | GPIO 7, high selects PS3 |
//!
//! # Modules
//!
//! - [`serial`]: frame receive loop and the queued transmit path
//! - [`usb`]: control request handler and interrupt endpoint wrappers
//! - [`reset`]: watchdog-backed fatal reset
//! - [`flash_store`]: pairing record in the last flash sector

#![no_std]

pub mod flash_store;
pub mod reset;
pub mod serial;
pub mod usb;

pub use adapter_core::{AdapterProfile, AdapterState};

#[cfg(feature = "adapter-joystick")]
pub use adapter_core::profiles::JOYSTICK as PROFILE;
#[cfg(feature = "adapter-x360")]
pub use adapter_core::profiles::X360 as PROFILE;
#[cfg(feature = "adapter-sixaxis")]
pub use adapter_core::profiles::SIXAXIS as PROFILE;
#[cfg(feature = "adapter-xbox")]
pub use adapter_core::profiles::XBOX as PROFILE;
#[cfg(feature = "adapter-ds4")]
pub use adapter_core::profiles::DS4 as PROFILE;
#[cfg(feature = "adapter-ds4-pairing")]
pub use adapter_core::profiles::DS4_PAIRING as PROFILE;
#[cfg(feature = "adapter-xbox-one")]
pub use adapter_core::profiles::XBOX_ONE as PROFILE;
#[cfg(feature = "adapter-t300rs-ps4")]
pub use adapter_core::profiles::T300RS_PS4 as PROFILE;
#[cfg(feature = "adapter-g27-ps3")]
pub use adapter_core::profiles::G27_PS3 as PROFILE;
#[cfg(feature = "adapter-g29-ps4")]
pub use adapter_core::profiles::G29_PS4 as PROFILE;
#[cfg(feature = "adapter-df-ps2")]
pub use adapter_core::profiles::DF_PS2 as PROFILE;
#[cfg(feature = "adapter-dfp-ps2")]
pub use adapter_core::profiles::DFP_PS2 as PROFILE;
#[cfg(feature = "adapter-gtf-ps2")]
pub use adapter_core::profiles::GTF_PS2 as PROFILE;
#[cfg(feature = "adapter-g920-xbox-one")]
pub use adapter_core::profiles::G920_XBOX_ONE as PROFILE;
#[cfg(feature = "adapter-switch")]
pub use adapter_core::profiles::SWITCH as PROFILE;
#[cfg(feature = "adapter-ps4-and-ps3")]
pub use adapter_core::profiles::ps4_and_ps3 as select_profile;

const SELECTED_ADAPTERS: usize = cfg!(feature = "adapter-joystick") as usize
    + cfg!(feature = "adapter-x360") as usize
    + cfg!(feature = "adapter-sixaxis") as usize
    + cfg!(feature = "adapter-xbox") as usize
    + cfg!(feature = "adapter-ds4") as usize
    + cfg!(feature = "adapter-ds4-pairing") as usize
    + cfg!(feature = "adapter-xbox-one") as usize
    + cfg!(feature = "adapter-t300rs-ps4") as usize
    + cfg!(feature = "adapter-g27-ps3") as usize
    + cfg!(feature = "adapter-g29-ps4") as usize
    + cfg!(feature = "adapter-df-ps2") as usize
    + cfg!(feature = "adapter-dfp-ps2") as usize
    + cfg!(feature = "adapter-gtf-ps2") as usize
    + cfg!(feature = "adapter-g920-xbox-one") as usize
    + cfg!(feature = "adapter-switch") as usize
    + cfg!(feature = "adapter-ps4-and-ps3") as usize;

const _: () = assert!(
    SELECTED_ADAPTERS == 1,
    "enable exactly one adapter-* feature (use --no-default-features to replace adapter-x360)"
);

/// Pairing storage for the selected adapter.
#[cfg(feature = "adapter-ds4-pairing")]
pub type Store = flash_store::FlashStore;
#[cfg(not(feature = "adapter-ds4-pairing"))]
pub type Store = adapter_core::NoStore;
