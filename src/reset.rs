//! Hardware reset through the RP2040 watchdog.

use core::cell::RefCell;

use adapter_core::{FatalReset, ResetReason};
use defmt::error;
use embassy_rp::watchdog::Watchdog;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;

static WATCHDOG: Mutex<CriticalSectionRawMutex, RefCell<Option<Watchdog>>> =
    Mutex::new(RefCell::new(None));

/// Hand the watchdog to [`WatchdogReset`]. Call once at boot.
pub fn install(watchdog: Watchdog) {
    WATCHDOG.lock(|cell| cell.replace(Some(watchdog)));
}

/// [`FatalReset`] that reboots the chip.
///
/// Falls back to a core reset if [`install`] was never called.
#[derive(Debug, Clone, Copy, Default)]
pub struct WatchdogReset;

impl FatalReset for WatchdogReset {
    fn trigger_fatal_reset(&mut self, reason: ResetReason) -> ! {
        error!("fatal reset: {:?}", reason);
        cortex_m::interrupt::disable();
        WATCHDOG.lock(|cell| {
            if let Some(watchdog) = cell.borrow_mut().as_mut() {
                watchdog.trigger_reset();
            }
        });
        cortex_m::peripheral::SCB::sys_reset()
    }
}
