//! Pairing record kept in the last sector of the on-board flash.

use adapter_core::{PairingData, PairingStore, StoreError};
use defmt::warn;
use embassy_rp::flash::{Blocking, Flash, ERASE_SIZE};
use embassy_rp::peripherals::FLASH;
use embassy_rp::Peri;

/// Flash size of the Raspberry Pi Pico.
pub const FLASH_SIZE: usize = 2 * 1024 * 1024;

const RECORD_OFFSET: u32 = (FLASH_SIZE - ERASE_SIZE) as u32;

pub struct FlashStore {
    flash: Flash<'static, FLASH, Blocking, FLASH_SIZE>,
}

impl FlashStore {
    pub fn new(flash: Peri<'static, FLASH>) -> Self {
        Self {
            flash: Flash::new_blocking(flash),
        }
    }
}

impl PairingStore for FlashStore {
    fn load(&mut self) -> Result<Option<PairingData>, StoreError> {
        let mut record = [0u8; PairingData::RECORD_LEN];
        self.flash
            .blocking_read(RECORD_OFFSET, &mut record)
            .map_err(|e| {
                warn!("flash read failed: {:?}", e);
                StoreError::Io
            })?;
        // Erased flash reads as all ones.
        if record.iter().all(|&b| b == 0xff) {
            return Ok(None);
        }
        PairingData::from_record(&record)
            .map(Some)
            .ok_or(StoreError::Corrupt)
    }

    fn save(&mut self, data: &PairingData) -> Result<(), StoreError> {
        let end = RECORD_OFFSET + ERASE_SIZE as u32;
        self.flash
            .blocking_erase(RECORD_OFFSET, end)
            .and_then(|()| self.flash.blocking_write(RECORD_OFFSET, &data.to_record()))
            .map_err(|e| {
                warn!("flash write failed: {:?}", e);
                StoreError::Io
            })
    }
}
