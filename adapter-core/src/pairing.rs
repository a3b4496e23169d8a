//! Bluetooth pairing data remembered by the pairing variants.

/// Addresses and link key exchanged while a console pairs with a controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PairingData {
    /// Controller address reported to the console.
    pub slave: [u8; 6],
    /// Console address.
    pub master: [u8; 6],
    pub link_key: [u8; 16],
}

impl Default for PairingData {
    fn default() -> Self {
        Self {
            slave: [0x01, 0x02, 0x03, 0x04, 0x05, 0x06],
            master: [0; 6],
            link_key: [0; 16],
        }
    }
}

/// Marker at the start of a persisted record.
const RECORD_MAGIC: [u8; 4] = *b"PAIR";

impl PairingData {
    /// Size of a persisted record.
    pub const RECORD_LEN: usize = RECORD_MAGIC.len() + 6 + 6 + 16;

    /// `12 | slave | 08 25 | master | 00`: answer to DS4 feature report 0x12.
    #[must_use]
    pub fn ds4_addresses(&self) -> [u8; 16] {
        let mut out = [0u8; 16];
        out[0] = 0x12;
        out[1..7].copy_from_slice(&self.slave);
        out[7] = 0x08;
        out[8] = 0x25;
        out[9..15].copy_from_slice(&self.master);
        out
    }

    #[must_use]
    pub fn to_record(&self) -> [u8; Self::RECORD_LEN] {
        let mut out = [0u8; Self::RECORD_LEN];
        out[..4].copy_from_slice(&RECORD_MAGIC);
        out[4..10].copy_from_slice(&self.slave);
        out[10..16].copy_from_slice(&self.master);
        out[16..].copy_from_slice(&self.link_key);
        out
    }

    /// Parse a persisted record. `None` for erased or foreign contents.
    #[must_use]
    pub fn from_record(record: &[u8]) -> Option<Self> {
        if record.len() < Self::RECORD_LEN || record[..4] != RECORD_MAGIC {
            return None;
        }
        let mut data = Self::default();
        data.slave.copy_from_slice(&record[4..10]);
        data.master.copy_from_slice(&record[10..16]);
        data.link_key.copy_from_slice(&record[16..Self::RECORD_LEN]);
        Some(data)
    }
}

/// Error type for pairing storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StoreError {
    /// Underlying storage failed to read, erase or write.
    Io,
    /// Stored bytes could not be parsed.
    Corrupt,
}

impl core::fmt::Display for StoreError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Io => write!(f, "storage I/O error"),
            Self::Corrupt => write!(f, "corrupt pairing record"),
        }
    }
}

/// Non-volatile storage for [`PairingData`].
pub trait PairingStore {
    /// `Ok(None)` when nothing has been saved yet.
    fn load(&mut self) -> Result<Option<PairingData>, StoreError>;
    fn save(&mut self, data: &PairingData) -> Result<(), StoreError>;
}

impl<T: PairingStore + ?Sized> PairingStore for &mut T {
    fn load(&mut self) -> Result<Option<PairingData>, StoreError> {
        (**self).load()
    }

    fn save(&mut self, data: &PairingData) -> Result<(), StoreError> {
        (**self).save(data)
    }
}

/// Store for variants that persist nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoStore;

impl PairingStore for NoStore {
    fn load(&mut self) -> Result<Option<PairingData>, StoreError> {
        Ok(None)
    }

    fn save(&mut self, _data: &PairingData) -> Result<(), StoreError> {
        Ok(())
    }
}

/// RAM-backed store holding one record.
#[derive(Debug, Default)]
pub struct MemoryStore {
    record: Option<[u8; PairingData::RECORD_LEN]>,
    saves: usize,
}

impl MemoryStore {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            record: None,
            saves: 0,
        }
    }

    #[must_use]
    pub fn with_data(data: &PairingData) -> Self {
        Self {
            record: Some(data.to_record()),
            saves: 0,
        }
    }

    /// Number of successful saves.
    #[must_use]
    pub fn saves(&self) -> usize {
        self.saves
    }
}

impl PairingStore for MemoryStore {
    fn load(&mut self) -> Result<Option<PairingData>, StoreError> {
        match &self.record {
            None => Ok(None),
            Some(record) => PairingData::from_record(record)
                .map(Some)
                .ok_or(StoreError::Corrupt),
        }
    }

    fn save(&mut self, data: &PairingData) -> Result<(), StoreError> {
        self.record = Some(data.to_record());
        self.saves += 1;
        Ok(())
    }
}

/// DS3 pairing state. Kept in RAM only.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BdaddrExchange {
    pub master: [u8; 6],
    pub ef_byte: u8,
    /// Set once the console has read feature report f5.
    pub master_requested: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let data = PairingData::default();
        assert_eq!(data.slave, [1, 2, 3, 4, 5, 6]);
        assert_eq!(data.master, [0; 6]);
        assert_eq!(data.link_key, [0; 16]);
    }

    #[test]
    fn test_ds4_addresses_layout() {
        let data = PairingData {
            slave: [0x11, 0x12, 0x13, 0x14, 0x15, 0x16],
            master: [0xa1, 0xa2, 0xa3, 0xa4, 0xa5, 0xa6],
            link_key: [0; 16],
        };
        assert_eq!(
            data.ds4_addresses(),
            [
                0x12, 0x11, 0x12, 0x13, 0x14, 0x15, 0x16, 0x08, 0x25, 0xa1, 0xa2, 0xa3, 0xa4,
                0xa5, 0xa6, 0x00
            ]
        );
    }

    #[test]
    fn test_record_rejects_erased_flash() {
        assert_eq!(
            PairingData::from_record(&[0xff; PairingData::RECORD_LEN]),
            None
        );
        assert_eq!(PairingData::from_record(&[0x50, 0x41]), None);
    }

    #[test]
    fn test_memory_store() {
        let mut store = MemoryStore::new();
        assert_eq!(store.load(), Ok(None));

        let mut data = PairingData::default();
        data.link_key = [0x5a; 16];
        store.save(&data).unwrap();
        assert_eq!(store.saves(), 1);
        assert_eq!(store.load(), Ok(Some(data)));
    }
}
