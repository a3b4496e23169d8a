//! USB control request header as relayed to the authority.

/// `bmRequestType` bits.
pub mod request_type {
    pub const DIR_IN: u8 = 0x80;
    pub const DIR_OUT: u8 = 0x00;

    pub const TYPE_MASK: u8 = 0x60;
    pub const TYPE_STANDARD: u8 = 0x00;
    pub const TYPE_CLASS: u8 = 0x20;
    pub const TYPE_VENDOR: u8 = 0x40;

    pub const RECIPIENT_MASK: u8 = 0x1f;
    pub const REC_DEVICE: u8 = 0x00;
    pub const REC_INTERFACE: u8 = 0x01;
    pub const REC_ENDPOINT: u8 = 0x02;
    pub const REC_OTHER: u8 = 0x03;
}

/// `bRequest` values used by the adapters.
pub mod request {
    pub const GET_REPORT: u8 = 0x01;
    pub const SET_REPORT: u8 = 0x09;
    pub const SET_IDLE: u8 = 0x0a;
}

/// HID report types carried in the high byte of `wValue`.
pub mod report_type {
    pub const INPUT: u8 = 0x01;
    pub const OUTPUT: u8 = 0x02;
    pub const FEATURE: u8 = 0x03;
}

/// Size of a serialized control request header.
pub const HEADER_SIZE: usize = 8;

/// Direction of the data stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    HostToDevice,
    DeviceToHost,
}

/// A USB SETUP packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ControlRequest {
    pub request_type: u8,
    pub request: u8,
    pub value: u16,
    pub index: u16,
    pub length: u16,
}

impl ControlRequest {
    #[must_use]
    pub const fn new(request_type: u8, request: u8, value: u16, index: u16, length: u16) -> Self {
        Self {
            request_type,
            request,
            value,
            index,
            length,
        }
    }

    /// Parse the 8-byte little-endian SETUP layout.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; HEADER_SIZE]) -> Self {
        Self {
            request_type: bytes[0],
            request: bytes[1],
            value: u16::from_le_bytes([bytes[2], bytes[3]]),
            index: u16::from_le_bytes([bytes[4], bytes[5]]),
            length: u16::from_le_bytes([bytes[6], bytes[7]]),
        }
    }

    /// Serialize to the 8-byte little-endian SETUP layout.
    #[must_use]
    pub const fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let value = self.value.to_le_bytes();
        let index = self.index.to_le_bytes();
        let length = self.length.to_le_bytes();
        [
            self.request_type,
            self.request,
            value[0],
            value[1],
            index[0],
            index[1],
            length[0],
            length[1],
        ]
    }

    #[inline]
    #[must_use]
    pub const fn direction(&self) -> Direction {
        if self.request_type & request_type::DIR_IN != 0 {
            Direction::DeviceToHost
        } else {
            Direction::HostToDevice
        }
    }

    #[inline]
    #[must_use]
    pub const fn is_device_to_host(&self) -> bool {
        matches!(self.direction(), Direction::DeviceToHost)
    }

    /// HID report type (high byte of `wValue`).
    #[inline]
    #[must_use]
    pub const fn report_type(&self) -> u8 {
        (self.value >> 8) as u8
    }

    /// HID report id (low byte of `wValue`).
    #[inline]
    #[must_use]
    pub const fn report_id(&self) -> u8 {
        self.value as u8
    }

    /// Length byte of a CONTROL_DATA frame relaying this request.
    ///
    /// Device-to-host requests carry only the header; host-to-device requests
    /// also carry the data stage, whose length is truncated to its low byte.
    #[must_use]
    pub const fn relay_frame_len(&self) -> u8 {
        if self.is_device_to_host() {
            HEADER_SIZE as u8
        } else {
            (HEADER_SIZE as u8).wrapping_add(self.length as u8)
        }
    }
}
