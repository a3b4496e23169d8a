//! Command bytes, adapter type codes and status values.

/// Largest payload a single frame can carry (the length field is one byte).
pub const MAX_PAYLOAD_LEN: usize = 255;

/// Size of the command + length header in front of every payload.
pub const HEADER_LEN: usize = 2;

/// Largest control transfer data stage the adapter buffers.
pub const MAX_CONTROL_TRANSFER: usize = 64;

/// Firmware version reported by the VERSION command (major, minor).
pub const FIRMWARE_VERSION: (u8, u8) = (8, 0);

/// Command byte at the start of every frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Command {
    /// Placeholder, never sent.
    NoPacket = 0x00,
    /// Query the adapter type.
    Type = 0x11,
    /// Query the spoof/started status.
    Status = 0x22,
    /// Start the adapter; replies with the previous status.
    Start = 0x33,
    /// Control request header (adapter to authority) or reply data (authority to adapter).
    ControlData = 0x44,
    /// Hard reset the adapter.
    Reset = 0x55,
    /// Vendor and product id to enumerate with.
    Ids = 0x66,
    /// Query or set the UART baud rate code.
    Baudrate = 0x77,
    /// Query the firmware version.
    Version = 0x88,
    /// Diagnostic data from the adapter.
    Debug = 0x99,
    /// Report received from the host on the OUT endpoint.
    OutReport = 0xee,
    /// Report to send to the host on the IN endpoint.
    InReport = 0xff,
}

impl Command {
    /// Older firmware called the control data command "spoof data".
    pub const SPOOF_DATA: Command = Command::ControlData;

    /// Decode a command byte. Returns `None` for bytes outside the protocol.
    #[must_use]
    pub const fn from_byte(byte: u8) -> Option<Self> {
        Some(match byte {
            0x00 => Self::NoPacket,
            0x11 => Self::Type,
            0x22 => Self::Status,
            0x33 => Self::Start,
            0x44 => Self::ControlData,
            0x55 => Self::Reset,
            0x66 => Self::Ids,
            0x77 => Self::Baudrate,
            0x88 => Self::Version,
            0x99 => Self::Debug,
            0xee => Self::OutReport,
            0xff => Self::InReport,
            _ => return None,
        })
    }

    /// The wire value of this command.
    #[inline]
    #[must_use]
    pub const fn as_byte(self) -> u8 {
        self as u8
    }
}

impl From<Command> for u8 {
    fn from(command: Command) -> Self {
        command.as_byte()
    }
}

/// Controller family the adapter emulates, as reported by the TYPE command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum AdapterType {
    Joystick = 0x00,
    X360 = 0x01,
    Sixaxis = 0x02,
    Ps2 = 0x03,
    Xbox = 0x04,
    Ds4 = 0x05,
    XboxOne = 0x06,
    T300rsPs4 = 0x07,
    G27Ps3 = 0x08,
    G29Ps4 = 0x09,
    DfPs2 = 0x0a,
    DfpPs2 = 0x0b,
    GtfPs2 = 0x0c,
    G920XboxOne = 0x0d,
    Switch = 0x0e,
}

impl AdapterType {
    /// Decode an adapter type byte.
    #[cfg(test)]
    pub(crate) const fn from_byte(byte: u8) -> Option<Self> {
        Some(match byte {
            0x00 => Self::Joystick,
            0x01 => Self::X360,
            0x02 => Self::Sixaxis,
            0x03 => Self::Ps2,
            0x04 => Self::Xbox,
            0x05 => Self::Ds4,
            0x06 => Self::XboxOne,
            0x07 => Self::T300rsPs4,
            0x08 => Self::G27Ps3,
            0x09 => Self::G29Ps4,
            0x0a => Self::DfPs2,
            0x0b => Self::DfpPs2,
            0x0c => Self::GtfPs2,
            0x0d => Self::G920XboxOne,
            0x0e => Self::Switch,
            _ => return None,
        })
    }

    #[inline]
    #[must_use]
    pub const fn as_byte(self) -> u8 {
        self as u8
    }
}

/// Authentication state reported by STATUS and START.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum SpoofStatus {
    #[default]
    NotSpoofed = 0x00,
    Spoofed = 0x01,
}

impl SpoofStatus {
    #[cfg(test)]
    pub(crate) const fn from_byte(byte: u8) -> Self {
        if byte == Self::Spoofed as u8 {
            Self::Spoofed
        } else {
            Self::NotSpoofed
        }
    }

    #[inline]
    #[must_use]
    pub const fn as_byte(self) -> u8 {
        self as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_bytes_are_stable() {
        assert_eq!(Command::Type.as_byte(), 0x11);
        assert_eq!(Command::Status.as_byte(), 0x22);
        assert_eq!(Command::Start.as_byte(), 0x33);
        assert_eq!(Command::ControlData.as_byte(), 0x44);
        assert_eq!(Command::Reset.as_byte(), 0x55);
        assert_eq!(Command::Debug.as_byte(), 0x99);
        assert_eq!(Command::OutReport.as_byte(), 0xee);
        assert_eq!(Command::InReport.as_byte(), 0xff);
        assert_eq!(Command::SPOOF_DATA, Command::ControlData);
    }

    #[test]
    fn test_command_from_byte() {
        for byte in 0..=u8::MAX {
            if let Some(command) = Command::from_byte(byte) {
                assert_eq!(command.as_byte(), byte);
            }
        }
        assert_eq!(Command::from_byte(0x12), None);
        assert_eq!(Command::from_byte(0xfe), None);
    }

    #[test]
    fn test_adapter_type_from_byte() {
        assert_eq!(AdapterType::from_byte(0x06), Some(AdapterType::XboxOne));
        assert_eq!(AdapterType::from_byte(0x0c), Some(AdapterType::GtfPs2));
        assert_eq!(AdapterType::from_byte(0x40), None);
    }

    #[test]
    fn test_spoof_status_from_byte() {
        assert_eq!(SpoofStatus::from_byte(0x01), SpoofStatus::Spoofed);
        assert_eq!(SpoofStatus::from_byte(0x00), SpoofStatus::NotSpoofed);
        assert_eq!(SpoofStatus::from_byte(0x7f), SpoofStatus::NotSpoofed);
    }
}
