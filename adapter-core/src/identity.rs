//! How each adapter type presents itself during enumeration.

use adapter_proto::AdapterType;

/// Class, subclass and protocol triple.
pub type ClassCode = (u8, u8, u8);

/// HID, defined at the interface.
pub const HID_INTERFACE: ClassCode = (0x03, 0x00, 0x00);

/// Device descriptor identity plus the class of the single interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UsbIdentity {
    pub vid: u16,
    pub pid: u16,
    pub device_class: ClassCode,
    pub interface_class: ClassCode,
}

impl UsbIdentity {
    /// Built-in identity of `adapter_type`.
    #[must_use]
    pub const fn for_type(adapter_type: AdapterType) -> Self {
        let (vid, pid) = match adapter_type {
            AdapterType::Joystick => (0x03eb, 0x2043),
            AdapterType::X360 => (0x045e, 0x028e),
            AdapterType::Xbox => (0x045e, 0x0289),
            AdapterType::XboxOne => (0x045e, 0x02d1),
            AdapterType::Sixaxis => (0x054c, 0x0268),
            AdapterType::Ds4 => (0x054c, 0x05c4),
            AdapterType::T300rsPs4 => (0x044f, 0xb66d),
            AdapterType::G27Ps3 => (0x046d, 0xc29b),
            AdapterType::G29Ps4 => (0x046d, 0xc24f),
            AdapterType::Ps2 | AdapterType::DfPs2 => (0x046d, 0xc294),
            AdapterType::DfpPs2 => (0x046d, 0xc298),
            AdapterType::GtfPs2 => (0x046d, 0xc293),
            AdapterType::G920XboxOne => (0x046d, 0xc262),
            AdapterType::Switch => (0x057e, 0x2009),
        };
        let (device_class, interface_class) = match adapter_type {
            AdapterType::X360 => ((0xff, 0xff, 0xff), (0xff, 0x5d, 0x01)),
            AdapterType::XboxOne | AdapterType::G920XboxOne => {
                ((0xff, 0x47, 0xd0), (0xff, 0x47, 0xd0))
            }
            AdapterType::Xbox => ((0x00, 0x00, 0x00), (0x58, 0x42, 0x00)),
            _ => ((0x00, 0x00, 0x00), HID_INTERFACE),
        };
        Self {
            vid,
            pid,
            device_class,
            interface_class,
        }
    }

    /// Replace vid/pid with the ones set by IDS, if any.
    #[must_use]
    pub const fn with_ids(mut self, ids: Option<(u16, u16)>) -> Self {
        if let Some((vid, pid)) = ids {
            self.vid = vid;
            self.pid = pid;
        }
        self
    }
}
