//! AUX bus device and command identifiers.
//!
//! Both are open newtypes: command codes are only meaningful per device
//! (0x01 is a position read on a motor controller but a latitude read on
//! the GPS), and unknown devices must still round-trip through the codec.

use core::fmt;

/// Address of a device on the AUX bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DeviceId(pub u8);

impl DeviceId {
    /// Broadcast.
    pub const ANY: Self = Self(0x00);
    /// Main board.
    pub const MAIN_BOARD: Self = Self(0x01);
    /// Hand controller.
    pub const HAND_CONTROLLER: Self = Self(0x04);
    /// Hand controller plus.
    pub const HAND_CONTROLLER_PLUS: Self = Self(0x0D);
    /// Azimuth motor controller.
    pub const AZM: Self = Self(0x10);
    /// Altitude motor controller.
    pub const ALT: Self = Self(0x11);
    /// Focuser.
    pub const FOCUSER: Self = Self(0x12);
    /// Host application (this crate).
    pub const APP: Self = Self(0x20);
    /// GPS module.
    pub const GPS: Self = Self(0xB0);
    /// WiFi bridge.
    pub const WIFI: Self = Self(0xB5);
    /// Battery.
    pub const BATTERY: Self = Self(0xB6);
    /// Charger.
    pub const CHARGER: Self = Self(0xB7);
    /// Lighting.
    pub const LIGHT: Self = Self(0xBF);

    /// Short name for logs.
    pub fn name(self) -> &'static str {
        match self {
            Self::ANY => "ANY",
            Self::MAIN_BOARD => "MB",
            Self::HAND_CONTROLLER => "HC",
            Self::HAND_CONTROLLER_PLUS => "HC+",
            Self::AZM => "AZM",
            Self::ALT => "ALT",
            Self::FOCUSER => "FOCUS",
            Self::APP => "APP",
            Self::GPS => "GPS",
            Self::WIFI => "WIFI",
            Self::BATTERY => "BAT",
            Self::CHARGER => "CHG",
            Self::LIGHT => "LIGHT",
            _ => "?",
        }
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(0x{:02X})", self.name(), self.0)
    }
}

/// Command byte of an AUX frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CommandCode(pub u8);

#[allow(missing_docs)]
impl CommandCode {
    // Motor controller
    pub const MC_GET_POSITION: Self = Self(0x01);
    pub const MC_GOTO_FAST: Self = Self(0x02);
    pub const MC_SET_POSITION: Self = Self(0x04);
    pub const MC_GET_MODEL: Self = Self(0x05);
    pub const MC_SET_POS_GUIDERATE: Self = Self(0x06);
    pub const MC_SET_NEG_GUIDERATE: Self = Self(0x07);
    pub const MC_LEVEL_START: Self = Self(0x0B);
    pub const MC_LEVEL_DONE: Self = Self(0x12);
    pub const MC_SLEW_DONE: Self = Self(0x13);
    pub const MC_GOTO_SLOW: Self = Self(0x17);
    pub const MC_SEEK_DONE: Self = Self(0x18);
    pub const MC_SEEK_INDEX: Self = Self(0x19);
    pub const MC_MOVE_POS: Self = Self(0x24);
    pub const MC_MOVE_NEG: Self = Self(0x25);
    pub const MC_AUX_GUIDE: Self = Self(0x26);
    pub const MC_AUX_GUIDE_ACTIVE: Self = Self(0x27);
    pub const MC_ENABLE_CORDWRAP: Self = Self(0x38);
    pub const MC_DISABLE_CORDWRAP: Self = Self(0x39);
    pub const MC_SET_CORDWRAP_POS: Self = Self(0x3A);
    pub const MC_POLL_CORDWRAP: Self = Self(0x3B);
    pub const MC_GET_CORDWRAP_POS: Self = Self(0x3C);
    pub const MC_SET_AUTOGUIDE_RATE: Self = Self(0x46);
    pub const MC_GET_AUTOGUIDE_RATE: Self = Self(0x47);

    // Any device
    pub const GET_VER: Self = Self(0xFE);

    // GPS
    pub const GPS_GET_LAT: Self = Self(0x01);
    pub const GPS_GET_LONG: Self = Self(0x02);
    pub const GPS_GET_TIME: Self = Self(0x33);
    pub const GPS_TIME_VALID: Self = Self(0x36);
    pub const GPS_LINKED: Self = Self(0x37);
    pub const GPS_GET_DATE: Self = Self(0x3B);

    /// `MC_SLEW_DONE` reply byte meaning the axis has stopped.
    pub const SLEW_DONE_REPLY: u8 = 0xFF;
}

impl fmt::Display for CommandCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:02X}", self.0)
    }
}
