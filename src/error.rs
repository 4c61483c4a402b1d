//! Error types for aux-mount.
//!
//! Provides unified error handling across configuration, AUX framing,
//! transport round trips and motion sequencing. The alignment model and the
//! coordinate transforms never fail; degenerate geometry falls back to safe
//! defaults instead.

use core::fmt;

use crate::motion::Axis;

/// Result type alias using the library's Error type.
pub type Result<T> = core::result::Result<T, Error>;

/// Unified error type for all aux-mount operations.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Configuration parsing or validation error
    Config(ConfigError),
    /// AUX frame encoding/decoding error
    Protocol(ProtocolError),
    /// Transport round-trip error
    Transport(TransportError),
    /// GoTo, slew or tracking error
    Motion(MotionError),
}

/// Configuration-related errors.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Failed to parse TOML configuration
    ParseError(heapless::String<128>),
    /// Site latitude outside [-90, 90]
    InvalidLatitude(f64),
    /// Site longitude outside [-180, 360]
    InvalidLongitude(f64),
    /// Altitude limits out of range or inverted
    InvalidAltitudeLimits {
        /// Lower altitude limit in degrees
        min: f64,
        /// Upper altitude limit in degrees
        max: f64,
    },
    /// Azimuth limits outside [0, 360]
    InvalidAzimuthLimits {
        /// Lower azimuth limit in degrees
        min: f64,
        /// Upper azimuth limit in degrees
        max: f64,
    },
    /// Local bias percentage above 100
    InvalidLocalBias(u8),
    /// Alignment sector size outside (0, 90]
    InvalidSectorSize(f64),
    /// Sector capacity of zero
    InvalidSectorCapacity(u8),
    /// Approach offset not below one revolution
    InvalidApproachOffset(u32),
    /// Backlash not below one revolution
    InvalidBacklash(u32),
    /// A timing value that must be positive is zero or negative
    InvalidTiming(&'static str),
    /// File I/O error (std only)
    #[cfg(feature = "std")]
    IoError(heapless::String<128>),
}

/// AUX framing errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// First byte is not the AUX start byte
    InvalidStartByte(u8),
    /// Buffer too short to hold a frame
    FrameTooShort(usize),
    /// Declared length does not match the bytes available
    LengthMismatch {
        /// Length byte value
        declared: usize,
        /// Bytes actually available after the length byte
        actual: usize,
    },
    /// Payload does not fit in a frame
    PayloadTooLong(usize),
    /// Frame checksum does not match its contents
    ChecksumMismatch {
        /// Checksum computed from the frame body
        expected: u8,
        /// Checksum byte received
        actual: u8,
    },
    /// Response payload has the wrong size for the command
    UnexpectedPayload {
        /// Number of bytes required
        expected: usize,
        /// Number of bytes received
        actual: usize,
    },
}

/// Transport errors.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportError {
    /// No matching response before the deadline
    Timeout,
    /// Peer closed the connection
    Closed,
    /// Underlying I/O failure
    Io(heapless::String<128>),
}

/// Motion sequencing errors.
#[derive(Debug, Clone, PartialEq)]
pub enum MotionError {
    /// Target outside the configured slew limits
    LimitViolation {
        /// Target azimuth in degrees
        azm_deg: f64,
        /// Target altitude in degrees, normalized to [-180, 180]
        alt_deg: f64,
    },
    /// Operation interrupted by an abort
    Aborted,
    /// Axis did not report slew completion within the poll budget
    SlewTimeout(Axis),
    /// Manual slew rate outside 0..=9
    InvalidSlewRate(u8),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Config(e) => write!(f, "Configuration error: {}", e),
            Error::Protocol(e) => write!(f, "Protocol error: {}", e),
            Error::Transport(e) => write!(f, "Transport error: {}", e),
            Error::Motion(e) => write!(f, "Motion error: {}", e),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            ConfigError::InvalidLatitude(v) => {
                write!(f, "Invalid latitude: {}. Must be within [-90, 90]", v)
            }
            ConfigError::InvalidLongitude(v) => {
                write!(f, "Invalid longitude: {}. Must be within [-180, 360]", v)
            }
            ConfigError::InvalidAltitudeLimits { min, max } => write!(
                f,
                "Invalid altitude limits: [{}, {}]. Need -90 <= min <= max <= 90",
                min, max
            ),
            ConfigError::InvalidAzimuthLimits { min, max } => write!(
                f,
                "Invalid azimuth limits: [{}, {}]. Both must be within [0, 360]",
                min, max
            ),
            ConfigError::InvalidLocalBias(v) => {
                write!(f, "Invalid local bias: {}%. Must be 0-100", v)
            }
            ConfigError::InvalidSectorSize(v) => {
                write!(f, "Invalid sector size: {}. Must be within (0, 90]", v)
            }
            ConfigError::InvalidSectorCapacity(v) => {
                write!(f, "Invalid points per sector: {}. Must be > 0", v)
            }
            ConfigError::InvalidApproachOffset(v) => {
                write!(f, "Invalid approach offset: {} steps. Must be < 2^24", v)
            }
            ConfigError::InvalidBacklash(v) => {
                write!(f, "Invalid backlash: {} steps. Must be < 2^24", v)
            }
            ConfigError::InvalidTiming(name) => write!(f, "Invalid {}: must be > 0", name),
            #[cfg(feature = "std")]
            ConfigError::IoError(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtocolError::InvalidStartByte(b) => {
                write!(f, "Invalid start byte 0x{:02X}, expected 0x3B", b)
            }
            ProtocolError::FrameTooShort(n) => write!(f, "Frame too short: {} bytes", n),
            ProtocolError::LengthMismatch { declared, actual } => write!(
                f,
                "Length byte declares {} bytes but {} are available",
                declared, actual
            ),
            ProtocolError::PayloadTooLong(n) => {
                write!(f, "Payload of {} bytes exceeds frame capacity", n)
            }
            ProtocolError::ChecksumMismatch { expected, actual } => write!(
                f,
                "Checksum mismatch: computed 0x{:02X}, received 0x{:02X}",
                expected, actual
            ),
            ProtocolError::UnexpectedPayload { expected, actual } => write!(
                f,
                "Expected a {}-byte payload, got {} bytes",
                expected, actual
            ),
        }
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::Timeout => write!(f, "Timed out waiting for a response"),
            TransportError::Closed => write!(f, "Connection closed by peer"),
            TransportError::Io(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl fmt::Display for MotionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MotionError::LimitViolation { azm_deg, alt_deg } => write!(
                f,
                "Target Az {:.3} / Alt {:.3} is outside the slew limits",
                azm_deg, alt_deg
            ),
            MotionError::Aborted => write!(f, "Motion aborted"),
            MotionError::SlewTimeout(axis) => {
                write!(f, "{} axis did not finish slewing in time", axis)
            }
            MotionError::InvalidSlewRate(rate) => {
                write!(f, "Invalid slew rate: {}. Must be 0-9", rate)
            }
        }
    }
}

// Conversion impls
impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Error::Config(e)
    }
}

impl From<ProtocolError> for Error {
    fn from(e: ProtocolError) -> Self {
        Error::Protocol(e)
    }
}

impl From<TransportError> for Error {
    fn from(e: TransportError) -> Self {
        Error::Transport(e)
    }
}

impl From<MotionError> for Error {
    fn from(e: MotionError) -> Self {
        Error::Motion(e)
    }
}

#[cfg(feature = "std")]
impl From<std::io::Error> for TransportError {
    fn from(e: std::io::Error) -> Self {
        match e.kind() {
            std::io::ErrorKind::UnexpectedEof
            | std::io::ErrorKind::ConnectionReset
            | std::io::ErrorKind::BrokenPipe => TransportError::Closed,
            std::io::ErrorKind::TimedOut => TransportError::Timeout,
            _ => TransportError::Io(truncated(&e.to_string())),
        }
    }
}

#[cfg(feature = "std")]
impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Transport(e.into())
    }
}

/// Copy as much of `msg` as fits into a bounded error string.
pub(crate) fn truncated<const N: usize>(msg: &str) -> heapless::String<N> {
    let mut out = heapless::String::new();
    for c in msg.chars() {
        if out.push(c).is_err() {
            break;
        }
    }
    out
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

#[cfg(feature = "std")]
impl std::error::Error for ConfigError {}

#[cfg(feature = "std")]
impl std::error::Error for ProtocolError {}

#[cfg(feature = "std")]
impl std::error::Error for TransportError {}

#[cfg(feature = "std")]
impl std::error::Error for MotionError {}
