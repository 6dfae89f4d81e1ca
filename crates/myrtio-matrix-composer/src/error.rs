//! Error types for the matrix composer

use core::fmt;

use crate::channel::ChannelId;
use crate::color::Component;

/// Error type for pixel encoding
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Color component value outside of `0..=255`
    OutOfRange { component: Component, value: i64 },
    /// Color order name is not known
    UnknownOrder(String),
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodecError::OutOfRange { component, value } => {
                write!(f, "{component} value {value} is out of range [0-255]")
            }
            CodecError::UnknownOrder(name) => write!(f, "Unknown color order: {name}"),
        }
    }
}

impl std::error::Error for CodecError {}

/// Error type for channel and engine configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Negative pixel count
    NegativePixelCount(i64),
    /// More pixels than the driver can address on one channel
    TooManyPixels { count: i64, max: usize },
    /// Brightness outside of `0..=255`
    BrightnessOutOfRange(i64),
    /// Frequency is zero, negative or outside the driver range
    UnsupportedFrequency { frequency_hz: i64, min: u32, max: u32 },
    /// Channel identifier the driver does not have
    UnsupportedChannel { id: ChannelId, max_channels: usize },
    /// More channels configured than the driver can drive
    TooManyChannels { count: usize, max: usize },
    /// DMA channel the driver does not support
    UnsupportedDmaChannel { dma: i64, max: u8 },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::NegativePixelCount(count) => {
                write!(f, "Pixel count must not be negative, got {count}")
            }
            ConfigError::TooManyPixels { count, max } => {
                write!(f, "Pixel count {count} exceeds the driver limit of {max}")
            }
            ConfigError::BrightnessOutOfRange(value) => {
                write!(f, "Brightness {value} is out of range [0-255]")
            }
            ConfigError::UnsupportedFrequency {
                frequency_hz,
                min,
                max,
            } => write!(
                f,
                "Frequency {frequency_hz} Hz is outside the supported range [{min}-{max}] Hz"
            ),
            ConfigError::UnsupportedChannel { id, max_channels } => write!(
                f,
                "Channel {id} is not available, the driver has {max_channels} channel(s)"
            ),
            ConfigError::TooManyChannels { count, max } => {
                write!(f, "{count} channels configured, the driver supports {max}")
            }
            ConfigError::UnsupportedDmaChannel { dma, max } => {
                write!(f, "Invalid DMA channel {dma}, must be below {max}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Reason reported by a hardware driver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverErrorKind {
    /// DMA channel already claimed by someone else
    DmaBusy,
    /// Mapping peripheral registers or DMA memory failed
    MapFailed,
    /// GPIO pin can not be driven by the peripheral
    InvalidGpio,
    /// DMA ran dry during transmission
    Underrun,
    /// Driver is not reserved or already released
    Unavailable,
    /// Any other driver specific failure
    Other,
}

impl fmt::Display for DriverErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DriverErrorKind::DmaBusy => "DMA channel busy",
            DriverErrorKind::MapFailed => "memory mapping failed",
            DriverErrorKind::InvalidGpio => "invalid GPIO",
            DriverErrorKind::Underrun => "DMA underrun",
            DriverErrorKind::Unavailable => "driver unavailable",
            DriverErrorKind::Other => "driver failure",
        };
        f.write_str(name)
    }
}

/// Hardware driver failure, wraps the driver specific reason code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriverError {
    pub kind: DriverErrorKind,
    pub code: i32,
}

impl DriverError {
    pub const fn new(kind: DriverErrorKind, code: i32) -> Self {
        Self { kind, code }
    }
}

impl fmt::Display for DriverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code {})", self.kind, self.code)
    }
}

impl std::error::Error for DriverError {}

/// Error type for render engine operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// Invalid configuration, nothing was touched
    Config(ConfigError),
    /// Hardware driver failure
    Driver(DriverError),
    /// Buffer access outside of the channel length
    IndexOutOfRange { index: usize, len: usize },
    /// Channel is not configured or disabled
    UnknownChannel(ChannelId),
    /// Another render is in flight
    RenderInProgress,
    /// Engine was finalized
    EngineFinalized,
    /// Engine was not initialized yet
    NotInitialized,
    /// Engine is already initialized
    AlreadyInitialized,
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::Config(e) => write!(f, "Configuration error: {e}"),
            EngineError::Driver(e) => write!(f, "Driver error: {e}"),
            EngineError::IndexOutOfRange { index, len } => {
                write!(f, "Pixel index {index} is out of range for length {len}")
            }
            EngineError::UnknownChannel(id) => write!(f, "Channel {id} is not configured"),
            EngineError::RenderInProgress => write!(f, "Render already in progress"),
            EngineError::EngineFinalized => write!(f, "Engine is finalized"),
            EngineError::NotInitialized => write!(f, "Engine is not initialized"),
            EngineError::AlreadyInitialized => write!(f, "Engine is already initialized"),
        }
    }
}

impl std::error::Error for EngineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EngineError::Config(e) => Some(e),
            EngineError::Driver(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigError> for EngineError {
    fn from(e: ConfigError) -> Self {
        EngineError::Config(e)
    }
}

impl From<DriverError> for EngineError {
    fn from(e: DriverError) -> Self {
        EngineError::Driver(e)
    }
}
