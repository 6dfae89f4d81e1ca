//! Channel parameters
//!
//! `ChannelSettings` carries raw values as they come from the command line or
//! a config file. Validation against the driver capabilities turns them into a
//! `ChannelConfig`, which is the only form the engine works with.

use core::fmt;
use std::collections::BTreeMap;

use crate::color::ColorOrder;
use crate::driver::DriverCapabilities;
use crate::error::ConfigError;

/// Default WS2812 data rate
pub const DEFAULT_FREQUENCY_HZ: u32 = 800_000;

/// Default GPIO pin (PWM0 on the Raspberry Pi header)
pub const DEFAULT_GPIO_PIN: i32 = 18;

/// Default DMA channel
pub const DEFAULT_DMA_CHANNEL: u8 = 10;

/// Identifier of a hardware output channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ChannelId(pub u8);

impl ChannelId {
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unvalidated channel parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelSettings {
    /// GPIO pin, checked by the driver on reserve
    pub pin: i32,
    /// Number of LEDs on the string, zero disables the channel
    pub pixel_count: i64,
    pub color_order: ColorOrder,
    /// Transmit time scale (0-255)
    pub brightness: i64,
    /// Invert the output signal (level shifter with inverting stage)
    pub invert: bool,
    pub frequency_hz: i64,
}

impl Default for ChannelSettings {
    fn default() -> Self {
        Self {
            pin: DEFAULT_GPIO_PIN,
            pixel_count: 0,
            color_order: ColorOrder::Grb,
            brightness: 255,
            invert: false,
            frequency_hz: i64::from(DEFAULT_FREQUENCY_HZ),
        }
    }
}

impl ChannelSettings {
    /// Validate against the capabilities of the driver that will run the channel
    pub fn validate(&self, caps: &DriverCapabilities) -> Result<ChannelConfig, ConfigError> {
        let pixel_count = usize::try_from(self.pixel_count)
            .map_err(|_| ConfigError::NegativePixelCount(self.pixel_count))?;
        if pixel_count > caps.max_pixels_per_channel {
            return Err(ConfigError::TooManyPixels {
                count: self.pixel_count,
                max: caps.max_pixels_per_channel,
            });
        }

        let brightness = u8::try_from(self.brightness)
            .map_err(|_| ConfigError::BrightnessOutOfRange(self.brightness))?;

        let frequency_hz = u32::try_from(self.frequency_hz)
            .ok()
            .filter(|hz| *hz > 0 && caps.supports_frequency(*hz))
            .ok_or(ConfigError::UnsupportedFrequency {
                frequency_hz: self.frequency_hz,
                min: caps.min_frequency_hz,
                max: caps.max_frequency_hz,
            })?;

        Ok(ChannelConfig {
            pin: self.pin,
            pixel_count,
            color_order: self.color_order,
            brightness,
            invert: self.invert,
            frequency_hz,
        })
    }
}

/// Validated parameters of one physical output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelConfig {
    pin: i32,
    pixel_count: usize,
    color_order: ColorOrder,
    brightness: u8,
    invert: bool,
    frequency_hz: u32,
}

impl ChannelConfig {
    pub fn pin(&self) -> i32 {
        self.pin
    }

    pub fn pixel_count(&self) -> usize {
        self.pixel_count
    }

    pub fn color_order(&self) -> ColorOrder {
        self.color_order
    }

    pub fn brightness(&self) -> u8 {
        self.brightness
    }

    pub fn invert(&self) -> bool {
        self.invert
    }

    pub fn frequency_hz(&self) -> u32 {
        self.frequency_hz
    }

    /// Zero length channels are disabled and never rendered
    pub fn is_enabled(&self) -> bool {
        self.pixel_count > 0
    }

    pub(crate) fn set_brightness(&mut self, brightness: u8) {
        self.brightness = brightness;
    }
}

/// Full engine configuration, mapping channel identifiers to their settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// DMA channel feeding the PWM peripheral
    pub dma_channel: i64,
    pub channels: BTreeMap<ChannelId, ChannelSettings>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            dma_channel: i64::from(DEFAULT_DMA_CHANNEL),
            channels: BTreeMap::new(),
        }
    }
}

impl EngineConfig {
    pub fn new(dma_channel: i64) -> Self {
        Self {
            dma_channel,
            channels: BTreeMap::new(),
        }
    }

    /// Add or replace a channel
    #[must_use]
    pub fn with_channel(mut self, id: ChannelId, settings: ChannelSettings) -> Self {
        self.channels.insert(id, settings);
        self
    }

    /// Validate every channel and the engine wide parameters
    pub fn validate(&self, caps: &DriverCapabilities) -> Result<ValidatedConfig, ConfigError> {
        let dma_channel = u8::try_from(self.dma_channel)
            .ok()
            .filter(|dma| *dma < caps.dma_channels)
            .ok_or(ConfigError::UnsupportedDmaChannel {
                dma: self.dma_channel,
                max: caps.dma_channels,
            })?;

        if self.channels.len() > caps.max_channels {
            return Err(ConfigError::TooManyChannels {
                count: self.channels.len(),
                max: caps.max_channels,
            });
        }

        let mut channels = Vec::with_capacity(self.channels.len());
        for (id, settings) in &self.channels {
            if id.index() >= caps.max_channels {
                return Err(ConfigError::UnsupportedChannel {
                    id: *id,
                    max_channels: caps.max_channels,
                });
            }
            channels.push((*id, settings.validate(caps)?));
        }

        Ok(ValidatedConfig {
            dma_channel,
            channels,
        })
    }
}

/// Engine configuration that passed validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedConfig {
    pub dma_channel: u8,
    /// All configured channels ordered by identifier, disabled ones included
    pub channels: Vec<(ChannelId, ChannelConfig)>,
}

impl ValidatedConfig {
    /// Channels with at least one pixel
    pub fn enabled(&self) -> impl Iterator<Item = &(ChannelId, ChannelConfig)> {
        self.channels.iter().filter(|(_, config)| config.is_enabled())
    }
}
