//! Hardware driver abstraction layer
//!
//! Provides a trait-based abstraction for the DMA/PWM subsystem that shifts
//! frames out to the LED strings, allowing the render engine to be
//! hardware-agnostic.

mod sim;

pub use sim::{SimHandle, SimulatedDriver, TransmittedFrame};

use crate::channel::{ChannelConfig, ChannelId};
use crate::color::PackedPixel;
use crate::error::DriverError;

/// Limits advertised by a hardware driver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriverCapabilities {
    /// Number of independent output channels
    pub max_channels: usize,
    /// DMA channels are numbered `0..dma_channels`
    pub dma_channels: u8,
    pub max_pixels_per_channel: usize,
    pub min_frequency_hz: u32,
    pub max_frequency_hz: u32,
}

impl DriverCapabilities {
    /// Raspberry Pi PWM peripheral: two channels, 14 usable DMA channels
    pub const RPI_PWM: Self = Self {
        max_channels: 2,
        dma_channels: 14,
        max_pixels_per_channel: 4096,
        min_frequency_hz: 400_000,
        max_frequency_hz: 800_000,
    };

    pub fn supports_frequency(&self, frequency_hz: u32) -> bool {
        (self.min_frequency_hz..=self.max_frequency_hz).contains(&frequency_hz)
    }
}

impl Default for DriverCapabilities {
    fn default() -> Self {
        Self::RPI_PWM
    }
}

/// Resources the engine asks for on initialization
///
/// Only enabled channels are listed.
#[derive(Debug, Clone, Copy)]
pub struct ReserveRequest<'a> {
    pub dma_channel: u8,
    pub channels: &'a [(ChannelId, ChannelConfig)],
}

/// Frame data of one channel handed over for transmission
///
/// `pixels` already carry the channel brightness. Signal inversion is left to
/// the driver.
#[derive(Debug, Clone, Copy)]
pub struct ChannelFrame<'a> {
    pub id: ChannelId,
    pub config: &'a ChannelConfig,
    pub pixels: &'a [PackedPixel],
}

/// Abstract hardware driver trait
///
/// Implement this trait to support different hardware platforms.
/// The render engine is generic over this trait.
pub trait HardwareDriver {
    /// Claimed resources (DMA channel, mapped registers, GPIO ownership)
    type Handle;

    /// Limits used to validate the engine configuration
    fn capabilities(&self) -> DriverCapabilities;

    /// Claim every resource needed for the requested channels
    ///
    /// Must either claim everything or nothing.
    fn reserve(&mut self, request: &ReserveRequest<'_>) -> Result<Self::Handle, DriverError>;

    /// Shift the frames out, blocking until the driver has consumed them
    fn transmit(
        &mut self,
        handle: &mut Self::Handle,
        frames: &[ChannelFrame<'_>],
    ) -> Result<(), DriverError>;

    /// Give the resources back
    ///
    /// Consumes the handle, the engine releases each handle exactly once.
    fn release(&mut self, handle: Self::Handle);
}
