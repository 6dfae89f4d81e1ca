//! Render Engine - lifecycle state machine
//!
//! The `RenderEngine` is the central coordinator that:
//! - Validates the engine configuration against the driver capabilities
//! - Owns one frame buffer per enabled channel
//! - Hands frames to the hardware driver, one transmission per render
//! - Applies per-channel brightness at transmit time
//! - Releases hardware resources on finalization
//!
//! State machine: `Uninitialized -> Ready -> Rendering -> Ready -> ... -> Finalized`.
//!
//! Methods take `&self`. Only one render can be in flight, a second render
//! issued meanwhile fails with `RenderInProgress` instead of waiting.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError, TryLockError};

use log::{debug, info, trace, warn};

use crate::channel::{ChannelConfig, ChannelId, EngineConfig};
use crate::color::{PackedPixel, Rgb};
use crate::driver::{ChannelFrame, HardwareDriver, ReserveRequest};
use crate::error::EngineError;
use crate::frame::FrameBuffer;

/// Engine state machine states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum EngineState {
    /// Configuration may be changed, nothing is allocated
    Uninitialized = 0,
    /// Buffers allocated and hardware reserved
    Ready = 1,
    /// A frame is being handed to the driver
    Rendering = 2,
    /// Hardware released, engine unusable
    Finalized = 3,
}

impl From<u8> for EngineState {
    fn from(value: u8) -> Self {
        match value {
            1 => Self::Ready,
            2 => Self::Rendering,
            3 => Self::Finalized,
            _ => Self::Uninitialized,
        }
    }
}

/// Channel slot - configuration and frame buffer of one enabled channel
struct ChannelSlot {
    id: ChannelId,
    config: ChannelConfig,
    frame: FrameBuffer,
    /// Brightness scaled copy of `frame`, reused between renders
    output: Vec<PackedPixel>,
}

impl ChannelSlot {
    fn new(id: ChannelId, config: ChannelConfig) -> Self {
        let frame = FrameBuffer::new(config.pixel_count(), config.color_order());
        Self {
            id,
            output: Vec::with_capacity(frame.len()),
            config,
            frame,
        }
    }

    fn prepare_output(&mut self) {
        let brightness = self.config.brightness();
        self.output.clear();
        self.output.extend(
            self.frame
                .as_slice()
                .iter()
                .map(|pixel| pixel.scaled(brightness)),
        );
    }
}

struct Inner<D: HardwareDriver> {
    driver: D,
    config: EngineConfig,
    handle: Option<D::Handle>,
    /// Enabled channels ordered by identifier
    slots: Vec<ChannelSlot>,
    /// Configured channels with zero length
    disabled: Vec<ChannelId>,
    finalized: bool,
}

impl<D: HardwareDriver> Inner<D> {
    fn slot_mut(&mut self, id: ChannelId) -> Result<&mut ChannelSlot, EngineError> {
        self.slots
            .iter_mut()
            .find(|slot| slot.id == id)
            .ok_or(EngineError::UnknownChannel(id))
    }

    fn transmit(&mut self) -> Result<(), EngineError> {
        let Inner {
            driver,
            handle,
            slots,
            ..
        } = self;
        let handle = handle.as_mut().ok_or(EngineError::NotInitialized)?;
        if slots.is_empty() {
            trace!("no enabled channels, nothing to transmit");
            return Ok(());
        }

        for slot in slots.iter_mut() {
            slot.prepare_output();
        }
        let frames = slots
            .iter()
            .map(|slot| ChannelFrame {
                id: slot.id,
                config: &slot.config,
                pixels: &slot.output,
            })
            .collect::<Vec<_>>();

        trace!("transmitting {} frame(s)", frames.len());
        driver.transmit(handle, &frames).map_err(|e| {
            warn!("render failed: {e}");
            EngineError::Driver(e)
        })
    }
}

/// Render Engine - owns the channel slots and drives the hardware
///
/// Generic over `D: HardwareDriver` to support different hardware backends.
pub struct RenderEngine<D: HardwareDriver> {
    state: AtomicU8,
    inner: Mutex<Inner<D>>,
}

impl<D: HardwareDriver> RenderEngine<D> {
    /// Create an uninitialized engine, nothing is validated or claimed yet
    pub fn new(driver: D, config: EngineConfig) -> Self {
        Self {
            state: AtomicU8::new(EngineState::Uninitialized as u8),
            inner: Mutex::new(Inner {
                driver,
                config,
                handle: None,
                slots: Vec::new(),
                disabled: Vec::new(),
                finalized: false,
            }),
        }
    }

    /// Get current engine state
    pub fn state(&self) -> EngineState {
        self.state.load(Ordering::Acquire).into()
    }

    /// Copy of the engine configuration
    pub fn config(&self) -> EngineConfig {
        self.lock().config.clone()
    }

    /// Change the configuration, only allowed before `initialize`
    pub fn configure<F>(&self, f: F) -> Result<(), EngineError>
    where
        F: FnOnce(&mut EngineConfig),
    {
        let mut inner = self.lock();
        match self.state() {
            EngineState::Uninitialized => {
                f(&mut inner.config);
                Ok(())
            }
            EngineState::Finalized => Err(EngineError::EngineFinalized),
            EngineState::Rendering => Err(EngineError::RenderInProgress),
            EngineState::Ready => Err(EngineError::AlreadyInitialized),
        }
    }

    /// Validate the configuration, allocate buffers and reserve the hardware
    ///
    /// On failure the engine stays `Uninitialized` with nothing allocated or
    /// reserved.
    pub fn initialize(&self) -> Result<(), EngineError> {
        let mut inner = self.lock();
        match self.state() {
            EngineState::Uninitialized => {}
            EngineState::Finalized => return Err(EngineError::EngineFinalized),
            EngineState::Ready | EngineState::Rendering => {
                return Err(EngineError::AlreadyInitialized);
            }
        }

        let caps = inner.driver.capabilities();
        let validated = inner.config.validate(&caps)?;
        let enabled = validated.enabled().cloned().collect::<Vec<_>>();
        let disabled = validated
            .channels
            .iter()
            .filter(|(_, config)| !config.is_enabled())
            .map(|(id, _)| *id)
            .collect::<Vec<_>>();
        for id in &disabled {
            debug!("channel {id} has no pixels, skipping");
        }

        let request = ReserveRequest {
            dma_channel: validated.dma_channel,
            channels: &enabled,
        };
        let handle = inner.driver.reserve(&request).map_err(|e| {
            warn!("hardware reservation failed: {e}");
            EngineError::Driver(e)
        })?;

        inner.slots = enabled
            .into_iter()
            .map(|(id, config)| ChannelSlot::new(id, config))
            .collect();
        inner.disabled = disabled;
        inner.handle = Some(handle);
        self.state.store(EngineState::Ready as u8, Ordering::Release);
        info!(
            "engine ready: DMA {}, {} channel(s) enabled",
            validated.dma_channel,
            inner.slots.len()
        );
        Ok(())
    }

    /// Hand every enabled channel's frame to the driver and wait for completion
    ///
    /// Buffers may be changed as soon as this returns. Driver failures are
    /// reported and the engine stays `Ready`. Fails with `RenderInProgress`
    /// while the buffers are borrowed, also from inside `with_frame`.
    pub fn render(&self) -> Result<(), EngineError> {
        if let Err(current) = self.state.compare_exchange(
            EngineState::Ready as u8,
            EngineState::Rendering as u8,
            Ordering::AcqRel,
            Ordering::Acquire,
        ) {
            return Err(match EngineState::from(current) {
                EngineState::Uninitialized => EngineError::NotInitialized,
                EngineState::Finalized => EngineError::EngineFinalized,
                EngineState::Ready | EngineState::Rendering => EngineError::RenderInProgress,
            });
        }

        // Slots held elsewhere, possibly by the caller's own frame access
        let mut inner = match self.inner.try_lock() {
            Ok(inner) => inner,
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
            Err(TryLockError::WouldBlock) => {
                let _ = self.state.compare_exchange(
                    EngineState::Rendering as u8,
                    EngineState::Ready as u8,
                    Ordering::AcqRel,
                    Ordering::Acquire,
                );
                return Err(EngineError::RenderInProgress);
            }
        };
        if inner.finalized {
            return Err(EngineError::EngineFinalized);
        }
        let result = inner.transmit();
        // Back to ready while still holding the slots
        self.state.store(EngineState::Ready as u8, Ordering::Release);
        drop(inner);
        result
    }

    /// Clear every buffer and render once, ignoring any failure
    ///
    /// Used to leave the LEDs dark on shutdown. Returns whether the dark
    /// frame reached the driver.
    pub fn render_dark(&self) -> bool {
        if let Err(e) = self.clear_all() {
            debug!("dark render skipped: {e}");
            return false;
        }
        match self.render() {
            Ok(()) => true,
            Err(e) => {
                debug!("dark render failed: {e}");
                false
            }
        }
    }

    /// Release the hardware and drop all buffers
    ///
    /// Idempotent, also a no-op on a never initialized engine apart from
    /// moving it to `Finalized`.
    pub fn finalize(&self) {
        let mut inner = self.lock();
        if inner.finalized {
            return;
        }
        let Inner {
            driver,
            handle,
            slots,
            disabled,
            finalized,
            ..
        } = &mut *inner;
        if let Some(handle) = handle.take() {
            driver.release(handle);
            info!("hardware released");
        }
        slots.clear();
        disabled.clear();
        *finalized = true;
        self.state
            .store(EngineState::Finalized as u8, Ordering::Release);
    }

    /// Identifiers of the enabled channels
    pub fn channels(&self) -> Result<Vec<ChannelId>, EngineError> {
        let inner = self.access()?;
        Ok(inner.slots.iter().map(|slot| slot.id).collect())
    }

    /// Validated configuration of an enabled channel
    pub fn channel_config(&self, id: ChannelId) -> Result<ChannelConfig, EngineError> {
        let mut inner = self.access()?;
        Ok(inner.slot_mut(id)?.config.clone())
    }

    /// Change the transmit brightness of a channel between renders
    pub fn set_brightness(&self, id: ChannelId, brightness: u8) -> Result<(), EngineError> {
        let mut inner = self.access()?;
        inner.slot_mut(id)?.config.set_brightness(brightness);
        Ok(())
    }

    /// Run `f` with exclusive access to the frame buffer of `id`
    pub fn with_frame<F, R>(&self, id: ChannelId, f: F) -> Result<R, EngineError>
    where
        F: FnOnce(&mut FrameBuffer) -> R,
    {
        let mut inner = self.access()?;
        Ok(f(&mut inner.slot_mut(id)?.frame))
    }

    /// Run `f` on every enabled channel's frame buffer
    pub fn for_each_frame<F>(&self, mut f: F) -> Result<(), EngineError>
    where
        F: FnMut(ChannelId, &mut FrameBuffer),
    {
        let mut inner = self.access()?;
        for slot in &mut inner.slots {
            f(slot.id, &mut slot.frame);
        }
        Ok(())
    }

    pub fn fill(&self, id: ChannelId, value: PackedPixel) -> Result<(), EngineError> {
        self.with_frame(id, |frame| frame.fill(value))
    }

    /// Fill a channel with `color` packed for its order
    pub fn fill_rgb(&self, id: ChannelId, color: Rgb) -> Result<(), EngineError> {
        self.with_frame(id, |frame| frame.fill_rgb(color))
    }

    pub fn set(&self, id: ChannelId, index: usize, value: PackedPixel) -> Result<(), EngineError> {
        self.with_frame(id, |frame| frame.set(index, value))?
    }

    pub fn get(&self, id: ChannelId, index: usize) -> Result<PackedPixel, EngineError> {
        self.with_frame(id, |frame| frame.get(index))?
    }

    pub fn clear(&self, id: ChannelId) -> Result<(), EngineError> {
        self.with_frame(id, FrameBuffer::clear)
    }

    /// Fill every enabled channel with `color` packed for its order
    pub fn fill_all_rgb(&self, color: Rgb) -> Result<(), EngineError> {
        self.for_each_frame(|_, frame| frame.fill_rgb(color))
    }

    /// Turn every enabled channel dark
    pub fn clear_all(&self) -> Result<(), EngineError> {
        self.for_each_frame(|_, frame| frame.clear())
    }

    /// Lock the slots for buffer access, failing fast while a render is in flight
    fn access(&self) -> Result<MutexGuard<'_, Inner<D>>, EngineError> {
        match self.state() {
            EngineState::Ready => {}
            EngineState::Rendering => return Err(EngineError::RenderInProgress),
            EngineState::Uninitialized => return Err(EngineError::NotInitialized),
            EngineState::Finalized => return Err(EngineError::EngineFinalized),
        }
        let inner = self.lock();
        if inner.finalized {
            return Err(EngineError::EngineFinalized);
        }
        Ok(inner)
    }

    fn lock(&self) -> MutexGuard<'_, Inner<D>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<D: HardwareDriver> Drop for RenderEngine<D> {
    fn drop(&mut self) {
        self.finalize();
    }
}
