//! Simulated driver
//!
//! Keeps frames in memory instead of shifting them out. Clones share state,
//! so a test can keep one clone to observe what the engine handed over while
//! the engine owns the other.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use log::{debug, trace};

use super::{ChannelFrame, DriverCapabilities, HardwareDriver, ReserveRequest};
use crate::channel::ChannelId;
use crate::color::{ColorOrder, PackedPixel};
use crate::error::{DriverError, DriverErrorKind};

/// Frame as seen by the simulated hardware
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransmittedFrame {
    pub id: ChannelId,
    pub pin: i32,
    pub order: ColorOrder,
    pub invert: bool,
    pub pixels: Vec<PackedPixel>,
}

/// Reset pulse closing every WS2812 frame
const RESET_TIME: Duration = Duration::from_micros(300);

#[derive(Debug, Default)]
struct SimState {
    latency: Duration,
    wire_timing: bool,
    history_limit: Option<usize>,
    valid_pins: Option<Vec<i32>>,
    reserved: Option<u64>,
    transmitting: bool,
    next_token: u64,
    reserve_failure: Option<DriverError>,
    transmit_failure: Option<DriverError>,
    reserve_count: usize,
    release_count: usize,
    transmit_count: usize,
    transmissions: Vec<Vec<TransmittedFrame>>,
}

/// Claim on the simulated DMA channel
#[derive(Debug)]
pub struct SimHandle {
    token: u64,
}

/// In-memory driver with configurable latency and failure injection
#[derive(Debug, Clone, Default)]
pub struct SimulatedDriver {
    caps: DriverCapabilities,
    state: Arc<Mutex<SimState>>,
}

impl SimulatedDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use custom limits instead of the Raspberry Pi ones
    #[must_use]
    pub fn with_capabilities(mut self, caps: DriverCapabilities) -> Self {
        self.caps = caps;
        self
    }

    /// Block every transmission for `latency`
    #[must_use]
    pub fn with_latency(self, latency: Duration) -> Self {
        self.lock().latency = latency;
        self
    }

    /// Block every transmission for as long as the bits take on the wire
    ///
    /// Added on top of the fixed latency. The longest channel decides, every
    /// field is 8 bits at the channel frequency followed by the reset pulse.
    #[must_use]
    pub fn with_wire_timing(self) -> Self {
        self.lock().wire_timing = true;
        self
    }

    /// Keep only the latest `limit` transmissions
    #[must_use]
    pub fn with_history_limit(self, limit: usize) -> Self {
        self.lock().history_limit = Some(limit);
        self
    }

    /// Reject reservations of pins outside `pins`
    #[must_use]
    pub fn with_valid_pins(self, pins: &[i32]) -> Self {
        self.lock().valid_pins = Some(pins.to_vec());
        self
    }

    /// Fail the next reservation with `error`
    pub fn fail_next_reserve(&self, error: DriverError) {
        self.lock().reserve_failure = Some(error);
    }

    /// Fail the next transmission with `error`
    pub fn fail_next_transmit(&self, error: DriverError) {
        self.lock().transmit_failure = Some(error);
    }

    pub fn is_reserved(&self) -> bool {
        self.lock().reserved.is_some()
    }

    /// Whether a transmission is currently blocked in the simulated latency
    pub fn is_transmitting(&self) -> bool {
        self.lock().transmitting
    }

    pub fn reserve_count(&self) -> usize {
        self.lock().reserve_count
    }

    pub fn release_count(&self) -> usize {
        self.lock().release_count
    }

    /// Number of successful transmissions
    pub fn transmit_count(&self) -> usize {
        self.lock().transmit_count
    }

    /// Frames of every kept transmission, oldest first
    pub fn transmissions(&self) -> Vec<Vec<TransmittedFrame>> {
        self.lock().transmissions.clone()
    }

    /// Frames of the latest successful transmission
    pub fn last_transmission(&self) -> Option<Vec<TransmittedFrame>> {
        self.lock().transmissions.last().cloned()
    }

    fn lock(&self) -> MutexGuard<'_, SimState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl HardwareDriver for SimulatedDriver {
    type Handle = SimHandle;

    fn capabilities(&self) -> DriverCapabilities {
        self.caps
    }

    fn reserve(&mut self, request: &ReserveRequest<'_>) -> Result<SimHandle, DriverError> {
        let mut state = self.lock();
        if let Some(error) = state.reserve_failure.take() {
            return Err(error);
        }
        if state.reserved.is_some() {
            return Err(DriverError::new(DriverErrorKind::DmaBusy, -1));
        }
        if let Some(valid_pins) = &state.valid_pins {
            if let Some((_, config)) = request
                .channels
                .iter()
                .find(|(_, config)| !valid_pins.contains(&config.pin()))
            {
                debug!("simulated driver rejects GPIO {}", config.pin());
                return Err(DriverError::new(DriverErrorKind::InvalidGpio, config.pin()));
            }
        }

        state.next_token += 1;
        let token = state.next_token;
        state.reserved = Some(token);
        state.reserve_count += 1;
        debug!(
            "simulated driver reserved DMA {} for {} channel(s)",
            request.dma_channel,
            request.channels.len()
        );
        Ok(SimHandle { token })
    }

    fn transmit(
        &mut self,
        handle: &mut SimHandle,
        frames: &[ChannelFrame<'_>],
    ) -> Result<(), DriverError> {
        let latency = {
            let mut state = self.lock();
            if state.reserved != Some(handle.token) {
                return Err(DriverError::new(DriverErrorKind::Unavailable, -1));
            }
            if let Some(error) = state.transmit_failure.take() {
                return Err(error);
            }
            state.transmitting = true;
            if state.wire_timing {
                state.latency + wire_time(frames)
            } else {
                state.latency
            }
        };

        if !latency.is_zero() {
            std::thread::sleep(latency);
        }

        let transmission = frames
            .iter()
            .map(|frame| TransmittedFrame {
                id: frame.id,
                pin: frame.config.pin(),
                order: frame.config.color_order(),
                invert: frame.config.invert(),
                pixels: frame.pixels.to_vec(),
            })
            .collect::<Vec<_>>();
        trace!("simulated driver consumed {} frame(s)", transmission.len());
        let mut state = self.lock();
        state.transmitting = false;
        state.transmit_count += 1;
        state.transmissions.push(transmission);
        if let Some(limit) = state.history_limit {
            let excess = state.transmissions.len().saturating_sub(limit);
            state.transmissions.drain(..excess);
        }
        Ok(())
    }

    fn release(&mut self, handle: SimHandle) {
        let mut state = self.lock();
        if state.reserved == Some(handle.token) {
            state.reserved = None;
            state.release_count += 1;
            debug!("simulated driver released");
        }
    }
}

fn wire_time(frames: &[ChannelFrame<'_>]) -> Duration {
    frames
        .iter()
        .map(|frame| {
            let fields = frame.pixels.len() * frame.config.color_order().channel_count();
            let bits = fields as u64 * 8;
            let hz = u64::from(frame.config.frequency_hz().max(1));
            Duration::from_micros(bits * 1_000_000 / hz)
        })
        .max()
        .unwrap_or_default()
        + RESET_TIME
}
