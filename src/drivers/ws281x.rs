use log::{debug, warn};
use myrtio_matrix_composer::{
    ChannelFrame, ColorOrder, DriverCapabilities, DriverError, DriverErrorKind, HardwareDriver,
    ReserveRequest, color,
};
use rs_ws281x::{ChannelBuilder, Controller, ControllerBuilder, StripType, WS2811Error};

/// DMA/PWM backend on the Raspberry Pi
///
/// The library runs one frequency over all channels and reorders the fields
/// itself, so frames are unpacked and written as plain `0xWWRRGGBB` words.
#[derive(Debug, Default)]
pub struct Ws281xDriver {
    caps: DriverCapabilities,
}

impl Ws281xDriver {
    pub fn new() -> Self {
        Self {
            caps: DriverCapabilities::RPI_PWM,
        }
    }
}

fn strip_type(order: ColorOrder) -> StripType {
    match order {
        ColorOrder::Rgb => StripType::Ws2811Rgb,
        ColorOrder::Rbg => StripType::Ws2811Rbg,
        ColorOrder::Grb => StripType::Ws2811Grb,
        ColorOrder::Gbr => StripType::Ws2811Gbr,
        ColorOrder::Brg => StripType::Ws2811Brg,
        ColorOrder::Bgr => StripType::Ws2811Bgr,
        ColorOrder::Rgbw => StripType::Sk6812Rgbw,
        ColorOrder::Rbgw => StripType::Sk6812Rbgw,
        ColorOrder::Grbw => StripType::Sk6812Grbw,
        ColorOrder::Gbrw => StripType::Sk6812Gbrw,
        ColorOrder::Brgw => StripType::Sk6812Brgw,
        ColorOrder::Bgrw => StripType::Sk6812Bgrw,
    }
}

fn driver_error(error: &WS2811Error) -> DriverError {
    warn!("ws281x: {error}");
    match error {
        WS2811Error::IllegalGpio => DriverError::new(DriverErrorKind::InvalidGpio, -10),
        WS2811Error::Mmap | WS2811Error::MapRegisters => {
            DriverError::new(DriverErrorKind::MapFailed, -5)
        }
        WS2811Error::HwNotSupported => DriverError::new(DriverErrorKind::Unavailable, -3),
        _ => DriverError::new(DriverErrorKind::Other, -1),
    }
}

impl HardwareDriver for Ws281xDriver {
    type Handle = Controller;

    fn capabilities(&self) -> DriverCapabilities {
        self.caps
    }

    fn reserve(&mut self, request: &ReserveRequest<'_>) -> Result<Controller, DriverError> {
        let mut frequencies = request
            .channels
            .iter()
            .map(|(_, config)| config.frequency_hz());
        let frequency = frequencies
            .next()
            .unwrap_or(myrtio_matrix_composer::channel::DEFAULT_FREQUENCY_HZ);
        if frequencies.any(|hz| hz != frequency) {
            warn!("ws281x: all channels must share one frequency");
            return Err(DriverError::new(DriverErrorKind::Other, -1));
        }

        let mut builder = ControllerBuilder::new();
        builder.freq(frequency).dma(i32::from(request.dma_channel));
        for (id, config) in request.channels {
            let count = i32::try_from(config.pixel_count())
                .map_err(|_| DriverError::new(DriverErrorKind::Other, -1))?;
            builder.channel(
                id.index(),
                ChannelBuilder::new()
                    .pin(config.pin())
                    .count(count)
                    .strip_type(strip_type(config.color_order()))
                    .invert(config.invert())
                    // Scaling happens before the words reach the library
                    .brightness(u8::MAX)
                    .build(),
            );
        }

        let controller = builder.build().map_err(|e| driver_error(&e))?;
        debug!(
            "ws281x: controller up on DMA {} at {frequency} Hz",
            request.dma_channel
        );
        Ok(controller)
    }

    fn transmit(
        &mut self,
        handle: &mut Controller,
        frames: &[ChannelFrame<'_>],
    ) -> Result<(), DriverError> {
        for frame in frames {
            let order = frame.config.color_order();
            // The library buffer is an array of ws2811_led_t words, 0xWWRRGGBB
            let leds = handle.leds_mut(frame.id.index());
            let words: &mut [u32] = bytemuck::try_cast_slice_mut(leds).map_err(|e| {
                warn!("ws281x: unaligned LED buffer: {e}");
                DriverError::new(DriverErrorKind::Other, -1)
            })?;
            for (word, pixel) in words.iter_mut().zip(frame.pixels) {
                let (rgb, white) = color::decode_rgbw(*pixel, order);
                *word = u32::from_be_bytes([white, rgb.r, rgb.g, rgb.b]);
            }
        }
        handle.render().map_err(|e| driver_error(&e))?;
        handle.wait().map_err(|e| driver_error(&e))
    }

    fn release(&mut self, handle: Controller) {
        drop(handle);
        debug!("ws281x: controller released");
    }
}
