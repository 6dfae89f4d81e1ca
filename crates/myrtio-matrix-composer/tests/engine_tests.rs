//! Integration tests for the render engine lifecycle.

use std::thread;
use std::time::{Duration, Instant};

use myrtio_matrix_composer::color::{decode, encode};
use myrtio_matrix_composer::{
    ChannelId, ChannelSettings, ColorOrder, ConfigError, DriverError, DriverErrorKind,
    EngineConfig, EngineError, EngineState, PackedPixel, RenderEngine, Rgb, SimulatedDriver,
};

const MAIN: ChannelId = ChannelId(0);
const SECOND: ChannelId = ChannelId(1);

fn channel(pixel_count: i64) -> ChannelSettings {
    ChannelSettings {
        pixel_count,
        color_order: ColorOrder::Grb,
        ..ChannelSettings::default()
    }
}

fn single_channel(pixel_count: i64) -> EngineConfig {
    EngineConfig::default().with_channel(MAIN, channel(pixel_count))
}

fn ready_engine(driver: &SimulatedDriver, config: EngineConfig) -> RenderEngine<SimulatedDriver> {
    let engine = RenderEngine::new(driver.clone(), config);
    engine.initialize().unwrap();
    engine
}

// -----------------------------------------------------------------------------
// Initialization
// -----------------------------------------------------------------------------

#[test]
fn initialize_reserves_hardware_and_allocates_buffers() {
    let driver = SimulatedDriver::new();
    let engine = RenderEngine::new(driver.clone(), single_channel(32));
    assert_eq!(engine.state(), EngineState::Uninitialized);

    engine.initialize().unwrap();

    assert_eq!(engine.state(), EngineState::Ready);
    assert!(driver.is_reserved());
    assert_eq!(engine.channels(), Ok(vec![MAIN]));
    assert_eq!(engine.with_frame(MAIN, |frame| frame.len()), Ok(32));
}

#[test]
fn invalid_config_fails_before_touching_hardware() {
    let driver = SimulatedDriver::new();
    let engine = RenderEngine::new(driver.clone(), single_channel(-3));

    assert_eq!(
        engine.initialize(),
        Err(EngineError::Config(ConfigError::NegativePixelCount(-3)))
    );
    assert_eq!(engine.state(), EngineState::Uninitialized);
    assert_eq!(driver.reserve_count(), 0);
}

#[test]
fn driver_rejection_leaves_engine_uninitialized() {
    let driver = SimulatedDriver::new().with_valid_pins(&[18]);
    let config = single_channel(8).with_channel(
        SECOND,
        ChannelSettings {
            pin: 4,
            ..channel(8)
        },
    );
    let engine = RenderEngine::new(driver.clone(), config);

    assert_eq!(
        engine.initialize(),
        Err(EngineError::Driver(DriverError::new(
            DriverErrorKind::InvalidGpio,
            4
        )))
    );
    assert_eq!(engine.state(), EngineState::Uninitialized);
    assert!(!driver.is_reserved());
    assert_eq!(engine.with_frame(MAIN, |_| ()), Err(EngineError::NotInitialized));
}

#[test]
fn initialize_can_be_retried_after_failure() {
    let driver = SimulatedDriver::new();
    driver.fail_next_reserve(DriverError::new(DriverErrorKind::MapFailed, -13));
    let engine = RenderEngine::new(driver.clone(), single_channel(8));

    assert!(matches!(engine.initialize(), Err(EngineError::Driver(_))));
    assert_eq!(engine.state(), EngineState::Uninitialized);

    engine.initialize().unwrap();
    assert_eq!(engine.state(), EngineState::Ready);
}

#[test]
fn second_initialize_fails() {
    let driver = SimulatedDriver::new();
    let engine = ready_engine(&driver, single_channel(8));
    assert_eq!(engine.initialize(), Err(EngineError::AlreadyInitialized));
    assert_eq!(driver.reserve_count(), 1);
}

#[test]
fn configuration_is_only_mutable_before_initialize() {
    let driver = SimulatedDriver::new();
    let engine = RenderEngine::new(driver.clone(), single_channel(8));
    engine
        .configure(|config| {
            config.channels.insert(MAIN, channel(16));
        })
        .unwrap();
    engine.initialize().unwrap();
    assert_eq!(engine.with_frame(MAIN, |frame| frame.len()), Ok(16));

    assert_eq!(
        engine.configure(|config| config.channels.clear()),
        Err(EngineError::AlreadyInitialized)
    );
}

#[test]
fn second_engine_cannot_claim_a_busy_driver() {
    let driver = SimulatedDriver::new();
    let _first = ready_engine(&driver, single_channel(8));
    let second = RenderEngine::new(driver.clone(), single_channel(8));

    assert!(matches!(
        second.initialize(),
        Err(EngineError::Driver(DriverError {
            kind: DriverErrorKind::DmaBusy,
            ..
        }))
    ));
    assert_eq!(second.state(), EngineState::Uninitialized);
}

// -----------------------------------------------------------------------------
// Disabled channels
// -----------------------------------------------------------------------------

#[test]
fn zero_length_channel_is_never_allocated_or_rendered() {
    let driver = SimulatedDriver::new();
    let config = single_channel(4).with_channel(SECOND, channel(0));
    let engine = ready_engine(&driver, config);

    assert_eq!(engine.channels(), Ok(vec![MAIN]));
    assert_eq!(
        engine.with_frame(SECOND, |_| ()),
        Err(EngineError::UnknownChannel(SECOND))
    );

    engine.render().unwrap();
    let frames = driver.last_transmission().unwrap();
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].id, MAIN);
}

#[test]
fn engine_with_only_disabled_channels_renders_nothing() {
    let driver = SimulatedDriver::new();
    let engine = ready_engine(&driver, single_channel(0));
    engine.render().unwrap();
    assert_eq!(driver.transmit_count(), 0);
}

// -----------------------------------------------------------------------------
// Rendering
// -----------------------------------------------------------------------------

#[test]
fn render_hands_current_buffer_to_driver() {
    let driver = SimulatedDriver::new();
    let engine = ready_engine(&driver, single_channel(4));
    let green = encode(Rgb::new(0, 32, 0), ColorOrder::Grb);

    engine.fill(MAIN, green).unwrap();
    engine.render().unwrap();

    let frames = driver.last_transmission().unwrap();
    assert_eq!(frames[0].pixels, vec![green; 4]);
    assert_eq!(frames[0].order, ColorOrder::Grb);
    assert_eq!(frames[0].pin, 18);
    assert_eq!(engine.state(), EngineState::Ready);
}

#[test]
fn frame_access_keeps_the_configured_length() {
    let driver = SimulatedDriver::new();
    let engine = ready_engine(&driver, single_channel(32));
    let red = encode(Rgb::new(16, 0, 0), ColorOrder::Grb);

    engine
        .with_frame(MAIN, |frame| {
            frame.shift_in(red);
            frame.fill_rgb(Rgb::new(0, 0, 16));
            frame.shift_in(red);
            frame.clear();
            frame.shift_in(red);
        })
        .unwrap();
    engine.render().unwrap();

    let frames = driver.last_transmission().unwrap();
    assert_eq!(frames[0].pixels.len(), 32);
    assert_eq!(frames[0].pixels[0], red);
    assert_eq!(
        engine.channel_config(MAIN).unwrap().pixel_count(),
        frames[0].pixels.len()
    );
}

#[test]
fn buffer_can_be_changed_right_after_render() {
    let driver = SimulatedDriver::new();
    let engine = ready_engine(&driver, single_channel(2));

    engine.fill_rgb(MAIN, Rgb::new(255, 0, 0)).unwrap();
    engine.render().unwrap();
    engine.fill_rgb(MAIN, Rgb::new(0, 0, 255)).unwrap();
    engine.render().unwrap();

    let transmissions = driver.transmissions();
    assert_eq!(transmissions.len(), 2);
    assert_eq!(
        decode(transmissions[0][0].pixels[0], ColorOrder::Grb),
        Rgb::new(255, 0, 0)
    );
    assert_eq!(
        decode(transmissions[1][0].pixels[0], ColorOrder::Grb),
        Rgb::new(0, 0, 255)
    );
}

#[test]
fn brightness_scales_transmitted_frame_but_not_buffer() {
    let driver = SimulatedDriver::new();
    let config = EngineConfig::default().with_channel(
        MAIN,
        ChannelSettings {
            brightness: 127,
            ..channel(2)
        },
    );
    let engine = ready_engine(&driver, config);
    let full = encode(Rgb::new(200, 100, 50), ColorOrder::Grb);

    engine.fill(MAIN, full).unwrap();
    engine.render().unwrap();

    let sent = driver.last_transmission().unwrap()[0].pixels[0];
    assert_eq!(decode(sent, ColorOrder::Grb), Rgb::new(100, 50, 25));
    assert_eq!(engine.get(MAIN, 0), Ok(full));
}

#[test]
fn brightness_can_change_between_renders() {
    let driver = SimulatedDriver::new();
    let engine = ready_engine(&driver, single_channel(1));
    engine.fill_rgb(MAIN, Rgb::new(255, 255, 255)).unwrap();

    engine.set_brightness(MAIN, 0).unwrap();
    engine.render().unwrap();

    assert_eq!(driver.last_transmission().unwrap()[0].pixels[0], PackedPixel::DARK);
    assert_eq!(engine.channel_config(MAIN).unwrap().brightness(), 0);
}

#[test]
fn invert_is_passed_to_driver() {
    let driver = SimulatedDriver::new();
    let config = EngineConfig::default().with_channel(
        MAIN,
        ChannelSettings {
            invert: true,
            ..channel(1)
        },
    );
    let engine = ready_engine(&driver, config);
    engine.render().unwrap();
    assert!(driver.last_transmission().unwrap()[0].invert);
}

#[test]
fn driver_failure_keeps_engine_ready() {
    let driver = SimulatedDriver::new();
    let engine = ready_engine(&driver, single_channel(4));
    let underrun = DriverError::new(DriverErrorKind::Underrun, 7);
    driver.fail_next_transmit(underrun);

    assert_eq!(engine.render(), Err(EngineError::Driver(underrun)));
    assert_eq!(engine.state(), EngineState::Ready);

    engine.render().unwrap();
    assert_eq!(driver.transmit_count(), 1);
}

#[test]
fn render_before_initialize_fails() {
    let engine = RenderEngine::new(SimulatedDriver::new(), single_channel(4));
    assert_eq!(engine.render(), Err(EngineError::NotInitialized));
}

#[test]
fn buffer_access_is_bounds_checked() {
    let driver = SimulatedDriver::new();
    let engine = ready_engine(&driver, single_channel(32));
    let pixel = PackedPixel::from_raw(0x00_10_20_30);

    assert_eq!(engine.set(MAIN, 31, pixel), Ok(()));
    assert_eq!(engine.get(MAIN, 31), Ok(pixel));
    assert_eq!(
        engine.set(MAIN, 32, pixel),
        Err(EngineError::IndexOutOfRange { index: 32, len: 32 })
    );
    assert_eq!(
        engine.get(MAIN, 32),
        Err(EngineError::IndexOutOfRange { index: 32, len: 32 })
    );
}

// -----------------------------------------------------------------------------
// Reentrancy
// -----------------------------------------------------------------------------

fn wait_for_transmission(driver: &SimulatedDriver) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !driver.is_transmitting() {
        assert!(Instant::now() < deadline, "render never reached the driver");
        thread::sleep(Duration::from_millis(1));
    }
}

#[test]
fn concurrent_render_fails_fast() {
    let driver = SimulatedDriver::new().with_latency(Duration::from_millis(300));
    let engine = ready_engine(&driver, single_channel(8));

    thread::scope(|scope| {
        let first = scope.spawn(|| engine.render());
        wait_for_transmission(&driver);
        assert_eq!(engine.state(), EngineState::Rendering);

        assert_eq!(engine.render(), Err(EngineError::RenderInProgress));
        assert_eq!(engine.fill(MAIN, PackedPixel::DARK), Err(EngineError::RenderInProgress));

        assert_eq!(first.join().unwrap(), Ok(()));
    });

    assert_eq!(engine.state(), EngineState::Ready);
    assert_eq!(driver.transmit_count(), 1);
}

#[test]
fn render_from_inside_frame_access_fails_fast() {
    let driver = SimulatedDriver::new();
    let engine = ready_engine(&driver, single_channel(8));

    let nested = engine.with_frame(MAIN, |frame| {
        frame.fill(encode(Rgb::new(9, 9, 9), ColorOrder::Grb));
        engine.render()
    });

    assert_eq!(nested, Ok(Err(EngineError::RenderInProgress)));
    assert_eq!(engine.state(), EngineState::Ready);
    assert_eq!(driver.transmit_count(), 0);

    engine.render().unwrap();
    assert_eq!(driver.transmit_count(), 1);
}

#[test]
fn render_from_inside_each_frame_access_fails_fast() {
    let driver = SimulatedDriver::new();
    let engine = ready_engine(&driver, single_channel(8));

    let mut nested = None;
    engine
        .for_each_frame(|_, _| nested = Some(engine.render()))
        .unwrap();

    assert_eq!(nested, Some(Err(EngineError::RenderInProgress)));
    assert_eq!(engine.state(), EngineState::Ready);
}

#[test]
fn finalize_during_render_waits_for_completion() {
    let driver = SimulatedDriver::new().with_latency(Duration::from_millis(100));
    let engine = ready_engine(&driver, single_channel(8));

    thread::scope(|scope| {
        let first = scope.spawn(|| engine.render());
        wait_for_transmission(&driver);
        engine.finalize();
        assert_eq!(first.join().unwrap(), Ok(()));
    });

    assert_eq!(engine.state(), EngineState::Finalized);
    assert_eq!(driver.transmit_count(), 1);
    assert!(!driver.is_reserved());
}

// -----------------------------------------------------------------------------
// Finalization
// -----------------------------------------------------------------------------

#[test]
fn finalize_releases_hardware_once() {
    let driver = SimulatedDriver::new();
    let engine = ready_engine(&driver, single_channel(8));

    engine.finalize();
    engine.finalize();

    assert_eq!(engine.state(), EngineState::Finalized);
    assert_eq!(driver.release_count(), 1);
    assert!(!driver.is_reserved());
}

#[test]
fn finalize_on_uninitialized_engine_is_a_no_op() {
    let driver = SimulatedDriver::new();
    let engine = RenderEngine::new(driver.clone(), single_channel(8));

    engine.finalize();
    engine.finalize();

    assert_eq!(engine.state(), EngineState::Finalized);
    assert_eq!(driver.release_count(), 0);
}

#[test]
fn operations_after_finalize_fail() {
    let driver = SimulatedDriver::new();
    let engine = ready_engine(&driver, single_channel(8));
    engine.finalize();

    assert_eq!(engine.render(), Err(EngineError::EngineFinalized));
    assert_eq!(engine.initialize(), Err(EngineError::EngineFinalized));
    assert_eq!(engine.fill(MAIN, PackedPixel::DARK), Err(EngineError::EngineFinalized));
    assert_eq!(engine.get(MAIN, 0), Err(EngineError::EngineFinalized));
    assert_eq!(
        engine.configure(|_| ()),
        Err(EngineError::EngineFinalized)
    );
}

#[test]
fn dropping_engine_releases_hardware() {
    let driver = SimulatedDriver::new();
    drop(ready_engine(&driver, single_channel(8)));
    assert!(!driver.is_reserved());
    assert_eq!(driver.release_count(), 1);
}

#[test]
fn dark_render_clears_and_tolerates_finalized_engine() {
    let driver = SimulatedDriver::new();
    let engine = ready_engine(&driver, single_channel(4));
    engine.fill_rgb(MAIN, Rgb::new(9, 9, 9)).unwrap();

    assert!(engine.render_dark());
    let frames = driver.last_transmission().unwrap();
    assert!(frames[0].pixels.iter().all(|p| *p == PackedPixel::DARK));

    engine.finalize();
    assert!(!engine.render_dark());
}

#[test]
fn dark_render_swallows_driver_errors() {
    let driver = SimulatedDriver::new();
    let engine = ready_engine(&driver, single_channel(4));
    driver.fail_next_transmit(DriverError::new(DriverErrorKind::Underrun, 1));
    assert!(!engine.render_dark());
    assert_eq!(engine.state(), EngineState::Ready);
}

// -----------------------------------------------------------------------------
// Full sequence
// -----------------------------------------------------------------------------

#[test]
fn color_then_dark_sequence() {
    let driver = SimulatedDriver::new();
    let engine = RenderEngine::new(driver.clone(), single_channel(32));

    engine.initialize().unwrap();
    engine
        .fill(MAIN, encode(Rgb::new(0, 32, 0), ColorOrder::Grb))
        .unwrap();
    assert_eq!(engine.render(), Ok(()));
    engine.clear(MAIN).unwrap();
    assert_eq!(engine.render(), Ok(()));
    engine.finalize();

    let transmissions = driver.transmissions();
    assert_eq!(transmissions.len(), 2);
    assert!(
        transmissions[0][0]
            .pixels
            .iter()
            .all(|p| decode(*p, ColorOrder::Grb) == Rgb::new(0, 32, 0))
    );
    assert!(transmissions[1][0].pixels.iter().all(|p| *p == PackedPixel::DARK));
    assert_eq!(driver.release_count(), 1);
}
