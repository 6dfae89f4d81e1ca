//! Control loop of the matrix binary

use anyhow::Context;
use log::{debug, info, warn};
use myrtio_matrix_composer::{EngineConfig, HardwareDriver, RenderEngine, Rgb, color};

use crate::cli::Options;
use crate::config;
use crate::shutdown::ShutdownSignal;

/// Range every component runs through in the test pattern
const TEST_RANGE: core::ops::Range<u8> = 10..50;

/// Colors of the test sweep, blue outermost and red innermost
pub fn test_pattern() -> impl Iterator<Item = Rgb> {
    TEST_RANGE.flat_map(|b| {
        TEST_RANGE.flat_map(move |g| TEST_RANGE.map(move |r| Rgb::new(r, g, b)))
    })
}

/// Run one invocation against `driver`, building the engine config from `options`
pub fn run<D: HardwareDriver>(
    driver: D,
    options: &Options,
    shutdown: &ShutdownSignal,
) -> anyhow::Result<()> {
    let config = config::engine_config(options).context("failed to load channel config")?;
    run_with_config(driver, config, options, shutdown)
}

/// Run one invocation with an already assembled engine config
pub fn run_with_config<D: HardwareDriver>(
    driver: D,
    config: EngineConfig,
    options: &Options,
    shutdown: &ShutdownSignal,
) -> anyhow::Result<()> {
    let engine = RenderEngine::new(driver, config);
    engine
        .initialize()
        .context("failed to initialize the LED engine")?;

    let result = drive(&engine, options, shutdown);
    if shutdown.is_requested() {
        info!("shutdown requested, turning the matrix off");
        if !engine.render_dark() {
            warn!("matrix could not be turned off");
        }
    }
    engine.finalize();
    result
}

fn drive<D: HardwareDriver>(
    engine: &RenderEngine<D>,
    options: &Options,
    shutdown: &ShutdownSignal,
) -> anyhow::Result<()> {
    if options.off {
        info!("switching the matrix off");
        engine.clear_all()?;
        engine.render().context("failed to render the dark frame")?;
        return Ok(());
    }

    if options.test {
        return run_test(engine, shutdown);
    }

    let color = options.color;
    info!("showing color r={} g={} b={}", color.r, color.g, color.b);
    engine.fill_all_rgb(color)?;
    engine.render().context("failed to render the color")?;

    if options.clear_on_exit {
        // The caller turns the matrix dark once the signal arrives
        debug!("holding the color until shutdown");
        shutdown.wait();
    }
    Ok(())
}

fn run_test<D: HardwareDriver>(
    engine: &RenderEngine<D>,
    shutdown: &ShutdownSignal,
) -> anyhow::Result<()> {
    info!("running the test pattern");
    let mut steps = 0_usize;
    for rgb in test_pattern() {
        if shutdown.is_requested() {
            debug!("test pattern interrupted after {steps} step(s)");
            return Ok(());
        }
        engine.for_each_frame(|_, frame| {
            let value = color::encode(rgb, frame.order());
            frame.shift_in(value);
        })?;
        engine
            .render()
            .with_context(|| format!("test pattern failed at step {steps}"))?;
        steps += 1;
    }

    debug!("test pattern done after {steps} step(s)");
    if !engine.render_dark() {
        anyhow::bail!("failed to clear the matrix after the test pattern");
    }
    Ok(())
}
