//! Hardware backends for the binary
//!
//! With the `ws281x` feature the matrix is driven through the rpi_ws281x
//! library, otherwise frames go to the simulated driver paced like the wire.

#[cfg(feature = "ws281x")]
mod ws281x;

#[cfg(feature = "ws281x")]
pub use ws281x::Ws281xDriver;

#[cfg(feature = "ws281x")]
pub fn default_driver() -> Ws281xDriver {
    Ws281xDriver::new()
}

#[cfg(not(feature = "ws281x"))]
pub fn default_driver() -> myrtio_matrix_composer::SimulatedDriver {
    log::warn!("built without the ws281x feature, frames are only simulated");
    myrtio_matrix_composer::SimulatedDriver::new()
        .with_wire_timing()
        .with_history_limit(1)
}
