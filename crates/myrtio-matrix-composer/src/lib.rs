//! Matrix Composer - frame buffers and render protocol for addressable LED matrices
//!
//! Architecture layers:
//! - `color` - Pixel codec (`[ColorOrder]` field layouts, packing and unpacking)
//! - `channel` - Channel parameters and their validation
//! - `frame` - Per-channel frame buffers with linear and matrix addressing
//! - `driver` - Hardware abstraction (`[HardwareDriver]` trait + simulated implementation)
//! - `engine` - Render lifecycle state machine
//! - `error` - Error types shared by all layers
//!
//! The engine is generic over `HardwareDriver`, so the same render protocol runs
//! against the DMA/PWM backend on a board or the simulated driver in tests.

pub mod channel;
pub mod color;
pub mod driver;
pub mod engine;
pub mod error;
pub mod frame;
pub mod math8;

// Color exports
pub use color::{ColorOrder, Component, PackedPixel, Rgb};

// Channel exports
pub use channel::{ChannelConfig, ChannelId, ChannelSettings, EngineConfig};

// Frame exports
pub use frame::{FrameBuffer, MatrixLayout};

// Driver exports
pub use driver::{
    ChannelFrame, DriverCapabilities, HardwareDriver, ReserveRequest, SimulatedDriver,
};

// Engine exports
pub use engine::{EngineState, RenderEngine};

// Error exports
pub use error::{CodecError, ConfigError, DriverError, DriverErrorKind, EngineError};
