//! Static color, test pattern and clear-on-exit front end for LED matrices
//! driven through `myrtio-matrix-composer`.

pub mod app;
pub mod cli;
pub mod config;
pub mod drivers;
pub mod shutdown;

/// Package version with build date metadata
pub const BUILD_VERSION: &str = env!("BUILD_VERSION");
