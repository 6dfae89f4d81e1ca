//! Cooperative shutdown
//!
//! Signal handlers only raise a flag. The control loop polls it and runs the
//! dark render and hardware release on its own thread.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use signal_hook::consts::{SIGINT, SIGTERM};

/// Poll period while waiting for a signal
const POLL_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Debug, Clone, Default)]
pub struct ShutdownSignal {
    flag: Arc<AtomicBool>,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the flag on SIGINT and SIGTERM
    pub fn install(&self) -> std::io::Result<()> {
        for signal in [SIGINT, SIGTERM] {
            signal_hook::flag::register(signal, Arc::clone(&self.flag))?;
        }
        Ok(())
    }

    pub fn is_requested(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }

    /// Raise the flag without a signal
    pub fn request(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    /// Block until shutdown is requested
    pub fn wait(&self) {
        while !self.is_requested() {
            std::thread::sleep(POLL_INTERVAL);
        }
    }
}
