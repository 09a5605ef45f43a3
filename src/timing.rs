//! Scoped debug timer.
//!
//! ```rust
//! use waymark::timing::Timer;
//!
//! fn render(debug: bool) {
//!     let _timer = Timer::start("render", debug);
//!     // … logs "[timer] render took …" at debug level when `_timer` drops
//! }
//! ```

use std::time::{Duration, Instant};

use tracing::debug;

/// Logs how long its scope took, at `debug` level, when dropped.
///
/// Disabled timers cost one `Instant::now()` and log nothing.
#[derive(Debug)]
pub struct Timer {
    name: &'static str,
    start: Instant,
    enabled: bool,
}

impl Timer {
    pub fn start(name: &'static str, enabled: bool) -> Self {
        Self { name, start: Instant::now(), enabled }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        if self.enabled {
            let elapsed = self.start.elapsed();
            debug!(target: "waymark::timer", name = self.name, ?elapsed, "[timer] {} took {:?}", self.name, elapsed);
        }
    }
}
