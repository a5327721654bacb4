use std::time::{Duration, Instant};

/// Timestep for a 60Hz simulation.
pub const SIXTY_HZ: Duration = Duration::from_nanos(16_666_666);

/// Simulation clock for a world's tick loop.
///
/// Tracks the configured fixed timestep along with the observed wall-clock delta
/// between ticks, the cumulative elapsed time, and the number of ticks run.
/// [`advance()`](Time::advance) is invoked once at the end of each tick.
#[derive(Debug, Copy, Clone)]
pub struct Time {
    /// The instant the current tick started
    instant: Instant,
    /// The configured interval between ticks
    timestep: Duration,
    /// The wall-clock time delta since the last tick
    pub delta: Duration,
    /// The total elapsed wall-clock time since the first tick
    pub elapsed: Duration,
    /// The number of ticks advanced so far
    pub ticks: u64,
}

impl Time {
    /// Construct a new clock with delta and elapsed set to zero.
    pub fn new(timestep: Duration) -> Self {
        Self {
            instant: Instant::now(),
            timestep,
            delta: Duration::ZERO,
            elapsed: Duration::ZERO,
            ticks: 0,
        }
    }

    /// The configured interval between ticks.
    #[inline]
    pub fn timestep(&self) -> Duration {
        self.timestep
    }

    /// Record the end of a tick: capture the wall-clock delta since the last
    /// advance and fold it into the cumulative elapsed time.
    pub(crate) fn advance(&mut self) {
        let delta = self.instant.elapsed();
        self.instant = Instant::now();
        self.delta = delta;
        self.elapsed += delta;
        self.ticks += 1;
    }

    /// Reset the clock reference to now. Useful when the loop was stalled
    /// (e.g. paused) and the next delta should not include the stall.
    pub fn reset_now(&mut self) {
        self.instant = Instant::now();
    }
}

impl Default for Time {
    fn default() -> Self {
        Self::new(SIXTY_HZ)
    }
}
