use crate::config::MS_PER_HOUR;

/// Days in one simulated horizon.
pub const DAYS_PER_YEAR: usize = 365;

/// A simulation clock that steps through fixed-length ticks.
///
/// The `Clock` provides methods to advance time tick-by-tick or run
/// a function at each tick until completion, plus the timing arithmetic
/// (ticks per hour, tick length in hours) derived from the granularity.
///
/// # Examples
///
/// ```
/// use ev_charge_sim::sim::clock::Clock;
///
/// let mut clock = Clock::new(3, 3_600_000);
/// let mut ticks = Vec::new();
///
/// clock.run(|tick| ticks.push(tick));
/// assert_eq!(ticks, vec![0, 1, 2]);
/// assert_eq!(Clock::for_year(900_000).total(), 365 * 24 * 4);
/// ```
#[derive(Debug, Clone)]
pub struct Clock {
    /// Next tick to hand out
    current: usize,
    /// Total ticks in the run
    total: usize,
    /// Tick length in milliseconds
    granularity_ms: u64,
}

impl Clock {
    /// Creates a clock with an explicit number of ticks.
    ///
    /// # Arguments
    ///
    /// * `total` - The total number of ticks the clock will run
    /// * `granularity_ms` - Tick length in milliseconds (must be > 0)
    pub fn new(total: usize, granularity_ms: u64) -> Self {
        Self {
            current: 0,
            total,
            granularity_ms,
        }
    }

    /// Creates a clock spanning one 365-day year.
    pub fn for_year(granularity_ms: u64) -> Self {
        let per_hour = ticks_per_hour(granularity_ms);
        Self::new(DAYS_PER_YEAR * 24 * per_hour, granularity_ms)
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn ticks_per_hour(&self) -> usize {
        ticks_per_hour(self.granularity_ms)
    }

    /// Tick length in hours.
    pub fn tick_hours(&self) -> f64 {
        self.granularity_ms as f64 / MS_PER_HOUR as f64
    }

    /// Hour of day (0..24) for a tick that starts an hour, `None` otherwise.
    pub fn hour_of_day(&self, tick: usize) -> Option<usize> {
        let per_hour = self.ticks_per_hour();
        if per_hour == 0 || tick % per_hour != 0 {
            return None;
        }
        Some((tick / per_hour) % 24)
    }

    /// Advances the clock by one tick.
    ///
    /// # Returns
    ///
    /// * `Some(tick)` - The current tick (starting from 0) before advancing
    /// * `None` - If the clock has reached its total
    pub fn tick(&mut self) -> Option<usize> {
        if self.current < self.total {
            let tick = self.current;
            self.current += 1;
            Some(tick)
        } else {
            None
        }
    }

    /// Runs a function for each remaining tick.
    pub fn run(&mut self, mut f: impl FnMut(usize)) {
        while let Some(tick) = self.tick() {
            f(tick);
        }
    }
}

fn ticks_per_hour(granularity_ms: u64) -> usize {
    MS_PER_HOUR.checked_div(granularity_ms).unwrap_or(0) as usize
}
