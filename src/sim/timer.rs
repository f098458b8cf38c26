//! Repeating timers measured in round time

/// Smallest interval accepted; keeps `advance` from spinning on a zero delay
const MIN_INTERVAL_MS: f64 = 1.0;

/// Fires at t = 0, interval, 2 * interval, ... of round time.
///
/// Never pauses; the only reset is building a new round.
#[derive(Debug, Clone)]
pub struct RepeatingTimer {
    interval_ms: f64,
    elapsed_ms: f64,
    next_fire_ms: f64,
    fired: u64,
}

impl RepeatingTimer {
    pub fn new(interval_ms: f64) -> Self {
        Self {
            interval_ms: interval_ms.max(MIN_INTERVAL_MS),
            elapsed_ms: 0.0,
            next_fire_ms: 0.0,
            fired: 0,
        }
    }

    /// Advance by `dt_ms`, returning how many times the timer fired
    pub fn advance(&mut self, dt_ms: f64) -> u32 {
        self.elapsed_ms += dt_ms.max(0.0);

        let mut fires = 0;
        while self.next_fire_ms <= self.elapsed_ms {
            fires += 1;
            self.next_fire_ms += self.interval_ms;
        }
        self.fired += u64::from(fires);
        fires
    }

    pub fn interval_ms(&self) -> f64 {
        self.interval_ms
    }

    pub fn elapsed_ms(&self) -> f64 {
        self.elapsed_ms
    }

    /// Total firings since creation
    pub fn fired(&self) -> u64 {
        self.fired
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fires_at_zero() {
        let mut timer = RepeatingTimer::new(1000.0);
        assert_eq!(timer.advance(0.0), 1);
        assert_eq!(timer.advance(999.0), 0);
        assert_eq!(timer.advance(1.0), 1);
    }

    #[test]
    fn test_four_fires_by_3500ms() {
        let mut timer = RepeatingTimer::new(1000.0);
        let mut total = 0;
        for _ in 0..35 {
            total += timer.advance(100.0);
        }
        assert_eq!(total, 4);
        assert_eq!(timer.fired(), 4);
        assert_eq!(timer.elapsed_ms(), 3500.0);
    }

    #[test]
    fn test_large_step_fires_multiple() {
        let mut timer = RepeatingTimer::new(1000.0);
        assert_eq!(timer.advance(2500.0), 3);
    }

    #[test]
    fn test_zero_interval_is_clamped() {
        let mut timer = RepeatingTimer::new(0.0);
        assert_eq!(timer.interval_ms(), MIN_INTERVAL_MS);
        assert_eq!(timer.advance(10.0), 11);
    }
}
