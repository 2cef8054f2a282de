use core::time::Duration;
#[cfg(feature = "std")]
use std::time::Instant;

// -----------------------------------------------------------------------------
// Throttle

/// Lets an event through at most once per `interval`.
///
/// The first call to [`ready`](Self::ready) always succeeds. A zero
/// interval lets every call through. Without the `std` feature there is no
/// clock, and every call is let through.
#[derive(Debug, Clone)]
pub struct Throttle {
    interval: Duration,
    #[cfg(feature = "std")]
    last_tick: Option<Instant>,
}

impl Throttle {
    #[inline]
    pub const fn new(interval: Duration) -> Self {
        Self {
            interval,
            #[cfg(feature = "std")]
            last_tick: None,
        }
    }

    #[inline]
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Forget the last tick, so the next call to [`ready`](Self::ready) succeeds.
    #[inline]
    pub fn reset(&mut self) {
        #[cfg(feature = "std")]
        {
            self.last_tick = None;
        }
    }

    /// Returns `true` and records the tick if the interval has elapsed.
    #[cfg(feature = "std")]
    pub fn ready(&mut self) -> bool {
        let now = Instant::now();
        match self.last_tick {
            Some(last) if now.duration_since(last) < self.interval => false,
            _ => {
                self.last_tick = Some(now);
                true
            }
        }
    }

    #[cfg(not(feature = "std"))]
    #[inline]
    pub fn ready(&mut self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::Throttle;
    use core::time::Duration;

    #[test]
    fn zero_interval_always_ready() {
        let mut throttle = Throttle::new(Duration::ZERO);
        assert!((0..16).all(|_| throttle.ready()));
    }

    #[test]
    #[cfg(feature = "std")]
    fn long_interval_fires_once() {
        let mut throttle = Throttle::new(Duration::from_secs(3600));
        assert!(throttle.ready());
        assert!(!throttle.ready());
        assert!(!throttle.ready());

        throttle.reset();
        assert!(throttle.ready());
    }

    #[test]
    #[cfg(not(feature = "std"))]
    fn without_a_clock_every_call_passes() {
        let mut throttle = Throttle::new(Duration::from_secs(3600));
        assert!(throttle.ready());
        assert!(throttle.ready());
    }
}
