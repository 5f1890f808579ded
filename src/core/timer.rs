/// Self-contained timers - accumulate delta time and decide when to fire

/// Throttled timer - minimum interval between fires
#[derive(Debug, Clone, Copy)]
pub struct Throttled {
    min_interval: f32,
    time_since_last: f32,
}

impl Throttled {
    /// Create throttled timer with minimum interval
    pub fn new(min_interval: f32) -> Self {
        Self {
            min_interval,
            time_since_last: min_interval, // first tick fires
        }
    }

    /// Attempt to fire, returns true if enough time has passed
    pub fn try_tick(&mut self, delta: f32) -> bool {
        self.time_since_last += delta;

        if self.time_since_last >= self.min_interval {
            self.time_since_last = 0.0;
            true
        } else {
            false
        }
    }
}

/// Countdown timer - fires once after duration
#[derive(Debug, Clone, Copy)]
pub struct Countdown {
    duration: f32,
    elapsed: f32,
    active: bool,
}

impl Countdown {
    /// Create inactive countdown
    pub fn new(duration: f32) -> Self {
        Self {
            duration: duration.max(0.0),
            elapsed: 0.0,
            active: false,
        }
    }

    /// Start (or restart) countdown
    pub fn start(&mut self) {
        self.elapsed = 0.0;
        self.active = true;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Tick with delta, returns true on the tick that completes it
    pub fn tick(&mut self, delta: f32) -> bool {
        if !self.active {
            return false;
        }

        self.elapsed += delta.max(0.0);

        if self.elapsed >= self.duration {
            self.active = false;
            true
        } else {
            false
        }
    }

    /// Get progress [0, 1]; a zero-length countdown is always complete
    pub fn progress(&self) -> f32 {
        if self.duration <= 0.0 {
            return 1.0;
        }
        (self.elapsed / self.duration).min(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn throttled_enforces_minimum() {
        let mut timer = Throttled::new(0.1);

        assert!(timer.try_tick(0.05)); // first fire immediate
        assert!(!timer.try_tick(0.05));
        assert!(timer.try_tick(0.06));
    }

    #[test]
    fn countdown_fires_once() {
        let mut timer = Countdown::new(1.0);

        assert!(!timer.tick(0.5)); // inactive

        timer.start();
        assert!(timer.is_active());
        assert!(!timer.tick(0.5));
        assert_eq!(timer.progress(), 0.5);

        assert!(timer.tick(0.6));
        assert!(!timer.is_active());
        assert!(!timer.tick(0.1));
        assert_eq!(timer.progress(), 1.0);
    }

    #[test]
    fn countdown_zero_duration() {
        let mut timer = Countdown::new(0.0);
        assert_eq!(timer.progress(), 1.0);
        timer.start();
        assert!(timer.tick(0.0));
    }

    #[test]
    fn countdown_ignores_negative_delta() {
        let mut timer = Countdown::new(1.0);
        timer.start();
        timer.tick(-5.0);
        assert_eq!(timer.progress(), 0.0);
    }
}
