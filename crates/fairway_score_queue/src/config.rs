//! Backoff configuration for the score queue.

/// Backoff policy for transient dispatch failures.
///
/// The delay before an item's next attempt grows exponentially with its
/// failed attempt count, plus a small random jitter so a fleet of clients
/// coming back online does not retry in lockstep.
#[derive(Debug, Clone)]
pub struct BackoffPolicy {
    /// Delay after the first failed attempt, in milliseconds.
    pub base_delay_ms: u64,
    /// Multiplier applied per additional failed attempt.
    pub multiplier: f64,
    /// Upper bound of the additive random jitter, in milliseconds.
    pub jitter_ms: u64,
    /// Optional cap on the computed delay, in milliseconds.
    pub max_delay_ms: Option<u64>,
    /// Optional attempt ceiling; reaching it marks the item stuck.
    pub max_attempts: Option<u32>,
}

impl BackoffPolicy {
    /// Creates the default policy: 100ms base, doubling, up to 49ms of
    /// jitter, no delay cap, no attempt ceiling.
    pub fn new() -> Self {
        Self {
            base_delay_ms: 100,
            multiplier: 2.0,
            jitter_ms: 50,
            max_delay_ms: None,
            max_attempts: None,
        }
    }

    /// Sets the base delay.
    pub fn with_base_delay_ms(mut self, ms: u64) -> Self {
        self.base_delay_ms = ms;
        self
    }

    /// Sets the per-attempt multiplier.
    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }

    /// Sets the jitter bound. Zero disables jitter.
    pub fn with_jitter_ms(mut self, ms: u64) -> Self {
        self.jitter_ms = ms;
        self
    }

    /// Caps the computed delay.
    pub fn with_max_delay_ms(mut self, ms: u64) -> Self {
        self.max_delay_ms = Some(ms);
        self
    }

    /// Marks items stuck once their attempt count reaches the ceiling.
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = Some(attempts);
        self
    }

    /// Calculates the delay in milliseconds for a given attempt count,
    /// jitter excluded. Attempt 1 waits exactly the base delay.
    pub fn delay_for_attempt(&self, attempts: u32) -> u64 {
        if attempts == 0 {
            return 0;
        }

        let exponent = attempts.saturating_sub(1).min(i32::MAX as u32) as i32;
        let delay = self.base_delay_ms as f64 * self.multiplier.powi(exponent);
        let delay = match self.max_delay_ms {
            Some(cap) => delay.min(cap as f64),
            None => delay,
        };
        // Saturates at u64::MAX once the exponential overflows
        delay as u64
    }

    /// Converts a unit-interval random draw into additive jitter.
    pub fn jitter_for(&self, unit: f64) -> u64 {
        (unit * self.jitter_ms as f64).floor() as u64
    }
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self::new()
    }
}
