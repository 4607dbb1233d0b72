use std::time::Duration;

/// Lifecycle of the live connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Open,
    /// Waiting this long before the next connection attempt.
    Backoff(Duration),
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BackoffConfig {
    pub min_delay: Duration,
    pub max_delay: Duration,
    pub growth: f64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            min_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(10),
            growth: 1.3,
        }
    }
}

impl BackoffConfig {
    /// Delay before retry number `failures` (0-based): `min * growth^n`, capped.
    pub fn delay_for(&self, failures: u32) -> Duration {
        let growth = if self.growth.is_finite() { self.growth.max(1.0) } else { 1.0 };
        let max = self.max_delay.max(self.min_delay);
        let exponent = failures.min(i32::MAX as u32) as i32;
        let secs = self.min_delay.as_secs_f64() * growth.powi(exponent);
        if !secs.is_finite() || secs >= max.as_secs_f64() {
            return max;
        }
        Duration::from_secs_f64(secs)
    }
}

/// Reconnection state machine. `Closed` is terminal.
#[derive(Debug, Clone)]
pub struct Reconnector {
    config: BackoffConfig,
    state: ConnectionState,
    failures: u32,
}

impl Reconnector {
    pub fn new(config: BackoffConfig) -> Self {
        Self {
            config,
            state: ConnectionState::Connecting,
            failures: 0,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn failures(&self) -> u32 {
        self.failures
    }

    /// Connection established; the backoff starts over.
    pub fn opened(&mut self) -> ConnectionState {
        if self.state == ConnectionState::Connecting {
            self.state = ConnectionState::Open;
            self.failures = 0;
        }
        self.state
    }

    /// Connection failed or was lost. Returns the wait before the next
    /// attempt, or `None` once closed.
    pub fn dropped(&mut self) -> Option<Duration> {
        match self.state {
            ConnectionState::Closed => None,
            ConnectionState::Backoff(delay) => Some(delay),
            ConnectionState::Connecting | ConnectionState::Open => {
                let delay = self.config.delay_for(self.failures);
                self.failures = self.failures.saturating_add(1);
                self.state = ConnectionState::Backoff(delay);
                Some(delay)
            }
        }
    }

    /// Backoff elapsed; returns false when there is nothing to retry.
    pub fn retry(&mut self) -> bool {
        if matches!(self.state, ConnectionState::Backoff(_)) {
            self.state = ConnectionState::Connecting;
            true
        } else {
            false
        }
    }

    pub fn close(&mut self) {
        self.state = ConnectionState::Closed;
    }
}
