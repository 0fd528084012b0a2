use serde::Deserialize;

/// Rate limiting applied to the register and login endpoints
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    /// Sustained auth requests allowed per client per minute
    pub requests_per_minute: u64,

    /// Requests a client may issue back to back before throttling
    pub burst_size: u32,
}

impl RateLimitConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.requests_per_minute == 0 || self.requests_per_minute > 60_000 {
            return Err("RATE_LIMIT_PER_MINUTE must be between 1 and 60000".to_string());
        }

        if self.burst_size == 0 {
            return Err("RATE_LIMIT_BURST must be greater than 0".to_string());
        }

        Ok(())
    }

    /// Interval between replenished permits, in milliseconds
    pub fn replenish_interval_ms(&self) -> u64 {
        (60_000 / self.requests_per_minute).max(1)
    }
}
