// SPDX-License-Identifier: MIT

//! Tunables shared across the Launchpad, liveness sweeps, and the
//! Rapidfire driver, threaded in explicitly rather than read from a
//! global.

use std::time::Duration;

/// Default value for `RESERVATION_EXPIRATION_SECS`.
pub const DEFAULT_RESERVATION_EXPIRATION_SECS: u64 = 60 * 60 * 2;
/// Default value for `RUN_EXPIRATION_SECS`.
pub const DEFAULT_RUN_EXPIRATION_SECS: u64 = 60 * 60 * 2;
/// Default value for `PING_INTERVAL`.
pub const DEFAULT_PING_INTERVAL_SECS: u64 = 2 * 60;
/// Default TTL for a workflow's advisory lock.
pub const DEFAULT_LOCK_TTL_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct LaunchpadConfig {
    pub reservation_expiration_secs: u64,
    pub run_expiration_secs: u64,
    pub ping_interval_secs: u64,
    pub lock_ttl_secs: u64,
}

impl Default for LaunchpadConfig {
    fn default() -> Self {
        Self {
            reservation_expiration_secs: DEFAULT_RESERVATION_EXPIRATION_SECS,
            run_expiration_secs: DEFAULT_RUN_EXPIRATION_SECS,
            ping_interval_secs: DEFAULT_PING_INTERVAL_SECS,
            lock_ttl_secs: DEFAULT_LOCK_TTL_SECS,
        }
    }
}

impl LaunchpadConfig {
    pub fn lock_ttl(&self) -> Duration {
        Duration::from_secs(self.lock_ttl_secs)
    }

    pub fn reservation_expiration_secs(mut self, v: u64) -> Self {
        self.reservation_expiration_secs = v;
        self
    }

    pub fn run_expiration_secs(mut self, v: u64) -> Self {
        self.run_expiration_secs = v;
        self
    }

    pub fn ping_interval_secs(mut self, v: u64) -> Self {
        self.ping_interval_secs = v;
        self
    }

    pub fn lock_ttl_secs(mut self, v: u64) -> Self {
        self.lock_ttl_secs = v;
        self
    }
}
