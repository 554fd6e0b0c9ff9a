//! Connection status state machine.
//!
//! ```text
//!   success ──────────────► Connected
//!   Connected ─(window elapsed, no success)─► Stale
//!   failure (had success, below threshold) ─► Stale
//!   failure (never succeeded / threshold reached) ─► Disconnected
//! ```
//!
//! Any success returns straight to `Connected`. The monitor takes `now`
//! explicitly so transitions can be driven without a clock.

use std::fmt;

use chrono::{DateTime, Duration, Utc};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ConnectionStatus {
    Connected,
    Stale,
    #[default]
    Disconnected,
}

impl ConnectionStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Connected => "connected",
            Self::Stale => "stale",
            Self::Disconnected => "disconnected",
        }
    }
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct ConnectionMonitor {
    freshness_window: Duration,
    disconnect_after: u32,
    last_success: Option<DateTime<Utc>>,
    consecutive_failures: u32,
    status: ConnectionStatus,
}

impl ConnectionMonitor {
    /// `disconnect_after` is the number of consecutive failures that drop a
    /// previously healthy link to `Disconnected`; values below 1 act as 1.
    #[must_use]
    pub fn new(freshness_window: Duration, disconnect_after: u32) -> Self {
        Self {
            freshness_window,
            disconnect_after: disconnect_after.max(1),
            last_success: None,
            consecutive_failures: 0,
            status: ConnectionStatus::Disconnected,
        }
    }

    #[must_use]
    pub const fn status(&self) -> ConnectionStatus {
        self.status
    }

    #[must_use]
    pub const fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    #[must_use]
    pub const fn last_success(&self) -> Option<DateTime<Utc>> {
        self.last_success
    }

    pub fn record_success(&mut self, now: DateTime<Utc>) -> ConnectionStatus {
        self.last_success = Some(now);
        self.consecutive_failures = 0;
        self.status = ConnectionStatus::Connected;
        self.status
    }

    pub fn record_failure(&mut self) -> ConnectionStatus {
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        self.status = if self.last_success.is_none()
            || self.consecutive_failures >= self.disconnect_after
        {
            ConnectionStatus::Disconnected
        } else {
            ConnectionStatus::Stale
        };
        self.status
    }

    /// Age the status: `Connected` becomes `Stale` once the last success is
    /// older than the freshness window.
    pub fn evaluate(&mut self, now: DateTime<Utc>) -> ConnectionStatus {
        if self.status == ConnectionStatus::Connected
            && let Some(last) = self.last_success
            && now - last > self.freshness_window
        {
            self.status = ConnectionStatus::Stale;
        }
        self.status
    }
}
