//! Monotonic stamps supplied by the host for `created_at` / `updated_at`.

use std::cell::Cell;

use serde::{Deserialize, Serialize};

pub trait Clock {
    fn now(&self) -> u64;
}

/// Wall-clock seconds since the Unix epoch.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> u64 {
        chrono::Utc::now().timestamp().max(0) as u64
    }
}

/// A clock that only moves when told to, like a ledger block height.
#[derive(Debug, Default)]
pub struct ManualClock {
    current: Cell<u64>,
}

impl ManualClock {
    pub fn new(start: u64) -> Self {
        Self {
            current: Cell::new(start),
        }
    }

    /// Move forward by `ticks` and return the new value.
    pub fn advance(&self, ticks: u64) -> u64 {
        let next = self.current.get().saturating_add(ticks);
        self.current.set(next);
        next
    }

    /// Jump to `value`; ignored if it would move the clock backwards.
    pub fn set(&self, value: u64) {
        if value > self.current.get() {
            self.current.set(value);
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> u64 {
        self.current.get()
    }
}

/// Which clock the CLI stamps records with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ClockKind {
    /// One tick per committed mutation, persisted alongside the ledger.
    #[default]
    BlockHeight,
    System,
}

impl std::fmt::Display for ClockKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClockKind::BlockHeight => write!(f, "block-height"),
            ClockKind::System => write!(f, "system"),
        }
    }
}

impl std::str::FromStr for ClockKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "block-height" | "height" => Ok(ClockKind::BlockHeight),
            "system" => Ok(ClockKind::System),
            _ => Err(format!("Invalid clock: {}", s)),
        }
    }
}
