//! Time source
//!
//! The engine never calls `Utc::now()` directly; it asks a [`Clock`] so review
//! timestamps and feature gaps are reproducible in tests.

use chrono::{DateTime, Duration, Utc};
use std::sync::{Arc, Mutex};

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Settable clock; clones share the same instant
#[derive(Debug, Clone)]
pub struct FixedClock {
    current: Arc<Mutex<DateTime<Utc>>>,
}

impl FixedClock {
    pub fn at(instant: DateTime<Utc>) -> Self {
        Self {
            current: Arc::new(Mutex::new(instant)),
        }
    }

    pub fn set(&self, instant: DateTime<Utc>) {
        if let Ok(mut current) = self.current.lock() {
            *current = instant;
        }
    }

    pub fn advance(&self, by: Duration) {
        if let Ok(mut current) = self.current.lock() {
            *current += by;
        }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.current
            .lock()
            .map(|current| *current)
            .unwrap_or_else(|poisoned| *poisoned.into_inner())
    }
}
