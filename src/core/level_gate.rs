//! Shared minimum-severity threshold

use super::log_level::LogLevel;
use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

/// Atomically updatable minimum level.
///
/// Cloning a gate yields another handle to the same cell, so a level change
/// made through any handle is observed by all of them. A logger and every
/// child derived from it hold clones of one gate.
///
/// # Example
///
/// ```
/// use layerlog::{LevelGate, LogLevel};
///
/// let gate = LevelGate::new(LogLevel::Info);
/// let shared = gate.clone();
///
/// assert!(!shared.enabled(LogLevel::Debug));
/// gate.set_level(LogLevel::Debug);
/// assert!(shared.enabled(LogLevel::Debug));
/// ```
#[derive(Clone)]
pub struct LevelGate {
    level: Arc<AtomicU8>,
}

impl LevelGate {
    pub fn new(level: LogLevel) -> Self {
        Self {
            level: Arc::new(AtomicU8::new(level as u8)),
        }
    }

    #[inline]
    pub fn level(&self) -> LogLevel {
        LogLevel::from_u8(self.level.load(Ordering::Acquire))
    }

    pub fn set_level(&self, level: LogLevel) {
        self.level.store(level as u8, Ordering::Release);
    }

    #[inline]
    pub fn enabled(&self, level: LogLevel) -> bool {
        level as u8 >= self.level.load(Ordering::Acquire)
    }

    /// Whether both handles point at the same cell
    pub fn same_gate(&self, other: &LevelGate) -> bool {
        Arc::ptr_eq(&self.level, &other.level)
    }
}

impl Default for LevelGate {
    fn default() -> Self {
        Self::new(LogLevel::default())
    }
}

impl fmt::Debug for LevelGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LevelGate")
            .field("level", &self.level())
            .finish()
    }
}
