//! Calibration mode gate
//!
//! Two states, `Locked` and `Unlocked`. Every persistent write checks the
//! gate first. The state is never persisted: a table always comes up
//! `Locked`, so a reset while calibrating fails closed.
//!
//! The gate is one shared flag, not a session lock. Two logical write
//! sequences interleaved under a single unlock both go through; it records
//! operator intent ("calibrating now"), it does not serialise writers.
//!
//! ```text
//!            enter (store unlocked)
//!   Locked ─────────────────────────▶ Unlocked
//!     ▲  ◀───────────────────────────   │
//!     │            exit                 │ enter: no-op
//!     └─ exit: no-op                    ▼
//! ```

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::errors::{CalError, CalResult};

/// Write access state of the calibration table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CalibrationMode {
    /// Writes rejected
    #[default]
    Locked,
    /// Writes accepted
    Unlocked,
}

/// Write-protection gate
#[derive(Debug, Clone, Default)]
pub struct CalibrationGate {
    mode: CalibrationMode,
}

impl CalibrationGate {
    /// New gate, locked
    pub const fn new() -> Self {
        Self { mode: CalibrationMode::Locked }
    }

    /// Current state
    pub fn mode(&self) -> CalibrationMode {
        self.mode
    }

    /// Whether writes are currently accepted
    pub fn is_unlocked(&self) -> bool {
        self.mode == CalibrationMode::Unlocked
    }

    /// Move to `Unlocked`. Returns `true` if the state changed.
    pub fn unlock(&mut self) -> bool {
        let changed = self.mode == CalibrationMode::Locked;
        self.mode = CalibrationMode::Unlocked;
        changed
    }

    /// Move to `Locked`. Returns `true` if the state changed.
    pub fn lock(&mut self) -> bool {
        let changed = self.mode == CalibrationMode::Unlocked;
        self.mode = CalibrationMode::Locked;
        changed
    }

    /// Admit a write, or reject it with [`CalError::AccessDenied`]
    pub fn check(&self) -> CalResult<()> {
        if self.is_unlocked() {
            Ok(())
        } else {
            Err(CalError::AccessDenied)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_locked() {
        let gate = CalibrationGate::new();
        assert_eq!(gate.mode(), CalibrationMode::Locked);
        assert_eq!(gate.check(), Err(CalError::AccessDenied));
    }

    #[test]
    fn transitions_are_idempotent() {
        let mut gate = CalibrationGate::new();
        assert!(gate.unlock());
        assert!(!gate.unlock());
        assert!(gate.check().is_ok());

        assert!(gate.lock());
        assert!(!gate.lock());
        assert!(!gate.is_unlocked());
    }
}
