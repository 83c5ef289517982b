//! Optimistic concurrency.
//!
//! The engine only compares versions: a caller reads `(snapshot, version)`, hands
//! the version back to `apply_trade`, and a mismatch is rejected before anything
//! is computed. The atomic swap itself belongs to whoever stores snapshots.
//! `VersionedSlot` is the in-memory reference for that contract.

use crate::challenge::Challenge;
use std::sync::Mutex;

/// Stale version presented by a caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("version conflict: expected {expected}, found {actual}")]
pub struct VersionConflict {
    pub expected: u64,
    pub actual: u64,
}

/// Passes only when `expected == actual`.
pub fn ensure_version(expected: u64, actual: u64) -> Result<(), VersionConflict> {
    if expected == actual {
        Ok(())
    } else {
        Err(VersionConflict { expected, actual })
    }
}

pub trait Versioned {
    fn version(&self) -> u64;
}

impl Versioned for Challenge {
    fn version(&self) -> u64 {
        Challenge::version(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SwapError {
    #[error(transparent)]
    Conflict(#[from] VersionConflict),

    #[error("replacement must be version {expected}, got {actual}")]
    NotSuccessor { expected: u64, actual: u64 },
}

/// Compare-and-swap cell holding the latest snapshot of one aggregate.
#[derive(Debug)]
pub struct VersionedSlot<T> {
    inner: Mutex<T>,
}

impl<T: Versioned + Clone> VersionedSlot<T> {
    pub fn new(initial: T) -> Self {
        Self {
            inner: Mutex::new(initial),
        }
    }

    pub fn load(&self) -> T {
        self.lock().clone()
    }

    pub fn version(&self) -> u64 {
        self.lock().version()
    }

    /// Stores `next` only if the slot still holds `expected_version` and `next`
    /// is exactly one version ahead of it.
    pub fn compare_and_swap(&self, expected_version: u64, next: T) -> Result<(), SwapError> {
        let mut current = self.lock();
        ensure_version(expected_version, current.version())?;

        let successor = expected_version + 1;
        if next.version() != successor {
            return Err(SwapError::NotSuccessor {
                expected: successor,
                actual: next.version(),
            });
        }

        *current = next;
        Ok(())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, T> {
        // swaps are a single move, so a poisoned lock still holds a whole T
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
