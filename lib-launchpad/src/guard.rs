//! Mutation guard
//!
//! One lock serializes every mutating operation. It is reentrant so that a
//! callback from a collaborator on the same thread reaches the in-flight flag
//! instead of deadlocking, and gets rejected there.

use std::cell::Cell;

use parking_lot::{ReentrantMutex, ReentrantMutexGuard};

use crate::errors::{LaunchResult, StateError};

pub(crate) type WriterLock = ReentrantMutex<Cell<bool>>;

pub(crate) struct MutationGuard<'a> {
    held: ReentrantMutexGuard<'a, Cell<bool>>,
}

impl<'a> MutationGuard<'a> {
    /// Block until no other thread is mutating; fail on same-thread re-entry
    pub(crate) fn acquire(lock: &'a WriterLock) -> LaunchResult<Self> {
        let held = lock.lock();
        if held.replace(true) {
            return Err(StateError::Reentrant.into());
        }
        Ok(Self { held })
    }
}

impl Drop for MutationGuard<'_> {
    fn drop(&mut self) {
        self.held.set(false);
    }
}
