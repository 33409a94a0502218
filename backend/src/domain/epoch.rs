//! Identity epochs for discarding stale asynchronous results.
//!
//! Each background component owns an [`EpochGate`]. Every identity change
//! (or explicit restart) opens a new [`Epoch`]; fetches carry the epoch they
//! were started under and apply their result through
//! [`EpochGate::apply_if_current`], which runs under the same lock that
//! switches identities. A result can therefore never land after the identity
//! it was fetched for has been replaced.

use std::sync::{Mutex, MutexGuard, PoisonError};

use super::EmailAddress;

/// Generation tag handed to a spawned fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Epoch(u64);

#[derive(Debug, Default)]
struct EpochState {
    generation: u64,
    email: Option<EmailAddress>,
}

impl EpochState {
    fn advance(&mut self) -> Epoch {
        self.generation += 1;
        Epoch(self.generation)
    }
}

/// Identity-keyed epoch counter.
#[derive(Debug, Default)]
pub struct EpochGate {
    state: Mutex<EpochState>,
}

impl EpochGate {
    /// Create a gate with no identity.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, EpochState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Switch to `email`.
    ///
    /// Returns the new epoch when the identity actually changed, or `None`
    /// when `email` is already current so callers do not start a second
    /// fetch for the same identity.
    pub fn switch(&self, email: Option<&EmailAddress>) -> Option<Epoch> {
        let mut state = self.lock();
        if state.email.as_ref() == email {
            return None;
        }
        state.email = email.cloned();
        Some(state.advance())
    }

    /// Open a new epoch for the current identity, if there is one.
    pub fn restart(&self) -> Option<(Epoch, EmailAddress)> {
        let mut state = self.lock();
        let email = state.email.clone()?;
        Some((state.advance(), email))
    }

    /// Forget the identity and invalidate every outstanding epoch.
    pub fn close(&self) {
        let mut state = self.lock();
        state.email = None;
        state.advance();
    }

    /// Identity currently in force.
    pub fn current_email(&self) -> Option<EmailAddress> {
        self.lock().email.clone()
    }

    /// Whether results tagged with `epoch` may still be applied.
    pub fn is_current(&self, epoch: Epoch) -> bool {
        Epoch(self.lock().generation) == epoch
    }

    /// Run `apply` if `epoch` is still current, holding the gate meanwhile.
    pub fn apply_if_current<R>(&self, epoch: Epoch, apply: impl FnOnce() -> R) -> Option<R> {
        let state = self.lock();
        if Epoch(state.generation) != epoch {
            return None;
        }
        let result = apply();
        drop(state);
        Some(result)
    }
}
