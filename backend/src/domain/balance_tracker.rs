//! Reward-token balance tracking for the dashboard header.
//!
//! State machine: `Uninitialized → Loading → Ready(v) → Ready(v') …`.
//!
//! - A new identity starts a fetch (resolve the directory user, then read the
//!   ledger). Success lands in `Ready(v)`; any failure settles on the last
//!   ready value, zero when there is none.
//! - Announcements on the [`BalanceBus`] move straight to `Ready(v)` without
//!   touching the ledger. The bus listener lives from [`BalanceTracker::mount`]
//!   until [`BalanceTracker::unmount`] (or drop).
//! - Fetch results are tagged with an identity epoch and dropped if the
//!   identity changed while they were in flight.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::directory_client::UserDirectoryClient;
use super::epoch::{Epoch, EpochGate};
use super::ports::{RewardLedger, RewardLedgerError};
use super::{Balance, BalanceBus, EmailAddress, Error};

pub(super) fn map_ledger_error(error: RewardLedgerError) -> Error {
    match error {
        RewardLedgerError::Connection { message } => {
            Error::service_unavailable(format!("reward ledger unavailable: {message}"))
        }
        RewardLedgerError::Query { message } => {
            Error::internal(format!("reward ledger error: {message}"))
        }
    }
}

/// Observable tracker state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum BalanceState {
    /// No identity has been seen yet.
    #[default]
    Uninitialized,
    /// A fetch is outstanding; `last` stays on screen meanwhile.
    Loading {
        /// Last ready value.
        last: Balance,
    },
    /// Settled value.
    Ready {
        /// Balance on display.
        value: Balance,
    },
}

impl BalanceState {
    /// Value to show: the ready value, the last one while loading, or zero.
    pub fn displayed(&self) -> Balance {
        match *self {
            Self::Uninitialized => Balance::ZERO,
            Self::Loading { last } => last,
            Self::Ready { value } => value,
        }
    }

    fn settled(self) -> Self {
        match self {
            Self::Uninitialized => Self::Uninitialized,
            Self::Loading { last } => Self::Ready { value: last },
            ready @ Self::Ready { .. } => ready,
        }
    }
}

struct TrackerInner {
    directory: UserDirectoryClient,
    ledger: Arc<dyn RewardLedger>,
    gate: EpochGate,
    state: watch::Sender<BalanceState>,
}

impl TrackerInner {
    fn start_fetch(self: &Arc<Self>, epoch: Epoch, email: EmailAddress) {
        self.state.send_modify(|state| {
            *state = BalanceState::Loading {
                last: state.displayed(),
            };
        });
        let inner = Arc::clone(self);
        tokio::spawn(async move { inner.fetch(epoch, email).await });
    }

    async fn fetch(&self, epoch: Epoch, email: EmailAddress) {
        let outcome = self.load_balance(&email).await;
        let applied = self.gate.apply_if_current(epoch, || match outcome {
            Ok(value) => {
                debug!(email = %email, balance = %value, "balance fetched");
                self.state.send_replace(BalanceState::Ready { value });
            }
            Err(error) => {
                warn!(email = %email, error = %error, "balance fetch failed, keeping last value");
                self.state.send_modify(|state| *state = state.settled());
            }
        });
        if applied.is_none() {
            debug!(email = %email, "discarding balance for superseded identity");
        }
    }

    async fn load_balance(&self, email: &EmailAddress) -> Result<Balance, Error> {
        let user = self
            .directory
            .resolve(email)
            .await?
            .ok_or_else(|| Error::not_found(format!("no directory user for {email}")))?;
        self.ledger
            .user_balance(user.id())
            .await
            .map_err(map_ledger_error)
    }

    fn apply_announcement(&self, value: Balance) {
        debug!(balance = %value, "balance announced");
        self.state.send_replace(BalanceState::Ready { value });
    }
}

/// Mounted balance tracker.
pub struct BalanceTracker {
    inner: Arc<TrackerInner>,
    listener: Option<JoinHandle<()>>,
}

impl BalanceTracker {
    /// Mount a tracker and register its bus listener.
    ///
    /// Must be called inside a tokio runtime.
    pub fn mount(
        directory: UserDirectoryClient,
        ledger: Arc<dyn RewardLedger>,
        bus: &BalanceBus,
    ) -> Self {
        let (state, _) = watch::channel(BalanceState::Uninitialized);
        let inner = Arc::new(TrackerInner {
            directory,
            ledger,
            gate: EpochGate::new(),
            state,
        });

        let mut subscription = bus.subscribe();
        let listener_inner = Arc::clone(&inner);
        let listener = tokio::spawn(async move {
            while let Some(value) = subscription.next().await {
                listener_inner.apply_announcement(value);
            }
        });

        Self {
            inner,
            listener: Some(listener),
        }
    }

    /// React to the resolved identity changing.
    ///
    /// Repeating the current identity is a no-op, so at most one fetch runs
    /// per identity. Losing the identity keeps the last value on screen and
    /// discards whatever is still in flight.
    pub fn identity_changed(&self, email: Option<&EmailAddress>) {
        let Some(epoch) = self.inner.gate.switch(email) else {
            return;
        };
        match email {
            Some(email) => self.inner.start_fetch(epoch, email.clone()),
            None => self.inner.state.send_modify(|state| *state = state.settled()),
        }
    }

    /// Re-read the balance for the current identity, superseding any fetch
    /// already in flight.
    pub fn refresh(&self) {
        if let Some((epoch, email)) = self.inner.gate.restart() {
            self.inner.start_fetch(epoch, email);
        }
    }

    /// Current state.
    pub fn state(&self) -> BalanceState {
        *self.inner.state.borrow()
    }

    /// Balance to display.
    pub fn displayed(&self) -> Balance {
        self.state().displayed()
    }

    /// Watch state transitions.
    pub fn subscribe(&self) -> watch::Receiver<BalanceState> {
        self.inner.state.subscribe()
    }

    /// Deregister the bus listener and discard outstanding fetches.
    ///
    /// Resolves once the listener has released its subscription. Dropping
    /// the tracker does the same without waiting.
    pub async fn unmount(mut self) {
        self.inner.gate.close();
        if let Some(listener) = self.listener.take() {
            listener.abort();
            match listener.await {
                Err(error) if !error.is_cancelled() => {
                    warn!(error = %error, "balance listener ended abnormally");
                }
                _ => {}
            }
        }
    }
}

impl Drop for BalanceTracker {
    fn drop(&mut self) {
        self.inner.gate.close();
        if let Some(listener) = self.listener.take() {
            listener.abort();
        }
    }
}

#[cfg(test)]
#[path = "balance_tracker_tests.rs"]
mod tests;
