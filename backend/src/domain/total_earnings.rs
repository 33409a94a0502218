//! Total-earnings figure passed from the layout to the header.
//!
//! Read from [`RewardLedger::available_rewards`] whenever the identity
//! changes. Failures are logged and the previous figure stays, zero until
//! the first successful read.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, warn};

use super::balance_tracker::map_ledger_error;
use super::directory_client::UserDirectoryClient;
use super::epoch::{Epoch, EpochGate};
use super::ports::RewardLedger;
use super::{Balance, EmailAddress, Error};

struct EarningsInner {
    directory: UserDirectoryClient,
    ledger: Arc<dyn RewardLedger>,
    gate: EpochGate,
    total: watch::Sender<Balance>,
}

impl EarningsInner {
    async fn fetch(&self, epoch: Epoch, email: EmailAddress) {
        let outcome = self.load(&email).await;
        let applied = self.gate.apply_if_current(epoch, || match outcome {
            Ok(Some(total)) => {
                debug!(email = %email, total = %total, "total earnings fetched");
                self.total.send_replace(total);
            }
            Ok(None) => debug!(email = %email, "no directory user, keeping total earnings"),
            Err(error) => {
                warn!(email = %email, error = %error, "total earnings fetch failed");
            }
        });
        if applied.is_none() {
            debug!(email = %email, "discarding total earnings for superseded identity");
        }
    }

    async fn load(&self, email: &EmailAddress) -> Result<Option<Balance>, Error> {
        let Some(user) = self.directory.resolve(email).await? else {
            return Ok(None);
        };
        self.ledger
            .available_rewards(user.id())
            .await
            .map(Some)
            .map_err(map_ledger_error)
    }
}

/// Mounted total-earnings aggregation.
pub struct TotalEarnings {
    inner: Arc<EarningsInner>,
}

impl TotalEarnings {
    /// Mount at zero; nothing is fetched until an identity arrives.
    pub fn mount(directory: UserDirectoryClient, ledger: Arc<dyn RewardLedger>) -> Self {
        let (total, _) = watch::channel(Balance::ZERO);
        Self {
            inner: Arc::new(EarningsInner {
                directory,
                ledger,
                gate: EpochGate::new(),
                total,
            }),
        }
    }

    /// Fetch for a new identity. Losing the identity keeps the figure.
    ///
    /// Must be called inside a tokio runtime.
    pub fn identity_changed(&self, email: Option<&EmailAddress>) {
        let Some(epoch) = self.inner.gate.switch(email) else {
            return;
        };
        if let Some(email) = email {
            let inner = Arc::clone(&self.inner);
            let email = email.clone();
            tokio::spawn(async move { inner.fetch(epoch, email).await });
        }
    }

    /// Figure on display.
    pub fn value(&self) -> Balance {
        *self.inner.total.borrow()
    }

    /// Watch changes to the figure.
    pub fn subscribe(&self) -> watch::Receiver<Balance> {
        self.inner.total.subscribe()
    }
}

impl Drop for TotalEarnings {
    fn drop(&mut self) {
        self.inner.gate.close();
    }
}
