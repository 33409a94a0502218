//! Mounted dashboard header and layout.
//!
//! A [`DashboardSession`] wires the three identity-keyed background tasks
//! (balance, notifications, total earnings) to one identity feed and keeps
//! the shell flags needed to compose the header.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tracing::{debug, info};

use super::balance_tracker::{BalanceState, BalanceTracker};
use super::directory_client::UserDirectoryClient;
use super::epoch::EpochGate;
use super::header::HeaderRender;
use super::notification_poller::{NotificationPoller, PollerConfig};
use super::ports::{NotificationRepository, RewardLedger, UserDirectory};
use super::shell::{Layout, ShellState};
use super::total_earnings::TotalEarnings;
use super::{Balance, BalanceBus, Error, IdentitySnapshot, Notification, NotificationId};

/// Driven adapters a session talks to.
#[derive(Clone)]
pub struct DashboardPorts {
    /// User directory.
    pub directory: Arc<dyn UserDirectory>,
    /// Reward ledger.
    pub ledger: Arc<dyn RewardLedger>,
    /// Notification store.
    pub notifications: Arc<dyn NotificationRepository>,
}

impl DashboardPorts {
    /// Use one adapter for every port.
    pub fn uniform<A>(adapter: Arc<A>) -> Self
    where
        A: UserDirectory + RewardLedger + NotificationRepository + 'static,
    {
        Self {
            directory: adapter.clone(),
            ledger: adapter.clone(),
            notifications: adapter,
        }
    }
}

/// Session tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    /// Notification polling cadence.
    pub poller: PollerConfig,
    /// Initial viewport width in CSS pixels.
    pub viewport_width: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            poller: PollerConfig::default(),
            viewport_width: 1280,
        }
    }
}

impl SessionConfig {
    /// Override the polling cadence.
    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poller.interval = interval;
        self
    }
}

/// Mounted dashboard.
pub struct DashboardSession {
    directory: UserDirectoryClient,
    balance: BalanceTracker,
    notifications: NotificationPoller,
    earnings: TotalEarnings,
    shell: Mutex<ShellState>,
    identity: Mutex<IdentitySnapshot>,
    gate: EpochGate,
}

impl DashboardSession {
    /// Mount every background task. Nothing is fetched until a loaded
    /// identity arrives.
    ///
    /// Must be called inside a tokio runtime.
    pub fn mount(ports: DashboardPorts, bus: &BalanceBus, config: SessionConfig) -> Self {
        let directory = UserDirectoryClient::new(ports.directory);
        info!(
            poll_interval_secs = config.poller.interval.as_secs(),
            "mounting dashboard session"
        );
        Self {
            balance: BalanceTracker::mount(directory.clone(), ports.ledger.clone(), bus),
            notifications: NotificationPoller::mount(
                directory.clone(),
                ports.notifications,
                config.poller,
            ),
            earnings: TotalEarnings::mount(directory.clone(), ports.ledger),
            directory,
            shell: Mutex::new(ShellState::new(config.viewport_width)),
            identity: Mutex::new(IdentitySnapshot::loading()),
            gate: EpochGate::new(),
        }
    }

    fn shell(&self) -> MutexGuard<'_, ShellState> {
        self.shell.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn identity(&self) -> MutexGuard<'_, IdentitySnapshot> {
        self.identity.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Feed a new identity snapshot.
    ///
    /// Snapshots that are still loading are recorded but trigger nothing.
    /// A signed-in identity is registered in the directory first; failure to
    /// do so does not stop the tasks. The identity is only forwarded if no
    /// later snapshot replaced it while registration was in flight.
    pub async fn identity_changed(&self, snapshot: IdentitySnapshot) {
        *self.identity() = snapshot.clone();
        if !snapshot.is_loaded {
            debug!("identity provider still loading");
            return;
        }

        let email = snapshot.resolvable_email();
        let Some(epoch) = self.gate.switch(email) else {
            debug!("identity unchanged");
            return;
        };

        if let (Some(email), Some(user)) = (email, snapshot.user.as_ref()) {
            let registered = self
                .directory
                .ensure_exists(email, &user.preferred_display_name())
                .await;
            if let Err(error) = registered {
                debug!(email = %email, error = %error, "continuing without directory registration");
            }
        }

        let forwarded = self.gate.apply_if_current(epoch, || {
            self.balance.identity_changed(email);
            self.notifications.identity_changed(email);
            self.earnings.identity_changed(email);
        });
        if forwarded.is_none() {
            debug!("identity replaced during registration");
        }
    }

    /// Acknowledge a notification from the dropdown.
    ///
    /// # Errors
    ///
    /// Returns the write failure; the item stays hidden regardless.
    pub async fn acknowledge(&self, id: NotificationId) -> Result<(), Error> {
        self.notifications.acknowledge(id).await
    }

    /// Re-read the balance for the current identity.
    pub fn refresh_balance(&self) {
        self.balance.refresh();
    }

    /// Flip the sidebar and return its new state.
    pub fn toggle_sidebar(&self) -> bool {
        self.shell().toggle_sidebar()
    }

    /// Re-evaluate the layout after a resize.
    pub fn set_viewport_width(&self, width: u32) {
        self.shell().set_viewport_width(width);
    }

    /// Current layout.
    pub fn layout(&self) -> Layout {
        self.shell().layout()
    }

    /// Balance tracker state.
    pub fn balance_state(&self) -> BalanceState {
        self.balance.state()
    }

    /// Balance on display.
    pub fn balance(&self) -> Balance {
        self.balance.displayed()
    }

    /// Total-earnings figure on display.
    pub fn total_earnings(&self) -> Balance {
        self.earnings.value()
    }

    /// Visible unread notifications.
    pub fn notifications(&self) -> Vec<Notification> {
        self.notifications.list()
    }

    /// Compose the header from the current state.
    pub fn header_view(&self) -> HeaderRender {
        let identity = self.identity().clone();
        let shell = *self.shell();
        HeaderRender::compose(
            &identity,
            shell,
            self.balance.displayed(),
            self.earnings.value(),
            &self.notifications.list(),
        )
    }

    /// Tear down every task and release the bus subscription.
    pub async fn unmount(self) {
        info!("unmounting dashboard session");
        let Self {
            balance,
            notifications,
            earnings,
            ..
        } = self;
        notifications.unmount();
        drop(earnings);
        balance.unmount().await;
    }
}
