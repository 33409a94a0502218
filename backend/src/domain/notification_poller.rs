//! Unread-notification polling with optimistic acknowledgment.
//!
//! While mounted with a resolved identity the poller fetches the user's
//! unread notifications immediately and then on a fixed interval (30 seconds
//! by default). The poll is cancelled when the identity goes away or the
//! poller is unmounted.
//!
//! Acknowledging a notification removes it from the visible set at once and
//! only then issues the write. There is no rollback: if the write fails the
//! item stays hidden until a later poll brings it back. A poll that was
//! already in flight when the acknowledgment happened can likewise re-add
//! the item; that race is accepted.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use super::directory_client::UserDirectoryClient;
use super::epoch::{Epoch, EpochGate};
use super::ports::{NotificationRepository, NotificationRepositoryError};
use super::{EmailAddress, Error, Notification, NotificationId};

/// Default delay between polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);

fn map_repository_error(error: NotificationRepositoryError) -> Error {
    match error {
        NotificationRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("notification store unavailable: {message}"))
        }
        NotificationRepositoryError::Query { message } => {
            Error::internal(format!("notification store error: {message}"))
        }
    }
}

/// Poller tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollerConfig {
    /// Delay between polls; the first poll runs immediately.
    pub interval: Duration,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

struct PollerInner {
    directory: UserDirectoryClient,
    repository: Arc<dyn NotificationRepository>,
    gate: EpochGate,
    visible: watch::Sender<Vec<Notification>>,
}

impl PollerInner {
    async fn poll(&self, epoch: Epoch, email: &EmailAddress) {
        let user = match self.directory.resolve(email).await {
            Ok(Some(user)) => user,
            Ok(None) => {
                debug!(email = %email, "no directory user yet, skipping notification poll");
                return;
            }
            Err(error) => {
                warn!(email = %email, error = %error, "directory unavailable, skipping notification poll");
                return;
            }
        };

        let fetched = self
            .repository
            .unread_for_user(user.id())
            .await
            .map_err(map_repository_error);
        let applied = self.gate.apply_if_current(epoch, || match fetched {
            Ok(unread) => {
                debug!(user_id = %user.id(), count = unread.len(), "notifications fetched");
                self.visible.send_replace(unread);
            }
            Err(error) => {
                warn!(user_id = %user.id(), error = %error, "notification fetch failed");
                self.visible.send_replace(Vec::new());
            }
        });
        if applied.is_none() {
            debug!(email = %email, "discarding notifications for superseded identity");
        }
    }

    async fn run(self: Arc<Self>, epoch: Epoch, email: EmailAddress, interval: Duration) {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            if !self.gate.is_current(epoch) {
                return;
            }
            self.poll(epoch, &email).await;
        }
    }
}

/// Mounted notification poller.
pub struct NotificationPoller {
    inner: Arc<PollerInner>,
    config: PollerConfig,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl NotificationPoller {
    /// Mount a poller. Nothing is fetched until an identity arrives.
    pub fn mount(
        directory: UserDirectoryClient,
        repository: Arc<dyn NotificationRepository>,
        config: PollerConfig,
    ) -> Self {
        let (visible, _) = watch::channel(Vec::new());
        Self {
            inner: Arc::new(PollerInner {
                directory,
                repository,
                gate: EpochGate::new(),
                visible,
            }),
            config,
            task: Mutex::new(None),
        }
    }

    fn replace_task(&self, task: Option<JoinHandle<()>>) {
        let previous = {
            let mut slot = self.task.lock().unwrap_or_else(PoisonError::into_inner);
            std::mem::replace(&mut *slot, task)
        };
        if let Some(previous) = previous {
            previous.abort();
        }
    }

    /// React to the resolved identity changing.
    ///
    /// A new identity cancels the running poll and starts a fresh one whose
    /// first fetch happens immediately. Losing the identity cancels polling
    /// and clears the visible set. Repeating the current identity is a no-op.
    ///
    /// Must be called inside a tokio runtime.
    pub fn identity_changed(&self, email: Option<&EmailAddress>) {
        let Some(epoch) = self.inner.gate.switch(email) else {
            return;
        };
        match email {
            Some(email) => {
                info!(email = %email, interval_secs = self.config.interval.as_secs(), "starting notification polling");
                let task = tokio::spawn(Arc::clone(&self.inner).run(
                    epoch,
                    email.clone(),
                    self.config.interval,
                ));
                self.replace_task(Some(task));
            }
            None => {
                info!("identity lost, stopping notification polling");
                self.replace_task(None);
                self.inner.visible.send_replace(Vec::new());
            }
        }
    }

    /// Locally cached visible set.
    pub fn list(&self) -> Vec<Notification> {
        self.inner.visible.borrow().clone()
    }

    /// Watch changes to the visible set.
    pub fn subscribe(&self) -> watch::Receiver<Vec<Notification>> {
        self.inner.visible.subscribe()
    }

    /// Acknowledge a notification.
    ///
    /// The item leaves the visible set before the write is issued.
    ///
    /// # Errors
    ///
    /// Returns the write failure after logging it. The local removal is not
    /// undone.
    pub async fn acknowledge(&self, id: NotificationId) -> Result<(), Error> {
        self.inner
            .visible
            .send_if_modified(|visible| {
                let before = visible.len();
                visible.retain(|notification| notification.id != id);
                visible.len() != before
            });

        self.inner
            .repository
            .mark_read(id)
            .await
            .map_err(map_repository_error)
            .inspect_err(|error| {
                warn!(notification_id = %id, error = %error, "failed to mark notification as read");
            })
    }

    /// Whether a poll loop is currently scheduled.
    pub fn is_polling(&self) -> bool {
        self.task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }

    /// Cancel polling and discard in-flight results.
    pub fn unmount(self) {
        drop(self);
    }
}

impl Drop for NotificationPoller {
    fn drop(&mut self) {
        self.inner.gate.close();
        self.replace_task(None);
    }
}

#[cfg(test)]
#[path = "notification_poller_tests.rs"]
mod tests;
