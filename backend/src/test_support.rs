//! Test utilities for the ecobin crate.
//!
//! [`InMemoryDirectory`] implements every driven port in memory so unit tests
//! (in `src/`) and integration tests (in `tests/`) can drive the dashboard
//! without PostgreSQL. It can inject latency, per-user balance delays and
//! failures, and it counts calls so tests can assert that no fetch happened.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Local, Utc};
use mockable::{Clock, DefaultClock};

use crate::domain::ports::{
    NotificationRepository, NotificationRepositoryError, RewardLedger, RewardLedgerError,
    UserDirectory, UserDirectoryError,
};
use crate::domain::{
    Balance, DirectoryUser, DisplayName, EmailAddress, Notification, NotificationId, UserId,
};

/// Clock pinned to a single instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn local(&self) -> DateTime<Local> {
        self.0.with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        self.0
    }
}

#[derive(Default)]
struct DirectoryState {
    users: Vec<DirectoryUser>,
    notifications: Vec<Notification>,
    balances: HashMap<UserId, Balance>,
    rewards: HashMap<UserId, Balance>,
    balance_delays: HashMap<UserId, Duration>,
    next_user_id: i32,
    next_notification_id: i32,
}

#[derive(Default)]
struct Failures {
    lookups: bool,
    creates: bool,
    balances: bool,
    notifications: bool,
    mark_read: bool,
}

#[derive(Default)]
struct CallCounters {
    find_by_email: AtomicUsize,
    create: AtomicUsize,
    user_balance: AtomicUsize,
    available_rewards: AtomicUsize,
    unread_for_user: AtomicUsize,
    mark_read: AtomicUsize,
}

/// Number of calls each port method has received.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallSnapshot {
    /// `UserDirectory::find_by_email` calls.
    pub find_by_email: usize,
    /// `UserDirectory::create` calls.
    pub create: usize,
    /// `RewardLedger::user_balance` calls.
    pub user_balance: usize,
    /// `RewardLedger::available_rewards` calls.
    pub available_rewards: usize,
    /// `NotificationRepository::unread_for_user` calls.
    pub unread_for_user: usize,
    /// `NotificationRepository::mark_read` calls.
    pub mark_read: usize,
}

/// In-memory directory, ledger and notification store.
pub struct InMemoryDirectory {
    state: Mutex<DirectoryState>,
    failures: Mutex<Failures>,
    calls: CallCounters,
    clock: Arc<dyn Clock>,
    latency: Duration,
}

impl Default for InMemoryDirectory {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryDirectory {
    /// Empty store using the system clock and no latency.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(DefaultClock))
    }

    /// Empty store stamping records with `clock`.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Mutex::new(DirectoryState {
                next_user_id: 1,
                next_notification_id: 1,
                ..DirectoryState::default()
            }),
            failures: Mutex::new(Failures::default()),
            calls: CallCounters::default(),
            clock,
            latency: Duration::ZERO,
        }
    }

    /// Sleep for `latency` (on the tokio clock) before every port call.
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    fn state(&self) -> MutexGuard<'_, DirectoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn failures(&self) -> MutexGuard<'_, Failures> {
        self.failures.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn pause(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }

    fn insert_user(&self, email: &EmailAddress, name: &DisplayName) -> Option<DirectoryUser> {
        let mut state = self.state();
        if state.users.iter().any(|user| user.email() == email) {
            return None;
        }
        let id = UserId::new(state.next_user_id);
        state.next_user_id += 1;
        let user = DirectoryUser::new(id, email.clone(), name.clone(), self.clock.utc());
        state.users.push(user.clone());
        Some(user)
    }

    /// Register a user directly, bypassing the port.
    ///
    /// # Panics
    ///
    /// Panics if the email is already registered.
    pub fn seed_user(&self, email: &str, name: &str) -> DirectoryUser {
        let email = EmailAddress::new(email).unwrap_or_else(|err| panic!("seed email: {err}"));
        let name = DisplayName::new(name).unwrap_or_else(|err| panic!("seed name: {err}"));
        self.insert_user(&email, &name)
            .unwrap_or_else(|| panic!("{email} is already seeded"))
    }

    /// Set the ledger balance for `user_id`.
    pub fn set_balance(&self, user_id: UserId, balance: Balance) {
        self.state().balances.insert(user_id, balance);
    }

    /// Set the available-rewards total for `user_id`.
    pub fn set_available_rewards(&self, user_id: UserId, total: Balance) {
        self.state().rewards.insert(user_id, total);
    }

    /// Delay balance reads for `user_id` by `delay` on top of the latency.
    pub fn delay_balance_for(&self, user_id: UserId, delay: Duration) {
        self.state().balance_delays.insert(user_id, delay);
    }

    /// Store an unread notification and return its id.
    pub fn push_notification(&self, user_id: UserId, kind: &str, message: &str) -> NotificationId {
        let created_at = self.clock.utc();
        let mut state = self.state();
        let id = NotificationId::new(state.next_notification_id);
        state.next_notification_id += 1;
        state.notifications.push(Notification {
            id,
            user_id,
            message: message.to_owned(),
            kind: kind.to_owned(),
            is_read: false,
            created_at,
        });
        id
    }

    /// Stored notification by id, read or not.
    pub fn notification(&self, id: NotificationId) -> Option<Notification> {
        self.state()
            .notifications
            .iter()
            .find(|notification| notification.id == id)
            .cloned()
    }

    /// Number of stored users registered under `email`.
    pub fn users_with_email(&self, email: &EmailAddress) -> usize {
        self.state()
            .users
            .iter()
            .filter(|user| user.email() == email)
            .count()
    }

    /// Make directory lookups fail with a connection error.
    pub fn fail_lookups(&self, fail: bool) {
        self.failures().lookups = fail;
    }

    /// Make user creation fail with a connection error.
    pub fn fail_creates(&self, fail: bool) {
        self.failures().creates = fail;
    }

    /// Make ledger reads fail with a query error.
    pub fn fail_balances(&self, fail: bool) {
        self.failures().balances = fail;
    }

    /// Make notification reads fail with a query error.
    pub fn fail_notifications(&self, fail: bool) {
        self.failures().notifications = fail;
    }

    /// Make acknowledgment writes fail with a connection error.
    pub fn fail_mark_read(&self, fail: bool) {
        self.failures().mark_read = fail;
    }

    /// Calls received so far.
    pub fn calls(&self) -> CallSnapshot {
        let load = |counter: &AtomicUsize| counter.load(Ordering::SeqCst);
        CallSnapshot {
            find_by_email: load(&self.calls.find_by_email),
            create: load(&self.calls.create),
            user_balance: load(&self.calls.user_balance),
            available_rewards: load(&self.calls.available_rewards),
            unread_for_user: load(&self.calls.unread_for_user),
            mark_read: load(&self.calls.mark_read),
        }
    }
}

#[async_trait]
impl UserDirectory for InMemoryDirectory {
    async fn find_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<DirectoryUser>, UserDirectoryError> {
        self.calls.find_by_email.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        if self.failures().lookups {
            return Err(UserDirectoryError::connection("directory offline"));
        }
        Ok(self
            .state()
            .users
            .iter()
            .find(|user| user.email() == email)
            .cloned())
    }

    async fn create(
        &self,
        email: &EmailAddress,
        name: &DisplayName,
    ) -> Result<DirectoryUser, UserDirectoryError> {
        self.calls.create.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        if self.failures().creates {
            return Err(UserDirectoryError::connection("directory offline"));
        }
        self.insert_user(email, name)
            .ok_or_else(|| UserDirectoryError::duplicate(email.to_string()))
    }
}

#[async_trait]
impl RewardLedger for InMemoryDirectory {
    async fn user_balance(&self, user_id: UserId) -> Result<Balance, RewardLedgerError> {
        self.calls.user_balance.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        let delay = self.state().balance_delays.get(&user_id).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.failures().balances {
            return Err(RewardLedgerError::query("ledger aggregation failed"));
        }
        Ok(self
            .state()
            .balances
            .get(&user_id)
            .copied()
            .unwrap_or(Balance::ZERO))
    }

    async fn available_rewards(&self, user_id: UserId) -> Result<Balance, RewardLedgerError> {
        self.calls.available_rewards.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        if self.failures().balances {
            return Err(RewardLedgerError::query("ledger aggregation failed"));
        }
        Ok(self
            .state()
            .rewards
            .get(&user_id)
            .copied()
            .unwrap_or(Balance::ZERO))
    }
}

#[async_trait]
impl NotificationRepository for InMemoryDirectory {
    async fn unread_for_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<Notification>, NotificationRepositoryError> {
        self.calls.unread_for_user.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        if self.failures().notifications {
            return Err(NotificationRepositoryError::query("notification read failed"));
        }
        Ok(self
            .state()
            .notifications
            .iter()
            .filter(|notification| notification.user_id == user_id && !notification.is_read)
            .cloned()
            .collect())
    }

    async fn mark_read(&self, id: NotificationId) -> Result<(), NotificationRepositoryError> {
        self.calls.mark_read.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        if self.failures().mark_read {
            return Err(NotificationRepositoryError::connection("notification store offline"));
        }
        if let Some(notification) = self
            .state()
            .notifications
            .iter_mut()
            .find(|notification| notification.id == id)
        {
            notification.is_read = true;
        }
        Ok(())
    }
}
