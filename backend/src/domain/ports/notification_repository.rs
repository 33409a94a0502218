//! Port abstraction for notification persistence.
use async_trait::async_trait;

use crate::domain::{Notification, NotificationId, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by notification repository adapters.
    pub enum NotificationRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "notification repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "notification repository query failed: {message}",
    }
}

/// Unread-notification reads and acknowledgment writes.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationRepository: Send + Sync {
    /// All unread notifications for `user_id`, in insertion order.
    async fn unread_for_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<Notification>, NotificationRepositoryError>;

    /// Mark a notification as read. Already-read or unknown ids are a no-op.
    async fn mark_read(&self, id: NotificationId) -> Result<(), NotificationRepositoryError>;
}
