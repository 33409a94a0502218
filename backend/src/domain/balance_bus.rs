//! Process-wide "balance updated" broadcast.
//!
//! The bus is created once at application start and handed to whoever needs
//! it; it is never torn down. Publishers (for example a reward-redemption
//! flow) announce the new balance, and every mounted balance tracker holds a
//! [`BalanceSubscription`] for as long as it is mounted.

use tokio::sync::broadcast;
use tracing::debug;

use super::Balance;

const DEFAULT_CAPACITY: usize = 16;

/// Multi-publisher, multi-subscriber balance announcements.
#[derive(Debug, Clone)]
pub struct BalanceBus {
    sender: broadcast::Sender<Balance>,
}

impl Default for BalanceBus {
    fn default() -> Self {
        Self::new()
    }
}

impl BalanceBus {
    /// Create a bus with the default buffer.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create a bus buffering up to `capacity` unread announcements per
    /// subscriber.
    ///
    /// # Panics
    ///
    /// Panics when `capacity` is zero.
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Announce a new balance. Returns how many subscribers were reached.
    ///
    /// Publishing with nobody subscribed is not an error.
    ///
    /// # Examples
    /// ```
    /// use ecobin::domain::{Balance, BalanceBus};
    ///
    /// let bus = BalanceBus::new();
    /// let balance = Balance::new(42.5).expect("valid balance");
    /// assert_eq!(bus.publish(balance), 0);
    /// ```
    pub fn publish(&self, balance: Balance) -> usize {
        match self.sender.send(balance) {
            Ok(receivers) => receivers,
            Err(_) => {
                debug!(balance = %balance, "balance update published without subscribers");
                0
            }
        }
    }

    /// Register a new listener. Dropping it deregisters.
    pub fn subscribe(&self) -> BalanceSubscription {
        BalanceSubscription {
            receiver: self.sender.subscribe(),
        }
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

/// A registered listener on the [`BalanceBus`].
#[derive(Debug)]
pub struct BalanceSubscription {
    receiver: broadcast::Receiver<Balance>,
}

impl BalanceSubscription {
    /// Wait for the next announcement.
    ///
    /// A subscriber that fell behind skips straight to the oldest retained
    /// value and keeps going, so the most recent announcement always wins.
    /// Returns `None` once every bus handle has been dropped.
    pub async fn next(&mut self) -> Option<Balance> {
        loop {
            match self.receiver.recv().await {
                Ok(balance) => return Some(balance),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    debug!(skipped, "balance subscriber lagged behind");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    //! Delivery coverage for the balance bus.

    use super::*;
    use rstest::rstest;

    fn balance(value: f64) -> Balance {
        Balance::new(value).expect("valid balance")
    }

    #[rstest]
    #[tokio::test]
    async fn every_subscriber_receives_announcements() {
        let bus = BalanceBus::new();
        let mut first = bus.subscribe();
        let mut second = bus.subscribe();

        assert_eq!(bus.publish(balance(10.0)), 2);

        assert_eq!(first.next().await, Some(balance(10.0)));
        assert_eq!(second.next().await, Some(balance(10.0)));
    }

    #[rstest]
    fn dropping_a_subscription_deregisters_it() {
        let bus = BalanceBus::new();
        let subscription = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 1);

        drop(subscription);
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[rstest]
    #[tokio::test]
    async fn lagging_subscriber_ends_on_latest_value() {
        let bus = BalanceBus::with_capacity(2);
        let mut subscription = bus.subscribe();
        for value in [1.0, 2.0, 3.0, 4.0] {
            bus.publish(balance(value));
        }

        assert_eq!(subscription.next().await, Some(balance(3.0)));
        assert_eq!(subscription.next().await, Some(balance(4.0)));
    }

    #[rstest]
    #[tokio::test]
    async fn subscription_closes_with_the_bus() {
        let bus = BalanceBus::new();
        let mut subscription = bus.subscribe();
        drop(bus);

        assert_eq!(subscription.next().await, None);
    }
}
