//! Tests for notification polling cadence, cancellation and acknowledgment.

use std::sync::Arc;
use std::time::Duration;

use rstest::{fixture, rstest};
use tokio::time::{Instant, sleep, sleep_until};

use super::*;
use crate::domain::{DirectoryUser, ErrorCode};
use crate::test_support::InMemoryDirectory;

#[fixture]
fn store() -> Arc<InMemoryDirectory> {
    Arc::new(InMemoryDirectory::new())
}

fn mount(store: &Arc<InMemoryDirectory>) -> NotificationPoller {
    NotificationPoller::mount(
        UserDirectoryClient::new(store.clone()),
        store.clone(),
        PollerConfig::default(),
    )
}

fn seeded(store: &InMemoryDirectory) -> (DirectoryUser, NotificationId) {
    let user = store.seed_user("ada@example.com", "Ada Lovelace");
    let id = store.push_notification(user.id(), "Reward", "You earned 5 tokens");
    (user, id)
}

fn ids(poller: &NotificationPoller) -> Vec<NotificationId> {
    poller.list().iter().map(|notification| notification.id).collect()
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn polls_immediately_then_on_every_interval(store: Arc<InMemoryDirectory>) {
    let (user, id) = seeded(&store);
    let poller = mount(&store);
    let start = Instant::now();

    poller.identity_changed(Some(user.email()));
    sleep_until(start + Duration::from_secs(1)).await;
    assert_eq!(store.calls().unread_for_user, 1);
    assert_eq!(ids(&poller), vec![id]);

    sleep_until(start + Duration::from_secs(31)).await;
    assert_eq!(store.calls().unread_for_user, 2);

    sleep_until(start + Duration::from_secs(61)).await;
    assert_eq!(store.calls().unread_for_user, 3);

    poller.unmount();
    sleep(Duration::from_secs(120)).await;
    assert_eq!(store.calls().unread_for_user, 3);
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn identity_loss_clears_list_and_stops_polling(store: Arc<InMemoryDirectory>) {
    let (user, id) = seeded(&store);
    let poller = mount(&store);

    poller.identity_changed(Some(user.email()));
    sleep(Duration::from_secs(1)).await;
    assert_eq!(ids(&poller), vec![id]);
    assert!(poller.is_polling());

    poller.identity_changed(None);
    assert!(poller.list().is_empty());

    sleep(Duration::from_secs(90)).await;
    assert_eq!(store.calls().unread_for_user, 1);
    assert!(!poller.is_polling());
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn repeated_identity_keeps_the_running_poll(store: Arc<InMemoryDirectory>) {
    let (user, _) = seeded(&store);
    let poller = mount(&store);

    poller.identity_changed(Some(user.email()));
    poller.identity_changed(Some(user.email()));
    sleep(Duration::from_secs(1)).await;

    assert_eq!(store.calls().unread_for_user, 1);
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn fetch_failure_empties_the_list(store: Arc<InMemoryDirectory>) {
    let (user, id) = seeded(&store);
    let poller = mount(&store);
    poller.identity_changed(Some(user.email()));
    sleep(Duration::from_secs(1)).await;
    assert_eq!(ids(&poller), vec![id]);

    store.fail_notifications(true);
    sleep(Duration::from_secs(30)).await;

    assert!(poller.list().is_empty());
    assert_eq!(store.calls().unread_for_user, 2);
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn directory_outage_leaves_the_list_alone(store: Arc<InMemoryDirectory>) {
    let (user, id) = seeded(&store);
    let poller = mount(&store);
    poller.identity_changed(Some(user.email()));
    sleep(Duration::from_secs(1)).await;

    store.fail_lookups(true);
    sleep(Duration::from_secs(30)).await;

    assert_eq!(ids(&poller), vec![id]);
    assert_eq!(store.calls().unread_for_user, 1);
    assert_eq!(store.calls().find_by_email, 2);
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn unknown_user_is_not_polled(store: Arc<InMemoryDirectory>) {
    let poller = mount(&store);
    let email = EmailAddress::new("nobody@example.com").expect("valid email");

    poller.identity_changed(Some(&email));
    sleep(Duration::from_secs(1)).await;

    assert!(poller.list().is_empty());
    assert_eq!(store.calls().unread_for_user, 0);
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn acknowledge_hides_item_before_the_write_lands() {
    let store = Arc::new(InMemoryDirectory::new().with_latency(Duration::from_secs(1)));
    let (user, id) = seeded(&store);
    let poller = mount(&store);
    poller.identity_changed(Some(user.email()));
    sleep(Duration::from_secs(3)).await;
    assert_eq!(ids(&poller), vec![id]);

    let (acknowledged, observed) = tokio::join!(poller.acknowledge(id), async {
        sleep(Duration::from_millis(500)).await;
        let stored = store.notification(id).expect("stored");
        (ids(&poller), stored.is_read)
    });

    assert_eq!(observed, (Vec::new(), false));
    acknowledged.expect("write succeeds");
    assert!(store.notification(id).expect("stored").is_read);
    assert!(poller.list().is_empty());
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn failed_acknowledgment_is_not_rolled_back(store: Arc<InMemoryDirectory>) {
    let (user, id) = seeded(&store);
    let poller = mount(&store);
    poller.identity_changed(Some(user.email()));
    sleep(Duration::from_secs(1)).await;

    store.fail_mark_read(true);
    let error = poller.acknowledge(id).await.expect_err("write fails");

    assert_eq!(error.code(), ErrorCode::ServiceUnavailable);
    assert!(poller.list().is_empty());

    sleep(Duration::from_secs(30)).await;
    assert_eq!(ids(&poller), vec![id]);
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn acknowledging_an_unknown_id_still_writes(store: Arc<InMemoryDirectory>) {
    let poller = mount(&store);

    poller
        .acknowledge(NotificationId::new(404))
        .await
        .expect("write succeeds");

    assert_eq!(store.calls().mark_read, 1);
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn in_flight_poll_can_resurrect_an_acknowledged_item() {
    let store = Arc::new(InMemoryDirectory::new().with_latency(Duration::from_secs(1)));
    let (user, id) = seeded(&store);
    let poller = mount(&store);
    let start = Instant::now();
    poller.identity_changed(Some(user.email()));

    // Second poll resolves the user by t=31 and reads unread items at t=32.
    sleep_until(start + Duration::from_millis(31_500)).await;
    let (acknowledged, during) = tokio::join!(poller.acknowledge(id), async {
        sleep_until(start + Duration::from_millis(32_200)).await;
        ids(&poller)
    });
    acknowledged.expect("write succeeds");
    assert_eq!(during, vec![id]);

    sleep_until(start + Duration::from_secs(63)).await;
    assert!(poller.list().is_empty());
}
