//! Debouncer and synchronizer channel behavior on a paused clock.

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tabula_controller::{ChannelState, DateChange, Debouncer, QuerySynchronizer, Ticket};
use tabula_core::{DateRange, QueryState, SortOrder, UrlState};
use tabula_interface::{MemoryStateStore, StateStore};

const SEARCH: Duration = Duration::from_millis(500);
const DATES: Duration = Duration::from_millis(150);

fn day(d: u32) -> chrono::NaiveDate {
    chrono::NaiveDate::from_ymd_opt(2024, 3, d).expect("valid date")
}

fn synchronizer(store: Option<Arc<MemoryStateStore>>) -> QuerySynchronizer {
    let external = store.map(|s| s as Arc<dyn StateStore>);
    let (sync, rejected) = QuerySynchronizer::new(QueryState::default(), SEARCH, DATES, external);
    assert!(rejected.is_empty());
    sync
}

/// Collects the tickets delivered by elapsed timers.
fn recorder() -> (Arc<Mutex<Vec<Ticket>>>, impl Fn() -> Box<dyn FnOnce(Ticket) + Send>) {
    let fired = Arc::new(Mutex::new(Vec::new()));
    let sink = fired.clone();
    let make = move || {
        let sink = sink.clone();
        Box::new(move |ticket| sink.lock().push(ticket)) as Box<dyn FnOnce(Ticket) + Send>
    };
    (fired, make)
}

#[tokio::test(start_paused = true)]
async fn test_debouncer_fires_once_with_last_value() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let mut debouncer = Debouncer::new();

    for value in 1..=4 {
        let seen = seen.clone();
        debouncer.schedule(Duration::from_millis(300), move || seen.lock().push(value));
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    assert!(debouncer.is_pending());

    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(*seen.lock(), vec![4]);
    assert!(!debouncer.is_pending());
}

#[tokio::test(start_paused = true)]
async fn test_debouncer_cancel_and_drop_abort() {
    let fired = Arc::new(Mutex::new(0));

    let mut debouncer = Debouncer::new();
    let counter = fired.clone();
    debouncer.schedule(Duration::from_millis(100), move || *counter.lock() += 1);
    assert!(debouncer.cancel());
    assert!(!debouncer.cancel());

    let counter = fired.clone();
    debouncer.schedule(Duration::from_millis(100), move || *counter.lock() += 1);
    drop(debouncer);

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(*fired.lock(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_superseded_ticket_cannot_commit() {
    let mut sync = synchronizer(None);
    let (fired, make) = recorder();

    let first = sync.set_search("jo", make());
    let second = sync.set_search("john", make());
    assert_ne!(first, second);
    assert_eq!(sync.search_input(), "john");

    assert_eq!(sync.commit_search(first), None);
    let committed = sync.commit_search(second).expect("changed");
    assert_eq!(committed.search(), "john");
    assert_eq!(
        sync.search_channel().state(),
        &ChannelState::Committed { ticket: second }
    );

    tokio::time::sleep(SEARCH * 2).await;
    assert_eq!(*fired.lock(), vec![second]);
}

#[tokio::test(start_paused = true)]
async fn test_search_commit_resets_page_and_trims() {
    let mut sync = synchronizer(None);
    let (_, make) = recorder();
    sync.set_page(4);

    let ticket = sync.set_search("  ada  ", make());
    let query = sync.commit_search(ticket).expect("changed");
    assert_eq!(query.search(), "ada");
    assert_eq!(*query.page(), 1);

    let ticket = sync.set_search("ada", make());
    assert_eq!(sync.commit_search(ticket), None);
}

#[tokio::test(start_paused = true)]
async fn test_date_changes() {
    let mut sync = synchronizer(None);
    let (fired, make) = recorder();

    assert_eq!(
        sync.set_date_range(DateRange::new(Some(day(1)), None), make()),
        DateChange::Incomplete
    );
    assert!(!sync.has_pending_input());

    let reversed = DateRange::new(Some(day(9)), Some(day(2)));
    let DateChange::Scheduled(ticket) = sync.set_date_range(reversed, make()) else {
        panic!("expected scheduled commit");
    };
    assert!(sync.has_pending_input());
    assert_eq!(sync.date_input().from(), Some(day(2)));

    tokio::time::sleep(DATES * 2).await;
    assert_eq!(*fired.lock(), vec![ticket]);
    let query = sync.commit_date_range(ticket).expect("changed");
    assert_eq!(query.date_range(), &Some(DateRange::between(day(2), day(9))));

    match sync.set_date_range(DateRange::cleared(), make()) {
        DateChange::Committed(Some(query)) => assert!(query.date_range().is_none()),
        other => panic!("expected immediate commit, got {:?}", other),
    }
}

#[tokio::test(start_paused = true)]
async fn test_reset_clears_inputs_and_is_idempotent() {
    let mut sync = synchronizer(None);
    let (fired, make) = recorder();

    sync.set_sort(Some("name".into()), SortOrder::Asc);
    sync.set_column_filter("team", "odd");
    sync.set_search("pending", make());

    let query = sync.reset().expect("changed");
    assert_eq!(query, QueryState::default());
    assert_eq!(sync.search_input(), "");
    assert!(!sync.has_pending_input());
    assert_eq!(sync.reset(), None);

    tokio::time::sleep(SEARCH * 2).await;
    assert!(fired.lock().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_external_echo_is_suppressed() {
    let store = Arc::new(MemoryStateStore::new());
    let mut sync = synchronizer(Some(store.clone()));

    sync.set_page(2);
    assert_eq!(store.write_count(), 1);
    assert_eq!(sync.apply_external(&store.read()), None);

    let navigated = UrlState::from_query_string("page=5");
    let query = sync.apply_external(&navigated).expect("changed");
    assert_eq!(*query.page(), 5);
    assert_eq!(store.write_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_external_update_keeps_pending_local_search() {
    let mut sync = synchronizer(None);
    let (_, make) = recorder();

    sync.set_search("typing", make());
    let query = sync
        .apply_external(&UrlState::from_query_string("search=other&page=3"))
        .expect("changed");
    assert_eq!(query.search(), "");
    assert_eq!(*query.page(), 3);
    assert_eq!(sync.search_input(), "typing");
    assert!(sync.has_pending_input());

    sync.teardown();
    assert!(!sync.has_pending_input());
}
