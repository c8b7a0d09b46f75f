//! Key-based selection semantics.

use tabula_controller::{SelectionSet, SelectionTarget};
use tabula_core::{FetchRequest, QueryState, RowKey};

fn keys(ids: &[&str]) -> Vec<RowKey> {
    ids.iter().map(|id| RowKey::new(*id)).collect()
}

#[test]
fn test_toggle_adds_and_removes() {
    let mut set = SelectionSet::new();
    set.toggle(RowKey::new("7"));
    assert!(set.is_selected(&RowKey::new("7")));
    assert_eq!(set.count(100), 1);

    set.toggle(RowKey::new("7"));
    assert!(set.is_empty());
}

#[test]
fn test_toggle_all_selects_missing_then_clears() {
    let mut set = SelectionSet::new();
    let page = keys(&["1", "2", "3"]);
    set.toggle(RowKey::new("2"));
    set.toggle(RowKey::new("99"));

    set.toggle_all(&page);
    assert!(page.iter().all(|k| set.is_selected(k)));
    assert_eq!(set.count(0), 4);

    set.toggle_all(&page);
    assert!(page.iter().all(|k| !set.is_selected(k)));
    assert!(set.is_selected(&RowKey::new("99")));
}

#[test]
fn test_all_matching_tracks_exclusions() {
    let query = QueryState::default().with_search("ada");
    let mut set = SelectionSet::new();
    set.select_all_matching(query.filter_key());
    set.toggle(RowKey::new("4"));

    assert!(set.is_all_matching());
    assert!(!set.is_selected(&RowKey::new("4")));
    assert!(set.is_selected(&RowKey::new("5")));
    assert_eq!(set.count(40), 39);

    assert_eq!(
        set.target(&query.clone().with_page(3)),
        SelectionTarget::AllMatching {
            request: FetchRequest::from_query(&query.clone().with_page(3)),
            excluded: keys(&["4"]),
        }
    );

    set.toggle(RowKey::new("4"));
    assert_eq!(set.count(40), 40);
}

#[test]
fn test_filter_change_drops_all_matching() {
    let query = QueryState::default().with_search("ada");
    let mut set = SelectionSet::new();
    set.toggle(RowKey::new("1"));
    set.select_all_matching(query.filter_key());

    assert!(!set.sync_filter(&query.clone().with_page(9).filter_key()));
    assert!(set.is_all_matching());

    assert!(set.sync_filter(&query.with_search("grace").filter_key()));
    assert!(!set.is_all_matching());
    assert_eq!(set.target(&QueryState::default()), SelectionTarget::Keys(keys(&["1"])));
}

#[test]
fn test_clear() {
    let mut set = SelectionSet::new();
    set.toggle(RowKey::new("1"));
    set.select_all_matching(QueryState::default().filter_key());
    set.clear();
    assert!(set.is_empty());
    assert_eq!(set.count(10), 0);
}
