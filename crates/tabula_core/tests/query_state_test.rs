//! Tests for query state, fetch requests and date parsing.

use chrono::NaiveDate;
use tabula_core::*;

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn test_default_state() {
    let query = QueryState::default();
    assert_eq!(query.page(), &1);
    assert_eq!(query.page_size(), &DEFAULT_PAGE_SIZE);
    assert!(query.search().is_empty());
    assert!(!query.is_filtered());
}

#[test]
fn test_setters_enforce_invariants() {
    let query = QueryState::default()
        .with_page(0)
        .with_page_size(0)
        .with_search("  padded  ")
        .with_date_range(Some(DateRange::cleared()));

    assert_eq!(query.page(), &1);
    assert_eq!(query.page_size(), &1);
    assert_eq!(query.search(), "padded");
    assert_eq!(query.date_range(), &None);
}

#[test]
fn test_date_range_swaps_reversed_bounds() {
    let range = DateRange::between(day(2024, 1, 31), day(2024, 1, 1));
    assert_eq!(range.from(), Some(day(2024, 1, 1)));
    assert_eq!(range.to(), Some(day(2024, 1, 31)));
    assert!(range.contains(day(2024, 1, 15)));
    assert!(!range.contains(day(2024, 2, 1)));
}

#[test]
fn test_fetch_request_is_deterministic() {
    let query = QueryState::default()
        .with_search("john   smith")
        .with_sort(Some("createdAt".to_string()), SortOrder::Desc)
        .with_date_range(Some(DateRange::between(day(2024, 1, 1), day(2024, 1, 31))))
        .with_filter("status", "active");

    let a = FetchRequest::from_query(&query);
    let b = FetchRequest::from(&query.clone());
    assert_eq!(a, b);
    assert_eq!(a.to_query_string(), b.to_query_string());

    let pairs = a.to_query_pairs();
    assert_eq!(
        pairs,
        vec![
            ("page", "1".to_string()),
            ("limit", "10".to_string()),
            ("search", "john smith".to_string()),
            ("from_date", "2024-01-01".to_string()),
            ("to_date", "2024-01-31".to_string()),
            ("sort_by", "createdAt".to_string()),
            ("sort_order", "desc".to_string()),
            ("filter", r#"{"status":"active"}"#.to_string()),
        ]
    );
}

#[test]
fn test_fetch_request_omits_empty_values() {
    let request = FetchRequest::from_query(&QueryState::default());
    assert_eq!(request.to_query_string(), "page=1&limit=10");
}

#[test]
fn test_all_matching_request_starts_at_first_page() {
    let query = QueryState::default().with_page(4).with_search("x");
    let request = FetchRequest::all_matching(&query, 500);
    assert_eq!(request.page(), &1);
    assert_eq!(request.limit(), &500);
    assert_eq!(request.search().as_deref(), Some("x"));
}

#[test]
fn test_filter_key_ignores_paging_and_sort() {
    let a = QueryState::default().with_search("x").with_page(2);
    let b = QueryState::default()
        .with_search("x")
        .with_sort(Some("name".to_string()), SortOrder::Asc);
    assert_eq!(a.filter_key(), b.filter_key());
    assert_ne!(a.filter_key(), b.with_search("y").filter_key());
}

#[test]
fn test_parse_day_formats() {
    assert_eq!(parse_day("2024-01-05"), Some(day(2024, 1, 5)));
    assert_eq!(parse_day("01/05/2024"), Some(day(2024, 1, 5)));
    assert_eq!(parse_day("Jan 05, 2024"), Some(day(2024, 1, 5)));
    assert_eq!(parse_day("Jan+05,+2024"), Some(day(2024, 1, 5)));
    assert_eq!(parse_day("2024-01-05T23:30:00+05:00"), Some(day(2024, 1, 5)));
    assert_eq!(parse_day("2024-01-05T10:00:00.000"), Some(day(2024, 1, 5)));
    assert_eq!(parse_day(""), None);
    assert_eq!(parse_day("31/31/2024"), None);
}

#[test]
fn test_offset_of_deserialized_page_zero() {
    let state: QueryState = serde_json::from_value(serde_json::to_value(
        QueryState::default().with_page_size(20),
    )
    .map(|mut v| {
        v["page"] = serde_json::json!(0);
        v
    })
    .unwrap())
    .unwrap();

    assert_eq!(*state.page(), 0);
    assert_eq!(state.offset(), 0);
}

#[test]
fn test_page_count() {
    let page = Page::new(vec![1, 2, 3], 53);
    assert_eq!(page.page_count(10), 6);
    assert_eq!(page.len(), 3);
    assert!(Page::<u8>::empty().is_empty());
}

#[test]
fn test_row_key_from_row() {
    let row = serde_json::json!({"id": 42, "uuid": "abc", "nested": {"id": 1}});
    assert_eq!(RowKey::from_row(&row, "id"), Some(RowKey::new("42")));
    assert_eq!(RowKey::from_row(&row, "uuid"), Some(RowKey::from("abc")));
    assert_eq!(RowKey::from_row(&row, "nested"), None);
    assert_eq!(RowKey::from_row(&row, "missing"), None);
    assert!(RowKey::positional(12).is_positional());
}

#[test]
fn test_positional_key_never_matches_hash_id() {
    let row = serde_json::json!({"id": "#12"});
    let key = RowKey::from_row(&row, "id").unwrap();

    assert!(!key.is_positional());
    assert_eq!(key.id(), Some("#12"));
    assert_ne!(key, RowKey::positional(12));
    assert_eq!(RowKey::positional(12).id(), None);
}

#[test]
fn test_column_layout_overrides() {
    let mut layout = ColumnLayout::new();
    layout.set_width("name", 240);
    layout.set_visible("email", false);
    layout.set_order(&["email", "name"]);

    assert_eq!(layout.width("name"), Some(240));
    assert!(!layout.is_visible("email"));
    assert!(!layout.all_visible());
    assert_eq!(
        layout.ordered(&["id", "name", "email", "phone"]),
        vec!["email", "name", "id", "phone"]
    );

    layout.reset_sizing();
    assert_eq!(layout.width("name"), None);
    layout.reset_order();
    assert_eq!(layout.ordered(&["id", "name", "email"]), vec!["id", "name", "email"]);
    layout.reset_visibility();
    assert!(layout.is_empty());
}
