//! Exports through a recording sink.

mod test_utils;

use serde_json::json;
use std::sync::Arc;
use tabula_controller::{ExportOptions, RemoteTable, TableCapabilities};
use tabula_error::{ExportError, ExportErrorKind, TabulaErrorKind};
use tabula_interface::{ExportColumn, ExportFormat, ExportRecord, ExportScope};
use test_utils::{MockSource, Person, RecordingSink, people, test_config};

fn mount_with_sink(
    source: Arc<MockSource>,
    sink: Arc<RecordingSink>,
    max_export_size: u64,
) -> RemoteTable<Person> {
    let caps = TableCapabilities::<Person>::new(source)
        .with_export_sink(sink)
        .with_export(ExportOptions::new("people").with_columns(vec![
            ExportColumn::new("id", "ID"),
            ExportColumn::new("name", "Name").with_width(30),
        ]));
    let config = test_config("people").with_max_export_size(max_export_size);
    RemoteTable::mount(config, caps).expect("mount")
}

fn export_kind(err: &tabula_error::TabulaError) -> ExportErrorKind {
    match err.kind() {
        TabulaErrorKind::Export(e) => e.kind().clone(),
        other => panic!("expected export error, got {:?}", other),
    }
}

#[tokio::test(start_paused = true)]
async fn test_export_selected_rows_from_several_pages() {
    let source = Arc::new(MockSource::new(people(25)));
    let sink = Arc::new(RecordingSink::default());
    let table = mount_with_sink(source.clone(), sink.clone(), 100);
    table.settled().await;
    table.toggle_row("2");
    table.set_page(3);
    table.settled().await;
    table.toggle_row("25");

    let count = table
        .export_rows(ExportFormat::Csv, ExportScope::Selected)
        .await
        .expect("export");
    assert_eq!(count, 2);

    let jobs = sink.jobs();
    assert_eq!(jobs.len(), 1);
    let job = &jobs[0];
    assert_eq!(job.entity_name(), "people");
    assert_eq!(job.headers(), vec!["ID", "Name"]);
    assert_eq!(*job.format(), ExportFormat::Csv);
    let names: Vec<_> = job.records().iter().map(|r| r["name"].clone()).collect();
    assert_eq!(names, vec![json!("person 002"), json!("person 025")]);
    assert!(job.records().iter().all(|r| !r.contains_key("team")));
}

#[tokio::test(start_paused = true)]
async fn test_export_filtered_and_all_scopes() {
    let source = Arc::new(MockSource::new(people(25)));
    let sink = Arc::new(RecordingSink::default());
    let table = mount_with_sink(source.clone(), sink.clone(), 100);
    table.set_column_filter("team", "odd");
    table.settled().await;

    let filtered = table
        .export_rows(ExportFormat::Xlsx, ExportScope::Filtered)
        .await
        .expect("export");
    assert_eq!(filtered, 13);
    let request = source.last_request().expect("request");
    assert_eq!(request.filter().get("team").map(String::as_str), Some("odd"));
    assert_eq!(*request.page(), 1);
    assert_eq!(*request.limit(), 100);

    let all = table
        .export_rows(ExportFormat::Xlsx, ExportScope::All)
        .await
        .expect("export");
    assert_eq!(all, 25);
    assert!(source.last_request().expect("request").filter().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_export_over_bound_writes_nothing() {
    let source = Arc::new(MockSource::new(people(25)));
    let sink = Arc::new(RecordingSink::default());
    let table = mount_with_sink(source.clone(), sink.clone(), 10);
    table.settled().await;

    let err = table
        .export_rows(ExportFormat::Csv, ExportScope::All)
        .await
        .expect_err("bounded");
    assert_eq!(
        export_kind(&err),
        ExportErrorKind::Bounds {
            requested: 25,
            limit: 10
        }
    );
    assert!(sink.jobs().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_export_all_matching_selection_counts_exclusions() {
    let source = Arc::new(MockSource::new(people(105)));
    let sink = Arc::new(RecordingSink::default());
    let table = mount_with_sink(source, sink.clone(), 100);
    table.settled().await;
    table.select_all_matching_filter();
    for id in 1..=5 {
        table.toggle_row(id.to_string());
    }

    let count = table
        .export_rows(ExportFormat::Csv, ExportScope::Selected)
        .await
        .expect("export");
    assert_eq!(count, 100);
    assert_eq!(sink.jobs()[0].records()[0]["id"], json!(6));
}

#[tokio::test(start_paused = true)]
async fn test_export_refuses_truncated_result() {
    let source = Arc::new(MockSource::new(people(25)).with_max_limit(20));
    let sink = Arc::new(RecordingSink::default());
    let table = mount_with_sink(source, sink.clone(), 100);
    table.settled().await;

    let err = table
        .export_rows(ExportFormat::Csv, ExportScope::Filtered)
        .await
        .expect_err("truncated");
    assert_eq!(
        export_kind(&err),
        ExportErrorKind::Incomplete {
            received: 20,
            expected: 25
        }
    );
    assert!(sink.jobs().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_export_disabled_or_without_sink() {
    let source = Arc::new(MockSource::new(people(5)));
    let config = test_config("people").with_enable_export(false);
    let table = RemoteTable::mount(config, TableCapabilities::<Person>::new(source.clone()))
        .expect("mount");
    let err = table
        .export_rows(ExportFormat::Csv, ExportScope::All)
        .await
        .expect_err("disabled");
    assert_eq!(export_kind(&err), ExportErrorKind::Disabled("people".into()));

    let table = RemoteTable::mount(
        test_config("people"),
        TableCapabilities::<Person>::new(source),
    )
    .expect("mount");
    let err = table
        .export_rows(ExportFormat::Csv, ExportScope::All)
        .await
        .expect_err("no sink");
    assert_eq!(export_kind(&err), ExportErrorKind::MissingSink);
}

#[tokio::test(start_paused = true)]
async fn test_custom_transform_and_sink_failure() {
    let source = Arc::new(MockSource::new(people(3)));
    let sink = Arc::new(RecordingSink::default());
    let caps = TableCapabilities::<Person>::new(source)
        .with_export_sink(sink.clone())
        .with_export(ExportOptions::new("people").with_transform(|p: &Person| {
            ExportRecord::from([("label".to_string(), json!(format!("#{} {}", p.id, p.name)))])
        }));
    let table = RemoteTable::mount(test_config("people"), caps).expect("mount");
    table.settled().await;

    sink.fail_with(ExportError::new(ExportErrorKind::Sink("disk full".into())));
    let err = table
        .export_rows(ExportFormat::Csv, ExportScope::All)
        .await
        .expect_err("sink failure");
    assert_eq!(export_kind(&err), ExportErrorKind::Sink("disk full".into()));

    table
        .export_rows(ExportFormat::Csv, ExportScope::All)
        .await
        .expect("export");
    let job = &sink.jobs()[0];
    assert_eq!(job.records()[0]["label"], json!("#1 person 001"));
}
