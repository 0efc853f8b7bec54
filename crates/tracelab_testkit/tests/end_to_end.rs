//! End-to-end tests of the upsert strategies and read templates against a
//! fresh music store.

use tracelab_core::schema::{ALBUMS, ALBUM_ID, SINGERS, SINGER_ID};
use tracelab_core::{CoreError, QueryConfig, Queries, Resolved, Severity, Strategy};
use tracelab_store::{CallContext, CancellationToken, StoreError};
use tracelab_testkit::prelude::*;

#[test]
fn atomic_upsert_creates_singer_and_album() {
    let lab = TestLab::new();
    let coordinator = lab.coordinator(7);
    let cx = lab.cx();

    let outcome = coordinator
        .resolve_or_create_atomic(&cx, "Captain", "A", "Smoke on the Water")
        .unwrap();

    assert!(outcome.singer.was_created());
    assert!(matches!(outcome.album, Some(Resolved::Created(_))));
    assert_eq!(outcome.rows_created(), 2);
    assert_eq!(lab.singer_count(), 1);
    assert_eq!(lab.album_count(), 1);
    assert_eq!(lab.album_singer_ids(), vec![outcome.singer.id().0]);
    assert!(lab.sink.contains("2 record(s) inserted"));
}

#[test]
fn independent_upsert_creates_singer_and_album() {
    let lab = TestLab::new();
    let coordinator = lab.coordinator(7);
    let cx = lab.cx();

    let outcome = coordinator
        .resolve_or_create_independent(&cx, "Captain", "A", "Smoke on the Water")
        .unwrap();

    assert!(outcome.singer.was_created());
    assert!(outcome.album.is_some_and(|a| a.was_created()));
    assert_eq!(lab.singer_count(), 1);
    assert_eq!(lab.album_count(), 1);
    assert!(lab.sink.contains("1 singer record(s) inserted"));
    assert!(lab.sink.contains("1 album record(s) inserted"));
}

#[test]
fn repeated_independent_upsert_reuses_both_rows() {
    let lab = TestLab::new();
    let coordinator = lab.coordinator(7);
    let cx = lab.cx();

    let first = coordinator
        .resolve_or_create_independent(&cx, "Major B", "Smith IV", "Rain on the Roof")
        .unwrap();
    let second = coordinator
        .resolve_or_create_independent(&cx, "Major B", "Smith IV", "Rain on the Roof")
        .unwrap();

    assert_eq!(second.singer, Resolved::Existing(first.singer.id()));
    assert_eq!(second.album_id(), first.album_id());
    assert_eq!(second.rows_created(), 0);
    assert_eq!(lab.singer_count(), 1);
    assert_eq!(lab.album_count(), 1);
}

#[test]
fn atomic_upsert_of_known_singer_leaves_albums_alone() {
    let lab = TestLab::new();
    let coordinator = lab.coordinator(7);
    let cx = lab.cx();

    coordinator
        .resolve_or_create_atomic(&cx, "Captain", "A", "Smoke on the Water")
        .unwrap();
    let again = coordinator
        .resolve_or_create_atomic(&cx, "Captain", "A", "A different title")
        .unwrap();

    assert!(!again.singer.was_created());
    assert_eq!(again.album, None);
    assert_eq!(lab.album_count(), 1);
    assert!(lab.sink.contains("albums untouched"));
}

#[test]
fn atomic_upsert_of_known_singer_reads_once_and_writes_nothing() {
    let lab = TestLab::new();
    let coordinator = lab.coordinator(7);
    let cx = lab.cx();
    coordinator
        .resolve_or_create_atomic(&cx, "Captain", "A", "Smoke on the Water")
        .unwrap();

    let before = lab.store.stats();
    coordinator
        .resolve_or_create_atomic(&cx, "Captain", "A", "A different title")
        .unwrap();
    let after = lab.store.stats();

    // Only the singer lookup; the album table is never consulted.
    assert_eq!(after.queries - before.queries, 1);
    assert_eq!(after.updates, before.updates);
}

#[test]
fn independent_upsert_of_known_singer_still_checks_albums() {
    let lab = TestLab::new();
    let coordinator = lab.coordinator(7);
    let cx = lab.cx();
    coordinator
        .resolve_or_create_independent(&cx, "Captain", "A", "Smoke on the Water")
        .unwrap();

    let before = lab.store.stats();
    coordinator
        .resolve_or_create_independent(&cx, "Captain", "A", "A different title")
        .unwrap();
    let after = lab.store.stats();

    assert_eq!(after.queries - before.queries, 2);
    assert_eq!(after.updates - before.updates, 1);
}

#[test]
fn independent_upsert_adds_new_album_for_known_singer() {
    let lab = TestLab::new();
    let coordinator = lab.coordinator(7);
    let cx = lab.cx();

    let first = coordinator
        .resolve_or_create_independent(&cx, "Captain", "A", "Smoke on the Water")
        .unwrap();
    let second = coordinator
        .resolve_or_create_independent(&cx, "Captain", "A", "Snow on the Mountain")
        .unwrap();

    assert_eq!(second.singer.id(), first.singer.id());
    assert_ne!(second.album_id(), first.album_id());
    assert_eq!(lab.singer_count(), 1);
    assert_eq!(lab.album_count(), 2);
}

#[test]
fn distinct_keys_each_add_one_singer() {
    let lab = TestLab::new();
    let coordinator = lab.coordinator(11);
    let cx = lab.cx();

    for (i, strategy) in [Strategy::Atomic, Strategy::Independent]
        .into_iter()
        .cycle()
        .take(12)
        .enumerate()
    {
        coordinator
            .add_all(strategy, &cx, "Sergeant", &format!("Key {i}"), "Title")
            .unwrap();
    }

    assert_eq!(lab.singer_count(), 12);
    assert_eq!(lab.album_count(), 12);
    assert_eq!(coordinator.count_rows(&cx, SINGER_ID, SINGERS).unwrap(), 12);
    assert_eq!(coordinator.count_rows(&cx, ALBUM_ID, ALBUMS).unwrap(), 12);
}

#[test]
fn upsert_logs_are_correlated_with_a_trace() {
    let lab = TestLab::new();
    let coordinator = lab.coordinator(3);

    coordinator
        .resolve_or_create_atomic(&lab.cx(), "Captain", "A", "Smoke on the Water")
        .unwrap();

    let entries = lab.sink.at(Severity::Info);
    assert!(!entries.is_empty());
    for entry in entries {
        let trace = entry.trace.expect("entries inside a span carry a trace");
        assert!(trace.starts_with("projects/test-project/traces/"));
        assert!(entry.span_id.is_some());
    }
}

#[test]
fn queries_on_empty_store_find_nothing() {
    let lab = TestLab::new();
    let queries = lab.queries();
    let cx = lab.cx();
    let mut out: Vec<u8> = Vec::new();

    assert_eq!(queries.query_albums(&cx, &mut out).unwrap(), 0);
    assert_eq!(queries.query_albums_limit(&cx, &mut out).unwrap(), 0);
    assert_eq!(queries.query_singers_first_name(&cx, &mut out).unwrap(), 0);
    assert_eq!(queries.query_singers_last_name(&cx, &mut out).unwrap(), 0);
    assert_eq!(queries.join_singer_album(&cx, &mut out).unwrap(), 0);
    assert!(out.is_empty());
    assert!(lab.sink.contains("0 record(s) found"));
    assert_eq!(lab.store.active_snapshots(), 0);
}

#[test]
fn queries_see_upserted_rows() {
    let lab = TestLab::new();
    let coordinator = lab.coordinator(5);
    let cx = lab.cx();
    coordinator
        .resolve_or_create_atomic(&cx, "Captain", "A", "Smoke on the Water")
        .unwrap();
    coordinator
        .resolve_or_create_atomic(&cx, "Major Q", "Zero", "Fire on the Lake")
        .unwrap();

    let queries = lab.queries();
    let mut out: Vec<u8> = Vec::new();
    assert_eq!(queries.query_albums(&cx, &mut out).unwrap(), 2);
    assert_eq!(queries.query_singers_first_name(&cx, &mut out).unwrap(), 1);
    assert_eq!(queries.query_singers_last_name(&cx, &mut out).unwrap(), 1);
    assert_eq!(queries.join_singer_album(&cx, &mut out).unwrap(), 2);

    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("Smoke on the Water"));
    assert!(text.contains("Fire on the Lake"));
}

#[test]
fn first_name_lookup_is_exact_match() {
    let lab = TestLab::new();
    let coordinator = lab.coordinator(5);
    let cx = lab.cx();
    coordinator
        .resolve_or_create_atomic(&cx, "Captain Q", "Smith", "Title")
        .unwrap();

    let mut out: Vec<u8> = Vec::new();
    assert_eq!(lab.queries().query_singers_first_name(&cx, &mut out).unwrap(), 0);

    let custom = Queries::new(
        &lab.store,
        lab.log.clone(),
        QueryConfig::default().first_name("Captain Q"),
    );
    assert_eq!(custom.query_singers_first_name(&cx, &mut out).unwrap(), 1);
}

#[test]
fn album_limit_caps_rows() {
    let lab = TestLab::new();
    let coordinator = lab.coordinator(9);
    let cx = lab.cx();
    for i in 0..15 {
        coordinator
            .resolve_or_create_atomic(&cx, "Private", &format!("P{i}"), "Title")
            .unwrap();
    }

    let mut out: Vec<u8> = Vec::new();
    assert_eq!(lab.queries().query_albums_limit(&cx, &mut out).unwrap(), 10);

    let three = Queries::new(&lab.store, lab.log.clone(), QueryConfig::default().album_limit(3));
    assert_eq!(three.query_albums_limit(&cx, &mut out).unwrap(), 3);
    assert_eq!(three.query_albums(&cx, &mut out).unwrap(), 15);
}

#[test]
fn cancelled_calls_fail_with_a_store_error_and_write_nothing() {
    let lab = TestLab::new();
    let coordinator = lab.coordinator(13);
    let token = CancellationToken::new();
    let cx = lab
        .cx()
        .with_call(CallContext::new().with_cancellation(token.clone()));
    token.cancel();

    for strategy in [Strategy::Atomic, Strategy::Independent] {
        let err = coordinator
            .add_all(strategy, &cx, "Captain", "A", "Smoke on the Water")
            .unwrap_err();
        assert!(matches!(err, CoreError::Store(StoreError::Cancelled)), "{err}");
    }
    assert_eq!(lab.singer_count(), 0);
    assert_eq!(lab.album_count(), 0);
}
