//! Property tests over generated records.

use proptest::prelude::*;
use tracelab_core::{Resolved, Strategy};
use tracelab_testkit::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn sequential_upserts_add_one_singer_per_key(
        records in distinct_records_strategy(12),
        atomic in any::<bool>(),
    ) {
        let lab = TestLab::new();
        let coordinator = lab.coordinator(99);
        let cx = lab.cx();
        let strategy = if atomic { Strategy::Atomic } else { Strategy::Independent };

        for r in &records {
            let outcome = coordinator
                .add_all(strategy, &cx, &r.first_name, &r.last_name, &r.album_title)
                .unwrap();
            prop_assert!(outcome.singer.was_created());
        }

        prop_assert_eq!(lab.singer_count(), records.len());
        prop_assert_eq!(lab.album_count(), records.len());
    }

    #[test]
    fn independent_upsert_is_idempotent(record in synthetic_record_strategy()) {
        let lab = TestLab::new();
        let coordinator = lab.coordinator(4);
        let cx = lab.cx();

        let first = coordinator
            .resolve_or_create_independent(&cx, &record.first_name, &record.last_name, &record.album_title)
            .unwrap();
        let second = coordinator
            .resolve_or_create_independent(&cx, &record.first_name, &record.last_name, &record.album_title)
            .unwrap();

        prop_assert_eq!(second.singer, Resolved::Existing(first.singer.id()));
        prop_assert_eq!(second.album_id(), first.album_id());
        prop_assert_eq!(lab.singer_count(), 1);
        prop_assert_eq!(lab.album_count(), 1);
    }

    #[test]
    fn resolver_finds_what_the_coordinator_created(record in synthetic_record_strategy()) {
        let lab = TestLab::new();
        let coordinator = lab.coordinator(12);
        let cx = lab.cx();

        let outcome = coordinator
            .resolve_or_create_atomic(&cx, &record.first_name, &record.last_name, &record.album_title)
            .unwrap();
        let resolver = coordinator.resolver();

        let singer = resolver.singer_id(&cx, None, &record.first_name, &record.last_name).unwrap();
        prop_assert_eq!(singer, outcome.singer.id());
        let album = resolver.album_id(&cx, None, singer, &record.album_title).unwrap();
        prop_assert_eq!(Some(album), outcome.album_id());
        let missing = resolver.album_id(&cx, None, singer, "not a title").unwrap_err();
        prop_assert!(missing.is_not_found());
    }

    #[test]
    fn generated_actions_round_trip_through_their_index(action in action_strategy()) {
        prop_assert_eq!(tracelab_core::Action::ALL[action.index()], action);
    }
}
