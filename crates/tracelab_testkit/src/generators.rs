//! Property-based test generators using proptest.
//!
//! Records are built from the same vocabularies the workload draws from,
//! so every generated value is one the simulator could produce.

use proptest::prelude::*;
use proptest::sample::select;
use std::collections::HashSet;
use tracelab_core::workload::{DESCRIPTORS, GENERATIONS, INITIALS, LOCATIONS, RANKS, SURNAMES};
use tracelab_core::{Action, SyntheticRecord};

/// Strategy for generating singer first names.
pub fn first_name_strategy() -> impl Strategy<Value = String> {
    (select(RANKS), select(INITIALS)).prop_map(|(rank, initial)| format!("{rank} {initial}"))
}

/// Strategy for generating singer last names.
pub fn last_name_strategy() -> impl Strategy<Value = String> {
    (select(SURNAMES), select(GENERATIONS))
        .prop_map(|(surname, generation)| format!("{surname} {generation}"))
}

/// Strategy for generating album titles.
pub fn album_title_strategy() -> impl Strategy<Value = String> {
    (select(DESCRIPTORS), select(LOCATIONS))
        .prop_map(|(descriptor, location)| format!("{descriptor} on the {location}"))
}

/// Strategy for generating synthetic records.
pub fn synthetic_record_strategy() -> impl Strategy<Value = SyntheticRecord> {
    (
        first_name_strategy(),
        last_name_strategy(),
        album_title_strategy(),
    )
        .prop_map(|(first, last, title)| SyntheticRecord::new(first, last, title))
}

/// Strategy for generating up to `max` records with pairwise distinct
/// singer keys.
pub fn distinct_records_strategy(max: usize) -> impl Strategy<Value = Vec<SyntheticRecord>> {
    prop::collection::vec(synthetic_record_strategy(), 1..=max).prop_map(|records| {
        let mut seen = HashSet::new();
        records
            .into_iter()
            .filter(|r| seen.insert((r.first_name.clone(), r.last_name.clone())))
            .collect()
    })
}

/// Strategy for generating actions.
pub fn action_strategy() -> impl Strategy<Value = Action> {
    select(Action::ALL.to_vec())
}

/// Returns true if `value` is `"{a} {b}"` with `a` from `left` and `b`
/// from `right`.
pub fn composed_of(value: &str, left: &[&str], separator: &str, right: &[&str]) -> bool {
    left.iter().any(|a| {
        value
            .strip_prefix(a)
            .and_then(|rest| rest.strip_prefix(separator))
            .is_some_and(|b| right.contains(&b))
    })
}

/// Returns true if every field of `record` is composed from the vocabularies.
pub fn is_vocabulary_record(record: &SyntheticRecord) -> bool {
    composed_of(&record.first_name, RANKS, " ", INITIALS)
        && composed_of(&record.last_name, SURNAMES, " ", GENERATIONS)
        && composed_of(&record.album_title, DESCRIPTORS, " on the ", LOCATIONS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn composition_check_accepts_multi_word_entries() {
        assert!(composed_of("Five Star General Q", RANKS, " ", INITIALS));
        assert!(composed_of("Petty officer XX", SURNAMES, " ", GENERATIONS));
        assert!(!composed_of("Captain", RANKS, " ", INITIALS));
        assert!(!composed_of("Captain AA", RANKS, " ", INITIALS));
    }

    proptest! {
        #[test]
        fn generated_records_use_the_vocabularies(record in synthetic_record_strategy()) {
            prop_assert!(is_vocabulary_record(&record));
        }

        #[test]
        fn distinct_records_have_distinct_keys(records in distinct_records_strategy(20)) {
            let keys: HashSet<_> = records
                .iter()
                .map(|r| (r.first_name.as_str(), r.last_name.as_str()))
                .collect();
            prop_assert_eq!(keys.len(), records.len());
            prop_assert!(!records.is_empty());
        }
    }
}
