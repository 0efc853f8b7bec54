//! Synthetic workload: user actions and records.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Singer first name prefixes.
pub const RANKS: &[&str] = &[
    "Private",
    "Brigadier",
    "Sergeant",
    "Captain",
    "Commander",
    "Chief",
    "Lieutenant",
    "Officer",
    "First Officer",
    "Major",
    "General",
    "Five Star General",
    "Admiral",
    "Rear Admiral",
    "Vice General",
];

/// Singer first name suffixes.
pub const INITIALS: &[&str] = &[
    "A", "B", "C", "D", "E", "F", "G", "H", "I", "J", "K", "L", "M", "N", "O", "P", "Q", "R", "S",
    "T", "U", "V", "W", "X", "Y", "Z",
];

/// Singer last name prefixes.
pub const SURNAMES: &[&str] = &[
    "Ryan",
    "General",
    "Major",
    "Zero",
    "Supreme",
    "Petty officer",
    "Governor",
    "In Charge",
    "Blunder",
    "Chaos",
];

/// Singer last name suffixes.
pub const GENERATIONS: &[&str] = &[
    "Junior", "II", "III", "IV", "V", "VI", "VII", "VIII", "IX", "X", "XI", "XII", "XIII", "XIV",
    "XV", "XVI", "XVII", "XVIII", "XIX", "XX",
];

/// Album title subjects.
pub const DESCRIPTORS: &[&str] = &[
    "Smoke",
    "Mist",
    "Rain",
    "Fog",
    "Thunder",
    "Lightening",
    "Frost",
    "Dew",
    "Snow",
    "Shadows",
    "Water",
    "Grass",
    "Trees",
    "Dust",
    "Wind",
    "Breeze",
    "Trash",
    "Graffiti",
    "Writing",
];

/// Album title places.
pub const LOCATIONS: &[&str] = &[
    "Water",
    "River",
    "Plains",
    "Road",
    "Mountain",
    "Hills",
    "Sea",
    "Bay",
    "Forest",
    "Highway",
    "Wall",
    "Blackboard",
];

/// One simulated user action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Action {
    /// Full album scan.
    QueryAlbums,
    /// Limited album scan.
    QueryLimit,
    /// Singers by first name.
    QuerySingersFirstName,
    /// Singers by last name through the last-name index.
    QuerySingersLastName,
    /// Singers joined with their albums.
    JoinSingerAlbum,
    /// Resolve-or-create with independent transactions.
    AddAllNoTransaction,
    /// Resolve-or-create in one transaction.
    AddAllSingleTransaction,
}

impl Action {
    /// Every action, in a fixed order.
    pub const ALL: [Action; 7] = [
        Action::QueryAlbums,
        Action::QueryLimit,
        Action::QuerySingersFirstName,
        Action::QuerySingersLastName,
        Action::JoinSingerAlbum,
        Action::AddAllNoTransaction,
        Action::AddAllSingleTransaction,
    ];

    /// Display name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Action::QueryAlbums => "QueryAlbums",
            Action::QueryLimit => "QueryLimit",
            Action::QuerySingersFirstName => "QuerySingersFirstName",
            Action::QuerySingersLastName => "QuerySingersLastName",
            Action::JoinSingerAlbum => "JoinSingerAlbum",
            Action::AddAllNoTransaction => "AddAllNoTransaction",
            Action::AddAllSingleTransaction => "AddAllSingleTransaction",
        }
    }

    /// Returns true for the read-only actions.
    #[must_use]
    pub const fn is_read(self) -> bool {
        !matches!(
            self,
            Action::AddAllNoTransaction | Action::AddAllSingleTransaction
        )
    }

    /// Position in [`Action::ALL`].
    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Picks an action uniformly at random.
pub fn next_action<R: Rng + ?Sized>(rng: &mut R) -> Action {
    Action::ALL[rng.gen_range(0..Action::ALL.len())]
}

/// Names for one resolve-or-create call.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SyntheticRecord {
    /// `"{rank} {initial}"`.
    pub first_name: String,
    /// `"{surname} {generation}"`.
    pub last_name: String,
    /// `"{descriptor} on the {location}"`.
    pub album_title: String,
}

impl SyntheticRecord {
    /// Creates a record from explicit names.
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        album_title: impl Into<String>,
    ) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            album_title: album_title.into(),
        }
    }
}

fn pick<'a, R: Rng + ?Sized>(rng: &mut R, words: &[&'a str]) -> &'a str {
    words[rng.gen_range(0..words.len())]
}

/// Composes a record from the vocabularies, each word drawn independently.
pub fn random_synthetic_record<R: Rng + ?Sized>(rng: &mut R) -> SyntheticRecord {
    let first_name = format!("{} {}", pick(rng, RANKS), pick(rng, INITIALS));
    let last_name = format!("{} {}", pick(rng, SURNAMES), pick(rng, GENERATIONS));
    let album_title = format!("{} on the {}", pick(rng, DESCRIPTORS), pick(rng, LOCATIONS));
    SyntheticRecord {
        first_name,
        last_name,
        album_title,
    }
}
