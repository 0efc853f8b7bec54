//! Identifier and outcome types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Surrogate key of a singer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SingerId(pub i64);

/// Surrogate key of an album, unique within its singer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AlbumId(pub i64);

impl fmt::Display for SingerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for AlbumId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How resolve-or-create obtained an id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Resolved<T> {
    /// The natural key already had a row.
    Existing(T),
    /// A row was inserted.
    Created(T),
}

impl<T: Copy> Resolved<T> {
    /// Returns the id either way.
    pub fn id(&self) -> T {
        match self {
            Self::Existing(id) | Self::Created(id) => *id,
        }
    }

    /// Returns true if a row was inserted.
    pub fn was_created(&self) -> bool {
        matches!(self, Self::Created(_))
    }
}

/// Result of one resolve-or-create call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpsertOutcome {
    /// The singer.
    pub singer: Resolved<SingerId>,
    /// The album; `None` when the atomic strategy found the singer and
    /// returned without looking at albums.
    pub album: Option<Resolved<AlbumId>>,
}

impl UpsertOutcome {
    /// Returns the album id, if the call got that far.
    #[must_use]
    pub fn album_id(&self) -> Option<AlbumId> {
        self.album.as_ref().map(Resolved::id)
    }

    /// Returns the number of rows the call inserted.
    #[must_use]
    pub fn rows_created(&self) -> usize {
        usize::from(self.singer.was_created())
            + usize::from(self.album.is_some_and(|a| a.was_created()))
    }
}
