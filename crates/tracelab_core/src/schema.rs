//! The music schema: singers and their albums.

use tracelab_store::{ColumnType, MemoryStore, Schema, StoreConfig, TableDef};

/// Singers table.
pub const SINGERS: &str = "Singers";
/// Albums table.
pub const ALBUMS: &str = "Albums";

/// Singer surrogate key column (also the album foreign key).
pub const SINGER_ID: &str = "SingerId";
/// Singer first name column.
pub const FIRST_NAME: &str = "FirstName";
/// Singer last name column.
pub const LAST_NAME: &str = "LastName";
/// Album surrogate key column.
pub const ALBUM_ID: &str = "AlbumId";
/// Album title column.
pub const ALBUM_TITLE: &str = "AlbumTitle";

/// Secondary index on singer first names.
pub const SINGERS_BY_FIRST_NAME: &str = "SingersByFirstName";
/// Secondary index on singer last names.
pub const SINGERS_BY_LAST_NAME: &str = "SingersByLastName";

/// Builds the schema.
///
/// ```text
/// Singers(SingerId INT64, FirstName STRING, LastName STRING) PRIMARY KEY (SingerId)
/// Albums(SingerId INT64, AlbumId INT64, AlbumTitle STRING) PRIMARY KEY (SingerId, AlbumId)
///   FOREIGN KEY (SingerId) REFERENCES Singers (SingerId)
/// ```
#[must_use]
pub fn music_schema() -> Schema {
    Schema::new()
        .with_table(
            TableDef::new(SINGERS)
                .with_column(SINGER_ID, ColumnType::Int64)
                .with_column(FIRST_NAME, ColumnType::String)
                .with_column(LAST_NAME, ColumnType::String)
                .with_primary_key([SINGER_ID])
                .with_index(SINGERS_BY_FIRST_NAME, [FIRST_NAME])
                .with_index(SINGERS_BY_LAST_NAME, [LAST_NAME]),
        )
        .with_table(
            TableDef::new(ALBUMS)
                .with_column(SINGER_ID, ColumnType::Int64)
                .with_column(ALBUM_ID, ColumnType::Int64)
                .with_column(ALBUM_TITLE, ColumnType::String)
                .with_primary_key([SINGER_ID, ALBUM_ID])
                .with_foreign_key(SINGER_ID, SINGERS, SINGER_ID),
        )
}

/// Creates an empty in-memory store with the music schema.
#[must_use]
pub fn music_store(config: StoreConfig) -> MemoryStore {
    MemoryStore::new(music_schema(), config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tables_and_keys() {
        let schema = music_schema();
        let singers = schema.table(SINGERS).unwrap();
        assert_eq!(singers.primary_key, [SINGER_ID]);
        assert!(singers.index(SINGERS_BY_LAST_NAME).is_ok());

        let albums = schema.table(ALBUMS).unwrap();
        assert_eq!(albums.primary_key, [SINGER_ID, ALBUM_ID]);
        assert_eq!(albums.foreign_keys[0].references_table, SINGERS);
    }

    #[test]
    fn fresh_store_is_empty() {
        let store = music_store(StoreConfig::default());
        assert_eq!(store.row_count(SINGERS).unwrap(), 0);
        assert_eq!(store.row_count(ALBUMS).unwrap(), 0);
    }
}
