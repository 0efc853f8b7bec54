//! Read templates.
//!
//! Each query runs in its own span and read-only transaction, writes one
//! line per row to the caller's writer, logs the row count and returns it.
//! The snapshot is released when the transaction goes out of scope, on
//! success and on every error path.

use crate::applog::AppLog;
use crate::config::QueryConfig;
use crate::context::Context;
use crate::error::CoreResult;
use crate::schema::{
    ALBUMS, ALBUM_ID, ALBUM_TITLE, FIRST_NAME, LAST_NAME, SINGERS, SINGERS_BY_LAST_NAME,
    SINGER_ID,
};
use std::io::Write;
use tracelab_store::{ReadContext, Row, Statement, StoreGateway, StoreResult};

/// Runs the read templates against a store.
pub struct Queries<'g, G> {
    gateway: &'g G,
    log: AppLog,
    config: QueryConfig,
}

impl<'g, G: StoreGateway> Queries<'g, G> {
    /// Creates the read templates over `gateway`.
    pub fn new(gateway: &'g G, log: AppLog, config: QueryConfig) -> Self {
        Self {
            gateway,
            log,
            config,
        }
    }

    /// Returns the literals the templates use.
    pub fn config(&self) -> &QueryConfig {
        &self.config
    }

    /// Every album.
    pub fn query_albums(&self, cx: &Context, out: &mut dyn Write) -> CoreResult<usize> {
        let stmt = Statement::select(ALBUMS).columns([SINGER_ID, ALBUM_ID, ALBUM_TITLE]);
        self.run(cx, "query-albums", &Statement::from(stmt), out, album_line)
    }

    /// The first albums, up to the configured limit.
    pub fn query_albums_limit(&self, cx: &Context, out: &mut dyn Write) -> CoreResult<usize> {
        let stmt = Statement::select(ALBUMS)
            .columns([SINGER_ID, ALBUM_ID, ALBUM_TITLE])
            .limit(self.config.album_limit);
        self.run(cx, "query-limit", &Statement::from(stmt), out, album_line)
    }

    /// Singers whose first name equals the configured literal.
    pub fn query_singers_first_name(
        &self,
        cx: &Context,
        out: &mut dyn Write,
    ) -> CoreResult<usize> {
        let stmt = Statement::select(SINGERS)
            .columns([SINGER_ID, FIRST_NAME, LAST_NAME])
            .filter_eq(FIRST_NAME, self.config.first_name.as_str());
        self.run(cx, "query-singers-first", &Statement::from(stmt), out, singer_line)
    }

    /// Singers whose last name equals the configured literal, read through
    /// the last-name index.
    pub fn query_singers_last_name(
        &self,
        cx: &Context,
        out: &mut dyn Write,
    ) -> CoreResult<usize> {
        let stmt = Statement::select(SINGERS)
            .columns([SINGER_ID, FIRST_NAME, LAST_NAME])
            .force_index(SINGERS_BY_LAST_NAME)
            .filter_eq(LAST_NAME, self.config.last_name.as_str());
        self.run(cx, "query-singers-last", &Statement::from(stmt), out, singer_line)
    }

    /// Singers joined with their albums.
    pub fn join_singer_album(&self, cx: &Context, out: &mut dyn Write) -> CoreResult<usize> {
        let stmt = Statement::select(SINGERS)
            .columns(["Singers.SingerId", "FirstName", "AlbumTitle"])
            .join(ALBUMS, SINGER_ID, SINGER_ID);
        self.run(cx, "join-singer-album", &Statement::from(stmt), out, |row| {
            Ok(format!(
                "{} {} {}",
                row.get::<i64>(0)?,
                row.get::<String>(1)?,
                row.get::<String>(2)?
            ))
        })
    }

    fn run(
        &self,
        cx: &Context,
        name: &str,
        stmt: &Statement,
        out: &mut dyn Write,
        line: impl Fn(&Row) -> StoreResult<String>,
    ) -> CoreResult<usize> {
        let span = self.log.start_span(cx, name);
        let cx = span.context();

        let result = self.write_rows(cx, stmt, out, line);
        match &result {
            Ok(count) => self
                .log
                .info(cx, format!("{count} record(s) found for query: {stmt}")),
            Err(e) => self.log.error(cx, format!("{name} failed: {e}")),
        }
        result
    }

    fn write_rows(
        &self,
        cx: &Context,
        stmt: &Statement,
        out: &mut dyn Write,
        line: impl Fn(&Row) -> StoreResult<String>,
    ) -> CoreResult<usize> {
        let mut txn = self.gateway.read_only_transaction(cx.call())?;
        let mut count = 0;
        for row in txn.query(stmt)? {
            writeln!(out, "{}", line(&row?)?)?;
            count += 1;
        }
        Ok(count)
    }
}

fn album_line(row: &Row) -> StoreResult<String> {
    Ok(format!(
        "{} {} {}",
        row.get::<i64>(0)?,
        row.get::<i64>(1)?,
        row.get::<String>(2)?
    ))
}

fn singer_line(row: &Row) -> StoreResult<String> {
    Ok(format!(
        "{} {} {}",
        row.get::<i64>(0)?,
        row.get::<String>(1)?,
        row.get::<String>(2)?
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::applog::MemorySink;
    use crate::coordinator::{IdGenerator, UpsertCoordinator};
    use crate::schema::music_store;
    use std::sync::Arc;
    use tracelab_store::{MemoryStore, StoreConfig};

    fn seeded(records: &[(&str, &str, &str)]) -> MemoryStore {
        let store = music_store(StoreConfig::default());
        let coordinator =
            UpsertCoordinator::new(&store, IdGenerator::new(5), AppLog::tracing(None));
        for (first, last, title) in records {
            coordinator
                .resolve_or_create_independent(&Context::background(), first, last, title)
                .unwrap();
        }
        store
    }

    #[test]
    fn empty_tables_return_zero_rows() {
        let store = music_store(StoreConfig::default());
        let sink = Arc::new(MemorySink::new());
        let queries = Queries::new(
            &store,
            AppLog::new(sink.clone(), None),
            QueryConfig::default(),
        );
        let mut out: Vec<u8> = Vec::new();

        assert_eq!(queries.query_albums(&Context::background(), &mut out).unwrap(), 0);
        assert!(out.is_empty());
        assert!(sink.contains("0 record(s) found"));
        assert_eq!(store.active_snapshots(), 0);
    }

    #[test]
    fn templates_filter_limit_and_join() {
        let store = seeded(&[
            ("Captain", "Zero", "Smoke on the Water"),
            ("Captain", "Ryan II", "Fog on the Bay"),
            ("Major C", "Zero", "Dust on the Road"),
        ]);
        let queries = Queries::new(
            &store,
            AppLog::tracing(None),
            QueryConfig::default().album_limit(2),
        );
        let cx = Context::background();
        let mut out: Vec<u8> = Vec::new();

        assert_eq!(queries.query_albums(&cx, &mut out).unwrap(), 3);
        assert_eq!(queries.query_albums_limit(&cx, &mut out).unwrap(), 2);
        assert_eq!(queries.query_singers_first_name(&cx, &mut out).unwrap(), 2);
        assert_eq!(queries.query_singers_last_name(&cx, &mut out).unwrap(), 2);

        let mut joined = Vec::new();
        assert_eq!(queries.join_singer_album(&cx, &mut joined).unwrap(), 3);
        let joined = String::from_utf8(joined).unwrap();
        assert!(joined.lines().any(|l| l.ends_with("Captain Smoke on the Water")));
        assert_eq!(store.active_snapshots(), 0);
    }

    #[test]
    fn logs_name_the_span_and_the_query() {
        let store = music_store(StoreConfig::default());
        let sink = Arc::new(MemorySink::new());
        let queries = Queries::new(
            &store,
            AppLog::new(sink.clone(), None),
            QueryConfig::default(),
        );
        let cx = Context::background();
        let mut out = std::io::sink();

        queries.query_albums_limit(&cx, &mut out).unwrap();
        queries.query_singers_first_name(&cx, &mut out).unwrap();
        queries.query_singers_last_name(&cx, &mut out).unwrap();

        assert!(sink.contains("span query-limit took"));
        assert!(sink.contains("span query-singers-first took"));
        assert!(sink.contains("span query-singers-last took"));
        assert!(sink.contains(
            "0 record(s) found for query: SELECT SingerId, AlbumId, AlbumTitle FROM Albums LIMIT 10"
        ));
        assert!(sink.contains("FROM Singers@{FORCE_INDEX=SingersByLastName} WHERE LastName ="));
    }

    #[test]
    fn failures_release_the_snapshot() {
        let store = seeded(&[("Chief D", "Chaos", "Rain on the Sea")]);
        let sink = Arc::new(MemorySink::new());
        let queries = Queries::new(
            &store,
            AppLog::new(sink.clone(), None),
            QueryConfig::default(),
        );

        store.faults().fail_next_statements(1);
        let err = queries
            .query_albums(&Context::background(), &mut std::io::sink())
            .unwrap_err();
        assert!(!err.is_not_found());
        assert!(sink.contains("query-albums failed"));
        assert_eq!(store.active_snapshots(), 0);
    }
}
