//! Entity resolver: natural key to surrogate id.
//!
//! A lookup either runs inside a caller's read-write transaction, where it
//! sees that transaction's earlier inserts, or as an independent strongly
//! consistent read. The first returned row wins. No rows is
//! [`CoreError::NotFound`]; any store failure stays a store error.

use crate::applog::AppLog;
use crate::context::Context;
use crate::error::{CoreError, CoreResult};
use crate::schema::{ALBUMS, ALBUM_ID, ALBUM_TITLE, FIRST_NAME, LAST_NAME, SINGERS, SINGER_ID};
use crate::types::{AlbumId, SingerId};
use tracelab_store::{ReadContext, ReadWriteContext, RowIterator, Statement, StoreGateway};

/// Looks up a singer by `(first, last)` through `reader`.
pub fn lookup_singer_id<R>(reader: &mut R, first: &str, last: &str) -> CoreResult<SingerId>
where
    R: ReadContext + ?Sized,
{
    let stmt: Statement = Statement::select(SINGERS)
        .columns([SINGER_ID])
        .filter_eq(FIRST_NAME, first)
        .filter_eq(LAST_NAME, last)
        .into();
    first_id(reader.query(&stmt)?, "singer", || format!("{first} {last}")).map(SingerId)
}

/// Looks up an album by `(singer, title)` through `reader`.
pub fn lookup_album_id<R>(reader: &mut R, singer: SingerId, title: &str) -> CoreResult<AlbumId>
where
    R: ReadContext + ?Sized,
{
    let stmt: Statement = Statement::select(ALBUMS)
        .columns([ALBUM_ID])
        .filter_eq(SINGER_ID, singer.0)
        .filter_eq(ALBUM_TITLE, title)
        .into();
    first_id(reader.query(&stmt)?, "album", || format!("{singer}/{title}")).map(AlbumId)
}

fn first_id(
    mut rows: RowIterator,
    entity: &'static str,
    key: impl FnOnce() -> String,
) -> CoreResult<i64> {
    match rows.next() {
        Some(row) => Ok(row?.get::<i64>(0)?),
        None => Err(CoreError::not_found(entity, key())),
    }
}

/// Resolves natural keys against a store, logging store failures.
pub struct EntityResolver<'g, G> {
    gateway: &'g G,
    log: AppLog,
}

impl<'g, G: StoreGateway> EntityResolver<'g, G> {
    /// Creates a resolver over `gateway`.
    pub fn new(gateway: &'g G, log: AppLog) -> Self {
        Self { gateway, log }
    }

    /// Resolves a singer id, inside `txn` when one is given.
    pub fn singer_id(
        &self,
        cx: &Context,
        txn: Option<&mut (dyn ReadWriteContext + '_)>,
        first: &str,
        last: &str,
    ) -> CoreResult<SingerId> {
        let result = match txn {
            Some(txn) => lookup_singer_id(txn, first, last),
            None => lookup_singer_id(&mut self.gateway.single(cx.call()), first, last),
        };
        self.report(cx, "singer", &result);
        result
    }

    /// Resolves an album id, inside `txn` when one is given.
    pub fn album_id(
        &self,
        cx: &Context,
        txn: Option<&mut (dyn ReadWriteContext + '_)>,
        singer: SingerId,
        title: &str,
    ) -> CoreResult<AlbumId> {
        let result = match txn {
            Some(txn) => lookup_album_id(txn, singer, title),
            None => lookup_album_id(&mut self.gateway.single(cx.call()), singer, title),
        };
        self.report(cx, "album", &result);
        result
    }

    fn report<T>(&self, cx: &Context, entity: &str, result: &CoreResult<T>) {
        match result {
            Err(e) if !e.is_not_found() => {
                self.log.error(cx, format!("failed to look up {entity}: {e}"))
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::applog::{MemorySink, Severity};
    use crate::schema::music_store;
    use std::sync::Arc;
    use tracelab_store::{CallContext, MemoryStore, StoreConfig, StoreError};

    fn seeded_store() -> MemoryStore {
        let store = music_store(StoreConfig::default());
        store
            .read_write_transaction(&CallContext::new(), |txn| {
                for id in [7, 8] {
                    txn.update(
                        &Statement::insert(SINGERS)
                            .value(SINGER_ID, id)
                            .value(FIRST_NAME, "Captain A")
                            .value(LAST_NAME, "Zero II")
                            .into(),
                    )?;
                }
                txn.update(
                    &Statement::insert(ALBUMS)
                        .value(SINGER_ID, 7)
                        .value(ALBUM_ID, 70)
                        .value(ALBUM_TITLE, "Smoke on the Water")
                        .into(),
                )?;
                Ok::<_, StoreError>(())
            })
            .unwrap();
        store
    }

    #[test]
    fn first_row_is_authoritative() {
        let store = seeded_store();
        let mut single = store.single(&CallContext::new());
        assert_eq!(
            lookup_singer_id(&mut single, "Captain A", "Zero II").unwrap(),
            SingerId(7)
        );
    }

    #[test]
    fn missing_keys_are_not_found() {
        let store = seeded_store();
        let resolver = EntityResolver::new(&store, AppLog::tracing(None));
        let cx = Context::background();

        let err = resolver.singer_id(&cx, None, "Major Q", "Chaos").unwrap_err();
        assert!(err.is_not_found());
        let err = resolver
            .album_id(&cx, None, SingerId(8), "Smoke on the Water")
            .unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(
            resolver
                .album_id(&cx, None, SingerId(7), "Smoke on the Water")
                .unwrap(),
            AlbumId(70)
        );
    }

    #[test]
    fn lookup_inside_transaction_sees_own_inserts() {
        let store = seeded_store();
        let resolver = EntityResolver::new(&store, AppLog::tracing(None));
        let cx = Context::background();

        let found = store
            .read_write_transaction(cx.call(), |txn| {
                txn.update(
                    &Statement::insert(SINGERS)
                        .value(SINGER_ID, 9)
                        .value(FIRST_NAME, "Chief B")
                        .value(LAST_NAME, "Ryan III")
                        .into(),
                )?;
                resolver.singer_id(&cx, Some(txn), "Chief B", "Ryan III")
            })
            .unwrap();
        assert_eq!(found.value, SingerId(9));
    }

    #[test]
    fn store_failures_are_not_not_found() {
        let store = seeded_store();
        let sink = Arc::new(MemorySink::new());
        let resolver = EntityResolver::new(&store, AppLog::new(sink.clone(), None));

        store.faults().fail_next_statements(1);
        let err = resolver
            .singer_id(&Context::background(), None, "Captain A", "Zero II")
            .unwrap_err();
        assert!(matches!(err, CoreError::Store(StoreError::Transport { .. })));
        assert_eq!(sink.at(Severity::Error).len(), 1);
    }
}
