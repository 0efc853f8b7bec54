//! Upsert coordinator: resolve-or-create a singer and one of their albums.
//!
//! Two strategies:
//! - **Independent**: each lookup is its own strongly consistent read and
//!   each insert its own read-write transaction. Two callers racing on the
//!   same natural key can both miss and both insert.
//! - **Atomic**: every step runs in one read-write transaction, so the
//!   store's conflict detection serialises racing callers. When the singer
//!   already exists the call returns right away without checking or
//!   creating the album.

use crate::applog::AppLog;
use crate::context::Context;
use crate::error::{CoreError, CoreResult};
use crate::resolver::EntityResolver;
use crate::schema::{ALBUMS, ALBUM_ID, ALBUM_TITLE, FIRST_NAME, LAST_NAME, SINGERS, SINGER_ID};
use crate::types::{AlbumId, Resolved, SingerId, UpsertOutcome};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fmt;
use tracelab_store::{ReadContext, Statement, StoreGateway};

/// Span name of the independent strategy.
pub const INDEPENDENT_SPAN: &str = "add-album-single-txns";
/// Span name of the atomic strategy.
pub const ATOMIC_SPAN: &str = "add-album-all-one-txn";

/// Transaction boundary strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    /// Lookups and inserts in separate transactions.
    Independent,
    /// Everything in one read-write transaction.
    Atomic,
}

impl Strategy {
    /// Short name used on the command line and in reports.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Independent => "no-txn",
            Self::Atomic => "txn",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Draws surrogate ids uniformly from `0..=i64::MAX`.
///
/// Ids are not checked for uniqueness; a collision surfaces as the store's
/// duplicate key error.
#[derive(Debug)]
pub struct IdGenerator {
    rng: Mutex<StdRng>,
}

impl IdGenerator {
    /// Creates a generator seeded with `seed`.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self::from_rng(StdRng::seed_from_u64(seed))
    }

    /// Creates a generator drawing from `rng`.
    #[must_use]
    pub fn from_rng(rng: StdRng) -> Self {
        Self {
            rng: Mutex::new(rng),
        }
    }

    /// Returns the next id.
    pub fn next_id(&self) -> i64 {
        self.rng.lock().gen_range(0..=i64::MAX)
    }
}

/// Common interface of the two strategies.
pub trait ResolveOrCreate {
    /// Which strategy this is.
    fn strategy(&self) -> Strategy;

    /// Resolves or creates the singer `(first, last)` and their album `title`.
    fn resolve_or_create<G: StoreGateway>(
        &self,
        coordinator: &UpsertCoordinator<'_, G>,
        cx: &Context,
        first: &str,
        last: &str,
        title: &str,
    ) -> CoreResult<UpsertOutcome>;
}

/// The independent-transactions strategy.
#[derive(Debug, Clone, Copy, Default)]
pub struct Independent;

/// The single-transaction strategy.
#[derive(Debug, Clone, Copy, Default)]
pub struct Atomic;

impl ResolveOrCreate for Independent {
    fn strategy(&self) -> Strategy {
        Strategy::Independent
    }

    fn resolve_or_create<G: StoreGateway>(
        &self,
        coordinator: &UpsertCoordinator<'_, G>,
        cx: &Context,
        first: &str,
        last: &str,
        title: &str,
    ) -> CoreResult<UpsertOutcome> {
        coordinator.resolve_or_create_independent(cx, first, last, title)
    }
}

impl ResolveOrCreate for Atomic {
    fn strategy(&self) -> Strategy {
        Strategy::Atomic
    }

    fn resolve_or_create<G: StoreGateway>(
        &self,
        coordinator: &UpsertCoordinator<'_, G>,
        cx: &Context,
        first: &str,
        last: &str,
        title: &str,
    ) -> CoreResult<UpsertOutcome> {
        coordinator.resolve_or_create_atomic(cx, first, last, title)
    }
}

fn insert_singer(id: SingerId, first: &str, last: &str) -> Statement {
    Statement::insert(SINGERS)
        .value(SINGER_ID, id.0)
        .value(FIRST_NAME, first)
        .value(LAST_NAME, last)
        .into()
}

fn insert_album(singer: SingerId, id: AlbumId, title: &str) -> Statement {
    Statement::insert(ALBUMS)
        .value(SINGER_ID, singer.0)
        .value(ALBUM_ID, id.0)
        .value(ALBUM_TITLE, title)
        .into()
}

/// Resolves or creates singers and albums under either strategy.
pub struct UpsertCoordinator<'g, G> {
    gateway: &'g G,
    resolver: EntityResolver<'g, G>,
    ids: IdGenerator,
    log: AppLog,
}

impl<'g, G: StoreGateway> UpsertCoordinator<'g, G> {
    /// Creates a coordinator over `gateway`.
    pub fn new(gateway: &'g G, ids: IdGenerator, log: AppLog) -> Self {
        Self {
            gateway,
            resolver: EntityResolver::new(gateway, log.clone()),
            ids,
            log,
        }
    }

    /// Returns the resolver.
    pub fn resolver(&self) -> &EntityResolver<'g, G> {
        &self.resolver
    }

    /// Dispatches to the named strategy.
    pub fn add_all(
        &self,
        strategy: Strategy,
        cx: &Context,
        first: &str,
        last: &str,
        title: &str,
    ) -> CoreResult<UpsertOutcome> {
        match strategy {
            Strategy::Independent => Independent.resolve_or_create(self, cx, first, last, title),
            Strategy::Atomic => Atomic.resolve_or_create(self, cx, first, last, title),
        }
    }

    /// Resolve-or-create with every lookup and insert in its own transaction.
    pub fn resolve_or_create_independent(
        &self,
        cx: &Context,
        first: &str,
        last: &str,
        title: &str,
    ) -> CoreResult<UpsertOutcome> {
        let span = self.log.start_span(cx, INDEPENDENT_SPAN);
        let cx = span.context();

        let singer = match self.resolver.singer_id(cx, None, first, last) {
            Ok(id) => Resolved::Existing(id),
            Err(e) if e.is_not_found() => Resolved::Created(self.add_singer(cx, first, last)?),
            Err(e) => return Err(e),
        };
        let album = match self.resolver.album_id(cx, None, singer.id(), title) {
            Ok(id) => Resolved::Existing(id),
            Err(e) if e.is_not_found() => {
                Resolved::Created(self.add_album(cx, singer.id(), title)?)
            }
            Err(e) => return Err(e),
        };

        self.log.info(cx, format!("album id {}", album.id()));
        Ok(UpsertOutcome {
            singer,
            album: Some(album),
        })
    }

    /// Resolve-or-create inside one read-write transaction.
    ///
    /// The store may run the body several times; ids are drawn afresh on
    /// each attempt.
    pub fn resolve_or_create_atomic(
        &self,
        cx: &Context,
        first: &str,
        last: &str,
        title: &str,
    ) -> CoreResult<UpsertOutcome> {
        let span = self.log.start_span(cx, ATOMIC_SPAN);
        let cx = span.context();

        let committed = self.gateway.read_write_transaction(cx.call(), |txn| {
            let singer = match self.resolver.singer_id(cx, Some(&mut *txn), first, last) {
                Ok(id) => {
                    return Ok(UpsertOutcome {
                        singer: Resolved::Existing(id),
                        album: None,
                    })
                }
                Err(e) if e.is_not_found() => SingerId(self.ids.next_id()),
                Err(e) => return Err(e),
            };
            txn.update(&insert_singer(singer, first, last))?;

            let album = match self.resolver.album_id(cx, Some(&mut *txn), singer, title) {
                Ok(id) => Resolved::Existing(id),
                Err(e) if e.is_not_found() => {
                    let id = AlbumId(self.ids.next_id());
                    txn.update(&insert_album(singer, id, title))?;
                    Resolved::Created(id)
                }
                Err(e) => return Err(e),
            };
            Ok::<_, CoreError>(UpsertOutcome {
                singer: Resolved::Created(singer),
                album: Some(album),
            })
        })?;

        let outcome = committed.value;
        match outcome.album_id() {
            Some(album) => {
                self.log.info(
                    cx,
                    format!("{} record(s) inserted", outcome.rows_created()),
                );
                self.log.info(cx, format!("album id {album}"));
            }
            None => self.log.info(
                cx,
                format!("singer {} exists, albums untouched", outcome.singer.id()),
            ),
        }
        if committed.attempts > 1 {
            self.log
                .info(cx, format!("committed after {} attempts", committed.attempts));
        }
        Ok(outcome)
    }

    /// Inserts a singer with a fresh id in its own transaction.
    pub fn add_singer(&self, cx: &Context, first: &str, last: &str) -> CoreResult<SingerId> {
        let id = SingerId(self.ids.next_id());
        let stmt = insert_singer(id, first, last);
        let inserted = self
            .gateway
            .read_write_transaction(cx.call(), |txn| {
                txn.update(&stmt).map_err(CoreError::from)
            })?
            .into_value();
        self.log
            .info(cx, format!("{inserted} singer record(s) inserted"));
        Ok(id)
    }

    /// Inserts an album with a fresh id in its own transaction.
    pub fn add_album(&self, cx: &Context, singer: SingerId, title: &str) -> CoreResult<AlbumId> {
        let id = AlbumId(self.ids.next_id());
        let stmt = insert_album(singer, id, title);
        let inserted = self
            .gateway
            .read_write_transaction(cx.call(), |txn| {
                txn.update(&stmt).map_err(CoreError::from)
            })?
            .into_value();
        self.log.info(cx, format!("{inserted} album record(s) inserted"));
        Ok(id)
    }

    /// Counts non-null values of `column` in `table` with a single read.
    pub fn count_rows(&self, cx: &Context, column: &str, table: &str) -> CoreResult<i64> {
        let mut rows = self
            .gateway
            .single(cx.call())
            .query(&Statement::count(table, column))?;
        match rows.next() {
            Some(row) => Ok(row?.get::<i64>(0)?),
            None => Ok(0),
        }
    }
}
