//! Remote list fetcher
//!
//! A fetcher owns one state slot. Each call to [`RemoteListFetcher::subscribe`]
//! with a new filter bumps the request generation, resets the slot to
//! `Loading` and runs the query on a worker thread. When the worker finishes
//! it applies its outcome only if its generation is still the latest, so a
//! slow response for an old filter can never overwrite a newer one.
//!
//! Workers hold a weak reference to the slot: once the fetcher is dropped,
//! late responses are discarded.

use std::marker::PhantomData;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError, Weak};
use std::thread;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::Value;

use super::state::{ErrorInfo, FetchState, FetchView};
use crate::backend::{Client, Direction, ErrorKind, Query, QueryError, Row};

/// What a fetcher lists: table, columns, the filterable column and ordering
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListSpec {
    pub table: &'static str,
    pub columns: &'static str,
    pub filter_column: Option<&'static str>,
    pub order_column: &'static str,
    pub limit: Option<usize>,
}

impl ListSpec {
    /// All columns of `table`, newest first, no filter
    pub const fn new(table: &'static str) -> Self {
        Self {
            table,
            columns: "*",
            filter_column: None,
            order_column: "created_at",
            limit: None,
        }
    }

    pub const fn filtered_by(mut self, column: &'static str) -> Self {
        self.filter_column = Some(column);
        self
    }

    pub const fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }

    /// Builds the query for a filter value
    pub fn query(&self, filter: Option<&Value>) -> Result<Query, QueryError> {
        let mut query = Query::table(self.table)
            .select(self.columns)
            .order(self.order_column, Direction::Descending);

        if let Some(value) = filter {
            let column = self.filter_column.ok_or_else(|| {
                QueryError::MalformedQuery(format!("list '{}' has no filter column", self.table))
            })?;
            query = query.eq(column, value.clone());
        }

        if let Some(limit) = self.limit {
            query = query.limit(limit);
        }

        Ok(query)
    }
}

struct Slot<T> {
    state: FetchState<T>,

    /// Generation of the most recently issued request
    generation: u64,

    /// Filter of the current subscription; `None` until the first subscribe
    filter: Option<Option<Value>>,

    /// Responses dropped because a newer request had been issued
    stale: u64,
}

struct Shared<T> {
    slot: Mutex<Slot<T>>,
    changed: Condvar,
}

impl<T> Shared<T> {
    fn lock(&self) -> MutexGuard<'_, Slot<T>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn apply(&self, table: &str, generation: u64, outcome: Result<Vec<T>, ErrorInfo>) {
        let mut slot = self.lock();

        if generation != slot.generation {
            slot.stale += 1;
            tracing::debug!(
                table,
                generation,
                latest = slot.generation,
                "discarding stale response"
            );
        } else {
            slot.state = match outcome {
                Ok(rows) => {
                    tracing::debug!(table, generation, rows = rows.len(), "fetch loaded");
                    FetchState::Loaded(rows)
                }
                Err(error) => {
                    tracing::warn!(table, generation, %error, "fetch failed");
                    FetchState::Failed(error)
                }
            };
        }

        self.changed.notify_all();
    }
}

/// Issues a filtered list query and exposes its outcome as [`FetchState`]
///
/// `T` is the row type the results decode into; `F` is the filter type
/// (a status enum, a parent id, ...).
pub struct RemoteListFetcher<T, F = Value> {
    client: Client,
    spec: ListSpec,
    shared: Arc<Shared<T>>,
    _filter: PhantomData<fn(F)>,
}

impl<T, F> RemoteListFetcher<T, F>
where
    T: DeserializeOwned + Send + 'static,
    F: Into<Value>,
{
    pub fn new(client: Client, spec: ListSpec) -> Self {
        Self {
            client,
            spec,
            shared: Arc::new(Shared {
                slot: Mutex::new(Slot {
                    state: FetchState::Loading,
                    generation: 0,
                    filter: None,
                    stale: 0,
                }),
                changed: Condvar::new(),
            }),
            _filter: PhantomData,
        }
    }

    /// Caps the number of rows per query
    pub fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.spec = self.spec.with_limit(limit);
        self
    }

    pub fn spec(&self) -> &ListSpec {
        &self.spec
    }

    /// Starts a query scoped by `filter` (`None` lists everything)
    ///
    /// Subscribing with the filter that is already current does nothing.
    pub fn subscribe(&self, filter: Option<F>) {
        let filter: Option<Value> = filter.map(Into::into);

        let generation = {
            let mut slot = self.shared.lock();
            if slot.filter.as_ref() == Some(&filter) {
                tracing::trace!(table = self.spec.table, "filter unchanged, not refetching");
                return;
            }
            slot.filter = Some(filter.clone());
            Self::begin(&mut slot)
        };

        self.issue(generation, filter);
    }

    /// Re-runs the query for the current filter
    ///
    /// Does nothing before the first [`subscribe`](Self::subscribe).
    pub fn refetch(&self) {
        let (generation, filter) = {
            let mut slot = self.shared.lock();
            let Some(filter) = slot.filter.clone() else {
                tracing::trace!(table = self.spec.table, "refetch before subscribe ignored");
                return;
            };
            (Self::begin(&mut slot), filter)
        };

        self.issue(generation, filter);
    }

    fn begin(slot: &mut Slot<T>) -> u64 {
        slot.generation += 1;
        slot.state = FetchState::Loading;
        slot.generation
    }

    fn issue(&self, generation: u64, filter: Option<Value>) {
        let table = self.spec.table;
        tracing::debug!(table, generation, filter = ?filter, "issuing fetch");

        let query = self.spec.query(filter.as_ref());
        let client = self.client.clone();
        let weak: Weak<Shared<T>> = Arc::downgrade(&self.shared);

        let spawned = thread::Builder::new()
            .name(format!("fetch-{}", table))
            .spawn(move || {
                let outcome = query
                    .and_then(|query| client.execute(&query))
                    .map_err(ErrorInfo::from)
                    .and_then(|rows| decode(table, rows));

                match weak.upgrade() {
                    Some(shared) => shared.apply(table, generation, outcome),
                    None => tracing::debug!(table, generation, "fetcher dropped, response discarded"),
                }
            });

        if let Err(err) = spawned {
            self.shared.apply(
                table,
                generation,
                Err(ErrorInfo::new(
                    ErrorKind::Unknown,
                    format!("failed to start fetch worker: {}", err),
                )),
            );
        }
    }

    /// Latest issued request generation (0 before the first subscribe)
    pub fn generation(&self) -> u64 {
        self.shared.lock().generation
    }

    /// Number of responses discarded because they were superseded
    pub fn stale_responses(&self) -> u64 {
        self.shared.lock().stale
    }

    pub fn is_loading(&self) -> bool {
        self.shared.lock().state.is_loading()
    }
}

impl<T, F> RemoteListFetcher<T, F>
where
    T: Clone,
{
    /// Snapshot of the current state
    pub fn state(&self) -> FetchState<T> {
        self.shared.lock().state.clone()
    }

    /// Snapshot in `{data, loading, error}` form
    pub fn view(&self) -> FetchView<T> {
        self.state().into_view()
    }

    /// Blocks until the state leaves `Loading` or `timeout` elapses
    pub fn wait_settled(&self, timeout: Duration) -> FetchState<T> {
        let slot = self.shared.lock();
        let (slot, _) = self
            .shared
            .changed
            .wait_timeout_while(slot, timeout, |slot| slot.state.is_loading())
            .unwrap_or_else(PoisonError::into_inner);
        slot.state.clone()
    }
}

fn decode<T: DeserializeOwned>(table: &str, rows: Vec<Row>) -> Result<Vec<T>, ErrorInfo> {
    rows.into_iter()
        .map(|row| {
            serde_json::from_value(Value::Object(row)).map_err(|e| {
                ErrorInfo::new(
                    ErrorKind::Unknown,
                    format!("failed to decode {} row: {}", table, e),
                )
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{Backend, BatchError, MemoryBackend};
    use serde_json::json;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Instant;

    const WAIT: Duration = Duration::from_secs(5);

    fn request_row(id: &str, status: &str, created_at: &str) -> Row {
        json!({
            "id": id,
            "requester": "maria",
            "description": format!("request {}", id),
            "status": status,
            "created_at": created_at,
        })
        .as_object()
        .cloned()
        .unwrap()
    }

    fn seeded_memory() -> MemoryBackend {
        let backend = MemoryBackend::new();
        let rows = [
            ("r-0000001", "PENDENTE", "2024-01-01T00:00:00.000000Z"),
            ("r-0000002", "APROVADA", "2024-01-02T00:00:00.000000Z"),
            ("r-0000003", "PENDENTE", "2024-01-03T00:00:00.000000Z"),
        ];
        for (id, status, created_at) in rows {
            backend
                .insert("solicitations", &request_row(id, status, created_at))
                .unwrap();
        }
        backend
    }

    fn spec() -> ListSpec {
        ListSpec::new("solicitations").filtered_by("status")
    }

    fn ids(rows: &[Row]) -> Vec<&str> {
        rows.iter().map(|r| r["id"].as_str().unwrap()).collect()
    }

    /// Backend whose queries block until their filter value is released
    struct GatedBackend {
        inner: MemoryBackend,
        released: Mutex<HashSet<String>>,
        opened: Condvar,
        completed: AtomicUsize,
    }

    impl GatedBackend {
        fn new(inner: MemoryBackend) -> Self {
            Self {
                inner,
                released: Mutex::new(HashSet::new()),
                opened: Condvar::new(),
                completed: AtomicUsize::new(0),
            }
        }

        fn release(&self, key: &str) {
            self.released.lock().unwrap().insert(key.to_string());
            self.opened.notify_all();
        }
    }

    fn gate_key(query: &Query) -> String {
        query
            .filters()
            .first()
            .map(|f| f.value.to_string())
            .unwrap_or_else(|| "all".to_string())
    }

    impl Backend for GatedBackend {
        fn execute(&self, query: &Query) -> Result<Vec<Row>, QueryError> {
            let key = gate_key(query);
            let released = self.released.lock().unwrap();
            let released = self
                .opened
                .wait_while(released, |set| !set.contains(&key))
                .unwrap();
            drop(released);
            let result = self.inner.execute(query);
            self.completed.fetch_add(1, Ordering::SeqCst);
            result
        }

        fn insert_many(&self, table: &str, rows: &[Row]) -> Result<(), BatchError> {
            self.inner.insert_many(table, rows)
        }

        fn update_where(
            &self,
            table: &str,
            id: &str,
            guard: &Row,
            changes: &Row,
        ) -> Result<usize, QueryError> {
            self.inner.update_where(table, id, guard, changes)
        }
    }

    fn wait_until(mut condition: impl FnMut() -> bool) {
        let deadline = Instant::now() + WAIT;
        while !condition() {
            assert!(Instant::now() < deadline, "condition not reached in time");
            thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn starts_loading_before_subscribe() {
        let fetcher: RemoteListFetcher<Row> =
            RemoteListFetcher::new(Client::new(MemoryBackend::new()), spec());

        assert!(fetcher.state().is_loading());
        assert_eq!(fetcher.generation(), 0);
    }

    #[test]
    fn loads_filtered_rows_newest_first() {
        let fetcher: RemoteListFetcher<Row> =
            RemoteListFetcher::new(Client::new(seeded_memory()), spec());

        fetcher.subscribe(Some(json!("PENDENTE")));
        let state = fetcher.wait_settled(WAIT);

        let rows = state.data().unwrap();
        assert_eq!(ids(rows), vec!["r-0000003", "r-0000001"]);

        let view = fetcher.view();
        assert!(!view.loading);
        assert!(view.error.is_none());
    }

    #[test]
    fn no_filter_lists_everything() {
        let fetcher: RemoteListFetcher<Row> =
            RemoteListFetcher::new(Client::new(seeded_memory()), spec());

        fetcher.subscribe(None);
        let state = fetcher.wait_settled(WAIT);

        assert_eq!(
            ids(state.data().unwrap()),
            vec!["r-0000003", "r-0000002", "r-0000001"]
        );
    }

    #[test]
    fn backend_error_becomes_failed_state() {
        let backend = seeded_memory();
        backend.fail_table("solicitations", QueryError::Network("connection refused".into()));
        let fetcher: RemoteListFetcher<Row> = RemoteListFetcher::new(Client::new(backend), spec());

        fetcher.subscribe(Some(json!("PENDENTE")));
        let state = fetcher.wait_settled(WAIT);

        let error = state.error().unwrap();
        assert_eq!(error.kind, ErrorKind::Network);
        assert_eq!(error.message, "connection refused");
        assert!(!fetcher.view().loading);
    }

    #[test]
    fn failure_after_success_clears_data() {
        let backend = Arc::new(seeded_memory());
        let shared: Arc<dyn Backend> = backend.clone();
        let fetcher: RemoteListFetcher<Row> =
            RemoteListFetcher::new(Client::from_shared(shared), spec());

        fetcher.subscribe(Some(json!("PENDENTE")));
        assert!(fetcher.wait_settled(WAIT).data().is_some());

        backend.fail_table("solicitations", QueryError::Permission("revoked".into()));
        fetcher.refetch();
        fetcher.wait_settled(WAIT);

        let view = fetcher.view();
        assert!(view.data.is_empty());
        assert_eq!(view.error.unwrap().kind, ErrorKind::Permission);
    }

    #[test]
    fn same_filter_queries_once() {
        let backend = Arc::new(seeded_memory());
        let shared: Arc<dyn Backend> = backend.clone();
        let fetcher: RemoteListFetcher<Row> =
            RemoteListFetcher::new(Client::from_shared(shared), spec());

        fetcher.subscribe(Some(json!("PENDENTE")));
        fetcher.subscribe(Some(json!("PENDENTE")));
        fetcher.wait_settled(WAIT);

        assert_eq!(fetcher.generation(), 1);
        assert_eq!(backend.queries_executed(), 1);
    }

    #[test]
    fn refetch_issues_new_generation() {
        let fetcher: RemoteListFetcher<Row> =
            RemoteListFetcher::new(Client::new(seeded_memory()), spec());

        fetcher.refetch();
        assert_eq!(fetcher.generation(), 0);

        fetcher.subscribe(None);
        fetcher.wait_settled(WAIT);
        fetcher.refetch();
        assert_eq!(fetcher.generation(), 2);
        assert_eq!(fetcher.wait_settled(WAIT).data().unwrap().len(), 3);
    }

    #[test]
    fn stale_response_never_overwrites_newer_filter() {
        let backend = Arc::new(GatedBackend::new(seeded_memory()));
        let shared: Arc<dyn Backend> = backend.clone();
        let fetcher: RemoteListFetcher<Row> =
            RemoteListFetcher::new(Client::from_shared(shared), spec());

        fetcher.subscribe(Some(json!("PENDENTE")));
        fetcher.subscribe(Some(json!("APROVADA")));

        // Newer request resolves first
        backend.release("\"APROVADA\"");
        let state = fetcher.wait_settled(WAIT);
        assert_eq!(ids(state.data().unwrap()), vec!["r-0000002"]);

        // Then the superseded one arrives and must be ignored
        backend.release("\"PENDENTE\"");
        wait_until(|| fetcher.stale_responses() == 1);

        assert_eq!(ids(fetcher.state().data().unwrap()), vec!["r-0000002"]);
    }

    #[test]
    fn superseded_request_keeps_loading_until_latest_resolves() {
        let backend = Arc::new(GatedBackend::new(seeded_memory()));
        let shared: Arc<dyn Backend> = backend.clone();
        let fetcher: RemoteListFetcher<Row> =
            RemoteListFetcher::new(Client::from_shared(shared), spec());

        fetcher.subscribe(Some(json!("PENDENTE")));
        fetcher.subscribe(Some(json!("APROVADA")));

        backend.release("\"PENDENTE\"");
        wait_until(|| fetcher.stale_responses() == 1);
        assert!(fetcher.is_loading());

        backend.release("\"APROVADA\"");
        let state = fetcher.wait_settled(WAIT);
        assert_eq!(ids(state.data().unwrap()), vec!["r-0000002"]);
    }

    #[test]
    fn dropping_fetcher_discards_late_response() {
        let backend = Arc::new(GatedBackend::new(seeded_memory()));
        let shared: Arc<dyn Backend> = backend.clone();
        let fetcher: RemoteListFetcher<Row> =
            RemoteListFetcher::new(Client::from_shared(shared), spec());

        fetcher.subscribe(None);
        let slot = Arc::downgrade(&fetcher.shared);
        drop(fetcher);

        // The in-flight worker holds no strong reference to the slot
        assert!(slot.upgrade().is_none());

        backend.release("all");
        wait_until(|| backend.completed.load(Ordering::SeqCst) == 1);

        // The worker's client clone is released once it has finished
        wait_until(|| Arc::strong_count(&backend) == 1);
        assert!(slot.upgrade().is_none());
    }

    #[test]
    fn filter_on_unfilterable_list_fails_as_data() {
        let fetcher: RemoteListFetcher<Row> =
            RemoteListFetcher::new(Client::new(seeded_memory()), ListSpec::new("suppliers"));

        fetcher.subscribe(Some(json!("x")));
        let state = fetcher.wait_settled(WAIT);

        assert_eq!(state.error().unwrap().kind, ErrorKind::MalformedQuery);
    }

    #[test]
    fn undecodable_rows_fail_as_unknown() {
        #[derive(Debug, Clone, serde::Deserialize)]
        #[allow(dead_code)]
        struct NeedsAmount {
            amount: i64,
        }

        let fetcher: RemoteListFetcher<NeedsAmount> =
            RemoteListFetcher::new(Client::new(seeded_memory()), spec());

        fetcher.subscribe(None);
        let state = fetcher.wait_settled(WAIT);

        let error = state.error().unwrap();
        assert_eq!(error.kind, ErrorKind::Unknown);
        assert!(error.message.contains("solicitations"));
    }

    #[test]
    fn limit_caps_rows() {
        let fetcher: RemoteListFetcher<Row> =
            RemoteListFetcher::new(Client::new(seeded_memory()), spec()).with_limit(Some(2));

        fetcher.subscribe(None);
        let state = fetcher.wait_settled(WAIT);
        assert_eq!(ids(state.data().unwrap()), vec!["r-0000003", "r-0000002"]);
    }
}
