// tests/support/mod.rs
//
// Shared test doubles wired through the library's trait seams: a scripted
// identifier source and a store whose writes always fail.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use uuid_enrichment_pipeline::api::AppState;
use uuid_enrichment_pipeline::enrich::Enricher;
use uuid_enrichment_pipeline::fetch::IdentifierSource;
use uuid_enrichment_pipeline::notify::Notifier;
use uuid_enrichment_pipeline::pipeline::Pipeline;
use uuid_enrichment_pipeline::store::{NewResult, ResultStore, SqliteStore, StoreError, StoredResult};

/// What `FailingStore` errors render as inside the report's `errors` array.
pub fn storage_error_message() -> String {
    FailingStore::error().to_string()
}

/// Identifier source that replays a fixed list of outcomes, one per call.
/// Exhausted scripts yield `None`.
pub struct ScriptedSource {
    outcomes: Mutex<VecDeque<Option<String>>>,
}

impl ScriptedSource {
    pub fn new<I>(outcomes: I) -> Self
    where
        I: IntoIterator<Item = Option<&'static str>>,
    {
        Self {
            outcomes: Mutex::new(
                outcomes
                    .into_iter()
                    .map(|o| o.map(str::to_string))
                    .collect(),
            ),
        }
    }
}

#[async_trait]
impl IdentifierSource for ScriptedSource {
    async fn fetch_identifier(&self) -> Option<String> {
        self.outcomes
            .lock()
            .expect("script mutex poisoned")
            .pop_front()
            .flatten()
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

/// Store standing in for an unavailable database: every operation fails.
pub struct FailingStore;

impl FailingStore {
    pub fn error() -> StoreError {
        StoreError::Sqlite(rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_CANTOPEN),
            Some("unable to open database file".to_string()),
        ))
    }
}

impl ResultStore for FailingStore {
    fn insert(&self, _row: NewResult<'_>) -> Result<i64, StoreError> {
        Err(Self::error())
    }

    fn recent(&self, _limit: usize) -> Result<Vec<StoredResult>, StoreError> {
        Err(Self::error())
    }
}

pub fn build_pipeline(source: Arc<dyn IdentifierSource>, store: Arc<dyn ResultStore>) -> Pipeline {
    Pipeline::new(
        source,
        store,
        Enricher::new(),
        Notifier::new("ops@example.com".to_string()),
    )
}

pub fn build_state(source: Arc<dyn IdentifierSource>, store: Arc<dyn ResultStore>) -> AppState {
    AppState {
        pipeline: Arc::new(build_pipeline(source, store.clone())),
        store,
    }
}

/// State backed by an in-memory store; the handle is returned so tests can
/// inspect persisted rows.
pub fn state_with_memory_store(source: ScriptedSource) -> (AppState, Arc<SqliteStore>) {
    let store = Arc::new(SqliteStore::open_in_memory().expect("open in-memory store"));
    let state = build_state(Arc::new(source), store.clone());
    (state, store)
}
