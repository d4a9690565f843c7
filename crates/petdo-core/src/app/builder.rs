//! TrackerBuilder - Tracker の構築とワイヤリング
//!
//! Every port has a sensible default, so `TrackerBuilder::new().build()`
//! yields a working in-memory tracker. Production wiring swaps in the
//! file-backed store and a real sink.

use std::sync::Arc;

use crate::app::companion::{CompanionDefaults, CompanionEngine};
use crate::app::tracker::Tracker;
use crate::config::TrackerConfig;
use crate::impls::{InMemoryStore, JsonFileStore, TracingSink};
use crate::ports::{Clock, EventSink, IdGenerator, KeyValueStore, SystemClock, UlidGenerator};

/// # 使用例
/// ```ignore
/// let tracker = TrackerBuilder::from_config(&config)
///     .sink(Arc::new(BroadcastSink::new(32)))
///     .build();
/// ```
pub struct TrackerBuilder {
    clock: Option<Arc<dyn Clock>>,
    ids: Option<Arc<dyn IdGenerator>>,
    store: Option<Arc<dyn KeyValueStore>>,
    sink: Option<Arc<dyn EventSink>>,
    defaults: CompanionDefaults,
}

impl TrackerBuilder {
    pub fn new() -> Self {
        Self {
            clock: None,
            ids: None,
            store: None,
            sink: None,
            defaults: CompanionDefaults::default(),
        }
    }

    /// File-backed store under `config.data_dir` plus the configured
    /// companion defaults.
    pub fn from_config(config: &TrackerConfig) -> Self {
        Self::new()
            .store(Arc::new(JsonFileStore::new(config.data_dir.clone())))
            .companion_defaults(config.companion.clone())
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Without this, ids come from a ULID generator sharing the tracker's clock.
    pub fn id_generator(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = Some(ids);
        self
    }

    pub fn store(mut self, store: Arc<dyn KeyValueStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn companion_defaults(mut self, defaults: CompanionDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    /// Wire everything up and load the companion (see [`CompanionEngine::init`]).
    pub fn build(self) -> Tracker {
        let clock: Arc<dyn Clock> = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let ids = self
            .ids
            .unwrap_or_else(|| Arc::new(UlidGenerator::new(Arc::clone(&clock))));
        let store = self
            .store
            .unwrap_or_else(|| Arc::new(InMemoryStore::new()));
        let sink = self.sink.unwrap_or_else(|| Arc::new(TracingSink));

        let companion = CompanionEngine::init(store, sink, &self.defaults);
        Tracker::new(clock, ids, companion)
    }
}

impl Default for TrackerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
