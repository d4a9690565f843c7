//! Impls - ports の実装
//!
//! # 含まれる実装
//! - **InMemoryStore** / **JsonFileStore**: KeyValueStore
//! - **NoopSink** / **TracingSink** / **BroadcastSink** / **RecordingSink**: EventSink

pub mod inmem_store;
pub mod json_file_store;
pub mod sinks;

pub use self::inmem_store::InMemoryStore;
pub use self::json_file_store::JsonFileStore;
pub use self::sinks::{BroadcastSink, NoopSink, RecordingSink, TracingSink};
