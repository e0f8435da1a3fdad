pub mod app;
pub mod cli;
pub mod commands;
pub mod context;
pub mod events;
pub mod fetcher;
pub mod rest;
pub mod status;
pub mod storage;
pub mod synchronizer;
pub mod tracing;
pub mod trigger;
pub mod types;

pub use events::{EventBus, EventFilter, EventKind, Subscription, SyncEvent, SyncObserver};
pub use fetcher::{FetchError, Fetcher, HttpFetcher};
pub use storage::{SqliteStore, Store, StoreError};
pub use synchronizer::{SyncError, Synchronizer};
pub use trigger::{CycleHandle, OverlapPolicy, Trigger};
pub use types::{CycleId, CycleReport, Record};
