//! An in-memory, keyed cache whose entries carry a pluggable validity
//! policy, plus a processor built on top of it that periodically evicts
//! invalid entries and runs each evicted entry's callback exactly once, off
//! the eviction thread.
//!
//! # Features
//! - **Pluggable validity**: [`TimeValidator`] for sliding TTL windows,
//!   [`NullValidator`] for externally driven validity, or any
//!   [`Validator`] implementation.
//! - **Change notification**: a synchronous event stream of
//!   Added/Removed/Replaced/Reset, delivered on the mutating thread.
//! - **Background eviction**: [`CacheProcessor`] ticks on an interval,
//!   purges invalid items under its lock, and dispatches callbacks outside
//!   it, each on its own thread.
//! - **Cascading work**: a dispatched callback may re-add items, including
//!   under its own key, restarting the cycle.
//!
//! Eviction is validity-based only: there is no size or count bound, no
//! LRU/LFU, and no persistence.

// Public modules that form the API
pub mod cache;
pub mod entry;
pub mod error;
pub mod event;
pub mod item;
pub mod processor;
pub mod stats;
pub mod validator;

// Internal, crate-only modules
mod task;
mod time;

// Re-export the primary user-facing types for convenience
pub use cache::Cache;
pub use entry::CacheEntry;
pub use error::CacheError;
pub use event::{CacheEvent, CacheListener, EntryField};
pub use item::{AdvancedProcessItem, ProcessItem, ProcessorItem};
pub use processor::{CacheProcessor, SharedItem};
pub use stats::ProcessorStats;
pub use validator::{NullValidator, TimeValidator, Validator};
