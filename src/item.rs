use crate::error::CacheError;
use crate::validator::Validator;

use core::fmt;
use std::any::Any;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use parking_lot::RwLock;

/// The read-only view of a processor work item.
///
/// This is the view ordinary holders get: the execution flag can be read but
/// not written, so user code cannot forge completion state. The write half
/// lives on [`AdvancedProcessItem`], which only the processor exercises.
pub trait ProcessItem: Send + Sync {
  /// The cache key this item claims.
  fn key(&self) -> &str;

  /// The validator deciding when the item is purged.
  fn validator(&self) -> Arc<dyn Validator>;

  /// Wall-clock creation time.
  fn created_at_utc(&self) -> SystemTime;

  /// How long the item has been cached: now minus creation time, clamped to
  /// zero if the wall clock moved backwards.
  fn cached_time(&self) -> Duration {
    SystemTime::now()
      .duration_since(self.created_at_utc())
      .unwrap_or(Duration::ZERO)
  }

  /// Whether the item's callback has been dispatched. Set by the processor
  /// immediately before the callback runs, so a re-entrant inspection from
  /// inside the callback already observes `true`.
  fn has_process_executed(&self) -> bool;

  /// Invokes the item's callback with the item itself.
  fn run(self: Arc<Self>);

  /// Type-erased handle for [`CacheProcessor::find_as`].
  ///
  /// [`CacheProcessor::find_as`]: crate::CacheProcessor::find_as
  fn as_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

/// The privileged read-write view of a processor work item.
///
/// A second trait view over the same concrete type: the processor stores
/// items through this trait and can mark completion or swap the validator;
/// everything it hands back out is narrowed to [`ProcessItem`].
pub trait AdvancedProcessItem: ProcessItem {
  fn set_process_executed(&self, executed: bool);

  /// Replaces the validator, e.g. to re-arm the item with a new expiration.
  fn set_validator(&self, validator: Arc<dyn Validator>);

  /// Narrows this item to its read-only view.
  fn as_process_item(self: Arc<Self>) -> Arc<dyn ProcessItem>;
}

type ProcessFn = dyn Fn(Arc<dyn ProcessItem>) + Send + Sync;

/// The standard work item: a key, a validator, and a callback to run when
/// the item is evicted.
///
/// Key and callback are immutable after construction. The validator is
/// replaceable and the execution flag writable, both only through the
/// [`AdvancedProcessItem`] view.
pub struct ProcessorItem {
  key: String,
  validator: RwLock<Arc<dyn Validator>>,
  process: Arc<ProcessFn>,
  created_at_utc: SystemTime,
  executed: AtomicBool,
}

impl ProcessorItem {
  /// Creates an item. An empty key is rejected; validator and callback
  /// cannot be absent by construction.
  pub fn new(
    key: impl Into<String>,
    validator: Arc<dyn Validator>,
    process: impl Fn(Arc<dyn ProcessItem>) + Send + Sync + 'static,
  ) -> Result<Self, CacheError> {
    let key = key.into();
    if key.is_empty() {
      return Err(CacheError::EmptyKey);
    }
    Ok(Self {
      key,
      validator: RwLock::new(validator),
      process: Arc::new(process),
      created_at_utc: SystemTime::now(),
      executed: AtomicBool::new(false),
    })
  }
}

impl ProcessItem for ProcessorItem {
  fn key(&self) -> &str {
    &self.key
  }

  fn validator(&self) -> Arc<dyn Validator> {
    self.validator.read().clone()
  }

  fn created_at_utc(&self) -> SystemTime {
    self.created_at_utc
  }

  fn has_process_executed(&self) -> bool {
    self.executed.load(Ordering::Acquire)
  }

  fn run(self: Arc<Self>) {
    let process = self.process.clone();
    process(self as Arc<dyn ProcessItem>);
  }

  fn as_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
    self
  }
}

impl AdvancedProcessItem for ProcessorItem {
  fn set_process_executed(&self, executed: bool) {
    self.executed.store(executed, Ordering::Release);
  }

  fn set_validator(&self, validator: Arc<dyn Validator>) {
    *self.validator.write() = validator;
  }

  fn as_process_item(self: Arc<Self>) -> Arc<dyn ProcessItem> {
    self
  }
}

impl fmt::Debug for ProcessorItem {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("ProcessorItem")
      .field("key", &self.key)
      .field("created_at_utc", &self.created_at_utc)
      .field("has_process_executed", &self.executed.load(Ordering::Relaxed))
      .finish_non_exhaustive()
  }
}
