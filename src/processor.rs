use crate::cache::Cache;
use crate::entry::CacheEntry;
use crate::error::CacheError;
use crate::event::CacheListener;
use crate::item::{AdvancedProcessItem, ProcessItem};
use crate::stats::{Counters, ProcessorStats};
use crate::task::driver::{DriverHooks, PeriodicDriver};
use crate::validator::Validator;

use core::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::{debug, error};

/// The payload the processor caches: one shared work item per key, held
/// through the privileged write view.
pub type SharedItem = Arc<dyn AdvancedProcessItem>;

/// A cache of work items with a periodic background eviction loop.
///
/// On each tick the processor purges invalid items under its lock, then
/// dispatches each purged item's callback on its own thread, outside the
/// lock. Every evicted item's callback runs exactly once; a callback is free
/// to re-enter [`add`](Self::add), including under the key it was just
/// purged from, to schedule cascading work.
///
/// All public methods take `&self`; share the processor across threads by
/// wrapping it in an `Arc`.
pub struct CacheProcessor {
  shared: Arc<ProcessorShared>,
  driver: Mutex<Option<PeriodicDriver>>,
}

struct ProcessorShared {
  /// The single lock guarding all access to the cache. Held only for map
  /// mutation, never across callback dispatch.
  cache: Mutex<Cache<SharedItem>>,
  counters: Counters,
  started_at: Mutex<Option<Instant>>,
  /// Consulted by the driver's on-stop hook.
  drain_on_stop: AtomicBool,
}

impl CacheProcessor {
  pub fn new() -> Self {
    Self {
      shared: Arc::new(ProcessorShared {
        cache: Mutex::new(Cache::new()),
        counters: Counters::default(),
        started_at: Mutex::new(None),
        drain_on_stop: AtomicBool::new(false),
      }),
      driver: Mutex::new(None),
    }
  }

  /// Starts the periodic driver with the given tick interval. A no-op if
  /// the processor is already running.
  pub fn start(&self, interval: Duration) {
    let mut slot = self.driver.lock();
    if slot.is_some() {
      return;
    }

    let tick_shared = self.shared.clone();
    let stop_shared = self.shared.clone();
    let hooks = DriverHooks {
      // Reserved; nothing to do on startup yet.
      on_start: Box::new(|| {}),
      on_tick: Box::new(move || ProcessorShared::tick(&tick_shared)),
      on_stop: Box::new(move || ProcessorShared::drain(&stop_shared)),
    };

    *self.shared.started_at.lock() = Some(Instant::now());
    *slot = Some(PeriodicDriver::spawn(interval, hooks));
    debug!(interval_ms = interval.as_millis() as u64, "cache processor started");
  }

  /// Stops the periodic driver. A no-op if the processor is not running.
  ///
  /// When `execute_remaining_on_stop` is set, every item still cached,
  /// valid or not, is drained and dispatched as part of shutdown; either
  /// way the cache is left empty. The drain runs synchronously inside this
  /// call, but the dispatched callbacks themselves do not: "stopped" means
  /// no further ticks, not that all callbacks have finished.
  pub fn stop(&self, execute_remaining_on_stop: bool) {
    let mut slot = self.driver.lock();
    let Some(driver) = slot.take() else {
      return;
    };
    self
      .shared
      .drain_on_stop
      .store(execute_remaining_on_stop, Ordering::Release);
    // Runs the on-stop drain synchronously and joins the driver thread.
    driver.stop();
    *self.shared.started_at.lock() = None;
    debug!(drained = execute_remaining_on_stop, "cache processor stopped");
  }

  /// Accepts a work item, keyed by the item's own key.
  ///
  /// A live item under the same key is a hard [`CacheError::DuplicateKey`];
  /// an item evicted earlier under that key does not collide, because
  /// eviction removes it before its callback is dispatched.
  pub fn add(&self, item: SharedItem) -> Result<(), CacheError> {
    let key = item.key().to_string();
    if key.is_empty() {
      return Err(CacheError::EmptyKey);
    }
    // The entry checks validity through the item, so a validator swapped in
    // later via the advanced view takes effect without re-adding.
    let validator: Arc<dyn Validator> = Arc::new(ItemValidator {
      item: Arc::downgrade(&item),
    });
    let entry = CacheEntry::with_id(key, item, validator)?;
    {
      let mut cache = self.shared.cache.lock();
      cache.add(entry)?;
    }
    self
      .shared
      .counters
      .total_received
      .fetch_add(1, Ordering::Relaxed);
    Ok(())
  }

  /// Removes and returns the item under `key` without dispatching it.
  pub fn remove(&self, key: &str) -> Option<Arc<dyn ProcessItem>> {
    let mut cache = self.shared.cache.lock();
    cache
      .remove(key)
      .map(|entry| entry.payload().clone().as_process_item())
  }

  pub fn contains(&self, key: &str) -> bool {
    self.shared.cache.lock().contains(key)
  }

  /// Looks up the item under `key`. Never fails for a missing key.
  pub fn find(&self, key: &str) -> Option<Arc<dyn ProcessItem>> {
    let cache = self.shared.cache.lock();
    cache
      .get(key)
      .map(|entry| entry.payload().clone().as_process_item())
  }

  /// Typed lookup: the item under `key`, downcast to its concrete type.
  /// `None` if the key is missing or the item is not a `T`.
  pub fn find_as<T>(&self, key: &str) -> Option<Arc<T>>
  where
    T: ProcessItem + 'static,
  {
    let item = {
      let cache = self.shared.cache.lock();
      cache.get(key).map(|entry| entry.payload().clone())
    }?;
    item.as_process_item().as_any_arc().downcast::<T>().ok()
  }

  /// Registers a listener on the underlying cache; the processor forwards
  /// the cache's change events verbatim.
  pub fn add_listener(&self, listener: Arc<dyn CacheListener<SharedItem>>) {
    self.shared.cache.lock().add_listener(listener);
  }

  /// Forces an immediate out-of-schedule tick and waits for its purge and
  /// dispatch hand-off to complete. A no-op when the processor is stopped.
  pub fn flush(&self) {
    let slot = self.driver.lock();
    if let Some(driver) = slot.as_ref() {
      driver.execute_now(true);
    }
  }

  pub fn count(&self) -> usize {
    self.shared.cache.lock().len()
  }

  pub fn is_running(&self) -> bool {
    self
      .driver
      .lock()
      .as_ref()
      .map_or(false, PeriodicDriver::is_alive)
  }

  /// The instant of the last `start`, or `None` when stopped.
  pub fn started_at(&self) -> Option<Instant> {
    *self.shared.started_at.lock()
  }

  /// Time since the last `start`, or zero when stopped.
  pub fn running_time(&self) -> Duration {
    self
      .started_at()
      .map(|started| started.elapsed())
      .unwrap_or(Duration::ZERO)
  }

  pub fn total_received(&self) -> u64 {
    self.shared.counters.total_received.load(Ordering::Relaxed)
  }

  pub fn total_processed(&self) -> u64 {
    self.shared.counters.total_processed.load(Ordering::Relaxed)
  }

  pub fn stats(&self) -> ProcessorStats {
    let count = self.count();
    self
      .shared
      .counters
      .snapshot(count, self.is_running(), self.running_time())
  }
}

impl Default for CacheProcessor {
  fn default() -> Self {
    Self::new()
  }
}

impl Drop for CacheProcessor {
  fn drop(&mut self) {
    if let Some(driver) = self.driver.lock().take() {
      self.shared.drain_on_stop.store(false, Ordering::Release);
      driver.stop();
    }
  }
}

impl fmt::Debug for CacheProcessor {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("CacheProcessor")
      .field("stats", &self.stats())
      .finish_non_exhaustive()
  }
}

impl ProcessorShared {
  /// One driver tick: purge under the lock, dispatch outside it.
  fn tick(shared: &Arc<ProcessorShared>) {
    let purged = {
      let mut cache = shared.cache.lock();
      cache.purge()
    };
    if purged.is_empty() {
      return;
    }
    debug!(count = purged.len(), "purged invalid items");
    Self::dispatch_all(shared, purged);
  }

  /// Shutdown drain: the cache is emptied either way; the removed items are
  /// dispatched only when the stop requested it.
  fn drain(shared: &Arc<ProcessorShared>) {
    let dispatch = shared.drain_on_stop.load(Ordering::Acquire);
    let removed = {
      let mut cache = shared.cache.lock();
      // An idle stop should not fire a spurious Reset at listeners.
      if cache.is_empty() {
        return;
      }
      if dispatch {
        // Flag before removal, so listeners observing the Removed events see
        // items already marked as dispatched.
        for (_, entry) in cache.iter() {
          entry.payload().set_process_executed(true);
        }
      }
      cache.clear()
    };
    debug!(count = removed.len(), dispatch, "drained remaining items on stop");
    if dispatch {
      Self::dispatch_all(shared, removed);
    }
  }

  /// Dispatches each evicted item's callback on its own thread: independent,
  /// unsupervised, unordered relative to other dispatches and later ticks.
  ///
  /// The execution flag is set before the callback is invoked. A panicking
  /// callback is caught on its dispatch thread and reported through
  /// `tracing`; it never reaches the processor or other dispatches.
  fn dispatch_all(shared: &Arc<ProcessorShared>, entries: Vec<CacheEntry<SharedItem>>) {
    for entry in entries {
      let item = entry.payload().clone();
      item.set_process_executed(true);
      shared
        .counters
        .total_processed
        .fetch_add(1, Ordering::Relaxed);

      thread::spawn(move || {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| item.clone().run()));
        if outcome.is_err() {
          error!(key = %item.key(), "processor callback panicked");
        }
      });
    }
  }
}

/// Defers validity to whatever validator the wrapped item currently carries,
/// so replacing the validator through the advanced view re-arms the cached
/// entry as well.
struct ItemValidator {
  item: Weak<dyn AdvancedProcessItem>,
}

impl Validator for ItemValidator {
  fn is_valid(&self) -> bool {
    match self.item.upgrade() {
      Some(item) => item.validator().is_valid(),
      // The item is gone; nothing left worth keeping.
      None => false,
    }
  }

  fn mark_invalid(&self) {
    if let Some(item) = self.item.upgrade() {
      item.validator().mark_invalid();
    }
  }

  fn reset(&self) {
    if let Some(item) = self.item.upgrade() {
      item.validator().reset();
    }
  }

  fn reset_at(&self, deadline: Instant) {
    if let Some(item) = self.item.upgrade() {
      item.validator().reset_at(deadline);
    }
  }
}
