use crate::entry::CacheEntry;

use core::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

/// Identifies which entry field changed in an entry-level notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryField {
  Payload,
  Validator,
}

/// A change in the cache, borrowed from the mutation that produced it.
///
/// Events are delivered synchronously on the mutating thread, after the
/// mutation is committed and before the mutating call returns, in mutation
/// order.
pub enum CacheEvent<'a, T> {
  /// An entry was added under a new key.
  Added(&'a CacheEntry<T>),
  /// An entry was removed; the borrow covers the entry on its way out.
  Removed(&'a CacheEntry<T>),
  /// An existing key had its entry swapped.
  Replaced {
    old: &'a CacheEntry<T>,
    new: &'a CacheEntry<T>,
  },
  /// The cache was cleared. Individual removals have already fired their own
  /// `Removed` events.
  Reset,
}

impl<T> fmt::Debug for CacheEvent<'_, T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      CacheEvent::Added(entry) => f.debug_tuple("Added").field(&entry.id()).finish(),
      CacheEvent::Removed(entry) => f.debug_tuple("Removed").field(&entry.id()).finish(),
      CacheEvent::Replaced { old, new } => f
        .debug_struct("Replaced")
        .field("old", &old.id())
        .field("new", &new.id())
        .finish(),
      CacheEvent::Reset => f.write_str("Reset"),
    }
  }
}

/// A listener registered with a cache to observe its change stream.
pub trait CacheListener<T>: Send + Sync {
  /// Called for every committed mutation.
  fn on_change(&self, event: &CacheEvent<'_, T>);

  /// Called when a field of an owned entry is set in place, distinguishable
  /// by field. Default is a no-op.
  fn on_entry_change(&self, _entry: &CacheEntry<T>, _field: EntryField) {}
}

/// The shared listener registry.
///
/// The cache holds the owning `Arc`; entries hold a `Weak` back-reference so
/// their field setters can notify without going through the cache. An entry
/// outside any cache therefore notifies no one.
pub(crate) struct ListenerSet<T> {
  listeners: RwLock<Vec<Arc<dyn CacheListener<T>>>>,
}

impl<T> ListenerSet<T> {
  pub(crate) fn new() -> Self {
    Self {
      listeners: RwLock::new(Vec::new()),
    }
  }

  pub(crate) fn add(&self, listener: Arc<dyn CacheListener<T>>) {
    self.listeners.write().push(listener);
  }

  pub(crate) fn emit(&self, event: &CacheEvent<'_, T>) {
    // Snapshot the registrations so a listener that registers another
    // listener from inside its callback does not deadlock on the lock.
    let listeners = self.listeners.read().clone();
    for listener in &listeners {
      listener.on_change(event);
    }
  }

  pub(crate) fn emit_entry_change(&self, entry: &CacheEntry<T>, field: EntryField) {
    let listeners = self.listeners.read().clone();
    for listener in &listeners {
      listener.on_entry_change(entry, field);
    }
  }
}
