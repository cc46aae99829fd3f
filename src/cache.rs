use crate::entry::CacheEntry;
use crate::error::CacheError;
use crate::event::{CacheEvent, CacheListener, ListenerSet};

use core::fmt;
use std::collections::hash_map::Entry as MapEntry;
use std::collections::HashMap;
use std::sync::Arc;

/// An unordered keyed store of [`CacheEntry`] values with change
/// notification.
///
/// Keys are unique, non-empty strings; the default key for an entry added
/// without one is the entry's id. The cache holds no internal lock and is
/// safe for single-threaded use only: all mutations take `&mut self`, and
/// concurrent correctness is the caller's responsibility (the
/// [`CacheProcessor`](crate::CacheProcessor) supplies it with an external
/// mutex).
pub struct Cache<T> {
  map: HashMap<String, CacheEntry<T>, ahash::RandomState>,
  listeners: Arc<ListenerSet<T>>,
}

impl<T> Default for Cache<T> {
  fn default() -> Self {
    Self::new()
  }
}

impl<T> Cache<T> {
  pub fn new() -> Self {
    Self {
      map: HashMap::default(),
      listeners: Arc::new(ListenerSet::new()),
    }
  }

  /// Registers a listener for this cache's change stream. Events are
  /// delivered synchronously on the mutating thread.
  pub fn add_listener(&self, listener: Arc<dyn CacheListener<T>>) {
    self.listeners.add(listener);
  }

  /// Adds an entry under its own id.
  pub fn add(&mut self, entry: CacheEntry<T>) -> Result<(), CacheError> {
    let key = entry.id().to_string();
    self.add_with_key(key, entry)
  }

  /// Adds an entry under an explicit key. Fails if the key is empty or
  /// already present. Emits [`CacheEvent::Added`].
  pub fn add_with_key(
    &mut self,
    key: impl Into<String>,
    mut entry: CacheEntry<T>,
  ) -> Result<(), CacheError> {
    let key = key.into();
    if key.is_empty() {
      return Err(CacheError::EmptyKey);
    }
    match self.map.entry(key) {
      MapEntry::Occupied(slot) => Err(CacheError::DuplicateKey(slot.key().clone())),
      MapEntry::Vacant(slot) => {
        entry.attach(&self.listeners);
        let inserted = slot.insert(entry);
        self.listeners.emit(&CacheEvent::Added(inserted));
        Ok(())
      }
    }
  }

  /// Looks up an entry. Never fails for a missing key.
  pub fn get(&self, key: &str) -> Option<&CacheEntry<T>> {
    self.map.get(key)
  }

  pub fn get_mut(&mut self, key: &str) -> Option<&mut CacheEntry<T>> {
    self.map.get_mut(key)
  }

  pub fn contains(&self, key: &str) -> bool {
    self.map.contains_key(key)
  }

  pub fn keys(&self) -> impl Iterator<Item = &str> {
    self.map.keys().map(String::as_str)
  }

  pub fn iter(&self) -> impl Iterator<Item = (&str, &CacheEntry<T>)> {
    self.map.iter().map(|(key, entry)| (key.as_str(), entry))
  }

  pub fn len(&self) -> usize {
    self.map.len()
  }

  pub fn is_empty(&self) -> bool {
    self.map.is_empty()
  }

  /// Removes and returns the entry under `key`, emitting
  /// [`CacheEvent::Removed`]. Returns `None` for a missing key.
  pub fn remove(&mut self, key: &str) -> Option<CacheEntry<T>> {
    let mut entry = self.map.remove(key)?;
    entry.detach();
    self.listeners.emit(&CacheEvent::Removed(&entry));
    Some(entry)
  }

  /// Swaps the entry under an existing key, returning the old one.
  ///
  /// This is a replace, not an upsert: a missing key is a hard
  /// [`CacheError::KeyNotFound`]. Emits one [`CacheEvent::Replaced`]
  /// carrying both entries.
  pub fn replace(
    &mut self,
    key: &str,
    mut entry: CacheEntry<T>,
  ) -> Result<CacheEntry<T>, CacheError> {
    match self.map.entry(key.to_string()) {
      MapEntry::Vacant(_) => Err(CacheError::KeyNotFound(key.to_string())),
      MapEntry::Occupied(mut slot) => {
        entry.attach(&self.listeners);
        let mut old = slot.insert(entry);
        old.detach();
        let new = slot.into_mut();
        self.listeners.emit(&CacheEvent::Replaced { old: &old, new: &*new });
        Ok(old)
      }
    }
  }

  /// Removes every entry whose validator currently reports invalid.
  ///
  /// Two-phase: the keys of all invalid entries are snapshotted first, so
  /// each entry's validity is checked exactly once per pass and the backing
  /// map is never mutated while it is being scanned. Each removal then goes
  /// through [`remove`](Self::remove) and fires its own `Removed` event.
  pub fn purge(&mut self) -> Vec<CacheEntry<T>> {
    let stale: Vec<String> = self
      .map
      .iter()
      .filter(|(_, entry)| !entry.is_valid())
      .map(|(key, _)| key.clone())
      .collect();

    stale
      .into_iter()
      .filter_map(|key| self.remove(&key))
      .collect()
  }

  /// Like [`purge`](Self::purge), but reports whether anything was removed:
  /// `None` when every entry was still valid.
  pub fn try_purge(&mut self) -> Option<Vec<CacheEntry<T>>> {
    let removed = self.purge();
    if removed.is_empty() {
      None
    } else {
      Some(removed)
    }
  }

  /// Removes every entry, each through [`remove`](Self::remove) so each
  /// fires its own `Removed` event, then emits one [`CacheEvent::Reset`].
  /// Returns all removed entries.
  pub fn clear(&mut self) -> Vec<CacheEntry<T>> {
    let keys: Vec<String> = self.map.keys().cloned().collect();
    let removed: Vec<CacheEntry<T>> = keys
      .into_iter()
      .filter_map(|key| self.remove(&key))
      .collect();
    self.listeners.emit(&CacheEvent::Reset);
    removed
  }
}

impl<T> fmt::Debug for Cache<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Cache")
      .field("len", &self.map.len())
      .finish_non_exhaustive()
  }
}
