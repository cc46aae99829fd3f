use crate::error::CacheError;
use crate::event::{EntryField, ListenerSet};
use crate::time;
use crate::validator::Validator;

use core::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Instant;

use uuid::Uuid;

/// A container for one cached value: payload, validator, identity, and
/// access/validity metrics.
///
/// Entries are owned exclusively by one cache slot. They come to life when
/// added to a [`Cache`](crate::Cache) and are dropped only when explicitly
/// removed from it.
pub struct CacheEntry<T> {
  id: String,
  payload: T,
  validator: Arc<dyn Validator>,
  created_at: Instant,
  /// Nanoseconds since the crate epoch; 0 means "never checked".
  last_validity_check: AtomicU64,
  /// Nanoseconds since the crate epoch; 0 means "never accessed".
  last_payload_access: AtomicU64,
  /// Installed by the owning cache so in-place field setters can notify its
  /// listeners. `None` while the entry is outside any cache.
  listeners: Option<Weak<ListenerSet<T>>>,
}

impl<T> CacheEntry<T> {
  /// Creates an entry with a generated unique id.
  pub fn new(payload: T, validator: Arc<dyn Validator>) -> Self {
    Self::build(Uuid::new_v4().to_string(), payload, validator)
  }

  /// Creates an entry with a caller-supplied id. An empty id is rejected.
  pub fn with_id(
    id: impl Into<String>,
    payload: T,
    validator: Arc<dyn Validator>,
  ) -> Result<Self, CacheError> {
    let id = id.into();
    if id.is_empty() {
      return Err(CacheError::EmptyId);
    }
    Ok(Self::build(id, payload, validator))
  }

  fn build(id: String, payload: T, validator: Arc<dyn Validator>) -> Self {
    Self {
      id,
      payload,
      validator,
      created_at: Instant::now(),
      last_validity_check: AtomicU64::new(0),
      last_payload_access: AtomicU64::new(0),
      listeners: None,
    }
  }

  pub fn id(&self) -> &str {
    &self.id
  }

  /// Reads the payload. Every read stamps `last_payload_access`.
  pub fn payload(&self) -> &T {
    self.touch_payload();
    &self.payload
  }

  /// Mutable access to the payload. Stamps `last_payload_access`; in-place
  /// mutation through the returned reference does not raise a field
  /// notification (use [`set_payload`](Self::set_payload) for that).
  pub fn payload_mut(&mut self) -> &mut T {
    self.touch_payload();
    &mut self.payload
  }

  /// Replaces the payload and notifies the owning cache's listeners with
  /// [`EntryField::Payload`].
  pub fn set_payload(&mut self, payload: T) {
    self.payload = payload;
    self.touch_payload();
    self.notify(EntryField::Payload);
  }

  pub fn validator(&self) -> Arc<dyn Validator> {
    self.validator.clone()
  }

  /// Replaces the validator and notifies the owning cache's listeners with
  /// [`EntryField::Validator`].
  pub fn set_validator(&mut self, validator: Arc<dyn Validator>) {
    self.validator = validator;
    self.notify(EntryField::Validator);
  }

  /// Delegates to the validator.
  ///
  /// Checking validity is itself observable: the check instant is recorded in
  /// `last_validity_check` for diagnostics. The stamp never feeds back into
  /// the purge decision.
  pub fn is_valid(&self) -> bool {
    self
      .last_validity_check
      .store(time::now_nanos(), Ordering::Relaxed);
    self.validator.is_valid()
  }

  pub fn created_at(&self) -> Instant {
    self.created_at
  }

  /// The instant of the most recent `is_valid` call, or `None` if validity
  /// was never checked.
  pub fn last_validity_check(&self) -> Option<Instant> {
    match self.last_validity_check.load(Ordering::Relaxed) {
      0 => None,
      nanos => Some(time::nanos_to_instant(nanos)),
    }
  }

  /// The instant of the most recent payload read or write, or `None` if the
  /// payload was never touched.
  pub fn last_payload_access(&self) -> Option<Instant> {
    match self.last_payload_access.load(Ordering::Relaxed) {
      0 => None,
      nanos => Some(time::nanos_to_instant(nanos)),
    }
  }

  pub(crate) fn attach(&mut self, listeners: &Arc<ListenerSet<T>>) {
    self.listeners = Some(Arc::downgrade(listeners));
  }

  pub(crate) fn detach(&mut self) {
    self.listeners = None;
  }

  #[inline]
  fn touch_payload(&self) {
    self
      .last_payload_access
      .store(time::now_nanos(), Ordering::Relaxed);
  }

  fn notify(&self, field: EntryField) {
    if let Some(listeners) = self.listeners.as_ref().and_then(Weak::upgrade) {
      listeners.emit_entry_change(self, field);
    }
  }
}

impl<T> fmt::Debug for CacheEntry<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("CacheEntry")
      .field("id", &self.id)
      .field("created_at", &self.created_at)
      .field("last_validity_check", &self.last_validity_check())
      .field("last_payload_access", &self.last_payload_access())
      .finish_non_exhaustive()
  }
}
