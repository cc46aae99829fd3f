use crate::time;

use core::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Decides whether a cache entry is still valid.
///
/// Validators are capability objects shared as `Arc<dyn Validator>`: every
/// holder of the `Arc` can re-arm the validator or force it invalid, so all
/// state lives behind interior mutability. Validators never fail; the only
/// route to "invalid" besides natural expiry is [`mark_invalid`].
///
/// [`mark_invalid`]: Validator::mark_invalid
pub trait Validator: Send + Sync {
  /// Returns whether the guarded entry should be kept.
  fn is_valid(&self) -> bool;

  /// Forces `is_valid` to false until the next reset. The mark is sticky:
  /// it survives any natural state the validator would otherwise report.
  fn mark_invalid(&self);

  /// Clears the invalid mark and re-arms the validator from the current
  /// instant.
  fn reset(&self);

  /// Clears the invalid mark and re-arms against an explicit deadline.
  fn reset_at(&self, deadline: Instant);
}

/// A validator that expires at an absolute instant.
///
/// The duration given at construction is retained: a plain [`reset`] re-arms
/// to `now + original duration`, so repeated resets slide a window of
/// constant width instead of accumulating from the previous deadline.
///
/// [`reset`]: Validator::reset
pub struct TimeValidator {
  /// Expiration as nanoseconds since the crate epoch.
  expires_at: AtomicU64,
  /// The delta captured at construction. Never changes.
  ttl: Duration,
  marked_invalid: AtomicBool,
}

impl TimeValidator {
  /// Creates a validator expiring `ttl` from now.
  pub fn new(ttl: Duration) -> Self {
    Self {
      expires_at: AtomicU64::new(time::now_nanos() + ttl.as_nanos() as u64),
      ttl,
      marked_invalid: AtomicBool::new(false),
    }
  }

  /// The current expiration deadline.
  pub fn expires_at(&self) -> Instant {
    time::nanos_to_instant(self.expires_at.load(Ordering::Relaxed))
  }

  /// The duration-until-expiration captured at construction.
  pub fn ttl(&self) -> Duration {
    self.ttl
  }
}

impl Validator for TimeValidator {
  fn is_valid(&self) -> bool {
    !self.marked_invalid.load(Ordering::Relaxed)
      && time::now_nanos() < self.expires_at.load(Ordering::Relaxed)
  }

  fn mark_invalid(&self) {
    self.marked_invalid.store(true, Ordering::Relaxed);
  }

  fn reset(&self) {
    // Re-arm from the current instant with the construction-time delta,
    // not from the old deadline.
    self
      .expires_at
      .store(time::now_nanos() + self.ttl.as_nanos() as u64, Ordering::Relaxed);
    self.marked_invalid.store(false, Ordering::Relaxed);
  }

  fn reset_at(&self, deadline: Instant) {
    self
      .expires_at
      .store(time::instant_to_nanos(deadline), Ordering::Relaxed);
    self.marked_invalid.store(false, Ordering::Relaxed);
  }
}

impl fmt::Debug for TimeValidator {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("TimeValidator")
      .field("ttl", &self.ttl)
      .field("expires_at", &self.expires_at())
      .field("marked_invalid", &self.marked_invalid.load(Ordering::Relaxed))
      .finish()
  }
}

/// A validator with no time component: it reports whatever `response` is set
/// to, subject to the sticky invalid mark.
#[derive(Debug)]
pub struct NullValidator {
  response: AtomicBool,
  marked_invalid: AtomicBool,
}

impl NullValidator {
  pub fn new(response: bool) -> Self {
    Self {
      response: AtomicBool::new(response),
      marked_invalid: AtomicBool::new(false),
    }
  }

  /// Sets the answer `is_valid` gives while no invalid mark is set.
  pub fn set_response(&self, response: bool) {
    self.response.store(response, Ordering::Relaxed);
  }

  pub fn response(&self) -> bool {
    self.response.load(Ordering::Relaxed)
  }
}

impl Validator for NullValidator {
  fn is_valid(&self) -> bool {
    !self.marked_invalid.load(Ordering::Relaxed) && self.response.load(Ordering::Relaxed)
  }

  fn mark_invalid(&self) {
    self.marked_invalid.store(true, Ordering::Relaxed);
  }

  fn reset(&self) {
    self.marked_invalid.store(false, Ordering::Relaxed);
  }

  fn reset_at(&self, _deadline: Instant) {
    // No deadline to re-arm; only the mark is cleared.
    self.marked_invalid.store(false, Ordering::Relaxed);
  }
}
