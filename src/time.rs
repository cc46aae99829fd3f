use once_cell::sync::Lazy;
use std::time::{Duration, Instant};

// The single, static reference point for all time calculations in the crate.
// It is initialized lazily on its first use.
static CRATE_EPOCH: Lazy<Instant> = Lazy::new(Instant::now);

/// Converts an `Instant` into nanoseconds since the crate's epoch, so that a
/// timestamp can live in an `AtomicU64` and be stamped through `&self`.
#[inline]
pub(crate) fn instant_to_nanos(instant: Instant) -> u64 {
  instant.saturating_duration_since(*CRATE_EPOCH).as_nanos() as u64
}

/// Converts a nanosecond offset from the crate's epoch back into an `Instant`.
#[inline]
pub(crate) fn nanos_to_instant(nanos: u64) -> Instant {
  *CRATE_EPOCH + Duration::from_nanos(nanos)
}

/// A helper to get the current time as nanoseconds since the epoch.
#[inline]
pub(crate) fn now_nanos() -> u64 {
  instant_to_nanos(Instant::now())
}
