use core::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crossbeam_utils::CachePadded;

/// Internal processor counters. Padded to keep the two hot counters off the
/// same cache line.
#[derive(Debug, Default)]
pub(crate) struct Counters {
  pub(crate) total_received: CachePadded<AtomicU64>,
  pub(crate) total_processed: CachePadded<AtomicU64>,
}

impl Counters {
  pub(crate) fn snapshot(
    &self,
    count: usize,
    is_running: bool,
    running_time: Duration,
  ) -> ProcessorStats {
    ProcessorStats {
      total_received: self.total_received.load(Ordering::Relaxed),
      total_processed: self.total_processed.load(Ordering::Relaxed),
      count,
      is_running,
      running_time,
    }
  }
}

/// A point-in-time snapshot of a processor's activity.
#[derive(Clone)]
pub struct ProcessorStats {
  /// Items accepted by `add` over the processor's lifetime.
  pub total_received: u64,
  /// Items dispatched for processing over the processor's lifetime.
  pub total_processed: u64,
  /// Items currently cached.
  pub count: usize,
  /// Whether the background driver is running.
  pub is_running: bool,
  /// Time since the last `start`, or zero when stopped.
  pub running_time: Duration,
}

impl fmt::Debug for ProcessorStats {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("ProcessorStats")
      .field("total_received", &self.total_received)
      .field("total_processed", &self.total_processed)
      .field("count", &self.count)
      .field("is_running", &self.is_running)
      .field("running_time", &self.running_time)
      .finish()
  }
}
