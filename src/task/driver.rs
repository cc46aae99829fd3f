use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use fibre::mpsc;
use fibre::RecvErrorTimeout;
use tracing::trace;

/// The hooks a driver invokes from its background thread.
pub(crate) struct DriverHooks {
  pub(crate) on_start: Box<dyn FnMut() + Send>,
  pub(crate) on_tick: Box<dyn FnMut() + Send>,
  pub(crate) on_stop: Box<dyn FnMut() + Send>,
}

enum Command {
  /// Run one out-of-band tick. The ack channel, when present, is signalled
  /// after the tick completes.
  Tick(Option<mpsc::UnboundedSender<()>>),
  Stop,
}

/// A periodic background driver: one thread, discrete tick invocations at a
/// fixed interval, with support for forced out-of-band ticks.
///
/// The timer wait doubles as the control channel, so a command interrupts
/// the sleep immediately instead of waiting out the interval.
pub(crate) struct PeriodicDriver {
  tx: mpsc::UnboundedSender<Command>,
  handle: Option<JoinHandle<()>>,
  alive: Arc<AtomicBool>,
}

impl PeriodicDriver {
  /// Spawns the driver thread. `on_start` runs first, then ticks at
  /// `interval` until stopped, then `on_stop`.
  pub(crate) fn spawn(interval: Duration, mut hooks: DriverHooks) -> Self {
    let (tx, rx) = mpsc::unbounded::<Command>();
    let alive = Arc::new(AtomicBool::new(true));
    let alive_flag = alive.clone();

    let handle = thread::spawn(move || {
      (hooks.on_start)();
      loop {
        match rx.recv_timeout(interval) {
          Err(RecvErrorTimeout::Timeout) => {
            trace!("driver tick");
            (hooks.on_tick)();
          }
          Ok(Command::Tick(ack)) => {
            trace!("driver forced tick");
            (hooks.on_tick)();
            if let Some(ack) = ack {
              let _ = ack.send(());
            }
          }
          Ok(Command::Stop) | Err(_) => break,
        }
      }
      (hooks.on_stop)();
      alive_flag.store(false, Ordering::Release);
    });

    Self {
      tx,
      handle: Some(handle),
      alive,
    }
  }

  /// Forces one out-of-band tick. When `wait` is true, blocks until that
  /// tick has completed.
  pub(crate) fn execute_now(&self, wait: bool) {
    if wait {
      let (ack_tx, ack_rx) = mpsc::unbounded::<()>();
      if self.tx.send(Command::Tick(Some(ack_tx))).is_ok() {
        let _ = ack_rx.recv();
      }
    } else {
      let _ = self.tx.send(Command::Tick(None));
    }
  }

  pub(crate) fn is_alive(&self) -> bool {
    self.alive.load(Ordering::Acquire)
  }

  /// Stops the driver and joins its thread; `on_stop` has run synchronously
  /// by the time this returns.
  pub(crate) fn stop(mut self) {
    let _ = self.tx.send(Command::Stop);
    if let Some(handle) = self.handle.take() {
      let _ = handle.join();
    }
  }
}

impl Drop for PeriodicDriver {
  fn drop(&mut self) {
    // A driver dropped without `stop` still terminates: the stop command
    // (or the disconnected channel) breaks the loop on its next wakeup.
    let _ = self.tx.send(Command::Stop);
  }
}
