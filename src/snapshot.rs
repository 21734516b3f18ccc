//! Periodic snapshot timer.
//!
//! Write-through persistence covers every accepted mutation as it
//! happens; this timer is the unconditional safety net on top. Every
//! `interval_secs` it asks the delegate to flush, and the full rewrite
//! repairs whatever an interrupted write left behind — truncated rows,
//! a stale marker, a store that drifted from memory.
//!
//! ```text
//!   main loop tick ──▶ SnapshotScheduler ──▶ SnapshotDelegate
//!                        (interval timer)      (flush_all)
//! ```

use log::info;

use crate::app::ports::SnapshotDelegate;

/// Fires the periodic full flush. Pure timing; what "flush" means is
/// the delegate's business.
pub struct SnapshotScheduler {
    /// Seconds between unconditional flushes.
    interval_secs: u32,
    /// Ticks since the last fire.
    elapsed_ticks: u64,
    /// Total fires since boot.
    fire_count: u32,
}

impl SnapshotScheduler {
    pub fn new(interval_secs: u32) -> Self {
        Self { interval_secs, elapsed_ticks: 0, fire_count: 0 }
    }

    /// Tick the timer. Call once per main loop pass.
    ///
    /// Returns `true` when the delegate was invoked this tick.
    pub fn tick(&mut self, tick_secs: f32, delegate: &mut dyn SnapshotDelegate) -> bool {
        self.elapsed_ticks += 1;
        let elapsed_secs = self.elapsed_ticks as f32 * tick_secs;
        if elapsed_secs < self.interval_secs as f32 {
            return false;
        }

        self.fire_count += 1;
        info!("snapshot: periodic flush #{} (every {}s)", self.fire_count, self.interval_secs);
        delegate.on_snapshot_due();
        self.elapsed_ticks = 0;
        true
    }

    /// Total fires since boot.
    pub fn fire_count(&self) -> u32 {
        self.fire_count
    }
}
