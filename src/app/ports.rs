//! Port traits — the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ ServerService (domain)
//! ```
//!
//! Driven adapters (flat store, message transport, wall clock) implement
//! these traits.  The [`ServerService`](super::service::ServerService) and
//! the recovery manager consume them via generics, so the domain core never
//! touches the filesystem or the modem directly.
//!
//! ## Reliability notes
//!
//! - **StorePort** implementations must never panic and never block the
//!   caller on a dead device; failure is a returned error, and the caller
//!   degrades to memory-only operation.
//! - **TransportPort** is best-effort by contract: `false` means the
//!   message did not go out, and the caller logs and moves on. No retries.

use crate::records::{Line, Timestamp};

// ───────────────────────────────────────────────────────────────
// Flat store port (driven adapter: domain ↔ line-oriented files)
// ───────────────────────────────────────────────────────────────

/// Line-oriented persistent storage. One flat namespace of named stores,
/// each an ordered list of text lines.
///
/// The read side yields only terminator-complete lines: a trailing
/// fragment with no `\n` (the leavings of an interrupted append) is
/// dropped here and never reaches the record codec.
pub trait StorePort {
    /// Append one line plus its terminator.
    fn append(&mut self, store: &str, line: &str) -> Result<(), StoreError>;

    /// Every complete line of the store, in order. An absent store reads
    /// as empty; use [`exists`](StorePort::exists) to tell the two apart.
    fn read_all(&self, store: &str) -> Result<Vec<String>, StoreError>;

    /// Replace the store contents with exactly `lines`.
    fn rewrite(&mut self, store: &str, lines: &[Line]) -> Result<(), StoreError>;

    /// Whether the store has ever been written.
    fn exists(&self, store: &str) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Message transport port (driven adapter: domain → cellular uplink)
// ───────────────────────────────────────────────────────────────

/// Outbound notification channel (SMS-gateway e-mail over the modem).
///
/// Returns `true` when the transport accepted the message. `false` is
/// not an error type on purpose: the caller's only recourse is to log
/// and continue, so the signature says exactly that.
pub trait TransportPort {
    fn send(&mut self, destination: &str, subject: &str, body: &str) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Clock port (driven adapter: RTC → domain)
// ───────────────────────────────────────────────────────────────

/// Device-local civil time source.
pub trait ClockPort {
    fn now(&self) -> Timestamp;
}

// ───────────────────────────────────────────────────────────────
// Snapshot delegate (decouples the interval timer from the service)
// ───────────────────────────────────────────────────────────────

/// Callback the snapshot timer invokes when the periodic flush is due.
///
/// This decouples the [`SnapshotScheduler`](crate::snapshot::SnapshotScheduler)
/// from the service and its ports. The main loop implements it by calling
/// [`ServerService::flush_all`](super::service::ServerService::flush_all),
/// but the timer itself knows nothing about stores or clocks.
pub trait SnapshotDelegate {
    /// Called when the periodic flush interval has elapsed.
    fn on_snapshot_due(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`StorePort`] operations.
#[derive(Debug)]
pub enum StoreError {
    /// The backing device never came up; every operation no-ops.
    Unavailable,
    /// Generic I/O error from the storage backend.
    Io,
}

impl core::fmt::Display for StoreError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Unavailable => write!(f, "store unavailable"),
            Self::Io => write!(f, "I/O error"),
        }
    }
}
