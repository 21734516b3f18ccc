//! In-memory server state: fixed-capacity collections mirrored to the
//! flat stores. Nothing here touches I/O; persistence is the service's
//! job, restore is fed raw lines by the recovery manager.

use crate::config::{PING_CAP, POWER_FAILURE_CAP, RECIPIENT_CAP, TANK_REPORT_CAP};
use crate::records::{
    clipped, Line, PowerFailureEvent, Recipient, Record, TankReport, DATE_CAP, SITE_CAP, STAMP_CAP,
};

// ───────────────────────────────────────────────────────────────
// Bounded record log
// ───────────────────────────────────────────────────────────────

/// Outcome of a [`BoundedLog::restore`] pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RestoreStats {
    /// Rows decoded and kept.
    pub restored: usize,
    /// Rows skipped as malformed. Counted in aggregate only.
    pub skipped: usize,
}

/// Append-only bounded collection backed by a `heapless::Vec`.
///
/// Full is full: `try_append` rejects, nothing is evicted, nothing
/// reallocates. Restore replaces the contents wholesale.
#[derive(Debug)]
pub struct BoundedLog<T: Record, const N: usize> {
    items: heapless::Vec<T, N>,
}

impl<T: Record, const N: usize> BoundedLog<T, N> {
    pub fn new() -> Self {
        Self { items: heapless::Vec::new() }
    }

    /// Append one record. Returns `false` when the collection is full;
    /// the caller logs and drops the record.
    pub fn try_append(&mut self, item: T) -> bool {
        self.items.push(item).is_ok()
    }

    /// Replace contents from raw store lines. Malformed rows are skipped
    /// and counted; decoding stops once the collection is full, so the
    /// first capacity-many parsable rows win. Feeding the same lines
    /// twice yields identical contents.
    pub fn restore<'a, I>(&mut self, lines: I) -> RestoreStats
    where
        I: IntoIterator<Item = &'a str>,
    {
        self.items.clear();
        let mut stats = RestoreStats::default();
        for line in lines {
            if self.items.is_full() {
                break;
            }
            match T::decode(line) {
                Some(item) => {
                    let _ = self.items.push(item);
                    stats.restored += 1;
                }
                None => stats.skipped += 1,
            }
        }
        stats
    }

    pub fn all(&self) -> &[T] {
        &self.items
    }

    /// Encode every record for a full store rewrite.
    pub fn snapshot_lines(&self) -> heapless::Vec<Line, N> {
        let mut out = heapless::Vec::new();
        for item in &self.items {
            let _ = out.push(item.encode());
        }
        out
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.items.is_full()
    }
}

impl<T: Record, const N: usize> Default for BoundedLog<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

// ───────────────────────────────────────────────────────────────
// Ping table (ephemeral)
// ───────────────────────────────────────────────────────────────

/// Probe bookkeeping for one (site, tank). Never persisted; a reboot
/// forgets outstanding probes and that is acceptable.
#[derive(Debug, Clone)]
pub struct PingStatus {
    pub site: heapless::String<SITE_CAP>,
    pub tank_number: u8,
    /// Stamp of the last probe sent.
    pub sent_at: heapless::String<STAMP_CAP>,
    /// A probe is out and unanswered.
    pub in_flight: bool,
    /// The last completed probe got a reply.
    pub responded: bool,
}

/// At most one entry per (site, tank), linear scan. New keys are
/// rejected once the table is full.
#[derive(Debug)]
pub struct PingTable {
    entries: heapless::Vec<PingStatus, PING_CAP>,
}

impl PingTable {
    pub fn new() -> Self {
        Self { entries: heapless::Vec::new() }
    }

    fn find_mut(&mut self, site: &str, tank_number: u8) -> Option<&mut PingStatus> {
        self.entries
            .iter_mut()
            .find(|p| p.tank_number == tank_number && p.site.as_str() == site)
    }

    /// Record that a probe went out. Returns `false` if the key is new
    /// and the table is full.
    pub fn note_sent(&mut self, site: &str, tank_number: u8, stamp: &str) -> bool {
        if let Some(entry) = self.find_mut(site, tank_number) {
            entry.sent_at = clipped(stamp);
            entry.in_flight = true;
            return true;
        }
        self.entries
            .push(PingStatus {
                site: clipped(site),
                tank_number,
                sent_at: clipped(stamp),
                in_flight: true,
                responded: false,
            })
            .is_ok()
    }

    /// Record a probe outcome. Creates the entry if the probe predates
    /// the last reboot.
    pub fn note_result(&mut self, site: &str, tank_number: u8, responded: bool) -> bool {
        if let Some(entry) = self.find_mut(site, tank_number) {
            entry.in_flight = false;
            entry.responded = responded;
            return true;
        }
        self.entries
            .push(PingStatus {
                site: clipped(site),
                tank_number,
                sent_at: heapless::String::new(),
                in_flight: false,
                responded,
            })
            .is_ok()
    }

    pub fn get(&self, site: &str, tank_number: u8) -> Option<&PingStatus> {
        self.entries
            .iter()
            .find(|p| p.tank_number == tank_number && p.site.as_str() == site)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for PingTable {
    fn default() -> Self {
        Self::new()
    }
}

// ───────────────────────────────────────────────────────────────
// Send-date ledger
// ───────────────────────────────────────────────────────────────

/// Last daily/monthly report send dates, mirrored as the two-line
/// `email_dates` store. A garbled line just means that report goes out
/// again; compare-never-matches is the failure mode, not a crash.
#[derive(Debug, Default)]
pub struct SendDates {
    pub last_daily: heapless::String<DATE_CAP>,
    pub last_monthly: heapless::String<DATE_CAP>,
}

impl SendDates {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from raw store lines; tolerates zero, one, or two lines.
    pub fn restore<'a, I>(&mut self, lines: I)
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut lines = lines.into_iter();
        self.last_daily = clipped(lines.next().unwrap_or("").trim());
        self.last_monthly = clipped(lines.next().unwrap_or("").trim());
    }

    /// The two ledger lines, daily first.
    pub fn snapshot_lines(&self) -> [Line; 2] {
        [clipped(self.last_daily.as_str()), clipped(self.last_monthly.as_str())]
    }
}

// ───────────────────────────────────────────────────────────────
// Aggregate
// ───────────────────────────────────────────────────────────────

/// Everything the server holds in RAM. Owned by the service, wired up
/// once in `main`.
#[derive(Debug)]
pub struct ServerState {
    pub reports: BoundedLog<TankReport, TANK_REPORT_CAP>,
    pub power_failures: BoundedLog<PowerFailureEvent, POWER_FAILURE_CAP>,
    pub daily_recipients: BoundedLog<Recipient, RECIPIENT_CAP>,
    pub monthly_recipients: BoundedLog<Recipient, RECIPIENT_CAP>,
    pub pings: PingTable,
    pub send_dates: SendDates,
}

impl ServerState {
    pub fn new() -> Self {
        Self {
            reports: BoundedLog::new(),
            power_failures: BoundedLog::new(),
            daily_recipients: BoundedLog::new(),
            monthly_recipients: BoundedLog::new(),
            pings: PingTable::new(),
            send_dates: SendDates::new(),
        }
    }
}

impl Default for ServerState {
    fn default() -> Self {
        Self::new()
    }
}
