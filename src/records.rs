//! Domain records and the flat-store line codec.
//!
//! Every persisted record is one comma-delimited text line:
//!
//! ```text
//! 20260101 06:00:00,North,1,48.5in,+2.0in,Normal
//! └───────┬───────┘ └─┬─┘ ┬ └──┬──┘ └──┬─┘ └─┬──┘
//!     timestamp      site │  level  change  status
//!                        tank
//! ```
//!
//! The comma is the delimiter and is not escapable; a comma inside a
//! free-text field shifts the fields that follow it at decode time. The
//! decoder is arity-tolerant: missing trailing fields default to empty,
//! so rows written by older firmware with fewer columns still load.
//! An unparsable tank number rejects the whole row.

use core::fmt::Write as _;

// ───────────────────────────────────────────────────────────────
// Field capacities
// ───────────────────────────────────────────────────────────────

/// `YYYYMMDD HH:MM:SS` is 17 bytes; headroom for five-digit years.
pub const STAMP_CAP: usize = 20;
/// `YYYYMMDD` date text.
pub const DATE_CAP: usize = 8;
/// Site labels ("North", "River Pasture").
pub const SITE_CAP: usize = 24;
/// Level / 24-hour-change text ("48.5in", "+2.0in").
pub const LEVEL_CAP: usize = 16;
/// Status text ("Normal", "High Alarm").
pub const STATUS_CAP: usize = 16;
/// Free-text shutdown reason from a field unit.
pub const REASON_CAP: usize = 48;
/// Notification address (SMS-gateway e-mail style).
pub const ADDR_CAP: usize = 48;
/// One encoded line. Field caps plus delimiters sum well below this.
pub const LINE_CAP: usize = 160;

/// One encoded flat-store line.
pub type Line = heapless::String<LINE_CAP>;

/// Clip `s` to the string capacity without splitting a UTF-8 character.
pub(crate) fn clipped<const N: usize>(s: &str) -> heapless::String<N> {
    let mut out = heapless::String::new();
    for ch in s.chars() {
        if out.push(ch).is_err() {
            break;
        }
    }
    out
}

// ───────────────────────────────────────────────────────────────
// Codec trait
// ───────────────────────────────────────────────────────────────

/// A record that round-trips through one flat-store line.
pub trait Record: Sized {
    /// Encode as a single line (no terminator).
    fn encode(&self) -> Line;

    /// Decode one raw line. `None` means the row is malformed and the
    /// caller should skip it; this must never panic, whatever the input.
    fn decode(line: &str) -> Option<Self>;
}

/// Next field of a comma-split row: trimmed, clipped, empty when the
/// row ran out of columns.
fn next_field<'a, const N: usize>(
    fields: &mut impl Iterator<Item = &'a str>,
) -> heapless::String<N> {
    clipped(fields.next().unwrap_or("").trim())
}

// ───────────────────────────────────────────────────────────────
// Civil timestamp
// ───────────────────────────────────────────────────────────────

/// Device-local civil time. No timezone, no epoch math; formatted as
/// text wherever it is stored or sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timestamp {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

impl Timestamp {
    /// `YYYYMMDD HH:MM:SS` stamp for record lines and the heartbeat log.
    pub fn stamp(&self) -> heapless::String<STAMP_CAP> {
        let mut out = heapless::String::new();
        let _ = write!(
            out,
            "{:04}{:02}{:02} {:02}:{:02}:{:02}",
            self.year, self.month, self.day, self.hour, self.minute, self.second
        );
        out
    }

    /// `YYYYMMDD` date text for the send-date ledger.
    pub fn date(&self) -> heapless::String<DATE_CAP> {
        let mut out = heapless::String::new();
        let _ = write!(out, "{:04}{:02}{:02}", self.year, self.month, self.day);
        out
    }

    /// True when `date` (as produced by [`Timestamp::date`]) falls in the
    /// same calendar month as `self`. Total over arbitrary input; the
    /// ledger line may be garbage after an interrupted write.
    pub fn same_month(&self, date: &str) -> bool {
        match date.get(..6) {
            Some(prefix) => prefix == &self.date()[..6],
            None => false,
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Tank report
// ───────────────────────────────────────────────────────────────

/// One observation reported by a field unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TankReport {
    /// When the field unit took the reading (`YYYYMMDD HH:MM:SS`).
    pub timestamp: heapless::String<STAMP_CAP>,
    /// Site label of the reporting unit.
    pub site: heapless::String<SITE_CAP>,
    /// Tank number at the site (1-99).
    pub tank_number: u8,
    /// Level text as reported ("48.5in").
    pub level: heapless::String<LEVEL_CAP>,
    /// 24-hour change text ("+2.0in").
    pub change_24h: heapless::String<LEVEL_CAP>,
    /// Status text; "Normal" when unalarmed.
    pub status: heapless::String<STATUS_CAP>,
}

impl TankReport {
    /// Build a report, clipping over-length fields to capacity.
    pub fn new(
        timestamp: &str,
        site: &str,
        tank_number: u8,
        level: &str,
        change_24h: &str,
        status: &str,
    ) -> Self {
        Self {
            timestamp: clipped(timestamp),
            site: clipped(site),
            tank_number,
            level: clipped(level),
            change_24h: clipped(change_24h),
            status: clipped(status),
        }
    }

    /// True when the reported status calls for an alarm forward.
    pub fn is_alarm(&self) -> bool {
        !self.status.is_empty() && self.status.as_str() != "Normal"
    }
}

impl Record for TankReport {
    fn encode(&self) -> Line {
        let mut out = Line::new();
        let _ = write!(
            out,
            "{},{},{},{},{},{}",
            self.timestamp, self.site, self.tank_number, self.level, self.change_24h, self.status
        );
        out
    }

    fn decode(line: &str) -> Option<Self> {
        let mut fields = line.trim().split(',');
        let timestamp = next_field(&mut fields);
        let site = next_field(&mut fields);
        let tank_number: u8 = fields.next()?.trim().parse().ok()?;
        Some(Self {
            timestamp,
            site,
            tank_number,
            level: next_field(&mut fields),
            change_24h: next_field(&mut fields),
            status: next_field(&mut fields),
        })
    }
}

// ───────────────────────────────────────────────────────────────
// Power-failure event
// ───────────────────────────────────────────────────────────────

/// A field unit's report that it came back from a power loss.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PowerFailureEvent {
    /// When the unit recovered (`YYYYMMDD HH:MM:SS`).
    pub timestamp: heapless::String<STAMP_CAP>,
    /// Site label of the recovered unit.
    pub site: heapless::String<SITE_CAP>,
    /// Tank number at the site.
    pub tank_number: u8,
    /// Level text at recovery.
    pub level: heapless::String<LEVEL_CAP>,
    /// Free-text shutdown reason as the unit recorded it.
    pub reason: heapless::String<REASON_CAP>,
}

impl PowerFailureEvent {
    /// Build an event, clipping over-length fields to capacity.
    pub fn new(timestamp: &str, site: &str, tank_number: u8, level: &str, reason: &str) -> Self {
        Self {
            timestamp: clipped(timestamp),
            site: clipped(site),
            tank_number,
            level: clipped(level),
            reason: clipped(reason),
        }
    }
}

impl Record for PowerFailureEvent {
    fn encode(&self) -> Line {
        let mut out = Line::new();
        let _ = write!(
            out,
            "{},{},{},{},{}",
            self.timestamp, self.site, self.tank_number, self.level, self.reason
        );
        out
    }

    fn decode(line: &str) -> Option<Self> {
        let mut fields = line.trim().split(',');
        let timestamp = next_field(&mut fields);
        let site = next_field(&mut fields);
        let tank_number: u8 = fields.next()?.trim().parse().ok()?;
        Some(Self {
            timestamp,
            site,
            tank_number,
            level: next_field(&mut fields),
            reason: next_field(&mut fields),
        })
    }
}

// ───────────────────────────────────────────────────────────────
// Notification recipient
// ───────────────────────────────────────────────────────────────

/// One notification address, stored bare, one per line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipient(heapless::String<ADDR_CAP>);

impl Recipient {
    pub fn new(addr: &str) -> Self {
        Self(clipped(addr.trim()))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Record for Recipient {
    fn encode(&self) -> Line {
        clipped(self.0.as_str())
    }

    fn decode(line: &str) -> Option<Self> {
        let addr = line.trim();
        if addr.is_empty() {
            return None;
        }
        Some(Self(clipped(addr)))
    }
}
