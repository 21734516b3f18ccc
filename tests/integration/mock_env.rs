//! Mock adapters for integration tests.
//!
//! `MemStore` keeps raw bytes per store and applies the same
//! complete-line read rule as the production file adapter, so tests can
//! inject the exact byte patterns an interrupted append leaves behind.

use std::collections::HashMap;

use tankalarm::adapters::file_store::complete_lines;
use tankalarm::app::ports::{ClockPort, StoreError, StorePort, TransportPort};
use tankalarm::records::{Line, Timestamp};

// ── MemStore ──────────────────────────────────────────────────

pub struct MemStore {
    stores: HashMap<String, Vec<u8>>,
    available: bool,
}

#[allow(dead_code)]
impl MemStore {
    pub fn new() -> Self {
        Self { stores: HashMap::new(), available: true }
    }

    /// A store whose device never came up. Every operation fails.
    pub fn unavailable() -> Self {
        Self { stores: HashMap::new(), available: false }
    }

    /// Replace a store's raw bytes, bypassing line framing. For
    /// simulating interrupted writes and corrupt content.
    pub fn inject_raw(&mut self, store: &str, bytes: &[u8]) {
        self.stores.insert(store.to_string(), bytes.to_vec());
    }

    /// Terminator-complete lines currently in a store.
    pub fn lines(&self, store: &str) -> Vec<String> {
        match self.stores.get(store) {
            Some(bytes) => complete_lines(&String::from_utf8_lossy(bytes)),
            None => Vec::new(),
        }
    }

    pub fn line_count(&self, store: &str) -> usize {
        self.lines(store).len()
    }
}

impl Default for MemStore {
    fn default() -> Self {
        Self::new()
    }
}

impl StorePort for MemStore {
    fn append(&mut self, store: &str, line: &str) -> Result<(), StoreError> {
        if !self.available {
            return Err(StoreError::Unavailable);
        }
        let buf = self.stores.entry(store.to_string()).or_default();
        buf.extend_from_slice(line.as_bytes());
        buf.push(b'\n');
        Ok(())
    }

    fn read_all(&self, store: &str) -> Result<Vec<String>, StoreError> {
        if !self.available {
            return Err(StoreError::Unavailable);
        }
        Ok(self.lines(store))
    }

    fn rewrite(&mut self, store: &str, lines: &[Line]) -> Result<(), StoreError> {
        if !self.available {
            return Err(StoreError::Unavailable);
        }
        let mut buf = Vec::new();
        for line in lines {
            buf.extend_from_slice(line.as_bytes());
            buf.push(b'\n');
        }
        self.stores.insert(store.to_string(), buf);
        Ok(())
    }

    fn exists(&self, store: &str) -> bool {
        self.available && self.stores.contains_key(store)
    }
}

// ── MockTransport ─────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct SentMessage {
    pub destination: String,
    pub subject: String,
    pub body: String,
}

/// Records every outbound message; `accept` controls the result the
/// caller sees.
pub struct MockTransport {
    pub sent: Vec<SentMessage>,
    pub accept: bool,
}

#[allow(dead_code)]
impl MockTransport {
    pub fn new() -> Self {
        Self { sent: Vec::new(), accept: true }
    }

    /// A transport whose modem is down: records the attempt, reports
    /// failure.
    pub fn rejecting() -> Self {
        Self { sent: Vec::new(), accept: false }
    }

    pub fn last(&self) -> Option<&SentMessage> {
        self.sent.last()
    }

    /// Messages delivered to one destination.
    pub fn to(&self, destination: &str) -> usize {
        self.sent.iter().filter(|m| m.destination == destination).count()
    }

    /// Messages whose subject contains `needle`.
    pub fn with_subject(&self, needle: &str) -> Vec<&SentMessage> {
        self.sent.iter().filter(|m| m.subject.contains(needle)).collect()
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl TransportPort for MockTransport {
    fn send(&mut self, destination: &str, subject: &str, body: &str) -> bool {
        self.sent.push(SentMessage {
            destination: destination.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
        });
        self.accept
    }
}

// ── FixedClock ────────────────────────────────────────────────

/// Settable clock. Tests move time by mutating `current`.
pub struct FixedClock {
    pub current: Timestamp,
}

#[allow(dead_code)]
impl FixedClock {
    pub fn at(year: u16, month: u8, day: u8, hour: u8, minute: u8, second: u8) -> Self {
        Self { current: Timestamp { year, month, day, hour, minute, second } }
    }

    pub fn set_time(&mut self, hour: u8, minute: u8) {
        self.current.hour = hour;
        self.current.minute = minute;
    }

    pub fn set_date(&mut self, year: u16, month: u8, day: u8) {
        self.current.year = year;
        self.current.month = month;
        self.current.day = day;
    }
}

impl ClockPort for FixedClock {
    fn now(&self) -> Timestamp {
        self.current
    }
}
