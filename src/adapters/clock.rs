//! Wall-clock adapter.
//!
//! Wraps `chrono::Local` as the [`ClockPort`] time source. The server
//! runs on device-local civil time with no timezone handling; whatever
//! the RTC says is what goes in the records.

use chrono::{Datelike, Local, Timelike};

use crate::app::ports::ClockPort;
use crate::records::Timestamp;

/// System wall clock in local time.
#[derive(Default)]
pub struct SystemClock;

impl SystemClock {
    pub fn new() -> Self {
        Self
    }
}

impl ClockPort for SystemClock {
    fn now(&self) -> Timestamp {
        let now = Local::now();
        Timestamp {
            year: now.year() as u16,
            month: now.month() as u8,
            day: now.day() as u8,
            hour: now.hour() as u8,
            minute: now.minute() as u8,
            second: now.second() as u8,
        }
    }
}
