//! Application core — pure domain logic, zero I/O.
//!
//! This module contains the business rules for the TankAlarm server:
//! bounded-collection mutation with write-through persistence, alarm
//! forwarding, and scheduled report dispatch. All interaction with the
//! filesystem, modem, and clock happens through **port traits** defined
//! in [`ports`], keeping this layer fully testable without hardware.

pub mod commands;
pub mod ports;
pub mod service;
