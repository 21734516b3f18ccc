//! Tank alarm server library.
//!
//! Exposes the pure-logic modules for integration testing and external
//! inspection. All filesystem and delivery I/O sits behind the port
//! traits in [`app::ports`]; the domain core never touches `std::fs`
//! directly and runs unchanged against mock adapters in tests.

#![deny(unused_must_use)]

pub mod app;
pub mod config;
pub mod records;
pub mod recovery;
pub mod snapshot;
pub mod state;

pub mod adapters;
