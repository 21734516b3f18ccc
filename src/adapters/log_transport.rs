//! Console transport adapter.
//!
//! Implements [`TransportPort`] by writing the would-be message to the
//! log. Stands in wherever the modem link is absent (bench setups,
//! soak tests); the cellular adapter upstream implements the same
//! trait against real hardware.

use log::info;

use crate::app::ports::TransportPort;

/// Adapter that logs every outbound message instead of sending it.
#[derive(Default)]
pub struct LogTransport;

impl LogTransport {
    pub fn new() -> Self {
        Self
    }
}

impl TransportPort for LogTransport {
    fn send(&mut self, destination: &str, subject: &str, body: &str) -> bool {
        info!("SEND | to={} | subject='{}'", destination, subject);
        for line in body.lines() {
            info!("SEND |   {}", line);
        }
        true
    }
}
