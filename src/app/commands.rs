//! Inbound commands to the server service.
//!
//! These represent actions requested by the outside world (parsed modem
//! messages, the web UI, the operator console) that the
//! [`ServerService`](super::service::ServerService) interprets and acts
//! upon. Parsing transport frames into these commands happens upstream.

use crate::records::{PowerFailureEvent, Recipient, TankReport, SITE_CAP};
use crate::recovery::ShutdownKind;

/// Commands that external adapters can send into the application core.
#[derive(Debug, Clone)]
pub enum ServerCommand {
    /// A field unit reported a tank observation.
    TankReport(TankReport),

    /// A field unit reported that it recovered from a power loss.
    PowerFailure(PowerFailureEvent),

    /// Operator added a daily-report recipient.
    AddDailyRecipient(Recipient),

    /// Operator added a monthly-report recipient.
    AddMonthlyRecipient(Recipient),

    /// A liveness probe went out to a field unit.
    PingSent {
        site: heapless::String<SITE_CAP>,
        tank_number: u8,
    },

    /// A probe completed (reply received, or timed out upstream).
    PingResult {
        site: heapless::String<SITE_CAP>,
        tank_number: u8,
        responded: bool,
    },

    /// Persist everything now (operator "save" button).
    ForceSnapshot,

    /// Operator-initiated restart: write the clean marker so the next
    /// boot does not run recovery. The restart itself happens upstream.
    CleanRestart(ShutdownKind),
}
