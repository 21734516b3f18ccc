//! Boot-time crash detection and state restoration.
//!
//! ```text
//! Uninitialized ──▶ Booting ──┬──▶ CleanStart ──┬──▶ Operational
//!                             └──▶ Recovering ──┘
//! ```
//!
//! The `system_state` marker records why it was last written. While the
//! server runs it holds [`MARKER_NORMAL_OPERATION`]; an operator restart
//! writes a clean-set value first. At boot, an absent or clean marker
//! means a clean start; anything else means the previous process died
//! mid-run, and its raw value is the last recorded shutdown reason.
//!
//! Only a `Recovering` boot reloads the tank-report and power-failure
//! collections; operator state (recipients, send dates) loads on every
//! boot. The marker flips back to `normal operation` when the machine
//! reaches `Operational`, so a second power loss before that point
//! repeats the previous recovery notice. Known and accepted: with no
//! wall-clock delta to compare, the two cases are indistinguishable.

use core::fmt::Write as _;

use log::{info, warn};

use crate::app::ports::{StorePort, TransportPort};
use crate::config::{stores, ServerConfig};
use crate::records::{clipped, Recipient, Record, REASON_CAP};
use crate::state::ServerState;

// ───────────────────────────────────────────────────────────────
// Marker values
// ───────────────────────────────────────────────────────────────

/// Written once the boot reaches `Operational` and refreshed by every
/// periodic snapshot. Not in the clean set: finding it at boot means
/// the last run never shut down on purpose.
pub const MARKER_NORMAL_OPERATION: &str = "normal operation";

/// The closed set of marker values that mean "the last run ended on
/// purpose". Everything else classifies as a crash.
const CLEAN_MARKERS: [&str; 2] = ["clean shutdown", "maintenance restart"];

/// Why an operator-initiated restart is happening.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownKind {
    /// Plain operator restart from the console or web UI.
    Clean,
    /// Restart for servicing (SD card swap, antenna work).
    Maintenance,
}

impl ShutdownKind {
    /// The marker line this shutdown writes.
    pub fn marker(self) -> &'static str {
        match self {
            Self::Clean => CLEAN_MARKERS[0],
            Self::Maintenance => CLEAN_MARKERS[1],
        }
    }
}

/// Whether a marker value belongs to the clean set.
pub fn is_clean_marker(value: &str) -> bool {
    CLEAN_MARKERS.contains(&value.trim())
}

// ───────────────────────────────────────────────────────────────
// Boot state machine
// ───────────────────────────────────────────────────────────────

/// Phases of the boot sequence, in order of appearance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootPhase {
    Uninitialized,
    Booting,
    CleanStart,
    Recovering,
    Operational,
}

impl BootPhase {
    pub fn name(self) -> &'static str {
        match self {
            Self::Uninitialized => "Uninitialized",
            Self::Booting => "Booting",
            Self::CleanStart => "CleanStart",
            Self::Recovering => "Recovering",
            Self::Operational => "Operational",
        }
    }
}

/// Summary of one boot pass, for logs, tests, and the status page.
#[derive(Debug, Clone)]
pub struct BootReport {
    /// The previous run died without writing a clean marker.
    pub crash_detected: bool,
    /// Raw marker value found at boot (empty on first boot).
    pub shutdown_reason: heapless::String<REASON_CAP>,
    /// Tank reports reloaded from the backing store.
    pub restored_reports: usize,
    /// Power-failure events reloaded from the backing store.
    pub restored_failures: usize,
    /// Backing-store rows skipped as malformed, both collections.
    pub skipped_rows: usize,
    /// The recovery notice went out on the transport.
    pub notice_sent: bool,
}

/// Drives the boot sequence exactly once, then hands the restored
/// state to the service.
pub struct RecoveryManager<'a> {
    config: &'a ServerConfig,
    phase: BootPhase,
}

impl<'a> RecoveryManager<'a> {
    pub fn new(config: &'a ServerConfig) -> Self {
        Self { config, phase: BootPhase::Uninitialized }
    }

    pub fn phase(&self) -> BootPhase {
        self.phase
    }

    fn transition(&mut self, next: BootPhase) {
        info!("boot: {} -> {}", self.phase.name(), next.name());
        self.phase = next;
    }

    /// Run the whole boot sequence: classify the marker, load state,
    /// send the recovery notice if the last run crashed, and arm the
    /// marker for the run that starts now.
    pub fn run(
        &mut self,
        state: &mut ServerState,
        store: &mut impl StorePort,
        transport: &mut impl TransportPort,
    ) -> BootReport {
        self.transition(BootPhase::Booting);

        let marker = read_marker(store);
        let mut report = BootReport {
            crash_detected: false,
            shutdown_reason: marker.clone().unwrap_or_default(),
            restored_reports: 0,
            restored_failures: 0,
            skipped_rows: 0,
            notice_sent: false,
        };

        // Operator state loads on every boot, clean or not.
        self.load_recipients(state, store);
        self.load_send_dates(state, store);

        match marker {
            None => {
                // First boot, or the storage device never came up.
                self.transition(BootPhase::CleanStart);
            }
            Some(value) if is_clean_marker(&value) => {
                self.transition(BootPhase::CleanStart);
            }
            Some(value) => {
                self.transition(BootPhase::Recovering);
                report.crash_detected = true;
                self.restore_observations(state, store, &mut report);
                report.notice_sent = self.send_recovery_notice(transport, &value, &report);
            }
        }

        self.transition(BootPhase::Operational);

        // Arm the marker for this run. From here on, finding this value
        // at boot means we died without a clean shutdown.
        let armed = [clipped(MARKER_NORMAL_OPERATION)];
        if store.rewrite(stores::SYSTEM_STATE, &armed).is_err() {
            warn!("boot: could not arm the shutdown marker; running memory-only");
        }

        report
    }

    fn load_recipients(&self, state: &mut ServerState, store: &mut impl StorePort) {
        for (name, list, label) in [
            (stores::DAILY_EMAILS, &mut state.daily_recipients, "daily"),
            (stores::MONTHLY_EMAILS, &mut state.monthly_recipients, "monthly"),
        ] {
            if store.exists(name) {
                match store.read_all(name) {
                    Ok(lines) => {
                        let stats = list.restore(lines.iter().map(String::as_str));
                        info!("boot: {} {} recipients loaded", stats.restored, label);
                    }
                    Err(e) => warn!("boot: {} recipient load failed: {}", label, e),
                }
                continue;
            }

            // First boot for this list: seed the default recipient.
            let addr = self.config.default_recipient.as_str();
            if addr.is_empty() {
                continue;
            }
            let seeded = Recipient::new(addr);
            let line = seeded.encode();
            if list.try_append(seeded) {
                info!("boot: seeded default {} recipient", label);
                if let Err(e) = store.append(name, &line) {
                    warn!("boot: could not persist seeded {} recipient: {}", label, e);
                }
            }
        }
    }

    fn load_send_dates(&self, state: &mut ServerState, store: &impl StorePort) {
        match store.read_all(stores::EMAIL_DATES) {
            Ok(lines) => state.send_dates.restore(lines.iter().map(String::as_str)),
            Err(e) => warn!("boot: send-date ledger unreadable: {}", e),
        }
    }

    fn restore_observations(
        &self,
        state: &mut ServerState,
        store: &impl StorePort,
        report: &mut BootReport,
    ) {
        match store.read_all(stores::TANK_REPORTS) {
            Ok(lines) => {
                let stats = state.reports.restore(lines.iter().map(String::as_str));
                report.restored_reports = stats.restored;
                report.skipped_rows += stats.skipped;
            }
            Err(e) => warn!("restore: tank reports unreadable: {}", e),
        }
        match store.read_all(stores::POWER_FAILURES) {
            Ok(lines) => {
                let stats = state.power_failures.restore(lines.iter().map(String::as_str));
                report.restored_failures = stats.restored;
                report.skipped_rows += stats.skipped;
            }
            Err(e) => warn!("restore: power failures unreadable: {}", e),
        }

        info!(
            "restore: {} tank reports, {} power failures ({} rows skipped)",
            report.restored_reports, report.restored_failures, report.skipped_rows
        );
    }

    /// Best effort by contract. Recovery completes whether or not the
    /// notice makes it out.
    fn send_recovery_notice(
        &self,
        transport: &mut impl TransportPort,
        reason: &str,
        report: &BootReport,
    ) -> bool {
        let dest = self.config.alarm_recipient.as_str();
        if dest.is_empty() {
            warn!("recovery: no alarm recipient configured, notice skipped");
            return false;
        }

        let mut subject: heapless::String<64> = heapless::String::new();
        let _ = write!(subject, "{} power restored", self.config.server_name);

        let reason = if reason.trim().is_empty() { "(unrecorded)" } else { reason.trim() };
        let mut body: heapless::String<256> = heapless::String::new();
        let _ = write!(
            body,
            "{} back online after power loss\nlast shutdown reason: {}\nrestored {} tank reports",
            self.config.site_name, reason, report.restored_reports
        );

        let sent = transport.send(dest, &subject, &body);
        if sent {
            info!("recovery: notice sent to {}", dest);
        } else {
            warn!("recovery: notice to {} failed, not retrying", dest);
        }
        sent
    }
}

/// Read the marker value. `None` means the store has never been
/// written (first boot) or the device is unreachable; both boot clean.
fn read_marker(store: &impl StorePort) -> Option<heapless::String<REASON_CAP>> {
    if !store.exists(stores::SYSTEM_STATE) {
        return None;
    }
    match store.read_all(stores::SYSTEM_STATE) {
        Ok(lines) => Some(clipped(lines.first().map_or("", |l| l.trim()))),
        Err(e) => {
            warn!("boot: marker unreadable ({}), treating as first boot", e);
            None
        }
    }
}
