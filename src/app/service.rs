//! Server service — the hexagonal core.
//!
//! [`ServerService`] owns the bounded collections and applies every
//! mutation with synchronous write-through: an accepted record is
//! mirrored to its backing store before the caller gets control back.
//! All I/O flows through port traits injected at call sites, making the
//! entire service testable with mock adapters.
//!
//! ```text
//!  ServerCommand ──▶ ┌────────────────────────┐ ──▶ TransportPort
//!                    │      ServerService      │
//!   ClockPort ─────▶ │  collections · dispatch │ ──▶ StorePort
//!                    └────────────────────────┘
//! ```

use core::fmt::Write as _;

use log::{info, warn};

use crate::config::{stores, ServerConfig};
use crate::records::{clipped, PowerFailureEvent, Recipient, Record, TankReport, Timestamp};
use crate::recovery::{ShutdownKind, MARKER_NORMAL_OPERATION};
use crate::state::{PingStatus, SendDates, ServerState};

use super::commands::ServerCommand;
use super::ports::{ClockPort, StorePort, TransportPort};

/// Outbound message body cap. Composition stops quietly at capacity;
/// a clipped report beats a dropped one.
const BODY_CAP: usize = 1024;

// ───────────────────────────────────────────────────────────────
// ServerService
// ───────────────────────────────────────────────────────────────

/// The application service orchestrates all domain logic.
pub struct ServerService {
    config: ServerConfig,
    state: ServerState,
}

impl ServerService {
    /// Construct the service around state the recovery manager prepared.
    pub fn new(config: ServerConfig, state: ServerState) -> Self {
        Self { config, state }
    }

    // ── Command handling ──────────────────────────────────────

    /// Process an external command (parsed message, web UI, console).
    pub fn handle_command(
        &mut self,
        cmd: ServerCommand,
        store: &mut impl StorePort,
        transport: &mut impl TransportPort,
        clock: &impl ClockPort,
    ) {
        match cmd {
            ServerCommand::TankReport(report) => {
                self.record_tank_report(report, store, transport);
            }
            ServerCommand::PowerFailure(event) => {
                self.record_power_failure(event, store);
            }
            ServerCommand::AddDailyRecipient(addr) => {
                self.add_daily_recipient(addr, store);
            }
            ServerCommand::AddMonthlyRecipient(addr) => {
                self.add_monthly_recipient(addr, store);
            }
            ServerCommand::PingSent { site, tank_number } => {
                self.note_ping_sent(&site, tank_number, clock);
            }
            ServerCommand::PingResult { site, tank_number, responded } => {
                self.note_ping_result(&site, tank_number, responded);
            }
            ServerCommand::ForceSnapshot => {
                self.flush_all(store, clock);
            }
            ServerCommand::CleanRestart(kind) => {
                self.request_clean_restart(kind, store);
            }
        }
    }

    // ── Mutations (write-through) ─────────────────────────────

    /// Record a tank observation. Returns `false` when the in-memory
    /// log is full; the report is dropped but an alarm still forwards.
    pub fn record_tank_report(
        &mut self,
        report: TankReport,
        store: &mut impl StorePort,
        transport: &mut impl TransportPort,
    ) -> bool {
        if report.is_alarm() && self.config.forward_alarms {
            self.forward_alarm(&report, transport);
        }

        let line = report.encode();
        let accepted = self.state.reports.try_append(report);
        if accepted {
            if let Err(e) = store.append(stores::TANK_REPORTS, &line) {
                warn!("report: mirror append failed: {}", e);
            }
        } else {
            warn!("report: log full at {} entries, dropping", self.state.reports.len());
        }
        accepted
    }

    /// Record a field unit's power-failure event.
    pub fn record_power_failure(
        &mut self,
        event: PowerFailureEvent,
        store: &mut impl StorePort,
    ) -> bool {
        let line = event.encode();
        info!(
            "power failure: {} tank {} ({})",
            event.site, event.tank_number, event.reason
        );
        let accepted = self.state.power_failures.try_append(event);
        if accepted {
            if let Err(e) = store.append(stores::POWER_FAILURES, &line) {
                warn!("power failure: mirror append failed: {}", e);
            }
        } else {
            warn!(
                "power failure: log full at {} entries, dropping",
                self.state.power_failures.len()
            );
        }
        accepted
    }

    /// Add a daily-report recipient (no de-duplication).
    pub fn add_daily_recipient(&mut self, addr: Recipient, store: &mut impl StorePort) -> bool {
        let line = addr.encode();
        let accepted = self.state.daily_recipients.try_append(addr);
        if accepted {
            if let Err(e) = store.append(stores::DAILY_EMAILS, &line) {
                warn!("recipient: daily list mirror failed: {}", e);
            }
        } else {
            warn!("recipient: daily list full, rejecting {}", line);
        }
        accepted
    }

    /// Add a monthly-report recipient (no de-duplication).
    pub fn add_monthly_recipient(&mut self, addr: Recipient, store: &mut impl StorePort) -> bool {
        let line = addr.encode();
        let accepted = self.state.monthly_recipients.try_append(addr);
        if accepted {
            if let Err(e) = store.append(stores::MONTHLY_EMAILS, &line) {
                warn!("recipient: monthly list mirror failed: {}", e);
            }
        } else {
            warn!("recipient: monthly list full, rejecting {}", line);
        }
        accepted
    }

    /// Track an outbound liveness probe. Ephemeral by design.
    pub fn note_ping_sent(&mut self, site: &str, tank_number: u8, clock: &impl ClockPort) {
        let stamp = clock.now().stamp();
        if !self.state.pings.note_sent(site, tank_number, &stamp) {
            warn!("ping: table full, {} tank {} not tracked", site, tank_number);
        }
    }

    /// Track a probe outcome.
    pub fn note_ping_result(&mut self, site: &str, tank_number: u8, responded: bool) {
        info!(
            "ping: {} tank {} {}",
            site,
            tank_number,
            if responded { "responded" } else { "no reply" }
        );
        let _ = self.state.pings.note_result(site, tank_number, responded);
    }

    /// Write the clean marker ahead of an operator-initiated restart.
    /// The next boot will classify as a clean start instead of a crash.
    pub fn request_clean_restart(&mut self, kind: ShutdownKind, store: &mut impl StorePort) {
        let marker = [clipped(kind.marker())];
        match store.rewrite(stores::SYSTEM_STATE, &marker) {
            Ok(()) => info!("shutdown: marker set to '{}'", kind.marker()),
            Err(e) => warn!("shutdown: marker write failed: {}", e),
        }
    }

    // ── Scheduled report dispatch ─────────────────────────────

    /// Fire the daily and monthly reports when their window opens.
    /// Call once per tick; the send-date ledger makes it idempotent
    /// across ticks and across reboots.
    pub fn dispatch_scheduled_reports(
        &mut self,
        now: Timestamp,
        store: &mut impl StorePort,
        transport: &mut impl TransportPort,
    ) {
        let in_window =
            (now.hour, now.minute) >= (self.config.daily_report_hour, self.config.daily_report_minute);
        if !in_window {
            return;
        }

        let today = now.date();

        if self.state.send_dates.last_daily.as_str() != today.as_str() {
            self.send_daily_report(transport);
            // Marked sent even when deliveries failed: no retries, and
            // re-sending every tick for a dead modem helps nobody.
            self.state.send_dates.last_daily = clipped(&today);
            self.persist_send_dates(store);
        }

        if now.day == self.config.monthly_report_day
            && !now.same_month(&self.state.send_dates.last_monthly)
        {
            self.send_monthly_report(transport);
            self.state.send_dates.last_monthly = clipped(&today);
            self.persist_send_dates(store);
        }
    }

    /// Persist everything: every collection, the liveness marker, and a
    /// heartbeat line. The periodic snapshot calls this unconditionally,
    /// which also repairs any store a crash left truncated or garbled.
    pub fn flush_all(&self, store: &mut impl StorePort, clock: &impl ClockPort) {
        let mut failed = 0usize;

        let reports = self.state.reports.snapshot_lines();
        failed += usize::from(store.rewrite(stores::TANK_REPORTS, &reports).is_err());

        let outages = self.state.power_failures.snapshot_lines();
        failed += usize::from(store.rewrite(stores::POWER_FAILURES, &outages).is_err());

        let daily = self.state.daily_recipients.snapshot_lines();
        failed += usize::from(store.rewrite(stores::DAILY_EMAILS, &daily).is_err());

        let monthly = self.state.monthly_recipients.snapshot_lines();
        failed += usize::from(store.rewrite(stores::MONTHLY_EMAILS, &monthly).is_err());

        let dates = self.state.send_dates.snapshot_lines();
        failed += usize::from(store.rewrite(stores::EMAIL_DATES, &dates).is_err());

        let marker = [clipped(MARKER_NORMAL_OPERATION)];
        failed += usize::from(store.rewrite(stores::SYSTEM_STATE, &marker).is_err());

        let stamp = clock.now().stamp();
        failed += usize::from(store.append(stores::HEARTBEAT, &stamp).is_err());

        if failed == 0 {
            info!(
                "snapshot: {} reports, {} power failures, {}+{} recipients persisted",
                self.state.reports.len(),
                self.state.power_failures.len(),
                self.state.daily_recipients.len(),
                self.state.monthly_recipients.len()
            );
        } else {
            warn!("snapshot: {} store writes failed, running memory-only", failed);
        }
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn reports(&self) -> &[TankReport] {
        self.state.reports.all()
    }

    pub fn power_failures(&self) -> &[PowerFailureEvent] {
        self.state.power_failures.all()
    }

    pub fn daily_recipients(&self) -> &[Recipient] {
        self.state.daily_recipients.all()
    }

    pub fn monthly_recipients(&self) -> &[Recipient] {
        self.state.monthly_recipients.all()
    }

    pub fn ping(&self, site: &str, tank_number: u8) -> Option<&PingStatus> {
        self.state.pings.get(site, tank_number)
    }

    pub fn send_dates(&self) -> &SendDates {
        &self.state.send_dates
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    // ── Internal ──────────────────────────────────────────────

    fn forward_alarm(&self, report: &TankReport, transport: &mut impl TransportPort) {
        let dest = self.config.alarm_recipient.as_str();
        if dest.is_empty() {
            return;
        }

        let mut subject: heapless::String<64> = heapless::String::new();
        let _ = write!(subject, "{} tank alarm", self.config.server_name);

        let mut body: heapless::String<256> = heapless::String::new();
        let _ = write!(
            body,
            "{} tank {}: {} ({}) {} at {}",
            report.site,
            report.tank_number,
            report.level,
            report.change_24h,
            report.status,
            report.timestamp
        );

        if transport.send(dest, &subject, &body) {
            info!("alarm: {} tank {} '{}' forwarded", report.site, report.tank_number, report.status);
        } else {
            warn!("alarm: forward to {} failed", dest);
        }
    }

    fn send_daily_report(&self, transport: &mut impl TransportPort) {
        let recipients = self.state.daily_recipients.all();
        if recipients.is_empty() {
            info!("daily report: no recipients configured");
            return;
        }

        let mut subject: heapless::String<64> = heapless::String::new();
        let _ = write!(subject, "{} daily report", self.config.server_name);
        let body = self.compose_daily_body();

        let mut delivered = 0usize;
        for r in recipients {
            if transport.send(r.as_str(), &subject, &body) {
                delivered += 1;
            } else {
                warn!("daily report: send to {} failed", r.as_str());
            }
        }
        info!("daily report: {}/{} deliveries", delivered, recipients.len());
    }

    fn send_monthly_report(&self, transport: &mut impl TransportPort) {
        let recipients = self.state.monthly_recipients.all();
        if recipients.is_empty() {
            info!("monthly summary: no recipients configured");
            return;
        }

        let mut subject: heapless::String<64> = heapless::String::new();
        let _ = write!(subject, "{} monthly summary", self.config.server_name);

        let alarms = self.state.reports.all().iter().filter(|r| r.is_alarm()).count();
        let mut body: heapless::String<BODY_CAP> = heapless::String::new();
        let _ = write!(
            body,
            "{} tank reports on file, {} in alarm\n{} power failures recorded",
            self.state.reports.len(),
            alarms,
            self.state.power_failures.len()
        );

        let mut delivered = 0usize;
        for r in recipients {
            if transport.send(r.as_str(), &subject, &body) {
                delivered += 1;
            } else {
                warn!("monthly summary: send to {} failed", r.as_str());
            }
        }
        info!("monthly summary: {}/{} deliveries", delivered, recipients.len());
    }

    /// Latest report per (site, tank), one line each, oldest site first.
    fn compose_daily_body(&self) -> heapless::String<BODY_CAP> {
        let mut body: heapless::String<BODY_CAP> = heapless::String::new();
        let reports = self.state.reports.all();
        if reports.is_empty() {
            let _ = body.push_str("no tank reports on file");
            return body;
        }

        for (i, r) in reports.iter().enumerate() {
            // Appends are chronological, so a later entry with the same
            // key supersedes this one.
            let superseded = reports[i + 1..]
                .iter()
                .any(|o| o.tank_number == r.tank_number && o.site == r.site);
            if superseded {
                continue;
            }
            let _ = writeln!(
                body,
                "{} tank {}: {} ({}) {}",
                r.site, r.tank_number, r.level, r.change_24h, r.status
            );
        }
        body
    }

    fn persist_send_dates(&mut self, store: &mut impl StorePort) {
        let lines = self.state.send_dates.snapshot_lines();
        if let Err(e) = store.rewrite(stores::EMAIL_DATES, &lines) {
            warn!("reports: send-date ledger write failed: {}", e);
        }
    }
}
