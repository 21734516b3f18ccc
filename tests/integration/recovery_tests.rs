//! Boot and crash-recovery scenarios, end to end.
//!
//! These drive `RecoveryManager` through the byte-level `MemStore`, so
//! the complete-line read rule is in the loop exactly as it is for the
//! on-disk adapter. Interrupted appends and corrupt rows are staged as
//! raw bytes, not as pre-parsed lines.

use crate::mock_env::{FixedClock, MemStore, MockTransport};

use tankalarm::app::commands::ServerCommand;
use tankalarm::app::service::ServerService;
use tankalarm::config::{stores, ServerConfig};
use tankalarm::records::{PowerFailureEvent, TankReport};
use tankalarm::recovery::{BootReport, RecoveryManager, MARKER_NORMAL_OPERATION};
use tankalarm::state::ServerState;

fn boot(store: &mut MemStore, transport: &mut MockTransport) -> (ServerState, BootReport) {
    let config = ServerConfig::default();
    let mut state = ServerState::new();
    let mut mgr = RecoveryManager::new(&config);
    let report = mgr.run(&mut state, store, transport);
    (state, report)
}

// ── First boot ────────────────────────────────────────────────

#[test]
fn first_boot_seeds_lists_and_arms_marker() {
    let mut store = MemStore::new();
    let mut transport = MockTransport::new();

    let (state, report) = boot(&mut store, &mut transport);

    assert!(!report.crash_detected, "an absent marker is not a crash");
    assert!(transport.sent.is_empty(), "first boot must stay quiet");

    let default_addr = ServerConfig::default().default_recipient;
    assert_eq!(state.daily_recipients.all()[0].as_str(), default_addr.as_str());
    assert_eq!(state.monthly_recipients.all()[0].as_str(), default_addr.as_str());
    assert_eq!(store.lines(stores::DAILY_EMAILS), vec![default_addr.as_str()]);

    // Armed: dying from here on classifies as a crash.
    assert_eq!(store.lines(stores::SYSTEM_STATE), vec![MARKER_NORMAL_OPERATION]);
}

// ── Crash classification ──────────────────────────────────────

#[test]
fn crash_boot_restores_and_notifies() {
    let mut store = MemStore::new();
    store.inject_raw(stores::SYSTEM_STATE, b"normal operation\n");
    store.inject_raw(
        stores::TANK_REPORTS,
        b"20260110 05:30:00,North,1,48.5in,+2.0in,Normal\n\
          20260110 06:30:00,South,2,30.0in,-0.5in,High Alarm\n",
    );
    store.inject_raw(
        stores::POWER_FAILURES,
        b"20260110 05:28:00,North,1,48.0in,power loss\n",
    );
    let mut transport = MockTransport::new();

    let (state, report) = boot(&mut store, &mut transport);

    assert!(report.crash_detected);
    assert_eq!(report.restored_reports, 2);
    assert_eq!(report.restored_failures, 1);
    assert!(report.notice_sent);
    assert_eq!(state.reports.len(), 2);
    assert_eq!(state.reports.all()[1].site.as_str(), "South");

    let notice = transport.last().unwrap();
    let config = ServerConfig::default();
    assert_eq!(notice.destination, config.alarm_recipient.as_str());
    assert!(notice.subject.contains("power restored"));
    assert!(notice.body.contains("back online after power loss"));
    assert!(notice.body.contains("restored 2 tank reports"));
}

#[test]
fn clean_shutdown_boot_starts_empty() {
    let mut store = MemStore::new();
    store.inject_raw(stores::SYSTEM_STATE, b"clean shutdown\n");
    store.inject_raw(
        stores::TANK_REPORTS,
        b"20260110 05:30:00,North,1,48.5in,+2.0in,Normal\n",
    );
    let mut transport = MockTransport::new();

    let (state, report) = boot(&mut store, &mut transport);

    assert!(!report.crash_detected);
    assert!(state.reports.is_empty(), "a clean start begins a fresh log");
    assert!(transport.sent.is_empty());
}

// ── Damaged stores ────────────────────────────────────────────

#[test]
fn interrupted_append_loses_only_the_partial_line() {
    // Power died mid-append: the second record has no terminator.
    let mut store = MemStore::new();
    store.inject_raw(stores::SYSTEM_STATE, b"normal operation\n");
    store.inject_raw(
        stores::TANK_REPORTS,
        b"20260110 05:30:00,North,1,48.5in,+2.0in,Normal\n20260110 06:30:00,Sou",
    );
    let mut transport = MockTransport::new();

    let (state, report) = boot(&mut store, &mut transport);

    assert_eq!(report.restored_reports, 1, "the complete line survives");
    assert_eq!(report.skipped_rows, 0, "the fragment never surfaces as a row");
    assert_eq!(state.reports.all()[0].site.as_str(), "North");
}

#[test]
fn corrupt_rows_skip_without_aborting_restore() {
    let mut raw = Vec::new();
    raw.extend_from_slice(b"20260110 05:30:00,North,1,48.5in,+2.0in,Normal\n");
    raw.extend_from_slice(b"### not a record ###\n");
    raw.extend_from_slice(&[0xFF, 0xFE, b'x', b'\n']); // invalid UTF-8
    raw.extend_from_slice(b"20260110 06:30:00,South,2,30.0in,-0.5in,Normal\n");

    let mut store = MemStore::new();
    store.inject_raw(stores::SYSTEM_STATE, b"normal operation\n");
    store.inject_raw(stores::TANK_REPORTS, &raw);
    let mut transport = MockTransport::new();

    let (state, report) = boot(&mut store, &mut transport);

    assert_eq!(report.restored_reports, 2);
    assert_eq!(report.skipped_rows, 2);
    assert_eq!(state.reports.all()[1].site.as_str(), "South");
}

// ── Notice delivery ───────────────────────────────────────────

#[test]
fn notice_failure_is_not_fatal() {
    let mut store = MemStore::new();
    store.inject_raw(stores::SYSTEM_STATE, b"normal operation\n");
    store.inject_raw(
        stores::TANK_REPORTS,
        b"20260110 05:30:00,North,1,48.5in,+2.0in,Normal\n",
    );
    let mut transport = MockTransport::rejecting();

    let (state, report) = boot(&mut store, &mut transport);

    assert!(report.crash_detected);
    assert!(!report.notice_sent);
    assert_eq!(transport.sent.len(), 1, "the attempt was made");
    assert_eq!(state.reports.len(), 1, "restore happened regardless");
}

#[test]
fn back_to_back_outages_notify_each_time() {
    let mut store = MemStore::new();
    store.inject_raw(stores::SYSTEM_STATE, b"brownout\n");
    let mut transport = MockTransport::new();

    let (_, first) = boot(&mut store, &mut transport);
    assert!(first.crash_detected);
    assert_eq!(first.shutdown_reason.as_str(), "brownout");

    // Nothing shut down cleanly in between, so the re-armed marker makes
    // the second boot look like a fresh crash. That repeat is deliberate.
    let (_, second) = boot(&mut store, &mut transport);
    assert!(second.crash_detected);
    assert_eq!(second.shutdown_reason.as_str(), MARKER_NORMAL_OPERATION);
    assert_eq!(transport.with_subject("power restored").len(), 2);
}

// ── Operator state ────────────────────────────────────────────

#[test]
fn send_dates_load_on_clean_boots() {
    let mut store = MemStore::new();
    store.inject_raw(stores::SYSTEM_STATE, b"clean shutdown\n");
    store.inject_raw(stores::EMAIL_DATES, b"20260109\n20260101\n");
    let mut transport = MockTransport::new();

    let (state, _) = boot(&mut store, &mut transport);

    assert_eq!(state.send_dates.last_daily.as_str(), "20260109");
    assert_eq!(state.send_dates.last_monthly.as_str(), "20260101");
}

// ── Whole-lifecycle round trip ────────────────────────────────

#[test]
fn full_crash_cycle_roundtrip() {
    let mut store = MemStore::new();
    let mut transport = MockTransport::new();
    let clock = FixedClock::at(2026, 1, 10, 12, 0, 0);

    // Run 1: clean first boot, field traffic arrives, then the power
    // goes out with no clean shutdown.
    let (state, _) = boot(&mut store, &mut transport);
    let mut service = ServerService::new(ServerConfig::default(), state);

    for (site, tank, level, status) in [
        ("North", 1, "48.5in", "Normal"),
        ("South", 2, "30.0in", "High Alarm"),
        ("East", 3, "55.1in", "Normal"),
    ] {
        service.handle_command(
            ServerCommand::TankReport(TankReport::new(
                "20260110 12:00:00",
                site,
                tank,
                level,
                "+0.1in",
                status,
            )),
            &mut store,
            &mut transport,
            &clock,
        );
    }
    service.handle_command(
        ServerCommand::PowerFailure(PowerFailureEvent::new(
            "20260110 11:58:00",
            "South",
            2,
            "29.9in",
            "brownout at site",
        )),
        &mut store,
        &mut transport,
        &clock,
    );

    // Run 2: same store, no clean marker.
    let (restored, report) = boot(&mut store, &mut transport);

    assert!(report.crash_detected);
    assert_eq!(report.restored_reports, 3);
    assert_eq!(report.restored_failures, 1);
    assert_eq!(restored.reports.all()[1].status.as_str(), "High Alarm");
    assert_eq!(restored.power_failures.all()[0].reason.as_str(), "brownout at site");
    assert_eq!(restored.daily_recipients.len(), 1, "seeded list reloads, no re-seed");

    // One alarm forward during run 1, one recovery notice at run 2.
    assert_eq!(transport.with_subject("tank alarm").len(), 1);
    assert_eq!(transport.with_subject("power restored").len(), 1);
}
