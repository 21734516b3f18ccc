//! TankAlarm Server — Main Entry Point
//!
//! Hexagonal architecture with write-through persistence and a periodic
//! snapshot safety net.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                    Adapters (outer ring)                   │
//! │                                                            │
//! │  FileStore          SystemClock          LogTransport      │
//! │  (StorePort)        (ClockPort)          (TransportPort)   │
//! │                                                            │
//! │  ──────────────── Port Trait Boundary ─────────────────    │
//! │                                                            │
//! │  ┌──────────────────────────────────────────────────┐      │
//! │  │            ServerService (pure logic)            │      │
//! │  │  bounded logs · alarm forwarding · report sends  │      │
//! │  └──────────────────────────────────────────────────┘      │
//! │                                                            │
//! │  RecoveryManager (boot) · SnapshotScheduler (flush timer)  │
//! └────────────────────────────────────────────────────────────┘
//! ```

use std::time::Duration;

use anyhow::Result;
use log::{info, warn};

use tankalarm::adapters::clock::SystemClock;
use tankalarm::adapters::file_store::FileStore;
use tankalarm::adapters::log_transport::LogTransport;
use tankalarm::app::ports::{ClockPort, SnapshotDelegate, StorePort};
use tankalarm::app::service::ServerService;
use tankalarm::config::ServerConfig;
use tankalarm::recovery::RecoveryManager;
use tankalarm::snapshot::SnapshotScheduler;
use tankalarm::state::ServerState;

// ── Snapshot delegate ─────────────────────────────────────────
//
// Bridges the snapshot timer (which knows nothing about the service)
// to a full store flush. The timer calls `on_snapshot_due`, and this
// impl translates that into `ServerService::flush_all` against the
// production adapters.

struct FlushDelegate<'a, S: StorePort, C: ClockPort> {
    service: &'a ServerService,
    store: &'a mut S,
    clock: &'a C,
}

impl<S: StorePort, C: ClockPort> SnapshotDelegate for FlushDelegate<'_, S, C> {
    fn on_snapshot_due(&mut self) {
        self.service.flush_all(self.store, self.clock);
    }
}

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    // ── 1. Logging bootstrap ──────────────────────────────────
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    info!("╔══════════════════════════════════════╗");
    info!("║  TankAlarm Server v{}             ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Configuration ──────────────────────────────────────
    let config = ServerConfig::default();
    config.validate()?;

    // ── 3. Backing store ──────────────────────────────────────
    let data_dir =
        std::env::var("TANKALARM_DATA").unwrap_or_else(|_| config.data_dir.to_string());
    let mut store = match FileStore::open(&data_dir) {
        Ok(s) => {
            info!("store: data dir '{}'", data_dir);
            s
        }
        Err(e) => {
            // Keep serving from memory; every later snapshot retries the disk.
            warn!("store: cannot open '{}' ({}), running memory-only", data_dir, e);
            FileStore::unavailable()
        }
    };

    // ── 4. Clock + outbound transport ─────────────────────────
    let clock = SystemClock::new();
    let mut transport = LogTransport::new();

    // ── 5. Boot recovery ──────────────────────────────────────
    let mut state = ServerState::new();
    let mut recovery = RecoveryManager::new(&config);
    let boot = recovery.run(&mut state, &mut store, &mut transport);
    if boot.crash_detected {
        warn!(
            "recovery: unclean shutdown ('{}'), restored {} reports + {} power failures ({} rows skipped)",
            boot.shutdown_reason, boot.restored_reports, boot.restored_failures, boot.skipped_rows
        );
        if !boot.notice_sent {
            warn!("recovery: operator notice not delivered");
        }
    } else {
        info!("boot: clean start");
    }

    // ── 6. Service + initial snapshot ─────────────────────────
    let mut service = ServerService::new(config.clone(), state);
    // Normalizes every store on disk, including any file a crash left
    // with a trailing partial line.
    service.flush_all(&mut store, &clock);

    // ── 7. Tick loop ──────────────────────────────────────────
    //
    // Inbound client traffic (tank reports, power-failure events, probe
    // results) enters through `ServerService::handle_command`; the
    // cellular listener that feeds it lives outside this subsystem.
    let mut snapshots = SnapshotScheduler::new(config.snapshot_interval_secs);
    let tick = Duration::from_millis(u64::from(config.tick_interval_ms));
    let tick_secs = config.tick_interval_ms as f32 / 1000.0;

    info!("server ready, entering tick loop");

    loop {
        std::thread::sleep(tick);

        let now = clock.now();
        service.dispatch_scheduled_reports(now, &mut store, &mut transport);

        let mut flush = FlushDelegate {
            service: &service,
            store: &mut store,
            clock: &clock,
        };
        snapshots.tick(tick_secs, &mut flush);
    }
}
