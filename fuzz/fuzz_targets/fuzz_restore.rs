//! Fuzz target: store framing + collection restore
//!
//! Treats the fuzz input as the raw contents of a backing file after a
//! power loss: frames it into complete lines, then restores bounded
//! collections from it. Asserts:
//! - No panics on any byte sequence
//! - Collections never exceed capacity
//! - Restore is idempotent over the same lines
//!
//! cargo fuzz run fuzz_restore

#![no_main]

use libfuzzer_sys::fuzz_target;
use tankalarm::adapters::file_store::complete_lines;
use tankalarm::records::{PowerFailureEvent, TankReport};
use tankalarm::state::BoundedLog;

fuzz_target!(|data: &[u8]| {
    let text = String::from_utf8_lossy(data);
    let lines = complete_lines(&text);

    let mut reports: BoundedLog<TankReport, 8> = BoundedLog::new();
    let stats = reports.restore(lines.iter().map(String::as_str));
    assert!(reports.len() <= 8, "restore must respect capacity");
    assert_eq!(stats.restored, reports.len());
    assert!(
        stats.restored + stats.skipped <= lines.len(),
        "cannot process more rows than were fed"
    );

    let first_pass = reports.snapshot_lines();
    reports.restore(lines.iter().map(String::as_str));
    assert_eq!(first_pass, reports.snapshot_lines(), "restore must be idempotent");

    let mut outages: BoundedLog<PowerFailureEvent, 4> = BoundedLog::new();
    outages.restore(lines.iter().map(String::as_str));
    assert!(outages.len() <= 4);
});
