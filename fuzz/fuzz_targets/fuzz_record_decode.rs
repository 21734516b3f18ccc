//! Fuzz target: flat-store line decoders
//!
//! Drives arbitrary bytes (lossy-decoded to text, the same way the
//! store reads damaged files) into every record decoder and asserts:
//! - No panics on any input
//! - Decode is a fixpoint: whatever decodes, re-encodes to a line that
//!   decodes to the identical record
//!
//! cargo fuzz run fuzz_record_decode

#![no_main]

use libfuzzer_sys::fuzz_target;
use tankalarm::records::{PowerFailureEvent, Recipient, Record, TankReport};
use tankalarm::recovery::is_clean_marker;

fuzz_target!(|data: &[u8]| {
    let line = String::from_utf8_lossy(data);

    if let Some(report) = TankReport::decode(&line) {
        let reencoded = report.encode();
        assert_eq!(
            TankReport::decode(&reencoded),
            Some(report),
            "decode -> encode -> decode must be stable"
        );
    }

    if let Some(event) = PowerFailureEvent::decode(&line) {
        let reencoded = event.encode();
        assert_eq!(PowerFailureEvent::decode(&reencoded), Some(event));
    }

    if let Some(addr) = Recipient::decode(&line) {
        let reencoded = addr.encode();
        assert_eq!(Recipient::decode(&reencoded), Some(addr));
    }

    // Marker classification is total over arbitrary text.
    let _ = is_clean_marker(&line);
});
