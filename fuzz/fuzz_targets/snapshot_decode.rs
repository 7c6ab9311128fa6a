#![no_main]
use connwatch::snapshot::Snapshot;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        // Should handle any body without panicking, only return errors
        let _ = Snapshot::from_json_str(input);
    }
});
