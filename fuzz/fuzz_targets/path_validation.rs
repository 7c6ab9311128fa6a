#![no_main]
use connwatch::validation::validate_file_path;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        let _ = validate_file_path(input);
    }
});
