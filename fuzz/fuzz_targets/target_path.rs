#![no_main]

use libfuzzer_sys::fuzz_target;
use edmscope::semantics::parse_target_path;

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data) {
        let _ = parse_target_path(text);
    }
});
