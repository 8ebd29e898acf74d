#![no_main]

use libfuzzer_sys::fuzz_target;
use edmscope::edm::parse_type_name;

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data) {
        let _ = parse_type_name(text);
    }
});
