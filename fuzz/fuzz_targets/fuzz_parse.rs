#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data) {
        if let Ok(records) = roster_core::document::parse(text) {
            // Anything that parses must render and parse back to the same records.
            let rendered = roster_core::document::render(&records).unwrap();
            assert_eq!(roster_core::document::parse(&rendered).unwrap(), records);
        }
    }
});
