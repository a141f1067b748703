#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(value) = serde_json::from_slice::<serde_json::Value>(data) {
        if let Ok(record) = roster_core::Record::from_value(&value) {
            let _ = roster_core::Record::from_value(&record.to_value().unwrap()).unwrap();
        }
    }
});
