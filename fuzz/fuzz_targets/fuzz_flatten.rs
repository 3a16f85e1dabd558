#![no_main]

use jsonrepo::flatten::flatten;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    // Flattening should return Result, never panic
    if let Ok(mapping) = flatten(text) {
        for entry in mapping.iter() {
            assert!(mapping.contains_key(&entry.key().to_ascii_uppercase()));
        }
    }
});
