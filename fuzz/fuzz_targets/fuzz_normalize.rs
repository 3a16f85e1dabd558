#![no_main]

use jsonrepo::flatten::normalize;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    // Comments and trailing commas are blanked, never removed
    let normalized = normalize(text);
    assert_eq!(normalized.len(), text.len());
    assert_eq!(normalized.matches('\n').count(), text.matches('\n').count());
});
