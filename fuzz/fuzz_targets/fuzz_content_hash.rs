#![no_main]

use jsonrepo::watch::{Observation, WatchState};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let text = String::from_utf8_lossy(data);

    let mut state = WatchState::new(&text);
    assert_eq!(state.observe(&text), Observation::Unchanged);

    let mut edited = text.into_owned();
    edited.push(' ');
    assert!(matches!(state.observe(&edited), Observation::Changed { .. }));
});
