//! Performance benchmarks for flattening and change detection.
//!
//! Run with: `cargo bench -p jsonrepo`

use std::fmt::Write as _;
use std::sync::LazyLock;

use jsonrepo::flatten::{flatten, normalize};
use jsonrepo::watch::ContentHash;

fn main() {
    divan::main();
}

// ============================================================================
// Documents
// ============================================================================

const SMALL: &str = r#"{
    "Server": { "Host": "localhost", "Port": 8080 },
    "Debug": true
}"#;

const COMMENTED: &str = r#"{
    // server settings
    "Server": { "Host": "localhost", "Port": 8080, },
    /* toggles */
    "Features": ["a", "b", "c",],
}"#;

/// 200 sections of 10 keys, plus one array per section.
static LARGE: LazyLock<String> = LazyLock::new(|| {
    let mut doc = String::from("{");
    for section in 0..200 {
        if section > 0 {
            doc.push(',');
        }
        let _ = write!(doc, r#""Section{section}": {{"#);
        for key in 0..10 {
            let _ = write!(doc, r#""Key{key}": "value-{section}-{key}","#);
        }
        let _ = write!(doc, r#""Hosts": ["h1", "h2", "h3"]}}"#);
    }
    doc.push('}');
    doc
});

/// Ten levels of nesting with arrays of objects at the bottom.
static DEEP: LazyLock<String> = LazyLock::new(|| {
    let leaf = r#"[{"a": 1, "b": null}, {"a": 2, "b": {}}]"#;
    (0..10).fold(leaf.to_owned(), |inner, level| format!(r#"{{"L{level}": {inner}}}"#))
});

// ============================================================================
// Flattening
// ============================================================================

#[divan::bench]
fn flatten_small() -> usize {
    flatten(divan::black_box(SMALL)).unwrap().len()
}

#[divan::bench]
fn flatten_commented() -> usize {
    flatten(divan::black_box(COMMENTED)).unwrap().len()
}

#[divan::bench]
fn flatten_large() -> usize {
    flatten(divan::black_box(&LARGE)).unwrap().len()
}

#[divan::bench]
fn flatten_deep() -> usize {
    flatten(divan::black_box(&DEEP)).unwrap().len()
}

#[divan::bench]
fn normalize_large() -> usize {
    normalize(divan::black_box(&LARGE)).len()
}

// ============================================================================
// Change Detection
// ============================================================================

#[divan::bench]
fn hash_large() -> ContentHash {
    ContentHash::of(divan::black_box(&LARGE))
}
