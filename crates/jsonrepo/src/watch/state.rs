//! Change-detection state owned by a single polling loop.

use super::hash::ContentHash;

/// Result of comparing a fetch with the previous one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Observation {
    /// Same digest as the last fetch.
    Unchanged,

    /// The digest differs; `generation` counts detected changes.
    Changed {
        /// The new change generation.
        generation: u64,
    },
}

/// Last-known digest and change generation of one watched document.
#[derive(Debug, Clone)]
pub struct WatchState {
    last_hash: ContentHash,
    generation: u64,
}

impl WatchState {
    /// Starts tracking from the text of the first fetch.
    #[must_use]
    pub fn new(initial_text: &str) -> Self {
        Self {
            last_hash: ContentHash::of(initial_text),
            generation: 0,
        }
    }

    /// Compares `text` with the last fetch and remembers it.
    pub fn observe(&mut self, text: &str) -> Observation {
        let hash = ContentHash::of(text);
        if hash == self.last_hash {
            return Observation::Unchanged;
        }

        self.last_hash = hash;
        self.generation += 1;

        Observation::Changed {
            generation: self.generation,
        }
    }

    /// Number of changes detected so far.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Digest of the last observed fetch.
    #[must_use]
    pub const fn last_hash(&self) -> &ContentHash {
        &self.last_hash
    }
}
