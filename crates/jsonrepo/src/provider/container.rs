//! Thread-safe holder for the currently published mapping.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;

use crate::mapping::FlatMapping;

/// The mapping a provider currently serves.
///
/// Each load replaces the whole mapping; it is never mutated in place.
/// Readers therefore see either the old or the new document, never a mix,
/// and an [`Arc`] obtained from [`get`](Self::get) stays valid across reloads.
///
/// The epoch counts replacements, so `epoch() != seen` is a cheap change
/// test that does not compare mappings.
///
/// # Example
///
/// ```rust
/// use jsonrepo::flatten::flatten;
/// use jsonrepo::provider::PublishedMapping;
///
/// let published = PublishedMapping::default();
/// let before = published.epoch();
///
/// published.replace(flatten(r#"{"Port": 8080}"#).unwrap());
///
/// assert_eq!(published.read(|m| m.value("port").map(str::to_owned)).as_deref(), Some("8080"));
/// assert_ne!(published.epoch(), before);
/// ```
#[derive(Default)]
pub struct PublishedMapping {
    inner: RwLock<Arc<FlatMapping>>,
    epoch: AtomicU64,
}

impl PublishedMapping {
    /// Creates a container publishing `mapping` at epoch 0.
    #[must_use]
    pub fn new(mapping: FlatMapping) -> Self {
        Self {
            inner: RwLock::new(Arc::new(mapping)),
            epoch: AtomicU64::new(0),
        }
    }

    /// A cheap handle to the current mapping.
    pub fn get(&self) -> Arc<FlatMapping> {
        self.inner.read().clone()
    }

    /// Reads the current mapping without cloning the [`Arc`].
    pub fn read<R, F>(&self, f: F) -> R
    where
        F: FnOnce(&FlatMapping) -> R,
    {
        let guard = self.inner.read();
        f(&guard)
    }

    /// Number of replacements so far.
    pub fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::Acquire)
    }

    /// Atomically publishes `mapping`, returning the previous one and the new
    /// epoch.
    pub fn swap(&self, mapping: Arc<FlatMapping>) -> (Arc<FlatMapping>, u64) {
        let mut guard = self.inner.write();
        let old = std::mem::replace(&mut *guard, mapping);
        let epoch = self.epoch.fetch_add(1, Ordering::AcqRel) + 1;
        drop(guard);

        (old, epoch)
    }

    /// Publishes `mapping`, discarding the previous one. Returns the new epoch.
    pub fn replace(&self, mapping: FlatMapping) -> u64 {
        self.swap(Arc::new(mapping)).1
    }
}

impl std::fmt::Debug for PublishedMapping {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PublishedMapping")
            .field("epoch", &self.epoch())
            .field("entries", &self.read(FlatMapping::len))
            .finish()
    }
}
