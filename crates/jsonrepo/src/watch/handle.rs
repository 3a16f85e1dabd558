//! User-facing handle for a watched source.

use std::sync::Arc;

use super::scheduler::ReloadScheduler;
use super::types::WatchError;
use crate::mapping::FlatMapping;
use crate::provider::JsonRepositoryProvider;

/// Handle for reading a watched source and controlling its watch.
///
/// Cheap to clone; all clones share one watch. Dropping the last clone
/// stops the watch and joins its threads.
///
/// # Example
///
/// ```ignore
/// let mapping = handle.get();
/// println!("port: {:?}", mapping.value("Server:Port"));
///
/// let epoch = handle.epoch();
/// // ... later ...
/// if handle.has_changed_since(epoch) {
///     println!("document was reloaded");
/// }
///
/// handle.stop();
/// ```
#[derive(Clone)]
pub struct WatchHandle {
    scheduler: Arc<ReloadScheduler>,
}

impl WatchHandle {
    pub(crate) fn new(scheduler: ReloadScheduler) -> Self {
        Self {
            scheduler: Arc::new(scheduler),
        }
    }

    /// The currently published mapping.
    ///
    /// The returned `Arc` stays valid after later reloads.
    #[must_use]
    pub fn get(&self) -> Arc<FlatMapping> {
        self.scheduler.provider().snapshot()
    }

    /// The provider being watched, e.g. to add it to a
    /// [`ConfigLoader`](crate::loader::ConfigLoader).
    #[must_use]
    pub fn provider(&self) -> &Arc<JsonRepositoryProvider> {
        self.scheduler.provider()
    }

    /// Number of mappings published so far. Increments on every load,
    /// including reloads that produced identical data.
    #[must_use]
    pub fn epoch(&self) -> u64 {
        self.scheduler.provider().epoch()
    }

    /// Number of content changes the poller has detected.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.scheduler.generation()
    }

    /// Check if a new mapping was published since `epoch`.
    #[must_use]
    pub fn has_changed_since(&self, epoch: u64) -> bool {
        self.epoch() != epoch
    }

    /// Queues a reload without waiting for the next change check.
    ///
    /// # Errors
    ///
    /// Returns [`WatchError::Stopped`] if the watch was stopped or never
    /// enabled, or [`WatchError::ChannelError`] if the reload thread exited.
    pub fn reload(&self) -> Result<(), WatchError> {
        self.scheduler.request_reload()
    }

    /// Stops the watch. The last published mapping stays readable.
    pub fn stop(&self) {
        self.scheduler.stop();
    }

    /// `false` once stopped, or if the source does not reload on change.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.scheduler.is_running()
    }
}

impl std::fmt::Debug for WatchHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatchHandle")
            .field("key", &self.provider().source().key())
            .field("epoch", &self.epoch())
            .field("generation", &self.generation())
            .field("running", &self.is_running())
            .finish()
    }
}
