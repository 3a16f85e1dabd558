//! Builder for starting a watch on a JSON repository source.

use std::sync::Arc;
use std::time::Duration;

use super::handle::WatchHandle;
use super::scheduler::{ChangeCallback, ErrorCallback, ReloadScheduler};
use super::types::{ReloadEvent, WatchError};
use crate::provider::JsonRepositoryProvider;

/// Builder for watching a [`JsonRepositoryProvider`].
///
/// [`start`](Self::start) performs the initial load and, if the source has
/// `reload_on_change` enabled, starts polling it.
///
/// # Example
///
/// ```ignore
/// let handle = WatchBuilder::new(provider)
///     .on_change(|event| println!("reloaded {} ({} entries)", event.key, event.entries))
///     .on_error(|err| eprintln!("reload failed: {err}"))
///     .start()?;
/// ```
pub struct WatchBuilder {
    provider: Arc<JsonRepositoryProvider>,

    /// Overrides the source's change check interval.
    interval: Option<Duration>,

    /// Whether `start` loads the provider first (default: true).
    initial_load: bool,

    on_change: Option<ChangeCallback>,

    on_error: Option<ErrorCallback>,
}

impl WatchBuilder {
    /// Create a builder for `provider`.
    #[must_use]
    pub fn new(provider: Arc<JsonRepositoryProvider>) -> Self {
        Self {
            provider,
            interval: None,
            initial_load: true,
            on_change: None,
            on_error: None,
        }
    }

    /// Uses `interval` between change checks instead of the source's setting.
    #[must_use]
    pub const fn poll_interval(mut self, interval: Duration) -> Self {
        self.interval = Some(interval);
        self
    }

    /// Skips the initial load, for providers that were already loaded.
    #[must_use]
    pub const fn skip_initial_load(mut self) -> Self {
        self.initial_load = false;
        self
    }

    /// Register a callback invoked after each reload that published data.
    ///
    /// Runs on the watch's reload thread; keep it short.
    #[must_use]
    pub fn on_change<F>(mut self, callback: F) -> Self
    where
        F: Fn(ReloadEvent) + Send + Sync + 'static,
    {
        self.on_change = Some(Box::new(callback));
        self
    }

    /// Register a callback for failed reloads. The previous mapping is
    /// retained.
    #[must_use]
    pub fn on_error<F>(mut self, callback: F) -> Self
    where
        F: Fn(WatchError) + Send + Sync + 'static,
    {
        self.on_error = Some(Box::new(callback));
        self
    }

    /// Loads the provider and starts the watch.
    ///
    /// # Errors
    ///
    /// - [`WatchError::InitialLoad`] if the initial load fails
    /// - [`WatchError::InitFailed`] if the interval is zero or the threads
    ///   cannot be spawned
    pub fn start(self) -> Result<WatchHandle, WatchError> {
        if self.initial_load {
            self.provider
                .load()
                .map_err(|source| WatchError::InitialLoad { source })?;
        }

        let source = self.provider.source();
        if !source.is_reload_on_change() {
            tracing::debug!(key = source.key(), "reload on change disabled, not watching");
            return Ok(WatchHandle::new(ReloadScheduler::disabled(self.provider)));
        }

        let interval = self.interval.unwrap_or_else(|| source.interval());
        let scheduler =
            ReloadScheduler::start(self.provider, interval, self.on_change, self.on_error)?;

        Ok(WatchHandle::new(scheduler))
    }
}

impl JsonRepositoryProvider {
    /// Starts building a watch on this provider.
    #[must_use]
    pub fn watch(self: &Arc<Self>) -> WatchBuilder {
        WatchBuilder::new(Arc::clone(self))
    }
}
