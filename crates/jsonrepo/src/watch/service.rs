//! Tokio-driven reload service for many sources.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::sync::watch;
use tokio::time::{Instant, sleep_until};

use super::state::{Observation, WatchState};
use crate::provider::{JsonRepositoryProvider, LoadOutcome};

/// Polls every registered reload-enabled provider until shutdown.
///
/// The service is the async counterpart of
/// [`WatchBuilder`](super::WatchBuilder): instead of two threads per source
/// it runs one task per source on the caller's tokio runtime. Repository
/// fetches and reloads run on the blocking pool. Providers are expected to
/// be loaded already.
///
/// # Example
///
/// ```rust,ignore
/// let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
///
/// let service = ReloadService::new()
///     .with_provider(Arc::clone(&payments))
///     .with_provider(Arc::clone(&features));
///
/// let task = tokio::spawn(service.run(shutdown_rx));
/// // ...
/// shutdown_tx.send(true)?;
/// task.await?;
/// ```
#[derive(Default)]
pub struct ReloadService {
    providers: Vec<Arc<JsonRepositoryProvider>>,
}

impl ReloadService {
    /// Creates a service with no providers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a provider. Providers whose source does not reload on change
    /// are ignored by [`run`](Self::run).
    #[must_use]
    pub fn with_provider(mut self, provider: Arc<JsonRepositoryProvider>) -> Self {
        self.providers.push(provider);
        self
    }

    /// Number of providers that will be polled.
    #[must_use]
    pub fn watched_count(&self) -> usize {
        self.providers
            .iter()
            .filter(|p| p.source().is_reload_on_change())
            .count()
    }

    /// Runs all polling loops until `shutdown` becomes `true` or its sender
    /// is dropped.
    pub async fn run(self, shutdown: watch::Receiver<bool>) {
        let loops = self
            .providers
            .into_iter()
            .filter(|p| p.source().is_reload_on_change())
            .map(|provider| poll_source(provider, shutdown.clone()));

        join_all(loops).await;
    }
}

async fn poll_source(provider: Arc<JsonRepositoryProvider>, mut shutdown: watch::Receiver<bool>) {
    let key = provider.source().key().to_owned();
    let interval = provider.source().interval();

    if interval.is_zero() {
        tracing::warn!(key, "change check interval is zero, not watching");
        return;
    }

    let Some(initial) = fetch(&provider).await else {
        return;
    };
    let mut state = WatchState::new(&initial);

    tracing::debug!(key, ?interval, "reload loop started");

    while wait_for_tick(&mut shutdown, interval).await {
        let Some(text) = fetch(&provider).await else {
            break;
        };

        if let Observation::Changed { generation } = state.observe(&text) {
            tracing::info!(key, generation, "JSON document changed");
            reload(&provider, &key).await;
        }
    }

    tracing::debug!(key, "reload loop stopped");
}

/// Waits one full `interval`. Returns `false` as soon as shutdown is
/// requested or the sender is dropped.
async fn wait_for_tick(shutdown: &mut watch::Receiver<bool>, interval: Duration) -> bool {
    if is_shut_down(shutdown) {
        return false;
    }

    let deadline = Instant::now() + interval;
    loop {
        let woken = tokio::select! {
            changed = shutdown.changed() => Some(changed.is_ok()),
            () = sleep_until(deadline) => None,
        };

        match woken {
            None => return !is_shut_down(shutdown),
            // A value other than `true` was sent; keep the remaining wait.
            Some(true) if !*shutdown.borrow() => {}
            Some(_) => return false,
        }
    }
}

fn is_shut_down(shutdown: &watch::Receiver<bool>) -> bool {
    *shutdown.borrow() || shutdown.has_changed().is_err()
}

async fn fetch(provider: &Arc<JsonRepositoryProvider>) -> Option<String> {
    let provider = Arc::clone(provider);

    match tokio::task::spawn_blocking(move || provider.fetch_text()).await {
        Ok(text) => Some(text),

        Err(e) => {
            tracing::warn!(error = %e, "fetch task failed");
            None
        }
    }
}

async fn reload(provider: &Arc<JsonRepositoryProvider>, key: &str) {
    let provider = Arc::clone(provider);

    match tokio::task::spawn_blocking(move || provider.reload()).await {
        Ok(Ok(LoadOutcome::Loaded { entries, epoch })) => {
            tracing::debug!(key, entries, epoch, "reload applied");
        }

        Ok(Ok(LoadOutcome::Ignored)) => {}

        Ok(Err(e)) => {
            tracing::warn!(key, error = %e, "reload failed, keeping previous configuration");
        }

        Err(e) => {
            tracing::warn!(key, error = %e, "reload task failed");
        }
    }
}
