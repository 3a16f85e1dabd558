//! Background polling and reload threads.
//!
//! A running [`ReloadScheduler`] owns two threads per watched source:
//!
//! - the **poller** waits one interval, fetches the document, compares its
//!   digest with the previous fetch and signals a reload on difference;
//! - the **reloader** runs the provider's reload for each signal and invokes
//!   the callbacks.
//!
//! The reload signal channel holds a single pending trigger. A change seen
//! while a reload is still pending is dropped, because the pending reload
//! fetches again and picks up the newest document anyway.
//!
//! Stopping closes the shutdown channel, which wakes both threads at once.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender, TrySendError, at, bounded, select};
use parking_lot::Mutex;

use super::state::{Observation, WatchState};
use super::types::{ReloadEvent, ReloadTrigger, WatchError};
use crate::provider::{JsonRepositoryProvider, LoadOutcome};

/// Callback type for applied reloads.
pub type ChangeCallback = Box<dyn Fn(ReloadEvent) + Send + Sync + 'static>;

/// Callback type for failed reloads.
pub type ErrorCallback = Box<dyn Fn(WatchError) + Send + Sync + 'static>;

/// State shared between the scheduler and its threads.
pub(crate) struct SchedulerShared {
    pub provider: Arc<JsonRepositoryProvider>,
    pub running: AtomicBool,
    pub generation: AtomicU64,
}

impl SchedulerShared {
    fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    fn key(&self) -> &str {
        self.provider.source().key()
    }
}

/// Polls one source and reloads it when its content hash changes.
pub(crate) struct ReloadScheduler {
    shared: Arc<SchedulerShared>,
    reload_tx: Option<Sender<ReloadTrigger>>,
    shutdown_tx: Mutex<Option<Sender<()>>>,
    threads: Vec<JoinHandle<()>>,
}

impl ReloadScheduler {
    /// A scheduler that never polls, for sources without `reload_on_change`.
    pub fn disabled(provider: Arc<JsonRepositoryProvider>) -> Self {
        Self {
            shared: Arc::new(SchedulerShared {
                provider,
                running: AtomicBool::new(false),
                generation: AtomicU64::new(0),
            }),
            reload_tx: None,
            shutdown_tx: Mutex::new(None),
            threads: Vec::new(),
        }
    }

    /// Fetches the baseline document and starts both threads.
    pub fn start(
        provider: Arc<JsonRepositoryProvider>,
        interval: Duration,
        on_change: Option<ChangeCallback>,
        on_error: Option<ErrorCallback>,
    ) -> Result<Self, WatchError> {
        if interval.is_zero() {
            return Err(WatchError::init_failed(
                "change check interval must be greater than zero",
                None,
            ));
        }

        let state = WatchState::new(&provider.fetch_text());
        let key = provider.source().key().to_owned();

        let (reload_tx, reload_rx) = bounded::<ReloadTrigger>(1);
        let (shutdown_tx, shutdown_rx) = bounded::<()>(0);

        let mut scheduler = Self {
            shared: Arc::new(SchedulerShared {
                provider,
                running: AtomicBool::new(true),
                generation: AtomicU64::new(0),
            }),
            reload_tx: Some(reload_tx.clone()),
            shutdown_tx: Mutex::new(Some(shutdown_tx)),
            threads: Vec::with_capacity(2),
        };

        // Dropping `scheduler` on a spawn failure stops whatever already started.
        let shared = Arc::clone(&scheduler.shared);
        let stop = shutdown_rx.clone();
        let reloader = thread::Builder::new()
            .name(format!("jsonrepo-reload-{key}"))
            .spawn(move || reload_loop(&shared, &reload_rx, &stop, on_change, on_error))
            .map_err(|e| WatchError::init_failed("failed to spawn reload thread", Some(e)))?;
        scheduler.threads.push(reloader);

        let shared = Arc::clone(&scheduler.shared);
        let poller = thread::Builder::new()
            .name(format!("jsonrepo-poll-{key}"))
            .spawn(move || poll_loop(&shared, state, interval, &reload_tx, &shutdown_rx))
            .map_err(|e| WatchError::init_failed("failed to spawn poll thread", Some(e)))?;
        scheduler.threads.push(poller);

        tracing::debug!(key, ?interval, "watch started");

        Ok(scheduler)
    }

    pub fn provider(&self) -> &Arc<JsonRepositoryProvider> {
        &self.shared.provider
    }

    pub fn generation(&self) -> u64 {
        self.shared.generation.load(Ordering::Acquire)
    }

    pub fn is_running(&self) -> bool {
        self.shared.is_running()
    }

    /// Queues a manual reload. Succeeds without queueing if one is pending.
    pub fn request_reload(&self) -> Result<(), WatchError> {
        let Some(reload_tx) = self.reload_tx.as_ref().filter(|_| self.is_running()) else {
            return Err(WatchError::Stopped);
        };

        match reload_tx.try_send(ReloadTrigger::Manual) {
            Ok(()) => Ok(()),

            Err(TrySendError::Full(_)) => {
                tracing::trace!(key = self.shared.key(), "reload already pending");
                Ok(())
            }

            Err(TrySendError::Disconnected(_)) => {
                Err(WatchError::channel_error("reload thread has exited"))
            }
        }
    }

    /// Stops polling. Idempotent; in-flight work finishes, nothing new starts.
    pub fn stop(&self) {
        let was_running = self.shared.running.swap(false, Ordering::AcqRel);
        drop(self.shutdown_tx.lock().take());

        if was_running {
            tracing::debug!(key = self.shared.key(), "watch stopped");
        }
    }
}

impl Drop for ReloadScheduler {
    fn drop(&mut self) {
        self.stop();

        let current = thread::current().id();
        for handle in self.threads.drain(..) {
            // The last handle may be dropped from inside a callback.
            if handle.thread().id() != current {
                let _ = handle.join();
            }
        }
    }
}

fn poll_loop(
    shared: &SchedulerShared,
    mut state: WatchState,
    interval: Duration,
    reload_tx: &Sender<ReloadTrigger>,
    shutdown_rx: &Receiver<()>,
) {
    let mut deadline = Instant::now() + interval;

    loop {
        select! {
            recv(shutdown_rx) -> _ => break,

            recv(at(deadline)) -> _ => {
                if !shared.is_running() {
                    break;
                }

                tick(shared, &mut state, reload_tx);
                deadline = Instant::now() + interval;
            }
        }
    }
}

fn tick(shared: &SchedulerShared, state: &mut WatchState, reload_tx: &Sender<ReloadTrigger>) {
    let key = shared.key();
    let text = shared.provider.fetch_text();

    match state.observe(&text) {
        Observation::Unchanged => {}

        Observation::Changed { generation } => {
            shared.generation.store(generation, Ordering::Release);
            tracing::info!(key, generation, "JSON document changed");

            match reload_tx.try_send(ReloadTrigger::ContentChanged { generation }) {
                Ok(()) | Err(TrySendError::Disconnected(_)) => {}

                Err(TrySendError::Full(_)) => {
                    tracing::trace!(key, generation, "reload already pending");
                }
            }
        }
    }
}

fn reload_loop(
    shared: &SchedulerShared,
    reload_rx: &Receiver<ReloadTrigger>,
    shutdown_rx: &Receiver<()>,
    on_change: Option<ChangeCallback>,
    on_error: Option<ErrorCallback>,
) {
    loop {
        select! {
            recv(shutdown_rx) -> _ => break,

            recv(reload_rx) -> trigger => {
                let Ok(trigger) = trigger else { break };
                if !shared.is_running() {
                    break;
                }

                apply_reload(shared, trigger, on_change.as_ref(), on_error.as_ref());
            }
        }
    }
}

fn apply_reload(
    shared: &SchedulerShared,
    trigger: ReloadTrigger,
    on_change: Option<&ChangeCallback>,
    on_error: Option<&ErrorCallback>,
) {
    let key = shared.key();

    match shared.provider.reload() {
        Ok(LoadOutcome::Loaded { entries, epoch }) => {
            tracing::debug!(key, %trigger, entries, epoch, "reload applied");

            if let Some(callback) = on_change {
                let generation = shared.generation.load(Ordering::Acquire);
                callback(ReloadEvent::new(key, trigger, generation, epoch, entries));
            }
        }

        Ok(LoadOutcome::Ignored) => {}

        Err(e) => {
            tracing::warn!(key, %trigger, error = %e, "reload failed, keeping previous configuration");

            if let Some(callback) = on_error {
                callback(WatchError::reload_failed(key, e));
            }
        }
    }
}
