//! Core types for reload scheduling.
//!
//! - [`WatchError`] - Errors raised by watches and reloads
//! - [`ReloadEvent`] - Describes a reload that published new data
//! - [`ReloadTrigger`] - What caused the reload

use std::fmt::{self, Display, Formatter};
use std::time::Instant;

use miette::Diagnostic;
use thiserror::Error;

/// Error type for watch and reload operations.
#[derive(Debug, Error, Diagnostic)]
#[non_exhaustive]
pub enum WatchError {
    /// The watch could not be started.
    #[error("failed to start watch: {message}")]
    #[diagnostic(
        code(jsonrepo::watch::init_failed),
        help("check the change check interval and that threads can be spawned")
    )]
    InitFailed {
        /// Human-readable error message.
        message: String,
        /// The underlying OS error, if available.
        #[source]
        source: Option<std::io::Error>,
    },

    /// The load performed when starting the watch failed.
    #[error("initial load failed")]
    #[diagnostic(code(jsonrepo::watch::initial_load))]
    InitialLoad {
        /// The load error.
        #[source]
        #[diagnostic_source]
        source: crate::Error,
    },

    /// A reload failed. The previous mapping stays published.
    #[error("reload of '{key}' failed")]
    #[diagnostic(
        code(jsonrepo::watch::reload_failed),
        help(
            "fix the document in the repository; the previous configuration remains active until a valid document is loaded"
        )
    )]
    ReloadFailed {
        /// The document key.
        key: String,
        /// The load error.
        #[source]
        #[diagnostic_source]
        source: crate::Error,
    },

    /// The watch has been stopped or was never enabled.
    #[error("watch is not running")]
    #[diagnostic(
        code(jsonrepo::watch::stopped),
        help("enable reload_on_change on the source and start a new watch")
    )]
    Stopped,

    /// Channel communication error.
    #[error("internal channel error: {message}")]
    #[diagnostic(code(jsonrepo::watch::channel_error))]
    ChannelError {
        /// Human-readable error message.
        message: String,
    },
}

impl WatchError {
    /// Create a new `InitFailed` error.
    pub fn init_failed(message: impl Into<String>, source: Option<std::io::Error>) -> Self {
        Self::InitFailed {
            message: message.into(),
            source,
        }
    }

    /// Create a new `ReloadFailed` error.
    pub fn reload_failed(key: impl Into<String>, source: crate::Error) -> Self {
        Self::ReloadFailed {
            key: key.into(),
            source,
        }
    }

    /// Create a new `ChannelError`.
    pub fn channel_error(message: impl Into<String>) -> Self {
        Self::ChannelError {
            message: message.into(),
        }
    }
}

/// What triggered a reload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ReloadTrigger {
    /// The poller saw a different document hash.
    ContentChanged {
        /// Change generation that triggered the reload.
        generation: u64,
    },

    /// [`WatchHandle::reload`](super::WatchHandle::reload) was called.
    Manual,
}

impl Display for ReloadTrigger {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::ContentChanged { generation } => write!(f, "content changed (generation {generation})"),

            Self::Manual => write!(f, "manual reload"),
        }
    }
}

/// A reload that published a new mapping.
///
/// Passed to [`WatchBuilder::on_change`](super::WatchBuilder::on_change).
/// When several changes coalesce into one reload, `trigger` names the first
/// and `generation` the latest seen at publish time.
#[derive(Debug, Clone)]
pub struct ReloadEvent {
    /// The document key.
    pub key: String,

    /// What triggered this reload.
    pub trigger: ReloadTrigger,

    /// Latest change generation observed by the poller.
    pub generation: u64,

    /// Epoch of the newly published mapping.
    pub epoch: u64,

    /// Number of entries in the new mapping.
    pub entries: usize,

    /// When the new mapping was published.
    pub timestamp: Instant,
}

impl ReloadEvent {
    pub(crate) fn new(
        key: impl Into<String>,
        trigger: ReloadTrigger,
        generation: u64,
        epoch: u64,
        entries: usize,
    ) -> Self {
        Self {
            key: key.into(),
            trigger,
            generation,
            epoch,
            entries,
            timestamp: Instant::now(),
        }
    }

    /// Returns `true` if the reload was requested manually.
    #[must_use]
    pub const fn is_manual(&self) -> bool {
        matches!(self.trigger, ReloadTrigger::Manual)
    }
}
