//! Change detection and hot reload for repository documents.
//!
//! Repositories have no change notifications, so a watched source is polled:
//! every interval the document is fetched and hashed with SHA-256, and a
//! reload is triggered only when the digest differs from the previous fetch.
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use std::time::Duration;
//! use jsonrepo::provider::JsonRepositoryProvider;
//! use jsonrepo::source::RepositorySource;
//!
//! let provider = Arc::new(JsonRepositoryProvider::new(
//!     RepositorySource::new("payments")
//!         .repository(repo)
//!         .reload_on_change(true)
//!         .change_check_interval(Duration::from_secs(30)),
//! ));
//!
//! let handle = provider
//!     .watch()
//!     .on_change(|event| tracing::info!(key = %event.key, "settings reloaded"))
//!     .on_error(|err| tracing::error!(error = %err, "settings reload failed"))
//!     .start()?;
//!
//! let mapping = handle.get();
//! ```
//!
//! # Architecture
//!
//! ```text
//! ┌────────────┐ fetch + hash ┌──────────┐  trigger   ┌──────────┐
//! │ Repository │◀─────────────│  Poller  │───────────▶│ Reloader │
//! └────────────┘  every tick  └──────────┘ (1 slot)   └──────────┘
//!                                                         │ reload()
//!                                                         ▼
//!                      ┌─────────────┐          ┌──────────────────┐
//!                      │ WatchHandle │─────────▶│ PublishedMapping │
//!                      │ (user API)  │   get()  │ (RwLock<Arc<_>>) │
//!                      └─────────────┘          └──────────────────┘
//! ```
//!
//! # Error Handling
//!
//! Fetch failures count as an empty document for hashing and never stop the
//! poller. A reload that fails keeps the previous mapping, passes through
//! the source's load error hook and then reaches the `on_error` callback.
//!
//! # Async
//!
//! With the `async` feature, [`ReloadService`] polls many providers as tokio
//! tasks instead of dedicated threads.

mod builder;
mod handle;
mod hash;
mod scheduler;
#[cfg(feature = "async")]
mod service;
mod state;
mod types;

pub use builder::WatchBuilder;
pub use handle::WatchHandle;
pub use hash::ContentHash;
pub use scheduler::{ChangeCallback, ErrorCallback};
#[cfg(feature = "async")]
pub use service::ReloadService;
pub use state::{Observation, WatchState};
pub use types::{ReloadEvent, ReloadTrigger, WatchError};
