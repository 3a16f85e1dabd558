//! # jsonrepo
//!
//! Flattened, hot-reloading configuration from JSON documents kept in any
//! repository: a database table, a key-value store, an HTTP API or a
//! directory of files.
//!
//! A repository hands out the raw text of a document by key. `jsonrepo`
//! flattens that document into ordered `Section:Key` entries that plug into
//! a layered configuration lookup, and can poll the repository so that a
//! changed document is reloaded without restarting the process.
//!
//! ## Features
//!
//! - **Flattening** - Nested objects and arrays become `a:b:0:c` keys
//! - **Case-insensitive keys** - Lookups and duplicate detection ignore case
//! - **Lenient input** - Comments and trailing commas are accepted
//! - **Hash-based change detection** - SHA-256 over each fetch; unchanged
//!   documents never reload
//! - **Error hook** - Every load error can be inspected and ignored per source
//! - **Rich diagnostics** - Malformed documents point at the exact line/column
//!   via [`miette`]
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use jsonrepo::loader::ConfigLoader;
//! use jsonrepo::repository::InMemoryRepository;
//! use jsonrepo::source::RepositorySource;
//!
//! let repo = Arc::new(InMemoryRepository::new().with(
//!     "payments",
//!     r#"{
//!         // gateway settings
//!         "Gateway": { "Url": "https://pay.example", "TimeoutSecs": 30 },
//!         "Currencies": ["EUR", "USD"],
//!     }"#,
//! ));
//!
//! let mut config = ConfigLoader::new()
//!     .with_json_repository(RepositorySource::new("payments").repository(repo))
//!     .unwrap();
//!
//! assert_eq!(config.get_str("gateway:url").as_deref(), Some("https://pay.example"));
//! assert_eq!(config.get_parsed::<u32>("Gateway:TimeoutSecs").unwrap(), Some(30));
//! assert_eq!(config.get_str("Currencies:1").as_deref(), Some("USD"));
//! ```
//!
//! ## Hot Reload
//!
//! ```rust,ignore
//! let provider = Arc::new(JsonRepositoryProvider::new(
//!     RepositorySource::new("payments")
//!         .repository(repo)
//!         .reload_on_change(true)
//!         .change_check_interval(Duration::from_secs(30)),
//! ));
//!
//! let handle = provider.watch().start()?;
//! let current = handle.get();
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Description | Default |
//! |---------|-------------|---------|
//! | `watch` | Background polling and hot reload | **Yes** |
//! | `async` | Async repositories and the tokio [`ReloadService`](watch::ReloadService) | No |
//!
//! ## Error Handling
//!
//! Load errors are reported through [`Error`], which integrates with
//! [`miette`] for rich terminal diagnostics:
//!
//! ```rust,ignore
//! fn main() -> jsonrepo::Result<()> {
//!     let provider = JsonRepositoryProvider::new(source);
//!     provider.load()?;
//!     Ok(())
//! }
//! ```

#![deny(missing_docs)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Re-export miette for error handling.
pub use miette;

// ============================================================================
// Core Modules
// ============================================================================

mod error;
pub use error::{Error, LoadErrorContext, LoadErrorHook};

/// A Result type that displays errors with miette's fancy formatting.
///
/// This is equivalent to `miette::Result<T>`.
pub type Result<T> = miette::Result<T>;

pub mod flatten;
pub mod mapping;
pub mod repository;
pub mod source;

pub use flatten::{FlattenError, JsonKind, KEY_DELIMITER, flatten};
pub use mapping::{FlatEntry, FlatMapping};
pub use repository::{FileRepository, InMemoryRepository, JsonRepository, RepositoryError};
#[cfg(feature = "async")]
pub use repository::{AsyncJsonRepository, BlockingAdapter};
pub use source::{RepositorySource, SourceSettings};

// ============================================================================
// Provider Integration
// ============================================================================

pub mod loader;
pub mod provider;

pub use loader::ConfigLoader;
pub use provider::{JsonRepositoryProvider, LoadOutcome, Provider, ProviderValue};

// ============================================================================
// Hot Reload Support
// ============================================================================

#[cfg(feature = "watch")]
pub mod watch;

#[cfg(feature = "watch")]
pub use watch::{ReloadEvent, WatchBuilder, WatchError, WatchHandle};
