//! Repository abstraction: where JSON documents come from.
//!
//! A [`JsonRepository`] fetches the raw text of a JSON document by key. It
//! can wrap a database query, an HTTP call, a secret store or a local file;
//! the rest of the crate only sees the text.
//!
//! # Built-in Repositories
//!
//! - [`InMemoryRepository`] - Thread-safe map of documents, mutable at runtime
//! - [`FileRepository`] - Reads `<root>/<key>.json`
//! - Any closure `Fn(&str) -> RepositoryResult`
//!
//! # Custom Repositories
//!
//! ```rust,ignore
//! use jsonrepo::repository::{JsonRepository, RepositoryError, RepositoryResult};
//!
//! struct SettingsTable { pool: DbPool }
//!
//! impl JsonRepository for SettingsTable {
//!     fn get_by_key(&self, key: &str) -> RepositoryResult {
//!         self.pool
//!             .query_one("SELECT body FROM settings WHERE name = $1", &[&key])
//!             .map_err(|e| RepositoryError::unavailable_with_source(key, "query failed", e))
//!     }
//! }
//! ```
//!
//! An empty or whitespace-only result means "no document"; the provider
//! decides whether that is an error based on the source's `optional` flag.

#[cfg(feature = "async")]
mod adapter;
mod file;

#[cfg(feature = "async")]
pub use adapter::BlockingAdapter;
pub use file::FileRepository;

use std::collections::HashMap;
use std::error::Error as StdError;
use std::path::PathBuf;

use miette::Diagnostic;
use parking_lot::RwLock;
use thiserror::Error as ThisError;

// ============================================================================
// Repository Errors
// ============================================================================

/// Errors a repository can report while fetching a document.
#[derive(Debug, ThisError, Diagnostic)]
#[non_exhaustive]
pub enum RepositoryError {
    /// No document is stored under the key.
    #[error("no JSON document stored under the key '{key}'")]
    #[diagnostic(code(jsonrepo::repository::not_found))]
    NotFound {
        /// The key that was requested.
        key: String,
    },

    /// The backing store could not be reached or refused the request.
    #[error("repository unavailable for the key '{key}': {message}")]
    #[diagnostic(
        code(jsonrepo::repository::unavailable),
        help("check the repository configuration and connectivity")
    )]
    Unavailable {
        /// The key that was requested.
        key: String,
        /// Human-readable description.
        message: String,
        /// The underlying error, if any.
        #[source]
        source: Option<Box<dyn StdError + Send + Sync>>,
    },

    /// Reading a local document failed.
    #[error("failed to read JSON document: {}", path.display())]
    #[diagnostic(
        code(jsonrepo::repository::io),
        help("check file permissions and ensure it's readable")
    )]
    Io {
        /// The file that could not be read.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

impl RepositoryError {
    /// Creates a [`RepositoryError::NotFound`].
    pub fn not_found(key: impl Into<String>) -> Self {
        Self::NotFound { key: key.into() }
    }

    /// Creates a [`RepositoryError::Unavailable`] without an underlying cause.
    pub fn unavailable(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Unavailable {
            key: key.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Creates a [`RepositoryError::Unavailable`] wrapping another error.
    pub fn unavailable_with_source(
        key: impl Into<String>,
        message: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self::Unavailable {
            key: key.into(),
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

/// Result type for repository fetches: the raw document text.
pub type RepositoryResult = Result<String, RepositoryError>;

// ============================================================================
// Repository Trait
// ============================================================================

/// Fetches raw JSON text by key.
///
/// Used both for the initial load and for every poll of a watched source, so
/// implementations must be safe to call from a background thread.
pub trait JsonRepository: Send + Sync {
    /// Returns the entire JSON document stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be fetched. The provider
    /// treats an error like an empty document.
    fn get_by_key(&self, key: &str) -> RepositoryResult;
}

impl<F> JsonRepository for F
where
    F: Fn(&str) -> RepositoryResult + Send + Sync,
{
    fn get_by_key(&self, key: &str) -> RepositoryResult {
        self(key)
    }
}

// ============================================================================
// In-memory Repository
// ============================================================================

/// Thread-safe in-memory document store.
///
/// Documents can be replaced at any time, which makes this the natural
/// repository for tests and for documents pushed in by another component.
///
/// # Example
///
/// ```rust
/// use jsonrepo::repository::{InMemoryRepository, JsonRepository};
///
/// let repo = InMemoryRepository::new().with("app", r#"{"Port": 8080}"#);
/// assert_eq!(repo.get_by_key("app").unwrap(), r#"{"Port": 8080}"#);
///
/// repo.set("app", r#"{"Port": 9090}"#);
/// assert!(repo.get_by_key("app").unwrap().contains("9090"));
/// ```
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    documents: RwLock<HashMap<String, String>>,
}

impl InMemoryRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a document, builder style.
    #[must_use]
    pub fn with(self, key: impl Into<String>, document: impl Into<String>) -> Self {
        self.set(key, document);
        self
    }

    /// Stores or replaces a document.
    pub fn set(&self, key: impl Into<String>, document: impl Into<String>) {
        self.documents.write().insert(key.into(), document.into());
    }

    /// Removes a document, returning it if present.
    pub fn remove(&self, key: &str) -> Option<String> {
        self.documents.write().remove(key)
    }
}

impl JsonRepository for InMemoryRepository {
    fn get_by_key(&self, key: &str) -> RepositoryResult {
        self.documents
            .read()
            .get(key)
            .cloned()
            .ok_or_else(|| RepositoryError::not_found(key))
    }
}

// ============================================================================
// Async Repository Trait
// ============================================================================

#[cfg(feature = "async")]
use std::future::Future;
#[cfg(feature = "async")]
use std::pin::Pin;

/// Boxed future type for async repository methods.
#[cfg(feature = "async")]
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Asynchronous counterpart of [`JsonRepository`].
///
/// Use [`BlockingAdapter`] to plug an async repository into a provider.
///
/// # Example
///
/// ```rust,ignore
/// use jsonrepo::repository::{AsyncJsonRepository, BoxFuture, RepositoryResult};
///
/// struct ConsulKv { client: ConsulClient }
///
/// impl AsyncJsonRepository for ConsulKv {
///     fn get_by_key<'a>(&'a self, key: &'a str) -> BoxFuture<'a, RepositoryResult> {
///         Box::pin(async move { self.client.get_raw(key).await })
///     }
/// }
/// ```
#[cfg(feature = "async")]
pub trait AsyncJsonRepository: Send + Sync {
    /// Fetches the document stored under `key`.
    fn get_by_key<'a>(&'a self, key: &'a str) -> BoxFuture<'a, RepositoryResult>;
}

// ============================================================================
// Tests
// ============================================================================
