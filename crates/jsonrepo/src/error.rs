//! Error types for loading JSON repository sources.
//!
//! # Error Variants
//!
//! | Variant | When It Occurs |
//! |---------|----------------|
//! | [`Error::FetchUnavailable`] | A required source produced no document |
//! | [`Error::Format`] | The fetched document could not be flattened |
//!
//! The flattening failures themselves (malformed text, non-object root,
//! duplicate key, unsupported token) live in [`FlattenError`] and are
//! reachable through [`Error::Format`].
//!
//! # Load Error Hook
//!
//! Every error raised by a load or reload passes through the source's
//! optional hook first. The hook receives a [`LoadErrorContext`] and may call
//! [`LoadErrorContext::ignore`], in which case the load returns successfully
//! and the previously published data stays in place.
//!
//! ```rust,ignore
//! let source = RepositorySource::new("payments")
//!     .repository(repo)
//!     .on_load_error(|ctx| {
//!         if ctx.is_reload() {
//!             tracing::warn!(key = ctx.key(), error = %ctx.error(), "keeping previous settings");
//!             ctx.ignore();
//!         }
//!     });
//! ```

use std::sync::Arc;

use miette::Diagnostic;
use thiserror::Error as ThisError;

use crate::flatten::{ErrorKind, FlattenError};
use crate::repository::RepositoryError;

/// Errors raised while loading or reloading a JSON repository source.
///
/// Integrates with [`miette`] for rich terminal diagnostics:
///
/// ```rust,ignore
/// if let Err(e) = provider.load() {
///     eprintln!("{:?}", miette::Report::from(e));
/// }
/// ```
#[derive(Debug, ThisError, Diagnostic)]
#[non_exhaustive]
pub enum Error {
    /// The source is required but no usable document was fetched.
    #[error("failed to get JSON string for the key '{key}' from the repository{}",
        missing_suffix(.repository_missing))]
    #[diagnostic(code(jsonrepo::fetch_unavailable), severity(Error))]
    FetchUnavailable {
        /// The key of the source.
        key: String,

        /// `true` if the source had no repository at all.
        repository_missing: bool,

        /// The repository error that caused the empty fetch, if any.
        #[source]
        cause: Option<RepositoryError>,

        /// Dynamic help message.
        #[help]
        help: String,
    },

    /// The fetched document is not a flattenable JSON object.
    #[error("invalid JSON document for the key '{key}': {source}")]
    #[diagnostic(code(jsonrepo::format_error))]
    Format {
        /// The key of the source.
        key: String,

        /// The flattening failure, with its own diagnostics.
        #[source]
        #[diagnostic_source]
        source: FlattenError,
    },
}

impl Error {
    /// Creates a [`Error::FetchUnavailable`] with a standard help message.
    pub fn fetch_unavailable(
        key: impl Into<String>,
        repository_missing: bool,
        cause: Option<RepositoryError>,
    ) -> Self {
        let key = key.into();
        let help = if repository_missing {
            format!("configure a repository for '{key}' or mark the source optional")
        } else {
            format!("store a JSON document under '{key}' or mark the source optional")
        };

        Self::FetchUnavailable {
            key,
            repository_missing,
            cause,
            help,
        }
    }

    /// Wraps a flattening failure for the source `key`.
    pub fn format(key: impl Into<String>, source: FlattenError) -> Self {
        Self::Format {
            key: key.into(),
            source,
        }
    }

    /// The key of the source that failed.
    #[must_use]
    pub fn key(&self) -> &str {
        match self {
            Self::FetchUnavailable { key, .. } | Self::Format { key, .. } => key,
        }
    }

    /// The flattening error kind, if this is a [`Error::Format`].
    #[must_use]
    pub const fn flatten_kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Format { source, .. } => Some(source.kind()),
            Self::FetchUnavailable { .. } => None,
        }
    }
}

#[allow(clippy::trivially_copy_pass_by_ref)]
const fn missing_suffix(repository_missing: &bool) -> &'static str {
    if *repository_missing {
        "; no repository was configured"
    } else {
        ""
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Load error hook
// ─────────────────────────────────────────────────────────────────────────────

/// Hook invoked with every load or reload error of a source.
pub type LoadErrorHook = Arc<dyn Fn(&mut LoadErrorContext<'_>) + Send + Sync>;

/// Information handed to a source's load error hook.
///
/// The hook runs once per raised error. Calling [`ignore`](Self::ignore)
/// turns the failed load into a no-op that keeps the previous data.
#[derive(Debug)]
pub struct LoadErrorContext<'a> {
    key: &'a str,
    error: &'a Error,
    reload: bool,
    ignore: bool,
}

impl<'a> LoadErrorContext<'a> {
    pub(crate) const fn new(key: &'a str, error: &'a Error, reload: bool) -> Self {
        Self {
            key,
            error,
            reload,
            ignore: false,
        }
    }

    /// The key of the source being loaded.
    #[must_use]
    pub const fn key(&self) -> &str {
        self.key
    }

    /// The error that occurred.
    #[must_use]
    pub const fn error(&self) -> &Error {
        self.error
    }

    /// `true` when the error happened while reloading a changed document.
    #[must_use]
    pub const fn is_reload(&self) -> bool {
        self.reload
    }

    /// Swallows the error for this call.
    pub const fn ignore(&mut self) {
        self.ignore = true;
    }

    /// Whether [`ignore`](Self::ignore) was called.
    #[must_use]
    pub const fn is_ignored(&self) -> bool {
        self.ignore
    }
}
