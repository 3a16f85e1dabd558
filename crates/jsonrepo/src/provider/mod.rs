//! Layered lookups over flattened configuration.
//!
//! Every [`Provider`] serves flat `Section:Key` paths. A
//! [`JsonRepositoryProvider`] serves one repository document; other layers
//! such as command-line overrides or a secret store can join the same
//! [`ConfigLoader`](crate::loader::ConfigLoader) chain by implementing the
//! trait. Providers should compare keys case-insensitively, as the built-in
//! one does.
//!
//! # Custom Providers
//!
//! ```rust,ignore
//! use jsonrepo::provider::{Provider, ProviderResult, ProviderSource, ProviderValue, priority};
//!
//! struct Overrides(Vec<(String, String)>);
//!
//! impl Provider for Overrides {
//!     fn name(&self) -> &str { "overrides" }
//!
//!     fn get(&self, key: &str) -> ProviderResult<ProviderValue> {
//!         Ok(self.0.iter().find(|(k, _)| k.eq_ignore_ascii_case(key)).map(|(_, v)| {
//!             ProviderValue::new(v.clone(), ProviderSource::custom("overrides", None))
//!         }))
//!     }
//!
//!     fn priority(&self) -> u32 { priority::OVERRIDE }
//! }
//! ```

mod container;
mod json;

pub use container::PublishedMapping;
pub use json::{JsonRepositoryProvider, LoadOutcome};

use std::collections::HashMap;
use std::error::Error as StdError;
use std::fmt::{self, Display, Formatter};
use std::sync::Arc;

use miette::Diagnostic;
use thiserror::Error as ThisError;

// ============================================================================
// Priorities
// ============================================================================

/// Query order of providers in a [`ConfigLoader`](crate::loader::ConfigLoader).
///
/// The smallest number is asked first.
///
/// ```text
/// OVERRIDE (10) → REPOSITORY (50) → CUSTOM (100) → FALLBACK (1000)
/// ```
pub mod priority {
    /// Values that must beat every document, e.g. command-line flags.
    pub const OVERRIDE: u32 = 10;

    /// Default for repository documents.
    pub const REPOSITORY: u32 = 50;

    /// Default for providers that do not override [`Provider::priority`](super::Provider::priority).
    pub const CUSTOM: u32 = 100;

    /// Built-in defaults, asked last.
    pub const FALLBACK: u32 = 1000;
}

// ============================================================================
// Values
// ============================================================================

/// A value found by a provider, with its origin.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProviderValue {
    /// The flattened value text.
    pub value: String,

    /// The layer that supplied it.
    pub source: ProviderSource,
}

impl ProviderValue {
    /// Pairs a value with its origin.
    #[must_use]
    pub fn new(value: impl Into<String>, source: ProviderSource) -> Self {
        Self {
            value: value.into(),
            source,
        }
    }
}

/// Origin of a [`ProviderValue`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProviderSource {
    /// A flattened repository document.
    Repository {
        /// The document key.
        key: String,
    },

    /// Any other provider.
    Custom {
        /// Name of the provider.
        provider: String,

        /// Where inside the provider the value lives, if meaningful.
        path: Option<String>,
    },
}

impl ProviderSource {
    /// Origin for values of the repository document `key`.
    #[must_use]
    pub fn repository(key: impl Into<String>) -> Self {
        Self::Repository { key: key.into() }
    }

    /// Origin for values of a custom provider.
    #[must_use]
    pub fn custom(provider: impl Into<String>, path: Option<String>) -> Self {
        Self::Custom {
            provider: provider.into(),
            path,
        }
    }
}

impl Display for ProviderSource {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Repository { key } => write!(f, "JSON repository ({key})"),

            Self::Custom { provider, path } => match path {
                Some(path) => write!(f, "{provider} ({path})"),
                None => f.write_str(provider),
            },
        }
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Failures of a single provider lookup.
#[derive(Debug, ThisError, Diagnostic)]
#[non_exhaustive]
pub enum ProviderError {
    /// The provider's backing store could not answer.
    #[error("provider '{provider}' is unavailable: {message}")]
    #[diagnostic(
        code(jsonrepo::provider::unavailable),
        help("lookups fall through to lower-priority providers until it recovers")
    )]
    Unavailable {
        /// Name of the failing provider.
        provider: String,
        /// What went wrong.
        message: String,
        /// Underlying failure.
        #[source]
        source: Option<Box<dyn StdError + Send + Sync>>,
    },

    /// A value exists but is not of the requested type.
    #[error("invalid value for '{key}' from {source_name}: {message}")]
    #[diagnostic(
        code(jsonrepo::provider::invalid_value),
        help("values are flattened JSON text; check the document the value came from")
    )]
    InvalidValue {
        /// The requested path.
        key: String,
        /// Display form of the value's [`ProviderSource`].
        source_name: String,
        /// Parse failure.
        message: String,
    },
}

impl ProviderError {
    /// A provider that cannot reach its store.
    pub fn unavailable(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Unavailable {
            provider: provider.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Like [`unavailable`](Self::unavailable), keeping the underlying error.
    pub fn unavailable_with_source(
        provider: impl Into<String>,
        message: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self::Unavailable {
            provider: provider.into(),
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub(crate) fn invalid_value(
        key: impl Into<String>,
        source: &ProviderSource,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidValue {
            key: key.into(),
            source_name: source.to_string(),
            message: message.into(),
        }
    }
}

/// `Ok(None)` means the provider has no value for the key (or only an absent
/// one) and the next provider should be asked.
pub type ProviderResult<T> = Result<Option<T>, ProviderError>;

// ============================================================================
// Provider Trait
// ============================================================================

/// One layer of a configuration lookup.
pub trait Provider: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Looks up a flattened path.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider could not answer. The loader records
    /// it and asks the next provider.
    fn get(&self, key: &str) -> ProviderResult<ProviderValue>;

    /// `true` if the provider has an entry at `key`, including an entry
    /// whose value is absent. Defaults to [`get`](Self::get) finding a value.
    ///
    /// # Errors
    ///
    /// Same as [`get`](Self::get).
    fn contains(&self, key: &str) -> Result<bool, ProviderError> {
        Ok(self.get(key)?.is_some())
    }

    /// Looks up several paths at once, keyed by the requested path.
    fn get_many(&self, keys: &[&str]) -> HashMap<String, ProviderResult<ProviderValue>> {
        let mut results = HashMap::with_capacity(keys.len());
        for &key in keys {
            results.insert(key.to_owned(), self.get(key));
        }
        results
    }

    /// Query order; see [`priority`]. Defaults to [`priority::CUSTOM`].
    fn priority(&self) -> u32 {
        priority::CUSTOM
    }
}

/// Lets a provider shared with a watch sit in a loader.
impl<P: Provider + ?Sized> Provider for Arc<P> {
    fn name(&self) -> &str {
        P::name(self)
    }

    fn get(&self, key: &str) -> ProviderResult<ProviderValue> {
        P::get(self, key)
    }

    fn contains(&self, key: &str) -> Result<bool, ProviderError> {
        P::contains(self, key)
    }

    fn get_many(&self, keys: &[&str]) -> HashMap<String, ProviderResult<ProviderValue>> {
        P::get_many(self, keys)
    }

    fn priority(&self) -> u32 {
        P::priority(self)
    }
}
