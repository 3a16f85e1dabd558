//! Layered configuration lookups.
//!
//! A [`ConfigLoader`] asks its providers in [`priority`](crate::provider::priority)
//! order and returns the first value found. A provider that fails does not
//! fail the lookup: its error is recorded and the next provider is asked.
//!
//! # Example
//!
//! ```rust,ignore
//! use jsonrepo::loader::ConfigLoader;
//! use jsonrepo::source::RepositorySource;
//!
//! let mut config = ConfigLoader::new()
//!     .with_json_repository(RepositorySource::new("defaults").repository(repo.clone()))?
//!     .with_json_repository(
//!         RepositorySource::new("tenant-acme")
//!             .repository(repo)
//!             .optional(true)
//!             .with_priority(priority::OVERRIDE),
//!     )?;
//!
//! let port = config.get_parsed::<u16>("Server:Port")?;
//! ```

use std::any::type_name;
use std::fmt::Display;
use std::str::FromStr;
use std::sync::Arc;

use crate::error::Error;
use crate::provider::{JsonRepositoryProvider, Provider, ProviderError, ProviderValue};
use crate::source::RepositorySource;

/// A chain of providers answering flattened-path lookups.
///
/// Lookups are not cached: a provider shared with a watch shows each reload
/// on the next lookup.
#[derive(Default)]
pub struct ConfigLoader {
    providers: Vec<Box<dyn Provider>>,
    errors: Vec<ProviderError>,
    sorted: bool,
}

impl ConfigLoader {
    /// An empty chain.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a provider. Order is decided by priority, not insertion;
    /// providers with equal priority keep their insertion order.
    #[must_use]
    pub fn with_provider(mut self, provider: Box<dyn Provider>) -> Self {
        self.providers.push(provider);
        self.sorted = false;
        self
    }

    /// Loads `source` once and appends it.
    ///
    /// # Errors
    ///
    /// Returns the load error unless the source's load error hook ignored it.
    pub fn with_json_repository(self, source: RepositorySource) -> Result<Self, Error> {
        let provider = JsonRepositoryProvider::new(source);
        provider.load()?;
        Ok(self.with_provider(Box::new(provider)))
    }

    /// Appends a provider that is also watched or served by the reload
    /// service. It must already be loaded.
    #[must_use]
    pub fn with_shared(self, provider: Arc<JsonRepositoryProvider>) -> Self {
        self.with_provider(Box::new(provider))
    }

    /// Returns the first value any provider has for `key`.
    ///
    /// Provider errors are kept for [`errors`](Self::errors).
    pub fn get(&mut self, key: &str) -> Option<ProviderValue> {
        self.sort();

        let mut found = None;
        for provider in &self.providers {
            match provider.get(key) {
                Ok(None) => continue,

                Ok(value) => {
                    found = value;
                    break;
                }

                Err(e) => {
                    tracing::debug!(provider = provider.name(), key, error = %e, "lookup failed, trying next provider");
                    self.errors.push(e);
                }
            }
        }

        found
    }

    /// `true` if any provider has an entry at `key`, even one whose value is
    /// absent (`null`, `{}` or `[]`), which [`get`](Self::get) reports as
    /// `None`.
    ///
    /// Provider errors are kept for [`errors`](Self::errors).
    pub fn contains(&mut self, key: &str) -> bool {
        self.sort();

        for provider in &self.providers {
            match provider.contains(key) {
                Ok(true) => return true,
                Ok(false) => {}
                Err(e) => {
                    tracing::debug!(provider = provider.name(), key, error = %e, "presence check failed, trying next provider");
                    self.errors.push(e);
                }
            }
        }

        false
    }

    fn sort(&mut self) {
        if !self.sorted {
            self.providers.sort_by_key(|p| p.priority());
            self.sorted = true;
        }
    }

    /// Like [`get`](Self::get), returning only the text.
    pub fn get_str(&mut self, key: &str) -> Option<String> {
        self.get(key).map(|found| found.value)
    }

    /// Looks up `key` and parses its text with [`FromStr`].
    ///
    /// # Errors
    ///
    /// [`ProviderError::InvalidValue`] naming the key, the providing layer
    /// and the target type if parsing fails.
    pub fn get_parsed<T>(&mut self, key: &str) -> Result<Option<T>, ProviderError>
    where
        T: FromStr,
        T::Err: Display,
    {
        let Some(found) = self.get(key) else {
            return Ok(None);
        };

        found.value.parse().map(Some).map_err(|e: T::Err| {
            let message = format!("expected {}: {e}", type_name::<T>());
            ProviderError::invalid_value(key, &found.source, message)
        })
    }

    /// `true` if any lookup recorded a provider error.
    #[must_use]
    pub const fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Provider errors recorded so far.
    #[must_use]
    pub fn errors(&self) -> &[ProviderError] {
        &self.errors
    }

    /// Drains the recorded provider errors.
    pub fn take_errors(&mut self) -> Vec<ProviderError> {
        std::mem::take(&mut self.errors)
    }
}
