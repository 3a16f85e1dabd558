//! Provider backed by a flattened JSON repository document.

use std::sync::Arc;

use crate::error::{Error, LoadErrorContext};
use crate::flatten::flatten;
use crate::mapping::FlatMapping;
use crate::repository::RepositoryError;
use crate::source::RepositorySource;

use super::{
    Provider, ProviderError, ProviderResult, ProviderSource, ProviderValue, PublishedMapping,
};

/// What a successful [`load`](JsonRepositoryProvider::load) or
/// [`reload`](JsonRepositoryProvider::reload) did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoadOutcome {
    /// A new mapping was published.
    Loaded {
        /// Number of entries in the new mapping.
        entries: usize,
        /// Epoch of the published mapping.
        epoch: u64,
    },

    /// An error occurred and the load error hook ignored it. The previous
    /// mapping is still published.
    Ignored,
}

/// One fetch attempt, with the reason it came back empty.
struct Fetched {
    text: String,
    cause: Option<RepositoryError>,
    repository_missing: bool,
}

/// Serves the flattened contents of one repository document.
///
/// The provider starts with an empty mapping; call [`load`](Self::load) once
/// before serving lookups. Watches and the reload service call
/// [`reload`](Self::reload) whenever the document changes.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use jsonrepo::provider::{JsonRepositoryProvider, Provider};
/// use jsonrepo::repository::InMemoryRepository;
/// use jsonrepo::source::RepositorySource;
///
/// let repo = Arc::new(InMemoryRepository::new().with("app", r#"{"Db": {"Host": "db1"}}"#));
/// let provider = JsonRepositoryProvider::new(RepositorySource::new("app").repository(repo));
///
/// provider.load().unwrap();
/// assert_eq!(provider.get("db:host").unwrap().unwrap().value, "db1");
/// ```
pub struct JsonRepositoryProvider {
    source: RepositorySource,
    data: PublishedMapping,
}

impl JsonRepositoryProvider {
    /// Creates a provider for `source`. Nothing is fetched yet.
    #[must_use]
    pub fn new(source: RepositorySource) -> Self {
        Self {
            source,
            data: PublishedMapping::default(),
        }
    }

    /// The source this provider serves.
    #[must_use]
    pub const fn source(&self) -> &RepositorySource {
        &self.source
    }

    /// The currently published mapping.
    #[must_use]
    pub fn snapshot(&self) -> Arc<FlatMapping> {
        self.data.get()
    }

    /// Number of mappings published so far.
    #[must_use]
    pub fn epoch(&self) -> u64 {
        self.data.epoch()
    }

    /// Performs the initial load.
    ///
    /// An empty document is an error unless the source is optional.
    ///
    /// # Errors
    ///
    /// - [`Error::FetchUnavailable`] if a required document is empty or
    ///   could not be fetched
    /// - [`Error::Format`] if the document cannot be flattened
    ///
    /// Either error is first offered to the source's load error hook.
    pub fn load(&self) -> Result<LoadOutcome, Error> {
        self.load_or_reload(false)
    }

    /// Re-fetches the document and replaces the published mapping.
    ///
    /// An empty document publishes an empty mapping. On error the previous
    /// mapping stays published.
    ///
    /// # Errors
    ///
    /// [`Error::Format`] if the new document cannot be flattened, unless the
    /// load error hook ignores it.
    pub fn reload(&self) -> Result<LoadOutcome, Error> {
        self.load_or_reload(true)
    }

    /// Fetches the raw document text. Any fetch failure is logged and
    /// reported as empty text.
    #[must_use]
    pub fn fetch_text(&self) -> String {
        self.fetch().text
    }

    fn fetch(&self) -> Fetched {
        let key = self.source.key();

        let Some(repository) = self.source.repository_ref() else {
            tracing::debug!(key, "no repository configured");
            return Fetched {
                text: String::new(),
                cause: None,
                repository_missing: true,
            };
        };

        match repository.get_by_key(key) {
            Ok(text) => Fetched {
                text,
                cause: None,
                repository_missing: false,
            },

            Err(e) => {
                tracing::debug!(key, error = %e, "failed to fetch JSON document");
                Fetched {
                    text: String::new(),
                    cause: Some(e),
                    repository_missing: false,
                }
            }
        }
    }

    fn load_or_reload(&self, reload: bool) -> Result<LoadOutcome, Error> {
        let key = self.source.key();
        let fetched = self.fetch();

        let mapping = if fetched.text.trim().is_empty() {
            if self.source.is_optional() || reload {
                Ok(FlatMapping::new())
            } else {
                Err(Error::fetch_unavailable(
                    key,
                    fetched.repository_missing,
                    fetched.cause,
                ))
            }
        } else {
            flatten(&fetched.text).map_err(|e| Error::format(key, e))
        };

        match mapping {
            Ok(mapping) => {
                let entries = mapping.len();
                let epoch = self.data.replace(mapping);
                tracing::debug!(key, entries, epoch, reload, "published JSON document");

                Ok(LoadOutcome::Loaded { entries, epoch })
            }

            Err(error) => self.handle_error(error, reload),
        }
    }

    fn handle_error(&self, error: Error, reload: bool) -> Result<LoadOutcome, Error> {
        let Some(hook) = self.source.load_error_hook() else {
            return Err(error);
        };

        let mut context = LoadErrorContext::new(self.source.key(), &error, reload);
        hook(&mut context);

        if context.is_ignored() {
            tracing::info!(key = self.source.key(), error = %error, reload, "load error ignored");
            return Ok(LoadOutcome::Ignored);
        }

        Err(error)
    }
}

impl Provider for JsonRepositoryProvider {
    fn name(&self) -> &'static str {
        "json-repository"
    }

    fn get(&self, key: &str) -> ProviderResult<ProviderValue> {
        Ok(self.data.read(|mapping| {
            mapping
                .value(key)
                .map(|value| ProviderValue::new(value, ProviderSource::repository(self.source.key())))
        }))
    }

    fn contains(&self, key: &str) -> Result<bool, ProviderError> {
        Ok(self.data.read(|mapping| mapping.contains_key(key)))
    }

    fn priority(&self) -> u32 {
        self.source.priority()
    }
}

impl std::fmt::Debug for JsonRepositoryProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonRepositoryProvider")
            .field("source", &self.source)
            .field("data", &self.data)
            .finish()
    }
}
