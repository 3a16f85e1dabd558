//! Source configuration for a JSON repository document.
//!
//! A [`RepositorySource`] names one document in a repository and describes
//! how the provider treats it: whether it may be missing, whether it is
//! polled for changes and how often, and how load errors are handled.
//!
//! Sources can be built in code or described in a config file via
//! [`SourceSettings`] and paired with a repository at runtime:
//!
//! ```rust
//! use jsonrepo::source::{RepositorySource, SourceSettings};
//! use std::time::Duration;
//!
//! let settings: SourceSettings = serde_json::from_str(
//!     r#"{"key": "payments", "reload_on_change": true, "change_check_interval_secs": 5}"#,
//! ).unwrap();
//!
//! let source = RepositorySource::from_settings(settings);
//! assert_eq!(source.key(), "payments");
//! assert_eq!(source.interval(), Duration::from_secs(5));
//! ```

use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{LoadErrorContext, LoadErrorHook};
use crate::provider::priority;
use crate::repository::JsonRepository;

/// Default number of seconds between change checks.
pub const DEFAULT_CHANGE_CHECK_INTERVAL_SECS: u64 = 60;

/// Describes one JSON document loaded from a repository.
///
/// Immutable once handed to a
/// [`JsonRepositoryProvider`](crate::provider::JsonRepositoryProvider).
#[derive(Clone)]
pub struct RepositorySource {
    key: String,
    repository: Option<Arc<dyn JsonRepository>>,
    optional: bool,
    reload_on_change: bool,
    change_check_interval: Duration,
    on_load_error: Option<LoadErrorHook>,
    priority: u32,
}

impl RepositorySource {
    /// Creates a required, non-reloading source for `key`.
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            repository: None,
            optional: false,
            reload_on_change: false,
            change_check_interval: Duration::from_secs(DEFAULT_CHANGE_CHECK_INTERVAL_SECS),
            on_load_error: None,
            priority: priority::REPOSITORY,
        }
    }

    /// Builds a source from deserialized settings. The repository still has
    /// to be attached with [`repository`](Self::repository).
    #[must_use]
    pub fn from_settings(settings: SourceSettings) -> Self {
        Self::new(settings.key)
            .optional(settings.optional)
            .reload_on_change(settings.reload_on_change)
            .change_check_interval(Duration::from_secs(settings.change_check_interval_secs))
    }

    /// Sets the repository the document is fetched from.
    #[must_use]
    pub fn repository(mut self, repository: Arc<dyn JsonRepository>) -> Self {
        self.repository = Some(repository);
        self
    }

    /// Marks the document as optional: an empty fetch yields empty data
    /// instead of an error.
    #[must_use]
    pub const fn optional(mut self, optional: bool) -> Self {
        self.optional = optional;
        self
    }

    /// Enables polling the repository for changes.
    #[must_use]
    pub const fn reload_on_change(mut self, enabled: bool) -> Self {
        self.reload_on_change = enabled;
        self
    }

    /// Sets how long to wait between change checks.
    #[must_use]
    pub const fn change_check_interval(mut self, interval: Duration) -> Self {
        self.change_check_interval = interval;
        self
    }

    /// Registers the hook every load error passes through.
    #[must_use]
    pub fn on_load_error<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut LoadErrorContext<'_>) + Send + Sync + 'static,
    {
        self.on_load_error = Some(Arc::new(hook));
        self
    }

    /// Sets the provider priority used by [`ConfigLoader`](crate::loader::ConfigLoader).
    #[must_use]
    pub const fn with_priority(mut self, priority: u32) -> Self {
        self.priority = priority;
        self
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    /// The document key.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The configured repository, if any.
    #[must_use]
    pub fn repository_ref(&self) -> Option<&Arc<dyn JsonRepository>> {
        self.repository.as_ref()
    }

    /// Whether an empty fetch is acceptable on the initial load.
    #[must_use]
    pub const fn is_optional(&self) -> bool {
        self.optional
    }

    /// Whether the repository is polled for changes.
    #[must_use]
    pub const fn is_reload_on_change(&self) -> bool {
        self.reload_on_change
    }

    /// Time between change checks.
    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.change_check_interval
    }

    /// The provider priority.
    #[must_use]
    pub const fn priority(&self) -> u32 {
        self.priority
    }

    pub(crate) fn load_error_hook(&self) -> Option<&LoadErrorHook> {
        self.on_load_error.as_ref()
    }
}

impl Debug for RepositorySource {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("RepositorySource")
            .field("key", &self.key)
            .field("has_repository", &self.repository.is_some())
            .field("optional", &self.optional)
            .field("reload_on_change", &self.reload_on_change)
            .field("change_check_interval", &self.change_check_interval)
            .field("has_load_error_hook", &self.on_load_error.is_some())
            .field("priority", &self.priority)
            .finish()
    }
}

/// Serializable description of a [`RepositorySource`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceSettings {
    /// Document key.
    pub key: String,

    /// See [`RepositorySource::optional`].
    #[serde(default)]
    pub optional: bool,

    /// See [`RepositorySource::reload_on_change`].
    #[serde(default)]
    pub reload_on_change: bool,

    /// Seconds between change checks.
    #[serde(default = "default_interval_secs")]
    pub change_check_interval_secs: u64,
}

const fn default_interval_secs() -> u64 {
    DEFAULT_CHANGE_CHECK_INTERVAL_SECS
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::InMemoryRepository;

    #[test]
    fn test_defaults() {
        let source = RepositorySource::new("app");

        assert_eq!(source.key(), "app");
        assert!(!source.is_optional());
        assert!(!source.is_reload_on_change());
        assert_eq!(source.interval(), Duration::from_secs(60));
        assert!(source.repository_ref().is_none());
        assert!(source.load_error_hook().is_none());
        assert_eq!(source.priority(), priority::REPOSITORY);
    }

    #[test]
    fn test_fluent_api() {
        let source = RepositorySource::new("app")
            .repository(Arc::new(InMemoryRepository::new()))
            .optional(true)
            .reload_on_change(true)
            .change_check_interval(Duration::from_millis(250))
            .on_load_error(|ctx| ctx.ignore())
            .with_priority(5);

        assert!(source.repository_ref().is_some());
        assert!(source.is_optional());
        assert!(source.is_reload_on_change());
        assert_eq!(source.interval(), Duration::from_millis(250));
        assert!(source.load_error_hook().is_some());
        assert_eq!(source.priority(), 5);
    }

    #[test]
    fn test_settings_defaults() {
        let settings: SourceSettings = serde_json::from_str(r#"{"key": "app"}"#).unwrap();

        assert_eq!(
            settings,
            SourceSettings {
                key: "app".into(),
                optional: false,
                reload_on_change: false,
                change_check_interval_secs: 60,
            }
        );
    }

    #[test]
    fn test_settings_reject_unknown_fields() {
        let result: Result<SourceSettings, _> =
            serde_json::from_str(r#"{"key": "app", "reload": true}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_debug_hides_callables() {
        let source = RepositorySource::new("app").on_load_error(|_| {});
        let debug = format!("{source:?}");

        assert!(debug.contains("has_load_error_hook: true"));
        assert!(debug.contains("has_repository: false"));
    }
}
