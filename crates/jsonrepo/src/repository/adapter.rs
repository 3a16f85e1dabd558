//! Blocking adapter for async repositories.

use super::{AsyncJsonRepository, JsonRepository, RepositoryResult};

/// Adapter that wraps an [`AsyncJsonRepository`] to implement the sync
/// [`JsonRepository`].
///
/// This uses a tokio runtime handle to block on async fetches. It must not
/// be called from inside an async task; the reload scheduler and
/// [`ReloadService`](crate::watch::ReloadService) only call repositories from
/// dedicated threads or `spawn_blocking`.
///
/// # Example
///
/// ```rust,ignore
/// use jsonrepo::repository::BlockingAdapter;
/// use tokio::runtime::Handle;
///
/// let repository = BlockingAdapter::new(ConsulKv::new(), Handle::current());
/// ```
pub struct BlockingAdapter<R: AsyncJsonRepository> {
    repository: R,
    runtime: tokio::runtime::Handle,
}

impl<R: AsyncJsonRepository> BlockingAdapter<R> {
    /// Creates a new blocking adapter.
    pub const fn new(repository: R, runtime: tokio::runtime::Handle) -> Self {
        Self {
            repository,
            runtime,
        }
    }

    /// Creates a blocking adapter using the current runtime.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a tokio runtime context.
    pub fn from_current(repository: R) -> Self {
        Self {
            repository,
            runtime: tokio::runtime::Handle::current(),
        }
    }
}

impl<R: AsyncJsonRepository> JsonRepository for BlockingAdapter<R> {
    fn get_by_key(&self, key: &str) -> RepositoryResult {
        self.runtime.block_on(self.repository.get_by_key(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::{BoxFuture, RepositoryError};

    struct Echo;

    impl AsyncJsonRepository for Echo {
        fn get_by_key<'a>(&'a self, key: &'a str) -> BoxFuture<'a, RepositoryResult> {
            Box::pin(async move {
                if key.is_empty() {
                    Err(RepositoryError::not_found(key))
                } else {
                    Ok(format!(r#"{{"key":"{key}"}}"#))
                }
            })
        }
    }

    #[test]
    fn test_blocking_adapter_fetches() {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap();
        let adapter = BlockingAdapter::new(Echo, runtime.handle().clone());

        assert_eq!(adapter.get_by_key("app").unwrap(), r#"{"key":"app"}"#);
        assert!(adapter.get_by_key("").is_err());
    }
}
