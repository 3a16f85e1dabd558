//! Local directory repository.

use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use super::{JsonRepository, RepositoryError, RepositoryResult};

/// Repository that reads documents from `<root>/<key>.json`.
///
/// Keys may contain `/` to address subdirectories, but never `..` or an
/// absolute path, so a key cannot escape the root.
///
/// # Example
///
/// ```rust,ignore
/// use jsonrepo::repository::FileRepository;
///
/// // Reads /etc/myapp/settings/payments.json
/// let repo = FileRepository::new("/etc/myapp/settings");
/// let text = repo.get_by_key("payments")?;
/// ```
#[derive(Debug, Clone)]
pub struct FileRepository {
    root: PathBuf,
    extension: String,
}

impl FileRepository {
    /// Creates a repository rooted at `root` reading `.json` files.
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            extension: "json".to_owned(),
        }
    }

    /// Uses a different file extension (without the dot), e.g. `jsonc`.
    #[must_use]
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    /// The directory documents are read from.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolves the file path for `key`, or `None` if the key would leave
    /// the root directory.
    #[must_use]
    pub fn path_for(&self, key: &str) -> Option<PathBuf> {
        let relative = Path::new(key);
        let stays_inside = !key.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));

        // Dotted keys such as `app.v2` keep their full name.
        stays_inside.then(|| {
            let mut path = self.root.join(relative).into_os_string();
            path.push(".");
            path.push(&self.extension);
            PathBuf::from(path)
        })
    }
}

impl JsonRepository for FileRepository {
    fn get_by_key(&self, key: &str) -> RepositoryResult {
        let Some(path) = self.path_for(key) else {
            return Err(RepositoryError::unavailable(
                key,
                "key must be a relative path inside the repository root",
            ));
        };

        match std::fs::read_to_string(&path) {
            Ok(text) => Ok(text),

            Err(e) if e.kind() == ErrorKind::NotFound => Err(RepositoryError::not_found(key)),

            Err(source) => Err(RepositoryError::Io { path, source }),
        }
    }
}
