use crate::config::CONFIG_FILE;
use crate::error::{Error, Result};
use crate::loader::interface::TemplateLoader;
use log::debug;
use std::path::{Path, PathBuf};

/// Loader for templates from the local filesystem.
pub struct LocalLoader<P: AsRef<Path>> {
    path: P,
}

impl<P: AsRef<Path>> LocalLoader<P> {
    /// Creates a new LocalLoader instance.
    pub fn new(path: P) -> Self {
        Self { path }
    }
}

impl<P: AsRef<Path>> TemplateLoader for LocalLoader<P> {
    /// Checks that the path is a directory holding a template schema.
    ///
    /// # Errors
    /// * `Error::RepositoryNotFoundError` if the directory or its schema is missing
    fn load(&self) -> Result<PathBuf> {
        let path = self.path.as_ref();
        if !path.is_dir() || !path.join(CONFIG_FILE).is_file() {
            return Err(Error::RepositoryNotFoundError { template: path.display().to_string() });
        }
        debug!("Using local template {}", path.display());
        Ok(path.to_path_buf())
    }
}
