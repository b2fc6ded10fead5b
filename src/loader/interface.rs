use crate::error::Result;
use std::path::PathBuf;

/// Trait for loading templates from different sources.
pub trait TemplateLoader {
    /// Makes the template available locally and returns its directory.
    fn load(&self) -> Result<PathBuf>;
}
