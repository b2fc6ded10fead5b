//! Replay records: the context of the last successful run of each template,
//! stored as JSON so a later run can skip prompting.

use crate::context::Context;
use crate::error::{Error, Result};
use log::debug;
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct ReplayStore {
    dir: PathBuf,
}

impl ReplayStore {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self { dir: dir.into() }
    }

    /// Path of the record for `template_name`.
    pub fn file_path(&self, template_name: &str) -> PathBuf {
        let file_name = if template_name.ends_with(".json") {
            template_name.to_string()
        } else {
            format!("{template_name}.json")
        };
        self.dir.join(file_name)
    }

    /// Writes `context` for `template_name`, creating the replay directory if needed.
    pub fn save(&self, template_name: &str, context: &Context) -> Result<PathBuf> {
        check_template_name(template_name)?;
        fs::create_dir_all(&self.dir)?;
        let path = self.file_path(template_name);
        let content = serde_json::to_string_pretty(&context.to_value())?;
        fs::write(&path, content)?;
        debug!("Saved replay record to {}", path.display());
        Ok(path)
    }

    /// Reads the record for `template_name`.
    ///
    /// # Errors
    /// * `Error::ConfigDoesNotExistError` if no record was saved
    /// * `Error::ContextDecodingError` if the record is malformed
    pub fn load(&self, template_name: &str) -> Result<Context> {
        check_template_name(template_name)?;
        let path = self.file_path(template_name);
        if !path.is_file() {
            return Err(Error::ConfigDoesNotExistError { path: path.display().to_string() });
        }
        debug!("Loading replay record from {}", path.display());
        let content = fs::read_to_string(&path)?;
        let value: serde_json::Value =
            serde_json::from_str(&content).map_err(|e| Error::ContextDecodingError {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;
        Context::from_value(value, &path.display().to_string())
    }
}

fn check_template_name(template_name: &str) -> Result<()> {
    if template_name.is_empty() || template_name.contains(['/', '\\']) {
        return Err(Error::ContextDecodingError {
            path: template_name.to_string(),
            message: "replay records are keyed by a plain template name".to_string(),
        });
    }
    Ok(())
}
