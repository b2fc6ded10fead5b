//! Template configuration handling.
//! Loads the variable schema (`cookiecutter.json`) from the root of a template
//! repository, checks its shape and splits reserved keys from user variables.

use crate::error::{Error, Result};
use indexmap::IndexMap;
use log::debug;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Name of the schema file expected at the root of every template.
pub const CONFIG_FILE: &str = "cookiecutter.json";

/// Reserved key listing the rendering extensions a template needs.
pub const EXTENSIONS_KEY: &str = "_extensions";

/// Reserved key listing glob patterns of files copied without rendering.
pub const COPY_WITHOUT_RENDER_KEY: &str = "_copy_without_render";

/// Locator abbreviations shipped with a template. Never prompted for.
pub const ABBREVIATIONS_KEY: &str = "abbreviations";

const SHAPE_SCHEMA: &str = r##"{
    "type": "object",
    "properties": {
        "_extensions": { "type": "array", "items": { "type": "string" } },
        "_copy_without_render": { "type": "array", "items": { "type": "string" } },
        "abbreviations": { "type": "object", "additionalProperties": { "type": "string" } }
    },
    "additionalProperties": { "$ref": "#/definitions/value" },
    "definitions": {
        "scalar": { "type": ["string", "number", "boolean", "null"] },
        "value": {
            "anyOf": [
                { "$ref": "#/definitions/scalar" },
                { "type": "array", "minItems": 1, "items": { "$ref": "#/definitions/scalar" } },
                { "type": "object", "additionalProperties": { "$ref": "#/definitions/value" } }
            ]
        }
    }
}"##;

/// A single declared template variable.
#[derive(Debug, Clone, PartialEq)]
pub enum Variable {
    /// Free text with a default value (which may itself be a template).
    Scalar(String),
    /// A list of options; the first one is the default.
    Choice(Vec<String>),
    /// A group of variables prompted one by one and stored as a mapping.
    Nested(IndexMap<String, Variable>),
}

impl Variable {
    /// Converts a raw schema value. Numbers and booleans keep their textual form.
    pub fn from_json(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Array(items) => {
                Variable::Choice(items.iter().map(scalar_text).collect())
            }
            serde_json::Value::Object(map) => Variable::Nested(
                map.iter().map(|(k, v)| (k.clone(), Variable::from_json(v))).collect(),
            ),
            other => Variable::Scalar(scalar_text(other)),
        }
    }
}

fn scalar_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Keys the engine itself consumes, kept apart from user variables.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Reserved {
    #[serde(rename = "_extensions", default, skip_serializing_if = "Vec::is_empty")]
    pub extensions: Vec<String>,
    #[serde(rename = "_copy_without_render", default, skip_serializing_if = "Vec::is_empty")]
    pub copy_without_render: Vec<String>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub abbreviations: IndexMap<String, String>,
}

/// The parsed schema of a template.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TemplateConfig {
    /// Variables in declaration order, which is also the prompting order.
    pub variables: IndexMap<String, Variable>,
    pub reserved: Reserved,
}

/// Private variables start with an underscore; they are rendered but never prompted.
pub fn is_private(key: &str) -> bool {
    key.starts_with('_')
}

/// Loads and parses the schema file of the template at `template_dir`.
///
/// # Errors
/// * `Error::ConfigDoesNotExistError` if the template has no schema file
/// * `Error::ContextDecodingError` if the file is not JSON or has the wrong shape
pub fn get_config<P: AsRef<Path>>(template_dir: P) -> Result<TemplateConfig> {
    let config_path = template_dir.as_ref().join(CONFIG_FILE);
    if !config_path.is_file() {
        return Err(Error::ConfigDoesNotExistError {
            path: config_path.display().to_string(),
        });
    }
    debug!("Loading template configuration from {}", config_path.display());
    let content = std::fs::read_to_string(&config_path)?;
    parse_config(&content, &config_path)
}

/// Parses schema content. `path` is only used in error messages.
pub fn parse_config(content: &str, path: &Path) -> Result<TemplateConfig> {
    let decoding_error = |message: String| Error::ContextDecodingError {
        path: path.display().to_string(),
        message,
    };

    let raw: serde_json::Value =
        serde_json::from_str(content).map_err(|e| decoding_error(e.to_string()))?;
    validate_shape(&raw).map_err(decoding_error)?;

    let serde_json::Value::Object(entries) = raw else {
        return Err(decoding_error("expected a JSON object".to_string()));
    };

    let mut config = TemplateConfig::default();
    for (key, value) in entries {
        match key.as_str() {
            EXTENSIONS_KEY => {
                config.reserved.extensions = serde_json::from_value(value)?;
            }
            COPY_WITHOUT_RENDER_KEY => {
                config.reserved.copy_without_render = serde_json::from_value(value)?;
            }
            ABBREVIATIONS_KEY => {
                config.reserved.abbreviations = serde_json::from_value(value)?;
            }
            _ => {
                config.variables.insert(key, Variable::from_json(&value));
            }
        }
    }
    Ok(config)
}

fn validate_shape(value: &serde_json::Value) -> std::result::Result<(), String> {
    let schema: serde_json::Value =
        serde_json::from_str(SHAPE_SCHEMA).map_err(|e| e.to_string())?;
    let validator = jsonschema::validator_for(&schema).map_err(|e| e.to_string())?;
    let errors: Vec<String> = validator.iter_errors(value).map(|e| e.to_string()).collect();
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors.join("; "))
    }
}
