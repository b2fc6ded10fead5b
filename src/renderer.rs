//! Template renderer and rendering functionality for Cutter.
//! Builds the strict MiniJinja environment shared by file generation and hooks,
//! and translates engine errors into structured [`Error`] values.
use crate::error::{Error, Result};
use crate::extensions::ExtensionRegistry;
use log::debug;
use minijinja::{Environment, ErrorKind, UndefinedBehavior};

/// Trait for template rendering engines.
pub trait TemplateRenderer {
    /// Renders a template string with the given context.
    fn render(&self, template: &str, context: &serde_json::Value) -> Result<String> {
        self.render_named("<string>", template, context)
    }

    /// Renders `template`, reporting failures against `name` (usually a path).
    fn render_named(
        &self,
        name: &str,
        template: &str,
        context: &serde_json::Value,
    ) -> Result<String>;
}

/// MiniJinja-based template rendering engine.
///
/// Referencing an undefined variable is an error, never an empty string.
pub struct MiniJinjaRenderer {
    /// MiniJinja environment instance
    env: Environment<'static>,
}

impl MiniJinjaRenderer {
    /// Creates a strict renderer without extensions.
    pub fn new() -> Self {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        env.set_keep_trailing_newline(true);
        env.set_unknown_method_callback(minijinja_contrib::pycompat::unknown_method_callback);
        Self { env }
    }

    /// Creates a strict renderer with every named extension installed.
    ///
    /// # Errors
    /// * `Error::UnknownExtensionError` if any name cannot be resolved; nothing
    ///   is rendered in that case.
    pub fn with_extensions<S: AsRef<str>>(
        extensions: &[S],
        registry: &ExtensionRegistry,
    ) -> Result<Self> {
        let mut renderer = Self::new();
        for name in extensions {
            let name = name.as_ref();
            debug!("Loading extension '{name}'");
            registry.resolve(name)?.register(&mut renderer.env);
        }
        Ok(renderer)
    }
}

impl Default for MiniJinjaRenderer {
    fn default() -> Self {
        MiniJinjaRenderer::new()
    }
}

impl TemplateRenderer for MiniJinjaRenderer {
    fn render_named(
        &self,
        name: &str,
        template: &str,
        context: &serde_json::Value,
    ) -> Result<String> {
        self.env
            .render_named_str(name, template, context)
            .map_err(|e| map_render_error(name, e, context))
    }
}

fn map_render_error(name: &str, err: minijinja::Error, context: &serde_json::Value) -> Error {
    let path = err.name().unwrap_or(name).to_string();
    let line = err.line().unwrap_or(0);
    let message = err.detail().map(str::to_string).unwrap_or_else(|| err.kind().to_string());

    match err.kind() {
        ErrorKind::UndefinedError => {
            Error::UndefinedVariableError { path, line, message, context: context.clone() }
        }
        ErrorKind::SyntaxError => Error::TemplateSyntaxError { path, line, message },
        _ => Error::TemplateError { path, message: err.to_string() },
    }
}
