//! Rendering extensions.
//!
//! Templates list the extensions they need under `_extensions`. Each name is
//! resolved through an [`ExtensionRegistry`] to an [`Extension`] object which
//! installs its filters and functions into the MiniJinja environment.

use crate::error::{Error, Result};
use cruet::Inflector;
use deunicode::deunicode;
use indexmap::IndexMap;
use minijinja::{Environment, Value};
use std::sync::Arc;

/// A plugin that augments the template environment.
pub trait Extension: Send + Sync {
    fn register(&self, env: &mut Environment<'static>);
}

impl<F> Extension for F
where
    F: Fn(&mut Environment<'static>) + Send + Sync,
{
    fn register(&self, env: &mut Environment<'static>) {
        self(env)
    }
}

/// Maps extension names, as written in templates, to extension objects.
#[derive(Clone, Default)]
pub struct ExtensionRegistry {
    extensions: IndexMap<String, Arc<dyn Extension>>,
}

impl ExtensionRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding the bundled extensions.
    ///
    /// Each one is available as `cutter.extensions.<Name>` and, for templates
    /// written for cookiecutter, as `cookiecutter.extensions.<Name>`.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        let builtins: [(&str, Arc<dyn Extension>); 3] = [
            ("JsonifyExtension", Arc::new(JsonifyExtension)),
            ("SlugifyExtension", Arc::new(SlugifyExtension)),
            ("CaseExtension", Arc::new(CaseExtension)),
        ];
        for (name, extension) in builtins {
            for namespace in ["cutter.extensions", "cookiecutter.extensions"] {
                registry
                    .extensions
                    .insert(format!("{namespace}.{name}"), Arc::clone(&extension));
            }
        }
        registry
    }

    /// Registers `extension` under `name`, replacing any previous entry.
    pub fn register<S: Into<String>, E: Extension + 'static>(&mut self, name: S, extension: E) {
        self.extensions.insert(name.into(), Arc::new(extension));
    }

    /// Looks up an extension by name.
    ///
    /// # Errors
    /// * `Error::UnknownExtensionError` if nothing is registered under `name`
    pub fn resolve(&self, name: &str) -> Result<Arc<dyn Extension>> {
        self.extensions.get(name).cloned().ok_or_else(|| Error::UnknownExtensionError {
            name: name.to_string(),
            reason: "no extension is registered under this name".to_string(),
        })
    }
}

/// `jsonify`: dumps any value as indented JSON.
pub struct JsonifyExtension;

impl Extension for JsonifyExtension {
    fn register(&self, env: &mut Environment<'static>) {
        env.add_filter("jsonify", |value: Value| -> std::result::Result<String, minijinja::Error> {
            serde_json::to_string_pretty(&value).map_err(|e| {
                minijinja::Error::new(minijinja::ErrorKind::InvalidOperation, e.to_string())
            })
        });
    }
}

/// `slugify`: transliterates to ASCII and joins words with dashes.
pub struct SlugifyExtension;

impl Extension for SlugifyExtension {
    fn register(&self, env: &mut Environment<'static>) {
        env.add_filter("slugify", |value: String| slugify(&value));
    }
}

pub fn slugify(value: &str) -> String {
    let transliterated = deunicode(value).to_lowercase();
    let mut slug = String::with_capacity(transliterated.len());
    for c in transliterated.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c);
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    slug.trim_end_matches('-').to_string()
}

/// Case conversion filters.
pub struct CaseExtension;

impl Extension for CaseExtension {
    fn register(&self, env: &mut Environment<'static>) {
        env.add_filter("snake_case", |value: String| value.to_snake_case());
        env.add_filter("kebab_case", |value: String| value.to_kebab_case());
        env.add_filter("camel_case", |value: String| value.to_camel_case());
        env.add_filter("pascal_case", |value: String| value.to_pascal_case());
        env.add_filter("title_case", |value: String| value.to_title_case());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render_with(name: &str, template: &str) -> String {
        let registry = ExtensionRegistry::with_builtins();
        let mut env = Environment::new();
        registry.resolve(name).unwrap().register(&mut env);
        env.render_str(template, minijinja::context! { value => "Ünïcode Project Name" })
            .unwrap()
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Hello,  World!"), "hello-world");
        assert_eq!(slugify("  --Leading and trailing--  "), "leading-and-trailing");
        assert_eq!(
            render_with("cutter.extensions.SlugifyExtension", "{{ value|slugify }}"),
            "unicode-project-name"
        );
    }

    #[test]
    fn test_case_filters() {
        let output = render_with(
            "cookiecutter.extensions.CaseExtension",
            "{{ 'my project'|snake_case }} {{ 'my project'|kebab_case }} \
             {{ 'my project'|pascal_case }}",
        );
        assert_eq!(output, "my_project my-project MyProject");
    }

    #[test]
    fn test_jsonify() {
        let registry = ExtensionRegistry::with_builtins();
        let mut env = Environment::new();
        registry.resolve("cutter.extensions.JsonifyExtension").unwrap().register(&mut env);
        let output = env
            .render_str("{{ data|jsonify }}", minijinja::context! { data => vec!["a", "b"] })
            .unwrap();
        assert_eq!(output, "[\n  \"a\",\n  \"b\"\n]");
    }

    #[test]
    fn test_unknown_extension() {
        let registry = ExtensionRegistry::with_builtins();
        assert!(matches!(
            registry.resolve("foobar.extensions.HelloExtension"),
            Err(Error::UnknownExtensionError { .. })
        ));
    }

    #[test]
    fn test_closure_extension() {
        let mut registry = ExtensionRegistry::new();
        registry.register("hello", |env: &mut Environment<'static>| {
            env.add_filter("hello", |name: String| format!("Hello {name}!"));
        });
        let mut env = Environment::new();
        registry.resolve("hello").unwrap().register(&mut env);
        assert_eq!(
            env.render_str("{{ 'Cookiemonster'|hello }}", minijinja::context! {}).unwrap(),
            "Hello Cookiemonster!"
        );
    }
}
