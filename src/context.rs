//! Context resolution.
//!
//! The final context is assembled from, in order: the user's global
//! `default_context`, the template schema (which also fixes the prompting
//! order), caller-supplied extra context, and interactive answers. Replay mode
//! replaces the last two steps with a previously saved context.

use crate::config::{
    is_private, Reserved, TemplateConfig, Variable, ABBREVIATIONS_KEY, COPY_WITHOUT_RENDER_KEY,
    EXTENSIONS_KEY,
};
use crate::error::{Error, Result};
use crate::prompt::{parse_choice, Prompter};
use crate::renderer::TemplateRenderer;
use crate::replay::ReplayStore;
use crate::user_config::UserConfig;
use indexmap::IndexMap;
use log::{debug, warn};
use serde_json::Value;

/// Top-level key under which all variables are exposed to templates.
pub const NAMESPACE: &str = "cookiecutter";

/// Resolved variables of one run. Read-only once generation starts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Context {
    pub variables: IndexMap<String, Value>,
    pub reserved: Reserved,
}

impl Context {
    /// The value handed to the template engine: user variables and reserved
    /// keys merged under [`NAMESPACE`].
    pub fn to_value(&self) -> Value {
        let mut merged = serde_json::Map::new();
        for (key, value) in &self.variables {
            merged.insert(key.clone(), value.clone());
        }
        if !self.reserved.extensions.is_empty() {
            merged.insert(EXTENSIONS_KEY.to_string(), self.reserved.extensions.clone().into());
        }
        if !self.reserved.copy_without_render.is_empty() {
            merged.insert(
                COPY_WITHOUT_RENDER_KEY.to_string(),
                self.reserved.copy_without_render.clone().into(),
            );
        }
        if !self.reserved.abbreviations.is_empty() {
            let abbreviations = self
                .reserved
                .abbreviations
                .iter()
                .map(|(prefix, expansion)| (prefix.clone(), Value::String(expansion.clone())))
                .collect();
            merged.insert(ABBREVIATIONS_KEY.to_string(), Value::Object(abbreviations));
        }
        let mut root = serde_json::Map::new();
        root.insert(NAMESPACE.to_string(), Value::Object(merged));
        Value::Object(root)
    }

    /// Scope used for schema defaults: the namespaced value plus each answer
    /// at top level, so a default may say `{{ project_name }}` as well as
    /// `{{ cookiecutter.project_name }}`.
    pub fn to_default_scope(&self) -> Value {
        let mut scope = self.to_value();
        if let Value::Object(root) = &mut scope {
            for (key, value) in &self.variables {
                if key != NAMESPACE {
                    root.insert(key.clone(), value.clone());
                }
            }
        }
        scope
    }

    /// Splits a value produced by [`Context::to_value`] back into a context.
    /// `source` names where the value came from, for error messages.
    pub fn from_value(value: Value, source: &str) -> Result<Self> {
        let decoding_error = |message: &str| Error::ContextDecodingError {
            path: source.to_string(),
            message: message.to_string(),
        };

        let Value::Object(mut root) = value else {
            return Err(decoding_error("expected a JSON object"));
        };
        let Some(Value::Object(entries)) = root.remove(NAMESPACE) else {
            return Err(decoding_error("missing the cookiecutter mapping"));
        };

        let mut context = Context::default();
        for (key, value) in entries {
            match key.as_str() {
                EXTENSIONS_KEY => context.reserved.extensions = serde_json::from_value(value)?,
                COPY_WITHOUT_RENDER_KEY => {
                    context.reserved.copy_without_render = serde_json::from_value(value)?
                }
                ABBREVIATIONS_KEY => {
                    context.reserved.abbreviations = serde_json::from_value(value)?
                }
                _ => {
                    context.variables.insert(key, value);
                }
            }
        }
        Ok(context)
    }
}

/// Rejects mutually exclusive modes before any work is done.
pub fn check_mode(no_input: bool, replay: bool) -> Result<()> {
    if no_input && replay {
        return Err(Error::InvalidModeError);
    }
    Ok(())
}

/// Loads the saved context for `template_name` instead of building one.
pub fn resolve_replay(store: &ReplayStore, template_name: &str, no_input: bool) -> Result<Context> {
    check_mode(no_input, true)?;
    store.load(template_name)
}

/// Builds a context from a template schema.
pub struct ContextBuilder<'a> {
    renderer: &'a dyn TemplateRenderer,
    prompter: &'a dyn Prompter,
    default_context: &'a IndexMap<String, Value>,
}

impl<'a> ContextBuilder<'a> {
    pub fn new(
        renderer: &'a dyn TemplateRenderer,
        prompter: &'a dyn Prompter,
        user_config: &'a UserConfig,
    ) -> Self {
        Self { renderer, prompter, default_context: &user_config.default_context }
    }

    /// Resolves every schema variable, in declaration order.
    ///
    /// Extra context always wins and is used verbatim. Without `no_input`, the
    /// remaining public variables are asked for; otherwise their defaults are
    /// rendered against the answers collected so far.
    pub fn build(
        &self,
        schema: &TemplateConfig,
        extra_context: &IndexMap<String, Value>,
        no_input: bool,
    ) -> Result<Context> {
        let mut context = Context { variables: IndexMap::new(), reserved: schema.reserved.clone() };

        for (key, variable) in &schema.variables {
            let variable = match self.default_context.get(key) {
                Some(default) => overwrite_default(variable, default),
                None => variable.clone(),
            };

            let value = if let Some(value) = extra_context.get(key) {
                debug!("Using extra context for '{key}'");
                self.apply_override(&variable, value, &context)?
            } else if no_input || is_private(key) {
                self.render_variable(&variable, &context)?
            } else {
                self.prompt_variable(key, &variable, &context)?
            };
            context.variables.insert(key.clone(), value);
        }

        for (key, value) in extra_context {
            if !context.variables.contains_key(key) {
                debug!("Adding extra context '{key}' not declared by the template");
                context.variables.insert(key.clone(), value.clone());
            }
        }

        Ok(context)
    }

    fn render_str(&self, template: &str, context: &Context) -> Result<String> {
        self.renderer.render(template, &context.to_default_scope())
    }

    fn render_variable(&self, variable: &Variable, context: &Context) -> Result<Value> {
        match variable {
            Variable::Scalar(default) => Ok(Value::String(self.render_str(default, context)?)),
            Variable::Choice(options) => {
                let first = options.first().map(String::as_str).unwrap_or_default();
                Ok(Value::String(self.render_str(first, context)?))
            }
            Variable::Nested(variables) => {
                let mut map = serde_json::Map::new();
                for (key, variable) in variables {
                    map.insert(key.clone(), self.render_variable(variable, context)?);
                }
                Ok(Value::Object(map))
            }
        }
    }

    fn prompt_variable(&self, name: &str, variable: &Variable, context: &Context) -> Result<Value> {
        match variable {
            Variable::Scalar(default) => {
                let default = self.render_str(default, context)?;
                let answer = self.prompter.read_variable(name, &default)?;
                Ok(Value::String(if answer.is_empty() { default } else { answer }))
            }
            Variable::Choice(options) => {
                let options = options
                    .iter()
                    .map(|option| self.render_str(option, context))
                    .collect::<Result<Vec<_>>>()?;
                if options.len() < 2 {
                    let single = Variable::Scalar(options.into_iter().next().unwrap_or_default());
                    return self.prompt_variable(name, &single, context);
                }
                self.prompt_choice(name, &options).map(Value::String)
            }
            Variable::Nested(variables) => {
                let mut map = serde_json::Map::new();
                for (key, variable) in variables {
                    let value = if is_private(key) {
                        self.render_variable(variable, context)?
                    } else {
                        self.prompt_variable(&format!("{name}.{key}"), variable, context)?
                    };
                    map.insert(key.clone(), value);
                }
                Ok(Value::Object(map))
            }
        }
    }

    fn prompt_choice(&self, name: &str, options: &[String]) -> Result<String> {
        loop {
            let answer = self.prompter.read_choice(name, options)?;
            let answer = if answer.trim().is_empty() { "1" } else { answer.as_str() };
            match parse_choice(answer, options) {
                Some(option) => return Ok(option.clone()),
                None => warn!(
                    "'{}' is not a valid choice for {}, pick 1-{}",
                    answer,
                    name,
                    options.len()
                ),
            }
        }
    }

    fn apply_override(
        &self,
        variable: &Variable,
        value: &Value,
        context: &Context,
    ) -> Result<Value> {
        match (variable, value) {
            (Variable::Nested(variables), Value::Object(overrides)) => {
                let mut map = serde_json::Map::new();
                for (key, variable) in variables {
                    let value = match overrides.get(key) {
                        Some(value) => self.apply_override(variable, value, context)?,
                        None => self.render_variable(variable, context)?,
                    };
                    map.insert(key.clone(), value);
                }
                for (key, value) in overrides {
                    if !map.contains_key(key) {
                        map.insert(key.clone(), value.clone());
                    }
                }
                Ok(Value::Object(map))
            }
            _ => Ok(value.clone()),
        }
    }
}

/// Replaces the default of `variable` with a value from the user's global
/// `default_context`. A matching choice moves to the front of the list.
pub fn overwrite_default(variable: &Variable, value: &Value) -> Variable {
    match (variable, value) {
        (Variable::Choice(options), Value::String(chosen)) => {
            if options.contains(chosen) {
                let mut reordered = vec![chosen.clone()];
                reordered.extend(options.iter().filter(|o| *o != chosen).cloned());
                Variable::Choice(reordered)
            } else {
                variable.clone()
            }
        }
        (Variable::Nested(variables), Value::Object(defaults)) => Variable::Nested(
            variables
                .iter()
                .map(|(key, variable)| {
                    let variable = match defaults.get(key) {
                        Some(default) => overwrite_default(variable, default),
                        None => variable.clone(),
                    };
                    (key.clone(), variable)
                })
                .collect(),
        ),
        (Variable::Scalar(_), Value::String(s)) => Variable::Scalar(s.clone()),
        (Variable::Scalar(_), Value::Number(_) | Value::Bool(_)) => {
            Variable::Scalar(value.to_string())
        }
        _ => variable.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn choice(options: &[&str]) -> Variable {
        Variable::Choice(options.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn test_overwrite_default_moves_choice_to_front() {
        let result = overwrite_default(&choice(&["mit", "bsd", "gpl"]), &json!("gpl"));
        assert_eq!(result, choice(&["gpl", "mit", "bsd"]));
    }

    #[test]
    fn test_overwrite_default_ignores_unknown_choice() {
        let result = overwrite_default(&choice(&["mit", "bsd"]), &json!("apache"));
        assert_eq!(result, choice(&["mit", "bsd"]));
    }

    #[test]
    fn test_overwrite_default_scalar_and_nested() {
        assert_eq!(
            overwrite_default(&Variable::Scalar("x".into()), &json!("y")),
            Variable::Scalar("y".into())
        );
        let nested = Variable::from_json(&json!({"a": "1", "b": ["x", "y"]}));
        let result = overwrite_default(&nested, &json!({"b": "y"}));
        assert_eq!(result, Variable::from_json(&json!({"a": "1", "b": ["y", "x"]})));
    }

    #[test]
    fn test_to_value_merges_reserved_keys() {
        let context = Context {
            variables: IndexMap::from([("name".to_string(), json!("demo"))]),
            reserved: Reserved {
                extensions: vec!["cutter.extensions.SlugifyExtension".to_string()],
                copy_without_render: vec![],
                abbreviations: IndexMap::from([(
                    "gh".to_string(),
                    "https://github.com/{0}.git".to_string(),
                )]),
            },
        };
        assert_eq!(
            context.to_value(),
            json!({"cookiecutter": {
                "name": "demo",
                "_extensions": ["cutter.extensions.SlugifyExtension"],
                "abbreviations": {"gh": "https://github.com/{0}.git"}
            }})
        );
        assert_eq!(Context::from_value(context.to_value(), "test").unwrap(), context);
    }

    #[test]
    fn test_from_value_requires_namespace() {
        let result = Context::from_value(json!({"name": "demo"}), "test");
        assert!(matches!(result, Err(Error::ContextDecodingError { .. })));
    }

    #[test]
    fn test_check_mode() {
        assert!(check_mode(true, false).is_ok());
        assert!(check_mode(false, true).is_ok());
        assert!(matches!(check_mode(true, true), Err(Error::InvalidModeError)));
    }
}
