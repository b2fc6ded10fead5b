//! Orchestration of a full generation run.

use crate::config::get_config;
use crate::context::{check_mode, resolve_replay, ContextBuilder};
use crate::error::Result;
use crate::extensions::ExtensionRegistry;
use crate::loader::load_template;
use crate::processor::generate_files;
use crate::prompt::Prompter;
use crate::renderer::MiniJinjaRenderer;
use crate::replay::ReplayStore;
use crate::user_config::UserConfig;
use indexmap::IndexMap;
use log::debug;
use std::path::{Path, PathBuf};

/// Inputs of one run.
#[derive(Debug, Clone)]
pub struct CutterOptions {
    /// Path, URL or abbreviation of the template.
    pub template: String,
    /// Branch, tag or commit to check out after cloning.
    pub checkout: Option<String>,
    pub no_input: bool,
    pub extra_context: IndexMap<String, serde_json::Value>,
    pub replay: bool,
    pub overwrite_if_exists: bool,
    pub output_dir: PathBuf,
    /// Persist the final context once generation succeeds.
    pub save_replay: bool,
}

impl Default for CutterOptions {
    fn default() -> Self {
        Self {
            template: String::new(),
            checkout: None,
            no_input: false,
            extra_context: IndexMap::new(),
            replay: false,
            overwrite_if_exists: false,
            output_dir: PathBuf::from("."),
            save_replay: true,
        }
    }
}

/// Name replay records are keyed by: the base name of the template directory.
pub fn template_name(repo_dir: &Path) -> String {
    let absolute = std::env::current_dir()
        .map(|cwd| cwd.join(repo_dir))
        .unwrap_or_else(|_| repo_dir.to_path_buf());
    absolute
        .components()
        .next_back()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Generates a project and returns the path of its root directory.
///
/// The replay record is only written after generation, including the
/// post-generation hook, has fully succeeded.
pub fn cutter(
    options: &CutterOptions,
    config: &UserConfig,
    prompter: &dyn Prompter,
    registry: &ExtensionRegistry,
) -> Result<PathBuf> {
    check_mode(options.no_input, options.replay)?;

    let repo_dir = load_template(
        prompter,
        &options.template,
        options.checkout.as_deref(),
        options.no_input,
        config,
    )?;
    let name = template_name(&repo_dir);
    let store = ReplayStore::new(&config.replay_dir);

    let (context, renderer) = if options.replay {
        let context = resolve_replay(&store, &name, options.no_input)?;
        let renderer = MiniJinjaRenderer::with_extensions(&context.reserved.extensions, registry)?;
        (context, renderer)
    } else {
        let schema = get_config(&repo_dir)?;
        let renderer = MiniJinjaRenderer::with_extensions(&schema.reserved.extensions, registry)?;
        let context = ContextBuilder::new(&renderer, prompter, config).build(
            &schema,
            &options.extra_context,
            options.no_input,
        )?;
        (context, renderer)
    };
    debug!("Resolved context: {}", context.to_value());

    let project_dir = generate_files(
        &repo_dir,
        &context,
        &renderer,
        &options.output_dir,
        options.overwrite_if_exists,
    )?;

    if options.save_replay && !options.replay {
        store.save(&name, &context)?;
    }
    Ok(project_dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_name() {
        assert_eq!(template_name(Path::new("/templates/fake-repo-pre/")), "fake-repo-pre");
        assert_eq!(template_name(Path::new("/templates/fake-repo-pre")), "fake-repo-pre");
    }
}
