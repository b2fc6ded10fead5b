//! Template locating: abbreviation expansion and loading from the local
//! filesystem, a git remote or a Mercurial remote.

use crate::error::{Error, Result};
use crate::loader::git::GitLoader;
use crate::loader::hg::HgLoader;
use crate::loader::interface::TemplateLoader;
use crate::loader::local::LocalLoader;
use crate::prompt::Prompter;
use crate::user_config::UserConfig;
use indexmap::IndexMap;
use log::debug;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

pub mod git;
pub mod hg;
pub mod interface;
pub mod local;

/// Abbreviations available without any user configuration.
pub const BUILTIN_ABBREVIATIONS: [(&str, &str); 3] = [
    ("gh", "https://github.com/{0}.git"),
    ("gl", "https://gitlab.com/{0}.git"),
    ("bb", "https://bitbucket.org/{0}"),
];

/// Positional placeholders such as `{0}` or `{}`.
static PLACEHOLDER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\{(\d*)\}").unwrap());

/// Represents the source location of a template.
#[derive(Debug)]
pub enum TemplateSource {
    /// Local filesystem template path
    FileSystem(PathBuf),
    /// Git repository URL (HTTPS or SSH)
    Git(String),
    /// Mercurial repository URL
    Hg(String),
}

impl std::fmt::Display for TemplateSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TemplateSource::FileSystem(path) => {
                write!(f, "local path: '{}'", path.display())
            }
            TemplateSource::Git(repo) => write!(f, "git repository: '{repo}'"),
            TemplateSource::Hg(repo) => write!(f, "hg repository: '{repo}'"),
        }
    }
}

impl TemplateSource {
    /// Classifies an already expanded locator.
    pub fn from_string(s: &str) -> Self {
        if HgLoader::<&str>::is_hg_url(s) {
            Self::Hg(s.to_string())
        } else if GitLoader::<&str>::is_git_url(s) {
            Self::Git(s.to_string())
        } else {
            Self::FileSystem(PathBuf::from(s))
        }
    }
}

/// Expands a short locator such as `gh:user/repo` into a full one.
///
/// User abbreviations take precedence over [`BUILTIN_ABBREVIATIONS`]. An exact
/// key match returns the expansion as-is; `prefix:rest` substitutes `rest` for
/// the `{0}` placeholder. Anything else is returned unchanged.
///
/// # Errors
/// * `Error::InvalidAbbreviationError` if the expansion uses a placeholder
///   other than `{0}` / `{}`
pub fn expand_abbreviations(
    template: &str,
    abbreviations: &IndexMap<String, String>,
) -> Result<String> {
    let lookup = |key: &str| -> Option<String> {
        abbreviations.get(key).cloned().or_else(|| {
            BUILTIN_ABBREVIATIONS
                .iter()
                .find(|(prefix, _)| *prefix == key)
                .map(|(_, expansion)| expansion.to_string())
        })
    };

    if let Some(expansion) = lookup(template) {
        return Ok(expansion);
    }

    if let Some((prefix, rest)) = template.split_once(':') {
        if let Some(expansion) = lookup(prefix) {
            let expanded = format_expansion(prefix, &expansion, rest)?;
            debug!("Expanded '{template}' to '{expanded}'");
            return Ok(expanded);
        }
    }

    Ok(template.to_string())
}

fn format_expansion(prefix: &str, expansion: &str, rest: &str) -> Result<String> {
    let invalid = PLACEHOLDER_RE
        .captures_iter(expansion)
        .any(|caps| !matches!(&caps[1], "" | "0"));
    if invalid {
        return Err(Error::InvalidAbbreviationError {
            prefix: prefix.to_string(),
            expansion: expansion.to_string(),
        });
    }
    Ok(PLACEHOLDER_RE.replace_all(expansion, regex::NoExpand(rest)).into_owned())
}

/// Directory name a clone of `repo_url` is stored under.
pub fn repo_name(repo_url: &str) -> String {
    let trimmed = repo_url.trim_end_matches('/');
    let name = trimmed.rsplit(['/', ':']).next().unwrap_or(trimmed);
    name.strip_suffix(".git").or_else(|| name.strip_suffix(".hg")).unwrap_or(name).to_string()
}

/// Clears the way for a fresh clone at `clone_path`.
///
/// A previous download is removed without asking under `no_input`, otherwise
/// only after the user agrees.
///
/// # Errors
/// * `Error::CloneCancelledError` if the user keeps the previous download
pub fn prepare_clone_dir(prompt: &dyn Prompter, clone_path: &Path, no_input: bool) -> Result<()> {
    if !clone_path.exists() {
        return Ok(());
    }
    let question = format!(
        "You've downloaded {} before. Is it okay to delete and re-download it?",
        clone_path.display()
    );
    if no_input || prompt.confirm(&question, true)? {
        debug!("Removing previous download at {}", clone_path.display());
        fs::remove_dir_all(clone_path)?;
        Ok(())
    } else {
        Err(Error::CloneCancelledError { path: clone_path.display().to_string() })
    }
}

/// Resolves `template` to a local directory, cloning it when it is remote.
pub fn load_template(
    prompt: &dyn Prompter,
    template: &str,
    checkout: Option<&str>,
    no_input: bool,
    config: &UserConfig,
) -> Result<PathBuf> {
    let template = expand_abbreviations(template, &config.abbreviations)?;
    let source = TemplateSource::from_string(&template);
    debug!("Using template from the {source}");

    let loader: Box<dyn TemplateLoader + '_> = match source {
        TemplateSource::Git(repo) => Box::new(GitLoader::new(
            prompt,
            repo,
            checkout.map(str::to_string),
            config.cutters_dir.clone(),
            no_input,
        )),
        TemplateSource::Hg(repo) => Box::new(HgLoader::new(
            prompt,
            repo,
            checkout.map(str::to_string),
            config.cutters_dir.clone(),
            no_input,
        )),
        TemplateSource::FileSystem(path) => Box::new(LocalLoader::new(path)),
    };

    loader.load()
}
