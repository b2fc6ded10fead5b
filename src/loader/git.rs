use crate::error::Result;
use crate::loader::interface::TemplateLoader;
use crate::loader::{prepare_clone_dir, repo_name};
use crate::prompt::Prompter;
use log::debug;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use url::Url;

/// `user@host:path` style SSH locators.
static SCP_LIKE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(git\+)?[\w.-]+@[\w.-]+:").unwrap());

/// Loader for templates from git repositories.
pub struct GitLoader<'a, S: AsRef<str>> {
    prompt: &'a dyn Prompter,
    repo: S,
    checkout: Option<String>,
    clone_to_dir: PathBuf,
    no_input: bool,
}

impl<'a, S: AsRef<str>> GitLoader<'a, S> {
    /// Creates a new GitLoader cloning into a subdirectory of `clone_to_dir`.
    pub fn new(
        prompt: &'a dyn Prompter,
        repo: S,
        checkout: Option<String>,
        clone_to_dir: PathBuf,
        no_input: bool,
    ) -> Self {
        Self { prompt, repo, checkout, clone_to_dir, no_input }
    }

    /// Checks whether `s` looks like a remote repository locator.
    pub fn is_git_url(s: &str) -> bool {
        if let Ok(url) = Url::parse(s) {
            let scheme = url.scheme().trim_start_matches("git+");
            if matches!(scheme, "https" | "http" | "git" | "ssh" | "file") {
                return true;
            }
        }
        SCP_LIKE_RE.is_match(s)
    }

    fn clone_repo(&self, repo_url: &str, clone_path: &Path) -> Result<git2::Repository> {
        let mut callbacks = git2::RemoteCallbacks::new();
        callbacks.credentials(|_url, username_from_url, allowed_types| {
            if allowed_types.contains(git2::CredentialType::SSH_KEY) {
                let key_path = home::home_dir().unwrap_or_default().join(".ssh").join("id_rsa");
                git2::Cred::ssh_key(username_from_url.unwrap_or("git"), None, &key_path, None)
            } else {
                git2::Cred::default()
            }
        });

        let mut fetch_opts = git2::FetchOptions::new();
        fetch_opts.remote_callbacks(callbacks);

        let mut builder = git2::build::RepoBuilder::new();
        builder.fetch_options(fetch_opts);
        Ok(builder.clone(repo_url, clone_path)?)
    }
}

/// Checks out `revision` (a branch, tag or commit) in `repo`.
pub fn checkout(repo: &git2::Repository, revision: &str) -> Result<()> {
    debug!("Checking out '{revision}'");
    let (object, reference) = repo
        .revparse_ext(revision)
        .or_else(|_| repo.revparse_ext(&format!("origin/{revision}")))?;
    repo.checkout_tree(&object, None)?;
    match reference.as_ref().and_then(|r| r.name()) {
        Some(name) if name.starts_with("refs/heads/") => repo.set_head(name)?,
        _ => repo.set_head_detached(object.peel_to_commit()?.id())?,
    }
    Ok(())
}

impl<S: AsRef<str>> TemplateLoader for GitLoader<'_, S> {
    /// Clones the repository into the clone directory and checks out the
    /// requested revision.
    ///
    /// # Errors
    /// * `Error::CloneCancelledError` if an earlier download may not be replaced
    /// * `Error::RepositoryCloneError` if cloning or checkout fails
    fn load(&self) -> Result<PathBuf> {
        let repo = self.repo.as_ref();
        let repo_url = repo.strip_prefix("git+").unwrap_or(repo);
        let clone_path = self.clone_to_dir.join(repo_name(repo_url));
        fs::create_dir_all(&self.clone_to_dir)?;
        prepare_clone_dir(self.prompt, &clone_path, self.no_input)?;

        debug!("Cloning '{}' to {}", repo_url, clone_path.display());
        let repository = self.clone_repo(repo_url, &clone_path)?;
        if let Some(revision) = &self.checkout {
            checkout(&repository, revision)?;
        }
        Ok(clone_path)
    }
}
