use crate::error::{Error, Result};
use crate::loader::interface::TemplateLoader;
use crate::loader::{prepare_clone_dir, repo_name};
use crate::prompt::Prompter;
use log::debug;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use url::Url;

/// Loader for templates from Mercurial repositories, driven through the `hg`
/// command line client.
pub struct HgLoader<'a, S: AsRef<str>> {
    prompt: &'a dyn Prompter,
    repo: S,
    checkout: Option<String>,
    clone_to_dir: PathBuf,
    no_input: bool,
}

impl<'a, S: AsRef<str>> HgLoader<'a, S> {
    pub fn new(
        prompt: &'a dyn Prompter,
        repo: S,
        checkout: Option<String>,
        clone_to_dir: PathBuf,
        no_input: bool,
    ) -> Self {
        Self { prompt, repo, checkout, clone_to_dir, no_input }
    }

    /// An `hg+` prefixed locator, or a URL whose path ends in `.hg`.
    pub fn is_hg_url(s: &str) -> bool {
        if s.starts_with("hg+") {
            return true;
        }
        Url::parse(s)
            .map(|url| url.scheme() != "file" && url.path().trim_end_matches('/').ends_with(".hg"))
            .unwrap_or(false)
    }
}

fn run_hg<I, A>(args: I, cwd: &Path) -> Result<()>
where
    I: IntoIterator<Item = A>,
    A: AsRef<OsStr>,
{
    let args: Vec<A> = args.into_iter().collect();
    let command = std::iter::once("hg".to_string())
        .chain(args.iter().map(|a| a.as_ref().to_string_lossy().into_owned()))
        .collect::<Vec<_>>()
        .join(" ");
    debug!("Running '{command}'");

    let output = Command::new("hg").args(&args).current_dir(cwd).output().map_err(|e| {
        Error::VcsCommandError {
            command: command.clone(),
            message: format!("{e}; is Mercurial installed?"),
        }
    })?;
    if !output.status.success() {
        return Err(Error::VcsCommandError {
            command,
            message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(())
}

impl<S: AsRef<str>> TemplateLoader for HgLoader<'_, S> {
    /// Clones the repository with `hg clone`, then runs `hg update` for the
    /// requested revision.
    ///
    /// # Errors
    /// * `Error::CloneCancelledError` if an earlier download may not be replaced
    /// * `Error::VcsCommandError` if `hg` is missing or exits non-zero
    fn load(&self) -> Result<PathBuf> {
        let repo = self.repo.as_ref();
        let repo_url = repo.strip_prefix("hg+").unwrap_or(repo);
        let clone_path = self.clone_to_dir.join(repo_name(repo_url));
        fs::create_dir_all(&self.clone_to_dir)?;
        prepare_clone_dir(self.prompt, &clone_path, self.no_input)?;

        let clone_args = [OsStr::new("clone"), OsStr::new(repo_url), clone_path.as_os_str()];
        run_hg(clone_args, &self.clone_to_dir)?;
        if let Some(revision) = &self.checkout {
            run_hg(["update", revision.as_str()], &clone_path)?;
        }
        Ok(clone_path)
    }
}
