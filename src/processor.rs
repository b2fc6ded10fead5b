//! Directory generation.
//!
//! Walks the project root template directory (the single top-level directory
//! of a template whose name is a template expression), renders every path
//! segment and text file with the run's context, and writes the output tree.
//! Binary files and paths listed in `_copy_without_render` are copied as-is.
//!
//! A failure while writing leaves the partial output on disk for inspection.

use crate::context::Context;
use crate::error::{Error, Result};
use crate::hooks::{run_hook_phase, HookPhase};
use crate::renderer::TemplateRenderer;
use globset::{Glob, GlobSet, GlobSetBuilder};
use log::{debug, info};
use std::ffi::OsString;
use std::fs;
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

/// Number of leading bytes inspected for NUL bytes.
const SNIFF_LEN: usize = 8000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Directory,
    File,
    Symlink,
}

/// How the content of an entry reaches the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyMode {
    RenderText,
    CopyBinary,
    Skip,
}

/// One step of the generation plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedEntry {
    pub source: PathBuf,
    /// Rendered output path; `None` when the entry is skipped.
    pub target: Option<PathBuf>,
    pub kind: EntryKind,
    pub mode: CopyMode,
}

/// Heuristic content sniff: NUL bytes near the start, or invalid UTF-8.
pub fn is_binary(content: &[u8]) -> bool {
    let head = &content[..content.len().min(SNIFF_LEN)];
    head.contains(&0) || std::str::from_utf8(content).is_err()
}

/// Returns whether `name` contains template syntax.
pub fn is_templated(name: &str) -> bool {
    (name.contains("{{") && name.contains("}}")) || (name.contains("{%") && name.contains("%}"))
}

/// Locates the project root template directory inside `repo_dir`.
///
/// # Errors
/// * `Error::NonTemplatedInputDirError` if no top-level directory has a
///   templated name
pub fn find_template<P: AsRef<Path>>(repo_dir: P) -> Result<PathBuf> {
    let repo_dir = repo_dir.as_ref();
    debug!("Searching {} for the project template", repo_dir.display());

    let mut candidates = Vec::new();
    for entry in fs::read_dir(repo_dir)? {
        let entry = entry?;
        let name = entry.file_name();
        let is_candidate = entry.file_type()?.is_dir()
            && name.to_str().map(is_templated).unwrap_or(false);
        if is_candidate {
            candidates.push(entry.path());
        }
    }
    candidates.sort();

    match candidates.into_iter().next() {
        Some(template) => {
            debug!("The project template appears to be {}", template.display());
            Ok(template)
        }
        None => Err(Error::NonTemplatedInputDirError { repo_dir: repo_dir.display().to_string() }),
    }
}

/// Compiles `_copy_without_render` patterns.
///
/// Braces are literal, so a pattern may name an unrendered path such as
/// `{{cookiecutter.project_slug}}/static/*`.
pub fn build_copy_globs<S: AsRef<str>>(patterns: &[S]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let pattern = pattern.as_ref();
        let escaped = pattern.replace('{', "[{]").replace('}', "[}]");
        builder.add(Glob::new(&escaped).map_err(|e| Error::TemplateError {
            path: pattern.to_string(),
            message: format!("invalid _copy_without_render pattern: {e}"),
        })?);
    }
    builder.build().map_err(|e| Error::TemplateError {
        path: "_copy_without_render".to_string(),
        message: e.to_string(),
    })
}

/// Turns a relative path into the `/`-separated form used for glob matching
/// and error messages.
fn slash_path(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// Renders and writes a template tree.
pub struct Processor<'a> {
    renderer: &'a dyn TemplateRenderer,
    repo_dir: PathBuf,
    template_dir: PathBuf,
    output_root: PathBuf,
    context: serde_json::Value,
    copy_globs: GlobSet,
}

impl<'a> Processor<'a> {
    /// Prepares generation of the template at `repo_dir` into `output_dir`.
    ///
    /// Locates the project root template directory and renders its name to
    /// obtain the output root. Nothing is written yet.
    pub fn new(
        renderer: &'a dyn TemplateRenderer,
        repo_dir: &Path,
        output_dir: &Path,
        context: &Context,
    ) -> Result<Self> {
        let template_dir = find_template(repo_dir)?;
        let context_value = context.to_value();
        let output_dir = absolute(output_dir)?;

        let template_name = template_dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let root_name = renderer.render_named(&template_name, &template_name, &context_value)?;
        if root_name.trim().is_empty() {
            return Err(Error::TemplateError {
                path: template_name,
                message: "the project directory name rendered to an empty string".to_string(),
            });
        }
        check_segment(&template_name, &root_name)?;

        Ok(Self {
            renderer,
            repo_dir: repo_dir.to_path_buf(),
            template_dir,
            output_root: output_dir.join(root_name),
            context: context_value,
            copy_globs: build_copy_globs(&context.reserved.copy_without_render)?,
        })
    }

    pub fn template_dir(&self) -> &Path {
        &self.template_dir
    }

    pub fn output_root(&self) -> &Path {
        &self.output_root
    }

    /// Fails if the output root exists and overwriting was not allowed.
    pub fn check_output_root(&self, overwrite_if_exists: bool) -> Result<()> {
        if self.output_root.exists() && !overwrite_if_exists {
            return Err(Error::OutputDirExistsError {
                output_dir: self.output_root.display().to_string(),
            });
        }
        Ok(())
    }

    /// Walks the template depth-first and decides, for every entry, where it
    /// goes and how its content is handled. Path rendering errors surface here,
    /// before anything is written.
    pub fn plan(&self) -> Result<Vec<PlannedEntry>> {
        let mut plan = Vec::new();
        let mut walker = WalkDir::new(&self.template_dir)
            .min_depth(1)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter();

        while let Some(entry) = walker.next() {
            let entry = entry?;
            let source = entry.path().to_path_buf();
            let file_type = entry.file_type();
            let kind = if file_type.is_symlink() {
                EntryKind::Symlink
            } else if file_type.is_dir() {
                EntryKind::Directory
            } else {
                EntryKind::File
            };
            let relative = source
                .strip_prefix(&self.template_dir)
                .map_err(|e| Error::TemplateError {
                    path: source.display().to_string(),
                    message: e.to_string(),
                })?
                .to_path_buf();

            let Some(rendered) = self.render_relative_path(&relative)? else {
                debug!("Skipping {} as its name rendered empty", relative.display());
                if kind == EntryKind::Directory {
                    walker.skip_current_dir();
                }
                plan.push(PlannedEntry { source, target: None, kind, mode: CopyMode::Skip });
                continue;
            };
            let target = self.output_root.join(rendered);

            let mode = match kind {
                EntryKind::File => self.file_mode(&source, &relative)?,
                EntryKind::Directory | EntryKind::Symlink => CopyMode::RenderText,
            };
            debug!("Planned {} -> {} ({:?})", relative.display(), target.display(), mode);
            plan.push(PlannedEntry { source, target: Some(target), kind, mode });
        }
        Ok(plan)
    }

    fn file_mode(&self, source: &Path, relative: &Path) -> Result<CopyMode> {
        if self.copy_without_render(source, relative) || is_binary(&fs::read(source)?) {
            Ok(CopyMode::CopyBinary)
        } else {
            Ok(CopyMode::RenderText)
        }
    }

    /// Matches the unrendered path relative to the repository, then relative to
    /// the project root template directory. Matching a directory covers its
    /// whole subtree.
    fn copy_without_render(&self, source: &Path, relative: &Path) -> bool {
        let repo_relative = source.strip_prefix(&self.repo_dir).unwrap_or(source);
        [repo_relative, relative].iter().any(|path| {
            path.ancestors()
                .filter(|p| !p.as_os_str().is_empty())
                .any(|p| self.copy_globs.is_match(slash_path(p)))
        })
    }

    /// Renders each segment of `relative`. Returns `None` if any segment
    /// renders to an empty string.
    ///
    /// # Errors
    /// * `Error::TemplateError` if a segment renders to `.`, `..` or a value
    ///   holding a path separator
    fn render_relative_path(&self, relative: &Path) -> Result<Option<PathBuf>> {
        let name = slash_path(relative);
        let mut rendered = PathBuf::new();
        for component in relative.components() {
            let Component::Normal(segment) = component else {
                continue;
            };
            let segment: OsString = match segment.to_str() {
                Some(text) => {
                    let text = self.renderer.render_named(&name, text, &self.context)?;
                    if text.trim().is_empty() {
                        return Ok(None);
                    }
                    check_segment(&name, &text)?;
                    OsString::from(text)
                }
                None => segment.to_os_string(),
            };
            rendered.push(segment);
        }
        Ok(Some(rendered))
    }

    /// Writes every planned entry. Stops at the first error.
    pub fn execute(&self, plan: &[PlannedEntry]) -> Result<()> {
        fs::create_dir_all(&self.output_root)?;
        for entry in plan {
            let Some(target) = &entry.target else {
                continue;
            };
            match (entry.kind, entry.mode) {
                (_, CopyMode::Skip) => {}
                (EntryKind::Directory, _) => {
                    debug!("Creating directory {}", target.display());
                    fs::create_dir_all(target)?;
                }
                (EntryKind::Symlink, _) => self.write_symlink(&entry.source, target)?,
                (EntryKind::File, CopyMode::CopyBinary) => {
                    debug!("Copying {} without rendering", target.display());
                    ensure_parent(target)?;
                    fs::copy(&entry.source, target)?;
                }
                (EntryKind::File, CopyMode::RenderText) => {
                    self.write_rendered(&entry.source, target)?
                }
            }
        }
        Ok(())
    }

    fn write_rendered(&self, source: &Path, target: &Path) -> Result<()> {
        let relative = source.strip_prefix(&self.repo_dir).unwrap_or(source);
        let content = fs::read_to_string(source)?;
        let rendered = self.renderer.render_named(&slash_path(relative), &content, &self.context)?;

        debug!("Writing {}", target.display());
        ensure_parent(target)?;
        fs::write(target, rendered)?;
        fs::set_permissions(target, fs::metadata(source)?.permissions())?;
        Ok(())
    }

    fn write_symlink(&self, source: &Path, target: &Path) -> Result<()> {
        let link = fs::read_link(source)?;
        let link = match link.to_str() {
            Some(text) => PathBuf::from(self.renderer.render_named(
                &slash_path(source.strip_prefix(&self.repo_dir).unwrap_or(source)),
                text,
                &self.context,
            )?),
            None => link,
        };
        ensure_parent(target)?;
        if target.symlink_metadata().is_ok() {
            fs::remove_file(target)?;
        }
        debug!("Linking {} -> {}", target.display(), link.display());
        create_symlink(&link, target, source)
    }
}

#[cfg(unix)]
fn create_symlink(link: &Path, target: &Path, _source: &Path) -> Result<()> {
    std::os::unix::fs::symlink(link, target)?;
    Ok(())
}

#[cfg(not(unix))]
fn create_symlink(_link: &Path, target: &Path, source: &Path) -> Result<()> {
    if source.is_dir() {
        fs::create_dir_all(target)?;
    } else {
        fs::copy(source, target)?;
    }
    Ok(())
}

/// Keeps a rendered name inside its parent directory.
fn check_segment(name: &str, segment: &str) -> Result<()> {
    if segment == "." || segment == ".." || segment.contains(['/', '\\']) {
        return Err(Error::TemplateError {
            path: name.to_string(),
            message: format!("\"{segment}\" is not a valid file or directory name"),
        });
    }
    Ok(())
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}

/// Generates the template at `repo_dir` into `output_dir` and returns the
/// absolute path of the generated project root.
///
/// Order: output root check, pre-generation hook (run in the project root
/// template directory), planning, writing, post-generation hook (run in the
/// generated project root).
///
/// # Errors
/// * `Error::NonTemplatedInputDirError` if the template has no templated root
/// * `Error::OutputDirExistsError` if the output exists and
///   `overwrite_if_exists` is false; nothing is touched in that case
/// * Template errors and `Error::FailedHookError`; output written before the
///   failure is left in place
pub fn generate_files(
    repo_dir: &Path,
    context: &Context,
    renderer: &dyn TemplateRenderer,
    output_dir: &Path,
    overwrite_if_exists: bool,
) -> Result<PathBuf> {
    let processor = Processor::new(renderer, repo_dir, output_dir, context)?;
    processor.check_output_root(overwrite_if_exists)?;

    run_hook_phase(repo_dir, HookPhase::PreGen, processor.template_dir(), context, renderer)?;

    let plan = processor.plan()?;
    processor.execute(&plan)?;

    run_hook_phase(repo_dir, HookPhase::PostGen, processor.output_root(), context, renderer)?;

    info!("Generated project at {}", processor.output_root().display());
    Ok(processor.output_root().to_path_buf())
}
