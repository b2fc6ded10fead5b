//! Pre and post generation hooks.
//!
//! A template may ship `hooks/pre_gen_project.<ext>` and
//! `hooks/post_gen_project.<ext>`. Hooks are templates too: they are rendered
//! with the run's context, written to a temporary executable file and run.
//! A non-zero exit status fails the whole generation.
//!
//! Hook output is relayed to the log line by line while the hook runs:
//! stdout at info level and stderr at warn level. A partial line shows up
//! once it is terminated or the stream closes.

use crate::context::Context;
use crate::error::{Error, Result};
use crate::renderer::TemplateRenderer;
use log::{debug, info, log, Level};
use std::fs;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;

/// Name of the hooks directory at the root of a template.
pub const HOOKS_DIR: &str = "hooks";

/// Script kinds recognised on this platform, by priority. The empty string is
/// an extensionless script run through its shebang.
#[cfg(not(windows))]
pub const HOOK_EXTENSIONS: [&str; 3] = ["sh", "", "py"];
#[cfg(windows)]
pub const HOOK_EXTENSIONS: [&str; 3] = ["bat", "cmd", "py"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookPhase {
    PreGen,
    PostGen,
}

impl HookPhase {
    pub fn script_name(&self) -> &'static str {
        match self {
            HookPhase::PreGen => "pre_gen_project",
            HookPhase::PostGen => "post_gen_project",
        }
    }
}

/// A hook script found for one phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hook {
    pub phase: HookPhase,
    pub path: PathBuf,
}

/// Finds the hook for `phase` in `repo_dir`, if any.
///
/// At most one hook runs per phase: the first recognised kind wins.
pub fn find_hook<P: AsRef<Path>>(repo_dir: P, phase: HookPhase) -> Option<Hook> {
    let hooks_dir = repo_dir.as_ref().join(HOOKS_DIR);
    if !hooks_dir.is_dir() {
        debug!("No hooks directory in {}", repo_dir.as_ref().display());
        return None;
    }

    HOOK_EXTENSIONS.iter().find_map(|ext| {
        let file_name = if ext.is_empty() {
            phase.script_name().to_string()
        } else {
            format!("{}.{}", phase.script_name(), ext)
        };
        let path = hooks_dir.join(file_name);
        path.is_file().then(|| Hook { phase, path })
    })
}

/// Runs the hook for `phase`, if the template has one, with `cwd` as working
/// directory. A missing hook is not an error.
pub fn run_hook_phase(
    repo_dir: &Path,
    phase: HookPhase,
    cwd: &Path,
    context: &Context,
    renderer: &dyn TemplateRenderer,
) -> Result<()> {
    match find_hook(repo_dir, phase) {
        Some(hook) => run_hook(&hook, cwd, context, renderer),
        None => {
            debug!("No {} hook found", phase.script_name());
            Ok(())
        }
    }
}

/// Renders `hook` with `context`, then executes it in `cwd`.
///
/// # Errors
/// * Template errors while rendering the script
/// * `Error::FailedHookError` if the script cannot be started or exits non-zero
pub fn run_hook(
    hook: &Hook,
    cwd: &Path,
    context: &Context,
    renderer: &dyn TemplateRenderer,
) -> Result<()> {
    let hook_name = hook.path.display().to_string();
    let source = fs::read_to_string(&hook.path)?;
    let script = renderer.render_named(&hook_name, &source, &context.to_value())?;

    let temp_dir = tempfile::tempdir()?;
    let file_name = hook.path.file_name().map(PathBuf::from).unwrap_or_else(|| {
        PathBuf::from(hook.phase.script_name())
    });
    let script_path = temp_dir.path().join(file_name);
    fs::write(&script_path, script)?;
    make_executable(&script_path)?;

    info!("Running {} hook", hook.phase.script_name());
    let mut child = hook_command(&script_path)
        .current_dir(cwd)
        .stdin(Stdio::inherit())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| Error::FailedHookError {
            hook: hook_name.clone(),
            status: "not started".to_string(),
            output: format!("{e}; the script might be empty or missing a shebang"),
        })?;

    let stdout = child.stdout.take();
    let stderr = child.stderr.take();
    let output = thread::scope(|scope| {
        let stderr_relay =
            scope.spawn(move || stderr.map(|s| relay_lines(s, Level::Warn)).unwrap_or_default());
        let mut output = stdout.map(|s| relay_lines(s, Level::Info)).unwrap_or_default();
        output.push_str(&stderr_relay.join().unwrap_or_default());
        output
    });
    let status = child.wait()?;

    if !status.success() {
        return Err(Error::FailedHookError {
            hook: hook_name,
            status: status
                .code()
                .map(|code| code.to_string())
                .unwrap_or_else(|| "terminated by signal".to_string()),
            output,
        });
    }
    Ok(())
}

fn hook_command(script_path: &Path) -> Command {
    let extension = script_path.extension().and_then(|e| e.to_str()).unwrap_or_default();
    match extension {
        "py" => {
            let mut command = Command::new(if cfg!(windows) { "python" } else { "python3" });
            command.arg(script_path);
            command
        }
        "sh" => {
            let mut command = Command::new("sh");
            command.arg(script_path);
            command
        }
        "bat" | "cmd" => {
            let mut command = Command::new("cmd");
            command.arg("/C").arg(script_path);
            command
        }
        _ => Command::new(script_path),
    }
}

#[cfg(unix)]
fn make_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let mut permissions = fs::metadata(path)?.permissions();
    permissions.set_mode(permissions.mode() | 0o755);
    fs::set_permissions(path, permissions)?;
    Ok(())
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> Result<()> {
    Ok(())
}

/// Logs every line read from `reader` at `level` as soon as it arrives and
/// returns everything read.
fn relay_lines<R: Read>(reader: R, level: Level) -> String {
    let mut reader = BufReader::new(reader);
    let mut captured = String::new();
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf) {
            Ok(0) | Err(_) => break,
            Ok(_) => {
                let line = String::from_utf8_lossy(&buf);
                log!(level, "{}", line.trim_end_matches(['\r', '\n']));
                captured.push_str(&line);
            }
        }
    }
    captured
}
