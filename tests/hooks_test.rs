#![cfg(unix)]

mod common;

use common::{user_config, write_template, ScriptedPrompter};
use cutter::context::Context;
use cutter::error::Error;
use cutter::extensions::ExtensionRegistry;
use cutter::hooks::{find_hook, run_hook_phase, HookPhase};
use cutter::renderer::{MiniJinjaRenderer, TemplateRenderer};
use cutter::runner::{cutter, CutterOptions};
use indexmap::IndexMap;
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const SCHEMA: &str = r#"{"project_slug": "demo", "keep_todo": ["yes", "no"]}"#;

fn repo_with_hooks(base: &Path, hooks: &[(&str, &str)]) -> PathBuf {
    let repo = write_template(
        &base.join("hooked-repo"),
        SCHEMA,
        &[
            ("{{cookiecutter.project_slug}}/README.md", "{{ cookiecutter.project_slug }}"),
            ("{{cookiecutter.project_slug}}/TODO.txt", "todo"),
        ],
    );
    for (name, script) in hooks {
        let path = repo.join("hooks").join(name);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, script).unwrap();
    }
    repo
}

fn run(
    repo: &Path,
    base: &Path,
    extra: IndexMap<String, serde_json::Value>,
) -> cutter::error::Result<PathBuf> {
    let options = CutterOptions {
        template: repo.display().to_string(),
        no_input: true,
        extra_context: extra,
        output_dir: base.join("out"),
        ..CutterOptions::default()
    };
    cutter(
        &options,
        &user_config(base),
        &ScriptedPrompter::default(),
        &ExtensionRegistry::with_builtins(),
    )
}

#[test_log::test]
fn test_post_hook_removes_optional_file() {
    let temp_dir = TempDir::new().unwrap();
    let repo = repo_with_hooks(
        temp_dir.path(),
        &[(
            "post_gen_project.sh",
            "{% if cookiecutter.keep_todo == 'no' %}rm TODO.txt{% endif %}\n",
        )],
    );
    let extra = IndexMap::from([("keep_todo".to_string(), json!("no"))]);

    let project_dir = run(&repo, temp_dir.path(), extra).unwrap();

    assert!(project_dir.join("README.md").is_file());
    assert!(!project_dir.join("TODO.txt").exists());
    assert!(!project_dir.join("hooks").exists());
    assert!(!temp_dir.path().join("out/hooks").exists());
}

#[test]
fn test_post_hook_keeps_file_with_default_choice() {
    let temp_dir = TempDir::new().unwrap();
    let repo = repo_with_hooks(
        temp_dir.path(),
        &[(
            "post_gen_project.sh",
            "{% if cookiecutter.keep_todo == 'no' %}rm TODO.txt{% endif %}\n",
        )],
    );

    let project_dir = run(&repo, temp_dir.path(), IndexMap::new()).unwrap();

    assert!(project_dir.join("TODO.txt").is_file());
}

#[test]
fn test_pre_hook_runs_in_template_dir_before_generation() {
    let temp_dir = TempDir::new().unwrap();
    let marker = temp_dir.path().join("marker.txt");
    let script = format!(
        "basename \"$(pwd)\" > '{}'\ntest -e '{}' && echo generated >> '{}'\nexit 0\n",
        marker.display(),
        temp_dir.path().join("out/demo").display(),
        marker.display(),
    );
    let repo = repo_with_hooks(temp_dir.path(), &[("pre_gen_project.sh", &script)]);

    run(&repo, temp_dir.path(), IndexMap::new()).unwrap();

    assert_eq!(fs::read_to_string(&marker).unwrap(), "{{cookiecutter.project_slug}}\n");
}

#[test]
fn test_failing_pre_hook_aborts_generation() {
    let temp_dir = TempDir::new().unwrap();
    let repo = repo_with_hooks(
        temp_dir.path(),
        &[("pre_gen_project.sh", "echo refusing >&2\nexit 3\n")],
    );

    let result = run(&repo, temp_dir.path(), IndexMap::new());

    match result {
        Err(Error::FailedHookError { status, output, .. }) => {
            assert_eq!(status, "3");
            assert!(output.contains("refusing"));
        }
        other => panic!("Expected FailedHookError, got {other:?}"),
    }
    assert!(!temp_dir.path().join("out/demo").exists());
    // A failed run leaves no replay record behind.
    assert!(!temp_dir.path().join("replay/hooked-repo.json").exists());
}

#[test]
fn test_failing_post_hook_leaves_output() {
    let temp_dir = TempDir::new().unwrap();
    let repo = repo_with_hooks(temp_dir.path(), &[("post_gen_project.sh", "exit 1\n")]);

    let result = run(&repo, temp_dir.path(), IndexMap::new());

    assert!(matches!(result, Err(Error::FailedHookError { .. })));
    assert!(temp_dir.path().join("out/demo/README.md").is_file());
    assert!(!temp_dir.path().join("replay/hooked-repo.json").exists());
}

#[test]
fn test_hook_sees_extension_filters() {
    let temp_dir = TempDir::new().unwrap();
    let repo = write_template(
        &temp_dir.path().join("repo"),
        r#"{
            "project_name": "Hello World",
            "_extensions": ["cutter.extensions.SlugifyExtension"]
        }"#,
        &[("{{cookiecutter.project_name|slugify}}/README.md", "")],
    );
    fs::create_dir(repo.join("hooks")).unwrap();
    fs::write(
        repo.join("hooks/post_gen_project.sh"),
        "echo '{{ cookiecutter.project_name|slugify }}' > slug.txt\n",
    )
    .unwrap();

    let project_dir = run(&repo, temp_dir.path(), IndexMap::new()).unwrap();

    assert_eq!(project_dir, temp_dir.path().join("out/hello-world"));
    assert_eq!(fs::read_to_string(project_dir.join("slug.txt")).unwrap(), "hello-world\n");
}

#[test]
fn test_extensionless_hook_uses_shebang() {
    let temp_dir = TempDir::new().unwrap();
    let repo = repo_with_hooks(
        temp_dir.path(),
        &[("post_gen_project", "#!/bin/sh\ntouch from-shebang.txt\n")],
    );
    let hook = find_hook(&repo, HookPhase::PostGen).unwrap();
    assert_eq!(hook.path, repo.join("hooks/post_gen_project"));

    let cwd = temp_dir.path().join("cwd");
    fs::create_dir(&cwd).unwrap();
    let renderer = MiniJinjaRenderer::new();
    run_hook_phase(&repo, HookPhase::PostGen, &cwd, &Context::default(), &renderer).unwrap();

    assert!(cwd.join("from-shebang.txt").is_file());
}

#[test]
fn test_missing_hook_is_not_an_error() {
    let temp_dir = TempDir::new().unwrap();
    let renderer: &dyn TemplateRenderer = &MiniJinjaRenderer::new();

    let cwd = temp_dir.path();
    run_hook_phase(cwd, HookPhase::PreGen, cwd, &Context::default(), renderer).unwrap();
}

#[test_log::test]
fn test_failed_hook_reports_both_streams() {
    let temp_dir = TempDir::new().unwrap();
    let repo = repo_with_hooks(
        temp_dir.path(),
        &[("post_gen_project.sh", "echo step one\necho broken >&2\nexit 2\n")],
    );

    let result = run(&repo, temp_dir.path(), IndexMap::new());

    match result {
        Err(Error::FailedHookError { status, output, .. }) => {
            assert_eq!(status, "2");
            assert_eq!(output, "step one\nbroken\n");
        }
        other => panic!("Expected FailedHookError, got {other:?}"),
    }
}
