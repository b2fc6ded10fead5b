#![allow(dead_code)]

use cutter::error::Result;
use cutter::prompt::Prompter;
use cutter::user_config::UserConfig;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};

/// Prompter answering from a script. An exhausted script accepts defaults.
#[derive(Default)]
pub struct ScriptedPrompter {
    answers: RefCell<VecDeque<String>>,
    confirms: RefCell<VecDeque<bool>>,
    pub asked: RefCell<Vec<String>>,
}

impl ScriptedPrompter {
    pub fn new(answers: &[&str]) -> Self {
        Self {
            answers: RefCell::new(answers.iter().map(|s| s.to_string()).collect()),
            confirms: RefCell::new(VecDeque::new()),
            asked: RefCell::new(Vec::new()),
        }
    }

    /// Scripts the answers to yes/no questions.
    pub fn with_confirms(self, confirms: &[bool]) -> Self {
        self.confirms.borrow_mut().extend(confirms);
        self
    }

    fn next_answer(&self, name: &str) -> String {
        self.asked.borrow_mut().push(name.to_string());
        self.answers.borrow_mut().pop_front().unwrap_or_default()
    }

    pub fn asked(&self) -> Vec<String> {
        self.asked.borrow().clone()
    }
}

impl Prompter for ScriptedPrompter {
    fn read_variable(&self, name: &str, _default: &str) -> Result<String> {
        Ok(self.next_answer(name))
    }

    fn read_choice(&self, name: &str, _options: &[String]) -> Result<String> {
        Ok(self.next_answer(name))
    }

    fn confirm(&self, question: &str, default: bool) -> Result<bool> {
        self.asked.borrow_mut().push(question.to_string());
        Ok(self.confirms.borrow_mut().pop_front().unwrap_or(default))
    }
}

/// Writes a template repository: the schema plus `(relative path, content)` files.
pub fn write_template(root: &Path, schema: &str, files: &[(&str, &str)]) -> PathBuf {
    fs::create_dir_all(root).unwrap();
    fs::write(root.join("cookiecutter.json"), schema).unwrap();
    for (path, content) in files {
        let path = root.join(path);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }
    root.to_path_buf()
}

/// User config whose state directories live under `base`.
pub fn user_config(base: &Path) -> UserConfig {
    UserConfig {
        cutters_dir: base.join("cutters"),
        replay_dir: base.join("replay"),
        ..UserConfig::default()
    }
}
