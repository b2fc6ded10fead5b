//! Cutter generates projects from cookiecutter-style templates.
//! Variables are collected from user defaults, the template schema, extra
//! context and prompts, then the templated directory tree is rendered into
//! the output directory with pre and post generation hooks around it.

/// Command-line interface module for the Cutter application
pub mod cli;

/// Template schema (`cookiecutter.json`) loading
pub mod config;

/// Context resolution: defaults, overrides, prompts and replay
pub mod context;

/// Error types and handling for the Cutter application
pub mod error;

/// Pluggable rendering extensions
pub mod extensions;

/// Pre and post generation hook processing
/// Handles execution of scripts in:
/// - hooks/pre_gen_project
/// - hooks/post_gen_project
pub mod hooks;

/// Abbreviation expansion and template loading from disk, git or Mercurial
pub mod loader;

/// Console and file logging setup
pub mod logger;

/// Directory generation
pub mod processor;

/// User input and interaction handling
pub mod prompt;

/// Strict template rendering
pub mod renderer;

/// Persisted contexts for non-interactive re-runs
pub mod replay;

/// End-to-end generation runs
pub mod runner;

/// User-level configuration
pub mod user_config;
