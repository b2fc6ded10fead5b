//! Error handling for the Cutter application.
//! Defines custom error types and results used throughout the application.

use std::io;
use thiserror::Error;

/// Custom error types for Cutter operations.
///
/// Every fatal condition of a generation run maps to one variant. Variants carry
/// the data a caller needs to print a precise diagnostic instead of a bare message.
#[derive(Error, Debug)]
pub enum Error {
    /// Represents errors that occur during file system operations
    #[error("IO error: {0}.")]
    IoError(#[from] io::Error),

    /// Represents errors that occur while walking the template tree
    #[error("Failed to walk template directory: {0}.")]
    WalkError(#[from] walkdir::Error),

    /// Represents JSON (de)serialization failures
    #[error("JSON error: {0}.")]
    JsonError(#[from] serde_json::Error),

    /// Represents failures of the git client while fetching a template
    #[error("Failed to clone repository: {0}.")]
    RepositoryCloneError(#[from] git2::Error),

    #[error("Error: \"{output_dir}\" directory already exists.")]
    OutputDirExistsError { output_dir: String },

    #[error("You can not use both replay and no_input at the same time.")]
    InvalidModeError,

    #[error("The template \"{repo_dir}\" does not contain a templated project directory.")]
    NonTemplatedInputDirError { repo_dir: String },

    #[error("Unable to load extension \"{name}\": {reason}.")]
    UnknownExtensionError { name: String, reason: String },

    /// Referencing an unset variable while rendering `path`
    #[error("Unable to render \"{path}\" (line {line}): {message}.")]
    UndefinedVariableError {
        path: String,
        line: usize,
        message: String,
        context: serde_json::Value,
    },

    #[error("{message}\n  File \"{path}\", line {line}.")]
    TemplateSyntaxError { path: String, line: usize, message: String },

    #[error("Template error in \"{path}\": {message}.")]
    TemplateError { path: String, message: String },

    /// A hook script exited with a non-zero status or could not be started
    #[error("Hook script \"{hook}\" failed (status {status}): {output}")]
    FailedHookError { hook: String, status: String, output: String },

    #[error("Config file \"{path}\" does not exist.")]
    ConfigDoesNotExistError { path: String },

    #[error("Invalid configuration in \"{path}\": {message}.")]
    InvalidConfigurationError { path: String, message: String },

    #[error("Unable to decode \"{path}\": {message}.")]
    ContextDecodingError { path: String, message: String },

    #[error("A valid repository for \"{template}\" could not be found.")]
    RepositoryNotFoundError { template: String },

    /// The user refused to replace a previously downloaded template
    #[error("Not replacing the existing template download at \"{path}\".")]
    CloneCancelledError { path: String },

    /// An external version control command failed or could not be started
    #[error("Command \"{command}\" failed: {message}")]
    VcsCommandError { command: String, message: String },

    #[error(
        "Invalid abbreviation \"{prefix}\": \
         expansion \"{expansion}\" must use the {{0}} placeholder."
    )]
    InvalidAbbreviationError { prefix: String, expansion: String },

    /// Terminal interaction failed
    #[error("Prompt error: {0}.")]
    PromptError(String),
}

/// Convenience type alias for Results with Error as the error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Default error handler that prints the error and exits the program.
///
/// Undefined-variable failures also print the context they were rendered with,
/// so the missing key can be spotted next to the keys that were present.
pub fn default_error_handler(err: Error) {
    if let Error::UndefinedVariableError { context, .. } = &err {
        eprintln!("{err}");
        let context =
            serde_json::to_string_pretty(context).unwrap_or_else(|_| context.to_string());
        eprintln!("Context: {context}");
    } else {
        eprintln!("{err}");
    }
    std::process::exit(1);
}
