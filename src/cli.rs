//! Command-line interface implementation for Cutter.
//! Provides argument parsing and help text formatting using clap.

use clap::{error::ErrorKind, CommandFactory, Parser};
use indexmap::IndexMap;
use std::path::PathBuf;

use crate::runner::CutterOptions;

/// Command-line arguments structure for Cutter.
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Create a project from a cookiecutter-style template",
    long_about = None
)]
pub struct Args {
    /// Path, git URL or abbreviation (e.g. gh:user/repo) of the template
    #[arg(value_name = "TEMPLATE")]
    pub template: String,

    /// Values that override template defaults, as key=value
    #[arg(value_name = "EXTRA_CONTEXT", value_parser = parse_key_val)]
    pub extra_context: Vec<(String, String)>,

    /// Do not prompt for parameters and only use the template defaults
    #[arg(long)]
    pub no_input: bool,

    /// Branch, tag or commit to checkout after git clone
    #[arg(short, long)]
    pub checkout: Option<String>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// File that receives a debug-level copy of the log
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Do not prompt for parameters and only use information entered previously
    #[arg(long)]
    pub replay: bool,

    /// Overwrite the contents of the output directory if it already exists
    #[arg(short = 'f', long)]
    pub overwrite_if_exists: bool,

    /// Where to output the generated project dir into
    #[arg(short, long, default_value = ".")]
    pub output_dir: PathBuf,

    /// User configuration file
    #[arg(long)]
    pub config_file: Option<PathBuf>,

    /// Do not load a config file. Use the defaults instead
    #[arg(long)]
    pub default_config: bool,
}

impl Args {
    /// Converts the parsed arguments into run options.
    pub fn to_options(&self) -> CutterOptions {
        let extra_context: IndexMap<String, serde_json::Value> = self
            .extra_context
            .iter()
            .map(|(key, value)| (key.clone(), serde_json::Value::String(value.clone())))
            .collect();

        CutterOptions {
            template: self.template.clone(),
            checkout: self.checkout.clone(),
            no_input: self.no_input,
            extra_context,
            replay: self.replay,
            overwrite_if_exists: self.overwrite_if_exists,
            output_dir: self.output_dir.clone(),
            save_replay: true,
        }
    }
}

/// Parses a single `key=value` pair. The value may itself contain `=`.
pub fn parse_key_val(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!(
            "EXTRA_CONTEXT should contain items of the form key=value; \
             '{s}' doesn't match that form"
        )),
    }
}

/// Parses command line arguments and returns the Args structure.
///
/// # Exits
/// * With status code 1 if required arguments are missing
/// * With clap's default error handling for other argument errors
pub fn get_args() -> Args {
    match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            if e.kind() == ErrorKind::MissingRequiredArgument {
                let _ = Args::command()
                    .help_template(
                        r#"{about-section}
{usage-heading} {usage}

{all-args}
{after-help}
"#,
                    )
                    .print_help();
                std::process::exit(1);
            } else {
                e.exit();
            }
        }
    }
}
