//! Cutter's main application entry point.
//! Parses arguments, sets up logging and hands over to the runner.

use cutter::{
    cli::{get_args, Args},
    error::{default_error_handler, Result},
    extensions::ExtensionRegistry,
    logger::init_logger,
    prompt::DialoguerPrompter,
    runner::cutter,
    user_config::get_user_config,
};

/// Main application entry point.
fn main() {
    let args = get_args();

    if let Err(err) = run(args) {
        default_error_handler(err);
    }
}

fn run(args: Args) -> Result<()> {
    init_logger(args.verbose, args.log_file.as_deref())?;

    let config = get_user_config(args.config_file.as_deref(), args.default_config)?;
    let prompter = DialoguerPrompter::new();
    let registry = ExtensionRegistry::with_builtins();

    let project_dir = cutter(&args.to_options(), &config, &prompter, &registry)?;
    println!("Project generated in {}", project_dir.display());
    Ok(())
}
