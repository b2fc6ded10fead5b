use crate::error::Result;
use env_logger::{Logger, Target, WriteStyle};
use log::{LevelFilter, Log, Metadata, Record};
use std::fs::OpenOptions;
use std::path::Path;

/// Console logger plus an optional debug-level copy written to a file.
struct DualLogger {
    console: Logger,
    file: Option<Logger>,
}

impl Log for DualLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        self.console.enabled(metadata) || self.file.as_ref().is_some_and(|f| f.enabled(metadata))
    }

    fn log(&self, record: &Record) {
        self.console.log(record);
        if let Some(file) = &self.file {
            file.log(record);
        }
    }

    fn flush(&self) {
        self.console.flush();
        if let Some(file) = &self.file {
            file.flush();
        }
    }
}

fn console_logger(verbose: bool) -> Logger {
    env_logger::Builder::new()
        .filter_level(if verbose { LevelFilter::Debug } else { LevelFilter::Info })
        .build()
}

/// Logger appending every debug-level record to `path`.
fn file_logger(path: &Path) -> Result<Logger> {
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    Ok(env_logger::Builder::new()
        .filter_level(LevelFilter::Debug)
        .write_style(WriteStyle::Never)
        .target(Target::Pipe(Box::new(file)))
        .build())
}

/// Installs the global logger. Console verbosity follows `verbose`; `log_file`
/// always receives debug output.
///
/// # Errors
/// * `Error::IoError` if `log_file` cannot be opened for appending
pub fn init_logger(verbose: bool, log_file: Option<&Path>) -> Result<()> {
    let logger = DualLogger {
        console: console_logger(verbose),
        file: log_file.map(file_logger).transpose()?,
    };
    let max_level = if logger.file.is_some() {
        LevelFilter::Debug
    } else {
        logger.console.filter()
    };
    if log::set_boxed_logger(Box::new(logger)).is_ok() {
        log::set_max_level(max_level);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use log::Level;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_file_logger_records_debug_output() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("cutter.log");
        let logger = DualLogger {
            console: console_logger(false),
            file: Some(file_logger(&path).unwrap()),
        };
        let metadata = Metadata::builder().level(Level::Debug).build();

        assert!(!logger.console.enabled(&metadata));
        assert!(logger.enabled(&metadata));

        logger.log(
            &Record::builder()
                .args(format_args!("cloning template"))
                .level(Level::Debug)
                .target("cutter::loader")
                .build(),
        );
        logger.flush();

        let written = fs::read_to_string(&path).unwrap();
        assert!(written.contains("DEBUG"));
        assert!(written.contains("cutter::loader"));
        assert!(written.contains("cloning template"));
    }

    #[test]
    fn test_unwritable_log_file() {
        let temp_dir = TempDir::new().unwrap();
        let result = init_logger(false, Some(&temp_dir.path().join("missing/dir/cutter.log")));

        assert!(matches!(result, Err(crate::error::Error::IoError(_))));
    }
}
