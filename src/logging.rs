//! Log file setup for the command line front end.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use chrono::Utc;
use env_logger::{Builder, Env, Target};
use log::LevelFilter;

use crate::common::{MetadataResult, DEFAULT_LOG_FILE};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Verbosity levels accepted on the command line.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum Verbosity {
    Debug,
    #[default]
    Info,
    Warning,
    Error,
    Critical,
}

impl From<Verbosity> for LevelFilter {
    fn from(verbosity: Verbosity) -> Self {
        match verbosity {
            Verbosity::Debug => LevelFilter::Debug,
            Verbosity::Info => LevelFilter::Info,
            Verbosity::Warning => LevelFilter::Warn,
            Verbosity::Error | Verbosity::Critical => LevelFilter::Error,
        }
    }
}

/// Installs the global logger, appending to `log_file`.
///
/// The file is created when missing. Without arguments the logger writes to
/// `saml-cert-expiry.log` at `info` level; `RUST_LOG` directives still apply
/// on top of the chosen level.
///
/// # Errors
///
/// * `MetadataError::IO` - If the log file cannot be opened for appending
/// * `MetadataError::Logging` - If a global logger is already installed
pub fn configure_logger(log_file: Option<&Path>, verbosity: Option<Verbosity>) -> MetadataResult<()> {
    let log_file = log_file.unwrap_or_else(|| Path::new(DEFAULT_LOG_FILE));
    let file = OpenOptions::new().create(true).append(true).open(log_file)?;
    Builder::new()
        .filter_level(verbosity.unwrap_or_default().into())
        .parse_env(Env::default())
        .target(Target::Pipe(Box::new(file)))
        .format(|buf, record| {
            writeln!(
                buf,
                "{} - {} - {} - {}",
                Utc::now().format(TIMESTAMP_FORMAT),
                record.target(),
                record.level(),
                record.args()
            )
        })
        .try_init()?;
    Ok(())
}
