//! Command-line interface argument parsing.
//!
//! Every option is optional: running `check-imu` with no arguments starts the
//! monitor on the default (simulated) source immediately.

use crate::config::SourceKind;
use gumdrop::Options;
use std::path::PathBuf;

/// check-imu: render accelerometer and gyroscope samples as ASCII gauges
#[derive(Debug, Default, Options)]
pub struct Cli {
    #[options(help = "print help message")]
    pub help: bool,

    #[options(help = "path to TOML configuration file", meta = "PATH")]
    pub config: Option<PathBuf>,

    #[options(help = "log level (trace, debug, info, warn, error)", meta = "LEVEL")]
    pub log_level: Option<String>,

    #[options(help = "capture source (simulated, replay)", meta = "KIND")]
    pub source: Option<SourceKind>,

    #[options(help = "replay a recorded JSON-lines motion file", meta = "PATH")]
    pub replay: Option<PathBuf>,

    #[options(no_short, help = "native frame rate in Hz", meta = "HZ")]
    pub rate: Option<f64>,

    #[options(short = "n", help = "stop after N frames", meta = "N")]
    pub frames: Option<u64>,
}

impl Cli {
    /// Parse process arguments, exiting with usage on error or `--help`
    pub fn parse_args() -> Self {
        Self::parse_args_default_or_exit()
    }

    /// Parse an explicit argument list (program name excluded)
    pub fn parse_from_args<S: AsRef<str>>(args: &[S]) -> Result<Self, gumdrop::Error> {
        Self::parse_args_default(args)
    }
}
