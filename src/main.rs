//! check-imu: live accelerometer and gyroscope gauges in the terminal.
//!
//! Opens a motion capture source, waits for each frame set, and redraws six
//! ASCII gauges (accel x/y/z, gyro x/y/z) together with the measured frame
//! rate. The loop runs until a fault occurs or the process is interrupted.
//!
//! Exit status is 0 after an interrupt or a reached `--frames` limit, and 1 on
//! any capture-source or runtime fault.

use std::io::{self, BufWriter};
use std::process::ExitCode;

use tracing::info;

use check_imu::cli::Cli;
use check_imu::config::AppConfig;
use check_imu::display::Dashboard;
use check_imu::monitor::{self, MotionMonitor};
use check_imu::{Result, capture, logging};

fn main() -> ExitCode {
    let cli = Cli::parse_args();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let mut config = AppConfig::load(cli.config.as_deref())?;
    config.apply_cli_overrides(cli);
    config.validate()?;

    logging::init(&config.logging)?;
    info!("check-imu v{} starting", env!("CARGO_PKG_VERSION"));

    let source = capture::open_source(&config.source)?;
    let dashboard = Dashboard::new(
        BufWriter::new(io::stdout().lock()),
        config.display.clear_screen,
    );

    let mut monitor = MotionMonitor::new(source, dashboard, config.source.frame_timeout())
        .with_frame_limit(cli.frames);
    monitor::setup_signal_handler(monitor.stop_signal())?;

    monitor.run()?;
    Ok(())
}
