//! Capture sources: the devices or sessions that produce motion frames.
//!
//! A source is started once, then polled with [`CaptureSource::wait_for_frames`],
//! which blocks until the next synchronised [`FrameSet`] is ready. Motion
//! readings are pulled out of the frame set per stream kind.

pub mod replay;
pub mod simulated;

use crate::config::{MAX_RATE_HZ, MIN_RATE_HZ, SourceConfig, SourceKind};
use crate::error::CaptureError;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::fmt;
use std::time::{Duration, Instant};

pub use replay::ReplaySource;
pub use simulated::SimulatedImu;

pub type CaptureResult<T> = std::result::Result<T, CaptureError>;

/// Inertial streams a frame can belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamKind {
    Accel,
    Gyro,
}

impl StreamKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StreamKind::Accel => "ACCEL",
            StreamKind::Gyro => "GYRO",
        }
    }
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Three orthogonal motion components.
///
/// Accelerometer data is in m/s², gyroscope data in rad/s.
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
#[serde(from = "[f32; 3]")]
pub struct MotionVector {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl MotionVector {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

impl From<[f32; 3]> for MotionVector {
    fn from([x, y, z]: [f32; 3]) -> Self {
        Self { x, y, z }
    }
}

/// One reading from a single inertial stream.
#[derive(Debug, Clone, PartialEq)]
pub struct MotionFrame {
    pub stream: StreamKind,
    pub frame_number: u64,
    pub timestamp: DateTime<Utc>,
    pub data: MotionVector,
}

/// Frames delivered together by one `wait_for_frames` call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameSet {
    frames: Vec<MotionFrame>,
}

impl FrameSet {
    pub fn new(frames: Vec<MotionFrame>) -> Self {
        Self { frames }
    }

    /// First frame of the given stream, if the set carries one.
    pub fn first_or_default(&self, stream: StreamKind) -> Option<&MotionFrame> {
        self.frames.iter().find(|frame| frame.stream == stream)
    }

    /// Motion data of the given stream, or a capture fault if it is missing.
    pub fn motion_data(&self, stream: StreamKind) -> CaptureResult<MotionVector> {
        self.first_or_default(stream)
            .map(|frame| frame.data)
            .ok_or_else(|| {
                CaptureError::new(
                    "first_or_default",
                    stream.as_str(),
                    "frame set contains no motion frame for this stream",
                )
            })
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

/// Accelerometer and gyroscope readings consumed in one loop iteration.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MotionSample {
    pub accel: MotionVector,
    pub gyro: MotionVector,
}

impl MotionSample {
    pub fn from_frames(frames: &FrameSet) -> CaptureResult<Self> {
        Ok(Self {
            accel: frames.motion_data(StreamKind::Accel)?,
            gyro: frames.motion_data(StreamKind::Gyro)?,
        })
    }

    /// Build the frame set a device would deliver for this sample.
    pub fn into_frame_set(self, frame_number: u64, timestamp: DateTime<Utc>) -> FrameSet {
        FrameSet::new(vec![
            MotionFrame {
                stream: StreamKind::Accel,
                frame_number,
                timestamp,
                data: self.accel,
            },
            MotionFrame {
                stream: StreamKind::Gyro,
                frame_number,
                timestamp,
                data: self.gyro,
            },
        ])
    }
}

/// Trait implemented by every motion capture back end
#[cfg_attr(test, mockall::automock)]
pub trait CaptureSource {
    /// Begin streaming with the default configuration.
    fn start(&mut self) -> CaptureResult<()>;

    /// Block until the next frame set is ready or `timeout` elapses.
    fn wait_for_frames(&mut self, timeout: Duration) -> CaptureResult<FrameSet>;

    /// Stop streaming.
    fn stop(&mut self) -> CaptureResult<()>;

    /// Human-readable name of the source, for logs.
    fn describe(&self) -> String;
}

/// Create a capture source based on configuration
pub fn open_source(config: &SourceConfig) -> CaptureResult<Box<dyn CaptureSource>> {
    match config.kind {
        SourceKind::Simulated => {
            let mut imu = SimulatedImu::new(config.rate_hz)?;
            if let Some(frames) = config.disconnect_after {
                imu = imu.with_disconnect_after(frames);
            }
            Ok(Box::new(imu))
        }
        SourceKind::Replay => {
            let path = config.replay_file.as_deref().ok_or_else(|| {
                CaptureError::new("open_source", "replay", "no replay file configured")
            })?;
            let source = ReplaySource::open(path, config.rate_hz, config.loop_playback)?;
            Ok(Box::new(source))
        }
    }
}

/// Paces frame delivery at a fixed native rate.
#[derive(Debug)]
pub(crate) struct FramePacer {
    period: Duration,
    next_due: Option<Instant>,
}

impl FramePacer {
    /// Fails for rates outside `MIN_RATE_HZ..=MAX_RATE_HZ`.
    pub fn new(rate_hz: f64) -> CaptureResult<Self> {
        let unsupported = || {
            CaptureError::new(
                "open_source",
                rate_hz.to_string(),
                format!(
                    "frame rate must be between {} and {} Hz",
                    MIN_RATE_HZ, MAX_RATE_HZ
                ),
            )
        };

        if !(MIN_RATE_HZ..=MAX_RATE_HZ).contains(&rate_hz) {
            return Err(unsupported());
        }
        let period = Duration::try_from_secs_f64(1.0 / rate_hz).map_err(|_| unsupported())?;

        Ok(Self {
            period,
            next_due: None,
        })
    }

    /// Sleep until the next frame is due.
    ///
    /// Returns `false` without consuming the slot if the frame would not be
    /// due within `timeout`; in that case the call sleeps for `timeout`.
    pub fn wait(&mut self, timeout: Duration) -> bool {
        let now = Instant::now();
        let due = self.next_due.unwrap_or(now);

        if due > now {
            let remaining = due - now;
            if remaining > timeout {
                std::thread::sleep(timeout);
                return false;
            }
            std::thread::sleep(remaining);
        }

        // Late frames are delivered at once; the schedule restarts from now.
        self.next_due = Some(due.max(now) + self.period);
        true
    }

    pub fn reset(&mut self) {
        self.next_due = None;
    }
}

pub(crate) fn timeout_error(timeout: Duration) -> CaptureError {
    let millis = timeout.as_millis();
    CaptureError::new(
        "wait_for_frames",
        millis.to_string(),
        format!("Frame didn't arrive within {}", millis),
    )
}

pub(crate) fn not_started_error(function: &str, args: String) -> CaptureError {
    CaptureError::new(
        function,
        args,
        format!("{}() cannot be called before start()", function),
    )
}
