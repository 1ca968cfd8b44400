//! Playback of recorded motion samples.
//!
//! Recordings are JSON lines, one sample per line:
//!
//! ```text
//! {"timestamp":"2024-05-01T12:00:00.000Z","accel":[0.0,0.0,9.81],"gyro":[0.01,0.0,-0.02]}
//! ```
//!
//! `timestamp` is optional. A line may omit `accel` or `gyro`, which yields a
//! frame set without that stream. Blank lines and lines starting with `#`
//! are ignored.

use super::{
    CaptureResult, CaptureSource, FrameSet, FramePacer, MotionFrame, MotionVector, StreamKind,
    not_started_error, timeout_error,
};
use crate::error::CaptureError;
use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RecordedSample {
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub accel: Option<MotionVector>,
    #[serde(default)]
    pub gyro: Option<MotionVector>,
}

impl RecordedSample {
    fn to_frame_set(&self, frame_number: u64) -> FrameSet {
        let timestamp = self.timestamp.unwrap_or_else(Utc::now);
        let streams = [(StreamKind::Accel, self.accel), (StreamKind::Gyro, self.gyro)];

        let frames = streams
            .into_iter()
            .filter_map(|(stream, data)| {
                data.map(|data| MotionFrame {
                    stream,
                    frame_number,
                    timestamp,
                    data,
                })
            })
            .collect();
        FrameSet::new(frames)
    }
}

/// Parse a JSON-lines recording.
pub fn parse_recording(content: &str) -> anyhow::Result<Vec<RecordedSample>> {
    let mut samples = Vec::new();
    for (index, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let sample: RecordedSample = serde_json::from_str(line)
            .with_context(|| format!("invalid sample on line {}", index + 1))?;
        samples.push(sample);
    }
    Ok(samples)
}

pub struct ReplaySource {
    path: PathBuf,
    samples: Vec<RecordedSample>,
    cursor: usize,
    loop_playback: bool,
    pacer: FramePacer,
    started: bool,
    frame_number: u64,
}

impl ReplaySource {
    /// Load a recording from `path`.
    pub fn open(path: &Path, rate_hz: f64, loop_playback: bool) -> CaptureResult<Self> {
        let args = path.display().to_string();
        let content = std::fs::read_to_string(path)
            .map_err(|e| CaptureError::new("open_replay", args.clone(), e.to_string()))?;
        let samples = parse_recording(&content)
            .map_err(|e| CaptureError::new("open_replay", args.clone(), format!("{:#}", e)))?;

        Self::from_samples(path.to_path_buf(), samples, rate_hz, loop_playback)
    }

    pub fn from_samples(
        path: PathBuf,
        samples: Vec<RecordedSample>,
        rate_hz: f64,
        loop_playback: bool,
    ) -> CaptureResult<Self> {
        if samples.is_empty() {
            return Err(CaptureError::new(
                "open_replay",
                path.display().to_string(),
                "recording contains no samples",
            ));
        }

        debug!("Loaded {} samples from {}", samples.len(), path.display());
        Ok(Self {
            path,
            samples,
            cursor: 0,
            loop_playback,
            pacer: FramePacer::new(rate_hz)?,
            started: false,
            frame_number: 0,
        })
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }
}

impl CaptureSource for ReplaySource {
    fn start(&mut self) -> CaptureResult<()> {
        if self.started {
            return Err(CaptureError::new("start", "", "pipeline already started"));
        }
        self.started = true;
        self.cursor = 0;
        self.frame_number = 0;
        self.pacer.reset();
        info!("Replaying {} ({} samples)", self.path.display(), self.samples.len());
        Ok(())
    }

    fn wait_for_frames(&mut self, timeout: Duration) -> CaptureResult<FrameSet> {
        if !self.started {
            return Err(not_started_error(
                "wait_for_frames",
                timeout.as_millis().to_string(),
            ));
        }

        if self.cursor >= self.samples.len() {
            if !self.loop_playback {
                return Err(CaptureError::new(
                    "wait_for_frames",
                    timeout.as_millis().to_string(),
                    format!("end of recording {}", self.path.display()),
                ));
            }
            debug!("Rewinding {}", self.path.display());
            self.cursor = 0;
        }

        if !self.pacer.wait(timeout) {
            return Err(timeout_error(timeout));
        }

        let frames = self.samples[self.cursor].to_frame_set(self.frame_number);
        self.cursor += 1;
        self.frame_number += 1;
        Ok(frames)
    }

    fn stop(&mut self) -> CaptureResult<()> {
        if !self.started {
            return Err(not_started_error("stop", String::new()));
        }
        self.started = false;
        Ok(())
    }

    fn describe(&self) -> String {
        format!("replay of {}", self.path.display())
    }
}
