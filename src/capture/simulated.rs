//! Synthetic IMU that needs no hardware.
//!
//! Produces gravity on the Z axis plus slow sinusoidal motion on every axis,
//! paced at the configured native rate.

use super::{
    CaptureResult, CaptureSource, FrameSet, FramePacer, MotionSample, MotionVector,
    not_started_error, timeout_error,
};
use crate::error::CaptureError;
use chrono::Utc;
use std::f64::consts::TAU;
use std::time::Duration;
use tracing::{debug, info};

const STANDARD_GRAVITY: f64 = 9.81;

pub struct SimulatedImu {
    rate_hz: f64,
    pacer: FramePacer,
    started: bool,
    frame_number: u64,
    disconnect_after: Option<u64>,
}

impl SimulatedImu {
    pub fn new(rate_hz: f64) -> CaptureResult<Self> {
        Ok(Self {
            rate_hz,
            pacer: FramePacer::new(rate_hz)?,
            started: false,
            frame_number: 0,
            disconnect_after: None,
        })
    }

    /// Report a device disconnect once `frames` frames have been delivered.
    pub fn with_disconnect_after(mut self, frames: u64) -> Self {
        self.disconnect_after = Some(frames);
        self
    }

    /// Motion at `t` seconds after streaming started.
    pub fn sample_at(t: f64) -> MotionSample {
        let wave = |amplitude: f64, freq_hz: f64, phase: f64| {
            (amplitude * (TAU * freq_hz * t + phase).sin()) as f32
        };

        MotionSample {
            accel: MotionVector::new(
                wave(0.6, 0.25, 0.0),
                wave(0.4, 0.2, 1.3),
                STANDARD_GRAVITY as f32 + wave(0.2, 0.5, 0.0),
            ),
            gyro: MotionVector::new(
                wave(1.5, 0.3, 0.0),
                wave(0.8, 0.45, 1.0),
                wave(2.5, 0.1, 2.0),
            ),
        }
    }

    pub fn frames_delivered(&self) -> u64 {
        self.frame_number
    }
}

impl CaptureSource for SimulatedImu {
    fn start(&mut self) -> CaptureResult<()> {
        if self.started {
            return Err(CaptureError::new("start", "", "pipeline already started"));
        }
        self.started = true;
        self.frame_number = 0;
        self.pacer.reset();
        info!("Simulated IMU streaming at {} Hz", self.rate_hz);
        Ok(())
    }

    fn wait_for_frames(&mut self, timeout: Duration) -> CaptureResult<FrameSet> {
        if !self.started {
            return Err(not_started_error(
                "wait_for_frames",
                timeout.as_millis().to_string(),
            ));
        }

        if self
            .disconnect_after
            .is_some_and(|limit| self.frame_number >= limit)
        {
            return Err(CaptureError::new(
                "wait_for_frames",
                timeout.as_millis().to_string(),
                "device disconnected",
            ));
        }

        if !self.pacer.wait(timeout) {
            return Err(timeout_error(timeout));
        }

        let t = self.frame_number as f64 / self.rate_hz;
        let sample = Self::sample_at(t);
        let frames = sample.into_frame_set(self.frame_number, Utc::now());
        self.frame_number += 1;
        Ok(frames)
    }

    fn stop(&mut self) -> CaptureResult<()> {
        if !self.started {
            return Err(not_started_error("stop", String::new()));
        }
        self.started = false;
        debug!("Simulated IMU stopped after {} frames", self.frame_number);
        Ok(())
    }

    fn describe(&self) -> String {
        format!("simulated IMU @ {} Hz", self.rate_hz)
    }
}
