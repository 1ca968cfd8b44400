//! Loop driver: reads motion samples and redraws the gauges.
//!
//! The loop is single-threaded. It blocks in the capture source until the next
//! frame set arrives, then draws it. It ends on a capture or display fault, on
//! the stop flag (set by SIGINT/SIGTERM), or after an optional frame limit.

use crate::capture::{CaptureSource, FrameSet, MotionSample};
use crate::display::Dashboard;
use crate::error::{Result, ServiceError};
use signal_hook::consts::{SIGINT, SIGTERM};
use std::io::Write;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, info, trace, warn};

/// Frame rate from the wall-clock gap between consecutive frames
#[derive(Debug, Clone, Copy)]
pub struct FrequencyMeter {
    last: Instant,
}

impl FrequencyMeter {
    pub fn new(start: Instant) -> Self {
        Self { last: start }
    }

    /// Record a frame at `now` and return `1000 / elapsed_ms`.
    ///
    /// Returns `None` when no time has elapsed since the previous frame.
    pub fn tick(&mut self, now: Instant) -> Option<f32> {
        let elapsed = now.saturating_duration_since(self.last);
        self.last = now;

        let elapsed_ms = elapsed.as_secs_f64() * 1000.0;
        if elapsed_ms > 0.0 {
            Some((1000.0 / elapsed_ms) as f32)
        } else {
            None
        }
    }
}

/// Drives a capture source into a dashboard
pub struct MotionMonitor<W: Write> {
    source: Box<dyn CaptureSource>,
    dashboard: Dashboard<W>,
    frame_timeout: Duration,
    max_frames: Option<u64>,
    should_stop: Arc<AtomicBool>,
}

impl<W: Write> MotionMonitor<W> {
    pub fn new(
        source: Box<dyn CaptureSource>,
        dashboard: Dashboard<W>,
        frame_timeout: Duration,
    ) -> Self {
        Self {
            source,
            dashboard,
            frame_timeout,
            max_frames: None,
            should_stop: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Stop normally after `limit` frames
    pub fn with_frame_limit(mut self, limit: Option<u64>) -> Self {
        self.max_frames = limit;
        self
    }

    /// Get the stop signal
    pub fn stop_signal(&self) -> Arc<AtomicBool> {
        self.should_stop.clone()
    }

    /// Request the loop to stop after the current frame
    pub fn request_stop(&self) {
        self.should_stop.store(true, Ordering::SeqCst);
    }

    /// Start the source and run until stopped. Returns the number of frames drawn.
    pub fn run(&mut self) -> Result<u64> {
        self.run_with_clock(Instant::now)
    }

    /// Like [`MotionMonitor::run`], reading wall-clock time from `now`.
    pub fn run_with_clock(&mut self, now: impl FnMut() -> Instant) -> Result<u64> {
        info!("Starting capture from {}", self.source.describe());
        self.source.start()?;

        let result = self.run_loop(now);

        if let Err(e) = self.source.stop() {
            warn!("Failed to stop capture source: {}", e);
        }
        result
    }

    fn run_loop(&mut self, mut now: impl FnMut() -> Instant) -> Result<u64> {
        let mut meter = FrequencyMeter::new(now());
        let mut frames = 0u64;

        while !self.should_stop.load(Ordering::SeqCst) {
            if self.max_frames.is_some_and(|limit| frames >= limit) {
                debug!("Frame limit of {} reached", frames);
                break;
            }

            let frame_set = self.source.wait_for_frames(self.frame_timeout)?;
            let frequency = meter.tick(now());
            self.draw(&frame_set, frequency)?;
            frames += 1;
        }

        info!("Monitor stopped after {} frames", frames);
        Ok(frames)
    }

    /// Draw one frame set
    pub fn draw(&mut self, frame_set: &FrameSet, frequency: Option<f32>) -> Result<()> {
        let sample = MotionSample::from_frames(frame_set)?;
        trace!(
            accel_x = sample.accel.x,
            accel_y = sample.accel.y,
            accel_z = sample.accel.z,
            gyro_x = sample.gyro.x,
            gyro_y = sample.gyro.y,
            gyro_z = sample.gyro.z,
            "motion sample"
        );
        self.dashboard.render(&sample, frequency)?;
        Ok(())
    }

    pub fn into_dashboard(self) -> Dashboard<W> {
        self.dashboard
    }
}

/// Set the stop flag on SIGINT or SIGTERM. A second SIGINT while the flag is
/// already set terminates the process immediately.
pub fn setup_signal_handler(stop_signal: Arc<AtomicBool>) -> Result<()> {
    for signal in [SIGINT, SIGTERM] {
        signal_hook::flag::register_conditional_shutdown(signal, 1, Arc::clone(&stop_signal))
            .map_err(|e| ServiceError::SignalError(e.to_string()))?;
        signal_hook::flag::register(signal, Arc::clone(&stop_signal))
            .map_err(|e| ServiceError::SignalError(e.to_string()))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::{MockCaptureSource, MotionVector, StreamKind};
    use crate::error::{AppError, CaptureError};
    use chrono::Utc;
    use mockall::Sequence;

    const FRAME_PERIOD: Duration = Duration::from_nanos(33_333_333);

    fn resting_frames() -> FrameSet {
        MotionSample {
            accel: MotionVector::new(0.0, 0.0, 9.8),
            gyro: MotionVector::new(0.0, 0.0, 0.0),
        }
        .into_frame_set(0, Utc::now())
    }

    /// Clock that advances one 30 Hz frame period per reading
    fn thirty_hz_clock() -> impl FnMut() -> Instant {
        let base = Instant::now();
        let mut ticks = 0u32;
        move || {
            let t = base + FRAME_PERIOD * ticks;
            ticks += 1;
            t
        }
    }

    fn monitor(source: MockCaptureSource) -> MotionMonitor<Vec<u8>> {
        MotionMonitor::new(
            Box::new(source),
            Dashboard::new(Vec::new(), true),
            Duration::from_millis(15000),
        )
    }

    #[test]
    fn test_frequency_meter() {
        let start = Instant::now();
        let mut meter = FrequencyMeter::new(start);

        let hz = meter.tick(start + Duration::from_millis(5)).unwrap();
        assert!((hz - 200.0).abs() < 0.01);

        let hz = meter.tick(start + Duration::from_millis(15)).unwrap();
        assert!((hz - 100.0).abs() < 0.01);
    }

    #[test]
    fn test_frequency_meter_zero_elapsed() {
        let start = Instant::now();
        let mut meter = FrequencyMeter::new(start);
        assert_eq!(meter.tick(start), None);

        // A clock that goes backwards saturates to zero elapsed time.
        let mut meter = FrequencyMeter::new(start + Duration::from_millis(10));
        assert_eq!(meter.tick(start), None);
    }

    #[test]
    fn test_thirty_hz_end_to_end() {
        let mut source = MockCaptureSource::new();
        source.expect_describe().return_const("mock".to_string());
        source.expect_start().times(1).returning(|| Ok(()));
        source
            .expect_wait_for_frames()
            .times(3)
            .returning(|_| Ok(resting_frames()));
        source.expect_stop().times(1).returning(|| Ok(()));

        let mut monitor = monitor(source).with_frame_limit(Some(3));
        let frames = monitor.run_with_clock(thirty_hz_clock()).unwrap();
        assert_eq!(frames, 3);

        let output = String::from_utf8(monitor.into_dashboard().into_inner()).unwrap();
        let last_frame = output.rsplit("\x1b[2J\x1b[1;1H").next().unwrap();

        assert!(last_frame.starts_with("frequency: 30.0Hz"));
        let gauge_lines = last_frame
            .lines()
            .filter(|line| line.contains("|  value: "))
            .count();
        assert_eq!(gauge_lines, 6);
        assert!(last_frame.contains("value: 9.800000"));
        assert_eq!(output.matches("\x1b[2J").count(), 3);
    }

    #[test]
    fn test_capture_fault_aborts_loop() {
        let mut source = MockCaptureSource::new();
        let mut seq = Sequence::new();
        source.expect_describe().return_const("mock".to_string());
        source.expect_start().times(1).returning(|| Ok(()));
        source
            .expect_wait_for_frames()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(resting_frames()));
        source
            .expect_wait_for_frames()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Err(CaptureError::new("wait_for_frames", "15000", "device disconnected")));
        source.expect_stop().times(1).returning(|| Ok(()));

        let mut monitor = monitor(source);
        let err = monitor.run_with_clock(thirty_hz_clock()).unwrap_err();

        match err {
            AppError::Capture(fault) => {
                assert_eq!(fault.function, "wait_for_frames");
                assert_eq!(fault.message, "device disconnected");
            }
            other => panic!("expected capture fault, got {:?}", other),
        }
    }

    #[test]
    fn test_start_fault_skips_stop() {
        let mut source = MockCaptureSource::new();
        source.expect_describe().return_const("mock".to_string());
        source
            .expect_start()
            .times(1)
            .returning(|| Err(CaptureError::new("start", "", "No device connected")));
        source.expect_wait_for_frames().never();
        source.expect_stop().never();

        let err = monitor(source).run().unwrap_err();
        assert!(err.is_capture_fault());
    }

    #[test]
    fn test_missing_gyro_is_capture_fault() {
        let accel_only = FrameSet::new(
            resting_frames()
                .first_or_default(StreamKind::Accel)
                .cloned()
                .into_iter()
                .collect(),
        );

        let mut source = MockCaptureSource::new();
        source.expect_describe().return_const("mock".to_string());
        source.expect_start().returning(|| Ok(()));
        source
            .expect_wait_for_frames()
            .returning(move |_| Ok(accel_only.clone()));
        source.expect_stop().returning(|| Ok(()));

        let err = monitor(source).run().unwrap_err();
        assert!(err.to_string().starts_with("Capture error calling first_or_default(GYRO)"));
    }

    #[test]
    fn test_stop_flag_ends_loop_cleanly() {
        let mut source = MockCaptureSource::new();
        source.expect_describe().return_const("mock".to_string());
        source.expect_start().returning(|| Ok(()));
        source.expect_wait_for_frames().never();
        source.expect_stop().times(1).returning(|| Ok(()));

        let mut monitor = monitor(source);
        monitor.request_stop();
        assert_eq!(monitor.run().unwrap(), 0);
    }

    #[test]
    fn test_stop_failure_does_not_mask_result() {
        let mut source = MockCaptureSource::new();
        source.expect_describe().return_const("mock".to_string());
        source.expect_start().returning(|| Ok(()));
        source
            .expect_wait_for_frames()
            .returning(|_| Ok(resting_frames()));
        source
            .expect_stop()
            .returning(|| Err(CaptureError::new("stop", "", "device busy")));

        let mut monitor = monitor(source).with_frame_limit(Some(2));
        assert_eq!(monitor.run().unwrap(), 2);
    }

    #[test]
    fn test_simulated_source_end_to_end() {
        let source = crate::capture::SimulatedImu::new(500.0).unwrap();
        let mut monitor = MotionMonitor::new(
            Box::new(source),
            Dashboard::new(Vec::new(), false),
            Duration::from_millis(1000),
        )
        .with_frame_limit(Some(4));

        assert_eq!(monitor.run().unwrap(), 4);
        let output = String::from_utf8(monitor.into_dashboard().into_inner()).unwrap();
        assert_eq!(output.matches("accelerometer:").count(), 4);
    }
}
