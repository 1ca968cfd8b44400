//! Terminal rendering of one motion sample per frame.

use crate::capture::{MotionSample, MotionVector};
use crate::error::DisplayError;
use crate::gauge::GaugeConfig;
use crossterm::{
    QueueableCommand, cursor,
    terminal::{Clear, ClearType},
};
use std::io::Write;

/// Frequency label, or `N/A` when no time elapsed between frames
pub fn format_frequency(frequency: Option<f32>) -> String {
    match frequency {
        Some(hz) => format!("{:.1}", hz),
        None => "N/A".to_string(),
    }
}

fn push_axes(text: &mut String, gauge: &GaugeConfig, title: &str, v: &MotionVector) {
    text.push_str(&format!("{}:\n", title));
    text.push_str(&format!("x: \t{}\n", gauge.render(v.x)));
    text.push_str(&format!("y: \t{}\n", gauge.render(v.y)));
    text.push_str(&format!("z: \t{}\n", gauge.render(v.z)));
}

/// Body of one frame, without the clear-screen prefix
pub fn format_frame(gauge: &GaugeConfig, sample: &MotionSample, frequency: Option<f32>) -> String {
    let mut text = format!("frequency: {}Hz\n\n", format_frequency(frequency));
    push_axes(&mut text, gauge, "accelerometer", &sample.accel);
    text.push('\n');
    push_axes(&mut text, gauge, "gyro", &sample.gyro);
    text
}

/// Writes gauge frames to a terminal (or any writer)
pub struct Dashboard<W: Write> {
    out: W,
    gauge: GaugeConfig,
    clear_screen: bool,
}

impl<W: Write> Dashboard<W> {
    pub fn new(out: W, clear_screen: bool) -> Self {
        Self {
            out,
            gauge: GaugeConfig::STANDARD,
            clear_screen,
        }
    }

    /// Clear the screen and draw the frequency plus all six gauges
    pub fn render(
        &mut self,
        sample: &MotionSample,
        frequency: Option<f32>,
    ) -> Result<(), DisplayError> {
        if self.clear_screen {
            self.out
                .queue(Clear(ClearType::All))?
                .queue(cursor::MoveTo(0, 0))?;
        }
        self.out
            .write_all(format_frame(&self.gauge, sample, frequency).as_bytes())?;
        self.out.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}
