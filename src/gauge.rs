//! Fixed-width ASCII gauge for a bounded scalar reading.
//!
//! The gauge is `2 * half_width + 1` cells wide. The filled region runs from
//! the zero reference at the midpoint to the cell of the current value, so a
//! reading of 0 fills only the midpoint cell.

/// Gauge geometry: value range and half-width in characters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GaugeConfig {
    pub min: f32,
    pub max: f32,
    pub half_width: usize,
}

/// Filled region of a gauge, in cell indices. Both ends are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GaugeSpan {
    pub start: usize,
    pub end: usize,
}

const FILL: &str = "X";

impl GaugeConfig {
    /// Range [-12, 12] with a 45-character half-width.
    pub const STANDARD: GaugeConfig = GaugeConfig {
        min: -12.0,
        max: 12.0,
        half_width: 45,
    };

    /// Number of cells addressed by the scaled value (`2 * half_width`).
    pub const fn full_width(&self) -> usize {
        self.half_width * 2
    }

    /// Compute the filled span for `value`.
    ///
    /// A NaN reading has no position on the scale and fills only the
    /// midpoint cell.
    pub fn span(&self, value: f32) -> GaugeSpan {
        let midpoint = self.half_width;
        if value.is_nan() {
            return GaugeSpan {
                start: midpoint,
                end: midpoint,
            };
        }

        let v = value.clamp(self.min, self.max);
        let p = (v - self.min) / (self.max - self.min);
        let mut n1 = (self.full_width() as f32 * p).floor() as usize;
        let mut n2 = midpoint;
        if n1 > n2 {
            std::mem::swap(&mut n1, &mut n2);
        }

        GaugeSpan { start: n1, end: n2 }
    }

    /// Render `value` as one gauge line, e.g.
    /// `-12 [      XXXX     ] 12  |  value: -1.500000`.
    pub fn render(&self, value: f32) -> String {
        let span = self.span(value);
        format!(
            "{} [{}{}{}] {}  |  value: {:.6}",
            self.min as i32,
            " ".repeat(span.start),
            FILL.repeat(span.end - span.start + 1),
            " ".repeat(self.full_width() - span.end),
            self.max as i32,
            value
        )
    }
}

impl Default for GaugeConfig {
    fn default() -> Self {
        Self::STANDARD
    }
}

/// Render `value` with the standard gauge.
pub fn to_gauge(value: f32) -> String {
    GaugeConfig::STANDARD.render(value)
}
