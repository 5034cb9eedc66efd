//! Per-pixel comparison record produced by the difference pass.

use serde::Serialize;

/// Scale from a relative difference to parts per million.
pub const PPM: f64 = 1e6;

/// Per-pixel comparison record.
///
/// `rel_diff` is `0.0` both for equal values and for bad pixels (exactly one
/// operand zero); only `bad` tells the two apart.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct PixelSample {
    pub x: u32,
    pub y: u32,
    pub value_golden: f32,
    pub value_comparison: f32,
    pub diff: f32,
    pub rel_diff: f32,
    pub bad: bool,
}

impl PixelSample {
    /// `|rel_diff|` widened to `f64`, the quantity bands and sorting work on.
    #[inline]
    pub fn magnitude(&self) -> f64 {
        self.rel_diff.abs() as f64
    }

    #[inline]
    pub fn rel_diff_ppm(&self) -> f64 {
        self.rel_diff as f64 * PPM
    }
}
