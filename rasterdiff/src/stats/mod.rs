//! Aggregate statistics over a finished diff pass.
//!
//! The sample sequence is sorted in place by `|rel_diff|`, descending, and all
//! derived figures are read from that order. The sort is unstable: samples with
//! equal magnitude come out in no particular order.
//!
//! The median figure is deliberately not a true median. It indexes the
//! sequence sorted over *all* pixels at `count_nonzero / 2`, which keeps it
//! comparable with historical reports but biases it towards larger
//! differences whenever zero-difference pixels exist.

use rayon::prelude::*;
use serde::Serialize;

use crate::sample::{PixelSample, PPM};

#[cfg(test)]
mod tests;

/// Number of worst pixels reported after sorting.
pub const DEFAULT_TOP_N: usize = 10;

/// Final figures of one comparison run.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RunStats {
    pub bad_pixel_count: usize,
    pub total_pixels: usize,
    pub sum_abs_rel_diff_nonzero: f64,
    pub count_nonzero: usize,
    /// `None` when no pixel has a nonzero relative difference.
    pub nonzero: Option<NonzeroStats>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NonzeroStats {
    /// Mean of `|rel_diff|` over pixels with `rel_diff != 0`.
    pub average: f64,
    /// `rel_diff * 1e6` of the sorted sample at index `count_nonzero / 2`.
    pub median_estimate_ppm: f64,
    /// The first `min(top_n, total_pixels)` sorted samples.
    pub top: Vec<PixelSample>,
}

impl RunStats {
    pub fn bad_pct(&self) -> f64 {
        100.0 * ratio(self.bad_pixel_count, self.total_pixels)
    }

    pub fn bad_ppm(&self) -> f64 {
        PPM * ratio(self.bad_pixel_count, self.total_pixels)
    }

    pub fn nonzero_pct(&self) -> f64 {
        100.0 * ratio(self.count_nonzero, self.total_pixels)
    }
}

impl NonzeroStats {
    pub fn avg_pct(&self) -> f64 {
        self.average * 100.0
    }

    pub fn avg_ppm(&self) -> f64 {
        self.average * PPM
    }
}

/// `count / total`, or 0 for an empty raster.
#[inline]
pub(crate) fn ratio(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64
    }
}

#[derive(Clone, Copy, Debug)]
pub struct StatsAggregator {
    bad_pixel_count: usize,
    total_pixels: usize,
    top_n: usize,
}

impl StatsAggregator {
    pub fn new(bad_pixel_count: usize, total_pixels: usize) -> Self {
        Self {
            bad_pixel_count,
            total_pixels,
            top_n: DEFAULT_TOP_N,
        }
    }

    pub fn with_top_n(mut self, top_n: usize) -> Self {
        self.top_n = top_n;
        self
    }

    /// Sorts `samples` and derives the run statistics from the sorted order.
    pub fn aggregate(&self, samples: &mut [PixelSample]) -> RunStats {
        debug_assert_eq!(samples.len(), self.total_pixels);

        sort_by_magnitude(samples);
        let (sum, count) = nonzero_totals(samples);

        let nonzero = (count > 0).then(|| NonzeroStats {
            average: sum / count as f64,
            median_estimate_ppm: samples[count / 2].rel_diff_ppm(),
            top: top_n(samples, self.top_n).to_vec(),
        });

        RunStats {
            bad_pixel_count: self.bad_pixel_count,
            total_pixels: self.total_pixels,
            sum_abs_rel_diff_nonzero: sum,
            count_nonzero: count,
            nonzero,
        }
    }
}

/// Sorts by `|rel_diff|`, largest first. NaN magnitudes sort ahead of everything.
pub fn sort_by_magnitude(samples: &mut [PixelSample]) {
    samples.par_sort_unstable_by(|a, b| b.rel_diff.abs().total_cmp(&a.rel_diff.abs()));
}

/// Sum of `|rel_diff|` and count over samples with `rel_diff != 0`.
pub fn nonzero_totals(samples: &[PixelSample]) -> (f64, usize) {
    samples
        .iter()
        .filter(|s| s.rel_diff != 0.0)
        .fold((0.0, 0), |(sum, count), s| (sum + s.magnitude(), count + 1))
}

/// Leading `min(n, len)` samples of a sorted sequence.
pub fn top_n(sorted: &[PixelSample], n: usize) -> &[PixelSample] {
    &sorted[..n.min(sorted.len())]
}
