//! Per-pixel difference pass.
//!
//! One parallel sweep over row-aligned chunks computes the signed difference
//! and relative difference of every pixel, classifies it into a color, and
//! records the auxiliary `rel_diff * 1e6` value. Every chunk writes a
//! disjoint range of the three output buffers and returns its own bad-pixel
//! count; the counts are summed.

use std::io::{self, Write};

use common::parallel::ParZipMut;
use rayon::prelude::*;

use crate::band::{self, Rgba};
use crate::report::DetailSink;
use crate::sample::{PixelSample, PPM};


/// Buffers produced by [`compute`], index-aligned with the inputs.
#[derive(Clone, Debug, Default)]
pub struct DiffOutput {
    pub samples: Vec<PixelSample>,
    pub colors: Vec<Rgba>,
    pub rel_diff_ppm: Vec<f32>,
    pub bad_pixel_count: usize,
}

/// Compares one pixel.
///
/// Both zero counts as equal. Exactly one zero makes the pixel bad: its
/// relative difference is undefined and stored as `0.0`. Otherwise
/// `rel_diff = (golden - comparison) / comparison`, in `f32`.
#[inline]
pub fn compare_pixel(x: u32, y: u32, golden: f32, comparison: f32) -> PixelSample {
    let diff = golden - comparison;
    let (rel_diff, bad) = match (golden == 0.0, comparison == 0.0) {
        (true, true) => (0.0, false),
        (true, false) | (false, true) => (0.0, true),
        (false, false) => (diff / comparison, false),
    };
    PixelSample {
        x,
        y,
        value_golden: golden,
        value_comparison: comparison,
        diff,
        rel_diff,
        bad,
    }
}

/// Runs the difference pass over two row-major rasters of `width` columns.
///
/// Bad pixels are written to `detail` as soon as they are found, so their
/// order in the log follows the parallel schedule rather than the raster.
///
/// # Panics
/// Panics if the inputs differ in length, or if `width` is zero or does not
/// divide the input length.
pub fn compute<W: Write + Send>(
    golden: &[f32],
    comparison: &[f32],
    width: u32,
    detail: Option<&DetailSink<W>>,
) -> io::Result<DiffOutput> {
    assert_eq!(
        golden.len(),
        comparison.len(),
        "golden and comparison must have equal length"
    );
    let len = golden.len();
    if len == 0 {
        return Ok(DiffOutput::default());
    }
    assert!(
        width > 0 && len % width as usize == 0,
        "length {len} is not a whole number of rows of width {width}"
    );

    let mut samples = vec![PixelSample::default(); len];
    let mut colors = vec![Rgba::TRANSPARENT; len];
    let mut rel_diff_ppm = vec![0.0f32; len];

    let bad_pixel_count = samples
        .as_mut_slice()
        .par_zip(colors.as_mut_slice())
        .par_zip(rel_diff_ppm.as_mut_slice())
        .par_rows_mut(width as usize)
        .map(|(offset, (samples, colors, aux))| {
            let mut bad = 0usize;
            let outputs = samples.iter_mut().zip(colors.iter_mut()).zip(aux.iter_mut());
            for (i, ((sample, color), aux)) in outputs.enumerate() {
                let index = offset + i;
                let x = (index % width as usize) as u32;
                let y = (index / width as usize) as u32;

                *sample = compare_pixel(x, y, golden[index], comparison[index]);
                *color = band::classify(sample.bad, sample.magnitude());
                *aux = (sample.rel_diff as f64 * PPM) as f32;

                if sample.bad {
                    bad += 1;
                    if let Some(detail) = detail {
                        detail.write_sample(sample)?;
                    }
                }
            }
            Ok::<_, io::Error>(bad)
        })
        .try_reduce(|| 0, |a, b| Ok(a + b))?;

    Ok(DiffOutput {
        samples,
        colors,
        rel_diff_ppm,
        bad_pixel_count,
    })
}
