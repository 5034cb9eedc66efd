//! Human-readable output of a comparison run.
//!
//! The summary goes to any [`Write`] (stdout from the CLI). The optional
//! detail log receives one two-line entry per reported pixel; it is shared
//! by reference with the parallel diff pass, so entries are serialized
//! through a lock and each one is written whole.

use std::fmt::Write as _;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use tracing::info;

use crate::error::{Error, Result};
use crate::sample::{PixelSample, PPM};
use crate::stats::{self, RunStats};


/// Relative differences above this are printed as a percentage, the rest in ppm.
const PERCENT_THRESHOLD: f64 = 0.001;

// =============================================================================
// Detail log
// =============================================================================

pub struct DetailSink<W: Write + Send = BufWriter<File>> {
    writer: Mutex<W>,
}

impl DetailSink<BufWriter<File>> {
    /// Creates (truncating) the detail log at `path`.
    pub fn create(path: &Path) -> Result<Self> {
        let file = File::create(path).map_err(|source| Error::DetailSinkOpen {
            path: PathBuf::from(path),
            source,
        })?;
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write + Send> DetailSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    /// Appends one complete entry for `sample`.
    pub fn write_sample(&self, sample: &PixelSample) -> io::Result<()> {
        let entry = format_detail(sample);
        self.writer.lock().write_all(entry.as_bytes())
    }

    pub fn flush(&self) -> io::Result<()> {
        self.writer.lock().flush()
    }

    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }
}

/// Formats a detail entry:
///
/// ```text
/// (     x ,     y) pixel: [golden - comparison] diff: diff  - 1.234567%
/// GGGGGGGG CCCCCCCC
/// ```
///
/// The relative difference is shown as a percentage above 0.1% and in ppm
/// otherwise; the second line holds the raw bits of both values.
pub fn format_detail(sample: &PixelSample) -> String {
    let mut line = String::with_capacity(160);
    // Writing into a String cannot fail.
    let _ = write!(
        line,
        "({:6} , {:5}) pixel: [{:.20} - {:.20}] diff: {:.20} ",
        sample.x, sample.y, sample.value_golden, sample.value_comparison, sample.diff
    );
    if sample.magnitude() > PERCENT_THRESHOLD {
        let _ = writeln!(line, " - {:.6}%", sample.rel_diff * 100.0);
    } else {
        let _ = writeln!(line, " - {:.6} ppm", sample.rel_diff_ppm());
    }
    let _ = writeln!(
        line,
        "{:08X} {:08X}",
        sample.value_golden.to_bits(),
        sample.value_comparison.to_bits()
    );
    line
}

// =============================================================================
// Summary
// =============================================================================

/// Writes summary lines and, when a detail log is attached, detail entries.
pub struct ReportEmitter<S: Write, D: Write + Send = BufWriter<File>> {
    summary: S,
    detail: Option<DetailSink<D>>,
}

impl<S: Write> ReportEmitter<S> {
    pub fn new(summary: S) -> Self {
        Self {
            summary,
            detail: None,
        }
    }
}

impl<S: Write, D: Write + Send> ReportEmitter<S, D> {
    pub fn with_detail(summary: S, detail: Option<DetailSink<D>>) -> Self {
        Self { summary, detail }
    }

    pub fn detail(&self) -> Option<&DetailSink<D>> {
        self.detail.as_ref()
    }

    /// Prints the bad-pixel counts. Runs before sorting.
    pub fn emit_bad_pixels(&mut self, bad_pixel_count: usize, total_pixels: usize) -> Result<()> {
        let share = stats::ratio(bad_pixel_count, total_pixels);
        let (pct, ppm) = (100.0 * share, PPM * share);

        info!(
            bad_pixels = bad_pixel_count,
            total_pixels,
            bad_pct = pct,
            bad_ppm = ppm,
            "Bad pixels"
        );

        writeln!(self.summary, "bad pixels = {bad_pixel_count}")?;
        writeln!(self.summary, "bad pixels = {pct:.6}%")?;
        writeln!(self.summary, "bad pixels = {ppm:.6} ppm")?;
        Ok(())
    }

    /// Writes the top-N detail entries and the nonzero-difference summary.
    pub fn emit_aggregate(&mut self, stats: &RunStats) -> Result<()> {
        let Some(nonzero) = &stats.nonzero else {
            info!("No differences detected");
            writeln!(self.summary, "cnt = {}", stats.count_nonzero)?;
            writeln!(self.summary, "No differences detected")?;
            return Ok(());
        };

        if let Some(detail) = &self.detail {
            for sample in &nonzero.top {
                detail.write_sample(sample)?;
            }
        }

        info!(
            avg_pct = nonzero.avg_pct(),
            avg_ppm = nonzero.avg_ppm(),
            count_nonzero = stats.count_nonzero,
            nonzero_pct = stats.nonzero_pct(),
            median_ppm = nonzero.median_estimate_ppm,
            "Relative differences"
        );

        writeln!(self.summary, "avg rel diff = {:.6}%", nonzero.avg_pct())?;
        writeln!(
            self.summary,
            "avg rel diff = {:.15} ppm, cnt = {}, pct = {:.6}",
            nonzero.avg_ppm(),
            stats.count_nonzero,
            stats.nonzero_pct()
        )?;
        writeln!(
            self.summary,
            "median = {:.6} ppm",
            nonzero.median_estimate_ppm
        )?;
        Ok(())
    }

    /// Flushes both sinks and hands back the underlying writers.
    pub fn finish(mut self) -> Result<(S, Option<D>)> {
        self.summary.flush()?;
        let detail = match self.detail {
            Some(detail) => {
                detail.flush()?;
                Some(detail.into_inner())
            }
            None => None,
        };
        Ok((self.summary, detail))
    }
}
