//! Sequencing of a comparison run.
//!
//! [`Pipeline::compare`] works on buffers already in memory;
//! [`Pipeline::run`] adds reading from a [`RasterSource`] and writing to a
//! [`RasterSink`]; [`run_files`] wires GeoTIFF files, the output directory and
//! the optional detail log and summary file around it.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use serde::Serialize;
use tracing::{debug, info};

use crate::band::Rgba;
use crate::config::{CompareOptions, OutputPaths, RunConfig};
use crate::diff::{self, DiffOutput};
use crate::error::{Error, Result};
use crate::raster::{
    apply_calibration_strip, check_dimensions, Dimensions, RasterSink, RasterSource, TiffSink,
    TiffSource,
};
use crate::report::{DetailSink, ReportEmitter};
use crate::stats::{RunStats, StatsAggregator};

/// Buffers and figures of one in-memory comparison.
#[derive(Clone, Debug)]
pub struct Comparison {
    pub dimensions: Dimensions,
    pub colors: Vec<Rgba>,
    pub rel_diff_ppm: Vec<f32>,
    pub stats: RunStats,
}

#[derive(Clone, Copy, Debug)]
pub struct Pipeline {
    options: CompareOptions,
    calibration_strip: bool,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new(CompareOptions::default())
    }
}

impl Pipeline {
    pub fn new(options: CompareOptions) -> Self {
        Self {
            options,
            calibration_strip: true,
        }
    }

    pub fn from_config(config: &RunConfig) -> Self {
        Self::new(config.compare).with_calibration_strip(config.calibration_strip)
    }

    pub fn with_calibration_strip(mut self, enabled: bool) -> Self {
        self.calibration_strip = enabled;
        self
    }

    /// Diff pass, bad-pixel summary, sort, aggregate summary.
    ///
    /// The per-pixel samples are dropped before returning; only the color
    /// and auxiliary buffers and the statistics survive.
    ///
    /// # Panics
    /// Panics if either buffer does not hold exactly `dimensions.pixel_count()` values.
    pub fn compare<S: Write, D: Write + Send>(
        &self,
        golden: &[f32],
        comparison: &[f32],
        dimensions: Dimensions,
        report: &mut ReportEmitter<S, D>,
    ) -> Result<Comparison> {
        let total_pixels = dimensions.pixel_count();
        assert_eq!(
            golden.len(),
            total_pixels,
            "golden buffer does not match {dimensions}"
        );

        let started = Instant::now();
        let DiffOutput {
            mut samples,
            colors,
            rel_diff_ppm,
            bad_pixel_count,
        } = diff::compute(golden, comparison, dimensions.width, report.detail())?;
        debug!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Difference pass"
        );

        report.emit_bad_pixels(bad_pixel_count, total_pixels)?;

        let started = Instant::now();
        let stats = StatsAggregator::new(bad_pixel_count, total_pixels)
            .with_top_n(self.options.top_n)
            .aggregate(&mut samples);
        drop(samples);
        debug!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Sort and aggregate"
        );

        report.emit_aggregate(&stats)?;

        Ok(Comparison {
            dimensions,
            colors,
            rel_diff_ppm,
            stats,
        })
    }

    /// Reads both sources, compares them and writes both outputs to `sink`.
    ///
    /// Georeferencing for the outputs is taken from `comparison`.
    pub fn run<G, C, K, S, D>(
        &self,
        golden: &mut G,
        comparison: &mut C,
        sink: &mut K,
        report: &mut ReportEmitter<S, D>,
    ) -> Result<RunStats>
    where
        G: RasterSource,
        C: RasterSource,
        K: RasterSink,
        S: Write,
        D: Write + Send,
    {
        let dimensions = golden.dimensions();
        check_dimensions(dimensions, comparison.dimensions())?;

        let started = Instant::now();
        let golden_values = golden.read_band()?;
        let comparison_values = comparison.read_band()?;
        debug!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Read input bands"
        );

        let Comparison {
            mut colors,
            rel_diff_ppm,
            stats,
            ..
        } = self.compare(&golden_values, &comparison_values, dimensions, report)?;
        drop(golden_values);
        drop(comparison_values);

        if self.calibration_strip {
            apply_calibration_strip(&mut colors, dimensions);
        }

        let geo = comparison.geo();
        sink.write_visualization(dimensions, &colors, geo)?;
        sink.write_diagnostic(dimensions, &rel_diff_ppm, geo)?;

        Ok(stats)
    }
}

// =============================================================================
// File-based run
// =============================================================================

/// Everything a finished file-based run produced.
#[derive(Clone, Debug, Serialize)]
pub struct RunSummary {
    pub golden: PathBuf,
    pub comparison: PathBuf,
    pub golden_band: u16,
    pub comparison_band: u16,
    pub dimensions: Dimensions,
    pub outputs: OutputPaths,
    pub detail_log: Option<PathBuf>,
    pub stats: RunStats,
}

impl RunSummary {
    pub fn write_json(&self, path: &Path) -> Result<()> {
        let summary_error = |source: io::Error| Error::Summary {
            path: path.to_path_buf(),
            source,
        };
        let file = File::create(path).map_err(summary_error)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, self)
            .map_err(|e| summary_error(io::Error::from(e)))?;
        writer.flush().map_err(summary_error)?;
        Ok(())
    }
}

/// Compares two GeoTIFF files as described by `config`, writing summary
/// lines to `summary`.
pub fn run_files<W: Write>(config: &RunConfig, summary: W) -> Result<RunSummary> {
    config.validate()?;
    info!(
        golden = %config.golden.display(),
        comparison = %config.comparison.display(),
        golden_band = config.golden_band,
        comparison_band = config.comparison_band,
        "Comparing rasters"
    );

    let mut golden = TiffSource::open(&config.golden, config.golden_band)?;
    let mut comparison = TiffSource::open(&config.comparison, config.comparison_band)?;
    let dimensions = golden.dimensions();
    check_dimensions(dimensions, comparison.dimensions())?;
    info!(
        width = dimensions.width,
        height = dimensions.height,
        golden_bands = golden.band_count(),
        comparison_bands = comparison.band_count(),
        "Raster dimensions"
    );

    fs::create_dir_all(&config.output_dir).map_err(Error::raster_io(&config.output_dir))?;
    let paths = config.output_paths();

    let detail = if config.pixel_detail {
        Some(DetailSink::create(&paths.detail)?)
    } else {
        info!("Detailed pixel level difference log will not be generated.");
        None
    };

    let mut report = ReportEmitter::with_detail(summary, detail);
    let mut sink = TiffSink::new(&paths, config.shape);
    let stats = Pipeline::from_config(config).run(
        &mut golden,
        &mut comparison,
        &mut sink,
        &mut report,
    )?;
    report.finish()?;
    info!(
        bad_pct = stats.bad_pct(),
        bad_ppm = stats.bad_ppm(),
        count_nonzero = stats.count_nonzero,
        "Comparison finished"
    );

    let run_summary = RunSummary {
        golden: config.golden.clone(),
        comparison: config.comparison.clone(),
        golden_band: config.golden_band,
        comparison_band: config.comparison_band,
        dimensions,
        detail_log: config.pixel_detail.then(|| paths.detail.clone()),
        outputs: paths,
        stats,
    };

    if let Some(path) = &config.summary_json {
        run_summary.write_json(path)?;
        info!(path = %path.display(), "Wrote run summary");
    }

    Ok(run_summary)
}
