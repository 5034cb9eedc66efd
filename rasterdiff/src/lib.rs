//! Value-for-value drift comparison of two single-band rasters.
//!
//! A golden raster and a comparison raster of equal size are compared pixel
//! by pixel. Every pixel gets a signed relative difference, a severity color
//! and an entry in the aggregate statistics; the run produces a summary on
//! stdout, an optional per-pixel detail log, an RGBA visualization raster and
//! a single-band `f32` raster of relative differences in ppm.

pub mod band;
pub mod config;
pub mod diff;
pub mod error;
pub mod pipeline;
pub mod raster;
pub mod report;
pub mod sample;
pub mod stats;

pub use band::{Band, Rgba};
pub use config::{CompareOptions, OutputNaming, OutputPaths, OutputShape, RunConfig};
pub use error::{Error, Result, SourceOpenError};
pub use pipeline::{run_files, Comparison, Pipeline, RunSummary};
pub use raster::{Dimensions, GeoMetadata, RasterSink, RasterSource};
pub use report::{DetailSink, ReportEmitter};
pub use sample::PixelSample;
pub use stats::{NonzeroStats, RunStats, StatsAggregator};
