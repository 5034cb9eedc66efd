//! Raster collaborators around the comparison core: reading one band as
//! `f32`, and writing the visualization and diagnostic outputs.

use std::fmt;

use serde::Serialize;

use crate::band::Rgba;
use crate::error::{Error, Result};

mod geo;
mod geotiff;


pub use geo::GeoMetadata;
pub use geotiff::{write_f32_band, TiffSink, TiffSource};

/// Height of the calibration strip drawn into column 0 of the visualization.
pub const CALIBRATION_STRIP_LEN: u32 = 255;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({} , {})", self.width, self.height)
    }
}

/// Fails with [`Error::DimensionMismatch`] unless both rasters have the same shape.
pub fn check_dimensions(golden: Dimensions, comparison: Dimensions) -> Result<()> {
    if golden != comparison {
        return Err(Error::DimensionMismatch { golden, comparison });
    }
    Ok(())
}

/// A single band of a raster, read in full.
pub trait RasterSource {
    fn dimensions(&self) -> Dimensions;

    fn geo(&self) -> &GeoMetadata;

    /// Reads the selected band as a row-major `width * height` buffer.
    fn read_band(&mut self) -> Result<Vec<f32>>;
}

/// Destination for the two comparison outputs.
pub trait RasterSink {
    fn write_visualization(
        &mut self,
        dimensions: Dimensions,
        colors: &[Rgba],
        geo: &GeoMetadata,
    ) -> Result<()>;

    fn write_diagnostic(
        &mut self,
        dimensions: Dimensions,
        rel_diff_ppm: &[f32],
        geo: &GeoMetadata,
    ) -> Result<()>;
}

/// In-memory band, for callers that already hold decoded data.
#[derive(Clone, Debug, Default)]
pub struct MemoryRaster {
    pub dimensions: Dimensions,
    pub values: Vec<f32>,
    pub geo: GeoMetadata,
}

impl MemoryRaster {
    /// # Panics
    /// Panics if `values.len()` is not `width * height`.
    pub fn new(dimensions: Dimensions, values: Vec<f32>) -> Self {
        assert_eq!(
            values.len(),
            dimensions.pixel_count(),
            "value count must match {dimensions}"
        );
        Self {
            dimensions,
            values,
            geo: GeoMetadata::default(),
        }
    }

    pub fn with_geo(mut self, geo: GeoMetadata) -> Self {
        self.geo = geo;
        self
    }
}

impl RasterSource for MemoryRaster {
    fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    fn geo(&self) -> &GeoMetadata {
        &self.geo
    }

    fn read_band(&mut self) -> Result<Vec<f32>> {
        Ok(self.values.clone())
    }
}

/// Collects outputs in memory instead of writing files.
#[derive(Clone, Debug, Default)]
pub struct MemorySink {
    pub colors: Option<Vec<Rgba>>,
    pub rel_diff_ppm: Option<Vec<f32>>,
    pub geo: Option<GeoMetadata>,
}

impl RasterSink for MemorySink {
    fn write_visualization(
        &mut self,
        _dimensions: Dimensions,
        colors: &[Rgba],
        geo: &GeoMetadata,
    ) -> Result<()> {
        self.colors = Some(colors.to_vec());
        self.geo = Some(geo.clone());
        Ok(())
    }

    fn write_diagnostic(
        &mut self,
        _dimensions: Dimensions,
        rel_diff_ppm: &[f32],
        _geo: &GeoMetadata,
    ) -> Result<()> {
        self.rel_diff_ppm = Some(rel_diff_ppm.to_vec());
        Ok(())
    }
}

/// Paints the legend strip: column 0, rows `0..min(255, height)`, with
/// `r = g = b = row`. Alpha is left untouched.
pub fn apply_calibration_strip(colors: &mut [Rgba], dimensions: Dimensions) {
    debug_assert_eq!(colors.len(), dimensions.pixel_count());
    if dimensions.width == 0 {
        return;
    }

    let width = dimensions.width as usize;
    let rows = dimensions.height.min(CALIBRATION_STRIP_LEN);
    for row in 0..rows {
        let level = row as u8;
        let pixel = &mut colors[row as usize * width];
        pixel.r = level;
        pixel.g = level;
        pixel.b = level;
    }
}
