use std::fs::File;
use std::io::{BufReader, BufWriter, Seek, Write};
use std::path::{Path, PathBuf};

use num_traits::AsPrimitive;
use tiff::decoder::{Decoder, DecodingResult, Limits};
use tiff::encoder::{colortype, TiffEncoder, TiffValue};
use tiff::tags::Tag;
use tiff::ColorType;
use tracing::{debug, info};

use super::{Dimensions, GeoMetadata, RasterSink, RasterSource};
use crate::band::Rgba;
use crate::config::{OutputPaths, OutputShape};
use crate::error::{Error, Result, SourceOpenError};

/// Value written as GDAL no-data on outputs that use zero for "nothing here".
const NODATA: &str = "0";

// =============================================================================
// Source
// =============================================================================

/// One band of a TIFF/GeoTIFF file, decoded lazily by [`RasterSource::read_band`].
pub struct TiffSource {
    path: PathBuf,
    decoder: Decoder<BufReader<File>>,
    dimensions: Dimensions,
    samples_per_pixel: u16,
    band: u16,
    geo: GeoMetadata,
}

impl TiffSource {
    /// Opens `path` and reads its header. `band` is 1-based.
    pub fn open(path: impl AsRef<Path>, band: u16) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let open_error = |source: SourceOpenError| Error::SourceOpen {
            path: path.clone(),
            source,
        };

        let file = File::open(&path).map_err(|e| open_error(e.into()))?;
        // Unlimited: rasters from production runs routinely exceed the default decoder limits.
        let mut decoder = Decoder::new(BufReader::new(file))
            .map_err(|e| open_error(e.into()))?
            .with_limits(Limits::unlimited());

        let (width, height) = decoder.dimensions().map_err(|e| open_error(e.into()))?;
        let color_type = decoder.colortype().map_err(|e| open_error(e.into()))?;
        let samples_per_pixel = samples_per_pixel(color_type)
            .ok_or_else(|| open_error(SourceOpenError::UnsupportedColorType(color_type)))?;

        if band == 0 || band > samples_per_pixel {
            return Err(Error::BandOutOfRange {
                path,
                band,
                available: samples_per_pixel,
            });
        }

        let geo = GeoMetadata::read(&mut decoder).map_err(Error::backend(&path))?;

        debug!(
            path = %path.display(),
            width,
            height,
            ?color_type,
            band,
            "Opened raster"
        );

        Ok(Self {
            path,
            decoder,
            dimensions: Dimensions::new(width, height),
            samples_per_pixel,
            band,
            geo,
        })
    }

    pub fn band_count(&self) -> u16 {
        self.samples_per_pixel
    }
}

impl RasterSource for TiffSource {
    fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    fn geo(&self) -> &GeoMetadata {
        &self.geo
    }

    fn read_band(&mut self) -> Result<Vec<f32>> {
        let image = self
            .decoder
            .read_image()
            .map_err(Error::backend(&self.path))?;

        let samples = self.samples_per_pixel as usize;
        let band = self.band as usize - 1;
        let values = match &image {
            DecodingResult::U8(buf) => band_as_f32(buf, samples, band),
            DecodingResult::U16(buf) => band_as_f32(buf, samples, band),
            DecodingResult::U32(buf) => band_as_f32(buf, samples, band),
            DecodingResult::U64(buf) => band_as_f32(buf, samples, band),
            DecodingResult::I8(buf) => band_as_f32(buf, samples, band),
            DecodingResult::I16(buf) => band_as_f32(buf, samples, band),
            DecodingResult::I32(buf) => band_as_f32(buf, samples, band),
            DecodingResult::I64(buf) => band_as_f32(buf, samples, band),
            DecodingResult::F32(buf) => band_as_f32(buf, samples, band),
            DecodingResult::F64(buf) => band_as_f32(buf, samples, band),
            DecodingResult::F16(buf) => extract_band(buf, samples, band, |v| v.to_f32()),
        };

        if values.len() != self.dimensions.pixel_count() {
            return Err(Error::RasterIo {
                path: self.path.clone(),
                source: std::io::Error::new(
                    std::io::ErrorKind::InvalidData,
                    format!(
                        "decoded {} values for a {} raster",
                        values.len(),
                        self.dimensions
                    ),
                ),
            });
        }

        Ok(values)
    }
}

fn samples_per_pixel(color_type: ColorType) -> Option<u16> {
    match color_type {
        ColorType::Gray(_) => Some(1),
        ColorType::GrayA(_) => Some(2),
        ColorType::RGB(_) => Some(3),
        ColorType::RGBA(_) | ColorType::CMYK(_) => Some(4),
        ColorType::Multiband { num_samples, .. } => Some(num_samples),
        _ => None,
    }
}

fn band_as_f32<T: AsPrimitive<f32>>(buf: &[T], samples: usize, band: usize) -> Vec<f32> {
    extract_band(buf, samples, band, |v| v.as_())
}

/// Picks sample `band` out of every interleaved pixel of `buf`.
fn extract_band<T: Copy>(
    buf: &[T],
    samples: usize,
    band: usize,
    convert: impl Fn(T) -> f32,
) -> Vec<f32> {
    debug_assert!(band < samples);
    buf.chunks_exact(samples)
        .map(|pixel| convert(pixel[band]))
        .collect()
}

// =============================================================================
// Sink
// =============================================================================

/// Writes the visualization and diagnostic rasters as GeoTIFF files.
#[derive(Clone, Debug)]
pub struct TiffSink {
    visualization: PathBuf,
    diagnostic: PathBuf,
    shape: OutputShape,
}

impl TiffSink {
    pub fn new(paths: &OutputPaths, shape: OutputShape) -> Self {
        Self {
            visualization: paths.visualization.clone(),
            diagnostic: paths.diagnostic.clone(),
            shape,
        }
    }
}

impl RasterSink for TiffSink {
    fn write_visualization(
        &mut self,
        dimensions: Dimensions,
        colors: &[Rgba],
        geo: &GeoMetadata,
    ) -> Result<()> {
        match self.shape {
            OutputShape::Rgba => write_tiff::<colortype::RGBA8>(
                &self.visualization,
                dimensions,
                bytemuck::cast_slice(colors),
                geo,
                Some(NODATA),
            ),
            OutputShape::Rgb => {
                let rgb: Vec<u8> = colors.iter().flat_map(|c| [c.r, c.g, c.b]).collect();
                write_tiff::<colortype::RGB8>(&self.visualization, dimensions, &rgb, geo, None)
            }
        }
    }

    fn write_diagnostic(
        &mut self,
        dimensions: Dimensions,
        rel_diff_ppm: &[f32],
        geo: &GeoMetadata,
    ) -> Result<()> {
        write_f32_band(&self.diagnostic, dimensions, rel_diff_ppm, geo)
    }
}

/// Writes a single-band `f32` GeoTIFF with GDAL no-data `0`, the layout of
/// the diagnostic output.
pub fn write_f32_band(
    path: &Path,
    dimensions: Dimensions,
    values: &[f32],
    geo: &GeoMetadata,
) -> Result<()> {
    write_tiff::<colortype::Gray32Float>(path, dimensions, values, geo, Some(NODATA))
}

fn write_tiff<CT>(
    path: &Path,
    dimensions: Dimensions,
    data: &[CT::Inner],
    geo: &GeoMetadata,
    nodata: Option<&str>,
) -> Result<()>
where
    CT: colortype::ColorType,
    [CT::Inner]: TiffValue,
{
    info!(path = %path.display(), %dimensions, "Writing file");
    let file = File::create(path).map_err(Error::raster_io(path))?;
    let mut writer = BufWriter::new(file);
    encode::<CT, _>(&mut writer, dimensions, data, geo, nodata).map_err(Error::backend(path))?;
    writer.flush().map_err(Error::raster_io(path))
}

fn encode<CT, W>(
    writer: &mut W,
    dimensions: Dimensions,
    data: &[CT::Inner],
    geo: &GeoMetadata,
    nodata: Option<&str>,
) -> tiff::TiffResult<()>
where
    CT: colortype::ColorType,
    [CT::Inner]: TiffValue,
    W: Write + Seek,
{
    let mut encoder = TiffEncoder::new(writer)?;
    let mut image = encoder.new_image::<CT>(dimensions.width, dimensions.height)?;
    geo.write(image.encoder())?;
    if let Some(nodata) = nodata {
        image.encoder().write_tag(Tag::GdalNodata, nodata)?;
    }
    image.write_data(data)
}
