//! GeoTIFF georeferencing tags, carried from the comparison input to the outputs.

use std::io::{Read, Seek, Write};

use tiff::decoder::Decoder;
use tiff::encoder::{DirectoryEncoder, TiffKind};
use tiff::tags::Tag;
use tiff::TiffResult;

/// Raw georeferencing tags. Values are copied verbatim; nothing is reprojected.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GeoMetadata {
    pub pixel_scale: Option<Vec<f64>>,
    pub tiepoints: Option<Vec<f64>>,
    pub transformation: Option<Vec<f64>>,
    pub key_directory: Option<Vec<u16>>,
    pub double_params: Option<Vec<f64>>,
    pub ascii_params: Option<String>,
}

impl GeoMetadata {
    pub fn is_empty(&self) -> bool {
        self == &GeoMetadata::default()
    }

    pub(crate) fn read<R: Read + Seek>(decoder: &mut Decoder<R>) -> TiffResult<Self> {
        Ok(Self {
            pixel_scale: read_f64s(decoder, Tag::ModelPixelScaleTag)?,
            tiepoints: read_f64s(decoder, Tag::ModelTiepointTag)?,
            transformation: read_f64s(decoder, Tag::ModelTransformationTag)?,
            key_directory: decoder
                .find_tag(Tag::GeoKeyDirectoryTag)?
                .map(|value| value.into_u16_vec())
                .transpose()?,
            double_params: read_f64s(decoder, Tag::GeoDoubleParamsTag)?,
            ascii_params: decoder
                .find_tag(Tag::GeoAsciiParamsTag)?
                .map(|value| value.into_string())
                .transpose()?,
        })
    }

    pub(crate) fn write<W: Write + Seek, K: TiffKind>(
        &self,
        dir: &mut DirectoryEncoder<'_, W, K>,
    ) -> TiffResult<()> {
        let f64_tags = [
            (Tag::ModelPixelScaleTag, &self.pixel_scale),
            (Tag::ModelTiepointTag, &self.tiepoints),
            (Tag::ModelTransformationTag, &self.transformation),
            (Tag::GeoDoubleParamsTag, &self.double_params),
        ];
        for (tag, values) in f64_tags {
            if let Some(values) = values {
                dir.write_tag(tag, &values[..])?;
            }
        }
        if let Some(keys) = &self.key_directory {
            dir.write_tag(Tag::GeoKeyDirectoryTag, &keys[..])?;
        }
        if let Some(ascii) = &self.ascii_params {
            dir.write_tag(Tag::GeoAsciiParamsTag, ascii.as_str())?;
        }
        Ok(())
    }
}

fn read_f64s<R: Read + Seek>(decoder: &mut Decoder<R>, tag: Tag) -> TiffResult<Option<Vec<f64>>> {
    decoder
        .find_tag(tag)?
        .map(|value| value.into_f64_vec())
        .transpose()
}
