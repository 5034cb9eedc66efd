//! Error types for a comparison run.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::raster::Dimensions;

/// Exit code for usage, input and report errors.
pub const EXIT_FAILURE: i32 = 1;
/// Exit code for failures inside the raster backend.
pub const EXIT_BACKEND: i32 = 10;

/// Every error here is fatal for the run; nothing is retried.
#[derive(Debug, Error)]
pub enum Error {
    #[error("{0}")]
    Usage(String),

    #[error("Could not open raster '{path}': {source}")]
    SourceOpen {
        path: PathBuf,
        #[source]
        source: SourceOpenError,
    },

    #[error("Dimensions mismatch: golden = {golden}, comparison = {comparison}")]
    DimensionMismatch {
        golden: Dimensions,
        comparison: Dimensions,
    },

    #[error("Raster '{path}' has no band {band} (available: {available})")]
    BandOutOfRange {
        path: PathBuf,
        band: u16,
        available: u16,
    },

    #[error("Could not open detailed pixel difference log '{path}': {source}")]
    DetailSinkOpen {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Raster backend error on '{path}': {source}")]
    RasterBackend {
        path: PathBuf,
        #[source]
        source: tiff::TiffError,
    },

    #[error("Raster I/O error on '{path}': {source}")]
    RasterIo {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to write report: {0}")]
    Report(#[from] io::Error),

    #[error("Failed to write summary '{path}': {source}")]
    Summary {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl Error {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::RasterBackend { .. } | Error::RasterIo { .. } => EXIT_BACKEND,
            Error::Usage(_)
            | Error::SourceOpen { .. }
            | Error::DimensionMismatch { .. }
            | Error::BandOutOfRange { .. }
            | Error::DetailSinkOpen { .. }
            | Error::Report(_)
            | Error::Summary { .. } => EXIT_FAILURE,
        }
    }

    pub(crate) fn backend(path: impl Into<PathBuf>) -> impl FnOnce(tiff::TiffError) -> Error {
        let path = path.into();
        move |source| Error::RasterBackend { path, source }
    }

    pub(crate) fn raster_io(path: impl Into<PathBuf>) -> impl FnOnce(io::Error) -> Error {
        let path = path.into();
        move |source| Error::RasterIo { path, source }
    }
}

/// Why an input raster could not be opened.
#[derive(Debug, Error)]
pub enum SourceOpenError {
    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Tiff(#[from] tiff::TiffError),

    #[error("unsupported color type {0:?}")]
    UnsupportedColorType(tiff::ColorType),
}

pub type Result<T> = std::result::Result<T, Error>;
