//! Run configuration.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::{Error, Result};
use crate::stats::DEFAULT_TOP_N;

// =============================================================================
// Output layout
// =============================================================================

/// Channel layout of the visualization raster.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum OutputShape {
    /// Four bands, transparent where there is no difference, GDAL no-data `0`.
    #[default]
    Rgba,
    /// Three bands, no alpha and no no-data tag.
    Rgb,
}

/// How output file names are chosen.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputNaming {
    /// `<stem>_clr_diff<ext>`, `<stem>_rel_diff<ext>`, `<stem>_pixel_diffs.txt`
    /// after the comparison file.
    #[default]
    Derived,
    /// `clr_diff.tif`, `rel_diff.tif`, `pixel_diffs.txt`.
    Fixed,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct OutputPaths {
    pub visualization: PathBuf,
    pub diagnostic: PathBuf,
    pub detail: PathBuf,
}

impl OutputPaths {
    pub fn new(comparison: &Path, output_dir: &Path, naming: OutputNaming) -> Self {
        match naming {
            OutputNaming::Fixed => Self {
                visualization: output_dir.join("clr_diff.tif"),
                diagnostic: output_dir.join("rel_diff.tif"),
                detail: output_dir.join("pixel_diffs.txt"),
            },
            OutputNaming::Derived => {
                let stem = comparison
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_default();
                let ext = comparison
                    .extension()
                    .map(|e| format!(".{}", e.to_string_lossy()))
                    .unwrap_or_default();
                Self {
                    visualization: output_dir.join(format!("{stem}_clr_diff{ext}")),
                    diagnostic: output_dir.join(format!("{stem}_rel_diff{ext}")),
                    detail: output_dir.join(format!("{stem}_pixel_diffs.txt")),
                }
            }
        }
    }
}

// =============================================================================
// Comparison options
// =============================================================================

/// Options for the buffer-level comparison.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CompareOptions {
    /// Number of worst pixels written to the detail log after sorting.
    pub top_n: usize,
}

impl Default for CompareOptions {
    fn default() -> Self {
        Self {
            top_n: DEFAULT_TOP_N,
        }
    }
}

// =============================================================================
// Run configuration
// =============================================================================

#[derive(Clone, Debug, PartialEq)]
pub struct RunConfig {
    pub golden: PathBuf,
    pub comparison: PathBuf,
    pub output_dir: PathBuf,
    /// 1-based band index read from the golden raster.
    pub golden_band: u16,
    /// 1-based band index read from the comparison raster.
    pub comparison_band: u16,
    /// Write the per-pixel detail log.
    pub pixel_detail: bool,
    pub shape: OutputShape,
    pub naming: OutputNaming,
    pub calibration_strip: bool,
    pub compare: CompareOptions,
    pub summary_json: Option<PathBuf>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            golden: PathBuf::new(),
            comparison: PathBuf::new(),
            output_dir: PathBuf::new(),
            golden_band: 1,
            comparison_band: 1,
            pixel_detail: false,
            shape: OutputShape::default(),
            naming: OutputNaming::default(),
            calibration_strip: true,
            compare: CompareOptions::default(),
            summary_json: None,
        }
    }
}

impl RunConfig {
    pub fn new(
        golden: impl Into<PathBuf>,
        comparison: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            golden: golden.into(),
            comparison: comparison.into(),
            output_dir: output_dir.into(),
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        let paths = [
            ("golden", &self.golden),
            ("comparison", &self.comparison),
            ("output directory", &self.output_dir),
        ];
        for (name, path) in paths {
            if path.as_os_str().is_empty() {
                return Err(Error::Usage(format!("{name} path must not be empty")));
            }
        }
        if self.golden_band == 0 || self.comparison_band == 0 {
            return Err(Error::Usage(format!(
                "band indices are 1-based, got golden = {}, comparison = {}",
                self.golden_band, self.comparison_band
            )));
        }
        Ok(())
    }

    pub fn output_paths(&self) -> OutputPaths {
        OutputPaths::new(&self.comparison, &self.output_dir, self.naming)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derived_names_follow_comparison_file() {
        let paths = OutputPaths::new(
            Path::new("/data/run2/tile_07.tif"),
            Path::new("/out"),
            OutputNaming::Derived,
        );
        assert_eq!(paths.visualization, Path::new("/out/tile_07_clr_diff.tif"));
        assert_eq!(paths.diagnostic, Path::new("/out/tile_07_rel_diff.tif"));
        assert_eq!(paths.detail, Path::new("/out/tile_07_pixel_diffs.txt"));
    }

    #[test]
    fn test_derived_names_keep_input_extension() {
        let paths = OutputPaths::new(
            Path::new("scene.TIFF"),
            Path::new("out"),
            OutputNaming::Derived,
        );
        assert_eq!(paths.visualization, Path::new("out/scene_clr_diff.TIFF"));
        assert_eq!(paths.detail, Path::new("out/scene_pixel_diffs.txt"));
    }

    #[test]
    fn test_derived_names_without_extension() {
        let paths = OutputPaths::new(Path::new("raw"), Path::new("out"), OutputNaming::Derived);
        assert_eq!(paths.visualization, Path::new("out/raw_clr_diff"));
        assert_eq!(paths.diagnostic, Path::new("out/raw_rel_diff"));
    }

    #[test]
    fn test_fixed_names_ignore_comparison_file() {
        let paths = OutputPaths::new(
            Path::new("/data/anything.img"),
            Path::new("/out"),
            OutputNaming::Fixed,
        );
        assert_eq!(paths.visualization, Path::new("/out/clr_diff.tif"));
        assert_eq!(paths.diagnostic, Path::new("/out/rel_diff.tif"));
        assert_eq!(paths.detail, Path::new("/out/pixel_diffs.txt"));
    }

    #[test]
    fn test_default_config() {
        let config = RunConfig::default();
        assert_eq!(config.golden_band, 1);
        assert_eq!(config.comparison_band, 1);
        assert_eq!(config.compare.top_n, 10);
        assert_eq!(config.shape, OutputShape::Rgba);
        assert_eq!(config.naming, OutputNaming::Derived);
        assert!(config.calibration_strip);
        assert!(!config.pixel_detail);
    }

    #[test]
    fn test_validate_accepts_complete_config() {
        RunConfig::new("a.tif", "b.tif", "out").validate().unwrap();
    }

    #[test]
    fn test_validate_rejects_empty_paths() {
        let err = RunConfig::new("a.tif", "", "out").validate().unwrap_err();
        assert!(matches!(err, Error::Usage(ref msg) if msg.contains("comparison")));
    }

    #[test]
    fn test_validate_rejects_zero_band() {
        let config = RunConfig {
            comparison_band: 0,
            ..RunConfig::new("a.tif", "b.tif", "out")
        };
        assert!(matches!(config.validate(), Err(Error::Usage(_))));
    }
}
