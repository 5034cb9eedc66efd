use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, warn};

use common::log_setup::setup_logging;
use rasterdiff::error::EXIT_FAILURE;
use rasterdiff::{run_files, CompareOptions, OutputNaming, OutputShape, RunConfig};

/// Keyword that enables the per-pixel detail log.
const PIXEL_DETAIL_KEYWORD: &str = "pix";

/// Compare two rasters value for value and report numerical drift.
#[derive(Parser, Debug)]
#[command(name = "rasterdiff")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Reference raster
    golden: PathBuf,

    /// Raster checked against the reference
    comparison: PathBuf,

    /// Directory receiving the output rasters and the detail log
    output_dir: PathBuf,

    /// Pass `pix` to write the per-pixel detail log
    pix: Option<String>,

    /// 1-based band read from the golden raster
    #[arg(long, default_value_t = 1)]
    golden_band: u16,

    /// 1-based band read from the comparison raster
    #[arg(long, default_value_t = 1)]
    comparison_band: u16,

    /// Channel layout of the visualization raster
    #[arg(long, value_enum, default_value_t = OutputShape::Rgba)]
    shape: OutputShape,

    /// Use clr_diff.tif, rel_diff.tif and pixel_diffs.txt as output names
    #[arg(long)]
    fixed_names: bool,

    /// Leave column 0 of the visualization unmodified
    #[arg(long)]
    no_calibration_strip: bool,

    /// Number of largest differences written to the detail log
    #[arg(long, default_value_t = rasterdiff::stats::DEFAULT_TOP_N)]
    top: usize,

    /// Also write the run summary as JSON to this file
    #[arg(long)]
    summary_json: Option<PathBuf>,

    /// Log level when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Directory for rolling log files
    #[arg(long)]
    log_dir: Option<PathBuf>,
}

impl Cli {
    fn into_config(self) -> RunConfig {
        let pixel_detail = match self.pix.as_deref() {
            Some(PIXEL_DETAIL_KEYWORD) => true,
            Some(other) => {
                warn!(
                    argument = other,
                    "Unknown fourth argument, expected '{PIXEL_DETAIL_KEYWORD}'"
                );
                false
            }
            None => false,
        };

        RunConfig {
            golden: self.golden,
            comparison: self.comparison,
            output_dir: self.output_dir,
            golden_band: self.golden_band,
            comparison_band: self.comparison_band,
            pixel_detail,
            shape: self.shape,
            naming: if self.fixed_names {
                OutputNaming::Fixed
            } else {
                OutputNaming::Derived
            },
            calibration_strip: !self.no_calibration_strip,
            compare: CompareOptions { top_n: self.top },
            summary_json: self.summary_json,
        }
    }
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            // Help and version requests are not failures.
            let code = if err.use_stderr() { EXIT_FAILURE } else { 0 };
            let _ = err.print();
            return ExitCode::from(code as u8);
        }
    };

    setup_logging(&cli.log_level, "rasterdiff", cli.log_dir.as_deref());

    let config = cli.into_config();
    match run_files(&config, io::stdout().lock()) {
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            ExitCode::from(err.exit_code() as u8)
        }
    }
}
