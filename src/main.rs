//! ovr-merge - merge per-tile external overviews into one mosaic overview

use std::path::PathBuf;
use std::process::ExitCode;

use clap::error::ErrorKind as ClapErrorKind;
use clap::Parser;
use env_logger::{Builder, Env};
use log::info;
use ovr_merge::{merge, BigTiffMode, MergeConfig, OutputCompression, OutputLayout, DEFAULT_OUTPUT};

#[derive(Debug, Parser)]
#[command(name = "ovr-merge", version)]
#[command(about = "Merge the .ovr overview files of GeoTIFF tiles into one mosaic overview")]
#[command(after_help = "Output pages are written as stripped TIFF (64 rows per strip), not tiled.")]
struct Args {
    /// Overview files (<tile>.tif.ovr), each next to its GeoTIFF
    inputs: Vec<PathBuf>,

    /// Output overview file
    #[arg(short = 'o', long = "output", default_value = DEFAULT_OUTPUT)]
    output: PathBuf,

    /// One multi-page file, or one file per level
    #[arg(long, value_enum, default_value_t = OutputLayout::MultiPage)]
    layout: OutputLayout,

    /// Output compression
    #[arg(long, value_enum, default_value_t = OutputCompression::Inherit)]
    compression: OutputCompression,

    /// Write 64-bit offsets
    #[arg(long, value_enum, default_value_t = BigTiffMode::IfNeeded)]
    bigtiff: BigTiffMode,

    /// Log per-tile placement details
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(err) => {
            let _ = err.print();
            return match err.kind() {
                ClapErrorKind::DisplayHelp | ClapErrorKind::DisplayVersion => ExitCode::SUCCESS,
                _ => ExitCode::FAILURE,
            };
        }
    };

    let default_filter = if args.verbose { "debug" } else { "info" };
    let mut builder = Builder::from_env(Env::default().default_filter_or(default_filter));
    builder.format_timestamp_secs();
    builder.init();

    let config = MergeConfig::new(args.inputs)
        .with_output(args.output)
        .with_layout(args.layout)
        .with_compression(args.compression)
        .with_bigtiff(args.bigtiff);

    match merge(&config) {
        Ok(report) => {
            info!(
                "merged {} tiles ({}x{}) into {} level(s)",
                report.tiles,
                report.num_x_tiles,
                report.num_y_tiles,
                report.level_sizes.len()
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("Error: {err}");
            ExitCode::FAILURE
        }
    }
}
