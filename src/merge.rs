use std::path::PathBuf;

use log::info;

use crate::compositor::Compositor;
use crate::config::MergeConfig;
use crate::error::{OvrMergeError, Result};
use crate::geometry::MosaicGeometry;
use crate::raster::RasterTileRef;
use crate::writer::{needs_bigtiff, OverviewWriter};
use crate::{compression, scanner};

/// What a merge produced.
#[derive(Clone, Debug, PartialEq)]
pub struct MergeReport {
    pub tiles: usize,
    pub num_x_tiles: u32,
    pub num_y_tiles: u32,
    /// Merged canvas size of every level, largest first
    pub level_sizes: Vec<(u32, u32)>,
    pub outputs: Vec<PathBuf>,
}

/// Merge the overview pyramids named in `config` into one mosaic overview.
///
/// Levels are composited and written one at a time. Nothing appears at the output path unless
/// every level was written.
pub fn merge(config: &MergeConfig) -> Result<MergeReport> {
    if config.inputs.is_empty() {
        return Err(OvrMergeError::NoInputs);
    }
    info!(
        "merging {} overview files into {}",
        config.inputs.len(),
        config.output.display()
    );

    let tiles = scanner::scan(&config.inputs)?;
    let rasters: Vec<RasterTileRef> = tiles.iter().map(|tile| tile.raster.clone()).collect();
    let geometry = MosaicGeometry::compute(&rasters)?;
    info!(
        "mosaic is {}x{} tiles, bounds {:?}",
        geometry.num_x_tiles, geometry.num_y_tiles, geometry.bounds
    );

    let compositor = Compositor::new(&tiles, &geometry)?;
    let level_sizes = (0..compositor.level_count())
        .map(|level| compositor.level_size(level))
        .collect::<Result<Vec<_>>>()?;

    let first_levels = tiles[0].pyramid.levels();
    let mut uncompressed_bytes = 0u64;
    for (level, &(width, height)) in first_levels.iter().zip(&level_sizes) {
        uncompressed_bytes +=
            u64::from(width) * u64::from(height) * level.format.bytes_per_pixel() as u64;
    }
    let bigtiff = needs_bigtiff(config.bigtiff, uncompressed_bytes);
    let compression = compression::resolve(config.compression, first_levels[0].compression);

    let mut writer = OverviewWriter::create(&config.output, config.layout, compression, bigtiff)?;
    for (level, &(width, height)) in level_sizes.iter().enumerate() {
        let canvas = compositor.compose_level(level)?;
        writer.write_level(&canvas)?;
        info!("level {level}: {width}x{height}");
    }
    let outputs = writer.finish()?;

    Ok(MergeReport {
        tiles: tiles.len(),
        num_x_tiles: geometry.num_x_tiles,
        num_y_tiles: geometry.num_y_tiles,
        level_sizes,
        outputs,
    })
}
