use log::debug;

use crate::buffer::{PixelBuffer, PixelFormat};
use crate::error::{OvrMergeError, Result};
use crate::geometry::MosaicGeometry;
use crate::overview::PyramidLevel;
use crate::placement::{plan_offsets, PixelOffset};
use crate::raster::RasterTileRef;
use crate::scanner::MosaicTile;

/// Composited pixels of one pyramid level, mosaic sized. Dropped once written.
#[derive(Clone, Debug, PartialEq)]
pub struct MergedCanvas {
    /// Layout shared by every tile's page at this level
    pub format: PixelFormat,
    pub pixels: PixelBuffer,
}

/// Builds the merged canvas of one pyramid level at a time.
pub struct Compositor<'a> {
    tiles: &'a [MosaicTile],
    geometry: &'a MosaicGeometry,
    /// Offsets indexed `[level][tile]`
    offsets: Vec<Vec<PixelOffset>>,
}

impl<'a> Compositor<'a> {
    pub fn new(tiles: &'a [MosaicTile], geometry: &'a MosaicGeometry) -> Result<Self> {
        let rasters: Vec<RasterTileRef> = tiles.iter().map(|tile| tile.raster.clone()).collect();
        let level_shapes: Vec<(u32, u32)> = tiles
            .first()
            .map(|tile| tile.pyramid.levels().iter().map(|level| level.shape()).collect())
            .unwrap_or_default();
        let offsets = plan_offsets(geometry, &rasters, &level_shapes)?;
        Ok(Self {
            tiles,
            geometry,
            offsets,
        })
    }

    pub fn level_count(&self) -> usize {
        self.tiles.first().map_or(0, |tile| tile.pyramid.len())
    }

    /// Merged canvas size of `level`.
    pub fn level_size(&self, level: usize) -> Result<(u32, u32)> {
        let (width, height) = self.level_shape(level)?;
        self.geometry.level_size(width, height)
    }

    fn level_shape(&self, level: usize) -> Result<(u32, u32)> {
        self.first_level(level).map(PyramidLevel::shape)
    }

    fn first_level(&self, level: usize) -> Result<&PyramidLevel> {
        self.tiles
            .first()
            .and_then(|tile| tile.pyramid.levels().get(level))
            .ok_or_else(|| OvrMergeError::Inconsistent(format!("no overview level {level}")))
    }

    /// Decode every tile's page for `level` and paste it at its scaled offset. Tiles are placed
    /// in input order, so a later tile overwrites an earlier one where they overlap.
    pub fn compose_level(&self, level: usize) -> Result<MergedCanvas> {
        let (canvas_width, canvas_height) = self.level_size(level)?;
        let format = self.first_level(level)?.format;
        let offsets = &self.offsets[level];

        let mut canvas: Option<PixelBuffer> = None;
        for (tile, &offset) in self.tiles.iter().zip(offsets) {
            let pixels = tile.pyramid.read_level(level)?;
            debug!(
                "level {level}: {} at ({}, {})",
                tile.pyramid.path.display(),
                offset.x,
                offset.y
            );
            canvas
                .get_or_insert_with(|| pixels.zeros_like(canvas_width, canvas_height))
                .paste(&pixels, offset, &tile.pyramid.path)?;
        }

        let pixels = canvas.ok_or(OvrMergeError::NoInputs)?;
        Ok(MergedCanvas { format, pixels })
    }
}
