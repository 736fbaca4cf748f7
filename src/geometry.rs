use crate::error::{OvrMergeError, Result};
use crate::raster::RasterTileRef;

/// How far a tile count or pixel offset may stray from a whole number before the input is
/// considered misaligned.
pub(crate) const GRID_TOLERANCE: f64 = 1e-6;

/// Round `value` when it is within [`GRID_TOLERANCE`] of an integer.
pub(crate) fn snap(value: f64) -> Option<f64> {
    let rounded = value.round();
    ((value - rounded).abs() <= GRID_TOLERANCE).then_some(rounded)
}

/// World-space extent of the mosaic.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

/// Extent and tile grid of the mosaic formed by a set of equally sized, equally scaled tiles.
#[derive(Clone, Debug, PartialEq)]
pub struct MosaicGeometry {
    pub bounds: BoundingBox,
    /// Full resolution size of every tile in pixels
    pub tile_width: u32,
    pub tile_height: u32,
    pub pixel_width: f64,
    /// Negative for north-up rasters
    pub pixel_height: f64,
    pub num_x_tiles: u32,
    pub num_y_tiles: u32,
}

impl MosaicGeometry {
    /// Scale and tile size are taken from the first tile; the scanner has already checked that
    /// every tile agrees.
    pub fn compute(tiles: &[RasterTileRef]) -> Result<Self> {
        let first = tiles.first().ok_or(OvrMergeError::NoInputs)?;
        let pixel_width = first.geotransform.pixel_width();
        let pixel_height = first.geotransform.pixel_height();
        let tile_extent_x = f64::from(first.width) * pixel_width;
        let tile_extent_y = f64::from(first.height) * pixel_height;

        let origins_x = tiles.iter().map(|t| t.geotransform.origin_x());
        let origins_y = tiles.iter().map(|t| t.geotransform.origin_y());
        let bounds = BoundingBox {
            min_x: origins_x.clone().fold(f64::INFINITY, f64::min),
            max_x: origins_x.fold(f64::NEG_INFINITY, f64::max) + tile_extent_x,
            min_y: origins_y.clone().fold(f64::INFINITY, f64::min) + tile_extent_y,
            max_y: origins_y.fold(f64::NEG_INFINITY, f64::max),
        };

        let num_x_tiles = tile_count('x', (bounds.max_x - bounds.min_x) / tile_extent_x)?;
        let num_y_tiles = tile_count('y', (bounds.max_y - bounds.min_y) / tile_extent_y)?;

        Ok(Self {
            bounds,
            tile_width: first.width,
            tile_height: first.height,
            pixel_width,
            pixel_height,
            num_x_tiles,
            num_y_tiles,
        })
    }

    /// Canvas size for a pyramid level whose per-tile pages are `level_tile_width` by
    /// `level_tile_height` pixels.
    pub fn level_size(&self, level_tile_width: u32, level_tile_height: u32) -> Result<(u32, u32)> {
        let width = u64::from(level_tile_width) * u64::from(self.num_x_tiles);
        let height = u64::from(level_tile_height) * u64::from(self.num_y_tiles);
        match (u32::try_from(width), u32::try_from(height)) {
            (Ok(width), Ok(height)) => Ok((width, height)),
            _ => Err(OvrMergeError::Inconsistent(format!(
                "merged level would be {width}x{height} pixels, larger than a TIFF page can hold"
            ))),
        }
    }

    pub fn full_resolution_size(&self) -> Result<(u32, u32)> {
        self.level_size(self.tile_width, self.tile_height)
    }
}

fn tile_count(axis: char, ratio: f64) -> Result<u32> {
    let ratio = ratio.abs();
    match snap(ratio) {
        Some(count) if count >= 1.0 && count <= f64::from(u32::MAX) => Ok(count as u32),
        _ => Err(OvrMergeError::MisalignedGrid { axis, ratio }),
    }
}
