use crate::error::{OvrMergeError, Result};
use crate::geometry::{snap, MosaicGeometry};
use crate::raster::RasterTileRef;

/// Top-left corner of a tile inside a merged canvas, in pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct PixelOffset {
    pub x: u32,
    pub y: u32,
}

impl PixelOffset {
    /// Scale a full resolution offset to a pyramid level whose tile pages are
    /// `level_width` x `level_height` for tiles of `tile_width` x `tile_height`.
    ///
    /// Equivalent to `floor(level_width / tile_width * x)`, computed exactly.
    pub fn scale_to_level(
        self,
        tile_width: u32,
        tile_height: u32,
        level_width: u32,
        level_height: u32,
    ) -> Self {
        let scale = |offset: u32, level: u32, full: u32| {
            (u64::from(level) * u64::from(offset) / u64::from(full.max(1))) as u32
        };
        Self {
            x: scale(self.x, level_width, tile_width),
            y: scale(self.y, level_height, tile_height),
        }
    }
}

/// Offset of `tile` in the full resolution mosaic.
pub fn full_resolution_offset(geometry: &MosaicGeometry, tile: &RasterTileRef) -> Result<PixelOffset> {
    let x = (tile.geotransform.origin_x() - geometry.bounds.min_x) / geometry.pixel_width;
    let y = (tile.geotransform.origin_y() - geometry.bounds.max_y) / geometry.pixel_height;
    Ok(PixelOffset {
        x: pixel_index(tile, 'x', x)?,
        y: pixel_index(tile, 'y', y)?,
    })
}

fn pixel_index(tile: &RasterTileRef, axis: char, offset: f64) -> Result<u32> {
    match snap(offset) {
        Some(index) if index >= 0.0 && index <= f64::from(u32::MAX) => Ok(index as u32),
        _ => Err(OvrMergeError::MisalignedTile {
            path: tile.path.clone(),
            axis,
            offset,
        }),
    }
}

/// Offsets of every tile at every level, indexed `[level][tile]`, in input order.
///
/// `level_shapes` are the per-tile page sizes of each pyramid level.
pub fn plan_offsets(
    geometry: &MosaicGeometry,
    tiles: &[RasterTileRef],
    level_shapes: &[(u32, u32)],
) -> Result<Vec<Vec<PixelOffset>>> {
    let full: Vec<PixelOffset> = tiles
        .iter()
        .map(|tile| full_resolution_offset(geometry, tile))
        .collect::<Result<_>>()?;

    Ok(level_shapes
        .iter()
        .map(|&(level_width, level_height)| {
            full.iter()
                .map(|offset| {
                    offset.scale_to_level(
                        geometry.tile_width,
                        geometry.tile_height,
                        level_width,
                        level_height,
                    )
                })
                .collect()
        })
        .collect())
}
