//! Merge the external overview pyramids (`.tif.ovr`) of a set of GeoTIFF tiles into one
//! overview file for the mosaic of those tiles.
//!
//! Output pages are written as stripped TIFF (64 rows per strip), not tiled.

mod affine;
mod buffer;
mod compositor;
mod compression;
pub mod config;
pub mod error;
mod geo_key_directory;
mod geometry;
mod header;
mod merge;
mod overview;
mod placement;
mod raster;
mod scanner;
mod writer;

pub use affine::GeoTransform;
pub use buffer::{blit, OutOfBounds, Photometric, PixelBuffer, PixelFormat, SampleType};
pub use compositor::{Compositor, MergedCanvas};
pub use config::{BigTiffMode, MergeConfig, OutputCompression, OutputLayout, DEFAULT_OUTPUT};
pub use error::{ErrorKind, OvrMergeError, Result};
pub use geo_key_directory::{GeoKeyDirectory, RasterType};
pub use geometry::{BoundingBox, MosaicGeometry};
pub use header::{Endianness, TiffHeader};
pub use merge::{merge, MergeReport};
pub use overview::{OverviewPyramid, PyramidLevel};
pub use placement::{full_resolution_offset, plan_offsets, PixelOffset};
pub use raster::{base_raster_path, RasterTileRef};
pub use scanner::{scan, validate, MosaicTile};
pub use writer::{level_path, OverviewWriter};
