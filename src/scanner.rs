//! Collects tile metadata and enforces every cross-tile invariant before any pixels are read.

use std::path::PathBuf;

use log::info;

use crate::error::{OvrMergeError, Result};
use crate::overview::OverviewPyramid;
use crate::raster::{base_raster_path, RasterTileRef};

/// One input: the base GeoTIFF and its external overview pyramid.
#[derive(Clone, Debug, PartialEq)]
pub struct MosaicTile {
    pub raster: RasterTileRef,
    pub pyramid: OverviewPyramid,
}

/// Open every overview file and its base raster, in input order, then validate them.
pub fn scan(inputs: &[PathBuf]) -> Result<Vec<MosaicTile>> {
    if inputs.is_empty() {
        return Err(OvrMergeError::NoInputs);
    }

    let tiles = inputs
        .iter()
        .map(|overview| {
            let base = base_raster_path(overview)?;
            if !base.is_file() {
                return Err(OvrMergeError::MissingBaseRaster(overview.clone()));
            }
            let pyramid = OverviewPyramid::scan(overview)?;
            let raster = RasterTileRef::open(&base)?;
            Ok(MosaicTile { raster, pyramid })
        })
        .collect::<Result<Vec<_>>>()?;

    validate(&tiles)?;
    info!(
        "scanned {} tiles of {}x{} pixels with {} overview levels",
        tiles.len(),
        tiles[0].raster.width,
        tiles[0].raster.height,
        tiles[0].pyramid.len()
    );
    Ok(tiles)
}

/// Check that all tiles can be merged into one grid, comparing each against the first.
pub fn validate(tiles: &[MosaicTile]) -> Result<()> {
    let Some((first, rest)) = tiles.split_first() else {
        return Err(OvrMergeError::NoInputs);
    };

    // Overview pages must match level for level
    for tile in rest {
        let expected = first.pyramid.levels();
        let actual = tile.pyramid.levels();
        if expected.len() != actual.len() {
            return Err(OvrMergeError::Inconsistent(format!(
                "{} has {} overview levels, {} has {}",
                first.pyramid.path.display(),
                expected.len(),
                tile.pyramid.path.display(),
                actual.len()
            )));
        }
        for (index, (a, b)) in expected.iter().zip(actual).enumerate() {
            if a.shape() != b.shape() {
                return Err(OvrMergeError::Inconsistent(format!(
                    "overview level {index} is {:?} in {} but {:?} in {}",
                    a.shape(),
                    first.pyramid.path.display(),
                    b.shape(),
                    tile.pyramid.path.display()
                )));
            }
            if a.format != b.format {
                return Err(OvrMergeError::Inconsistent(format!(
                    "overview level {index} is {:?} in {} but {:?} in {}",
                    a.format,
                    first.pyramid.path.display(),
                    b.format,
                    tile.pyramid.path.display()
                )));
            }
        }
    }

    for tile in rest {
        let (a, b) = (&first.raster, &tile.raster);
        if (a.width, a.height) != (b.width, b.height) {
            return Err(OvrMergeError::Inconsistent(format!(
                "{} is {}x{} pixels but {} is {}x{}",
                a.path.display(),
                a.width,
                a.height,
                b.path.display(),
                b.width,
                b.height
            )));
        }
        if !a.geotransform.same_scale(&b.geotransform) {
            return Err(OvrMergeError::Inconsistent(format!(
                "{} and {} have different pixel sizes",
                a.path.display(),
                b.path.display()
            )));
        }
        if let (Some(x), Some(y)) = (a.epsg, b.epsg) {
            if x != y {
                return Err(OvrMergeError::Inconsistent(format!(
                    "{} is EPSG:{x} but {} is EPSG:{y}",
                    a.path.display(),
                    b.path.display()
                )));
            }
        }
    }

    for tile in tiles {
        let geotransform = &tile.raster.geotransform;
        if geotransform.is_rotated() {
            return Err(OvrMergeError::RotatedGeoTransform(tile.raster.path.clone()));
        }
        if !geotransform.is_north_up() {
            return Err(OvrMergeError::UnsupportedOrientation(tile.raster.path.clone()));
        }
    }

    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::affine::GeoTransform;
    use crate::buffer::{Photometric, PixelFormat, SampleType};
    use crate::error::ErrorKind;
    use crate::overview::PyramidLevel;

    fn tile(name: &str, geotransform: GeoTransform, levels: &[(u32, u32)]) -> MosaicTile {
        MosaicTile {
            raster: RasterTileRef::new(format!("{name}.tif"), geotransform, 500, 500),
            pyramid: OverviewPyramid::from_levels(
                format!("{name}.tif.ovr"),
                levels
                    .iter()
                    .map(|&(w, h)| PyramidLevel::new(w, h, PixelFormat::new(SampleType::U8, Photometric::Rgb)))
                    .collect(),
            ),
        }
    }

    const LEVELS: [(u32, u32); 3] = [(250, 250), (125, 125), (63, 63)];

    fn north_up(x: f64) -> GeoTransform {
        GeoTransform::north_up(x, 0.0, 1.0, -1.0)
    }

    #[test]
    fn matching_tiles_pass() {
        let tiles = [tile("a", north_up(0.0), &LEVELS), tile("b", north_up(500.0), &LEVELS)];
        validate(&tiles).unwrap();
    }

    #[test]
    fn level_count_mismatch() {
        let tiles = [
            tile("a", north_up(0.0), &LEVELS),
            tile("b", north_up(500.0), &LEVELS[..2]),
        ];
        let err = validate(&tiles).unwrap_err();
        assert!(matches!(err, OvrMergeError::Inconsistent(_)));
        assert_eq!(err.kind(), ErrorKind::Consistency);
    }

    #[test]
    fn level_shape_mismatch() {
        let tiles = [
            tile("a", north_up(0.0), &LEVELS),
            tile("b", north_up(500.0), &[(250, 250), (125, 125), (62, 63)]),
        ];
        assert!(matches!(validate(&tiles), Err(OvrMergeError::Inconsistent(_))));
    }

    #[test]
    fn pixel_format_mismatch() {
        let mut b = tile("b", north_up(500.0), &LEVELS);
        b.pyramid = OverviewPyramid::from_levels(
            "b.tif.ovr",
            LEVELS
                .iter()
                .map(|&(w, h)| PyramidLevel::new(w, h, PixelFormat::new(SampleType::U8, Photometric::Gray)))
                .collect(),
        );
        let tiles = [tile("a", north_up(0.0), &LEVELS), b];
        assert!(matches!(validate(&tiles), Err(OvrMergeError::Inconsistent(_))));
    }

    #[test]
    fn signed_and_unsigned_levels_do_not_mix() {
        let with_format = |name, sample| {
            let mut t = tile(name, north_up(0.0), &LEVELS[..1]);
            t.pyramid = OverviewPyramid::from_levels(
                format!("{name}.tif.ovr"),
                vec![PyramidLevel::new(250, 250, PixelFormat::new(sample, Photometric::Gray))],
            );
            t
        };
        let mut b = with_format("b", SampleType::U16);
        b.raster.geotransform = north_up(500.0);
        let tiles = [with_format("a", SampleType::I16), b];
        assert!(matches!(validate(&tiles), Err(OvrMergeError::Inconsistent(_))));
    }

    #[test]
    fn tile_size_mismatch() {
        let mut b = tile("b", north_up(500.0), &LEVELS);
        b.raster.width = 499;
        let tiles = [tile("a", north_up(0.0), &LEVELS), b];
        assert!(matches!(validate(&tiles), Err(OvrMergeError::Inconsistent(_))));
    }

    #[test]
    fn pixel_size_mismatch() {
        let tiles = [
            tile("a", north_up(0.0), &LEVELS),
            tile("b", GeoTransform::north_up(500.0, 0.0, 1.0, -1.000001), &LEVELS),
        ];
        assert!(matches!(validate(&tiles), Err(OvrMergeError::Inconsistent(_))));
    }

    #[test]
    fn crs_mismatch() {
        let mut a = tile("a", north_up(0.0), &LEVELS);
        let mut b = tile("b", north_up(500.0), &LEVELS);
        a.raster.epsg = Some(32633);
        b.raster.epsg = Some(32634);
        assert!(matches!(validate(&[a, b]), Err(OvrMergeError::Inconsistent(_))));
    }

    #[test]
    fn rotation_is_rejected() {
        let rotated = GeoTransform::new(0.0, 1.0, 0.1, 0.0, 0.0, -1.0);
        let err = validate(&[tile("a", rotated, &LEVELS)]).unwrap_err();
        assert!(matches!(err, OvrMergeError::RotatedGeoTransform(_)));
    }

    #[test]
    fn south_up_is_rejected() {
        let south_up = GeoTransform::north_up(0.0, 0.0, 1.0, 1.0);
        let err = validate(&[tile("a", south_up, &LEVELS)]).unwrap_err();
        assert!(matches!(err, OvrMergeError::UnsupportedOrientation(_)));
    }

    #[test]
    fn empty_input() {
        assert!(matches!(scan(&[]), Err(OvrMergeError::NoInputs)));
        assert!(matches!(validate(&[]), Err(OvrMergeError::NoInputs)));
    }
}
