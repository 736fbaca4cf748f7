use std::fmt::Debug;
use std::path::PathBuf;

use thiserror::Error;

use crate::buffer::OutOfBounds;

/// Enum with all errors in this crate.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum OvrMergeError {
    /// No overview files were given.
    #[error("No input files selected.")]
    NoInputs,

    /// An input path that cannot name an overview sidecar.
    #[error("{}: expected an external overview file ending in .ovr", .0.display())]
    InvalidInput(PathBuf),

    /// The GeoTIFF next to an overview file does not exist.
    #[error("could not find tif file for overview file: {}", .0.display())]
    MissingBaseRaster(PathBuf),

    #[error("{}: not a TIFF file", .0.display())]
    NotTiff(PathBuf),

    #[error("{}: no georeferencing tags (ModelTransformation or ModelPixelScale/ModelTiepoint)", .0.display())]
    MissingGeoreference(PathBuf),

    #[error("{}: overview file contains no image pages", .0.display())]
    EmptyPyramid(PathBuf),

    /// A cross-tile invariant failed.
    #[error("inconsistent input tiles: {0}")]
    Inconsistent(String),

    #[error("{}: rotated or skewed geotransforms are not supported", .0.display())]
    RotatedGeoTransform(PathBuf),

    #[error("{}: only north-up rasters with non-zero pixel size are supported", .0.display())]
    UnsupportedOrientation(PathBuf),

    /// The mosaic extent is not a whole number of tiles.
    #[error("mosaic extent is {ratio} tiles along {axis}, not a whole number")]
    MisalignedGrid { axis: char, ratio: f64 },

    /// A tile origin does not fall on the mosaic pixel grid.
    #[error("{}: tile origin is {offset} pixels from the mosaic edge along {axis}, not a whole pixel", .path.display())]
    MisalignedTile {
        path: PathBuf,
        axis: char,
        offset: f64,
    },

    #[error("{}: {source}", .path.display())]
    PlacementOutOfBounds {
        path: PathBuf,
        #[source]
        source: OutOfBounds,
    },

    /// A page layout or sample type the merged output cannot represent.
    #[error("{}: unsupported pixel format: {format}", .path.display())]
    UnsupportedPixelFormat { path: PathBuf, format: String },

    #[error("{}: {source}", .path.display())]
    Tiff {
        path: PathBuf,
        #[source]
        source: tiff::TiffError,
    },

    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{}: could not move finished output into place: {source}", .path.display())]
    Persist {
        path: PathBuf,
        #[source]
        source: tempfile::PersistError,
    },

    #[error("{}: decoded samples do not fit the page shape: {source}", .path.display())]
    Shape {
        path: PathBuf,
        #[source]
        source: ndarray::ShapeError,
    },
}

/// Coarse classification of [`OvrMergeError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad command line or configuration.
    Configuration,
    /// An overview file without its base raster.
    MissingCollaborator,
    /// Input tiles that cannot be merged.
    Consistency,
    /// File access or codec failures.
    Io,
}

impl OvrMergeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NoInputs | Self::InvalidInput(_) => ErrorKind::Configuration,
            Self::MissingBaseRaster(_) => ErrorKind::MissingCollaborator,
            Self::MissingGeoreference(_)
            | Self::EmptyPyramid(_)
            | Self::Inconsistent(_)
            | Self::RotatedGeoTransform(_)
            | Self::UnsupportedOrientation(_)
            | Self::MisalignedGrid { .. }
            | Self::MisalignedTile { .. }
            | Self::PlacementOutOfBounds { .. } => ErrorKind::Consistency,
            Self::NotTiff(_)
            | Self::UnsupportedPixelFormat { .. }
            | Self::Tiff { .. }
            | Self::Io { .. }
            | Self::Persist { .. }
            | Self::Shape { .. } => ErrorKind::Io,
        }
    }

    pub(crate) fn tiff(path: impl Into<PathBuf>) -> impl FnOnce(tiff::TiffError) -> Self {
        let path = path.into();
        move |source| Self::Tiff { path, source }
    }

    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| Self::Io { path, source }
    }

    pub(crate) fn shape(path: impl Into<PathBuf>) -> impl FnOnce(ndarray::ShapeError) -> Self {
        let path = path.into();
        move |source| Self::Shape { path, source }
    }
}

/// Crate-specific result type.
pub type Result<T> = std::result::Result<T, OvrMergeError>;

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn file_errors_name_the_file() {
        let not_found = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err = OvrMergeError::io("tiles/a.tif.ovr")(not_found);
        assert_eq!(err.to_string(), "tiles/a.tif.ovr: gone");
        assert_eq!(err.kind(), ErrorKind::Io);

        let err = OvrMergeError::UnsupportedPixelFormat {
            path: PathBuf::from("b.tif.ovr"),
            format: "GrayA(8)".to_string(),
        };
        assert_eq!(err.to_string(), "b.tif.ovr: unsupported pixel format: GrayA(8)");
    }
}
