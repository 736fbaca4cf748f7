use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::{Path, PathBuf};

use log::debug;
use tiff::decoder::ifd::Value;
use tiff::decoder::Decoder;
use tiff::tags::Tag;
use tiff::TiffResult;

use crate::affine::GeoTransform;
use crate::error::{OvrMergeError, Result};
use crate::geo_key_directory::{GeoKeyDirectory, RasterType};
use crate::header::TiffHeader;

/// Base GeoTIFF next to an external overview: `a.tif.ovr` belongs to `a.tif`.
pub fn base_raster_path(overview: &Path) -> Result<PathBuf> {
    match overview.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("ovr") => Ok(overview.with_extension("")),
        _ => Err(OvrMergeError::InvalidInput(overview.to_path_buf())),
    }
}

/// Georeferencing of one source tile, read once and never modified.
#[derive(Clone, Debug, PartialEq)]
pub struct RasterTileRef {
    pub path: PathBuf,
    pub geotransform: GeoTransform,
    pub width: u32,
    pub height: u32,
    /// EPSG code from the GeoKey directory, if any.
    pub epsg: Option<u16>,
}

impl RasterTileRef {
    pub fn new(path: impl Into<PathBuf>, geotransform: GeoTransform, width: u32, height: u32) -> Self {
        Self {
            path: path.into(),
            geotransform,
            width,
            height,
            epsg: None,
        }
    }

    /// Read dimensions, geotransform and CRS from the first image of a GeoTIFF.
    pub fn open(path: &Path) -> Result<Self> {
        TiffHeader::sniff(path)?;
        let reader = BufReader::new(File::open(path).map_err(OvrMergeError::io(path))?);
        let mut decoder = Decoder::new(reader).map_err(OvrMergeError::tiff(path))?;

        let (width, height) = decoder.dimensions().map_err(OvrMergeError::tiff(path))?;
        let geo_keys = read_geo_keys(&mut decoder).map_err(OvrMergeError::tiff(path))?;
        let geotransform = read_geotransform(&mut decoder)
            .map_err(OvrMergeError::tiff(path))?
            .ok_or_else(|| OvrMergeError::MissingGeoreference(path.to_path_buf()))?;

        let geotransform = match geo_keys.as_ref().and_then(GeoKeyDirectory::raster_type) {
            Some(RasterType::PixelIsPoint) => geotransform.pixel_is_point_to_area(),
            _ => geotransform,
        };

        let epsg = geo_keys.as_ref().and_then(GeoKeyDirectory::epsg_code);
        debug!(
            "{}: {width}x{height}, geotransform {:?}, model type {:?}, epsg {epsg:?}, citation {:?}",
            path.display(),
            geotransform.as_array(),
            geo_keys.as_ref().and_then(GeoKeyDirectory::model_type),
            geo_keys.as_ref().and_then(GeoKeyDirectory::citation),
        );

        Ok(Self {
            path: path.to_path_buf(),
            geotransform,
            width,
            height,
            epsg,
        })
    }
}

fn read_geotransform<R: Read + Seek>(decoder: &mut Decoder<R>) -> TiffResult<Option<GeoTransform>> {
    if let Some(matrix) = find_f64_vec(decoder, Tag::ModelTransformationTag)? {
        return Ok(GeoTransform::from_model_transformation(&matrix));
    }
    let scale = find_f64_vec(decoder, Tag::ModelPixelScaleTag)?;
    let tiepoint = find_f64_vec(decoder, Tag::ModelTiepointTag)?;
    Ok(match (scale, tiepoint) {
        (Some(scale), Some(tiepoint)) => GeoTransform::from_tiepoint(&scale, &tiepoint),
        _ => None,
    })
}

fn read_geo_keys<R: Read + Seek>(decoder: &mut Decoder<R>) -> TiffResult<Option<GeoKeyDirectory>> {
    let Some(keys) = decoder.find_tag(Tag::GeoKeyDirectoryTag)? else {
        return Ok(None);
    };
    let keys = keys.into_u16_vec()?;
    let doubles = find_f64_vec(decoder, Tag::GeoDoubleParamsTag)?.unwrap_or_default();
    let ascii = decoder
        .find_tag(Tag::GeoAsciiParamsTag)?
        .map(Value::into_string)
        .transpose()?
        .unwrap_or_default();
    GeoKeyDirectory::parse(&keys, &doubles, &ascii)
}

fn find_f64_vec<R: Read + Seek>(decoder: &mut Decoder<R>, tag: Tag) -> TiffResult<Option<Vec<f64>>> {
    decoder.find_tag(tag)?.map(Value::into_f64_vec).transpose()
}
